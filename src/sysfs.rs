//! An interface to the Linux `/sys` filesystem, or sysfs, as ev3dev uses it.
//!
//! ev3dev drivers expose every device as a directory of small text files
//! under a class directory, ie `/sys/class/dc-motor/motor0/duty_cycle_sp`.
//! Each file is one attribute, read and written as text.
//!
//! # Implementation Details
//!
//! This is the userspace interface to low-level kernel details, and is subject
//! to change between kernel versions.
//!
//! Nothing here is cached. Every read opens the attribute again, so changes
//! made by the device (ie finishing a command) are visible on the next read.
//!
//! # Stability
//!
//! The ev3dev class interfaces are documented [here][1], and have been
//! stable across ev3dev releases, but are not upstream kernel ABI.
//!
//! [1]: https://docs.ev3dev.org/projects/docs-kernel/en/ev3dev-stretch/motors.html
use crate::util::{SYSFS_PATH, SYSFS_ROOT_VAR};
use log::trace;
use std::{
    env,
    fs,
    io::{self, prelude::*},
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

pub mod attribute;

/// Raw access to device attributes.
///
/// Devices are addressed by class path, ie `class/dc-motor`, and device
/// directory name, ie `motor0`.
pub trait Store {
    /// Full path to the class directory
    fn class_path(&self, class: &str) -> PathBuf;

    /// Names of the device directories currently present in `class`, sorted.
    ///
    /// # Errors
    ///
    /// - If the class directory couldn't be read
    fn devices(&self, class: &str) -> io::Result<Vec<String>>;

    /// Read the raw text of `attribute`, without the trailing newline.
    ///
    /// The byte count read is the length of the returned string, plus one
    /// if the kernel ended it with a newline.
    fn read(&self, class: &str, device: &str, attribute: &str) -> io::Result<String>;

    /// Write `value` to `attribute`.
    ///
    /// The attribute must already exist, it is never created.
    fn write(&self, class: &str, device: &str, attribute: &str, value: &str) -> io::Result<()>;
}

/// The real sysfs, rooted at [`SYSFS_PATH`] unless configured otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sysfs {
    root: PathBuf,
}

impl Sysfs {
    /// Sysfs at [`SYSFS_PATH`]
    pub fn new() -> Self {
        Self::with_root(SYSFS_PATH)
    }

    /// Sysfs at `root`
    ///
    /// Use this for testing purposes, or for a chroot.
    pub fn with_root<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Sysfs at the path in [`SYSFS_ROOT_VAR`], or [`SYSFS_PATH`] if it is
    /// unset or empty.
    pub fn from_env() -> Self {
        match env::var_os(SYSFS_ROOT_VAR) {
            Some(root) if !root.is_empty() => Self::with_root(root),
            _ => Self::new(),
        }
    }

    /// Root of this sysfs
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn attribute_path(&self, class: &str, device: &str, attribute: &str) -> PathBuf {
        self.class_path(class).join(device).join(attribute)
    }
}

/// Uses [`Sysfs::from_env`]
impl Default for Sysfs {
    fn default() -> Self {
        Self::from_env()
    }
}

impl Store for Sysfs {
    fn class_path(&self, class: &str) -> PathBuf {
        self.root.join(class)
    }

    fn devices(&self, class: &str) -> io::Result<Vec<String>> {
        let mut v = Vec::new();
        // Entries are symlinks into `/sys/devices`, don't follow them.
        for entry in WalkDir::new(self.class_path(class))
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry?;
            match entry.file_name().to_str() {
                Some(name) => v.push(name.to_owned()),
                None => trace!("skipping non utf-8 device name {:?}", entry.file_name()),
            }
        }
        Ok(v)
    }

    fn read(&self, class: &str, device: &str, attribute: &str) -> io::Result<String> {
        let path = self.attribute_path(class, device, attribute);
        let mut s = fs::read_to_string(&path)?;
        if s.ends_with('\n') {
            s.pop();
        }
        trace!("read {:?} from {}", s, path.display());
        Ok(s)
    }

    fn write(&self, class: &str, device: &str, attribute: &str, value: &str) -> io::Result<()> {
        let path = self.attribute_path(class, device, attribute);
        // sysfs ignores truncation, regular files in tests need it.
        let mut f = fs::OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&path)?;
        f.write_all(value.as_bytes())?;
        trace!("wrote {:?} to {}", value, path.display());
        Ok(())
    }
}

/// Fake sysfs trees for tests
#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use tempfile::TempDir;

    /// A sysfs tree in a temporary directory
    pub struct FakeSysfs {
        dir: TempDir,
    }

    impl FakeSysfs {
        pub fn new() -> io::Result<Self> {
            Ok(Self {
                dir: tempfile::tempdir()?,
            })
        }

        /// A [`Sysfs`] rooted at this tree
        pub fn store(&self) -> Sysfs {
            Sysfs::with_root(self.dir.path())
        }

        /// Create device `name` in `class` with `attrs`.
        ///
        /// Values are written with a trailing newline, like the kernel does.
        pub fn device(&self, class: &str, name: &str, attrs: &[(&str, &str)]) -> io::Result<()> {
            let dir = self.dir.path().join(class).join(name);
            fs::create_dir_all(&dir)?;
            for (attr, value) in attrs {
                fs::write(dir.join(attr), format!("{value}\n"))?;
            }
            Ok(())
        }

        /// Raw contents of an attribute file
        pub fn contents(&self, class: &str, name: &str, attr: &str) -> io::Result<String> {
            fs::read_to_string(self.dir.path().join(class).join(name).join(attr))
        }

        /// Delete an attribute file
        pub fn remove(&self, class: &str, name: &str, attr: &str) -> io::Result<()> {
            fs::remove_file(self.dir.path().join(class).join(name).join(attr))
        }
    }
}
