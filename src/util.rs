//! Utility functions

/// Technically Linux requires sysfs to be at `/sys`, calling it a system
/// configuration error otherwise.
///
/// But an ev3dev image may be chrooted or emulated, so allow changing it with
/// [`SYSFS_ROOT_VAR`] or [`crate::sysfs::Sysfs::with_root`].
pub const SYSFS_PATH: &str = "/sys";

/// Environment variable overriding [`SYSFS_PATH`].
pub const SYSFS_ROOT_VAR: &str = "EV3SYS_SYSFS_ROOT";

/// dc-motor class directory, relative to the sysfs root.
pub const DC_MOTOR_PATH: &str = "class/dc-motor";
