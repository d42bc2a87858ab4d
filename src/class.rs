//! Abstractions for handling ev3dev device classes
//!
//! A "class" is a directory under `/sys/class`, ie `dc-motor`, holding one
//! directory per device, named with the class prefix and a number, ie
//! `motor0`.
//!
//! Every class is accessed the same way, through a [`Handle`] bound to one
//! device number. The differences between classes are their [`Class`]
//! descriptor and the attributes they expose.
//!
//! # Errors
//!
//! Getters return their errors directly.
//!
//! Setters instead return the [`Handle`] so they can be chained, and store
//! the first error in it. Once an error is stored, later setters do nothing
//! and never touch the device. Use [`Handle::take_error`] after a chain.
//!
//! ```rust,no_run
//! # use ev3sys::class::dc_motor::DcMotor;
//! # use std::time::Duration;
//! let mut motor = DcMotor::find(Some("outA"), "rcx-motor")?.strict()?;
//! motor
//!     .set_duty_cycle_setpoint(50)
//!     .set_ramp_up_setpoint(Duration::from_millis(500))
//!     .command("run-forever");
//! if let Some(e) = motor.take_error() {
//!     eprintln!("couldn't start {motor}: {e}");
//! }
//! # Ok::<(), ev3sys::error::Error>(())
//! ```
//!
//! # Thread safety
//!
//! Handles are not synchronized. Setters mutate the stored error, so a handle
//! shared between threads must be wrapped in a lock by the caller.
use crate::{
    error::{Error, Result},
    sysfs::{attribute, Store, Sysfs},
    types::Port,
};
use log::{debug, warn};
use std::{collections::HashMap, fmt, marker::PhantomData, ops::RangeInclusive, path::PathBuf};

use self::imp::Sealed;

pub mod dc_motor;

mod imp {
    pub trait Sealed {}

    impl Sealed for super::dc_motor::DcMotorClass {}
}

/// Attributes every class has
pub(crate) mod attr {
    pub const ADDRESS: &str = "address";
    pub const COMMAND: &str = "command";
    pub const COMMANDS: &str = "commands";
    pub const DRIVER_NAME: &str = "driver_name";
    pub const UEVENT: &str = "uevent";
}

/// An ev3dev device class
pub trait Class: Sealed + fmt::Debug {
    /// Path to the class directory, relative to the sysfs root.
    ///
    /// # Example
    ///
    /// `class/dc-motor`
    const PATH: &'static str;

    /// Prefix of device directory names, also used as the kind tag.
    ///
    /// # Example
    ///
    /// `motor`
    const PREFIX: &'static str;
}

/// Result of looking up a device by port and driver.
///
/// Not finding a device at all is an [`Error::NotFound`] instead.
#[derive(Debug)]
#[must_use]
pub enum Found<D> {
    /// A device was found with the requested driver.
    Match(D),

    /// A device was found on the requested port, but with a different driver.
    ///
    /// The device is still usable, so callers can decide whether to use it.
    DriverMismatch {
        device: D,

        /// Requested driver
        want: String,

        /// Driver of `device`
        have: String,
    },
}

impl<D> Found<D> {
    /// The found device, mismatched or not
    pub fn device(&self) -> &D {
        match self {
            Self::Match(d) | Self::DriverMismatch { device: d, .. } => d,
        }
    }

    /// The found device, mismatched or not
    pub fn into_device(self) -> D {
        match self {
            Self::Match(d) | Self::DriverMismatch { device: d, .. } => d,
        }
    }

    /// Whether the device uses a different driver than requested
    pub fn is_mismatch(&self) -> bool {
        matches!(self, Self::DriverMismatch { .. })
    }

    /// Convert the device, keeping the mismatch information
    pub fn map<T, F: FnOnce(D) -> T>(self, f: F) -> Found<T> {
        match self {
            Self::Match(d) => Found::Match(f(d)),
            Self::DriverMismatch { device, want, have } => Found::DriverMismatch {
                device: f(device),
                want,
                have,
            },
        }
    }

    /// The device, only if the driver matched.
    ///
    /// # Errors
    ///
    /// - [`Error::DriverMismatch`] if the driver didn't match
    pub fn strict(self) -> Result<D>
    where
        D: fmt::Display,
    {
        match self {
            Self::Match(d) => Ok(d),
            Self::DriverMismatch { device, want, have } => Err(Error::DriverMismatch {
                device: device.to_string(),
                want,
                have,
            }),
        }
    }
}

/// Name of device `id` in class `C`, ie `motor0`
fn device_name<C: Class>(id: u32) -> String {
    format!("{}{}", C::PREFIX, id)
}

fn read_attr<C: Class, S: Store>(store: &S, id: u32, attribute: &'static str) -> Result<String> {
    let device = device_name::<C>(id);
    store
        .read(C::PATH, &device, attribute)
        .map_err(|source| Error::Io {
            device,
            attribute,
            source,
        })
}

/// Ids of the devices currently present in class `C`, sorted.
///
/// Directory entries without the class prefix are ignored.
///
/// # Errors
///
/// - If the class directory couldn't be read
/// - If a device name has the class prefix but no number
pub fn candidates<C: Class, S: Store>(store: &S) -> Result<Vec<u32>> {
    let names = store.devices(C::PATH).map_err(|source| Error::Scan {
        path: store.class_path(C::PATH),
        source,
    })?;
    let mut ids = Vec::new();
    for name in names {
        let id = match name.strip_prefix(C::PREFIX) {
            Some(id) => id,
            None => continue,
        };
        let id = id
            .parse::<u32>()
            .map_err(|_| Error::BadDeviceName { name: name.clone() })?;
        ids.push(id);
    }
    ids.sort_unstable();
    Ok(ids)
}

/// Find the id of a device in class `C` on `port` using `driver`.
///
/// If `port` matches any port, the first device using `driver` is returned.
/// Otherwise the device on `port` is returned, as a
/// [`Found::DriverMismatch`] if it uses a different driver.
///
/// Devices are checked in [`candidates`] order, the first match wins.
///
/// # Errors
///
/// - [`Error::NotFound`] if no device matched
/// - If the class directory or a device attribute couldn't be read
pub fn resolve<C: Class, S: Store>(store: &S, port: &Port, driver: &str) -> Result<Found<u32>> {
    for id in candidates::<C, S>(store)? {
        let name = match port.name() {
            Some(name) => name,
            None => {
                if read_attr::<C, S>(store, id, attr::DRIVER_NAME)? == driver {
                    return Ok(Found::Match(id));
                }
                continue;
            }
        };
        if read_attr::<C, S>(store, id, attr::ADDRESS)? != name {
            continue;
        }
        let have = read_attr::<C, S>(store, id, attr::DRIVER_NAME)?;
        if have != driver {
            warn!(
                "{} on {port} uses driver {have:?}, wanted {driver:?}",
                device_name::<C>(id)
            );
            return Ok(Found::DriverMismatch {
                device: id,
                want: driver.into(),
                have,
            });
        }
        return Ok(Found::Match(id));
    }
    Err(Error::NotFound {
        kind: C::PREFIX,
        driver: driver.into(),
        port: port.clone(),
    })
}

/// A handle to one device in class `C`, accessed through `S`.
///
/// Handles hold no open files, every getter and setter accesses the device
/// attributes again.
#[derive(Debug)]
pub struct Handle<C: Class, S: Store = Sysfs> {
    id: u32,
    store: S,

    /// First error from a setter, until taken.
    err: Option<Error>,

    _class: PhantomData<C>,
}

impl<C: Class> Handle<C, Sysfs> {
    /// Find the device on `port` using `driver`, in [`Sysfs::default`].
    ///
    /// See [`Handle::find_in`].
    pub fn find(port: Option<&str>, driver: &str) -> Result<Found<Self>> {
        Self::find_in(Sysfs::default(), port, driver)
    }
}

// Public
impl<C: Class, S: Store> Handle<C, S> {
    /// Find the device on `port` using `driver`, in `store`.
    ///
    /// If `port` is [`None`] or empty, the first device using `driver` is
    /// returned.
    ///
    /// If the device on `port` uses a different driver, it is still returned
    /// as a [`Found::DriverMismatch`].
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if there is no such device
    /// - See [`resolve`]
    pub fn find_in(store: S, port: Option<&str>, driver: &str) -> Result<Found<Self>> {
        let port = Port::from(port);
        let found = resolve::<C, S>(&store, &port, driver)?;
        debug!(
            "found {} for driver {driver:?} on {port}",
            device_name::<C>(*found.device())
        );
        Ok(found.map(|id| Self::from_id(store, id)))
    }

    /// Handle to device `id`, without checking it exists.
    pub fn from_id(store: S, id: u32) -> Self {
        Self {
            id,
            store,
            err: None,
            _class: PhantomData,
        }
    }

    /// Rebind this handle to device `id`, dropping any stored error.
    pub fn set_id(&mut self, id: u32) {
        self.id = id;
        self.err = None;
    }

    /// Device number
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Store this handle accesses
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Full path to the class directory
    ///
    /// # Example
    ///
    /// `/sys/class/dc-motor`
    pub fn path(&self) -> PathBuf {
        self.store.class_path(C::PATH)
    }

    /// Full path to the device directory
    ///
    /// # Example
    ///
    /// `/sys/class/dc-motor/motor0`
    pub fn device_path(&self) -> PathBuf {
        self.path().join(self.to_string())
    }

    /// Kind tag, the class prefix
    ///
    /// # Example
    ///
    /// `motor`
    pub fn kind_tag(&self) -> &'static str {
        C::PREFIX
    }

    /// Display name of an optional handle, `<prefix>*` for [`None`].
    pub fn display_name(dev: Option<&Self>) -> String {
        match dev {
            Some(dev) => dev.to_string(),
            None => format!("{}*", C::PREFIX),
        }
    }

    /// Return the stored setter error, and clear it.
    pub fn take_error(&mut self) -> Option<Error> {
        self.err.take()
    }

    /// The stored setter error, without clearing it.
    pub fn error(&self) -> Option<&Error> {
        self.err.as_ref()
    }

    /// Port name of the device, ie `outA`
    pub fn address(&self) -> Result<String> {
        self.read_string(attr::ADDRESS)
    }

    /// Name of the driver for the device, ie `rcx-motor`
    pub fn driver(&self) -> Result<String> {
        self.read_string(attr::DRIVER_NAME)
    }

    /// The Key=Value pairs in the `uevent` attribute.
    ///
    /// Duplicate keys keep the last value.
    pub fn uevent(&self) -> Result<HashMap<String, String>> {
        attribute::uevent(attr::UEVENT, &self.read(attr::UEVENT)?)
    }

    /// Commands the device currently accepts
    pub fn commands(&self) -> Result<Vec<String>> {
        Ok(attribute::string_list(&self.read(attr::COMMANDS)?))
    }

    /// Issue `command` to the device.
    ///
    /// The device starts executing it in the background, this doesn't wait
    /// for it to finish.
    ///
    /// Stores [`Error::NotAvailable`] if `command` is not in
    /// [`Handle::commands`], without issuing it.
    pub fn command(&mut self, command: &str) -> &mut Self {
        self.set_available(attr::COMMAND, attr::COMMANDS, command)
    }
}

// Private
impl<C: Class, S: Store> Handle<C, S> {
    pub(crate) fn read(&self, attribute: &'static str) -> Result<String> {
        read_attr::<C, S>(&self.store, self.id, attribute)
    }

    pub(crate) fn read_string(&self, attribute: &'static str) -> Result<String> {
        self.read(attribute).map(|s| attribute::string(&s))
    }

    fn write(&self, attribute: &'static str, value: &str) -> Result<()> {
        let device = self.to_string();
        debug!("writing {value:?} to {attribute} of {device}");
        self.store
            .write(C::PATH, &device, attribute, value)
            .map_err(|source| Error::Io {
                device,
                attribute,
                source,
            })
    }

    /// Store `err`, if there isn't one already
    fn fail(&mut self, err: Error) {
        warn!("{}: {}", self, err);
        if self.err.is_none() {
            self.err = Some(err);
        }
    }

    /// Write `value` to `attribute`, storing any error.
    pub(crate) fn set(&mut self, attribute: &'static str, value: &str) -> &mut Self {
        if self.err.is_some() {
            return self;
        }
        if let Err(e) = self.write(attribute, value) {
            self.fail(e);
        }
        self
    }

    /// Write `value` to `attribute`, if it is within `range`.
    pub(crate) fn set_in_range(
        &mut self,
        attribute: &'static str,
        value: i64,
        range: RangeInclusive<i64>,
    ) -> &mut Self {
        if self.err.is_some() {
            return self;
        }
        if !range.contains(&value) {
            self.fail(Error::OutOfRange {
                attribute,
                value: value.to_string(),
                min: range.start().to_string(),
                max: range.end().to_string(),
            });
            return self;
        }
        self.set(attribute, &value.to_string())
    }

    /// Write `value` to `attribute`, if it is listed in `available`.
    pub(crate) fn set_available(
        &mut self,
        attribute: &'static str,
        available: &'static str,
        value: &str,
    ) -> &mut Self {
        if self.err.is_some() {
            return self;
        }
        let avail = match self.read(available) {
            Ok(a) => attribute::string_list(&a),
            Err(e) => {
                self.fail(e);
                return self;
            }
        };
        if !avail.iter().any(|a| a == value) {
            let device = self.to_string();
            self.fail(Error::NotAvailable {
                attribute,
                value: value.into(),
                device,
                available: avail,
            });
            return self;
        }
        self.set(attribute, value)
    }
}

impl<C: Class, S: Store> fmt::Display for Handle<C, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", C::PREFIX, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        dc_motor::{DcMotor, DcMotorClass},
        *,
    };
    use crate::{sysfs::fake::FakeSysfs, util::DC_MOTOR_PATH};
    use anyhow::Result;

    fn motors(motors: &[(&str, &str, &str)]) -> Result<FakeSysfs> {
        let fs = FakeSysfs::new()?;
        for &(name, port, driver) in motors {
            fs.device(
                DC_MOTOR_PATH,
                name,
                &[
                    ("address", port),
                    ("driver_name", driver),
                    ("commands", "run-forever stop"),
                    ("command", ""),
                    ("duty_cycle_sp", "0"),
                ],
            )?;
        }
        Ok(fs)
    }

    #[test]
    fn candidate_ids() -> Result<()> {
        let fs = motors(&[
            ("motor10", "outA", "a"),
            ("motor2", "outB", "b"),
            ("motor0", "outC", "c"),
        ])?;
        fs.device(DC_MOTOR_PATH, "README", &[])?;
        assert_eq!(candidates::<DcMotorClass, _>(&fs.store())?, [0, 2, 10]);
        Ok(())
    }

    #[test]
    fn candidate_bad_name() -> Result<()> {
        let fs = motors(&[("motorX", "outA", "a")])?;
        let err = candidates::<DcMotorClass, _>(&fs.store()).unwrap_err();
        assert!(matches!(err, Error::BadDeviceName { ref name } if name == "motorX"));
        Ok(())
    }

    #[test]
    fn find_on_port() -> Result<()> {
        let fs = motors(&[("motor0", "outA", "foo"), ("motor1", "outB", "bar")])?;
        let found = DcMotor::find_in(fs.store(), Some("outB"), "bar")?;
        assert!(!found.is_mismatch());
        let motor = found.strict()?;
        assert_eq!(motor.id(), 1);
        assert_eq!(motor.address()?, "outB");
        assert_eq!(motor.driver()?, "bar");
        Ok(())
    }

    #[test]
    fn find_any_port() -> Result<()> {
        let fs = motors(&[("motor0", "outA", "foo"), ("motor1", "outB", "bar")])?;
        let motor = DcMotor::find_in(fs.store(), None, "bar")?.strict()?;
        assert_eq!(motor.id(), 1);
        let motor = DcMotor::find_in(fs.store(), Some(""), "foo")?.strict()?;
        assert_eq!(motor.id(), 0);
        Ok(())
    }

    #[test]
    fn find_driver_mismatch() -> Result<()> {
        let fs = motors(&[("motor3", "outA", "foo")])?;
        let found = DcMotor::find_in(fs.store(), Some("outA"), "bar")?;
        assert!(found.is_mismatch());
        assert_eq!(found.device().id(), 3);
        match &found {
            Found::DriverMismatch { want, have, .. } => {
                assert_eq!(want, "bar");
                assert_eq!(have, "foo");
            }
            Found::Match(_) => panic!("expected a mismatch"),
        }
        let err = found.strict().unwrap_err();
        assert!(err.is_driver_mismatch());
        assert!(err.to_string().contains("motor3"), "{err}");
        Ok(())
    }

    #[test]
    fn find_port_absent() -> Result<()> {
        let fs = motors(&[("motor0", "outB", "foo")])?;
        let err = DcMotor::find_in(fs.store(), Some("outA"), "foo").unwrap_err();
        assert!(err.is_not_found());
        Ok(())
    }

    #[test]
    fn find_driver_absent() -> Result<()> {
        let fs = motors(&[("motor0", "outA", "foo")])?;
        let err = DcMotor::find_in(fs.store(), None, "bar").unwrap_err();
        assert!(err.is_not_found());
        Ok(())
    }

    #[test]
    fn find_no_class() -> Result<()> {
        let fs = FakeSysfs::new()?;
        let err = DcMotor::find_in(fs.store(), None, "bar").unwrap_err();
        assert!(matches!(err, Error::Scan { .. }), "{err:?}");
        Ok(())
    }

    #[test]
    fn identity() -> Result<()> {
        let fs = motors(&[("motor0", "outA", "foo")])?;
        let mut motor = DcMotor::from_id(fs.store(), 0);
        assert_eq!(motor.to_string(), "motor0");
        assert_eq!(motor.kind_tag(), "motor");
        assert_eq!(DcMotor::display_name(Some(&motor)), "motor0");
        assert_eq!(DcMotor::<Sysfs>::display_name(None), "motor*");
        assert!(motor.path().ends_with("class/dc-motor"));
        assert!(motor.device_path().ends_with("class/dc-motor/motor0"));

        motor.command("bogus");
        assert!(motor.error().is_some());
        motor.set_id(7);
        assert_eq!(motor.id(), 7);
        assert!(motor.take_error().is_none());
        Ok(())
    }

    #[test]
    fn command_issued() -> Result<()> {
        let fs = motors(&[("motor0", "outA", "foo")])?;
        let mut motor = DcMotor::from_id(fs.store(), 0);
        motor.command("run-forever");
        assert!(motor.take_error().is_none());
        assert_eq!(fs.contents(DC_MOTOR_PATH, "motor0", "command")?, "run-forever");
        Ok(())
    }

    #[test]
    fn command_not_available() -> Result<()> {
        let fs = motors(&[("motor0", "outA", "foo")])?;
        let mut motor = DcMotor::from_id(fs.store(), 0);
        motor.command("bogus");
        let err = motor.take_error().expect("command should fail");
        let text = err.to_string();
        assert!(text.contains("\"bogus\""), "{text}");
        assert!(text.contains("\"run-forever\""), "{text}");
        assert!(text.contains("\"stop\""), "{text}");
        assert!(text.contains("motor0"), "{text}");
        // Never written
        assert_eq!(fs.contents(DC_MOTOR_PATH, "motor0", "command")?, "\n");
        Ok(())
    }

    #[test]
    fn command_list_unreadable() -> Result<()> {
        let fs = motors(&[("motor0", "outA", "foo")])?;
        fs.remove(DC_MOTOR_PATH, "motor0", "commands")?;
        let mut motor = DcMotor::from_id(fs.store(), 0);
        motor.command("stop");
        let err = motor.take_error().expect("command should fail");
        assert!(
            matches!(err, Error::Io { attribute, .. } if attribute == "commands"),
            "{err:?}"
        );
        assert_eq!(fs.contents(DC_MOTOR_PATH, "motor0", "command")?, "\n");
        Ok(())
    }

    #[test]
    fn error_drains_once() -> Result<()> {
        let fs = motors(&[("motor0", "outA", "foo")])?;
        let mut motor = DcMotor::from_id(fs.store(), 0);
        motor.command("bogus");
        assert!(motor.take_error().is_some());
        assert!(motor.take_error().is_none());
        Ok(())
    }

    #[test]
    fn sticky_error_short_circuits() -> Result<()> {
        let fs = motors(&[("motor0", "outA", "foo")])?;
        let mut motor = DcMotor::from_id(fs.store(), 0);
        motor
            .command("bogus")
            .set_duty_cycle_setpoint(50)
            .command("run-forever");
        let err = motor.take_error().expect("chain should fail");
        // First error is kept
        assert!(matches!(err, Error::NotAvailable { ref value, .. } if value == "bogus"));
        assert_eq!(fs.contents(DC_MOTOR_PATH, "motor0", "duty_cycle_sp")?, "0\n");
        assert_eq!(fs.contents(DC_MOTOR_PATH, "motor0", "command")?, "\n");

        // Cleared, so the chain works again
        motor.set_duty_cycle_setpoint(50).command("run-forever");
        assert!(motor.take_error().is_none());
        assert_eq!(fs.contents(DC_MOTOR_PATH, "motor0", "duty_cycle_sp")?, "50");
        Ok(())
    }

    #[test]
    fn getters_ignore_stored_error() -> Result<()> {
        let fs = motors(&[("motor0", "outA", "foo")])?;
        let mut motor = DcMotor::from_id(fs.store(), 0);
        motor.command("bogus");
        assert_eq!(motor.commands()?, ["run-forever", "stop"]);
        assert_eq!(motor.address()?, "outA");
        assert!(motor.take_error().is_some());
        Ok(())
    }
}
