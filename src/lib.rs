//! High level bindings to ev3dev sysfs device classes
//!
//! # Implementation details
//!
//! ev3dev exposes its devices through class directories in `/sys`, one
//! directory per device and one text file per attribute, so this library
//! requires sysfs to exist. See [`sysfs::Sysfs`] for using another root.
//!
//! Devices are found with [`class::Handle::find`], and accessed through typed
//! getters and chainable setters. See [`class`] for how setter errors work.
//!
//! These interfaces are documented by ev3dev, and this crate attempts to
//! link their documentation where possible.
//! This is done on a best effort basis.
#![doc(html_root_url = "https://docs.rs/ev3sys/0.1.0")]

pub mod class;
pub mod error;
pub mod sysfs;
pub mod types;
pub mod util;

pub use self::{
    class::{dc_motor::DcMotor, Found, Handle},
    error::{Error, Result},
    types::{MotorState, Polarity},
};
