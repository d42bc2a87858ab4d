//! Error handling stuff
use crate::types::Port;
use displaydoc::Display;
use std::{io, path::PathBuf};
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error type for everything in [`crate`]
#[derive(Debug, Display, Error)]
pub enum Error {
    /// Couldn't access `{attribute}` of {device}: {source}
    Io {
        device: String,
        attribute: &'static str,
        source: io::Error,
    },

    /// Couldn't scan device class directory {path:?}: {source}
    Scan { path: PathBuf, source: io::Error },

    /// Couldn't parse a device id from device name {name:?}
    BadDeviceName { name: String },

    /// Couldn't find a {kind} device for driver {driver:?} on {port}
    NotFound {
        kind: &'static str,
        driver: String,
        port: Port,
    },

    /// Driver mismatch for {device}: wanted {want:?}, have {have:?}
    DriverMismatch {
        device: String,
        want: String,
        have: String,
    },

    /// Invalid {attribute}: {value} (valid {min} - {max})
    OutOfRange {
        attribute: &'static str,
        value: String,
        min: String,
        max: String,
    },

    /// {attribute} {value:?} not available for {device} (available: {available:?})
    NotAvailable {
        attribute: &'static str,
        value: String,
        device: String,
        available: Vec<String>,
    },

    /// Couldn't parse `{attribute}` value {text:?}: {reason}
    Parse {
        attribute: &'static str,
        text: String,
        reason: String,
    },

    /// Unrecognized motor state value {token:?} in [{text}]
    UnknownState { token: String, text: String },
}

impl Error {
    /// Whether this is a [`Error::NotFound`]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether this is a [`Error::DriverMismatch`]
    pub fn is_driver_mismatch(&self) -> bool {
        matches!(self, Self::DriverMismatch { .. })
    }
}
