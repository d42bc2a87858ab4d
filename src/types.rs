//! Types common to this crate.
use crate::error::{Error, Result};
use bitflags::bitflags;
use std::{fmt, str::FromStr};

bitflags! {
    /// Flags corresponding to a motor's `state` attribute.
    ///
    /// The kernel reports these as a space separated list of names, ie
    /// `running ramping`.
    ///
    /// See the [ev3dev docs][1] for details.
    ///
    /// [1]: https://docs.ev3dev.org/projects/docs-kernel/en/ev3dev-stretch/motors.html
    pub struct MotorState: u32 {
        /// Power is being sent to the motor.
        const RUNNING = 1;

        /// The motor is ramping up or down and has not yet reached a constant output level.
        const RAMPING = 2;

        /// The motor is not turning, but rather attempting to hold a fixed position.
        const HOLDING = 4;

        /// The motor is turning as fast as possible, but cannot reach its speed setpoint.
        const OVERLOADED = 8;

        /// The motor is trying to run but is not turning at all.
        const STALLED = 16;
    }
}

/// `state` token names and their flags.
const STATE_TABLE: &[(&str, MotorState)] = &[
    ("running", MotorState::RUNNING),
    ("ramping", MotorState::RAMPING),
    ("holding", MotorState::HOLDING),
    ("overloaded", MotorState::OVERLOADED),
    ("stalled", MotorState::STALLED),
];

impl MotorState {
    /// Parse the text of a `state` attribute.
    ///
    /// Empty text is an idle motor, [`MotorState::empty`].
    ///
    /// # Errors
    ///
    /// - If any token is not a known state. Unknown tokens are never ignored.
    pub fn from_text(text: &str) -> Result<Self> {
        let text = text.trim();
        let mut state = Self::empty();
        if text.is_empty() {
            return Ok(state);
        }
        for token in text.split(' ') {
            let (_, bit) = STATE_TABLE
                .iter()
                .find(|(name, _)| *name == token)
                .ok_or_else(|| Error::UnknownState {
                    token: token.into(),
                    text: text.into(),
                })?;
            state |= *bit;
        }
        Ok(state)
    }

    /// Power is being sent to the motor.
    pub fn is_running(&self) -> bool {
        self.contains(Self::RUNNING)
    }

    /// The motor is ramping up or down.
    pub fn is_ramping(&self) -> bool {
        self.contains(Self::RAMPING)
    }

    /// The motor is holding a fixed position.
    pub fn is_holding(&self) -> bool {
        self.contains(Self::HOLDING)
    }

    /// The motor cannot reach its setpoint.
    pub fn is_overloaded(&self) -> bool {
        self.contains(Self::OVERLOADED)
    }

    /// The motor is trying to run but is not turning.
    pub fn is_stalled(&self) -> bool {
        self.contains(Self::STALLED)
    }
}

/// Motor polarity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Polarity {
    /// Positive duty cycles turn the motor clockwise.
    Normal,

    /// Positive duty cycles turn the motor counter-clockwise.
    Inversed,
}

impl Polarity {
    /// The attribute text, `normal` or `inversed`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Inversed => "inversed",
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Polarity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "normal" => Ok(Self::Normal),
            "inversed" => Ok(Self::Inversed),
            _ => Err(Error::Parse {
                attribute: "polarity",
                text: s.into(),
                reason: "expected \"normal\" or \"inversed\"".into(),
            }),
        }
    }
}

/// A port name filter used when looking up devices.
///
/// An empty name matches any port.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Port(String);

impl Port {
    /// Matches only the port named `name`
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self(name.into())
    }

    /// Matches any port
    pub fn any() -> Self {
        Self::default()
    }

    /// Whether this matches any port
    pub fn is_any(&self) -> bool {
        self.0.is_empty()
    }

    /// Port name, or [`None`] if this matches any port
    pub fn name(&self) -> Option<&str> {
        if self.is_any() {
            None
        } else {
            Some(&self.0)
        }
    }
}

impl From<Option<&str>> for Port {
    fn from(port: Option<&str>) -> Self {
        port.map(Port::new).unwrap_or_default()
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "port {name}"),
            None => f.write_str("any port"),
        }
    }
}
