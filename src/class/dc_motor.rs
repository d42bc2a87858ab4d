//! Abstraction for handling devices in the dc-motor class
//!
//! # Implementation
//!
//! These are motors without position feedback, driven by duty cycle alone,
//! ie RCX motors on an EV3 output port.
//!
//! See the [ev3dev kernel docs][1]
//!
//! [1]: https://docs.ev3dev.org/projects/docs-kernel/en/ev3dev-stretch/motors.html
use super::{Class, Handle};
use crate::{
    error::Result,
    sysfs::{attribute, Store, Sysfs},
    types::{MotorState, Polarity},
    util::DC_MOTOR_PATH,
};
use std::time::Duration;

mod attr {
    pub const DUTY_CYCLE: &str = "duty_cycle";
    pub const DUTY_CYCLE_SP: &str = "duty_cycle_sp";
    pub const POLARITY: &str = "polarity";
    pub const RAMP_DOWN_SP: &str = "ramp_down_sp";
    pub const RAMP_UP_SP: &str = "ramp_up_sp";
    pub const STATE: &str = "state";
    pub const STOP_ACTION: &str = "stop_action";
    pub const STOP_ACTIONS: &str = "stop_actions";
    pub const TIME_SP: &str = "time_sp";
}

/// Valid duty cycle setpoints, in percent
const DUTY_CYCLE_RANGE: std::ops::RangeInclusive<i64> = -100..=100;

/// Valid ramp setpoints, in milliseconds
const RAMP_RANGE: std::ops::RangeInclusive<i64> = 0..=10_000;

/// The dc-motor class
#[derive(Debug, Clone, Copy)]
pub enum DcMotorClass {}

impl Class for DcMotorClass {
    const PATH: &'static str = DC_MOTOR_PATH;
    const PREFIX: &'static str = "motor";
}

/// A handle to a dc-motor
pub type DcMotor<S = Sysfs> = Handle<DcMotorClass, S>;

/// Milliseconds in `d`, truncated. Saturates instead of overflowing.
fn millis(d: Duration) -> i64 {
    i64::try_from(d.as_millis()).unwrap_or(i64::MAX)
}

impl<S: Store> Handle<DcMotorClass, S> {
    /// Current duty cycle, in percent.
    pub fn duty_cycle(&self) -> Result<i32> {
        attribute::int(attr::DUTY_CYCLE, &self.read(attr::DUTY_CYCLE)?)
    }

    /// Duty cycle setpoint, in percent.
    pub fn duty_cycle_setpoint(&self) -> Result<i32> {
        attribute::int(attr::DUTY_CYCLE_SP, &self.read(attr::DUTY_CYCLE_SP)?)
    }

    /// Set the duty cycle setpoint, in percent.
    ///
    /// Must be within `-100..=100`. Negative values reverse the motor.
    pub fn set_duty_cycle_setpoint(&mut self, sp: i32) -> &mut Self {
        self.set_in_range(attr::DUTY_CYCLE_SP, sp.into(), DUTY_CYCLE_RANGE)
    }

    /// Current polarity, `normal` or `inversed`.
    pub fn polarity(&self) -> Result<Polarity> {
        self.read(attr::POLARITY)?.parse()
    }

    /// Set the polarity.
    pub fn set_polarity(&mut self, polarity: Polarity) -> &mut Self {
        self.set(attr::POLARITY, polarity.as_str())
    }

    /// Time to ramp from 0 to 100% duty cycle.
    pub fn ramp_up_setpoint(&self) -> Result<Duration> {
        attribute::duration(attr::RAMP_UP_SP, &self.read(attr::RAMP_UP_SP)?)
    }

    /// Set the time to ramp from 0 to 100% duty cycle.
    ///
    /// Must be at most 10 seconds. Sub-millisecond precision is truncated.
    pub fn set_ramp_up_setpoint(&mut self, sp: Duration) -> &mut Self {
        self.set_in_range(attr::RAMP_UP_SP, millis(sp), RAMP_RANGE)
    }

    /// Time to ramp from 100 to 0% duty cycle.
    pub fn ramp_down_setpoint(&self) -> Result<Duration> {
        attribute::duration(attr::RAMP_DOWN_SP, &self.read(attr::RAMP_DOWN_SP)?)
    }

    /// Set the time to ramp from 100 to 0% duty cycle.
    ///
    /// Must be at most 10 seconds. Sub-millisecond precision is truncated.
    pub fn set_ramp_down_setpoint(&mut self, sp: Duration) -> &mut Self {
        self.set_in_range(attr::RAMP_DOWN_SP, millis(sp), RAMP_RANGE)
    }

    /// Current motor state.
    ///
    /// # Errors
    ///
    /// If a setter error is stored, it is taken and returned instead of
    /// reading the state.
    pub fn state(&mut self) -> Result<MotorState> {
        if let Some(e) = self.take_error() {
            return Err(e);
        }
        MotorState::from_text(&self.read(attr::STATE)?)
    }

    /// Action taken when a `stop` command is issued.
    pub fn stop_action(&self) -> Result<String> {
        self.read_string(attr::STOP_ACTION)
    }

    /// Set the action taken when a `stop` command is issued.
    ///
    /// Must be one of [`Handle::stop_actions`].
    pub fn set_stop_action(&mut self, action: &str) -> &mut Self {
        self.set_available(attr::STOP_ACTION, attr::STOP_ACTIONS, action)
    }

    /// Stop actions the motor currently accepts
    pub fn stop_actions(&self) -> Result<Vec<String>> {
        Ok(attribute::string_list(&self.read(attr::STOP_ACTIONS)?))
    }

    /// How long the motor runs for the `run-timed` command.
    pub fn time_setpoint(&self) -> Result<Duration> {
        attribute::duration(attr::TIME_SP, &self.read(attr::TIME_SP)?)
    }

    /// Set how long the motor runs for the `run-timed` command.
    ///
    /// Sub-millisecond precision is truncated.
    pub fn set_time_setpoint(&mut self, sp: Duration) -> &mut Self {
        self.set(attr::TIME_SP, &attribute::duration_text(sp))
    }
}
