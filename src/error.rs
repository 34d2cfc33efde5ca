//! Error types

use crate::pie::{PieGroup, Vector};
use core::fmt;

/// Invalid peripheral configuration, caught before any register is written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A period of zero counts, which the device does not define
    ZeroPeriod,
    /// A requested event rate of 0 Hz
    ZeroFrequency,
    /// The requested period does not fit the counter at the selected clock
    PeriodOutOfRange,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroPeriod => write!(f, "period must be non-zero"),
            Self::ZeroFrequency => write!(f, "frequency must be non-zero"),
            Self::PeriodOutOfRange => write!(f, "period out of range for the counter"),
        }
    }
}

impl core::error::Error for ConfigError {}

/// Vector table binding failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindError {
    /// The slot already holds a handler
    AlreadyBound(Vector),
    /// The slot is armed and its handler cannot be removed
    Armed(Vector),
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyBound(v) => write!(f, "vector {} already has a handler", v),
            Self::Armed(v) => write!(f, "vector {} is armed", v),
        }
    }
}

impl core::error::Error for BindError {}

/// Arming failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmError {
    /// No handler is bound to the slot
    Unbound(Vector),
}

impl fmt::Display for ArmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbound(v) => write!(f, "vector {} has no handler", v),
        }
    }
}

impl core::error::Error for ArmError {}

/// Delivery that could not be completed. The PIE group stays latched in both cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchError {
    /// The CPU fetched a vector with no handler
    Unbound(Vector),
    /// A PIE group reached the core but none of its enabled channels was still pending
    Spurious(PieGroup),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbound(v) => write!(f, "interrupt on unbound vector {}", v),
            Self::Spurious(g) => write!(f, "spurious interrupt on PIE group {}", *g as u8 + 1),
        }
    }
}

impl core::error::Error for DispatchError {}

/// Any error raised while setting up or running interrupts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Peripheral configuration
    Config(ConfigError),
    /// Vector table binding
    Bind(BindError),
    /// Arming
    Arm(ArmError),
    /// Delivery
    Dispatch(DispatchError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "configuration error: {}", e),
            Self::Bind(e) => write!(f, "bind error: {}", e),
            Self::Arm(e) => write!(f, "arm error: {}", e),
            Self::Dispatch(e) => write!(f, "dispatch error: {}", e),
        }
    }
}

impl core::error::Error for Error {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Bind(e) => Some(e),
            Self::Arm(e) => Some(e),
            Self::Dispatch(e) => Some(e),
        }
    }
}

macro_rules! from_error {
    ($($variant:ident($ty:ty)),*) => {
        $(
            impl From<$ty> for Error {
                fn from(e: $ty) -> Self {
                    Error::$variant(e)
                }
            }
        )*
    };
}

from_error!(
    Config(ConfigError),
    Bind(BindError),
    Arm(ArmError),
    Dispatch(DispatchError)
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_vector() {
        let e = Error::from(BindError::AlreadyBound(Vector::EPWM1_INT));
        assert_eq!(
            format!("{}", e),
            "bind error: vector INT3.1 already has a handler"
        );
        let e = DispatchError::Unbound(Vector::TINT2);
        assert_eq!(format!("{}", e), "interrupt on unbound vector INT14");
    }

    #[test]
    fn umbrella_reports_source() {
        use core::error::Error as _;
        let e = Error::from(ConfigError::ZeroPeriod);
        assert!(e.source().is_some());
        assert_eq!(format!("{}", e), "configuration error: period must be non-zero");
    }
}
