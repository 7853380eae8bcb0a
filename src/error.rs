//! Error types
//!
//! Every failure is classified and carries the name of the operation that
//! raised it. Nothing here is retried: invalid usage is rejected before it
//! reaches the native session.

use crate::backend::NativeResult;
use crate::resources::StateViolation;
use std::fmt;
use thiserror::Error;

/// Boxed error coming out of a native session
pub type NativeError = Box<dyn std::error::Error + Send + Sync>;

/// The four resource kinds, for type errors and creation failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Connection,
    Screen,
    Drawable,
    Window,
    Pixmap,
    GraphicsContext,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Connection => "connection",
            ResourceKind::Screen => "screen",
            ResourceKind::Drawable => "drawable",
            ResourceKind::Window => "window",
            ResourceKind::Pixmap => "pixmap",
            ResourceKind::GraphicsContext => "GC",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// Argument is not a resource of the expected kind
    #[error("{op}: wrong type argument (expected {expected}, got {found})")]
    WrongType {
        op: &'static str,
        expected: ResourceKind,
        found: ResourceKind,
    },

    /// Resource exists but its current state forbids the operation
    #[error("{op}: {violation}")]
    State {
        op: &'static str,
        violation: StateViolation,
    },

    /// The session returned the null id for a create request
    #[error("{op}: failed to create {kind} ({detail})")]
    CreationFailed {
        op: &'static str,
        kind: ResourceKind,
        detail: String,
    },

    /// A value argument has the wrong shape for its field
    #[error("{op}: wrong type argument for {field} (expected {expected})")]
    WrongValue {
        op: &'static str,
        field: &'static str,
        expected: &'static str,
    },

    /// The resources passed together belong to different connections
    #[error("{op}: resources belong to different displays")]
    ForeignResource { op: &'static str },

    /// Numeric argument outside its domain
    #[error("{op}: {what} {value} out of range")]
    OutOfRange {
        op: &'static str,
        what: &'static str,
        value: i64,
    },

    /// Drawing data has the wrong shape
    #[error("{op}: data has incorrect dimensions for {kind} ({detail})")]
    DataShape {
        op: &'static str,
        kind: &'static str,
        detail: String,
    },

    /// Opening the session failed
    #[error("failed to open display {display:?}: {source}")]
    Connect {
        display: Option<String>,
        #[source]
        source: NativeError,
    },

    /// Bad environment or command-line configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A validated native call failed
    #[error("{op}: native call failed: {source}")]
    Native {
        op: &'static str,
        #[source]
        source: NativeError,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn state(op: &'static str, violation: StateViolation) -> Self {
        Error::State { op, violation }
    }

    pub fn is_state_error(&self) -> bool {
        matches!(self, Error::State { .. })
    }

    pub fn is_type_error(&self) -> bool {
        matches!(
            self,
            Error::WrongType { .. } | Error::WrongValue { .. } | Error::ForeignResource { .. }
        )
    }

    pub fn is_range_error(&self) -> bool {
        matches!(self, Error::OutOfRange { .. })
    }

    /// The classified state violation, if this is a state error
    pub fn violation(&self) -> Option<&StateViolation> {
        match self {
            Error::State { violation, .. } => Some(violation),
            _ => None,
        }
    }
}

/// Attach the operation name to a native session failure
pub(crate) trait NativeContext<T> {
    fn native(self, op: &'static str) -> Result<T>;
}

impl<T> NativeContext<T> for NativeResult<T> {
    fn native(self, op: &'static str) -> Result<T> {
        self.map_err(|source| Error::Native { op, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::XID;
    use crate::resources::DrawableState;

    #[test]
    fn test_messages_name_the_operation() {
        let err = Error::state(
            "map_window",
            StateViolation::Drawable {
                id: XID(0x400002),
                state: DrawableState::MAPPED,
            },
        );
        assert!(err.is_state_error());
        assert_eq!(err.to_string(), "map_window: drawable 0x00400002 is already mapped");

        let err = Error::OutOfRange {
            op: "screen",
            what: "screen",
            value: 3,
        };
        assert!(err.is_range_error());
        assert!(!err.is_type_error());
        assert_eq!(err.to_string(), "screen: screen 3 out of range");
    }

    #[test]
    fn test_native_context() {
        let failed: NativeResult<()> = Err("broken pipe".into());
        let err = failed.native("flush").unwrap_err();
        assert_eq!(err.to_string(), "flush: native call failed: broken pipe");
        assert!(std::error::Error::source(&err).is_some());
    }
}
