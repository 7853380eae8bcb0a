/// Native session implementations
///
/// This module contains the session trait and the implementations the
/// resource layer can sit on: a real X server through x11rb, and an
/// in-memory null session used by tests and dry runs.

mod r#trait;
pub use r#trait::*;

pub mod null;
pub use null::{Journal, NativeCall, NullSession};

#[cfg(all(feature = "backend-x11", target_family = "unix"))]
pub mod x11;

use std::fmt;
use std::str::FromStr;

/// Which session implementation to open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    X11,
    Null,
}

impl BackendKind {
    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::X11 => "x11",
            BackendKind::Null => "null",
        }
    }
}

impl Default for BackendKind {
    fn default() -> Self {
        if cfg!(all(feature = "backend-x11", target_family = "unix")) {
            BackendKind::X11
        } else {
            BackendKind::Null
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "x11" => Ok(BackendKind::X11),
            "null" => Ok(BackendKind::Null),
            other => Err(format!("Unknown backend: {}", other)),
        }
    }
}

/// Get available backend names (features enabled + platform compatible)
#[allow(unused_mut)] // mut needed when features are enabled
pub fn available_backends() -> Vec<&'static str> {
    let mut backends = Vec::new();

    // X11 backend is available on Unix systems when feature is enabled
    #[cfg(all(feature = "backend-x11", target_family = "unix"))]
    backends.push("x11");

    backends.push("null");
    backends
}

/// Open a session of the given kind on `display`
pub fn open_session(kind: BackendKind, display: Option<&str>) -> NativeResult<Box<dyn NativeSession>> {
    match kind {
        #[cfg(all(feature = "backend-x11", target_family = "unix"))]
        BackendKind::X11 => Ok(Box::new(x11::X11Session::connect(display)?)),
        #[cfg(not(all(feature = "backend-x11", target_family = "unix")))]
        BackendKind::X11 => Err("x11 backend not compiled in".into()),
        BackendKind::Null => {
            let session = match display {
                Some(name) => NullSession::new().with_display_name(name),
                None => NullSession::new(),
            };
            Ok(Box::new(session))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_names() {
        assert_eq!("NULL".parse::<BackendKind>(), Ok(BackendKind::Null));
        assert_eq!("x11".parse::<BackendKind>(), Ok(BackendKind::X11));
        assert!("wayland".parse::<BackendKind>().is_err());
        assert!(available_backends().contains(&"null"));
    }

    #[test]
    fn test_open_null_session() {
        let session = open_session(BackendKind::Null, Some(":7")).unwrap();
        assert_eq!(session.info().display_name, ":7");
        assert_eq!(session.info().screens.len(), 1);
    }
}
