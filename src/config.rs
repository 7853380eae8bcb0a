//! Runtime configuration
//!
//! Which backend to open, which display to open it on, and the defaults
//! applied to windows created through a connection.

use crate::backend::BackendKind;
use crate::error::{Error, Result};
use std::env;

/// Environment variable selecting the backend by name
pub const BACKEND_ENV: &str = "X11HANDLES_BACKEND";

/// Geometry and title given to every window `create_window` makes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowDefaults {
    pub width: u16,
    pub height: u16,
    pub border_width: u16,
    pub title: String,
}

impl Default for WindowDefaults {
    fn default() -> Self {
        WindowDefaults {
            width: 600,
            height: 400,
            border_width: 0,
            title: "x11handles".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Display name to open; `None` lets the backend pick ($DISPLAY)
    pub display: Option<String>,
    pub backend: BackendKind,
    pub window: WindowDefaults,
}

impl Config {
    /// Build a configuration from `DISPLAY` and `X11HANDLES_BACKEND`
    pub fn from_env() -> Result<Self> {
        Self::from_vars(env::var("DISPLAY").ok(), env::var(BACKEND_ENV).ok())
    }

    fn from_vars(display: Option<String>, backend: Option<String>) -> Result<Self> {
        let mut config = Config {
            display: display.filter(|d| !d.is_empty()),
            ..Config::default()
        };
        if let Some(name) = backend.filter(|b| !b.is_empty()) {
            config.backend = name.parse().map_err(Error::Config)?;
        }
        log::debug!(
            "config: backend {} on display {:?}",
            config.backend,
            config.display
        );
        Ok(config)
    }

    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = Some(display.into());
        self
    }

    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_window(mut self, window: WindowDefaults) -> Self {
        self.window = window;
        self
    }
}
