//! Resource wrappers for X11 clients
//!
//! This module holds the four wrapper kinds handed to callers (connection,
//! screen, drawable, GC), the states each can be in, and the identity table
//! that keeps one wrapper per server resource. Every operation checks the
//! wrapper's state before anything reaches the native session.

pub mod connection;
pub mod drawable;
pub mod gc;
pub mod screen;
pub mod state;
pub mod table;

pub use connection::Connection;
pub use drawable::Drawable;
pub use gc::{field, GcChange, GcValue, GraphicsContext};
pub use screen::Screen;
pub use state::{ConnectionState, DrawableState, GcState, StateViolation};
pub use table::Registry;

use crate::error::{Error, ResourceKind, Result};

/// Any resource wrapper
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    Connection(Connection),
    Screen(Screen),
    Drawable(Drawable),
    Gc(GraphicsContext),
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Connection(_) => ResourceKind::Connection,
            Resource::Screen(_) => ResourceKind::Screen,
            Resource::Drawable(d) => d.kind(),
            Resource::Gc(_) => ResourceKind::GraphicsContext,
        }
    }

    /// The connection this resource belongs to, whatever its state.
    /// `None` once every handle to that connection has been dropped.
    pub fn connection(&self) -> Option<Connection> {
        match self {
            Resource::Connection(c) => Some(c.clone()),
            Resource::Screen(s) => s.connection(),
            Resource::Drawable(d) => d.connection(),
            Resource::Gc(g) => g.connection(),
        }
    }

    /// Fail unless the owning connection is open
    pub fn require_open(&self, op: &'static str) -> Result<()> {
        let core = match self {
            Resource::Connection(c) => c.core(),
            Resource::Screen(s) => s.core(),
            Resource::Drawable(d) => d.core(),
            Resource::Gc(g) => g.core(),
        };
        core.require_open(op)
    }

    fn wrong_type(&self, op: &'static str, expected: ResourceKind) -> Error {
        Error::WrongType {
            op,
            expected,
            found: self.kind(),
        }
    }

    pub fn as_connection(&self, op: &'static str) -> Result<&Connection> {
        match self {
            Resource::Connection(c) => Ok(c),
            _ => Err(self.wrong_type(op, ResourceKind::Connection)),
        }
    }

    pub fn as_screen(&self, op: &'static str) -> Result<&Screen> {
        match self {
            Resource::Screen(s) => Ok(s),
            _ => Err(self.wrong_type(op, ResourceKind::Screen)),
        }
    }

    pub fn as_drawable(&self, op: &'static str) -> Result<&Drawable> {
        match self {
            Resource::Drawable(d) => Ok(d),
            _ => Err(self.wrong_type(op, ResourceKind::Drawable)),
        }
    }

    pub fn as_gc(&self, op: &'static str) -> Result<&GraphicsContext> {
        match self {
            Resource::Gc(g) => Ok(g),
            _ => Err(self.wrong_type(op, ResourceKind::GraphicsContext)),
        }
    }
}

impl From<Connection> for Resource {
    fn from(c: Connection) -> Self {
        Resource::Connection(c)
    }
}

impl From<Screen> for Resource {
    fn from(s: Screen) -> Self {
        Resource::Screen(s)
    }
}

impl From<Drawable> for Resource {
    fn from(d: Drawable) -> Self {
        Resource::Drawable(d)
    }
}

impl From<GraphicsContext> for Resource {
    fn from(g: GraphicsContext) -> Self {
        Resource::Gc(g)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::NullSession;

    #[test]
    fn test_display_of() {
        let conn = Connection::with_session(&Registry::new(), Box::new(NullSession::new()));
        let win = conn.create_window().unwrap();
        let gc = conn.default_gc(None).unwrap();
        let screen = conn.screen(None).unwrap();

        for resource in [
            Resource::from(win.clone()),
            Resource::from(gc),
            Resource::from(screen),
            Resource::from(conn.clone()),
        ] {
            assert_eq!(resource.connection().as_ref(), Some(&conn));
        }

        win.destroy().unwrap();
        conn.close().unwrap();
        let resource = Resource::from(win);
        assert_eq!(resource.connection().as_ref(), Some(&conn));
        assert!(resource.require_open("display_of").is_err());
    }

    #[test]
    fn test_display_of_after_finalization() {
        let conn = Connection::with_session(&Registry::new(), Box::new(NullSession::new()));
        let root = conn.root_window(None).unwrap();
        drop(conn);
        assert!(Resource::from(root).connection().is_none());
    }

    #[test]
    fn test_wrong_type() {
        let conn = Connection::with_session(&Registry::new(), Box::new(NullSession::new()));
        let pixmap = Resource::from(conn.create_pixmap(None, 2, 2, 1).unwrap());
        assert_eq!(pixmap.kind(), ResourceKind::Pixmap);
        let err = pixmap.as_gc("free_gc").unwrap_err();
        assert!(err.is_type_error());
        assert_eq!(
            err.to_string(),
            "free_gc: wrong type argument (expected GC, got pixmap)"
        );
        assert!(pixmap.as_drawable("map_window").is_ok());
    }
}
