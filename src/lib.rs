/// x11handles - Safe handles over an X11 client session
///
/// This library wraps a native X11 client session in reference-counted
/// handles for connections, screens, drawables and graphics contexts. Each
/// handle tracks the state of its server resource, rejects operations that
/// state does not allow, and releases what it owns when it is dropped, never
/// after its connection has gone away. Events are delivered as uniform
/// 17-slot records whose resource ids resolve to the same handles.

pub mod protocol;
pub mod backend;
pub mod resources;
pub mod event;
pub mod draw;
pub mod error;
pub mod config;

pub use backend::{BackendKind, NativeSession, NullSession};
pub use config::{Config, WindowDefaults};
pub use draw::{DataKind, ShortArray};
pub use error::{Error, ResourceKind, Result};
pub use event::{marshal, marshal_into, slot, Event, Slot};
pub use protocol::{event_mask, EventType, XID};
pub use resources::{
    field, Connection, ConnectionState, Drawable, DrawableState, GcChange, GcState, GcValue,
    GraphicsContext, Registry, Resource, Screen, StateViolation,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// A plane mask with every bit set
pub fn all_planes() -> u32 {
    protocol::ALL_PLANES
}
