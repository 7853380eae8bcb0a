/// X11 protocol definitions
///
/// The wire-level pieces the resource layer needs: resource ids, the records
/// drawing requests take, and the 32-byte core event format.

pub mod types;
pub mod events;

pub use types::*;
pub use events::*;

/// X11 protocol version
pub const PROTOCOL_MAJOR_VERSION: u16 = 11;
pub const PROTOCOL_MINOR_VERSION: u16 = 0;
