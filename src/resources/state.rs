//! Resource states and the guards that gate every operation on them
//!
//! A wrapper is always in exactly one state. Operations pass the set of
//! states they accept; a mismatch is reported by the state the wrapper is
//! actually in, so callers can tell "already mapped" from "destroyed".

use crate::protocol::XID;
use bitflags::bitflags;
use std::fmt;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ConnectionState: u8 {
        const OPEN = 1 << 0;
        const CLOSED = 1 << 1;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DrawableState: u8 {
        const UNMAPPED = 1 << 0;
        const MAPPED = 1 << 1;
        const DESTROYED = 1 << 2;
        /// Created by the server or another client; never destroyed here
        const THIRD_PARTY = 1 << 3;
        const PIXMAP = 1 << 4;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct GcState: u8 {
        const DEFAULT = 1 << 0;
        const CREATED = 1 << 1;
        const FREED = 1 << 2;
    }
}

/// Why a resource was rejected, named after the state it was found in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateViolation {
    ConnectionClosed,
    Drawable { id: XID, state: DrawableState },
    Gc { id: XID, state: GcState },
}

const DRAWABLE_PHRASES: [(DrawableState, &str); 5] = [
    (DrawableState::UNMAPPED, "is already unmapped"),
    (DrawableState::MAPPED, "is already mapped"),
    (DrawableState::DESTROYED, "has been destroyed"),
    (DrawableState::THIRD_PARTY, "belongs to a third party"),
    (DrawableState::PIXMAP, "is a pixmap"),
];

const GC_PHRASES: [(GcState, &str); 3] = [
    (GcState::DEFAULT, "is the default GC"),
    (GcState::CREATED, "is a created GC"),
    (GcState::FREED, "has been freed"),
];

fn phrase<S: PartialEq + Copy>(table: &[(S, &'static str)], state: S) -> Option<&'static str> {
    table.iter().find(|(s, _)| *s == state).map(|(_, p)| *p)
}

impl fmt::Display for StateViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateViolation::ConnectionClosed => write!(f, "display has been closed"),
            StateViolation::Drawable { id, state } => match phrase(&DRAWABLE_PHRASES, *state) {
                Some(what) => write!(f, "drawable {} {}", id, what),
                None => write!(f, "drawable {} is in a corrupt state ({:#x})", id, state.bits()),
            },
            StateViolation::Gc { id, state } => match phrase(&GC_PHRASES, *state) {
                Some(what) => write!(f, "GC {} {}", id, what),
                None => write!(f, "GC {} is in a corrupt state ({:#x})", id, state.bits()),
            },
        }
    }
}

pub fn check_connection(
    actual: ConnectionState,
    allowed: ConnectionState,
) -> Result<(), StateViolation> {
    if actual.intersects(allowed) {
        Ok(())
    } else {
        Err(StateViolation::ConnectionClosed)
    }
}

pub fn check_drawable(
    id: XID,
    actual: DrawableState,
    allowed: DrawableState,
) -> Result<(), StateViolation> {
    if actual.intersects(allowed) {
        Ok(())
    } else {
        Err(StateViolation::Drawable { id, state: actual })
    }
}

pub fn check_gc(id: XID, actual: GcState, allowed: GcState) -> Result<(), StateViolation> {
    if actual.intersects(allowed) {
        Ok(())
    } else {
        Err(StateViolation::Gc { id, state: actual })
    }
}
