//! Host-side events
//!
//! Every core event is presented as the same 17-slot [`Event`]. Slot `n`
//! means the same thing for every kind that uses it; kinds that reuse a
//! slot for a different field do so under the aliases in [`slot`]. Ids in
//! event data come back as [`Drawable`]s through the identity table, so an
//! event about a window created here yields that very window.

mod marshal;
mod queue;

pub use marshal::{marshal, marshal_into};

use crate::protocol::EventType;
use crate::resources::{Connection, Drawable};
use std::ops::Index;

pub const EVENT_SLOTS: usize = 17;

/// Slot positions and their per-kind aliases
pub mod slot {
    pub const TYPE: usize = 0;
    pub const SERIAL: usize = 1;
    pub const SEND_EVENT: usize = 2;
    pub const CONNECTION: usize = 3;
    pub const WINDOW: usize = 4;
    pub const ROOT: usize = 5;
    pub const SUBWINDOW: usize = 6;
    pub const TIME: usize = 7;
    pub const X: usize = 8;
    pub const Y: usize = 9;
    pub const X_ROOT: usize = 10;
    pub const Y_ROOT: usize = 11;
    pub const STATE: usize = 12;
    pub const KEYCODE: usize = 13;
    pub const SAME_SCREEN: usize = 14;
    pub const DETAIL: usize = 15;
    pub const FOCUS: usize = 16;

    pub const DRAWABLE: usize = WINDOW;
    pub const OWNER: usize = WINDOW;

    pub const PARENT: usize = ROOT;
    pub const REQUESTOR: usize = ROOT;

    pub const ABOVE: usize = SUBWINDOW;
    pub const TARGET: usize = SUBWINDOW;

    pub const EVENT: usize = TIME;

    pub const WIDTH: usize = X_ROOT;
    pub const HEIGHT: usize = Y_ROOT;

    pub const BUTTON: usize = KEYCODE;
    pub const IS_HINT: usize = KEYCODE;
    pub const MODE: usize = KEYCODE;
    pub const KEY_VECTOR: usize = KEYCODE;
    pub const COUNT: usize = KEYCODE;
    pub const FROM_CONFIGURE: usize = KEYCODE;
    pub const PLACE: usize = KEYCODE;
    pub const ATOM: usize = KEYCODE;
    pub const SELECTION: usize = KEYCODE;
    pub const COLORMAP: usize = KEYCODE;
    pub const DATA: usize = KEYCODE;

    pub const VALUE_MASK: usize = SAME_SCREEN;
    pub const PROPERTY: usize = SAME_SCREEN;

    pub const MAJOR_CODE: usize = DETAIL;
    pub const OVERRIDE_REDIRECT: usize = DETAIL;
    pub const NEW: usize = DETAIL;
    pub const MESSAGE_TYPE: usize = DETAIL;
    pub const REQUEST: usize = DETAIL;

    pub const MINOR_CODE: usize = FOCUS;
    pub const BORDER_WIDTH: usize = FOCUS;
    pub const FORMAT: usize = FOCUS;
    pub const FIRST_KEYCODE: usize = FOCUS;
}

/// Contents of one event slot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Slot {
    /// This kind of event has no such field
    #[default]
    NotApplicable,
    /// The field exists but its type (atom, colormap, ...) is not surfaced
    Unsupported,
    /// A resource field holding the none id
    Absent,
    Int(i64),
    Flag(bool),
    Connection(Connection),
    Drawable(Drawable),
}

impl Slot {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Slot::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Slot::Flag(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_drawable(&self) -> Option<&Drawable> {
        match self {
            Slot::Drawable(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_connection(&self) -> Option<&Connection> {
        match self {
            Slot::Connection(c) => Some(c),
            _ => None,
        }
    }

    pub fn is_applicable(&self) -> bool {
        !matches!(self, Slot::NotApplicable)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    slots: [Slot; EVENT_SLOTS],
}

impl Default for Event {
    fn default() -> Self {
        Event {
            slots: std::array::from_fn(|_| Slot::NotApplicable),
        }
    }
}

impl Event {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset every slot to not-applicable
    pub fn clear(&mut self) {
        for s in self.slots.iter_mut() {
            *s = Slot::NotApplicable;
        }
    }

    pub fn get(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    pub(crate) fn set(&mut self, index: usize, value: Slot) {
        self.slots[index] = value;
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Type code, SendEvent bit stripped
    pub fn code(&self) -> Option<u8> {
        self.slots[slot::TYPE].as_int().and_then(|v| u8::try_from(v).ok())
    }

    pub fn event_type(&self) -> Option<EventType> {
        self.code().and_then(EventType::from_u8)
    }

    pub fn serial(&self) -> Option<u64> {
        self.slots[slot::SERIAL].as_int().map(|v| v as u64)
    }

    pub fn send_event(&self) -> bool {
        self.slots[slot::SEND_EVENT].as_flag().unwrap_or(false)
    }

    pub fn connection(&self) -> Option<&Connection> {
        self.slots[slot::CONNECTION].as_connection()
    }

    pub fn window(&self) -> Option<&Drawable> {
        self.slots[slot::WINDOW].as_drawable()
    }
}

impl Index<usize> for Event {
    type Output = Slot;

    fn index(&self, index: usize) -> &Slot {
        &self.slots[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases() {
        assert_eq!(slot::WIDTH, 10);
        assert_eq!(slot::HEIGHT, 11);
        assert_eq!(slot::COUNT, 13);
        assert_eq!(slot::OVERRIDE_REDIRECT, 15);
        assert_eq!(slot::BORDER_WIDTH, 16);
        assert_eq!(slot::PARENT, 5);
        assert_eq!(slot::EVENT, 7);
        assert_eq!(slot::VALUE_MASK, 14);
        assert_eq!(slot::ABOVE, 6);
    }

    #[test]
    fn test_empty_event() {
        let event = Event::new();
        assert_eq!(event.slots().len(), EVENT_SLOTS);
        assert!(event.slots().iter().all(|s| !s.is_applicable()));
        assert_eq!(event.event_type(), None);
        assert!(event.get(EVENT_SLOTS).is_none());
    }
}
