//! Core X11 protocol types
//!
//! Wire-level identifiers and the fixed-layout records the drawing and
//! clipping requests consume. They are kept minimal and close to the wire.

use std::fmt;

/// X11 resource ID - used for windows, pixmaps, graphics contexts, etc.
/// In X11, all objects are identified by 29-bit IDs.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct XID(pub u32);

impl XID {
    pub const NONE: XID = XID(0);

    pub fn new(id: u32) -> Self {
        XID(id)
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    pub fn is_none(&self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for XID {
    fn from(id: u32) -> Self {
        XID(id)
    }
}

impl fmt::Display for XID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

/// Point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i16,
    pub y: i16,
}

impl Point {
    pub fn new(x: i16, y: i16) -> Self {
        Point { x, y }
    }
}

/// Rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rectangle {
    pub x: i16,
    pub y: i16,
    pub width: u16,
    pub height: u16,
}

impl Rectangle {
    pub fn new(x: i16, y: i16, width: u16, height: u16) -> Self {
        Rectangle {
            x,
            y,
            width,
            height,
        }
    }
}

/// Segment (for drawing line segments)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub x1: i16,
    pub y1: i16,
    pub x2: i16,
    pub y2: i16,
}

/// Arc (for drawing arcs and ellipses). Angles are in 64ths of a degree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arc {
    pub x: i16,
    pub y: i16,
    pub width: u16,
    pub height: u16,
    pub angle1: i16,
    pub angle2: i16,
}

/// Event masks, as passed to SelectInput and the mask-filtered event reads
pub mod event_mask {
    pub const NO_EVENT: u32 = 0;
    pub const KEY_PRESS: u32 = 1 << 0;
    pub const KEY_RELEASE: u32 = 1 << 1;
    pub const BUTTON_PRESS: u32 = 1 << 2;
    pub const BUTTON_RELEASE: u32 = 1 << 3;
    pub const ENTER_WINDOW: u32 = 1 << 4;
    pub const LEAVE_WINDOW: u32 = 1 << 5;
    pub const POINTER_MOTION: u32 = 1 << 6;
    pub const POINTER_MOTION_HINT: u32 = 1 << 7;
    pub const BUTTON1_MOTION: u32 = 1 << 8;
    pub const BUTTON2_MOTION: u32 = 1 << 9;
    pub const BUTTON3_MOTION: u32 = 1 << 10;
    pub const BUTTON4_MOTION: u32 = 1 << 11;
    pub const BUTTON5_MOTION: u32 = 1 << 12;
    pub const BUTTON_MOTION: u32 = 1 << 13;
    pub const KEYMAP_STATE: u32 = 1 << 14;
    pub const EXPOSURE: u32 = 1 << 15;
    pub const VISIBILITY_CHANGE: u32 = 1 << 16;
    pub const STRUCTURE_NOTIFY: u32 = 1 << 17;
    pub const RESIZE_REDIRECT: u32 = 1 << 18;
    pub const SUBSTRUCTURE_NOTIFY: u32 = 1 << 19;
    pub const SUBSTRUCTURE_REDIRECT: u32 = 1 << 20;
    pub const FOCUS_CHANGE: u32 = 1 << 21;
    pub const PROPERTY_CHANGE: u32 = 1 << 22;
    pub const COLORMAP_CHANGE: u32 = 1 << 23;
    pub const OWNER_GRAB_BUTTON: u32 = 1 << 24;

    /// Every motion-related mask; any of them selects MotionNotify
    pub const ANY_MOTION: u32 = POINTER_MOTION
        | POINTER_MOTION_HINT
        | BUTTON1_MOTION
        | BUTTON2_MOTION
        | BUTTON3_MOTION
        | BUTTON4_MOTION
        | BUTTON5_MOTION
        | BUTTON_MOTION;
}

/// Ordering hint for SetClipRectangles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum ClipOrdering {
    #[default]
    Unsorted = 0,
    YSorted = 1,
    YXSorted = 2,
    YXBanded = 3,
}

impl ClipOrdering {
    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(ClipOrdering::Unsorted),
            1 => Some(ClipOrdering::YSorted),
            2 => Some(ClipOrdering::YXSorted),
            3 => Some(ClipOrdering::YXBanded),
            _ => None,
        }
    }
}

/// How far `events_queued` may go to find events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum QueueMode {
    /// Only count events already read into the local queue
    #[default]
    Already = 0,
    /// Read whatever the session has buffered, without flushing
    AfterReading = 1,
    /// Flush the output buffer, then read
    AfterFlush = 2,
}

impl QueueMode {
    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(QueueMode::Already),
            1 => Some(QueueMode::AfterReading),
            2 => Some(QueueMode::AfterFlush),
            _ => None,
        }
    }
}

/// Value of AllPlanes: a plane mask with every bit set
pub const ALL_PLANES: u32 = !0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xid_display() {
        assert_eq!(XID::new(0x2a).to_string(), "0x0000002a");
        assert!(XID::NONE.is_none());
    }

    #[test]
    fn test_ordering_ranges() {
        assert_eq!(ClipOrdering::from_i64(3), Some(ClipOrdering::YXBanded));
        assert_eq!(ClipOrdering::from_i64(4), None);
        assert_eq!(ClipOrdering::from_i64(-1), None);
        assert_eq!(QueueMode::from_i64(2), Some(QueueMode::AfterFlush));
        assert_eq!(QueueMode::from_i64(3), None);
    }
}
