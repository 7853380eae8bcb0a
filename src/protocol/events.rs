//! X11 protocol events
//!
//! Events arrive from the server as fixed 32-byte records whose first byte is
//! the type code (with the high bit set for SendEvent-generated events). This
//! module decodes those records into a tagged [`WireEvent`] and encodes them
//! back, which the null session uses to synthesize traffic.

use super::types::*;
use byteorder::{ByteOrder, NativeEndian};

/// Size of every core event on the wire
pub const EVENT_SIZE: usize = 32;

/// Set in the type byte when the event was produced by SendEvent
pub const SEND_EVENT_BIT: u8 = 0x80;

/// Event type codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EventType {
    KeyPress = 2,
    KeyRelease = 3,
    ButtonPress = 4,
    ButtonRelease = 5,
    MotionNotify = 6,
    EnterNotify = 7,
    LeaveNotify = 8,
    FocusIn = 9,
    FocusOut = 10,
    KeymapNotify = 11,
    Expose = 12,
    GraphicsExposure = 13,
    NoExposure = 14,
    VisibilityNotify = 15,
    CreateNotify = 16,
    DestroyNotify = 17,
    UnmapNotify = 18,
    MapNotify = 19,
    MapRequest = 20,
    ReparentNotify = 21,
    ConfigureNotify = 22,
    ConfigureRequest = 23,
    GravityNotify = 24,
    ResizeRequest = 25,
    CirculateNotify = 26,
    CirculateRequest = 27,
    PropertyNotify = 28,
    SelectionClear = 29,
    SelectionRequest = 30,
    SelectionNotify = 31,
    ColormapNotify = 32,
    ClientMessage = 33,
    MappingNotify = 34,
}

impl EventType {
    pub fn from_u8(code: u8) -> Option<Self> {
        use EventType::*;
        let kind = match code {
            2 => KeyPress,
            3 => KeyRelease,
            4 => ButtonPress,
            5 => ButtonRelease,
            6 => MotionNotify,
            7 => EnterNotify,
            8 => LeaveNotify,
            9 => FocusIn,
            10 => FocusOut,
            11 => KeymapNotify,
            12 => Expose,
            13 => GraphicsExposure,
            14 => NoExposure,
            15 => VisibilityNotify,
            16 => CreateNotify,
            17 => DestroyNotify,
            18 => UnmapNotify,
            19 => MapNotify,
            20 => MapRequest,
            21 => ReparentNotify,
            22 => ConfigureNotify,
            23 => ConfigureRequest,
            24 => GravityNotify,
            25 => ResizeRequest,
            26 => CirculateNotify,
            27 => CirculateRequest,
            28 => PropertyNotify,
            29 => SelectionClear,
            30 => SelectionRequest,
            31 => SelectionNotify,
            32 => ColormapNotify,
            33 => ClientMessage,
            34 => MappingNotify,
            _ => return None,
        };
        Some(kind)
    }

    /// The input mask bits that select this kind of event.
    ///
    /// Selection, client-message and mapping events cannot be selected and
    /// return zero, so they never satisfy a mask-filtered read.
    pub fn selecting_mask(&self) -> u32 {
        use event_mask::*;
        match self {
            EventType::KeyPress => KEY_PRESS,
            EventType::KeyRelease => KEY_RELEASE,
            EventType::ButtonPress => BUTTON_PRESS,
            EventType::ButtonRelease => BUTTON_RELEASE,
            EventType::MotionNotify => ANY_MOTION,
            EventType::EnterNotify => ENTER_WINDOW,
            EventType::LeaveNotify => LEAVE_WINDOW,
            EventType::FocusIn | EventType::FocusOut => FOCUS_CHANGE,
            EventType::KeymapNotify => KEYMAP_STATE,
            EventType::Expose | EventType::GraphicsExposure | EventType::NoExposure => EXPOSURE,
            EventType::VisibilityNotify => VISIBILITY_CHANGE,
            EventType::CreateNotify => SUBSTRUCTURE_NOTIFY,
            EventType::DestroyNotify
            | EventType::UnmapNotify
            | EventType::MapNotify
            | EventType::ReparentNotify
            | EventType::ConfigureNotify
            | EventType::GravityNotify
            | EventType::CirculateNotify => STRUCTURE_NOTIFY | SUBSTRUCTURE_NOTIFY,
            EventType::MapRequest | EventType::ConfigureRequest | EventType::CirculateRequest => {
                SUBSTRUCTURE_REDIRECT
            }
            EventType::ResizeRequest => RESIZE_REDIRECT,
            EventType::PropertyNotify => PROPERTY_CHANGE,
            EventType::ColormapNotify => COLORMAP_CHANGE,
            EventType::SelectionClear
            | EventType::SelectionRequest
            | EventType::SelectionNotify
            | EventType::ClientMessage
            | EventType::MappingNotify => NO_EVENT,
        }
    }
}

/// An event record as handed over by the native session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    /// Full-width request serial the event follows
    pub serial: u64,
    pub bytes: [u8; EVENT_SIZE],
}

impl RawEvent {
    /// Build a raw record from a decoded event, stamping the low 16 bits of
    /// `serial` into the sequence field.
    pub fn new(serial: u64, event: &WireEvent, send_event: bool) -> Self {
        let mut bytes = [0u8; EVENT_SIZE];
        event.encode(&mut bytes);
        if send_event {
            bytes[0] |= SEND_EVENT_BIT;
        }
        if !matches!(event, WireEvent::KeymapNotify(_)) {
            NativeEndian::write_u16(&mut bytes[2..4], serial as u16);
        }
        RawEvent { serial, bytes }
    }

    /// Wrap bytes read from the session. Short reads are zero padded.
    pub fn from_slice(serial: u64, data: &[u8]) -> Self {
        let mut bytes = [0u8; EVENT_SIZE];
        let len = data.len().min(EVENT_SIZE);
        bytes[..len].copy_from_slice(&data[..len]);
        RawEvent { serial, bytes }
    }

    /// Type code with the SendEvent bit stripped
    pub fn code(&self) -> u8 {
        self.bytes[0] & !SEND_EVENT_BIT
    }

    pub fn send_event(&self) -> bool {
        self.bytes[0] & SEND_EVENT_BIT != 0
    }

    pub fn event_type(&self) -> Option<EventType> {
        EventType::from_u8(self.code())
    }

    pub fn decode(&self) -> WireEvent {
        WireEvent::decode(&self.bytes)
    }
}

/// KeyPress, KeyRelease, ButtonPress, ButtonRelease and MotionNotify share
/// one layout; `detail` is the keycode, button or is-hint flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputEvent {
    pub detail: u8,
    pub time: u32,
    pub root: XID,
    pub event: XID,
    pub child: XID,
    pub root_x: i16,
    pub root_y: i16,
    pub event_x: i16,
    pub event_y: i16,
    pub state: u16,
    pub same_screen: bool,
}

/// EnterNotify and LeaveNotify
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CrossingEvent {
    pub detail: u8,
    pub time: u32,
    pub root: XID,
    pub event: XID,
    pub child: XID,
    pub root_x: i16,
    pub root_y: i16,
    pub event_x: i16,
    pub event_y: i16,
    pub state: u16,
    pub mode: u8,
    pub same_screen: bool,
    pub focus: bool,
}

/// FocusIn and FocusOut
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FocusEvent {
    pub detail: u8,
    pub event: XID,
    pub mode: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeymapEvent {
    pub keys: [u8; 31],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExposeEvent {
    pub window: XID,
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
    pub count: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GraphicsExposureEvent {
    pub drawable: XID,
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
    pub minor_opcode: u16,
    pub count: u16,
    pub major_opcode: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NoExposureEvent {
    pub drawable: XID,
    pub minor_opcode: u16,
    pub major_opcode: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VisibilityEvent {
    pub window: XID,
    pub state: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CreateNotifyEvent {
    pub parent: XID,
    pub window: XID,
    pub x: i16,
    pub y: i16,
    pub width: u16,
    pub height: u16,
    pub border_width: u16,
    pub override_redirect: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DestroyNotifyEvent {
    pub event: XID,
    pub window: XID,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnmapNotifyEvent {
    pub event: XID,
    pub window: XID,
    pub from_configure: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MapNotifyEvent {
    pub event: XID,
    pub window: XID,
    pub override_redirect: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MapRequestEvent {
    pub parent: XID,
    pub window: XID,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReparentNotifyEvent {
    pub event: XID,
    pub window: XID,
    pub parent: XID,
    pub x: i16,
    pub y: i16,
    pub override_redirect: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConfigureNotifyEvent {
    pub event: XID,
    pub window: XID,
    pub above_sibling: XID,
    pub x: i16,
    pub y: i16,
    pub width: u16,
    pub height: u16,
    pub border_width: u16,
    pub override_redirect: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConfigureRequestEvent {
    pub stack_mode: u8,
    pub parent: XID,
    pub window: XID,
    pub sibling: XID,
    pub x: i16,
    pub y: i16,
    pub width: u16,
    pub height: u16,
    pub border_width: u16,
    pub value_mask: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GravityNotifyEvent {
    pub event: XID,
    pub window: XID,
    pub x: i16,
    pub y: i16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResizeRequestEvent {
    pub window: XID,
    pub width: u16,
    pub height: u16,
}

/// CirculateNotify and CirculateRequest. For a request, `event` is the parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CirculateEvent {
    pub event: XID,
    pub window: XID,
    pub place: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PropertyNotifyEvent {
    pub window: XID,
    pub atom: u32,
    pub time: u32,
    pub state: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectionClearEvent {
    pub time: u32,
    pub owner: XID,
    pub selection: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectionRequestEvent {
    pub time: u32,
    pub owner: XID,
    pub requestor: XID,
    pub selection: u32,
    pub target: u32,
    pub property: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectionNotifyEvent {
    pub time: u32,
    pub requestor: XID,
    pub selection: u32,
    pub target: u32,
    pub property: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColormapNotifyEvent {
    pub window: XID,
    pub colormap: u32,
    pub new: bool,
    pub state: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClientMessageEvent {
    pub format: u8,
    pub window: XID,
    pub message_type: u32,
    pub data: [u8; 20],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MappingNotifyEvent {
    pub request: u8,
    pub first_keycode: u8,
    pub count: u8,
}

/// A decoded core event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireEvent {
    KeyPress(InputEvent),
    KeyRelease(InputEvent),
    ButtonPress(InputEvent),
    ButtonRelease(InputEvent),
    MotionNotify(InputEvent),
    EnterNotify(CrossingEvent),
    LeaveNotify(CrossingEvent),
    FocusIn(FocusEvent),
    FocusOut(FocusEvent),
    KeymapNotify(KeymapEvent),
    Expose(ExposeEvent),
    GraphicsExposure(GraphicsExposureEvent),
    NoExposure(NoExposureEvent),
    VisibilityNotify(VisibilityEvent),
    CreateNotify(CreateNotifyEvent),
    DestroyNotify(DestroyNotifyEvent),
    UnmapNotify(UnmapNotifyEvent),
    MapNotify(MapNotifyEvent),
    MapRequest(MapRequestEvent),
    ReparentNotify(ReparentNotifyEvent),
    ConfigureNotify(ConfigureNotifyEvent),
    ConfigureRequest(ConfigureRequestEvent),
    GravityNotify(GravityNotifyEvent),
    ResizeRequest(ResizeRequestEvent),
    CirculateNotify(CirculateEvent),
    CirculateRequest(CirculateEvent),
    PropertyNotify(PropertyNotifyEvent),
    SelectionClear(SelectionClearEvent),
    SelectionRequest(SelectionRequestEvent),
    SelectionNotify(SelectionNotifyEvent),
    ColormapNotify(ColormapNotifyEvent),
    ClientMessage(ClientMessageEvent),
    MappingNotify(MappingNotifyEvent),
    /// Extension or otherwise unrecognised event code
    Unknown(u8),
}

fn u16_at(b: &[u8], at: usize) -> u16 {
    NativeEndian::read_u16(&b[at..at + 2])
}

fn i16_at(b: &[u8], at: usize) -> i16 {
    NativeEndian::read_i16(&b[at..at + 2])
}

fn u32_at(b: &[u8], at: usize) -> u32 {
    NativeEndian::read_u32(&b[at..at + 4])
}

fn xid_at(b: &[u8], at: usize) -> XID {
    XID(u32_at(b, at))
}

fn put_u16(b: &mut [u8], at: usize, v: u16) {
    NativeEndian::write_u16(&mut b[at..at + 2], v);
}

fn put_i16(b: &mut [u8], at: usize, v: i16) {
    NativeEndian::write_i16(&mut b[at..at + 2], v);
}

fn put_u32(b: &mut [u8], at: usize, v: u32) {
    NativeEndian::write_u32(&mut b[at..at + 4], v);
}

fn put_xid(b: &mut [u8], at: usize, v: XID) {
    put_u32(b, at, v.get());
}

impl InputEvent {
    fn decode(b: &[u8]) -> Self {
        InputEvent {
            detail: b[1],
            time: u32_at(b, 4),
            root: xid_at(b, 8),
            event: xid_at(b, 12),
            child: xid_at(b, 16),
            root_x: i16_at(b, 20),
            root_y: i16_at(b, 22),
            event_x: i16_at(b, 24),
            event_y: i16_at(b, 26),
            state: u16_at(b, 28),
            same_screen: b[30] != 0,
        }
    }

    fn encode(&self, b: &mut [u8]) {
        b[1] = self.detail;
        put_u32(b, 4, self.time);
        put_xid(b, 8, self.root);
        put_xid(b, 12, self.event);
        put_xid(b, 16, self.child);
        put_i16(b, 20, self.root_x);
        put_i16(b, 22, self.root_y);
        put_i16(b, 24, self.event_x);
        put_i16(b, 26, self.event_y);
        put_u16(b, 28, self.state);
        b[30] = self.same_screen as u8;
    }
}

impl CrossingEvent {
    fn decode(b: &[u8]) -> Self {
        CrossingEvent {
            detail: b[1],
            time: u32_at(b, 4),
            root: xid_at(b, 8),
            event: xid_at(b, 12),
            child: xid_at(b, 16),
            root_x: i16_at(b, 20),
            root_y: i16_at(b, 22),
            event_x: i16_at(b, 24),
            event_y: i16_at(b, 26),
            state: u16_at(b, 28),
            mode: b[30],
            focus: b[31] & 0x01 != 0,
            same_screen: b[31] & 0x02 != 0,
        }
    }

    fn encode(&self, b: &mut [u8]) {
        b[1] = self.detail;
        put_u32(b, 4, self.time);
        put_xid(b, 8, self.root);
        put_xid(b, 12, self.event);
        put_xid(b, 16, self.child);
        put_i16(b, 20, self.root_x);
        put_i16(b, 22, self.root_y);
        put_i16(b, 24, self.event_x);
        put_i16(b, 26, self.event_y);
        put_u16(b, 28, self.state);
        b[30] = self.mode;
        b[31] = (self.focus as u8) | ((self.same_screen as u8) << 1);
    }
}

impl WireEvent {
    pub fn event_type(&self) -> Option<EventType> {
        EventType::from_u8(self.code())
    }

    /// Type code as written on the wire
    pub fn code(&self) -> u8 {
        use WireEvent::*;
        match self {
            KeyPress(_) => 2,
            KeyRelease(_) => 3,
            ButtonPress(_) => 4,
            ButtonRelease(_) => 5,
            MotionNotify(_) => 6,
            EnterNotify(_) => 7,
            LeaveNotify(_) => 8,
            FocusIn(_) => 9,
            FocusOut(_) => 10,
            KeymapNotify(_) => 11,
            Expose(_) => 12,
            GraphicsExposure(_) => 13,
            NoExposure(_) => 14,
            VisibilityNotify(_) => 15,
            CreateNotify(_) => 16,
            DestroyNotify(_) => 17,
            UnmapNotify(_) => 18,
            MapNotify(_) => 19,
            MapRequest(_) => 20,
            ReparentNotify(_) => 21,
            ConfigureNotify(_) => 22,
            ConfigureRequest(_) => 23,
            GravityNotify(_) => 24,
            ResizeRequest(_) => 25,
            CirculateNotify(_) => 26,
            CirculateRequest(_) => 27,
            PropertyNotify(_) => 28,
            SelectionClear(_) => 29,
            SelectionRequest(_) => 30,
            SelectionNotify(_) => 31,
            ColormapNotify(_) => 32,
            ClientMessage(_) => 33,
            MappingNotify(_) => 34,
            Unknown(code) => *code,
        }
    }

    /// The window an event is reported against, used by window-filtered reads.
    /// This is the first window field of each record, so structure events
    /// report the window whose event mask selected them.
    pub fn window(&self) -> XID {
        use WireEvent::*;
        match self {
            KeyPress(e) | KeyRelease(e) | ButtonPress(e) | ButtonRelease(e) | MotionNotify(e) => {
                e.event
            }
            EnterNotify(e) | LeaveNotify(e) => e.event,
            FocusIn(e) | FocusOut(e) => e.event,
            Expose(e) => e.window,
            GraphicsExposure(e) => e.drawable,
            NoExposure(e) => e.drawable,
            VisibilityNotify(e) => e.window,
            CreateNotify(e) => e.parent,
            DestroyNotify(e) => e.event,
            UnmapNotify(e) => e.event,
            MapNotify(e) => e.event,
            MapRequest(e) => e.parent,
            ReparentNotify(e) => e.event,
            ConfigureNotify(e) => e.event,
            ConfigureRequest(e) => e.parent,
            GravityNotify(e) => e.event,
            ResizeRequest(e) => e.window,
            CirculateNotify(e) | CirculateRequest(e) => e.event,
            PropertyNotify(e) => e.window,
            SelectionClear(e) => e.owner,
            SelectionRequest(e) => e.owner,
            SelectionNotify(e) => e.requestor,
            ColormapNotify(e) => e.window,
            ClientMessage(e) => e.window,
            KeymapNotify(_) | MappingNotify(_) | Unknown(_) => XID::NONE,
        }
    }

    /// Decode a 32-byte event record
    pub fn decode(b: &[u8; EVENT_SIZE]) -> WireEvent {
        let code = b[0] & !SEND_EVENT_BIT;
        match code {
            2 => WireEvent::KeyPress(InputEvent::decode(b)),
            3 => WireEvent::KeyRelease(InputEvent::decode(b)),
            4 => WireEvent::ButtonPress(InputEvent::decode(b)),
            5 => WireEvent::ButtonRelease(InputEvent::decode(b)),
            6 => WireEvent::MotionNotify(InputEvent::decode(b)),
            7 => WireEvent::EnterNotify(CrossingEvent::decode(b)),
            8 => WireEvent::LeaveNotify(CrossingEvent::decode(b)),
            9 | 10 => {
                let e = FocusEvent {
                    detail: b[1],
                    event: xid_at(b, 4),
                    mode: b[8],
                };
                if code == 9 {
                    WireEvent::FocusIn(e)
                } else {
                    WireEvent::FocusOut(e)
                }
            }
            11 => {
                let mut keys = [0u8; 31];
                keys.copy_from_slice(&b[1..32]);
                WireEvent::KeymapNotify(KeymapEvent { keys })
            }
            12 => WireEvent::Expose(ExposeEvent {
                window: xid_at(b, 4),
                x: u16_at(b, 8),
                y: u16_at(b, 10),
                width: u16_at(b, 12),
                height: u16_at(b, 14),
                count: u16_at(b, 16),
            }),
            13 => WireEvent::GraphicsExposure(GraphicsExposureEvent {
                drawable: xid_at(b, 4),
                x: u16_at(b, 8),
                y: u16_at(b, 10),
                width: u16_at(b, 12),
                height: u16_at(b, 14),
                minor_opcode: u16_at(b, 16),
                count: u16_at(b, 18),
                major_opcode: b[20],
            }),
            14 => WireEvent::NoExposure(NoExposureEvent {
                drawable: xid_at(b, 4),
                minor_opcode: u16_at(b, 8),
                major_opcode: b[10],
            }),
            15 => WireEvent::VisibilityNotify(VisibilityEvent {
                window: xid_at(b, 4),
                state: b[8],
            }),
            16 => WireEvent::CreateNotify(CreateNotifyEvent {
                parent: xid_at(b, 4),
                window: xid_at(b, 8),
                x: i16_at(b, 12),
                y: i16_at(b, 14),
                width: u16_at(b, 16),
                height: u16_at(b, 18),
                border_width: u16_at(b, 20),
                override_redirect: b[22] != 0,
            }),
            17 => WireEvent::DestroyNotify(DestroyNotifyEvent {
                event: xid_at(b, 4),
                window: xid_at(b, 8),
            }),
            18 => WireEvent::UnmapNotify(UnmapNotifyEvent {
                event: xid_at(b, 4),
                window: xid_at(b, 8),
                from_configure: b[12] != 0,
            }),
            19 => WireEvent::MapNotify(MapNotifyEvent {
                event: xid_at(b, 4),
                window: xid_at(b, 8),
                override_redirect: b[12] != 0,
            }),
            20 => WireEvent::MapRequest(MapRequestEvent {
                parent: xid_at(b, 4),
                window: xid_at(b, 8),
            }),
            21 => WireEvent::ReparentNotify(ReparentNotifyEvent {
                event: xid_at(b, 4),
                window: xid_at(b, 8),
                parent: xid_at(b, 12),
                x: i16_at(b, 16),
                y: i16_at(b, 18),
                override_redirect: b[20] != 0,
            }),
            22 => WireEvent::ConfigureNotify(ConfigureNotifyEvent {
                event: xid_at(b, 4),
                window: xid_at(b, 8),
                above_sibling: xid_at(b, 12),
                x: i16_at(b, 16),
                y: i16_at(b, 18),
                width: u16_at(b, 20),
                height: u16_at(b, 22),
                border_width: u16_at(b, 24),
                override_redirect: b[26] != 0,
            }),
            23 => WireEvent::ConfigureRequest(ConfigureRequestEvent {
                stack_mode: b[1],
                parent: xid_at(b, 4),
                window: xid_at(b, 8),
                sibling: xid_at(b, 12),
                x: i16_at(b, 16),
                y: i16_at(b, 18),
                width: u16_at(b, 20),
                height: u16_at(b, 22),
                border_width: u16_at(b, 24),
                value_mask: u16_at(b, 26),
            }),
            24 => WireEvent::GravityNotify(GravityNotifyEvent {
                event: xid_at(b, 4),
                window: xid_at(b, 8),
                x: i16_at(b, 12),
                y: i16_at(b, 14),
            }),
            25 => WireEvent::ResizeRequest(ResizeRequestEvent {
                window: xid_at(b, 4),
                width: u16_at(b, 8),
                height: u16_at(b, 10),
            }),
            26 | 27 => {
                let e = CirculateEvent {
                    event: xid_at(b, 4),
                    window: xid_at(b, 8),
                    place: b[16],
                };
                if code == 26 {
                    WireEvent::CirculateNotify(e)
                } else {
                    WireEvent::CirculateRequest(e)
                }
            }
            28 => WireEvent::PropertyNotify(PropertyNotifyEvent {
                window: xid_at(b, 4),
                atom: u32_at(b, 8),
                time: u32_at(b, 12),
                state: b[16],
            }),
            29 => WireEvent::SelectionClear(SelectionClearEvent {
                time: u32_at(b, 4),
                owner: xid_at(b, 8),
                selection: u32_at(b, 12),
            }),
            30 => WireEvent::SelectionRequest(SelectionRequestEvent {
                time: u32_at(b, 4),
                owner: xid_at(b, 8),
                requestor: xid_at(b, 12),
                selection: u32_at(b, 16),
                target: u32_at(b, 20),
                property: u32_at(b, 24),
            }),
            31 => WireEvent::SelectionNotify(SelectionNotifyEvent {
                time: u32_at(b, 4),
                requestor: xid_at(b, 8),
                selection: u32_at(b, 12),
                target: u32_at(b, 16),
                property: u32_at(b, 20),
            }),
            32 => WireEvent::ColormapNotify(ColormapNotifyEvent {
                window: xid_at(b, 4),
                colormap: u32_at(b, 8),
                new: b[12] != 0,
                state: b[13],
            }),
            33 => {
                let mut data = [0u8; 20];
                data.copy_from_slice(&b[12..32]);
                WireEvent::ClientMessage(ClientMessageEvent {
                    format: b[1],
                    window: xid_at(b, 4),
                    message_type: u32_at(b, 8),
                    data,
                })
            }
            34 => WireEvent::MappingNotify(MappingNotifyEvent {
                request: b[4],
                first_keycode: b[5],
                count: b[6],
            }),
            other => WireEvent::Unknown(other),
        }
    }

    /// Encode event to wire format (32 bytes). The sequence field is left zero.
    pub fn encode(&self, b: &mut [u8; EVENT_SIZE]) {
        b.fill(0);
        b[0] = self.code();

        match self {
            WireEvent::KeyPress(e)
            | WireEvent::KeyRelease(e)
            | WireEvent::ButtonPress(e)
            | WireEvent::ButtonRelease(e)
            | WireEvent::MotionNotify(e) => e.encode(b),
            WireEvent::EnterNotify(e) | WireEvent::LeaveNotify(e) => e.encode(b),
            WireEvent::FocusIn(e) | WireEvent::FocusOut(e) => {
                b[1] = e.detail;
                put_xid(b, 4, e.event);
                b[8] = e.mode;
            }
            WireEvent::KeymapNotify(e) => b[1..32].copy_from_slice(&e.keys),
            WireEvent::Expose(e) => {
                put_xid(b, 4, e.window);
                put_u16(b, 8, e.x);
                put_u16(b, 10, e.y);
                put_u16(b, 12, e.width);
                put_u16(b, 14, e.height);
                put_u16(b, 16, e.count);
            }
            WireEvent::GraphicsExposure(e) => {
                put_xid(b, 4, e.drawable);
                put_u16(b, 8, e.x);
                put_u16(b, 10, e.y);
                put_u16(b, 12, e.width);
                put_u16(b, 14, e.height);
                put_u16(b, 16, e.minor_opcode);
                put_u16(b, 18, e.count);
                b[20] = e.major_opcode;
            }
            WireEvent::NoExposure(e) => {
                put_xid(b, 4, e.drawable);
                put_u16(b, 8, e.minor_opcode);
                b[10] = e.major_opcode;
            }
            WireEvent::VisibilityNotify(e) => {
                put_xid(b, 4, e.window);
                b[8] = e.state;
            }
            WireEvent::CreateNotify(e) => {
                put_xid(b, 4, e.parent);
                put_xid(b, 8, e.window);
                put_i16(b, 12, e.x);
                put_i16(b, 14, e.y);
                put_u16(b, 16, e.width);
                put_u16(b, 18, e.height);
                put_u16(b, 20, e.border_width);
                b[22] = e.override_redirect as u8;
            }
            WireEvent::DestroyNotify(e) => {
                put_xid(b, 4, e.event);
                put_xid(b, 8, e.window);
            }
            WireEvent::UnmapNotify(e) => {
                put_xid(b, 4, e.event);
                put_xid(b, 8, e.window);
                b[12] = e.from_configure as u8;
            }
            WireEvent::MapNotify(e) => {
                put_xid(b, 4, e.event);
                put_xid(b, 8, e.window);
                b[12] = e.override_redirect as u8;
            }
            WireEvent::MapRequest(e) => {
                put_xid(b, 4, e.parent);
                put_xid(b, 8, e.window);
            }
            WireEvent::ReparentNotify(e) => {
                put_xid(b, 4, e.event);
                put_xid(b, 8, e.window);
                put_xid(b, 12, e.parent);
                put_i16(b, 16, e.x);
                put_i16(b, 18, e.y);
                b[20] = e.override_redirect as u8;
            }
            WireEvent::ConfigureNotify(e) => {
                put_xid(b, 4, e.event);
                put_xid(b, 8, e.window);
                put_xid(b, 12, e.above_sibling);
                put_i16(b, 16, e.x);
                put_i16(b, 18, e.y);
                put_u16(b, 20, e.width);
                put_u16(b, 22, e.height);
                put_u16(b, 24, e.border_width);
                b[26] = e.override_redirect as u8;
            }
            WireEvent::ConfigureRequest(e) => {
                b[1] = e.stack_mode;
                put_xid(b, 4, e.parent);
                put_xid(b, 8, e.window);
                put_xid(b, 12, e.sibling);
                put_i16(b, 16, e.x);
                put_i16(b, 18, e.y);
                put_u16(b, 20, e.width);
                put_u16(b, 22, e.height);
                put_u16(b, 24, e.border_width);
                put_u16(b, 26, e.value_mask);
            }
            WireEvent::GravityNotify(e) => {
                put_xid(b, 4, e.event);
                put_xid(b, 8, e.window);
                put_i16(b, 12, e.x);
                put_i16(b, 14, e.y);
            }
            WireEvent::ResizeRequest(e) => {
                put_xid(b, 4, e.window);
                put_u16(b, 8, e.width);
                put_u16(b, 10, e.height);
            }
            WireEvent::CirculateNotify(e) | WireEvent::CirculateRequest(e) => {
                put_xid(b, 4, e.event);
                put_xid(b, 8, e.window);
                b[16] = e.place;
            }
            WireEvent::PropertyNotify(e) => {
                put_xid(b, 4, e.window);
                put_u32(b, 8, e.atom);
                put_u32(b, 12, e.time);
                b[16] = e.state;
            }
            WireEvent::SelectionClear(e) => {
                put_u32(b, 4, e.time);
                put_xid(b, 8, e.owner);
                put_u32(b, 12, e.selection);
            }
            WireEvent::SelectionRequest(e) => {
                put_u32(b, 4, e.time);
                put_xid(b, 8, e.owner);
                put_xid(b, 12, e.requestor);
                put_u32(b, 16, e.selection);
                put_u32(b, 20, e.target);
                put_u32(b, 24, e.property);
            }
            WireEvent::SelectionNotify(e) => {
                put_u32(b, 4, e.time);
                put_xid(b, 8, e.requestor);
                put_u32(b, 12, e.selection);
                put_u32(b, 16, e.target);
                put_u32(b, 20, e.property);
            }
            WireEvent::ColormapNotify(e) => {
                put_xid(b, 4, e.window);
                put_u32(b, 8, e.colormap);
                b[12] = e.new as u8;
                b[13] = e.state;
            }
            WireEvent::ClientMessage(e) => {
                b[1] = e.format;
                put_xid(b, 4, e.window);
                put_u32(b, 8, e.message_type);
                b[12..32].copy_from_slice(&e.data);
            }
            WireEvent::MappingNotify(e) => {
                b[4] = e.request;
                b[5] = e.first_keycode;
                b[6] = e.count;
            }
            WireEvent::Unknown(_) => {}
        }
    }
}
