//! Wire event to host event conversion

use super::{slot, Event, Slot};
use crate::protocol::{RawEvent, WireEvent, XID};
use crate::resources::Connection;

/// Convert a raw event read from `connection` into a fresh [`Event`]
pub fn marshal(connection: &Connection, raw: &RawEvent) -> Event {
    let mut event = Event::new();
    marshal_into(connection, raw, &mut event);
    event
}

/// Convert a raw event into a caller-supplied [`Event`]. Every slot the
/// event kind does not use is reset to not-applicable.
pub fn marshal_into(connection: &Connection, raw: &RawEvent, event: &mut Event) {
    event.clear();
    let mut out = Filler { connection, event };

    out.int(slot::TYPE, raw.code());
    out.int(slot::SERIAL, raw.serial as i64);
    out.flag(slot::SEND_EVENT, raw.send_event());
    out.event
        .set(slot::CONNECTION, Slot::Connection(connection.clone()));

    match raw.decode() {
        WireEvent::KeyPress(e)
        | WireEvent::KeyRelease(e)
        | WireEvent::ButtonPress(e)
        | WireEvent::ButtonRelease(e)
        | WireEvent::MotionNotify(e) => {
            out.window(slot::WINDOW, e.event);
            out.window(slot::ROOT, e.root);
            out.window(slot::SUBWINDOW, e.child);
            out.int(slot::TIME, e.time);
            out.int(slot::X, e.event_x);
            out.int(slot::Y, e.event_y);
            out.int(slot::X_ROOT, e.root_x);
            out.int(slot::Y_ROOT, e.root_y);
            out.int(slot::STATE, e.state);
            // keycode, button or is-hint
            out.int(slot::KEYCODE, e.detail);
            out.flag(slot::SAME_SCREEN, e.same_screen);
        }
        WireEvent::EnterNotify(e) | WireEvent::LeaveNotify(e) => {
            out.window(slot::WINDOW, e.event);
            out.window(slot::ROOT, e.root);
            out.window(slot::SUBWINDOW, e.child);
            out.int(slot::TIME, e.time);
            out.int(slot::X, e.event_x);
            out.int(slot::Y, e.event_y);
            out.int(slot::X_ROOT, e.root_x);
            out.int(slot::Y_ROOT, e.root_y);
            out.int(slot::STATE, e.state);
            out.int(slot::MODE, e.mode);
            out.flag(slot::SAME_SCREEN, e.same_screen);
            out.int(slot::DETAIL, e.detail);
            out.flag(slot::FOCUS, e.focus);
        }
        WireEvent::FocusIn(e) | WireEvent::FocusOut(e) => {
            out.window(slot::WINDOW, e.event);
            out.int(slot::MODE, e.mode);
            out.int(slot::DETAIL, e.detail);
        }
        WireEvent::KeymapNotify(_) => {
            // the record carries no window
            out.window(slot::WINDOW, XID::NONE);
            out.unsupported(slot::KEY_VECTOR);
        }
        WireEvent::Expose(e) => {
            out.window(slot::WINDOW, e.window);
            out.int(slot::X, e.x);
            out.int(slot::Y, e.y);
            out.int(slot::WIDTH, e.width);
            out.int(slot::HEIGHT, e.height);
            out.int(slot::COUNT, e.count);
        }
        WireEvent::GraphicsExposure(e) => {
            out.window(slot::DRAWABLE, e.drawable);
            out.int(slot::X, e.x);
            out.int(slot::Y, e.y);
            out.int(slot::WIDTH, e.width);
            out.int(slot::HEIGHT, e.height);
            out.int(slot::COUNT, e.count);
            out.int(slot::MAJOR_CODE, e.major_opcode);
            out.int(slot::MINOR_CODE, e.minor_opcode);
        }
        WireEvent::NoExposure(e) => {
            out.window(slot::DRAWABLE, e.drawable);
            out.int(slot::MAJOR_CODE, e.major_opcode);
            out.int(slot::MINOR_CODE, e.minor_opcode);
        }
        WireEvent::VisibilityNotify(e) => {
            out.window(slot::WINDOW, e.window);
            out.int(slot::STATE, e.state);
        }
        WireEvent::CreateNotify(e) => {
            out.window(slot::PARENT, e.parent);
            out.window(slot::WINDOW, e.window);
            out.int(slot::X, e.x);
            out.int(slot::Y, e.y);
            out.int(slot::WIDTH, e.width);
            out.int(slot::HEIGHT, e.height);
            out.int(slot::BORDER_WIDTH, e.border_width);
            out.flag(slot::OVERRIDE_REDIRECT, e.override_redirect);
        }
        WireEvent::DestroyNotify(e) => {
            out.window(slot::EVENT, e.event);
            out.window(slot::WINDOW, e.window);
        }
        WireEvent::UnmapNotify(e) => {
            out.window(slot::EVENT, e.event);
            out.window(slot::WINDOW, e.window);
            out.flag(slot::FROM_CONFIGURE, e.from_configure);
        }
        WireEvent::MapNotify(e) => {
            out.window(slot::EVENT, e.event);
            out.window(slot::WINDOW, e.window);
            out.flag(slot::OVERRIDE_REDIRECT, e.override_redirect);
        }
        WireEvent::MapRequest(e) => {
            out.window(slot::PARENT, e.parent);
            out.window(slot::WINDOW, e.window);
        }
        WireEvent::ReparentNotify(e) => {
            out.window(slot::EVENT, e.event);
            out.window(slot::WINDOW, e.window);
            out.window(slot::PARENT, e.parent);
            out.int(slot::X, e.x);
            out.int(slot::Y, e.y);
            out.flag(slot::OVERRIDE_REDIRECT, e.override_redirect);
        }
        WireEvent::ConfigureNotify(e) => {
            out.window(slot::EVENT, e.event);
            out.window(slot::WINDOW, e.window);
            out.int(slot::X, e.x);
            out.int(slot::Y, e.y);
            out.int(slot::WIDTH, e.width);
            out.int(slot::HEIGHT, e.height);
            out.int(slot::BORDER_WIDTH, e.border_width);
            out.window(slot::ABOVE, e.above_sibling);
            out.flag(slot::OVERRIDE_REDIRECT, e.override_redirect);
        }
        WireEvent::ConfigureRequest(e) => {
            out.window(slot::PARENT, e.parent);
            out.window(slot::WINDOW, e.window);
            out.int(slot::X, e.x);
            out.int(slot::Y, e.y);
            out.int(slot::WIDTH, e.width);
            out.int(slot::HEIGHT, e.height);
            out.int(slot::BORDER_WIDTH, e.border_width);
            out.window(slot::ABOVE, e.sibling);
            out.int(slot::DETAIL, e.stack_mode);
            out.int(slot::VALUE_MASK, e.value_mask);
        }
        WireEvent::GravityNotify(e) => {
            out.window(slot::EVENT, e.event);
            out.window(slot::WINDOW, e.window);
            out.int(slot::X, e.x);
            out.int(slot::Y, e.y);
        }
        WireEvent::ResizeRequest(e) => {
            out.window(slot::WINDOW, e.window);
            out.int(slot::WIDTH, e.width);
            out.int(slot::HEIGHT, e.height);
        }
        WireEvent::CirculateNotify(e) => {
            out.window(slot::EVENT, e.event);
            out.window(slot::WINDOW, e.window);
            out.int(slot::PLACE, e.place);
        }
        WireEvent::CirculateRequest(e) => {
            // the first window of a request is the parent
            out.window(slot::PARENT, e.event);
            out.window(slot::WINDOW, e.window);
            out.int(slot::PLACE, e.place);
        }
        WireEvent::PropertyNotify(e) => {
            out.window(slot::WINDOW, e.window);
            out.unsupported(slot::ATOM);
            out.int(slot::TIME, e.time);
            out.int(slot::STATE, e.state);
        }
        WireEvent::SelectionClear(e) => {
            out.window(slot::OWNER, e.owner);
            out.unsupported(slot::SELECTION);
            out.int(slot::TIME, e.time);
        }
        WireEvent::SelectionRequest(e) => {
            out.window(slot::OWNER, e.owner);
            out.window(slot::REQUESTOR, e.requestor);
            out.unsupported(slot::SELECTION);
            out.unsupported(slot::TARGET);
            out.unsupported(slot::PROPERTY);
            out.int(slot::TIME, e.time);
        }
        WireEvent::SelectionNotify(e) => {
            out.window(slot::REQUESTOR, e.requestor);
            out.unsupported(slot::SELECTION);
            out.unsupported(slot::TARGET);
            out.unsupported(slot::PROPERTY);
            out.int(slot::TIME, e.time);
        }
        WireEvent::ColormapNotify(e) => {
            out.window(slot::WINDOW, e.window);
            out.unsupported(slot::COLORMAP);
            out.flag(slot::NEW, e.new);
            out.int(slot::STATE, e.state);
        }
        WireEvent::ClientMessage(e) => {
            out.window(slot::WINDOW, e.window);
            out.unsupported(slot::MESSAGE_TYPE);
            out.int(slot::FORMAT, e.format);
            out.unsupported(slot::DATA);
        }
        WireEvent::MappingNotify(e) => {
            out.window(slot::WINDOW, XID::NONE);
            out.int(slot::REQUEST, e.request);
            out.int(slot::FIRST_KEYCODE, e.first_keycode);
            out.int(slot::COUNT, e.count);
        }
        WireEvent::Unknown(code) => {
            log::debug!("marshal: event code {} has no slot layout", code);
        }
    }
}

struct Filler<'a> {
    connection: &'a Connection,
    event: &'a mut Event,
}

impl Filler<'_> {
    fn int(&mut self, index: usize, value: impl Into<i64>) {
        self.event.set(index, Slot::Int(value.into()));
    }

    fn flag(&mut self, index: usize, value: bool) {
        self.event.set(index, Slot::Flag(value));
    }

    fn unsupported(&mut self, index: usize) {
        self.event.set(index, Slot::Unsupported);
    }

    /// Resolve an id through the identity table
    fn window(&mut self, index: usize, id: XID) {
        let core = self.connection.core();
        let value = core
            .registry
            .resolve(core, id)
            .map_or(Slot::Absent, Slot::Drawable);
        self.event.set(index, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::NullSession;
    use crate::protocol::*;
    use crate::resources::{DrawableState, Registry};

    fn conn() -> Connection {
        Connection::with_session(&Registry::new(), Box::new(NullSession::new()))
    }

    #[test]
    fn test_header() {
        let conn = conn();
        let raw = RawEvent::new(42, &WireEvent::Unknown(70), true);
        let event = marshal(&conn, &raw);
        assert_eq!(event[slot::TYPE], Slot::Int(70));
        assert_eq!(event.serial(), Some(42));
        assert!(event.send_event());
        assert_eq!(event.connection(), Some(&conn));
        assert!(event.slots()[4..].iter().all(|s| !s.is_applicable()));
    }

    #[test]
    fn test_expose_resolves_created_window() {
        let conn = conn();
        let win = conn.create_window().unwrap();
        let raw = RawEvent::new(
            1,
            &WireEvent::Expose(ExposeEvent {
                window: win.id(),
                x: 1,
                y: 2,
                width: 30,
                height: 40,
                count: 0,
            }),
            false,
        );
        let event = marshal(&conn, &raw);
        assert_eq!(event.event_type(), Some(EventType::Expose));
        assert_eq!(event.window(), Some(&win));
        assert_eq!(event[slot::WIDTH], Slot::Int(30));
        assert_eq!(event[slot::HEIGHT], Slot::Int(40));
        assert_eq!(event[slot::COUNT], Slot::Int(0));
        assert_eq!(event[slot::ROOT], Slot::NotApplicable);
        assert_eq!(event[slot::TIME], Slot::NotApplicable);
    }

    #[test]
    fn test_crossing_slots() {
        let conn = conn();
        let raw = RawEvent::new(
            3,
            &WireEvent::EnterNotify(CrossingEvent {
                detail: 2,
                time: 1000,
                root: XID(0x100),
                event: XID(0x500),
                child: XID::NONE,
                event_x: 5,
                event_y: 6,
                root_x: 105,
                root_y: 106,
                state: 0x10,
                mode: 1,
                same_screen: true,
                focus: false,
            }),
            false,
        );
        let event = marshal(&conn, &raw);
        assert_eq!(event[slot::SUBWINDOW], Slot::Absent);
        assert_eq!(event[slot::MODE], Slot::Int(1));
        assert_eq!(event[slot::SAME_SCREEN], Slot::Flag(true));
        assert_eq!(event[slot::DETAIL], Slot::Int(2));
        assert_eq!(event[slot::FOCUS], Slot::Flag(false));
        assert_eq!(event[slot::X_ROOT], Slot::Int(105));
        let window = event.window().unwrap();
        assert_eq!(window.state(), DrawableState::THIRD_PARTY);
        assert_eq!(event[slot::ROOT], Slot::Drawable(conn.root_window(None).unwrap()));
    }

    #[test]
    fn test_configure_request_slots() {
        let conn = conn();
        let raw = RawEvent::new(
            9,
            &WireEvent::ConfigureRequest(ConfigureRequestEvent {
                stack_mode: 3,
                parent: XID(0x100),
                window: XID(0x600),
                sibling: XID::NONE,
                x: -4,
                y: 8,
                width: 200,
                height: 100,
                border_width: 2,
                value_mask: 0x0f,
            }),
            false,
        );
        let event = marshal(&conn, &raw);
        assert!(event[slot::PARENT].as_drawable().is_some());
        assert_eq!(event[slot::ABOVE], Slot::Absent);
        assert_eq!(event[slot::X], Slot::Int(-4));
        assert_eq!(event[slot::BORDER_WIDTH], Slot::Int(2));
        assert_eq!(event[slot::DETAIL], Slot::Int(3));
        assert_eq!(event[slot::VALUE_MASK], Slot::Int(0x0f));
    }

    #[test]
    fn test_unsupported_fields() {
        let conn = conn();
        let raw = RawEvent::new(
            1,
            &WireEvent::SelectionRequest(SelectionRequestEvent {
                time: 77,
                owner: XID(0x700),
                requestor: XID(0x701),
                selection: 1,
                target: 31,
                property: 40,
            }),
            false,
        );
        let event = marshal(&conn, &raw);
        assert_eq!(event[slot::SELECTION], Slot::Unsupported);
        assert_eq!(event[slot::TARGET], Slot::Unsupported);
        assert_eq!(event[slot::PROPERTY], Slot::Unsupported);
        assert_eq!(event[slot::TIME], Slot::Int(77));
        assert_ne!(event[slot::OWNER], event[slot::REQUESTOR]);

        let raw = RawEvent::new(1, &WireEvent::KeymapNotify(KeymapEvent::default()), false);
        let event = marshal(&conn, &raw);
        assert_eq!(event[slot::WINDOW], Slot::Absent);
        assert_eq!(event[slot::KEY_VECTOR], Slot::Unsupported);
    }

    #[test]
    fn test_reuse_clears_stale_slots() {
        let conn = conn();
        let mut event = Event::new();
        let motion = WireEvent::MotionNotify(InputEvent {
            event: XID(0x900),
            root: XID(0x100),
            same_screen: true,
            ..Default::default()
        });
        marshal_into(&conn, &RawEvent::new(1, &motion, false), &mut event);
        assert!(event[slot::SAME_SCREEN].is_applicable());

        let visibility = WireEvent::VisibilityNotify(VisibilityEvent {
            window: XID(0x900),
            state: 1,
        });
        marshal_into(&conn, &RawEvent::new(2, &visibility, false), &mut event);
        assert_eq!(event[slot::STATE], Slot::Int(1));
        assert_eq!(event[slot::SAME_SCREEN], Slot::NotApplicable);
        assert_eq!(event[slot::ROOT], Slot::NotApplicable);
    }
}
