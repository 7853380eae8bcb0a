//! Event reads on a connection
//!
//! Events are pulled from the session into a local queue. Filtered reads
//! take the first queued event that matches and leave the rest in order.
//! The blocking reads wait on the session; the `check_*` reads never block
//! and report "nothing matched" as `Ok(None)`.

use super::{marshal_into, Event};
use crate::error::{Error, Result};
use crate::protocol::{QueueMode, RawEvent};
use crate::resources::drawable::same_connection;
use crate::resources::{Connection, Drawable, DrawableState};

fn selected_by(raw: &RawEvent, mask: u32) -> bool {
    raw.event_type()
        .map_or(false, |t| t.selecting_mask() & mask != 0)
}

fn reported_on(raw: &RawEvent, window: &Drawable) -> bool {
    raw.decode().window() == window.id()
}

impl Connection {
    /// Move everything the session has ready into the local queue
    fn read_available(&self, op: &'static str) -> Result<usize> {
        let core = self.core();
        let mut read = 0;
        while let Some(raw) = core.call(op, |s| s.poll_event())? {
            core.queue.borrow_mut().push_back(raw);
            read += 1;
        }
        if read > 0 {
            log::trace!("connection {}: read {} event(s)", core.serial, read);
        }
        Ok(read)
    }

    fn take_queued(&self, pred: &dyn Fn(&RawEvent) -> bool) -> Option<RawEvent> {
        let mut queue = self.core().queue.borrow_mut();
        let pos = queue.iter().position(pred)?;
        queue.remove(pos)
    }

    /// Block until a matching event arrives. Events that do not match are
    /// queued behind the ones already there.
    fn wait_for(&self, op: &'static str, pred: &dyn Fn(&RawEvent) -> bool) -> Result<RawEvent> {
        if let Some(raw) = self.take_queued(pred) {
            return Ok(raw);
        }
        let core = self.core();
        core.call(op, |s| s.flush())?;
        loop {
            let raw = core.call(op, |s| s.wait_event())?;
            if pred(&raw) {
                return Ok(raw);
            }
            core.queue.borrow_mut().push_back(raw);
        }
    }

    fn check_for(
        &self,
        op: &'static str,
        pred: &dyn Fn(&RawEvent) -> bool,
    ) -> Result<Option<RawEvent>> {
        if let Some(raw) = self.take_queued(pred) {
            return Ok(Some(raw));
        }
        self.core().call(op, |s| s.flush())?;
        self.read_available(op)?;
        Ok(self.take_queued(pred))
    }

    fn window_guard(&self, op: &'static str, window: &Drawable) -> Result<()> {
        window.guard(op, !DrawableState::DESTROYED)?;
        same_connection(op, self.core(), window.core())
    }

    fn deliver(&self, raw: Option<RawEvent>, event: &mut Event) -> bool {
        match raw {
            Some(raw) => {
                marshal_into(self, &raw, event);
                true
            }
            None => false,
        }
    }

    /// Remove and return the next event, blocking until there is one
    pub fn next_event(&self) -> Result<Event> {
        let mut event = Event::new();
        self.next_event_into(&mut event)?;
        Ok(event)
    }

    pub fn next_event_into(&self, event: &mut Event) -> Result<()> {
        const OP: &str = "next_event";
        self.core().require_open(OP)?;
        let raw = self.wait_for(OP, &|_| true)?;
        marshal_into(self, &raw, event);
        Ok(())
    }

    /// Return the next event without removing it, blocking until there is one
    pub fn peek_event(&self) -> Result<Event> {
        let mut event = Event::new();
        self.peek_event_into(&mut event)?;
        Ok(event)
    }

    pub fn peek_event_into(&self, event: &mut Event) -> Result<()> {
        const OP: &str = "peek_event";
        let core = self.core();
        core.require_open(OP)?;
        let front = core.queue.borrow().front().cloned();
        let raw = match front {
            Some(raw) => raw,
            None => {
                let raw = self.wait_for(OP, &|_| true)?;
                core.queue.borrow_mut().push_front(raw.clone());
                raw
            }
        };
        marshal_into(self, &raw, event);
        Ok(())
    }

    /// Remove the first event selected by `mask`, blocking until one arrives
    pub fn mask_event(&self, mask: u32) -> Result<Event> {
        let mut event = Event::new();
        self.mask_event_into(mask, &mut event)?;
        Ok(event)
    }

    pub fn mask_event_into(&self, mask: u32, event: &mut Event) -> Result<()> {
        const OP: &str = "mask_event";
        self.core().require_open(OP)?;
        let raw = self.wait_for(OP, &|raw| selected_by(raw, mask))?;
        marshal_into(self, &raw, event);
        Ok(())
    }

    /// Remove the first event for `window` selected by `mask`, blocking until
    /// one arrives
    pub fn window_event(&self, window: &Drawable, mask: u32) -> Result<Event> {
        let mut event = Event::new();
        self.window_event_into(window, mask, &mut event)?;
        Ok(event)
    }

    pub fn window_event_into(&self, window: &Drawable, mask: u32, event: &mut Event) -> Result<()> {
        const OP: &str = "window_event";
        self.window_guard(OP, window)?;
        let raw = self.wait_for(OP, &|raw| {
            selected_by(raw, mask) && reported_on(raw, window)
        })?;
        marshal_into(self, &raw, event);
        Ok(())
    }

    pub fn check_mask_event(&self, mask: u32) -> Result<Option<Event>> {
        let mut event = Event::new();
        Ok(self
            .check_mask_event_into(mask, &mut event)?
            .then_some(event))
    }

    pub fn check_mask_event_into(&self, mask: u32, event: &mut Event) -> Result<bool> {
        const OP: &str = "check_mask_event";
        self.core().require_open(OP)?;
        let raw = self.check_for(OP, &|raw| selected_by(raw, mask))?;
        Ok(self.deliver(raw, event))
    }

    pub fn check_typed_event(&self, event_type: u8) -> Result<Option<Event>> {
        let mut event = Event::new();
        Ok(self
            .check_typed_event_into(event_type, &mut event)?
            .then_some(event))
    }

    pub fn check_typed_event_into(&self, event_type: u8, event: &mut Event) -> Result<bool> {
        const OP: &str = "check_typed_event";
        self.core().require_open(OP)?;
        let raw = self.check_for(OP, &|raw| raw.code() == event_type)?;
        Ok(self.deliver(raw, event))
    }

    pub fn check_typed_window_event(
        &self,
        window: &Drawable,
        event_type: u8,
    ) -> Result<Option<Event>> {
        let mut event = Event::new();
        Ok(self
            .check_typed_window_event_into(window, event_type, &mut event)?
            .then_some(event))
    }

    pub fn check_typed_window_event_into(
        &self,
        window: &Drawable,
        event_type: u8,
        event: &mut Event,
    ) -> Result<bool> {
        const OP: &str = "check_typed_window_event";
        self.window_guard(OP, window)?;
        let raw = self.check_for(OP, &|raw| {
            raw.code() == event_type && reported_on(raw, window)
        })?;
        Ok(self.deliver(raw, event))
    }

    pub fn check_window_event(&self, window: &Drawable, mask: u32) -> Result<Option<Event>> {
        let mut event = Event::new();
        Ok(self
            .check_window_event_into(window, mask, &mut event)?
            .then_some(event))
    }

    pub fn check_window_event_into(
        &self,
        window: &Drawable,
        mask: u32,
        event: &mut Event,
    ) -> Result<bool> {
        const OP: &str = "check_window_event";
        self.window_guard(OP, window)?;
        let raw = self.check_for(OP, &|raw| {
            selected_by(raw, mask) && reported_on(raw, window)
        })?;
        Ok(self.deliver(raw, event))
    }

    /// Flush, read whatever has arrived, and return the queue length
    pub fn pending(&self) -> Result<usize> {
        const OP: &str = "pending";
        let core = self.core();
        core.require_open(OP)?;
        core.call(OP, |s| s.flush())?;
        self.read_available(OP)?;
        Ok(core.queue.borrow().len())
    }

    /// Number of queued events. Unless events are already queued, `mode`
    /// decides whether to read (1) or flush and read (2) first.
    pub fn events_queued(&self, mode: i64) -> Result<usize> {
        const OP: &str = "events_queued";
        let core = self.core();
        core.require_open(OP)?;
        let mode = QueueMode::from_i64(mode).ok_or(Error::OutOfRange {
            op: OP,
            what: "queue mode",
            value: mode,
        })?;

        let queued = core.queue.borrow().len();
        if queued > 0 || mode == QueueMode::Already {
            return Ok(queued);
        }
        if mode == QueueMode::AfterFlush {
            core.call(OP, |s| s.flush())?;
        }
        self.read_available(OP)?;
        Ok(core.queue.borrow().len())
    }

    /// Number of events already in the local queue
    pub fn q_length(&self) -> Result<usize> {
        self.core().require_open("q_length")?;
        Ok(self.core().queue.borrow().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Journal, NativeCall, NullSession};
    use crate::event::slot;
    use crate::protocol::*;
    use crate::resources::Registry;

    fn open() -> (Connection, Journal) {
        let session = NullSession::new();
        let journal = session.journal();
        (Connection::with_session(&Registry::new(), Box::new(session)), journal)
    }

    fn expose(window: XID) -> WireEvent {
        WireEvent::Expose(ExposeEvent {
            window,
            ..Default::default()
        })
    }

    fn key(window: XID) -> WireEvent {
        WireEvent::KeyPress(InputEvent {
            event: window,
            detail: 38,
            ..Default::default()
        })
    }

    #[test]
    fn test_next_and_peek() {
        let (conn, journal) = open();
        journal.push_event(key(XID(0x500)));
        journal.push_event(expose(XID(0x500)));

        let peeked = conn.peek_event().unwrap();
        assert_eq!(peeked.event_type(), Some(EventType::KeyPress));
        assert_eq!(conn.q_length().unwrap(), 1);

        let first = conn.next_event().unwrap();
        assert_eq!(first.event_type(), Some(EventType::KeyPress));
        assert_eq!(first[slot::KEYCODE], crate::event::Slot::Int(38));
        let second = conn.next_event().unwrap();
        assert_eq!(second.event_type(), Some(EventType::Expose));
    }

    #[test]
    fn test_mask_event_keeps_order_of_others() {
        let (conn, journal) = open();
        journal.push_event(key(XID(0x500)));
        journal.push_event(key(XID(0x501)));
        journal.push_event(expose(XID(0x500)));

        let event = conn.mask_event(event_mask::EXPOSURE).unwrap();
        assert_eq!(event.event_type(), Some(EventType::Expose));
        assert_eq!(conn.q_length().unwrap(), 2);

        let next = conn.next_event().unwrap();
        assert_eq!(next.window().map(|w| w.id()), Some(XID(0x500)));
    }

    #[test]
    fn test_check_never_blocks() {
        let (conn, journal) = open();
        assert!(conn.check_mask_event(event_mask::KEY_PRESS).unwrap().is_none());
        assert_eq!(journal.count(|c| *c == NativeCall::WaitEvent), 0);

        journal.push_event(expose(XID(0x500)));
        assert!(conn.check_typed_event(2).unwrap().is_none());
        assert_eq!(conn.q_length().unwrap(), 1);
        assert!(conn.check_typed_event(12).unwrap().is_some());
    }

    #[test]
    fn test_window_filtered() {
        let (conn, journal) = open();
        let win = conn.create_window().unwrap();
        journal.push_event(expose(XID(0x777)));
        journal.push_event(expose(win.id()));

        let event = conn
            .check_window_event(&win, event_mask::EXPOSURE)
            .unwrap()
            .unwrap();
        assert_eq!(event.window(), Some(&win));
        assert!(conn
            .check_typed_window_event(&win, 12)
            .unwrap()
            .is_none());

        win.destroy().unwrap();
        let err = conn.check_window_event(&win, event_mask::EXPOSURE).unwrap_err();
        assert!(err.is_state_error());
    }

    #[test]
    fn test_events_queued_modes() {
        let (conn, journal) = open();
        journal.push_event(expose(XID(1)));
        assert_eq!(conn.events_queued(0).unwrap(), 0);
        assert_eq!(conn.events_queued(1).unwrap(), 1);
        assert!(conn.events_queued(3).unwrap_err().is_range_error());

        journal.push_event(expose(XID(1)));
        assert_eq!(conn.pending().unwrap(), 2);
    }

    #[test]
    fn test_close_drops_queue() {
        let (conn, journal) = open();
        journal.push_event(expose(XID(1)));
        conn.pending().unwrap();
        conn.close().unwrap();
        assert!(conn.q_length().unwrap_err().is_state_error());
        assert!(conn.next_event().unwrap_err().is_state_error());
    }

    #[test]
    fn test_reuse_event() {
        let (conn, journal) = open();
        let mut event = Event::new();
        journal.push_event(key(XID(0x10)));
        conn.next_event_into(&mut event).unwrap();
        assert!(event[slot::SAME_SCREEN].is_applicable());

        journal.push_event(expose(XID(0x10)));
        assert!(conn.check_mask_event_into(event_mask::EXPOSURE, &mut event).unwrap());
        assert!(!event[slot::SAME_SCREEN].is_applicable());
        assert!(!conn.check_mask_event_into(event_mask::EXPOSURE, &mut event).unwrap());
    }
}
