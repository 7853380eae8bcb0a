//! Null Session - In-memory session for testing
//!
//! This session accepts every request without a server behind it. Each call
//! is appended to a shared [`Journal`] that tests keep after the session has
//! been handed to a connection, so they can assert exactly which native calls
//! happened and in what order. Events are injected through the journal.
//!
//! Any call made after `close` panics: the resource layer must never touch
//! a closed session.

use super::*;
use crate::protocol::*;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

/// First id handed out for client-created resources
const RESOURCE_ID_BASE: u32 = 0x0040_0000;

/// Root windows are numbered from here, one per screen
const ROOT_ID_BASE: u32 = 0x0000_0100;

/// A native call observed by the null session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeCall {
    Close,
    NoOp,
    Flush,
    CreateWindow(XID),
    MapWindow(XID),
    UnmapWindow(XID),
    DestroyWindow(XID),
    ClearArea(XID),
    SelectInput(XID, u32),
    CreatePixmap(XID),
    FreePixmap(XID),
    CopyArea { src: XID, dst: XID, gc: XID },
    DefaultGc(XID),
    CreateGc(XID),
    ChangeGc(XID, u32),
    CopyGc { src: XID, dst: XID, mask: u32 },
    FreeGc(XID),
    SetDashes(XID, usize),
    SetClipRectangles(XID, usize),
    DrawArcs(XID, usize),
    DrawLines(XID, usize),
    DrawPoints(XID, usize),
    DrawSegments(XID, usize),
    DrawRectangles(XID, usize),
    PollEvent,
    WaitEvent,
}

#[derive(Debug, Default)]
struct JournalState {
    calls: Vec<NativeCall>,
    events: VecDeque<RawEvent>,
    closed: bool,
    fail_next_create: bool,
    next_serial: u64,
}

/// Shared view of a null session's activity
#[derive(Debug, Clone, Default)]
pub struct Journal(Rc<RefCell<JournalState>>);

impl Journal {
    /// Every call so far, in order
    pub fn calls(&self) -> Vec<NativeCall> {
        self.0.borrow().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.0.borrow().calls.len()
    }

    /// Number of calls matching a predicate
    pub fn count(&self, pred: impl Fn(&NativeCall) -> bool) -> usize {
        self.0.borrow().calls.iter().filter(|c| pred(c)).count()
    }

    /// Position of the first call matching a predicate
    pub fn position(&self, pred: impl Fn(&NativeCall) -> bool) -> Option<usize> {
        self.0.borrow().calls.iter().position(pred)
    }

    pub fn is_closed(&self) -> bool {
        self.0.borrow().closed
    }

    /// Queue an event for the session to deliver. The serial is the number of
    /// requests issued so far.
    pub fn push_event(&self, event: WireEvent) {
        self.push_event_with(event, false);
    }

    pub fn push_event_with(&self, event: WireEvent, send_event: bool) {
        let mut state = self.0.borrow_mut();
        let raw = RawEvent::new(state.next_serial, &event, send_event);
        state.events.push_back(raw);
    }

    pub fn push_raw(&self, raw: RawEvent) {
        self.0.borrow_mut().events.push_back(raw);
    }

    /// Make the next create call report allocation failure
    pub fn fail_next_create(&self) {
        self.0.borrow_mut().fail_next_create = true;
    }

    pub fn pending_events(&self) -> usize {
        self.0.borrow().events.len()
    }
}

pub struct NullSession {
    info: SessionInfo,
    journal: Journal,
    next_id: u32,
    default_gcs: HashMap<usize, XID>,
}

impl NullSession {
    pub fn new() -> Self {
        Self::with_screens(1)
    }

    /// A session whose server reports `count` screens
    pub fn with_screens(count: usize) -> Self {
        let screens = (0..count.max(1))
            .map(|i| ScreenInfo {
                root: XID(ROOT_ID_BASE + i as u32),
                width: 1920,
                height: 1080,
                width_mm: 508,
                height_mm: 285,
                root_depth: 24,
                white_pixel: 0xFFFFFF,
                black_pixel: 0x000000,
                cells: 256,
                min_colormaps: 1,
                max_colormaps: 1,
            })
            .collect();

        NullSession {
            info: SessionInfo {
                display_name: ":null".to_string(),
                vendor: "x11handles null session".to_string(),
                protocol_version: PROTOCOL_MAJOR_VERSION,
                protocol_revision: PROTOCOL_MINOR_VERSION,
                vendor_release: 1,
                bitmap_unit: 32,
                bitmap_bit_order: 0,
                bitmap_pad: 32,
                image_byte_order: 0,
                default_screen: 0,
                screens,
            },
            journal: Journal::default(),
            next_id: RESOURCE_ID_BASE,
            default_gcs: HashMap::new(),
        }
    }

    pub fn with_display_name(mut self, name: &str) -> Self {
        self.info.display_name = name.to_string();
        self
    }

    /// Handle for inspecting this session after it has been moved
    pub fn journal(&self) -> Journal {
        self.journal.clone()
    }

    fn record(&mut self, call: NativeCall) {
        let mut state = self.journal.0.borrow_mut();
        if state.closed {
            panic!("native call {:?} on a closed session", call);
        }
        log::trace!("null session: {:?}", call);
        state.calls.push(call);
        state.next_serial += 1;
    }

    /// Allocate an id for a create call, or NONE if a failure was requested
    fn allocate(&mut self) -> XID {
        let mut state = self.journal.0.borrow_mut();
        if state.fail_next_create {
            state.fail_next_create = false;
            return XID::NONE;
        }
        drop(state);
        let id = XID(self.next_id);
        self.next_id += 1;
        id
    }
}

impl Default for NullSession {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeSession for NullSession {
    fn info(&self) -> &SessionInfo {
        &self.info
    }

    fn connection_number(&self) -> i32 {
        -1
    }

    fn next_request(&self) -> u64 {
        self.journal.0.borrow().next_serial + 1
    }

    fn last_known_request_processed(&self) -> u64 {
        self.journal.0.borrow().next_serial
    }

    fn close(&mut self) -> NativeResult<()> {
        self.record(NativeCall::Close);
        self.journal.0.borrow_mut().closed = true;
        Ok(())
    }

    fn no_op(&mut self) -> NativeResult<()> {
        self.record(NativeCall::NoOp);
        Ok(())
    }

    fn flush(&mut self) -> NativeResult<()> {
        self.record(NativeCall::Flush);
        Ok(())
    }

    fn create_window(&mut self, params: &WindowParams) -> NativeResult<XID> {
        if params.screen >= self.info.screens.len() {
            return Err(format!("no screen {}", params.screen).into());
        }
        let id = self.allocate();
        self.record(NativeCall::CreateWindow(id));
        Ok(id)
    }

    fn map_window(&mut self, window: XID) -> NativeResult<()> {
        self.record(NativeCall::MapWindow(window));
        Ok(())
    }

    fn unmap_window(&mut self, window: XID) -> NativeResult<()> {
        self.record(NativeCall::UnmapWindow(window));
        Ok(())
    }

    fn destroy_window(&mut self, window: XID) -> NativeResult<()> {
        self.record(NativeCall::DestroyWindow(window));
        Ok(())
    }

    fn clear_area(&mut self, window: XID, _area: Rectangle, _exposures: bool) -> NativeResult<()> {
        self.record(NativeCall::ClearArea(window));
        Ok(())
    }

    fn select_input(&mut self, window: XID, mask: u32) -> NativeResult<()> {
        self.record(NativeCall::SelectInput(window, mask));
        Ok(())
    }

    fn create_pixmap(
        &mut self,
        _screen: usize,
        _width: u16,
        _height: u16,
        _depth: u8,
    ) -> NativeResult<XID> {
        let id = self.allocate();
        self.record(NativeCall::CreatePixmap(id));
        Ok(id)
    }

    fn free_pixmap(&mut self, pixmap: XID) -> NativeResult<()> {
        self.record(NativeCall::FreePixmap(pixmap));
        Ok(())
    }

    fn copy_area(&mut self, src: XID, dst: XID, gc: XID, _region: CopyRegion) -> NativeResult<()> {
        self.record(NativeCall::CopyArea { src, dst, gc });
        Ok(())
    }

    fn default_gc(&mut self, screen: usize) -> NativeResult<XID> {
        if let Some(&gc) = self.default_gcs.get(&screen) {
            return Ok(gc);
        }
        let id = XID(self.next_id);
        self.next_id += 1;
        self.default_gcs.insert(screen, id);
        self.record(NativeCall::DefaultGc(id));
        Ok(id)
    }

    fn create_gc(&mut self, _drawable: XID, _values: &GcValues) -> NativeResult<XID> {
        let id = self.allocate();
        self.record(NativeCall::CreateGc(id));
        Ok(id)
    }

    fn change_gc(&mut self, gc: XID, values: &GcValues) -> NativeResult<()> {
        self.record(NativeCall::ChangeGc(gc, values.mask()));
        Ok(())
    }

    fn copy_gc(&mut self, src: XID, dst: XID, mask: u32) -> NativeResult<()> {
        self.record(NativeCall::CopyGc { src, dst, mask });
        Ok(())
    }

    fn free_gc(&mut self, gc: XID) -> NativeResult<()> {
        self.record(NativeCall::FreeGc(gc));
        Ok(())
    }

    fn set_dashes(&mut self, gc: XID, _offset: u16, dashes: &[u8]) -> NativeResult<()> {
        self.record(NativeCall::SetDashes(gc, dashes.len()));
        Ok(())
    }

    fn set_clip_rectangles(
        &mut self,
        gc: XID,
        _x: i16,
        _y: i16,
        rectangles: &[Rectangle],
        _ordering: ClipOrdering,
    ) -> NativeResult<()> {
        self.record(NativeCall::SetClipRectangles(gc, rectangles.len()));
        Ok(())
    }

    fn draw_arcs(&mut self, drawable: XID, _gc: XID, arcs: &[Arc]) -> NativeResult<()> {
        self.record(NativeCall::DrawArcs(drawable, arcs.len()));
        Ok(())
    }

    fn draw_lines(&mut self, drawable: XID, _gc: XID, points: &[Point]) -> NativeResult<()> {
        self.record(NativeCall::DrawLines(drawable, points.len()));
        Ok(())
    }

    fn draw_points(&mut self, drawable: XID, _gc: XID, points: &[Point]) -> NativeResult<()> {
        self.record(NativeCall::DrawPoints(drawable, points.len()));
        Ok(())
    }

    fn draw_segments(&mut self, drawable: XID, _gc: XID, segments: &[Segment]) -> NativeResult<()> {
        self.record(NativeCall::DrawSegments(drawable, segments.len()));
        Ok(())
    }

    fn draw_rectangles(
        &mut self,
        drawable: XID,
        _gc: XID,
        rectangles: &[Rectangle],
    ) -> NativeResult<()> {
        self.record(NativeCall::DrawRectangles(drawable, rectangles.len()));
        Ok(())
    }

    fn poll_event(&mut self) -> NativeResult<Option<RawEvent>> {
        self.record(NativeCall::PollEvent);
        Ok(self.journal.0.borrow_mut().events.pop_front())
    }

    fn wait_event(&mut self) -> NativeResult<RawEvent> {
        self.record(NativeCall::WaitEvent);
        self.journal
            .0
            .borrow_mut()
            .events
            .pop_front()
            .ok_or_else(|| "No events available".into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let mut session = NullSession::new();
        let params = WindowParams {
            screen: 0,
            x: 0,
            y: 0,
            width: 10,
            height: 10,
            border_width: 0,
            title: String::new(),
        };
        let a = session.create_window(&params).unwrap();
        let b = session.create_pixmap(0, 4, 4, 24).unwrap();
        assert_ne!(a, b);
        assert_ne!(a, XID::NONE);
    }

    #[test]
    fn test_fail_next_create() {
        let mut session = NullSession::new();
        let journal = session.journal();
        journal.fail_next_create();
        assert_eq!(session.create_pixmap(0, 1, 1, 1).unwrap(), XID::NONE);
        assert_ne!(session.create_pixmap(0, 1, 1, 1).unwrap(), XID::NONE);
    }

    #[test]
    fn test_default_gc_is_stable() {
        let mut session = NullSession::new();
        let journal = session.journal();
        let a = session.default_gc(0).unwrap();
        let b = session.default_gc(0).unwrap();
        assert_eq!(a, b);
        assert_eq!(journal.count(|c| matches!(c, NativeCall::DefaultGc(_))), 1);
    }

    #[test]
    #[should_panic(expected = "closed session")]
    fn test_call_after_close_panics() {
        let mut session = NullSession::new();
        session.close().unwrap();
        let _ = session.flush();
    }

    #[test]
    fn test_wait_without_events_fails() {
        let mut session = NullSession::new();
        assert!(session.wait_event().is_err());
        session.journal().push_event(WireEvent::Unknown(64));
        assert_eq!(session.wait_event().unwrap().code(), 64);
    }
}
