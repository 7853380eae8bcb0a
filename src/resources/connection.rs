//! Connection wrapper
//!
//! A [`Connection`] is a cheap handle onto one native session. Everything
//! that depends on the session (screens, drawables, GCs) holds the shared
//! [`ConnectionCore`] instead of the handle, so dependents never keep the
//! handle alive. When the last handle goes, the session is closed and the
//! core is marked finalized; dependents dropped afterwards see the mark and
//! skip their native release.

use super::drawable::Drawable;
use super::gc::GraphicsContext;
use super::screen::Screen;
use super::state::{self, ConnectionState, DrawableState, StateViolation};
use super::table::{self, Registry};
use crate::backend::{self, NativeResult, NativeSession, SessionInfo, WindowParams};
use crate::config::{Config, WindowDefaults};
use crate::error::{Error, NativeContext, ResourceKind, Result};
use crate::protocol::{RawEvent, XID};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::rc::{Rc, Weak};

/// Session state shared between a connection handle and its dependents
pub(crate) struct ConnectionCore {
    /// Scope key in the identity table
    pub(crate) serial: u64,
    pub(crate) registry: Registry,
    session: RefCell<Box<dyn NativeSession>>,
    info: SessionInfo,
    state: Cell<ConnectionState>,
    finalized: Cell<bool>,
    /// Events read from the session but not yet handed out
    pub(crate) queue: RefCell<VecDeque<RawEvent>>,
    window_defaults: WindowDefaults,
    handle: Weak<ConnectionHandle>,
}

impl ConnectionCore {
    pub(crate) fn state(&self) -> ConnectionState {
        self.state.get()
    }

    pub(crate) fn is_finalized(&self) -> bool {
        self.finalized.get()
    }

    /// True while native calls are permitted
    pub(crate) fn is_live(&self) -> bool {
        !self.finalized.get() && self.state.get() == ConnectionState::OPEN
    }

    pub(crate) fn require_open(&self, op: &'static str) -> Result<()> {
        if self.finalized.get() {
            return Err(Error::state(op, StateViolation::ConnectionClosed));
        }
        state::check_connection(self.state.get(), ConnectionState::OPEN)
            .map_err(|violation| Error::state(op, violation))
    }

    pub(crate) fn info(&self) -> &SessionInfo {
        &self.info
    }

    /// Run a native call. Callers validate first.
    pub(crate) fn call<T>(
        &self,
        op: &'static str,
        f: impl FnOnce(&mut dyn NativeSession) -> NativeResult<T>,
    ) -> Result<T> {
        let mut session = self.session.borrow_mut();
        f(&mut **session).native(op)
    }

    /// Read-only access to the session
    pub(crate) fn peek<T>(&self, f: impl FnOnce(&dyn NativeSession) -> T) -> T {
        let session = self.session.borrow();
        f(&**session)
    }

    /// Native release on behalf of a dropped wrapper. Never called once the
    /// connection is closed or finalized; failures are logged, not raised.
    pub(crate) fn release(
        &self,
        what: &str,
        id: XID,
        f: impl FnOnce(&mut dyn NativeSession) -> NativeResult<()>,
    ) {
        if !self.is_live() {
            log::trace!("finalize {} {}: connection gone, nothing to release", what, id);
            return;
        }
        let Ok(mut session) = self.session.try_borrow_mut() else {
            log::warn!("finalize {} {}: session busy, leaking", what, id);
            return;
        };
        match f(&mut **session) {
            Ok(()) => log::trace!("finalize {} {}: released", what, id),
            Err(e) => log::warn!("finalize {} {}: {}", what, id, e),
        }
    }

    /// The live handle, if any code still holds one
    pub(crate) fn handle(&self) -> Option<Connection> {
        self.handle.upgrade().map(|handle| Connection { handle })
    }

    fn shut_down(&self) -> NativeResult<()> {
        self.state.set(ConnectionState::CLOSED);
        self.queue.borrow_mut().clear();
        let mut session = self
            .session
            .try_borrow_mut()
            .map_err(|_| "session is in use")?;
        session.close()
    }
}

/// What a [`Connection`] points at. Dropping it is the connection's finalizer.
struct ConnectionHandle {
    core: Rc<ConnectionCore>,
    /// Default GC per screen, released only together with the handle
    default_gcs: RefCell<BTreeMap<usize, GraphicsContext>>,
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        let core = &self.core;
        if core.state.get() == ConnectionState::OPEN {
            log::debug!("connection {}: finalizing open session", core.serial);
            if let Err(e) = core.shut_down() {
                log::warn!("connection {}: close during finalization failed: {}", core.serial, e);
            }
        }
        core.finalized.set(true);
        // default_gcs drops after this and finds the core finalized
    }
}

/// Handle onto an open (or closed) display connection.
///
/// Clones share one session. Equality is identity.
#[derive(Clone)]
pub struct Connection {
    handle: Rc<ConnectionHandle>,
}

impl Connection {
    /// Open a session with the configured backend on the configured display
    pub fn open(registry: &Registry, config: &Config) -> Result<Connection> {
        let session = backend::open_session(config.backend, config.display.as_deref())
            .map_err(|source| Error::Connect {
                display: config.display.clone(),
                source,
            })?;
        Ok(Self::with_session_and_defaults(
            registry,
            session,
            config.window.clone(),
        ))
    }

    /// Adopt an already opened session
    pub fn with_session(registry: &Registry, session: Box<dyn NativeSession>) -> Connection {
        Self::with_session_and_defaults(registry, session, WindowDefaults::default())
    }

    pub fn with_session_and_defaults(
        registry: &Registry,
        session: Box<dyn NativeSession>,
        window_defaults: WindowDefaults,
    ) -> Connection {
        let serial = table::next_connection_serial();
        let info = session.info().clone();
        log::info!(
            "connection {}: opened display {} ({}, {} screen(s))",
            serial,
            info.display_name,
            info.vendor,
            info.screens.len()
        );

        let handle = Rc::new_cyclic(|weak| ConnectionHandle {
            core: Rc::new(ConnectionCore {
                serial,
                registry: registry.clone(),
                session: RefCell::new(session),
                info,
                state: Cell::new(ConnectionState::OPEN),
                finalized: Cell::new(false),
                queue: RefCell::default(),
                window_defaults,
                handle: weak.clone(),
            }),
            default_gcs: RefCell::default(),
        });
        Connection { handle }
    }

    pub(crate) fn core(&self) -> &Rc<ConnectionCore> {
        &self.handle.core
    }

    pub fn registry(&self) -> &Registry {
        &self.handle.core.registry
    }

    pub fn state(&self) -> ConnectionState {
        self.core().state()
    }

    pub fn is_open(&self) -> bool {
        self.core().is_live()
    }

    /// Close the session. Locally queued events are discarded. Closing twice
    /// is a state error.
    pub fn close(&self) -> Result<()> {
        const OP: &str = "close_display";
        let core = self.core();
        core.require_open(OP)?;
        log::info!("connection {}: closing {}", core.serial, core.info.display_name);
        core.state.set(ConnectionState::CLOSED);
        core.queue.borrow_mut().clear();
        core.call(OP, |s| s.close())
    }

    fn open_info(&self, op: &'static str) -> Result<&SessionInfo> {
        self.core().require_open(op)?;
        Ok(self.core().info())
    }

    fn request<T>(
        &self,
        op: &'static str,
        f: impl FnOnce(&mut dyn NativeSession) -> NativeResult<T>,
    ) -> Result<T> {
        self.core().require_open(op)?;
        self.core().call(op, f)
    }

    pub fn no_op(&self) -> Result<()> {
        self.request("no_op", |s| s.no_op())
    }

    pub fn flush(&self) -> Result<()> {
        self.request("flush", |s| s.flush())
    }

    /// File descriptor of the connection, -1 when there is none
    pub fn connection_number(&self) -> Result<i32> {
        self.core().require_open("connection_number")?;
        Ok(self.core().peek(|s| s.connection_number()))
    }

    pub fn screen_count(&self) -> Result<usize> {
        Ok(self.open_info("screen_count")?.screens.len())
    }

    /// Index of the default screen
    pub fn default_screen(&self) -> Result<usize> {
        Ok(self.open_info("default_screen")?.default_screen)
    }

    pub fn server_vendor(&self) -> Result<String> {
        Ok(self.open_info("server_vendor")?.vendor.clone())
    }

    pub fn protocol_version(&self) -> Result<u16> {
        Ok(self.open_info("protocol_version")?.protocol_version)
    }

    pub fn protocol_revision(&self) -> Result<u16> {
        Ok(self.open_info("protocol_revision")?.protocol_revision)
    }

    pub fn vendor_release(&self) -> Result<u32> {
        Ok(self.open_info("vendor_release")?.vendor_release)
    }

    /// The display name the session was opened on
    pub fn display_string(&self) -> Result<String> {
        Ok(self.open_info("display_string")?.display_name.clone())
    }

    pub fn bitmap_unit(&self) -> Result<u8> {
        Ok(self.open_info("bitmap_unit")?.bitmap_unit)
    }

    pub fn bitmap_bit_order(&self) -> Result<u8> {
        Ok(self.open_info("bitmap_bit_order")?.bitmap_bit_order)
    }

    pub fn bitmap_pad(&self) -> Result<u8> {
        Ok(self.open_info("bitmap_pad")?.bitmap_pad)
    }

    pub fn image_byte_order(&self) -> Result<u8> {
        Ok(self.open_info("image_byte_order")?.image_byte_order)
    }

    pub fn next_request(&self) -> Result<u64> {
        self.core().require_open("next_request")?;
        Ok(self.core().peek(|s| s.next_request()))
    }

    pub fn last_known_request_processed(&self) -> Result<u64> {
        self.core().require_open("last_known_request_processed")?;
        Ok(self.core().peek(|s| s.last_known_request_processed()))
    }

    /// Resolve a screen index, `None` meaning the default screen
    pub(crate) fn screen_index(&self, op: &'static str, screen: Option<usize>) -> Result<usize> {
        let info = self.open_info(op)?;
        match screen {
            None => Ok(info.default_screen),
            Some(n) if n < info.screens.len() => Ok(n),
            Some(n) => Err(Error::OutOfRange {
                op,
                what: "screen",
                value: n as i64,
            }),
        }
    }

    pub fn screen(&self, screen: Option<usize>) -> Result<Screen> {
        let number = self.screen_index("screen", screen)?;
        Ok(Screen::new(self.core().clone(), number))
    }

    pub fn root_window(&self, screen: Option<usize>) -> Result<Drawable> {
        self.screen(screen)?.root_window()
    }

    /// Create an unmapped top-level window on the default screen
    pub fn create_window(&self) -> Result<Drawable> {
        const OP: &str = "create_window";
        let core = self.core();
        core.require_open(OP)?;

        let defaults = &core.window_defaults;
        let params = WindowParams {
            screen: core.info.default_screen,
            x: 0,
            y: 0,
            width: defaults.width,
            height: defaults.height,
            border_width: defaults.border_width,
            title: defaults.title.clone(),
        };
        let id = core.call(OP, |s| s.create_window(&params))?;
        if id.is_none() {
            let parent = core
                .info
                .screens
                .get(params.screen)
                .map_or(XID::NONE, |screen| screen.root);
            return Err(Error::CreationFailed {
                op: OP,
                kind: ResourceKind::Window,
                detail: format!(
                    "parent {}, {}x{} at {},{}, border {}",
                    parent, params.width, params.height, params.x, params.y, params.border_width
                ),
            });
        }

        let window = Drawable::new(core.clone(), id, DrawableState::UNMAPPED);
        core.registry.insert(&window);
        log::debug!("connection {}: created window {}", core.serial, id);
        Ok(window)
    }

    pub fn create_pixmap(
        &self,
        screen: Option<usize>,
        width: u16,
        height: u16,
        depth: u8,
    ) -> Result<Drawable> {
        const OP: &str = "create_pixmap";
        let number = self.screen_index(OP, screen)?;
        let core = self.core();

        let id = core.call(OP, |s| s.create_pixmap(number, width, height, depth))?;
        if id.is_none() {
            return Err(Error::CreationFailed {
                op: OP,
                kind: ResourceKind::Pixmap,
                detail: format!("{}x{} depth {}", width, height, depth),
            });
        }

        let pixmap = Drawable::new(core.clone(), id, DrawableState::PIXMAP);
        core.registry.insert(&pixmap);
        log::debug!(
            "connection {}: created pixmap {} ({}x{}x{})",
            core.serial,
            id,
            width,
            height,
            depth
        );
        Ok(pixmap)
    }

    /// The default GC of a screen. Repeated calls return the same GC.
    pub fn default_gc(&self, screen: Option<usize>) -> Result<GraphicsContext> {
        const OP: &str = "default_gc";
        let number = self.screen_index(OP, screen)?;
        if let Some(gc) = self.handle.default_gcs.borrow().get(&number) {
            return Ok(gc.clone());
        }

        let core = self.core();
        let id = core.call(OP, |s| s.default_gc(number))?;
        if id.is_none() {
            return Err(Error::CreationFailed {
                op: OP,
                kind: ResourceKind::GraphicsContext,
                detail: format!("no default GC on screen {}", number),
            });
        }
        let gc = GraphicsContext::default_for(core.clone(), id);
        self.handle
            .default_gcs
            .borrow_mut()
            .insert(number, gc.clone());
        Ok(gc)
    }

    /// Look up a window by id, wrapping it as third party on first sight
    pub fn lookup_drawable(&self, id: XID) -> Result<Option<Drawable>> {
        self.core().require_open("lookup_drawable")?;
        Ok(self.core().registry.resolve(self.core(), id))
    }
}

impl PartialEq for Connection {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.handle, &other.handle)
    }
}

impl Eq for Connection {}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.core();
        f.debug_struct("Connection")
            .field("serial", &core.serial)
            .field("display", &core.info.display_name)
            .field("state", &core.state.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Journal, NativeCall, NullSession};

    fn open() -> (Connection, Journal) {
        let session = NullSession::with_screens(2);
        let journal = session.journal();
        (Connection::with_session(&Registry::new(), Box::new(session)), journal)
    }

    #[test]
    fn test_close_once() {
        let (conn, journal) = open();
        assert!(conn.is_open());
        conn.close().unwrap();
        assert_eq!(conn.state(), ConnectionState::CLOSED);

        let err = conn.close().unwrap_err();
        assert_eq!(err.violation(), Some(&StateViolation::ConnectionClosed));
        assert_eq!(journal.count(|c| *c == NativeCall::Close), 1);
    }

    #[test]
    fn test_queries_require_open() {
        let (conn, journal) = open();
        assert_eq!(conn.screen_count().unwrap(), 2);
        assert_eq!(conn.display_string().unwrap(), ":null");
        assert_eq!(conn.protocol_version().unwrap(), 11);
        conn.close().unwrap();

        let calls = journal.call_count();
        assert!(conn.no_op().unwrap_err().is_state_error());
        assert!(conn.server_vendor().unwrap_err().is_state_error());
        assert!(conn.create_window().unwrap_err().is_state_error());
        assert_eq!(journal.call_count(), calls);
    }

    #[test]
    fn test_screen_range() {
        let (conn, _journal) = open();
        assert_eq!(conn.screen(None).unwrap().number(), 0);
        assert_eq!(conn.screen(Some(1)).unwrap().number(), 1);
        assert!(conn.screen(Some(2)).unwrap_err().is_range_error());
    }

    #[test]
    fn test_creation_failure() {
        let (conn, journal) = open();
        journal.fail_next_create();
        let err = conn.create_window().unwrap_err();
        assert!(matches!(
            err,
            Error::CreationFailed {
                kind: ResourceKind::Window,
                ..
            }
        ));
        let root = conn.root_window(None).unwrap();
        let message = err.to_string();
        assert!(message.contains(&format!("parent {}", root.id())), "{}", message);
        assert!(message.contains("600x400 at 0,0, border 0"), "{}", message);
        drop(root);
        assert_eq!(conn.registry().live_entries(), 0);
    }

    #[test]
    fn test_default_gc_cached_per_screen() {
        let (conn, journal) = open();
        let a = conn.default_gc(None).unwrap();
        let b = conn.default_gc(Some(0)).unwrap();
        let c = conn.default_gc(Some(1)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(journal.count(|c| matches!(c, NativeCall::DefaultGc(_))), 2);
    }

    #[test]
    fn test_finalize_closes_session() {
        let (conn, journal) = open();
        let core = conn.core().clone();
        let _gc = conn.default_gc(None).unwrap();
        drop(conn);
        assert!(journal.is_closed());
        assert!(core.is_finalized());
        assert!(core.handle().is_none());
    }

    #[test]
    fn test_equality_is_identity() {
        let registry = Registry::new();
        let a = Connection::with_session(&registry, Box::new(NullSession::new()));
        let b = Connection::with_session(&registry, Box::new(NullSession::new()));
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }
}
