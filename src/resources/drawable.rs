//! Drawable wrapper
//!
//! One type covers windows and pixmaps; the state says which. A drawable
//! created here is released when its last reference goes, unless it was
//! already destroyed, belongs to someone else, or its connection is gone.

use super::connection::{Connection, ConnectionCore};
use super::gc::{self, GcChange, GraphicsContext};
use super::state::{self, DrawableState, GcState};
use crate::backend::CopyRegion;
use crate::draw::{DataKind, ShortArray};
use crate::error::{Error, ResourceKind, Result};
use crate::protocol::{Rectangle, XID};
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

pub(crate) struct DrawableInner {
    pub(crate) core: Rc<ConnectionCore>,
    id: XID,
    state: Cell<DrawableState>,
}

impl Drop for DrawableInner {
    fn drop(&mut self) {
        self.core.registry.forget(self.core.serial, self.id);

        let id = self.id;
        let state = self.state.get();
        if state.intersects(DrawableState::UNMAPPED | DrawableState::MAPPED) {
            self.core.release("window", id, |s| s.destroy_window(id));
        } else if state == DrawableState::PIXMAP {
            self.core.release("pixmap", id, |s| s.free_pixmap(id));
        }
    }
}

/// A window or pixmap. Clones are the same drawable; equality is identity.
#[derive(Clone)]
pub struct Drawable(Rc<DrawableInner>);

/// Resources passed to one request must come from the same connection
pub(crate) fn same_connection(
    op: &'static str,
    a: &Rc<ConnectionCore>,
    b: &Rc<ConnectionCore>,
) -> Result<()> {
    if Rc::ptr_eq(a, b) {
        Ok(())
    } else {
        Err(Error::ForeignResource { op })
    }
}

impl Drawable {
    pub(crate) fn new(core: Rc<ConnectionCore>, id: XID, state: DrawableState) -> Self {
        Drawable(Rc::new(DrawableInner {
            core,
            id,
            state: Cell::new(state),
        }))
    }

    pub(crate) fn from_inner(inner: Rc<DrawableInner>) -> Self {
        Drawable(inner)
    }

    pub(crate) fn inner(&self) -> &Rc<DrawableInner> {
        &self.0
    }

    pub(crate) fn core(&self) -> &Rc<ConnectionCore> {
        &self.0.core
    }

    pub fn id(&self) -> XID {
        self.0.id
    }

    pub fn state(&self) -> DrawableState {
        self.0.state.get()
    }

    pub fn is_pixmap(&self) -> bool {
        self.state() == DrawableState::PIXMAP
    }

    /// Owning connection, if a handle to it still exists
    pub fn connection(&self) -> Option<Connection> {
        self.0.core.handle()
    }

    /// The kind this drawable reports in type errors
    pub fn kind(&self) -> ResourceKind {
        if self.is_pixmap() {
            ResourceKind::Pixmap
        } else {
            ResourceKind::Window
        }
    }

    /// Validate the connection and this drawable's state
    pub(crate) fn guard(&self, op: &'static str, allowed: DrawableState) -> Result<()> {
        self.0.core.require_open(op)?;
        state::check_drawable(self.0.id, self.state(), allowed)
            .map_err(|violation| Error::state(op, violation))
    }

    fn set_state(&self, state: DrawableState) {
        log::trace!("drawable {}: {:?} -> {:?}", self.0.id, self.state(), state);
        self.0.state.set(state);
    }

    pub fn map(&self) -> Result<()> {
        const OP: &str = "map_window";
        self.guard(OP, DrawableState::UNMAPPED)?;
        let id = self.0.id;
        self.0.core.call(OP, |s| s.map_window(id))?;
        self.set_state(DrawableState::MAPPED);
        Ok(())
    }

    pub fn unmap(&self) -> Result<()> {
        const OP: &str = "unmap_window";
        self.guard(OP, DrawableState::MAPPED)?;
        let id = self.0.id;
        self.0.core.call(OP, |s| s.unmap_window(id))?;
        self.set_state(DrawableState::UNMAPPED);
        Ok(())
    }

    /// Destroy a window, or free a pixmap
    pub fn destroy(&self) -> Result<()> {
        if self.is_pixmap() {
            return self.free_pixmap();
        }
        const OP: &str = "destroy_window";
        self.guard(OP, DrawableState::UNMAPPED | DrawableState::MAPPED)?;
        let id = self.0.id;
        self.0.core.call(OP, |s| s.destroy_window(id))?;
        self.set_state(DrawableState::DESTROYED);
        Ok(())
    }

    pub fn free_pixmap(&self) -> Result<()> {
        const OP: &str = "free_pixmap";
        self.guard(OP, DrawableState::PIXMAP)?;
        let id = self.0.id;
        self.0.core.call(OP, |s| s.free_pixmap(id))?;
        self.set_state(DrawableState::DESTROYED);
        Ok(())
    }

    /// Clear the whole window to its background
    pub fn clear(&self) -> Result<()> {
        self.clear_region("clear_window", Rectangle::default(), false)
    }

    /// Clear an area. A zero width or height extends to the window edge.
    pub fn clear_area(
        &self,
        x: i16,
        y: i16,
        width: u16,
        height: u16,
        exposures: bool,
    ) -> Result<()> {
        self.clear_region("clear_area", Rectangle::new(x, y, width, height), exposures)
    }

    fn clear_region(&self, op: &'static str, area: Rectangle, exposures: bool) -> Result<()> {
        self.guard(op, !(DrawableState::DESTROYED | DrawableState::PIXMAP))?;
        let id = self.0.id;
        self.0.core.call(op, |s| s.clear_area(id, area, exposures))
    }

    pub fn select_input(&self, mask: u32) -> Result<()> {
        const OP: &str = "select_input";
        self.guard(OP, !DrawableState::DESTROYED)?;
        let id = self.0.id;
        self.0.core.call(OP, |s| s.select_input(id, mask))
    }

    /// Copy a region of this drawable into `dst`
    pub fn copy_area(&self, dst: &Drawable, gc: &GraphicsContext, region: CopyRegion) -> Result<()> {
        const OP: &str = "copy_area";
        let readable = DrawableState::MAPPED | DrawableState::PIXMAP | DrawableState::THIRD_PARTY;
        self.guard(OP, readable)?;
        dst.guard(OP, readable)?;
        gc.guard(OP, GcState::CREATED | GcState::DEFAULT)?;
        same_connection(OP, self.core(), dst.core())?;
        same_connection(OP, self.core(), gc.core())?;

        let (src, dst, gc) = (self.0.id, dst.id(), gc.id());
        self.0.core.call(OP, |s| s.copy_area(src, dst, gc, region))
    }

    /// Create a GC usable on this drawable's screen
    pub fn create_gc(&self, changes: &[GcChange]) -> Result<GraphicsContext> {
        const OP: &str = "create_gc";
        self.guard(OP, !DrawableState::DESTROYED)?;
        let values = gc::encode_changes(OP, changes)?;

        let id = self.0.id;
        let gc_id = self.0.core.call(OP, |s| s.create_gc(id, &values))?;
        if gc_id.is_none() {
            return Err(Error::CreationFailed {
                op: OP,
                kind: ResourceKind::GraphicsContext,
                detail: format!("on drawable {}", id),
            });
        }
        log::debug!("drawable {}: created GC {}", id, gc_id);
        Ok(GraphicsContext::created(self.0.core.clone(), gc_id))
    }

    fn draw_guard(&self, op: &'static str, gc: &GraphicsContext) -> Result<()> {
        self.guard(op, !DrawableState::DESTROYED)?;
        gc.guard(op, !GcState::FREED)?;
        same_connection(op, self.core(), gc.core())
    }

    pub fn draw_arcs(&self, gc: &GraphicsContext, data: &ShortArray) -> Result<()> {
        const OP: &str = "draw_arcs";
        self.draw_guard(OP, gc)?;
        let arcs = data.to_arcs(OP)?;
        let (id, gc) = (self.0.id, gc.id());
        self.0.core.call(OP, |s| s.draw_arcs(id, gc, &arcs))
    }

    /// Connected lines through each point in turn
    pub fn draw_lines(&self, gc: &GraphicsContext, data: &ShortArray) -> Result<()> {
        const OP: &str = "draw_lines";
        self.draw_guard(OP, gc)?;
        let points = data.to_points(OP, DataKind::Lines)?;
        let (id, gc) = (self.0.id, gc.id());
        self.0.core.call(OP, |s| s.draw_lines(id, gc, &points))
    }

    pub fn draw_points(&self, gc: &GraphicsContext, data: &ShortArray) -> Result<()> {
        const OP: &str = "draw_points";
        self.draw_guard(OP, gc)?;
        let points = data.to_points(OP, DataKind::Points)?;
        let (id, gc) = (self.0.id, gc.id());
        self.0.core.call(OP, |s| s.draw_points(id, gc, &points))
    }

    pub fn draw_segments(&self, gc: &GraphicsContext, data: &ShortArray) -> Result<()> {
        const OP: &str = "draw_segments";
        self.draw_guard(OP, gc)?;
        let segments = data.to_segments(OP)?;
        let (id, gc) = (self.0.id, gc.id());
        self.0.core.call(OP, |s| s.draw_segments(id, gc, &segments))
    }

    pub fn draw_rectangles(&self, gc: &GraphicsContext, data: &ShortArray) -> Result<()> {
        const OP: &str = "draw_rectangles";
        self.draw_guard(OP, gc)?;
        let rectangles = data.to_rectangles(OP)?;
        let (id, gc) = (self.0.id, gc.id());
        self.0.core.call(OP, |s| s.draw_rectangles(id, gc, &rectangles))
    }
}

impl PartialEq for Drawable {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Drawable {}

impl fmt::Debug for Drawable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Drawable")
            .field("id", &self.0.id)
            .field("state", &self.state())
            .field("connection", &self.0.core.serial)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Journal, NativeCall, NullSession};
    use crate::resources::{Registry, StateViolation};

    fn open() -> (Connection, Journal) {
        let session = NullSession::new();
        let journal = session.journal();
        (Connection::with_session(&Registry::new(), Box::new(session)), journal)
    }

    #[test]
    fn test_map_unmap_cycle() {
        let (conn, journal) = open();
        let win = conn.create_window().unwrap();
        assert_eq!(win.state(), DrawableState::UNMAPPED);

        win.map().unwrap();
        assert_eq!(win.state(), DrawableState::MAPPED);
        let before = journal.call_count();
        let err = win.map().unwrap_err();
        assert!(err.to_string().contains("already mapped"));
        assert_eq!(journal.call_count(), before);

        win.unmap().unwrap();
        assert!(win.unmap().unwrap_err().to_string().contains("already unmapped"));
    }

    #[test]
    fn test_destroy_twice() {
        let (conn, journal) = open();
        let win = conn.create_window().unwrap();
        win.destroy().unwrap();
        let err = win.destroy().unwrap_err();
        assert_eq!(
            err.violation(),
            Some(&StateViolation::Drawable {
                id: win.id(),
                state: DrawableState::DESTROYED
            })
        );
        assert_eq!(journal.count(|c| matches!(c, NativeCall::DestroyWindow(_))), 1);
    }

    #[test]
    fn test_pixmap_routing() {
        let (conn, journal) = open();
        let pixmap = conn.create_pixmap(None, 16, 16, 24).unwrap();
        assert!(pixmap.map().unwrap_err().to_string().contains("is a pixmap"));
        assert!(pixmap.clear().is_err());

        pixmap.destroy().unwrap();
        assert_eq!(pixmap.state(), DrawableState::DESTROYED);
        assert_eq!(journal.count(|c| *c == NativeCall::FreePixmap(pixmap.id())), 1);
        assert_eq!(journal.count(|c| matches!(c, NativeCall::DestroyWindow(_))), 0);
    }

    #[test]
    fn test_third_party_is_never_destroyed() {
        let (conn, journal) = open();
        let root = conn.root_window(None).unwrap();
        assert!(root.destroy().unwrap_err().to_string().contains("third party"));
        assert!(root.select_input(0).is_ok());
        drop(root);
        assert_eq!(journal.count(|c| matches!(c, NativeCall::DestroyWindow(_))), 0);
    }

    #[test]
    fn test_drop_releases_by_kind() {
        let (conn, journal) = open();
        let win = conn.create_window().unwrap();
        let pixmap = conn.create_pixmap(None, 4, 4, 1).unwrap();
        let (win_id, pixmap_id) = (win.id(), pixmap.id());
        drop(win);
        drop(pixmap);
        assert_eq!(journal.count(|c| *c == NativeCall::DestroyWindow(win_id)), 1);
        assert_eq!(journal.count(|c| *c == NativeCall::FreePixmap(pixmap_id)), 1);
        assert_eq!(conn.registry().live_entries(), 0);
    }

    #[test]
    fn test_draw_shape_checked_first() {
        let (conn, journal) = open();
        let win = conn.create_window().unwrap();
        let gc = conn.default_gc(None).unwrap();
        let before = journal.call_count();
        let err = win
            .draw_rectangles(&gc, &ShortArray::from_rows(&[[0, 0, 5]]))
            .unwrap_err();
        assert!(matches!(err, Error::DataShape { .. }));
        assert_eq!(journal.call_count(), before);

        win.draw_points(&gc, &ShortArray::from_rows(&[[1, 1], [2, 2]]))
            .unwrap();
        assert_eq!(journal.count(|c| *c == NativeCall::DrawPoints(win.id(), 2)), 1);
    }

    #[test]
    fn test_foreign_gc_rejected() {
        let registry = Registry::new();
        let one = Connection::with_session(&registry, Box::new(NullSession::new()));
        let two = Connection::with_session(&registry, Box::new(NullSession::new()));
        let win = one.create_window().unwrap();
        let gc = two.default_gc(None).unwrap();
        let err = win
            .draw_points(&gc, &ShortArray::from_rows(&[[0, 0]]))
            .unwrap_err();
        assert!(err.is_type_error());
    }

    #[test]
    fn test_copy_area_gating() {
        let (conn, journal) = open();
        let win = conn.create_window().unwrap();
        let pixmap = conn.create_pixmap(None, 8, 8, 24).unwrap();
        let gc = win.create_gc(&[]).unwrap();

        // unmapped windows are not a valid source
        assert!(win.copy_area(&pixmap, &gc, CopyRegion::default()).is_err());
        win.map().unwrap();
        win.copy_area(&pixmap, &gc, CopyRegion::default()).unwrap();

        gc.free().unwrap();
        assert!(pixmap.copy_area(&win, &gc, CopyRegion::default()).is_err());
        assert_eq!(journal.count(|c| matches!(c, NativeCall::CopyArea { .. })), 1);
    }
}
