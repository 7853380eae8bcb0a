//! Graphics context wrapper
//!
//! A GC is either the default GC of a screen, owned by its connection and
//! never freed from here, or one created through a drawable, which is freed
//! explicitly or when its last reference goes.

use super::connection::{Connection, ConnectionCore};
use super::drawable::same_connection;
use super::state::{self, GcState};
use crate::backend::GcValues;
use crate::draw::ShortArray;
use crate::error::{Error, Result};
use crate::protocol::{ClipOrdering, XID};
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// GC field indices. Each index is also the field's bit in the value mask.
pub mod field {
    pub const FUNCTION: i64 = 0;
    pub const PLANE_MASK: i64 = 1;
    pub const FOREGROUND: i64 = 2;
    pub const BACKGROUND: i64 = 3;
    pub const LINE_WIDTH: i64 = 4;
    pub const LINE_STYLE: i64 = 5;
    pub const CAP_STYLE: i64 = 6;
    pub const JOIN_STYLE: i64 = 7;
    pub const FILL_STYLE: i64 = 8;
    pub const FILL_RULE: i64 = 9;
    pub const TILE: i64 = 10;
    pub const STIPPLE: i64 = 11;
    pub const TS_X_ORIGIN: i64 = 12;
    pub const TS_Y_ORIGIN: i64 = 13;
    pub const FONT: i64 = 14;
    pub const SUBWINDOW_MODE: i64 = 15;
    pub const GRAPHICS_EXPOSURES: i64 = 16;
    pub const CLIP_X_ORIGIN: i64 = 17;
    pub const CLIP_Y_ORIGIN: i64 = 18;
    pub const CLIP_MASK: i64 = 19;
    pub const DASH_OFFSET: i64 = 20;
    pub const DASHES: i64 = 21;
    pub const ARC_MODE: i64 = 22;
}

pub const GC_FIELD_COUNT: usize = 23;

const FIELD_NAMES: [&str; GC_FIELD_COUNT] = [
    "function",
    "plane-mask",
    "foreground",
    "background",
    "line-width",
    "line-style",
    "cap-style",
    "join-style",
    "fill-style",
    "fill-rule",
    "tile",
    "stipple",
    "ts-x-origin",
    "ts-y-origin",
    "font",
    "subwindow-mode",
    "graphics-exposures",
    "clip-x-origin",
    "clip-y-origin",
    "clip-mask",
    "dash-offset",
    "dashes",
    "arc-mode",
];

/// Value of one GC field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GcValue {
    Int(i64),
    Flag(bool),
}

impl From<i64> for GcValue {
    fn from(v: i64) -> Self {
        GcValue::Int(v)
    }
}

impl From<i32> for GcValue {
    fn from(v: i32) -> Self {
        GcValue::Int(v.into())
    }
}

impl From<u32> for GcValue {
    fn from(v: u32) -> Self {
        GcValue::Int(v.into())
    }
}

impl From<bool> for GcValue {
    fn from(v: bool) -> Self {
        GcValue::Flag(v)
    }
}

/// A `(field index, value)` pair
pub type GcChange = (i64, GcValue);

fn field_index(op: &'static str, index: i64) -> Result<usize> {
    usize::try_from(index)
        .ok()
        .filter(|&i| i < GC_FIELD_COUNT)
        .ok_or(Error::OutOfRange {
            op,
            what: "GC field",
            value: index,
        })
}

fn number<T: TryFrom<i64>>(op: &'static str, field: &'static str, value: GcValue) -> Result<T> {
    match value {
        GcValue::Int(v) => T::try_from(v).map_err(|_| Error::OutOfRange {
            op,
            what: field,
            value: v,
        }),
        GcValue::Flag(_) => Err(Error::WrongValue {
            op,
            field,
            expected: "integer",
        }),
    }
}

/// Turn a change list into the value set sent with CreateGC or ChangeGC
pub(crate) fn encode_changes(op: &'static str, changes: &[GcChange]) -> Result<GcValues> {
    let mut values = GcValues::default();
    for &(index, value) in changes {
        let i = field_index(op, index)?;
        let name = FIELD_NAMES[i];
        match index {
            field::FUNCTION => values.function = Some(number(op, name, value)?),
            field::PLANE_MASK => values.plane_mask = Some(number(op, name, value)?),
            field::FOREGROUND => values.foreground = Some(number(op, name, value)?),
            field::BACKGROUND => values.background = Some(number(op, name, value)?),
            field::LINE_WIDTH => values.line_width = Some(number(op, name, value)?),
            field::LINE_STYLE => values.line_style = Some(number(op, name, value)?),
            field::CAP_STYLE => values.cap_style = Some(number(op, name, value)?),
            field::JOIN_STYLE => values.join_style = Some(number(op, name, value)?),
            field::FILL_STYLE => values.fill_style = Some(number(op, name, value)?),
            field::FILL_RULE => values.fill_rule = Some(number(op, name, value)?),
            field::TS_X_ORIGIN => values.ts_x_origin = Some(number(op, name, value)?),
            field::TS_Y_ORIGIN => values.ts_y_origin = Some(number(op, name, value)?),
            field::SUBWINDOW_MODE => values.subwindow_mode = Some(number(op, name, value)?),
            field::GRAPHICS_EXPOSURES => match value {
                GcValue::Flag(b) => values.graphics_exposures = Some(b),
                GcValue::Int(_) => {
                    return Err(Error::WrongValue {
                        op,
                        field: name,
                        expected: "boolean",
                    })
                }
            },
            field::CLIP_X_ORIGIN => values.clip_x_origin = Some(number(op, name, value)?),
            field::CLIP_Y_ORIGIN => values.clip_y_origin = Some(number(op, name, value)?),
            field::DASH_OFFSET => values.dash_offset = Some(number(op, name, value)?),
            field::DASHES => values.dashes = Some(number(op, name, value)?),
            field::ARC_MODE => values.arc_mode = Some(number(op, name, value)?),
            // TILE, STIPPLE, FONT, CLIP_MASK: pixmap and font ids cannot be passed
            _ => {
                return Err(Error::WrongValue {
                    op,
                    field: name,
                    expected: "a supported field",
                })
            }
        }
    }
    Ok(values)
}

/// Value mask for a list of field indices
fn field_mask(op: &'static str, fields: &[i64]) -> Result<u32> {
    fields.iter().try_fold(0u32, |mask, &index| {
        Ok(mask | (1 << field_index(op, index)?))
    })
}

pub(crate) struct GcInner {
    core: Rc<ConnectionCore>,
    id: XID,
    state: Cell<GcState>,
}

impl Drop for GcInner {
    fn drop(&mut self) {
        if self.state.get() == GcState::CREATED {
            let id = self.id;
            self.core.release("GC", id, |s| s.free_gc(id));
        }
    }
}

/// A graphics context. Clones are the same GC; equality is identity.
#[derive(Clone)]
pub struct GraphicsContext(Rc<GcInner>);

impl GraphicsContext {
    fn new(core: Rc<ConnectionCore>, id: XID, state: GcState) -> Self {
        GraphicsContext(Rc::new(GcInner {
            core,
            id,
            state: Cell::new(state),
        }))
    }

    pub(crate) fn default_for(core: Rc<ConnectionCore>, id: XID) -> Self {
        Self::new(core, id, GcState::DEFAULT)
    }

    pub(crate) fn created(core: Rc<ConnectionCore>, id: XID) -> Self {
        Self::new(core, id, GcState::CREATED)
    }

    pub(crate) fn core(&self) -> &Rc<ConnectionCore> {
        &self.0.core
    }

    pub fn id(&self) -> XID {
        self.0.id
    }

    pub fn state(&self) -> GcState {
        self.0.state.get()
    }

    /// Owning connection, if a handle to it still exists
    pub fn connection(&self) -> Option<Connection> {
        self.0.core.handle()
    }

    pub(crate) fn guard(&self, op: &'static str, allowed: GcState) -> Result<()> {
        self.0.core.require_open(op)?;
        state::check_gc(self.0.id, self.state(), allowed)
            .map_err(|violation| Error::state(op, violation))
    }

    pub fn change(&self, changes: &[GcChange]) -> Result<()> {
        const OP: &str = "change_gc";
        self.guard(OP, GcState::CREATED | GcState::DEFAULT)?;
        let values = encode_changes(OP, changes)?;
        if values.is_empty() {
            return Ok(());
        }
        let id = self.0.id;
        self.0.core.call(OP, |s| s.change_gc(id, &values))
    }

    /// Free a GC created through [`Drawable::create_gc`](super::Drawable::create_gc).
    /// Default GCs cannot be freed.
    pub fn free(&self) -> Result<()> {
        const OP: &str = "free_gc";
        self.guard(OP, GcState::CREATED)?;
        let id = self.0.id;
        self.0.core.call(OP, |s| s.free_gc(id))?;
        self.0.state.set(GcState::FREED);
        log::debug!("GC {} freed", id);
        Ok(())
    }

    pub fn set_dashes(&self, offset: u16, dashes: &[u8]) -> Result<()> {
        const OP: &str = "set_dashes";
        self.guard(OP, GcState::CREATED | GcState::DEFAULT)?;
        if dashes.is_empty() {
            return Err(Error::DataShape {
                op: OP,
                kind: "dashes",
                detail: "empty dash list".to_string(),
            });
        }
        let id = self.0.id;
        self.0.core.call(OP, |s| s.set_dashes(id, offset, dashes))
    }

    /// Restrict drawing to a set of rectangles. `ordering` defaults to
    /// unsorted.
    pub fn set_clip_rectangles(
        &self,
        x: i16,
        y: i16,
        rectangles: &ShortArray,
        ordering: Option<i64>,
    ) -> Result<()> {
        const OP: &str = "set_clip_rectangles";
        self.guard(OP, GcState::CREATED | GcState::DEFAULT)?;
        let ordering = match ordering {
            None => ClipOrdering::default(),
            Some(v) => ClipOrdering::from_i64(v).ok_or(Error::OutOfRange {
                op: OP,
                what: "clip ordering",
                value: v,
            })?,
        };
        let rects = rectangles.to_rectangles(OP)?;
        let id = self.0.id;
        self.0
            .core
            .call(OP, |s| s.set_clip_rectangles(id, x, y, &rects, ordering))
    }

    /// Copy the listed fields of this GC into `dst`
    pub fn copy_to(&self, dst: &GraphicsContext, fields: &[i64]) -> Result<()> {
        const OP: &str = "copy_gc";
        self.guard(OP, GcState::CREATED | GcState::DEFAULT)?;
        dst.guard(OP, !GcState::FREED)?;
        same_connection(OP, self.core(), dst.core())?;
        let mask = field_mask(OP, fields)?;
        let (src, dst) = (self.0.id, dst.id());
        self.0.core.call(OP, |s| s.copy_gc(src, dst, mask))
    }
}

impl PartialEq for GraphicsContext {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for GraphicsContext {}

impl fmt::Debug for GraphicsContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphicsContext")
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
    use crate::protocol::ALL_PLANES;
    use crate::resources::{Registry, StateViolation};

    fn open() -> (Connection, Journal) {
        let session = NullSession::new();
        let journal = session.journal();
        (Connection::with_session(&Registry::new(), Box::new(session)), journal)
    }

    #[test]
    fn test_encode_changes() {
        let values = encode_changes(
            "create_gc",
            &[
                (field::FOREGROUND, 0xFF0000u32.into()),
                (field::PLANE_MASK, ALL_PLANES.into()),
                (field::LINE_WIDTH, 3.into()),
                (field::GRAPHICS_EXPOSURES, false.into()),
                (field::ARC_MODE, 1.into()),
            ],
        )
        .unwrap();
        assert_eq!(values.foreground, Some(0xFF0000));
        assert_eq!(values.plane_mask, Some(u32::MAX));
        assert_eq!(values.graphics_exposures, Some(false));
        assert_eq!(
            values.mask(),
            (1 << 1) | (1 << 2) | (1 << 4) | (1 << 16) | (1 << 22)
        );
    }

    #[test]
    fn test_encode_rejects() {
        let err = encode_changes("change_gc", &[(23, 0.into())]).unwrap_err();
        assert!(err.is_range_error());
        let err = encode_changes("change_gc", &[(-1, 0.into())]).unwrap_err();
        assert!(err.is_range_error());

        let err = encode_changes("change_gc", &[(field::FONT, 4.into())]).unwrap_err();
        assert!(err.is_type_error());
        let err = encode_changes("change_gc", &[(field::GRAPHICS_EXPOSURES, 1.into())]).unwrap_err();
        assert!(err.is_type_error());
        let err = encode_changes("change_gc", &[(field::FOREGROUND, true.into())]).unwrap_err();
        assert!(err.is_type_error());

        // line width is 16 bits
        let err = encode_changes("change_gc", &[(field::LINE_WIDTH, 70000.into())]).unwrap_err();
        assert!(err.is_range_error());
    }

    #[test]
    fn test_default_gc_cannot_be_freed() {
        let (conn, journal) = open();
        let gc = conn.default_gc(None).unwrap();
        let err = gc.free().unwrap_err();
        assert_eq!(
            err.violation(),
            Some(&StateViolation::Gc {
                id: gc.id(),
                state: GcState::DEFAULT
            })
        );
        assert_eq!(journal.count(|c| matches!(c, NativeCall::FreeGc(_))), 0);

        gc.change(&[(field::FOREGROUND, 1.into())]).unwrap();
        assert_eq!(journal.count(|c| *c == NativeCall::ChangeGc(gc.id(), 1 << 2)), 1);
    }

    #[test]
    fn test_free_then_use() {
        let (conn, journal) = open();
        let win = conn.create_window().unwrap();
        let gc = win.create_gc(&[(field::FOREGROUND, 0.into())]).unwrap();
        assert_eq!(gc.state(), GcState::CREATED);
        gc.free().unwrap();
        assert!(gc.free().unwrap_err().to_string().contains("has been freed"));
        assert!(gc.set_dashes(0, &[4, 4]).unwrap_err().is_state_error());
        drop(gc);
        assert_eq!(journal.count(|c| matches!(c, NativeCall::FreeGc(_))), 1);
    }

    #[test]
    fn test_dropped_gc_is_freed() {
        let (conn, journal) = open();
        let win = conn.create_window().unwrap();
        let gc = win.create_gc(&[]).unwrap();
        let id = gc.id();
        drop(gc);
        assert_eq!(journal.count(|c| *c == NativeCall::FreeGc(id)), 1);
    }

    #[test]
    fn test_clip_ordering_range() {
        let (conn, journal) = open();
        let gc = conn.default_gc(None).unwrap();
        let rects = ShortArray::from_rows(&[[0, 0, 10, 10]]);
        let err = gc.set_clip_rectangles(0, 0, &rects, Some(4)).unwrap_err();
        assert!(err.is_range_error());
        gc.set_clip_rectangles(0, 0, &rects, Some(3)).unwrap();
        gc.set_clip_rectangles(0, 0, &rects, None).unwrap();
        assert_eq!(journal.count(|c| *c == NativeCall::SetClipRectangles(gc.id(), 1)), 2);
    }

    #[test]
    fn test_copy_gc() {
        let (conn, journal) = open();
        let win = conn.create_window().unwrap();
        let src = conn.default_gc(None).unwrap();
        let dst = win.create_gc(&[]).unwrap();
        src.copy_to(&dst, &[field::FOREGROUND, field::ARC_MODE]).unwrap();
        assert_eq!(
            journal.count(|c| *c
                == NativeCall::CopyGc {
                    src: src.id(),
                    dst: dst.id(),
                    mask: (1 << 2) | (1 << 22)
                }),
            1
        );
        assert!(src.copy_to(&dst, &[23]).unwrap_err().is_range_error());
    }
}
