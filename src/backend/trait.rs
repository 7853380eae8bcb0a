//! Native session trait definition
//!
//! This module defines the trait every native client session must implement.
//! The resource layer validates all arguments and wrapper states before it
//! calls into a session, so implementations may assume their ids are live.

use crate::protocol::*;
use std::error::Error;

/// Result type for native session calls
pub type NativeResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

/// Read-only description of one screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenInfo {
    pub root: XID,
    pub width: u16,
    pub height: u16,
    pub width_mm: u16,
    pub height_mm: u16,
    pub root_depth: u8,
    pub white_pixel: u32,
    pub black_pixel: u32,
    /// Colormap entries of the root visual
    pub cells: u32,
    pub min_colormaps: u16,
    pub max_colormaps: u16,
}

/// Connection-wide properties fixed at setup time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    /// Name the session was opened on, as DisplayString reports it
    pub display_name: String,
    pub vendor: String,
    pub protocol_version: u16,
    pub protocol_revision: u16,
    pub vendor_release: u32,
    pub bitmap_unit: u8,
    /// 0 = LSBFirst, 1 = MSBFirst
    pub bitmap_bit_order: u8,
    pub bitmap_pad: u8,
    /// 0 = LSBFirst, 1 = MSBFirst
    pub image_byte_order: u8,
    pub default_screen: usize,
    pub screens: Vec<ScreenInfo>,
}

/// Window creation parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowParams {
    pub screen: usize,
    pub x: i16,
    pub y: i16,
    pub width: u16,
    pub height: u16,
    pub border_width: u16,
    pub title: String,
}

/// Source rectangle and destination origin of a CopyArea
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CopyRegion {
    pub src_x: i16,
    pub src_y: i16,
    pub width: u16,
    pub height: u16,
    pub dst_x: i16,
    pub dst_y: i16,
}

/// A graphics-context change set. Only fields that are `Some` are sent.
///
/// Bit `n` of [`GcValues::mask`] corresponds to field index `n` in protocol
/// order. The pixmap and font fields (tile, stipple, font, clip-mask) are
/// not representable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GcValues {
    pub function: Option<u8>,
    pub plane_mask: Option<u32>,
    pub foreground: Option<u32>,
    pub background: Option<u32>,
    pub line_width: Option<u16>,
    pub line_style: Option<u8>,
    pub cap_style: Option<u8>,
    pub join_style: Option<u8>,
    pub fill_style: Option<u8>,
    pub fill_rule: Option<u8>,
    pub arc_mode: Option<u8>,
    pub ts_x_origin: Option<i16>,
    pub ts_y_origin: Option<i16>,
    pub subwindow_mode: Option<u8>,
    pub graphics_exposures: Option<bool>,
    pub clip_x_origin: Option<i16>,
    pub clip_y_origin: Option<i16>,
    pub dash_offset: Option<u16>,
    pub dashes: Option<u8>,
}

impl GcValues {
    pub fn mask(&self) -> u32 {
        let bits = [
            (0, self.function.is_some()),
            (1, self.plane_mask.is_some()),
            (2, self.foreground.is_some()),
            (3, self.background.is_some()),
            (4, self.line_width.is_some()),
            (5, self.line_style.is_some()),
            (6, self.cap_style.is_some()),
            (7, self.join_style.is_some()),
            (8, self.fill_style.is_some()),
            (9, self.fill_rule.is_some()),
            (22, self.arc_mode.is_some()),
            (12, self.ts_x_origin.is_some()),
            (13, self.ts_y_origin.is_some()),
            (15, self.subwindow_mode.is_some()),
            (16, self.graphics_exposures.is_some()),
            (17, self.clip_x_origin.is_some()),
            (18, self.clip_y_origin.is_some()),
            (20, self.dash_offset.is_some()),
            (21, self.dashes.is_some()),
        ];
        bits.iter()
            .filter(|(_, set)| *set)
            .fold(0, |mask, (bit, _)| mask | (1u32 << bit))
    }

    pub fn is_empty(&self) -> bool {
        self.mask() == 0
    }
}

/// A client session with an X server.
///
/// Ids handed in are always ones this session created or reported. A session
/// that has been closed must not be called again; the resource layer
/// guarantees this.
pub trait NativeSession {
    /// Setup information
    fn info(&self) -> &SessionInfo;

    /// File descriptor of the connection, or -1 when there is none
    fn connection_number(&self) -> i32;

    /// Serial the next request will carry
    fn next_request(&self) -> u64;

    /// Highest serial known to have been processed by the server
    fn last_known_request_processed(&self) -> u64;

    /// Close the session. All server resources it owns go away with it.
    fn close(&mut self) -> NativeResult<()>;

    fn no_op(&mut self) -> NativeResult<()>;

    fn flush(&mut self) -> NativeResult<()>;

    // Windows

    /// Create an InputOutput window on the root of `params.screen`.
    /// Returns [`XID::NONE`] if the server could not allocate one.
    fn create_window(&mut self, params: &WindowParams) -> NativeResult<XID>;

    fn map_window(&mut self, window: XID) -> NativeResult<()>;

    fn unmap_window(&mut self, window: XID) -> NativeResult<()>;

    fn destroy_window(&mut self, window: XID) -> NativeResult<()>;

    /// Clear an area to the background. A zero width or height extends to
    /// the window edge.
    fn clear_area(&mut self, window: XID, area: Rectangle, exposures: bool) -> NativeResult<()>;

    fn select_input(&mut self, window: XID, mask: u32) -> NativeResult<()>;

    // Pixmaps

    /// Returns [`XID::NONE`] if the server could not allocate one.
    fn create_pixmap(&mut self, screen: usize, width: u16, height: u16, depth: u8)
        -> NativeResult<XID>;

    fn free_pixmap(&mut self, pixmap: XID) -> NativeResult<()>;

    fn copy_area(&mut self, src: XID, dst: XID, gc: XID, region: CopyRegion) -> NativeResult<()>;

    // Graphics contexts

    /// The server-provided GC of a screen, created on first request
    fn default_gc(&mut self, screen: usize) -> NativeResult<XID>;

    /// Returns [`XID::NONE`] if the server could not allocate one.
    fn create_gc(&mut self, drawable: XID, values: &GcValues) -> NativeResult<XID>;

    fn change_gc(&mut self, gc: XID, values: &GcValues) -> NativeResult<()>;

    fn copy_gc(&mut self, src: XID, dst: XID, mask: u32) -> NativeResult<()>;

    fn free_gc(&mut self, gc: XID) -> NativeResult<()>;

    fn set_dashes(&mut self, gc: XID, offset: u16, dashes: &[u8]) -> NativeResult<()>;

    fn set_clip_rectangles(
        &mut self,
        gc: XID,
        x: i16,
        y: i16,
        rectangles: &[Rectangle],
        ordering: ClipOrdering,
    ) -> NativeResult<()>;

    // Drawing

    fn draw_arcs(&mut self, drawable: XID, gc: XID, arcs: &[Arc]) -> NativeResult<()>;

    /// Connected lines, coordinates relative to the origin
    fn draw_lines(&mut self, drawable: XID, gc: XID, points: &[Point]) -> NativeResult<()>;

    fn draw_points(&mut self, drawable: XID, gc: XID, points: &[Point]) -> NativeResult<()>;

    fn draw_segments(&mut self, drawable: XID, gc: XID, segments: &[Segment]) -> NativeResult<()>;

    fn draw_rectangles(&mut self, drawable: XID, gc: XID, rectangles: &[Rectangle])
        -> NativeResult<()>;

    // Events

    /// Return the next event if one is available without blocking
    fn poll_event(&mut self) -> NativeResult<Option<RawEvent>>;

    /// Block until the next event arrives
    fn wait_event(&mut self) -> NativeResult<RawEvent>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gc_values_mask() {
        let values = GcValues {
            foreground: Some(1),
            arc_mode: Some(0),
            dashes: Some(4),
            ..Default::default()
        };
        assert_eq!(values.mask(), (1 << 2) | (1 << 21) | (1 << 22));
        assert!(GcValues::default().is_empty());
    }
}
