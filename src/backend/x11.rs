//! X11 Session - A real connection to an X server
//!
//! Requests are issued through x11rb. Replies are never awaited for void
//! requests; protocol errors therefore come back through the event stream,
//! where they are logged and skipped.

use super::*;
use crate::protocol::*;
use std::collections::HashMap;
use std::os::unix::io::AsRawFd;
use x11rb::connection::Connection as _;
use x11rb::protocol::xproto::{self, ConnectionExt as _};
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;

/// Build a CreateGCAux or ChangeGCAux from a change set
macro_rules! gc_aux {
    ($aux:ty, $values:expr) => {{
        let v: &GcValues = $values;
        <$aux>::new()
            .function(v.function.map(xproto::GX::from))
            .plane_mask(v.plane_mask)
            .foreground(v.foreground)
            .background(v.background)
            .line_width(v.line_width.map(u32::from))
            .line_style(v.line_style.map(xproto::LineStyle::from))
            .cap_style(v.cap_style.map(xproto::CapStyle::from))
            .join_style(v.join_style.map(xproto::JoinStyle::from))
            .fill_style(v.fill_style.map(xproto::FillStyle::from))
            .fill_rule(v.fill_rule.map(xproto::FillRule::from))
            .tile_stipple_x_origin(v.ts_x_origin.map(i32::from))
            .tile_stipple_y_origin(v.ts_y_origin.map(i32::from))
            .subwindow_mode(v.subwindow_mode.map(xproto::SubwindowMode::from))
            .graphics_exposures(v.graphics_exposures.map(u32::from))
            .clip_x_origin(v.clip_x_origin.map(i32::from))
            .clip_y_origin(v.clip_y_origin.map(i32::from))
            .dash_offset(v.dash_offset.map(u32::from))
            .dashes(v.dashes.map(u32::from))
            .arc_mode(v.arc_mode.map(xproto::ArcMode::from))
    }};
}

pub struct X11Session {
    conn: Option<RustConnection>,
    info: SessionInfo,
    fd: i32,
    default_gcs: HashMap<usize, u32>,
    last_request: u64,
    last_processed: u64,
}

impl X11Session {
    /// Connect to `display`, or to `$DISPLAY` when `None`
    pub fn connect(display: Option<&str>) -> NativeResult<Self> {
        let (conn, default_screen) = x11rb::connect(display)?;
        let info = session_info(&conn, display, default_screen);
        let fd = conn.stream().as_raw_fd();

        log::info!(
            "Connected to X server {:?} ({} release {}, {} screen(s))",
            info.display_name,
            info.vendor,
            info.vendor_release,
            info.screens.len()
        );

        Ok(X11Session {
            conn: Some(conn),
            info,
            fd,
            default_gcs: HashMap::new(),
            last_request: 0,
            last_processed: 0,
        })
    }

    fn conn(&self) -> NativeResult<&RustConnection> {
        self.conn
            .as_ref()
            .ok_or_else(|| "X11 session is closed".into())
    }

    fn sent(&mut self, sequence: u64) {
        self.last_request = sequence;
    }

    fn screen(&self, index: usize) -> NativeResult<&xproto::Screen> {
        let conn = self.conn()?;
        conn.setup()
            .roots
            .get(index)
            .ok_or_else(|| format!("no screen {}", index).into())
    }

    /// Wrap an incoming buffer, skipping protocol errors
    fn accept(&mut self, data: Vec<u8>, sequence: u64) -> Option<RawEvent> {
        self.last_processed = self.last_processed.max(sequence);
        if data.first() == Some(&0) {
            log::warn!(
                "X error {} (major {}, minor {}) for request {}",
                data.get(1).copied().unwrap_or(0),
                data.get(10).copied().unwrap_or(0),
                data.get(8).copied().unwrap_or(0),
                sequence
            );
            return None;
        }
        Some(RawEvent::from_slice(sequence, &data))
    }
}

fn session_info(conn: &RustConnection, display: Option<&str>, default_screen: usize) -> SessionInfo {
    let setup = conn.setup();
    let screens = setup
        .roots
        .iter()
        .map(|s| {
            let cells = s
                .allowed_depths
                .iter()
                .flat_map(|d| d.visuals.iter())
                .find(|v| v.visual_id == s.root_visual)
                .map(|v| u32::from(v.colormap_entries))
                .unwrap_or(0);
            ScreenInfo {
                root: XID(s.root),
                width: s.width_in_pixels,
                height: s.height_in_pixels,
                width_mm: s.width_in_millimeters,
                height_mm: s.height_in_millimeters,
                root_depth: s.root_depth,
                white_pixel: s.white_pixel,
                black_pixel: s.black_pixel,
                cells,
                min_colormaps: s.min_installed_maps,
                max_colormaps: s.max_installed_maps,
            }
        })
        .collect();

    SessionInfo {
        display_name: display
            .map(str::to_owned)
            .or_else(|| std::env::var("DISPLAY").ok())
            .unwrap_or_default(),
        vendor: String::from_utf8_lossy(&setup.vendor).into_owned(),
        protocol_version: setup.protocol_major_version,
        protocol_revision: setup.protocol_minor_version,
        vendor_release: setup.release_number,
        bitmap_unit: setup.bitmap_format_scanline_unit,
        bitmap_bit_order: u8::from(setup.bitmap_format_bit_order),
        bitmap_pad: setup.bitmap_format_scanline_pad,
        image_byte_order: u8::from(setup.image_byte_order),
        default_screen,
        screens,
    }
}

fn to_rectangles(rects: &[Rectangle]) -> Vec<xproto::Rectangle> {
    rects
        .iter()
        .map(|r| xproto::Rectangle {
            x: r.x,
            y: r.y,
            width: r.width,
            height: r.height,
        })
        .collect()
}

fn to_points(points: &[Point]) -> Vec<xproto::Point> {
    points
        .iter()
        .map(|p| xproto::Point { x: p.x, y: p.y })
        .collect()
}

impl NativeSession for X11Session {
    fn info(&self) -> &SessionInfo {
        &self.info
    }

    fn connection_number(&self) -> i32 {
        if self.conn.is_some() {
            self.fd
        } else {
            -1
        }
    }

    fn next_request(&self) -> u64 {
        self.last_request + 1
    }

    fn last_known_request_processed(&self) -> u64 {
        self.last_processed
    }

    fn close(&mut self) -> NativeResult<()> {
        if let Some(conn) = self.conn.take() {
            conn.flush()?;
            log::info!("Closed X server connection {:?}", self.info.display_name);
        }
        Ok(())
    }

    fn no_op(&mut self) -> NativeResult<()> {
        let seq = self.conn()?.no_operation()?.sequence_number();
        self.sent(seq);
        Ok(())
    }

    fn flush(&mut self) -> NativeResult<()> {
        self.conn()?.flush()?;
        Ok(())
    }

    fn create_window(&mut self, params: &WindowParams) -> NativeResult<XID> {
        let screen = self.screen(params.screen)?;
        let (root, white) = (screen.root, screen.white_pixel);
        let conn = self.conn()?;
        let wid = conn.generate_id()?;

        conn.create_window(
            x11rb::COPY_DEPTH_FROM_PARENT,
            wid,
            root,
            params.x,
            params.y,
            params.width,
            params.height,
            params.border_width,
            xproto::WindowClass::INPUT_OUTPUT,
            x11rb::COPY_FROM_PARENT,
            &xproto::CreateWindowAux::new().background_pixel(white),
        )?;
        let seq = conn
            .change_property8(
                xproto::PropMode::REPLACE,
                wid,
                xproto::AtomEnum::WM_NAME,
                xproto::AtomEnum::STRING,
                params.title.as_bytes(),
            )?
            .sequence_number();
        self.sent(seq);

        log::debug!("CreateWindow: window=0x{:x} parent=0x{:x}", wid, root);
        Ok(XID(wid))
    }

    fn map_window(&mut self, window: XID) -> NativeResult<()> {
        let seq = self.conn()?.map_window(window.get())?.sequence_number();
        self.sent(seq);
        Ok(())
    }

    fn unmap_window(&mut self, window: XID) -> NativeResult<()> {
        let seq = self.conn()?.unmap_window(window.get())?.sequence_number();
        self.sent(seq);
        Ok(())
    }

    fn destroy_window(&mut self, window: XID) -> NativeResult<()> {
        let seq = self.conn()?.destroy_window(window.get())?.sequence_number();
        self.sent(seq);
        Ok(())
    }

    fn clear_area(&mut self, window: XID, area: Rectangle, exposures: bool) -> NativeResult<()> {
        let seq = self
            .conn()?
            .clear_area(exposures, window.get(), area.x, area.y, area.width, area.height)?
            .sequence_number();
        self.sent(seq);
        Ok(())
    }

    fn select_input(&mut self, window: XID, mask: u32) -> NativeResult<()> {
        let aux =
            xproto::ChangeWindowAttributesAux::new().event_mask(xproto::EventMask::from(mask));
        let seq = self
            .conn()?
            .change_window_attributes(window.get(), &aux)?
            .sequence_number();
        self.sent(seq);
        Ok(())
    }

    fn create_pixmap(
        &mut self,
        screen: usize,
        width: u16,
        height: u16,
        depth: u8,
    ) -> NativeResult<XID> {
        let root = self.screen(screen)?.root;
        let conn = self.conn()?;
        let pid = conn.generate_id()?;
        let seq = conn
            .create_pixmap(depth, pid, root, width, height)?
            .sequence_number();
        self.sent(seq);

        log::debug!("CreatePixmap: pixmap=0x{:x} {}x{}x{}", pid, width, height, depth);
        Ok(XID(pid))
    }

    fn free_pixmap(&mut self, pixmap: XID) -> NativeResult<()> {
        let seq = self.conn()?.free_pixmap(pixmap.get())?.sequence_number();
        self.sent(seq);
        Ok(())
    }

    fn copy_area(&mut self, src: XID, dst: XID, gc: XID, region: CopyRegion) -> NativeResult<()> {
        let seq = self
            .conn()?
            .copy_area(
                src.get(),
                dst.get(),
                gc.get(),
                region.src_x,
                region.src_y,
                region.dst_x,
                region.dst_y,
                region.width,
                region.height,
            )?
            .sequence_number();
        self.sent(seq);
        Ok(())
    }

    fn default_gc(&mut self, screen: usize) -> NativeResult<XID> {
        if let Some(&gc) = self.default_gcs.get(&screen) {
            return Ok(XID(gc));
        }

        let s = self.screen(screen)?;
        let (root, black, white) = (s.root, s.black_pixel, s.white_pixel);
        let conn = self.conn()?;
        let gc = conn.generate_id()?;
        let aux = xproto::CreateGCAux::new().foreground(black).background(white);
        let seq = conn.create_gc(gc, root, &aux)?.sequence_number();
        self.sent(seq);
        self.default_gcs.insert(screen, gc);

        log::debug!("Default GC for screen {}: 0x{:x}", screen, gc);
        Ok(XID(gc))
    }

    fn create_gc(&mut self, drawable: XID, values: &GcValues) -> NativeResult<XID> {
        let conn = self.conn()?;
        let gc = conn.generate_id()?;
        let aux = gc_aux!(xproto::CreateGCAux, values);
        let seq = conn.create_gc(gc, drawable.get(), &aux)?.sequence_number();
        self.sent(seq);
        Ok(XID(gc))
    }

    fn change_gc(&mut self, gc: XID, values: &GcValues) -> NativeResult<()> {
        let aux = gc_aux!(xproto::ChangeGCAux, values);
        let seq = self.conn()?.change_gc(gc.get(), &aux)?.sequence_number();
        self.sent(seq);
        Ok(())
    }

    fn copy_gc(&mut self, src: XID, dst: XID, mask: u32) -> NativeResult<()> {
        let seq = self
            .conn()?
            .copy_gc(src.get(), dst.get(), xproto::GC::from(mask))?
            .sequence_number();
        self.sent(seq);
        Ok(())
    }

    fn free_gc(&mut self, gc: XID) -> NativeResult<()> {
        let seq = self.conn()?.free_gc(gc.get())?.sequence_number();
        self.sent(seq);
        Ok(())
    }

    fn set_dashes(&mut self, gc: XID, offset: u16, dashes: &[u8]) -> NativeResult<()> {
        let seq = self
            .conn()?
            .set_dashes(gc.get(), offset, dashes)?
            .sequence_number();
        self.sent(seq);
        Ok(())
    }

    fn set_clip_rectangles(
        &mut self,
        gc: XID,
        x: i16,
        y: i16,
        rectangles: &[Rectangle],
        ordering: ClipOrdering,
    ) -> NativeResult<()> {
        let rects = to_rectangles(rectangles);
        let seq = self
            .conn()?
            .set_clip_rectangles(
                xproto::ClipOrdering::from(ordering as u8),
                gc.get(),
                x,
                y,
                &rects,
            )?
            .sequence_number();
        self.sent(seq);
        Ok(())
    }

    fn draw_arcs(&mut self, drawable: XID, gc: XID, arcs: &[Arc]) -> NativeResult<()> {
        let arcs: Vec<xproto::Arc> = arcs
            .iter()
            .map(|a| xproto::Arc {
                x: a.x,
                y: a.y,
                width: a.width,
                height: a.height,
                angle1: a.angle1,
                angle2: a.angle2,
            })
            .collect();
        let seq = self
            .conn()?
            .poly_arc(drawable.get(), gc.get(), &arcs)?
            .sequence_number();
        self.sent(seq);
        Ok(())
    }

    fn draw_lines(&mut self, drawable: XID, gc: XID, points: &[Point]) -> NativeResult<()> {
        let points = to_points(points);
        let seq = self
            .conn()?
            .poly_line(xproto::CoordMode::ORIGIN, drawable.get(), gc.get(), &points)?
            .sequence_number();
        self.sent(seq);
        Ok(())
    }

    fn draw_points(&mut self, drawable: XID, gc: XID, points: &[Point]) -> NativeResult<()> {
        let points = to_points(points);
        let seq = self
            .conn()?
            .poly_point(xproto::CoordMode::ORIGIN, drawable.get(), gc.get(), &points)?
            .sequence_number();
        self.sent(seq);
        Ok(())
    }

    fn draw_segments(&mut self, drawable: XID, gc: XID, segments: &[Segment]) -> NativeResult<()> {
        let segments: Vec<xproto::Segment> = segments
            .iter()
            .map(|s| xproto::Segment {
                x1: s.x1,
                y1: s.y1,
                x2: s.x2,
                y2: s.y2,
            })
            .collect();
        let seq = self
            .conn()?
            .poly_segment(drawable.get(), gc.get(), &segments)?
            .sequence_number();
        self.sent(seq);
        Ok(())
    }

    fn draw_rectangles(
        &mut self,
        drawable: XID,
        gc: XID,
        rectangles: &[Rectangle],
    ) -> NativeResult<()> {
        let rects = to_rectangles(rectangles);
        let seq = self
            .conn()?
            .poly_rectangle(drawable.get(), gc.get(), &rects)?
            .sequence_number();
        self.sent(seq);
        Ok(())
    }

    fn poll_event(&mut self) -> NativeResult<Option<RawEvent>> {
        loop {
            let next = self.conn()?.poll_for_raw_event_with_sequence()?;
            match next {
                None => return Ok(None),
                Some((data, seq)) => {
                    if let Some(raw) = self.accept(data, seq) {
                        return Ok(Some(raw));
                    }
                }
            }
        }
    }

    fn wait_event(&mut self) -> NativeResult<RawEvent> {
        loop {
            let (data, seq) = self.conn()?.wait_for_raw_event_with_sequence()?;
            if let Some(raw) = self.accept(data, seq) {
                return Ok(raw);
            }
        }
    }
}

impl Drop for X11Session {
    fn drop(&mut self) {
        if self.conn.is_some() {
            log::debug!("X11 session dropped while open; closing");
            let _ = self.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::NativeSession;
    use x11rb::connection::Connection as _;
    use x11rb::protocol::xproto::ConnectionExt as _;

    /// Needs a reachable X server; returns early without one
    #[test]
    fn test_window_visual_copied_from_parent() {
        let mut session = match X11Session::connect(None) {
            Ok(session) => session,
            Err(e) => {
                eprintln!("skipping, no X server: {}", e);
                return;
            }
        };
        let params = WindowParams {
            screen: session.info().default_screen,
            x: 0,
            y: 0,
            width: 16,
            height: 16,
            border_width: 0,
            title: "visual".to_string(),
        };
        let window = session.create_window(&params).unwrap();

        let conn = session.conn().unwrap();
        let attrs = conn.get_window_attributes(window.0).unwrap().reply().unwrap();
        assert_eq!(attrs.visual, conn.setup().roots[params.screen].root_visual);

        session.destroy_window(window).unwrap();
        session.close().unwrap();
    }
}
