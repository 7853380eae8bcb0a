//! Screen wrapper
//!
//! A screen is a view onto one entry of the session's setup information. It
//! owns nothing on the server and has no finalizer.

use super::connection::{Connection, ConnectionCore};
use super::drawable::Drawable;
use crate::backend::ScreenInfo;
use crate::error::{Error, Result};
use std::fmt;
use std::rc::Rc;

#[derive(Clone)]
pub struct Screen {
    core: Rc<ConnectionCore>,
    number: usize,
}

impl Screen {
    pub(crate) fn new(core: Rc<ConnectionCore>, number: usize) -> Self {
        Screen { core, number }
    }

    pub(crate) fn core(&self) -> &Rc<ConnectionCore> {
        &self.core
    }

    /// Index of this screen on its display
    pub fn number(&self) -> usize {
        self.number
    }

    /// Owning connection, if a handle to it still exists
    pub fn connection(&self) -> Option<Connection> {
        self.core.handle()
    }

    fn info(&self, op: &'static str) -> Result<&ScreenInfo> {
        self.core.require_open(op)?;
        self.core
            .info()
            .screens
            .get(self.number)
            .ok_or(Error::OutOfRange {
                op,
                what: "screen",
                value: self.number as i64,
            })
    }

    /// The root window, which belongs to the server
    pub fn root_window(&self) -> Result<Drawable> {
        const OP: &str = "root_window";
        let root = self.info(OP)?.root;
        self.core
            .registry
            .resolve(&self.core, root)
            .ok_or_else(|| Error::Native {
                op: OP,
                source: format!("screen {} reports no root window", self.number).into(),
            })
    }

    pub fn black_pixel(&self) -> Result<u32> {
        Ok(self.info("black_pixel")?.black_pixel)
    }

    pub fn white_pixel(&self) -> Result<u32> {
        Ok(self.info("white_pixel")?.white_pixel)
    }

    pub fn width(&self) -> Result<u16> {
        Ok(self.info("width")?.width)
    }

    pub fn height(&self) -> Result<u16> {
        Ok(self.info("height")?.height)
    }

    pub fn width_mm(&self) -> Result<u16> {
        Ok(self.info("width_mm")?.width_mm)
    }

    pub fn height_mm(&self) -> Result<u16> {
        Ok(self.info("height_mm")?.height_mm)
    }

    /// Depth of the root window
    pub fn planes(&self) -> Result<u8> {
        Ok(self.info("planes")?.root_depth)
    }

    pub fn cells(&self) -> Result<u32> {
        Ok(self.info("cells")?.cells)
    }

    pub fn min_colormaps(&self) -> Result<u16> {
        Ok(self.info("min_colormaps")?.min_colormaps)
    }

    pub fn max_colormaps(&self) -> Result<u16> {
        Ok(self.info("max_colormaps")?.max_colormaps)
    }
}

impl PartialEq for Screen {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.core, &other.core) && self.number == other.number
    }
}

impl Eq for Screen {}

impl fmt::Debug for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Screen")
            .field("connection", &self.core.serial)
            .field("number", &self.number)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::NullSession;
    use crate::resources::{DrawableState, Registry};

    #[test]
    fn test_screen_queries() {
        let conn = Connection::with_session(&Registry::new(), Box::new(NullSession::new()));
        let screen = conn.screen(None).unwrap();
        assert_eq!(screen.width().unwrap(), 1920);
        assert_eq!(screen.height_mm().unwrap(), 285);
        assert_eq!(screen.planes().unwrap(), 24);
        assert_eq!(screen.white_pixel().unwrap(), 0xFFFFFF);
        assert_eq!(screen.connection().as_ref(), Some(&conn));
    }

    #[test]
    fn test_root_is_third_party_and_stable() {
        let conn = Connection::with_session(&Registry::new(), Box::new(NullSession::new()));
        let screen = conn.screen(None).unwrap();
        let root = screen.root_window().unwrap();
        assert_eq!(root.state(), DrawableState::THIRD_PARTY);
        assert_eq!(root, conn.root_window(None).unwrap());
    }

    #[test]
    fn test_closed_connection() {
        let conn = Connection::with_session(&Registry::new(), Box::new(NullSession::new()));
        let screen = conn.screen(None).unwrap();
        conn.close().unwrap();
        assert!(screen.width().unwrap_err().is_state_error());
        assert!(screen.root_window().unwrap_err().is_state_error());
    }
}
