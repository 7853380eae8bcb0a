//! Drawing data
//!
//! Drawing requests take their geometry as a two-dimensional array of 16-bit
//! values, one row per datum. The column count is fixed by the request kind
//! and is checked before anything is sent.

use crate::error::{Error, Result};
use crate::protocol::{Arc, Point, Rectangle, Segment};

/// The geometry a drawing request expects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    /// x, y, width, height, angle1, angle2
    Arcs,
    /// x, y
    Lines,
    /// x, y
    Points,
    /// x1, y1, x2, y2
    Segments,
    /// x, y, width, height
    Rectangles,
}

impl DataKind {
    pub fn columns(&self) -> usize {
        match self {
            DataKind::Arcs => 6,
            DataKind::Lines | DataKind::Points => 2,
            DataKind::Segments | DataKind::Rectangles => 4,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DataKind::Arcs => "arcs",
            DataKind::Lines => "lines",
            DataKind::Points => "points",
            DataKind::Segments => "segments",
            DataKind::Rectangles => "rectangles",
        }
    }
}

/// Row-major array of shorts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShortArray {
    rows: usize,
    columns: usize,
    data: Vec<i16>,
}

impl ShortArray {
    /// Wrap a flat buffer. The shape is only checked when the array is used.
    pub fn new(rows: usize, columns: usize, data: Vec<i16>) -> Self {
        ShortArray {
            rows,
            columns,
            data,
        }
    }

    pub fn from_rows<const N: usize>(rows: &[[i16; N]]) -> Self {
        ShortArray {
            rows: rows.len(),
            columns: N,
            data: rows.iter().flatten().copied().collect(),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn data(&self) -> &[i16] {
        &self.data
    }

    /// Check the array has the shape `kind` needs
    pub fn check(&self, op: &'static str, kind: DataKind) -> Result<()> {
        let shape_error = |detail: String| Error::DataShape {
            op,
            kind: kind.name(),
            detail,
        };
        if self.columns != kind.columns() {
            return Err(shape_error(format!(
                "{} columns, expected {}",
                self.columns,
                kind.columns()
            )));
        }
        if self.rows.checked_mul(self.columns) != Some(self.data.len()) {
            return Err(shape_error(format!(
                "{} values for {} rows of {}",
                self.data.len(),
                self.rows,
                self.columns
            )));
        }
        Ok(())
    }

    fn records<T>(
        &self,
        op: &'static str,
        kind: DataKind,
        build: impl Fn(&[i16]) -> T,
    ) -> Result<Vec<T>> {
        self.check(op, kind)?;
        Ok(self.data.chunks_exact(self.columns).map(build).collect())
    }

    // Widths, heights and angles are reinterpreted bit for bit, as the
    // request records carry them unsigned.

    pub fn to_arcs(&self, op: &'static str) -> Result<Vec<Arc>> {
        self.records(op, DataKind::Arcs, |r| Arc {
            x: r[0],
            y: r[1],
            width: r[2] as u16,
            height: r[3] as u16,
            angle1: r[4],
            angle2: r[5],
        })
    }

    pub fn to_points(&self, op: &'static str, kind: DataKind) -> Result<Vec<Point>> {
        self.records(op, kind, |r| Point::new(r[0], r[1]))
    }

    pub fn to_segments(&self, op: &'static str) -> Result<Vec<Segment>> {
        self.records(op, DataKind::Segments, |r| Segment {
            x1: r[0],
            y1: r[1],
            x2: r[2],
            y2: r[3],
        })
    }

    pub fn to_rectangles(&self, op: &'static str) -> Result<Vec<Rectangle>> {
        self.records(op, DataKind::Rectangles, |r| {
            Rectangle::new(r[0], r[1], r[2] as u16, r[3] as u16)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrong_columns() {
        let data = ShortArray::from_rows(&[[0, 0, 10], [5, 5, 10]]);
        let err = data.to_rectangles("draw_rectangles").unwrap_err();
        assert!(matches!(err, Error::DataShape { kind: "rectangles", .. }));
        assert_eq!(
            err.to_string(),
            "draw_rectangles: data has incorrect dimensions for rectangles (3 columns, expected 4)"
        );
        assert!(data.to_points("draw_points", DataKind::Points).is_err());
    }

    #[test]
    fn test_ragged_buffer() {
        let data = ShortArray::new(2, 2, vec![1, 2, 3]);
        assert!(data.to_points("draw_lines", DataKind::Lines).is_err());
    }

    #[test]
    fn test_records() {
        let arcs = ShortArray::from_rows(&[[10, 20, 30, 40, 0, 23040]])
            .to_arcs("draw_arcs")
            .unwrap();
        assert_eq!(arcs[0].width, 30);
        assert_eq!(arcs[0].angle2, 23040);

        let segs = ShortArray::from_rows(&[[0, 0, 5, 5], [1, 1, -3, -3]])
            .to_segments("draw_segments")
            .unwrap();
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[1].x2, -3);

        let empty = ShortArray::new(0, 2, Vec::new());
        assert!(empty.to_points("draw_points", DataKind::Points).unwrap().is_empty());
    }
}
