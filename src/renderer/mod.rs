//! Renderer — the character-grid rasterizer.
//!
//! Owns the glyph grid and the parallel depth grid for one frame, and draws
//! projected points into them: Bresenham lines with per-pixel depth, and a
//! scanline triangle filler that quads decompose into.
//!
//! Pixels outside the grid are skipped one by one; nothing here fails.

use crate::math::{round_half_up, Point2D};
use crate::types::{Brush, Cell, CellChange, GridSize};

/// Slack allowed when a write is depth tested, so a face's outline still
/// lands on top of its own fill.
pub const DEPTH_BIAS: f64 = 0.05;

pub struct FrameBuffer {
    size: GridSize,
    cells: Vec<Cell>,
    depth: Vec<f64>,
    /// When set, a write only lands if it is no farther than what is there.
    pub depth_test: bool,
}

impl FrameBuffer {
    pub fn new(size: GridSize) -> Self {
        FrameBuffer {
            size,
            cells: vec![Cell::default(); size.cells()],
            depth: vec![f64::INFINITY; size.cells()],
            depth_test: false,
        }
    }

    pub fn size(&self) -> GridSize {
        self.size
    }

    /// Blank every cell and push every depth back to infinity.
    pub fn clear(&mut self) {
        self.cells.fill(Cell::default());
        self.depth.fill(f64::INFINITY);
    }

    /// Reallocate for a new grid size. Contents are cleared.
    pub fn resize(&mut self, size: GridSize) {
        self.size = size;
        self.cells = vec![Cell::default(); size.cells()];
        self.depth = vec![f64::INFINITY; size.cells()];
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let (w, h) = (i32::from(self.size.width), i32::from(self.size.height));
        if x >= 0 && x < w && y >= 0 && y < h {
            Some(y as usize * w as usize + x as usize)
        } else {
            None
        }
    }

    pub fn cell(&self, x: i32, y: i32) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    pub fn depth_at(&self, x: i32, y: i32) -> Option<f64> {
        self.index(x, y).map(|i| self.depth[i])
    }

    pub fn row(&self, y: usize) -> Option<&[Cell]> {
        if y >= self.size.height as usize {
            return None;
        }
        let w = self.size.width as usize;
        self.cells.get(y * w..(y + 1) * w)
    }

    /// The grid as one string per row.
    pub fn lines(&self) -> Vec<String> {
        (0..self.size.height as usize)
            .filter_map(|y| self.row(y))
            .map(|row| row.iter().map(|c| c.ch).collect())
            .collect()
    }

    /// Write one cell. `depth` is what gets stored; `test` is what the depth
    /// test compares against the stored value.
    fn plot(&mut self, x: i32, y: i32, depth: f64, test: f64, brush: Brush) {
        let Some(i) = self.index(x, y) else {
            return;
        };
        if self.depth_test && !(test <= self.depth[i] + DEPTH_BIAS) {
            return;
        }
        self.cells[i] = brush.into();
        self.depth[i] = depth;
    }

    /// Bresenham line from `p0` to `p1`, inclusive of both ends.
    ///
    /// Depth is interpolated by horizontal progress from `p0`; vertical
    /// lines keep `p0`'s depth throughout.
    pub fn draw_line(&mut self, p0: Point2D, p1: Point2D, brush: Brush) {
        self.line(p0, p1, None, brush);
    }

    /// Outline a closed polygon, corner to corner and back to the first.
    ///
    /// Stored depth follows `draw_line`, but the depth test is made with the
    /// polygon's nearest corner, so the outline is never hidden by the
    /// polygon's own fill.
    pub fn draw_outline(&mut self, corners: &[Point2D], brush: Brush) {
        let nearest = corners
            .iter()
            .map(|p| p.depth)
            .fold(f64::INFINITY, f64::min);
        for (i, &p) in corners.iter().enumerate() {
            let next = corners[(i + 1) % corners.len()];
            self.line(p, next, Some(nearest), brush);
        }
    }

    fn line(&mut self, p0: Point2D, p1: Point2D, test: Option<f64>, brush: Brush) {
        let (mut x, mut y) = (p0.x, p0.y);
        let dx = (p1.x - p0.x).abs();
        let dy = (p1.y - p0.y).abs();
        let sx = if p0.x < p1.x { 1 } else { -1 };
        let sy = if p0.y < p1.y { 1 } else { -1 };
        let dz = p1.depth - p0.depth;
        let mut err = dx - dy;

        loop {
            let t = if dx == 0 {
                0.0
            } else {
                f64::from((x - p0.x).abs()) / f64::from(dx)
            };
            let depth = p0.depth + dz * t;
            self.plot(x, y, depth, test.unwrap_or(depth), brush);

            if x == p1.x && y == p1.y {
                break;
            }
            let e2 = 2 * err;
            if e2 > -dy {
                err -= dy;
                x += sx;
            }
            if e2 < dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Scanline fill of a triangle, drawn as one horizontal line per row.
    pub fn fill_triangle(&mut self, a: Point2D, b: Point2D, c: Point2D, brush: Brush) {
        let mut p = [a, b, c];
        // Stable: equal rows keep their argument order.
        p.sort_by_key(|q| q.y);
        let [p1, p2, p3] = p;

        let rows = 0..i32::from(self.size.height);
        let long = Edge::new(p1, p3);

        let upper = Edge::new(p1, p2);
        if upper.dy != 0 {
            for i in p1.y.max(rows.start)..=p2.y.min(rows.end - 1) {
                self.span(i, upper.at(i), long.at(i), brush);
            }
        }

        let lower = Edge::new(p2, p3);
        if lower.dy != 0 {
            for i in p2.y.max(rows.start)..=p3.y.min(rows.end - 1) {
                self.span(i, lower.at(i), long.at(i), brush);
            }
        }
    }

    /// Fill a quad as triangles (0, 1, 3) and (1, 2, 3). Only convex quads
    /// with consistent winding come out clean.
    pub fn fill_quad(&mut self, corners: [Point2D; 4], brush: Brush) {
        let [p0, p1, p2, p3] = corners;
        self.fill_triangle(p0, p1, p3, brush);
        self.fill_triangle(p1, p2, p3, brush);
    }

    fn span(&mut self, y: i32, (ax, az): (i32, f64), (bx, bz): (i32, f64), brush: Brush) {
        self.draw_line(Point2D::new(ax, y, az), Point2D::new(bx, y, bz), brush);
    }

    /// Cells that differ from `prev`, in row-major order. Grids of different
    /// sizes report every cell of `self`.
    pub fn diff(&self, prev: &FrameBuffer) -> Vec<CellChange> {
        let w = self.size.width as usize;
        let same_size = prev.size == self.size;
        self.cells
            .iter()
            .enumerate()
            .filter(|&(i, cell)| !same_size || prev.cells[i] != *cell)
            .map(|(i, cell)| CellChange {
                x: (i % w) as u16,
                y: (i / w) as u16,
                cell: *cell,
            })
            .collect()
    }

    /// Copy `other` into `self`, reusing the allocation when sizes match.
    pub fn copy_from(&mut self, other: &FrameBuffer) {
        self.size = other.size;
        self.cells.clone_from(&other.cells);
        self.depth.clone_from(&other.depth);
        self.depth_test = other.depth_test;
    }
}

/// A triangle edge walked one scanline at a time.
struct Edge {
    from: Point2D,
    dy: i32,
    x_step: f64,
    z_step: f64,
}

impl Edge {
    fn new(from: Point2D, to: Point2D) -> Self {
        let dy = to.y - from.y;
        let (x_step, z_step) = if dy == 0 {
            (0.0, 0.0)
        } else {
            let rows = f64::from(dy.abs());
            (
                f64::from(to.x - from.x) / rows,
                (to.depth - from.depth) / rows,
            )
        };
        Edge {
            from,
            dy,
            x_step,
            z_step,
        }
    }

    /// Column and depth where this edge crosses row `y`.
    fn at(&self, y: i32) -> (i32, f64) {
        let rows = f64::from(y - self.from.y);
        let x = round_half_up(f64::from(self.from.x) + rows * self.x_step);
        (x as i32, self.from.depth + rows * self.z_step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AT: Brush = Brush::plain('@');
    const DOT: Brush = Brush::plain('.');

    fn filled(fb: &FrameBuffer, ch: char) -> usize {
        fb.cells.iter().filter(|c| c.ch == ch).count()
    }

    #[test]
    fn new_buffer_is_blank_and_infinitely_deep() {
        let fb = FrameBuffer::new(GridSize::new(3, 2));
        assert_eq!(fb.lines(), vec!["   ", "   "]);
        assert_eq!(fb.depth_at(2, 1), Some(f64::INFINITY));
        assert_eq!(fb.depth_at(3, 0), None);
    }

    #[test]
    fn diagonal_line_hits_both_ends() {
        let mut fb = FrameBuffer::new(GridSize::new(5, 5));
        fb.draw_line(Point2D::new(0, 0, 1.0), Point2D::new(4, 4, 1.0), AT);
        for i in 0..5 {
            assert_eq!(fb.cell(i, i).unwrap().ch, '@');
        }
        assert_eq!(filled(&fb, '@'), 5);
    }

    #[test]
    fn vertical_line_keeps_start_depth() {
        let mut fb = FrameBuffer::new(GridSize::new(3, 4));
        fb.draw_line(Point2D::new(1, 0, 2.0), Point2D::new(1, 3, 9.0), AT);
        for y in 0..4 {
            assert_eq!(fb.depth_at(1, y), Some(2.0));
        }
    }

    #[test]
    fn off_grid_pixels_are_skipped() {
        let mut fb = FrameBuffer::new(GridSize::new(4, 1));
        fb.draw_line(Point2D::new(-3, 0, 0.0), Point2D::new(8, 0, 0.0), AT);
        assert_eq!(fb.lines(), vec!["@@@@"]);
    }

    #[test]
    fn depth_test_gates_farther_writes() {
        let mut fb = FrameBuffer::new(GridSize::new(4, 1));
        fb.depth_test = true;
        fb.draw_line(Point2D::new(0, 0, 1.0), Point2D::new(3, 0, 1.0), AT);
        fb.draw_line(Point2D::new(0, 0, 5.0), Point2D::new(3, 0, 5.0), DOT);
        assert_eq!(fb.lines(), vec!["@@@@"]);

        fb.depth_test = false;
        fb.draw_line(Point2D::new(0, 0, 5.0), Point2D::new(3, 0, 5.0), DOT);
        assert_eq!(fb.lines(), vec!["...."]);
    }

    #[test]
    fn flat_triangle_is_skipped() {
        let mut fb = FrameBuffer::new(GridSize::new(5, 5));
        let p = |x| Point2D::new(x, 2, 0.0);
        fb.fill_triangle(p(0), p(2), p(4), DOT);
        assert_eq!(filled(&fb, '.'), 0);
    }

    #[test]
    fn triangle_fill_stays_inside_bounding_box() {
        let mut fb = FrameBuffer::new(GridSize::new(10, 10));
        fb.fill_triangle(
            Point2D::new(1, 1, 0.0),
            Point2D::new(8, 1, 0.0),
            Point2D::new(1, 8, 0.0),
            DOT,
        );
        for y in 0..10 {
            for x in 0..10 {
                if fb.cell(x, y).unwrap().ch == '.' {
                    assert!((1..=8).contains(&x) && (1..=8).contains(&y));
                    assert!(x + y <= 9 + 1, "({x},{y}) outside hypotenuse");
                }
            }
        }
        assert_eq!(fb.cell(1, 1).unwrap().ch, '.');
        assert_eq!(fb.cell(1, 8).unwrap().ch, '.');
    }

    #[test]
    fn diff_reports_changed_cells_only() {
        let prev = FrameBuffer::new(GridSize::new(3, 3));
        let mut next = FrameBuffer::new(GridSize::new(3, 3));
        next.draw_line(Point2D::new(2, 1, 0.0), Point2D::new(2, 1, 0.0), AT);
        let changes = next.diff(&prev);
        assert_eq!(changes.len(), 1);
        assert_eq!((changes[0].x, changes[0].y), (2, 1));
        assert_eq!(changes[0].cell.ch, '@');
    }

    #[test]
    fn clear_resets_cells_and_depth() {
        let mut fb = FrameBuffer::new(GridSize::new(2, 1));
        fb.draw_line(Point2D::new(0, 0, 1.0), Point2D::new(1, 0, 1.0), AT);
        fb.clear();
        assert_eq!(fb.lines(), vec!["  "]);
        assert_eq!(fb.depth_at(0, 0), Some(f64::INFINITY));
    }

    #[test]
    fn row_past_the_bottom_is_none() {
        let fb = FrameBuffer::new(GridSize::new(3, 2));
        assert_eq!(fb.row(1).map(<[Cell]>::len), Some(3));
        assert!(fb.row(2).is_none());
    }

    fn fill_and_outline(depth_test: bool) -> FrameBuffer {
        // Apex is the far corner, so the vertical edge starts at the far end.
        let corners = [
            Point2D::new(5, 0, 12.0),
            Point2D::new(5, 9, 10.0),
            Point2D::new(0, 9, 10.0),
        ];
        let mut fb = FrameBuffer::new(GridSize::new(10, 10));
        fb.depth_test = depth_test;
        fb.fill_triangle(corners[0], corners[1], corners[2], DOT);
        fb.draw_outline(&corners, AT);
        fb
    }

    #[test]
    fn outline_lands_on_its_own_tilted_fill() {
        let tested = fill_and_outline(true);
        let column: String = (0..10).map(|y| tested.cell(5, y).unwrap().ch).collect();
        assert_eq!(column, "@@@@@@@@@@");
        assert_eq!(tested.lines(), fill_and_outline(false).lines());
    }

    #[test]
    fn outline_still_hidden_behind_nearer_cells() {
        let mut fb = FrameBuffer::new(GridSize::new(5, 1));
        fb.depth_test = true;
        fb.draw_line(Point2D::new(0, 0, 1.0), Point2D::new(4, 0, 1.0), DOT);
        fb.draw_outline(&[Point2D::new(0, 0, 6.0), Point2D::new(4, 0, 8.0)], AT);
        assert_eq!(fb.lines(), vec!["....."]);
    }
}
