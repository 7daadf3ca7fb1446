/// Collision resolver: axis-aligned boxes against the solid tile set.
///
/// ## Tile coverage
///
/// A box at (x, y) with size (w, h) covers the inclusive tile ranges
///   cols: floor(x / T) ..= floor((x + w - 1) / T)
///   rows: floor(y / T) ..= floor((y + h - 1) / T)
/// The `- 1` selects the last pixel that belongs to the box, so a box
/// resting exactly on a tile boundary does not touch the next tile.
///
/// ## Resolution
///
/// Axes are resolved independently, horizontal first. A blocked move
/// walks the box one unit at a time toward the obstacle until the next
/// unit would collide. High speeds can tunnel a little; speeds are capped.
///
/// Cells outside the level are never in the solid set, so out-of-range
/// queries read as open space.

use std::collections::HashSet;

/// Integer tile coordinate (column, row).
pub type Cell = (i32, i32);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Aabb {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Aabb { x, y, w, h }
    }

    /// Edge-inclusive overlap: boxes that touch count as overlapping.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        !(self.x + self.w < other.x
            || self.x > other.x + other.w
            || self.y + self.h < other.y
            || self.y > other.y + other.h)
    }
}

/// Immutable view of the solid set for collision queries.
pub struct SolidView<'a> {
    pub cells: &'a HashSet<Cell>,
    pub tile: f32,
}

impl<'a> SolidView<'a> {
    pub fn new(cells: &'a HashSet<Cell>, tile: f32) -> Self {
        SolidView { cells, tile }
    }

    /// Tile containing a point.
    pub fn cell_at(&self, x: f32, y: f32) -> Cell {
        ((x / self.tile).floor() as i32, (y / self.tile).floor() as i32)
    }

    #[inline]
    pub fn is_solid(&self, cell: Cell) -> bool {
        self.cells.contains(&cell)
    }

    /// Does a box at (x, y) of size (w, h) overlap any solid cell?
    pub fn blocked(&self, x: f32, y: f32, w: f32, h: f32) -> bool {
        let left = (x / self.tile).floor() as i32;
        let right = ((x + w - 1.0) / self.tile).floor() as i32;
        let top = (y / self.tile).floor() as i32;
        let bottom = ((y + h - 1.0) / self.tile).floor() as i32;
        for ty in top..=bottom {
            for tx in left..=right {
                if self.cells.contains(&(tx, ty)) {
                    return true;
                }
            }
        }
        false
    }

    pub fn blocked_box(&self, b: &Aabb) -> bool {
        self.blocked(b.x, b.y, b.w, b.h)
    }

    /// Move along x by `dx`. Returns true if the move was blocked, in which
    /// case the box has been walked up to contact instead.
    pub fn resolve_x(&self, b: &mut Aabb, dx: f32) -> bool {
        if !self.blocked(b.x + dx, b.y, b.w, b.h) {
            b.x += dx;
            return false;
        }
        let dir = unit(dx);
        let mut budget = walk_budget(dx);
        while dir != 0.0 && budget > 0 && !self.blocked(b.x + dir, b.y, b.w, b.h) {
            b.x += dir;
            budget -= 1;
        }
        true
    }

    /// Move along y by `dy`. Same contract as `resolve_x`.
    pub fn resolve_y(&self, b: &mut Aabb, dy: f32) -> bool {
        if !self.blocked(b.x, b.y + dy, b.w, b.h) {
            b.y += dy;
            return false;
        }
        let dir = unit(dy);
        let mut budget = walk_budget(dy);
        while dir != 0.0 && budget > 0 && !self.blocked(b.x, b.y + dir, b.w, b.h) {
            b.y += dir;
            budget -= 1;
        }
        true
    }
}

/// Sign of a velocity; zero stays zero (`f32::signum(0.0)` is 1.0).
#[inline]
fn unit(v: f32) -> f32 {
    if v > 0.0 { 1.0 } else if v < 0.0 { -1.0 } else { 0.0 }
}

/// Contact lies within |v| of the start, so that many unit steps suffice.
#[inline]
fn walk_budget(v: f32) -> u32 {
    v.abs().ceil() as u32 + 1
}
