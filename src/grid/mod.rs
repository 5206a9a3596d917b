//! The hex-grid service: dense row-major storage over a flat-top hexagonal
//! grid with optional x-wrapping, plus the coordinate math the generation
//! pipeline needs (neighbors, rings, distances, latitude/longitude).

pub mod hex;
pub mod offset_coordinate;

use arrayvec::ArrayVec;
use glam::DVec2;

use crate::grid::{
    hex::{Direction, Hex},
    offset_coordinate::OffsetCoordinate,
};

/// Grid dimensions and wrapping. Tiles are indexed `x + y * width` with the
/// top-left tile at index 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    pub width: i32,
    pub height: i32,
    pub wrap_x: bool,
}

impl Grid {
    pub const fn new(width: i32, height: i32, wrap_x: bool) -> Self {
        debug_assert!(width > 0 && height > 0);
        Self {
            width,
            height,
            wrap_x,
        }
    }

    pub const fn size(&self) -> usize {
        (self.width * self.height) as usize
    }

    /// The storage index for a coordinate, normalizing the column on
    /// x-wrapping grids. `None` if the coordinate is off the map.
    pub fn index_of(&self, coordinate: OffsetCoordinate) -> Option<usize> {
        let x = if self.wrap_x {
            coordinate.x.rem_euclid(self.width)
        } else if (0..self.width).contains(&coordinate.x) {
            coordinate.x
        } else {
            return None;
        };
        if !(0..self.height).contains(&coordinate.y) {
            return None;
        }
        Some((x + coordinate.y * self.width) as usize)
    }

    pub const fn offset_of(&self, index: usize) -> OffsetCoordinate {
        OffsetCoordinate::new(index as i32 % self.width, index as i32 / self.width)
    }

    pub const fn hex_of(&self, index: usize) -> Hex {
        let offset = self.offset_of(index);
        Hex::from_offset(offset.x, offset.y)
    }

    pub fn neighbor(&self, index: usize, direction: Direction) -> Option<usize> {
        let neighbor_hex = self.hex_of(index).neighbor(direction);
        self.index_of(OffsetCoordinate::from(neighbor_hex))
    }

    /// The up to six neighbors of a tile, in clockwise direction order.
    pub fn neighbors(&self, index: usize) -> ArrayVec<usize, 6> {
        Direction::ALL
            .into_iter()
            .filter_map(|direction| self.neighbor(index, direction))
            .collect()
    }

    /// All tiles at exactly `distance` from `index` that are on the map.
    pub fn tiles_at_distance(&self, index: usize, distance: u32) -> Vec<usize> {
        self.hex_of(index)
            .ring(distance)
            .into_iter()
            .filter_map(|hex| self.index_of(OffsetCoordinate::from(hex)))
            .collect()
    }

    /// All tiles within `distance` of `index`, including `index` itself.
    pub fn tiles_within_distance(&self, index: usize, distance: u32) -> Vec<usize> {
        self.hex_of(index)
            .spiral(distance)
            .into_iter()
            .filter_map(|hex| self.index_of(OffsetCoordinate::from(hex)))
            .collect()
    }

    /// Hex distance between two tiles, taking the short way around the seam
    /// on x-wrapping grids.
    pub fn distance(&self, from: usize, to: usize) -> i32 {
        let from_offset = self.offset_of(from);
        let mut to_offset = self.offset_of(to);
        if self.wrap_x {
            let dx = to_offset.x - from_offset.x;
            if dx > self.width / 2 {
                to_offset.x -= self.width;
            } else if dx < -self.width / 2 {
                to_offset.x += self.width;
            }
        }
        from_offset.to_hex().distance_to(to_offset.to_hex())
    }

    /// Normalized distance from the equator: 0 at the middle row, 1 at the
    /// top and bottom rows.
    pub fn latitude(&self, index: usize) -> f64 {
        if self.height <= 1 {
            return 0.0;
        }
        let y = self.offset_of(index).y;
        ((2 * y - (self.height - 1)) as f64 / (self.height - 1) as f64).abs()
    }

    /// Normalized east-west position: -1 at the west edge, 1 at the east.
    pub fn longitude(&self, index: usize) -> f64 {
        if self.width <= 1 {
            return 0.0;
        }
        let x = self.offset_of(index).x;
        (2 * x - (self.width - 1)) as f64 / (self.width - 1) as f64
    }

    /// World-space position of a tile's hex center, for noise sampling.
    pub fn world_position(&self, index: usize) -> DVec2 {
        self.hex_of(index).world_position()
    }

    pub const fn center_tile(&self) -> usize {
        (self.width / 2 + self.height / 2 * self.width) as usize
    }

    pub fn iter_indices(&self) -> impl Iterator<Item = usize> + use<> {
        0..self.size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_roundtrip() {
        let grid = Grid::new(8, 6, false);
        for index in grid.iter_indices() {
            assert_eq!(grid.index_of(grid.offset_of(index)), Some(index));
        }
    }

    #[test]
    fn out_of_bounds_without_wrap() {
        let grid = Grid::new(8, 6, false);
        assert_eq!(grid.index_of(OffsetCoordinate::new(-1, 0)), None);
        assert_eq!(grid.index_of(OffsetCoordinate::new(8, 0)), None);
        assert_eq!(grid.index_of(OffsetCoordinate::new(0, 6)), None);
    }

    #[test]
    fn wrap_normalizes_columns() {
        let grid = Grid::new(8, 6, true);
        assert_eq!(
            grid.index_of(OffsetCoordinate::new(-1, 2)),
            grid.index_of(OffsetCoordinate::new(7, 2))
        );
        assert_eq!(
            grid.index_of(OffsetCoordinate::new(9, 0)),
            grid.index_of(OffsetCoordinate::new(1, 0))
        );
        // y never wraps
        assert_eq!(grid.index_of(OffsetCoordinate::new(0, -1)), None);
    }

    #[test]
    fn wrapped_distance_takes_the_short_way() {
        let grid = Grid::new(10, 5, true);
        let west = grid.index_of(OffsetCoordinate::new(0, 2)).unwrap();
        let east = grid.index_of(OffsetCoordinate::new(9, 2)).unwrap();
        assert_eq!(grid.distance(west, east), 1);

        let flat = Grid::new(10, 5, false);
        assert_eq!(flat.distance(west, east), 9);
    }

    #[test]
    fn interior_tile_has_six_neighbors() {
        let grid = Grid::new(8, 6, false);
        let center = grid.index_of(OffsetCoordinate::new(4, 3)).unwrap();
        assert_eq!(grid.neighbors(center).len(), 6);
        for neighbor in grid.neighbors(center) {
            assert_eq!(grid.distance(center, neighbor), 1);
        }
        // corner tiles have fewer
        assert!(grid.neighbors(0).len() < 6);
    }

    #[test]
    fn latitude_spans_equator_to_poles() {
        let grid = Grid::new(4, 9, false);
        let pole = grid.index_of(OffsetCoordinate::new(0, 0)).unwrap();
        let equator = grid.index_of(OffsetCoordinate::new(0, 4)).unwrap();
        assert_eq!(grid.latitude(pole), 1.0);
        assert_eq!(grid.latitude(equator), 0.0);
    }
}
