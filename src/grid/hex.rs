//! Axial coordinates for a flat-top hexagonal grid.
//!
//! The grid uses flat-top hexagons with axial coordinates `(q, r)`, where `q`
//! grows eastward and `r` grows southward. Storage uses even-q offset
//! coordinates, see [`crate::grid::offset_coordinate::OffsetCoordinate`].

use glam::DVec2;

/// The six edge directions of a flat-top hexagon, clockwise from north.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    North,
    NorthEast,
    SouthEast,
    South,
    SouthWest,
    NorthWest,
}

impl Direction {
    pub const ALL: [Direction; 6] = [
        Direction::North,
        Direction::NorthEast,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::NorthWest,
    ];

    pub const fn opposite(self) -> Self {
        match self {
            Direction::North => Direction::South,
            Direction::NorthEast => Direction::SouthWest,
            Direction::SouthEast => Direction::NorthWest,
            Direction::South => Direction::North,
            Direction::SouthWest => Direction::NorthEast,
            Direction::NorthWest => Direction::SouthEast,
        }
    }
}

/// A hex in axial coordinates. `q` is the column, `r` grows southward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hex {
    pub q: i32,
    pub r: i32,
}

impl Hex {
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// The axial vector for each edge direction.
    const fn direction_vector(direction: Direction) -> Hex {
        match direction {
            Direction::North => Hex::new(0, -1),
            Direction::NorthEast => Hex::new(1, -1),
            Direction::SouthEast => Hex::new(1, 0),
            Direction::South => Hex::new(0, 1),
            Direction::SouthWest => Hex::new(-1, 1),
            Direction::NorthWest => Hex::new(-1, 0),
        }
    }

    pub const fn neighbor(self, direction: Direction) -> Hex {
        let v = Self::direction_vector(direction);
        Hex::new(self.q + v.q, self.r + v.r)
    }

    /// Hex (cube) distance between two hexes.
    pub const fn distance_to(self, other: Hex) -> i32 {
        let dq = self.q - other.q;
        let dr = self.r - other.r;
        (dq.abs() + dr.abs() + (dq + dr).abs()) / 2
    }

    /// All hexes at exactly `radius` from `self`, walking the ring clockwise
    /// starting from the south-west corner. Returns just `self` for radius 0.
    pub fn ring(self, radius: u32) -> Vec<Hex> {
        if radius == 0 {
            return vec![self];
        }
        let radius = radius as i32;
        let mut results = Vec::with_capacity(6 * radius as usize);
        let mut hex = Hex::new(self.q - radius, self.r + radius);
        for direction in Direction::ALL {
            for _ in 0..radius {
                results.push(hex);
                hex = hex.neighbor(direction);
            }
        }
        results
    }

    /// All hexes within `radius` of `self`, including `self`.
    pub fn spiral(self, radius: u32) -> Vec<Hex> {
        let mut results = Vec::new();
        for ring_radius in 0..=radius {
            results.extend(self.ring(ring_radius));
        }
        results
    }

    /// Converts to even-q offset coordinates (column, row), row growing
    /// southward.
    pub const fn to_offset(self) -> (i32, i32) {
        let col = self.q;
        let row = self.r + (self.q + (self.q & 1)) / 2;
        (col, row)
    }

    pub const fn from_offset(col: i32, row: i32) -> Hex {
        let q = col;
        let r = row - (col + (col & 1)) / 2;
        Hex::new(q, r)
    }

    /// The center of this hex in world space, for a flat-top hexagon with
    /// unit circumradius. Used to sample coherent noise at tile positions.
    pub fn world_position(self) -> DVec2 {
        const SQRT_3: f64 = 1.732_050_807_568_877_2;
        DVec2::new(
            1.5 * self.q as f64,
            SQRT_3 * (self.r as f64 + self.q as f64 / 2.0),
        )
    }
}

/// The radius of the smallest hexagonal map containing `number_of_tiles`
/// tiles. A hexagonal map of radius `r` holds `3r(r+1) + 1` tiles; this is
/// the inverse, rounded down to a float for ratio arithmetic.
pub fn hexagonal_radius_for_area(number_of_tiles: usize) -> f64 {
    if number_of_tiles < 1 {
        return 0.0;
    }
    ((12.0 * number_of_tiles as f64 - 3.0).sqrt() - 3.0) / 6.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_roundtrip() {
        for col in -3..8 {
            for row in -3..8 {
                let hex = Hex::from_offset(col, row);
                assert_eq!(hex.to_offset(), (col, row));
            }
        }
    }

    #[test]
    fn neighbors_are_at_distance_one() {
        let center = Hex::new(3, -2);
        for direction in Direction::ALL {
            assert_eq!(center.distance_to(center.neighbor(direction)), 1);
        }
    }

    #[test]
    fn opposite_directions_cancel() {
        let center = Hex::new(0, 0);
        for direction in Direction::ALL {
            let there_and_back = center
                .neighbor(direction)
                .neighbor(direction.opposite());
            assert_eq!(there_and_back, center);
        }
    }

    #[test]
    fn ring_sizes() {
        let center = Hex::new(0, 0);
        assert_eq!(center.ring(0).len(), 1);
        assert_eq!(center.ring(1).len(), 6);
        assert_eq!(center.ring(3).len(), 18);
        for hex in center.ring(3) {
            assert_eq!(center.distance_to(hex), 3);
        }
    }

    #[test]
    fn spiral_counts_match_hexagonal_area() {
        let center = Hex::new(0, 0);
        // 3r(r+1) + 1
        assert_eq!(center.spiral(2).len(), 19);
        assert_eq!(center.spiral(4).len(), 61);
    }

    #[test]
    fn hexagonal_radius_inverts_area() {
        assert_eq!(hexagonal_radius_for_area(0), 0.0);
        assert_eq!(hexagonal_radius_for_area(1), 0.0);
        // radius 2 map = 19 tiles
        assert!((hexagonal_radius_for_area(19) - 2.0).abs() < 1e-9);
        // radius 4 map = 61 tiles
        assert!((hexagonal_radius_for_area(61) - 4.0).abs() < 1e-9);
    }
}
