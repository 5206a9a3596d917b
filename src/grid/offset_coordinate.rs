//! Even-q offset coordinates and axis-aligned rectangles over them.
//!
//! Offset coordinates address tiles by (column, row) with the origin at the
//! top-left corner and rows growing southward. On x-wrapping maps a column
//! has multiple representations; [`crate::grid::Grid::index_of`] normalizes
//! them.

use crate::grid::hex::Hex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OffsetCoordinate {
    pub x: i32,
    pub y: i32,
}

impl OffsetCoordinate {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub const fn to_hex(self) -> Hex {
        Hex::from_offset(self.x, self.y)
    }
}

impl From<Hex> for OffsetCoordinate {
    fn from(hex: Hex) -> Self {
        let (x, y) = hex.to_offset();
        Self { x, y }
    }
}

/// An axis-aligned rectangle in even-q offset space.
///
/// `x` may exceed the grid width on x-wrapping maps, in which case iteration
/// yields columns past the seam that the grid normalizes back into range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rectangle {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rectangle {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> OffsetCoordinate {
        OffsetCoordinate::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    /// A rectangle scaled by `proportion` and centered over `self`, with all
    /// sides rounded to whole tiles.
    pub fn central(&self, proportion: f64) -> Rectangle {
        let width = (self.width as f64 * proportion).round() as i32;
        let height = (self.height as f64 * proportion).round() as i32;
        let x = ((self.x + self.width / 2) as f64 - width as f64 / 2.0).round() as i32;
        let y = ((self.y + self.height / 2) as f64 - height as f64 / 2.0).round() as i32;
        Rectangle::new(x, y, width, height)
    }

    pub fn contains(&self, coordinate: OffsetCoordinate) -> bool {
        coordinate.x >= self.x
            && coordinate.x < self.x + self.width
            && coordinate.y >= self.y
            && coordinate.y < self.y + self.height
    }

    /// Iterates all coordinates in the rectangle, row by row.
    pub fn iter(&self) -> impl Iterator<Item = OffsetCoordinate> + use<> {
        let (x, y, width, height) = (self.x, self.y, self.width, self.height);
        (y..y + height)
            .flat_map(move |row| (x..x + width).map(move |col| OffsetCoordinate::new(col, row)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn central_rectangle_shrinks_around_center() {
        let rect = Rectangle::new(0, 0, 9, 9);
        let inner = rect.central(0.33);
        assert_eq!(inner.width, 3);
        assert_eq!(inner.height, 3);
        assert!(rect.contains(inner.center()));
        assert_eq!(inner.center(), rect.center());
    }

    #[test]
    fn iter_covers_all_tiles() {
        let rect = Rectangle::new(2, 1, 3, 4);
        let tiles: Vec<_> = rect.iter().collect();
        assert_eq!(tiles.len(), 12);
        assert!(tiles.iter().all(|c| rect.contains(*c)));
    }
}
