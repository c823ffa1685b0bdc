use serde::{Deserialize, Serialize};

use crate::geometry::{HorizontalSide, VerticalSide};

/// Search direction away from a head.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    pub fn new(v_side: VerticalSide, h_side: HorizontalSide) -> Self {
        match (v_side, h_side) {
            (VerticalSide::Top, HorizontalSide::Left) => Corner::TopLeft,
            (VerticalSide::Top, HorizontalSide::Right) => Corner::TopRight,
            (VerticalSide::Bottom, HorizontalSide::Left) => Corner::BottomLeft,
            (VerticalSide::Bottom, HorizontalSide::Right) => Corner::BottomRight,
        }
    }

    pub fn v_side(self) -> VerticalSide {
        match self {
            Corner::TopLeft | Corner::TopRight => VerticalSide::Top,
            Corner::BottomLeft | Corner::BottomRight => VerticalSide::Bottom,
        }
    }

    pub fn h_side(self) -> HorizontalSide {
        match self {
            Corner::TopLeft | Corner::BottomLeft => HorizontalSide::Left,
            Corner::TopRight | Corner::BottomRight => HorizontalSide::Right,
        }
    }

    /// +1 when moving right, away from the head.
    #[inline]
    pub fn x_dir(self) -> i32 {
        match self.h_side() {
            HorizontalSide::Left => -1,
            HorizontalSide::Right => 1,
        }
    }

    /// +1 when moving down, away from the head.
    #[inline]
    pub fn y_dir(self) -> i32 {
        match self.v_side() {
            VerticalSide::Top => -1,
            VerticalSide::Bottom => 1,
        }
    }

    /// Short tag, `TL`, `BR`...
    pub fn tag(self) -> &'static str {
        match self {
            Corner::TopLeft => "TL",
            Corner::TopRight => "TR",
            Corner::BottomLeft => "BL",
            Corner::BottomRight => "BR",
        }
    }
}

impl std::fmt::Display for Corner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directions_follow_sides() {
        for corner in Corner::ALL {
            assert_eq!(Corner::new(corner.v_side(), corner.h_side()), corner);
        }
        assert_eq!(
            (Corner::TopRight.x_dir(), Corner::TopRight.y_dir()),
            (1, -1)
        );
        assert_eq!(
            (Corner::BottomLeft.x_dir(), Corner::BottomLeft.y_dir()),
            (-1, 1)
        );
    }
}
