/*
 * Minimal geometry value types used as parameters by the control tree and
 * the layout engine. Units are device-independent (1/96th inch).
 * A `NaN` component in a suggested size means "auto" for that axis.
 */

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointF {
    pub x: f32,
    pub y: f32,
}

impl PointF {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SizeF {
    pub width: f32,
    pub height: f32,
}

impl SizeF {
    /// Both axes unspecified.
    pub const AUTO: SizeF = SizeF {
        width: f32::NAN,
        height: f32::NAN,
    };

    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn is_width_auto(&self) -> bool {
        self.width.is_nan()
    }

    pub fn is_height_auto(&self) -> bool {
        self.height.is_nan()
    }

    /// Equality that treats two NaN components as equal, so "auto" compares equal to "auto".
    pub fn same_as(&self, other: &SizeF) -> bool {
        fn axis_eq(a: f32, b: f32) -> bool {
            (a.is_nan() && b.is_nan()) || a == b
        }
        axis_eq(self.width, other.width) && axis_eq(self.height, other.height)
    }

    pub fn max(self, other: SizeF) -> SizeF {
        SizeF::new(self.width.max(other.width), self.height.max(other.height))
    }
}

impl std::ops::Add for SizeF {
    type Output = SizeF;

    fn add(self, rhs: SizeF) -> SizeF {
        SizeF::new(self.width + rhs.width, self.height + rhs.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RectF {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl RectF {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_size(size: SizeF) -> Self {
        Self::new(0.0, 0.0, size.width, size.height)
    }

    pub fn location(&self) -> PointF {
        PointF::new(self.x, self.y)
    }

    pub fn size(&self) -> SizeF {
        SizeF::new(self.width, self.height)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Shrinks the rectangle by the given edge amounts, clamping to an empty size.
    pub fn deflate(&self, left: f32, top: f32, right: f32, bottom: f32) -> RectF {
        RectF::new(
            self.x + left,
            self.y + top,
            (self.width - left - right).max(0.0),
            (self.height - top - bottom).max(0.0),
        )
    }
}
