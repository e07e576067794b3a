/*
 * Platform-agnostic styling values carried by controls: colors, brushes, and
 * font descriptions. These are plain values; handlers translate them into
 * whatever their native peers understand.
 */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(0xFF, 0xFF, 0xFF);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Fill description used for backgrounds, foregrounds, and borders.
#[derive(Debug, Clone, PartialEq)]
pub enum Brush {
    Solid(Color),
    LinearGradient { start: Color, end: Color, angle: f32 },
    Hatch { style: HatchStyle, foreground: Color, background: Color },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HatchStyle {
    Horizontal,
    Vertical,
    ForwardDiagonal,
    BackwardDiagonal,
    Cross,
    DiagonalCross,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FontDescription {
    pub name: Option<String>,
    pub size: Option<f32>,
    pub weight: Option<FontWeight>,
    pub italic: bool,
}

impl FontDescription {
    pub fn new(name: impl Into<String>, size: f32) -> Self {
        Self {
            name: Some(name.into()),
            size: Some(size),
            weight: None,
            italic: false,
        }
    }

    pub fn bold(mut self) -> Self {
        self.weight = Some(FontWeight::Bold);
        self
    }
}
