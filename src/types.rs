/*
 * Platform-agnostic types shared across the control tree: logical identifiers,
 * layout values, control kinds, and the event vocabulary used by subscribers.
 */

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CONTROL_ID: AtomicU64 = AtomicU64::new(1);

/// Logical identity of a control. Unique for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControlId(u64);

impl ControlId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(&self) -> u64 {
        self.0
    }

    pub(crate) fn generate() -> Self {
        Self(NEXT_CONTROL_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Handle returned by `ControlTree::subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

/// Space around (margin) or inside (padding) a control's edges.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Thickness {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Thickness {
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub const fn uniform(value: f32) -> Self {
        Self::new(value, value, value, value)
    }

    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HorizontalAlignment {
    Left,
    Center,
    Right,
    #[default]
    Stretch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VerticalAlignment {
    Top,
    Center,
    Bottom,
    #[default]
    Stretch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Orientation {
    #[default]
    Vertical,
    Horizontal,
}

/// Identifies the kind of a control so handler behaviour can be dispatched without peer queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKind {
    Control,
    Panel,
    StackPanel { orientation: Orientation },
    Border,
    Window,
}

impl ControlKind {
    pub fn is_window(&self) -> bool {
        matches!(self, ControlKind::Window)
    }
}

/// Change-tracked properties. Each one has a hook call and a public `Changed` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    Visible,
    Enabled,
    Margin,
    Padding,
    Background,
    Foreground,
    BorderBrush,
    Font,
    HorizontalAlignment,
    VerticalAlignment,
    Title,
}

impl Property {
    /// Whether a change to this property can alter the parent's arrangement.
    pub(crate) fn affects_parent_layout(&self) -> bool {
        matches!(
            self,
            Property::Visible
                | Property::Margin
                | Property::HorizontalAlignment
                | Property::VerticalAlignment
        )
    }
}

/// Public events a subscriber can listen to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Changed(Property),
    Click,
    Paint,
    Closing,
    Closed,
    SizeChanged,
    SelectionChanged,
    TextChanged,
}

impl EventKind {
    pub fn is_cancellable(&self) -> bool {
        matches!(self, EventKind::Closing)
    }
}

/*
 * Configuration for a top-level window control. Width and height of `NaN`
 * leave the window auto-sized by its content.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct WindowConfig {
    pub title: String,
    pub width: f32,
    pub height: f32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: String::new(),
            width: f32::NAN,
            height: f32::NAN,
        }
    }
}
