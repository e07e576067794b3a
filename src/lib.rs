/*
 * Public entry point for the peerkit crate: a retained-mode control tree in
 * which every control is lazily bound to exactly one native peer through a
 * pluggable handler factory.
 *
 * The tree owns all controls and is driven from a single UI thread. It
 * provides layout batching through nestable suspend/resume counters, a
 * disposal cascade that destroys native peers bottom-up, and an event router
 * that turns native callbacks into managed events (including the window-close
 * veto). Native backends plug in through `NativePeer` and `HandlerFactory`;
 * the `headless` backend records every native call and needs no platform.
 */
pub mod application;
pub mod control_tree;
pub mod drawing;
pub mod error;
pub mod event_router;
pub mod geometry;
pub mod handler;
pub mod headless;
pub mod hooks;
pub(crate) mod layout;
mod layout_engine;
mod lifecycle;
pub mod native;
pub mod styling_primitives;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use application::{Application, ApplicationConfig, VisualTheme};
pub use control_tree::ControlTree;
pub use drawing::DrawingContext;
pub use error::{PlatformError, Result as PlatformResult};
pub use event_router::EventArgs;
pub use geometry::{PointF, RectF, SizeF};
pub use handler::{ControlHandler, HandlerFactory, HandlerState};
pub use hooks::ControlHooks;
pub use native::{NATIVE_CONTINUE, NATIVE_VETO, NativeEventTag, NativePeer, PeerId};
pub use styling_primitives::{Brush, Color, FontDescription, FontWeight, HatchStyle};
pub use types::{
    ControlId, ControlKind, EventKind, HorizontalAlignment, Orientation, Property, SubscriptionId,
    Thickness, VerticalAlignment, WindowConfig,
};
