/*
 * The native side of the binding. A `NativePeer` is the opaque platform object
 * backing exactly one handler; the tree never looks inside it. Native callbacks
 * enter the tree through `ControlTree::dispatch_native_event`, keyed by the
 * peer's `PeerId`, a numeric event tag, and an opaque parameter.
 */

use crate::drawing::DrawingContext;
use crate::error::Result as PlatformResult;
use crate::geometry::{RectF, SizeF};

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_PEER_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a native peer for as long as the peer is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(u64);

impl PeerId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(&self) -> u64 {
        self.0
    }

    /// Allocates a process-unique id for a freshly constructed peer.
    pub fn generate() -> Self {
        Self(NEXT_PEER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

pub trait NativePeer {
    fn id(&self) -> PeerId;

    fn create(&mut self) -> PlatformResult<()>;
    fn destroy(&mut self);

    fn paint(&mut self, context: &mut dyn DrawingContext);
    fn layout(&mut self);
    fn preferred_size(&self, available: SizeF) -> SizeF;
    fn set_bounds(&mut self, bounds: RectF);

    fn set_visible(&mut self, visible: bool);
    fn set_enabled(&mut self, enabled: bool);
    fn set_title(&mut self, _title: &str) {}

    fn suspend_layout(&mut self);
    fn resume_layout(&mut self);
    fn begin_update(&mut self);
    fn end_update(&mut self);
    fn invalidate(&mut self);
}

/// Native-side result meaning "event handled, continue".
pub const NATIVE_CONTINUE: isize = 0;
/// Native-side result meaning "abort the native operation" (close veto).
pub const NATIVE_VETO: isize = 1;

/// Event tags understood by the router. The numeric values are the wire contract with the native layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum NativeEventTag {
    Closing = 0,
    SizeChanged = 1,
    Click = 2,
    SelectionChanged = 3,
    TextChanged = 4,
}

impl TryFrom<u32> for NativeEventTag {
    type Error = u32;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(NativeEventTag::Closing),
            1 => Ok(NativeEventTag::SizeChanged),
            2 => Ok(NativeEventTag::Click),
            3 => Ok(NativeEventTag::SelectionChanged),
            4 => Ok(NativeEventTag::TextChanged),
            other => Err(other),
        }
    }
}
