/*
 * A `ControlHandler` binds one logical control to one native peer and owns
 * that peer exclusively. It carries the two suspension depth counters (layout
 * and paint), the pending-work markers they gate, and the handler-level
 * visual-children view. Handlers move through Created -> Attached -> Detached;
 * detach destroys the peer and is terminal for that handler instance.
 */

use crate::drawing::DrawingContext;
use crate::error::{PlatformError, Result as PlatformResult};
use crate::geometry::{RectF, SizeF};
use crate::native::{NativePeer, PeerId};
use crate::styling_primitives::Brush;
use crate::types::{ControlId, ControlKind, Thickness};

use std::fmt;

/// Pluggable producer of handlers, selected per visual theme.
pub trait HandlerFactory {
    fn name(&self) -> &str;

    /// Produces a handler bound to a fresh native peer. The returned handler
    /// must not be attached yet.
    fn create_control_handler(
        &self,
        control_id: ControlId,
        kind: ControlKind,
    ) -> PlatformResult<ControlHandler>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerState {
    Created,
    Attached,
    Detached,
}

/// Logical state pushed to a peer when a handler attaches, so recreated peers match the control.
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct PeerSync {
    pub visible: bool,
    pub enabled: bool,
    pub title: Option<String>,
    pub bounds: RectF,
}

/// Brushes the handler may need while painting.
#[derive(Debug, Clone, Default)]
pub(crate) struct PaintStyle {
    pub background: Option<Brush>,
    pub border_brush: Option<Brush>,
}

/// Decoration a handler of `kind` draws around its children. Known without a peer.
pub(crate) fn chrome_size(kind: ControlKind) -> SizeF {
    match kind {
        ControlKind::Border => SizeF::new(2.0, 2.0),
        _ => SizeF::default(),
    }
}

pub struct ControlHandler {
    kind: ControlKind,
    peer: Box<dyn NativePeer>,
    owner: Option<ControlId>,
    state: HandlerState,
    layout_suspend_depth: u32,
    layout_pending: bool,
    in_layout_pass: bool,
    update_suspend_depth: u32,
    invalidate_pending: bool,
    visual_children: Vec<ControlId>,
}

impl fmt::Debug for ControlHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlHandler")
            .field("kind", &self.kind)
            .field("peer", &self.peer.id())
            .field("owner", &self.owner)
            .field("state", &self.state)
            .field("layout_suspend_depth", &self.layout_suspend_depth)
            .field("update_suspend_depth", &self.update_suspend_depth)
            .field("visual_children", &self.visual_children)
            .finish()
    }
}

impl ControlHandler {
    pub fn new(kind: ControlKind, peer: Box<dyn NativePeer>) -> Self {
        Self {
            kind,
            peer,
            owner: None,
            state: HandlerState::Created,
            layout_suspend_depth: 0,
            layout_pending: false,
            in_layout_pass: false,
            update_suspend_depth: 0,
            invalidate_pending: false,
            visual_children: Vec::new(),
        }
    }

    pub fn kind(&self) -> ControlKind {
        self.kind
    }

    pub fn peer_id(&self) -> PeerId {
        self.peer.id()
    }

    pub fn owner(&self) -> Option<ControlId> {
        self.owner
    }

    pub fn state(&self) -> HandlerState {
        self.state
    }

    pub fn is_attached(&self) -> bool {
        self.state == HandlerState::Attached
    }

    pub fn layout_suspend_depth(&self) -> u32 {
        self.layout_suspend_depth
    }

    pub fn is_layout_suspended(&self) -> bool {
        self.layout_suspend_depth > 0
    }

    pub fn is_layout_pending(&self) -> bool {
        self.layout_pending
    }

    pub fn update_suspend_depth(&self) -> u32 {
        self.update_suspend_depth
    }

    pub fn is_painting_suspended(&self) -> bool {
        self.update_suspend_depth > 0
    }

    /// Extra controls the handler presents alongside the logical children.
    pub fn visual_children(&self) -> &[ControlId] {
        &self.visual_children
    }

    pub(crate) fn visual_children_mut(&mut self) -> &mut Vec<ControlId> {
        &mut self.visual_children
    }

    pub(crate) fn take_visual_children(&mut self) -> Vec<ControlId> {
        std::mem::take(&mut self.visual_children)
    }

    /*
     * Binds the handler to its owning control and brings the peer to life.
     * A handler attaches once: attaching a live or detached handler fails.
     */
    pub(crate) fn attach(&mut self, owner: ControlId, sync: &PeerSync) -> PlatformResult<()> {
        match self.state {
            HandlerState::Created => {}
            HandlerState::Attached => {
                return Err(PlatformError::InvalidOperation(format!(
                    "handler for peer {:?} is already attached to control {:?}",
                    self.peer.id(),
                    self.owner.map(|id| id.raw())
                )));
            }
            HandlerState::Detached => {
                return Err(PlatformError::InvalidOperation(format!(
                    "handler for peer {:?} was detached and cannot be reattached",
                    self.peer.id()
                )));
            }
        }

        self.peer.create()?;
        self.owner = Some(owner);
        self.state = HandlerState::Attached;

        self.peer.set_visible(sync.visible);
        self.peer.set_enabled(sync.enabled);
        if let Some(title) = &sync.title {
            self.peer.set_title(title);
        }
        self.peer.set_bounds(sync.bounds);

        log::debug!(
            "Handler: attached peer {:?} to control {}",
            self.peer.id(),
            owner.raw()
        );
        Ok(())
    }

    /// Destroys the peer and releases the owner. Terminal for this instance.
    pub(crate) fn detach(&mut self) -> PlatformResult<()> {
        if self.state != HandlerState::Attached {
            return Err(PlatformError::InvalidOperation(format!(
                "handler for peer {:?} is not attached",
                self.peer.id()
            )));
        }
        let owner = self.owner.take();
        self.peer.destroy();
        self.state = HandlerState::Detached;
        log::debug!(
            "Handler: detached peer {:?} from control {:?}",
            self.peer.id(),
            owner.map(|id| id.raw())
        );
        Ok(())
    }

    /*
     * Carries the suspension depths of a handler being replaced over to this
     * one, so suspend/resume regions opened before a recreation stay balanced.
     */
    pub(crate) fn inherit_suspension(&mut self, layout_depth: u32, update_depth: u32) {
        if layout_depth > 0 && self.layout_suspend_depth == 0 {
            self.peer.suspend_layout();
        }
        if update_depth > 0 && self.update_suspend_depth == 0 {
            self.peer.begin_update();
        }
        self.layout_suspend_depth = layout_depth;
        self.update_suspend_depth = update_depth;
        self.layout_pending = layout_depth > 0;
    }

    pub(crate) fn suspend_layout(&mut self) {
        self.layout_suspend_depth += 1;
        if self.layout_suspend_depth == 1 {
            self.peer.suspend_layout();
        }
    }

    /*
     * Decrements the layout depth. Returns whether the caller must run a
     * layout pass now: only when the depth reached zero and `perform_layout`
     * is set. A resume that does not lay out leaves a pending marker.
     */
    pub(crate) fn resume_layout(&mut self, perform_layout: bool) -> PlatformResult<bool> {
        if self.layout_suspend_depth == 0 {
            log::warn!("Handler: unbalanced resume_layout on peer {:?}", self.peer.id());
            return Err(PlatformError::InvalidOperation(format!(
                "resume_layout without matching suspend_layout on peer {:?}",
                self.peer.id()
            )));
        }
        self.layout_suspend_depth -= 1;
        if self.layout_suspend_depth > 0 {
            if perform_layout {
                self.layout_pending = true;
            }
            return Ok(false);
        }
        self.peer.resume_layout();
        if !perform_layout {
            self.layout_pending = true;
        }
        Ok(perform_layout)
    }

    /// Returns whether a layout pass may execute now; otherwise records it as pending.
    pub(crate) fn request_layout(&mut self) -> bool {
        if self.layout_suspend_depth > 0 || self.in_layout_pass {
            self.layout_pending = true;
            return false;
        }
        true
    }

    pub(crate) fn is_in_layout_pass(&self) -> bool {
        self.in_layout_pass
    }

    pub(crate) fn begin_layout_pass(&mut self) {
        self.in_layout_pass = true;
        self.layout_pending = false;
    }

    pub(crate) fn end_layout_pass(&mut self) {
        self.in_layout_pass = false;
        self.peer.layout();
    }

    pub(crate) fn begin_update(&mut self) {
        self.update_suspend_depth += 1;
        if self.update_suspend_depth == 1 {
            self.peer.begin_update();
        }
    }

    pub(crate) fn end_update(&mut self) -> PlatformResult<()> {
        if self.update_suspend_depth == 0 {
            log::warn!("Handler: unbalanced end_update on peer {:?}", self.peer.id());
            return Err(PlatformError::InvalidOperation(format!(
                "end_update without matching begin_update on peer {:?}",
                self.peer.id()
            )));
        }
        self.update_suspend_depth -= 1;
        if self.update_suspend_depth == 0 {
            self.peer.end_update();
            if self.invalidate_pending {
                self.invalidate_pending = false;
                self.peer.invalidate();
            }
        }
        Ok(())
    }

    /// Requests a redraw; deferred until `end_update` while painting is suspended.
    pub(crate) fn invalidate(&mut self) {
        if self.update_suspend_depth > 0 {
            self.invalidate_pending = true;
        } else {
            self.peer.invalidate();
        }
    }

    pub(crate) fn set_bounds(&mut self, bounds: RectF) {
        self.peer.set_bounds(bounds);
    }

    pub(crate) fn set_visible(&mut self, visible: bool) {
        self.peer.set_visible(visible);
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.peer.set_enabled(enabled);
    }

    pub(crate) fn set_title(&mut self, title: &str) {
        self.peer.set_title(title);
    }

    /// Native preferred size of the peer itself, ignoring children.
    pub(crate) fn native_preferred_size(&self, available: SizeF) -> SizeF {
        self.peer.preferred_size(available)
    }

    /// Size the handler's own decoration adds around the children.
    pub(crate) fn chrome_size(&self) -> SizeF {
        chrome_size(self.kind)
    }

    /// Area children are arranged in, given the control's client rectangle.
    pub(crate) fn children_layout_bounds(&self, client: RectF, padding: Thickness) -> RectF {
        let padded = client.deflate(padding.left, padding.top, padding.right, padding.bottom);
        match self.kind {
            ControlKind::Border => padded.deflate(1.0, 1.0, 1.0, 1.0),
            _ => padded,
        }
    }

    pub(crate) fn paint(&mut self, context: &mut dyn DrawingContext, client: RectF, style: &PaintStyle) {
        if self.kind == ControlKind::Border {
            if let Some(background) = &style.background {
                context.fill_rectangle(background, client);
            }
            if let Some(border) = &style.border_brush {
                context.draw_rectangle(border, client);
            }
        }
        self.peer.paint(context);
    }
}
