/*
 * The logical control tree. Every control lives in the tree's node map keyed
 * by its `ControlId`; a parent owns its ordered child list, and the child's
 * parent field is a plain id back-reference that never affects lifetime.
 * Insertion and removal update both sides inside one call, so no callback can
 * observe membership and parent disagreeing.
 *
 * This module holds the node data, the child collection, name lookup, and the
 * change-tracked property surface. Handler lifecycle and disposal live in
 * `lifecycle`, layout and paint gating in `layout_engine`, and event delivery
 * in `event_router`; all of them extend `ControlTree`.
 */

use crate::application::Application;
use crate::error::{PlatformError, Result as PlatformResult};
use crate::event_router::Subscription;
use crate::geometry::{RectF, SizeF};
use crate::handler::{ControlHandler, HandlerFactory, PeerSync};
use crate::hooks::ControlHooks;
use crate::native::PeerId;
use crate::styling_primitives::{Brush, FontDescription};
use crate::types::{
    ControlId, ControlKind, HorizontalAlignment, Property, Thickness, VerticalAlignment,
    WindowConfig,
};

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

pub(crate) struct ControlNode {
    pub kind: ControlKind,
    pub name: Option<String>,
    pub title: Option<String>,
    pub visible: bool,
    pub enabled: bool,
    pub size: SizeF,
    pub margin: Thickness,
    pub padding: Thickness,
    pub horizontal_alignment: HorizontalAlignment,
    pub vertical_alignment: VerticalAlignment,
    pub background: Option<Brush>,
    pub foreground: Option<Brush>,
    pub border_brush: Option<Brush>,
    pub font: Option<FontDescription>,
    // Actual rectangle assigned by the parent's layout pass, relative to the parent's client area.
    pub bounds: RectF,
    pub parent: Option<ControlId>,
    pub children: Vec<ControlId>,
    pub handler: Option<ControlHandler>,
    pub handler_factory: Option<Rc<dyn HandlerFactory>>,
    pub hooks: Option<Rc<dyn ControlHooks>>,
    pub subscriptions: Vec<Subscription>,
    pub disposing: bool,
    pub disposed: bool,
}

impl ControlNode {
    fn new(kind: ControlKind) -> Self {
        Self {
            kind,
            name: None,
            title: None,
            visible: true,
            enabled: true,
            size: SizeF::AUTO,
            margin: Thickness::default(),
            padding: Thickness::default(),
            horizontal_alignment: HorizontalAlignment::default(),
            vertical_alignment: VerticalAlignment::default(),
            background: None,
            foreground: None,
            border_brush: None,
            font: None,
            bounds: RectF::default(),
            parent: None,
            children: Vec::new(),
            handler: None,
            handler_factory: None,
            hooks: None,
            subscriptions: Vec::new(),
            disposing: false,
            disposed: false,
        }
    }

    /// What remains of a disposed control: its kind and the disposed mark.
    pub(crate) fn tombstone(kind: ControlKind) -> Self {
        Self {
            visible: false,
            enabled: false,
            disposed: true,
            ..Self::new(kind)
        }
    }

    pub(crate) fn peer_sync(&self) -> PeerSync {
        PeerSync {
            visible: self.visible,
            enabled: self.enabled,
            title: self.title.clone(),
            bounds: self.bounds,
        }
    }

    /// Logical children followed by the handler's visual children.
    pub(crate) fn all_children(&self) -> Vec<ControlId> {
        let mut all = self.children.clone();
        if let Some(handler) = &self.handler {
            all.extend_from_slice(handler.visual_children());
        }
        all
    }
}

#[derive(Default)]
pub struct ControlTree {
    pub(crate) nodes: HashMap<ControlId, ControlNode>,
    // Stable association from a live native peer back to its owning control.
    pub(crate) peer_owners: HashMap<PeerId, ControlId>,
    pub(crate) next_subscription: u64,
}

impl fmt::Debug for ControlTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlTree")
            .field("controls", &self.nodes.len())
            .field("live_peers", &self.peer_owners.len())
            .finish()
    }
}

impl ControlTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_control(&mut self, kind: ControlKind) -> ControlId {
        let id = ControlId::generate();
        self.nodes.insert(id, ControlNode::new(kind));
        log::debug!("ControlTree: created control {} ({kind:?})", id.raw());
        id
    }

    /*
     * Creates a top-level window control and registers it with the current
     * application, if one is set, so visual theme changes reach it.
     */
    pub fn create_window(&mut self, config: WindowConfig) -> ControlId {
        let id = self.create_control(ControlKind::Window);
        if let Some(node) = self.nodes.get_mut(&id) {
            node.title = Some(config.title);
            node.size = SizeF::new(config.width, config.height);
            if !node.size.is_width_auto() && !node.size.is_height_auto() {
                node.bounds = RectF::from_size(node.size);
            }
        }
        match Application::try_current() {
            Some(app) => app.register_window(id),
            None => log::debug!(
                "ControlTree: window {} created without a current application",
                id.raw()
            ),
        }
        id
    }

    pub fn contains(&self, id: ControlId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub(crate) fn node(&self, id: ControlId) -> PlatformResult<&ControlNode> {
        self.nodes
            .get(&id)
            .ok_or_else(|| PlatformError::unknown_control(id))
    }

    pub(crate) fn live_node(&self, id: ControlId) -> PlatformResult<&ControlNode> {
        let node = self.node(id)?;
        if node.disposed {
            return Err(PlatformError::disposed(id));
        }
        Ok(node)
    }

    pub(crate) fn live_node_mut(&mut self, id: ControlId) -> PlatformResult<&mut ControlNode> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or_else(|| PlatformError::unknown_control(id))?;
        if node.disposed {
            return Err(PlatformError::disposed(id));
        }
        Ok(node)
    }

    pub fn is_disposed(&self, id: ControlId) -> PlatformResult<bool> {
        Ok(self.node(id)?.disposed)
    }

    pub fn kind(&self, id: ControlId) -> PlatformResult<ControlKind> {
        Ok(self.node(id)?.kind)
    }

    pub fn set_hooks(&mut self, id: ControlId, hooks: Rc<dyn ControlHooks>) -> PlatformResult<()> {
        self.live_node_mut(id)?.hooks = Some(hooks);
        Ok(())
    }

    /// Overrides the visual theme's factory for this control and, unless they override it themselves, its descendants.
    pub fn set_handler_factory(
        &mut self,
        id: ControlId,
        factory: Option<Rc<dyn HandlerFactory>>,
    ) -> PlatformResult<()> {
        self.live_node_mut(id)?.handler_factory = factory;
        Ok(())
    }

    /*
     * Calls `f` with the control's hooks while the tree stays mutably
     * borrowable. The hooks are shared out of the node rather than moved, so
     * a change the hook makes to the same control reaches the same hooks.
     */
    pub(crate) fn with_hooks<R>(
        &mut self,
        id: ControlId,
        f: impl FnOnce(&dyn ControlHooks, &mut ControlTree) -> R,
    ) -> Option<R> {
        let hooks = self.nodes.get(&id)?.hooks.clone()?;
        Some(f(hooks.as_ref(), self))
    }

    // ---- Composition -------------------------------------------------------

    pub fn parent(&self, id: ControlId) -> PlatformResult<Option<ControlId>> {
        Ok(self.node(id)?.parent)
    }

    pub fn children(&self, id: ControlId) -> PlatformResult<&[ControlId]> {
        Ok(&self.node(id)?.children)
    }

    /// Logical children followed by any visual children the handler synthesized.
    pub fn all_children(&self, id: ControlId) -> PlatformResult<Vec<ControlId>> {
        Ok(self.node(id)?.all_children())
    }

    pub fn add_child(&mut self, parent: ControlId, child: ControlId) -> PlatformResult<()> {
        let index = self.live_node(parent)?.children.len();
        self.insert_child(parent, index, child)
    }

    pub fn insert_child(
        &mut self,
        parent: ControlId,
        index: usize,
        child: ControlId,
    ) -> PlatformResult<()> {
        self.validate_new_child(parent, child)?;
        let count = self.live_node(parent)?.children.len();
        if index > count {
            return Err(PlatformError::InvalidOperation(format!(
                "insert index {index} out of range for control {} with {count} children",
                parent.raw()
            )));
        }

        self.live_node_mut(parent)?.children.insert(index, child);
        self.live_node_mut(child)?.parent = Some(parent);
        log::debug!(
            "ControlTree: inserted control {} into {} at {index}",
            child.raw(),
            parent.raw()
        );

        self.request_layout_if_bound(parent)
    }

    /*
     * Checks that `child` can join `parent`: both alive, the child currently
     * unparented, and the child not an ancestor of (or equal to) the parent.
     */
    fn validate_new_child(&self, parent: ControlId, child: ControlId) -> PlatformResult<()> {
        self.live_node(parent)?;
        let child_node = self.live_node(child)?;
        if let Some(existing) = child_node.parent {
            return Err(PlatformError::InvalidOperation(format!(
                "control {} already belongs to control {}",
                child.raw(),
                existing.raw()
            )));
        }
        let mut cursor = Some(parent);
        while let Some(current) = cursor {
            if current == child {
                return Err(PlatformError::InvalidOperation(format!(
                    "adding control {} under {} would create a cycle",
                    child.raw(),
                    parent.raw()
                )));
            }
            cursor = self.node(current)?.parent;
        }
        Ok(())
    }

    /// Removes `child` from the logical children. Returns `false` when it was not a child.
    pub fn remove_child(&mut self, parent: ControlId, child: ControlId) -> PlatformResult<bool> {
        let Some(index) = self
            .live_node(parent)?
            .children
            .iter()
            .position(|c| *c == child)
        else {
            return Ok(false);
        };
        self.remove_child_at(parent, index)?;
        Ok(true)
    }

    pub fn remove_child_at(&mut self, parent: ControlId, index: usize) -> PlatformResult<ControlId> {
        let node = self.live_node_mut(parent)?;
        if index >= node.children.len() {
            return Err(PlatformError::InvalidOperation(format!(
                "remove index {index} out of range for control {} with {} children",
                parent.raw(),
                node.children.len()
            )));
        }
        let child = node.children.remove(index);
        if let Some(child_node) = self.nodes.get_mut(&child) {
            child_node.parent = None;
        }
        log::debug!(
            "ControlTree: removed control {} from {}",
            child.raw(),
            parent.raw()
        );
        self.request_layout_if_bound(parent)?;
        Ok(child)
    }

    pub fn clear_children(&mut self, parent: ControlId) -> PlatformResult<()> {
        self.detach_logical_children(parent)?;
        self.request_layout_if_bound(parent)
    }

    /// Empties the child list and clears every back-reference without requesting layout.
    pub(crate) fn detach_logical_children(&mut self, parent: ControlId) -> PlatformResult<Vec<ControlId>> {
        let children = std::mem::take(&mut self.live_node_mut(parent)?.children);
        for child in &children {
            if let Some(child_node) = self.nodes.get_mut(child) {
                child_node.parent = None;
            }
        }
        Ok(children)
    }

    /// Empties the handler's visual-children view under the same contract as the logical collection.
    pub(crate) fn detach_visual_children(&mut self, owner: ControlId) -> PlatformResult<Vec<ControlId>> {
        let visual = match self.live_node_mut(owner)?.handler.as_mut() {
            Some(handler) => handler.take_visual_children(),
            None => Vec::new(),
        };
        for child in &visual {
            if let Some(child_node) = self.nodes.get_mut(child) {
                child_node.parent = None;
            }
        }
        Ok(visual)
    }

    /*
     * Adds a control to the handler-level visual children. Visual children
     * belong to the current handler: they are parented to the owner like
     * logical children but are disposed when that handler is detached.
     */
    pub fn add_visual_child(&mut self, owner: ControlId, child: ControlId) -> PlatformResult<()> {
        self.validate_new_child(owner, child)?;
        self.ensure_handler_created(owner)?;
        if let Some(handler) = self.live_node_mut(owner)?.handler.as_mut() {
            handler.visual_children_mut().push(child);
        }
        self.live_node_mut(child)?.parent = Some(owner);
        log::debug!(
            "ControlTree: added visual child {} to {}",
            child.raw(),
            owner.raw()
        );
        self.request_layout_if_bound(owner)
    }

    pub fn remove_visual_child(&mut self, owner: ControlId, child: ControlId) -> PlatformResult<bool> {
        let removed = match self.live_node_mut(owner)?.handler.as_mut() {
            Some(handler) => {
                let visual = handler.visual_children_mut();
                match visual.iter().position(|c| *c == child) {
                    Some(index) => {
                        visual.remove(index);
                        true
                    }
                    None => false,
                }
            }
            None => false,
        };
        if removed {
            if let Some(child_node) = self.nodes.get_mut(&child) {
                child_node.parent = None;
            }
            self.request_layout_if_bound(owner)?;
        }
        Ok(removed)
    }

    // ---- Lookup ------------------------------------------------------------

    /*
     * Depth-first pre-order search of the logical subtree: the control itself
     * first, then each child's subtree in collection order. First match wins.
     */
    /// Depth-first, pre-order search of `id` and its logical descendants.
    pub fn try_find_control(&self, id: ControlId, name: &str) -> PlatformResult<Option<ControlId>> {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = self.node(current)?;
            if node.name.as_deref() == Some(name) {
                return Ok(Some(current));
            }
            stack.extend(node.children.iter().rev().copied());
        }
        Ok(None)
    }

    pub fn find_control(&self, id: ControlId, name: &str) -> PlatformResult<ControlId> {
        self.try_find_control(id, name)?.ok_or_else(|| {
            PlatformError::NotFound(format!(
                "control with name '{name}' was not found under control {}",
                id.raw()
            ))
        })
    }

    // ---- Property surface --------------------------------------------------

    pub fn name(&self, id: ControlId) -> PlatformResult<Option<&str>> {
        Ok(self.node(id)?.name.as_deref())
    }

    pub fn set_name(&mut self, id: ControlId, name: Option<String>) -> PlatformResult<()> {
        self.live_node_mut(id)?.name = name;
        Ok(())
    }

    pub fn title(&self, id: ControlId) -> PlatformResult<Option<&str>> {
        Ok(self.node(id)?.title.as_deref())
    }

    /// Window caption. Only windows carry a title.
    pub fn set_title(&mut self, id: ControlId, title: impl Into<String>) -> PlatformResult<()> {
        if !self.live_node(id)?.kind.is_window() {
            return Err(PlatformError::InvalidOperation(format!(
                "control {} is not a window and has no title",
                id.raw()
            )));
        }
        let title = Some(title.into());
        self.update_property(id, Property::Title, title, |node| &mut node.title)
    }

    pub fn visible(&self, id: ControlId) -> PlatformResult<bool> {
        Ok(self.node(id)?.visible)
    }

    pub fn set_visible(&mut self, id: ControlId, visible: bool) -> PlatformResult<()> {
        self.update_property(id, Property::Visible, visible, |node| &mut node.visible)
    }

    pub fn show(&mut self, id: ControlId) -> PlatformResult<()> {
        self.set_visible(id, true)
    }

    pub fn hide(&mut self, id: ControlId) -> PlatformResult<()> {
        self.set_visible(id, false)
    }

    pub fn enabled(&self, id: ControlId) -> PlatformResult<bool> {
        Ok(self.node(id)?.enabled)
    }

    pub fn set_enabled(&mut self, id: ControlId, enabled: bool) -> PlatformResult<()> {
        self.update_property(id, Property::Enabled, enabled, |node| &mut node.enabled)
    }

    pub fn margin(&self, id: ControlId) -> PlatformResult<Thickness> {
        Ok(self.node(id)?.margin)
    }

    pub fn set_margin(&mut self, id: ControlId, margin: Thickness) -> PlatformResult<()> {
        self.update_property(id, Property::Margin, margin, |node| &mut node.margin)
    }

    pub fn padding(&self, id: ControlId) -> PlatformResult<Thickness> {
        Ok(self.node(id)?.padding)
    }

    pub fn set_padding(&mut self, id: ControlId, padding: Thickness) -> PlatformResult<()> {
        self.update_property(id, Property::Padding, padding, |node| &mut node.padding)
    }

    pub fn background(&self, id: ControlId) -> PlatformResult<Option<&Brush>> {
        Ok(self.node(id)?.background.as_ref())
    }

    pub fn set_background(&mut self, id: ControlId, brush: Option<Brush>) -> PlatformResult<()> {
        self.update_property(id, Property::Background, brush, |node| &mut node.background)
    }

    pub fn foreground(&self, id: ControlId) -> PlatformResult<Option<&Brush>> {
        Ok(self.node(id)?.foreground.as_ref())
    }

    pub fn set_foreground(&mut self, id: ControlId, brush: Option<Brush>) -> PlatformResult<()> {
        self.update_property(id, Property::Foreground, brush, |node| &mut node.foreground)
    }

    pub fn border_brush(&self, id: ControlId) -> PlatformResult<Option<&Brush>> {
        Ok(self.node(id)?.border_brush.as_ref())
    }

    pub fn set_border_brush(&mut self, id: ControlId, brush: Option<Brush>) -> PlatformResult<()> {
        self.update_property(id, Property::BorderBrush, brush, |node| {
            &mut node.border_brush
        })
    }

    pub fn font(&self, id: ControlId) -> PlatformResult<Option<&FontDescription>> {
        Ok(self.node(id)?.font.as_ref())
    }

    pub fn set_font(&mut self, id: ControlId, font: Option<FontDescription>) -> PlatformResult<()> {
        self.update_property(id, Property::Font, font, |node| &mut node.font)
    }

    pub fn horizontal_alignment(&self, id: ControlId) -> PlatformResult<HorizontalAlignment> {
        Ok(self.node(id)?.horizontal_alignment)
    }

    pub fn set_horizontal_alignment(
        &mut self,
        id: ControlId,
        alignment: HorizontalAlignment,
    ) -> PlatformResult<()> {
        self.update_property(id, Property::HorizontalAlignment, alignment, |node| {
            &mut node.horizontal_alignment
        })
    }

    pub fn vertical_alignment(&self, id: ControlId) -> PlatformResult<VerticalAlignment> {
        Ok(self.node(id)?.vertical_alignment)
    }

    pub fn set_vertical_alignment(
        &mut self,
        id: ControlId,
        alignment: VerticalAlignment,
    ) -> PlatformResult<()> {
        self.update_property(id, Property::VerticalAlignment, alignment, |node| {
            &mut node.vertical_alignment
        })
    }

    /// Suggested size; `NaN` on an axis means auto.
    pub fn size(&self, id: ControlId) -> PlatformResult<SizeF> {
        Ok(self.node(id)?.size)
    }

    pub fn set_size(&mut self, id: ControlId, size: SizeF) -> PlatformResult<()> {
        let node = self.live_node_mut(id)?;
        if node.size.same_as(&size) {
            return Ok(());
        }
        node.size = size;
        // A top-level control has nobody to arrange it, so a fixed size is its bounds.
        if node.parent.is_none() && !size.is_width_auto() && !size.is_height_auto() {
            let bounds = RectF::new(node.bounds.x, node.bounds.y, size.width, size.height);
            node.bounds = bounds;
            if let Some(handler) = node.handler.as_mut() {
                handler.set_bounds(bounds);
            }
        }
        let parent = node.parent;
        match parent {
            Some(parent) => self.request_layout_if_bound(parent),
            None => self.request_layout_if_bound(id),
        }
    }

    pub fn set_width(&mut self, id: ControlId, width: f32) -> PlatformResult<()> {
        let height = self.node(id)?.size.height;
        self.set_size(id, SizeF::new(width, height))
    }

    pub fn set_height(&mut self, id: ControlId, height: f32) -> PlatformResult<()> {
        let width = self.node(id)?.size.width;
        self.set_size(id, SizeF::new(width, height))
    }

    /// Actual rectangle assigned by layout, relative to the parent's client area.
    pub fn bounds(&self, id: ControlId) -> PlatformResult<RectF> {
        Ok(self.node(id)?.bounds)
    }

    /// Places a control directly; intended for top-level windows sized by the host.
    pub fn set_bounds(&mut self, id: ControlId, bounds: RectF) -> PlatformResult<()> {
        let node = self.live_node_mut(id)?;
        if node.bounds == bounds {
            return Ok(());
        }
        node.bounds = bounds;
        if let Some(handler) = node.handler.as_mut() {
            handler.set_bounds(bounds);
        }
        self.request_layout_if_bound(id)
    }

    /*
     * Shared setter path: validate, compare by value, store, then fire the
     * hook and the public event in that order. Native-side state is pushed as
     * part of the store; layout and repaint requests follow the event.
     */
    fn update_property<T, F>(
        &mut self,
        id: ControlId,
        property: Property,
        value: T,
        field: F,
    ) -> PlatformResult<()>
    where
        T: PartialEq,
        F: FnOnce(&mut ControlNode) -> &mut T,
    {
        let node = self.live_node_mut(id)?;
        let slot = field(node);
        if *slot == value {
            return Ok(());
        }
        *slot = value;
        self.sync_peer_property(id, property);
        log::debug!(
            "ControlTree: control {} property {property:?} changed",
            id.raw()
        );

        self.with_hooks(id, |hooks, tree| hooks.on_property_changed(tree, id, property));
        self.raise_changed(id, property)?;
        self.after_property_changed(id, property)
    }

    fn sync_peer_property(&mut self, id: ControlId, property: Property) {
        let Some(node) = self.nodes.get_mut(&id) else {
            return;
        };
        let (visible, enabled) = (node.visible, node.enabled);
        let title = node.title.clone();
        let Some(handler) = node.handler.as_mut() else {
            return;
        };
        match property {
            Property::Visible => handler.set_visible(visible),
            Property::Enabled => handler.set_enabled(enabled),
            Property::Title => handler.set_title(title.as_deref().unwrap_or_default()),
            _ => {}
        }
    }

    fn after_property_changed(&mut self, id: ControlId, property: Property) -> PlatformResult<()> {
        let Some(node) = self.nodes.get(&id) else {
            return Ok(());
        };
        if node.disposed {
            return Ok(());
        }
        let parent = node.parent;
        if property.affects_parent_layout()
            && let Some(parent) = parent
        {
            self.request_layout_if_bound(parent)?;
        }
        match property {
            Property::Padding => self.request_layout_if_bound(id),
            Property::Background
            | Property::Foreground
            | Property::BorderBrush
            | Property::Font => self.invalidate_if_bound(id),
            _ => Ok(()),
        }
    }

    fn invalidate_if_bound(&mut self, id: ControlId) -> PlatformResult<()> {
        if let Some(handler) = self.live_node_mut(id)?.handler.as_mut() {
            handler.invalidate();
        }
        Ok(())
    }

    /// Lays out `id` if, and only if, it already has a handler; never forces handler creation.
    pub(crate) fn request_layout_if_bound(&mut self, id: ControlId) -> PlatformResult<()> {
        let bound = self
            .nodes
            .get(&id)
            .is_some_and(|node| !node.disposed && node.handler.is_some());
        if bound {
            self.perform_layout(id)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_router::EventArgs;
    use crate::types::EventKind;
    use crate::test_support::{RecordingHooks, bound_tree, deep_chain};

    use std::cell::RefCell;

    #[test]
    fn children_track_parent_on_insert_and_remove() {
        let mut tree = ControlTree::new();
        let root = tree.create_control(ControlKind::Panel);
        let a = tree.create_control(ControlKind::Control);
        let b = tree.create_control(ControlKind::Control);
        let c = tree.create_control(ControlKind::Control);
        for child in [a, b, c] {
            tree.add_child(root, child).unwrap();
        }
        for child in [a, b, c] {
            assert_eq!(tree.parent(child).unwrap(), Some(root));
        }

        assert!(tree.remove_child(root, b).unwrap());
        assert_eq!(tree.parent(b).unwrap(), None);
        assert_eq!(tree.children(root).unwrap(), &[a, c]);
        assert!(!tree.remove_child(root, b).unwrap());
    }

    #[test]
    fn insert_child_respects_position() {
        let mut tree = ControlTree::new();
        let root = tree.create_control(ControlKind::Panel);
        let a = tree.create_control(ControlKind::Control);
        let b = tree.create_control(ControlKind::Control);
        tree.add_child(root, a).unwrap();
        tree.insert_child(root, 0, b).unwrap();
        assert_eq!(tree.children(root).unwrap(), &[b, a]);

        let c = tree.create_control(ControlKind::Control);
        assert!(matches!(
            tree.insert_child(root, 5, c),
            Err(PlatformError::InvalidOperation(_))
        ));
        assert_eq!(tree.parent(c).unwrap(), None);
    }

    #[test]
    fn a_control_cannot_join_two_parents_or_form_a_cycle() {
        let mut tree = ControlTree::new();
        let root = tree.create_control(ControlKind::Panel);
        let other = tree.create_control(ControlKind::Panel);
        let child = tree.create_control(ControlKind::Panel);
        tree.add_child(root, child).unwrap();

        assert!(tree.add_child(other, child).is_err());
        assert!(tree.add_child(child, root).is_err());
        assert!(tree.add_child(root, root).is_err());
        assert_eq!(tree.children(other).unwrap(), &[] as &[ControlId]);
    }

    #[test]
    fn clear_children_detaches_every_back_reference() {
        let mut tree = ControlTree::new();
        let root = tree.create_control(ControlKind::Panel);
        let a = tree.create_control(ControlKind::Control);
        let b = tree.create_control(ControlKind::Control);
        tree.add_child(root, a).unwrap();
        tree.add_child(root, b).unwrap();
        tree.clear_children(root).unwrap();

        assert!(tree.children(root).unwrap().is_empty());
        assert_eq!(tree.parent(a).unwrap(), None);
        assert_eq!(tree.parent(b).unwrap(), None);
    }

    #[test]
    fn find_control_searches_grandchildren() {
        let mut tree = ControlTree::new();
        let root = tree.create_control(ControlKind::Panel);
        let child = tree.create_control(ControlKind::Panel);
        let grandchild = tree.create_control(ControlKind::Control);
        tree.add_child(root, child).unwrap();
        tree.add_child(child, grandchild).unwrap();
        tree.set_name(grandchild, Some("x".into())).unwrap();

        assert_eq!(tree.find_control(root, "x").unwrap(), grandchild);
        assert_eq!(tree.try_find_control(root, "missing").unwrap(), None);
        assert!(matches!(
            tree.find_control(root, "missing"),
            Err(PlatformError::NotFound(_))
        ));
    }

    #[test]
    fn find_control_prefers_self_then_child_order() {
        let mut tree = ControlTree::new();
        let root = tree.create_control(ControlKind::Panel);
        let first = tree.create_control(ControlKind::Panel);
        let first_child = tree.create_control(ControlKind::Control);
        let second = tree.create_control(ControlKind::Control);
        tree.add_child(root, first).unwrap();
        tree.add_child(first, first_child).unwrap();
        tree.add_child(root, second).unwrap();
        tree.set_name(first_child, Some("dup".into())).unwrap();
        tree.set_name(second, Some("dup".into())).unwrap();

        assert_eq!(tree.find_control(root, "dup").unwrap(), first_child);

        tree.set_name(root, Some("dup".into())).unwrap();
        assert_eq!(tree.find_control(root, "dup").unwrap(), root);
    }

    #[test]
    fn find_control_reaches_the_bottom_of_a_deep_chain() {
        let mut tree = ControlTree::new();
        let (top, leaf) = deep_chain(&mut tree, 30_000);
        tree.set_name(leaf, Some("leaf".into())).unwrap();

        assert_eq!(tree.find_control(top, "leaf").unwrap(), leaf);
        assert_eq!(tree.try_find_control(top, "missing").unwrap(), None);
    }

    #[test]
    fn setting_equal_value_raises_nothing() {
        let mut tree = ControlTree::new();
        let id = tree.create_control(ControlKind::Control);
        let (hooks, log) = RecordingHooks::new("c");
        tree.set_hooks(id, Rc::new(hooks)).unwrap();
        let events = Rc::new(RefCell::new(0));
        let counter = events.clone();
        tree.subscribe(
            id,
            EventKind::Changed(Property::Margin),
            move |_tree: &mut ControlTree, _id, _args: &mut EventArgs<'_>| {
                *counter.borrow_mut() += 1;
            },
        )
        .unwrap();

        tree.set_margin(id, Thickness::default()).unwrap();
        assert!(log.borrow().is_empty());
        assert_eq!(*events.borrow(), 0);

        tree.set_margin(id, Thickness::uniform(4.0)).unwrap();
        assert_eq!(log.borrow().as_slice(), ["c:changed:Margin"]);
        assert_eq!(*events.borrow(), 1);
        assert_eq!(tree.margin(id).unwrap(), Thickness::uniform(4.0));
    }

    #[test]
    fn hook_runs_after_store_and_before_public_event() {
        struct OrderCheck(Rc<RefCell<Vec<String>>>);
        impl ControlHooks for OrderCheck {
            fn on_property_changed(&self, tree: &mut ControlTree, id: ControlId, _p: Property) {
                let visible = tree.visible(id).unwrap();
                self.0.borrow_mut().push(format!("hook visible={visible}"));
            }
        }

        let mut tree = ControlTree::new();
        let id = tree.create_control(ControlKind::Control);
        let order = Rc::new(RefCell::new(Vec::new()));
        tree.set_hooks(id, Rc::new(OrderCheck(order.clone()))).unwrap();
        let sink = order.clone();
        tree.subscribe(
            id,
            EventKind::Changed(Property::Visible),
            move |_tree: &mut ControlTree, _id, _args: &mut EventArgs<'_>| {
                sink.borrow_mut().push("event".to_string());
            },
        )
        .unwrap();

        tree.hide(id).unwrap();
        assert_eq!(order.borrow().as_slice(), ["hook visible=false", "event"]);
        tree.hide(id).unwrap();
        assert_eq!(order.borrow().len(), 2);
        tree.show(id).unwrap();
        assert!(tree.visible(id).unwrap());
    }

    #[test]
    fn change_made_inside_a_hook_reaches_the_same_hooks() {
        struct Cascade(Rc<RefCell<Vec<Property>>>);
        impl ControlHooks for Cascade {
            fn on_property_changed(&self, tree: &mut ControlTree, id: ControlId, property: Property) {
                self.0.borrow_mut().push(property);
                if property == Property::Visible {
                    tree.set_enabled(id, false).unwrap();
                }
            }
        }

        let mut tree = ControlTree::new();
        let id = tree.create_control(ControlKind::Control);
        let seen = Rc::new(RefCell::new(Vec::new()));
        tree.set_hooks(id, Rc::new(Cascade(seen.clone()))).unwrap();
        let events = Rc::new(RefCell::new(Vec::new()));
        for property in [Property::Visible, Property::Enabled] {
            let sink = events.clone();
            tree.subscribe(
                id,
                EventKind::Changed(property),
                move |_tree: &mut ControlTree, _id, _args: &mut EventArgs<'_>| {
                    sink.borrow_mut().push(property);
                },
            )
            .unwrap();
        }

        tree.hide(id).unwrap();
        assert!(!tree.enabled(id).unwrap());
        assert_eq!(seen.borrow().as_slice(), [Property::Visible, Property::Enabled]);
        assert_eq!(events.borrow().as_slice(), [Property::Enabled, Property::Visible]);
    }

    #[test]
    fn setters_do_not_create_handlers() {
        let mut tree = ControlTree::new();
        let id = tree.create_control(ControlKind::Control);
        tree.set_enabled(id, false).unwrap();
        tree.set_padding(id, Thickness::uniform(1.0)).unwrap();
        tree.set_width(id, 30.0).unwrap();
        assert!(!tree.is_handler_created(id).unwrap());
        assert_eq!(tree.size(id).unwrap().width, 30.0);
        assert!(tree.size(id).unwrap().is_height_auto());
    }

    #[test]
    fn visibility_change_reaches_the_bound_peer() {
        let (mut tree, journal, root) = bound_tree(ControlKind::Panel);
        tree.ensure_handler_created(root).unwrap();
        let peer = tree.handler(root).unwrap().peer_id();
        journal.clear_calls();

        tree.hide(root).unwrap();
        assert_eq!(
            journal.count(peer, &crate::headless::PeerCall::SetVisible(false)),
            1
        );
    }

    #[test]
    fn only_windows_take_a_title() {
        let (mut tree, journal, window) = crate::test_support::bound_window();
        let peer = tree.handler(window).unwrap().peer_id();
        tree.set_title(window, "Renamed").unwrap();
        assert_eq!(tree.title(window).unwrap(), Some("Renamed"));
        assert_eq!(
            journal.count(peer, &crate::headless::PeerCall::SetTitle("Renamed".into())),
            1
        );

        let panel = tree.create_control(ControlKind::Panel);
        assert!(matches!(
            tree.set_title(panel, "x"),
            Err(PlatformError::InvalidOperation(_))
        ));
    }

    #[test]
    fn unknown_control_is_an_invalid_handle() {
        let tree = ControlTree::new();
        assert!(matches!(
            tree.visible(ControlId::new(u64::MAX)),
            Err(PlatformError::InvalidHandle(_))
        ));
    }
}
