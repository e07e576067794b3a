/*
 * Layout and paint gating for controls in a `ControlTree`.
 *
 * Layout suspension is reference counted on the handler, so independent call
 * sites can nest suspend/resume regions; a pass only runs when the depth is
 * zero and nothing else is already laying out the same control. The pass
 * itself gathers the visible children, asks the pure functions in `layout`
 * for rectangles, pushes them to the peers, and then lays out each child
 * under that child's own suspension depth.
 *
 * `begin_update`/`end_update` gate painting with an independent counter.
 */

use crate::control_tree::ControlTree;
use crate::drawing::DrawingContext;
use crate::error::{PlatformError, Result as PlatformResult};
use crate::event_router::EventArgs;
use crate::geometry::{RectF, SizeF};
use crate::handler::{PaintStyle, chrome_size};
use crate::layout::{self, LayoutChild};
use crate::types::{ControlId, ControlKind, EventKind};

impl ControlTree {
    pub fn suspend_layout(&mut self, id: ControlId) -> PlatformResult<()> {
        self.ensure_handler_created(id)?;
        if let Some(handler) = self.live_node_mut(id)?.handler.as_mut() {
            handler.suspend_layout();
            log::debug!(
                "Layout: control {} suspended (depth {})",
                id.raw(),
                handler.layout_suspend_depth()
            );
        }
        Ok(())
    }

    /*
     * Releases one suspension level. When the depth reaches zero a pass runs
     * right away if `perform_layout` is set; otherwise the work stays pending
     * until the next `perform_layout` or resume that asks for it.
     */
    pub fn resume_layout(&mut self, id: ControlId, perform_layout: bool) -> PlatformResult<()> {
        let Some(handler) = self.live_node_mut(id)?.handler.as_mut() else {
            log::warn!("Layout: resume_layout on unbound control {}", id.raw());
            return Err(PlatformError::InvalidOperation(format!(
                "resume_layout on control {} which was never suspended",
                id.raw()
            )));
        };
        if handler.resume_layout(perform_layout)? {
            self.run_layout_pass(id)?;
        }
        Ok(())
    }

    pub fn layout_suspend_depth(&self, id: ControlId) -> PlatformResult<u32> {
        Ok(self
            .node(id)?
            .handler
            .as_ref()
            .map_or(0, |h| h.layout_suspend_depth()))
    }

    pub fn is_layout_suspended(&self, id: ControlId) -> PlatformResult<bool> {
        Ok(self.layout_suspend_depth(id)? > 0)
    }

    pub fn is_layout_pending(&self, id: ControlId) -> PlatformResult<bool> {
        Ok(self
            .node(id)?
            .handler
            .as_ref()
            .is_some_and(|h| h.is_layout_pending()))
    }

    /// Initialization bracket: layout stays suspended until `end_init`.
    pub fn begin_init(&mut self, id: ControlId) -> PlatformResult<()> {
        self.suspend_layout(id)
    }

    pub fn end_init(&mut self, id: ControlId) -> PlatformResult<()> {
        self.resume_layout(id, true)
    }

    /// Lays out the control's children now, or marks the request pending while suspended.
    pub fn perform_layout(&mut self, id: ControlId) -> PlatformResult<()> {
        self.ensure_handler_created(id)?;
        let Some(handler) = self.live_node_mut(id)?.handler.as_mut() else {
            return Ok(());
        };
        let reentrant = handler.is_in_layout_pass();
        if handler.request_layout() {
            return self.run_layout_pass(id);
        }
        if reentrant {
            log::warn!("Layout: control {} requested layout during its own pass", id.raw());
        } else {
            log::debug!("Layout: control {} layout deferred while suspended", id.raw());
        }
        Ok(())
    }

    fn run_layout_pass(&mut self, id: ControlId) -> PlatformResult<()> {
        if let Some(handler) = self.live_node_mut(id)?.handler.as_mut() {
            handler.begin_layout_pass();
        }

        let handled = self
            .with_hooks(id, |hooks, tree| hooks.on_layout(tree, id))
            .unwrap_or(false);
        let result = if handled { Ok(()) } else { self.arrange_children(id) };

        // The pass may have disposed or detached the control.
        if let Some(handler) = self
            .nodes
            .get_mut(&id)
            .filter(|node| !node.disposed)
            .and_then(|node| node.handler.as_mut())
        {
            handler.end_layout_pass();
        }
        result
    }

    fn arrange_children(&mut self, id: ControlId) -> PlatformResult<()> {
        let node = self.live_node(id)?;
        let kind = node.kind;
        let client = RectF::from_size(node.bounds.size());
        let Some(handler) = node.handler.as_ref() else {
            return Ok(());
        };
        let area = handler.children_layout_bounds(client, node.padding);
        let candidates = node.all_children();

        let mut visible = Vec::with_capacity(candidates.len());
        for child in candidates {
            if self.nodes.get(&child).is_some_and(|n| n.visible && !n.disposed) {
                self.ensure_handler_created(child)?;
                visible.push(child);
            }
        }

        let children = self.layout_children(&visible, area.size())?;
        let placements = match kind {
            ControlKind::StackPanel { orientation } => {
                layout::arrange_stacked(area, orientation, &children)
            }
            _ => layout::arrange_aligned(area, &children),
        };
        log::debug!(
            "Layout: control {} arranged {} children in {area:?}",
            id.raw(),
            placements.len()
        );

        for (child, bounds) in placements {
            let Ok(child_node) = self.live_node_mut(child) else {
                continue;
            };
            child_node.bounds = bounds;
            if let Some(handler) = child_node.handler.as_mut() {
                handler.set_bounds(bounds);
            }
            self.perform_layout(child)?;
        }
        Ok(())
    }

    fn layout_children(&self, ids: &[ControlId], available: SizeF) -> PlatformResult<Vec<LayoutChild>> {
        ids.iter()
            .map(|&child| {
                let node = self.node(child)?;
                let inner = SizeF::new(
                    (available.width - node.margin.horizontal()).max(0.0),
                    (available.height - node.margin.vertical()).max(0.0),
                );
                Ok(LayoutChild {
                    id: child,
                    preferred: self.preferred_size(child, inner)?,
                    suggested: node.size,
                    margin: node.margin,
                    horizontal: node.horizontal_alignment,
                    vertical: node.vertical_alignment,
                })
            })
            .collect()
    }

    /*
     * Size the control would like within `available`, excluding its margin.
     * Explicit width or height wins per axis; auto axes take the larger of the
     * peer's own preferred size and what the visible children need plus
     * padding and decoration. Pure query: never binds or lays out anything.
     */
    pub fn preferred_size(&self, id: ControlId, available: SizeF) -> PlatformResult<SizeF> {
        let node = self.node(id)?;
        let suggested = node.size;
        if !suggested.is_width_auto() && !suggested.is_height_auto() {
            return Ok(suggested);
        }

        let native = node
            .handler
            .as_ref()
            .map(|h| h.native_preferred_size(available))
            .unwrap_or_default();

        let visible: Vec<ControlId> = node
            .all_children()
            .into_iter()
            .filter(|child| self.nodes.get(child).is_some_and(|n| n.visible && !n.disposed))
            .collect();
        let decoration = SizeF::new(node.padding.horizontal(), node.padding.vertical())
            + chrome_size(node.kind);
        let inner = SizeF::new(
            (available.width - decoration.width).max(0.0),
            (available.height - decoration.height).max(0.0),
        );
        let children = self.layout_children(&visible, inner)?;
        let content = match node.kind {
            ControlKind::StackPanel { orientation } => layout::measure_stacked(orientation, &children),
            _ => layout::measure_aligned(&children),
        };

        let measured = native.max(content + decoration);
        Ok(SizeF::new(
            if suggested.is_width_auto() { measured.width } else { suggested.width },
            if suggested.is_height_auto() { measured.height } else { suggested.height },
        ))
    }

    pub fn begin_update(&mut self, id: ControlId) -> PlatformResult<()> {
        self.ensure_handler_created(id)?;
        if let Some(handler) = self.live_node_mut(id)?.handler.as_mut() {
            handler.begin_update();
        }
        Ok(())
    }

    pub fn end_update(&mut self, id: ControlId) -> PlatformResult<()> {
        match self.live_node_mut(id)?.handler.as_mut() {
            Some(handler) => handler.end_update(),
            None => Err(PlatformError::InvalidOperation(format!(
                "end_update on control {} without matching begin_update",
                id.raw()
            ))),
        }
    }

    pub fn is_painting_suspended(&self, id: ControlId) -> PlatformResult<bool> {
        Ok(self
            .node(id)?
            .handler
            .as_ref()
            .is_some_and(|h| h.is_painting_suspended()))
    }

    /// Requests a repaint of the control. Deferred while updates are suspended.
    pub fn invalidate(&mut self, id: ControlId) -> PlatformResult<()> {
        self.ensure_handler_created(id)?;
        if let Some(handler) = self.live_node_mut(id)?.handler.as_mut() {
            handler.invalidate();
        }
        Ok(())
    }

    pub fn update(&mut self, id: ControlId) -> PlatformResult<()> {
        self.invalidate(id)
    }

    /*
     * Paints the control: handler decoration and peer first, then the paint
     * hook, then the public `Paint` event with the same context. Skipped while
     * painting is suspended. An unbound control cannot be painted.
     */
    pub fn paint(&mut self, id: ControlId, context: &mut dyn DrawingContext) -> PlatformResult<()> {
        let node = self.live_node_mut(id)?;
        let client = RectF::from_size(node.bounds.size());
        let style = PaintStyle {
            background: node.background.clone(),
            border_brush: node.border_brush.clone(),
        };
        let Some(handler) = node.handler.as_mut() else {
            return Err(PlatformError::InvalidOperation(format!(
                "control {} has no handler to paint with",
                id.raw()
            )));
        };
        if handler.is_painting_suspended() {
            log::debug!("Layout: paint of control {} skipped, updates suspended", id.raw());
            return Ok(());
        }
        handler.paint(context, client, &style);

        self.with_hooks(id, |hooks, tree| hooks.on_paint(tree, id, &mut *context));
        let mut args = EventArgs::with_context(EventKind::Paint, context);
        self.raise_event(id, &mut args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{HeadlessHandlerFactory, PeerCall, PeerJournal};
    use crate::hooks::ControlHooks;
    use crate::styling_primitives::{Brush, Color};
    use crate::test_support::{RecordingContext, RecordingHooks, bound_tree};
    use crate::types::{HorizontalAlignment, Orientation, Thickness, VerticalAlignment};

    use std::rc::Rc;

    fn sized_root(kind: ControlKind, size: SizeF) -> (ControlTree, PeerJournal, ControlId) {
        let (mut tree, journal, root) = bound_tree(kind);
        tree.set_size(root, size).unwrap();
        tree.ensure_handler_created(root).unwrap();
        (tree, journal, root)
    }

    #[test]
    fn nested_suspension_needs_matching_resumes_before_layout_runs() {
        let (mut tree, journal, root) = sized_root(ControlKind::Panel, SizeF::new(100.0, 100.0));
        let peer = tree.peer_id(root).unwrap().unwrap();
        let depth = 3;
        for _ in 0..depth {
            tree.suspend_layout(root).unwrap();
        }
        journal.clear_calls();

        tree.perform_layout(root).unwrap();
        assert_eq!(journal.count(peer, &PeerCall::Layout), 0);
        assert!(tree.is_layout_pending(root).unwrap());

        for _ in 0..depth - 1 {
            tree.resume_layout(root, true).unwrap();
            assert_eq!(journal.count(peer, &PeerCall::Layout), 0);
        }
        tree.resume_layout(root, true).unwrap();
        assert_eq!(journal.count(peer, &PeerCall::Layout), 1);
        assert!(!tree.is_layout_suspended(root).unwrap());
    }

    #[test]
    fn resume_without_layout_defers_until_requested() {
        let (mut tree, journal, root) = sized_root(ControlKind::Panel, SizeF::new(10.0, 10.0));
        let peer = tree.peer_id(root).unwrap().unwrap();
        tree.suspend_layout(root).unwrap();
        journal.clear_calls();

        tree.resume_layout(root, false).unwrap();
        assert_eq!(journal.count(peer, &PeerCall::Layout), 0);
        assert!(tree.is_layout_pending(root).unwrap());

        tree.perform_layout(root).unwrap();
        assert_eq!(journal.count(peer, &PeerCall::Layout), 1);
        assert!(!tree.is_layout_pending(root).unwrap());
    }

    #[test]
    fn resume_on_unbound_control_is_invalid() {
        let (mut tree, _journal, root) = bound_tree(ControlKind::Panel);
        assert!(matches!(
            tree.resume_layout(root, true),
            Err(PlatformError::InvalidOperation(_))
        ));
    }

    #[test]
    fn layout_pass_places_children_and_pushes_bounds_to_peers() {
        let (mut tree, journal, root) = sized_root(ControlKind::Panel, SizeF::new(100.0, 50.0));
        tree.set_padding(root, Thickness::uniform(5.0)).unwrap();
        let child = tree.create_control(ControlKind::Control);
        tree.set_margin(child, Thickness::uniform(1.0)).unwrap();
        tree.add_child(root, child).unwrap();

        let expected = RectF::new(6.0, 6.0, 88.0, 38.0);
        assert_eq!(tree.bounds(child).unwrap(), expected);
        let peer = tree.peer_id(child).unwrap().unwrap();
        assert!(journal.calls_for(peer).contains(&PeerCall::SetBounds(expected)));
        assert!(journal.calls_for(peer).contains(&PeerCall::Layout));
    }

    #[test]
    fn hidden_children_are_neither_placed_nor_bound() {
        let (mut tree, _journal, root) = sized_root(ControlKind::Panel, SizeF::new(100.0, 50.0));
        let child = tree.create_control(ControlKind::Control);
        tree.hide(child).unwrap();
        tree.add_child(root, child).unwrap();
        assert!(!tree.is_handler_created(child).unwrap());
        assert_eq!(tree.bounds(child).unwrap(), RectF::default());
    }

    #[test]
    fn stack_panel_stacks_children_by_preferred_size() {
        let (mut tree, _journal, root) = sized_root(
            ControlKind::StackPanel {
                orientation: Orientation::Vertical,
            },
            SizeF::new(40.0, 100.0),
        );
        tree.begin_init(root).unwrap();
        let a = tree.create_control(ControlKind::Control);
        let b = tree.create_control(ControlKind::Control);
        tree.set_height(a, 10.0).unwrap();
        tree.set_height(b, 20.0).unwrap();
        tree.add_child(root, a).unwrap();
        tree.add_child(root, b).unwrap();
        assert_eq!(tree.bounds(b).unwrap(), RectF::default());
        tree.end_init(root).unwrap();

        assert_eq!(tree.bounds(a).unwrap(), RectF::new(0.0, 0.0, 40.0, 10.0));
        assert_eq!(tree.bounds(b).unwrap(), RectF::new(0.0, 10.0, 40.0, 20.0));
    }

    #[test]
    fn margin_change_relays_out_the_parent() {
        let (mut tree, _journal, root) = sized_root(ControlKind::Panel, SizeF::new(100.0, 100.0));
        let child = tree.create_control(ControlKind::Control);
        tree.add_child(root, child).unwrap();
        tree.set_margin(child, Thickness::new(10.0, 0.0, 0.0, 0.0)).unwrap();
        assert_eq!(tree.bounds(child).unwrap().x, 10.0);
        assert_eq!(tree.bounds(child).unwrap().width, 90.0);
    }

    #[test]
    fn preferred_size_combines_native_children_and_decoration() {
        let journal = PeerJournal::default();
        let factory = HeadlessHandlerFactory::new("sized", journal)
            .with_preferred_size(SizeF::new(5.0, 5.0));
        let mut tree = ControlTree::new();
        let border = tree.create_control(ControlKind::Border);
        tree.set_handler_factory(border, Some(Rc::new(factory))).unwrap();
        tree.set_padding(border, Thickness::uniform(3.0)).unwrap();
        let child = tree.create_control(ControlKind::Control);
        tree.set_size(child, SizeF::new(20.0, 10.0)).unwrap();
        tree.set_margin(child, Thickness::uniform(1.0)).unwrap();
        tree.add_child(border, child).unwrap();

        let available = SizeF::new(200.0, 200.0);
        assert_eq!(
            tree.preferred_size(border, available).unwrap(),
            SizeF::new(30.0, 20.0)
        );
        assert!(!tree.is_handler_created(border).unwrap());

        tree.set_width(border, 100.0).unwrap();
        assert_eq!(
            tree.preferred_size(border, available).unwrap(),
            SizeF::new(100.0, 20.0)
        );
    }

    #[test]
    fn preferred_size_is_available_while_suspended() {
        let (mut tree, _journal, root) = sized_root(ControlKind::Panel, SizeF::new(10.0, 10.0));
        tree.suspend_layout(root).unwrap();
        assert_eq!(
            tree.preferred_size(root, SizeF::new(50.0, 50.0)).unwrap(),
            SizeF::new(10.0, 10.0)
        );
    }

    #[test]
    fn layout_hook_can_take_over_arrangement() {
        struct Manual;
        impl ControlHooks for Manual {
            fn on_layout(&self, tree: &mut ControlTree, id: ControlId) -> bool {
                let child = tree.children(id).unwrap()[0];
                tree.live_node_mut(child).unwrap().bounds = RectF::new(1.0, 2.0, 3.0, 4.0);
                true
            }
        }

        let (mut tree, _journal, root) = sized_root(ControlKind::Panel, SizeF::new(100.0, 100.0));
        tree.set_hooks(root, Rc::new(Manual)).unwrap();
        let child = tree.create_control(ControlKind::Control);
        tree.set_horizontal_alignment(child, HorizontalAlignment::Left).unwrap();
        tree.set_vertical_alignment(child, VerticalAlignment::Top).unwrap();
        tree.add_child(root, child).unwrap();
        assert_eq!(tree.bounds(child).unwrap(), RectF::new(1.0, 2.0, 3.0, 4.0));
    }

    #[test]
    fn layout_requested_during_a_pass_is_marked_pending() {
        struct Reentrant;
        impl ControlHooks for Reentrant {
            fn on_layout(&self, tree: &mut ControlTree, id: ControlId) -> bool {
                tree.perform_layout(id).unwrap();
                false
            }
        }

        let (mut tree, journal, root) = sized_root(ControlKind::Panel, SizeF::new(10.0, 10.0));
        let peer = tree.peer_id(root).unwrap().unwrap();
        tree.set_hooks(root, Rc::new(Reentrant)).unwrap();
        journal.clear_calls();

        tree.perform_layout(root).unwrap();
        assert_eq!(journal.count(peer, &PeerCall::Layout), 1);
        assert!(tree.is_layout_pending(root).unwrap());
    }

    #[test]
    fn paint_is_gated_by_update_depth() {
        let (mut tree, journal, root) = sized_root(ControlKind::Panel, SizeF::new(10.0, 10.0));
        let peer = tree.peer_id(root).unwrap().unwrap();
        let mut context = RecordingContext::default();
        tree.begin_update(root).unwrap();
        tree.begin_update(root).unwrap();
        tree.invalidate(root).unwrap();
        tree.paint(root, &mut context).unwrap();
        assert_eq!(journal.count(peer, &PeerCall::Paint), 0);
        assert_eq!(journal.count(peer, &PeerCall::Invalidate), 0);

        tree.end_update(root).unwrap();
        tree.end_update(root).unwrap();
        assert_eq!(journal.count(peer, &PeerCall::Invalidate), 1);
        tree.paint(root, &mut context).unwrap();
        assert_eq!(journal.count(peer, &PeerCall::Paint), 1);
        assert!(matches!(
            tree.end_update(root),
            Err(PlatformError::InvalidOperation(_))
        ));
    }

    #[test]
    fn paint_runs_handler_then_hook_then_event() {
        let (mut tree, _journal, root) = sized_root(ControlKind::Border, SizeF::new(10.0, 10.0));
        let background = Brush::Solid(Color::WHITE);
        let border = Brush::Solid(Color::BLACK);
        tree.set_background(root, Some(background.clone())).unwrap();
        tree.set_border_brush(root, Some(border.clone())).unwrap();
        let (hooks, log) = RecordingHooks::new("b");
        tree.set_hooks(root, Rc::new(hooks)).unwrap();
        let sink = log.clone();
        tree.subscribe(
            root,
            EventKind::Paint,
            move |_tree: &mut ControlTree, _id, args: &mut EventArgs<'_>| {
                let has_context = args.drawing_context().is_some();
                sink.borrow_mut().push(format!("event context={has_context}"));
            },
        )
        .unwrap();

        let mut context = RecordingContext::default();
        tree.paint(root, &mut context).unwrap();

        assert_eq!(
            context.fills,
            vec![(background, RectF::new(0.0, 0.0, 10.0, 10.0))]
        );
        assert_eq!(context.outlines, vec![(border, RectF::new(0.0, 0.0, 10.0, 10.0))]);
        assert_eq!(log.borrow().as_slice(), ["b:paint", "event context=true"]);
    }

    #[test]
    fn unbound_controls_cannot_paint() {
        let (mut tree, _journal, root) = bound_tree(ControlKind::Panel);
        let mut context = RecordingContext::default();
        assert!(matches!(
            tree.paint(root, &mut context),
            Err(PlatformError::InvalidOperation(_))
        ));
    }
}
