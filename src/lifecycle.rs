/*
 * Handler lifecycle for controls in a `ControlTree`: lazy binding to a native
 * peer through the effective `HandlerFactory`, explicit detach, recreation
 * after a visual theme change, and the disposal cascade.
 *
 * A control moves Unbound -> Attached on first handler access, back to
 * Unbound on detach, and may bind again with a fresh handler. Disposal is
 * terminal. At no point does a control own two live peers: the old handler is
 * always detached before the factory is asked for a new one.
 */

use crate::application::Application;
use crate::control_tree::{ControlNode, ControlTree};
use crate::error::{PlatformError, Result as PlatformResult};
use crate::handler::{ControlHandler, HandlerFactory, HandlerState};
use crate::native::PeerId;
use crate::types::ControlId;

use std::rc::Rc;

// A control whose collections are emptied and whose snapshot is still being disposed.
struct DisposeFrame {
    id: ControlId,
    pending: std::vec::IntoIter<ControlId>,
}

impl ControlTree {
    pub fn is_handler_created(&self, id: ControlId) -> PlatformResult<bool> {
        Ok(self.node(id)?.handler.is_some())
    }

    /// Returns the control's handler, creating and attaching it first if needed.
    pub fn handler(&mut self, id: ControlId) -> PlatformResult<&ControlHandler> {
        self.ensure_handler_created(id)?;
        self.live_node(id)?.handler.as_ref().ok_or_else(|| {
            PlatformError::InvalidOperation(format!(
                "control {} lost its handler while attaching",
                id.raw()
            ))
        })
    }

    /// Peer currently bound to the control, without forcing creation.
    pub fn peer_id(&self, id: ControlId) -> PlatformResult<Option<PeerId>> {
        Ok(self.node(id)?.handler.as_ref().map(|h| h.peer_id()))
    }

    pub fn control_for_peer(&self, peer: PeerId) -> Option<ControlId> {
        self.peer_owners.get(&peer).copied()
    }

    /*
     * Resolves the factory used when binding `id`: the control's own override,
     * else the nearest ancestor's override, else the factory of the current
     * application's visual theme.
     */
    pub fn effective_handler_factory(&self, id: ControlId) -> PlatformResult<Rc<dyn HandlerFactory>> {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = self.node(current)?;
            if let Some(factory) = &node.handler_factory {
                return Ok(factory.clone());
            }
            cursor = node.parent;
        }
        let app = Application::current()?;
        Ok(app.visual_theme().handler_factory())
    }

    pub fn ensure_handler_created(&mut self, id: ControlId) -> PlatformResult<()> {
        if self.live_node(id)?.handler.is_some() {
            return Ok(());
        }
        self.bind_new_handler(id, 0, 0)
    }

    /*
     * Unbound -> Attached. Suspension depths carried over from a replaced
     * handler are applied before the attached hook runs, so anything the hook
     * triggers sees the same gating as before the recreation.
     */
    fn bind_new_handler(&mut self, id: ControlId, layout_depth: u32, update_depth: u32) -> PlatformResult<()> {
        let factory = self.effective_handler_factory(id)?;
        let node = self.live_node(id)?;
        let kind = node.kind;
        let sync = node.peer_sync();

        let mut handler = factory.create_control_handler(id, kind)?;
        if handler.state() != HandlerState::Created {
            log::error!(
                "Lifecycle: factory '{}' returned a {:?} handler for control {}",
                factory.name(),
                handler.state(),
                id.raw()
            );
            return Err(PlatformError::InvalidOperation(format!(
                "factory '{}' returned a handler that is not fresh",
                factory.name()
            )));
        }
        handler.attach(id, &sync)?;
        handler.inherit_suspension(layout_depth, update_depth);

        let peer = handler.peer_id();
        self.live_node_mut(id)?.handler = Some(handler);
        self.peer_owners.insert(peer, id);
        log::debug!(
            "Lifecycle: control {} bound to peer {peer:?} via '{}'",
            id.raw(),
            factory.name()
        );

        self.with_hooks(id, |hooks, tree| hooks.on_handler_attached(tree, id));
        Ok(())
    }

    /*
     * Attached -> Unbound. The detaching hook runs while the peer is still
     * live; the handler's visual children are disposed with it since they
     * belong to that handler instance.
     */
    pub fn detach_handler(&mut self, id: ControlId) -> PlatformResult<()> {
        if self.live_node(id)?.handler.is_none() {
            log::warn!("Lifecycle: detach requested on unbound control {}", id.raw());
            return Err(PlatformError::InvalidOperation(format!(
                "control {} has no handler to detach",
                id.raw()
            )));
        }

        self.with_hooks(id, |hooks, tree| hooks.on_handler_detaching(tree, id));

        for visual in self.detach_visual_children(id)? {
            self.dispose(visual)?;
        }

        let Some(mut handler) = self.live_node_mut(id)?.handler.take() else {
            return Ok(());
        };
        let peer = handler.peer_id();
        handler.detach()?;
        self.peer_owners.remove(&peer);
        log::debug!("Lifecycle: control {} released peer {peer:?}", id.raw());
        Ok(())
    }

    /*
     * Replaces the control's peer with a fresh one from the effective factory.
     * Logical state (properties, children, subscriptions) is untouched and is
     * pushed to the new peer on attach. An unbound control is simply bound.
     */
    pub fn recreate_handler(&mut self, id: ControlId) -> PlatformResult<()> {
        let depths = self
            .live_node(id)?
            .handler
            .as_ref()
            .map(|h| (h.layout_suspend_depth(), h.update_suspend_depth()));
        let Some((layout_depth, update_depth)) = depths else {
            return self.ensure_handler_created(id);
        };

        self.detach_handler(id)?;
        self.bind_new_handler(id, layout_depth, update_depth)?;
        if let Some(handler) = self.live_node_mut(id)?.handler.as_mut() {
            handler.invalidate();
        }
        log::debug!("Lifecycle: recreated handler for control {}", id.raw());
        Ok(())
    }

    /*
     * Recreates every bound handler in the logical subtree of `root`,
     * children before parents, then lays the root out again. Unbound controls
     * stay unbound and pick up the new factory on first access.
     */
    pub fn recreate_all_handlers(&mut self, root: ControlId) -> PlatformResult<()> {
        let mut order = Vec::new();
        self.collect_post_order(root, &mut order)?;
        for id in order {
            let bound = self
                .nodes
                .get(&id)
                .is_some_and(|node| !node.disposed && node.handler.is_some());
            if bound {
                self.recreate_handler(id)?;
            }
        }
        self.request_layout_if_bound(root)
    }

    // Children before parents, siblings in collection order.
    fn collect_post_order(&self, root: ControlId, out: &mut Vec<ControlId>) -> PlatformResult<()> {
        let mut stack = vec![(root, false)];
        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                out.push(id);
                continue;
            }
            stack.push((id, true));
            stack.extend(self.node(id)?.children.iter().rev().map(|child| (*child, false)));
        }
        Ok(())
    }

    /*
     * Tears down the control and its whole subtree. Children are detached
     * from a control before any of them is disposed, under a layout
     * suspension that is released without a pass, so no layout or paint can
     * observe a half-cleared collection. Peers therefore go away bottom-up in
     * snapshot order, and this control's peer last. Calling it again is a no-op.
     *
     * The cascade runs from an explicit stack of frames and never recurses.
     * If a step fails, every control still on the stack drops its disposing
     * mark so a later call starts over.
     */
    pub fn dispose(&mut self, id: ControlId) -> PlatformResult<()> {
        let Some(first) = self.begin_dispose(id)? else {
            return Ok(());
        };
        let mut stack = vec![first];
        let result = self.run_dispose(&mut stack);
        if let Err(error) = &result {
            log::error!("Lifecycle: disposal of control {} failed: {error}", id.raw());
            for frame in &stack {
                if let Some(node) = self.nodes.get_mut(&frame.id) {
                    node.disposing = false;
                }
            }
        }
        result
    }

    fn run_dispose(&mut self, stack: &mut Vec<DisposeFrame>) -> PlatformResult<()> {
        while let Some(frame) = stack.last_mut() {
            let id = frame.id;
            match frame.pending.next() {
                Some(child) => {
                    if let Some(next) = self.begin_dispose(child)? {
                        stack.push(next);
                    }
                }
                None => {
                    self.finish_dispose(id)?;
                    stack.pop();
                }
            }
        }
        Ok(())
    }

    // Marks the control as disposing and empties its collections. Returns `None` if it is already gone or going.
    fn begin_dispose(&mut self, id: ControlId) -> PlatformResult<Option<DisposeFrame>> {
        let node = self.node(id)?;
        if node.disposed || node.disposing {
            return Ok(None);
        }
        log::debug!("Lifecycle: disposing control {}", id.raw());
        self.live_node_mut(id)?.disposing = true;

        match self.release_children(id) {
            Ok(snapshot) => Ok(Some(DisposeFrame {
                id,
                pending: snapshot.into_iter(),
            })),
            Err(error) => {
                if let Some(node) = self.nodes.get_mut(&id) {
                    node.disposing = false;
                }
                Err(error)
            }
        }
    }

    fn release_children(&mut self, id: ControlId) -> PlatformResult<Vec<ControlId>> {
        if let Some(parent) = self.node(id)?.parent {
            self.detach_from_parent(parent, id)?;
        }

        let snapshot = self.node(id)?.all_children();

        if let Some(handler) = self.live_node_mut(id)?.handler.as_mut() {
            handler.suspend_layout();
        }
        self.detach_logical_children(id)?;
        self.detach_visual_children(id)?;
        if let Some(handler) = self.live_node_mut(id)?.handler.as_mut() {
            handler.resume_layout(false)?;
        }
        Ok(snapshot)
    }

    // Releases the peer, then leaves only a tombstone behind.
    fn finish_dispose(&mut self, id: ControlId) -> PlatformResult<()> {
        if self.live_node(id)?.handler.is_some() {
            self.detach_handler(id)?;
        }

        let node = self.live_node_mut(id)?;
        let kind = node.kind;
        *node = ControlNode::tombstone(kind);

        if kind.is_window()
            && let Some(app) = Application::try_current()
        {
            app.unregister_window(id);
        }
        log::debug!("Lifecycle: control {} disposed", id.raw());
        Ok(())
    }

    fn detach_from_parent(&mut self, parent: ControlId, child: ControlId) -> PlatformResult<()> {
        if self.nodes.get(&parent).is_none_or(|node| node.disposed) {
            return Ok(());
        }
        if !self.remove_child(parent, child)? {
            self.remove_visual_child(parent, child)?;
        }
        Ok(())
    }
}
