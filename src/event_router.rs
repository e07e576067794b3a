/*
 * Event delivery for controls in a `ControlTree`: public subscriptions, and
 * the single native callback entry point that turns `(peer, tag, parameter)`
 * into managed events.
 *
 * Subscribers run synchronously and in subscription order. A subscriber may
 * re-enter the tree, including subscribing or unsubscribing on the control
 * whose event is being raised; removals take effect for the rest of the
 * current raise, additions from the next one.
 *
 * The router is analogous to a window procedure: the native side blocks until
 * every subscriber has run, and a cancellable event (window closing) reports
 * the veto back through the return value.
 */

use crate::control_tree::ControlTree;
use crate::drawing::DrawingContext;
use crate::error::{PlatformError, Result as PlatformResult};
use crate::native::{NATIVE_CONTINUE, NATIVE_VETO, NativeEventTag, PeerId};
use crate::types::{ControlId, EventKind, Property, SubscriptionId};

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

type EventCallback = Rc<RefCell<dyn FnMut(&mut ControlTree, ControlId, &mut EventArgs<'_>)>>;

pub(crate) struct Subscription {
    pub id: SubscriptionId,
    pub kind: EventKind,
    pub callback: EventCallback,
}

/// Arguments handed to subscribers. `cancel` is only honoured for cancellable events.
pub struct EventArgs<'a> {
    kind: EventKind,
    cancel: bool,
    context: Option<&'a mut dyn DrawingContext>,
}

impl fmt::Debug for EventArgs<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventArgs")
            .field("kind", &self.kind)
            .field("cancel", &self.cancel)
            .field("has_context", &self.context.is_some())
            .finish()
    }
}

impl<'a> EventArgs<'a> {
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            cancel: false,
            context: None,
        }
    }

    pub(crate) fn with_context(kind: EventKind, context: &'a mut dyn DrawingContext) -> Self {
        Self {
            kind,
            cancel: false,
            context: Some(context),
        }
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn cancel(&self) -> bool {
        self.cancel
    }

    pub fn set_cancel(&mut self, cancel: bool) {
        if !self.kind.is_cancellable() {
            log::warn!("EventRouter: cancel set on non-cancellable {:?}", self.kind);
        }
        self.cancel = cancel;
    }

    /// Drawing context of a `Paint` event.
    pub fn drawing_context(&mut self) -> Option<&mut (dyn DrawingContext + 'a)> {
        self.context.as_deref_mut()
    }
}

impl ControlTree {
    pub fn subscribe<F>(&mut self, id: ControlId, kind: EventKind, callback: F) -> PlatformResult<SubscriptionId>
    where
        F: FnMut(&mut ControlTree, ControlId, &mut EventArgs<'_>) + 'static,
    {
        self.live_node(id)?;
        self.next_subscription += 1;
        let subscription = SubscriptionId(self.next_subscription);
        self.live_node_mut(id)?.subscriptions.push(Subscription {
            id: subscription,
            kind,
            callback: Rc::new(RefCell::new(callback)),
        });
        Ok(subscription)
    }

    /// Returns whether the subscription was still registered on the control.
    pub fn unsubscribe(&mut self, id: ControlId, subscription: SubscriptionId) -> PlatformResult<bool> {
        let subscriptions = &mut self.live_node_mut(id)?.subscriptions;
        let before = subscriptions.len();
        subscriptions.retain(|s| s.id != subscription);
        Ok(subscriptions.len() != before)
    }

    /*
     * Invokes every subscriber of `args.kind` on `id`. The subscriber list is
     * snapshotted first; each entry is re-checked before it runs so that an
     * earlier subscriber can remove a later one. A subscriber that is already
     * running further up the stack is skipped instead of re-entered.
     */
    pub(crate) fn raise_event(&mut self, id: ControlId, args: &mut EventArgs<'_>) -> PlatformResult<()> {
        let node = self.node(id)?;
        if node.disposed {
            log::warn!(
                "EventRouter: {:?} on disposed control {} ignored",
                args.kind,
                id.raw()
            );
            return Ok(());
        }
        let snapshot: Vec<(SubscriptionId, EventCallback)> = node
            .subscriptions
            .iter()
            .filter(|s| s.kind == args.kind)
            .map(|s| (s.id, s.callback.clone()))
            .collect();

        for (subscription, callback) in snapshot {
            let registered = self.nodes.get(&id).is_some_and(|node| {
                !node.disposed && node.subscriptions.iter().any(|s| s.id == subscription)
            });
            if !registered {
                continue;
            }
            let Ok(mut callback) = callback.try_borrow_mut() else {
                log::warn!(
                    "EventRouter: subscriber {subscription:?} re-entered for {:?} on control {}",
                    args.kind,
                    id.raw()
                );
                continue;
            };
            (*callback)(self, id, args);
        }
        Ok(())
    }

    /// Raises a plain event and reports whether a subscriber cancelled it.
    pub(crate) fn raise(&mut self, id: ControlId, kind: EventKind) -> PlatformResult<bool> {
        let mut args = EventArgs::new(kind);
        self.raise_event(id, &mut args)?;
        Ok(kind.is_cancellable() && args.cancel())
    }

    pub(crate) fn raise_changed(&mut self, id: ControlId, property: Property) -> PlatformResult<()> {
        self.raise(id, EventKind::Changed(property)).map(|_| ())
    }

    /// Click hook, then the public `Click` event.
    pub fn raise_click(&mut self, id: ControlId) -> PlatformResult<()> {
        self.live_node(id)?;
        self.with_hooks(id, |hooks, tree| hooks.on_click(tree, id));
        self.raise(id, EventKind::Click).map(|_| ())
    }

    /*
     * Asks a window to close. `Closing` subscribers may veto; when nobody
     * does, `Closed` is raised and the window is disposed. Returns whether
     * the window closed.
     */
    pub fn request_close(&mut self, id: ControlId) -> PlatformResult<bool> {
        if !self.live_node(id)?.kind.is_window() {
            return Err(PlatformError::InvalidOperation(format!(
                "control {} is not a window and cannot be closed",
                id.raw()
            )));
        }
        if self.raise(id, EventKind::Closing)? {
            log::debug!("EventRouter: close of window {} vetoed", id.raw());
            return Ok(false);
        }
        self.raise(id, EventKind::Closed)?;
        self.dispose(id)?;
        Ok(true)
    }

    /*
     * Native callback entry point. Unknown tags mean the binding and the
     * native layer disagree about the event vocabulary; that is reported as a
     * fatal `UnsupportedEvent` and nothing is dispatched.
     */
    pub fn dispatch_native_event(&mut self, peer: PeerId, tag: u32, parameter: isize) -> PlatformResult<isize> {
        let event = match NativeEventTag::try_from(tag) {
            Ok(event) => event,
            Err(tag) => {
                log::error!("EventRouter: unsupported native event tag {tag} from peer {peer:?}");
                return Err(PlatformError::UnsupportedEvent { peer, tag });
            }
        };
        let Some(id) = self.control_for_peer(peer) else {
            log::warn!("EventRouter: {event:?} from unknown peer {peer:?}");
            return Err(PlatformError::InvalidHandle(format!(
                "peer {} is not bound to any control",
                peer.raw()
            )));
        };
        log::debug!(
            "EventRouter: {event:?} (parameter {parameter}) for control {}",
            id.raw()
        );

        match event {
            NativeEventTag::Closing => {
                let closed = self.request_close(id)?;
                Ok(if closed { NATIVE_CONTINUE } else { NATIVE_VETO })
            }
            NativeEventTag::SizeChanged => {
                self.raise(id, EventKind::SizeChanged)?;
                self.perform_layout(id)?;
                Ok(NATIVE_CONTINUE)
            }
            NativeEventTag::Click => {
                self.raise_click(id)?;
                Ok(NATIVE_CONTINUE)
            }
            NativeEventTag::SelectionChanged => {
                self.raise(id, EventKind::SelectionChanged)?;
                Ok(NATIVE_CONTINUE)
            }
            NativeEventTag::TextChanged => {
                self.raise(id, EventKind::TextChanged)?;
                Ok(NATIVE_CONTINUE)
            }
        }
    }
}
