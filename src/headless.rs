/*
 * A peer backend with no platform behind it. Every native call is appended
 * to a shared `PeerJournal`, which makes the lifecycle observable: tests and
 * headless hosts can check which peers are alive, in which order they were
 * destroyed, and how many layout or paint requests reached the native side.
 */

use crate::drawing::DrawingContext;
use crate::error::{PlatformError, Result as PlatformResult};
use crate::geometry::{RectF, SizeF};
use crate::handler::{ControlHandler, HandlerFactory};
use crate::native::{NativePeer, PeerId};
use crate::types::{ControlId, ControlKind};

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum PeerCall {
    Create,
    Destroy,
    Paint,
    Layout,
    SetBounds(RectF),
    SetVisible(bool),
    SetEnabled(bool),
    SetTitle(String),
    SuspendLayout,
    ResumeLayout,
    BeginUpdate,
    EndUpdate,
    Invalidate,
}

#[derive(Debug, Default)]
struct JournalState {
    calls: Vec<(PeerId, PeerCall)>,
    bindings: Vec<(ControlId, PeerId)>,
}

/// Shared, cloneable record of native calls.
#[derive(Debug, Clone, Default)]
pub struct PeerJournal {
    state: Rc<RefCell<JournalState>>,
}

impl PeerJournal {
    fn record(&self, peer: PeerId, call: PeerCall) {
        self.state.borrow_mut().calls.push((peer, call));
    }

    fn record_binding(&self, control: ControlId, peer: PeerId) {
        self.state.borrow_mut().bindings.push((control, peer));
    }

    pub fn calls(&self) -> Vec<(PeerId, PeerCall)> {
        self.state.borrow().calls.clone()
    }

    pub fn calls_for(&self, peer: PeerId) -> Vec<PeerCall> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|(id, _)| *id == peer)
            .map(|(_, call)| call.clone())
            .collect()
    }

    pub fn count(&self, peer: PeerId, call: &PeerCall) -> usize {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|(id, c)| *id == peer && c == call)
            .count()
    }

    /// Peers in the order their `destroy` was called.
    pub fn destroyed(&self) -> Vec<PeerId> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|(_, call)| *call == PeerCall::Destroy)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Peers created and not yet destroyed.
    pub fn live_peers(&self) -> HashSet<PeerId> {
        let mut live = HashSet::new();
        for (id, call) in &self.state.borrow().calls {
            match call {
                PeerCall::Create => {
                    live.insert(*id);
                }
                PeerCall::Destroy => {
                    live.remove(id);
                }
                _ => {}
            }
        }
        live
    }

    /// Every peer the factory produced for a control, oldest first.
    pub fn peers_for(&self, control: ControlId) -> Vec<PeerId> {
        self.state
            .borrow()
            .bindings
            .iter()
            .filter(|(id, _)| *id == control)
            .map(|(_, peer)| *peer)
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }
}

#[derive(Debug)]
pub struct HeadlessPeer {
    id: PeerId,
    journal: PeerJournal,
    preferred_size: SizeF,
    fail_create: bool,
}

impl HeadlessPeer {
    pub fn new(journal: PeerJournal) -> Self {
        Self {
            id: PeerId::generate(),
            journal,
            preferred_size: SizeF::default(),
            fail_create: false,
        }
    }

    pub fn with_preferred_size(mut self, size: SizeF) -> Self {
        self.preferred_size = size;
        self
    }

    /// Makes `create` report a native failure, as a platform out of handles would.
    pub fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }
}

impl NativePeer for HeadlessPeer {
    fn id(&self) -> PeerId {
        self.id
    }

    fn create(&mut self) -> PlatformResult<()> {
        if self.fail_create {
            return Err(PlatformError::OperationFailed(format!(
                "headless peer {:?} refused to create",
                self.id
            )));
        }
        self.journal.record(self.id, PeerCall::Create);
        Ok(())
    }

    fn destroy(&mut self) {
        self.journal.record(self.id, PeerCall::Destroy);
    }

    fn paint(&mut self, _context: &mut dyn DrawingContext) {
        self.journal.record(self.id, PeerCall::Paint);
    }

    fn layout(&mut self) {
        self.journal.record(self.id, PeerCall::Layout);
    }

    fn preferred_size(&self, _available: SizeF) -> SizeF {
        self.preferred_size
    }

    fn set_bounds(&mut self, bounds: RectF) {
        self.journal.record(self.id, PeerCall::SetBounds(bounds));
    }

    fn set_visible(&mut self, visible: bool) {
        self.journal.record(self.id, PeerCall::SetVisible(visible));
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.journal.record(self.id, PeerCall::SetEnabled(enabled));
    }

    fn set_title(&mut self, title: &str) {
        self.journal
            .record(self.id, PeerCall::SetTitle(title.to_string()));
    }

    fn suspend_layout(&mut self) {
        self.journal.record(self.id, PeerCall::SuspendLayout);
    }

    fn resume_layout(&mut self) {
        self.journal.record(self.id, PeerCall::ResumeLayout);
    }

    fn begin_update(&mut self) {
        self.journal.record(self.id, PeerCall::BeginUpdate);
    }

    fn end_update(&mut self) {
        self.journal.record(self.id, PeerCall::EndUpdate);
    }

    fn invalidate(&mut self) {
        self.journal.record(self.id, PeerCall::Invalidate);
    }
}

/// Produces `HeadlessPeer`-backed handlers and journals which control each peer belongs to.
#[derive(Debug, Clone)]
pub struct HeadlessHandlerFactory {
    name: String,
    journal: PeerJournal,
    preferred_size: SizeF,
    fail_create: bool,
}

impl HeadlessHandlerFactory {
    pub fn new(name: impl Into<String>, journal: PeerJournal) -> Self {
        Self {
            name: name.into(),
            journal,
            preferred_size: SizeF::default(),
            fail_create: false,
        }
    }

    /// Every peer this factory creates fails in `create`.
    pub fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    /// Native preferred size reported by every peer this factory creates.
    pub fn with_preferred_size(mut self, size: SizeF) -> Self {
        self.preferred_size = size;
        self
    }

    pub fn journal(&self) -> &PeerJournal {
        &self.journal
    }
}

impl HandlerFactory for HeadlessHandlerFactory {
    fn name(&self) -> &str {
        &self.name
    }

    fn create_control_handler(
        &self,
        control_id: ControlId,
        kind: ControlKind,
    ) -> PlatformResult<ControlHandler> {
        let mut peer =
            HeadlessPeer::new(self.journal.clone()).with_preferred_size(self.preferred_size);
        if self.fail_create {
            peer = peer.failing_create();
        }
        self.journal.record_binding(control_id, peer.id());
        log::debug!(
            "HeadlessHandlerFactory({}): new peer {:?} for control {} ({kind:?})",
            self.name,
            peer.id(),
            control_id.raw()
        );
        Ok(ControlHandler::new(kind, Box::new(peer)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn journal_tracks_live_peers_and_destroy_order() {
        let journal = PeerJournal::default();
        let mut a = HeadlessPeer::new(journal.clone());
        let mut b = HeadlessPeer::new(journal.clone());
        a.create().unwrap();
        b.create().unwrap();
        b.destroy();
        a.destroy();

        assert!(journal.live_peers().is_empty());
        assert_eq!(journal.destroyed(), vec![b.id(), a.id()]);
    }

    #[test]
    fn factory_records_bindings_per_control() {
        let journal = PeerJournal::default();
        let factory = HeadlessHandlerFactory::new("headless", journal.clone());
        let control = ControlId::new(5);
        let first = factory
            .create_control_handler(control, ControlKind::Panel)
            .unwrap();
        let second = factory
            .create_control_handler(control, ControlKind::Panel)
            .unwrap();

        assert_eq!(
            journal.peers_for(control),
            vec![first.peer_id(), second.peer_id()]
        );
        assert!(!first.is_attached());
    }
}
