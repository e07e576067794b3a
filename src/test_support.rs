/*
 * Shared fixtures for the in-module tests: trees whose root carries a
 * headless factory override (so no application is needed), hooks that log
 * every call, and a drawing context that records primitives.
 */

use crate::control_tree::ControlTree;
use crate::drawing::DrawingContext;
use crate::geometry::RectF;
use crate::headless::{HeadlessHandlerFactory, PeerJournal};
use crate::hooks::ControlHooks;
use crate::styling_primitives::Brush;
use crate::types::{ControlId, ControlKind, Property, WindowConfig};

use std::cell::RefCell;
use std::rc::Rc;

pub(crate) fn bound_tree(kind: ControlKind) -> (ControlTree, PeerJournal, ControlId) {
    let mut tree = ControlTree::new();
    let root = tree.create_control(kind);
    let journal = bind_headless(&mut tree, root);
    (tree, journal, root)
}

pub(crate) fn bound_window() -> (ControlTree, PeerJournal, ControlId) {
    let mut tree = ControlTree::new();
    let window = tree.create_window(WindowConfig {
        title: "Test".to_string(),
        width: 320.0,
        height: 240.0,
    });
    let journal = bind_headless(&mut tree, window);
    (tree, journal, window)
}

fn bind_headless(tree: &mut ControlTree, root: ControlId) -> PeerJournal {
    let journal = PeerJournal::default();
    let factory = HeadlessHandlerFactory::new("test", journal.clone());
    tree.set_handler_factory(root, Some(Rc::new(factory)))
        .unwrap();
    journal
}

/// Unbound single-child chain of `depth` controls, built leaf first. Returns `(top, leaf)`.
pub(crate) fn deep_chain(tree: &mut ControlTree, depth: usize) -> (ControlId, ControlId) {
    let leaf = tree.create_control(ControlKind::Control);
    let mut top = leaf;
    for _ in 1..depth {
        let parent = tree.create_control(ControlKind::Panel);
        tree.add_child(parent, top).unwrap();
        top = parent;
    }
    (top, leaf)
}

pub(crate) struct RecordingHooks {
    label: String,
    log: Rc<RefCell<Vec<String>>>,
}

impl RecordingHooks {
    pub(crate) fn new(label: &str) -> (Self, Rc<RefCell<Vec<String>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        (
            Self {
                label: label.to_string(),
                log: log.clone(),
            },
            log,
        )
    }

    fn push(&self, entry: &str) {
        self.log.borrow_mut().push(format!("{}:{entry}", self.label));
    }
}

impl ControlHooks for RecordingHooks {
    fn on_property_changed(&self, _tree: &mut ControlTree, _id: ControlId, property: Property) {
        self.push(&format!("changed:{property:?}"));
    }

    fn on_click(&self, _tree: &mut ControlTree, _id: ControlId) {
        self.push("click");
    }

    fn on_paint(&self, _tree: &mut ControlTree, _id: ControlId, _context: &mut dyn DrawingContext) {
        self.push("paint");
    }

    fn on_handler_attached(&self, _tree: &mut ControlTree, _id: ControlId) {
        self.push("attached");
    }

    fn on_handler_detaching(&self, _tree: &mut ControlTree, _id: ControlId) {
        self.push("detaching");
    }
}

#[derive(Debug, Default)]
pub(crate) struct RecordingContext {
    pub fills: Vec<(Brush, RectF)>,
    pub outlines: Vec<(Brush, RectF)>,
}

impl DrawingContext for RecordingContext {
    fn fill_rectangle(&mut self, brush: &Brush, rect: RectF) {
        self.fills.push((brush.clone(), rect));
    }

    fn draw_rectangle(&mut self, brush: &Brush, rect: RectF) {
        self.outlines.push((brush.clone(), rect));
    }
}
