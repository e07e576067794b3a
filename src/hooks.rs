/*
 * Overridable lifecycle hooks for a control. Every method defaults to a
 * no-op. The tree guarantees the ordering around each call:
 * property change = store -> `on_property_changed` -> public `Changed` event;
 * attach = peer created -> `on_handler_attached`;
 * detach = `on_handler_detaching` -> peer destroyed -> handler cleared.
 * Hooks receive the tree mutably and may re-enter it, including the same
 * control: a nested change dispatches to the same hooks instance, so any
 * state the hooks keep needs interior mutability.
 */

use crate::control_tree::ControlTree;
use crate::drawing::DrawingContext;
use crate::types::{ControlId, Property};

pub trait ControlHooks {
    fn on_property_changed(&self, _tree: &mut ControlTree, _id: ControlId, _property: Property) {}

    fn on_click(&self, _tree: &mut ControlTree, _id: ControlId) {}

    fn on_paint(&self, _tree: &mut ControlTree, _id: ControlId, _context: &mut dyn DrawingContext) {
    }

    /// Return `true` when the hook arranged the children itself and the default arrangement must be skipped.
    fn on_layout(&self, _tree: &mut ControlTree, _id: ControlId) -> bool {
        false
    }

    fn on_handler_attached(&self, _tree: &mut ControlTree, _id: ControlId) {}

    fn on_handler_detaching(&self, _tree: &mut ControlTree, _id: ControlId) {}
}
