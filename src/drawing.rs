/*
 * Drawing-context capability handed to handlers and `Paint` subscribers.
 * Real primitives live with the native backend; the tree only needs to fill
 * and outline rectangles with a brush.
 */

use crate::geometry::RectF;
use crate::styling_primitives::Brush;

pub trait DrawingContext {
    fn fill_rectangle(&mut self, brush: &Brush, rect: RectF);
    fn draw_rectangle(&mut self, brush: &Brush, rect: RectF);
}
