/*
 * Pure arrangement and measurement for child controls. Nothing in here
 * touches handlers or peers: the layout pass gathers a `LayoutChild` per
 * visible child, asks these functions for rectangles, and then applies them.
 * Margins always sit outside the returned rectangle. A suggested size of
 * `NaN` on an axis leaves that axis to alignment (stretch) or to the child's
 * preferred size.
 */

use crate::geometry::{RectF, SizeF};
use crate::types::{ControlId, HorizontalAlignment, Orientation, Thickness, VerticalAlignment};

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LayoutChild {
    pub id: ControlId,
    /// Preferred size excluding margin.
    pub preferred: SizeF,
    pub suggested: SizeF,
    pub margin: Thickness,
    pub horizontal: HorizontalAlignment,
    pub vertical: VerticalAlignment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AxisAlignment {
    Start,
    Center,
    End,
    Stretch,
}

impl From<HorizontalAlignment> for AxisAlignment {
    fn from(value: HorizontalAlignment) -> Self {
        match value {
            HorizontalAlignment::Left => AxisAlignment::Start,
            HorizontalAlignment::Center => AxisAlignment::Center,
            HorizontalAlignment::Right => AxisAlignment::End,
            HorizontalAlignment::Stretch => AxisAlignment::Stretch,
        }
    }
}

impl From<VerticalAlignment> for AxisAlignment {
    fn from(value: VerticalAlignment) -> Self {
        match value {
            VerticalAlignment::Top => AxisAlignment::Start,
            VerticalAlignment::Center => AxisAlignment::Center,
            VerticalAlignment::Bottom => AxisAlignment::End,
            VerticalAlignment::Stretch => AxisAlignment::Stretch,
        }
    }
}

/*
 * Places a child of `desired` extent inside the slot `[start, start + extent)`.
 * Stretch fills the slot only when the suggested size is auto; an explicit
 * suggested size under Stretch is centered.
 */
fn align_axis(
    start: f32,
    extent: f32,
    preferred: f32,
    suggested: f32,
    alignment: AxisAlignment,
) -> (f32, f32) {
    let extent = extent.max(0.0);
    if alignment == AxisAlignment::Stretch && suggested.is_nan() {
        return (start, extent);
    }
    let desired = if suggested.is_nan() { preferred } else { suggested };
    let size = desired.max(0.0).min(extent);
    let offset = match alignment {
        AxisAlignment::Start => 0.0,
        AxisAlignment::End => extent - size,
        AxisAlignment::Center | AxisAlignment::Stretch => (extent - size) / 2.0,
    };
    (start + offset, size)
}

fn desired_axis(preferred: f32, suggested: f32) -> f32 {
    if suggested.is_nan() { preferred } else { suggested }
}

/// Every child gets the whole bounds (less its margin) and is aligned inside it.
pub(crate) fn arrange_aligned(bounds: RectF, children: &[LayoutChild]) -> Vec<(ControlId, RectF)> {
    children
        .iter()
        .map(|child| {
            let slot = bounds.deflate(
                child.margin.left,
                child.margin.top,
                child.margin.right,
                child.margin.bottom,
            );
            let (x, width) = align_axis(
                slot.x,
                slot.width,
                child.preferred.width,
                child.suggested.width,
                child.horizontal.into(),
            );
            let (y, height) = align_axis(
                slot.y,
                slot.height,
                child.preferred.height,
                child.suggested.height,
                child.vertical.into(),
            );
            (child.id, RectF::new(x, y, width, height))
        })
        .collect()
}

/*
 * Children are carved off the front of the available rectangle in collection
 * order, each taking its desired extent along the stacking axis and aligned
 * across it. Space that runs out yields zero-sized trailing children.
 */
pub(crate) fn arrange_stacked(
    bounds: RectF,
    orientation: Orientation,
    children: &[LayoutChild],
) -> Vec<(ControlId, RectF)> {
    let mut result = Vec::with_capacity(children.len());
    let mut current_available_rect = bounds;

    for child in children {
        let margin = child.margin;
        match orientation {
            Orientation::Vertical => {
                let height = desired_axis(child.preferred.height, child.suggested.height)
                    .max(0.0)
                    .min((current_available_rect.height - margin.vertical()).max(0.0));
                let (x, width) = align_axis(
                    current_available_rect.x + margin.left,
                    current_available_rect.width - margin.horizontal(),
                    child.preferred.width,
                    child.suggested.width,
                    child.horizontal.into(),
                );
                let y = current_available_rect.y + margin.top;
                result.push((child.id, RectF::new(x, y, width, height)));
                let consumed = (height + margin.vertical()).min(current_available_rect.height);
                current_available_rect.y += consumed;
                current_available_rect.height = (current_available_rect.height - consumed).max(0.0);
            }
            Orientation::Horizontal => {
                let width = desired_axis(child.preferred.width, child.suggested.width)
                    .max(0.0)
                    .min((current_available_rect.width - margin.horizontal()).max(0.0));
                let (y, height) = align_axis(
                    current_available_rect.y + margin.top,
                    current_available_rect.height - margin.vertical(),
                    child.preferred.height,
                    child.suggested.height,
                    child.vertical.into(),
                );
                let x = current_available_rect.x + margin.left;
                result.push((child.id, RectF::new(x, y, width, height)));
                let consumed = (width + margin.horizontal()).min(current_available_rect.width);
                current_available_rect.x += consumed;
                current_available_rect.width = (current_available_rect.width - consumed).max(0.0);
            }
        }
    }

    result
}

fn outer_size(child: &LayoutChild) -> SizeF {
    SizeF::new(
        desired_axis(child.preferred.width, child.suggested.width) + child.margin.horizontal(),
        desired_axis(child.preferred.height, child.suggested.height) + child.margin.vertical(),
    )
}

/// Smallest size holding every child including margins when children overlap.
pub(crate) fn measure_aligned(children: &[LayoutChild]) -> SizeF {
    children
        .iter()
        .map(outer_size)
        .fold(SizeF::default(), SizeF::max)
}

pub(crate) fn measure_stacked(orientation: Orientation, children: &[LayoutChild]) -> SizeF {
    children
        .iter()
        .map(outer_size)
        .fold(SizeF::default(), |acc, size| match orientation {
            Orientation::Vertical => SizeF::new(acc.width.max(size.width), acc.height + size.height),
            Orientation::Horizontal => {
                SizeF::new(acc.width + size.width, acc.height.max(size.height))
            }
        })
}
