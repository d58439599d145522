/// Abstraction over the rendered photo grid.
///
/// The host owns the actual elements and may rebuild them on every
/// server-driven re-render, so the engine never holds onto rectangles or
/// membership between interactions: it reads everything through this trait
/// at the moment it needs it, against whatever surface the host passes in.
use crate::geometry::{Point, Rect};

/// The capabilities the reorder engine needs from the rendering layer.
///
/// Items are identified by the opaque string ids the collection renders
/// with. At most one placeholder exists at a time; the engine guarantees it
/// never asks for a second one.
pub trait GridSurface {
    /// Collection-level toggle permitting drag initiation.
    fn reorder_enabled(&self) -> bool;

    /// Item identifiers in current visual order, including a detached item
    /// (which keeps its slot in the element order) and excluding the
    /// placeholder.
    fn order(&self) -> Vec<String>;

    /// Current rectangle of an item, reflecting any reflow the placeholder
    /// has already caused. `None` when the item is not a current member.
    fn rect_of(&self, id: &str) -> Option<Rect>;

    /// In-flow items stacked under the given point, topmost first. Never
    /// includes the placeholder or a detached item.
    fn items_at(&self, point: Point) -> Vec<String>;

    /// Take an item out of document flow, pinned at the given rectangle so
    /// it can be translated freely without reflow.
    fn detach(&mut self, id: &str, rect: Rect);

    /// Reposition a detached item to an absolute location.
    fn move_detached(&mut self, id: &str, x: f32, y: f32);

    /// Return a detached item to normal flow styling at its current slot.
    fn restore(&mut self, id: &str);

    /// Insert a placeholder of the given size immediately before the item,
    /// i.e. in the slot the item is about to vacate.
    fn insert_placeholder(&mut self, before_item: &str, width: f32, height: f32);

    /// Move the placeholder immediately before the candidate item.
    fn placeholder_before(&mut self, candidate: &str);

    /// Move the placeholder immediately after the candidate item.
    fn placeholder_after(&mut self, candidate: &str);

    /// Whether a placeholder currently exists. A re-render may have
    /// destroyed it underneath us.
    fn has_placeholder(&self) -> bool;

    /// Move the item into the placeholder's slot and remove the
    /// placeholder.
    fn settle_at_placeholder(&mut self, id: &str);

    /// Remove the placeholder without settling anything (teardown path).
    fn remove_placeholder(&mut self);
}
