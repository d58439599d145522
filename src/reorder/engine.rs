/// The drag state machine.
///
/// At most one drag is live at a time. A `DragSession` exists exactly while
/// the engine is in the dragging state; it captures the pointer-down origin
/// and the item's original rectangle once, and neither is mutated afterwards
/// (every move is an absolute translation from the origin, which prevents
/// drift at high event rates).
///
/// The host calls `begin_drag` / `update_drag` / `end_drag` from its
/// pointer and touch handlers, and `teardown` from its unmount hook. All
/// four are safe to call in any state; calls that do not apply to the
/// current state are ignored rather than treated as errors, because the
/// host's re-render lifecycle can legitimately produce redundant calls.
use crate::events::{self, HostBridge, ReorderPayload};
use crate::geometry::{Point, Rect};

use super::surface::GridSurface;

/// Transient per-drag state, created on pointer-down and destroyed on
/// release or teardown.
struct DragSession {
    item: String,
    origin: Point,
    origin_rect: Rect,
}

enum DragState {
    Idle,
    Dragging(DragSession),
}

/// One engine instance per mounted collection, destroyed with it.
pub struct ReorderEngine<B: HostBridge> {
    bridge: B,
    state: DragState,
}

impl<B: HostBridge> ReorderEngine<B> {
    pub fn new(bridge: B) -> Self {
        Self {
            bridge,
            state: DragState::Idle,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    /// The id of the item currently being dragged, if any.
    pub fn dragged_item(&self) -> Option<&str> {
        match &self.state {
            DragState::Dragging(session) => Some(&session.item),
            DragState::Idle => None,
        }
    }

    /// Start a drag on `item` at the given pointer position.
    ///
    /// Ignored unless the engine is idle, the collection currently permits
    /// reordering, and the item is a current member. Membership and the
    /// enabled flag are read from the surface now, never cached, since the
    /// host may have re-rendered since the last interaction.
    pub fn begin_drag(&mut self, surface: &mut dyn GridSurface, item: &str, x: f32, y: f32) {
        if self.is_dragging() || !surface.reorder_enabled() {
            return;
        }
        let Some(rect) = surface.rect_of(item) else {
            // Stale id from a pre-re-render element; nothing to drag.
            return;
        };

        // The placeholder takes over the item's slot before the item
        // leaves document flow, so the rest of the grid never reflows at
        // drag start.
        surface.insert_placeholder(item, rect.width, rect.height);
        surface.detach(item, rect);

        log::debug!("drag started on '{}'", item);
        self.state = DragState::Dragging(DragSession {
            item: item.to_string(),
            origin: Point::new(x, y),
            origin_rect: rect,
        });
    }

    /// Track a pointer move. Ignored while idle.
    ///
    /// Repositions the dragged item by the absolute delta from the drag
    /// origin, then hit-tests the pointer for the topmost collection member
    /// other than the dragged item. The candidate's *current* rectangle
    /// (already shifted by any earlier placeholder moves) decides the
    /// insertion side: pointer above its vertical midpoint puts the
    /// placeholder before it, at or below puts it after. No candidate under
    /// the pointer leaves the placeholder where it is.
    pub fn update_drag(&mut self, surface: &mut dyn GridSurface, x: f32, y: f32) {
        let DragState::Dragging(session) = &self.state else {
            return;
        };

        let moved = session
            .origin_rect
            .translated(x - session.origin.x, y - session.origin.y);
        surface.move_detached(&session.item, moved.x, moved.y);

        let candidate = surface
            .items_at(Point::new(x, y))
            .into_iter()
            .find(|id| *id != session.item);
        let Some(candidate) = candidate else {
            return;
        };
        let Some(rect) = surface.rect_of(&candidate) else {
            return;
        };

        if y < rect.mid_y() {
            surface.placeholder_before(&candidate);
        } else {
            surface.placeholder_after(&candidate);
        }
    }

    /// Finish the drag: settle the item into the placeholder's slot and
    /// emit exactly one order-commit event with the collection's resulting
    /// identifier order. Ignored while idle.
    pub fn end_drag(&mut self, surface: &mut dyn GridSurface) {
        let DragState::Dragging(session) = std::mem::replace(&mut self.state, DragState::Idle)
        else {
            return;
        };

        surface.restore(&session.item);
        if surface.has_placeholder() {
            surface.settle_at_placeholder(&session.item);
        }

        let order = surface.order();
        log::debug!("drag finished, committing order of {} items", order.len());
        events::emit(&self.bridge, events::REORDER, &ReorderPayload { order });
    }

    /// Forced cleanup, callable in any state and idempotent. Restores the
    /// dragged item's styling and removes the placeholder but never emits a
    /// commit; the host tears the engine down precisely when the rendered
    /// collection is about to be replaced.
    pub fn teardown(&mut self, surface: &mut dyn GridSurface) {
        if let DragState::Dragging(session) = std::mem::replace(&mut self.state, DragState::Idle)
        {
            log::debug!("drag on '{}' cancelled by teardown", session.item);
            surface.restore(&session.item);
        }
        if surface.has_placeholder() {
            surface.remove_placeholder();
        }
    }
}
