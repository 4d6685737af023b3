//! Drag gesture lifecycle
//!
//! `Idle -> Dragging -> Idle`. At most one session is live; ending a
//! gesture always wipes every drag affordance from every lane, whether or
//! not a drop happened, and is safe to repeat.

use tracing::{debug, warn};

use super::resolver::lane_insertion_point;
use crate::board::{BoardState, BoardView, Layout, Lane};
use crate::error::Error;
use crate::task::{TaskId, TaskStatus};
use crate::Result;

/// The live drag gesture
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub task_id: TaskId,
    /// Status read when the gesture started; not re-read afterwards
    pub origin_status: TaskStatus,
    pub pointer_y: Option<f64>,
    /// Lane and slot of the insertion placeholder
    pub placeholder: Option<(Lane, usize)>,
}

/// Tracks a single drag gesture and owns its visual affordances
#[derive(Debug, Default)]
pub struct DragController {
    session: Option<DragSession>,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    /// Begin a gesture on the card carrying `task_id`.
    ///
    /// A missing id or a card that is not rendered aborts the gesture
    /// without touching any state.
    pub fn start(
        &mut self,
        task_id: Option<&str>,
        state: &BoardState,
        view: &mut BoardView,
    ) -> Result<&DragSession> {
        let Some(raw_id) = task_id.filter(|id| !id.is_empty()) else {
            warn!("drag source carries no task id, gesture suppressed");
            return Err(Error::InvalidInput("drag source has no task id".into()));
        };
        let task_id = TaskId::new(raw_id);

        let origin_status = match (view.card(&task_id), state.get(&task_id)) {
            (Some(_), Some(task)) => task.status,
            _ => {
                warn!(%task_id, "drag source has no live card, gesture suppressed");
                return Err(Error::TaskNotFound(task_id.to_string()));
            }
        };

        if self.session.is_some() {
            self.end(view);
        }

        if let Some(card) = view.card_mut(&task_id) {
            card.dragging = true;
        }
        debug!(%task_id, %origin_status, "drag started");

        Ok(self.session.insert(DragSession {
            task_id,
            origin_status,
            pointer_y: None,
            placeholder: None,
        }))
    }

    /// Pointer moved over `lane` during the gesture
    pub fn over(&mut self, lane: Lane, pointer_y: f64, view: &mut BoardView, layout: &dyn Layout) {
        view.lane_mut(lane).drag_over = true;

        let Some(session) = self.session.as_mut() else {
            return;
        };

        let before = lane_insertion_point(view, layout, lane, Some(&session.task_id), pointer_y);
        let lane_view = view.lane_mut(lane);
        lane_view.set_empty_visible(false);
        let slot = lane_view.insert_placeholder(before.as_ref());

        // One placeholder on the whole board.
        if let Some((previous, _)) = session.placeholder {
            if previous != lane {
                view.lane_mut(previous).remove_placeholders();
            }
        }

        session.pointer_y = Some(pointer_y);
        session.placeholder = Some((lane, slot));
    }

    /// Pointer left `lane`; `left_bounds` is false for leave events fired
    /// while moving between children of the lane
    pub fn leave(&mut self, lane: Lane, left_bounds: bool, view: &mut BoardView) {
        if !left_bounds {
            return;
        }
        let lane_view = view.lane_mut(lane);
        lane_view.drag_over = false;
        lane_view.remove_placeholders();
        if !lane_view.has_cards() {
            lane_view.set_empty_visible(true);
        }
        if let Some(session) = self.session.as_mut() {
            if matches!(session.placeholder, Some((l, _)) if l == lane) {
                session.placeholder = None;
            }
        }
    }

    /// End the gesture, dropped or not. Idempotent.
    pub fn end(&mut self, view: &mut BoardView) {
        for lane in view.lanes_mut() {
            lane.drag_over = false;
            lane.remove_placeholders();
            lane.normalize_empty_state();
        }
        if let Some(session) = self.session.take() {
            if let Some(card) = view.card_mut(&session.task_id) {
                card.dragging = false;
            }
            debug!(task_id = %session.task_id, "drag ended");
        }
    }

    /// Re-mark the dragged card after the view was rebuilt
    pub fn reapply(&self, view: &mut BoardView) {
        if let Some(session) = &self.session {
            if let Some(card) = view.card_mut(&session.task_id) {
                card.dragging = true;
            }
        }
    }
}
