//! Drop resolution
//!
//! Maps a drop onto a target lane and an insertion point among the lane's
//! cards, then performs the optimistic move in the view.

use tracing::debug;

use super::controller::DragSession;
use crate::board::{BoardState, BoardView, Layout, Lane, ViewItem};
use crate::sync::SyncOutcome;
use crate::task::{TaskId, TaskStatus};

/// A drop reported by the host
#[derive(Debug, Clone, PartialEq)]
pub struct DropEvent {
    /// Identity of the lane under the pointer
    pub lane_id: String,
    /// Pointer position in the same coordinates as the layout
    pub pointer_y: f64,
    /// Task id carried by the drag payload, if the host could read one
    pub transfer_id: Option<String>,
}

impl DropEvent {
    pub fn new(lane: Lane, pointer_y: f64, task_id: &TaskId) -> Self {
        Self {
            lane_id: lane.id().to_string(),
            pointer_y,
            transfer_id: Some(task_id.to_string()),
        }
    }
}

/// Why a drop did nothing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    /// Neither the payload nor a live session named a task
    MissingTaskId,
    /// The task has no live card, e.g. after a concurrent reload
    StaleCard(TaskId),
}

/// Result of handling a drop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    Aborted(AbortReason),
    /// Same status: the card moved visually, no remote call
    Repositioned,
    /// Status changed and the store was asked to follow
    Synced(SyncOutcome),
}

/// Where a dropped card goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropPlan {
    pub task_id: TaskId,
    pub origin: TaskStatus,
    pub target: Lane,
    /// Card to insert before; `None` appends
    pub before: Option<TaskId>,
}

impl DropPlan {
    /// A same-status move needs no remote call
    pub fn is_reposition(&self) -> bool {
        self.origin == self.target.status()
    }
}

/// Lane for a host lane identity; unknown identities fall back to the backlog
pub fn resolve_lane(lane_id: &str) -> Lane {
    Lane::from_id(lane_id).unwrap_or_else(|| {
        debug!(lane_id, "unrecognized lane, treating as backlog");
        Lane::Backlog
    })
}

/// Pick the sibling to insert before.
///
/// Among siblings whose vertical midpoint lies below the pointer, the one
/// closest to the pointer wins. `None` means append.
pub fn insertion_point<'a, I>(siblings: I, pointer_y: f64) -> Option<TaskId>
where
    I: IntoIterator<Item = (&'a TaskId, f64)>,
{
    let mut closest: Option<(&TaskId, f64)> = None;
    for (id, midpoint) in siblings {
        let offset = pointer_y - midpoint;
        if offset < 0.0 && closest.map_or(true, |(_, best)| offset > best) {
            closest = Some((id, offset));
        }
    }
    closest.map(|(id, _)| id.clone())
}

/// Insertion point within a rendered lane, ignoring the dragged card
pub fn lane_insertion_point(
    view: &BoardView,
    layout: &dyn Layout,
    lane: Lane,
    dragged: Option<&TaskId>,
    pointer_y: f64,
) -> Option<TaskId> {
    let lane_view = view.lane(lane);
    let siblings = lane_view
        .items
        .iter()
        .enumerate()
        .filter_map(|(slot, item)| match item {
            ViewItem::Card(card) if Some(&card.task_id) != dragged && !card.dragging => {
                Some((&card.task_id, layout.bounds(lane, slot).midpoint()))
            }
            _ => None,
        });
    insertion_point(siblings, pointer_y)
}

/// Work out what a drop means without touching the view
pub fn plan_drop(
    event: &DropEvent,
    session: Option<&DragSession>,
    state: &BoardState,
    view: &BoardView,
    layout: &dyn Layout,
) -> Result<DropPlan, AbortReason> {
    let task_id = event
        .transfer_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .map(TaskId::new)
        .or_else(|| session.map(|s| s.task_id.clone()))
        .ok_or(AbortReason::MissingTaskId)?;

    if view.card(&task_id).is_none() {
        return Err(AbortReason::StaleCard(task_id));
    }

    let origin = session
        .filter(|s| s.task_id == task_id)
        .map(|s| s.origin_status)
        .or_else(|| state.get(&task_id).map(|t| t.status))
        .ok_or_else(|| AbortReason::StaleCard(task_id.clone()))?;

    let target = resolve_lane(&event.lane_id);
    let before = lane_insertion_point(view, layout, target, Some(&task_id), event.pointer_y);

    Ok(DropPlan {
        task_id,
        origin,
        target,
        before,
    })
}

/// Optimistically move the card in the view
pub fn apply_drop(plan: &DropPlan, view: &mut BoardView) -> bool {
    view.move_card(&plan.task_id, plan.target, plan.before.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::StackLayout;
    use crate::task::Task;
    use std::collections::HashSet;

    fn ids(raw: &[&str]) -> Vec<TaskId> {
        raw.iter().map(|s| TaskId::new(*s)).collect()
    }

    fn board() -> (BoardState, BoardView) {
        let mut state = BoardState::new();
        state.replace(vec![
            Task::new(1u64, "A"),
            Task::new(2u64, "B").with_status(TaskStatus::InProgress),
            Task::new(3u64, "C").with_status(TaskStatus::InProgress),
        ]);
        let mut view = BoardView::new();
        view.render(&state, &HashSet::new());
        (state, view)
    }

    #[test]
    fn test_insertion_point_picks_nearest_below() {
        let siblings = ids(&["a", "b", "c"]);
        let mids = [40.0, 128.0, 216.0];
        let pairs = || siblings.iter().zip(mids);

        assert_eq!(insertion_point(pairs(), 0.0), Some(TaskId::new("a")));
        assert_eq!(insertion_point(pairs(), 100.0), Some(TaskId::new("b")));
        assert_eq!(insertion_point(pairs(), 200.0), Some(TaskId::new("c")));
        assert_eq!(insertion_point(pairs(), 300.0), None);
        // Exactly on a midpoint is not above it.
        assert_eq!(insertion_point(pairs(), 128.0), Some(TaskId::new("c")));
    }

    #[test]
    fn test_insertion_point_empty() {
        assert_eq!(insertion_point(std::iter::empty(), 10.0), None);
    }

    #[test]
    fn test_resolve_lane_defaults_to_backlog() {
        assert_eq!(resolve_lane("completed"), Lane::Completed);
        assert_eq!(resolve_lane("in-progress"), Lane::InProgress);
        assert_eq!(resolve_lane("nowhere"), Lane::Backlog);
    }

    #[test]
    fn test_plan_between_siblings() {
        let (state, view) = board();
        let layout = StackLayout::default();
        // Slot 1 midpoint is 128; pointer at 100 lands between B and C.
        let event = DropEvent::new(Lane::InProgress, 100.0, &TaskId::new("1"));
        let plan = plan_drop(&event, None, &state, &view, &layout).unwrap();

        assert_eq!(plan.origin, TaskStatus::Pending);
        assert_eq!(plan.target, Lane::InProgress);
        assert_eq!(plan.before, Some(TaskId::new("3")));
        assert!(!plan.is_reposition());
    }

    #[test]
    fn test_plan_same_lane_is_reposition() {
        let (state, view) = board();
        let layout = StackLayout::default();
        let event = DropEvent::new(Lane::InProgress, 0.0, &TaskId::new("3"));
        let plan = plan_drop(&event, None, &state, &view, &layout).unwrap();

        assert!(plan.is_reposition());
        assert_eq!(plan.before, Some(TaskId::new("2")));
    }

    #[test]
    fn test_plan_aborts_without_id_or_card() {
        let (state, view) = board();
        let layout = StackLayout::default();
        let no_id = DropEvent {
            lane_id: "completed".into(),
            pointer_y: 0.0,
            transfer_id: None,
        };
        assert_eq!(
            plan_drop(&no_id, None, &state, &view, &layout),
            Err(AbortReason::MissingTaskId)
        );

        let stale = DropEvent::new(Lane::Completed, 0.0, &TaskId::new("42"));
        assert_eq!(
            plan_drop(&stale, None, &state, &view, &layout),
            Err(AbortReason::StaleCard(TaskId::new("42")))
        );
    }

    #[test]
    fn test_apply_moves_card() {
        let (state, mut view) = board();
        let layout = StackLayout::default();
        let event = DropEvent::new(Lane::InProgress, 100.0, &TaskId::new("1"));
        let plan = plan_drop(&event, None, &state, &view, &layout).unwrap();

        assert!(apply_drop(&plan, &mut view));
        assert_eq!(view.lane(Lane::InProgress).card_ids(), ids(&["2", "1", "3"]));
        assert!(!view.lane(Lane::Backlog).has_cards());
    }
}
