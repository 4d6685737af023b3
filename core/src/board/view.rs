//! Rendered board view
//!
//! The view is what a host draws: three lanes of ordered items plus the
//! transient drag affordances. It is rebuilt from [`BoardState`] on every
//! change; the drag controller and drop resolver then mutate it in place
//! until the next render.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::state::BoardState;
use crate::task::{Task, TaskId, TaskPriority, TaskStatus};

/// One of the three status-partitioned columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Lane {
    Backlog,
    InProgress,
    Completed,
}

impl Lane {
    pub const ALL: [Lane; 3] = [Self::Backlog, Self::InProgress, Self::Completed];

    /// Host-facing lane identity
    pub fn id(&self) -> &'static str {
        match self {
            Self::Backlog => "backlog",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
        }
    }

    /// Parse a lane identity; `None` for anything unrecognized
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|lane| lane.id() == id)
    }

    pub fn status(&self) -> TaskStatus {
        match self {
            Self::Backlog => TaskStatus::Pending,
            Self::InProgress => TaskStatus::InProgress,
            Self::Completed => TaskStatus::Completed,
        }
    }

    pub fn for_status(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Pending => Self::Backlog,
            TaskStatus::InProgress => Self::InProgress,
            TaskStatus::Completed => Self::Completed,
        }
    }

    /// Display name used in notices
    pub fn title(&self) -> &'static str {
        match self {
            Self::Backlog => "Backlogs",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
        }
    }

    fn index(&self) -> usize {
        match self {
            Self::Backlog => 0,
            Self::InProgress => 1,
            Self::Completed => 2,
        }
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Vertical extent of a rendered item
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub top: f64,
    pub height: f64,
}

impl Bounds {
    pub fn midpoint(&self) -> f64 {
        self.top + self.height / 2.0
    }
}

/// Maps a lane slot to its on-screen position
pub trait Layout: Send + Sync {
    fn bounds(&self, lane: Lane, slot: usize) -> Bounds;
}

/// Equal-height slots stacked from `top` with `gap` between them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackLayout {
    pub top: f64,
    pub card_height: f64,
    pub gap: f64,
}

impl Default for StackLayout {
    fn default() -> Self {
        Self {
            top: 0.0,
            card_height: 80.0,
            gap: 8.0,
        }
    }
}

impl Layout for StackLayout {
    fn bounds(&self, _lane: Lane, slot: usize) -> Bounds {
        Bounds {
            top: self.top + slot as f64 * (self.card_height + self.gap),
            height: self.card_height,
        }
    }
}

/// A rendered task card
#[derive(Debug, Clone, PartialEq)]
pub struct CardView {
    pub task_id: TaskId,
    pub title: String,
    pub priority: TaskPriority,
    /// Source of a live drag gesture
    pub dragging: bool,
    /// Hidden and about to leave the view
    pub fading: bool,
}

impl CardView {
    fn from_task(task: &Task) -> Self {
        Self {
            task_id: task.id.clone(),
            title: task.title.clone(),
            priority: task.priority,
            dragging: false,
            fading: false,
        }
    }
}

/// An entry in a lane
#[derive(Debug, Clone, PartialEq)]
pub enum ViewItem {
    Card(CardView),
    /// Insertion marker shown while dragging
    Placeholder,
    /// Shown when the lane has no cards
    EmptyState { visible: bool },
}

/// A rendered lane
#[derive(Debug, Clone, PartialEq)]
pub struct LaneView {
    pub lane: Lane,
    pub items: Vec<ViewItem>,
    /// Pointer focus marker while dragging
    pub drag_over: bool,
}

impl LaneView {
    fn empty(lane: Lane) -> Self {
        Self {
            lane,
            items: Vec::new(),
            drag_over: false,
        }
    }

    pub fn cards(&self) -> impl Iterator<Item = &CardView> {
        self.items.iter().filter_map(|item| match item {
            ViewItem::Card(card) => Some(card),
            _ => None,
        })
    }

    /// Card ids in display order
    pub fn card_ids(&self) -> Vec<TaskId> {
        self.cards().map(|c| c.task_id.clone()).collect()
    }

    pub fn has_cards(&self) -> bool {
        self.cards().next().is_some()
    }

    /// Slot index of a card
    pub fn slot_of(&self, id: &TaskId) -> Option<usize> {
        self.items
            .iter()
            .position(|item| matches!(item, ViewItem::Card(c) if &c.task_id == id))
    }

    pub fn has_placeholder(&self) -> bool {
        self.items.iter().any(|i| matches!(i, ViewItem::Placeholder))
    }

    pub fn empty_state_visible(&self) -> bool {
        self.items
            .iter()
            .any(|i| matches!(i, ViewItem::EmptyState { visible: true }))
    }

    pub(crate) fn remove_placeholders(&mut self) {
        self.items.retain(|i| !matches!(i, ViewItem::Placeholder));
    }

    pub(crate) fn set_empty_visible(&mut self, show: bool) {
        for item in &mut self.items {
            if let ViewItem::EmptyState { visible } = item {
                *visible = show;
            }
        }
    }

    /// Show the empty state exactly when the lane holds no cards
    pub(crate) fn normalize_empty_state(&mut self) {
        let has_cards = self.has_cards();
        if !has_cards && !self.items.iter().any(|i| matches!(i, ViewItem::EmptyState { .. })) {
            self.items.push(ViewItem::EmptyState { visible: true });
        }
        self.set_empty_visible(!has_cards);
    }

    /// Slot of `before`, or the end of the lane ahead of any empty-state marker
    fn insertion_slot(&self, before: Option<&TaskId>) -> usize {
        if let Some(slot) = before.and_then(|id| self.slot_of(id)) {
            return slot;
        }
        self.items
            .iter()
            .position(|i| matches!(i, ViewItem::EmptyState { .. }))
            .unwrap_or(self.items.len())
    }

    pub(crate) fn insert_placeholder(&mut self, before: Option<&TaskId>) -> usize {
        self.remove_placeholders();
        let slot = self.insertion_slot(before);
        self.items.insert(slot, ViewItem::Placeholder);
        slot
    }

    pub(crate) fn insert_card(&mut self, card: CardView, before: Option<&TaskId>) {
        let slot = self.insertion_slot(before);
        self.items.insert(slot, ViewItem::Card(card));
        self.set_empty_visible(false);
    }

    fn take_card(&mut self, id: &TaskId) -> Option<CardView> {
        let slot = self.slot_of(id)?;
        match self.items.remove(slot) {
            ViewItem::Card(card) => Some(card),
            _ => None,
        }
    }
}

/// The whole rendered board
#[derive(Debug, Clone, PartialEq)]
pub struct BoardView {
    lanes: [LaneView; 3],
    generation: u64,
}

impl Default for BoardView {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardView {
    pub fn new() -> Self {
        let mut view = Self {
            lanes: Lane::ALL.map(LaneView::empty),
            generation: 0,
        };
        for lane in &mut view.lanes {
            lane.normalize_empty_state();
        }
        view
    }

    /// Rebuild every lane from `state`, skipping `hidden` tasks.
    ///
    /// Returns the new render generation.
    pub fn render(&mut self, state: &BoardState, hidden: &HashSet<TaskId>) -> u64 {
        for lane in Lane::ALL {
            let mut rendered = LaneView::empty(lane);
            rendered.items = state
                .lane(lane.status())
                .filter(|task| !hidden.contains(&task.id))
                .map(|task| ViewItem::Card(CardView::from_task(task)))
                .collect();
            rendered.normalize_empty_state();
            self.lanes[lane.index()] = rendered;
        }
        self.generation += 1;
        self.generation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn lane(&self, lane: Lane) -> &LaneView {
        &self.lanes[lane.index()]
    }

    pub(crate) fn lane_mut(&mut self, lane: Lane) -> &mut LaneView {
        &mut self.lanes[lane.index()]
    }

    pub fn lanes(&self) -> impl Iterator<Item = &LaneView> {
        self.lanes.iter()
    }

    pub(crate) fn lanes_mut(&mut self) -> impl Iterator<Item = &mut LaneView> {
        self.lanes.iter_mut()
    }

    /// Lane currently holding a card
    pub fn lane_of(&self, id: &TaskId) -> Option<Lane> {
        self.lanes
            .iter()
            .find(|l| l.slot_of(id).is_some())
            .map(|l| l.lane)
    }

    pub fn card(&self, id: &TaskId) -> Option<&CardView> {
        self.lanes.iter().flat_map(|l| l.cards()).find(|c| &c.task_id == id)
    }

    pub(crate) fn card_mut(&mut self, id: &TaskId) -> Option<&mut CardView> {
        self.lanes.iter_mut().find_map(|lane| {
            lane.items.iter_mut().find_map(|item| match item {
                ViewItem::Card(card) if &card.task_id == id => Some(card),
                _ => None,
            })
        })
    }

    /// Move a card to `lane`, before `before` or at the end
    pub(crate) fn move_card(&mut self, id: &TaskId, lane: Lane, before: Option<&TaskId>) -> bool {
        let Some(card) = self.lanes.iter_mut().find_map(|l| l.take_card(id)) else {
            return false;
        };
        self.lane_mut(lane).insert_card(card, before);
        true
    }

    /// Drop a card from the view entirely
    pub(crate) fn remove_card(&mut self, id: &TaskId) -> bool {
        let removed = self.lanes.iter_mut().any(|l| l.take_card(id).is_some());
        if removed {
            for lane in &mut self.lanes {
                if !lane.has_cards() {
                    lane.normalize_empty_state();
                }
            }
        }
        removed
    }

    /// True if any lane carries a hover marker or placeholder
    pub fn has_drag_residue(&self) -> bool {
        self.lanes
            .iter()
            .any(|l| l.drag_over || l.has_placeholder())
            || self.lanes.iter().flat_map(|l| l.cards()).any(|c| c.dragging)
    }
}
