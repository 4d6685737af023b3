//! Plain-text rendering of the board

use board_core::board::{BoardView, CardView, Lane};
use board_core::deletion::PendingDeletionInfo;
use board_core::task::{Task, TaskPriority};
use board_core::{BoardEvent, NoticeLevel};

fn priority_tag(priority: TaskPriority) -> &'static str {
    match priority {
        TaskPriority::High => "!!",
        TaskPriority::Medium => "! ",
        TaskPriority::Low => "  ",
    }
}

fn card_line(card: &CardView) -> String {
    format!("  {} #{:<5} {}", priority_tag(card.priority), card.task_id.as_str(), card.title)
}

/// One section per lane, cards in view order
pub fn board(view: &BoardView) -> String {
    let mut out = String::new();
    for lane in Lane::ALL {
        let lane_view = view.lane(lane);
        let cards: Vec<&CardView> = lane_view.cards().collect();
        out.push_str(&format!("{} ({})\n", lane.title(), cards.len()));
        if cards.is_empty() {
            out.push_str("  (no tasks)\n");
        }
        for card in cards {
            out.push_str(&card_line(card));
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

pub fn archived(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return "No archived tasks\n".to_string();
    }
    tasks
        .iter()
        .map(|t| format!("  #{:<5} {}\n", t.id.as_str(), t.title))
        .collect()
}

pub fn pending(entries: &[PendingDeletionInfo]) -> String {
    entries
        .iter()
        .map(|p| format!("  deleting #{} {} in {}s\n", p.task_id, p.title, p.remaining))
        .collect()
}

/// Text for events worth showing on the terminal
pub fn event(event: &BoardEvent) -> Option<String> {
    match event {
        BoardEvent::Notice(notice) => Some(match notice.level {
            NoticeLevel::Success => format!("ok: {}", notice.message),
            NoticeLevel::Error => format!("error: {}", notice.message),
        }),
        BoardEvent::Countdown { task_id, remaining } => {
            Some(format!("undo #{task_id} ({remaining}s)"))
        }
        BoardEvent::DeletionCommitted { task_id } => Some(format!("deleted #{task_id}")),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use board_core::board::BoardState;
    use board_core::task::TaskStatus;
    use board_core::Notice;
    use std::collections::HashSet;

    #[test]
    fn test_board_lists_lanes() {
        let mut state = BoardState::new();
        state.replace(vec![
            Task::new(1u64, "Write docs").with_priority(TaskPriority::High),
            Task::new(2u64, "Ship").with_status(TaskStatus::Completed),
        ]);
        let mut view = BoardView::new();
        view.render(&state, &HashSet::new());

        let text = board(&view);
        assert!(text.contains("Backlogs (1)"));
        assert!(text.contains("!! #1     Write docs"));
        assert!(text.contains("In Progress (0)\n  (no tasks)"));
        assert!(text.contains("Completed (1)"));
    }

    #[test]
    fn test_event_text() {
        assert_eq!(
            event(&BoardEvent::Notice(Notice::error("Delete failed"))).as_deref(),
            Some("error: Delete failed")
        );
        assert_eq!(event(&BoardEvent::Reloaded { generation: 2 }), None);
    }
}
