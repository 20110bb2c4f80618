//! Local reminders while a board's lifetime runs out.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::models::Board;

/// Hours after creation at which a reminder fires, with its body.
const REMINDER_SCHEDULE: [(i64, &str); 3] = [
    (12, "It's been 12 hours.."),
    (23, "Hey! Hurry up, you have 59 minutes ⏳"),
    (24, "A lot of memories are here! Let's save it! 📩"),
];

/// One local notification to deliver after `delay`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    /// `<board code>_<seconds after creation>_reminder`
    pub id: String,
    pub title: String,
    pub body: String,
    pub delay: Duration,
}

/// Reminders still ahead of `now` for `board`. Elapsed offsets are skipped.
pub fn reminder_plan(board: &Board, now: DateTime<Utc>) -> Vec<Reminder> {
    let elapsed = now - board.created_at;
    REMINDER_SCHEDULE
        .iter()
        .filter_map(|&(hours, body)| {
            let offset = chrono::Duration::hours(hours);
            let delay = (offset - elapsed).to_std().ok().filter(|delay| !delay.is_zero())?;
            Some(Reminder {
                id: format!("{}_{}_reminder", board.code, offset.num_seconds()),
                title: board.title.clone(),
                body: body.to_string(),
                delay,
            })
        })
        .collect()
}

/// Delivers local notifications. Fire-and-forget, at most once per id.
pub trait NotificationScheduler: Send + Sync {
    /// Returns false when a reminder with the same id was already scheduled.
    fn schedule(&self, reminder: Reminder) -> bool;
}

/// Schedule every pending reminder for `board`, returning how many were new.
pub fn schedule_board_reminders(
    scheduler: &dyn NotificationScheduler,
    board: &Board,
    now: DateTime<Utc>,
) -> usize {
    let mut scheduled = 0;
    for reminder in reminder_plan(board, now) {
        let id = reminder.id.clone();
        if scheduler.schedule(reminder) {
            tracing::debug!("Scheduled reminder {}", id);
            scheduled += 1;
        }
    }
    scheduled
}

/// Sleeps on the Tokio timer and delivers due reminders on a channel.
pub struct TokioNotificationScheduler {
    sender: mpsc::UnboundedSender<Reminder>,
    scheduled: Mutex<HashSet<String>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl TokioNotificationScheduler {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Reminder>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                sender,
                scheduled: Mutex::new(HashSet::new()),
                tasks: Mutex::new(Vec::new()),
            },
            receiver,
        )
    }

    /// Drop every reminder not delivered yet.
    pub fn cancel_all(&self) {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        for task in tasks.drain(..) {
            task.abort();
        }
    }
}

impl NotificationScheduler for TokioNotificationScheduler {
    fn schedule(&self, reminder: Reminder) -> bool {
        let newly_added = self
            .scheduled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(reminder.id.clone());
        if !newly_added {
            return false;
        }

        let sender = self.sender.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(reminder.delay).await;
            if sender.send(reminder).is_err() {
                tracing::debug!("Reminder receiver dropped");
            }
        });
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        tasks.retain(|task| !task.is_finished());
        tasks.push(task);
        true
    }
}

impl Drop for TokioNotificationScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserId;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn board() -> Board {
        let created = Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).unwrap();
        Board::new("Ab1Cd2Ef34", "Picnic", UserId::new("ana"), created)
    }

    #[test]
    fn fresh_board_gets_three_reminders() {
        let board = board();
        let plan = reminder_plan(&board, board.created_at);

        let ids: Vec<&str> = plan.iter().map(|reminder| reminder.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "Ab1Cd2Ef34_43200_reminder",
                "Ab1Cd2Ef34_82800_reminder",
                "Ab1Cd2Ef34_86400_reminder",
            ]
        );
        assert_eq!(plan[0].delay, Duration::from_secs(12 * 3600));
        assert_eq!(plan[0].title, "Picnic");
    }

    #[test]
    fn elapsed_offsets_are_skipped() {
        let board = board();
        let plan = reminder_plan(&board, board.created_at + chrono::Duration::hours(20));

        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].delay, Duration::from_secs(3 * 3600));
        assert!(reminder_plan(&board, board.created_at + chrono::Duration::hours(24)).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn reminders_fire_once_per_id() {
        let board = board();
        let (scheduler, mut delivered) = TokioNotificationScheduler::new();
        let now = board.created_at + chrono::Duration::hours(22);

        assert_eq!(schedule_board_reminders(&scheduler, &board, now), 2);
        assert_eq!(schedule_board_reminders(&scheduler, &board, now), 0);

        let first = delivered.recv().await.unwrap();
        assert_eq!(first.id, "Ab1Cd2Ef34_82800_reminder");
        let second = delivered.recv().await.unwrap();
        assert_eq!(second.id, "Ab1Cd2Ef34_86400_reminder");
        assert!(delivered.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_reminders_never_arrive() {
        let board = board();
        let (scheduler, mut delivered) = TokioNotificationScheduler::new();
        schedule_board_reminders(&scheduler, &board, board.created_at);
        scheduler.cancel_all();

        tokio::time::sleep(Duration::from_secs(25 * 3600)).await;
        assert!(delivered.try_recv().is_err());
    }
}
