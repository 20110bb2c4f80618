use chrono::Utc;
use corkboard_core::lifecycle::format_countdown;
use corkboard_core::models::{Board, UserId};
use corkboard_core::reminders::{reminder_plan, Reminder};

use crate::commands::common::parse_timestamp;
use crate::error::CliError;

pub fn run_reminders(code: &str, title: &str, created_at: &str) -> Result<(), CliError> {
    let board = Board::new(
        code.trim(),
        title,
        UserId::new("local"),
        parse_timestamp(created_at)?,
    );
    let plan = reminder_plan(&board, Utc::now());
    if plan.is_empty() {
        println!("No reminders left; the board has expired.");
        return Ok(());
    }
    for line in format_reminder_lines(&plan) {
        println!("{line}");
    }
    Ok(())
}

pub fn format_reminder_lines(plan: &[Reminder]) -> Vec<String> {
    plan.iter()
        .map(|reminder| {
            let delay = chrono::Duration::from_std(reminder.delay).unwrap_or_else(|_| chrono::Duration::zero());
            format!(
                "in {}  {}  {}",
                format_countdown(delay),
                reminder.id,
                reminder.body
            )
        })
        .collect()
}
