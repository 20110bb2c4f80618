use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use corkboard_core::lifecycle::{BoardPhase, Countdown, LifecycleTimer};

use crate::commands::common::parse_timestamp;
use crate::error::CliError;

pub async fn run_countdown(created_at: &str, watch: bool) -> Result<(), CliError> {
    let timer = Arc::new(LifecycleTimer::new(parse_timestamp(created_at)?));

    if !watch {
        println!("{}", format_countdown_line(&timer.countdown(), timer.expires_at()));
        return Ok(());
    }

    let (mut receiver, ticker) = timer.spawn_ticker(Duration::from_secs(1));
    loop {
        let countdown = *receiver.borrow_and_update();
        println!("{}", format_countdown_line(&countdown, timer.expires_at()));
        if countdown.phase == BoardPhase::Expired || receiver.changed().await.is_err() {
            break;
        }
    }
    ticker.abort();
    Ok(())
}

pub fn format_countdown_line(countdown: &Countdown, expires_at: DateTime<Utc>) -> String {
    match countdown.phase {
        BoardPhase::Active => format!(
            "{} left (expires {})",
            countdown.display(),
            expires_at.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        BoardPhase::Expired => format!(
            "Expired at {}; the board can only be exported",
            expires_at.format("%Y-%m-%d %H:%M:%S UTC")
        ),
    }
}
