pub mod code;
pub mod common;
pub mod countdown;
pub mod demo;
pub mod onboarding;
pub mod reminders;
