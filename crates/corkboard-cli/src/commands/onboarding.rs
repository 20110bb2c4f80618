use std::path::Path;

use corkboard_core::preferences::PreferencesStore;

use crate::cli::OnboardingAction;
use crate::commands::common::default_prefs_dir;
use crate::error::CliError;

pub fn run_onboarding(action: OnboardingAction, prefs_dir: Option<&Path>) -> Result<(), CliError> {
    let store = match prefs_dir {
        Some(dir) => PreferencesStore::in_dir(dir),
        None => PreferencesStore::in_dir(&default_prefs_dir().ok_or(CliError::NoConfigDir)?),
    };
    let completed = apply_onboarding_action(&store, action)?;
    println!(
        "Onboarding {}",
        if completed { "completed" } else { "pending" }
    );
    Ok(())
}

/// Apply `action` and return the resulting flag.
pub fn apply_onboarding_action(
    store: &PreferencesStore,
    action: OnboardingAction,
) -> Result<bool, CliError> {
    match action {
        OnboardingAction::Status => {}
        OnboardingAction::Complete => store.set_onboarding_completed(true)?,
        OnboardingAction::Reset => store.set_onboarding_completed(false)?,
    }
    Ok(store.onboarding_completed()?)
}
