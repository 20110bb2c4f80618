//! Debounced, conflict-retrying persistence of board entities.

mod adapter;
mod debounce;
mod retry;

pub use crate::record::SyncEntity;
pub use adapter::{EntitySyncAdapter, SaveGate, SaveTicket};
pub use retry::{save_with_conflict_retry, Mutation};
