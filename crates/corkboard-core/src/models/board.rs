//! Board model

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{ImageBlob, LocalId, RecordId, UserId};
use crate::lifecycle::board_lifetime;

pub const BOARD_CODE_LETTERS: usize = 5;
pub const BOARD_CODE_DIGITS: usize = 5;

const LETTERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
const DIGITS: &[u8] = b"0123456789";

/// A shared canvas whose content expires 24 hours after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub local_id: LocalId,
    pub remote_id: Option<RecordId>,
    /// Share code people type to join
    pub code: String,
    pub title: String,
    pub owner: UserId,
    pub created_at: DateTime<Utc>,
    pub accepting_members: bool,
    /// Joined users, excluding the owner
    pub members: BTreeSet<UserId>,
    pub cover: Option<ImageBlob>,
}

impl Board {
    /// A new board open to members, created at `created_at`.
    #[must_use]
    pub fn new(
        code: impl Into<String>,
        title: impl Into<String>,
        owner: UserId,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            local_id: LocalId::new(),
            remote_id: None,
            code: code.into(),
            title: title.into(),
            owner,
            created_at,
            accepting_members: true,
            members: BTreeSet::new(),
            cover: None,
        }
    }

    #[must_use]
    pub fn is_owner(&self, user: &UserId) -> bool {
        &self.owner == user
    }

    #[must_use]
    pub fn is_member(&self, user: &UserId) -> bool {
        self.members.contains(user)
    }

    /// Owner or joined member.
    #[must_use]
    pub fn has_access(&self, user: &UserId) -> bool {
        self.is_owner(user) || self.is_member(user)
    }

    /// Instant after which the board is export-only.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.created_at + board_lifetime()
    }

    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }
}

/// Draw a share code: five ASCII letters and five digits in shuffled order.
pub fn generate_board_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut code: Vec<u8> = (0..BOARD_CODE_LETTERS)
        .filter_map(|_| LETTERS.choose(rng).copied())
        .collect();
    code.extend((0..BOARD_CODE_DIGITS).filter_map(|_| DIGITS.choose(rng).copied()));
    code.shuffle(rng);
    code.into_iter().map(char::from).collect()
}
