//! Board records: creation with a unique share code, lookup and membership.
//!
//! Every write to an existing board record goes through the same
//! conflict-retrying conditional save as the board items.

use std::sync::Arc;

use chrono::Utc;

use crate::config::SyncConfig;
use crate::error::{Error, Result};
use crate::models::{generate_board_code, Board, ImageBlob, RecordId, UserId};
use crate::record::{board_from_record, board_to_fields, fields, FieldValue, Record, RecordKind};
use crate::store::{AssetStore, Predicate, RecordStore};
use crate::sync::{save_with_conflict_retry, Mutation};

/// Draws before giving up on finding an unused share code.
const MAX_CODE_ATTEMPTS: usize = 16;

/// What `leave_or_delete` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Departure {
    /// The owner deleted the board
    Deleted,
    /// A member removed themselves
    Left,
}

pub struct BoardService {
    store: Arc<dyn RecordStore>,
    assets: Arc<dyn AssetStore>,
    config: SyncConfig,
}

impl BoardService {
    pub fn new(store: Arc<dyn RecordStore>, assets: Arc<dyn AssetStore>, config: SyncConfig) -> Self {
        Self {
            store,
            assets,
            config,
        }
    }

    /// A share code no existing board uses.
    pub async fn generate_unique_code(&self) -> Result<String> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = generate_board_code(&mut rand::thread_rng());
            if self.find_by_code(&code).await?.is_none() {
                return Ok(code);
            }
            tracing::debug!("Share code {} already taken, drawing again", code);
        }
        Err(Error::InvalidInput(format!(
            "no unused share code after {MAX_CODE_ATTEMPTS} attempts"
        )))
    }

    /// Create a board owned by `owner`, open to members, created now.
    pub async fn create_board(
        &self,
        title: &str,
        owner: &UserId,
        cover: Option<ImageBlob>,
    ) -> Result<Board> {
        let title = title.trim();
        if title.is_empty() {
            return Err(Error::InvalidInput("board title is empty".to_string()));
        }

        let code = self.generate_unique_code().await?;
        let mut board = Board::new(code, title, owner.clone(), Utc::now());
        let cover_ref = match &cover {
            Some(blob) => Some(self.assets.put(blob).await?),
            None => None,
        };
        board.cover = cover;

        let record = self
            .store
            .create(RecordKind::Board, board_to_fields(&board, cover_ref))
            .await?;
        tracing::info!("Created board {} ({}) for {}", record.id, board.code, owner);
        board.remote_id = Some(record.id);
        Ok(board)
    }

    /// Look a board up by the share code people type. Surrounding whitespace is ignored.
    pub async fn fetch_by_code(&self, code: &str) -> Result<Board> {
        let code = code.trim();
        match self.find_by_code(code).await? {
            Some(record) => self.load(&record).await,
            None => Err(Error::NotFound(format!("board with code {code}"))),
        }
    }

    pub async fn fetch_by_id(&self, id: &RecordId) -> Result<Board> {
        let record = self.fetch_record(id).await?;
        self.load(&record).await
    }

    /// Boards owned by `user`.
    pub async fn fetch_owned_by(&self, user: &UserId) -> Result<Vec<Board>> {
        let predicate = Predicate::equals(fields::OWNER, FieldValue::Reference(user.to_record_id()));
        self.load_all(&predicate).await
    }

    /// Boards `user` joined as a member.
    pub async fn fetch_joined_by(&self, user: &UserId) -> Result<Vec<Board>> {
        let predicate = Predicate::contains(fields::MEMBERS, user.to_record_id());
        self.load_all(&predicate).await
    }

    /// Join the board with share code `code`.
    pub async fn join_board(&self, code: &str, user: &UserId) -> Result<Board> {
        let board = self.fetch_by_code(code).await?;
        if !board.accepting_members {
            return Err(Error::NotAcceptingMembers(board.code));
        }
        let Some(id) = board.remote_id else {
            return Err(Error::InvalidReference(format!("board {}", board.code)));
        };
        self.add_member(&id, user).await
    }

    /// Add `user` to the members. Owner and existing members are left as is.
    pub async fn add_member(&self, board_id: &RecordId, user: &UserId) -> Result<Board> {
        let member = user.to_record_id();
        let record = self
            .update(board_id, |record| {
                let values = &mut record.fields;
                let mut members = values.references(fields::MEMBERS)?;
                if values.reference(fields::OWNER)? == Some(&member) || members.contains(&member) {
                    return Ok(Mutation::Unchanged);
                }
                members.push(member.clone());
                values.set(fields::MEMBERS, FieldValue::ReferenceList(members));
                Ok(Mutation::Changed)
            })
            .await?;
        tracing::info!("{} is a member of board {}", user, board_id);
        self.load(&record).await
    }

    pub async fn set_accepting_members(&self, board_id: &RecordId, accepting: bool) -> Result<Board> {
        let record = self
            .update(board_id, |record| {
                if record.fields.flag(fields::IS_ACCEPTING_MEMBERS)? == Some(accepting) {
                    return Ok(Mutation::Unchanged);
                }
                record
                    .fields
                    .set(fields::IS_ACCEPTING_MEMBERS, FieldValue::Int(i64::from(accepting)));
                Ok(Mutation::Changed)
            })
            .await?;
        self.load(&record).await
    }

    pub async fn is_accepting_members(&self, board_id: &RecordId) -> Result<bool> {
        let record = self.fetch_record(board_id).await?;
        Ok(record
            .fields
            .flag(fields::IS_ACCEPTING_MEMBERS)?
            .unwrap_or(false))
    }

    /// The owner deletes the board; a member removes themselves from it.
    pub async fn leave_or_delete(&self, board_id: &RecordId, user: &UserId) -> Result<Departure> {
        let board = self.fetch_by_id(board_id).await?;
        if board.is_owner(user) {
            self.store.delete(board_id).await?;
            tracing::info!("Board {} deleted by its owner", board_id);
            return Ok(Departure::Deleted);
        }
        if !board.is_member(user) {
            return Err(Error::PermissionDenied(format!(
                "{user} is not a member of board {board_id}"
            )));
        }

        let member = user.to_record_id();
        self.update(board_id, |record| {
            let mut members = record.fields.references(fields::MEMBERS)?;
            let before = members.len();
            members.retain(|id| id != &member);
            if members.len() == before {
                return Ok(Mutation::Unchanged);
            }
            record
                .fields
                .set(fields::MEMBERS, FieldValue::ReferenceList(members));
            Ok(Mutation::Changed)
        })
        .await?;
        tracing::info!("{} left board {}", user, board_id);
        Ok(Departure::Left)
    }

    async fn update<F>(&self, board_id: &RecordId, write: F) -> Result<Record>
    where
        F: FnMut(&mut Record) -> Result<Mutation> + Send,
    {
        let current = self.fetch_record(board_id).await?;
        save_with_conflict_retry(
            self.store.as_ref(),
            current,
            self.config.max_conflict_retries,
            write,
        )
        .await
    }

    async fn fetch_record(&self, id: &RecordId) -> Result<Record> {
        self.store
            .fetch(id)
            .await?
            .filter(|record| record.kind == RecordKind::Board)
            .ok_or_else(|| Error::NotFound(format!("board {id}")))
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Record>> {
        let predicate = Predicate::equals(fields::BOARD_CODE, FieldValue::Text(code.to_string()));
        let mut records = self.store.query(RecordKind::Board, &predicate).await?;
        Ok(if records.is_empty() {
            None
        } else {
            Some(records.swap_remove(0))
        })
    }

    async fn load_all(&self, predicate: &Predicate) -> Result<Vec<Board>> {
        let records = self.store.query(RecordKind::Board, predicate).await?;
        let mut boards = Vec::with_capacity(records.len());
        for record in &records {
            boards.push(self.load(record).await?);
        }
        Ok(boards)
    }

    async fn load(&self, record: &Record) -> Result<Board> {
        let cover = match record.fields.asset(fields::IMAGE)? {
            Some(asset) => match self.assets.get(asset).await {
                Ok(blob) => Some(blob),
                Err(Error::NotFound(_)) => {
                    tracing::warn!("Cover {} of board {} is missing", asset, record.id);
                    None
                }
                Err(error) => return Err(error),
            },
            None => None,
        };
        board_from_record(record, cover)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryAssetStore, MemoryRecordStore};
    use pretty_assertions::assert_eq;

    struct Fixture {
        store: Arc<MemoryRecordStore>,
        service: BoardService,
        owner: UserId,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryRecordStore::new());
        let service = BoardService::new(
            store.clone(),
            Arc::new(MemoryAssetStore::new()),
            SyncConfig::default(),
        );
        Fixture {
            store,
            service,
            owner: UserId::new("owner"),
        }
    }

    #[tokio::test]
    async fn created_board_is_open_and_findable_by_code() {
        let f = fixture();
        let board = f.service.create_board("  Trip  ", &f.owner, None).await.unwrap();

        assert_eq!(board.title, "Trip");
        assert!(board.accepting_members);
        assert!(board.members.is_empty());

        let found = f.service.fetch_by_code(&format!(" {} ", board.code)).await.unwrap();
        assert_eq!(found.remote_id, board.remote_id);
        assert_eq!(found.owner, f.owner);
    }

    #[tokio::test]
    async fn empty_title_is_rejected() {
        let f = fixture();
        let error = f.service.create_board("   ", &f.owner, None).await.unwrap_err();
        assert!(matches!(error, Error::InvalidInput(_)));
        assert_eq!(f.store.call_counts().await.creates, 0);
    }

    #[tokio::test]
    async fn cover_image_is_stored_out_of_line() {
        let f = fixture();
        let board = f
            .service
            .create_board("Cover", &f.owner, Some(ImageBlob::jpeg(vec![9, 9])))
            .await
            .unwrap();
        let fetched = f.service.fetch_by_id(board.remote_id.as_ref().unwrap()).await.unwrap();
        assert_eq!(fetched.cover.unwrap().bytes, vec![9, 9]);
    }

    #[tokio::test]
    async fn unknown_code_is_not_found() {
        let f = fixture();
        let error = f.service.fetch_by_code("ABCDE12345").await.unwrap_err();
        assert!(matches!(error, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn join_adds_member_once() {
        let f = fixture();
        let board = f.service.create_board("Party", &f.owner, None).await.unwrap();
        let guest = UserId::new("guest");

        f.service.join_board(&board.code, &guest).await.unwrap();
        let joined = f.service.join_board(&board.code, &guest).await.unwrap();
        assert_eq!(joined.members.len(), 1);
        assert!(joined.is_member(&guest));

        let by_owner = f.service.join_board(&board.code, &f.owner).await.unwrap();
        assert!(!by_owner.is_member(&f.owner));
        // Only the first join wrote.
        assert_eq!(f.store.call_counts().await.conditional_saves, 1);
    }

    #[tokio::test]
    async fn closed_board_rejects_joins() {
        let f = fixture();
        let board = f.service.create_board("Closed", &f.owner, None).await.unwrap();
        let id = board.remote_id.clone().unwrap();
        f.service.set_accepting_members(&id, false).await.unwrap();
        assert!(!f.service.is_accepting_members(&id).await.unwrap());

        let error = f
            .service
            .join_board(&board.code, &UserId::new("late"))
            .await
            .unwrap_err();
        assert!(matches!(error, Error::NotAcceptingMembers(_)));
    }

    #[tokio::test]
    async fn add_member_survives_concurrent_writes() {
        let f = fixture();
        let board = f.service.create_board("Busy", &f.owner, None).await.unwrap();
        let id = board.remote_id.unwrap();

        let mut foreign = crate::record::Fields::new();
        foreign.set(fields::TITLE, FieldValue::Text("Renamed".to_string()));
        f.store.inject_foreign_writes(2, &foreign).await;

        let updated = f.service.add_member(&id, &UserId::new("guest")).await.unwrap();
        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.members.len(), 1);
    }

    #[tokio::test]
    async fn owned_and_joined_listings() {
        let f = fixture();
        let guest = UserId::new("guest");
        let board = f.service.create_board("Mine", &f.owner, None).await.unwrap();
        f.service.join_board(&board.code, &guest).await.unwrap();

        assert_eq!(f.service.fetch_owned_by(&f.owner).await.unwrap().len(), 1);
        assert_eq!(f.service.fetch_joined_by(&guest).await.unwrap().len(), 1);
        assert!(f.service.fetch_owned_by(&guest).await.unwrap().is_empty());
        assert!(f.service.fetch_joined_by(&f.owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn leave_or_delete_depends_on_role() {
        let f = fixture();
        let guest = UserId::new("guest");
        let board = f.service.create_board("Roles", &f.owner, None).await.unwrap();
        let id = board.remote_id.clone().unwrap();
        f.service.join_board(&board.code, &guest).await.unwrap();

        let error = f
            .service
            .leave_or_delete(&id, &UserId::new("stranger"))
            .await
            .unwrap_err();
        assert!(matches!(error, Error::PermissionDenied(_)));

        assert_eq!(f.service.leave_or_delete(&id, &guest).await.unwrap(), Departure::Left);
        assert!(f.service.fetch_joined_by(&guest).await.unwrap().is_empty());

        assert_eq!(
            f.service.leave_or_delete(&id, &f.owner).await.unwrap(),
            Departure::Deleted
        );
        assert!(matches!(
            f.service.fetch_by_id(&id).await.unwrap_err(),
            Error::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn generated_codes_are_unused() {
        let f = fixture();
        let board = f.service.create_board("One", &f.owner, None).await.unwrap();
        let code = f.service.generate_unique_code().await.unwrap();
        assert_ne!(code, board.code);
        assert_eq!(code.len(), 10);
    }
}
