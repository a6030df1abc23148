// ============================
// crates/backend-lib/src/storage.rs
// ============================
//! Storage abstraction with a SQLite implementation.
//!
//! Rooms and messages are durable; message bodies are encrypted at rest
//! under the room key and decrypted on read, so callers never handle
//! ciphertext. The anonymity invariant (patient messages carry no sender
//! id) is enforced here, before anything touches the database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::crypto;
use crate::error::AppError;
use crate::messages::Role;

/// Maximum page size for message reads.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// A persisted room: one cipher key, at most one claiming doctor.
#[derive(Debug, Clone)]
pub struct Room {
    pub id: Uuid,
    pub doctor_id: Option<Uuid>,
    pub cipher_key: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A message as returned to callers: content already decrypted, timestamp
/// assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageRecord {
    pub id: Uuid,
    pub room_id: Uuid,
    pub sender_role: Role,
    pub sender_id: Option<Uuid>,
    pub content: String,
    pub translated_content: Option<String>,
    pub language: String,
    pub target_language: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub is_audio_origin: bool,
}

/// Everything needed to append one message.
#[derive(Debug, Clone)]
pub struct MessageDraft {
    pub room_id: Uuid,
    pub sender_role: Role,
    pub sender_id: Option<Uuid>,
    pub content: String,
    pub language: String,
    pub target_language: Option<String>,
    /// Translation plaintext, present only when translation succeeded.
    pub translated_content: Option<String>,
    pub is_audio_origin: bool,
    /// Hex-encoded room key used to encrypt at rest.
    pub cipher_key: String,
}

/// Trait for storage backends
#[async_trait]
pub trait Storage: Send + Sync {
    /// Create a room with a fresh cipher key and no claiming doctor.
    async fn create_room(&self) -> Result<Room, AppError>;

    /// Load a room by id.
    async fn get_room(&self, room_id: Uuid) -> Result<Room, AppError>;

    /// Atomically claim the doctor slot. Succeeds when the slot is empty
    /// or already held by the same doctor; fails with `Conflict` otherwise.
    async fn claim_doctor(&self, room_id: Uuid, doctor_id: Uuid) -> Result<(), AppError>;

    /// Release the doctor slot. Idempotent for the prior claimant: releasing
    /// an already-empty slot succeeds; releasing someone else's claim fails.
    async fn release_doctor(&self, room_id: Uuid, doctor_id: Uuid) -> Result<(), AppError>;

    /// Encrypt and persist one message, returning the record with decrypted
    /// content and the authoritative timestamp.
    async fn append_message(&self, draft: MessageDraft) -> Result<MessageRecord, AppError>;

    /// Read one reverse-chronological page, newest first, decrypting bodies
    /// under the supplied key. `offset` counts records skipped from the
    /// newest end.
    async fn message_page(
        &self,
        room_id: Uuid,
        cipher_key: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<MessageRecord>, AppError>;
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS doctors (
  id TEXT PRIMARY KEY,
  email TEXT UNIQUE NOT NULL,
  password_digest TEXT NOT NULL,
  created_at TEXT NOT NULL,
  updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS users (
  id TEXT PRIMARY KEY,
  email TEXT UNIQUE NOT NULL,
  password_digest TEXT NOT NULL,
  created_at TEXT NOT NULL,
  updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS rooms (
  id TEXT PRIMARY KEY,
  doctor_id TEXT REFERENCES doctors(id),
  cipher_key TEXT NOT NULL,
  created_at TEXT NOT NULL,
  updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS messages (
  id TEXT PRIMARY KEY,
  room_id TEXT NOT NULL REFERENCES rooms(id) ON DELETE CASCADE,
  sender_role TEXT NOT NULL CHECK (sender_role IN ('patient','doctor')),
  sender_id TEXT,
  content TEXT NOT NULL,
  translated_content TEXT,
  language TEXT NOT NULL,
  target_language TEXT,
  timestamp TEXT NOT NULL,
  is_audio_origin INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_messages_room ON messages(room_id);
CREATE INDEX IF NOT EXISTS idx_messages_timestamp ON messages(timestamp);
CREATE INDEX IF NOT EXISTS idx_rooms_doctor ON rooms(doctor_id);
CREATE INDEX IF NOT EXISTS idx_doctors_email ON doctors(email);
CREATE INDEX IF NOT EXISTS idx_users_email ON users(email);
"#;

/// SQLite implementation of the Storage trait
#[derive(Clone)]
pub struct SqliteStorage {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, AppError> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// In-memory database, used by the tests.
    pub fn in_memory() -> Result<Self, AppError> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

fn row_to_room(row: &rusqlite::Row<'_>) -> rusqlite::Result<Room> {
    let id_str: String = row.get(0)?;
    let doctor_str: Option<String> = row.get(1)?;
    let cipher_key: String = row.get(2)?;
    let created_str: String = row.get(3)?;
    let updated_str: String = row.get(4)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let doctor_id = doctor_str
        .map(|s| Uuid::parse_str(&s))
        .transpose()
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
        })?;
    let created_at = parse_ts(&created_str, 3)?;
    let updated_at = parse_ts(&updated_str, 4)?;

    Ok(Room {
        id,
        doctor_id,
        cipher_key,
        created_at,
        updated_at,
    })
}

fn parse_ts(value: &str, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn parse_role(value: &str, idx: usize) -> rusqlite::Result<Role> {
    match value {
        "patient" => Ok(Role::Patient),
        "doctor" => Ok(Role::Doctor),
        other => Err(rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("unknown sender role: {other}").into(),
        )),
    }
}

/// Raw message row before decryption.
struct EncryptedRow {
    id: Uuid,
    room_id: Uuid,
    sender_role: Role,
    sender_id: Option<Uuid>,
    content: String,
    translated_content: Option<String>,
    language: String,
    target_language: Option<String>,
    timestamp: DateTime<Utc>,
    is_audio_origin: bool,
}

fn row_to_encrypted(row: &rusqlite::Row<'_>) -> rusqlite::Result<EncryptedRow> {
    let id_str: String = row.get(0)?;
    let room_str: String = row.get(1)?;
    let role_str: String = row.get(2)?;
    let sender_str: Option<String> = row.get(3)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let room_id = Uuid::parse_str(&room_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let sender_id = sender_str
        .map(|s| Uuid::parse_str(&s))
        .transpose()
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?;
    let ts_str: String = row.get(8)?;

    Ok(EncryptedRow {
        id,
        room_id,
        sender_role: parse_role(&role_str, 2)?,
        sender_id,
        content: row.get(4)?,
        translated_content: row.get(5)?,
        language: row.get(6)?,
        target_language: row.get(7)?,
        timestamp: parse_ts(&ts_str, 8)?,
        is_audio_origin: row.get::<_, i64>(9)? != 0,
    })
}

impl EncryptedRow {
    fn decrypt(self, key: &str) -> Result<MessageRecord, AppError> {
        let content = crypto::decrypt(&self.content, key)?;
        let translated_content = self
            .translated_content
            .map(|body| crypto::decrypt(&body, key))
            .transpose()?;
        Ok(MessageRecord {
            id: self.id,
            room_id: self.room_id,
            sender_role: self.sender_role,
            sender_id: self.sender_id,
            content,
            translated_content,
            language: self.language,
            target_language: self.target_language,
            timestamp: self.timestamp,
            is_audio_origin: self.is_audio_origin,
        })
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn create_room(&self) -> Result<Room, AppError> {
        let room = Room {
            id: Uuid::new_v4(),
            doctor_id: None,
            cipher_key: crypto::generate_key(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO rooms (id, doctor_id, cipher_key, created_at, updated_at)
             VALUES (?1, NULL, ?2, ?3, ?4)",
            params![
                room.id.to_string(),
                room.cipher_key,
                room.created_at.to_rfc3339(),
                room.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(room)
    }

    async fn get_room(&self, room_id: Uuid) -> Result<Room, AppError> {
        let conn = self.conn.lock().await;
        conn.query_row(
            "SELECT id, doctor_id, cipher_key, created_at, updated_at
             FROM rooms WHERE id = ?1",
            params![room_id.to_string()],
            row_to_room,
        )
        .optional()?
        .ok_or_else(|| AppError::NotFound(format!("room {room_id} not found")))
    }

    async fn claim_doctor(&self, room_id: Uuid, doctor_id: Uuid) -> Result<(), AppError> {
        let conn = self.conn.lock().await;
        let affected = conn.execute(
            "UPDATE rooms SET doctor_id = ?2, updated_at = ?3
             WHERE id = ?1 AND (doctor_id IS NULL OR doctor_id = ?2)",
            params![
                room_id.to_string(),
                doctor_id.to_string(),
                Utc::now().to_rfc3339(),
            ],
        )?;
        if affected == 1 {
            return Ok(());
        }

        let exists: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM rooms WHERE id = ?1",
                params![room_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        match exists {
            Some(_) => Err(AppError::Conflict(
                "Room already has a doctor assigned".to_string(),
            )),
            None => Err(AppError::NotFound(format!("room {room_id} not found"))),
        }
    }

    async fn release_doctor(&self, room_id: Uuid, doctor_id: Uuid) -> Result<(), AppError> {
        let conn = self.conn.lock().await;
        let affected = conn.execute(
            "UPDATE rooms SET doctor_id = NULL, updated_at = ?3
             WHERE id = ?1 AND doctor_id = ?2",
            params![
                room_id.to_string(),
                doctor_id.to_string(),
                Utc::now().to_rfc3339(),
            ],
        )?;
        if affected == 1 {
            return Ok(());
        }

        let current: Option<Option<String>> = conn
            .query_row(
                "SELECT doctor_id FROM rooms WHERE id = ?1",
                params![room_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        match current {
            None => Err(AppError::NotFound(format!("room {room_id} not found"))),
            // Releasing an already-empty slot is idempotent.
            Some(None) => Ok(()),
            Some(Some(_)) => Err(AppError::Forbidden(
                "doctor does not hold this room".to_string(),
            )),
        }
    }

    async fn append_message(&self, draft: MessageDraft) -> Result<MessageRecord, AppError> {
        match (draft.sender_role, draft.sender_id) {
            (Role::Patient, Some(_)) => {
                return Err(AppError::InvalidArgument(
                    "patient messages must not carry a sender id".to_string(),
                ))
            }
            (Role::Doctor, None) => {
                return Err(AppError::InvalidArgument(
                    "doctor messages must carry a sender id".to_string(),
                ))
            }
            _ => {}
        }

        let ciphertext = crypto::encrypt(&draft.content, &draft.cipher_key)?;
        let translated_ciphertext = draft
            .translated_content
            .as_deref()
            .map(|t| crypto::encrypt(t, &draft.cipher_key))
            .transpose()?;

        let record = MessageRecord {
            id: Uuid::new_v4(),
            room_id: draft.room_id,
            sender_role: draft.sender_role,
            sender_id: draft.sender_id,
            content: draft.content,
            translated_content: draft.translated_content,
            language: draft.language,
            target_language: draft.target_language,
            timestamp: Utc::now(),
            is_audio_origin: draft.is_audio_origin,
        };

        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO messages
               (id, room_id, sender_role, sender_id, content, translated_content,
                language, target_language, timestamp, is_audio_origin)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                record.id.to_string(),
                record.room_id.to_string(),
                record.sender_role.as_str(),
                record.sender_id.map(|id| id.to_string()),
                ciphertext,
                translated_ciphertext,
                record.language,
                record.target_language,
                record.timestamp.to_rfc3339(),
                record.is_audio_origin as i64,
            ],
        )
        .map_err(|e| match e {
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                AppError::NotFound(format!("room {} not found", record.room_id))
            }
            other => AppError::Sqlite(other),
        })?;

        Ok(record)
    }

    async fn message_page(
        &self,
        room_id: Uuid,
        cipher_key: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<MessageRecord>, AppError> {
        if limit == 0 || limit > MAX_PAGE_LIMIT {
            return Err(AppError::InvalidArgument(format!(
                "limit must be between 1 and {MAX_PAGE_LIMIT}"
            )));
        }

        let conn = self.conn.lock().await;
        let exists: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM rooms WHERE id = ?1",
                params![room_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(AppError::NotFound(format!("room {room_id} not found")));
        }

        let mut stmt = conn.prepare(
            "SELECT id, room_id, sender_role, sender_id, content, translated_content,
                    language, target_language, timestamp, is_audio_origin
             FROM messages
             WHERE room_id = ?1
             ORDER BY timestamp DESC, id DESC
             LIMIT ?2 OFFSET ?3",
        )?;
        let rows = stmt.query_map(
            params![room_id.to_string(), limit, offset],
            row_to_encrypted,
        )?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?.decrypt(cipher_key)?);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(room: &Room, role: Role, sender: Option<Uuid>, content: &str) -> MessageDraft {
        MessageDraft {
            room_id: room.id,
            sender_role: role,
            sender_id: sender,
            content: content.to_string(),
            language: "en".to_string(),
            target_language: None,
            translated_content: None,
            is_audio_origin: false,
            cipher_key: room.cipher_key.clone(),
        }
    }

    #[tokio::test]
    async fn create_and_get_room() {
        let storage = SqliteStorage::in_memory().unwrap();
        let room = storage.create_room().await.unwrap();
        assert!(room.doctor_id.is_none());
        assert_eq!(room.cipher_key.len(), 64);

        let loaded = storage.get_room(room.id).await.unwrap();
        assert_eq!(loaded.id, room.id);
        assert_eq!(loaded.cipher_key, room.cipher_key);
    }

    #[tokio::test]
    async fn get_unknown_room_is_not_found() {
        let storage = SqliteStorage::in_memory().unwrap();
        assert!(matches!(
            storage.get_room(Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn claim_is_exclusive_and_idempotent() {
        let storage = SqliteStorage::in_memory().unwrap();
        let room = storage.create_room().await.unwrap();
        let d1 = Uuid::new_v4();
        let d2 = Uuid::new_v4();

        storage.claim_doctor(room.id, d1).await.unwrap();
        // same doctor may re-claim
        storage.claim_doctor(room.id, d1).await.unwrap();
        // a different doctor may not
        assert!(matches!(
            storage.claim_doctor(room.id, d2).await,
            Err(AppError::Conflict(_))
        ));

        let loaded = storage.get_room(room.id).await.unwrap();
        assert_eq!(loaded.doctor_id, Some(d1));
    }

    #[tokio::test]
    async fn release_requires_claimant_and_is_idempotent() {
        let storage = SqliteStorage::in_memory().unwrap();
        let room = storage.create_room().await.unwrap();
        let d1 = Uuid::new_v4();
        let d2 = Uuid::new_v4();

        storage.claim_doctor(room.id, d1).await.unwrap();
        assert!(matches!(
            storage.release_doctor(room.id, d2).await,
            Err(AppError::Forbidden(_))
        ));

        storage.release_doctor(room.id, d1).await.unwrap();
        // second release by the same doctor leaves the slot null
        storage.release_doctor(room.id, d1).await.unwrap();
        assert!(storage.get_room(room.id).await.unwrap().doctor_id.is_none());

        // once the slot is free, another doctor can claim
        storage.claim_doctor(room.id, d2).await.unwrap();
    }

    #[tokio::test]
    async fn claim_on_unknown_room_is_not_found() {
        let storage = SqliteStorage::in_memory().unwrap();
        assert!(matches!(
            storage.claim_doctor(Uuid::new_v4(), Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn append_enforces_patient_anonymity() {
        let storage = SqliteStorage::in_memory().unwrap();
        let room = storage.create_room().await.unwrap();

        let mut bad = draft(&room, Role::Patient, Some(Uuid::new_v4()), "hi");
        assert!(matches!(
            storage.append_message(bad.clone()).await,
            Err(AppError::InvalidArgument(_))
        ));

        bad.sender_role = Role::Doctor;
        bad.sender_id = None;
        assert!(matches!(
            storage.append_message(bad).await,
            Err(AppError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn append_stores_ciphertext_and_returns_plaintext() {
        let storage = SqliteStorage::in_memory().unwrap();
        let room = storage.create_room().await.unwrap();

        let record = storage
            .append_message(draft(&room, Role::Patient, None, "hello"))
            .await
            .unwrap();
        assert_eq!(record.content, "hello");
        assert!(record.sender_id.is_none());

        // at rest the body is iv:ct, not the plaintext
        let conn = storage.conn.lock().await;
        let stored: String = conn
            .query_row(
                "SELECT content FROM messages WHERE id = ?1",
                params![record.id.to_string()],
                |row| row.get(0),
            )
            .unwrap();
        assert_ne!(stored, "hello");
        assert!(stored.contains(':'));
        drop(conn);

        assert_eq!(crypto::decrypt(&stored, &room.cipher_key).unwrap(), "hello");
    }

    #[tokio::test]
    async fn page_is_reverse_chronological_with_limit_and_offset() {
        let storage = SqliteStorage::in_memory().unwrap();
        let room = storage.create_room().await.unwrap();

        for text in ["one", "two", "three"] {
            storage
                .append_message(draft(&room, Role::Patient, None, text))
                .await
                .unwrap();
            // distinct timestamps so ordering is deterministic
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        let page = storage
            .message_page(room.id, &room.cipher_key, 10, 0)
            .await
            .unwrap();
        let contents: Vec<_> = page.iter().map(|r| r.content.as_str()).collect();
        assert_eq!(contents, vec!["three", "two", "one"]);

        let newest = storage
            .message_page(room.id, &room.cipher_key, 1, 0)
            .await
            .unwrap();
        assert_eq!(newest[0].content, "three");

        let past_end = storage
            .message_page(room.id, &room.cipher_key, 10, 3)
            .await
            .unwrap();
        assert!(past_end.is_empty());
    }

    #[tokio::test]
    async fn page_rejects_out_of_range_limit() {
        let storage = SqliteStorage::in_memory().unwrap();
        let room = storage.create_room().await.unwrap();

        assert!(matches!(
            storage.message_page(room.id, &room.cipher_key, 0, 0).await,
            Err(AppError::InvalidArgument(_))
        ));
        assert!(matches!(
            storage
                .message_page(room.id, &room.cipher_key, MAX_PAGE_LIMIT + 1, 0)
                .await,
            Err(AppError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn page_with_wrong_key_is_a_decrypt_error() {
        let storage = SqliteStorage::in_memory().unwrap();
        let room = storage.create_room().await.unwrap();
        storage
            .append_message(draft(&room, Role::Patient, None, "hello"))
            .await
            .unwrap();

        let wrong = crypto::generate_key();
        assert!(matches!(
            storage.message_page(room.id, &wrong, 10, 0).await,
            Err(AppError::Decrypt(_))
        ));
    }

    #[tokio::test]
    async fn page_on_unknown_room_is_not_found() {
        let storage = SqliteStorage::in_memory().unwrap();
        assert!(matches!(
            storage
                .message_page(Uuid::new_v4(), &crypto::generate_key(), 10, 0)
                .await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn translated_content_round_trips() {
        let storage = SqliteStorage::in_memory().unwrap();
        let room = storage.create_room().await.unwrap();
        let doctor = Uuid::new_v4();

        let mut d = draft(&room, Role::Doctor, Some(doctor), "drink water");
        d.target_language = Some("es".to_string());
        d.translated_content = Some("beba agua".to_string());
        d.is_audio_origin = true;
        storage.append_message(d).await.unwrap();

        let page = storage
            .message_page(room.id, &room.cipher_key, 1, 0)
            .await
            .unwrap();
        assert_eq!(page[0].translated_content.as_deref(), Some("beba agua"));
        assert_eq!(page[0].sender_id, Some(doctor));
        assert!(page[0].is_audio_origin);
    }

    #[tokio::test]
    async fn storage_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("carelink.db");
        let room = {
            let storage = SqliteStorage::new(&path).unwrap();
            storage.create_room().await.unwrap()
        };
        let storage = SqliteStorage::new(&path).unwrap();
        let loaded = storage.get_room(room.id).await.unwrap();
        assert_eq!(loaded.cipher_key, room.cipher_key);
    }
}
