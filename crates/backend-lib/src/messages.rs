// ============================
// crates/backend-lib/src/messages.rs
// ============================
//! Socket event vocabulary.
//!
//! Events are JSON objects of the shape `{"type": "...", "payload": {...}}`.
//! Inbound events come from clients; outbound events are fanned out by the
//! room coordinator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::storage::MessageRecord;

/// Participant role within a room.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Doctor,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::Doctor => "doctor",
        }
    }
}

/// Why peers should consider their copy of the room key stale.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InvalidationReason {
    ParticipantLeft,
    ParticipantDisconnected,
}

/// Which roles are currently present in a room.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Participants {
    pub patient: bool,
    pub doctor: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ClientMessage {
    JoinRoom {
        room_id: Uuid,
        role: Role,
        language: Option<String>,
    },
    SendMessage {
        content: String,
        language: Option<String>,
        #[serde(default)]
        is_audio: bool,
    },
    AudioChunk {
        /// Base64-encoded audio bytes.
        chunk: String,
        is_last: bool,
        language: Option<String>,
    },
    RequestTts {
        text: String,
        language: Option<String>,
        message_id: Option<Uuid>,
    },
    UpdateLanguage {
        language: String,
    },
    LeaveRoom,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerMessage {
    RoomJoined {
        room_id: Uuid,
        role: Role,
        doctor_id: Option<Uuid>,
        participants: Participants,
    },
    UserJoined {
        role: Role,
        doctor_id: Option<Uuid>,
    },
    UserLeft {
        role: Role,
        doctor_id: Option<Uuid>,
    },
    NewMessage {
        id: Uuid,
        room_id: Uuid,
        content: String,
        translated_content: Option<String>,
        language: String,
        target_language: Option<String>,
        sender_role: Role,
        sender_id: Option<Uuid>,
        timestamp: DateTime<Utc>,
        is_audio_origin: bool,
        translation_errored: bool,
    },
    MessageSent {
        id: Uuid,
        timestamp: DateTime<Utc>,
    },
    MessageTranslated {
        id: Uuid,
        translated_content: String,
        target_language: String,
    },
    CipherKeyExchange {
        cipher_key: String,
    },
    CipherKeyInvalidated {
        reason: InvalidationReason,
    },
    AudioTranscribed {
        text: String,
        language: String,
    },
    AudioStream {
        /// Base64-encoded audio frame.
        chunk: String,
        index: usize,
        total: usize,
        is_last: bool,
        message_id: Option<Uuid>,
    },
    SttError {
        message: String,
    },
    TtsError {
        message_id: Option<Uuid>,
        message: String,
    },
    LanguageUpdated {
        language: String,
    },
    Error {
        message: String,
    },
}

impl ServerMessage {
    /// Build a `new_message` event from a persisted record plus the
    /// delivery-time translation outcome.
    pub fn new_message(
        record: &MessageRecord,
        translated_content: Option<String>,
        translation_errored: bool,
    ) -> Self {
        ServerMessage::NewMessage {
            id: record.id,
            room_id: record.room_id,
            content: record.content.clone(),
            translated_content,
            language: record.language.clone(),
            target_language: record.target_language.clone(),
            sender_role: record.sender_role,
            sender_id: record.sender_id,
            timestamp: record.timestamp,
            is_audio_origin: record.is_audio_origin,
            translation_errored,
        }
    }
}
