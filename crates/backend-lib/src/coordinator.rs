// ============================
// crates/backend-lib/src/coordinator.rs
// ============================
//! Room coordinator: the per-socket event state machine.
//!
//! One `SocketHandler` is instantiated per WebSocket connection and owns
//! that connection's view of the world: its socket id, its outbound
//! channel, the bearer token captured from the HTTP upgrade, and the
//! in-flight audio upload buffer. Each inbound event is handled to
//! completion before the next event on the same socket is observed;
//! handlers on different sockets run concurrently.
//!
//! Failure policy: errors are emitted as `error { message }` to the
//! originating socket only. Peers never see a sender's failures beyond
//! the absence of a `new_message`.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::{sleep, Duration};
use uuid::Uuid;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::Utc;

use crate::auth::PrincipalKind;
use crate::error::AppError;
use crate::messages::{ClientMessage, InvalidationReason, Role, ServerMessage};
use crate::queue::QueuedMessage;
use crate::registry::{Session, SessionEntry};
use crate::storage::{MessageDraft, Storage};
use crate::validation;
use crate::AppState;

/// Outbound audio frame size before base64 framing.
const TTS_CHUNK_BYTES: usize = 16 * 1024;
/// Pause between audio frames so a slow receiver is not overwhelmed.
const TTS_FRAME_PACING: Duration = Duration::from_millis(10);
/// Language assumed when a joiner does not state one.
const DEFAULT_LANGUAGE: &str = "en";

/// Per-connection event handler wired to the shared [`AppState`].
pub struct SocketHandler<S: Storage + Send + Sync + 'static> {
    state: Arc<AppState<S>>,
    socket_id: Uuid,
    tx: mpsc::Sender<ServerMessage>,
    /// Bearer token captured from the HTTP upgrade, if any.
    bearer: Option<String>,
    /// Accumulates a streaming audio upload until `is_last`.
    audio_buf: Vec<u8>,
}

impl<S: Storage + Send + Sync + 'static> SocketHandler<S> {
    pub fn new(
        state: Arc<AppState<S>>,
        tx: mpsc::Sender<ServerMessage>,
        bearer: Option<String>,
    ) -> Self {
        Self {
            state,
            socket_id: Uuid::new_v4(),
            tx,
            bearer,
            audio_buf: Vec::new(),
        }
    }

    pub fn socket_id(&self) -> Uuid {
        self.socket_id
    }

    /// Route one inbound event. Errors are surfaced by the caller as an
    /// `error` event to this socket.
    pub async fn handle_event(&mut self, msg: ClientMessage) -> Result<(), AppError> {
        match msg {
            ClientMessage::JoinRoom {
                room_id,
                role,
                language,
            } => self.handle_join(room_id, role, language).await,
            ClientMessage::SendMessage {
                content,
                language,
                is_audio,
            } => self.handle_send(content, language, is_audio).await,
            ClientMessage::AudioChunk {
                chunk,
                is_last,
                language,
            } => self.handle_audio_chunk(chunk, is_last, language).await,
            ClientMessage::RequestTts {
                text,
                language,
                message_id,
            } => self.handle_request_tts(text, language, message_id).await,
            ClientMessage::UpdateLanguage { language } => {
                self.handle_update_language(language).await
            }
            ClientMessage::LeaveRoom => {
                self.handle_leave(InvalidationReason::ParticipantLeft).await
            }
        }
    }

    async fn handle_join(
        &mut self,
        room_id: Uuid,
        role: Role,
        language: Option<String>,
    ) -> Result<(), AppError> {
        if self.state.registry.get(self.socket_id).is_some() {
            return Err(AppError::InvalidArgument(
                "socket already joined a room".to_string(),
            ));
        }

        let language = language.unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
        validation::validate_language(&language)?;

        let doctor_id = match role {
            Role::Doctor => {
                let bearer = self.bearer.as_deref().ok_or_else(|| {
                    AppError::Unauthenticated("missing bearer token".to_string())
                })?;
                let claims = self.state.verifier.verify(bearer)?;
                if claims.kind != PrincipalKind::Doctor {
                    return Err(AppError::Forbidden(
                        "doctor role requires a doctor token".to_string(),
                    ));
                }
                Some(claims.sub)
            }
            Role::Patient => None,
        };

        let room = self.state.storage.get_room(room_id).await?;

        // The HTTP join endpoint claims ahead of the socket join; re-claiming
        // here is idempotent for the same doctor and rejects an interloper.
        if let Some(doctor_id) = doctor_id {
            self.state.storage.claim_doctor(room_id, doctor_id).await?;
        }

        let session = Session {
            socket_id: self.socket_id,
            room_id,
            role,
            doctor_id,
            language,
            connected_at: Utc::now(),
        };
        self.state.registry.insert(session, self.tx.clone());
        metrics::counter!(crate::metrics::ROOM_JOINED).increment(1);

        // Post-join membership.
        let participants = self.state.registry.participants(room_id);
        let room_doctor = doctor_id.or(room.doctor_id);
        self.emit(ServerMessage::RoomJoined {
            room_id,
            role,
            doctor_id: room_doctor,
            participants,
        })
        .await;

        let peers = self.peers(room_id);
        self.broadcast(&peers, vec![ServerMessage::UserJoined { role, doctor_id }])
            .await;

        // Deliver anything that accumulated while this side was absent.
        for queued in self.state.queue.drain(room_id) {
            self.emit(queued_to_new_message(room_id, queued)).await;
        }

        if self.state.registry.both_present(room_id) {
            metrics::counter!(crate::metrics::KEY_EXCHANGE).increment(1);
            let everyone = self.state.registry.room_sessions(room_id);
            self.broadcast(
                &everyone,
                vec![ServerMessage::CipherKeyExchange {
                    cipher_key: room.cipher_key,
                }],
            )
            .await;
        }

        Ok(())
    }

    async fn handle_send(
        &mut self,
        content: String,
        language: Option<String>,
        is_audio: bool,
    ) -> Result<(), AppError> {
        let session = self
            .state
            .registry
            .get(self.socket_id)
            .ok_or(AppError::NoSession)?;
        let language = language.unwrap_or_else(|| session.language.clone());
        self.run_send_pipeline(&session, content, language, is_audio)
            .await
    }

    /// Steps 2–9 of the send contract, shared by text and audio sends.
    async fn run_send_pipeline(
        &self,
        session: &Session,
        content: String,
        language: String,
        is_audio: bool,
    ) -> Result<(), AppError> {
        validation::validate_content(&content)?;
        validation::validate_language(&language)?;

        let room = self.state.storage.get_room(session.room_id).await?;
        let peers = self.peers(session.room_id);

        // Single-peer simplification: the first peer's language is the
        // translation target.
        let target_language = peers
            .first()
            .map(|p| p.session.language.clone())
            .filter(|target| *target != language);

        let (translated, translation_errored) = match target_language.as_deref() {
            Some(target) => {
                let (text, errored) = self
                    .state
                    .gateway
                    .translate(&content, target, Some(&language))
                    .await;
                (Some(text), errored)
            }
            None => (None, false),
        };

        let record = self
            .state
            .storage
            .append_message(MessageDraft {
                room_id: session.room_id,
                sender_role: session.role,
                sender_id: session.doctor_id,
                content,
                language,
                target_language,
                // A failed translation is not persisted.
                translated_content: if translation_errored {
                    None
                } else {
                    translated.clone()
                },
                is_audio_origin: is_audio,
                cipher_key: room.cipher_key,
            })
            .await?;

        if peers.is_empty() {
            self.state.queue.enqueue(
                session.room_id,
                QueuedMessage {
                    id: record.id,
                    content: record.content.clone(),
                    sender_role: record.sender_role,
                    sender_id: record.sender_id,
                    language: record.language.clone(),
                    timestamp: record.timestamp,
                    is_audio_origin: record.is_audio_origin,
                },
            );
            metrics::counter!(crate::metrics::MESSAGE_QUEUED).increment(1);
        } else {
            // On error the peer still sees the original text, flagged.
            let delivered_translation = if translation_errored {
                Some(record.content.clone())
            } else {
                record.translated_content.clone()
            };
            let mut outbound = vec![ServerMessage::new_message(
                &record,
                delivered_translation,
                translation_errored,
            )];
            if let (Some(translation), Some(target), false) = (
                record.translated_content.clone(),
                record.target_language.clone(),
                translation_errored,
            ) {
                outbound.push(ServerMessage::MessageTranslated {
                    id: record.id,
                    translated_content: translation,
                    target_language: target,
                });
            }
            self.broadcast(&peers, outbound).await;
        }

        metrics::counter!(crate::metrics::MESSAGE_SENT).increment(1);
        self.emit(ServerMessage::MessageSent {
            id: record.id,
            timestamp: record.timestamp,
        })
        .await;

        Ok(())
    }

    async fn handle_audio_chunk(
        &mut self,
        chunk: String,
        is_last: bool,
        language: Option<String>,
    ) -> Result<(), AppError> {
        let session = self
            .state
            .registry
            .get(self.socket_id)
            .ok_or(AppError::NoSession)?;

        let bytes = match BASE64.decode(chunk.as_bytes()) {
            Ok(bytes) => bytes,
            Err(_) => {
                self.audio_buf.clear();
                return Err(AppError::InvalidArgument(
                    "audio chunk is not valid base64".to_string(),
                ));
            }
        };
        self.audio_buf.extend_from_slice(&bytes);
        if let Err(e) = validation::validate_audio_size(self.audio_buf.len()) {
            self.audio_buf.clear();
            return Err(e.into());
        }

        if !is_last {
            return Ok(());
        }

        let audio = std::mem::take(&mut self.audio_buf);
        let language = language.unwrap_or_else(|| session.language.clone());
        validation::validate_language(&language)?;

        let Some(text) = self.state.gateway.transcribe(audio, Some(&language)).await else {
            self.emit(ServerMessage::SttError {
                message: "transcription failed".to_string(),
            })
            .await;
            return Ok(());
        };

        self.emit(ServerMessage::AudioTranscribed {
            text: text.clone(),
            language: language.clone(),
        })
        .await;

        self.run_send_pipeline(&session, text, language, true).await
    }

    async fn handle_request_tts(
        &mut self,
        text: String,
        language: Option<String>,
        message_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        let session = self
            .state
            .registry
            .get(self.socket_id)
            .ok_or(AppError::NoSession)?;
        validation::validate_content(&text)?;

        let language = language.unwrap_or_else(|| session.language.clone());
        validation::validate_language(&language)?;

        let Some(audio) = self.state.gateway.synthesize(&text, &language).await else {
            self.emit(ServerMessage::TtsError {
                message_id,
                message: "speech synthesis failed".to_string(),
            })
            .await;
            return Ok(());
        };

        let total = audio.len().div_ceil(TTS_CHUNK_BYTES).max(1);
        for (index, chunk) in audio.chunks(TTS_CHUNK_BYTES).enumerate() {
            self.emit(ServerMessage::AudioStream {
                chunk: BASE64.encode(chunk),
                index,
                total,
                is_last: index + 1 == total,
                message_id,
            })
            .await;
            if index + 1 < total {
                sleep(TTS_FRAME_PACING).await;
            }
        }

        Ok(())
    }

    async fn handle_update_language(&mut self, language: String) -> Result<(), AppError> {
        validation::validate_language(&language)?;
        if !self.state.registry.update_language(self.socket_id, &language) {
            return Err(AppError::NoSession);
        }
        self.emit(ServerMessage::LanguageUpdated { language }).await;
        Ok(())
    }

    /// `leave_room` and transport disconnect share this path. Idempotent:
    /// a socket with no session is a no-op.
    pub async fn handle_leave(&mut self, reason: InvalidationReason) -> Result<(), AppError> {
        self.audio_buf.clear();
        let Some(session) = self.state.registry.remove(self.socket_id) else {
            return Ok(());
        };

        let peers = self.state.registry.room_sessions(session.room_id);
        self.broadcast(
            &peers,
            vec![
                ServerMessage::CipherKeyInvalidated { reason },
                ServerMessage::UserLeft {
                    role: session.role,
                    doctor_id: session.doctor_id,
                },
            ],
        )
        .await;

        if let (Role::Doctor, Some(doctor_id)) = (session.role, session.doctor_id) {
            if let Err(e) = self
                .state
                .storage
                .release_doctor(session.room_id, doctor_id)
                .await
            {
                tracing::warn!(error = %e, room_id = %session.room_id, "failed to release doctor slot");
            }
        }

        Ok(())
    }

    /// Peers of this socket within a room.
    fn peers(&self, room_id: Uuid) -> Vec<SessionEntry> {
        self.state
            .registry
            .room_sessions(room_id)
            .into_iter()
            .filter(|entry| entry.session.socket_id != self.socket_id)
            .collect()
    }

    /// Send to this socket, ignoring a torn-down transport.
    async fn emit(&self, msg: ServerMessage) {
        if self.tx.send(msg).await.is_err() {
            tracing::debug!(socket_id = %self.socket_id, "socket channel closed, dropping event");
        }
    }

    /// Fan a batch of events out to a set of sessions. Each recipient gets
    /// the batch in order; recipients are serviced concurrently.
    async fn broadcast(&self, recipients: &[SessionEntry], messages: Vec<ServerMessage>) {
        if recipients.is_empty() {
            return;
        }

        let mut tasks = JoinSet::new();
        for entry in recipients {
            let tx = entry.tx.clone();
            let batch = messages.clone();
            tasks.spawn(async move {
                for msg in batch {
                    if tx.send(msg).await.is_err() {
                        break;
                    }
                }
            });
        }
        while tasks.join_next().await.is_some() {}
    }
}

fn queued_to_new_message(room_id: Uuid, queued: QueuedMessage) -> ServerMessage {
    ServerMessage::NewMessage {
        id: queued.id,
        room_id,
        content: queued.content,
        translated_content: None,
        language: queued.language,
        target_language: None,
        sender_role: queued.sender_role,
        sender_id: queued.sender_id,
        timestamp: queued.timestamp,
        is_audio_origin: queued.is_audio_origin,
        translation_errored: false,
    }
}
