// ============================
// crates/backend-lib/src/registry.rs
// ============================
//! In-memory session registry: socket → session, room → sockets.
//!
//! Pure data behind sharded maps; the registry never performs I/O. The
//! room index is pruned when the last socket leaves a room.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::messages::{Participants, Role, ServerMessage};

/// Transient per-socket state binding a live transport to one room and role.
#[derive(Debug, Clone)]
pub struct Session {
    pub socket_id: Uuid,
    pub room_id: Uuid,
    pub role: Role,
    /// Verified doctor id; always `None` for patients.
    pub doctor_id: Option<Uuid>,
    pub language: String,
    pub connected_at: DateTime<Utc>,
}

/// A registered session plus its outbound channel.
#[derive(Clone)]
pub struct SessionEntry {
    pub session: Session,
    pub tx: mpsc::Sender<ServerMessage>,
}

/// Socket and room indices for all live connections.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<Uuid, SessionEntry>,
    rooms: DashMap<Uuid, Vec<Uuid>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session and add its socket to the room index.
    pub fn insert(&self, session: Session, tx: mpsc::Sender<ServerMessage>) {
        let socket_id = session.socket_id;
        let room_id = session.room_id;
        self.sessions.insert(socket_id, SessionEntry { session, tx });
        let mut sockets = self.rooms.entry(room_id).or_default();
        if !sockets.contains(&socket_id) {
            sockets.push(socket_id);
        }
    }

    pub fn get(&self, socket_id: Uuid) -> Option<Session> {
        self.sessions.get(&socket_id).map(|e| e.session.clone())
    }

    /// Update a session's language. Returns false when no session exists.
    pub fn update_language(&self, socket_id: Uuid, language: &str) -> bool {
        match self.sessions.get_mut(&socket_id) {
            Some(mut entry) => {
                entry.session.language = language.to_string();
                true
            }
            None => false,
        }
    }

    /// Remove a session, pruning the room index entry when it empties.
    pub fn remove(&self, socket_id: Uuid) -> Option<Session> {
        let (_, entry) = self.sessions.remove(&socket_id)?;
        let room_id = entry.session.room_id;
        if let Some(mut sockets) = self.rooms.get_mut(&room_id) {
            sockets.retain(|id| *id != socket_id);
        }
        self.rooms.remove_if(&room_id, |_, sockets| sockets.is_empty());
        Some(entry.session)
    }

    /// Snapshot of all sessions currently joined to a room.
    pub fn room_sessions(&self, room_id: Uuid) -> Vec<SessionEntry> {
        let Some(sockets) = self.rooms.get(&room_id) else {
            return Vec::new();
        };
        sockets
            .iter()
            .filter_map(|id| self.sessions.get(id).map(|e| e.value().clone()))
            .collect()
    }

    /// True iff the room holds at least one patient and one doctor session.
    pub fn both_present(&self, room_id: Uuid) -> bool {
        let participants = self.participants(room_id);
        participants.patient && participants.doctor
    }

    /// Which roles are currently present in a room.
    pub fn participants(&self, room_id: Uuid) -> Participants {
        let mut participants = Participants {
            patient: false,
            doctor: false,
        };
        for entry in self.room_sessions(room_id) {
            match entry.session.role {
                Role::Patient => participants.patient = true,
                Role::Doctor => participants.doctor = true,
            }
        }
        participants
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(room_id: Uuid, role: Role) -> Session {
        Session {
            socket_id: Uuid::new_v4(),
            room_id,
            role,
            doctor_id: match role {
                Role::Doctor => Some(Uuid::new_v4()),
                Role::Patient => None,
            },
            language: "en".to_string(),
            connected_at: Utc::now(),
        }
    }

    fn tx() -> mpsc::Sender<ServerMessage> {
        mpsc::channel(8).0
    }

    #[test]
    fn insert_get_remove() {
        let registry = SessionRegistry::new();
        let room = Uuid::new_v4();
        let s = session(room, Role::Patient);
        let socket = s.socket_id;

        registry.insert(s, tx());
        assert!(registry.get(socket).is_some());
        assert_eq!(registry.room_sessions(room).len(), 1);

        let removed = registry.remove(socket).unwrap();
        assert_eq!(removed.socket_id, socket);
        assert!(registry.get(socket).is_none());
        assert!(registry.room_sessions(room).is_empty());
    }

    #[test]
    fn remove_is_idempotent() {
        let registry = SessionRegistry::new();
        assert!(registry.remove(Uuid::new_v4()).is_none());
    }

    #[test]
    fn both_present_requires_each_role() {
        let registry = SessionRegistry::new();
        let room = Uuid::new_v4();

        let patient = session(room, Role::Patient);
        registry.insert(patient.clone(), tx());
        assert!(!registry.both_present(room));

        let second_patient = session(room, Role::Patient);
        registry.insert(second_patient, tx());
        assert!(!registry.both_present(room));

        let doctor = session(room, Role::Doctor);
        registry.insert(doctor.clone(), tx());
        assert!(registry.both_present(room));

        registry.remove(patient.socket_id);
        // one patient remains
        assert!(registry.both_present(room));
    }

    #[test]
    fn participants_reflect_post_join_membership() {
        let registry = SessionRegistry::new();
        let room = Uuid::new_v4();
        registry.insert(session(room, Role::Doctor), tx());

        let participants = registry.participants(room);
        assert!(participants.doctor);
        assert!(!participants.patient);
    }

    #[test]
    fn update_language_only_touches_existing_sessions() {
        let registry = SessionRegistry::new();
        let room = Uuid::new_v4();
        let s = session(room, Role::Patient);
        let socket = s.socket_id;
        registry.insert(s, tx());

        assert!(registry.update_language(socket, "es"));
        assert_eq!(registry.get(socket).unwrap().language, "es");
        assert!(!registry.update_language(Uuid::new_v4(), "fr"));
    }

    #[test]
    fn rooms_are_pruned_when_emptied() {
        let registry = SessionRegistry::new();
        let room = Uuid::new_v4();
        let s1 = session(room, Role::Patient);
        let s2 = session(room, Role::Doctor);
        registry.insert(s1.clone(), tx());
        registry.insert(s2.clone(), tx());

        registry.remove(s1.socket_id);
        assert_eq!(registry.room_sessions(room).len(), 1);
        registry.remove(s2.socket_id);
        assert!(registry.rooms.get(&room).is_none());
    }
}
