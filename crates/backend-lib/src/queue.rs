// ============================
// crates/backend-lib/src/queue.rs
// ============================
//! Per-room FIFO of messages produced while no peer was present.
//!
//! Entries are plaintext snapshots held in memory only; they do not
//! survive a restart. Each room's queue is capped, dropping the oldest
//! entry on overflow.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::VecDeque;
use uuid::Uuid;

use crate::messages::Role;

/// A plaintext snapshot retained for delivery to a late joiner.
#[derive(Debug, Clone)]
pub struct QueuedMessage {
    /// Id of the persisted record this snapshot mirrors.
    pub id: Uuid,
    pub content: String,
    pub sender_role: Role,
    pub sender_id: Option<Uuid>,
    pub language: String,
    pub timestamp: DateTime<Utc>,
    pub is_audio_origin: bool,
}

/// In-memory offline queue, one FIFO per room.
pub struct OfflineQueue {
    rooms: DashMap<Uuid, VecDeque<QueuedMessage>>,
    per_room_cap: usize,
}

impl OfflineQueue {
    pub fn new(per_room_cap: usize) -> Self {
        Self {
            rooms: DashMap::new(),
            per_room_cap,
        }
    }

    /// Append an entry, dropping the oldest when the room is at capacity.
    pub fn enqueue(&self, room_id: Uuid, entry: QueuedMessage) {
        let mut queue = self.rooms.entry(room_id).or_default();
        if queue.len() >= self.per_room_cap {
            queue.pop_front();
            tracing::warn!(%room_id, cap = self.per_room_cap, "offline queue full, dropped oldest entry");
            metrics::counter!(crate::metrics::QUEUE_DROPPED).increment(1);
        }
        queue.push_back(entry);
    }

    /// Return and remove all entries for a room, oldest first.
    pub fn drain(&self, room_id: Uuid) -> Vec<QueuedMessage> {
        self.rooms
            .remove(&room_id)
            .map(|(_, queue)| queue.into_iter().collect())
            .unwrap_or_default()
    }

    pub fn len(&self, room_id: Uuid) -> usize {
        self.rooms.get(&room_id).map_or(0, |q| q.len())
    }

    pub fn is_empty(&self, room_id: Uuid) -> bool {
        self.len(room_id) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(content: &str) -> QueuedMessage {
        QueuedMessage {
            id: Uuid::new_v4(),
            content: content.to_string(),
            sender_role: Role::Patient,
            sender_id: None,
            language: "en".to_string(),
            timestamp: Utc::now(),
            is_audio_origin: false,
        }
    }

    #[test]
    fn drain_returns_fifo_order_and_clears() {
        let queue = OfflineQueue::new(16);
        let room = Uuid::new_v4();
        queue.enqueue(room, entry("first"));
        queue.enqueue(room, entry("second"));

        let drained = queue.drain(room);
        let contents: Vec<_> = drained.iter().map(|e| e.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second"]);
        assert!(queue.is_empty(room));
        assert!(queue.drain(room).is_empty());
    }

    #[test]
    fn rooms_are_independent() {
        let queue = OfflineQueue::new(16);
        let r1 = Uuid::new_v4();
        let r2 = Uuid::new_v4();
        queue.enqueue(r1, entry("a"));
        queue.enqueue(r2, entry("b"));

        assert_eq!(queue.drain(r1).len(), 1);
        assert_eq!(queue.len(r2), 1);
    }

    #[test]
    fn overflow_drops_oldest() {
        let queue = OfflineQueue::new(2);
        let room = Uuid::new_v4();
        queue.enqueue(room, entry("one"));
        queue.enqueue(room, entry("two"));
        queue.enqueue(room, entry("three"));

        let contents: Vec<_> = queue
            .drain(room)
            .into_iter()
            .map(|e| e.content)
            .collect();
        assert_eq!(contents, vec!["two", "three"]);
    }
}
