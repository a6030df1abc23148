// ============================
// crates/backend-lib/src/lib.rs
// ============================
//! Core backend-lib functionality for the carelink room session coordinator.

pub mod auth;
pub mod cache;
pub mod config;
pub mod coordinator;
pub mod crypto;
pub mod error;
pub mod gateway;
pub mod messages;
pub mod metrics;
pub mod provider;
pub mod queue;
pub mod registry;
pub mod storage;
pub mod validation;
pub mod ws_router;

use std::sync::Arc;

use crate::auth::TokenVerifier;
use crate::cache::{ArtifactCache, MemoryCache};
use crate::config::Settings;
use crate::gateway::Gateway;
use crate::provider::SpeechProvider;
use crate::queue::OfflineQueue;
use crate::registry::SessionRegistry;
use crate::storage::Storage;

/// Application state shared across all connections
pub struct AppState<S> {
    /// Storage backend
    pub storage: S,
    /// Socket and room indices
    pub registry: SessionRegistry,
    /// Per-room offline message queue
    pub queue: OfflineQueue,
    /// Translation / STT / TTS front door
    pub gateway: Gateway,
    /// Artifact cache (shared with the gateway)
    pub cache: Arc<MemoryCache>,
    /// Bearer-token verifier
    pub verifier: TokenVerifier,
    /// Settings
    pub settings: Arc<Settings>,
}

impl<S: Storage> AppState<S> {
    /// Create a new application state
    pub fn new(storage: S, settings: Settings, provider: Arc<dyn SpeechProvider>) -> Self {
        let cache = Arc::new(MemoryCache::new(&settings.cache));
        let artifact_cache: Arc<dyn ArtifactCache> = cache.clone();
        let gateway = Gateway::new(provider, artifact_cache);
        let verifier = TokenVerifier::new(
            settings.auth.token_secret.as_bytes(),
            settings.auth.token_ttl_secs,
        );
        let queue = OfflineQueue::new(settings.queue.per_room_cap);

        Self {
            storage,
            registry: SessionRegistry::new(),
            queue,
            gateway,
            cache,
            verifier,
            settings: Arc::new(settings),
        }
    }
}
