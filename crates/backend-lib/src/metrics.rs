// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for Prometheus metric keys
pub const WS_CONNECTION: &str = "ws.connection";
pub const WS_DISCONNECTION: &str = "ws.disconnection";
pub const WS_ACTIVE: &str = "ws.active";
pub const ROOM_JOINED: &str = "room.joined";
pub const MESSAGE_SENT: &str = "message.sent";
pub const MESSAGE_QUEUED: &str = "message.queued";
pub const QUEUE_DROPPED: &str = "queue.dropped";
pub const KEY_EXCHANGE: &str = "room.key_exchange";
pub const TRANSLATION_CACHE_HIT: &str = "translation.cache_hit";
pub const TTS_CACHE_HIT: &str = "tts.cache_hit";
pub const STT_REQUEST: &str = "stt.request";
pub const TTS_REQUEST: &str = "tts.request";
