//! Remote engine connection
//!
//! Everything that crosses the process boundary lives here:
//! - [`proxy`]: typed command/query façade ([`proxy::EngineProxy`])
//! - [`transport`]: HTTP request task and event-stream listener
//! - [`lifecycle`]: attach/detach and connection state tracking

pub mod lifecycle;
pub mod proxy;
pub mod transport;

pub use lifecycle::EngineLink;
pub use proxy::{EngineProxy, EngineRequest, PlaybackSnapshot, RepeatMode, ShuffleMode, TrackInfo};
