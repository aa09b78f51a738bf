//! Error definitions for the mapping module

use thiserror::Error;

/// Failures while forwarding input to the engine
#[derive(Debug, Error)]
pub enum MappingError {
    /// The engine side is not draining events fast enough
    #[error("Engine event channel is full, dropped {0}")]
    ChannelFull(String),

    /// The engine side has gone away
    #[error("Engine event channel is closed")]
    ChannelClosed,
}
