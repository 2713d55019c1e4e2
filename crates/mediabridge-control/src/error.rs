//! Error types for the bridge.

use thiserror::Error;

/// Errors surfaced synchronously by the bridge.
///
/// Worker failures never appear here; they arrive as status events with the
/// `error` flag set.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The media loop was not running when the bridge tried to use it.
    #[error("media loop is not running")]
    MediaLoopUnavailable,
}
