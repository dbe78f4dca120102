//! Bridge error types.

/// Errors on either side of the host bridge.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The channel to the other side is closed.
    #[error("Bridge disconnected")]
    Disconnected,
    /// Failed to open or use the underlying transport.
    #[error("Bridge transport error: {0}")]
    Transport(String),
    /// A frame could not be encoded or decoded.
    #[error("Malformed bridge message: {0}")]
    Malformed(String),
    /// The host could not read the requested asset.
    #[error("Asset '{path}' unavailable: {reason}")]
    Asset { path: String, reason: String },
    /// The host answered with a payload we could not decode.
    #[error("Invalid payload for '{subject}': {reason}")]
    InvalidPayload { subject: String, reason: String },
    /// A host capability is not available on this device.
    #[error("{0} unavailable")]
    Unavailable(String),
}
