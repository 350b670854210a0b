use crate::transport::TransportError;

/// Reasons an envelope could not be produced or delivered.
///
/// None of these reach the host application; hooks log them and skip the
/// envelope.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The host component did not supply a page descriptor.
    #[error("Component has no page info")]
    MissingPageInfo,

    /// The registry is borrowed further up the call stack.
    #[error("Registry is busy")]
    RegistryBusy,

    /// Payload could not be encoded.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Transport refused the message.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}
