//! Message codec: bincode serialization with a size ceiling.
//!
//! Framing belongs to the transport; this codec turns one [`Message`] into
//! one payload and back.

use crate::{Message, ProtocolError};

/// Maximum encoded message size in bytes.
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024; // 16 MiB

/// Encode a message for transmission.
pub fn encode(message: &Message) -> Result<Vec<u8>, ProtocolError> {
    let bytes =
        bincode::serialize(message).map_err(|e| ProtocolError::Serialization(e.to_string()))?;
    if bytes.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: bytes.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }
    Ok(bytes)
}

/// Decode a message from raw bytes.
pub fn decode(data: &[u8]) -> Result<Message, ProtocolError> {
    if data.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: data.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }
    bincode::deserialize(data).map_err(|e| ProtocolError::Malformed(e.to_string()))
}
