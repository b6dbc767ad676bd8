use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("outbound queue is full")]
    QueueFull,

    #[error("outbound queue is closed")]
    QueueClosed,

    #[error("protocol error: {0}")]
    Protocol(#[from] corvid_messages::ProtocolError),
}
