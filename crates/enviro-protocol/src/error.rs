use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("failed to decode {entity}: {reason}")]
    Decode { entity: &'static str, reason: String },

    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),
}
