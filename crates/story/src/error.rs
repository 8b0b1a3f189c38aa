use thiserror::Error;

/// Story generation failures.
///
/// A well-formed reply without any choice is not an error, see
/// [`Generation::NoContent`](crate::Generation::NoContent).
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Nothing to send.
    #[error("Cannot generate a story from an empty conversation")]
    EmptyConversation,

    /// Network or connection error, including timeouts and truncated bodies.
    #[error("Connection error: {0}")]
    Transport(String),

    /// The endpoint answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Server { status: u16, message: String },

    /// The endpoint answered with a body of an unexpected shape.
    #[error("Invalid response: {0}")]
    Decoding(String),
}

impl GenerationError {
    /// True when the endpoint rejected the credential, typically a missing or invalid API key.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Server { status: 401 | 403, .. })
    }
}

/// Key-value storage failures.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to read '{key}': {source}")]
    Read {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write '{key}': {source}")]
    Write {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

/// Favorites persistence failures.
#[derive(Debug, Error)]
pub enum FavoritesError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Failed to encode favorites: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Failed to decode favorites: {0}")]
    Decode(#[source] serde_json::Error),
}
