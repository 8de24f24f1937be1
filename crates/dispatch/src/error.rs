use std::error::Error as StdError;

/// Crate-wide result type for dispatch and transport operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed errors shared by handlers and the transport seam.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A platform call failed (send, invite export, album upload).
    #[error("transport call failed: {context}: {source}")]
    Transport {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// Persistent storage behind a handler failed.
    #[error("storage operation failed: {context}: {source}")]
    Storage {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// The update lacks a part the handler requires.
    #[error("malformed update: {message}")]
    MalformedUpdate { message: String },

    /// A handler panicked while processing an update.
    #[error("handler panicked: {message}")]
    Panicked { message: String },
}

impl Error {
    #[must_use]
    pub fn transport(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Transport {
            context: context.into(),
            source: Box::new(source),
        }
    }

    #[must_use]
    pub fn storage(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Storage {
            context: context.into(),
            source: Box::new(source),
        }
    }

    #[must_use]
    pub fn malformed_update(message: impl std::fmt::Display) -> Self {
        Self::MalformedUpdate {
            message: message.to_string(),
        }
    }

    /// Whether the failure came from the platform rather than from us.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}
