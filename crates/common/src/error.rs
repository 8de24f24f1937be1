use thiserror::Error;

/// Errors raised while building shared value types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("chat name must not be blank")]
    BlankChatName,
}

pub type Result<T> = std::result::Result<T, Error>;
