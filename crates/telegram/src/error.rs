use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Telegram(#[from] teloxide::RequestError),

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    /// Another process is polling with the same token.
    #[error("another bot instance is already polling with this token")]
    Conflict,
}

pub type Result<T> = std::result::Result<T, Error>;
