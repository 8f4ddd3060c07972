#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    SkipList(#[from] memindex_skiplist::error::Error),

    #[error("Duplicate key")]
    DuplicateKey,

    #[error("Key too large: {0} bytes")]
    KeyTooLarge(usize),

    #[error("Invalid options: {0}")]
    InvalidOptions(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
