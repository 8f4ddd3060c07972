use memindex_utils::varint::VarIntError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Malformed key: {0}")]
    MalformedKey(#[from] VarIntError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
