pub mod logging;
pub mod varint;
