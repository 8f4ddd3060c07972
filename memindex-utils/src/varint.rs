use bytes::BufMut;

pub const MAX_VARINT32_LEN: usize = 5;
pub const MAX_VARINT64_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum VarIntError {
    #[error("insufficient bytes")]
    InsufficientBytes,

    #[error("overflow")]
    Overflow,
}

pub trait VarInt: Sized {
    /// Writes the varint at the start of `buf`, returning its length.
    ///
    /// Panics if `buf` is shorter than the encoding.
    fn encode_varint(&self, buf: &mut [u8]) -> usize;

    fn put_varint(&self, buf: &mut impl BufMut) -> usize;

    /// Returns the decoded value and the number of bytes consumed.
    fn from_varint(buf: &[u8]) -> Result<(Self, usize), VarIntError>;
}

impl VarInt for u64 {
    fn encode_varint(&self, buf: &mut [u8]) -> usize {
        let mut n = *self;
        let mut i = 0;
        while n >= 0x80 {
            buf[i] = (n as u8) | 0x80;
            n >>= 7;
            i += 1;
        }
        buf[i] = n as u8;
        i + 1
    }

    fn put_varint(&self, buf: &mut impl BufMut) -> usize {
        let mut scratch = [0u8; MAX_VARINT64_LEN];
        let len = self.encode_varint(&mut scratch);
        buf.put_slice(&scratch[..len]);
        len
    }

    fn from_varint(buf: &[u8]) -> Result<(Self, usize), VarIntError> {
        let mut n = 0u64;
        for (i, &byte) in buf.iter().take(MAX_VARINT64_LEN).enumerate() {
            let part = u64::from(byte & 0x7F);
            // the tenth byte may only carry the single remaining bit
            if i == MAX_VARINT64_LEN - 1 && part > 1 {
                return Err(VarIntError::Overflow);
            }
            n |= part << (7 * i);
            if byte & 0x80 == 0 {
                return Ok((n, i + 1));
            }
        }

        if buf.len() >= MAX_VARINT64_LEN {
            Err(VarIntError::Overflow)
        } else {
            Err(VarIntError::InsufficientBytes)
        }
    }
}

impl VarInt for u32 {
    fn encode_varint(&self, buf: &mut [u8]) -> usize {
        u64::from(*self).encode_varint(buf)
    }

    fn put_varint(&self, buf: &mut impl BufMut) -> usize {
        u64::from(*self).put_varint(buf)
    }

    fn from_varint(buf: &[u8]) -> Result<(Self, usize), VarIntError> {
        let mut n = 0u32;
        for (i, &byte) in buf.iter().take(MAX_VARINT32_LEN).enumerate() {
            let part = u32::from(byte & 0x7F);
            if i == MAX_VARINT32_LEN - 1 && part > 0x0F {
                return Err(VarIntError::Overflow);
            }
            n |= part << (7 * i);
            if byte & 0x80 == 0 {
                return Ok((n, i + 1));
            }
        }

        if buf.len() >= MAX_VARINT32_LEN {
            Err(VarIntError::Overflow)
        } else {
            Err(VarIntError::InsufficientBytes)
        }
    }
}

pub fn varint_len(mut n: u64) -> usize {
    let mut len = 1;
    while n >= 0x80 {
        n >>= 7;
        len += 1;
    }
    len
}

/// Size of `data_len` bytes once framed with a varint32 length prefix.
pub fn length_prefixed_len(data_len: usize) -> usize {
    varint_len(data_len as u64) + data_len
}

/// Appends `varint32(data.len()) ++ data`.
///
/// Panics if `data` is longer than `u32::MAX` bytes.
pub fn put_length_prefixed(buf: &mut impl BufMut, data: &[u8]) -> usize {
    let len =
        u32::try_from(data.len()).unwrap_or_else(|_| panic!("key too long: {}", data.len()));
    let prefix = len.put_varint(buf);
    buf.put_slice(data);
    prefix + data.len()
}

/// Frames `data` into `dst`, which must be exactly `length_prefixed_len(data.len())` bytes.
pub fn encode_length_prefixed(dst: &mut [u8], data: &[u8]) {
    assert_eq!(dst.len(), length_prefixed_len(data.len()));
    let len =
        u32::try_from(data.len()).unwrap_or_else(|_| panic!("key too long: {}", data.len()));
    let prefix = len.encode_varint(dst);
    dst[prefix..].copy_from_slice(data);
}

/// Decodes a varint32 length prefix and returns the framed bytes together with
/// the total length of prefix plus body.
pub fn get_length_prefixed(buf: &[u8]) -> Result<(&[u8], usize), VarIntError> {
    let (len, prefix) = u32::from_varint(buf)?;
    let end = prefix
        .checked_add(len as usize)
        .ok_or(VarIntError::Overflow)?;
    let data = buf.get(prefix..end).ok_or(VarIntError::InsufficientBytes)?;
    Ok((data, end))
}
