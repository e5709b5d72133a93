//! Packing and unpacking of the little-endian 32-bit word vectors that back every header.
//!
//! Mirrors `eight_word_struct`/`four_word_struct` from the Python original: a header is
//! nothing but a fixed number of `u32`s, packed little-endian. Everything else in this
//! crate is a view onto one of these two fixed geometries.

use crate::error::{Result, VdifError};

/// Number of bytes in one header word.
pub const WORD_SIZE: usize = 4;

/// Unpack a 4-word (16 byte) little-endian header, used by Mark 5B and legacy VDIF headers.
pub fn unpack_four(bytes: &[u8]) -> Result<[u32; 4]> {
    let mut out = [0u32; 4];
    unpack_into(bytes, &mut out)?;
    Ok(out)
}

/// Pack a 4-word header into 16 bytes, little-endian.
pub fn pack_four(words: &[u32; 4]) -> [u8; 16] {
    let mut out = [0u8; 16];
    pack_into(words, &mut out);
    out
}

/// Unpack an 8-word (32 byte) little-endian header, used by non-legacy VDIF headers.
pub fn unpack_eight(bytes: &[u8]) -> Result<[u32; 8]> {
    let mut out = [0u32; 8];
    unpack_into(bytes, &mut out)?;
    Ok(out)
}

/// Pack an 8-word header into 32 bytes, little-endian.
pub fn pack_eight(words: &[u32; 8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    pack_into(words, &mut out);
    out
}

fn unpack_into(bytes: &[u8], out: &mut [u32]) -> Result<()> {
    let expected = out.len() * WORD_SIZE;
    if bytes.len() < expected {
        return Err(VdifError::short_read(expected, bytes.len()));
    }
    for (i, word) in out.iter_mut().enumerate() {
        let start = i * WORD_SIZE;
        *word = u32::from_le_bytes(bytes[start..start + WORD_SIZE].try_into().unwrap());
    }
    Ok(())
}

fn pack_into(words: &[u32], out: &mut [u8]) {
    for (i, word) in words.iter().enumerate() {
        let start = i * WORD_SIZE;
        out[start..start + WORD_SIZE].copy_from_slice(&word.to_le_bytes());
    }
}
