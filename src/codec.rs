//! The payload codec: lookup-table sample expansion, track reordering, and channel
//! permutation for Mark 4 / Mark 5B fan-out payloads.
//!
//! Grounded in `init_luts`/`decode_8chan_2bit_fanout4`/`encode_8chan_2bit_fanout4` in
//! `mark4/payload.py`. The Python builds its LUTs as vectorized numpy arrays computed at
//! import time; here they're built once into `[[f32; N]; 256]` tables behind
//! [`std::sync::OnceLock`], the stable-Rust equivalent of that one-time initialization.

use std::sync::OnceLock;

use crate::bcd::reorder64;
use crate::error::{Result, VdifError};

/// The "high" magnitude level for optimal 2-bit quantization of Gaussian-distributed
/// voltages, as used throughout VLBI baseband formats.
pub const OPTIMAL_2BIT_HIGH: f32 = 3.3359;

const LUT2LEVEL: [f32; 2] = [1.0, -1.0];
const LUT4LEVEL: [f32; 4] = [-OPTIMAL_2BIT_HIGH, 1.0, -1.0, OPTIMAL_2BIT_HIGH];

/// Channel permutation applied after track reordering for the 8-channel layouts: a fixed
/// within-quad swap that untangles the interleaving left behind by [`reorder64`]/`reorder32`.
pub const CHANNEL_PERMUTATION_8: [usize; 8] = [0, 2, 1, 3, 4, 6, 5, 7];

fn build_lut2bit(pairs: [(u32, u32); 4]) -> [[f32; 4]; 256] {
    let mut table = [[0f32; 4]; 256];
    for (b, row) in table.iter_mut().enumerate() {
        for (i, &(s, m)) in pairs.iter().enumerate() {
            let sign_bit = (b >> s) & 1;
            let mag_bit = (b >> m) & 1;
            row[i] = LUT4LEVEL[sign_bit + mag_bit * 2];
        }
    }
    table
}

/// Expands one byte to eight 1-bit samples: bit `i` maps directly to a sign level.
pub fn lut1bit(byte: u8) -> [f32; 8] {
    static TABLE: OnceLock<[[f32; 8]; 256]> = OnceLock::new();
    let table = TABLE.get_or_init(|| {
        let mut table = [[0f32; 8]; 256];
        for (b, row) in table.iter_mut().enumerate() {
            for (i, level) in row.iter_mut().enumerate() {
                *level = LUT2LEVEL[(b >> i) & 1];
            }
        }
        table
    });
    table[byte as usize]
}

/// Sign bits at even positions (0,2,4,6), magnitude at (1,3,5,7).
/// Fan-out 1 at 8/16 tracks, fan-out 4 at 32/64 tracks.
pub fn lut2bit1(byte: u8) -> [f32; 4] {
    static TABLE: OnceLock<[[f32; 4]; 256]> = OnceLock::new();
    TABLE.get_or_init(|| build_lut2bit([(0, 1), (2, 3), (4, 5), (6, 7)]))[byte as usize]
}

/// Sign at (0,1,4,5), magnitude at (2,3,6,7). Fan-out 2 at 8/16 tracks, fan-out 1 at 32/64.
pub fn lut2bit2(byte: u8) -> [f32; 4] {
    static TABLE: OnceLock<[[f32; 4]; 256]> = OnceLock::new();
    TABLE.get_or_init(|| build_lut2bit([(0, 2), (1, 3), (4, 6), (5, 7)]))[byte as usize]
}

/// Sign at (0,1,2,3), magnitude at (4,5,6,7). Fan-out 4 at 8/16 tracks, fan-out 2 at 32/64.
pub fn lut2bit3(byte: u8) -> [f32; 4] {
    static TABLE: OnceLock<[[f32; 4]; 256]> = OnceLock::new();
    TABLE.get_or_init(|| build_lut2bit([(0, 4), (1, 5), (2, 6), (3, 7)]))[byte as usize]
}

/// Quantize one real sample to the 2-bit code `lut2bit1`/`lut2bit2`/`lut2bit3` would decode
/// back to the nearest of `{-H, -1, +1, +H}`: positive values set the sign bit, magnitudes
/// at or above 1.0 set the "large" bit. The combination is exactly the inverse of the
/// `sign_bit + mag_bit * 2` indexing [`build_lut2bit`] uses, so decode(encode(x)) is
/// bit-exact for x already in `{-H, -1, +1, +H}`.
fn quantize_2bit(value: f32) -> u8 {
    let sign_bit = (value >= 0.0) as u8;
    let mag_bit = (value.abs() > 1.0) as u8;
    sign_bit | ((1 - (sign_bit ^ mag_bit)) << 1)
}

/// Decode an 8-channel, 2-bit-per-sample, fan-out-4 payload (64 tracks) into a
/// sample-major `[sample][channel]` array.
pub fn decode_8chan_2bit_fanout4(bytes: &[u8]) -> Result<Vec<[f32; 8]>> {
    if bytes.len() % 8 != 0 {
        return Err(VdifError::ShapeMismatch { reason: format!("payload of {} bytes is not a whole number of 64-bit words", bytes.len()) });
    }
    let nwords = bytes.len() / 8;
    let mut out = Vec::with_capacity(nwords * 4);
    for w in 0..nwords {
        let word = u64::from_le_bytes(bytes[w * 8..w * 8 + 8].try_into().unwrap());
        let reordered = reorder64(word).to_le_bytes();
        let mut permuted = [0u8; 8];
        for (c, &src) in CHANNEL_PERMUTATION_8.iter().enumerate() {
            permuted[c] = reordered[src];
        }
        let codes: [[f32; 4]; 8] = std::array::from_fn(|c| lut2bit1(permuted[c]));
        for k in 0..4 {
            out.push(std::array::from_fn(|c| codes[c][k]));
        }
    }
    Ok(out)
}

/// Encode a sample-major `[sample][channel]` array back into an 8-channel, 2-bit,
/// fan-out-4 payload. The exact algebraic inverse of [`decode_8chan_2bit_fanout4`].
pub fn encode_8chan_2bit_fanout4(samples: &[[f32; 8]]) -> Result<Vec<u8>> {
    if samples.len() % 4 != 0 {
        return Err(VdifError::ShapeMismatch { reason: format!("{} samples is not a whole number of fan-out-4 words", samples.len()) });
    }
    let nwords = samples.len() / 4;
    let mut out = Vec::with_capacity(nwords * 8);
    for w in 0..nwords {
        let mut byte_for_channel = [0u8; 8];
        for (c, byte) in byte_for_channel.iter_mut().enumerate() {
            for k in 0..4 {
                let code = quantize_2bit(samples[w * 4 + k][c]);
                let s = 2 * k as u32;
                let m = s + 1;
                *byte |= (code & 1) << s;
                *byte |= ((code >> 1) & 1) << m;
            }
        }
        let mut raw = [0u8; 8];
        for (j, dst) in raw.iter_mut().enumerate() {
            *dst = byte_for_channel[CHANNEL_PERMUTATION_8[j]];
        }
        let word = reorder64(u64::from_le_bytes(raw));
        out.extend_from_slice(&word.to_le_bytes());
    }
    Ok(out)
}

/// The `(channels, bits_per_sample, fanout)` layouts this crate can decode/encode.
/// Unknown keys report [`VdifError::UnsupportedLayout`], matching the original's registry
/// dispatch by `(nchan, bps, fanout)`.
pub fn decode(nchan: u32, bps: u32, fanout: u32, bytes: &[u8]) -> Result<Vec<Vec<f32>>> {
    match (nchan, bps, fanout) {
        (8, 2, 4) => Ok(decode_8chan_2bit_fanout4(bytes)?.into_iter().map(|row| row.to_vec()).collect()),
        _ => Err(VdifError::UnsupportedLayout { nchan, bps, fanout }),
    }
}

/// Inverse of [`decode`].
pub fn encode(nchan: u32, bps: u32, fanout: u32, samples: &[Vec<f32>]) -> Result<Vec<u8>> {
    match (nchan, bps, fanout) {
        (8, 2, 4) => {
            let mut rows = Vec::with_capacity(samples.len());
            for row in samples {
                if row.len() != 8 {
                    return Err(VdifError::ShapeMismatch { reason: format!("expected 8 channels, got {}", row.len()) });
                }
                rows.push(std::array::from_fn(|c| row[c]));
            }
            encode_8chan_2bit_fanout4(&rows)
        }
        _ => Err(VdifError::UnsupportedLayout { nchan, bps, fanout }),
    }
}
