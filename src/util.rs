use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};

/// 256-bit blake2b digest of `input`.
pub fn hash(input: &[u8]) -> [u8; 32] {
    let digest = Blake2b::<U32>::digest(input);
    let mut buf = [0u8; 32];
    buf.copy_from_slice(&digest);
    buf
}

/// Reads the first four bytes of `bytes` as a little-endian `u32`.
pub fn leading_u32(bytes: &[u8]) -> u32 {
    let mut word = [0u8; 4];
    let n = bytes.len().min(4);
    word[..n].copy_from_slice(&bytes[..n]);
    u32::from_le_bytes(word)
}

/// Short hex preview of a frame for diagnostics.
pub fn preview(bytes: &[u8]) -> String {
    const PREVIEW_LEN: usize = 16;
    if bytes.len() > PREVIEW_LEN {
        format!("{}.. ({} bytes)", hex::encode(&bytes[..PREVIEW_LEN]), bytes.len())
    } else {
        hex::encode(bytes)
    }
}
