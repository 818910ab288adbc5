//! Checksum and variable-length integer helpers shared by the block codec, framing and index.

/// Masked CRC-32C (Castagnoli) of `data`, as stored in every data chunk.
///
/// The mask keeps checksums of data that itself contains checksums from colliding.
pub fn compute_checksum(data: &[u8]) -> u32 {
    let c = crc32c::crc32c(data);
    ((c >> 15) | (c << 17)).wrapping_add(0xa282_ead8)
}

/// Number of bytes `put_uvarint` uses for `v`.
pub fn uvarint_len(mut v: u64) -> usize {
    let mut n = 1;
    while v >= 0x80 {
        v >>= 7;
        n += 1;
    }
    n
}

/// Write `v` as LEB128 into `dst`, returning the number of bytes used.
///
/// Panics if `dst` is shorter than `uvarint_len(v)`.
pub fn put_uvarint(dst: &mut [u8], mut v: u64) -> usize {
    let mut i = 0;
    while v >= 0x80 {
        dst[i] = (v as u8) | 0x80;
        v >>= 7;
        i += 1;
    }
    dst[i] = v as u8;
    i + 1
}

/// Append `v` as LEB128.
pub fn append_uvarint(out: &mut Vec<u8>, v: u64) {
    let mut tmp = [0u8; 10];
    let n = put_uvarint(&mut tmp, v);
    out.extend_from_slice(&tmp[..n]);
}

/// Parse a LEB128 value from the front of `src`.
///
/// Returns `None` on truncation or when the value overflows 64 bits.
pub fn read_uvarint(src: &[u8]) -> Option<(u64, usize)> {
    let mut x: u64 = 0;
    let mut shift = 0u32;
    for (i, &b) in src.iter().enumerate() {
        if i == 10 || (i == 9 && b > 1) {
            return None;
        }
        if b < 0x80 {
            return Some((x | (b as u64) << shift, i + 1));
        }
        x |= ((b & 0x7f) as u64) << shift;
        shift += 7;
    }
    None
}

/// Append `v` zig-zag encoded.
pub fn append_varint(out: &mut Vec<u8>, v: i64) {
    append_uvarint(out, ((v << 1) ^ (v >> 63)) as u64);
}

/// Parse a zig-zag encoded value from the front of `src`.
pub fn read_varint(src: &[u8]) -> Option<(i64, usize)> {
    let (ux, n) = read_uvarint(src)?;
    let x = (ux >> 1) as i64;
    Some((if ux & 1 != 0 { !x } else { x }, n))
}

/// Clamp a requested block size into `[min, max]`.
pub fn clamp_block_size(requested: usize, min: usize, max: usize) -> usize {
    requested.clamp(min, max)
}
