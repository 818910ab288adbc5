//! compression/decode.rs
//! Token decoder. Every read and write is bounds checked; malformed input is `Corrupt`.
use byteorder::{ByteOrder, LittleEndian};

use crate::compression::constants::{MAX_DICT_SRC_OFFSET, TAG_COPY1, TAG_COPY2, TAG_LITERAL};
use crate::compression::dict::Dictionary;
use crate::compression::types::BlockError;
use crate::utils::read_uvarint;

/// Decoded length and header size of a block.
pub fn decoded_len_header(src: &[u8]) -> Result<(usize, usize), BlockError> {
    let (v, n) = read_uvarint(src).ok_or(BlockError::Corrupt)?;
    if v > u32::MAX as u64 {
        return Err(BlockError::TooLarge { len: v as usize });
    }
    Ok((v as usize, n))
}

/// Decode the token stream `src` into exactly `dst.len()` bytes.
pub(crate) fn decode_tokens(
    dst: &mut [u8],
    src: &[u8],
    dict: Option<&Dictionary>,
) -> Result<(), BlockError> {
    let mut d = 0usize;
    let mut s = 0usize;
    let mut offset = dict.map_or(0, |d| d.initial_offset());

    while s < src.len() {
        let tag = src[s];
        let length;
        match tag & 0x03 {
            TAG_LITERAL => {
                let x = (tag >> 2) as usize;
                let (len, hdr) = match x {
                    0..=59 => (x + 1, 1),
                    _ => {
                        let extra = x - 59;
                        let raw = src.get(s + 1..s + 1 + extra).ok_or(BlockError::Corrupt)?;
                        (LittleEndian::read_uint(raw, extra) as usize + 1, 1 + extra)
                    }
                };
                s += hdr;
                let lit = src.get(s..s + len).ok_or(BlockError::Corrupt)?;
                let out = dst.get_mut(d..d + len).ok_or(BlockError::Corrupt)?;
                out.copy_from_slice(lit);
                d += len;
                s += len;
                continue;
            }
            TAG_COPY1 => {
                let b = *src.get(s + 1).ok_or(BlockError::Corrupt)?;
                s += 2;
                let toffset = ((tag as usize) & 0xe0) << 3 | b as usize;
                let code = ((tag >> 2) & 0x07) as usize;
                if toffset == 0 {
                    // Repeat: keep the previous offset, length may carry extra bytes.
                    length = match code {
                        5 => {
                            let v = *src.get(s).ok_or(BlockError::Corrupt)? as usize;
                            s += 1;
                            v + 4 + 4
                        }
                        6 => {
                            let raw = src.get(s..s + 2).ok_or(BlockError::Corrupt)?;
                            s += 2;
                            LittleEndian::read_u16(raw) as usize + (1 << 8) + 4
                        }
                        7 => {
                            let raw = src.get(s..s + 3).ok_or(BlockError::Corrupt)?;
                            s += 3;
                            LittleEndian::read_u24(raw) as usize + (1 << 16) + 4
                        }
                        _ => code + 4,
                    };
                } else {
                    offset = toffset;
                    length = code + 4;
                }
            }
            TAG_COPY2 => {
                let raw = src.get(s + 1..s + 3).ok_or(BlockError::Corrupt)?;
                length = 1 + (tag >> 2) as usize;
                offset = LittleEndian::read_u16(raw) as usize;
                s += 3;
            }
            _ => {
                let raw = src.get(s + 1..s + 5).ok_or(BlockError::Corrupt)?;
                length = 1 + (tag >> 2) as usize;
                offset = LittleEndian::read_u32(raw) as usize;
                s += 5;
            }
        }

        if offset == 0 || length > dst.len() - d {
            return Err(BlockError::Corrupt);
        }

        if d < offset {
            // Reference before the block start resolves into the dictionary tail.
            let dict = dict.ok_or(BlockError::Corrupt)?;
            if d > MAX_DICT_SRC_OFFSET {
                return Err(BlockError::Corrupt);
            }
            let content = dict.content();
            let back = offset - d;
            if back > content.len() {
                return Err(BlockError::Corrupt);
            }
            let start = content.len() - back;
            let from = content.get(start..start + length).ok_or(BlockError::Corrupt)?;
            dst[d..d + length].copy_from_slice(from);
            d += length;
            continue;
        }

        if offset >= length {
            dst.copy_within(d - offset..d - offset + length, d);
        } else {
            // Overlapping copy: every byte may depend on one just written.
            for i in d..d + length {
                dst[i] = dst[i - offset];
            }
        }
        d += length;
    }

    if d != dst.len() {
        return Err(BlockError::Corrupt);
    }
    Ok(())
}
