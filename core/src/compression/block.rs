//! compression/block.rs
//! Block encode/decode entry points.
//!
//! A block is `uvarint(decoded_len) ++ tokens`. It carries no checksum and no framing; the
//! stream layer adds both. Encoding never fails on content: when matching does not pay for
//! itself the result is a literal-only block.
use crate::compression::codecs;
use crate::compression::constants::MIN_NON_LITERAL_BLOCK_SIZE;
use crate::compression::decode::{decode_tokens, decoded_len_header};
use crate::compression::dict::Dictionary;
use crate::compression::emit::literal_header_len;
use crate::compression::types::{BlockError, CompressionLevel, Dialect, Encoded};
use crate::compression::window::Window;
use crate::utils::{put_uvarint, uvarint_len};

/// Per-call encoder options.
#[derive(Copy, Clone, Debug, Default)]
pub struct BlockOptions<'d> {
    pub level: CompressionLevel,
    pub dialect: Dialect,
    pub dict: Option<&'d Dictionary>,
}

impl<'d> BlockOptions<'d> {
    pub fn new(level: CompressionLevel) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }

    pub fn with_dict(mut self, dict: &'d Dictionary) -> Self {
        self.dict = Some(dict);
        self
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }
}

/// Upper bound of the encoded size of `src_len` input bytes, for every level and dictionary.
///
/// `None` when the input is too large to be encoded as one block.
pub fn max_encoded_len(src_len: usize) -> Option<usize> {
    let n = src_len as u64;
    let extra: u64 = match n {
        0..=59 => 1,
        60..=255 => 2,
        256..=65_535 => 3,
        65_536..=16_777_215 => 4,
        _ => 5,
    };
    let total = n + uvarint_len(n) as u64 + extra;
    if total > u32::MAX as u64 {
        return None;
    }
    Some(total as usize)
}

/// Token budget: a block must save at least this much to count as compressed.
fn token_limit(src_len: usize) -> usize {
    (src_len - (src_len >> 5)).saturating_sub(5)
}

/// Try to encode `src` into `dst`. On `Literal` the contents of `dst` are unspecified.
pub(crate) fn encode_block(
    dst: &mut [u8],
    src: &[u8],
    opts: &BlockOptions<'_>,
) -> Result<Encoded, BlockError> {
    let need = max_encoded_len(src.len()).ok_or(BlockError::TooLarge { len: src.len() })?;
    if dst.len() < need {
        return Err(BlockError::BufferTooSmall {
            have: dst.len(),
            need,
        });
    }
    if opts.dict.is_some() && opts.dialect == Dialect::Snappy {
        return Err(BlockError::Unsupported("dictionaries need the S2 dialect"));
    }
    let hdr = put_uvarint(dst, src.len() as u64);
    if src.is_empty() {
        return Ok(Encoded::Compressed(hdr));
    }
    if src.len() < MIN_NON_LITERAL_BLOCK_SIZE || opts.level == CompressionLevel::Uncompressed {
        return Ok(Encoded::Literal);
    }

    let win = Window::new(src, opts.dict);
    if win.end() > u32::MAX as usize {
        return Err(BlockError::TooLarge { len: src.len() });
    }
    let initial = opts.dict.map_or(0, |d| d.initial_offset());
    let tokens = &mut dst[hdr..hdr + token_limit(src.len())];
    let written = match opts.level {
        CompressionLevel::Fast => codecs::encode_fast(tokens, &win, initial, opts.dialect),
        CompressionLevel::Better => codecs::encode_better(tokens, &win, initial, opts.dialect),
        CompressionLevel::Best => codecs::encode_best(tokens, &win, initial, opts.dialect),
        CompressionLevel::Uncompressed => None,
    };
    Ok(match written {
        Some(n) => Encoded::Compressed(hdr + n),
        None => Encoded::Literal,
    })
}

/// Write a literal-only block for `src` into `dst`, which must hold `max_encoded_len`.
fn write_literal_block(dst: &mut [u8], src: &[u8]) -> usize {
    let mut d = put_uvarint(dst, src.len() as u64);
    if src.is_empty() {
        return d;
    }
    let n = src.len() - 1;
    let lh = literal_header_len(src.len());
    let code: u8 = match lh {
        1 => (n as u8) << 2,
        2 => 60 << 2,
        3 => 61 << 2,
        4 => 62 << 2,
        _ => 63 << 2,
    };
    dst[d] = code;
    let le = (n as u32).to_le_bytes();
    dst[d + 1..d + lh].copy_from_slice(&le[..lh - 1]);
    d += lh;
    dst[d..d + src.len()].copy_from_slice(src);
    d + src.len()
}

/// Encode `src` into `dst`, returning the number of bytes written.
///
/// `dst` must be at least `max_encoded_len(src.len())` long.
pub fn encode_into(dst: &mut [u8], src: &[u8], opts: BlockOptions<'_>) -> Result<usize, BlockError> {
    match encode_block(dst, src, &opts)? {
        Encoded::Compressed(n) => Ok(n),
        Encoded::Literal => Ok(write_literal_block(dst, src)),
    }
}

/// Like `encode_into`, but reports `Encoded::Literal` instead of writing a literal-only block.
pub fn try_encode_into(
    dst: &mut [u8],
    src: &[u8],
    opts: BlockOptions<'_>,
) -> Result<Encoded, BlockError> {
    encode_block(dst, src, &opts)
}

/// Encode `src` into a fresh buffer.
pub fn encode_with(src: &[u8], opts: BlockOptions<'_>) -> Result<Vec<u8>, BlockError> {
    let need = max_encoded_len(src.len()).ok_or(BlockError::TooLarge { len: src.len() })?;
    let mut out = vec![0u8; need];
    let n = encode_into(&mut out, src, opts)?;
    out.truncate(n);
    Ok(out)
}

pub fn encode(src: &[u8]) -> Result<Vec<u8>, BlockError> {
    encode_with(src, BlockOptions::new(CompressionLevel::Fast))
}

pub fn encode_better(src: &[u8]) -> Result<Vec<u8>, BlockError> {
    encode_with(src, BlockOptions::new(CompressionLevel::Better))
}

pub fn encode_best(src: &[u8]) -> Result<Vec<u8>, BlockError> {
    encode_with(src, BlockOptions::new(CompressionLevel::Best))
}

/// Snappy-compatible block: no repeat tokens, decodable by any Snappy decoder.
pub fn encode_snappy(src: &[u8], level: CompressionLevel) -> Result<Vec<u8>, BlockError> {
    encode_with(src, BlockOptions::new(level).with_dialect(Dialect::Snappy))
}

/// Declared decoded length of a block.
pub fn decoded_len(src: &[u8]) -> Result<usize, BlockError> {
    decoded_len_header(src).map(|(n, _)| n)
}

/// Decode `src` into the front of `dst`, returning the decoded length.
pub fn decode_into(
    dst: &mut [u8],
    src: &[u8],
    dict: Option<&Dictionary>,
) -> Result<usize, BlockError> {
    let (len, hdr) = decoded_len_header(src)?;
    if dst.len() < len {
        return Err(BlockError::BufferTooSmall {
            have: dst.len(),
            need: len,
        });
    }
    decode_tokens(&mut dst[..len], &src[hdr..], dict)?;
    Ok(len)
}

pub fn decode(src: &[u8]) -> Result<Vec<u8>, BlockError> {
    decode_with_dict(src, None)
}

pub fn decode_with_dict(src: &[u8], dict: Option<&Dictionary>) -> Result<Vec<u8>, BlockError> {
    let (len, hdr) = decoded_len_header(src)?;
    let mut out = vec![0u8; len];
    decode_tokens(&mut out, &src[hdr..], dict)?;
    Ok(out)
}
