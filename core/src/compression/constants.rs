//! compression/constants.rs
//! Block format tags, size limits and hashing primes.

/// Low two bits of every tag byte.
pub const TAG_LITERAL: u8 = 0x00;
pub const TAG_COPY1: u8 = 0x01;
pub const TAG_COPY2: u8 = 0x02;
pub const TAG_COPY4: u8 = 0x03;

/// Bytes past the last match start the encoders keep in reserve for 8-byte loads.
pub const INPUT_MARGIN: usize = 8;
/// Inputs shorter than this are always emitted as a single literal.
pub const MIN_NON_LITERAL_BLOCK_SIZE: usize = 32;

/// Largest repeat length a single repeat token can carry.
pub const MAX_REPEAT: usize = (1 << 24) - 1;

/// Smallest dictionary content accepted.
pub const MIN_DICT_SIZE: usize = 16;
/// Largest dictionary content accepted.
pub const MAX_DICT_SIZE: usize = 1 << 16;
/// Dictionary copies may only start while fewer output bytes than this have been produced.
pub const MAX_DICT_SRC_OFFSET: usize = (1 << 16) - 1;

pub mod primes {
    pub const PRIME_4_BYTES: u32 = 2_654_435_761;
    pub const PRIME_6_BYTES: u64 = 227_718_039_650_203;
    pub const PRIME_7_BYTES: u64 = 58_295_818_150_454_627;
    pub const PRIME_8_BYTES: u64 = 0xcf1b_bcdc_b7a5_6463;
}
