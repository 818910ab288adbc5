//! compression/window.rs
//! Match-finding view over `dictionary ++ block`.
//!
//! Positions handed out by the match finders are positions in this combined buffer. The
//! block starts at `base()`; everything before it is dictionary content. A candidate inside
//! the dictionary may only be referenced while the output position is small enough for the
//! decoder to accept it, and a dictionary match never runs past the dictionary end.
use std::borrow::Cow;

use byteorder::{ByteOrder, LittleEndian};

use crate::compression::constants::{primes, INPUT_MARGIN, MAX_DICT_SRC_OFFSET};
use crate::compression::dict::Dictionary;

/// Dictionary copies must start early enough that every token of a split copy
/// (head plus repeat tail) still starts inside the decoder's dictionary range.
const DICT_COPY_START_LIMIT: usize = MAX_DICT_SRC_OFFSET - 64;

pub(crate) struct Window<'a> {
    buf: Cow<'a, [u8]>,
    base: usize,
}

impl<'a> Window<'a> {
    pub fn new(src: &'a [u8], dict: Option<&Dictionary>) -> Self {
        match dict {
            None => Self {
                buf: Cow::Borrowed(src),
                base: 0,
            },
            Some(d) => {
                let content = d.content();
                let mut buf = Vec::with_capacity(content.len() + src.len());
                buf.extend_from_slice(content);
                buf.extend_from_slice(src);
                Self {
                    buf: Cow::Owned(buf),
                    base: content.len(),
                }
            }
        }
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    #[inline]
    pub fn base(&self) -> usize {
        self.base
    }

    #[inline]
    pub fn end(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn load32(&self, i: usize) -> u32 {
        LittleEndian::read_u32(&self.buf[i..])
    }

    #[inline]
    pub fn load64(&self, i: usize) -> u64 {
        LittleEndian::read_u64(&self.buf[i..])
    }

    /// First position the scan starts at. Without a dictionary position 0 has nothing to match.
    pub fn scan_start(&self) -> usize {
        self.base.max(1)
    }

    /// Last position a match may start at with 8-byte loads staying in bounds.
    pub fn scan_limit(&self) -> usize {
        self.end().saturating_sub(INPUT_MARGIN)
    }

    /// Whether `cand` may be referenced from position `s`.
    #[inline]
    pub fn usable(&self, cand: usize, s: usize) -> bool {
        cand < s && (cand >= self.base || s - self.base <= DICT_COPY_START_LIMIT)
    }

    /// Number of equal bytes starting at `cand` and `s`, bounded by the end of input and,
    /// for dictionary candidates, by the dictionary end.
    pub fn match_len(&self, cand: usize, s: usize) -> usize {
        let ceiling = if cand < self.base { self.base } else { self.end() };
        let max = (self.end() - s).min(ceiling - cand);
        let mut n = 0;
        while n + 8 <= max {
            let diff = self.load64(cand + n) ^ self.load64(s + n);
            if diff != 0 {
                return n + (diff.trailing_zeros() / 8) as usize;
            }
            n += 8;
        }
        while n < max && self.buf[cand + n] == self.buf[s + n] {
            n += 1;
        }
        n
    }

    /// Length of a usable match of at least 4 bytes between `cand` and `s`.
    #[inline]
    pub fn try_match(&self, cand: usize, s: usize) -> Option<usize> {
        if !self.usable(cand, s) || self.load32(cand) != self.load32(s) {
            return None;
        }
        let n = self.match_len(cand, s);
        (n >= 4).then_some(n)
    }

    /// Grow a match backwards while bytes agree, never moving `s` below `floor`
    /// and never letting a block candidate cross into the dictionary.
    pub fn extend_back(&self, mut cand: usize, mut s: usize, floor: usize) -> (usize, usize) {
        let lower = if cand >= self.base { self.base } else { 0 };
        while cand > lower && s > floor && self.buf[cand - 1] == self.buf[s - 1] {
            cand -= 1;
            s -= 1;
        }
        (cand, s)
    }
}

/// Table size in bits for a window of `len` bytes, capped at `max_bits`.
pub(crate) fn table_bits(len: usize, max_bits: u32) -> u32 {
    let need = usize::BITS - len.leading_zeros();
    need.clamp(10, max_bits)
}

#[inline]
pub(crate) fn hash4(u: u64, bits: u32) -> usize {
    ((u as u32).wrapping_mul(primes::PRIME_4_BYTES) >> (32 - bits)) as usize
}

#[inline]
pub(crate) fn hash6(u: u64, bits: u32) -> usize {
    ((u << 16).wrapping_mul(primes::PRIME_6_BYTES) >> (64 - bits)) as usize
}

#[inline]
pub(crate) fn hash7(u: u64, bits: u32) -> usize {
    ((u << 8).wrapping_mul(primes::PRIME_7_BYTES) >> (64 - bits)) as usize
}

#[inline]
pub(crate) fn hash8(u: u64, bits: u32) -> usize {
    (u.wrapping_mul(primes::PRIME_8_BYTES) >> (64 - bits)) as usize
}
