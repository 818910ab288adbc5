//! compression/emit.rs
//! Token writer shared by every match finder.
//!
//! All writes are bounds checked against the destination slice; running out of room yields
//! `None`, which the match finders treat as "input did not compress".

use crate::compression::constants::{MAX_REPEAT, TAG_COPY1, TAG_COPY2, TAG_COPY4, TAG_LITERAL};
use crate::compression::types::Dialect;

pub(crate) struct Emitter<'a> {
    dst: &'a mut [u8],
    pos: usize,
    dialect: Dialect,
    /// Offset the decoder will reuse for a repeat token (0 = none yet).
    last_offset: usize,
}

impl<'a> Emitter<'a> {
    pub fn new(dst: &'a mut [u8], dialect: Dialect, initial_offset: usize) -> Self {
        Self {
            dst,
            pos: 0,
            dialect,
            last_offset: initial_offset,
        }
    }

    pub fn len(&self) -> usize {
        self.pos
    }

    pub fn last_offset(&self) -> usize {
        self.last_offset
    }

    fn room(&mut self, n: usize) -> Option<&mut [u8]> {
        let end = self.pos.checked_add(n)?;
        let out = self.dst.get_mut(self.pos..end)?;
        self.pos = end;
        Some(out)
    }

    pub fn literal(&mut self, lit: &[u8]) -> Option<()> {
        if lit.is_empty() {
            return Some(());
        }
        let n = lit.len() - 1;
        let hdr = literal_header_len(lit.len());
        let out = self.room(hdr + lit.len())?;
        match hdr {
            1 => out[0] = (n as u8) << 2 | TAG_LITERAL,
            2 => {
                out[0] = 60 << 2 | TAG_LITERAL;
                out[1] = n as u8;
            }
            3 => {
                out[0] = 61 << 2 | TAG_LITERAL;
                out[1..3].copy_from_slice(&(n as u16).to_le_bytes());
            }
            4 => {
                out[0] = 62 << 2 | TAG_LITERAL;
                out[1..4].copy_from_slice(&(n as u32).to_le_bytes()[..3]);
            }
            _ => {
                out[0] = 63 << 2 | TAG_LITERAL;
                out[1..5].copy_from_slice(&(n as u32).to_le_bytes());
            }
        }
        out[hdr..].copy_from_slice(lit);
        Some(())
    }

    /// Emit a back-reference, using a repeat token when the decoder already holds `offset`.
    pub fn emit_match(&mut self, offset: usize, length: usize) -> Option<()> {
        if offset == self.last_offset && length >= 4 && self.dialect == Dialect::S2 {
            self.repeat(offset, length)
        } else {
            self.copy(offset, length)?;
            self.last_offset = offset;
            Some(())
        }
    }

    fn copy(&mut self, offset: usize, length: usize) -> Option<()> {
        if self.dialect == Dialect::Snappy {
            return self.copy_no_repeat(offset, length);
        }
        if offset >= 65536 {
            if length > 64 {
                self.copy4(offset, 64)?;
                let rest = length - 64;
                if rest >= 4 {
                    return self.repeat(offset, rest);
                }
                return self.copy4(offset, rest);
            }
            return self.copy4(offset, length);
        }
        if length > 64 {
            // Emit a short head, the rest as a repeat (at least 4 bytes remain).
            let head = if offset < 2048 {
                self.copy1(offset, 8)?;
                8
            } else {
                self.copy2(offset, 60)?;
                60
            };
            return self.repeat(offset, length - head);
        }
        if length >= 12 || length < 4 || offset >= 2048 {
            return self.copy2(offset, length);
        }
        self.copy1(offset, length)
    }

    fn copy_no_repeat(&mut self, offset: usize, mut length: usize) -> Option<()> {
        if offset >= 65536 {
            while length > 64 {
                self.copy4(offset, 64)?;
                length -= 64;
            }
            return self.copy4(offset, length);
        }
        // Emit 64 byte copies but keep at least four bytes for the tail.
        while length >= 68 {
            self.copy2(offset, 64)?;
            length -= 64;
        }
        if length > 64 {
            self.copy2(offset, 60)?;
            length -= 60;
        }
        if length >= 12 || length < 4 || offset >= 2048 {
            return self.copy2(offset, length);
        }
        self.copy1(offset, length)
    }

    fn repeat(&mut self, offset: usize, mut length: usize) -> Option<()> {
        if self.dialect == Dialect::Snappy {
            return self.copy_no_repeat(offset, length);
        }
        loop {
            let l = length - 4;
            if l <= 4 {
                let out = self.room(2)?;
                out[0] = (l as u8) << 2 | TAG_COPY1;
                out[1] = 0;
                return Some(());
            }
            if l < 8 && offset < 2048 {
                // Cheaper as a plain copy-1 carrying the offset.
                let out = self.room(2)?;
                out[0] = ((offset >> 8) as u8) << 5 | (l as u8) << 2 | TAG_COPY1;
                out[1] = offset as u8;
                return Some(());
            }
            if l < (1 << 8) + 4 {
                let out = self.room(3)?;
                out[0] = 5 << 2 | TAG_COPY1;
                out[1] = 0;
                out[2] = (l - 4) as u8;
                return Some(());
            }
            if l < (1 << 16) + (1 << 8) {
                let v = l - (1 << 8);
                let out = self.room(4)?;
                out[0] = 6 << 2 | TAG_COPY1;
                out[1] = 0;
                out[2..4].copy_from_slice(&(v as u16).to_le_bytes());
                return Some(());
            }
            let mut v = l - (1 << 16);
            let mut rest = 0;
            if v > MAX_REPEAT {
                rest = v - MAX_REPEAT + 4;
                v = MAX_REPEAT - 4;
            }
            let out = self.room(5)?;
            out[0] = 7 << 2 | TAG_COPY1;
            out[1] = 0;
            out[2..5].copy_from_slice(&(v as u32).to_le_bytes()[..3]);
            if rest == 0 {
                return Some(());
            }
            length = rest;
        }
    }

    fn copy1(&mut self, offset: usize, length: usize) -> Option<()> {
        let out = self.room(2)?;
        out[0] = ((offset >> 8) as u8) << 5 | ((length - 4) as u8) << 2 | TAG_COPY1;
        out[1] = offset as u8;
        Some(())
    }

    fn copy2(&mut self, offset: usize, length: usize) -> Option<()> {
        let out = self.room(3)?;
        out[0] = ((length - 1) as u8) << 2 | TAG_COPY2;
        out[1..3].copy_from_slice(&(offset as u16).to_le_bytes());
        Some(())
    }

    fn copy4(&mut self, offset: usize, length: usize) -> Option<()> {
        let out = self.room(5)?;
        out[0] = ((length - 1) as u8) << 2 | TAG_COPY4;
        out[1..5].copy_from_slice(&(offset as u32).to_le_bytes());
        Some(())
    }
}

/// Tag bytes needed in front of a literal run of `len` bytes.
pub(crate) fn literal_header_len(len: usize) -> usize {
    let n = len.saturating_sub(1);
    match n {
        0..=59 => 1,
        60..=0xff => 2,
        0x100..=0xffff => 3,
        0x1_0000..=0xff_ffff => 4,
        _ => 5,
    }
}

/// Encoded size of a repeat token.
pub(crate) fn repeat_cost(offset: usize, length: usize) -> usize {
    let l = length.saturating_sub(4);
    if l <= 4 || (l < 8 && offset < 2048) {
        2
    } else if l < (1 << 8) + 4 {
        3
    } else if l < (1 << 16) + (1 << 8) {
        4
    } else {
        5
    }
}

/// Encoded size of a copy token sequence.
pub(crate) fn copy_cost(offset: usize, length: usize, dialect: Dialect) -> usize {
    if dialect == Dialect::Snappy {
        let per = if offset >= 65536 { 5 } else { 3 };
        if offset < 2048 && (4..12).contains(&length) {
            return 2;
        }
        return per * length.div_ceil(64);
    }
    if offset >= 65536 {
        if length > 64 {
            let rest = length - 64;
            return 5 + if rest >= 4 { repeat_cost(offset, rest) } else { 5 };
        }
        return 5;
    }
    if length > 64 {
        if offset < 2048 {
            return 2 + repeat_cost(offset, length - 8);
        }
        return 3 + repeat_cost(offset, length - 60);
    }
    if length >= 12 || length < 4 || offset >= 2048 {
        3
    } else {
        2
    }
}
