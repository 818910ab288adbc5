//! Two-table match finder.
//!
//! A long table keyed on 7 bytes finds distant, long matches; a short table keyed on
//! 4 bytes catches the rest. After each match both ends are indexed, and the long table is
//! filled sparsely in between.
use crate::compression::emit::Emitter;
use crate::compression::types::Dialect;
use crate::compression::window::{hash4, hash7, table_bits, Window};

const L_TABLE_BITS: u32 = 17;
const S_TABLE_BITS: u32 = 14;
/// Repeat matches shorter than this are left to the tables.
const WANT_REPEAT_BYTES: usize = 6;

pub(crate) fn encode_better(
    dst: &mut [u8],
    win: &Window<'_>,
    initial_offset: usize,
    dialect: Dialect,
) -> Option<usize> {
    let lbits = table_bits(win.end(), L_TABLE_BITS);
    let sbits = table_bits(win.end(), S_TABLE_BITS);
    let mut l_table = vec![0u32; 1 << lbits];
    let mut s_table = vec![0u32; 1 << sbits];
    let bytes = win.bytes();
    let s_limit = win.scan_limit();

    for i in 0..win.base().min(s_limit) {
        let cv = win.load64(i);
        l_table[hash7(cv, lbits)] = i as u32;
        s_table[hash4(cv, sbits)] = i as u32;
    }

    let mut e = Emitter::new(dst, dialect, initial_offset);
    let mut next_emit = win.base();
    let mut s = win.scan_start();
    let mut cv = win.load64(s);

    'outer: loop {
        let mut next_s;
        let (cand, at) = loop {
            next_s = s + ((s - next_emit) >> 7) + 1;
            if next_s > s_limit {
                break 'outer;
            }
            let hl = hash7(cv, lbits);
            let hs = hash4(cv, sbits);
            let cand_l = l_table[hl] as usize;
            let cand_s = s_table[hs] as usize;
            l_table[hl] = s as u32;
            s_table[hs] = s as u32;

            let long = win.try_match(cand_l, s);
            if long.is_some_and(|n| n >= 8) {
                break (cand_l, s);
            }

            let rep = e.last_offset();
            if rep > 0 && s + 1 >= rep {
                let rc = s + 1 - rep;
                if win.try_match(rc, s + 1).is_some_and(|n| n >= WANT_REPEAT_BYTES) {
                    break (rc, s + 1);
                }
            }

            if long.is_some() {
                break (cand_l, s);
            }
            if let Some(short) = win.try_match(cand_s, s) {
                // A long candidate one byte later may beat the short one.
                let hl1 = hash7(cv >> 8, lbits);
                let cand_l1 = l_table[hl1] as usize;
                l_table[hl1] = (s + 1) as u32;
                if win.try_match(cand_l1, s + 1).is_some_and(|n| n > short) {
                    break (cand_l1, s + 1);
                }
                break (cand_s, s);
            }
            s = next_s;
            cv = win.load64(s);
        };

        let (c, base) = win.extend_back(cand, at, next_emit);
        let len = win.match_len(c, base);
        let offset = base - c;
        if offset > 65535 && len <= 5 && offset != e.last_offset() {
            // A 5-byte copy token would not pay for a match this short.
            s = next_s + 1;
            if s >= s_limit {
                break 'outer;
            }
            cv = win.load64(s);
            continue;
        }

        e.literal(&bytes[next_emit..base])?;
        e.emit_match(offset, len)?;
        s = base + len;
        next_emit = s;
        if s >= s_limit {
            break 'outer;
        }

        // Index both ends of the match, then the long table sparsely in between.
        let mut index0 = base + 1;
        let mut index1 = s - 2;
        let cv0 = win.load64(index0);
        let cv1 = win.load64(index1);
        l_table[hash7(cv0, lbits)] = index0 as u32;
        s_table[hash4(cv0 >> 8, sbits)] = (index0 + 1) as u32;
        l_table[hash7(cv1, lbits)] = index1 as u32;
        s_table[hash4(cv1 >> 8, sbits)] = (index1 + 1) as u32;
        index0 += 1;
        index1 -= 1;
        while index0 < index1 {
            l_table[hash7(win.load64(index0), lbits)] = index0 as u32;
            l_table[hash7(win.load64(index1), lbits)] = index1 as u32;
            index0 += 2;
            index1 -= 2;
        }
        cv = win.load64(s);
    }

    if next_emit < win.end() {
        e.literal(&bytes[next_emit..])?;
    }
    Some(e.len())
}
