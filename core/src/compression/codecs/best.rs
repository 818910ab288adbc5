//! Exhaustive-ish match finder with one byte of look-ahead.
//!
//! Both tables keep the two most recent positions per bucket. At every step all table
//! candidates plus the repeat offset are scored at `s` and `s + 1`, where the score is the
//! number of bytes covered minus the bytes needed to encode the match. The best one wins.
use crate::compression::emit::{copy_cost, repeat_cost, Emitter};
use crate::compression::types::Dialect;
use crate::compression::window::{hash4, hash8, table_bits, Window};

const L_TABLE_BITS: u32 = 19;
const S_TABLE_BITS: u32 = 16;

#[derive(Clone, Copy)]
struct Candidate {
    cand: usize,
    at: usize,
    score: isize,
}

#[inline]
fn insert(table: &mut [u64], h: usize, pos: usize) {
    if table[h] & 0xffff_ffff != pos as u64 {
        table[h] = (table[h] << 32) | pos as u64;
    }
}

#[inline]
fn entries(v: u64) -> [usize; 2] {
    [(v & 0xffff_ffff) as usize, (v >> 32) as usize]
}

pub(crate) fn encode_best(
    dst: &mut [u8],
    win: &Window<'_>,
    initial_offset: usize,
    dialect: Dialect,
) -> Option<usize> {
    let lbits = table_bits(win.end(), L_TABLE_BITS);
    let sbits = table_bits(win.end(), S_TABLE_BITS);
    let mut l_table = vec![0u64; 1 << lbits];
    let mut s_table = vec![0u64; 1 << sbits];
    let bytes = win.bytes();
    let s_limit = win.scan_limit();

    let index = |l_table: &mut [u64], s_table: &mut [u64], pos: usize| {
        let cv = win.load64(pos);
        insert(l_table, hash8(cv, lbits), pos);
        insert(s_table, hash4(cv, sbits), pos);
    };

    for i in 0..win.base().min(s_limit) {
        index(&mut l_table, &mut s_table, i);
    }

    let mut e = Emitter::new(dst, dialect, initial_offset);
    let mut next_emit = win.base();
    let mut s = win.scan_start();

    while s < s_limit {
        let mut best: Option<Candidate> = None;
        for at in [s, s + 1] {
            let cv = win.load64(at);
            let hl = hash8(cv, lbits);
            let hs = hash4(cv, sbits);
            let [l0, l1] = entries(l_table[hl]);
            let [s0, s1] = entries(s_table[hs]);
            let rep = e.last_offset();
            let rep_cand = if rep > 0 && at >= rep { Some(at - rep) } else { None };

            for cand in [Some(l0), Some(l1), Some(s0), Some(s1), rep_cand].into_iter().flatten() {
                let Some(len) = win.try_match(cand, at) else {
                    continue;
                };
                let offset = at - cand;
                let cost = if offset == rep && dialect == Dialect::S2 {
                    repeat_cost(offset, len)
                } else {
                    copy_cost(offset, len, dialect)
                };
                // Bytes skipped by looking ahead become literals.
                let score = len as isize - cost as isize - (at - s) as isize;
                if best.map_or(true, |b| score > b.score) {
                    best = Some(Candidate { cand, at, score });
                }
            }
            insert(&mut l_table, hl, at);
            insert(&mut s_table, hs, at);
        }

        let Some(m) = best.filter(|m| m.score > 0) else {
            s += 1 + ((s - next_emit) >> 8);
            continue;
        };

        let (c, base) = win.extend_back(m.cand, m.at, next_emit);
        let len = win.match_len(c, base);
        let offset = base - c;
        e.literal(&bytes[next_emit..base])?;
        e.emit_match(offset, len)?;

        let end = base + len;
        for pos in (m.at + 2)..end.min(s_limit) {
            index(&mut l_table, &mut s_table, pos);
        }
        s = end;
        next_emit = end;
    }

    if next_emit < win.end() {
        e.literal(&bytes[next_emit..])?;
    }
    Some(e.len())
}
