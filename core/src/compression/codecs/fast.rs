//! Greedy single-table match finder.
//!
//! Hashes 6 bytes per position, probes three consecutive positions per step and checks the
//! last used offset one byte ahead before falling back to the table. The step grows with the
//! distance since the last match so incompressible regions are skipped quickly.
use crate::compression::emit::Emitter;
use crate::compression::types::Dialect;
use crate::compression::window::{hash6, table_bits, Window};

const MAX_TABLE_BITS: u32 = 14;
/// Dictionary content needs more slots to survive until the block references it.
const MAX_TABLE_BITS_DICT: u32 = 16;

pub(crate) fn encode_fast(
    dst: &mut [u8],
    win: &Window<'_>,
    initial_offset: usize,
    dialect: Dialect,
) -> Option<usize> {
    let max_bits = if win.base() > 0 { MAX_TABLE_BITS_DICT } else { MAX_TABLE_BITS };
    let bits = table_bits(win.end(), max_bits);
    let mut table = vec![0u32; 1 << bits];
    let bytes = win.bytes();
    let s_limit = win.scan_limit();

    for i in 0..win.base().min(s_limit) {
        table[hash6(win.load64(i), bits)] = i as u32;
    }

    let mut e = Emitter::new(dst, dialect, initial_offset);
    let mut next_emit = win.base();
    let mut s = win.scan_start();
    let mut cv = win.load64(s);
    // Probed one byte ahead; 1 catches runs before any match has been made.
    let mut repeat = if initial_offset > 0 { initial_offset } else { 1 };

    'outer: loop {
        let (mut cand, mut at) = loop {
            let next_s = s + ((s - next_emit) >> 6) + 4;
            if next_s > s_limit {
                break 'outer;
            }
            let h0 = hash6(cv, bits);
            let h1 = hash6(cv >> 8, bits);
            let candidate = table[h0] as usize;
            let candidate2 = table[h1] as usize;
            table[h0] = s as u32;
            table[h1] = (s + 1) as u32;
            let h2 = hash6(cv >> 16, bits);

            if s + 1 >= repeat {
                let rc = s + 1 - repeat;
                if win.try_match(rc, s + 1).is_some() {
                    let (c, base) = win.extend_back(rc, s + 1, next_emit);
                    e.literal(&bytes[next_emit..base])?;
                    let len = win.match_len(c, base);
                    e.emit_match(base - c, len)?;
                    s = base + len;
                    next_emit = s;
                    if s >= s_limit {
                        break 'outer;
                    }
                    cv = win.load64(s);
                    continue;
                }
            }

            if win.try_match(candidate, s).is_some() {
                break (candidate, s);
            }
            let candidate3 = table[h2] as usize;
            table[h2] = (s + 2) as u32;
            if win.try_match(candidate2, s + 1).is_some() {
                break (candidate2, s + 1);
            }
            if win.try_match(candidate3, s + 2).is_some() {
                break (candidate3, s + 2);
            }
            s = next_s;
            cv = win.load64(s);
        };

        loop {
            let (c, base) = win.extend_back(cand, at, next_emit);
            e.literal(&bytes[next_emit..base])?;
            let len = win.match_len(c, base);
            let offset = base - c;
            e.emit_match(offset, len)?;
            repeat = offset;
            s = base + len;
            next_emit = s;
            if s >= s_limit {
                break 'outer;
            }

            // Check for an immediate match, otherwise resume searching at s+1.
            let x = win.load64(s - 2);
            table[hash6(x, bits)] = (s - 2) as u32;
            let hc = hash6(x >> 16, bits);
            cand = table[hc] as usize;
            table[hc] = s as u32;
            at = s;
            if win.try_match(cand, s).is_none() {
                s += 1;
                cv = win.load64(s);
                break;
            }
        }
    }

    if next_emit < win.end() {
        e.literal(&bytes[next_emit..])?;
    }
    Some(e.len())
}
