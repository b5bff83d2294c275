////////////////////////////////////////////////////////////////////////////////
// This Source Code Form is subject to the terms of the Mozilla Public         /
// License, v. 2.0. If a copy of the MPL was not distributed with this         /
// file, You can obtain one at https://mozilla.org/MPL/2.0/.                   /
//                                                                             /
////////////////////////////////////////////////////////////////////////////////

//! The high-ratio matcher: an 8-way rotating-head hash table and
//! one-position lazy matching, trading single-pass simplicity for a
//! byte-accurate overhead estimate that picks between two candidate
//! matches a position apart.

use tracing::trace;

use crate::block::{self, Carry, CarrySink};

const HI_MREF: usize = 5;
const REF_MIN_DEFAULT: usize = 6;
const REF_LEN: usize = REF_MIN_DEFAULT + 15 + 255 + 254;
const MAX_LEN_HI: usize = REF_LEN - REF_MIN_DEFAULT + HI_MREF;
const LIT_FIN: usize = 6;
const WIN_LEN: usize = 1 << 23;
const MREF: u8 = HI_MREF as u8;

const SEED1: u32 = 0x243F_6A88;
const SEED2: u32 = 0x85A3_08D3;

const WAYS: usize = 7;
const STACK_SLOTS: usize = 1 << 10;
const MAX_SLOTS: usize = (1 << 23) / 64;

#[derive(Clone)]
struct HiSlot {
    iw: [u32; WAYS],
    offs: [u32; WAYS],
    head: usize,
}

impl Default for HiSlot {
    fn default() -> Self {
        HiSlot { iw: [0; WAYS], offs: [0; WAYS], head: 0 }
    }
}

impl HiSlot {
    fn insert(&mut self, iw: u32, offs: u32) {
        self.head = (self.head + WAYS - 1) % WAYS;
        self.iw[self.head] = iw;
        self.offs[self.head] = offs;
    }
}

struct HiTable {
    slots: Vec<HiSlot>,
    mask: usize,
}

impl HiTable {
    fn new(srcl: usize) -> Self {
        let mut n = STACK_SLOTS;
        while n < MAX_SLOTS && n * 8 < srcl {
            n *= 2;
        }
        HiTable { slots: vec![HiSlot::default(); n], mask: n - 1 }
    }

    #[inline]
    fn index(&self, hval: u64) -> usize {
        (hval as usize) & self.mask
    }
}

#[inline]
fn hash6(iw1: u32, iw2: u32) -> u64 {
    let p = u64::from(SEED1 ^ iw1).wrapping_mul(u64::from(SEED2 ^ iw2));
    (p >> 32) ^ (p & 0xFFFF_FFFF)
}

/// Byte-accurate estimate of the block-pair size a candidate would cost,
/// used to compare a deferred match against the one found one position
/// later (see [`compress_hi`]'s lazy-matching loop).
#[inline]
fn overhead(lc: usize, d: usize, csh: u32) -> usize {
    let lb = usize::from(lc != 0);
    let sh = 10 + u32::from(csh != 0) * 3 + (lb as u32) * 2;
    let mut ov = lc + lb + usize::from(lc > 15) + 2;
    if (d as u64) >= (1_u64 << sh) {
        ov += 1;
    }
    if (d as u64) >= (1_u64 << (sh + 8)) {
        ov += 1;
    }
    ov
}

#[derive(Clone, Copy)]
struct Candidate {
    wp: usize,
    rc: usize,
    d: usize,
    /// Match start position, after backward extension into the preceding
    /// literal run. Equal to `ip` when there was nothing to extend into.
    start: usize,
}

/// Scans all `WAYS` tuples for the best-scoring match at `ip`, then extends
/// it backward into `src[ipa..ip]` exactly as the main loop's single-shot
/// counterpart in the default matcher does. The returned candidate's `rc`
/// and `start` already reflect that extension, so callers never see the
/// pre-extension length.
fn best_candidate(
    src: &[u8],
    table: &HiTable,
    slot_idx: usize,
    iw1: u32,
    ip: usize,
    ipa: usize,
    ipe: usize,
) -> Option<Candidate> {
    let slot = &table.slots[slot_idx];
    let mut best: Option<(usize, usize, usize, usize)> = None; // (wp, rc, d, cap)
    for t in 0..WAYS {
        if slot.iw[t] != iw1 {
            continue;
        }
        let wp = slot.offs[t] as usize;
        if wp >= ip {
            continue;
        }
        let d = ip - wp;
        if !(1..=WIN_LEN - 1).contains(&d) || d < 8 {
            continue;
        }
        let cap = d.min(MAX_LEN_HI).min(ipe - ip);
        if cap < HI_MREF {
            continue;
        }
        let rc = crate::primitive::match_len_fwd(&src[ip..], &src[wp..], cap);
        if rc < HI_MREF {
            continue;
        }
        let better = match best {
            None => true,
            Some((_, brc, _, _)) => rc > brc + usize::from(d > (1 << 18)),
        };
        if better {
            best = Some((wp, rc, d, cap));
        }
    }

    let (mut wp, mut rc, d, cap) = best?;
    let mut start = ip;
    let lc = ip - ipa;
    if lc != 0 {
        let back_cap = (cap - rc).min(lc).min(wp);
        if back_cap > 0 {
            let bmc = crate::primitive::match_len_rev(src, ip, wp, back_cap);
            if bmc != 0 {
                rc += bmc;
                start -= bmc;
                wp -= bmc;
            }
        }
    }

    Some(Candidate { wp, rc, d, start })
}

/// Compresses `src` with the high-ratio matcher.
#[must_use]
pub fn compress_hi(src: &[u8]) -> Vec<u8> {
    compress_hi_raw(src)
}

/// Compresses `src` into the caller-supplied `dst` using the high-ratio
/// matcher. Returns the compressed length, or 0 if `dst` is too small or
/// `src`/`dst` alias the same buffer.
#[must_use]
pub fn compress_hi_into(src: &[u8], dst: &mut [u8]) -> usize {
    if crate::decompress::aliased(src, dst) {
        return 0;
    }
    let raw = compress_hi_raw(src);
    if raw.len() > dst.len() {
        return 0;
    }
    dst[..raw.len()].copy_from_slice(&raw);
    raw.len()
}

fn compress_hi_raw(src: &[u8]) -> Vec<u8> {
    let srcl = src.len();
    trace!(srcl, "compress_hi");
    let mut dst =
        Vec::with_capacity(crate::bound::compress_bound_hi(srcl as i64).max(16) as usize);

    block::write_prefix(&mut dst, MREF);

    if srcl == 0 {
        dst.push(0);
        return dst;
    }

    if srcl < 16 {
        // `LIT_FIN` is a reserved tail length, not padding: the whole
        // input counts as that tail when it is this short.
        block::write_terminal_literal(&mut dst, src);
        return dst;
    }

    let mut table = HiTable::new(srcl);
    let ipe = srcl - LIT_FIN.min(srcl);
    let mut ip = 0_usize;
    let mut ipa = 0_usize;

    let mut carry = Carry::default();
    let mut sink = CarrySink { pos: 0 };

    let mut prev: Option<(usize, Candidate)> = None; // (pip, candidate)

    macro_rules! emit {
        ($pip:expr, $c:expr) => {{
            let anchor = &src[ipa..$pip];
            block::write_block_pair(&mut dst, anchor, $c.rc, $c.d as u32, MREF, &mut carry, &mut sink);
            ipa = $pip + $c.rc;
        }};
    }

    while ip + 6 <= ipe {
        let iw1 = crate::primitive::read_u32(src, ip);
        let iw2 = u32::from(crate::primitive::read_u16(src, ip + 4));
        let hval = hash6(iw1, iw2);
        let slot_idx = table.index(hval);

        let cur = best_candidate(src, &table, slot_idx, iw1, ip, ipa, ipe);

        let should_insert = match cur {
            Some(c) => c.d > 273,
            None => true,
        };
        if should_insert {
            table.slots[slot_idx].insert(iw1, ip as u32);
        }

        match (prev, cur) {
            (Some((pip, pc)), Some(c)) => {
                let pov = overhead(pip - ipa, pc.d, carry.csh);
                let ov = overhead(c.start - ipa, c.d, carry.csh);
                let prev_wins = pc.rc * ov > c.rc * pov;
                if prev_wins {
                    if pip + pc.rc > ip {
                        // Overlaps the new candidate; the current one
                        // cannot survive once the previous is emitted.
                        emit!(pip, pc);
                        ip = pip + pc.rc;
                        prev = None;
                        continue;
                    }
                    emit!(pip, pc);
                    prev = Some((c.start, c));
                    ip += 1;
                } else {
                    prev = Some((c.start, c));
                    ip += 1;
                }
            }
            (Some((pip, pc)), None) => {
                emit!(pip, pc);
                ip = pip + pc.rc;
                prev = None;
            }
            (None, Some(c)) => {
                prev = Some((c.start, c));
                ip += 1;
            }
            (None, None) => {
                ip += 1;
            }
        }
    }

    if let Some((pip, pc)) = prev.take() {
        emit!(pip, pc);
    }

    // No padding: the `LIT_FIN` reserved bytes are already part of
    // `src[ipa..]`, the same as in the default matcher (see its
    // analogous comment).
    block::write_terminal_literal(&mut dst, &src[ipa..]);

    trace!(dstl = dst.len(), "compress_hi done");
    dst
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decompress::decompress;

    fn roundtrip(data: &[u8]) {
        let compressed = compress_hi(data);
        let restored = decompress(&compressed, data.len()).unwrap();
        assert_eq!(restored, data);
    }

    #[test]
    fn empty_input() {
        let c = compress_hi(&[]);
        assert_eq!(c.len(), 2);
        roundtrip(&[]);
    }

    #[test]
    fn tiny_inputs() {
        for n in [1, 5, 6, 15] {
            roundtrip(&vec![b'y'; n]);
        }
    }

    #[test]
    fn boundary_sizes() {
        for n in [16, 17, 31, 32, 63, 64, 127, 128, 255, 256, 1 << 10, 1 << 16] {
            let data: Vec<u8> = (0..n).map(|i| (i % 199) as u8).collect();
            roundtrip(&data);
        }
    }

    #[test]
    fn repeating_periods() {
        for k in [1, 2, 3, 5, 7, 8, 9, 16, 17, 127, 257] {
            let data: Vec<u8> = (0..4096).map(|i| (i % k) as u8).collect();
            roundtrip(&data);
        }
    }

    #[test]
    fn english_text() {
        let text = "pack my box with five dozen liquor jugs. ".repeat(300);
        roundtrip(text.as_bytes());
    }

    #[test]
    fn bound_is_respected() {
        let data: Vec<u8> = (0..10_000).map(|i| ((i * 13) % 256) as u8).collect();
        let c = compress_hi(&data);
        assert!(c.len() as i64 <= crate::bound::compress_bound_hi(data.len() as i64));
    }

    #[test]
    fn compress_hi_into_rejects_undersized_dst() {
        let data = b"abcdefghijklmnopqrstuvwxyz".repeat(20);
        let mut dst = vec![0_u8; 4];
        assert_eq!(compress_hi_into(&data, &mut dst), 0);
    }

    #[test]
    #[ignore]
    fn large_input() {
        let n = (1 << 23) + 1;
        let data: Vec<u8> = (0..n).map(|i| (i % 181) as u8).collect();
        roundtrip(&data);
    }
}
