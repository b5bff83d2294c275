////////////////////////////////////////////////////////////////////////////////
// This Source Code Form is subject to the terms of the Mozilla Public         /
// License, v. 2.0. If a copy of the MPL was not distributed with this         /
// file, You can obtain one at https://mozilla.org/MPL/2.0/.                   /
//                                                                             /
////////////////////////////////////////////////////////////////////////////////

//! Endianness-correct unaligned word access and byte-range primitives.
//!
//! Every place the wire format's little-endianness actually matters is
//! funneled through this module. Everything above here works in terms of
//! host-order integers.

use byteorder::{ByteOrder, LittleEndian};

/// Reads a little-endian `u16` starting at `buf[pos]`.
#[inline]
pub fn read_u16(buf: &[u8], pos: usize) -> u16 {
    LittleEndian::read_u16(&buf[pos..pos + 2])
}

/// Reads a little-endian `u32` starting at `buf[pos]`.
#[inline]
pub fn read_u32(buf: &[u8], pos: usize) -> u32 {
    LittleEndian::read_u32(&buf[pos..pos + 4])
}

/// Reads a little-endian `u64` starting at `buf[pos]`.
#[inline]
pub fn read_u64(buf: &[u8], pos: usize) -> u64 {
    LittleEndian::read_u64(&buf[pos..pos + 8])
}

/// Writes a little-endian `u32` starting at `buf[pos]`.
#[inline]
pub fn write_u32(buf: &mut [u8], pos: usize, value: u32) {
    LittleEndian::write_u32(&mut buf[pos..pos + 4], value);
}

/// Longest common prefix of `a` and `b`, capped at `max_len`.
///
/// Compares 8 bytes at a time via a host-word XOR, using the trailing-zero
/// count of the difference to find the first mismatching byte. Falls back
/// to a byte loop for the final (`< 8`-byte) remainder.
#[inline]
pub fn match_len_fwd(a: &[u8], b: &[u8], max_len: usize) -> usize {
    let max_len = max_len.min(a.len()).min(b.len());
    let mut i = 0;
    while i + 8 <= max_len {
        let wa = read_u64(a, i);
        let wb = read_u64(b, i);
        let diff = wa ^ wb;
        if diff != 0 {
            return i + (diff.trailing_zeros() as usize / 8);
        }
        i += 8;
    }
    while i < max_len && a[i] == b[i] {
        i += 1;
    }
    i
}

/// Longest common suffix ending just before `a_end`/`b_end`, capped at `max_len`.
///
/// Used to extend a forward match backward into the preceding literal run.
/// Walks two bytes at a time from the end, matching the reference
/// implementation's reverse-scan granularity.
#[inline]
pub fn match_len_rev(buf: &[u8], a_end: usize, b_end: usize, max_len: usize) -> usize {
    let max_len = max_len.min(a_end).min(b_end);
    let mut k = 0;
    while k + 2 <= max_len && buf[a_end - k - 1] == buf[b_end - k - 1] && buf[a_end - k - 2] == buf[b_end - k - 2] {
        k += 2;
    }
    if k < max_len && buf[a_end - k - 1] == buf[b_end - k - 1] {
        k += 1;
    }
    k
}

/// Copies `len` bytes within `buf` from `src` to `dst`, correct for the
/// overlapping case `src < dst < src + len` (distance shorter than length,
/// the classic RLE reference).
///
/// A generic `memmove`/`copy_within` must not be used here: for overlapping
/// forward copies, LZAV's semantics require each output byte to observe
/// the bytes already written by this very copy, not the original source
/// bytes. `slice::copy_within` processes such ranges front-to-back only by
/// accident of implementation and is not a guarantee; an explicit byte
/// loop is the correct and portable way to express this.
#[inline]
pub fn overlap_copy(buf: &mut [u8], src: usize, dst: usize, len: usize) {
    if dst <= src || dst - src >= len {
        buf.copy_within(src..src + len, dst);
    } else {
        for i in 0..len {
            buf[dst + i] = buf[src + i];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn match_len_fwd_exact() {
        assert_eq!(match_len_fwd(b"abcdefgh", b"abcdefgx", 8), 7);
        assert_eq!(match_len_fwd(b"abcdefgh", b"abcdefgh", 8), 8);
        assert_eq!(match_len_fwd(b"xbcdefgh", b"abcdefgh", 8), 0);
        assert_eq!(match_len_fwd(b"ab", b"ab", 100), 2);
    }

    #[test]
    fn match_len_rev_exact() {
        let buf = b"xxxabcabc";
        // comparing buf[3..6] ("abc") against buf[6..9] ("abc") backward
        assert_eq!(match_len_rev(buf, 6, 9, 6), 3);
    }

    #[test]
    fn overlap_copy_rle() {
        let mut buf = vec![b'a', 0, 0, 0, 0];
        overlap_copy(&mut buf, 0, 1, 4);
        assert_eq!(buf, vec![b'a', b'a', b'a', b'a', b'a']);
    }

    #[test]
    fn overlap_copy_disjoint() {
        let mut buf = vec![1, 2, 3, 0, 0, 0];
        overlap_copy(&mut buf, 0, 3, 3);
        assert_eq!(buf, vec![1, 2, 3, 1, 2, 3]);
    }

    proptest! {
        #[test]
        fn match_len_fwd_bounds(a: Vec<u8>, b: Vec<u8>, cap in 0_usize..64) {
            let len = match_len_fwd(&a, &b, cap);
            prop_assert!(len <= cap.min(a.len()).min(b.len()));
            prop_assert_eq!(&a[..len], &b[..len]);
        }
    }
}
