////////////////////////////////////////////////////////////////////////////////
// This Source Code Form is subject to the terms of the Mozilla Public         /
// License, v. 2.0. If a copy of the MPL was not distributed with this         /
// file, You can obtain one at https://mozilla.org/MPL/2.0/.                   /
//                                                                             /
////////////////////////////////////////////////////////////////////////////////

//! The decoder: a single state machine shared by the strict and partial
//! entry points, built directly on [`crate::block::Reader`].

use tracing::{debug, trace};

use crate::block::{self, Block};
use crate::error::Error;
use crate::primitive::overlap_copy;

/// Returns `true` if `src` and `dst` are the same buffer. This is the one
/// place raw buffer aliasing is still observable: everywhere else, taking
/// `&[u8]` and `&mut [u8]` simultaneously already rules it out via the
/// borrow checker.
pub(crate) fn aliased(src: &[u8], dst: &[u8]) -> bool {
    std::ptr::eq(src.as_ptr(), dst.as_ptr()) && !src.is_empty()
}

/// Decompresses `src` into the caller-supplied `dst`, which must be
/// exactly as long as the expected decompressed length.
///
/// # Errors
///
/// Returns [`Error::Params`] if `src` and `dst` alias the same buffer,
/// [`Error::UnkFmt`] for an unrecognized prefix, [`Error::SrcOob`] if the
/// stream is truncated, [`Error::RefOob`] if a reference block points
/// before the start of the output produced so far, [`Error::DstOob`] if a
/// block would write past `dst`'s end, and [`Error::DstLen`] if the stream
/// is well-formed but decodes to a different length than `dst.len()`.
pub fn decompress_into(src: &[u8], dst: &mut [u8]) -> Result<usize, Error> {
    let dstl = dst.len();
    trace!(srcl = src.len(), dstl, "decompress_into");
    if aliased(src, dst) {
        return Err(Error::Params);
    }

    let mref = block::read_prefix(src)?;
    if dstl == 0 {
        return Ok(0);
    }
    let mut op = 0_usize;
    let mut reader = block::Reader::new(src, 1, mref);

    while let Some(blk) = reader.read_block()? {
        match blk {
            Block::Literal { bytes } => {
                let end = op + bytes.len();
                if end > dstl {
                    debug!(position = op, "decompress: literal overruns destination");
                    return Err(Error::DstOob { position: op });
                }
                dst[op..end].copy_from_slice(bytes);
                op = end;
            }
            Block::Reference { distance, length } => {
                if distance > op {
                    debug!(distance, available = op, "decompress: reference underruns output");
                    return Err(Error::RefOob { distance, available: op });
                }
                let end = op + length;
                if end > dstl {
                    debug!(position = op, "decompress: reference overruns destination");
                    return Err(Error::DstOob { position: op });
                }
                overlap_copy(dst, op - distance, op, length);
                op = end;
            }
        }
    }

    if op != dstl {
        debug!(actual = op, expected = dstl, "decompress: length mismatch");
        return Err(Error::DstLen { actual: op, expected: dstl });
    }

    Ok(op)
}

/// Decompresses `src`, which must expand to exactly `dstl` bytes.
///
/// # Errors
///
/// See [`decompress_into`].
pub fn decompress(src: &[u8], dstl: usize) -> Result<Vec<u8>, Error> {
    let mut out = vec![0_u8; dstl];
    decompress_into(src, &mut out)?;
    Ok(out)
}

/// Decompresses as much of `src` into `dst` as is well-formed, stopping at
/// the first bounds violation instead of returning an error. Returns the
/// number of bytes written; never fails.
#[must_use]
pub fn decompress_partial_into(src: &[u8], dst: &mut [u8]) -> usize {
    let dstl = dst.len();
    trace!(srcl = src.len(), dstl, "decompress_partial_into");
    if aliased(src, dst) || dstl == 0 {
        return 0;
    }

    let Ok(mref) = block::read_prefix(src) else {
        return 0;
    };
    let mut op = 0_usize;
    let mut reader = block::Reader::new(src, 1, mref);

    loop {
        match reader.read_block() {
            Ok(Some(Block::Literal { bytes })) => {
                let end = op + bytes.len();
                if end > dstl {
                    break;
                }
                dst[op..end].copy_from_slice(bytes);
                op = end;
            }
            Ok(Some(Block::Reference { distance, length })) => {
                if distance > op || op + length > dstl {
                    break;
                }
                overlap_copy(dst, op - distance, op, length);
                op += length;
            }
            Ok(None) | Err(_) => break,
        }
    }

    op
}

/// Decompresses as much of `src` as is well-formed, stopping at the first
/// bounds violation instead of returning an error. Never fails; a
/// malformed or truncated stream simply yields a shorter prefix of the
/// original data.
#[must_use]
pub fn decompress_partial(src: &[u8], dstl: usize) -> Vec<u8> {
    let mut out = vec![0_u8; dstl];
    let written = decompress_partial_into(src, &mut out);
    out.truncate(written);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compress::compress;

    #[test]
    fn empty_stream_decodes_to_empty() {
        assert_eq!(decompress(&[0x20, 0x00], 0).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn unknown_format_rejected() {
        let err = decompress(&[0xF0, 0x00], 1).unwrap_err();
        assert!(matches!(err, Error::UnkFmt(_)));
    }

    #[test]
    fn truncated_stream_rejected() {
        let data = b"hello hello hello hello hello world, a wonderful world indeed".repeat(4);
        let c = compress(&data);
        let truncated = &c[..c.len() - 3];
        let err = decompress(truncated, data.len()).unwrap_err();
        assert!(matches!(err, Error::SrcOob { .. } | Error::DstLen { .. }));
    }

    #[test]
    fn wrong_length_rejected() {
        let data = b"abcdefghijklmnopqrstuvwxyz".repeat(10);
        let c = compress(&data);
        let err = decompress(&c, data.len() + 1).unwrap_err();
        assert!(matches!(err, Error::DstLen { .. } | Error::DstOob { .. }));
    }

    #[test]
    fn partial_decode_never_panics_on_garbage() {
        let garbage = vec![0x20_u8, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];
        let out = decompress_partial(&garbage, 4096);
        assert!(out.len() <= 4096);
    }

    #[test]
    fn aliased_buffers_rejected() {
        // Two views of the same backing allocation, constructed via raw
        // pointers since the safe API cannot otherwise express this.
        let mut buf = vec![0x20_u8, 0x00, 0x00, 0x00];
        let ptr = buf.as_mut_ptr();
        let len = buf.len();
        let src: &[u8] = unsafe { std::slice::from_raw_parts(ptr, len) };
        let dst: &mut [u8] = unsafe { std::slice::from_raw_parts_mut(ptr, len) };
        assert_eq!(decompress_into(src, dst), Err(Error::Params));
    }

    #[test]
    fn partial_decode_matches_full_on_valid_stream() {
        let data = b"some moderately repetitive test data some moderately repetitive".repeat(3);
        let c = compress(&data);
        let full = decompress(&c, data.len()).unwrap();
        let partial = decompress_partial(&c, data.len());
        assert_eq!(full, partial);
    }
}
