////////////////////////////////////////////////////////////////////////////////
// This Source Code Form is subject to the terms of the Mozilla Public         /
// License, v. 2.0. If a copy of the MPL was not distributed with this         /
// file, You can obtain one at https://mozilla.org/MPL/2.0/.                   /
//                                                                             /
////////////////////////////////////////////////////////////////////////////////

use onlyerror::Error;

/// Decoder failure taxonomy.
///
/// This crate performs no I/O, so unlike many codec crates there is no
/// `Io` variant here: every error originates from a bounds check or a
/// format check inlined in the decoder's read loop.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Null, zero-length, or aliased source/destination buffers.
    #[error("invalid arguments: null, zero-length, or aliased buffers")]
    Params,
    /// The compressed stream ended (or was about to be read past) mid-block.
    #[error("compressed stream truncated at byte {position}")]
    SrcOob {
        /// Byte offset into the source buffer at which the read failed.
        position: usize,
    },
    /// The decoder was about to write past the end of the destination buffer.
    #[error("destination buffer too small, failed writing at byte {position}")]
    DstOob {
        /// Byte offset into the destination buffer at which the write failed.
        position: usize,
    },
    /// A reference block's distance exceeds the number of bytes already written.
    #[error("reference distance {distance} exceeds {available} bytes already written")]
    RefOob {
        /// Decoded reference distance.
        distance: usize,
        /// Bytes written to the destination so far.
        available: usize,
    },
    /// The stream terminated but produced a different length than requested.
    #[error("decompressed length {actual} does not match expected length {expected}")]
    DstLen {
        /// Length actually produced.
        actual: usize,
        /// Length the caller declared.
        expected: usize,
    },
    /// The prefix byte's format nibble is outside `[FMT_MIN, FMT_CUR]`.
    #[error("unknown stream format identifier {0}")]
    UnkFmt(u8),
}
