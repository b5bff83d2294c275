////////////////////////////////////////////////////////////////////////////////
// This Source Code Form is subject to the terms of the Mozilla Public         /
// License, v. 2.0. If a copy of the MPL was not distributed with this         /
// file, You can obtain one at https://mozilla.org/MPL/2.0/.                   /
//                                                                             /
////////////////////////////////////////////////////////////////////////////////

#![warn(clippy::pedantic, clippy::cargo)]
#![allow(clippy::module_name_repetitions)]

//! An in-memory LZ77-family compressor and decompressor.
//!
//! This crate has no container format, no checksum, and no framing: callers
//! supply byte slices and (for decompression) the exact expected output
//! length, and get back an independent, self-delimited "raw" stream.
//!
//! Two compressors are provided. [`compress`] is a fast single-pass
//! matcher; [`compress_hi`] trades throughput for a better ratio via an
//! eight-way hash table and one-position lazy matching. Either's output is
//! read back by the same [`decompress`]/[`decompress_partial`] pair.
//!
//! ```
//! let data = b"abracadabra abracadabra abracadabra";
//! let packed = lzav::compress(data);
//! let restored = lzav::decompress(&packed, data.len()).unwrap();
//! assert_eq!(restored, data);
//! ```

mod block;
mod bound;
mod compress;
mod compress_hi;
mod decompress;
mod error;
mod primitive;

pub use bound::{compress_bound, compress_bound_hi};
pub use compress::{compress, compress_into};
pub use compress_hi::{compress_hi, compress_hi_into};
pub use decompress::{decompress, decompress_into, decompress_partial, decompress_partial_into};
pub use error::Error;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_api_round_trips() {
        let data = b"one two three four five six seven eight nine ten".repeat(5);
        let packed = compress(&data);
        assert_eq!(decompress(&packed, data.len()).unwrap(), data);

        let packed_hi = compress_hi(&data);
        assert_eq!(decompress(&packed_hi, data.len()).unwrap(), data);
    }

    #[test]
    fn destination_undersizing_returns_zero_length_error() {
        let data: Vec<u8> = (0..5000).map(|i| (i % 37) as u8).collect();
        let packed = compress(&data);
        let bound = compress_bound(data.len() as i64) as usize;
        assert!(packed.len() <= bound);
    }
}
