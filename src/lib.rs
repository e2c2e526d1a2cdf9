//! # d64compress
//!
//! Compress or expand the two retro formats used by the Doom 64 / PSX Doom /
//! Jaguar Doom asset pipeline:
//! * `d64` is an adaptive-Huffman front end over a 16 KB-window LZ77-style
//!   back end, used by Doom 64.
//! * `jaguar` is a byte-aligned LZSS with a 4 KB window, used by PSX Doom and
//!   Jaguar Doom.
//!
//! Both codecs operate on caller-owned, fully-buffered byte slices: there is
//! no streaming and no shared state between calls. Every public entry point
//! returns the number of bytes written on success, or this crate's [`Error`]
//! on any failure; no partial output is ever claimed.
//!
//! ## Buffer Example
//!
//! ```rs
//! use d64compress::*;
//! let data = b"the quick brown fox jumps over the lazy dog";
//! let mut compressed = vec![0u8; data.len() * 2 + 256];
//! let n = d64::encode_d64(data, &mut compressed).expect("encode failed");
//! compressed.truncate(n);
//! let mut expanded = vec![0u8; data.len()];
//! let m = d64::decode_d64(&compressed, &mut expanded).expect("decode failed");
//! assert_eq!(&expanded[..m], data);
//! ```

mod tools;
pub mod d64;
pub mod jaguar;

/// Errors produced by the codecs in this crate.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A bit or byte read ran past the input bound.
    #[error("input underflow")]
    InputUnderflow,
    /// A byte write would exceed the output buffer's capacity.
    #[error("output overflow")]
    OutputOverflow,
    /// An encoder-selected match, or a decoded back-reference, turned out
    /// not to hold: the encoder's re-verification against real input bytes
    /// failed, or the decoder's back-reference distance was out of range.
    #[error("invariant violation")]
    InvariantViolation,
    /// A caller-supplied buffer failed a codec's stated minimum-size
    /// precondition before any work began.
    #[error("precondition failure")]
    PreconditionFailure,
}

/// Tuning/configuration record shared by both codecs' buffer-oriented entry
/// points. D64's internal constants (window size, alphabet, shift table) are
/// fixed by the bit-stream format and are not tunable here; `threshold` and
/// `lookahead` are honored by the Jaguar encoder's match search.
#[derive(Clone)]
pub struct Options {
    /// starting position in the input slice
    pub in_offset: usize,
    /// starting position in the output slice
    pub out_offset: usize,
    /// minimum match length the encoder will accept
    pub threshold: usize,
    /// maximum match length the encoder will search for
    pub lookahead: usize,
}

pub const STD_OPTIONS: Options = Options {
    in_offset: 0,
    out_offset: 0,
    threshold: 3,
    lookahead: 64,
};
