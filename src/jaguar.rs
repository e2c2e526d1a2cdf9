//! Jaguar: byte-aligned LZSS with a 4 KB window, used by PSX Doom and
//! Jaguar Doom.
//!
//! The stream is a sequence of 8-operation groups. Each group opens with a
//! control byte whose bits, read LSB first, say whether the following
//! operation is a literal (0) or a 2-byte copy token (1). A copy token packs
//! a 12-bit back-reference distance and a 4-bit length (stored as
//! length - 1) across its two bytes. A copy of length 1 is the end marker.

use crate::{Error, Options};

const WINDOW_SIZE: usize = 4096;
const LOOKAHEAD_SIZE: usize = 16;
const MIN_MATCH: usize = 3;
const LENGTH_SHIFT: u32 = 4;

fn read_u8(input: &[u8], pos: &mut usize) -> Result<u8, Error> {
    if *pos >= input.len() {
        return Err(Error::InputUnderflow);
    }
    let b = input[*pos];
    *pos += 1;
    Ok(b)
}

/// Decompresses a Jaguar LZSS stream. Every read and write is bounds
/// checked: a malformed copy token that would read before the start of
/// `output`, or any write that would exceed its capacity, is reported
/// rather than silently wrapping or panicking.
pub fn decode_jaguar(input: &[u8], output: &mut [u8]) -> Result<usize, Error> {
    log::debug!("decode_jaguar: {} input bytes, {} output capacity", input.len(), output.len());
    let mut in_pos = 0usize;
    let mut out_pos = 0usize;
    let mut control = 0u8;
    let mut ops_left = 0u32;

    loop {
        if ops_left == 0 {
            control = read_u8(input, &mut in_pos)?;
            ops_left = 8;
        }
        ops_left -= 1;
        let is_copy = control & 1 != 0;
        control >>= 1;

        if is_copy {
            let hi = read_u8(input, &mut in_pos)? as usize;
            let lo = read_u8(input, &mut in_pos)? as usize;
            let distance = (hi << LENGTH_SHIFT) | (lo >> LENGTH_SHIFT);
            let length = (lo & 0x0F) + 1;
            if length == 1 {
                log::debug!("decode_jaguar: wrote {} bytes", out_pos);
                return Ok(out_pos);
            }
            if distance + 1 > out_pos {
                return Err(Error::InvariantViolation);
            }
            let mut src = out_pos - distance - 1;
            for _ in 0..length {
                if out_pos >= output.len() {
                    return Err(Error::OutputOverflow);
                }
                output[out_pos] = output[src];
                out_pos += 1;
                src += 1;
            }
        } else {
            let b = read_u8(input, &mut in_pos)?;
            if out_pos >= output.len() {
                return Err(Error::OutputOverflow);
            }
            output[out_pos] = b;
            out_pos += 1;
        }
    }
}

/// Doubly-linked, per-first-byte match lists over absolute input positions,
/// backed by fixed 4096-slot ownership tracking so each slot's previous
/// occupant is evicted exactly when the window would no longer reach it.
/// This is a safe, index-based restatement of the original's raw-pointer
/// node pool: positions stand in for pointers, `Option<usize>` for null.
struct HashAccelerator {
    prev: Vec<Option<usize>>,
    next: Vec<Option<usize>>,
    list_head: [Option<usize>; 256],
    list_tail: [Option<usize>; 256],
    slot_owner: [Option<usize>; WINDOW_SIZE],
}

impl HashAccelerator {
    fn new(capacity: usize) -> Self {
        Self {
            prev: vec![None; capacity],
            next: vec![None; capacity],
            list_head: [None; 256],
            list_tail: [None; 256],
            slot_owner: [None; WINDOW_SIZE],
        }
    }

    fn add(&mut self, input: &[u8], pos: usize) {
        let slot = pos & (WINDOW_SIZE - 1);
        if let Some(evicted) = self.slot_owner[slot] {
            let byte = input[evicted] as usize;
            match self.prev[evicted] {
                Some(p) => {
                    self.list_tail[byte] = Some(p);
                    self.next[p] = None;
                }
                None => {
                    self.list_head[byte] = None;
                    self.list_tail[byte] = None;
                }
            }
        }
        let byte = input[pos] as usize;
        self.prev[pos] = None;
        self.next[pos] = self.list_head[byte];
        if let Some(head) = self.list_head[byte] {
            self.prev[head] = Some(pos);
        } else {
            self.list_tail[byte] = Some(pos);
        }
        self.list_head[byte] = Some(pos);
        self.slot_owner[slot] = Some(pos);
    }
}

/// Longest match for `input[lookahead..]` among positions `>= window_start`
/// sharing `input[lookahead]`'s byte value, nearest first.
fn find_match(
    accel: &HashAccelerator,
    input: &[u8],
    window_start: usize,
    lookahead: usize,
    lookahead_len: usize,
) -> (usize, usize) {
    let mut best_len = 0usize;
    let mut best_pos = lookahead;
    let mut cursor = accel.list_head[input[lookahead] as usize];
    while let Some(candidate) = cursor {
        if candidate < window_start {
            break;
        }
        let mut same = 0;
        while same < lookahead_len && input[candidate + same] == input[lookahead + same] {
            same += 1;
        }
        if same > best_len {
            best_len = same;
            best_pos = candidate;
            if same == lookahead_len {
                break;
            }
        }
        cursor = accel.next[candidate];
    }
    (best_len, best_pos)
}

/// Compresses `input` with Jaguar LZSS, using the format's default match
/// bounds (minimum length 3, maximum length 16). `output` must be at least
/// `input.len() * 9 / 8 + 1` bytes; anything smaller is refused up front
/// with `Error::PreconditionFailure`, since that bound is the most the
/// format can ever need (one control bit plus one literal byte per input
/// byte, rounded up).
pub fn encode_jaguar(input: &[u8], output: &mut [u8]) -> Result<usize, Error> {
    encode_jaguar_bounded(input, output, MIN_MATCH, LOOKAHEAD_SIZE)
}

/// Compresses `input` with Jaguar LZSS, honoring a caller-chosen minimum
/// match length (`threshold`) and maximum match length (`lookahead`, clamped
/// to the format's hard 16-byte ceiling, since a copy token's length field is
/// 4 bits wide). Used by [`encode_jaguar_with_options`].
fn encode_jaguar_bounded(input: &[u8], output: &mut [u8], threshold: usize, lookahead_cap: usize) -> Result<usize, Error> {
    log::debug!("encode_jaguar: {} input bytes, {} output capacity", input.len(), output.len());
    let min_output = input.len() * 9 / 8 + 1;
    if output.len() < min_output {
        return Err(Error::PreconditionFailure);
    }
    // threshold is clamped first so a caller-supplied value above the
    // format's 16-byte ceiling can't drag lookahead_cap back above it too.
    // The floor is 2, not 1: a copy token's length nibble is (match_len - 1),
    // and a nibble of 0 (match_len == 1) is the wire format's end-of-stream
    // sentinel, so a threshold of 1 would let the encoder emit a token the
    // decoder reads back as premature termination.
    let threshold = threshold.clamp(2, LOOKAHEAD_SIZE);
    let lookahead_cap = lookahead_cap.max(threshold).min(LOOKAHEAD_SIZE);

    let mut accel = HashAccelerator::new(input.len());
    let mut out_pos = 0usize;
    let mut ops_done = 0u32;
    let mut control_pos = 0usize;
    let mut lookahead = 0usize;

    while lookahead < input.len() {
        if ops_done == 0 {
            if out_pos >= output.len() {
                return Err(Error::OutputOverflow);
            }
            control_pos = out_pos;
            output[out_pos] = 0;
            out_pos += 1;
        }
        ops_done = (ops_done + 1) & 7;

        let window_start = lookahead.saturating_sub(WINDOW_SIZE);
        let lookahead_len = (input.len() - lookahead).min(lookahead_cap);
        let (match_len, match_pos) = find_match(&accel, input, window_start, lookahead, lookahead_len);

        let consumed;
        if match_len >= threshold {
            output[control_pos] = (output[control_pos] >> 1) | 0x80;
            let distance = lookahead - match_pos - 1;
            if out_pos + 2 > output.len() {
                return Err(Error::OutputOverflow);
            }
            output[out_pos] = (distance >> LENGTH_SHIFT) as u8;
            output[out_pos + 1] = ((distance as u8) << LENGTH_SHIFT) | ((match_len - 1) as u8);
            out_pos += 2;
            consumed = match_len;
        } else {
            output[control_pos] >>= 1;
            if out_pos >= output.len() {
                return Err(Error::OutputOverflow);
            }
            output[out_pos] = input[lookahead];
            out_pos += 1;
            consumed = 1;
        }

        for i in 0..consumed {
            accel.add(input, lookahead + i);
        }
        lookahead += consumed;
    }

    if ops_done == 0 {
        if out_pos >= output.len() {
            return Err(Error::OutputOverflow);
        }
        output[out_pos] = 1;
        out_pos += 1;
    } else {
        output[control_pos] = ((output[control_pos] >> 1) | 0x80) >> (7 - ops_done);
    }
    if out_pos + 2 > output.len() {
        return Err(Error::OutputOverflow);
    }
    output[out_pos] = 0;
    output[out_pos + 1] = 0;
    out_pos += 2;

    log::debug!("encode_jaguar: wrote {} bytes", out_pos);
    Ok(out_pos)
}

/// `Options`-aware variant of `decode_jaguar` honoring `in_offset`/`out_offset`.
pub fn decode_jaguar_with_options(input: &[u8], output: &mut [u8], opts: &Options) -> Result<usize, Error> {
    if opts.in_offset > input.len() || opts.out_offset > output.len() {
        return Err(Error::PreconditionFailure);
    }
    decode_jaguar(&input[opts.in_offset..], &mut output[opts.out_offset..])
}

/// `Options`-aware variant of `encode_jaguar` honoring `in_offset`/`out_offset`,
/// and using `opts.threshold`/`opts.lookahead` as the encoder's minimum and
/// maximum match lengths.
pub fn encode_jaguar_with_options(input: &[u8], output: &mut [u8], opts: &Options) -> Result<usize, Error> {
    if opts.in_offset > input.len() || opts.out_offset > output.len() {
        return Err(Error::PreconditionFailure);
    }
    encode_jaguar_bounded(&input[opts.in_offset..], &mut output[opts.out_offset..], opts.threshold, opts.lookahead)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(data: &[u8]) -> Vec<u8> {
        let mut compressed = vec![0u8; data.len() * 9 / 8 + 1];
        let n = encode_jaguar(data, &mut compressed).expect("encode failed");
        compressed.truncate(n);
        let mut expanded = vec![0u8; data.len() + 16];
        let m = decode_jaguar(&compressed, &mut expanded).expect("decode failed");
        expanded.truncate(m);
        expanded
    }

    #[test]
    fn empty_input_round_trips() {
        assert_eq!(round_trip(&[]), Vec::<u8>::new());
    }

    #[test]
    fn single_byte_round_trips() {
        assert_eq!(round_trip(&[0xAB]), vec![0xAB]);
    }

    #[test]
    fn repeated_run_round_trips() {
        let data = vec![0x7Eu8; 300];
        assert_eq!(round_trip(&data), data);
    }

    #[test]
    fn mixed_content_round_trips() {
        let mut data = Vec::new();
        data.extend_from_slice(b"jaguar doom sprite data sprite data sprite data ");
        data.extend_from_slice(b"with a tail of mostly unique bytes: 0123456789abcdef");
        assert_eq!(round_trip(&data), data);
    }

    #[test]
    fn distance_spanning_window_edge_round_trips() {
        let mut data = vec![0u8; 5000];
        for (i, b) in data.iter_mut().enumerate() {
            *b = (i % 200) as u8;
        }
        for i in 0..12 {
            data[4090 + i] = data[i];
        }
        assert_eq!(round_trip(&data), data);
    }

    #[test]
    fn truncated_stream_is_rejected() {
        let data = b"jaguar doom truncated stream test payload".to_vec();
        let mut compressed = vec![0u8; data.len() * 9 / 8 + 1];
        let n = encode_jaguar(&data, &mut compressed).unwrap();
        compressed.truncate(n);
        let truncated = &compressed[..compressed.len() - 1];
        let mut expanded = vec![0u8; data.len() + 16];
        assert!(decode_jaguar(truncated, &mut expanded).is_err());
    }

    #[test]
    fn undersized_output_buffer_is_precondition_failure() {
        let data = vec![0x01u8; 100];
        let mut compressed = vec![0u8; 4];
        let err = encode_jaguar(&data, &mut compressed).unwrap_err();
        assert!(matches!(err, Error::PreconditionFailure));
    }

    #[test]
    fn copy_token_referencing_before_start_is_rejected() {
        // control byte selects a copy op on the first operation, with a
        // distance that reaches before the start of output.
        let input = [0b0000_0001u8, 0x00, 0x21];
        let mut output = vec![0u8; 16];
        let err = decode_jaguar(&input, &mut output).unwrap_err();
        assert!(matches!(err, Error::InvariantViolation));
    }

    #[test]
    fn options_with_offsets_round_trips() {
        use crate::STD_OPTIONS;
        let payload = b"sprite data sprite data sprite data tail bytes".to_vec();
        let mut input = vec![0xFFu8; 4];
        input.extend_from_slice(&payload);
        let mut in_opts = STD_OPTIONS.clone();
        in_opts.in_offset = 4;

        let mut compressed = vec![0u8; payload.len() * 9 / 8 + 1 + 8];
        let n = encode_jaguar_with_options(&input, &mut compressed, &in_opts).unwrap();
        compressed.truncate(n);

        let mut expanded = vec![0u8; 4 + payload.len() + 16];
        let mut out_opts = STD_OPTIONS.clone();
        out_opts.out_offset = 4;
        let m = decode_jaguar_with_options(&compressed, &mut expanded, &out_opts).unwrap();
        assert_eq!(&expanded[4..4 + m], payload.as_slice());
    }

    #[test]
    fn tighter_threshold_still_round_trips() {
        use crate::STD_OPTIONS;
        let payload = b"sprite data sprite data sprite data tail bytes".to_vec();
        let mut opts = STD_OPTIONS.clone();
        opts.threshold = 6;

        let mut tight = vec![0u8; payload.len() * 9 / 8 + 1 + 8];
        let n = encode_jaguar_with_options(&payload, &mut tight, &opts).unwrap();
        tight.truncate(n);
        let mut expanded = vec![0u8; payload.len() + 16];
        let m = decode_jaguar(&tight, &mut expanded).unwrap();
        assert_eq!(&expanded[..m], payload.as_slice());
    }

    #[test]
    fn threshold_floor_rejects_length_one_matches() {
        use crate::STD_OPTIONS;
        // a caller-requested threshold of 1 must be floored to 2, since a
        // copy token of match length 1 is indistinguishable on the wire from
        // the end-of-stream marker; without the floor this data (containing
        // single-byte repeats) would decode as truncated.
        let mut opts = STD_OPTIONS.clone();
        opts.threshold = 1;
        let payload = b"abababababababababababababababab tail bytes after the repeat".to_vec();

        let mut compressed = vec![0u8; payload.len() * 9 / 8 + 1];
        let n = encode_jaguar_with_options(&payload, &mut compressed, &opts).unwrap();
        compressed.truncate(n);
        let mut expanded = vec![0u8; payload.len() + 16];
        let m = decode_jaguar(&compressed, &mut expanded).unwrap();
        assert_eq!(&expanded[..m], payload.as_slice());
    }

    #[test]
    fn threshold_above_lookahead_ceiling_does_not_corrupt_copy_tokens() {
        use crate::STD_OPTIONS;
        // a threshold above the format's 16-byte max length must not drag
        // the effective lookahead cap back above 16 with it; every emitted
        // copy token's length nibble must still fit in 4 bits.
        let mut opts = STD_OPTIONS.clone();
        opts.threshold = 64;
        let payload = vec![0x5Au8; 200];

        let mut compressed = vec![0u8; payload.len() * 9 / 8 + 1];
        let n = encode_jaguar_with_options(&payload, &mut compressed, &opts).unwrap();
        compressed.truncate(n);
        let mut expanded = vec![0u8; payload.len() + 16];
        let m = decode_jaguar(&compressed, &mut expanded).unwrap();
        assert_eq!(&expanded[..m], payload.as_slice());
    }
}
