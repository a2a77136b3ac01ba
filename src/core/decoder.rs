//! Incremental UTF-8 decoding for chunked response bodies.
//!
//! Chunk boundaries are set by the network, not by the text, so a multi-byte
//! character may arrive in two (or four) pieces. The decoder holds on to the
//! incomplete tail until the rest arrives instead of emitting replacement
//! characters.

use std::error::Error as StdError;
use std::fmt;

const BOM: char = '\u{feff}';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Bytes that can never start or continue a valid UTF-8 sequence.
    Malformed { offset: usize, len: usize },
    /// The stream ended in the middle of a multi-byte character.
    Incomplete { pending: usize },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Malformed { offset, len } => write!(
                f,
                "invalid UTF-8 sequence of {len} byte(s) at offset {offset}"
            ),
            DecodeError::Incomplete { pending } => write!(
                f,
                "stream ended inside a multi-byte character ({pending} byte(s) pending)"
            ),
        }
    }
}

impl StdError for DecodeError {}

#[derive(Debug, Default)]
pub struct Utf8StreamDecoder {
    pending: Vec<u8>,
    decoded_bytes: usize,
    bom_checked: bool,
}

impl Utf8StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next chunk, returning whatever text became complete.
    ///
    /// The result may be empty when the chunk only carried the start of a
    /// multi-byte character.
    pub fn decode(&mut self, chunk: &[u8]) -> Result<String, DecodeError> {
        self.pending.extend_from_slice(chunk);

        let valid = match std::str::from_utf8(&self.pending) {
            Ok(_) => self.pending.len(),
            Err(err) => {
                if let Some(len) = err.error_len() {
                    return Err(DecodeError::Malformed {
                        offset: self.decoded_bytes + err.valid_up_to(),
                        len,
                    });
                }
                err.valid_up_to()
            }
        };

        // `valid` bytes are known-good UTF-8, so the lossy path never substitutes.
        let mut text = String::from_utf8_lossy(&self.pending[..valid]).into_owned();
        self.pending.drain(..valid);
        self.decoded_bytes += valid;

        if !self.bom_checked && !text.is_empty() {
            self.bom_checked = true;
            if text.starts_with(BOM) {
                text.drain(..BOM.len_utf8());
            }
        }

        Ok(text)
    }

    /// Signal end of stream. Leftover bytes of an unfinished character are an error.
    pub fn finish(&mut self) -> Result<(), DecodeError> {
        if self.pending.is_empty() {
            Ok(())
        } else {
            Err(DecodeError::Incomplete {
                pending: self.pending.len(),
            })
        }
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_passes_straight_through() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(b"Hel").unwrap(), "Hel");
        assert_eq!(decoder.decode(b"lo").unwrap(), "lo");
        assert!(decoder.finish().is_ok());
    }

    #[test]
    fn three_byte_character_split_across_chunks() {
        let euro = "€".as_bytes();
        assert_eq!(euro.len(), 3);

        let mut decoder = Utf8StreamDecoder::new();
        let mut first = b"price: ".to_vec();
        first.push(euro[0]);
        assert_eq!(decoder.decode(&first).unwrap(), "price: ");
        assert_eq!(decoder.pending_len(), 1);
        assert_eq!(decoder.decode(&euro[1..]).unwrap(), "€");
        assert_eq!(decoder.pending_len(), 0);
        assert!(decoder.finish().is_ok());
    }

    #[test]
    fn four_byte_character_one_byte_at_a_time() {
        let crab = "🦀".as_bytes();
        let mut decoder = Utf8StreamDecoder::new();
        let mut out = String::new();
        for byte in crab {
            out.push_str(&decoder.decode(std::slice::from_ref(byte)).unwrap());
        }
        assert_eq!(out, "🦀");
        assert!(!out.contains('\u{fffd}'));
    }

    #[test]
    fn malformed_bytes_are_reported_with_offset() {
        let mut decoder = Utf8StreamDecoder::new();
        decoder.decode(b"ok ").unwrap();
        let err = decoder.decode(&[b'a', 0xff, b'b']).unwrap_err();
        assert_eq!(err, DecodeError::Malformed { offset: 4, len: 1 });
    }

    #[test]
    fn truncated_character_at_end_of_stream_is_incomplete() {
        let mut decoder = Utf8StreamDecoder::new();
        let bytes = "ñ".as_bytes();
        assert_eq!(decoder.decode(&bytes[..1]).unwrap(), "");
        assert_eq!(
            decoder.finish().unwrap_err(),
            DecodeError::Incomplete { pending: 1 }
        );
    }

    #[test]
    fn leading_byte_order_mark_is_dropped_once() {
        let mut decoder = Utf8StreamDecoder::new();
        let bom = "\u{feff}".as_bytes();
        assert_eq!(decoder.decode(&bom[..2]).unwrap(), "");
        let mut rest = bom[2..].to_vec();
        rest.extend_from_slice(b"hi");
        assert_eq!(decoder.decode(&rest).unwrap(), "hi");
        assert_eq!(decoder.decode("\u{feff}".as_bytes()).unwrap(), "\u{feff}");
    }
}
