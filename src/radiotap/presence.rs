//! Presence bitmap chain
//!
//! The `it_present` words follow the 4-byte base header. Bit 31 of every
//! word, including extension words, means another word follows.

use serde::Serialize;
use tracing::trace;

use super::catalog::index;
use super::namespace::Namespace;
use crate::error::{RadiotapError, Result};

/// Bit 31: another presence word follows
pub const EXT_BIT: u32 = 1 << index::EXT;

/// One set bit of the presence chain, annotated with its namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresenceEntry {
    pub namespace: Namespace,
    /// Position of the word in the whole chain
    pub word_index: usize,
    /// Bit within the word (0-30)
    pub bit: u32,
    /// Field index within the namespace block: 32 * word_in_block + bit
    pub index: u32,
}

/// Read the presence chain starting at `cursor`.
///
/// Returns the words and the offset of the first byte after the chain.
/// Never reads at or beyond `limit`, and rejects chains longer than
/// `max_words`.
pub fn read(buffer: &[u8], cursor: usize, limit: usize, max_words: usize) -> Result<(Vec<u32>, usize)> {
    let limit = limit.min(buffer.len());
    let mut words = Vec::with_capacity(1);
    let mut cursor = cursor;

    loop {
        if cursor + 4 > limit {
            return Err(RadiotapError::truncated("presence word", cursor, 4, limit));
        }
        let word = u32::from_le_bytes([
            buffer[cursor],
            buffer[cursor + 1],
            buffer[cursor + 2],
            buffer[cursor + 3],
        ]);
        trace!("presence word {} at {}: {:#010x}", words.len(), cursor, word);
        words.push(word);
        cursor += 4;

        if word & EXT_BIT == 0 {
            break;
        }
        if words.len() >= max_words {
            return Err(RadiotapError::MalformedHeader(format!(
                "presence chain exceeds {} words",
                max_words
            )));
        }
    }

    Ok((words, cursor))
}

/// Set bits of `word` in ascending order, excluding the chain bit.
pub fn set_bits(word: u32) -> impl Iterator<Item = u32> {
    let mut remaining = word & !EXT_BIT;
    std::iter::from_fn(move || {
        if remaining == 0 {
            return None;
        }
        let bit = remaining.trailing_zeros();
        remaining &= remaining - 1;
        Some(bit)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(words: &[u32]) -> Vec<u8> {
        let mut buf = vec![0u8, 0, 0, 0];
        for w in words {
            buf.extend_from_slice(&w.to_le_bytes());
        }
        let len = buf.len() as u16;
        buf[2..4].copy_from_slice(&len.to_le_bytes());
        buf
    }

    #[test]
    fn test_single_word() {
        let buf = header(&[0x0000_0002]);
        let (words, cursor) = read(&buf, 4, buf.len(), 16).unwrap();
        assert_eq!(words, vec![0x0000_0002]);
        assert_eq!(cursor, 8);
    }

    #[test]
    fn test_chain_is_minimal() {
        // Two extension words; trailing bytes after the chain are not consumed
        let mut buf = header(&[0x8000_0001, 0x8000_0000, 0x0000_0004]);
        buf.extend_from_slice(&[0xff; 8]);
        let (words, cursor) = read(&buf, 4, buf.len(), 16).unwrap();
        assert_eq!(words.len(), 3);
        assert_eq!(cursor, 16);
    }

    #[test]
    fn test_chain_past_limit() {
        let buf = header(&[0x8000_0000, 0x8000_0000]);
        let err = read(&buf, 4, buf.len(), 16).unwrap_err();
        assert!(matches!(
            err,
            RadiotapError::TruncatedHeader { what: "presence word", offset: 12, .. }
        ));
    }

    #[test]
    fn test_limit_shorter_than_buffer() {
        let buf = header(&[0x8000_0000, 0x0000_0000]);
        assert!(read(&buf, 4, 8, 16).is_err());
    }

    #[test]
    fn test_word_cap() {
        let mut words = vec![0x8000_0000u32; 4];
        words.push(0);
        let buf = header(&words);

        let err = read(&buf, 4, buf.len(), 4).unwrap_err();
        assert!(matches!(err, RadiotapError::MalformedHeader(_)));

        // Exactly at the cap is fine
        let (words, _) = read(&buf, 4, buf.len(), 5).unwrap();
        assert_eq!(words.len(), 5);
    }

    #[test]
    fn test_set_bits() {
        let bits: Vec<u32> = set_bits(0xa000_0005).collect();
        assert_eq!(bits, vec![0, 2, 29]);
        assert_eq!(set_bits(EXT_BIT).count(), 0);
    }
}
