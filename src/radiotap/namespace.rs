//! Namespace Switching
//!
//! Bits 29 and 30 of a presence word select the namespace of the *next*
//! word: 29 returns to the radiotap namespace, 30 enters a vendor namespace
//! whose 6-byte descriptor sits at the bit-30 position of the field stream.
//! The descriptor's `skip_length` bytes follow it and are always skipped.

use serde::Serialize;

use super::catalog::{align_up, index, VENDOR_DESCRIPTOR};
use super::presence::{set_bits, PresenceEntry};
use crate::error::{RadiotapError, Result};

const RADIOTAP_NS_BIT: u32 = 1 << index::RADIOTAP_NAMESPACE;
const VENDOR_NS_BIT: u32 = 1 << index::VENDOR_NAMESPACE;

/// Interpretation context of a presence word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Namespace {
    Standard,
    Vendor { oui: [u8; 3], sub_namespace: u8 },
}

/// The vendor namespace descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VendorNamespace {
    pub oui: [u8; 3],
    pub sub_namespace: u8,
    pub skip_length: u16,
}

impl VendorNamespace {
    /// Read the descriptor at the next 2-byte boundary after `cursor`.
    ///
    /// Returns the descriptor and the offset just past it.
    pub fn read(buffer: &[u8], cursor: usize, limit: usize) -> Result<(Self, usize)> {
        let start = align_up(cursor, VENDOR_DESCRIPTOR.align);
        let end = start + VENDOR_DESCRIPTOR.size;
        if end > limit || end > buffer.len() {
            return Err(RadiotapError::truncated(
                "vendor namespace",
                start,
                VENDOR_DESCRIPTOR.size,
                limit,
            ));
        }
        let raw = &buffer[start..end];
        let descriptor = VendorNamespace {
            oui: [raw[0], raw[1], raw[2]],
            sub_namespace: raw[3],
            skip_length: u16::from_le_bytes([raw[4], raw[5]]),
        };
        Ok((descriptor, end))
    }

    pub fn namespace(&self) -> Namespace {
        Namespace::Vendor {
            oui: self.oui,
            sub_namespace: self.sub_namespace,
        }
    }
}

/// Vendor data skipped in the fixed region, kept as opaque bytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VendorBlock {
    pub oui: [u8; 3],
    pub sub_namespace: u8,
    pub skip_length: u16,
    /// Offset of the first data byte (just past the descriptor)
    pub offset: usize,
    pub data: Vec<u8>,
}

impl VendorBlock {
    /// Take the `skip_length` bytes following a descriptor.
    pub fn read(
        descriptor: &VendorNamespace,
        buffer: &[u8],
        cursor: usize,
        limit: usize,
    ) -> Result<(Self, usize)> {
        let needed = descriptor.skip_length as usize;
        let end = cursor + needed;
        if end > limit || end > buffer.len() {
            return Err(RadiotapError::truncated("vendor data", cursor, needed, limit));
        }
        let block = VendorBlock {
            oui: descriptor.oui,
            sub_namespace: descriptor.sub_namespace,
            skip_length: descriptor.skip_length,
            offset: cursor,
            data: buffer[cursor..end].to_vec(),
        };
        Ok((block, end))
    }
}

/// Namespace request carried by a presence word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Switch {
    Stay,
    Radiotap,
    Vendor,
}

impl Switch {
    pub fn of(word: u32) -> Result<Self> {
        match (word & RADIOTAP_NS_BIT != 0, word & VENDOR_NS_BIT != 0) {
            (false, false) => Ok(Switch::Stay),
            (true, false) => Ok(Switch::Radiotap),
            (false, true) => Ok(Switch::Vendor),
            (true, true) => Err(RadiotapError::MalformedHeader(
                "presence word selects both radiotap and vendor namespace".to_string(),
            )),
        }
    }
}

/// Transition applied after a presence word has been walked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Stay,
    ToStandard,
    ToVendor(VendorNamespace),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Standard,
    Vendor(VendorNamespace),
}

/// Tracks the active namespace across a presence chain.
#[derive(Debug, Clone)]
pub struct NamespaceSwitcher {
    state: State,
    /// Words seen since the last switch
    word_in_block: u32,
}

impl Default for NamespaceSwitcher {
    fn default() -> Self {
        Self::new()
    }
}

impl NamespaceSwitcher {
    pub fn new() -> Self {
        Self {
            state: State::Standard,
            word_in_block: 0,
        }
    }

    pub fn namespace(&self) -> Namespace {
        match &self.state {
            State::Standard => Namespace::Standard,
            State::Vendor(descriptor) => descriptor.namespace(),
        }
    }

    pub fn is_vendor(&self) -> bool {
        matches!(self.state, State::Vendor(_))
    }

    /// Annotate the data bits of `word` (everything but 29, 30 and 31).
    pub fn annotate(&self, word_index: usize, word: u32) -> Vec<PresenceEntry> {
        let namespace = self.namespace();
        let base = self.word_in_block.saturating_mul(32);
        set_bits(word)
            .filter(|&bit| bit != index::RADIOTAP_NAMESPACE && bit != index::VENDOR_NAMESPACE)
            .map(|bit| PresenceEntry {
                namespace,
                word_index,
                bit,
                index: base.saturating_add(bit),
            })
            .collect()
    }

    /// Move to the namespace of the next word.
    pub fn apply(&mut self, transition: Transition) {
        let (state, word_in_block) = match (self.state, transition) {
            (State::Standard, Transition::Stay) => (State::Standard, self.word_in_block + 1),
            (State::Vendor(d), Transition::Stay) => (State::Vendor(d), self.word_in_block + 1),
            (_, Transition::ToStandard) => (State::Standard, 0),
            (_, Transition::ToVendor(d)) => (State::Vendor(d), 0),
        };
        self.state = state;
        self.word_in_block = word_in_block;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTEL: VendorNamespace = VendorNamespace {
        oui: [0x00, 0x13, 0xe8],
        sub_namespace: 1,
        skip_length: 4,
    };

    #[test]
    fn test_switch_bits() {
        assert_eq!(Switch::of(0x0000_0003).unwrap(), Switch::Stay);
        assert_eq!(Switch::of(0xa000_0000).unwrap(), Switch::Radiotap);
        assert_eq!(Switch::of(0xc000_0000).unwrap(), Switch::Vendor);
        assert!(Switch::of(0x6000_0000).is_err());
    }

    #[test]
    fn test_annotate_standard() {
        let switcher = NamespaceSwitcher::new();
        let entries = switcher.annotate(0, 0xe000_0006);
        let bits: Vec<u32> = entries.iter().map(|e| e.bit).collect();
        assert_eq!(bits, vec![1, 2]);
        assert!(entries.iter().all(|e| e.namespace == Namespace::Standard));
    }

    #[test]
    fn test_extension_word_indices() {
        let mut switcher = NamespaceSwitcher::new();
        switcher.apply(Transition::Stay);
        let entries = switcher.annotate(1, 0x0000_0001);
        assert_eq!(entries[0].index, 32);
        assert_eq!(entries[0].word_index, 1);
    }

    #[test]
    fn test_transition_table() {
        let mut switcher = NamespaceSwitcher::new();
        switcher.apply(Transition::ToVendor(INTEL));
        assert!(switcher.is_vendor());
        assert_eq!(
            switcher.namespace(),
            Namespace::Vendor {
                oui: [0x00, 0x13, 0xe8],
                sub_namespace: 1
            }
        );
        assert_eq!(switcher.annotate(1, 0x0000_0001)[0].index, 0);

        switcher.apply(Transition::Stay);
        assert!(switcher.is_vendor());
        assert_eq!(switcher.annotate(2, 0x0000_0001)[0].index, 32);

        // Bit 29 restarts radiotap numbering
        switcher.apply(Transition::ToStandard);
        assert_eq!(switcher.namespace(), Namespace::Standard);
        assert_eq!(switcher.annotate(3, 0x0000_0002)[0].index, 1);
    }

    #[test]
    fn test_read_descriptor_aligned() {
        // Cursor at 9 aligns to 10
        let mut buf = vec![0u8; 10];
        buf.extend_from_slice(&[0x00, 0x13, 0xe8, 0x01, 0x04, 0x00]);
        buf.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
        let (descriptor, cursor) = VendorNamespace::read(&buf, 9, buf.len()).unwrap();
        assert_eq!(descriptor, INTEL);
        assert_eq!(cursor, 16);

        let (block, cursor) = VendorBlock::read(&descriptor, &buf, cursor, buf.len()).unwrap();
        assert_eq!(block.data, vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(block.offset, 16);
        assert_eq!(cursor, 20);
    }

    #[test]
    fn test_skip_length_past_limit() {
        let mut buf = vec![0u8; 8];
        buf.extend_from_slice(&[0x00, 0x13, 0xe8, 0x01, 0x40, 0x00]);
        let (descriptor, cursor) = VendorNamespace::read(&buf, 8, buf.len()).unwrap();
        let err = VendorBlock::read(&descriptor, &buf, cursor, buf.len()).unwrap_err();
        assert!(matches!(err, RadiotapError::TruncatedHeader { what: "vendor data", .. }));
    }

    #[test]
    fn test_descriptor_truncated() {
        let buf = vec![0u8; 12];
        assert!(VendorNamespace::read(&buf, 8, 12).is_err());
    }
}
