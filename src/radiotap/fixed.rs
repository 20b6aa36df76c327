//! Fixed Field Region
//!
//! Walks the presence chain and reads every present standard field in
//! canonical order, aligning each to its natural boundary. Fields are
//! packed: absent fields take no space.

use serde::Serialize;
use tracing::{debug, trace};

use super::catalog::{align_up, index, FieldKind};
use super::fields::FieldValue;
use super::namespace::{NamespaceSwitcher, Switch, Transition, VendorBlock, VendorNamespace};
use super::presence::PresenceEntry;
use crate::error::{RadiotapError, Result};

/// A field read from the fixed region
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FixedField {
    /// Canonical field index
    pub index: u32,
    /// `None` for fields this decoder does not know
    pub kind: Option<FieldKind>,
    pub word_index: usize,
    pub offset: usize,
    pub length: usize,
    #[serde(skip)]
    pub raw: Vec<u8>,
    pub value: FieldValue,
}

impl FixedField {
    pub fn name(&self) -> &'static str {
        self.kind.map_or("unknown", FieldKind::name)
    }
}

/// Everything the fixed pass produces
#[derive(Debug, Clone, Default)]
pub struct FixedRegion {
    pub presence: Vec<PresenceEntry>,
    pub fields: Vec<FixedField>,
    pub vendor_blocks: Vec<VendorBlock>,
    /// Bit 28 seen; TLVs follow at the next 4-byte boundary
    pub tlv_present: bool,
    /// First byte after the last fixed field or vendor block
    pub cursor: usize,
}

struct Walk<'a> {
    buffer: &'a [u8],
    limit: usize,
    region: FixedRegion,
    /// An unknown field whose extent runs to `limit`
    opaque: Option<PresenceEntry>,
}

impl<'a> Walk<'a> {
    fn field(&mut self, entry: &PresenceEntry) -> Result<()> {
        if let Some(unknown) = &self.opaque {
            return Err(RadiotapError::MalformedHeader(format!(
                "field {} follows unknown field {} of unknown length",
                entry.index, unknown.index
            )));
        }
        if self.region.tlv_present {
            return Err(RadiotapError::MalformedHeader(format!(
                "field {} present after the TLV marker",
                entry.index
            )));
        }
        if entry.index == index::TLV {
            trace!("TLV marker in word {}", entry.word_index);
            self.region.tlv_present = true;
            return Ok(());
        }

        let Some(kind) = FieldKind::from_index(entry.index) else {
            debug!(
                "unknown field {} at {}, rest of header kept opaque",
                entry.index, self.region.cursor
            );
            self.opaque = Some(entry.clone());
            return Ok(());
        };

        let layout = kind.layout();
        let offset = align_up(self.region.cursor, layout.align);
        if offset + layout.size > self.limit {
            return Err(RadiotapError::truncated(
                kind.name(),
                offset,
                layout.size,
                self.limit,
            ));
        }
        let raw = &self.buffer[offset..offset + layout.size];
        let value = FieldValue::parse(kind, raw)?;
        trace!("{} at {}: {:?}", kind.name(), offset, value);

        self.region.fields.push(FixedField {
            index: entry.index,
            kind: Some(kind),
            word_index: entry.word_index,
            offset,
            length: layout.size,
            raw: raw.to_vec(),
            value,
        });
        self.region.cursor = offset + layout.size;
        Ok(())
    }

    fn vendor_switch(&mut self) -> Result<Transition> {
        if self.region.tlv_present || self.opaque.is_some() {
            return Err(RadiotapError::MalformedHeader(
                "vendor namespace after the end of the fixed fields".to_string(),
            ));
        }
        let (descriptor, cursor) = VendorNamespace::read(self.buffer, self.region.cursor, self.limit)?;
        let (block, cursor) = VendorBlock::read(&descriptor, self.buffer, cursor, self.limit)?;
        debug!(
            "skipping vendor namespace {:02x}:{:02x}:{:02x}/{}, {} bytes",
            descriptor.oui[0],
            descriptor.oui[1],
            descriptor.oui[2],
            descriptor.sub_namespace,
            descriptor.skip_length
        );
        self.region.vendor_blocks.push(block);
        self.region.cursor = cursor;
        Ok(Transition::ToVendor(descriptor))
    }

    fn finish(mut self) -> FixedRegion {
        if let Some(entry) = self.opaque.take() {
            let offset = self.region.cursor;
            let end = self.limit.max(offset);
            self.region.fields.push(FixedField {
                index: entry.index,
                kind: None,
                word_index: entry.word_index,
                offset,
                length: end - offset,
                raw: self.buffer[offset..end].to_vec(),
                value: FieldValue::Opaque,
            });
            self.region.cursor = end;
        }
        self.region
    }
}

/// Decode the fixed region starting at `cursor`, never reading at or past `limit`.
///
/// `buffer` must hold at least `limit` bytes.
pub fn decode(buffer: &[u8], cursor: usize, limit: usize, words: &[u32]) -> Result<FixedRegion> {
    let limit = limit.min(buffer.len());
    let mut walk = Walk {
        buffer,
        limit,
        region: FixedRegion {
            cursor,
            ..Default::default()
        },
        opaque: None,
    };
    let mut switcher = NamespaceSwitcher::new();

    for (word_index, &word) in words.iter().enumerate() {
        let switch = Switch::of(word)?;
        let entries = switcher.annotate(word_index, word);

        // Vendor data was skipped wholesale with its descriptor
        if !switcher.is_vendor() {
            for entry in &entries {
                walk.field(entry)?;
            }
        }
        walk.region.presence.extend(entries);

        let transition = match switch {
            Switch::Stay => Transition::Stay,
            Switch::Radiotap => Transition::ToStandard,
            Switch::Vendor => walk.vendor_switch()?,
        };
        switcher.apply(transition);
    }

    Ok(walk.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::radiotap::fields::Channel;
    use crate::radiotap::namespace::Namespace;

    #[test]
    fn test_single_flags_field() {
        let buf = [0x00, 0x00, 0x0c, 0x00, 0x02, 0x00, 0x00, 0x00, 0x10, 0x00, 0x00, 0x00];
        let region = decode(&buf, 8, 12, &[0x0000_0002]).unwrap();
        assert_eq!(region.fields.len(), 1);
        assert_eq!(region.fields[0].index, 1);
        assert_eq!(region.fields[0].raw, vec![0x10]);
        assert_eq!(region.fields[0].offset, 8);
        assert_eq!(region.cursor, 9);
        assert!(!region.tlv_present);
    }

    #[test]
    fn test_alignment_padding() {
        // Flags at 8, one pad byte, Channel at 10
        let buf = [
            0x00, 0x00, 0x0e, 0x00, 0x0a, 0x00, 0x00, 0x00, // header
            0x02, 0xff, 0x6c, 0x09, 0xa0, 0x00,
        ];
        let region = decode(&buf, 8, buf.len(), &[0x0000_000a]).unwrap();
        assert_eq!(region.fields[1].offset, 10);
        assert_eq!(
            region.fields[1].value,
            FieldValue::Channel(Channel {
                freq: 2412,
                flags: 0x00a0
            })
        );
        assert_eq!(region.cursor, 14);
    }

    #[test]
    fn test_tsft_after_extension_word() {
        let mut buf = vec![0x00, 0x00, 0x18, 0x00];
        buf.extend_from_slice(&0x8000_0001u32.to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(&[0; 4]); // pad to 16
        buf.extend_from_slice(&0x1122_3344_5566_7788u64.to_le_bytes());
        let region = decode(&buf, 12, buf.len(), &[0x8000_0001, 0]).unwrap();
        assert_eq!(region.fields[0].offset, 16);
        assert_eq!(region.fields[0].value, FieldValue::Tsft(0x1122_3344_5566_7788));
        assert_eq!(region.presence.len(), 1);
    }

    #[test]
    fn test_field_past_limit() {
        // Channel needs 10..14 but the header ends at 12
        let buf = [0x00, 0x00, 0x0c, 0x00, 0x0a, 0x00, 0x00, 0x00, 0x02, 0x00, 0x6c, 0x09];
        let err = decode(&buf, 8, 12, &[0x0000_000a]).unwrap_err();
        assert!(matches!(
            err,
            RadiotapError::TruncatedHeader { what: "channel", offset: 10, needed: 4, limit: 12 }
        ));
    }

    #[test]
    fn test_vendor_namespace_skipped() {
        let mut buf = vec![0x00, 0x00, 0x1b, 0x00];
        buf.extend_from_slice(&0xc000_0002u32.to_le_bytes()); // flags, vendor ns, ext
        buf.extend_from_slice(&0xa000_0001u32.to_le_bytes()); // vendor bit 0, radiotap ns, ext
        buf.extend_from_slice(&0x0000_0020u32.to_le_bytes()); // dBm signal
        buf.push(0x10); // flags at 16
        buf.push(0x00); // pad
        buf.extend_from_slice(&[0x00, 0x13, 0xe8, 0x02, 0x02, 0x00]); // descriptor at 18
        buf.extend_from_slice(&[0xaa, 0xbb]); // vendor data at 24
        buf.push(0xc4); // dBm signal at 26

        let words = [0xc000_0002, 0xa000_0001, 0x0000_0020];
        let region = decode(&buf, 16, buf.len(), &words).unwrap();

        assert_eq!(region.fields.len(), 2);
        assert_eq!(region.fields[1].value, FieldValue::AntennaSignalDbm(-60));
        assert_eq!(region.fields[1].offset, 26);
        assert_eq!(region.vendor_blocks.len(), 1);
        assert_eq!(region.vendor_blocks[0].data, vec![0xaa, 0xbb]);
        assert_eq!(region.vendor_blocks[0].offset, 24);

        let vendor_entry = &region.presence[1];
        assert_eq!(vendor_entry.word_index, 1);
        assert_eq!(
            vendor_entry.namespace,
            Namespace::Vendor {
                oui: [0x00, 0x13, 0xe8],
                sub_namespace: 2
            }
        );
        assert_eq!(region.presence[2].namespace, Namespace::Standard);
        assert_eq!(region.presence[2].index, 5);
    }

    #[test]
    fn test_tlv_marker_ends_fixed_pass() {
        let buf = [0x00, 0x00, 0x0c, 0x00, 0x02, 0x00, 0x00, 0x10, 0x10, 0x00, 0x00, 0x00];
        let region = decode(&buf, 8, 12, &[0x1000_0002]).unwrap();
        assert!(region.tlv_present);
        assert_eq!(region.fields.len(), 1);
        assert_eq!(region.cursor, 9);
    }

    #[test]
    fn test_field_after_tlv_marker() {
        let buf = [0u8; 16];
        let err = decode(&buf, 12, 16, &[0x9000_0000, 0x0000_0001]).unwrap_err();
        assert!(matches!(err, RadiotapError::MalformedHeader(_)));
    }

    #[test]
    fn test_unknown_field_is_opaque() {
        // bit 25 is reserved
        let buf = [0x00, 0x00, 0x0b, 0x00, 0x00, 0x00, 0x00, 0x02, 0xaa, 0xbb, 0xcc];
        let region = decode(&buf, 8, 11, &[0x0200_0000]).unwrap();
        assert_eq!(region.fields.len(), 1);
        assert_eq!(region.fields[0].kind, None);
        assert_eq!(region.fields[0].raw, vec![0xaa, 0xbb, 0xcc]);
        assert_eq!(region.fields[0].value, FieldValue::Opaque);
        assert_eq!(region.cursor, 11);
    }

    #[test]
    fn test_field_after_unknown_field() {
        let buf = [0u8; 12];
        let err = decode(&buf, 8, 12, &[0x0600_0000]).unwrap_err();
        assert!(matches!(err, RadiotapError::MalformedHeader(_)));
    }

    #[test]
    fn test_both_namespace_bits() {
        let buf = [0u8; 12];
        assert!(matches!(
            decode(&buf, 8, 12, &[0x6000_0000]),
            Err(RadiotapError::MalformedHeader(_))
        ));
    }
}
