//! Radiotap Header Decoder
//!
//! Drives the presence reader, namespace walk, fixed-field pass and TLV
//! pass over one header. All reads are bounded by the header's declared
//! `it_len`; bytes past it belong to the 802.11 frame.
//!
//! Reference: https://www.radiotap.org/

use serde::Serialize;
use tracing::{debug, trace};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::catalog::{align_up, FieldKind, TLV_ALIGN};
use super::fields::{FieldValue, Flags};
use super::fixed::{self, FixedField};
use super::info::RadiotapInfo;
use super::namespace::VendorBlock;
use super::presence::{self, PresenceEntry};
use super::tlv::{self, TlvRecord, TlvValue};
use crate::config::DecoderSettings;
use crate::error::{RadiotapError, Result};

/// Version byte plus pad, `it_len` and the first presence word
pub const MIN_HEADER_LEN: usize = 8;

/// Offset of the first presence word
const PRESENCE_OFFSET: usize = 4;

/// The base header and its presence chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RadiotapHeader {
    pub version: u8,
    pub pad: u8,
    /// Total header length including the base header
    pub length: u16,
    pub presence_words: Vec<u32>,
}

/// Result of decoding one header
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedRadiotap {
    pub header: RadiotapHeader,
    /// Every data bit of the chain, in presence order
    pub presence: Vec<PresenceEntry>,
    pub fixed_fields: Vec<FixedField>,
    pub vendor_blocks: Vec<VendorBlock>,
    pub tlv_records: Vec<TlvRecord>,
    /// Where the 802.11 frame begins (always `header.length`)
    pub payload_offset: usize,
}

impl DecodedRadiotap {
    /// Fixed field by canonical index
    pub fn field(&self, index: u32) -> Option<&FixedField> {
        self.fixed_fields.iter().find(|f| f.index == index)
    }

    /// Value of a known field, from the fixed region or a field TLV
    pub fn value(&self, kind: FieldKind) -> Option<&FieldValue> {
        self.field(kind.index())
            .filter(|f| f.kind == Some(kind))
            .map(|f| &f.value)
            .or_else(|| {
                self.tlvs(kind.index() as u16).find_map(|r| match &r.decoded {
                    TlvValue::Field { value } => Some(value),
                    _ => None,
                })
            })
    }

    /// First TLV record of the given type
    pub fn tlv(&self, tlv_type: u16) -> Option<&TlvRecord> {
        self.tlvs(tlv_type).next()
    }

    /// All TLV records of the given type, in occurrence order
    pub fn tlvs(&self, tlv_type: u16) -> impl Iterator<Item = &TlvRecord> {
        self.tlv_records.iter().filter(move |r| r.tlv_type == tlv_type)
    }

    /// The 802.11 frame following the header
    pub fn payload<'a>(&self, frame: &'a [u8]) -> &'a [u8] {
        frame.get(self.payload_offset..).unwrap_or(&[])
    }

    pub fn flags(&self) -> Option<Flags> {
        match self.value(FieldKind::Flags) {
            Some(FieldValue::Flags(flags)) => Some(*flags),
            _ => None,
        }
    }

    /// The payload ends with a 4-byte FCS
    pub fn has_fcs(&self) -> bool {
        self.flags().is_some_and(|f| f.fcs_at_end())
    }

    pub fn info(&self) -> RadiotapInfo {
        let tlv_values = self.tlv_records.iter().filter_map(|r| match &r.decoded {
            TlvValue::Field { value } => Some(value),
            _ => None,
        });
        RadiotapInfo::from_values(self.fixed_fields.iter().map(|f| &f.value).chain(tlv_values))
    }
}

/// Stateless header decoder
#[derive(Debug, Clone, Default)]
pub struct RadiotapDecoder {
    settings: DecoderSettings,
}

impl RadiotapDecoder {
    pub fn new(settings: DecoderSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &DecoderSettings {
        &self.settings
    }

    /// Decode the radiotap header at the start of `buffer`.
    ///
    /// `buffer` may extend past the header; the rest is frame payload.
    pub fn decode(&self, buffer: &[u8]) -> Result<DecodedRadiotap> {
        if buffer.len() < MIN_HEADER_LEN {
            return Err(RadiotapError::truncated(
                "radiotap header",
                0,
                MIN_HEADER_LEN,
                buffer.len(),
            ));
        }

        let version = buffer[0];
        if version != 0 {
            return Err(RadiotapError::UnsupportedVersion(version));
        }
        let pad = buffer[1];
        let length = u16::from_le_bytes([buffer[2], buffer[3]]);
        let limit = length as usize;

        if limit < MIN_HEADER_LEN {
            return Err(RadiotapError::truncated("radiotap header", 0, MIN_HEADER_LEN, limit));
        }
        if buffer.len() < limit {
            return Err(RadiotapError::truncated("radiotap header", 0, limit, buffer.len()));
        }

        let (presence_words, cursor) =
            presence::read(buffer, PRESENCE_OFFSET, limit, self.settings.max_presence_words)?;
        let region = fixed::decode(buffer, cursor, limit, &presence_words)?;

        let tlv_records = if region.tlv_present {
            tlv::decode(
                buffer,
                align_up(region.cursor, TLV_ALIGN),
                limit,
                self.settings.tlv_policy,
            )?
        } else {
            if region.cursor < limit {
                debug!("{} unused bytes at the end of the header", limit - region.cursor);
            }
            Vec::new()
        };

        trace!(
            "decoded {} fixed fields, {} TLVs, header length {}",
            region.fields.len(),
            tlv_records.len(),
            length
        );

        Ok(DecodedRadiotap {
            header: RadiotapHeader {
                version,
                pad,
                length,
                presence_words,
            },
            presence: region.presence,
            fixed_fields: region.fields,
            vendor_blocks: region.vendor_blocks,
            tlv_records,
            payload_offset: limit,
        })
    }

    /// Decode independent frames, in parallel when the feature is enabled.
    ///
    /// Results are in input order.
    #[cfg(feature = "parallel")]
    pub fn decode_batch(&self, frames: &[&[u8]]) -> Vec<Result<DecodedRadiotap>> {
        frames.par_iter().map(|frame| self.decode(frame)).collect()
    }

    /// Decode independent frames (non-parallel fallback)
    #[cfg(not(feature = "parallel"))]
    pub fn decode_batch(&self, frames: &[&[u8]]) -> Vec<Result<DecodedRadiotap>> {
        frames.iter().map(|frame| self.decode(frame)).collect()
    }
}

/// Decode with default settings
pub fn decode(buffer: &[u8]) -> Result<DecodedRadiotap> {
    RadiotapDecoder::default().decode(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TlvPolicy;
    use crate::error::ErrorKind;
    use crate::radiotap::catalog::{index, tlv_type};

    #[test]
    fn test_flags_only() {
        let buf = [
            0x00, 0x00, 0x0c, 0x00, 0x02, 0x00, 0x00, 0x00, 0x10, 0x00, 0x00, 0x00, 0x88, 0x41,
        ];
        let decoded = decode(&buf).unwrap();
        assert_eq!(decoded.header.length, 12);
        assert_eq!(decoded.fixed_fields.len(), 1);
        assert_eq!(decoded.fixed_fields[0].index, 1);
        assert_eq!(decoded.fixed_fields[0].raw, vec![0x10]);
        assert!(decoded.tlv_records.is_empty());
        assert_eq!(decoded.payload_offset, 12);
        assert!(decoded.has_fcs());
        assert_eq!(decoded.payload(&buf), &[0x88, 0x41]);
    }

    #[test]
    fn test_short_buffer() {
        for len in 0..MIN_HEADER_LEN {
            let buf = vec![0u8; len];
            let err = decode(&buf).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::TruncatedHeader);
        }
    }

    #[test]
    fn test_bad_version() {
        let buf = [0x01, 0x00, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00];
        assert!(matches!(decode(&buf), Err(RadiotapError::UnsupportedVersion(1))));
    }

    #[test]
    fn test_declared_length() {
        // Shorter than the minimum header
        let buf = [0x00, 0x00, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00];
        assert_eq!(decode(&buf).unwrap_err().kind(), ErrorKind::TruncatedHeader);

        // Longer than the buffer
        let buf = [0x00, 0x00, 0x20, 0x00, 0x00, 0x00, 0x00, 0x00];
        assert_eq!(decode(&buf).unwrap_err().kind(), ErrorKind::TruncatedHeader);
    }

    #[test]
    fn test_usig_tlv() {
        let mut buf = vec![0x00, 0x00, 0x1c, 0x00];
        buf.extend_from_slice(&0x1000_0002u32.to_le_bytes());
        buf.push(0x00); // flags
        buf.extend_from_slice(&[0, 0, 0]); // pad to 12
        buf.extend_from_slice(&33u16.to_le_bytes());
        buf.extend_from_slice(&12u16.to_le_bytes());
        buf.extend_from_slice(&[0x11; 12]);
        assert_eq!(buf.len(), 28);

        let decoded = decode(&buf).unwrap();
        assert_eq!(decoded.fixed_fields.len(), 1);
        assert_eq!(decoded.tlv_records.len(), 1);
        let record = decoded.tlv(tlv_type::EHT_USIG).unwrap();
        assert_eq!(record.offset, 12);
        assert!(matches!(record.decoded, TlvValue::Usig(_)));
        assert_eq!(decoded.payload_offset, 28);
    }

    #[test]
    fn test_tlv_past_header() {
        let mut buf = vec![0x00, 0x00, 0x18, 0x00];
        buf.extend_from_slice(&0x1000_0000u32.to_le_bytes());
        buf.extend_from_slice(&33u16.to_le_bytes());
        buf.extend_from_slice(&12u16.to_le_bytes());
        buf.extend_from_slice(&[0; 12]);
        // Declared length stops 4 bytes short of the record's value
        buf[2] = 20;
        let err = decode(&buf).unwrap_err();
        assert!(matches!(err, RadiotapError::TruncatedHeader { what: "TLV value", .. }));
    }

    #[test]
    fn test_eht_tlv_one_user() {
        let mut buf = vec![0x00, 0x00, 0x00, 0x00];
        buf.extend_from_slice(&0x1000_0000u32.to_le_bytes());
        buf.extend_from_slice(&34u16.to_le_bytes());
        buf.extend_from_slice(&44u16.to_le_bytes());
        buf.extend_from_slice(&[0; 40]);
        buf.extend_from_slice(&0x00d0_0002u32.to_le_bytes());
        let len = buf.len() as u16;
        buf[2..4].copy_from_slice(&len.to_le_bytes());

        let decoded = decode(&buf).unwrap();
        let TlvValue::Eht(eht) = &decoded.tlv(tlv_type::EHT).unwrap().decoded else {
            panic!("expected EHT");
        };
        assert_eq!(eht.user_info.len(), 1);
        assert_eq!(eht.user_info[0].mcs(), Some(13));
    }

    #[test]
    fn test_eht_bad_length_policy() {
        let mut buf = vec![0x00, 0x00, 0x00, 0x00];
        buf.extend_from_slice(&0x1000_0000u32.to_le_bytes());
        buf.extend_from_slice(&34u16.to_le_bytes());
        buf.extend_from_slice(&42u16.to_le_bytes());
        buf.extend_from_slice(&[0; 44]);
        let len = buf.len() as u16;
        buf[2..4].copy_from_slice(&len.to_le_bytes());

        let strict = RadiotapDecoder::default();
        assert_eq!(strict.decode(&buf).unwrap_err().kind(), ErrorKind::MalformedTlv);

        let lenient = RadiotapDecoder::new(DecoderSettings {
            tlv_policy: TlvPolicy::Skip,
            ..Default::default()
        });
        let decoded = lenient.decode(&buf).unwrap();
        assert!(decoded.tlv_records[0].is_malformed());
    }

    #[test]
    fn test_presence_cap() {
        let mut buf = vec![0x00, 0x00, 0x00, 0x00];
        for _ in 0..20 {
            buf.extend_from_slice(&0x8000_0000u32.to_le_bytes());
        }
        buf.extend_from_slice(&0u32.to_le_bytes());
        let len = buf.len() as u16;
        buf[2..4].copy_from_slice(&len.to_le_bytes());

        assert_eq!(decode(&buf).unwrap_err().kind(), ErrorKind::MalformedHeader);

        let roomy = RadiotapDecoder::new(DecoderSettings {
            max_presence_words: 32,
            ..Default::default()
        });
        assert_eq!(roomy.decode(&buf).unwrap().header.presence_words.len(), 21);
    }

    #[test]
    fn test_field_tlv_lookup() {
        let mut buf = vec![0x00, 0x00, 0x00, 0x00];
        buf.extend_from_slice(&0x1000_0000u32.to_le_bytes());
        buf.extend_from_slice(&(index::CHANNEL as u16).to_le_bytes());
        buf.extend_from_slice(&4u16.to_le_bytes());
        buf.extend_from_slice(&[0x3c, 0x14, 0x40, 0x01]);
        let len = buf.len() as u16;
        buf[2..4].copy_from_slice(&len.to_le_bytes());

        let decoded = decode(&buf).unwrap();
        assert!(decoded.field(index::CHANNEL).is_none());
        assert!(matches!(decoded.value(FieldKind::Channel), Some(FieldValue::Channel(_))));
        assert_eq!(decoded.info().channel_freq, Some(5180));
        assert_eq!(decoded.info().channel(), Some(36));
    }

    #[test]
    fn test_batch_matches_sequential() {
        let good: &[u8] = &[0x00, 0x00, 0x09, 0x00, 0x02, 0x00, 0x00, 0x00, 0x10];
        let bad: &[u8] = &[0x00, 0x00, 0x40, 0x00];
        let frames = vec![good, bad, good];

        let decoder = RadiotapDecoder::default();
        let results = decoder.decode_batch(&frames);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap(), &decoder.decode(good).unwrap());
        assert!(results[1].is_err());
        assert!(results[2].is_ok());
    }

    #[test]
    fn test_deterministic() {
        let buf = [0x00, 0x00, 0x0c, 0x00, 0x06, 0x00, 0x00, 0x00, 0x10, 0x0c, 0x00, 0x00];
        assert_eq!(decode(&buf).unwrap(), decode(&buf).unwrap());
    }
}
