//! Test frame builder
//!
//! Lays out standard-namespace fields with the same packing and alignment
//! rules the decoder applies, so decoded output can be rebuilt and decoded
//! again.

#![allow(dead_code)]

use radiotap_codec::radiotap::catalog::{align_up, index, TLV_ALIGN};
use radiotap_codec::radiotap::FieldKind;
use radiotap_codec::DecodedRadiotap;

#[derive(Debug, Default, Clone)]
pub struct FrameBuilder {
    fields: Vec<(u32, Vec<u8>)>,
    tlvs: Vec<(u16, Vec<u8>)>,
    body: Vec<u8>,
}

impl FrameBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fixed field by canonical index
    pub fn field(mut self, index: u32, bytes: &[u8]) -> Self {
        self.fields.push((index, bytes.to_vec()));
        self
    }

    pub fn tlv(mut self, tlv_type: u16, value: &[u8]) -> Self {
        self.tlvs.push((tlv_type, value.to_vec()));
        self
    }

    /// Bytes appended after the header
    pub fn body(mut self, body: &[u8]) -> Self {
        self.body = body.to_vec();
        self
    }

    /// Rebuild the fixed fields and TLVs of a decoded header
    pub fn from_decoded(decoded: &DecodedRadiotap) -> Self {
        let mut builder = Self::new();
        for field in &decoded.fixed_fields {
            builder = builder.field(field.index, &field.raw);
        }
        for record in &decoded.tlv_records {
            builder = builder.tlv(record.tlv_type, &record.value);
        }
        builder
    }

    pub fn build(&self) -> Vec<u8> {
        let mut fields = self.fields.clone();
        fields.sort_by_key(|(index, _)| *index);

        let mut words = vec![0u32; 1];
        for (idx, _) in &fields {
            let word = (*idx / 32) as usize;
            if words.len() <= word {
                words.resize(word + 1, 0);
            }
            words[word] |= 1 << (idx % 32);
        }
        if !self.tlvs.is_empty() {
            words[0] |= 1 << index::TLV;
        }
        let last = words.len() - 1;
        for word in &mut words[..last] {
            *word |= 1 << index::EXT;
        }

        let mut buf = vec![0u8, 0, 0, 0];
        for word in &words {
            buf.extend_from_slice(&word.to_le_bytes());
        }
        for (idx, bytes) in &fields {
            let align = FieldKind::from_index(*idx).map_or(1, |kind| kind.layout().align);
            buf.resize(align_up(buf.len(), align), 0);
            buf.extend_from_slice(bytes);
        }
        for (tlv_type, value) in &self.tlvs {
            buf.resize(align_up(buf.len(), TLV_ALIGN), 0);
            buf.extend_from_slice(&tlv_type.to_le_bytes());
            buf.extend_from_slice(&(value.len() as u16).to_le_bytes());
            buf.extend_from_slice(value);
        }

        let len = buf.len() as u16;
        buf[2..4].copy_from_slice(&len.to_le_bytes());
        buf.extend_from_slice(&self.body);
        buf
    }
}

/// EHT TLV value: `known`, nine data words, then user info words
pub fn eht_value(known: u32, data: [u32; 9], users: &[u32]) -> Vec<u8> {
    let mut value = known.to_le_bytes().to_vec();
    for word in data {
        value.extend_from_slice(&word.to_le_bytes());
    }
    for user in users {
        value.extend_from_slice(&user.to_le_bytes());
    }
    value
}
