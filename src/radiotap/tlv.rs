//! TLV Region
//!
//! Once bit 28 is present the rest of the header is a sequence of
//! `type:u16, length:u16, value[length]` records, each padded to 4 bytes.
//! Unknown types are kept opaque. Repeated and out-of-order types are
//! allowed; records are returned in occurrence order.

use serde::Serialize;
use tracing::{debug, trace};

use super::catalog::{align_up, tlv_type, FieldKind, TLV_ALIGN};
use super::fields::{bits32, le16, le32, FieldValue};
use crate::config::TlvPolicy;
use crate::error::{RadiotapError, Result};

const TLV_HEADER_LEN: usize = 4;
const USIG_LEN: usize = 12;
/// `known` word plus nine data words
const EHT_FIXED_LEN: usize = 40;
const VENDOR_TLV_MIN_LEN: usize = 8;

pub mod usig_common {
    pub const PHY_VER_KNOWN: u32 = 0x0000_0001;
    pub const BW_KNOWN: u32 = 0x0000_0002;
    pub const UL_DL_KNOWN: u32 = 0x0000_0004;
    pub const BSS_COLOR_KNOWN: u32 = 0x0000_0008;
    pub const TXOP_KNOWN: u32 = 0x0000_0010;
    pub const BAD_USIG_CRC: u32 = 0x0000_0020;
    pub const PHY_VER: u32 = 0x0000_7000;
    pub const BW: u32 = 0x0003_8000;
    pub const UL_DL: u32 = 0x0004_0000;
    pub const BSS_COLOR: u32 = 0x01f8_0000;
    pub const TXOP: u32 = 0xfe00_0000;
}

pub mod eht_known {
    pub const SPATIAL_REUSE: u32 = 0x0000_0002;
    pub const GI: u32 = 0x0000_0004;
    pub const EHT_LTF: u32 = 0x0000_0010;
    pub const LDPC_EXTRA_SYM_OM: u32 = 0x0000_0020;
    pub const NSS_S: u32 = 0x0002_0000;
    pub const BEAMFORMED_S: u32 = 0x0004_0000;
    pub const NR_NON_OFDMA_USERS_M: u32 = 0x0008_0000;
    pub const RU_MRU_SIZE_OM: u32 = 0x0040_0000;
    pub const RU_MRU_INDEX_OM: u32 = 0x0080_0000;
    pub const PRIMARY_80: u32 = 0x0200_0000;
}

pub mod eht_data {
    pub const DATA0_SPATIAL_REUSE: u32 = 0x0000_0078;
    pub const DATA0_GI: u32 = 0x0000_0180;
    pub const DATA0_LTF: u32 = 0x0000_0600;
    pub const DATA0_EHT_LTF: u32 = 0x0000_3800;
    pub const DATA0_LDPC_EXTRA_SYM_OM: u32 = 0x0000_4000;
    pub const DATA1_RU_SIZE: u32 = 0x0000_001f;
    pub const DATA1_RU_INDEX: u32 = 0x0000_1fe0;
    pub const DATA1_PRIMARY_80: u32 = 0xc000_0000;
    pub const DATA7_NSS_S: u32 = 0x0000_f000;
    pub const DATA7_BEAMFORMED_S: u32 = 0x0001_0000;
    pub const DATA7_NUM_OF_NON_OFDMA_USERS: u32 = 0x000e_0000;
}

pub mod eht_user_info {
    pub const STA_ID_KNOWN: u32 = 0x0000_0001;
    pub const MCS_KNOWN: u32 = 0x0000_0002;
    pub const CODING_KNOWN: u32 = 0x0000_0004;
    pub const NSS_KNOWN_O: u32 = 0x0000_0010;
    pub const BEAMFORMING_KNOWN_O: u32 = 0x0000_0020;
    pub const SPATIAL_CONFIG_KNOWN_M: u32 = 0x0000_0040;
    pub const DATA_FOR_USER: u32 = 0x0000_0080;
    pub const STA_ID: u32 = 0x0007_ff00;
    pub const CODING: u32 = 0x0008_0000;
    pub const MCS: u32 = 0x00f0_0000;
    pub const NSS_O: u32 = 0x0f00_0000;
    pub const BEAMFORMING_O: u32 = 0x2000_0000;
    pub const SPATIAL_CONFIG_M: u32 = 0x3f00_0000;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EhtBandwidth {
    Bw20,
    Bw40,
    Bw80,
    Bw160,
    Bw320_1,
    Bw320_2,
}

/// U-SIG (TLV 33): common, value and mask words
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UsigTlv {
    pub common: u32,
    pub value: u32,
    pub mask: u32,
}

impl UsigTlv {
    fn known(&self, bit: u32) -> bool {
        self.common & bit != 0
    }

    pub fn phy_version(&self) -> Option<u8> {
        self.known(usig_common::PHY_VER_KNOWN)
            .then(|| bits32(self.common, usig_common::PHY_VER) as u8)
    }

    pub fn bandwidth(&self) -> Option<EhtBandwidth> {
        if !self.known(usig_common::BW_KNOWN) {
            return None;
        }
        match bits32(self.common, usig_common::BW) {
            0 => Some(EhtBandwidth::Bw20),
            1 => Some(EhtBandwidth::Bw40),
            2 => Some(EhtBandwidth::Bw80),
            3 => Some(EhtBandwidth::Bw160),
            4 => Some(EhtBandwidth::Bw320_1),
            5 => Some(EhtBandwidth::Bw320_2),
            _ => None,
        }
    }

    /// `true` for uplink
    pub fn uplink(&self) -> Option<bool> {
        self.known(usig_common::UL_DL_KNOWN)
            .then(|| self.common & usig_common::UL_DL != 0)
    }

    pub fn bss_color(&self) -> Option<u8> {
        self.known(usig_common::BSS_COLOR_KNOWN)
            .then(|| bits32(self.common, usig_common::BSS_COLOR) as u8)
    }

    pub fn txop(&self) -> Option<u8> {
        self.known(usig_common::TXOP_KNOWN)
            .then(|| bits32(self.common, usig_common::TXOP) as u8)
    }

    pub fn bad_crc(&self) -> bool {
        self.common & usig_common::BAD_USIG_CRC != 0
    }

    /// Bits of `value` that the capture device actually reported
    pub fn masked_value(&self) -> u32 {
        self.value & self.mask
    }
}

/// One EHT `user_info` word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EhtUserInfo(pub u32);

impl EhtUserInfo {
    fn known(&self, bit: u32) -> bool {
        self.0 & bit != 0
    }

    pub fn sta_id(&self) -> Option<u16> {
        self.known(eht_user_info::STA_ID_KNOWN)
            .then(|| bits32(self.0, eht_user_info::STA_ID) as u16)
    }

    pub fn mcs(&self) -> Option<u8> {
        self.known(eht_user_info::MCS_KNOWN)
            .then(|| bits32(self.0, eht_user_info::MCS) as u8)
    }

    pub fn ldpc(&self) -> Option<bool> {
        self.known(eht_user_info::CODING_KNOWN)
            .then(|| self.0 & eht_user_info::CODING != 0)
    }

    /// Non-MU-MIMO users only
    pub fn nss(&self) -> Option<u8> {
        self.known(eht_user_info::NSS_KNOWN_O)
            .then(|| bits32(self.0, eht_user_info::NSS_O) as u8)
    }

    pub fn beamformed(&self) -> Option<bool> {
        self.known(eht_user_info::BEAMFORMING_KNOWN_O)
            .then(|| self.0 & eht_user_info::BEAMFORMING_O != 0)
    }

    /// MU-MIMO users only
    pub fn spatial_config(&self) -> Option<u8> {
        self.known(eht_user_info::SPATIAL_CONFIG_KNOWN_M)
            .then(|| bits32(self.0, eht_user_info::SPATIAL_CONFIG_M) as u8)
    }

    /// This entry describes the user the frame was received for
    pub fn data_for_user(&self) -> bool {
        self.known(eht_user_info::DATA_FOR_USER)
    }
}

/// EHT (TLV 34): `known`, nine data words, then per-user info
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EhtTlv {
    pub known: u32,
    pub data: [u32; 9],
    pub user_info: Vec<EhtUserInfo>,
}

impl EhtTlv {
    fn known(&self, bit: u32) -> bool {
        self.known & bit != 0
    }

    pub fn spatial_reuse(&self) -> Option<u8> {
        self.known(eht_known::SPATIAL_REUSE)
            .then(|| bits32(self.data[0], eht_data::DATA0_SPATIAL_REUSE) as u8)
    }

    /// Guard interval in nanoseconds
    pub fn guard_interval_ns(&self) -> Option<u16> {
        if !self.known(eht_known::GI) {
            return None;
        }
        match bits32(self.data[0], eht_data::DATA0_GI) {
            0 => Some(800),
            1 => Some(1600),
            2 => Some(3200),
            _ => None,
        }
    }

    pub fn eht_ltf(&self) -> Option<u8> {
        self.known(eht_known::EHT_LTF)
            .then(|| bits32(self.data[0], eht_data::DATA0_EHT_LTF) as u8)
    }

    pub fn ldpc_extra_symbol(&self) -> Option<bool> {
        self.known(eht_known::LDPC_EXTRA_SYM_OM)
            .then(|| self.data[0] & eht_data::DATA0_LDPC_EXTRA_SYM_OM != 0)
    }

    pub fn ru_size(&self) -> Option<u8> {
        self.known(eht_known::RU_MRU_SIZE_OM)
            .then(|| bits32(self.data[1], eht_data::DATA1_RU_SIZE) as u8)
    }

    pub fn ru_index(&self) -> Option<u8> {
        self.known(eht_known::RU_MRU_INDEX_OM)
            .then(|| bits32(self.data[1], eht_data::DATA1_RU_INDEX) as u8)
    }

    pub fn primary_80(&self) -> Option<u8> {
        self.known(eht_known::PRIMARY_80)
            .then(|| bits32(self.data[1], eht_data::DATA1_PRIMARY_80) as u8)
    }

    /// Sounding PPDUs only
    pub fn nss(&self) -> Option<u8> {
        self.known(eht_known::NSS_S)
            .then(|| bits32(self.data[7], eht_data::DATA7_NSS_S) as u8)
    }

    pub fn beamformed(&self) -> Option<bool> {
        self.known(eht_known::BEAMFORMED_S)
            .then(|| self.data[7] & eht_data::DATA7_BEAMFORMED_S != 0)
    }

    pub fn non_ofdma_users(&self) -> Option<u8> {
        self.known(eht_known::NR_NON_OFDMA_USERS_M)
            .then(|| bits32(self.data[7], eht_data::DATA7_NUM_OF_NON_OFDMA_USERS) as u8)
    }
}

/// Vendor namespace TLV (type 30)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VendorTlv {
    pub oui: [u8; 3],
    pub sub_namespace: u8,
    pub vendor_type: u16,
    pub reserved: u16,
    pub data: Vec<u8>,
}

/// Typed view of a TLV value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TlvValue {
    Usig(UsigTlv),
    Eht(EhtTlv),
    Vendor(VendorTlv),
    /// A fixed field carried as a TLV
    Field { value: FieldValue },
    /// Unknown type, bytes kept as-is
    Opaque,
    /// Length contradicts the typed layout (skip policy only)
    Malformed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TlvRecord {
    pub tlv_type: u16,
    /// Offset of the record header
    pub offset: usize,
    pub length: u16,
    #[serde(skip)]
    pub value: Vec<u8>,
    pub decoded: TlvValue,
}

impl TlvRecord {
    pub fn is_malformed(&self) -> bool {
        matches!(self.decoded, TlvValue::Malformed { .. })
    }
}

fn decode_usig(value: &[u8]) -> Result<UsigTlv> {
    if value.len() != USIG_LEN {
        return Err(RadiotapError::malformed_tlv(
            tlv_type::EHT_USIG,
            format!("U-SIG value is {} bytes, expected {}", value.len(), USIG_LEN),
        ));
    }
    Ok(UsigTlv {
        common: le32(value, 0),
        value: le32(value, 4),
        mask: le32(value, 8),
    })
}

fn decode_eht(value: &[u8]) -> Result<EhtTlv> {
    if value.len() < EHT_FIXED_LEN || (value.len() - EHT_FIXED_LEN) % 4 != 0 {
        return Err(RadiotapError::malformed_tlv(
            tlv_type::EHT,
            format!(
                "EHT value is {} bytes, expected {} plus a multiple of 4",
                value.len(),
                EHT_FIXED_LEN
            ),
        ));
    }
    let mut data = [0u32; 9];
    for (i, word) in data.iter_mut().enumerate() {
        *word = le32(value, 4 + i * 4);
    }
    let user_info = value[EHT_FIXED_LEN..]
        .chunks_exact(4)
        .map(|chunk| EhtUserInfo(le32(chunk, 0)))
        .collect();
    Ok(EhtTlv {
        known: le32(value, 0),
        data,
        user_info,
    })
}

fn decode_vendor(value: &[u8]) -> Result<VendorTlv> {
    if value.len() < VENDOR_TLV_MIN_LEN {
        return Err(RadiotapError::malformed_tlv(
            tlv_type::VENDOR_NAMESPACE,
            format!("vendor TLV is {} bytes, need at least {}", value.len(), VENDOR_TLV_MIN_LEN),
        ));
    }
    Ok(VendorTlv {
        oui: [value[0], value[1], value[2]],
        sub_namespace: value[3],
        vendor_type: le16(value, 4),
        reserved: le16(value, 6),
        data: value[VENDOR_TLV_MIN_LEN..].to_vec(),
    })
}

fn decode_value(kind: u16, value: &[u8]) -> Result<TlvValue> {
    match kind {
        tlv_type::EHT_USIG => decode_usig(value).map(TlvValue::Usig),
        tlv_type::EHT => decode_eht(value).map(TlvValue::Eht),
        tlv_type::VENDOR_NAMESPACE => decode_vendor(value).map(TlvValue::Vendor),
        _ => match FieldKind::from_index(u32::from(kind)) {
            Some(FieldKind::Tlv) | None => {
                debug!("unknown TLV type {}, {} bytes kept opaque", kind, value.len());
                Ok(TlvValue::Opaque)
            }
            Some(field) => {
                let expected = field.layout().size;
                if value.len() != expected {
                    return Err(RadiotapError::malformed_tlv(
                        kind,
                        format!(
                            "{} TLV is {} bytes, expected {}",
                            field.name(),
                            value.len(),
                            expected
                        ),
                    ));
                }
                FieldValue::parse(field, value).map(|value| TlvValue::Field { value })
            }
        },
    }
}

/// Decode TLV records from the next 4-byte boundary at or after `cursor` up to `end`.
pub fn decode(buffer: &[u8], cursor: usize, end: usize, policy: TlvPolicy) -> Result<Vec<TlvRecord>> {
    let end = end.min(buffer.len());
    let mut records = Vec::new();
    let mut cursor = align_up(cursor, TLV_ALIGN);

    while cursor < end {
        if cursor + TLV_HEADER_LEN > end {
            return Err(RadiotapError::truncated(
                "TLV header",
                cursor,
                TLV_HEADER_LEN,
                end,
            ));
        }
        let kind = le16(buffer, cursor);
        let length = le16(buffer, cursor + 2);
        let start = cursor + TLV_HEADER_LEN;
        let stop = start + length as usize;
        if stop > end {
            return Err(RadiotapError::truncated("TLV value", start, length as usize, end));
        }
        let value = &buffer[start..stop];

        let decoded = match decode_value(kind, value) {
            Ok(decoded) => decoded,
            Err(e) if policy == TlvPolicy::Skip => {
                debug!("keeping malformed TLV at {}: {}", cursor, e);
                TlvValue::Malformed {
                    reason: e.to_string(),
                }
            }
            Err(e) => return Err(e),
        };
        trace!("TLV type {} at {}, {} bytes", kind, cursor, length);

        records.push(TlvRecord {
            tlv_type: kind,
            offset: cursor,
            length,
            value: value.to_vec(),
            decoded,
        });
        cursor = align_up(stop, TLV_ALIGN);
    }

    Ok(records)
}
