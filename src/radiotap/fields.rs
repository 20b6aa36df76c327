//! Typed Radiotap Fields
//!
//! One accessor type per fixed field. Each wraps the raw little-endian
//! words and exposes named sub-fields; a sub-field whose "known" bit is
//! clear, or whose value falls in a reserved range, reads as `None`.

use serde::Serialize;

use super::catalog::FieldKind;
use crate::error::{RadiotapError, Result};

/// Extract the bits selected by `mask`, shifted down to bit 0.
pub(crate) fn bits16(word: u16, mask: u16) -> u16 {
    (word & mask) >> mask.trailing_zeros()
}

/// Extract the bits selected by `mask`, shifted down to bit 0.
pub(crate) fn bits32(word: u32, mask: u32) -> u32 {
    (word & mask) >> mask.trailing_zeros()
}

pub(crate) fn le16(data: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([data[at], data[at + 1]])
}

pub(crate) fn le32(data: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

pub(crate) fn le64(data: &[u8], at: usize) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&data[at..at + 8]);
    u64::from_le_bytes(buf)
}

/// Frame flags (field 1)
pub mod flags {
    pub const CFP: u8 = 0x01;
    pub const SHORT_PREAMBLE: u8 = 0x02;
    pub const WEP: u8 = 0x04;
    pub const FRAGMENTED: u8 = 0x08;
    pub const FCS: u8 = 0x10;
    pub const DATA_PAD: u8 = 0x20;
    pub const BAD_FCS: u8 = 0x40;
    pub const SHORT_GI: u8 = 0x80;
}

/// Channel flags (field 3, low half of XChannel flags)
pub mod channel_flags {
    pub const TURBO: u16 = 0x0010;
    pub const CCK: u16 = 0x0020;
    pub const OFDM: u16 = 0x0040;
    pub const SPECTRUM_2GHZ: u16 = 0x0080;
    pub const SPECTRUM_5GHZ: u16 = 0x0100;
    pub const PASSIVE: u16 = 0x0200;
    pub const DYN_CCK_OFDM: u16 = 0x0400;
    pub const GFSK: u16 = 0x0800;
    pub const HALF: u16 = 0x4000;
    pub const QUARTER: u16 = 0x8000;
}

pub mod rx_flags {
    pub const BAD_PLCP: u16 = 0x0002;
}

pub mod tx_flags {
    pub const FAIL: u16 = 0x0001;
    pub const CTS: u16 = 0x0002;
    pub const RTS: u16 = 0x0004;
    pub const NO_ACK: u16 = 0x0008;
    pub const NO_SEQNO: u16 = 0x0010;
    pub const ORDER: u16 = 0x0020;
}

pub mod mcs {
    pub const HAVE_BW: u8 = 0x01;
    pub const HAVE_MCS: u8 = 0x02;
    pub const HAVE_GI: u8 = 0x04;
    pub const HAVE_FMT: u8 = 0x08;
    pub const HAVE_FEC: u8 = 0x10;
    pub const HAVE_STBC: u8 = 0x20;

    pub const BW_MASK: u8 = 0x03;
    pub const SGI: u8 = 0x04;
    pub const FMT_GF: u8 = 0x08;
    pub const FEC_LDPC: u8 = 0x10;
    pub const STBC_MASK: u8 = 0x60;
}

pub mod ampdu {
    pub const REPORT_ZEROLEN: u16 = 0x0001;
    pub const IS_ZEROLEN: u16 = 0x0002;
    pub const LAST_KNOWN: u16 = 0x0004;
    pub const IS_LAST: u16 = 0x0008;
    pub const DELIM_CRC_ERR: u16 = 0x0010;
    pub const DELIM_CRC_KNOWN: u16 = 0x0020;
    pub const EOF: u16 = 0x0040;
    pub const EOF_KNOWN: u16 = 0x0080;
}

pub mod vht {
    pub const KNOWN_STBC: u16 = 0x0001;
    pub const KNOWN_TXOP_PS_NA: u16 = 0x0002;
    pub const KNOWN_GI: u16 = 0x0004;
    pub const KNOWN_SGI_NSYM_DIS: u16 = 0x0008;
    pub const KNOWN_LDPC_EXTRA_OFDM_SYM: u16 = 0x0010;
    pub const KNOWN_BEAMFORMED: u16 = 0x0020;
    pub const KNOWN_BANDWIDTH: u16 = 0x0040;
    pub const KNOWN_GROUP_ID: u16 = 0x0080;
    pub const KNOWN_PARTIAL_AID: u16 = 0x0100;

    pub const FLAG_STBC: u8 = 0x01;
    pub const FLAG_TXOP_PS_NA: u8 = 0x02;
    pub const FLAG_SGI: u8 = 0x04;
    pub const FLAG_SGI_NSYM_M10_9: u8 = 0x08;
    pub const FLAG_LDPC_EXTRA_OFDM_SYM: u8 = 0x10;
    pub const FLAG_BEAMFORMED: u8 = 0x20;
}

pub mod timestamp {
    pub const UNIT_MASK: u8 = 0x0f;
    pub const SPOS_MASK: u8 = 0xf0;
    pub const SPOS_UNKNOWN: u8 = 0x0f;
    pub const FLAG_32BIT: u8 = 0x01;
    pub const FLAG_ACCURACY: u8 = 0x02;
}

pub mod he {
    pub const DATA1_FORMAT_MASK: u16 = 0x0003;
    pub const DATA1_BSS_COLOR_KNOWN: u16 = 0x0004;
    pub const DATA1_BEAM_CHANGE_KNOWN: u16 = 0x0008;
    pub const DATA1_UL_DL_KNOWN: u16 = 0x0010;
    pub const DATA1_DATA_MCS_KNOWN: u16 = 0x0020;
    pub const DATA1_DATA_DCM_KNOWN: u16 = 0x0040;
    pub const DATA1_CODING_KNOWN: u16 = 0x0080;
    pub const DATA1_STBC_KNOWN: u16 = 0x0200;
    pub const DATA1_BW_RU_ALLOC_KNOWN: u16 = 0x4000;
    pub const DATA1_DOPPLER_KNOWN: u16 = 0x8000;

    pub const DATA2_GI_KNOWN: u16 = 0x0002;
    pub const DATA2_TXOP_KNOWN: u16 = 0x0040;

    pub const DATA3_BSS_COLOR: u16 = 0x003f;
    pub const DATA3_BEAM_CHANGE: u16 = 0x0040;
    pub const DATA3_UL_DL: u16 = 0x0080;
    pub const DATA3_DATA_MCS: u16 = 0x0f00;
    pub const DATA3_DATA_DCM: u16 = 0x1000;
    pub const DATA3_CODING: u16 = 0x2000;
    pub const DATA3_STBC: u16 = 0x8000;

    pub const DATA5_BW_RU_ALLOC: u16 = 0x000f;
    pub const DATA5_GI: u16 = 0x0030;
    pub const DATA5_LTF_SIZE: u16 = 0x00c0;

    pub const DATA6_NSTS: u16 = 0x000f;
    pub const DATA6_DOPPLER: u16 = 0x0010;
    pub const DATA6_TXOP: u16 = 0x7f00;
}

pub mod he_mu {
    pub const FLAGS1_SIG_B_MCS: u16 = 0x000f;
    pub const FLAGS1_SIG_B_MCS_KNOWN: u16 = 0x0010;
    pub const FLAGS1_SIG_B_DCM: u16 = 0x0020;
    pub const FLAGS1_SIG_B_DCM_KNOWN: u16 = 0x0040;
    pub const FLAGS1_CH1_RU_KNOWN: u16 = 0x0100;
    pub const FLAGS1_CH2_RU_KNOWN: u16 = 0x0200;
    pub const FLAGS1_SIG_B_COMP_KNOWN: u16 = 0x4000;
    pub const FLAGS1_SIG_B_SYMS_USERS_KNOWN: u16 = 0x8000;

    pub const FLAGS2_BW_FROM_SIG_A_BW: u16 = 0x0003;
    pub const FLAGS2_BW_FROM_SIG_A_BW_KNOWN: u16 = 0x0004;
    pub const FLAGS2_SIG_B_COMP: u16 = 0x0008;
    pub const FLAGS2_SIG_B_SYMS_USERS: u16 = 0x00f0;
}

pub mod lsig {
    pub const DATA1_RATE_KNOWN: u16 = 0x0001;
    pub const DATA1_LENGTH_KNOWN: u16 = 0x0002;
    pub const DATA2_RATE: u16 = 0x000f;
    pub const DATA2_LENGTH: u16 = 0xfff0;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Band {
    Ghz2_4,
    Ghz5,
    Ghz6,
}

/// Convert frequency to channel number
pub fn freq_to_channel(freq: u16) -> Option<u8> {
    if (2412..=2484).contains(&freq) {
        // 2.4 GHz band
        if freq == 2484 {
            Some(14)
        } else {
            Some(((freq - 2407) / 5) as u8)
        }
    } else if (5955..=7115).contains(&freq) {
        // 6 GHz band (WiFi 6E)
        Some(((freq - 5950) / 5) as u8)
    } else if (5170..=5885).contains(&freq) {
        Some(((freq - 5000) / 5) as u8)
    } else {
        None
    }
}

/// Classify a centre frequency into a band
pub fn freq_to_band(freq: u16) -> Option<Band> {
    match freq {
        2400..=2500 => Some(Band::Ghz2_4),
        5925..=7125 => Some(Band::Ghz6),
        5000..=5924 => Some(Band::Ghz5),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Flags(pub u8);

impl Flags {
    pub fn during_cfp(&self) -> bool {
        self.0 & flags::CFP != 0
    }

    pub fn short_preamble(&self) -> bool {
        self.0 & flags::SHORT_PREAMBLE != 0
    }

    pub fn wep(&self) -> bool {
        self.0 & flags::WEP != 0
    }

    pub fn fragmented(&self) -> bool {
        self.0 & flags::FRAGMENTED != 0
    }

    /// The frame body ends with a 4-byte FCS
    pub fn fcs_at_end(&self) -> bool {
        self.0 & flags::FCS != 0
    }

    pub fn data_pad(&self) -> bool {
        self.0 & flags::DATA_PAD != 0
    }

    pub fn bad_fcs(&self) -> bool {
        self.0 & flags::BAD_FCS != 0
    }

    pub fn short_gi(&self) -> bool {
        self.0 & flags::SHORT_GI != 0
    }
}

/// Legacy rate in 500 kb/s units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rate(pub u8);

impl Rate {
    pub fn mbps(&self) -> f32 {
        f32::from(self.0) * 0.5
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Channel {
    /// Centre frequency in MHz
    pub freq: u16,
    pub flags: u16,
}

impl Channel {
    pub fn has(&self, flag: u16) -> bool {
        self.flags & flag != 0
    }

    pub fn number(&self) -> Option<u8> {
        freq_to_channel(self.freq)
    }

    pub fn band(&self) -> Option<Band> {
        freq_to_band(self.freq)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Fhss {
    pub hop_set: u8,
    pub hop_pattern: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct XChannel {
    pub flags: u32,
    pub freq: u16,
    pub channel: u8,
    pub max_power: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RxFlags(pub u16);

impl RxFlags {
    pub fn bad_plcp(&self) -> bool {
        self.0 & rx_flags::BAD_PLCP != 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TxFlags(pub u16);

impl TxFlags {
    pub fn failed(&self) -> bool {
        self.0 & tx_flags::FAIL != 0
    }

    pub fn cts(&self) -> bool {
        self.0 & tx_flags::CTS != 0
    }

    pub fn rts(&self) -> bool {
        self.0 & tx_flags::RTS != 0
    }

    pub fn no_ack(&self) -> bool {
        self.0 & tx_flags::NO_ACK != 0
    }

    pub fn no_seqno(&self) -> bool {
        self.0 & tx_flags::NO_SEQNO != 0
    }

    pub fn ordered(&self) -> bool {
        self.0 & tx_flags::ORDER != 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GuardInterval {
    Long,
    Short,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Fec {
    Bcc,
    Ldpc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HtFormat {
    Mixed,
    Greenfield,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum McsBandwidth {
    Bw20,
    Bw40,
    Bw20Lower,
    Bw20Upper,
}

/// 802.11n MCS information (field 19)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Mcs {
    pub known: u8,
    pub flags: u8,
    pub index: u8,
}

impl Mcs {
    fn knows(&self, bit: u8) -> bool {
        self.known & bit != 0
    }

    pub fn mcs_index(&self) -> Option<u8> {
        self.knows(mcs::HAVE_MCS).then_some(self.index)
    }

    pub fn bandwidth(&self) -> Option<McsBandwidth> {
        if !self.knows(mcs::HAVE_BW) {
            return None;
        }
        Some(match self.flags & mcs::BW_MASK {
            0 => McsBandwidth::Bw20,
            1 => McsBandwidth::Bw40,
            2 => McsBandwidth::Bw20Lower,
            _ => McsBandwidth::Bw20Upper,
        })
    }

    pub fn guard_interval(&self) -> Option<GuardInterval> {
        self.knows(mcs::HAVE_GI).then(|| {
            if self.flags & mcs::SGI != 0 {
                GuardInterval::Short
            } else {
                GuardInterval::Long
            }
        })
    }

    pub fn format(&self) -> Option<HtFormat> {
        self.knows(mcs::HAVE_FMT).then(|| {
            if self.flags & mcs::FMT_GF != 0 {
                HtFormat::Greenfield
            } else {
                HtFormat::Mixed
            }
        })
    }

    pub fn fec(&self) -> Option<Fec> {
        self.knows(mcs::HAVE_FEC).then(|| {
            if self.flags & mcs::FEC_LDPC != 0 {
                Fec::Ldpc
            } else {
                Fec::Bcc
            }
        })
    }

    /// Number of STBC streams (0 when STBC is off)
    pub fn stbc_streams(&self) -> Option<u8> {
        self.knows(mcs::HAVE_STBC)
            .then(|| (self.flags & mcs::STBC_MASK) >> mcs::STBC_MASK.trailing_zeros())
    }
}

/// A-MPDU status (field 20)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AmpduStatus {
    pub reference: u32,
    pub flags: u16,
    pub delimiter_crc: u8,
    pub reserved: u8,
}

impl AmpduStatus {
    pub fn is_zero_length(&self) -> Option<bool> {
        (self.flags & ampdu::REPORT_ZEROLEN != 0).then_some(self.flags & ampdu::IS_ZEROLEN != 0)
    }

    pub fn is_last(&self) -> Option<bool> {
        (self.flags & ampdu::LAST_KNOWN != 0).then_some(self.flags & ampdu::IS_LAST != 0)
    }

    pub fn delimiter_crc_error(&self) -> bool {
        self.flags & ampdu::DELIM_CRC_ERR != 0
    }

    pub fn delimiter_crc_value(&self) -> Option<u8> {
        (self.flags & ampdu::DELIM_CRC_KNOWN != 0).then_some(self.delimiter_crc)
    }

    pub fn eof(&self) -> Option<bool> {
        (self.flags & ampdu::EOF_KNOWN != 0).then_some(self.flags & ampdu::EOF != 0)
    }
}

/// One populated VHT user slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VhtUser {
    pub user: usize,
    pub mcs: u8,
    pub nss: u8,
    pub fec: Fec,
}

/// 802.11ac VHT information (field 21)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Vht {
    pub known: u16,
    pub flags: u8,
    pub bandwidth: u8,
    pub mcs_nss: [u8; 4],
    pub coding: u8,
    pub group_id: u8,
    pub partial_aid: u16,
}

impl Vht {
    fn knows(&self, bit: u16) -> bool {
        self.known & bit != 0
    }

    fn flag(&self, known: u16, flag: u8) -> Option<bool> {
        self.knows(known).then_some(self.flags & flag != 0)
    }

    pub fn stbc(&self) -> Option<bool> {
        self.flag(vht::KNOWN_STBC, vht::FLAG_STBC)
    }

    pub fn txop_ps_not_allowed(&self) -> Option<bool> {
        self.flag(vht::KNOWN_TXOP_PS_NA, vht::FLAG_TXOP_PS_NA)
    }

    pub fn guard_interval(&self) -> Option<GuardInterval> {
        self.flag(vht::KNOWN_GI, vht::FLAG_SGI).map(|short| {
            if short {
                GuardInterval::Short
            } else {
                GuardInterval::Long
            }
        })
    }

    pub fn ldpc_extra_symbol(&self) -> Option<bool> {
        self.flag(vht::KNOWN_LDPC_EXTRA_OFDM_SYM, vht::FLAG_LDPC_EXTRA_OFDM_SYM)
    }

    pub fn beamformed(&self) -> Option<bool> {
        self.flag(vht::KNOWN_BEAMFORMED, vht::FLAG_BEAMFORMED)
    }

    /// Total channel width in MHz; reserved encodings read as `None`
    pub fn bandwidth_mhz(&self) -> Option<u16> {
        if !self.knows(vht::KNOWN_BANDWIDTH) {
            return None;
        }
        match self.bandwidth {
            0 => Some(20),
            1..=3 => Some(40),
            4..=10 => Some(80),
            11..=25 => Some(160),
            _ => None,
        }
    }

    pub fn group_id(&self) -> Option<u8> {
        self.knows(vht::KNOWN_GROUP_ID).then_some(self.group_id)
    }

    pub fn partial_aid(&self) -> Option<u16> {
        self.knows(vht::KNOWN_PARTIAL_AID).then_some(self.partial_aid)
    }

    /// Users with a non-zero NSS
    pub fn users(&self) -> impl Iterator<Item = VhtUser> + '_ {
        self.mcs_nss.iter().enumerate().filter_map(move |(user, &mcs_nss)| {
            let nss = mcs_nss & 0x0f;
            (nss != 0).then(|| VhtUser {
                user,
                mcs: mcs_nss >> 4,
                nss,
                fec: if self.coding & (1 << user) != 0 {
                    Fec::Ldpc
                } else {
                    Fec::Bcc
                },
            })
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TimeUnit {
    Milliseconds,
    Microseconds,
    Nanoseconds,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SamplingPosition {
    StartMpdu,
    PlcpSigAcquisition,
    EndPpdu,
    EndMpdu,
}

/// Timestamp (field 22)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Timestamp {
    pub timestamp: u64,
    pub accuracy: u16,
    pub unit_position: u8,
    pub flags: u8,
}

impl Timestamp {
    pub fn unit(&self) -> Option<TimeUnit> {
        match self.unit_position & timestamp::UNIT_MASK {
            0 => Some(TimeUnit::Milliseconds),
            1 => Some(TimeUnit::Microseconds),
            3 => Some(TimeUnit::Nanoseconds),
            _ => None,
        }
    }

    pub fn sampling_position(&self) -> Option<SamplingPosition> {
        match (self.unit_position & timestamp::SPOS_MASK) >> 4 {
            0 => Some(SamplingPosition::StartMpdu),
            1 => Some(SamplingPosition::PlcpSigAcquisition),
            2 => Some(SamplingPosition::EndPpdu),
            3 => Some(SamplingPosition::EndMpdu),
            _ => None,
        }
    }

    /// Only the low 32 bits of `timestamp` are meaningful
    pub fn is_32bit(&self) -> bool {
        self.flags & timestamp::FLAG_32BIT != 0
    }

    pub fn accuracy(&self) -> Option<u16> {
        (self.flags & timestamp::FLAG_ACCURACY != 0).then_some(self.accuracy)
    }

    /// Timestamp value masked to its declared width
    pub fn value(&self) -> u64 {
        if self.is_32bit() {
            self.timestamp & 0xffff_ffff
        } else {
            self.timestamp
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HeFormat {
    Su,
    ExtSu,
    Mu,
    Trigger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HeGuardInterval {
    Gi0_8,
    Gi1_6,
    Gi3_2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HeLtfSize {
    X1,
    X2,
    X4,
}

/// Data bandwidth or RU allocation from HE data5
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HeRuAllocation {
    Bw20,
    Bw40,
    Bw80,
    Bw160,
    Ru26,
    Ru52,
    Ru106,
    Ru242,
    Ru484,
    Ru996,
    Ru2x996,
}

/// 802.11ax HE information (field 23)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct He {
    pub data: [u16; 6],
}

impl He {
    fn knows1(&self, bit: u16) -> bool {
        self.data[0] & bit != 0
    }

    pub fn format(&self) -> HeFormat {
        match bits16(self.data[0], he::DATA1_FORMAT_MASK) {
            0 => HeFormat::Su,
            1 => HeFormat::ExtSu,
            2 => HeFormat::Mu,
            _ => HeFormat::Trigger,
        }
    }

    pub fn bss_color(&self) -> Option<u8> {
        self.knows1(he::DATA1_BSS_COLOR_KNOWN)
            .then(|| bits16(self.data[2], he::DATA3_BSS_COLOR) as u8)
    }

    pub fn beam_change(&self) -> Option<bool> {
        self.knows1(he::DATA1_BEAM_CHANGE_KNOWN)
            .then(|| self.data[2] & he::DATA3_BEAM_CHANGE != 0)
    }

    /// `true` for uplink
    pub fn uplink(&self) -> Option<bool> {
        self.knows1(he::DATA1_UL_DL_KNOWN)
            .then(|| self.data[2] & he::DATA3_UL_DL != 0)
    }

    pub fn data_mcs(&self) -> Option<u8> {
        self.knows1(he::DATA1_DATA_MCS_KNOWN)
            .then(|| bits16(self.data[2], he::DATA3_DATA_MCS) as u8)
    }

    pub fn dcm(&self) -> Option<bool> {
        self.knows1(he::DATA1_DATA_DCM_KNOWN)
            .then(|| self.data[2] & he::DATA3_DATA_DCM != 0)
    }

    pub fn coding(&self) -> Option<Fec> {
        self.knows1(he::DATA1_CODING_KNOWN).then(|| {
            if self.data[2] & he::DATA3_CODING != 0 {
                Fec::Ldpc
            } else {
                Fec::Bcc
            }
        })
    }

    pub fn stbc(&self) -> Option<bool> {
        self.knows1(he::DATA1_STBC_KNOWN)
            .then(|| self.data[2] & he::DATA3_STBC != 0)
    }

    pub fn bandwidth_ru_allocation(&self) -> Option<HeRuAllocation> {
        if !self.knows1(he::DATA1_BW_RU_ALLOC_KNOWN) {
            return None;
        }
        match bits16(self.data[4], he::DATA5_BW_RU_ALLOC) {
            0 => Some(HeRuAllocation::Bw20),
            1 => Some(HeRuAllocation::Bw40),
            2 => Some(HeRuAllocation::Bw80),
            3 => Some(HeRuAllocation::Bw160),
            4 => Some(HeRuAllocation::Ru26),
            5 => Some(HeRuAllocation::Ru52),
            6 => Some(HeRuAllocation::Ru106),
            7 => Some(HeRuAllocation::Ru242),
            8 => Some(HeRuAllocation::Ru484),
            9 => Some(HeRuAllocation::Ru996),
            10 => Some(HeRuAllocation::Ru2x996),
            _ => None,
        }
    }

    pub fn guard_interval(&self) -> Option<HeGuardInterval> {
        if self.data[1] & he::DATA2_GI_KNOWN == 0 {
            return None;
        }
        match bits16(self.data[4], he::DATA5_GI) {
            0 => Some(HeGuardInterval::Gi0_8),
            1 => Some(HeGuardInterval::Gi1_6),
            2 => Some(HeGuardInterval::Gi3_2),
            _ => None,
        }
    }

    pub fn ltf_size(&self) -> Option<HeLtfSize> {
        match bits16(self.data[4], he::DATA5_LTF_SIZE) {
            1 => Some(HeLtfSize::X1),
            2 => Some(HeLtfSize::X2),
            3 => Some(HeLtfSize::X4),
            _ => None,
        }
    }

    pub fn nsts(&self) -> u8 {
        bits16(self.data[5], he::DATA6_NSTS) as u8
    }

    pub fn doppler(&self) -> Option<bool> {
        self.knows1(he::DATA1_DOPPLER_KNOWN)
            .then(|| self.data[5] & he::DATA6_DOPPLER != 0)
    }

    pub fn txop(&self) -> Option<u8> {
        (self.data[1] & he::DATA2_TXOP_KNOWN != 0)
            .then(|| bits16(self.data[5], he::DATA6_TXOP) as u8)
    }
}

/// 802.11ax HE-MU information (field 24)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HeMu {
    pub flags1: u16,
    pub flags2: u16,
    pub ru_ch1: [u8; 4],
    pub ru_ch2: [u8; 4],
}

impl HeMu {
    pub fn sig_b_mcs(&self) -> Option<u8> {
        (self.flags1 & he_mu::FLAGS1_SIG_B_MCS_KNOWN != 0)
            .then(|| bits16(self.flags1, he_mu::FLAGS1_SIG_B_MCS) as u8)
    }

    pub fn sig_b_dcm(&self) -> Option<bool> {
        (self.flags1 & he_mu::FLAGS1_SIG_B_DCM_KNOWN != 0)
            .then(|| self.flags1 & he_mu::FLAGS1_SIG_B_DCM != 0)
    }

    pub fn bandwidth_mhz(&self) -> Option<u16> {
        if self.flags2 & he_mu::FLAGS2_BW_FROM_SIG_A_BW_KNOWN == 0 {
            return None;
        }
        Some(20 << bits16(self.flags2, he_mu::FLAGS2_BW_FROM_SIG_A_BW))
    }

    pub fn sig_b_compression(&self) -> Option<bool> {
        (self.flags1 & he_mu::FLAGS1_SIG_B_COMP_KNOWN != 0)
            .then(|| self.flags2 & he_mu::FLAGS2_SIG_B_COMP != 0)
    }

    pub fn sig_b_symbols_users(&self) -> Option<u8> {
        (self.flags1 & he_mu::FLAGS1_SIG_B_SYMS_USERS_KNOWN != 0)
            .then(|| bits16(self.flags2, he_mu::FLAGS2_SIG_B_SYMS_USERS) as u8)
    }

    pub fn ch1_ru(&self) -> Option<[u8; 4]> {
        (self.flags1 & he_mu::FLAGS1_CH1_RU_KNOWN != 0).then_some(self.ru_ch1)
    }

    pub fn ch2_ru(&self) -> Option<[u8; 4]> {
        (self.flags1 & he_mu::FLAGS1_CH2_RU_KNOWN != 0).then_some(self.ru_ch2)
    }
}

/// Legacy SIGNAL field (field 27)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LSig {
    pub data1: u16,
    pub data2: u16,
}

impl LSig {
    pub fn rate(&self) -> Option<u8> {
        (self.data1 & lsig::DATA1_RATE_KNOWN != 0)
            .then(|| bits16(self.data2, lsig::DATA2_RATE) as u8)
    }

    pub fn length(&self) -> Option<u16> {
        (self.data1 & lsig::DATA1_LENGTH_KNOWN != 0)
            .then(|| bits16(self.data2, lsig::DATA2_LENGTH))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ZeroLengthPsdu {
    Sounding,
    NotCaptured,
    Vendor,
    Reserved(u8),
}

impl From<u8> for ZeroLengthPsdu {
    fn from(val: u8) -> Self {
        match val {
            0 => ZeroLengthPsdu::Sounding,
            1 => ZeroLengthPsdu::NotCaptured,
            0xff => ZeroLengthPsdu::Vendor,
            other => ZeroLengthPsdu::Reserved(other),
        }
    }
}

/// Decoded value of a fixed field
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Tsft(u64),
    Flags(Flags),
    Rate(Rate),
    Channel(Channel),
    Fhss(Fhss),
    AntennaSignalDbm(i8),
    AntennaNoiseDbm(i8),
    LockQuality(u16),
    TxAttenuation(u16),
    DbTxAttenuation(u16),
    TxPowerDbm(i8),
    Antenna(u8),
    AntennaSignalDb(u8),
    AntennaNoiseDb(u8),
    RxFlags(RxFlags),
    TxFlags(TxFlags),
    RtsRetries(u8),
    DataRetries(u8),
    XChannel(XChannel),
    Mcs(Mcs),
    AmpduStatus(AmpduStatus),
    Vht(Vht),
    Timestamp(Timestamp),
    He(He),
    HeMu(HeMu),
    ZeroLengthPsdu(ZeroLengthPsdu),
    LSig(LSig),
    /// Unknown field, bytes kept as-is
    Opaque,
}

impl FieldValue {
    /// Decode `raw` as `kind`. `raw` must be exactly the catalog size.
    pub fn parse(kind: FieldKind, raw: &[u8]) -> Result<Self> {
        let expected = kind.layout().size;
        if raw.len() != expected {
            return Err(RadiotapError::MalformedHeader(format!(
                "{} expects {} bytes, got {}",
                kind.name(),
                expected,
                raw.len()
            )));
        }

        let value = match kind {
            FieldKind::Tsft => FieldValue::Tsft(le64(raw, 0)),
            FieldKind::Flags => FieldValue::Flags(Flags(raw[0])),
            FieldKind::Rate => FieldValue::Rate(Rate(raw[0])),
            FieldKind::Channel => FieldValue::Channel(Channel {
                freq: le16(raw, 0),
                flags: le16(raw, 2),
            }),
            FieldKind::Fhss => FieldValue::Fhss(Fhss {
                hop_set: raw[0],
                hop_pattern: raw[1],
            }),
            FieldKind::AntennaSignalDbm => FieldValue::AntennaSignalDbm(raw[0] as i8),
            FieldKind::AntennaNoiseDbm => FieldValue::AntennaNoiseDbm(raw[0] as i8),
            FieldKind::LockQuality => FieldValue::LockQuality(le16(raw, 0)),
            FieldKind::TxAttenuation => FieldValue::TxAttenuation(le16(raw, 0)),
            FieldKind::DbTxAttenuation => FieldValue::DbTxAttenuation(le16(raw, 0)),
            FieldKind::TxPowerDbm => FieldValue::TxPowerDbm(raw[0] as i8),
            FieldKind::Antenna => FieldValue::Antenna(raw[0]),
            FieldKind::AntennaSignalDb => FieldValue::AntennaSignalDb(raw[0]),
            FieldKind::AntennaNoiseDb => FieldValue::AntennaNoiseDb(raw[0]),
            FieldKind::RxFlags => FieldValue::RxFlags(RxFlags(le16(raw, 0))),
            FieldKind::TxFlags => FieldValue::TxFlags(TxFlags(le16(raw, 0))),
            FieldKind::RtsRetries => FieldValue::RtsRetries(raw[0]),
            FieldKind::DataRetries => FieldValue::DataRetries(raw[0]),
            FieldKind::XChannel => FieldValue::XChannel(XChannel {
                flags: le32(raw, 0),
                freq: le16(raw, 4),
                channel: raw[6],
                max_power: raw[7],
            }),
            FieldKind::Mcs => FieldValue::Mcs(Mcs {
                known: raw[0],
                flags: raw[1],
                index: raw[2],
            }),
            FieldKind::AmpduStatus => FieldValue::AmpduStatus(AmpduStatus {
                reference: le32(raw, 0),
                flags: le16(raw, 4),
                delimiter_crc: raw[6],
                reserved: raw[7],
            }),
            FieldKind::Vht => FieldValue::Vht(Vht {
                known: le16(raw, 0),
                flags: raw[2],
                bandwidth: raw[3],
                mcs_nss: [raw[4], raw[5], raw[6], raw[7]],
                coding: raw[8],
                group_id: raw[9],
                partial_aid: le16(raw, 10),
            }),
            FieldKind::Timestamp => FieldValue::Timestamp(Timestamp {
                timestamp: le64(raw, 0),
                accuracy: le16(raw, 8),
                unit_position: raw[10],
                flags: raw[11],
            }),
            FieldKind::He => {
                let mut data = [0u16; 6];
                for (i, word) in data.iter_mut().enumerate() {
                    *word = le16(raw, i * 2);
                }
                FieldValue::He(He { data })
            }
            FieldKind::HeMu => FieldValue::HeMu(HeMu {
                flags1: le16(raw, 0),
                flags2: le16(raw, 2),
                ru_ch1: [raw[4], raw[5], raw[6], raw[7]],
                ru_ch2: [raw[8], raw[9], raw[10], raw[11]],
            }),
            FieldKind::ZeroLengthPsdu => FieldValue::ZeroLengthPsdu(ZeroLengthPsdu::from(raw[0])),
            FieldKind::LSig => FieldValue::LSig(LSig {
                data1: le16(raw, 0),
                data2: le16(raw, 2),
            }),
            FieldKind::Tlv => FieldValue::Opaque,
        };
        Ok(value)
    }
}
