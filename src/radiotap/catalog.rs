//! Radiotap Field Catalog
//!
//! Static size and alignment of every field that can appear in the fixed
//! region of a radiotap header, plus the bit and TLV type numbers.
//!
//! Reference: https://www.radiotap.org/fields/defined

use serde::Serialize;

use super::namespace::Namespace;

/// Presence bit numbers (standard radiotap namespace)
pub mod index {
    pub const TSFT: u32 = 0;
    pub const FLAGS: u32 = 1;
    pub const RATE: u32 = 2;
    pub const CHANNEL: u32 = 3;
    pub const FHSS: u32 = 4;
    pub const DBM_ANTSIGNAL: u32 = 5;
    pub const DBM_ANTNOISE: u32 = 6;
    pub const LOCK_QUALITY: u32 = 7;
    pub const TX_ATTENUATION: u32 = 8;
    pub const DB_TX_ATTENUATION: u32 = 9;
    pub const DBM_TX_POWER: u32 = 10;
    pub const ANTENNA: u32 = 11;
    pub const DB_ANTSIGNAL: u32 = 12;
    pub const DB_ANTNOISE: u32 = 13;
    pub const RX_FLAGS: u32 = 14;
    pub const TX_FLAGS: u32 = 15;
    pub const RTS_RETRIES: u32 = 16;
    pub const DATA_RETRIES: u32 = 17;
    pub const XCHANNEL: u32 = 18;
    pub const MCS: u32 = 19;
    pub const AMPDU_STATUS: u32 = 20;
    pub const VHT: u32 = 21;
    pub const TIMESTAMP: u32 = 22;
    pub const HE: u32 = 23;
    pub const HE_MU: u32 = 24;
    pub const ZERO_LEN_PSDU: u32 = 26;
    pub const LSIG: u32 = 27;
    pub const TLV: u32 = 28;
    /// Valid in every bitmap, even vendor namespaces
    pub const RADIOTAP_NAMESPACE: u32 = 29;
    pub const VENDOR_NAMESPACE: u32 = 30;
    pub const EXT: u32 = 31;
}

/// TLV type numbers that have a typed layout
pub mod tlv_type {
    pub const VENDOR_NAMESPACE: u16 = 30;
    pub const EHT_USIG: u16 = 33;
    pub const EHT: u16 = 34;
}

/// Byte length and required alignment of a fixed field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldLayout {
    pub size: usize,
    pub align: usize,
}

impl FieldLayout {
    const fn new(size: usize, align: usize) -> Self {
        Self { size, align }
    }
}

/// Known fields of the standard namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FieldKind {
    Tsft,
    Flags,
    Rate,
    Channel,
    Fhss,
    AntennaSignalDbm,
    AntennaNoiseDbm,
    LockQuality,
    TxAttenuation,
    DbTxAttenuation,
    TxPowerDbm,
    Antenna,
    AntennaSignalDb,
    AntennaNoiseDb,
    RxFlags,
    TxFlags,
    RtsRetries,
    DataRetries,
    XChannel,
    Mcs,
    AmpduStatus,
    Vht,
    Timestamp,
    He,
    HeMu,
    ZeroLengthPsdu,
    LSig,
    Tlv,
}

/// Layout table indexed by presence bit; `None` marks reserved bits.
const LAYOUTS: [Option<(FieldKind, FieldLayout)>; 29] = [
    Some((FieldKind::Tsft, FieldLayout::new(8, 8))),
    Some((FieldKind::Flags, FieldLayout::new(1, 1))),
    Some((FieldKind::Rate, FieldLayout::new(1, 1))),
    Some((FieldKind::Channel, FieldLayout::new(4, 2))),
    Some((FieldKind::Fhss, FieldLayout::new(2, 2))),
    Some((FieldKind::AntennaSignalDbm, FieldLayout::new(1, 1))),
    Some((FieldKind::AntennaNoiseDbm, FieldLayout::new(1, 1))),
    Some((FieldKind::LockQuality, FieldLayout::new(2, 2))),
    Some((FieldKind::TxAttenuation, FieldLayout::new(2, 2))),
    Some((FieldKind::DbTxAttenuation, FieldLayout::new(2, 2))),
    Some((FieldKind::TxPowerDbm, FieldLayout::new(1, 1))),
    Some((FieldKind::Antenna, FieldLayout::new(1, 1))),
    Some((FieldKind::AntennaSignalDb, FieldLayout::new(1, 1))),
    Some((FieldKind::AntennaNoiseDb, FieldLayout::new(1, 1))),
    Some((FieldKind::RxFlags, FieldLayout::new(2, 2))),
    Some((FieldKind::TxFlags, FieldLayout::new(2, 2))),
    Some((FieldKind::RtsRetries, FieldLayout::new(1, 1))),
    Some((FieldKind::DataRetries, FieldLayout::new(1, 1))),
    Some((FieldKind::XChannel, FieldLayout::new(8, 4))),
    Some((FieldKind::Mcs, FieldLayout::new(3, 1))),
    Some((FieldKind::AmpduStatus, FieldLayout::new(8, 4))),
    Some((FieldKind::Vht, FieldLayout::new(12, 2))),
    Some((FieldKind::Timestamp, FieldLayout::new(12, 8))),
    Some((FieldKind::He, FieldLayout::new(12, 2))),
    Some((FieldKind::HeMu, FieldLayout::new(12, 2))),
    None,
    Some((FieldKind::ZeroLengthPsdu, FieldLayout::new(1, 1))),
    Some((FieldKind::LSig, FieldLayout::new(4, 2))),
    // TLVs start on the next 4-byte boundary; the marker has no payload
    Some((FieldKind::Tlv, FieldLayout::new(0, 4))),
];

/// The vendor namespace descriptor: OUI, sub-namespace, skip length.
pub const VENDOR_DESCRIPTOR: FieldLayout = FieldLayout::new(6, 2);

/// Alignment of every TLV record.
pub const TLV_ALIGN: usize = 4;

impl FieldKind {
    /// Look up a standard-namespace field by canonical index.
    pub fn from_index(index: u32) -> Option<Self> {
        LAYOUTS
            .get(index as usize)
            .and_then(|entry| entry.map(|(kind, _)| kind))
    }

    pub fn index(self) -> u32 {
        match self {
            FieldKind::Tsft => index::TSFT,
            FieldKind::Flags => index::FLAGS,
            FieldKind::Rate => index::RATE,
            FieldKind::Channel => index::CHANNEL,
            FieldKind::Fhss => index::FHSS,
            FieldKind::AntennaSignalDbm => index::DBM_ANTSIGNAL,
            FieldKind::AntennaNoiseDbm => index::DBM_ANTNOISE,
            FieldKind::LockQuality => index::LOCK_QUALITY,
            FieldKind::TxAttenuation => index::TX_ATTENUATION,
            FieldKind::DbTxAttenuation => index::DB_TX_ATTENUATION,
            FieldKind::TxPowerDbm => index::DBM_TX_POWER,
            FieldKind::Antenna => index::ANTENNA,
            FieldKind::AntennaSignalDb => index::DB_ANTSIGNAL,
            FieldKind::AntennaNoiseDb => index::DB_ANTNOISE,
            FieldKind::RxFlags => index::RX_FLAGS,
            FieldKind::TxFlags => index::TX_FLAGS,
            FieldKind::RtsRetries => index::RTS_RETRIES,
            FieldKind::DataRetries => index::DATA_RETRIES,
            FieldKind::XChannel => index::XCHANNEL,
            FieldKind::Mcs => index::MCS,
            FieldKind::AmpduStatus => index::AMPDU_STATUS,
            FieldKind::Vht => index::VHT,
            FieldKind::Timestamp => index::TIMESTAMP,
            FieldKind::He => index::HE,
            FieldKind::HeMu => index::HE_MU,
            FieldKind::ZeroLengthPsdu => index::ZERO_LEN_PSDU,
            FieldKind::LSig => index::LSIG,
            FieldKind::Tlv => index::TLV,
        }
    }

    pub fn layout(self) -> FieldLayout {
        // every kind has an entry; the fallback is never taken
        LAYOUTS[self.index() as usize].map_or(FieldLayout::new(0, 1), |(_, layout)| layout)
    }

    pub fn name(self) -> &'static str {
        match self {
            FieldKind::Tsft => "tsft",
            FieldKind::Flags => "flags",
            FieldKind::Rate => "rate",
            FieldKind::Channel => "channel",
            FieldKind::Fhss => "fhss",
            FieldKind::AntennaSignalDbm => "dbm_antsignal",
            FieldKind::AntennaNoiseDbm => "dbm_antnoise",
            FieldKind::LockQuality => "lock_quality",
            FieldKind::TxAttenuation => "tx_attenuation",
            FieldKind::DbTxAttenuation => "db_tx_attenuation",
            FieldKind::TxPowerDbm => "dbm_tx_power",
            FieldKind::Antenna => "antenna",
            FieldKind::AntennaSignalDb => "db_antsignal",
            FieldKind::AntennaNoiseDb => "db_antnoise",
            FieldKind::RxFlags => "rx_flags",
            FieldKind::TxFlags => "tx_flags",
            FieldKind::RtsRetries => "rts_retries",
            FieldKind::DataRetries => "data_retries",
            FieldKind::XChannel => "xchannel",
            FieldKind::Mcs => "mcs",
            FieldKind::AmpduStatus => "ampdu_status",
            FieldKind::Vht => "vht",
            FieldKind::Timestamp => "timestamp",
            FieldKind::He => "he",
            FieldKind::HeMu => "he_mu",
            FieldKind::ZeroLengthPsdu => "zero_length_psdu",
            FieldKind::LSig => "lsig",
            FieldKind::Tlv => "tlv",
        }
    }
}

/// Size and alignment of a data field, or `None` when the field is unknown.
///
/// Namespace and extension bits (29, 30, 31) are not data fields and always
/// yield `None`; vendor namespaces are opaque to this catalog.
pub fn size_and_align(namespace: &Namespace, index: u32) -> Option<FieldLayout> {
    match namespace {
        Namespace::Standard => FieldKind::from_index(index).map(FieldKind::layout),
        Namespace::Vendor { .. } => None,
    }
}

/// Round `offset` up to a multiple of `align` (a power of two).
pub fn align_up(offset: usize, align: usize) -> usize {
    debug_assert!(align.is_power_of_two());
    (offset + align - 1) & !(align - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_matches_indices() {
        for bit in 0..=28u32 {
            if let Some(kind) = FieldKind::from_index(bit) {
                assert_eq!(kind.index(), bit, "{}", kind.name());
            }
        }
    }

    #[test]
    fn test_known_layouts() {
        let std = Namespace::Standard;
        assert_eq!(size_and_align(&std, index::TSFT), Some(FieldLayout::new(8, 8)));
        assert_eq!(size_and_align(&std, index::FLAGS), Some(FieldLayout::new(1, 1)));
        assert_eq!(size_and_align(&std, index::CHANNEL), Some(FieldLayout::new(4, 2)));
        assert_eq!(size_and_align(&std, index::MCS), Some(FieldLayout::new(3, 1)));
        assert_eq!(size_and_align(&std, index::AMPDU_STATUS), Some(FieldLayout::new(8, 4)));
        assert_eq!(size_and_align(&std, index::VHT), Some(FieldLayout::new(12, 2)));
        assert_eq!(size_and_align(&std, index::TIMESTAMP), Some(FieldLayout::new(12, 8)));
        assert_eq!(size_and_align(&std, index::HE), Some(FieldLayout::new(12, 2)));
        assert_eq!(size_and_align(&std, index::HE_MU), Some(FieldLayout::new(12, 2)));
        assert_eq!(size_and_align(&std, index::ZERO_LEN_PSDU), Some(FieldLayout::new(1, 1)));
        assert_eq!(size_and_align(&std, index::LSIG), Some(FieldLayout::new(4, 2)));
        assert_eq!(size_and_align(&std, index::TLV), Some(FieldLayout::new(0, 4)));
    }

    #[test]
    fn test_unknown_and_control_bits() {
        let std = Namespace::Standard;
        assert_eq!(size_and_align(&std, 25), None);
        assert_eq!(size_and_align(&std, index::RADIOTAP_NAMESPACE), None);
        assert_eq!(size_and_align(&std, index::VENDOR_NAMESPACE), None);
        assert_eq!(size_and_align(&std, index::EXT), None);
        assert_eq!(size_and_align(&std, 35), None);

        let vendor = Namespace::Vendor {
            oui: [0x00, 0x11, 0x22],
            sub_namespace: 0,
        };
        assert_eq!(size_and_align(&vendor, index::FLAGS), None);
    }

    #[test]
    fn test_align_up() {
        assert_eq!(align_up(8, 8), 8);
        assert_eq!(align_up(9, 8), 16);
        assert_eq!(align_up(9, 2), 10);
        assert_eq!(align_up(13, 1), 13);
        assert_eq!(align_up(13, 4), 16);
    }
}
