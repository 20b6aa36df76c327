//! Flat per-frame summary of the common radiotap fields

use serde::Serialize;

use super::fields::{freq_to_band, freq_to_channel, Band, FieldValue};

/// Common fields pulled out of a decoded header
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RadiotapInfo {
    /// MAC timestamp in microseconds
    pub tsft: Option<u64>,
    /// Frame flags
    pub flags: Option<u8>,
    /// Data rate in 500Kbps units (e.g., 11 = 5.5 Mbps)
    pub rate: Option<u8>,
    /// Channel frequency in MHz
    pub channel_freq: Option<u16>,
    /// Channel flags
    pub channel_flags: Option<u16>,
    /// Signal strength in dBm
    pub signal_dbm: Option<i8>,
    /// Noise floor in dBm
    pub noise_dbm: Option<i8>,
    /// Antenna index
    pub antenna: Option<u8>,
    /// Signal strength in dB
    pub signal_db: Option<u8>,
    /// Noise in dB
    pub noise_db: Option<u8>,
    /// HT MCS index, when known
    pub mcs_index: Option<u8>,
}

impl RadiotapInfo {
    /// Build a summary from decoded field values. The first occurrence wins.
    pub fn from_values<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = &'a FieldValue>,
    {
        let mut info = RadiotapInfo::default();
        for value in values {
            match value {
                FieldValue::Tsft(v) => {
                    info.tsft.get_or_insert(*v);
                }
                FieldValue::Flags(f) => {
                    info.flags.get_or_insert(f.0);
                }
                FieldValue::Rate(r) => {
                    info.rate.get_or_insert(r.0);
                }
                FieldValue::Channel(c) => {
                    info.channel_freq.get_or_insert(c.freq);
                    info.channel_flags.get_or_insert(c.flags);
                }
                FieldValue::AntennaSignalDbm(v) => {
                    info.signal_dbm.get_or_insert(*v);
                }
                FieldValue::AntennaNoiseDbm(v) => {
                    info.noise_dbm.get_or_insert(*v);
                }
                FieldValue::Antenna(v) => {
                    info.antenna.get_or_insert(*v);
                }
                FieldValue::AntennaSignalDb(v) => {
                    info.signal_db.get_or_insert(*v);
                }
                FieldValue::AntennaNoiseDb(v) => {
                    info.noise_db.get_or_insert(*v);
                }
                FieldValue::Mcs(m) => {
                    if let Some(index) = m.mcs_index() {
                        info.mcs_index.get_or_insert(index);
                    }
                }
                _ => {}
            }
        }
        info
    }

    /// Get signal-to-noise ratio if available
    pub fn snr(&self) -> Option<i16> {
        match (self.signal_dbm, self.noise_dbm) {
            (Some(sig), Some(noise)) => Some(sig as i16 - noise as i16),
            _ => None,
        }
    }

    /// Data rate in Mb/s
    pub fn rate_mbps(&self) -> Option<f32> {
        self.rate.map(|r| f32::from(r) * 0.5)
    }

    pub fn band(&self) -> Option<Band> {
        self.channel_freq.and_then(freq_to_band)
    }

    /// Check if this is 2.4GHz band
    pub fn is_2_4ghz(&self) -> bool {
        self.band() == Some(Band::Ghz2_4)
    }

    /// Check if this is 5GHz band
    pub fn is_5ghz(&self) -> bool {
        self.band() == Some(Band::Ghz5)
    }

    /// Get channel number from frequency
    pub fn channel(&self) -> Option<u8> {
        self.channel_freq.and_then(freq_to_channel)
    }
}
