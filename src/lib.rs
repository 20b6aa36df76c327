//! Radiotap header decoder
//!
//! A defensive decoder for the radiotap metadata header found in front of
//! captured 802.11 frames (pcap link type 127).
//!
//! ```no_run
//! let frame: &[u8] = &[0x00, 0x00, 0x09, 0x00, 0x02, 0x00, 0x00, 0x00, 0x10];
//! let decoded = radiotap_codec::decode(frame)?;
//! let body = decoded.payload(frame);
//! # Ok::<(), radiotap_codec::RadiotapError>(())
//! ```

pub mod config;
pub mod error;
pub mod radiotap;

pub use config::{Config, DecoderSettings, TlvPolicy};
pub use error::{ErrorKind, RadiotapError, Result};
pub use radiotap::{decode, DecodedRadiotap, RadiotapDecoder, RadiotapInfo};
