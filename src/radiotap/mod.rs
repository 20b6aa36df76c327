//! Radiotap Header Decoding
//!
//! Decodes the radiotap metadata header that capture drivers prepend to
//! 802.11 frames:
//! - Chained presence bitmaps
//! - Packed, aligned fixed fields
//! - Vendor namespaces (skipped by their declared length)
//! - TLV records (U-SIG, EHT, vendor, field TLVs)
//!
//! Every read is bounded by the header's declared length. Malformed input
//! yields a [`RadiotapError`](crate::error::RadiotapError), never a panic.

pub mod catalog;
pub mod decoder;
pub mod fields;
pub mod fixed;
pub mod info;
pub mod namespace;
pub mod presence;
pub mod tlv;

pub use catalog::{size_and_align, FieldKind, FieldLayout};
pub use decoder::{decode, DecodedRadiotap, RadiotapDecoder, RadiotapHeader, MIN_HEADER_LEN};
pub use fields::{Band, FieldValue};
pub use fixed::FixedField;
pub use info::RadiotapInfo;
pub use namespace::{Namespace, NamespaceSwitcher, VendorBlock, VendorNamespace};
pub use presence::PresenceEntry;
pub use tlv::{EhtTlv, EhtUserInfo, TlvRecord, TlvValue, UsigTlv, VendorTlv};
