use thiserror::Error;

#[derive(Debug, Error)]
pub enum RadiotapError {
    #[error("unsupported radiotap version {0}")]
    UnsupportedVersion(u8),

    #[error("truncated radiotap header: {what} needs {needed} bytes at offset {offset}, limit is {limit}")]
    TruncatedHeader {
        what: &'static str,
        offset: usize,
        needed: usize,
        limit: usize,
    },

    #[error("malformed radiotap header: {0}")]
    MalformedHeader(String),

    #[error("malformed TLV type {tlv_type}: {reason}")]
    MalformedTlv { tlv_type: u16, reason: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Payload-free discriminant of [`RadiotapError`], for tallying dropped frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorKind {
    UnsupportedVersion,
    TruncatedHeader,
    MalformedHeader,
    MalformedTlv,
    Config,
    Io,
}

impl RadiotapError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RadiotapError::UnsupportedVersion(_) => ErrorKind::UnsupportedVersion,
            RadiotapError::TruncatedHeader { .. } => ErrorKind::TruncatedHeader,
            RadiotapError::MalformedHeader(_) => ErrorKind::MalformedHeader,
            RadiotapError::MalformedTlv { .. } => ErrorKind::MalformedTlv,
            RadiotapError::Config(_) => ErrorKind::Config,
            RadiotapError::Io(_) => ErrorKind::Io,
        }
    }

    pub(crate) fn truncated(what: &'static str, offset: usize, needed: usize, limit: usize) -> Self {
        RadiotapError::TruncatedHeader {
            what,
            offset,
            needed,
            limit,
        }
    }

    pub(crate) fn malformed_tlv(tlv_type: u16, reason: impl Into<String>) -> Self {
        RadiotapError::MalformedTlv {
            tlv_type,
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::UnsupportedVersion => "unsupported_version",
            ErrorKind::TruncatedHeader => "truncated_header",
            ErrorKind::MalformedHeader => "malformed_header",
            ErrorKind::MalformedTlv => "malformed_tlv",
            ErrorKind::Config => "config",
            ErrorKind::Io => "io",
        };
        f.pad(name)
    }
}

pub type Result<T> = std::result::Result<T, RadiotapError>;
