use std::path::PathBuf;

/// Failure while reading from a [`Parcel`](crate::parcel::Parcel).
#[derive(Debug, thiserror::Error)]
pub enum ParcelError {
    #[error("parcel truncated: needed {needed} bytes at offset {offset}, {remaining} remaining")]
    Truncated {
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    #[error("invalid length prefix {0}")]
    InvalidLength(i32),

    #[error("string is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("expected parcelable {expected}, found {found}")]
    UnexpectedType {
        expected: &'static str,
        found: String,
    },

    #[error("not a tracker parcel (bad magic)")]
    BadMagic,

    #[error("unsupported schema version {0}")]
    UnsupportedVersion(u16),

    #[error("{0} trailing bytes after last record")]
    TrailingBytes(usize),
}

/// Failure while reading or writing intent firewall rules.
#[derive(Debug, thiserror::Error)]
pub enum FirewallError {
    #[error("malformed firewall rules: {0}")]
    Xml(#[from] quick_xml::de::DeError),

    #[error("failed to write firewall rules: {0}")]
    Serialize(#[from] quick_xml::se::SeError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
