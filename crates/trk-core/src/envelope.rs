//! Versioned container for a list of tracker records.
//!
//! The bare record layout carries no header. Anything written to disk or
//! handed to another process goes through this envelope so a reader can tell
//! a foreign or newer file apart from a corrupt one.

use crate::error::ParcelError;
use crate::parcel::Parcel;
use crate::record::TrackerRecord;

pub const MAGIC: &[u8; 4] = b"TRKP";
pub const SCHEMA_VERSION: u16 = 1;

pub fn marshall(records: &[TrackerRecord]) -> Vec<u8> {
    let mut parcel = Parcel::new();
    parcel.write_raw(MAGIC);
    parcel.write_u16(SCHEMA_VERSION);
    parcel.write_typed_list(records, 0);
    parcel.into_bytes()
}

pub fn unmarshall(bytes: &[u8]) -> Result<Vec<TrackerRecord>, ParcelError> {
    let mut parcel = Parcel::from_bytes(bytes.to_vec());
    if parcel.data_avail() < MAGIC.len() || parcel.read_raw(MAGIC.len())? != MAGIC {
        return Err(ParcelError::BadMagic);
    }
    let version = parcel.read_u16()?;
    if version != SCHEMA_VERSION {
        return Err(ParcelError::UnsupportedVersion(version));
    }
    let records = parcel.read_typed_list()?;
    match parcel.data_avail() {
        0 => Ok(records),
        n => Err(ParcelError::TrailingBytes(n)),
    }
}
