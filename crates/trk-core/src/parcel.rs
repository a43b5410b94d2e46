//! Linear byte buffer used to move tracker records across process boundaries.
//!
//! Layout primitives:
//! - bytes and booleans take exactly one byte
//! - integers are little-endian
//! - strings are an `i32` byte length (`-1` for null) followed by UTF-8
//! - nested objects are a nullable type tag followed by the object's own layout

use crate::error::ParcelError;

/// Flag passed to [`Parcelable::write_to_parcel`] when the object is a return value.
pub const PARCELABLE_WRITE_RETURN_VALUE: u32 = 0x0001;

const NULL_LENGTH: i32 = -1;

/// A value that can be flattened into and restored from a [`Parcel`].
pub trait Parcelable: Sized {
    /// Tag written ahead of the body by [`Parcel::write_parcelable`].
    const TYPE_NAME: &'static str;

    fn write_to_parcel(&self, dest: &mut Parcel, flags: u32);

    fn read_from_parcel(src: &mut Parcel) -> Result<Self, ParcelError>;

    /// Special content flags. Nothing here carries file descriptors.
    fn describe_contents(&self) -> u32 {
        0
    }
}

/// Growable byte buffer with a read cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parcel {
    data: Vec<u8>,
    pos: usize,
}

/// Longest prefix of `s` that is at most `max` bytes and ends on a char boundary.
fn clamp_to_char_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

impl Parcel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap previously marshalled bytes for reading from the start.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data, pos: 0 }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn data_size(&self) -> usize {
        self.data.len()
    }

    pub fn data_position(&self) -> usize {
        self.pos
    }

    /// Move the read cursor. Positions past the end are clamped.
    pub fn set_data_position(&mut self, pos: usize) {
        self.pos = pos.min(self.data.len());
    }

    /// Bytes left to read.
    pub fn data_avail(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, needed: usize) -> Result<&[u8], ParcelError> {
        let remaining = self.data_avail();
        if remaining < needed {
            return Err(ParcelError::Truncated {
                offset: self.pos,
                needed,
                remaining,
            });
        }
        let start = self.pos;
        self.pos += needed;
        Ok(&self.data[start..self.pos])
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], ParcelError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn write_byte(&mut self, value: u8) {
        self.data.push(value);
    }

    pub fn read_byte(&mut self) -> Result<u8, ParcelError> {
        Ok(self.take_array::<1>()?[0])
    }

    pub fn write_bool(&mut self, value: bool) {
        self.write_byte(u8::from(value));
    }

    /// Any non-zero byte reads as `true`.
    pub fn read_bool(&mut self) -> Result<bool, ParcelError> {
        Ok(self.read_byte()? != 0)
    }

    pub fn write_u16(&mut self, value: u16) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub fn read_u16(&mut self) -> Result<u16, ParcelError> {
        Ok(u16::from_le_bytes(self.take_array()?))
    }

    pub fn write_i32(&mut self, value: i32) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub fn read_i32(&mut self) -> Result<i32, ParcelError> {
        Ok(i32::from_le_bytes(self.take_array()?))
    }

    /// Write raw bytes with no length prefix.
    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    pub fn read_raw(&mut self, len: usize) -> Result<&[u8], ParcelError> {
        self.take(len)
    }

    /// Write a nullable string as its UTF-8 length, then its bytes.
    ///
    /// The length prefix is an `i32`, so a string longer than `i32::MAX` bytes
    /// is cut at the last character boundary that fits.
    pub fn write_string(&mut self, value: Option<&str>) {
        match value {
            Some(s) => {
                let s = clamp_to_char_boundary(s, i32::MAX as usize);
                self.write_i32(s.len() as i32);
                self.write_raw(s.as_bytes());
            }
            None => self.write_i32(NULL_LENGTH),
        }
    }

    pub fn read_string(&mut self) -> Result<Option<String>, ParcelError> {
        let len = self.read_i32()?;
        if len == NULL_LENGTH {
            return Ok(None);
        }
        if len < 0 {
            return Err(ParcelError::InvalidLength(len));
        }
        let bytes = self.take(len as usize)?.to_vec();
        Ok(Some(String::from_utf8(bytes)?))
    }

    /// Write a nullable nested object: its type tag, then its body.
    pub fn write_parcelable<T: Parcelable>(&mut self, value: Option<&T>, flags: u32) {
        match value {
            Some(v) => {
                self.write_string(Some(T::TYPE_NAME));
                v.write_to_parcel(self, flags);
            }
            None => self.write_string(None),
        }
    }

    pub fn read_parcelable<T: Parcelable>(&mut self) -> Result<Option<T>, ParcelError> {
        match self.read_string()? {
            None => Ok(None),
            Some(tag) if tag == T::TYPE_NAME => T::read_from_parcel(self).map(Some),
            Some(found) => Err(ParcelError::UnexpectedType {
                expected: T::TYPE_NAME,
                found,
            }),
        }
    }

    /// Write a homogeneous list: element count, then a presence byte and body per element.
    ///
    /// Only the first `i32::MAX` elements are written.
    pub fn write_typed_list<T: Parcelable>(&mut self, items: &[T], flags: u32) {
        let count = i32::try_from(items.len()).unwrap_or(i32::MAX);
        self.write_i32(count);
        for item in items.iter().take(count as usize) {
            self.write_bool(true);
            item.write_to_parcel(self, flags);
        }
    }

    /// Read a list written by [`Parcel::write_typed_list`]. Absent slots are skipped.
    pub fn read_typed_list<T: Parcelable>(&mut self) -> Result<Vec<T>, ParcelError> {
        let count = self.read_i32()?;
        if count < 0 {
            return Err(ParcelError::InvalidLength(count));
        }
        // Each element needs at least its presence byte.
        let mut items = Vec::with_capacity((count as usize).min(self.data_avail()));
        for _ in 0..count {
            if self.read_bool()? {
                items.push(T::read_from_parcel(self)?);
            }
        }
        Ok(items)
    }
}
