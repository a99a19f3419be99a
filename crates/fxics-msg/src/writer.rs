//! The property serializer: pushes tagged values onto a stream, recording
//! a cut-mark at every value boundary (§4.3).

use crate::error::{MsgError, Result};
use crate::tags::{ptype, NamedKind, NamedPropertyInfo, PropertyTag};
use crate::value::{PropertyValue, ScalarValue};

/// Sentinel that terminates the cut-marks sidecar (§4.3, §6).
pub const CUTMARK_SENTINEL: u32 = 0xffff_ffff;

/// The main stream plus its cut-marks sidecar. Cut-marks are recorded
/// before every structural marker and every property record, so the
/// transport may truncate at any one of them (§4.3, §4.4).
#[derive(Debug, Default)]
pub struct CutmarkStream {
    buf: Vec<u8>,
    cutmarks: Vec<u32>,
}

impl CutmarkStream {
    pub fn new() -> Self {
        CutmarkStream::default()
    }

    pub fn offset(&self) -> usize {
        self.buf.len()
    }

    /// Records the current offset as a legal truncation point.
    pub fn mark(&mut self) {
        self.cutmarks.push(self.buf.len() as u32);
    }

    pub fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_bytes(&mut self, b: &[u8]) {
        self.buf.extend_from_slice(b);
    }

    /// Writes a raw structural marker (e.g. `PR_INCR_SYNC_CHG`), marking a
    /// cut point first.
    pub fn write_marker(&mut self, tag: PropertyTag) {
        self.mark();
        self.write_u32(tag.0);
    }

    /// Consumes the stream, appending the cut-mark sentinel (§4.3, §4.5).
    pub fn finish(mut self) -> (Vec<u8>, Vec<u32>) {
        self.cutmarks.push(CUTMARK_SENTINEL);
        (self.buf, self.cutmarks)
    }
}

/// Writes tagged property records onto a [`CutmarkStream`] (§4.3).
pub struct PropertyWriter<'s> {
    stream: &'s mut CutmarkStream,
}

impl<'s> PropertyWriter<'s> {
    pub fn new(stream: &'s mut CutmarkStream) -> Self {
        PropertyWriter { stream }
    }

    /// Pushes one `(tag, value)` record. Records a cut-mark first, then:
    /// `u32 tag`, named-property prefix if `tag.is_named()`, then the
    /// value encoded per its type (§4.3).
    pub fn push(
        &mut self,
        tag: PropertyTag,
        named: Option<&NamedPropertyInfo>,
        value: &PropertyValue,
    ) -> Result<()> {
        self.check_type(tag, value)?;

        if tag.is_named() && named.is_none() {
            return Err(MsgError::MissingNamedInfo(tag.0));
        }

        self.stream.mark();
        self.stream.write_u32(tag.0);

        if let Some(info) = named.filter(|_| tag.is_named()) {
            self.write_named_prefix(info);
        }

        match value {
            PropertyValue::Scalar(v) => self.write_scalar(v)?,
            PropertyValue::MultiValue(items) => {
                self.stream.write_u32(items.len() as u32);
                for item in items {
                    self.write_scalar(item)?;
                }
            }
        }
        Ok(())
    }

    fn check_type(&self, tag: PropertyTag, value: &PropertyValue) -> Result<()> {
        if tag.is_multivalued() != matches!(value, PropertyValue::MultiValue(_)) {
            return Err(MsgError::type_mismatch(tag, value.type_code()));
        }
        let declared = tag.base_type_code();
        let actual = match value {
            PropertyValue::Scalar(s) => s.type_code(),
            PropertyValue::MultiValue(items) => items
                .first()
                .map(|s| s.type_code())
                .ok_or(MsgError::EmptyMultiValue(tag.0))?,
        };
        if declared != actual {
            return Err(MsgError::type_mismatch(tag, actual));
        }
        Ok(())
    }

    fn write_named_prefix(&mut self, info: &NamedPropertyInfo) {
        self.stream.write_bytes(info.guid.as_bytes());
        match &info.kind {
            NamedKind::Id(lid) => {
                self.stream.write_bytes(&[0u8]); // kind = ID
                self.stream.write_u32(*lid);
            }
            NamedKind::Name(name) => {
                self.stream.write_bytes(&[1u8]); // kind = STRING
                for unit in name.encode_utf16() {
                    self.stream.write_bytes(&unit.to_le_bytes());
                }
                self.stream.write_bytes(&[0u8, 0u8]);
            }
        }
    }

    fn write_scalar(&mut self, value: &ScalarValue) -> Result<()> {
        match value {
            ScalarValue::I2(v) => self.stream.write_bytes(&(*v as u16).to_le_bytes()),
            ScalarValue::Long(v) | ScalarValue::Error(v) | ScalarValue::Object(v) => {
                self.stream.write_u32(*v)
            }
            ScalarValue::Double(v) => self.stream.write_bytes(&v.to_le_bytes()),
            ScalarValue::I8(v) => self.stream.write_bytes(&v.to_le_bytes()),
            ScalarValue::Bool(v) => {
                let wire: u16 = if *v { 1 } else { 0 };
                self.stream.write_bytes(&wire.to_le_bytes());
            }
            ScalarValue::SysTime(ft) => {
                self.stream.write_u32(ft.low);
                self.stream.write_u32(ft.high);
            }
            ScalarValue::Clsid(guid) => self.stream.write_bytes(guid.as_bytes()),
            ScalarValue::String8(s) => {
                let len = s.len() as u32 + 1;
                self.stream.write_u32(len);
                self.stream.write_bytes(s.as_bytes());
                self.stream.write_bytes(&[0u8]);
            }
            ScalarValue::Unicode(s) => {
                let units: Vec<u16> = s.encode_utf16().collect();
                let len = (units.len() as u32 + 1) * 2;
                self.stream.write_u32(len);
                for unit in &units {
                    self.stream.write_bytes(&unit.to_le_bytes());
                }
                self.stream.write_bytes(&[0u8, 0u8]);
            }
            ScalarValue::Binary(b) | ScalarValue::Svreid(b) => {
                self.stream.write_u32(b.len() as u32);
                self.stream.write_bytes(b);
            }
        }
        Ok(())
    }
}
