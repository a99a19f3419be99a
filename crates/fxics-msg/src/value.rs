//! Property values (§4.3). One scalar variant per wire type, plus a
//! multi-valued wrapper for tags carrying [`crate::tags::ptype::MV_FLAG`].

use fxics_dtyp::{FileTime, Guid};

#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    I2(i16),
    Long(u32),
    Error(u32),
    Object(u32),
    Double(f64),
    I8(u64),
    Bool(bool),
    SysTime(FileTime),
    Clsid(Guid),
    String8(String),
    Unicode(String),
    Binary(Vec<u8>),
    Svreid(Vec<u8>),
}

impl ScalarValue {
    /// The base (non-multivalue) type code this variant encodes as.
    pub fn type_code(&self) -> u16 {
        use crate::tags::ptype::*;
        match self {
            ScalarValue::I2(_) => I2,
            ScalarValue::Long(_) => LONG,
            ScalarValue::Error(_) => ERROR,
            ScalarValue::Object(_) => OBJECT,
            ScalarValue::Double(_) => DOUBLE,
            ScalarValue::I8(_) => I8,
            ScalarValue::Bool(_) => BOOLEAN,
            ScalarValue::SysTime(_) => SYSTIME,
            ScalarValue::Clsid(_) => CLSID,
            ScalarValue::String8(_) => STRING8,
            ScalarValue::Unicode(_) => UNICODE,
            ScalarValue::Binary(_) => BINARY,
            ScalarValue::Svreid(_) => SVREID,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Scalar(ScalarValue),
    MultiValue(Vec<ScalarValue>),
}

impl PropertyValue {
    pub fn type_code(&self) -> u16 {
        match self {
            PropertyValue::Scalar(s) => s.type_code(),
            PropertyValue::MultiValue(items) => {
                let base = items.first().map(|s| s.type_code()).unwrap_or(0);
                base | crate::tags::ptype::MV_FLAG
            }
        }
    }
}

impl From<ScalarValue> for PropertyValue {
    fn from(s: ScalarValue) -> Self {
        PropertyValue::Scalar(s)
    }
}
