use thiserror::Error;

use crate::tags::PropertyTag;

/// Serialization failures (§4.3, §7). These are programmer errors — a tag
/// whose type code doesn't match the value handed to the writer — not
/// data errors; the design notes call for refusing to serialize rather
/// than guessing.
#[derive(Debug, Error, PartialEq)]
pub enum MsgError {
    #[error("property {tag:#010x} declares type {declared:#06x} but was given a {actual:#06x} value")]
    TypeMismatch {
        tag: u32,
        declared: u16,
        actual: u16,
    },

    #[error("a multi-valued property was given zero elements, so its type cannot be determined: {0:#010x}")]
    EmptyMultiValue(u32),

    #[error("named property {0:#010x} was pushed without its resolved NamedPropertyInfo")]
    MissingNamedInfo(u32),
}

impl MsgError {
    pub fn type_mismatch(tag: PropertyTag, actual: u16) -> Self {
        MsgError::TypeMismatch {
            tag: tag.0,
            declared: tag.type_code(),
            actual,
        }
    }
}

pub type Result<T> = std::result::Result<T, MsgError>;
