//! The tagged property vocabulary and the cut-mark-emitting serializer
//! that turns it into bytes (§4.3).

mod error;
pub mod tags;
mod value;
mod writer;

pub use error::{MsgError, Result};
pub use tags::{ptype, well_known, NamedKind, NamedPropertyInfo, PropertyTag};
pub use value::{PropertyValue, ScalarValue};
pub use writer::{CutmarkStream, PropertyWriter, CUTMARK_SENTINEL};
