//! Small binrw helpers shared by the higher crates.

mod pos_marker;
mod wide_string;

pub mod prelude {
    pub use super::pos_marker::PosMarker;
    pub use super::wide_string::NulWideString;
}
