//! Common wire types for the FastTransfer / ICS core: GUIDs, FILETIME, and
//! the FMID ↔ SourceKey/ChangeKey codec (§4.1).

pub mod binrw_util;
mod change_number;
mod error;
mod filetime;
mod fmid;
mod guid;
mod predecessor;

pub use change_number::{change_number_for, clamp_to_epoch, globcnt, EPOCH};
pub use error::{DtypError, Result};
pub use filetime::{FileTime, UnixTime};
pub use fmid::{
    fmid_from_source_key, make_gid, make_xid, source_key_from_fmid, ChangeKey, Fmid,
    ReplicaDirectory, ReplicaId, SourceKey, SOURCE_KEY_LEN,
};
pub use fmid::change_key_from_cn;
pub use guid::Guid;
pub use predecessor::single_element_predecessor_change_list;
