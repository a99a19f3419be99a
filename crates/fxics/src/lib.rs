//! Server-side core of an incremental mailbox-change synchronization
//! protocol: the sync producer, the chunked transfer state machine, and
//! the RPC dispatch surface that drives both.
//!
//! This crate never touches a disk or a wire socket. It consumes a
//! caller-implemented [`Store`] and produces/parses the FastTransfer byte
//! stream; transport and persistence are the caller's concern (§1, §6).

mod context;
mod error;
mod producer;
mod session;
mod store;

pub use context::{FtContext, SessionState, SyncContext};
pub use error::{Error, Result};
pub use producer::{produce_contents, produce_hierarchy, property_set_for, write_state_block, ProducedState};
pub use session::{
    ft_get_buffer, get_local_replica_ids, set_local_replica_midset_deleted, sync_configure,
    sync_get_buffer, sync_get_transfer_state, sync_import_deletes, sync_import_hierarchy_change,
    sync_import_message_change, sync_import_message_move, sync_import_read_state_changes,
    upload_state_begin, upload_state_continue, upload_state_end, BufferReply, ImportMessageReply,
};
pub use store::{FolderHandle, MessageHandle, ObjectRef, PropResult, Store, TableHandle, TableKind};

pub use fxics_chunk::{TransferStatus, CUTMARK_SENTINEL, WILDCARD_BUFFER_SIZE};
pub use fxics_dtyp::{
    ChangeKey, FileTime, Fmid, Guid, ReplicaDirectory, ReplicaId, SourceKey, UnixTime,
};
pub use fxics_idset::IdSet;
pub use fxics_msg::{
    tags::well_known, NamedKind, NamedPropertyInfo, PropertyTag, PropertyValue, ScalarValue,
};
pub use fxics_rpc::{DeleteKind, ErrorCode, ImportFlag, Opcode, StateProperty, SyncFlags, SyncMode};
