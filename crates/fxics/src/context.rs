//! `SyncContext` and `FtContext`: the per-handle session objects the RPC
//! surface mutates (§3).

use fxics_chunk::ChunkerState;
use fxics_idset::IdSet;
use fxics_msg::PropertyTag;
use fxics_rpc::{StateProperty, SyncFlags, SyncMode};

use crate::store::FolderHandle;

/// Which step of §4.6's state machine a `SyncContext` occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Fresh,
    Configured,
    StateUploading,
    StateUploaded,
    Producing,
    Streaming,
    Done,
}

/// A sync session: created by `SyncConfigure`/`SyncOpenCollector`, torn
/// down on handle release (§3, §4.6).
pub struct SyncContext {
    pub state: SessionState,
    pub parent_folder: FolderHandle,
    pub mode: SyncMode,
    pub flags: SyncFlags,
    pub collector: bool,

    /// Caller-supplied property set (interpreted per the exclusion rules,
    /// §4.5).
    pub requested_properties: Vec<PropertyTag>,

    /// Client-uploaded state, installed by `SyncUploadStateStreamEnd`
    /// (§4.2, §4.6). `PidTagCnsetSeenFAI` and `PidTagCnsetRead` are wire
    /// aliases of the same coverage set as `PidTagCnsetSeen` ("HACK:
    /// CnsetSeen = CnsetSeenFAI = CnsetRead" upstream) — all three upload
    /// targets merge into this one field.
    pub idset_given: IdSet,
    pub cnset_seen: IdSet,

    /// Produced once the stream is built, on the first `GetBuffer` call
    /// (§3 "Streams are built lazily").
    pub stream: Vec<u8>,
    pub cutmarks: Vec<u32>,
    pub chunk_state: ChunkerState,

    /// Armed by `SyncUploadStateStreamBegin`, filled by `…Continue`,
    /// consumed by `…End` (§4.6).
    pub pending_upload: Option<StateProperty>,
    pub upload_scratch: Vec<u8>,
}

impl SyncContext {
    pub fn new(parent_folder: FolderHandle, mode: SyncMode, flags: SyncFlags, collector: bool) -> Self {
        SyncContext {
            state: SessionState::Configured,
            parent_folder,
            mode,
            flags,
            collector,
            requested_properties: Vec::new(),
            idset_given: IdSet::empty(),
            cnset_seen: IdSet::empty(),
            stream: Vec::new(),
            cutmarks: Vec::new(),
            chunk_state: ChunkerState::default(),
            pending_upload: None,
            upload_scratch: Vec::new(),
        }
    }

    /// Once `GetBuffer` is first called the stream is frozen: further
    /// state uploads are rejected (§4.6 "Uploading client state is
    /// allowed only when no generation has started").
    pub fn generation_started(&self) -> bool {
        matches!(
            self.state,
            SessionState::Producing | SessionState::Streaming | SessionState::Done
        )
    }
}

/// A one-shot `FastTransferSourceCopyTo` session: a prebuilt stream and
/// cut-marks with no hierarchy walk (§3).
pub struct FtContext {
    pub stream: Vec<u8>,
    pub cutmarks: Vec<u32>,
    pub chunk_state: ChunkerState,
}

impl FtContext {
    pub fn new(stream: Vec<u8>, cutmarks: Vec<u32>) -> Self {
        FtContext {
            stream,
            cutmarks,
            chunk_state: ChunkerState::default(),
        }
    }
}
