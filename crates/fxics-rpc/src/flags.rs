//! Request-shaped types carried by the RPC surface: sync mode, the
//! `SyncConfigure` flag set, and the small enums the importer RPCs pass
//! through (§3, §4.6, §6).

use modular_bitfield::prelude::*;

/// Which table `SyncConfigure` walks.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum SyncMode {
    Contents,
    Hierarchy,
}

/// Flags recorded on a `SyncContext` at `SyncConfigure` time (§3).
#[bitfield(bits = 16)]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct SyncFlags {
    pub unicode: bool,
    pub normal: bool,
    pub fai: bool,
    pub read_state: bool,

    pub no_foreign_identifiers: bool,
    pub best_body: bool,
    pub only_specified_properties: bool,
    pub progress: bool,

    pub request_eid: bool,
    pub request_message_size: bool,
    pub request_cn: bool,
    #[skip]
    __: B5,
}

/// Target property for `SyncUploadStateStreamBegin` (§6).
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum StateProperty {
    IdsetGiven,
    CnsetSeen,
    CnsetSeenFai,
    CnsetRead,
}

/// Whether an imported message is a normal message or an FAI item (§4.6).
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ImportFlag {
    Normal,
    Associated,
}

/// Hard vs. soft delete, as carried by `SyncImportDeletes` (§4.6, Non-goals:
/// soft-vs-hard bookkeeping beyond forwarding this flag).
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum DeleteKind {
    Hard,
    Soft,
}
