//! The sync session state machine (§4.6): dispatches each RPC against a
//! `SyncContext`/`FtContext`, advancing `SessionState` as it goes.

use fxics_chunk::{Chunker, TransferStatus};
use fxics_dtyp::fmid_from_source_key;
use fxics_idset::IdSet;
use fxics_msg::{tags::well_known::*, PropertyTag, PropertyValue, ScalarValue};
use fxics_rpc::{DeleteKind, ImportFlag, StateProperty};

use crate::context::{FtContext, SessionState, SyncContext};
use crate::error::{Error, Result};
use crate::producer::{produce_contents, produce_hierarchy, write_state_block};
use crate::store::{FolderHandle, Store};

/// `SyncImportMessageChange` reply (§6): the wire mandates `MessageId =
/// 0`, the real id being implied by the handle the caller already holds.
pub struct ImportMessageReply {
    pub message_id: u64,
}

/// Result of a `GetBuffer` call against either context kind (§4.4, §6).
pub struct BufferReply {
    pub data: Vec<u8>,
    pub total_step_count: u32,
    pub in_progress_count: u32,
    pub status: TransferStatus,
}

/// `SyncConfigure` / `SyncOpenCollector` (§6): creates a `SyncContext` in
/// the requested mode, optionally as a read-only collector.
pub fn sync_configure(
    parent_folder: FolderHandle,
    mode: fxics_rpc::SyncMode,
    flags: fxics_rpc::SyncFlags,
    properties: Vec<PropertyTag>,
    collector: bool,
) -> SyncContext {
    let mut ctx = SyncContext::new(parent_folder, mode, flags, collector);
    ctx.requested_properties = properties;
    ctx
}

/// `SyncUploadStateStreamBegin` (§6): arms state upload for one property.
/// Rejected once the stream has been generated (§4.6 "Uploading client
/// state is allowed only when no generation has started").
pub fn upload_state_begin(ctx: &mut SyncContext, property: StateProperty) -> Result<()> {
    if ctx.generation_started() {
        return Err(Error::InvalidObject);
    }
    ctx.state = SessionState::StateUploading;
    ctx.pending_upload = Some(property);
    ctx.upload_scratch.clear();
    Ok(())
}

/// `SyncUploadStateStreamContinue` (§6): appends to the scratch buffer.
pub fn upload_state_continue(ctx: &mut SyncContext, bytes: &[u8]) -> Result<()> {
    if ctx.pending_upload.is_none() {
        return Err(Error::NotInitialized);
    }
    ctx.upload_scratch.extend_from_slice(bytes);
    Ok(())
}

/// `SyncUploadStateStreamEnd` (§6): parses the scratch buffer as an
/// `IdSet` and installs it into the session. `Malformed` IdSet input is
/// fatal for this upload only — the session's prior state is left
/// untouched (§4.2, §7).
pub fn upload_state_end(ctx: &mut SyncContext) -> Result<()> {
    let property = ctx.pending_upload.ok_or(Error::NotInitialized)?;
    let mut parsed = IdSet::parse(&ctx.upload_scratch)?;

    match property {
        StateProperty::IdsetGiven => {
            ctx.idset_given = IdSet::merge(&ctx.idset_given, &parsed);
        }
        // CnsetSeen, CnsetSeenFai and CnsetRead are wire aliases of the
        // same coverage set (source: "HACK: CnsetSeen = CnsetSeenFAI =
        // CnsetRead") — all three merge into the one tracked set.
        StateProperty::CnsetSeen | StateProperty::CnsetSeenFai | StateProperty::CnsetRead => {
            parsed.mark_single();
            ctx.cnset_seen = IdSet::merge(&ctx.cnset_seen, &parsed);
        }
    }

    ctx.pending_upload = None;
    ctx.upload_scratch.clear();
    ctx.state = SessionState::StateUploaded;
    Ok(())
}

/// Builds the stream on the first `GetBuffer` call, per §3 "Streams are
/// built lazily on the first `GetBuffer` call after configure, to allow
/// uploaded client state to be merged before walking the store."
fn ensure_stream_built(ctx: &mut SyncContext, store: &dyn Store, filter_delta: bool) -> Result<()> {
    if matches!(ctx.state, SessionState::Streaming | SessionState::Done) {
        return Ok(());
    }

    ctx.state = SessionState::Producing;

    let (stream, produced) = match ctx.mode {
        fxics_rpc::SyncMode::Contents => produce_contents(
            store,
            ctx.parent_folder,
            &ctx.requested_properties,
            ctx.flags,
            &ctx.cnset_seen,
            filter_delta,
        )?,
        fxics_rpc::SyncMode::Hierarchy => {
            produce_hierarchy(store, ctx.parent_folder, &ctx.requested_properties, ctx.flags)?
        }
    };

    let new_idset_given = produced.eid_acc.to_idset();
    let new_cnset_seen = produced.cn_acc.to_idset();

    ctx.idset_given = IdSet::merge(&ctx.idset_given, &new_idset_given);
    ctx.cnset_seen = IdSet::merge(&ctx.cnset_seen, &new_cnset_seen);

    let (buf, cutmarks) = write_state_block(
        stream,
        &ctx.idset_given,
        &ctx.cnset_seen,
        ctx.flags.fai(),
        ctx.flags.read_state(),
    );

    ctx.stream = buf;
    ctx.cutmarks = cutmarks;
    ctx.state = SessionState::Streaming;
    Ok(())
}

/// `FastTransferSourceGetBuffer` against a `SyncContext` (§4.4, §4.6).
/// On a store failure mid-walk, the partial stream is discarded and this
/// call (and only this call) returns `InvalidObject` (§5 "Failure
/// mid-stream"); the session otherwise remains usable.
pub fn sync_get_buffer(
    ctx: &mut SyncContext,
    store: &dyn Store,
    requested_size: u32,
    max_allowed: u32,
    filter_delta: bool,
) -> Result<BufferReply> {
    if let Err(e) = ensure_stream_built(ctx, store, filter_delta) {
        ctx.stream.clear();
        ctx.cutmarks.clear();
        log::warn!("fxics: store failed while producing stream: {e}");
        return Err(Error::InvalidObject);
    }

    let mut chunker = Chunker::from_state(&ctx.stream, &ctx.cutmarks, ctx.chunk_state);
    let chunk = chunker.get_buffer(requested_size, max_allowed);
    ctx.chunk_state = chunker.state();
    if chunk.status == TransferStatus::Done {
        ctx.state = SessionState::Done;
    }

    Ok(BufferReply {
        data: chunk.data,
        total_step_count: chunk.total_step_count,
        in_progress_count: chunk.in_progress_count,
        status: chunk.status,
    })
}

/// `FastTransferSourceGetBuffer` against an `FtContext` (§4.4, §6): the
/// stream is already built, so this is pure chunking.
pub fn ft_get_buffer(ctx: &mut FtContext, requested_size: u32, max_allowed: u32) -> BufferReply {
    let mut chunker = Chunker::from_state(&ctx.stream, &ctx.cutmarks, ctx.chunk_state);
    let chunk = chunker.get_buffer(requested_size, max_allowed);
    ctx.chunk_state = chunker.state();
    BufferReply {
        data: chunk.data,
        total_step_count: chunk.total_step_count,
        in_progress_count: chunk.in_progress_count,
        status: chunk.status,
    }
}

/// `SyncGetTransferState` (§6): wraps the session's current state block
/// (re-derived fresh, not the in-progress produced stream) as a
/// one-shot `FtContext`.
pub fn sync_get_transfer_state(ctx: &SyncContext) -> FtContext {
    let (buf, cutmarks) = write_state_block(
        fxics_msg::CutmarkStream::new(),
        &ctx.idset_given,
        &ctx.cnset_seen,
        ctx.flags.fai(),
        ctx.flags.read_state(),
    );
    FtContext::new(buf, cutmarks)
}

/// `SyncImportMessageChange` (§4.6, §6): resolves the FMID from
/// `PR_SOURCE_KEY` (values[0]), opens the message if it exists, else
/// creates it with the `Associated` flag mapped from `import_flag`.
pub fn sync_import_message_change(
    ctx: &SyncContext,
    store: &dyn Store,
    values: &[(PropertyTag, PropertyValue)],
    import_flag: ImportFlag,
) -> Result<ImportMessageReply> {
    let source_key = values
        .iter()
        .find(|(t, _)| *t == PR_SOURCE_KEY)
        .and_then(|(_, v)| match v {
            PropertyValue::Scalar(ScalarValue::Binary(b)) => Some(b.as_slice()),
            _ => None,
        })
        .ok_or_else(|| Error::InvalidParameter("missing PR_SOURCE_KEY".into()))?;

    let fmid = fmid_from_source_key(source_key, store)?;
    let assoc = matches!(import_flag, ImportFlag::Associated);

    match store.open_message(ctx.parent_folder, fmid.0) {
        Ok(_) => {}
        Err(_) => {
            store.create_message(ctx.parent_folder, fmid.0, assoc)?;
        }
    }

    Ok(ImportMessageReply { message_id: 0 })
}

/// `SyncImportHierarchyChange` (§4.6, §6): `values[0]` is the parent
/// source key, `values[1]` the folder's own source key; the remaining
/// values are set on the opened-or-created folder.
pub fn sync_import_hierarchy_change(
    ctx: &SyncContext,
    store: &dyn Store,
    values: &[(PropertyTag, PropertyValue)],
) -> Result<()> {
    if values.len() < 2 {
        return Err(Error::InvalidParameter(
            "hierarchy change requires parent and folder source keys".into(),
        ));
    }
    let folder_source_key = match &values[1].1 {
        PropertyValue::Scalar(ScalarValue::Binary(b)) => b.as_slice(),
        _ => {
            return Err(Error::InvalidParameter(
                "hierarchy values[1] must be a binary source key".into(),
            ))
        }
    };
    let fmid = fmid_from_source_key(folder_source_key, store)?;

    let rest: Vec<(PropertyTag, PropertyValue)> = values[2..].to_vec();
    match store.open_folder(ctx.parent_folder, fmid.0) {
        Ok(_) => {}
        Err(_) => {
            store.create_folder(ctx.parent_folder, fmid.0, &rest)?;
        }
    }
    Ok(())
}

/// `SyncImportDeletes` (§4.6, §6): hierarchy deletes are not supported.
pub fn sync_import_deletes(
    ctx: &SyncContext,
    store: &dyn Store,
    source_keys: &[Vec<u8>],
    kind: DeleteKind,
    is_hierarchy: bool,
) -> Result<()> {
    if is_hierarchy {
        return Err(Error::InvalidObject);
    }
    for sk in source_keys {
        let fmid = fmid_from_source_key(sk, store)?;
        store.delete_message(ctx.parent_folder, fmid.0, kind)?;
    }
    Ok(())
}

/// `GetLocalReplicaIds` (§4.6, §6): reserves `count` globcnt values and
/// returns the replica GUID for local replica-id 1 and the first
/// reserved globcnt.
pub fn get_local_replica_ids(store: &dyn Store, count: u32) -> Result<(fxics_dtyp::Guid, u64)> {
    let start = store.reserve_fmid_range(count)?;
    let guid = store.replid_to_guid(1).ok_or(Error::NotFound)?;
    Ok((guid, start))
}

/// `SyncImportMessageMove` (§4.6, §6): preserved stub — the source
/// returns success with `MessageId = 0` without acting on the move.
pub fn sync_import_message_move() -> ImportMessageReply {
    ImportMessageReply { message_id: 0 }
}

/// `SyncImportReadStateChanges` (§4.6, §6): preserved stub success.
pub fn sync_import_read_state_changes() -> Result<()> {
    Ok(())
}

/// `SetLocalReplicaMidsetDeleted` (§6): preserved stub success.
pub fn set_local_replica_midset_deleted() -> Result<()> {
    Ok(())
}
