//! The sync producer (§4.5): walks a folder's message table or its child
//! folders, emitting the `contentsSync`/`hierarchySync` wire grammar, and
//! appends the post-sync state block.

use fxics_dtyp::{
    change_key_from_cn, change_number_for, clamp_to_epoch, single_element_predecessor_change_list,
    source_key_from_fmid, FileTime, Fmid, UnixTime,
};
use fxics_idset::{IdSet, RawIdSet};
use fxics_msg::tags::well_known::*;
use fxics_msg::{CutmarkStream, NamedPropertyInfo, PropertyTag, PropertyValue, PropertyWriter, ScalarValue};
use fxics_rpc::SyncFlags;

use crate::error::{Error, Result};
use crate::store::{FolderHandle, ObjectRef, PropResult, Store, TableKind};

/// Header tags the producer always computes itself; never valid in a
/// caller-supplied property set, and never re-derived from the
/// caller-chosen body set (§4.5 "Exclusion rules").
const FIXED_HEADER: &[PropertyTag] = &[
    PR_CHANGE_KEY,
    PR_LAST_MODIFICATION_TIME,
    PR_DISPLAY_NAME_UNICODE,
];

/// Computes the property set the body of each change record reports,
/// applying §4.5's exclusion rules:
///
/// - Start from the store's available tags (or, if
///   `OnlySpecifiedProperties` is set, from the caller-supplied tags
///   directly).
/// - Drop the fixed header set and the hard-excluded structural tags.
/// - `OnlySpecifiedProperties` set: keep only the caller-supplied tags
///   that survive exclusion. Otherwise: keep every available tag except
///   the caller-supplied ones (an exclude list) and the fixed/hard sets.
/// - `BestBody` re-includes `PR_BODY_HTML`/`PR_BODY_UNICODE` regardless.
pub fn property_set_for(
    available: &[PropertyTag],
    requested: &[PropertyTag],
    flags: SyncFlags,
) -> Vec<PropertyTag> {
    let is_excluded = |tag: &PropertyTag| {
        FIXED_HEADER.contains(tag) || HARD_EXCLUDED.contains(tag)
    };

    let mut set: Vec<PropertyTag> = if flags.only_specified_properties() {
        requested.iter().copied().filter(|t| !is_excluded(t)).collect()
    } else {
        available
            .iter()
            .copied()
            .filter(|t| !is_excluded(t) && !requested.contains(t))
            .collect()
    };

    if flags.best_body() {
        for tag in [PR_BODY_HTML, PR_BODY_UNICODE] {
            if !set.contains(&tag) {
                set.push(tag);
            }
        }
    }

    set
}

fn find_by_id(row: &[(PropertyTag, PropResult)], id: u16) -> Option<&PropertyValue> {
    row.iter().find_map(|(tag, result)| {
        if tag.id() == id {
            match result {
                PropResult::Found(v) => Some(v),
                PropResult::NotFound => None,
            }
        } else {
            None
        }
    })
}

fn as_u64(value: &PropertyValue) -> Option<u64> {
    match value {
        PropertyValue::Scalar(ScalarValue::I8(v)) => Some(*v),
        _ => None,
    }
}

fn as_bool(value: &PropertyValue) -> Option<bool> {
    match value {
        PropertyValue::Scalar(ScalarValue::Bool(v)) => Some(*v),
        _ => None,
    }
}

fn as_unix_time(value: &PropertyValue) -> Option<UnixTime> {
    match value {
        PropertyValue::Scalar(ScalarValue::SysTime(ft)) => Some(ft.to_unix_time()),
        _ => None,
    }
}

fn resolve_named(tag: PropertyTag, store: &dyn Store) -> Result<Option<NamedPropertyInfo>> {
    if tag.is_named() {
        Ok(Some(store.namedprops_lookup(tag.id() as u32)?))
    } else {
        Ok(None)
    }
}

/// Accumulated results of one producer run, to be merged into the
/// session's persistent IdSets after the state block is written (§4.5
/// "Merged sets are `merge(existing_session_state, new_accumulator)`").
#[derive(Default)]
pub struct ProducedState {
    pub eid_acc: RawIdSet,
    pub cn_acc: RawIdSet,
}

/// Writes one message's header + body + recipients + attachments onto
/// `stream` (§4.5 "Contents mode"). Returns `Ok(false)` when the row was
/// skipped as a dedupe against `cnset_seen` (§4.5, §8 I6).
#[allow(clippy::too_many_arguments)]
fn emit_message_change(
    stream: &mut CutmarkStream,
    store: &dyn Store,
    folder: FolderHandle,
    row: &[(PropertyTag, PropResult)],
    property_set: &[PropertyTag],
    flags: SyncFlags,
    cnset_seen: &IdSet,
    filter_delta: bool,
    produced: &mut ProducedState,
) -> Result<bool> {
    let raw_mid = find_by_id(row, PR_MID.id())
        .and_then(as_u64)
        .ok_or_else(|| Error::InvalidParameter("message row missing PR_MID".into()))?;
    let fmid = Fmid(raw_mid);
    let replica_guid = store
        .replid_to_guid(fmid.replica_id())
        .ok_or(Error::NotFound)?;

    let last_mod = find_by_id(row, PR_LAST_MODIFICATION_TIME.id())
        .and_then(as_unix_time)
        .unwrap_or(UnixTime(0));
    let cn = change_number_for(fmid, last_mod);

    produced.eid_acc.push(replica_guid, fmid.global_counter());

    if filter_delta && cnset_seen.includes(&replica_guid, cn) {
        return Ok(false);
    }
    produced.cn_acc.push(replica_guid, cn);

    let associated = find_by_id(row, PR_ASSOCIATED.id())
        .and_then(as_bool)
        .unwrap_or(false);

    let source_key = source_key_from_fmid(fmid, store)?;
    let change_key = change_key_from_cn(replica_guid, cn);
    let predecessor = single_element_predecessor_change_list(&change_key);

    stream.write_marker(PR_INCR_SYNC_CHG);
    {
        let mut w = PropertyWriter::new(stream);
        w.push(
            PR_SOURCE_KEY,
            None,
            &PropertyValue::Scalar(ScalarValue::Binary(source_key.0.to_vec())),
        )?;
        w.push(
            PR_LAST_MODIFICATION_TIME,
            None,
            &PropertyValue::Scalar(ScalarValue::SysTime(FileTime::from_unix_time(
                clamp_to_epoch(last_mod),
            ))),
        )?;
        w.push(
            PR_CHANGE_KEY,
            None,
            &PropertyValue::Scalar(ScalarValue::Binary(change_key.0.to_vec())),
        )?;
        w.push(
            PR_PREDECESSOR_CHANGE_LIST,
            None,
            &PropertyValue::Scalar(ScalarValue::Binary(predecessor)),
        )?;
        w.push(
            PR_ASSOCIATED,
            None,
            &PropertyValue::Scalar(ScalarValue::Bool(associated)),
        )?;
        if flags.request_eid() {
            w.push(
                PR_MID,
                None,
                &PropertyValue::Scalar(ScalarValue::I8(fmid.0)),
            )?;
        }
        if flags.request_message_size() {
            let size = find_by_id(row, PR_MESSAGE_SIZE.id())
                .and_then(|v| match v {
                    PropertyValue::Scalar(ScalarValue::Long(n)) => Some(*n),
                    _ => None,
                })
                .unwrap_or(0);
            w.push(
                PR_MESSAGE_SIZE,
                None,
                &PropertyValue::Scalar(ScalarValue::Long(size)),
            )?;
        }
        if flags.request_cn() {
            let change_num = (cn << 16) | fmid.replica_id() as u64;
            w.push(
                PR_CHANGE_NUM,
                None,
                &PropertyValue::Scalar(ScalarValue::I8(change_num)),
            )?;
        }
    }

    stream.write_marker(PR_INCR_SYNC_MSG);
    {
        let mut w = PropertyWriter::new(stream);
        for tag in property_set {
            if let Some(value) = find_by_id(row, tag.id()) {
                let named = resolve_named(*tag, store)?;
                w.push(*tag, named.as_ref(), value)?;
            }
        }
    }

    let mid = store.open_message(folder, fmid.0)?;
    emit_recipients(stream, store, mid)?;
    emit_attachments(stream, store, mid)?;

    Ok(true)
}

fn emit_recipients(stream: &mut CutmarkStream, store: &dyn Store, mid: crate::store::MessageHandle) -> Result<()> {
    let table = store.open_table(ObjectRef::Message(mid), TableKind::Recipients)?;
    let count = store.table_row_count(table)?;
    if count == 0 {
        return Ok(());
    }
    stream.write_marker(PR_FX_DEL_PROP);
    stream.write_u32(PR_MESSAGE_RECIPIENTS.0);
    for i in 0..count {
        let row = store.table_get_row(table, i)?;
        stream.write_marker(PR_START_RECIP);
        let mut w = PropertyWriter::new(stream);
        for (tag, result) in &row {
            if let PropResult::Found(value) = result {
                let named = resolve_named(*tag, store)?;
                w.push(*tag, named.as_ref(), value)?;
            }
        }
        drop(w);
        stream.write_marker(PR_END_RECIP);
    }
    Ok(())
}

fn emit_attachments(stream: &mut CutmarkStream, store: &dyn Store, mid: crate::store::MessageHandle) -> Result<()> {
    let table = store.open_table(ObjectRef::Message(mid), TableKind::Attachments)?;
    let count = store.table_row_count(table)?;
    if count == 0 {
        return Ok(());
    }
    stream.write_marker(PR_FX_DEL_PROP);
    stream.write_u32(PR_MESSAGE_ATTACHMENTS.0);
    for i in 0..count {
        let row = store.table_get_row(table, i)?;
        stream.write_marker(PR_NEW_ATTACH);
        {
            let mut w = PropertyWriter::new(stream);
            w.push(
                PR_ATTACH_NUM,
                None,
                &PropertyValue::Scalar(ScalarValue::Long(i as u32)),
            )?;
            for (tag, result) in &row {
                if let PropResult::Found(value) = result {
                    let named = resolve_named(*tag, store)?;
                    w.push(*tag, named.as_ref(), value)?;
                }
            }
        }
        stream.write_marker(PR_END_ATTACH);
    }
    Ok(())
}

/// Runs the contents-mode producer over `folder`'s message table,
/// returning the finished stream, its cut-marks, and the accumulated
/// IDs to merge into session state (§4.5).
///
/// `filter_delta` selects whether rows already covered by
/// `cnset_seen` are skipped (see SPEC_FULL.md §9/§10 on the
/// configurable-delta-filtering open question).
pub fn produce_contents(
    store: &dyn Store,
    folder: FolderHandle,
    requested: &[PropertyTag],
    flags: SyncFlags,
    cnset_seen: &IdSet,
    filter_delta: bool,
) -> Result<(CutmarkStream, ProducedState)> {
    let available = store.get_available_properties(ObjectRef::Folder(folder))?;
    let property_set = property_set_for(&available, requested, flags);

    let table = store.open_table(ObjectRef::Folder(folder), TableKind::Messages)?;
    let mut columns = vec![
        PR_MID,
        PR_LAST_MODIFICATION_TIME,
        PR_ASSOCIATED,
        PR_MESSAGE_SIZE,
    ];
    columns.extend(property_set.iter().copied());
    store.table_set_columns(table, &columns)?;

    let row_count = store.table_row_count(table)?;
    let mut stream = CutmarkStream::new();
    let mut produced = ProducedState::default();

    for i in 0..row_count {
        let row = store.table_get_row(table, i)?;
        emit_message_change(
            &mut stream,
            store,
            folder,
            &row,
            &property_set,
            flags,
            cnset_seen,
            filter_delta,
            &mut produced,
        )?;
    }

    Ok((stream, produced))
}

/// Runs the hierarchy-mode producer, depth-first, over `folder` and its
/// descendant folders (§4.5 "Hierarchy mode"). Uses an explicit stack of
/// `(folder, child_index)` frames rather than native recursion, to bound
/// memory on deep trees (§9 "Recursive hierarchy walk").
pub fn produce_hierarchy(
    store: &dyn Store,
    root: FolderHandle,
    requested: &[PropertyTag],
    flags: SyncFlags,
) -> Result<(CutmarkStream, ProducedState)> {
    let available = store.get_available_properties(ObjectRef::Folder(root))?;
    let property_set = property_set_for(&available, requested, flags);

    let mut stream = CutmarkStream::new();
    let mut produced = ProducedState::default();

    emit_folder_change(&mut stream, store, root, None, &property_set, flags, &mut produced)?;

    let children_table = store.open_table(ObjectRef::Folder(root), TableKind::ChildFolders)?;
    store.table_set_columns(children_table, &[PR_FID])?;
    let mut stack: Vec<TableHandleCursor> = vec![TableHandleCursor {
        table: children_table,
        parent: root,
        next: 0,
    }];

    while let Some(frame) = stack.last().copied() {
        let count = store.table_row_count(frame.table)?;
        if frame.next >= count {
            stack.pop();
            continue;
        }
        stack.last_mut().unwrap().next += 1;

        let row = store.table_get_row(frame.table, frame.next)?;
        let fid = find_by_id(&row, PR_FID.id())
            .and_then(as_u64)
            .ok_or_else(|| Error::InvalidParameter("child folder row missing PR_FID".into()))?;
        let child = store.open_folder(frame.parent, fid)?;
        emit_folder_change(
            &mut stream,
            store,
            child,
            Some(frame.parent),
            &property_set,
            flags,
            &mut produced,
        )?;

        let grandchildren = store.open_table(ObjectRef::Folder(child), TableKind::ChildFolders)?;
        store.table_set_columns(grandchildren, &[PR_FID])?;
        stack.push(TableHandleCursor {
            table: grandchildren,
            parent: child,
            next: 0,
        });
    }

    Ok((stream, produced))
}

#[derive(Clone, Copy)]
struct TableHandleCursor {
    table: crate::store::TableHandle,
    parent: FolderHandle,
    next: usize,
}

fn emit_folder_change(
    stream: &mut CutmarkStream,
    store: &dyn Store,
    folder: FolderHandle,
    parent: Option<FolderHandle>,
    property_set: &[PropertyTag],
    flags: SyncFlags,
    produced: &mut ProducedState,
) -> Result<()> {
    let props = store.get_properties(
        ObjectRef::Folder(folder),
        &[PR_FID, PR_PARENT_FID, PR_LAST_MODIFICATION_TIME, PR_DISPLAY_NAME_UNICODE],
    )?;

    let fid = props
        .iter()
        .find_map(|(t, r)| (*t == PR_FID).then_some(r))
        .and_then(|r| match r {
            PropResult::Found(v) => as_u64(v),
            PropResult::NotFound => None,
        })
        .ok_or_else(|| Error::InvalidParameter("folder missing PR_FID".into()))?;
    let fmid = Fmid(fid);
    let replica_guid = store
        .replid_to_guid(fmid.replica_id())
        .ok_or(Error::NotFound)?;

    let last_mod = props
        .iter()
        .find_map(|(t, r)| (*t == PR_LAST_MODIFICATION_TIME).then_some(r))
        .and_then(|r| match r {
            PropResult::Found(v) => as_unix_time(v),
            PropResult::NotFound => None,
        })
        .unwrap_or(UnixTime(0));
    let cn = change_number_for(fmid, last_mod);
    produced.eid_acc.push(replica_guid, fmid.global_counter());
    produced.cn_acc.push(replica_guid, cn);

    let display_name = props
        .iter()
        .find_map(|(t, r)| (*t == PR_DISPLAY_NAME_UNICODE).then_some(r))
        .and_then(|r| match r {
            PropResult::Found(PropertyValue::Scalar(ScalarValue::Unicode(s))) => Some(s.clone()),
            _ => None,
        })
        .unwrap_or_default();

    let source_key = source_key_from_fmid(fmid, store)?;
    let parent_source_key: Vec<u8> = match parent {
        Some(p) => parent_source_key_bytes(store, p)?,
        None => Vec::new(),
    };
    let change_key = change_key_from_cn(replica_guid, cn);
    let predecessor = single_element_predecessor_change_list(&change_key);

    stream.write_marker(PR_INCR_SYNC_CHG);
    let mut w = PropertyWriter::new(stream);
    w.push(
        PR_PARENT_SOURCE_KEY,
        None,
        &PropertyValue::Scalar(ScalarValue::Binary(parent_source_key)),
    )?;
    w.push(
        PR_SOURCE_KEY,
        None,
        &PropertyValue::Scalar(ScalarValue::Binary(source_key.0.to_vec())),
    )?;
    w.push(
        PR_LAST_MODIFICATION_TIME,
        None,
        &PropertyValue::Scalar(ScalarValue::SysTime(FileTime::from_unix_time(
            clamp_to_epoch(last_mod),
        ))),
    )?;
    w.push(
        PR_CHANGE_KEY,
        None,
        &PropertyValue::Scalar(ScalarValue::Binary(change_key.0.to_vec())),
    )?;
    w.push(
        PR_PREDECESSOR_CHANGE_LIST,
        None,
        &PropertyValue::Scalar(ScalarValue::Binary(predecessor)),
    )?;
    w.push(
        PR_DISPLAY_NAME_UNICODE,
        None,
        &PropertyValue::Scalar(ScalarValue::Unicode(display_name)),
    )?;
    if flags.request_eid() {
        w.push(PR_FID, None, &PropertyValue::Scalar(ScalarValue::I8(fmid.0)))?;
        if let Some(p) = parent {
            let parent_props = store.get_properties(ObjectRef::Folder(p), &[PR_FID])?;
            if let Some(parent_fid) = parent_props
                .iter()
                .find_map(|(t, r)| (*t == PR_FID).then_some(r))
                .and_then(|r| match r {
                    PropResult::Found(v) => as_u64(v),
                    PropResult::NotFound => None,
                })
            {
                w.push(
                    PR_PARENT_FID,
                    None,
                    &PropertyValue::Scalar(ScalarValue::I8(parent_fid)),
                )?;
            }
        }
    }
    drop(w);

    for tag in property_set {
        let values = store.get_properties(ObjectRef::Folder(folder), std::slice::from_ref(tag))?;
        if let Some((_, PropResult::Found(value))) = values.first() {
            let named = resolve_named(*tag, store)?;
            let mut w = PropertyWriter::new(stream);
            w.push(*tag, named.as_ref(), value)?;
        }
    }

    Ok(())
}

fn parent_source_key_bytes(store: &dyn Store, parent: FolderHandle) -> Result<Vec<u8>> {
    let props = store.get_properties(ObjectRef::Folder(parent), &[PR_FID])?;
    let fid = props
        .iter()
        .find_map(|(t, r)| (*t == PR_FID).then_some(r))
        .and_then(|r| match r {
            PropResult::Found(v) => as_u64(v),
            PropResult::NotFound => None,
        })
        .ok_or(Error::NotFound)?;
    let fmid = Fmid(fid);
    let sk = source_key_from_fmid(fmid, store)?;
    Ok(sk.0.to_vec())
}

/// Appends the post-sync state block (§4.5 "State block") and terminates
/// the cut-marks sidecar. `PidTagCnsetSeenFAI`/`PidTagCnsetRead` re-emit
/// the same serialized bytes as `PidTagCnsetSeen` — they are wire aliases
/// of one coverage set, not independently tracked state.
pub fn write_state_block(
    stream: CutmarkStream,
    idset_given: &IdSet,
    cnset_seen: &IdSet,
    fai: bool,
    read_state: bool,
) -> (Vec<u8>, Vec<u32>) {
    let (mut buf, mut cutmarks) = stream.finish();
    cutmarks.pop(); // remove sentinel; more markers follow before it's re-appended

    let mut append_marker = |buf: &mut Vec<u8>, cutmarks: &mut Vec<u32>, tag: PropertyTag| {
        cutmarks.push(buf.len() as u32);
        buf.extend_from_slice(&tag.0.to_le_bytes());
    };
    let mut append_blob = |buf: &mut Vec<u8>, bytes: &[u8]| {
        buf.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
        buf.extend_from_slice(bytes);
    };

    append_marker(&mut buf, &mut cutmarks, PR_INCR_SYNC_STATE_BEGIN);

    append_marker(&mut buf, &mut cutmarks, PID_TAG_CNSET_SEEN);
    let cnset_bytes = cnset_seen.serialize();
    append_blob(&mut buf, &cnset_bytes);

    if fai {
        append_marker(&mut buf, &mut cutmarks, PID_TAG_CNSET_SEEN_FAI);
        append_blob(&mut buf, &cnset_bytes);
    }

    append_marker(&mut buf, &mut cutmarks, PID_TAG_IDSET_GIVEN);
    append_blob(&mut buf, &idset_given.serialize());

    if read_state {
        append_marker(&mut buf, &mut cutmarks, PID_TAG_CNSET_READ);
        append_blob(&mut buf, &cnset_bytes);
    }

    append_marker(&mut buf, &mut cutmarks, PR_INCR_SYNC_STATE_END);
    append_marker(&mut buf, &mut cutmarks, PR_INCR_SYNC_END);

    cutmarks.push(fxics_msg::CUTMARK_SENTINEL);
    (buf, cutmarks)
}
