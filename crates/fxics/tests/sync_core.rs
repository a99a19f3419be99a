//! End-to-end scenarios driven through the public session API against an
//! in-memory store, covering the invariants and scenarios a fresh/delta
//! sync session must satisfy.

mod common;

use common::TestStore;
use fxics::well_known::*;
use fxics::{
    DeleteKind, IdSet, ImportFlag, PropertyValue, ScalarValue, StateProperty, SyncFlags, SyncMode,
    TransferStatus,
};

fn drain(ctx: &mut fxics::SyncContext, store: &TestStore) -> (Vec<u8>, u32) {
    let mut all = Vec::new();
    let mut calls = 0;
    loop {
        let reply = fxics::sync_get_buffer(ctx, store, 0x8000, 0x8000, true).unwrap();
        all.extend_from_slice(&reply.data);
        calls += 1;
        if reply.status == TransferStatus::Done {
            break;
        }
    }
    (all, calls)
}

/// S1: fresh contents sync of an empty folder produces a single chunk and
/// leaves `idset_given`/`cnset_seen` empty.
#[test]
fn fresh_contents_sync_of_empty_folder_is_a_single_chunk() {
    let store = TestStore::empty();
    let mut ctx = fxics::sync_configure(
        store.root(),
        SyncMode::Contents,
        SyncFlags::new(),
        Vec::new(),
        false,
    );

    let (stream, calls) = drain(&mut ctx, &store);
    assert_eq!(calls, 1);
    assert!(!stream.is_empty());
    assert!(ctx.idset_given.is_empty());
    assert!(ctx.cnset_seen.is_empty());
}

/// S2-equivalent: fresh hierarchy sync over a folder with one child walks
/// it and produces a non-empty stream with the child folded into
/// `idset_given`.
#[test]
fn fresh_hierarchy_sync_covers_child_folders() {
    let store = TestStore::empty();
    store.add_folder(store.root(), "INBOX", 1);

    let mut ctx = fxics::sync_configure(
        store.root(),
        SyncMode::Hierarchy,
        SyncFlags::new(),
        Vec::new(),
        false,
    );

    let (stream, _) = drain(&mut ctx, &store);
    assert!(!stream.is_empty());
    assert!(ctx.idset_given.includes(&store.replica_guid(), 2));

    // PR_DISPLAY_NAME_UNICODE is part of the fixed header every folder
    // record carries; it must not also appear in the body property set.
    let needle = PR_DISPLAY_NAME_UNICODE.0.to_le_bytes();
    let occurrences = stream
        .windows(needle.len())
        .filter(|w| *w == needle)
        .count();
    assert_eq!(occurrences, 1, "PR_DISPLAY_NAME_UNICODE must appear exactly once per folder record");
}

/// I7: for a fresh sync over a folder containing messages M, `idset_given`
/// after the state block contains exactly the globcnts of M.
#[test]
fn idset_given_matches_messages_present_after_fresh_sync() {
    let store = TestStore::empty();
    let inbox = store.add_folder(store.root(), "INBOX", 1);
    store.add_message_at(inbox, 50);
    store.add_message_at(inbox, 51);
    store.add_message_at(inbox, 52);

    let mut ctx = fxics::sync_configure(
        inbox,
        SyncMode::Contents,
        SyncFlags::new(),
        Vec::new(),
        false,
    );
    drain(&mut ctx, &store);

    let guid = store.replica_guid();
    assert!(ctx.idset_given.includes(&guid, 50));
    assert!(ctx.idset_given.includes(&guid, 51));
    assert!(ctx.idset_given.includes(&guid, 52));
    assert!(!ctx.idset_given.includes(&guid, 49));
    assert!(!ctx.idset_given.includes(&guid, 53));
}

/// S5: upload-then-produce. The uploaded `cnset_seen` is merged into the
/// session before the stream is built, and the state block reflects the
/// union of uploaded and produced coverage.
#[test]
fn uploaded_state_merges_with_produced_coverage() {
    let store = TestStore::empty();
    let inbox = store.add_folder(store.root(), "INBOX", 1);
    store.add_message_at(inbox, 4);

    let mut ctx = fxics::sync_configure(
        inbox,
        SyncMode::Contents,
        SyncFlags::new(),
        Vec::new(),
        false,
    );

    let guid = store.replica_guid();
    let mut given = fxics_idset::RawIdSet::new();
    given.push(guid, 1);
    given.push(guid, 2);
    given.push(guid, 3);
    let uploaded = given.to_idset();

    fxics::upload_state_begin(&mut ctx, StateProperty::IdsetGiven).unwrap();
    fxics::upload_state_continue(&mut ctx, &uploaded.serialize()).unwrap();
    fxics::upload_state_end(&mut ctx).unwrap();

    drain(&mut ctx, &store);

    // Uploaded coverage (1..3) and freshly produced coverage (4) both
    // survive into the merged state.
    assert!(ctx.idset_given.includes(&guid, 1));
    assert!(ctx.idset_given.includes(&guid, 3));
    assert!(ctx.idset_given.includes(&guid, 4));
}

/// Uploading state after the stream has already been generated is
/// rejected (§4.6 "allowed only when no generation has started").
#[test]
fn state_upload_after_generation_started_is_rejected() {
    let store = TestStore::empty();
    let mut ctx = fxics::sync_configure(
        store.root(),
        SyncMode::Contents,
        SyncFlags::new(),
        Vec::new(),
        false,
    );
    drain(&mut ctx, &store);

    let err = fxics::upload_state_begin(&mut ctx, StateProperty::CnsetSeen).unwrap_err();
    assert!(matches!(err, fxics::Error::InvalidObject));
}

/// S6: an import with an unknown replica GUID returns `NotFound` and
/// leaves the session's state buffers unchanged; a subsequent successful
/// change on the same session still succeeds.
#[test]
fn import_with_unknown_replica_guid_leaves_session_state_untouched() {
    let store = TestStore::empty();
    let inbox = store.add_folder(store.root(), "INBOX", 1);
    let ctx = fxics::sync_configure(
        inbox,
        SyncMode::Contents,
        SyncFlags::new(),
        Vec::new(),
        false,
    );

    let bogus_source_key = {
        let mut bytes = vec![0xEE; 22];
        bytes[21] = 0x01;
        bytes
    };
    let values = vec![(
        PR_SOURCE_KEY,
        PropertyValue::Scalar(ScalarValue::Binary(bogus_source_key)),
    )];

    let err = fxics::sync_import_message_change(&ctx, &store, &values, ImportFlag::Normal)
        .unwrap_err();
    assert!(matches!(err, fxics::Error::Dtyp(_)));
    assert_eq!(err.to_error_code(), fxics::ErrorCode::NotFound);

    let new_fmid = fxics_dtyp::Fmid::new(1, 99);
    let good_source_key = fxics_dtyp::source_key_from_fmid(new_fmid, &store).unwrap();
    let values = vec![(
        PR_SOURCE_KEY,
        PropertyValue::Scalar(ScalarValue::Binary(good_source_key.0.to_vec())),
    )];
    fxics::sync_import_message_change(&ctx, &store, &values, ImportFlag::Normal).unwrap();
    assert!(store.open_message_exists(inbox, new_fmid.0));
}

/// Hierarchy deletes are unsupported; `SyncImportDeletes` must reject
/// them without touching the store.
#[test]
fn hierarchy_deletes_are_rejected() {
    let store = TestStore::empty();
    let ctx = fxics::sync_configure(
        store.root(),
        SyncMode::Hierarchy,
        SyncFlags::new(),
        Vec::new(),
        false,
    );

    let err = fxics::sync_import_deletes(&ctx, &store, &[], DeleteKind::Hard, true).unwrap_err();
    assert!(matches!(err, fxics::Error::InvalidObject));
}

/// I6: no emitted `cn` in a session's `cnset_seen` is duplicated. Two
/// messages sharing a last-modification time (and so the same derived
/// `cn`) still fold into a single covering range, not two overlapping
/// entries, and a re-merge against itself is idempotent.
#[test]
fn cnset_seen_has_no_duplicate_ranges_after_merge() {
    let store = TestStore::empty();
    let inbox = store.add_folder(store.root(), "INBOX", 1);
    store.add_message_at(inbox, 10);
    store.add_message_at(inbox, 11);

    let mut ctx = fxics::sync_configure(
        inbox,
        SyncMode::Contents,
        SyncFlags::new(),
        Vec::new(),
        false,
    );
    drain(&mut ctx, &store);

    let guid = store.replica_guid();
    let ranges: Vec<_> = ctx
        .cnset_seen
        .replicas()
        .find(|(g, _)| **g == guid)
        .map(|(_, r)| r.to_vec())
        .unwrap_or_default();
    assert_eq!(ranges.len(), 1, "two same-cn messages must fold into one range, not two");

    let merged_again = IdSet::merge(&ctx.cnset_seen, &ctx.cnset_seen);
    assert_eq!(merged_again, ctx.cnset_seen);
}

/// `GetLocalReplicaIds` reserves a contiguous globcnt range and reports
/// the local replica's GUID.
#[test]
fn get_local_replica_ids_reserves_contiguous_range() {
    let store = TestStore::empty();
    let (guid, first) = fxics::get_local_replica_ids(&store, 10).unwrap();
    assert_eq!(guid, store.replica_guid());
    let (_, second) = fxics::get_local_replica_ids(&store, 5).unwrap();
    assert_eq!(second, first + 10);
}
