//! An in-memory `Store` implementation for manual exercise of the library
//! (§0.4). Never used by the library itself — this is test/demo scaffolding
//! only, the way `smb-cli` drives a real server rather than a fake one.

use std::cell::RefCell;
use std::collections::HashMap;

use fxics::well_known::*;
use fxics::{
    DeleteKind, FileTime, Fmid, FolderHandle, Guid, MessageHandle, NamedKind, NamedPropertyInfo,
    ObjectRef, PropResult, PropertyTag, PropertyValue, ReplicaDirectory, ScalarValue, Store,
    TableHandle, TableKind, UnixTime,
};

const LOCAL_REPLICA_ID: u16 = 1;

struct FolderRecord {
    parent: Option<u64>,
    display_name: String,
    last_mod: UnixTime,
    children: Vec<u64>,
    messages: Vec<u64>,
}

struct MessageRecord {
    last_mod: UnixTime,
    associated: bool,
    size: u32,
    subject: String,
    recipients: Vec<String>,
    attachments: Vec<String>,
}

struct TableState {
    container: ObjectRef,
    kind: TableKind,
    columns: Vec<PropertyTag>,
}

/// Seeded, single-replica mock mail store. `fid`s are packed `Fmid`
/// values (the local replica id is always 1) and double as both folder
/// and message identifiers.
pub struct MockStore {
    replica_guid: Guid,
    folders: RefCell<HashMap<u64, FolderRecord>>,
    messages: RefCell<HashMap<u64, MessageRecord>>,
    tables: RefCell<HashMap<u64, TableState>>,
    next_globcnt: RefCell<u64>,
}

impl MockStore {
    pub fn new() -> Self {
        MockStore {
            replica_guid: Guid::from_bytes([0x42; 16]),
            folders: RefCell::new(HashMap::new()),
            messages: RefCell::new(HashMap::new()),
            tables: RefCell::new(HashMap::new()),
            next_globcnt: RefCell::new(1000),
        }
    }

    /// Returns a fresh *packed* `Fmid` (replica id in the low 16 bits,
    /// global counter above it) — every `PR_FID`/`PR_MID` value this
    /// store hands out must already be in this form, since the producer
    /// reads it straight back via `Fmid(raw)` rather than re-deriving a
    /// replica id from context.
    fn alloc_fid(&self) -> u64 {
        let mut next = self.next_globcnt.borrow_mut();
        let gc = *next;
        *next += 1;
        Fmid::new(LOCAL_REPLICA_ID, gc).0
    }

    /// Builds a small folder tree (root -> Inbox -> Subfolder) with a
    /// handful of messages in the root, for the demo subcommands.
    pub fn seeded() -> (Self, u64) {
        let store = MockStore::new();
        let root = store.alloc_fid();
        store.folders.borrow_mut().insert(
            root,
            FolderRecord {
                parent: None,
                display_name: "Top of Information Store".into(),
                last_mod: UnixTime(1_700_000_000),
                children: Vec::new(),
                messages: Vec::new(),
            },
        );

        let inbox = store.alloc_fid();
        store.folders.borrow_mut().insert(
            inbox,
            FolderRecord {
                parent: Some(root),
                display_name: "Inbox".into(),
                last_mod: UnixTime(1_700_000_100),
                children: Vec::new(),
                messages: Vec::new(),
            },
        );
        store.folders.borrow_mut().get_mut(&root).unwrap().children.push(inbox);

        let sub = store.alloc_fid();
        store.folders.borrow_mut().insert(
            sub,
            FolderRecord {
                parent: Some(inbox),
                display_name: "Archive".into(),
                last_mod: UnixTime(1_700_000_200),
                children: Vec::new(),
                messages: Vec::new(),
            },
        );
        store.folders.borrow_mut().get_mut(&inbox).unwrap().children.push(sub);

        for i in 0..5u64 {
            let mid = store.alloc_fid();
            store.messages.borrow_mut().insert(
                mid,
                MessageRecord {
                    last_mod: UnixTime(1_700_001_000 + i * 60),
                    associated: false,
                    size: 2048 + i as u32 * 512,
                    subject: format!("Demo message {i}"),
                    recipients: vec![format!("user{i}@example.com")],
                    attachments: if i % 2 == 0 { vec!["notes.txt".into()] } else { Vec::new() },
                },
            );
            store.folders.borrow_mut().get_mut(&inbox).unwrap().messages.push(mid);
        }

        (store, inbox)
    }
}

impl ReplicaDirectory for MockStore {
    fn replid_to_guid(&self, id: fxics::ReplicaId) -> Option<Guid> {
        (id == LOCAL_REPLICA_ID).then_some(self.replica_guid)
    }

    fn guid_to_replid(&self, guid: &Guid) -> Option<fxics::ReplicaId> {
        (*guid == self.replica_guid).then_some(LOCAL_REPLICA_ID)
    }
}

impl Store for MockStore {
    fn get_available_properties(&self, obj: ObjectRef) -> fxics::Result<Vec<PropertyTag>> {
        match obj {
            ObjectRef::Folder(_) => Ok(vec![PR_DISPLAY_NAME_UNICODE]),
            ObjectRef::Message(_) => Ok(vec![PR_DISPLAY_NAME_UNICODE, PR_MESSAGE_SIZE]),
        }
    }

    fn get_properties(
        &self,
        obj: ObjectRef,
        tags: &[PropertyTag],
    ) -> fxics::Result<Vec<(PropertyTag, PropResult)>> {
        let mut out = Vec::with_capacity(tags.len());
        match obj {
            ObjectRef::Folder(FolderHandle(fid)) => {
                let folders = self.folders.borrow();
                let folder = folders.get(&fid).ok_or(fxics::Error::NotFound)?;
                for &tag in tags {
                    let result = match tag {
                        PR_FID => PropResult::Found(PropertyValue::Scalar(ScalarValue::I8(fid))),
                        PR_PARENT_FID => folder
                            .parent
                            .map(|p| PropResult::Found(PropertyValue::Scalar(ScalarValue::I8(p))))
                            .unwrap_or(PropResult::NotFound),
                        PR_LAST_MODIFICATION_TIME => PropResult::Found(PropertyValue::Scalar(
                            ScalarValue::SysTime(FileTime::from_unix_time(folder.last_mod)),
                        )),
                        PR_DISPLAY_NAME_UNICODE => PropResult::Found(PropertyValue::Scalar(
                            ScalarValue::Unicode(folder.display_name.clone()),
                        )),
                        _ => PropResult::NotFound,
                    };
                    out.push((tag, result));
                }
            }
            ObjectRef::Message(MessageHandle(fid)) => {
                let messages = self.messages.borrow();
                let msg = messages.get(&fid).ok_or(fxics::Error::NotFound)?;
                for &tag in tags {
                    let result = match tag {
                        PR_MID => PropResult::Found(PropertyValue::Scalar(ScalarValue::I8(fid))),
                        PR_LAST_MODIFICATION_TIME => PropResult::Found(PropertyValue::Scalar(
                            ScalarValue::SysTime(FileTime::from_unix_time(msg.last_mod)),
                        )),
                        PR_ASSOCIATED => {
                            PropResult::Found(PropertyValue::Scalar(ScalarValue::Bool(msg.associated)))
                        }
                        PR_MESSAGE_SIZE => {
                            PropResult::Found(PropertyValue::Scalar(ScalarValue::Long(msg.size)))
                        }
                        PR_DISPLAY_NAME_UNICODE => PropResult::Found(PropertyValue::Scalar(
                            ScalarValue::Unicode(msg.subject.clone()),
                        )),
                        _ => PropResult::NotFound,
                    };
                    out.push((tag, result));
                }
            }
        }
        Ok(out)
    }

    fn open_folder(&self, _parent: FolderHandle, fid: u64) -> fxics::Result<FolderHandle> {
        if self.folders.borrow().contains_key(&fid) {
            Ok(FolderHandle(fid))
        } else {
            Err(fxics::Error::NotFound)
        }
    }

    fn create_folder(
        &self,
        parent: FolderHandle,
        fid: u64,
        props: &[(PropertyTag, PropertyValue)],
    ) -> fxics::Result<FolderHandle> {
        let display_name = props
            .iter()
            .find_map(|(t, v)| match (*t, v) {
                (PR_DISPLAY_NAME_UNICODE, PropertyValue::Scalar(ScalarValue::Unicode(s))) => {
                    Some(s.clone())
                }
                _ => None,
            })
            .unwrap_or_default();

        self.folders.borrow_mut().insert(
            fid,
            FolderRecord {
                parent: Some(parent.0),
                display_name,
                last_mod: UnixTime(0),
                children: Vec::new(),
                messages: Vec::new(),
            },
        );
        self.folders
            .borrow_mut()
            .get_mut(&parent.0)
            .ok_or(fxics::Error::NotFound)?
            .children
            .push(fid);
        Ok(FolderHandle(fid))
    }

    fn open_table(&self, container: ObjectRef, kind: TableKind) -> fxics::Result<TableHandle> {
        let handle = self.alloc_fid();
        self.tables.borrow_mut().insert(
            handle,
            TableState {
                container,
                kind,
                columns: Vec::new(),
            },
        );
        Ok(TableHandle(handle))
    }

    fn table_set_columns(&self, table: TableHandle, tags: &[PropertyTag]) -> fxics::Result<()> {
        if let Some(state) = self.tables.borrow_mut().get_mut(&table.0) {
            state.columns = tags.to_vec();
        }
        Ok(())
    }

    fn table_row_count(&self, table: TableHandle) -> fxics::Result<usize> {
        let container = self
            .tables
            .borrow()
            .get(&table.0)
            .map(|s| (s.container, s.kind));
        let (container, kind) = container.ok_or(fxics::Error::InvalidObject)?;
        Ok(self.row_ids(container, kind)?.len())
    }

    fn table_get_row(&self, table: TableHandle, i: usize) -> fxics::Result<Vec<(PropertyTag, PropResult)>> {
        let (container, kind, columns) = self
            .tables
            .borrow()
            .get(&table.0)
            .map(|s| (s.container, s.kind, s.columns.clone()))
            .ok_or(fxics::Error::InvalidObject)?;
        let ids = self.row_ids(container, kind)?;
        let fid = *ids.get(i).ok_or(fxics::Error::NotFound)?;

        let obj = match kind {
            TableKind::ChildFolders => ObjectRef::Folder(FolderHandle(fid)),
            TableKind::Messages => ObjectRef::Message(MessageHandle(fid)),
            TableKind::Recipients | TableKind::Attachments => {
                return self.named_row(kind, container, i);
            }
        };
        self.get_properties(obj, &columns)
    }

    fn open_message(&self, _folder: FolderHandle, fid: u64) -> fxics::Result<MessageHandle> {
        if self.messages.borrow().contains_key(&fid) {
            Ok(MessageHandle(fid))
        } else {
            Err(fxics::Error::NotFound)
        }
    }

    fn create_message(&self, folder: FolderHandle, fid: u64, assoc: bool) -> fxics::Result<MessageHandle> {
        self.messages.borrow_mut().insert(
            fid,
            MessageRecord {
                last_mod: UnixTime(0),
                associated: assoc,
                size: 0,
                subject: String::new(),
                recipients: Vec::new(),
                attachments: Vec::new(),
            },
        );
        self.folders
            .borrow_mut()
            .get_mut(&folder.0)
            .ok_or(fxics::Error::NotFound)?
            .messages
            .push(fid);
        Ok(MessageHandle(fid))
    }

    fn delete_message(&self, folder: FolderHandle, fid: u64, kind: DeleteKind) -> fxics::Result<()> {
        log::debug!("deleting message {fid} from folder {} ({kind:?})", folder.0);
        self.messages.borrow_mut().remove(&fid);
        if let Some(f) = self.folders.borrow_mut().get_mut(&folder.0) {
            f.messages.retain(|m| *m != fid);
        }
        Ok(())
    }

    fn reserve_fmid_range(&self, count: u32) -> fxics::Result<u64> {
        let mut next = self.next_globcnt.borrow_mut();
        let start = *next;
        *next += count as u64;
        Ok(start)
    }

    fn namedprops_lookup(&self, id: u32) -> fxics::Result<NamedPropertyInfo> {
        Ok(NamedPropertyInfo {
            guid: self.replica_guid,
            kind: NamedKind::Id(id),
        })
    }
}

impl MockStore {
    fn row_ids(&self, container: ObjectRef, kind: TableKind) -> fxics::Result<Vec<u64>> {
        match (container, kind) {
            (ObjectRef::Folder(FolderHandle(fid)), TableKind::ChildFolders) => Ok(self
                .folders
                .borrow()
                .get(&fid)
                .ok_or(fxics::Error::NotFound)?
                .children
                .clone()),
            (ObjectRef::Folder(FolderHandle(fid)), TableKind::Messages) => Ok(self
                .folders
                .borrow()
                .get(&fid)
                .ok_or(fxics::Error::NotFound)?
                .messages
                .clone()),
            (ObjectRef::Message(MessageHandle(fid)), TableKind::Recipients) => Ok((0..self
                .messages
                .borrow()
                .get(&fid)
                .ok_or(fxics::Error::NotFound)?
                .recipients
                .len())
                .map(|i| i as u64)
                .collect()),
            (ObjectRef::Message(MessageHandle(fid)), TableKind::Attachments) => Ok((0..self
                .messages
                .borrow()
                .get(&fid)
                .ok_or(fxics::Error::NotFound)?
                .attachments
                .len())
                .map(|i| i as u64)
                .collect()),
            _ => Err(fxics::Error::InvalidObject),
        }
    }

    fn named_row(
        &self,
        kind: TableKind,
        container: ObjectRef,
        i: usize,
    ) -> fxics::Result<Vec<(PropertyTag, PropResult)>> {
        let ObjectRef::Message(MessageHandle(fid)) = container else {
            return Err(fxics::Error::InvalidObject);
        };
        let messages = self.messages.borrow();
        let msg = messages.get(&fid).ok_or(fxics::Error::NotFound)?;
        match kind {
            TableKind::Recipients => {
                let addr = msg.recipients.get(i).ok_or(fxics::Error::NotFound)?;
                Ok(vec![(
                    PR_DISPLAY_NAME_UNICODE,
                    PropResult::Found(PropertyValue::Scalar(ScalarValue::Unicode(addr.clone()))),
                )])
            }
            TableKind::Attachments => {
                let name = msg.attachments.get(i).ok_or(fxics::Error::NotFound)?;
                Ok(vec![(
                    PR_DISPLAY_NAME_UNICODE,
                    PropResult::Found(PropertyValue::Scalar(ScalarValue::Unicode(name.clone()))),
                )])
            }
            _ => Err(fxics::Error::InvalidObject),
        }
    }
}
