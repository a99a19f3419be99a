//! Shared in-memory store for integration tests. Independent scaffolding
//! from `fxics-cli`'s demo `MockStore` — same shape, kept separate so the
//! test crate doesn't depend on the binary crate.

use std::cell::RefCell;
use std::collections::HashMap;

use fxics::well_known::*;
use fxics::{
    DeleteKind, FileTime, Fmid, FolderHandle, Guid, MessageHandle, NamedKind, NamedPropertyInfo,
    ObjectRef, PropResult, PropertyTag, PropertyValue, ReplicaDirectory, ScalarValue, Store,
    TableHandle, TableKind, UnixTime,
};

pub const REPLICA_GUID_BYTES: u8 = 0x11;
pub const LOCAL_REPLICA_ID: u16 = 1;

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
}

struct TableState {
    container: ObjectRef,
    kind: TableKind,
    columns: Vec<PropertyTag>,
}

pub struct TestStore {
    replica_guid: Guid,
    root: u64,
    folders: RefCell<HashMap<u64, FolderRecord>>,
    messages: RefCell<HashMap<u64, MessageRecord>>,
    tables: RefCell<HashMap<u64, TableState>>,
    next_globcnt: RefCell<u64>,
}

impl TestStore {
    pub fn empty() -> Self {
        let root = Fmid::new(LOCAL_REPLICA_ID, 1).0;
        let mut folders = HashMap::new();
        folders.insert(
            root,
            FolderRecord {
                parent: None,
                display_name: "root".into(),
                last_mod: UnixTime(0),
                children: Vec::new(),
                messages: Vec::new(),
            },
        );
        TestStore {
            replica_guid: Guid::from_bytes([REPLICA_GUID_BYTES; 16]),
            root,
            folders: RefCell::new(folders),
            messages: RefCell::new(HashMap::new()),
            tables: RefCell::new(HashMap::new()),
            next_globcnt: RefCell::new(2),
        }
    }

    /// Returns a fresh *packed* `Fmid` (replica id in the low 16 bits,
    /// global counter above it): every `PR_FID`/`PR_MID` value handed
    /// back through `get_properties` must already be in this form, since
    /// the producer reads it straight back via `Fmid(raw)`.
    fn alloc_fid(&self) -> u64 {
        let mut next = self.next_globcnt.borrow_mut();
        let gc = *next;
        *next += 1;
        Fmid::new(LOCAL_REPLICA_ID, gc).0
    }

    pub fn root(&self) -> FolderHandle {
        FolderHandle(self.root)
    }

    /// Inserts a folder directly (bypassing `create_folder`'s property
    /// parsing), returning its handle.
    pub fn add_folder(&self, parent: FolderHandle, display_name: &str, last_mod: u32) -> FolderHandle {
        let fid = self.alloc_fid();
        self.folders.borrow_mut().insert(
            fid,
            FolderRecord {
                parent: Some(parent.0),
                display_name: display_name.into(),
                last_mod: UnixTime(last_mod),
                children: Vec::new(),
                messages: Vec::new(),
            },
        );
        self.folders
            .borrow_mut()
            .get_mut(&parent.0)
            .unwrap()
            .children
            .push(fid);
        FolderHandle(fid)
    }

    /// Inserts a message directly under a folder at a chosen global
    /// counter `gc`, packed into a full `Fmid` under the local replica —
    /// `gc` is what `idset_given`/`cnset_seen` assertions compare against.
    pub fn add_message_at(&self, folder: FolderHandle, gc: u64) -> MessageHandle {
        let fid = Fmid::new(LOCAL_REPLICA_ID, gc).0;
        self.messages.borrow_mut().insert(
            fid,
            MessageRecord {
                last_mod: UnixTime(0),
                associated: false,
            },
        );
        self.folders
            .borrow_mut()
            .get_mut(&folder.0)
            .unwrap()
            .messages
            .push(fid);
        MessageHandle(fid)
    }

    pub fn replica_guid(&self) -> Guid {
        self.replica_guid
    }

    pub fn open_message_exists(&self, folder: FolderHandle, fid: u64) -> bool {
        self.messages.borrow().contains_key(&fid)
            && self
                .folders
                .borrow()
                .get(&folder.0)
                .is_some_and(|f| f.messages.contains(&fid))
    }
}

impl ReplicaDirectory for TestStore {
    fn replid_to_guid(&self, id: fxics::ReplicaId) -> Option<Guid> {
        (id == LOCAL_REPLICA_ID).then_some(self.replica_guid)
    }

    fn guid_to_replid(&self, guid: &Guid) -> Option<fxics::ReplicaId> {
        (*guid == self.replica_guid).then_some(LOCAL_REPLICA_ID)
    }
}

impl Store for TestStore {
    fn get_available_properties(&self, obj: ObjectRef) -> fxics::Result<Vec<PropertyTag>> {
        match obj {
            ObjectRef::Folder(_) => Ok(vec![PR_DISPLAY_NAME_UNICODE]),
            ObjectRef::Message(_) => Ok(vec![]),
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
        let (container, kind) = self
            .tables
            .borrow()
            .get(&table.0)
            .map(|s| (s.container, s.kind))
            .ok_or(fxics::Error::InvalidObject)?;
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
            TableKind::Recipients | TableKind::Attachments => return Ok(Vec::new()),
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

impl TestStore {
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
            (ObjectRef::Message(_), TableKind::Recipients | TableKind::Attachments) => Ok(Vec::new()),
            _ => Err(fxics::Error::InvalidObject),
        }
    }
}
