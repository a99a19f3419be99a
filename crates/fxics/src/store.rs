//! The external mail-store interface consumed by the producer and the
//! importer (§6). Everything here is implemented by the caller; this
//! crate never touches disk.

use fxics_dtyp::ReplicaDirectory;
use fxics_msg::{NamedPropertyInfo, PropertyTag, PropertyValue};
use fxics_rpc::DeleteKind;

use crate::error::Result;

/// Opaque handle to an open folder, minted by [`Store::open_folder`] or
/// [`Store::create_folder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FolderHandle(pub u64);

/// Opaque handle to an open message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageHandle(pub u64);

/// Opaque handle to an open table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableHandle(pub u64);

/// Either kind of object a property read can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectRef {
    Folder(FolderHandle),
    Message(MessageHandle),
}

/// Which table an object exposes (§4.5). `Messages`/`ChildFolders` are
/// opened against a folder; `Recipients`/`Attachments` against a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Messages,
    ChildFolders,
    Recipients,
    Attachments,
}

/// Per-property read outcome, mirroring the source's parallel
/// `values[]`/`statuses[]` arrays (§6).
#[derive(Debug, Clone, PartialEq)]
pub enum PropResult {
    Found(PropertyValue),
    NotFound,
}

/// The store interface the producer and importer consume (§6). A
/// [`Store`] is also a [`ReplicaDirectory`], since replica GUID
/// resolution is itself a store-backed lookup.
pub trait Store: ReplicaDirectory {
    fn get_available_properties(&self, obj: ObjectRef) -> Result<Vec<PropertyTag>>;

    fn get_properties(
        &self,
        obj: ObjectRef,
        tags: &[PropertyTag],
    ) -> Result<Vec<(PropertyTag, PropResult)>>;

    fn open_folder(&self, parent: FolderHandle, fid: u64) -> Result<FolderHandle>;
    fn create_folder(
        &self,
        parent: FolderHandle,
        fid: u64,
        props: &[(PropertyTag, PropertyValue)],
    ) -> Result<FolderHandle>;

    fn open_table(&self, container: ObjectRef, kind: TableKind) -> Result<TableHandle>;
    fn table_set_columns(&self, table: TableHandle, tags: &[PropertyTag]) -> Result<()>;
    fn table_row_count(&self, table: TableHandle) -> Result<usize>;
    fn table_get_row(&self, table: TableHandle, i: usize) -> Result<Vec<(PropertyTag, PropResult)>>;

    fn open_message(&self, folder: FolderHandle, fid: u64) -> Result<MessageHandle>;
    fn create_message(&self, folder: FolderHandle, fid: u64, assoc: bool) -> Result<MessageHandle>;
    fn delete_message(&self, folder: FolderHandle, fid: u64, kind: DeleteKind) -> Result<()>;

    /// Reserves `count` consecutive globcnt values from the store's
    /// monotone allocator, returning the first reserved value (§4.6).
    fn reserve_fmid_range(&self, count: u32) -> Result<u64>;

    fn namedprops_lookup(&self, id: u32) -> Result<NamedPropertyInfo>;
}
