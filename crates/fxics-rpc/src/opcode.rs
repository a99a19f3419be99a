//! RPC opcodes retained from the wire specification (§6).

/// One operation in the FX/ICS RPC surface.
///
/// Reference: the source's emsmdb RPC table, opcodes 0x4D..0x93.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[repr(u8)]
pub enum Opcode {
    FastTransferSourceCopyTo = 0x4D,
    FastTransferSourceGetBuffer = 0x4E,
    SyncConfigure = 0x70,
    SyncImportMessageChange = 0x72,
    SyncImportHierarchyChange = 0x73,
    SyncImportDeletes = 0x74,
    SyncUploadStateStreamBegin = 0x75,
    SyncUploadStateStreamContinue = 0x76,
    SyncUploadStateStreamEnd = 0x77,
    SyncImportMessageMove = 0x78,
    SyncOpenCollector = 0x7E,
    GetLocalReplicaIds = 0x7F,
    SyncImportReadStateChanges = 0x80,
    SyncGetTransferState = 0x82,
    SetLocalReplicaMidsetDeleted = 0x93,
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Opcode::FastTransferSourceCopyTo => "FastTransferSourceCopyTo",
            Opcode::FastTransferSourceGetBuffer => "FastTransferSourceGetBuffer",
            Opcode::SyncConfigure => "SyncConfigure",
            Opcode::SyncImportMessageChange => "SyncImportMessageChange",
            Opcode::SyncImportHierarchyChange => "SyncImportHierarchyChange",
            Opcode::SyncImportDeletes => "SyncImportDeletes",
            Opcode::SyncUploadStateStreamBegin => "SyncUploadStateStreamBegin",
            Opcode::SyncUploadStateStreamContinue => "SyncUploadStateStreamContinue",
            Opcode::SyncUploadStateStreamEnd => "SyncUploadStateStreamEnd",
            Opcode::SyncImportMessageMove => "SyncImportMessageMove",
            Opcode::SyncOpenCollector => "SyncOpenCollector",
            Opcode::GetLocalReplicaIds => "GetLocalReplicaIds",
            Opcode::SyncImportReadStateChanges => "SyncImportReadStateChanges",
            Opcode::SyncGetTransferState => "SyncGetTransferState",
            Opcode::SetLocalReplicaMidsetDeleted => "SetLocalReplicaMidsetDeleted",
        };
        write!(f, "{} ({:#04x})", name, *self as u8)
    }
}
