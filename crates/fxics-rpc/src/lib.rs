//! The RPC opcode table, request-shaped flag types, and error codes that
//! the session state machine dispatches against (§6).

mod flags;
mod opcode;
mod status;

pub use flags::{DeleteKind, ImportFlag, StateProperty, SyncFlags, SyncMode};
pub use opcode::Opcode;
pub use status::ErrorCode;
