use std::io;

use object::TypeTag;
use thiserror::Error;

use crate::{Opcode, serializer::Phase};

/// Failure while writing an artifact. Any error invalidates the whole
/// artifact; the serializer refuses further writes afterwards.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("archive error: {0}")]
    Archive(#[from] bincode::Error),

    #[error("literal #{index} of type {tag} has no on-disk representation")]
    Unrepresentable { index: usize, tag: TypeTag },

    #[error("too many {what}: {count} exceeds {max}")]
    TooMany {
        what: &'static str,
        count: usize,
        max: usize,
    },

    #[error("function id {id} is used by both `{first}` and `{second}`")]
    DuplicateFunctionId { id: u16, first: String, second: String },

    #[error("literal indices must be dense: expected #{expected}, found #{found}")]
    LiteralIndexGap { expected: u16, found: u16 },

    #[error("cannot write the {attempted} section while in the {current} section")]
    OutOfOrder { attempted: Phase, current: Phase },

    #[error("serializer already failed; discard the artifact and start over")]
    Poisoned,
}

/// Failure while reading an artifact back.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("archive error: {0}")]
    Archive(#[from] bincode::Error),

    #[error("metadata ends at {actual}, but the header says {expected}")]
    MetadataOffset { expected: u32, actual: u64 },

    #[error("invalid opcode byte {byte:#04x} at offset {offset}")]
    InvalidOpcode { byte: u8, offset: usize },

    #[error("{opcode} at offset {offset} is cut short")]
    Truncated { opcode: Opcode, offset: usize },
}
