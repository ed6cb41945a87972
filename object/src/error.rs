use thiserror::Error;

use crate::{TypeTag, Value};

/// Runtime failure raised by operators and container access.
///
/// Nothing in this crate recovers from these; they propagate to the host,
/// which decides what happens to the offending task.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("type error: `{op}` is not defined for {lhs}{}", and_rhs(.rhs))]
    TypeError {
        op: &'static str,
        lhs: TypeTag,
        rhs: Option<TypeTag>,
    },

    #[error("key not found: {key:?}")]
    KeyNotFound { key: String },

    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: i64, len: usize },

    #[error("division by zero in `{op}`")]
    DivisionByZero { op: &'static str },
}

impl ValueError {
    pub fn type_error(op: &'static str, lhs: &Value, rhs: Option<&Value>) -> Self {
        ValueError::TypeError {
            op,
            lhs: lhs.type_tag(),
            rhs: rhs.map(Value::type_tag),
        }
    }
}

fn and_rhs(rhs: &Option<TypeTag>) -> String {
    rhs.map(|tag| format!(" and {tag}")).unwrap_or_default()
}

/// Failure while converting a value to or from its archived form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArchiveError {
    #[error("values of type {0} have no archived representation")]
    Unrepresentable(TypeTag),

    #[error("container references itself and cannot be archived")]
    Cycle,

    #[error("unknown type code {0}")]
    UnknownTypeCode(u32),
}
