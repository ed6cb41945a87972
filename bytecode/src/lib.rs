mod decoder;
mod descriptor;
mod error;
mod instruction;
mod literals;
mod op;
mod operand;
mod reader;
mod serializer;

pub use decoder::InstructionDecoder;
pub use descriptor::{
    DEFAULT_CONTROLLER, DeviceDescriptor, DeviceKind, OverwritePolicy, ReadPolicy,
    TaskDescriptor, TriggerData,
};
pub use error::{DecodeError, EncodeError};
pub use instruction::Signal;
pub use literals::LiteralPool;
pub use op::*;
pub use operand::Operand;
pub use reader::{BytecodeReader, Program};
pub use serializer::{BytecodeSerializer, Phase, SymbolTable};
