//! Reads a program artifact back into memory.

use std::{
    collections::BTreeMap,
    io::{Read, Seek, Write},
};

use object::Value;

use crate::{
    BytecodeSerializer, DecodeError, EncodeError, Instruction, InstructionDecoder,
    TaskDescriptor, serializer::SymbolTable,
};

/// A fully loaded program. `instructions` carries each instruction's byte
/// offset in the code section, which is what jump targets refer to.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub metadata: SymbolTable,
    pub tasks: Vec<TaskDescriptor>,
    pub literals: Vec<Value>,
    pub instructions: Vec<(usize, Instruction)>,
}

impl Program {
    /// Function name for a call address, if the metadata lists one.
    pub fn function_name(&self, id: u16) -> Option<&str> {
        self.metadata
            .iter()
            .find(|(_, (fid, _))| *fid == id)
            .map(|(name, _)| name.as_str())
    }

    pub fn write_to<W: Write + Seek>(&self, out: W) -> Result<W, EncodeError> {
        let mut serializer = BytecodeSerializer::new(out);
        serializer.write_metadata(&self.metadata)?;
        serializer.write_header(&self.tasks)?;
        serializer.write_literal_pool(&self.literals)?;
        serializer.write_instructions(self.instructions.iter().map(|(_, i)| i))?;
        serializer.finish()
    }
}

pub struct BytecodeReader;

impl BytecodeReader {
    pub fn read<R: Read + Seek>(mut input: R) -> Result<Program, DecodeError> {
        let expected = read_u32(&mut input)?;
        let by_id: BTreeMap<u16, (String, Vec<String>)> =
            bincode::deserialize_from(&mut input)?;
        let actual = input.stream_position()?;
        if actual != u64::from(expected) {
            return Err(DecodeError::MetadataOffset { expected, actual });
        }
        let metadata = by_id
            .into_iter()
            .map(|(id, (name, deps))| (name, (id, deps)))
            .collect();

        let task_count = read_u16(&mut input)?;
        let tasks = (0..task_count)
            .map(|_| bincode::deserialize_from(&mut input))
            .collect::<Result<Vec<TaskDescriptor>, _>>()?;

        let literal_count = read_u16(&mut input)?;
        let literals = (0..literal_count)
            .map(|_| bincode::deserialize_from(&mut input))
            .collect::<Result<Vec<Value>, _>>()?;

        let mut code = Vec::new();
        input.read_to_end(&mut code)?;
        let instructions = InstructionDecoder::new(&code).collect::<Result<Vec<_>, _>>()?;

        log::debug!(
            "read {} tasks, {} literals, {} instructions",
            tasks.len(),
            literals.len(),
            instructions.len()
        );
        Ok(Program {
            metadata,
            tasks,
            literals,
            instructions,
        })
    }
}

fn read_u16<R: Read>(input: &mut R) -> Result<u16, DecodeError> {
    let mut buf = [0; 2];
    input.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

fn read_u32<R: Read>(input: &mut R) -> Result<u32, DecodeError> {
    let mut buf = [0; 4];
    input.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}
