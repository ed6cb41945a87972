use crate::{DecodeError, Instruction, Opcode};

/// Decodes an instruction stream into `(offset, Instruction)` pairs.
///
/// Malformed input ends iteration with an error: an unknown opcode byte or
/// an instruction whose operands run past the end of the stream.
pub struct InstructionDecoder<'a> {
    bytes: &'a [u8],
    pos: usize,
    failed: bool,
}

impl<'a> InstructionDecoder<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            pos: 0,
            failed: false,
        }
    }

    /// Current byte offset in the stream.
    #[inline(always)]
    pub fn offset(&self) -> usize {
        self.pos
    }

    #[inline(always)]
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    /// Decode the next instruction, or `None` at end-of-stream.
    pub fn decode_next(&mut self) -> Option<Result<(usize, Instruction), DecodeError>> {
        if self.is_at_end() || self.failed {
            return None;
        }
        let offset = self.pos;
        let result = self.decode(offset);
        self.failed = result.is_err();
        Some(result.map(|instruction| (offset, instruction)))
    }

    fn decode(&mut self, offset: usize) -> Result<Instruction, DecodeError> {
        let byte = self.bytes[offset];
        let opcode =
            Opcode::try_from(byte).map_err(|byte| DecodeError::InvalidOpcode { byte, offset })?;
        let operands = &self.bytes[offset + 1..];
        let instruction = Instruction::decode_operands(opcode, operands)
            .ok_or(DecodeError::Truncated { opcode, offset })?;
        self.pos = offset + instruction.encoded_len();
        Ok(instruction)
    }
}

impl Iterator for InstructionDecoder<'_> {
    type Item = Result<(usize, Instruction), DecodeError>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.decode_next()
    }
}
