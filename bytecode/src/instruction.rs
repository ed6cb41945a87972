use core::fmt;

use object::{BinaryOp, UnaryOp};

use crate::{Instruction, Opcode};

/// Task signals carried by [`Opcode::Emit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Signal {
    Start = 0,
    Stop = 1,
}

impl TryFrom<u8> for Signal {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, u8> {
        match byte {
            0 => Ok(Signal::Start),
            1 => Ok(Signal::Stop),
            other => Err(other),
        }
    }
}

impl Instruction {
    /// Byte length of the encoded instruction, opcode included.
    pub const fn encoded_len(&self) -> usize {
        1 + self.opcode().operand_width()
    }

    pub const fn signal(signal: Signal) -> Instruction {
        Instruction::emit(signal as u8)
    }

    /// Code offset a `JMP` or `BRANCH` transfers control to. `CALL`
    /// addresses a function id, not an offset, so it has none.
    pub fn target(&self) -> Option<u16> {
        match self {
            Instruction::Jmp(args) => Some(args.address),
            Instruction::Branch(args) => Some(args.address),
            _ => None,
        }
    }
}

impl Opcode {
    /// The value operator an arithmetic, logic or comparison opcode runs.
    pub const fn binary_op(self) -> Option<BinaryOp> {
        Some(match self {
            Opcode::Or => BinaryOp::Or,
            Opcode::And => BinaryOp::And,
            Opcode::Lt => BinaryOp::Lt,
            Opcode::Le => BinaryOp::Le,
            Opcode::Gt => BinaryOp::Gt,
            Opcode::Ge => BinaryOp::Ge,
            Opcode::Eq => BinaryOp::Eq,
            Opcode::Ne => BinaryOp::Ne,
            Opcode::Add => BinaryOp::Add,
            Opcode::Sub => BinaryOp::Sub,
            Opcode::Mul => BinaryOp::Mul,
            Opcode::Div => BinaryOp::Div,
            Opcode::Mod => BinaryOp::Mod,
            Opcode::Exp => BinaryOp::Exp,
            _ => return None,
        })
    }

    pub const fn unary_op(self) -> Option<UnaryOp> {
        match self {
            Opcode::Not => Some(UnaryOp::Not),
            Opcode::Neg => Some(UnaryOp::Neg),
            _ => None,
        }
    }

    /// Opcode that evaluates `op`.
    pub const fn for_binary(op: BinaryOp) -> Opcode {
        match op {
            BinaryOp::Or => Opcode::Or,
            BinaryOp::And => Opcode::And,
            BinaryOp::Lt => Opcode::Lt,
            BinaryOp::Le => Opcode::Le,
            BinaryOp::Gt => Opcode::Gt,
            BinaryOp::Ge => Opcode::Ge,
            BinaryOp::Eq => Opcode::Eq,
            BinaryOp::Ne => Opcode::Ne,
            BinaryOp::Add => Opcode::Add,
            BinaryOp::Sub => Opcode::Sub,
            BinaryOp::Mul => Opcode::Mul,
            BinaryOp::Div => Opcode::Div,
            BinaryOp::Mod => Opcode::Mod,
            BinaryOp::Exp => Opcode::Exp,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.opcode().mnemonic())?;
        for operand in self.operands() {
            write!(f, " {operand}")?;
        }
        Ok(())
    }
}
