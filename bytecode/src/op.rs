//! The opcode table.
//!
//! Every opcode is declared exactly once below, with its mnemonic,
//! argument record, constructor name and ordered `(field: type)` list.
//! [`opcode_table!`] expands that single listing into:
//!
//! - the dense [`Opcode`] enum (declaration order, plus `COUNT`),
//! - one `#[derive(Default)]` argument record per opcode,
//! - the [`Instruction`] enum tagging each record with its opcode,
//! - one typed constructor per opcode,
//! - the encoder (opcode byte, then each field little-endian in order),
//! - the matching decoder and mnemonic display.
//!
//! Adding an opcode is a one-line change here.

use std::{
    fmt,
    io::{self, Write},
};

use crate::operand::Operand;

macro_rules! opcode_table {
    ($(
        $(#[doc = $doc:literal])*
        $variant:ident($args:ident) = $mnemonic:literal, $ctor:ident {
            $($field:ident : $ty:ty),* $(,)?
        };
    )*) => {
        /// Bytecode opcodes, numbered densely in declaration order.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum Opcode {
            $($(#[doc = $doc])* $variant,)*
        }

        impl Opcode {
            pub const ALL: &'static [Opcode] = &[$(Opcode::$variant),*];
            pub const COUNT: usize = Self::ALL.len();

            pub const fn mnemonic(self) -> &'static str {
                match self {
                    $(Opcode::$variant => $mnemonic,)*
                }
            }

            /// Total byte width of the operands following the opcode byte.
            pub const fn operand_width(self) -> usize {
                match self {
                    $(Opcode::$variant => 0 $(+ <$ty as Operand>::WIDTH)*,)*
                }
            }

            pub fn from_mnemonic(mnemonic: &str) -> Option<Self> {
                Self::ALL.iter().copied().find(|op| op.mnemonic() == mnemonic)
            }
        }

        impl TryFrom<u8> for Opcode {
            type Error = u8;

            fn try_from(byte: u8) -> Result<Self, u8> {
                Self::ALL.get(byte as usize).copied().ok_or(byte)
            }
        }

        $(
            #[doc = concat!("Arguments of [`Opcode::", stringify!($variant), "`].")]
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
            pub struct $args {
                $(pub $field: $ty,)*
            }
        )*

        /// An opcode together with its argument record.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Instruction {
            $($variant($args),)*
        }

        impl Instruction {
            pub const fn opcode(&self) -> Opcode {
                match self {
                    $(Instruction::$variant(_) => Opcode::$variant,)*
                }
            }

            $(
                #[doc = concat!("`", $mnemonic, "`")]
                pub const fn $ctor($($field: $ty),*) -> Instruction {
                    Instruction::$variant($args { $($field),* })
                }
            )*

            /// The instruction for `opcode` with every argument defaulted.
            pub fn with_defaults(opcode: Opcode) -> Instruction {
                match opcode {
                    $(Opcode::$variant => Instruction::$variant($args::default()),)*
                }
            }

            /// Write the opcode byte followed by each argument in declared
            /// order. There is no length prefix.
            pub fn encode<W: Write>(&self, out: &mut W) -> io::Result<()> {
                out.write_all(&[self.opcode() as u8])?;
                match self {
                    $(Instruction::$variant(_args) => {
                        $(_args.$field.write_le(out)?;)*
                    })*
                }
                Ok(())
            }

            /// Rebuild the instruction for `opcode` from the operand bytes
            /// that follow it. `None` if `bytes` is too short.
            #[allow(unused_mut, unused_variables, unused_assignments)]
            pub(crate) fn decode_operands(opcode: Opcode, bytes: &[u8]) -> Option<Instruction> {
                match opcode {
                    $(Opcode::$variant => {
                        let mut at = 0;
                        $(
                            let $field = <$ty as Operand>::read_le(bytes.get(at..)?)?;
                            at += <$ty as Operand>::WIDTH;
                        )*
                        Some(Instruction::$variant($args { $($field),* }))
                    })*
                }
            }

            /// Operands rendered in declared order.
            pub fn operands(&self) -> Vec<String> {
                match self {
                    $(Instruction::$variant(_args) => vec![$(_args.$field.to_string()),*],)*
                }
            }
        }
    };
}

opcode_table! {
    /// Call a function. Operands: `address:u16`, `argc:u8`
    Call(CallArgs) = "CALL", call { address: u16, argc: u8 };
    /// Raise a task signal. Operands: `signal:u8`
    Emit(EmitArgs) = "EMIT", emit { signal: u8 };
    /// Push a literal pool entry. Operands: `index:u16`
    Push(PushArgs) = "PUSH", push { index: u16 };
    /// Build a fresh value of a type into a local slot.
    /// Operands: `index:u8`, `type_code:u8`
    Mktype(MktypeArgs) = "MKTYPE", mktype { index: u8, type_code: u8 };
    /// Pop into a local slot. Operands: `index:u8`
    Store(StoreArgs) = "STORE", store { index: u8 };
    /// Push a local slot. Operands: `index:u8`
    Load(LoadArgs) = "LOAD", load { index: u8 };
    /// Pop value, key and container; store the value at the key.
    Astore(AstoreArgs) = "ASTORE", astore {};
    /// Pop key and container; push the element at the key.
    Aload(AloadArgs) = "ALOAD", aload {};
    Not(NotArgs) = "NOT", not {};
    Neg(NegArgs) = "NEG", neg {};
    Or(OrArgs) = "OR", or {};
    And(AndArgs) = "AND", and {};
    Lt(LtArgs) = "LT", lt {};
    Le(LeArgs) = "LE", le {};
    Gt(GtArgs) = "GT", gt {};
    Ge(GeArgs) = "GE", ge {};
    Eq(EqArgs) = "EQ", eq {};
    Ne(NeArgs) = "NE", ne {};
    Add(AddArgs) = "ADD", add {};
    Sub(SubArgs) = "SUB", sub {};
    Mul(MulArgs) = "MUL", mul {};
    Div(DivArgs) = "DIV", div {};
    Mod(ModArgs) = "MOD", rem {};
    Exp(ExpArgs) = "EXP", exp {};
    /// Unconditional jump. Operands: `address:u16`
    Jmp(JmpArgs) = "JMP", jmp { address: u16 };
    /// Pop a bool; jump when it is false. Operands: `address:u16`
    Branch(BranchArgs) = "BRANCH", branch { address: u16 };
    Return(ReturnArgs) = "RETURN", ret {};
    /// Host call. Operands: `callnum:u16`, `argc:u8`
    Trap(TrapArgs) = "TRAP", trap { callnum: u16, argc: u8 };
    /// Host method call on the value on top of the stack.
    /// Operands: `callnum:u16`
    Mtrap(MtrapArgs) = "MTRAP", mtrap { callnum: u16 };
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}
