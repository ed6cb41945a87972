//! Writes a program artifact.
//!
//! ```text
//! [u32 metadata_end]
//! [archived BTreeMap<u16, (String, Vec<String>)>]    function id -> name, deps
//! [u16 task_count]   [archived TaskDescriptor]*
//! [u16 literal_count][archived Value]*                index = position
//! [u8 opcode, operands...]*                           until end of file
//! ```
//!
//! Sections must be written in that order. `metadata_end` is the absolute
//! stream position right after the metadata map, so a reader can skip the
//! map with a single seek. The stream is owned by one serializer; nothing
//! here synchronizes concurrent writers.

use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    io::{Seek, SeekFrom, Write},
};

use object::Value;

use crate::{EncodeError, Instruction, TaskDescriptor};

/// Function table supplied by the compiler: name -> (id, dependencies).
pub type SymbolTable = HashMap<String, (u16, Vec<String>)>;

/// Section currently accepted by the serializer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Metadata,
    Header,
    Literals,
    Instructions,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Metadata => "metadata",
            Phase::Header => "header",
            Phase::Literals => "literal pool",
            Phase::Instructions => "instruction",
        })
    }
}

pub struct BytecodeSerializer<W: Write + Seek> {
    out: W,
    phase: Phase,
    poisoned: bool,
}

impl<W: Write + Seek> BytecodeSerializer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            phase: Phase::Metadata,
            poisoned: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Write the function table and backpatch its end offset. Returns that
    /// offset.
    pub fn write_metadata(&mut self, symbols: &SymbolTable) -> Result<u32, EncodeError> {
        self.guarded(Phase::Metadata, |s| {
            let by_id = index_by_id(symbols)?;

            let start = s.out.stream_position()?;
            s.out.write_all(&0u32.to_le_bytes())?;
            bincode::serialize_into(&mut s.out, &by_id)?;
            let end = s.out.stream_position()?;
            let end_offset = u32::try_from(end).map_err(|_| EncodeError::TooMany {
                what: "metadata bytes",
                count: end as usize,
                max: u32::MAX as usize,
            })?;

            s.out.seek(SeekFrom::Start(start))?;
            s.out.write_all(&end_offset.to_le_bytes())?;
            s.out.seek(SeekFrom::Start(end))?;

            log::debug!("metadata: {} functions, ends at {end_offset}", by_id.len());
            s.phase = Phase::Header;
            Ok(end_offset)
        })
    }

    pub fn write_header(&mut self, tasks: &[TaskDescriptor]) -> Result<(), EncodeError> {
        self.guarded(Phase::Header, |s| {
            s.write_count("task descriptors", tasks.len())?;
            for task in tasks {
                bincode::serialize_into(&mut s.out, task)?;
            }
            log::debug!("header: {} tasks", tasks.len());
            s.phase = Phase::Literals;
            Ok(())
        })
    }

    /// Write literals in the given order; the i-th literal becomes pool
    /// index i. `Void` has no on-disk form and is rejected.
    pub fn write_literal_pool<'a, I>(&mut self, literals: I) -> Result<(), EncodeError>
    where
        I: IntoIterator<Item = &'a Value>,
    {
        let literals: Vec<&Value> = literals.into_iter().collect();
        self.guarded(Phase::Literals, |s| {
            if let Some(index) = literals.iter().position(|v| v.is_void()) {
                return Err(EncodeError::Unrepresentable {
                    index,
                    tag: literals[index].type_tag(),
                });
            }
            s.write_count("literals", literals.len())?;
            for literal in &literals {
                bincode::serialize_into(&mut s.out, *literal)?;
            }
            log::debug!("literal pool: {} entries", literals.len());
            s.phase = Phase::Instructions;
            Ok(())
        })
    }

    /// Write a deduplicated `literal -> index` map, ordered by index.
    /// Indices must cover `0..len` exactly.
    pub fn write_literal_map(&mut self, literals: &HashMap<Value, u16>) -> Result<(), EncodeError> {
        let mut ordered: Vec<(&Value, u16)> = literals.iter().map(|(v, &i)| (v, i)).collect();
        ordered.sort_by_key(|&(_, index)| index);

        for (expected, &(_, found)) in ordered.iter().enumerate() {
            if expected != found as usize {
                self.poisoned = true;
                return Err(EncodeError::LiteralIndexGap {
                    expected: expected as u16,
                    found,
                });
            }
        }
        self.write_literal_pool(ordered.into_iter().map(|(value, _)| value))
    }

    pub fn write_instruction(&mut self, instruction: &Instruction) -> Result<(), EncodeError> {
        self.guarded(Phase::Instructions, |s| {
            log::trace!("emit {instruction}");
            instruction.encode(&mut s.out)?;
            Ok(())
        })
    }

    pub fn write_instructions<'a, I>(&mut self, code: I) -> Result<(), EncodeError>
    where
        I: IntoIterator<Item = &'a Instruction>,
    {
        code.into_iter()
            .try_for_each(|instruction| self.write_instruction(instruction))
    }

    /// Flush and hand back the stream. A program with no code is valid.
    pub fn finish(mut self) -> Result<W, EncodeError> {
        if self.poisoned {
            return Err(EncodeError::Poisoned);
        }
        if self.phase != Phase::Instructions {
            return Err(EncodeError::OutOfOrder {
                attempted: Phase::Instructions,
                current: self.phase,
            });
        }
        self.out.flush()?;
        Ok(self.out)
    }

    // ── helpers ────────────────────────────────────────────────────

    /// Run `write` if the serializer is in `phase`, poisoning it on error.
    fn guarded<T>(
        &mut self,
        phase: Phase,
        write: impl FnOnce(&mut Self) -> Result<T, EncodeError>,
    ) -> Result<T, EncodeError> {
        if self.poisoned {
            return Err(EncodeError::Poisoned);
        }
        if self.phase != phase {
            return Err(EncodeError::OutOfOrder {
                attempted: phase,
                current: self.phase,
            });
        }
        let result = write(self);
        self.poisoned = result.is_err();
        result
    }

    fn write_count(&mut self, what: &'static str, count: usize) -> Result<(), EncodeError> {
        let count = u16::try_from(count).map_err(|_| EncodeError::TooMany {
            what,
            count,
            max: u16::MAX as usize,
        })?;
        self.out.write_all(&count.to_le_bytes())?;
        Ok(())
    }
}

/// Re-key the symbol table by id so the archive is compact and ordered.
fn index_by_id(symbols: &SymbolTable) -> Result<BTreeMap<u16, (&str, &[String])>, EncodeError> {
    let mut by_id: BTreeMap<u16, (&str, &[String])> = BTreeMap::new();
    for (name, (id, deps)) in symbols {
        if let Some((other, _)) = by_id.insert(*id, (name.as_str(), deps.as_slice())) {
            let (first, second) = if other < name.as_str() {
                (other, name.as_str())
            } else {
                (name.as_str(), other)
            };
            return Err(EncodeError::DuplicateFunctionId {
                id: *id,
                first: first.to_owned(),
                second: second.to_owned(),
            });
        }
    }
    Ok(by_id)
}
