use std::{
    collections::HashMap,
    io::{Cursor, Seek, SeekFrom},
};

use bytecode::{
    BytecodeReader, BytecodeSerializer, DecodeError, DeviceDescriptor, EncodeError, Instruction,
    LiteralPool, Program, SymbolTable, TaskDescriptor, TriggerData,
};
use object::{MapDescriptor, TypeTag, Value, VectorDescriptor};

fn symbols() -> SymbolTable {
    let mut symbols = SymbolTable::new();
    symbols.insert("main".into(), (0, vec!["blink".into()]));
    symbols.insert("blink".into(), (1, vec![]));
    symbols
}

fn sample_program() -> Program {
    let mut pool = LiteralPool::new();
    let greeting = pool.intern(Value::from("hello")).unwrap();
    let one = pool.intern(Value::Int(1)).unwrap();
    let half = pool.intern(Value::Float(0.5)).unwrap();

    let code = [
        Instruction::push(greeting),
        Instruction::trap(3, 1),
        Instruction::push(one),
        Instruction::push(half),
        Instruction::add(),
        Instruction::store(0),
        Instruction::jmp(0),
        Instruction::ret(),
    ];
    let mut offset = 0;
    let instructions = code
        .into_iter()
        .map(|instruction| {
            let at = offset;
            offset += instruction.encoded_len();
            (at, instruction)
        })
        .collect();

    let device = DeviceDescriptor {
        device_name: "btn".into(),
        device_type: TypeTag::from_name("BUTTON").unwrap(),
        controller: "PI_2".into(),
        ..DeviceDescriptor::default()
    };
    let task = TaskDescriptor {
        binded_devices: vec![device.clone()],
        in_devices: vec![device],
        triggers: vec![TriggerData {
            rule: vec!["btn".into()],
            id: "press".into(),
            ..TriggerData::default()
        }],
        ..TaskDescriptor::new("main", 0)
    };

    Program {
        metadata: symbols(),
        tasks: vec![task],
        literals: pool.into_values(),
        instructions,
    }
}

#[test]
fn program_survives_write_and_read() {
    let program = sample_program();
    let bytes = program.write_to(Cursor::new(Vec::new())).unwrap().into_inner();
    let loaded = BytecodeReader::read(Cursor::new(bytes)).unwrap();

    assert_eq!(loaded.metadata, program.metadata);
    assert_eq!(loaded.tasks, program.tasks);
    assert_eq!(loaded.literals, program.literals);
    assert_eq!(loaded.instructions, program.instructions);
    assert_eq!(loaded.function_name(1), Some("blink"));
}

#[test]
fn metadata_offset_points_at_the_header() {
    let mut s = BytecodeSerializer::new(Cursor::new(Vec::new()));
    let end = s.write_metadata(&symbols()).unwrap();
    s.write_header(&[TaskDescriptor::new("a", 0), TaskDescriptor::new("b", 9)])
        .unwrap();
    s.write_literal_pool(&[Value::Int(5)]).unwrap();
    let mut cursor = s.finish().unwrap();

    // Skip the metadata with one seek and read the task count.
    cursor.seek(SeekFrom::Start(end as u64)).unwrap();
    let bytes = cursor.into_inner();
    let at = end as usize;
    assert_eq!(u16::from_le_bytes([bytes[at], bytes[at + 1]]), 2);
}

#[test]
fn literal_map_is_written_in_index_order() {
    let mut literals = HashMap::new();
    literals.insert(Value::from("A"), 2);
    literals.insert(Value::from("B"), 0);
    literals.insert(Value::from("C"), 1);

    let mut s = BytecodeSerializer::new(Cursor::new(Vec::new()));
    s.write_metadata(&SymbolTable::new()).unwrap();
    s.write_header(&[]).unwrap();
    s.write_literal_map(&literals).unwrap();
    let bytes = s.finish().unwrap().into_inner();

    let program = BytecodeReader::read(Cursor::new(bytes)).unwrap();
    assert_eq!(
        program.literals,
        vec![Value::from("B"), Value::from("C"), Value::from("A")]
    );
    assert!(program.instructions.is_empty());
}

#[test]
fn container_literals_keep_their_contents() {
    let list = VectorDescriptor::from_values(TypeTag::Int, [Value::Int(1), Value::Int(2)]);
    let map = MapDescriptor::new(TypeTag::Float);
    map.emplace(&Value::from("x"), Value::Float(1.5)).unwrap();

    let mut s = BytecodeSerializer::new(Cursor::new(Vec::new()));
    s.write_metadata(&SymbolTable::new()).unwrap();
    s.write_header(&[]).unwrap();
    s.write_literal_pool(&[Value::from(list), Value::from(map)]).unwrap();
    let bytes = s.finish().unwrap().into_inner();

    let program = BytecodeReader::read(Cursor::new(bytes)).unwrap();
    let list = program.literals[0].as_vector().unwrap();
    assert_eq!(list.element_type(), TypeTag::Int);
    assert_eq!(list.values(), vec![Value::Int(1), Value::Int(2)]);
    let map = program.literals[1].as_map().unwrap();
    assert_eq!(map.get(&Value::from("x")).unwrap(), Value::Float(1.5));
}

#[test]
fn void_literal_poisons_the_artifact() {
    let mut s = BytecodeSerializer::new(Cursor::new(Vec::new()));
    s.write_metadata(&SymbolTable::new()).unwrap();
    s.write_header(&[]).unwrap();

    let err = s.write_literal_pool(&[Value::Void]).unwrap_err();
    assert!(matches!(err, EncodeError::Unrepresentable { index: 0, tag: TypeTag::Void }));
    assert!(matches!(
        s.write_instruction(&Instruction::ret()),
        Err(EncodeError::Poisoned)
    ));
}

#[test]
fn header_before_metadata_is_rejected() {
    let mut s = BytecodeSerializer::new(Cursor::new(Vec::new()));
    assert!(matches!(
        s.write_header(&[]),
        Err(EncodeError::OutOfOrder { .. })
    ));
}

#[test]
fn corrupted_metadata_offset_is_detected() {
    let program = sample_program();
    let mut bytes = program.write_to(Cursor::new(Vec::new())).unwrap().into_inner();
    bytes[0] = bytes[0].wrapping_add(1);

    assert!(matches!(
        BytecodeReader::read(Cursor::new(bytes)),
        Err(DecodeError::MetadataOffset { .. })
    ));
}

#[test]
fn garbage_in_the_code_section_is_reported() {
    let mut bytes = sample_program()
        .write_to(Cursor::new(Vec::new()))
        .unwrap()
        .into_inner();
    bytes.push(0xFF);

    assert!(matches!(
        BytecodeReader::read(Cursor::new(bytes)),
        Err(DecodeError::InvalidOpcode { byte: 0xFF, .. })
    ));
}
