use clap::{Parser as ClapParser, Subcommand};
use std::{
    fs::File,
    io::{BufReader, BufWriter},
    process,
};

use bytecode::{
    BytecodeReader, DeviceDescriptor, DeviceKind, EncodeError, Instruction, LiteralPool,
    Program, Signal, SymbolTable, TaskDescriptor, TriggerData,
};
use object::{DeviceType, TypeTag, Value, VectorDescriptor};

const LITERAL_PRINT_LIMIT: usize = 60;

#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the sections of a compiled artifact
    Dump {
        #[arg(help = "The artifact to inspect")]
        file: String,
    },
    /// Write a small demo artifact
    Sample {
        #[arg(help = "Where to write the artifact")]
        out: String,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Dump { file } => {
            let input = match File::open(&file) {
                Ok(input) => input,
                Err(err) => {
                    eprintln!("Error opening '{}': {}", file, err);
                    process::exit(1);
                }
            };
            match BytecodeReader::read(BufReader::new(input)) {
                Ok(program) => dump_program(&file, &program),
                Err(err) => {
                    eprintln!("Error reading {}: {}", file, err);
                    process::exit(1);
                }
            }
        }
        Command::Sample { out } => {
            if let Err(err) = write_sample(&out) {
                eprintln!("Error writing {}: {}", out, err);
                process::exit(1);
            }
            log::info!("wrote sample artifact to {out}");
        }
    }
}

fn dump_program(file: &str, program: &Program) {
    println!("== {} ==", file);

    println!("-- functions --");
    let mut functions: Vec<_> = program.metadata.iter().collect();
    functions.sort_by_key(|(_, (id, _))| *id);
    for (name, (id, deps)) in functions {
        if deps.is_empty() {
            println!("[{id}] {name}");
        } else {
            println!("[{id}] {name} -> {}", deps.join(", "));
        }
    }

    println!("-- tasks --");
    for task in &program.tasks {
        println!(
            "{} @{} on {} ({} bound, {} in, {} out)",
            task.name,
            task.bytecode_offset,
            task.host_controller,
            task.binded_devices.len(),
            task.in_devices.len(),
            task.out_devices.len()
        );
        for device in &task.binded_devices {
            println!(
                "    - {}: {} on {} [{:?}, {:?}]",
                device.device_name,
                device.device_type,
                device.controller,
                device.device_kind,
                device.read_policy
            );
        }
        for trigger in &task.triggers {
            println!(
                "    ! {} (priority {}): {}",
                trigger.id,
                trigger.priority,
                trigger.rule.join(" ")
            );
        }
    }

    println!("-- literals --");
    for (idx, literal) in program.literals.iter().enumerate() {
        println!("[{idx}] {}: {}", literal.type_tag(), format_literal(literal));
    }

    println!("-- code --");
    for (offset, instruction) in &program.instructions {
        match instruction {
            Instruction::Push(args) => match program.literals.get(args.index as usize) {
                Some(literal) => println!("{offset:5}: {instruction}  ; {}", format_literal(literal)),
                None => println!("{offset:5}: {instruction}  ; <missing literal>"),
            },
            Instruction::Call(args) => match program.function_name(args.address) {
                Some(name) => println!("{offset:5}: {instruction}  ; {name}"),
                None => println!("{offset:5}: {instruction}"),
            },
            _ => match instruction.target() {
                Some(target) => println!("{offset:5}: {instruction}  ; -> {target}"),
                None => println!("{offset:5}: {instruction}"),
            },
        }
    }
}

fn format_literal(value: &Value) -> String {
    let text = match value {
        Value::String(s) => format!("{s:?}"),
        other => other.to_string(),
    };
    if text.chars().count() > LITERAL_PRINT_LIMIT {
        let short: String = text.chars().take(LITERAL_PRINT_LIMIT).collect();
        format!("{short}...")
    } else {
        text
    }
}

/// A button-driven task that toggles a light, plus a helper that logs.
fn sample_program() -> Result<Program, EncodeError> {
    let mut pool = LiteralPool::new();
    let state = pool.intern(Value::from("on"))?;
    let message = pool.intern(Value::from("light toggled"))?;
    let levels = pool.intern(Value::from(VectorDescriptor::from_values(
        TypeTag::Int,
        [Value::Int(0), Value::Int(50), Value::Int(100)],
    )))?;
    let ratio = pool.intern(Value::Float(0.5))?;

    let light_type = TypeTag::Device(DeviceType::Light).code() as u8;
    let code = [
        // main
        Instruction::signal(Signal::Start),
        Instruction::mktype(0, light_type),
        Instruction::load(0),
        Instruction::push(state),
        Instruction::load(0),
        Instruction::push(state),
        Instruction::aload(),
        Instruction::not(),
        Instruction::astore(),
        Instruction::push(levels),
        Instruction::push(ratio),
        Instruction::mtrap(2),
        Instruction::call(1, 0),
        Instruction::signal(Signal::Stop),
        Instruction::ret(),
        // log
        Instruction::push(message),
        Instruction::trap(0, 1),
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

    let button = DeviceDescriptor {
        device_name: "btn".into(),
        device_type: TypeTag::Device(DeviceType::Button),
        controller: "PI_1".into(),
        device_kind: DeviceKind::Interrupt,
        ..DeviceDescriptor::default()
    };
    let lamp = DeviceDescriptor {
        device_name: "lamp".into(),
        device_type: TypeTag::Device(DeviceType::Light),
        controller: "PI_2".into(),
        device_kind: DeviceKind::Actuator,
        is_const: false,
        ..DeviceDescriptor::default()
    };
    let task = TaskDescriptor {
        binded_devices: vec![button.clone(), lamp.clone()],
        in_devices: vec![button],
        out_devices: vec![lamp],
        triggers: vec![TriggerData {
            rule: vec!["btn".into()],
            id: "press".into(),
            ..TriggerData::default()
        }],
        ..TaskDescriptor::new("toggle", 0)
    };

    let mut metadata = SymbolTable::new();
    metadata.insert("toggle".into(), (0, vec!["log".into()]));
    metadata.insert("log".into(), (1, vec![]));

    Ok(Program {
        metadata,
        tasks: vec![task],
        literals: pool.into_values(),
        instructions,
    })
}

fn write_sample(path: &str) -> Result<(), EncodeError> {
    let program = sample_program()?;
    let out = BufWriter::new(File::create(path)?);
    program.write_to(out)?;
    Ok(())
}
