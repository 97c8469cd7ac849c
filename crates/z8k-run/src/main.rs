//! CLI entry point: load a raw binary whose image begins with the reset
//! vector, run it on a Z8001 or Z8002 core, and print the final state.

mod memory;

use std::env;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

use memory::{IoPorts, SharedRam};
use z8k_core::{CpuModel, Z8000};

const HELP_TEXT: &str = "\
Usage: z8k-run [options] <binary-file>

Options:
  -s, --segmented      Z8001 segmented mode (default: Z8002)
  -b, --base <hex>     Load address (default: 0x0000)
  -e, --entry <hex>    Override entry point (patches the reset vector)
  -t, --trace          Per-instruction disassembly trace
  -r, --regtrace       Register dump after each instruction
  -m, --memtrace       Memory access trace
  -i, --iotrace        I/O access trace
  -c, --cycles <n>     Max cycles to execute (default: unlimited)
  -d, --dump           Dump memory after execution
  -h, --help           Show this help

The binary must begin with the reset vector image:
  Z8002: 0x00..01 reserved, 0x02..03 FCW, 0x04..05 PC
  Z8001: 0x00..01 reserved, 0x02..03 FCW, 0x04..07 segmented PC";

#[derive(Debug, PartialEq, Eq)]
struct CliArgs {
    input: PathBuf,
    segmented: bool,
    base: u32,
    entry: Option<u32>,
    trace: bool,
    reg_trace: bool,
    mem_trace: bool,
    io_trace: bool,
    cycles: i64,
    dump: bool,
}

#[derive(Debug)]
enum ParseResult {
    Args(CliArgs),
    Help,
}

fn parse_hex(text: &str) -> Result<u32, String> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u32::from_str_radix(digits, 16).map_err(|_| format!("bad hex value: {text}"))
}

fn parse_args(mut args: impl Iterator<Item = OsString>) -> Result<ParseResult, String> {
    let mut input: Option<PathBuf> = None;
    let mut segmented = false;
    let mut base = 0u32;
    let mut entry = None;
    let mut trace = false;
    let mut reg_trace = false;
    let mut mem_trace = false;
    let mut io_trace = false;
    let mut cycles = -1i64;
    let mut dump = false;

    while let Some(arg) = args.next() {
        let text = arg.to_string_lossy().into_owned();
        match text.as_str() {
            "-h" | "--help" => return Ok(ParseResult::Help),
            "-s" | "--segmented" => segmented = true,
            "-t" | "--trace" => trace = true,
            "-r" | "--regtrace" => reg_trace = true,
            "-m" | "--memtrace" => mem_trace = true,
            "-i" | "--iotrace" => io_trace = true,
            "-d" | "--dump" => dump = true,
            "-b" | "--base" => {
                let value = args.next().ok_or("missing value for --base")?;
                base = parse_hex(&value.to_string_lossy())?;
            }
            "-e" | "--entry" => {
                let value = args.next().ok_or("missing value for --entry")?;
                entry = Some(parse_hex(&value.to_string_lossy())?);
            }
            "-c" | "--cycles" => {
                let value = args.next().ok_or("missing value for --cycles")?;
                cycles = value
                    .to_string_lossy()
                    .parse()
                    .map_err(|_| "bad cycle count".to_string())?;
            }
            _ if text.starts_with('-') => return Err(format!("unknown option: {text}")),
            _ => {
                if input.is_some() {
                    return Err(String::from("multiple input paths provided"));
                }
                input = Some(PathBuf::from(arg));
            }
        }
    }

    let input = input.ok_or("missing input path")?;
    Ok(ParseResult::Args(CliArgs {
        input,
        segmented,
        base,
        entry,
        trace,
        reg_trace,
        mem_trace,
        io_trace,
        cycles,
        dump,
    }))
}

/// Writes an entry point (and a default system-mode FCW when the slot is
/// still zero) into the reset vector.
fn patch_reset_vector(ram: &SharedRam, segmented: bool, entry: u32) {
    use z8k_core::MemoryBus;
    let mut mem = ram.clone();
    if segmented {
        let seg = (entry >> 16) & 0x7F;
        mem.write_word(4, 0x8000 | (seg as u16) << 8);
        mem.write_word(6, entry as u16);
        if mem.read_word(2) == 0 {
            mem.write_word(2, 0xC000);
        }
    } else {
        mem.write_word(4, entry as u16);
        if mem.read_word(2) == 0 {
            mem.write_word(2, 0x4000);
        }
    }
}

fn print_final_state(cpu: &Z8000) {
    let fcw = cpu.get_fcw();
    let pc = cpu.get_pc();
    println!();
    if cpu.model() == CpuModel::Z8001 {
        println!("=== Z8001 Registers ===");
        println!("PC=<<{:02X}>>{:04X}  FCW={fcw:04X}", (pc >> 16) & 0x7F, pc & 0xFFFF);
    } else {
        println!("=== Z8002 Registers ===");
        println!("PC={:04X}  FCW={fcw:04X}", pc & 0xFFFF);
    }
    let flag_names = [
        (z8k_core::F_C, 'C'),
        (z8k_core::F_Z, 'Z'),
        (z8k_core::F_S, 'S'),
        (z8k_core::F_PV, 'V'),
        (z8k_core::F_DA, 'D'),
        (z8k_core::F_H, 'H'),
    ];
    let rendered: String = flag_names
        .iter()
        .map(|&(bit, ch)| if fcw & bit != 0 { ch } else { '-' })
        .collect();
    println!("Flags: {rendered}");
    for row in 0..4 {
        let i = row * 4;
        println!(
            "R{i:<2}={:04X}  R{:<2}={:04X}  R{:<2}={:04X}  R{:<2}={:04X}",
            cpu.get_reg(i),
            i + 1,
            cpu.get_reg(i + 1),
            i + 2,
            cpu.get_reg(i + 2),
            i + 3,
            cpu.get_reg(i + 3),
        );
    }
}

fn run(args: &CliArgs) -> Result<(), String> {
    let image = std::fs::read(&args.input)
        .map_err(|e| format!("cannot read {}: {e}", args.input.display()))?;

    let mem_size = if args.segmented { 0x80_0000 } else { 0x1_0000 };
    let ram = SharedRam::new(mem_size);
    ram.borrow_mut().set_name("MEM");
    ram.borrow_mut().set_trace(args.mem_trace);
    ram.borrow_mut()
        .load(args.base, &image)
        .map_err(|e| e.to_string())?;

    println!("CPU: {}", if args.segmented { "Z8001 (segmented)" } else { "Z8002 (non-segmented)" });
    println!(
        "Loaded: {} ({} bytes) at {:#06x}",
        args.input.display(),
        image.len(),
        args.base
    );

    if let Some(entry) = args.entry {
        println!("Overriding entry point: {entry:#06x}");
        patch_reset_vector(&ram, args.segmented, entry);
    }

    let mut io = IoPorts::new();
    io.set_trace(args.io_trace);

    let mut cpu = if args.segmented { Z8000::z8001() } else { Z8000::z8002() };
    cpu.set_program_memory(Box::new(ram.clone()));
    cpu.set_io(Box::new(io));
    cpu.set_trace(args.trace);
    cpu.set_reg_trace(args.reg_trace);
    cpu.reset();

    println!("\nStarting execution...");
    if args.trace {
        println!("---");
    }

    cpu.run(args.cycles).map_err(|e| e.to_string())?;

    if args.trace {
        println!("---");
    }

    print_final_state(&cpu);
    println!("\nTotal cycles: {}", cpu.get_cycles());
    println!("Halted: {}", if cpu.is_halted() { "Yes" } else { "No" });

    if args.dump {
        println!("\n=== Memory Dump (first 256 bytes from load address) ===");
        ram.borrow().dump(args.base, 256);
    }

    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    match parse_args(env::args_os().skip(1)) {
        Ok(ParseResult::Help) => {
            println!("{HELP_TEXT}");
            ExitCode::SUCCESS
        }
        Ok(ParseResult::Args(args)) => match run(&args) {
            Ok(()) => ExitCode::SUCCESS,
            Err(error) => {
                log::error!("{error}");
                eprintln!("error: {error}");
                ExitCode::FAILURE
            }
        },
        Err(error) => {
            eprintln!("error: {error}");
            eprintln!("{HELP_TEXT}");
            ExitCode::from(2)
        }
    }
}
