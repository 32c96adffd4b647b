use std::fmt;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use ch55x::{
    Action, Cpu, ExceptionEvent, ExceptionHandler, Memory, PassThrough, Serial, Variant,
};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Run a CH55x firmware image until it settles")]
struct Args {
    /// Intel HEX file to load
    #[arg(value_name = "HEX_FILE")]
    hex_file: PathBuf,

    /// Chip variant, which sets the code and xdata sizes
    #[arg(long, value_enum, default_value_t = Variant::Ch552)]
    variant: Variant,

    /// Run without the upper 128 bytes of internal RAM
    #[arg(long)]
    no_upper_ram: bool,

    /// Maximum number of instructions to execute
    #[arg(short, long, default_value = "1000000")]
    max_instructions: u64,

    /// Enable trace output
    #[arg(short, long)]
    trace: bool,

    /// Stop once internal RAM byte ADDR holds VALUE, e.g. `0x60=0xFA`
    #[arg(long, value_name = "ADDR=VALUE", value_parser = parse_until)]
    until: Option<Until>,

    /// What to do when the core raises an exception
    #[arg(long, value_enum, default_value_t = Policy::Warn)]
    policy: Policy,

    /// Dump registers whenever execution reaches ADDR
    #[arg(long = "break", value_name = "ADDR", value_parser = parse_address)]
    breakpoints: Vec<u16>,

    /// Text fed to the UART0 receiver
    #[arg(long)]
    input: Option<String>,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Policy {
    /// Log the exception and keep running
    Warn,
    /// Stop at the first exception
    Halt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Until {
    addr: u8,
    value: u8,
}

fn parse_number(text: &str) -> Result<u16, String> {
    let text = text.trim();
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.map_err(|e| format!("invalid number {text:?}: {e}"))
}

fn parse_byte(text: &str) -> Result<u8, String> {
    let value = parse_number(text)?;
    u8::try_from(value).map_err(|_| format!("{text:?} does not fit in a byte"))
}

fn parse_address(text: &str) -> Result<u16, String> {
    parse_number(text)
}

fn parse_until(text: &str) -> Result<Until, String> {
    let (addr, value) = text.split_once('=').ok_or("expected ADDR=VALUE")?;
    Ok(Until {
        addr: parse_byte(addr)?,
        value: parse_byte(value)?,
    })
}

/// Logs every exception and keeps them for the summary.
#[derive(Default)]
struct Faults {
    events: Vec<ExceptionEvent>,
}

impl ExceptionHandler for Faults {
    fn exception(&mut self, event: &ExceptionEvent) {
        warn!(kind = ?event.kind, "{event}");
        self.events.push(*event);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    Limit,
    Until,
    Spin,
    Stuck,
    Exception,
}

impl fmt::Display for Stop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stop::Limit => "instruction limit reached",
            Stop::Until => "stop condition met",
            Stop::Spin => "spinning on SJMP $",
            Stop::Stuck => "stuck on reserved opcode",
            Stop::Exception => "halted on exception",
        })
    }
}

type RunContext = ((Serial, PassThrough), PassThrough, Faults);

/// Ticks until a stop condition holds. Returns why, and how many instructions
/// executed; interrupt entries count, reserved-opcode faults do not.
fn run(cpu: &mut Cpu<RunContext>, args: &Args) -> (Stop, u64) {
    let mut executed = 0u64;
    let stop = loop {
        if executed >= args.max_instructions {
            break Stop::Limit;
        }
        if let Some(until) = args.until {
            if cpu.memory().read_indirect(until.addr) == until.value {
                break Stop::Until;
            }
        }
        if cpu.is_spinning() && !cpu.context().0.0.is_sending() {
            break Stop::Spin;
        }

        let seen = cpu.context().2.events.len();
        let cycles = cpu.tick();
        if args.policy == Policy::Halt && cpu.context().2.events.len() > seen {
            break Stop::Exception;
        }
        // only the reserved opcode costs nothing, and PC cannot move past it
        if cycles == 0 {
            break Stop::Stuck;
        }
        executed += 1;
    };
    (stop, executed)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.trace {
        EnvFilter::new("trace")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let mut memory = Memory::new(args.variant);
    if args.no_upper_ram {
        memory = memory.without_upper_ram();
    }
    let (serial, uart_in, uart_out) = Serial::new();
    let mut cpu: Cpu<RunContext> =
        Cpu::with_context(memory, ((serial, PassThrough), PassThrough, Faults::default()));

    let loaded = cpu
        .load_hex_file(&args.hex_file)
        .with_context(|| format!("loading {}", args.hex_file.display()))?;
    info!(bytes = loaded, variant = %args.variant, "loaded {}", args.hex_file.display());

    for addr in &args.breakpoints {
        cpu.breakpoints_mut().add(*addr, Action::TraceRegisters);
    }
    if let Some(input) = &args.input {
        for byte in input.bytes() {
            uart_in.send(byte)?;
        }
    }

    let (stop, executed) = run(&mut cpu, &args);

    println!(
        "Stopped at 0x{:04X} after {} instructions ({} cycles): {}",
        cpu.pc(),
        executed,
        cpu.cycles(),
        stop
    );
    println!(
        "  A={:02X}  B={:02X}  DPTR={:04X}  SP={:02X}  PSW={:02X}",
        cpu.a(),
        cpu.b(),
        cpu.dptr(),
        cpu.sp(),
        cpu.psw()
    );
    let mut regs = String::from(" ");
    for i in 0..8 {
        regs.push_str(&format!(" R{}={:02X}", i, cpu.r(i)?));
    }
    println!("{regs}");
    for line in cpu.decode_range(cpu.pc(), 4) {
        println!("  {line:#}");
    }

    let output: Vec<u8> = uart_out.try_iter().collect();
    if !output.is_empty() {
        println!("UART0: {}", String::from_utf8_lossy(&output));
    }

    let faults = &cpu.context().2.events;
    if !faults.is_empty() {
        println!("{} exception(s) raised", faults.len());
    }
    if stop == Stop::Exception {
        if let Some(event) = faults.last() {
            bail!("{event}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cpu_with(code: &[u8]) -> Cpu<RunContext> {
        let (serial, _input, _output) = Serial::new();
        let mut cpu = Cpu::with_context(
            Memory::new(Variant::Ch552),
            ((serial, PassThrough), PassThrough, Faults::default()),
        );
        cpu.memory_mut().code_mut()[..code.len()].copy_from_slice(code);
        cpu
    }

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["ch55x-run", "firmware.hex"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn stops_when_spinning() {
        let mut cpu = cpu_with(&[0x00, 0x00, 0x80, 0xFE]);
        assert_eq!(run(&mut cpu, &args(&[])), (Stop::Spin, 2));
        assert_eq!(cpu.pc(), 2);
    }

    #[test]
    fn reserved_opcode_is_not_counted_and_stops_once() {
        let mut cpu = cpu_with(&[0x00, 0xA5]);
        assert_eq!(run(&mut cpu, &args(&[])), (Stop::Stuck, 1));
        assert_eq!(cpu.context().2.events.len(), 1);
    }

    #[test]
    fn halt_policy_stops_on_first_exception() {
        // MOV A,ACC; NOP
        let mut cpu = cpu_with(&[0xE5, 0xE0, 0x00]);
        assert_eq!(run(&mut cpu, &args(&["--policy", "halt"])), (Stop::Exception, 0));
        assert_eq!(cpu.pc(), 2);
    }

    #[test]
    fn until_and_limit() {
        // MOV 60h,#FAh; SJMP -5 (back to 0)
        let mut cpu = cpu_with(&[0x75, 0x60, 0xFA, 0x80, 0xFB]);
        assert_eq!(run(&mut cpu, &args(&["--until", "0x60=0xFA"])), (Stop::Until, 1));

        let mut cpu = cpu_with(&[0x75, 0x60, 0x00, 0x80, 0xFB]);
        let limited = args(&["--max-instructions", "7"]);
        assert_eq!(run(&mut cpu, &limited), (Stop::Limit, 7));
    }

    #[test]
    fn numbers() {
        assert_eq!(parse_number("0x60"), Ok(0x60));
        assert_eq!(parse_number("0XfA"), Ok(0xFA));
        assert_eq!(parse_number("96"), Ok(96));
        assert!(parse_number("0xZZ").is_err());
        assert!(parse_byte("0x100").is_err());
    }

    #[test]
    fn until_condition() {
        assert_eq!(
            parse_until("0x60=0xFA"),
            Ok(Until {
                addr: 0x60,
                value: 0xFA
            })
        );
        assert!(parse_until("0x60").is_err());
        assert!(parse_until("0x60=300").is_err());
    }

    #[test]
    fn arguments() {
        let args = Args::try_parse_from([
            "ch55x-run",
            "blink.hex",
            "--variant",
            "ch554",
            "--until",
            "0x60=0xFA",
            "--policy",
            "halt",
            "--break",
            "0x0100",
        ])
        .unwrap();
        assert_eq!(args.variant, Variant::Ch554);
        assert_eq!(args.policy, Policy::Halt);
        assert_eq!(args.breakpoints, vec![0x0100]);
        assert_eq!(args.max_instructions, 1_000_000);
    }
}
