//! An instruction-level emulator core for the WCH CH55x family of 8051
//! microcontrollers.
//!
//! [`Cpu`] owns the memory map and executes one instruction per
//! [`Cpu::tick`]. Peripherals plug in through [`SfrHook`] and [`XdataHook`];
//! architectural faults are reported to an [`ExceptionHandler`].

mod breakpoint;
mod cpu;
mod disasm;
mod exception;
mod hex;
mod interrupt;
pub mod memory;
mod opcode;
mod peripheral;
pub mod sfr;
mod traits;

pub use breakpoint::{Action, Breakpoints};
pub use cpu::Cpu;
pub use disasm::{Disassembly, disassemble};
pub use exception::{Exception, ExceptionEvent, Snapshot};
pub use hex::{HexError, HexImage, Segment};
pub use interrupt::{Interrupt, Level};
pub use memory::{Memory, RegisterIndexError, Sfr, Variant, bit_address, register_address};
pub use opcode::{BitOperand, Condition, Mode, OPCODES, Opcode, Operand, Operation, XAddr};
pub use peripheral::Serial;
pub use traits::{
    CpuContext, DefaultContext, ExceptionHandler, LogExceptions, PassThrough, SfrHook, XdataHook,
};
