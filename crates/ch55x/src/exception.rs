use thiserror::Error;

/// Architectural fault conditions detected while executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum Exception {
    /// Execution reached a registered breakpoint address.
    #[error("breakpoint reached")]
    Breakpoint,
    /// Stack address above 0x7F with no upper RAM, or SP rolled over.
    #[error("stack fault: SP above 0x7F with no upper RAM, or SP roll-over")]
    Stack,
    /// `MOV A,ACC` (`E5 E0`), which is not a valid encoding.
    #[error("invalid operation: ACC-to-A move")]
    AccToA,
    /// PSW (ignoring P and F0) differs at RETI from its value at interrupt entry.
    #[error("PSW not preserved over interrupt call")]
    IretPswMismatch,
    /// SP differs at RETI from its value after interrupt entry.
    #[error("SP not preserved over interrupt call")]
    IretSpMismatch,
    /// A differs at RETI from its value at interrupt entry.
    #[error("ACC not preserved over interrupt call")]
    IretAccMismatch,
    /// The reserved opcode 0xA5.
    #[error("invalid opcode 0xA5")]
    IllegalOpcode,
}

impl Exception {
    pub const ALL: [Exception; 7] = [
        Exception::Breakpoint,
        Exception::Stack,
        Exception::AccToA,
        Exception::IretPswMismatch,
        Exception::IretSpMismatch,
        Exception::IretAccMismatch,
        Exception::IllegalOpcode,
    ];
}

/// Register state captured when an event is raised. A copy, never a view
/// into the live CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Snapshot {
    /// Address of the instruction being executed.
    pub pc: u16,
    pub a: u8,
    pub psw: u8,
    pub sp: u8,
    pub cycles: u64,
}

/// One exception delivered to an [`ExceptionHandler`](crate::ExceptionHandler).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{kind} (PC={:04X} A={:02X} PSW={:02X} SP={:02X})", .state.pc, .state.a, .state.psw, .state.sp)]
pub struct ExceptionEvent {
    pub kind: Exception,
    pub state: Snapshot,
}
