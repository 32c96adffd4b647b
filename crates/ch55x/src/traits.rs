use tracing::warn;

use crate::exception::ExceptionEvent;
use crate::memory::{Sfr, wrap};

/// Access to special-function registers addressed directly by instructions.
///
/// The CPU owns the SFR bank and hands it to the hook, so a hook can keep
/// its state in the bank (making it visible to interrupt polling) or
/// somewhere else entirely. Implicit accumulator, PSW, SP, B and DPTR
/// accesses do not go through the hook.
pub trait SfrHook {
    /// Returns whether the given address is of interest to this hook. Only
    /// consulted when hooks are composed as a tuple.
    fn interest(&self, _addr: u8) -> bool {
        true
    }

    /// Read the register at `addr` (0x80..=0xFF).
    fn read(&mut self, sfr: &mut Sfr, addr: u8) -> u8 {
        sfr.get(addr)
    }

    /// Write `value` to the register at `addr` (0x80..=0xFF).
    fn write(&mut self, sfr: &mut Sfr, addr: u8, value: u8) {
        sfr.set(addr, value)
    }

    /// Perform any necessary internal state updates between CPU steps.
    fn tick(&mut self, _sfr: &mut Sfr) {}
}

/// Access to external data memory (`MOVX`).
pub trait XdataHook {
    fn read(&mut self, xdata: &[u8], addr: u16) -> u8 {
        xdata[wrap(addr, xdata.len())]
    }

    fn write(&mut self, xdata: &mut [u8], addr: u16, value: u8) {
        let index = wrap(addr, xdata.len());
        xdata[index] = value;
    }
}

/// Receives architectural exceptions synchronously, during the tick that
/// raised them. Execution always continues afterwards; halting is up to the
/// code driving [`Cpu::tick`](crate::Cpu::tick).
pub trait ExceptionHandler {
    fn exception(&mut self, event: &ExceptionEvent);
}

/// Default hook: reads and writes go straight to the backing memory.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassThrough;

impl SfrHook for PassThrough {}

impl XdataHook for PassThrough {}

/// Default exception handler: logs each event and carries on.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogExceptions;

impl ExceptionHandler for LogExceptions {
    fn exception(&mut self, event: &ExceptionEvent) {
        warn!(kind = ?event.kind, "{event}");
    }
}

/// Collects every event, for inspection after the tick returns.
impl ExceptionHandler for Vec<ExceptionEvent> {
    fn exception(&mut self, event: &ExceptionEvent) {
        self.push(*event);
    }
}

/// Discards every event.
impl ExceptionHandler for () {
    fn exception(&mut self, _event: &ExceptionEvent) {}
}

/// Composes two SFR hooks: each address goes to the first hook that claims
/// it.
impl<A, B> SfrHook for (A, B)
where
    A: SfrHook,
    B: SfrHook,
{
    fn interest(&self, addr: u8) -> bool {
        self.0.interest(addr) || self.1.interest(addr)
    }
    fn read(&mut self, sfr: &mut Sfr, addr: u8) -> u8 {
        if self.0.interest(addr) {
            self.0.read(sfr, addr)
        } else if self.1.interest(addr) {
            self.1.read(sfr, addr)
        } else {
            sfr.get(addr)
        }
    }
    fn write(&mut self, sfr: &mut Sfr, addr: u8, value: u8) {
        if self.0.interest(addr) {
            self.0.write(sfr, addr, value)
        } else if self.1.interest(addr) {
            self.1.write(sfr, addr, value)
        } else {
            sfr.set(addr, value)
        }
    }
    fn tick(&mut self, sfr: &mut Sfr) {
        self.0.tick(sfr);
        self.1.tick(sfr);
    }
}

/// The hooks installed in a CPU. This can be implemented by hand, but is most
/// conveniently implemented using a tuple of `(SfrHook, XdataHook, ExceptionHandler)`.
pub trait CpuContext {
    type Sfr: SfrHook;
    type Xdata: XdataHook;
    type Exceptions: ExceptionHandler;

    fn sfr_hook(&mut self) -> &mut Self::Sfr;
    fn xdata_hook(&mut self) -> &mut Self::Xdata;
    fn exceptions(&mut self) -> &mut Self::Exceptions;
}

impl<S: SfrHook, X: XdataHook, E: ExceptionHandler> CpuContext for (S, X, E) {
    type Sfr = S;
    type Xdata = X;
    type Exceptions = E;
    fn sfr_hook(&mut self) -> &mut Self::Sfr {
        &mut self.0
    }
    fn xdata_hook(&mut self) -> &mut Self::Xdata {
        &mut self.1
    }
    fn exceptions(&mut self) -> &mut Self::Exceptions {
        &mut self.2
    }
}

/// Pass-through memory access with logged exceptions.
pub type DefaultContext = (PassThrough, PassThrough, LogExceptions);
