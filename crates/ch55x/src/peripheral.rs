use std::sync::mpsc;

use tracing::trace;

use crate::memory::Sfr;
use crate::sfr::*;
use crate::traits::SfrHook;

/// Ticks between a write to `SBUF` and the byte leaving the port.
pub const SEND_DELAY: u16 = 10;
/// Ticks between polls of the input channel while receive is enabled.
pub const RECV_DELAY: u16 = 20;

/// A basic UART0 peripheral using `SCON` and `SBUF` that emulates a delayed
/// send/receive.
///
/// SCON:
///
/// `[SM0, SM1, SM2, REN, TB8, RB8, TI, RI]`
///
///  - REN: Receive enable
///  - TI: Transmit interrupt
///  - RI: Receive interrupt
///
/// `SCON` lives in the SFR bank, so `TI` and `RI` raise the UART0 interrupt
/// like the real flags do. `SBUF` is split into a transmit and a receive
/// register held here.
pub struct Serial {
    input: mpsc::Receiver<u8>,
    output: mpsc::Sender<u8>,
    received: u8,
    pending: Option<u8>,
    send_delay: u16,
    recv_delay: u16,
}

impl Serial {
    /// Returns the peripheral, the sender feeding its receive side and the
    /// receiver collecting everything it transmits.
    pub fn new() -> (Self, mpsc::Sender<u8>, mpsc::Receiver<u8>) {
        let (in_tx, in_rx) = mpsc::channel();
        let (out_tx, out_rx) = mpsc::channel();
        (
            Self {
                input: in_rx,
                output: out_tx,
                received: 0,
                pending: None,
                send_delay: 0,
                recv_delay: 0,
            },
            in_tx,
            out_rx,
        )
    }

    /// Whether a transmitted byte is still waiting to leave the port.
    pub fn is_sending(&self) -> bool {
        self.pending.is_some()
    }
}

impl SfrHook for Serial {
    fn interest(&self, addr: u8) -> bool {
        matches!(addr, SFR_SCON | SFR_SBUF)
    }

    fn read(&mut self, sfr: &mut Sfr, addr: u8) -> u8 {
        match addr {
            SFR_SBUF => self.received,
            _ => sfr.get(addr),
        }
    }

    fn write(&mut self, sfr: &mut Sfr, addr: u8, value: u8) {
        match addr {
            SFR_SBUF => {
                self.pending = Some(value);
                self.send_delay = 0;
            }
            _ => sfr.set(addr, value),
        }
    }

    fn tick(&mut self, sfr: &mut Sfr) {
        if let Some(value) = self.pending {
            self.send_delay += 1;
            if self.send_delay >= SEND_DELAY {
                self.send_delay = 0;
                self.pending = None;
                if self.output.send(value).is_err() {
                    trace!("serial: output closed, dropped {value:02X}");
                }
                sfr.set_bit(SFR_SCON, SCON_TI, true);
            }
        }

        if sfr.bit(SFR_SCON, SCON_REN) && !sfr.bit(SFR_SCON, SCON_RI) {
            self.recv_delay += 1;
            if self.recv_delay >= RECV_DELAY {
                self.recv_delay = 0;
                if let Ok(value) = self.input.try_recv() {
                    self.received = value;
                    sfr.set_bit(SFR_SCON, SCON_RI, true);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{Memory, Variant};
    use crate::traits::PassThrough;
    use crate::{Cpu, ExceptionEvent};

    fn tick(serial: &mut Serial, sfr: &mut Sfr, count: u16) {
        for _ in 0..count {
            serial.tick(sfr);
        }
    }

    #[test]
    fn send_sets_ti_after_delay() {
        let (mut serial, _input, output) = Serial::new();
        let mut sfr = Sfr::default();

        serial.write(&mut sfr, SFR_SBUF, b'A');
        assert!(serial.is_sending());
        tick(&mut serial, &mut sfr, SEND_DELAY - 1);
        assert!(!sfr.bit(SFR_SCON, SCON_TI));
        assert!(output.try_recv().is_err());

        tick(&mut serial, &mut sfr, 1);
        assert!(sfr.bit(SFR_SCON, SCON_TI));
        assert_eq!(output.try_recv(), Ok(b'A'));
        assert!(!serial.is_sending());
    }

    #[test]
    fn receive_requires_ren_and_clear_ri() {
        let (mut serial, input, _output) = Serial::new();
        let mut sfr = Sfr::default();
        input.send(0x31).unwrap();
        input.send(0x32).unwrap();

        tick(&mut serial, &mut sfr, RECV_DELAY * 2);
        assert!(!sfr.bit(SFR_SCON, SCON_RI));

        serial.write(&mut sfr, SFR_SCON, 1 << SCON_REN);
        tick(&mut serial, &mut sfr, RECV_DELAY);
        assert!(sfr.bit(SFR_SCON, SCON_RI));
        assert_eq!(serial.read(&mut sfr, SFR_SBUF), 0x31);

        // RI still set: the next byte waits
        tick(&mut serial, &mut sfr, RECV_DELAY * 2);
        assert_eq!(serial.read(&mut sfr, SFR_SBUF), 0x31);

        sfr.set_bit(SFR_SCON, SCON_RI, false);
        tick(&mut serial, &mut sfr, RECV_DELAY);
        assert_eq!(serial.read(&mut sfr, SFR_SBUF), 0x32);
    }

    #[test]
    fn firmware_writes_through_the_cpu() {
        let (serial, _input, output) = Serial::new();
        let context = ((serial, PassThrough), PassThrough, Vec::<ExceptionEvent>::new());
        let mut cpu = Cpu::with_context(Memory::new(Variant::Ch552), context);
        // MOV SBUF,#48; JNB TI,$; CLR TI; MOV SBUF,#69; SJMP $
        cpu.memory_mut().code_mut()[..13].copy_from_slice(&[
            0x75, 0x99, 0x48, 0x30, 0x99, 0xFD, 0xC2, 0x99, 0x75, 0x99, 0x69, 0x80, 0xFE,
        ]);
        for _ in 0..100 {
            cpu.tick();
        }
        assert_eq!(output.try_iter().collect::<Vec<_>>(), b"Hi");
        assert!(cpu.context().2.is_empty());
    }
}
