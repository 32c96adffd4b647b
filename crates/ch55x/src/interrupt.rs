use crate::memory::Sfr;
use crate::sfr::*;

/// Interrupt sources, in natural (same-level) priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Interrupt {
    Int0,
    Timer0,
    Int1,
    Timer1,
    Uart0,
    Timer2,
    Spi0,
    Tkey,
    Usb,
    Adc,
    Uart1,
    Pwmx,
    Gpio,
    Wdog,
}

impl Interrupt {
    pub const ALL: [Interrupt; 14] = [
        Interrupt::Int0,
        Interrupt::Timer0,
        Interrupt::Int1,
        Interrupt::Timer1,
        Interrupt::Uart0,
        Interrupt::Timer2,
        Interrupt::Spi0,
        Interrupt::Tkey,
        Interrupt::Usb,
        Interrupt::Adc,
        Interrupt::Uart1,
        Interrupt::Pwmx,
        Interrupt::Gpio,
        Interrupt::Wdog,
    ];

    /// Interrupt number as used by SDCC's `__interrupt(n)`.
    pub const fn number(self) -> u8 {
        self as u8
    }

    /// Code address the CPU jumps to on acceptance.
    pub const fn vector(self) -> u16 {
        0x0003 + 8 * self as u16
    }

    /// Enable bit as `(sfr, bit)`.
    const fn enable(self) -> (u8, u8) {
        let n = self as u8;
        if n < 6 { (SFR_IE, n) } else { (SFR_IE_EX, n - 6) }
    }

    /// Priority bit as `(sfr, bit)`. The watchdog has none and is always low.
    const fn priority(self) -> Option<(u8, u8)> {
        let n = self as u8;
        match self {
            Interrupt::Wdog => None,
            _ if n < 6 => Some((SFR_IP, n)),
            _ => Some((SFR_IP_EX, n - 6)),
        }
    }

    /// Request flag held in the SFR bank, for the classic 8051 sources.
    fn flagged(self, sfr: &Sfr) -> bool {
        match self {
            Interrupt::Int0 => sfr.bit(SFR_TCON, TCON_IE0),
            Interrupt::Timer0 => sfr.bit(SFR_TCON, TCON_TF0),
            Interrupt::Int1 => sfr.bit(SFR_TCON, TCON_IE1),
            Interrupt::Timer1 => sfr.bit(SFR_TCON, TCON_TF1),
            Interrupt::Uart0 => sfr.bit(SFR_SCON, SCON_RI) || sfr.bit(SFR_SCON, SCON_TI),
            Interrupt::Timer2 => sfr.bit(SFR_T2CON, T2CON_TF2) || sfr.bit(SFR_T2CON, T2CON_EXF2),
            _ => false,
        }
    }

    fn enabled(self, sfr: &Sfr) -> bool {
        let (addr, bit) = self.enable();
        sfr.bit(addr, bit)
    }

    fn level(self, sfr: &Sfr) -> Level {
        match self.priority() {
            Some((addr, bit)) if sfr.bit(addr, bit) => Level::High,
            _ => Level::Low,
        }
    }

    /// Clears the request flags the hardware acknowledges on entry: timer
    /// overflow, and external requests in edge-triggered mode.
    pub(crate) fn acknowledge(self, sfr: &mut Sfr) {
        match self {
            Interrupt::Timer0 => sfr.set_bit(SFR_TCON, TCON_TF0, false),
            Interrupt::Timer1 => sfr.set_bit(SFR_TCON, TCON_TF1, false),
            Interrupt::Int0 if sfr.bit(SFR_TCON, TCON_IT0) => {
                sfr.set_bit(SFR_TCON, TCON_IE0, false)
            }
            Interrupt::Int1 if sfr.bit(SFR_TCON, TCON_IT1) => {
                sfr.set_bit(SFR_TCON, TCON_IE1, false)
            }
            _ => {}
        }
    }
}

/// Interrupt priority level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low = 0,
    High = 1,
}

/// Registers captured at interrupt entry, checked again at RETI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Saved {
    pub a: u8,
    pub psw: u8,
    pub sp: u8,
}

/// Interrupt controller state that lives outside the SFR bank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct InterruptState {
    /// Host-raised requests, one bit per [`Interrupt`].
    requests: u16,
    /// Active handler per level, with the registers saved on entry.
    active: [Option<Saved>; 2],
    /// Set by RETI and IE/IP writes: the next instruction runs before any
    /// interrupt is accepted.
    hold: bool,
}

impl InterruptState {
    pub fn request(&mut self, irq: Interrupt) {
        self.requests |= 1 << irq.number();
    }

    pub fn hold(&mut self) {
        self.hold = true;
    }

    /// Consumes the hold flag, returning whether it was set.
    pub fn take_hold(&mut self) -> bool {
        std::mem::take(&mut self.hold)
    }

    pub fn is_active(&self, level: Level) -> bool {
        self.active[level as usize].is_some()
    }

    fn pending(&self, irq: Interrupt, sfr: &Sfr) -> bool {
        self.requests & (1 << irq.number()) != 0 || irq.flagged(sfr)
    }

    /// Picks the source to accept at this instruction boundary, if any.
    pub fn poll(&self, sfr: &Sfr) -> Option<(Interrupt, Level)> {
        if !sfr.bit(SFR_IE, IE_EA) || self.is_active(Level::High) {
            return None;
        }
        let mut low = None;
        for irq in Interrupt::ALL {
            if !irq.enabled(sfr) || !self.pending(irq, sfr) {
                continue;
            }
            match irq.level(sfr) {
                Level::High => return Some((irq, Level::High)),
                Level::Low if low.is_none() => low = Some((irq, Level::Low)),
                Level::Low => {}
            }
        }
        if self.is_active(Level::Low) {
            return None;
        }
        low
    }

    pub fn enter(&mut self, irq: Interrupt, level: Level, saved: Saved) {
        self.requests &= !(1 << irq.number());
        self.active[level as usize] = Some(saved);
    }

    /// Leaves the innermost active handler, returning what was saved for it.
    pub fn leave(&mut self) -> Option<Saved> {
        self.active[Level::High as usize]
            .take()
            .or_else(|| self.active[Level::Low as usize].take())
    }
}
