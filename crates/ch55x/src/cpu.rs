use std::path::Path;

use tracing::{debug, info, trace};

use crate::breakpoint::Breakpoints;
use crate::disasm::{Disassembly, disassemble};
use crate::exception::{Exception, ExceptionEvent, Snapshot};
use crate::hex::{HexError, HexImage};
use crate::interrupt::{Interrupt, InterruptState, Level, Saved};
use crate::memory::{
    Memory, RegisterIndexError, Variant, bank_base, bit_address, register_address, wrap,
};
use crate::opcode::{BitOperand, Condition, Opcode, Operand, Operation, XAddr};
use crate::sfr::*;
use crate::traits::{CpuContext, DefaultContext, ExceptionHandler, SfrHook, XdataHook};

/// Cycles consumed by the hardware LCALL of an accepted interrupt.
const INTERRUPT_ENTRY_CYCLES: u32 = 2;

/// `SJMP $`: the idle loop firmware parks in when it is done.
const SPIN: [u8; 2] = [0x80, 0xFE];

/// One CH55x core: registers, memory, interrupt state and the hooks it was
/// built with.
pub struct Cpu<C: CpuContext = DefaultContext> {
    pc: u16,
    cycles: u64,
    memory: Memory,
    interrupts: InterruptState,
    breakpoints: Breakpoints,
    context: C,
}

impl Cpu {
    /// A CPU for `variant` with pass-through hooks and logged exceptions.
    pub fn new(variant: Variant) -> Self {
        Self::with_context(Memory::new(variant), DefaultContext::default())
    }
}

impl<C: CpuContext> Cpu<C> {
    /// Builds a CPU around `memory` and a set of hooks, then applies a
    /// power-on reset.
    pub fn with_context(memory: Memory, context: C) -> Self {
        let mut cpu = Self {
            pc: 0,
            cycles: 0,
            memory,
            interrupts: InterruptState::default(),
            breakpoints: Breakpoints::default(),
            context,
        };
        cpu.reset(true);
        cpu
    }

    /// Power-on reset when `wipe`, otherwise a soft reset that only returns
    /// PC to zero and drops interrupt bookkeeping. Breakpoints survive both.
    pub fn reset(&mut self, wipe: bool) {
        if wipe {
            self.memory.wipe();
            self.cycles = 0;
        }
        self.pc = 0;
        self.interrupts = InterruptState::default();
    }

    /// Executes one instruction, or accepts one interrupt, and returns the
    /// cycles consumed.
    pub fn tick(&mut self) -> u32 {
        self.context.sfr_hook().tick(self.memory.sfr_mut());

        if !self.interrupts.take_hold() {
            if let Some((irq, level)) = self.interrupts.poll(self.memory.sfr()) {
                self.enter_interrupt(irq, level);
                self.cycles += INTERRUPT_ENTRY_CYCLES as u64;
                return INTERRUPT_ENTRY_CYCLES;
            }
        }

        let pc = self.pc;
        if self.breakpoints.contains(pc) {
            self.raise(Exception::Breakpoint);
            let snapshot = self.snapshot();
            self.breakpoints.run(&self.memory, &snapshot);
        }

        let opcode = Opcode::of(self.memory.code_byte(pc));
        if opcode.is_illegal() {
            self.raise(Exception::IllegalOpcode);
            return 0;
        }

        if self.breakpoints.trace_instructions() {
            info!("{:#}", self.decode(pc));
        } else if tracing::enabled!(tracing::Level::TRACE) {
            trace!("{:#}", self.decode(pc));
        }

        let mut bytes = [0u8; 3];
        for (offset, byte) in bytes.iter_mut().enumerate().take(opcode.len as usize) {
            *byte = self.memory.code_byte(pc.wrapping_add(offset as u16));
        }

        let next = self.execute(opcode, bytes);
        self.pc = wrap(next, self.memory.code().len()) as u16;

        let a = self.a();
        self.set_psw_flag(PSW_P, a.count_ones() % 2 == 1);

        let cycles = opcode.cycles as u32;
        self.cycles += cycles as u64;
        cycles
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    /// Sets PC, reduced to the code memory size.
    pub fn set_pc(&mut self, pc: u16) {
        self.pc = wrap(pc, self.memory.code().len()) as u16;
    }

    /// Total cycles returned by [`Cpu::tick`] since the last power-on reset.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn variant(&self) -> Variant {
        self.memory.variant()
    }

    pub fn a(&self) -> u8 {
        self.memory.sfr().get(SFR_ACC)
    }

    pub fn set_a(&mut self, value: u8) {
        self.memory.sfr_mut().set(SFR_ACC, value);
    }

    pub fn b(&self) -> u8 {
        self.memory.sfr().get(SFR_B)
    }

    pub fn set_b(&mut self, value: u8) {
        self.memory.sfr_mut().set(SFR_B, value);
    }

    pub fn psw(&self) -> u8 {
        self.memory.sfr().get(SFR_PSW)
    }

    pub fn set_psw(&mut self, value: u8) {
        self.memory.sfr_mut().set(SFR_PSW, value);
    }

    /// A single PSW bit, e.g. [`PSW_C`].
    pub fn psw_flag(&self, bit: u8) -> bool {
        self.memory.sfr().bit(SFR_PSW, bit)
    }

    pub fn set_psw_flag(&mut self, bit: u8, value: bool) {
        self.memory.sfr_mut().set_bit(SFR_PSW, bit, value);
    }

    pub fn sp(&self) -> u8 {
        self.memory.sfr().get(SFR_SP)
    }

    pub fn set_sp(&mut self, value: u8) {
        self.memory.sfr_mut().set(SFR_SP, value);
    }

    pub fn dptr(&self) -> u16 {
        u16::from_be_bytes([self.memory.sfr().get(SFR_DPH), self.memory.sfr().get(SFR_DPL)])
    }

    pub fn set_dptr(&mut self, value: u16) {
        let [high, low] = value.to_be_bytes();
        self.memory.sfr_mut().set(SFR_DPH, high);
        self.memory.sfr_mut().set(SFR_DPL, low);
    }

    /// Register `Rn` of the bank selected by PSW.
    pub fn r(&self, n: u8) -> Result<u8, RegisterIndexError> {
        let addr = register_address(self.psw(), n)?;
        Ok(self.memory.lower()[addr as usize])
    }

    pub fn set_r(&mut self, n: u8, value: u8) -> Result<(), RegisterIndexError> {
        let addr = register_address(self.psw(), n)?;
        self.memory.lower_mut()[addr as usize] = value;
        Ok(())
    }

    /// Raw SFR bank contents at `addr`, without going through the hook.
    pub fn sfr_value(&self, addr: u8) -> u8 {
        self.memory.sfr().get(addr)
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    pub fn breakpoints(&self) -> &Breakpoints {
        &self.breakpoints
    }

    pub fn breakpoints_mut(&mut self) -> &mut Breakpoints {
        &mut self.breakpoints
    }

    /// A copy of the registers reported with exceptions.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            pc: self.pc,
            a: self.a(),
            psw: self.psw(),
            sp: self.sp(),
            cycles: self.cycles,
        }
    }

    /// Latches a request for `irq`. It is accepted at the next instruction
    /// boundary where it is enabled and outranks any active handler.
    pub fn raise_interrupt(&mut self, irq: Interrupt) {
        self.interrupts.request(irq);
    }

    /// Whether PC sits on an `SJMP $`.
    pub fn is_spinning(&self) -> bool {
        self.memory.code_byte(self.pc) == SPIN[0]
            && self.memory.code_byte(self.pc.wrapping_add(1)) == SPIN[1]
    }

    pub fn decode_pc(&self) -> Disassembly {
        self.decode(self.pc)
    }

    pub fn decode(&self, pc: u16) -> Disassembly {
        disassemble(self.memory.code(), pc)
    }

    /// Up to `count` instructions starting at `start`.
    pub fn decode_range(&self, start: u16, count: usize) -> Vec<Disassembly> {
        let mut pc = start;
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            let line = self.decode(pc);
            pc = pc.wrapping_add(line.bytes.len() as u16);
            out.push(line);
        }
        out
    }

    /// Loads Intel-HEX text into code memory and returns the number of bytes
    /// written. Code memory is untouched if anything fails to validate.
    pub fn load_hex(&mut self, source: &str) -> Result<usize, HexError> {
        let image = HexImage::parse(source)?;
        image.apply(self.memory.code_mut())
    }

    pub fn load_hex_file(&mut self, path: impl AsRef<Path>) -> Result<usize, HexError> {
        let image = HexImage::read(path)?;
        image.apply(self.memory.code_mut())
    }

    fn raise(&mut self, kind: Exception) {
        let event = ExceptionEvent {
            kind,
            state: self.snapshot(),
        };
        self.context.exceptions().exception(&event);
    }

    fn enter_interrupt(&mut self, irq: Interrupt, level: Level) {
        irq.acknowledge(self.memory.sfr_mut());
        let pc = self.pc;
        self.push16(pc);
        let saved = Saved {
            a: self.a(),
            psw: self.psw(),
            sp: self.sp(),
        };
        self.interrupts.enter(irq, level, saved);
        debug!(?irq, ?level, "interrupt entry from {pc:04X}");
        self.set_pc(irq.vector());
    }

    fn reti(&mut self) -> u16 {
        if let Some(saved) = self.interrupts.leave() {
            if self.sp() != saved.sp {
                self.raise(Exception::IretSpMismatch);
            }
            if self.a() != saved.a {
                self.raise(Exception::IretAccMismatch);
            }
            if (self.psw() ^ saved.psw) & PSW_PRESERVED_MASK != 0 {
                self.raise(Exception::IretPswMismatch);
            }
        }
        self.interrupts.hold();
        let target = self.pop16();
        debug!("interrupt return to {target:04X}");
        target
    }

    #[inline(always)]
    fn reg(&self, n: u8) -> u8 {
        self.memory.lower()[(bank_base(self.psw()) + (n & 7)) as usize]
    }

    #[inline(always)]
    fn set_reg(&mut self, n: u8, value: u8) {
        let addr = bank_base(self.psw()) + (n & 7);
        self.memory.lower_mut()[addr as usize] = value;
    }

    /// Direct addressing: lower RAM below 0x80, the SFR hook above.
    fn read_direct(&mut self, addr: u8) -> u8 {
        if addr < 0x80 {
            self.memory.lower()[addr as usize]
        } else {
            self.context.sfr_hook().read(self.memory.sfr_mut(), addr)
        }
    }

    fn write_direct(&mut self, addr: u8, value: u8) {
        if addr < 0x80 {
            self.memory.lower_mut()[addr as usize] = value;
        } else {
            if matches!(addr, SFR_IE | SFR_IP | SFR_IE_EX | SFR_IP_EX) {
                self.interrupts.hold();
            }
            self.context
                .sfr_hook()
                .write(self.memory.sfr_mut(), addr, value);
        }
    }

    fn read_bit(&mut self, bit: u8) -> bool {
        let (addr, pos) = bit_address(bit);
        self.read_direct(addr) & (1 << pos) != 0
    }

    fn write_bit(&mut self, bit: u8, value: bool) {
        let (addr, pos) = bit_address(bit);
        let byte = self.read_direct(addr);
        let byte = if value {
            byte | 1 << pos
        } else {
            byte & !(1 << pos)
        };
        self.write_direct(addr, byte);
    }

    fn load(&mut self, operand: Operand, bytes: &[u8; 3]) -> u8 {
        match operand {
            Operand::A => self.a(),
            Operand::R(n) => self.reg(n),
            Operand::Indirect(i) => self.memory.read_indirect(self.reg(i)),
            Operand::Direct(k) => self.read_direct(bytes[k as usize]),
            Operand::Immediate(k) => bytes[k as usize],
        }
    }

    fn store(&mut self, operand: Operand, bytes: &[u8; 3], value: u8) {
        match operand {
            Operand::A => self.set_a(value),
            Operand::R(n) => self.set_reg(n, value),
            Operand::Indirect(i) => {
                let addr = self.reg(i);
                self.memory.write_indirect(addr, value);
            }
            Operand::Direct(k) => self.write_direct(bytes[k as usize], value),
            // never a destination in the table
            Operand::Immediate(_) => {}
        }
    }

    fn push(&mut self, value: u8) {
        let sp = self.sp().wrapping_add(1);
        self.set_sp(sp);
        if sp == 0 || (sp >= 0x80 && !self.memory.has_upper_ram()) {
            self.raise(Exception::Stack);
        }
        self.memory.write_indirect(sp, value);
    }

    fn push16(&mut self, value: u16) {
        let [high, low] = value.to_be_bytes();
        self.push(low);
        self.push(high);
    }

    fn pop(&mut self) -> u8 {
        let sp = self.sp();
        if sp >= 0x80 && !self.memory.has_upper_ram() {
            self.raise(Exception::Stack);
        }
        let value = self.memory.read_indirect(sp);
        self.set_sp(sp.wrapping_sub(1));
        value
    }

    fn pop16(&mut self) -> u16 {
        let high = self.pop();
        let low = self.pop();
        u16::from_be_bytes([high, low])
    }

    fn xdata_address(&self, addr: XAddr) -> u16 {
        match addr {
            XAddr::Dptr => self.dptr(),
            XAddr::R(i) => self.reg(i) as u16,
        }
    }

    /// Runs one decoded instruction and returns the address of the next one.
    /// PC itself is left alone so exceptions report the faulting address.
    fn execute(&mut self, opcode: &Opcode, bytes: [u8; 3]) -> u16 {
        let next = self.pc.wrapping_add(opcode.len as u16);
        let rel = bytes[opcode.len as usize - 1] as i8;
        let target = next.wrapping_add(rel as u16);
        let long = u16::from_be_bytes([bytes[1], bytes[2]]);
        let absolute = (next & 0xF800) | ((opcode.opcode as u16 & 0xE0) << 3) | bytes[1] as u16;

        match opcode.operation {
            Operation::Illegal | Operation::Nop => next,
            Operation::Ajmp => absolute,
            Operation::Acall => {
                self.push16(next);
                absolute
            }
            Operation::Ljmp => long,
            Operation::Lcall => {
                self.push16(next);
                long
            }
            Operation::Ret => self.pop16(),
            Operation::Reti => self.reti(),
            Operation::Sjmp => target,
            Operation::JmpIndexed => self.dptr().wrapping_add(self.a() as u16),
            Operation::Jump(condition) => {
                let taken = match condition {
                    Condition::Carry => self.psw_flag(PSW_C),
                    Condition::NoCarry => !self.psw_flag(PSW_C),
                    Condition::Zero => self.a() == 0,
                    Condition::NotZero => self.a() != 0,
                };
                if taken { target } else { next }
            }
            Operation::JumpBit { set, clear } => {
                if self.read_bit(bytes[1]) == set {
                    if clear {
                        self.write_bit(bytes[1], false);
                    }
                    target
                } else {
                    next
                }
            }
            Operation::Djnz(operand) => {
                let value = self.load(operand, &bytes).wrapping_sub(1);
                self.store(operand, &bytes, value);
                if value != 0 { target } else { next }
            }
            Operation::Cjne(lhs, rhs) => {
                let lhs = self.load(lhs, &bytes);
                let rhs = self.load(rhs, &bytes);
                self.set_psw_flag(PSW_C, lhs < rhs);
                if lhs != rhs { target } else { next }
            }
            Operation::Mov(dst, src) => {
                if dst == Operand::A && src == Operand::Direct(1) && bytes[1] == SFR_ACC {
                    self.raise(Exception::AccToA);
                }
                let value = self.load(src, &bytes);
                self.store(dst, &bytes, value);
                next
            }
            Operation::MovDptr => {
                self.set_dptr(long);
                next
            }
            Operation::MovcDptr => {
                let addr = self.dptr().wrapping_add(self.a() as u16);
                self.set_a(self.memory.code_byte(addr));
                next
            }
            Operation::MovcPc => {
                let addr = next.wrapping_add(self.a() as u16);
                self.set_a(self.memory.code_byte(addr));
                next
            }
            Operation::MovxRead(addr) => {
                let addr = self.xdata_address(addr);
                let value = self.context.xdata_hook().read(self.memory.xdata(), addr);
                self.set_a(value);
                next
            }
            Operation::MovxWrite(addr) => {
                let addr = self.xdata_address(addr);
                let value = self.a();
                self.context
                    .xdata_hook()
                    .write(self.memory.xdata_mut(), addr, value);
                next
            }
            Operation::Push => {
                let value = self.read_direct(bytes[1]);
                self.push(value);
                next
            }
            Operation::Pop => {
                let value = self.pop();
                self.write_direct(bytes[1], value);
                next
            }
            Operation::Xch(operand) => {
                let value = self.load(operand, &bytes);
                let a = self.a();
                self.store(operand, &bytes, a);
                self.set_a(value);
                next
            }
            Operation::Xchd(i) => {
                let addr = self.reg(i);
                let value = self.memory.read_indirect(addr);
                let a = self.a();
                self.set_a((a & 0xF0) | (value & 0x0F));
                self.memory
                    .write_indirect(addr, (value & 0xF0) | (a & 0x0F));
                next
            }
            Operation::Inc(operand) => {
                let value = self.load(operand, &bytes).wrapping_add(1);
                self.store(operand, &bytes, value);
                next
            }
            Operation::Dec(operand) => {
                let value = self.load(operand, &bytes).wrapping_sub(1);
                self.store(operand, &bytes, value);
                next
            }
            Operation::IncDptr => {
                self.set_dptr(self.dptr().wrapping_add(1));
                next
            }
            Operation::Add(operand) => {
                let value = self.load(operand, &bytes);
                self.add(value, false);
                next
            }
            Operation::Addc(operand) => {
                let value = self.load(operand, &bytes);
                self.add(value, self.psw_flag(PSW_C));
                next
            }
            Operation::Subb(operand) => {
                let value = self.load(operand, &bytes);
                self.subb(value);
                next
            }
            Operation::Anl(dst, src) => {
                let value = self.load(src, &bytes);
                let value = self.load(dst, &bytes) & value;
                self.store(dst, &bytes, value);
                next
            }
            Operation::Orl(dst, src) => {
                let value = self.load(src, &bytes);
                let value = self.load(dst, &bytes) | value;
                self.store(dst, &bytes, value);
                next
            }
            Operation::Xrl(dst, src) => {
                let value = self.load(src, &bytes);
                let value = self.load(dst, &bytes) ^ value;
                self.store(dst, &bytes, value);
                next
            }
            Operation::AnlC { invert } => {
                let bit = self.read_bit(bytes[1]) != invert;
                self.set_psw_flag(PSW_C, self.psw_flag(PSW_C) && bit);
                next
            }
            Operation::OrlC { invert } => {
                let bit = self.read_bit(bytes[1]) != invert;
                self.set_psw_flag(PSW_C, self.psw_flag(PSW_C) || bit);
                next
            }
            Operation::MovCBit => {
                let bit = self.read_bit(bytes[1]);
                self.set_psw_flag(PSW_C, bit);
                next
            }
            Operation::MovBitC => {
                self.write_bit(bytes[1], self.psw_flag(PSW_C));
                next
            }
            Operation::Clr(operand) => {
                self.set_bit_operand(operand, bytes[1], |_| false);
                next
            }
            Operation::Setb(operand) => {
                self.set_bit_operand(operand, bytes[1], |_| true);
                next
            }
            Operation::Cpl(operand) => {
                self.set_bit_operand(operand, bytes[1], |bit| !bit);
                next
            }
            Operation::ClrA => {
                self.set_a(0);
                next
            }
            Operation::CplA => {
                self.set_a(!self.a());
                next
            }
            Operation::Rl => {
                self.set_a(self.a().rotate_left(1));
                next
            }
            Operation::Rr => {
                self.set_a(self.a().rotate_right(1));
                next
            }
            Operation::Rlc => {
                let a = self.a();
                self.set_a(a << 1 | self.psw_flag(PSW_C) as u8);
                self.set_psw_flag(PSW_C, a & 0x80 != 0);
                next
            }
            Operation::Rrc => {
                let a = self.a();
                self.set_a(a >> 1 | (self.psw_flag(PSW_C) as u8) << 7);
                self.set_psw_flag(PSW_C, a & 0x01 != 0);
                next
            }
            Operation::Swap => {
                self.set_a(self.a().rotate_left(4));
                next
            }
            Operation::Da => {
                self.decimal_adjust();
                next
            }
            Operation::Mul => {
                let product = self.a() as u16 * self.b() as u16;
                let [high, low] = product.to_be_bytes();
                self.set_a(low);
                self.set_b(high);
                self.set_psw_flag(PSW_C, false);
                self.set_psw_flag(PSW_OV, product > 0xFF);
                next
            }
            Operation::Div => {
                let (a, b) = (self.a(), self.b());
                self.set_psw_flag(PSW_C, false);
                if b == 0 {
                    self.set_psw_flag(PSW_OV, true);
                } else {
                    self.set_a(a / b);
                    self.set_b(a % b);
                    self.set_psw_flag(PSW_OV, false);
                }
                next
            }
        }
    }

    fn set_bit_operand(&mut self, operand: BitOperand, bit: u8, f: impl FnOnce(bool) -> bool) {
        match operand {
            BitOperand::C => {
                let value = f(self.psw_flag(PSW_C));
                self.set_psw_flag(PSW_C, value);
            }
            BitOperand::Bit => {
                let value = f(self.read_bit(bit));
                self.write_bit(bit, value);
            }
        }
    }

    fn add(&mut self, value: u8, carry: bool) {
        let a = self.a();
        let carry = carry as u8;
        let sum = a as u16 + value as u16 + carry as u16;
        let result = sum as u8;
        self.set_psw_flag(PSW_C, sum > 0xFF);
        self.set_psw_flag(PSW_AC, (a & 0x0F) + (value & 0x0F) + carry > 0x0F);
        self.set_psw_flag(PSW_OV, (!(a ^ value) & (a ^ result) & 0x80) != 0);
        self.set_a(result);
    }

    fn subb(&mut self, value: u8) {
        let a = self.a();
        let borrow = self.psw_flag(PSW_C) as i16;
        let diff = a as i16 - value as i16 - borrow;
        let result = diff as u8;
        self.set_psw_flag(PSW_C, diff < 0);
        self.set_psw_flag(
            PSW_AC,
            (a & 0x0F) as i16 - (value & 0x0F) as i16 - borrow < 0,
        );
        self.set_psw_flag(PSW_OV, ((a ^ value) & (a ^ result) & 0x80) != 0);
        self.set_a(result);
    }

    fn decimal_adjust(&mut self) {
        let mut value = self.a() as u16;
        let mut carry = self.psw_flag(PSW_C);
        if value & 0x0F > 9 || self.psw_flag(PSW_AC) {
            value += 0x06;
            carry |= value > 0xFF;
            value &= 0xFF;
        }
        if value >> 4 > 9 || carry {
            value += 0x60;
            carry |= value > 0xFF;
        }
        self.set_a(value as u8);
        if carry {
            self.set_psw_flag(PSW_C, true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::UNMAPPED;
    use crate::traits::PassThrough;

    type Collect = (PassThrough, PassThrough, Vec<ExceptionEvent>);

    fn cpu_with(memory: Memory, code: &[u8]) -> Cpu<Collect> {
        let mut cpu = Cpu::with_context(memory, Collect::default());
        cpu.memory_mut().code_mut()[..code.len()].copy_from_slice(code);
        cpu
    }

    fn cpu(code: &[u8]) -> Cpu<Collect> {
        cpu_with(Memory::new(Variant::Ch552), code)
    }

    fn place<C: CpuContext>(cpu: &mut Cpu<C>, addr: usize, code: &[u8]) {
        cpu.memory_mut().code_mut()[addr..addr + code.len()].copy_from_slice(code);
    }

    fn kinds(cpu: &Cpu<Collect>) -> Vec<Exception> {
        cpu.context().2.iter().map(|event| event.kind).collect()
    }

    fn run(cpu: &mut Cpu<Collect>, ticks: usize) {
        for _ in 0..ticks {
            cpu.tick();
        }
    }

    #[test]
    fn power_on_defaults() {
        let mut cpu = cpu(&[0x74, 0x12]);
        cpu.tick();
        cpu.set_psw(0xFF);
        cpu.reset(true);
        assert_eq!(cpu.pc(), 0);
        assert_eq!(cpu.a(), 0);
        assert_eq!(cpu.psw(), 0);
        assert_eq!(cpu.sp(), 0x07);
        assert_eq!(cpu.cycles(), 0);
        assert_eq!(cpu.sfr_value(SFR_P3), 0xFF);
    }

    #[test]
    fn soft_reset_preserves_memory() {
        let mut cpu = cpu(&[0x74, 0x12, 0xF5, 0x30, 0x05, 0x30]);
        run(&mut cpu, 2);
        let before = cpu.memory().clone();
        cpu.reset(false);
        assert_eq!(cpu.pc(), 0);
        assert_eq!(cpu.memory(), &before);
        assert_eq!(cpu.memory().lower()[0x30], 0x12);
    }

    #[test]
    fn mov_immediate_advances_pc_and_cycles() {
        let mut cpu = cpu(&[0x74, 0x13]);
        assert_eq!(cpu.tick(), 1);
        assert_eq!(cpu.a(), 0x13);
        assert_eq!(cpu.pc(), 2);
        assert_eq!(cpu.cycles(), 1);
        // three bits set: odd, so P is set
        assert!(cpu.psw_flag(PSW_P));
    }

    #[test]
    fn illegal_opcode_mutates_nothing() {
        let mut cpu = cpu(&[0xA5, 0x00]);
        let before = cpu.memory().clone();
        assert_eq!(cpu.tick(), 0);
        assert_eq!(cpu.pc(), 0);
        assert_eq!(cpu.cycles(), 0);
        assert_eq!(cpu.memory(), &before);
        assert_eq!(kinds(&cpu), vec![Exception::IllegalOpcode]);
    }

    #[test]
    fn acc_to_a_raises_and_continues() {
        let mut cpu = cpu(&[0xE5, 0xE0]);
        cpu.set_a(0x42);
        cpu.tick();
        assert_eq!(kinds(&cpu), vec![Exception::AccToA]);
        assert_eq!(cpu.a(), 0x42);
        assert_eq!(cpu.pc(), 2);
    }

    #[test]
    fn add_flags() {
        let mut cpu = cpu(&[0x24, 0x01, 0x24, 0x01]);
        cpu.set_a(0x7F);
        cpu.tick();
        assert_eq!(cpu.a(), 0x80);
        assert!(cpu.psw_flag(PSW_OV));
        assert!(cpu.psw_flag(PSW_AC));
        assert!(!cpu.psw_flag(PSW_C));

        cpu.set_a(0xFF);
        cpu.tick();
        assert_eq!(cpu.a(), 0x00);
        assert!(!cpu.psw_flag(PSW_OV));
        assert!(cpu.psw_flag(PSW_AC));
        assert!(cpu.psw_flag(PSW_C));
    }

    #[test]
    fn addc_uses_carry() {
        let mut cpu = cpu(&[0x34, 0x01]);
        cpu.set_a(0x10);
        cpu.set_psw_flag(PSW_C, true);
        cpu.tick();
        assert_eq!(cpu.a(), 0x12);
        assert!(!cpu.psw_flag(PSW_C));
    }

    #[test]
    fn subb_flags() {
        let mut cpu = cpu(&[0x94, 0x01, 0x94, 0x01]);
        cpu.tick();
        assert_eq!(cpu.a(), 0xFF);
        assert!(cpu.psw_flag(PSW_C));
        assert!(cpu.psw_flag(PSW_AC));
        assert!(!cpu.psw_flag(PSW_OV));

        cpu.set_a(0x80);
        cpu.set_psw_flag(PSW_C, false);
        cpu.tick();
        assert_eq!(cpu.a(), 0x7F);
        assert!(cpu.psw_flag(PSW_OV));
        assert!(!cpu.psw_flag(PSW_C));
    }

    #[test]
    fn decimal_adjust_after_bcd_add() {
        // 09 + 08 = 17 in BCD
        let mut cpu = cpu(&[0x24, 0x08, 0xD4]);
        cpu.set_a(0x09);
        run(&mut cpu, 2);
        assert_eq!(cpu.a(), 0x17);
        assert!(!cpu.psw_flag(PSW_C));

        // 99 + 01 = 100 in BCD
        let mut cpu = self::cpu(&[0x24, 0x01, 0xD4]);
        cpu.set_a(0x99);
        run(&mut cpu, 2);
        assert_eq!(cpu.a(), 0x00);
        assert!(cpu.psw_flag(PSW_C));
    }

    #[test]
    fn mul_and_div() {
        let mut cpu = cpu(&[0xA4, 0x84, 0x84]);
        cpu.set_a(0x80);
        cpu.set_b(0x02);
        assert_eq!(cpu.tick(), 4);
        assert_eq!((cpu.a(), cpu.b()), (0x00, 0x01));
        assert!(cpu.psw_flag(PSW_OV));

        cpu.set_a(100);
        cpu.set_b(7);
        cpu.tick();
        assert_eq!((cpu.a(), cpu.b()), (14, 2));
        assert!(!cpu.psw_flag(PSW_OV));

        cpu.set_a(5);
        cpu.set_b(0);
        cpu.tick();
        assert_eq!((cpu.a(), cpu.b()), (5, 0));
        assert!(cpu.psw_flag(PSW_OV));
        assert!(!cpu.psw_flag(PSW_C));
    }

    #[test]
    fn rotates_through_carry() {
        let mut cpu = cpu(&[0x33, 0x13, 0x23, 0xC4]);
        cpu.set_a(0x81);
        cpu.tick();
        assert_eq!(cpu.a(), 0x02);
        assert!(cpu.psw_flag(PSW_C));
        cpu.tick();
        assert_eq!(cpu.a(), 0x81);
        assert!(!cpu.psw_flag(PSW_C));
        cpu.tick();
        assert_eq!(cpu.a(), 0x03);
        cpu.tick();
        assert_eq!(cpu.a(), 0x30);
    }

    #[test]
    fn cjne_sets_carry_and_branches() {
        let mut cpu = cpu(&[0xB4, 0x10, 0x05]);
        cpu.set_a(0x05);
        cpu.tick();
        assert!(cpu.psw_flag(PSW_C));
        assert_eq!(cpu.pc(), 8);

        cpu.set_pc(0);
        cpu.set_a(0x10);
        cpu.tick();
        assert!(!cpu.psw_flag(PSW_C));
        assert_eq!(cpu.pc(), 3);
    }

    #[test]
    fn djnz_loops() {
        // MOV R2,#3; DJNZ R2,$
        let mut cpu = cpu(&[0x7A, 0x03, 0xDA, 0xFE]);
        run(&mut cpu, 3);
        assert_eq!(cpu.pc(), 2);
        cpu.tick();
        assert_eq!(cpu.pc(), 4);
        assert_eq!(cpu.r(2), Ok(0));
    }

    #[test]
    fn spin_detection() {
        let mut cpu = cpu(&[0x00, 0x80, 0xFE]);
        assert!(!cpu.is_spinning());
        cpu.tick();
        assert!(cpu.is_spinning());
        cpu.tick();
        assert_eq!(cpu.pc(), 1);
    }

    #[test]
    fn lcall_and_ret() {
        let mut cpu = cpu(&[0x12, 0x00, 0x10]);
        place(&mut cpu, 0x10, &[0x22]);
        cpu.tick();
        assert_eq!(cpu.pc(), 0x10);
        assert_eq!(cpu.sp(), 0x09);
        assert_eq!(cpu.memory().lower()[0x08], 0x03);
        assert_eq!(cpu.memory().lower()[0x09], 0x00);
        cpu.tick();
        assert_eq!(cpu.pc(), 0x03);
        assert_eq!(cpu.sp(), 0x07);
        assert!(kinds(&cpu).is_empty());
    }

    #[test]
    fn ajmp_and_acall_stay_in_page() {
        let mut cpu = cpu(&[0x21, 0x23]);
        cpu.tick();
        assert_eq!(cpu.pc(), 0x0123);

        place(&mut cpu, 0x0123, &[0xF1, 0x00]);
        cpu.tick();
        assert_eq!(cpu.pc(), 0x0700);
        assert_eq!(cpu.memory().lower()[0x08], 0x25);
    }

    #[test]
    fn conditional_jumps() {
        fn jump(code: &[u8], a: u8, carry: bool) -> u16 {
            let mut cpu = self::cpu(code);
            cpu.set_a(a);
            cpu.set_psw_flag(PSW_C, carry);
            cpu.tick();
            cpu.pc()
        }

        // JZ +10h
        assert_eq!(jump(&[0x60, 0x10], 0x00, false), 0x12);
        assert_eq!(jump(&[0x60, 0x10], 0x01, false), 0x02);
        // JNZ +10h
        assert_eq!(jump(&[0x70, 0x10], 0x00, false), 0x02);
        assert_eq!(jump(&[0x70, 0x10], 0x80, false), 0x12);
        // JC -2
        assert_eq!(jump(&[0x40, 0xFE], 0x00, true), 0x00);
        assert_eq!(jump(&[0x40, 0xFE], 0x00, false), 0x02);
        // JNC +5
        assert_eq!(jump(&[0x50, 0x05], 0x00, false), 0x07);
        assert_eq!(jump(&[0x50, 0x05], 0x00, true), 0x02);
    }

    #[test]
    fn long_and_indexed_jumps() {
        let mut cpu = cpu(&[0x02, 0x01, 0x23]);
        assert_eq!(cpu.tick(), 2);
        assert_eq!(cpu.pc(), 0x0123);

        let mut cpu = self::cpu(&[0x73]);
        cpu.set_dptr(0x0100);
        cpu.set_a(0x20);
        cpu.tick();
        assert_eq!(cpu.pc(), 0x0120);
        assert_eq!(cpu.dptr(), 0x0100);
        assert_eq!(cpu.a(), 0x20);

        // CH552 has 16 KiB of code
        let mut cpu = self::cpu(&[0x02, 0xFF, 0xFF]);
        cpu.tick();
        assert_eq!(cpu.pc(), 0x3FFF);
    }

    #[test]
    fn failed_hex_load_keeps_code() {
        let mut cpu = cpu(&[]);
        assert_eq!(cpu.load_hex(":0300000074123443\n:00000001FF\n").unwrap(), 3);
        let before = cpu.memory().code().to_vec();

        let bad = ":02001000ABCD76\n:0300000074123444\n:00000001FF\n";
        assert!(matches!(
            cpu.load_hex(bad),
            Err(HexError::Checksum { line: 2, expected: 0x43, found: 0x44 })
        ));
        assert_eq!(cpu.memory().code(), &before[..]);

        let path = std::env::temp_dir().join(format!("ch55x-{}.hex", std::process::id()));
        std::fs::write(&path, ":02001000ABCD76\n:00000001FF\n").unwrap();
        let loaded = cpu.load_hex_file(&path);
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded.unwrap(), 2);
        assert_eq!(&cpu.memory().code()[0x10..0x12], &[0xAB, 0xCD]);
        assert_eq!(&cpu.memory().code()[..3], &[0x74, 0x12, 0x34]);

        assert!(matches!(
            cpu.load_hex_file(&path),
            Err(HexError::NotFound { .. })
        ));
    }

    #[test]
    fn register_banks_follow_psw() {
        let mut cpu = cpu(&[0x78, 0x55]);
        cpu.set_psw(1 << PSW_RS0);
        cpu.tick();
        assert_eq!(cpu.memory().lower()[0x08], 0x55);
        assert_eq!(cpu.r(0), Ok(0x55));
        assert_eq!(cpu.r(8), Err(RegisterIndexError(8)));
        assert_eq!(cpu.set_r(9, 0), Err(RegisterIndexError(9)));
        cpu.set_psw(0);
        assert_eq!(cpu.r(0), Ok(0));
    }

    #[test]
    fn bit_addressing() {
        // SETB 00h; SETB IE.7; JB 00h,+2
        let mut cpu = cpu(&[0xD2, 0x00, 0xD2, 0xAF, 0x20, 0x00, 0x02]);
        run(&mut cpu, 3);
        assert_eq!(cpu.memory().lower()[0x20], 0x01);
        assert!(cpu.memory().sfr().bit(SFR_IE, IE_EA));
        assert_eq!(cpu.pc(), 9);
    }

    #[test]
    fn jbc_clears_the_bit() {
        let mut cpu = cpu(&[0x10, 0x0F, 0x00]);
        cpu.memory_mut().lower_mut()[0x21] = 0x80;
        cpu.tick();
        assert_eq!(cpu.memory().lower()[0x21], 0x00);
        assert_eq!(cpu.pc(), 3);
    }

    #[test]
    fn carry_bit_logic() {
        // SETB C; ANL C,/00h; MOV 01h,C
        let mut cpu = cpu(&[0xD3, 0xB0, 0x00, 0x92, 0x01]);
        run(&mut cpu, 3);
        assert!(cpu.psw_flag(PSW_C));
        assert_eq!(cpu.memory().lower()[0x20], 0x02);
    }

    #[test]
    fn indirect_upper_ram() {
        // MOV R0,#90h; MOV @R0,#12h; MOV A,@R0
        let code = [0x78, 0x90, 0x76, 0x12, 0xE6];
        let mut cpu = cpu(&code);
        run(&mut cpu, 3);
        assert_eq!(cpu.a(), 0x12);
        assert_eq!(cpu.memory().upper().map(|upper| upper[0x10]), Some(0x12));

        let mut cpu = cpu_with(Memory::new(Variant::Ch552).without_upper_ram(), &code);
        run(&mut cpu, 3);
        assert_eq!(cpu.a(), UNMAPPED);
        assert!(kinds(&cpu).is_empty());
    }

    #[test]
    fn direct_addresses_above_7f_reach_sfrs() {
        // MOV 90h,#5Ah
        let mut cpu = cpu(&[0x75, 0x90, 0x5A]);
        cpu.tick();
        assert_eq!(cpu.sfr_value(SFR_P1), 0x5A);
        assert_eq!(cpu.memory().upper().map(|upper| upper[0x10]), Some(0));
    }

    #[test]
    fn stack_overflow_without_upper_ram() {
        let push = [0xC0, 0x30];
        let code: Vec<u8> = push.iter().copied().cycle().take(6).collect();
        let mut cpu = cpu_with(Memory::new(Variant::Ch552).without_upper_ram(), &code);
        cpu.set_sp(0x7E);
        cpu.tick();
        assert!(kinds(&cpu).is_empty());
        cpu.tick();
        assert_eq!(kinds(&cpu), vec![Exception::Stack]);
        cpu.tick();
        assert_eq!(kinds(&cpu), vec![Exception::Stack, Exception::Stack]);
        assert_eq!(cpu.sp(), 0x81);
    }

    #[test]
    fn stack_in_upper_ram_is_fine() {
        let mut cpu = cpu(&[0xC0, 0x30]);
        cpu.memory_mut().lower_mut()[0x30] = 0xAB;
        cpu.set_sp(0x7F);
        cpu.tick();
        assert!(kinds(&cpu).is_empty());
        assert_eq!(cpu.memory().upper().map(|upper| upper[0]), Some(0xAB));
    }

    #[test]
    fn stack_pointer_wrap_is_a_fault() {
        let mut cpu = cpu(&[0xC0, 0x30]);
        cpu.set_sp(0xFF);
        cpu.tick();
        assert_eq!(kinds(&cpu), vec![Exception::Stack]);
        assert_eq!(cpu.sp(), 0x00);
    }

    #[test]
    fn pop_from_missing_upper_ram() {
        let mut cpu = cpu_with(
            Memory::new(Variant::Ch552).without_upper_ram(),
            &[0xD0, 0x30],
        );
        cpu.set_sp(0x80);
        cpu.tick();
        assert_eq!(kinds(&cpu), vec![Exception::Stack]);
        assert_eq!(cpu.memory().lower()[0x30], UNMAPPED);
        assert_eq!(cpu.sp(), 0x7F);
    }

    #[test]
    fn movx_and_movc() {
        // MOV DPTR,#0201h; MOV A,#5Ah; MOVX @DPTR,A; CLR A; MOVX A,@DPTR
        let mut cpu = cpu(&[0x90, 0x02, 0x01, 0x74, 0x5A, 0xF0, 0xE4, 0xE0]);
        run(&mut cpu, 5);
        assert_eq!(cpu.memory().xdata()[0x201], 0x5A);
        assert_eq!(cpu.a(), 0x5A);

        // MOV R1,#10h; MOVX @R1,A; MOV DPTR,#0000h; MOV A,#2; MOVC A,@A+DPTR
        let mut cpu = self::cpu(&[0x79, 0x10, 0xF3, 0x90, 0x00, 0x00, 0x74, 0x02, 0x93]);
        cpu.set_a(0x77);
        run(&mut cpu, 5);
        assert_eq!(cpu.memory().xdata()[0x10], 0x77);
        assert_eq!(cpu.a(), 0xF3);
    }

    #[test]
    fn xch_and_xchd() {
        // MOV R0,#30h; XCH A,R0; XCHD A,@R0
        let mut cpu = cpu(&[0x78, 0x30, 0xC8, 0xD6]);
        cpu.memory_mut().lower_mut()[0x30] = 0xAB;
        cpu.set_a(0x12);
        run(&mut cpu, 2);
        assert_eq!(cpu.a(), 0x30);
        assert_eq!(cpu.r(0), Ok(0x12));
        cpu.set_r(0, 0x30).unwrap();
        cpu.tick();
        assert_eq!(cpu.a(), 0x3B);
        assert_eq!(cpu.memory().lower()[0x30], 0xA0);
    }

    #[test]
    fn pc_wraps_on_odd_code_sizes() {
        let mut cpu = cpu_with(Memory::new(Variant::Ch551), &[]);
        cpu.set_pc(10239);
        cpu.tick();
        assert_eq!(cpu.pc(), 0);
        cpu.set_pc(10240);
        assert_eq!(cpu.pc(), 0);
    }

    fn with_timer0_handler(handler: &[u8]) -> Cpu<Collect> {
        let mut cpu = cpu(&[0x00, 0x00, 0x00]);
        place(&mut cpu, Interrupt::Timer0.vector() as usize, handler);
        let sfr = cpu.memory_mut().sfr_mut();
        sfr.set(SFR_IE, 1 << IE_EA | 1 << IE_ET0);
        sfr.set_bit(SFR_TCON, TCON_TF0, true);
        cpu
    }

    #[test]
    fn interrupt_entry_and_clean_return() {
        let mut cpu = with_timer0_handler(&[0x32]);
        assert_eq!(cpu.tick(), 2);
        assert_eq!(cpu.pc(), 0x000B);
        assert_eq!(cpu.sp(), 0x09);
        assert!(!cpu.memory().sfr().bit(SFR_TCON, TCON_TF0));
        cpu.tick();
        assert_eq!(cpu.pc(), 0);
        assert_eq!(cpu.sp(), 0x07);
        assert!(kinds(&cpu).is_empty());
        assert_eq!(cpu.cycles(), 4);
    }

    #[test]
    fn handler_that_restores_state_is_clean() {
        // PUSH ACC; PUSH PSW; MOV A,#55h; SETB C; POP PSW; POP ACC; RETI
        let mut cpu = with_timer0_handler(&[
            0xC0, 0xE0, 0xC0, 0xD0, 0x74, 0x55, 0xD3, 0xD0, 0xD0, 0xD0, 0xE0, 0x32,
        ]);
        cpu.set_a(0x33);
        run(&mut cpu, 8);
        assert_eq!(cpu.pc(), 0);
        assert_eq!(cpu.a(), 0x33);
        assert!(kinds(&cpu).is_empty());
    }

    #[test]
    fn handler_clobbering_a() {
        let mut cpu = with_timer0_handler(&[0x74, 0x55, 0x32]);
        run(&mut cpu, 3);
        assert_eq!(kinds(&cpu), vec![Exception::IretAccMismatch]);
    }

    #[test]
    fn handler_clobbering_psw() {
        let mut cpu = with_timer0_handler(&[0xD3, 0x32]);
        run(&mut cpu, 3);
        assert_eq!(kinds(&cpu), vec![Exception::IretPswMismatch]);
    }

    #[test]
    fn handler_touching_f0_is_clean() {
        let mut cpu = with_timer0_handler(&[0xD2, 0xD5, 0x32]);
        run(&mut cpu, 3);
        assert!(kinds(&cpu).is_empty());
    }

    #[test]
    fn handler_clobbering_sp() {
        let mut cpu = with_timer0_handler(&[0x05, 0x81, 0x32]);
        run(&mut cpu, 3);
        assert_eq!(kinds(&cpu), vec![Exception::IretSpMismatch]);
    }

    #[test]
    fn plain_reti_performs_no_checks() {
        let mut cpu = cpu(&[0x12, 0x00, 0x10]);
        place(&mut cpu, 0x10, &[0x74, 0x55, 0x32]);
        run(&mut cpu, 3);
        assert_eq!(cpu.pc(), 3);
        assert!(kinds(&cpu).is_empty());
    }

    #[test]
    fn ie_write_delays_acceptance_by_one_instruction() {
        // MOV IE,#82h; NOP; NOP
        let mut cpu = cpu(&[0x75, 0xA8, 0x82, 0x00, 0x00]);
        cpu.memory_mut().sfr_mut().set_bit(SFR_TCON, TCON_TF0, true);
        cpu.tick();
        assert_eq!(cpu.pc(), 3);
        cpu.tick();
        assert_eq!(cpu.pc(), 4);
        assert_eq!(cpu.tick(), 2);
        assert_eq!(cpu.pc(), 0x000B);
    }

    #[test]
    fn host_raised_interrupt() {
        let mut cpu = cpu(&[0x00]);
        let sfr = cpu.memory_mut().sfr_mut();
        sfr.set(SFR_IE, 1 << IE_EA);
        sfr.set(SFR_IE_EX, 1 << 2);
        cpu.raise_interrupt(Interrupt::Usb);
        cpu.tick();
        assert_eq!(cpu.pc(), 0x0043);
    }

    #[test]
    fn high_priority_preempts_low_handler() {
        let mut cpu = with_timer0_handler(&[0x00, 0x00]);
        place(&mut cpu, Interrupt::Timer1.vector() as usize, &[0x32]);
        cpu.tick();
        assert_eq!(cpu.pc(), 0x000B);
        let sfr = cpu.memory_mut().sfr_mut();
        sfr.set_bit(SFR_IE, IE_ET1, true);
        sfr.set_bit(SFR_IP, 3, true);
        sfr.set_bit(SFR_TCON, TCON_TF1, true);
        cpu.tick();
        assert_eq!(cpu.pc(), 0x001B);
        cpu.tick();
        assert_eq!(cpu.pc(), 0x000B);
        assert!(kinds(&cpu).is_empty());
    }

    #[test]
    fn breakpoint_raises_then_executes() {
        let mut cpu = cpu(&[0x00, 0x00, 0x00]);
        cpu.breakpoints_mut().insert(1);
        cpu.tick();
        assert!(kinds(&cpu).is_empty());
        cpu.tick();
        assert_eq!(kinds(&cpu), vec![Exception::Breakpoint]);
        assert_eq!(cpu.pc(), 2);
        assert_eq!(cpu.context().2[0].state.pc, 1);
    }

    #[test]
    fn exception_snapshot_is_taken_at_the_fault() {
        let mut cpu = cpu(&[0x74, 0x9A, 0xA5]);
        cpu.tick();
        cpu.tick();
        let event = cpu.context().2[0];
        assert_eq!(event.state.pc, 2);
        assert_eq!(event.state.a, 0x9A);
        assert_eq!(event.state.sp, 0x07);
        assert_eq!(event.state.cycles, 1);
    }

    #[derive(Default)]
    struct Recorder {
        reads: Vec<u8>,
        writes: Vec<(u8, u8)>,
    }

    impl SfrHook for Recorder {
        fn read(&mut self, sfr: &mut crate::memory::Sfr, addr: u8) -> u8 {
            self.reads.push(addr);
            sfr.get(addr)
        }
        fn write(&mut self, sfr: &mut crate::memory::Sfr, addr: u8, value: u8) {
            self.writes.push((addr, value));
            sfr.set(addr, value);
        }
    }

    #[test]
    fn implicit_accumulator_bypasses_the_hook() {
        // MOV A,#1; ADD A,#1; MOV 90h,A; MOV A,90h
        let mut cpu = Cpu::with_context(
            Memory::new(Variant::Ch554),
            (Recorder::default(), PassThrough, ()),
        );
        place(&mut cpu, 0, &[0x74, 0x01, 0x24, 0x01, 0xF5, 0x90, 0xE5, 0x90]);
        for _ in 0..4 {
            cpu.tick();
        }
        assert_eq!(cpu.context().0.writes, vec![(SFR_P1, 2)]);
        assert_eq!(cpu.context().0.reads, vec![SFR_P1]);
    }

    #[test]
    fn decode_range_walks_instructions() {
        let cpu = cpu(&[0x74, 0x12, 0x02, 0x12, 0x34, 0x00]);
        let lines: Vec<String> = cpu
            .decode_range(0, 3)
            .into_iter()
            .map(|line| line.text)
            .collect();
        assert_eq!(lines, vec!["MOV A,#12", "LJMP #1234", "NOP"]);
        assert_eq!(cpu.decode_pc().text, "MOV A,#12");
    }
}
