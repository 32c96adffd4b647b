//! Memory regions of a CH55x part: code ROM, external data (XDATA), the
//! lower and (optional) upper 128 bytes of internal RAM, and the SFR bank.

use std::fmt;

use thiserror::Error;

use crate::sfr::{SFR_P0, SFR_P1, SFR_P2, SFR_P3, SFR_SP};

/// Size of the lower internal RAM, the upper internal RAM and the SFR bank.
pub const BANK_SIZE: usize = 128;

/// Value returned for reads of memory that does not exist on the part (for
/// example `@R0` above 0x7F without upper RAM, or a stack pop from there).
pub const UNMAPPED: u8 = 0x77;

/// Stack pointer after a power-on reset.
pub const SP_RESET: u8 = 0x07;

/// A supported memory profile.
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    Ch551,
    Ch552,
    Ch554,
    Ch555,
    Ch557,
    Ch558,
    Ch559,
}

impl Variant {
    pub const ALL: [Variant; 7] = [
        Variant::Ch551,
        Variant::Ch552,
        Variant::Ch554,
        Variant::Ch555,
        Variant::Ch557,
        Variant::Ch558,
        Variant::Ch559,
    ];

    /// Code memory size in bytes.
    pub const fn code_size(self) -> usize {
        match self {
            Variant::Ch551 => 10 * 1024,
            Variant::Ch552 | Variant::Ch554 => 16 * 1024,
            Variant::Ch555 => 32 * 1024,
            Variant::Ch558 => 40 * 1024,
            Variant::Ch557 | Variant::Ch559 => 64 * 1024,
        }
    }

    /// External data memory size in bytes.
    pub const fn xdata_size(self) -> usize {
        match self {
            Variant::Ch551 => 512,
            Variant::Ch552 | Variant::Ch554 | Variant::Ch555 => 1024,
            Variant::Ch557 | Variant::Ch558 => 4 * 1024,
            Variant::Ch559 => 6 * 1024,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Variant::Ch551 => "CH551",
            Variant::Ch552 => "CH552",
            Variant::Ch554 => "CH554",
            Variant::Ch555 => "CH555",
            Variant::Ch557 => "CH557",
            Variant::Ch558 => "CH558",
            Variant::Ch559 => "CH559",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The 128-byte special-function register bank, indexed by SFR address
/// (0x80..=0xFF).
#[derive(Clone, PartialEq, Eq)]
pub struct Sfr([u8; BANK_SIZE]);

impl Sfr {
    pub fn get(&self, addr: u8) -> u8 {
        self.0[(addr & 0x7F) as usize]
    }

    pub fn set(&mut self, addr: u8, value: u8) {
        self.0[(addr & 0x7F) as usize] = value;
    }

    /// Bit `bit` of the register at `addr`.
    pub fn bit(&self, addr: u8, bit: u8) -> bool {
        self.get(addr) & (1 << bit) != 0
    }

    pub fn set_bit(&mut self, addr: u8, bit: u8, value: bool) {
        let byte = self.get(addr);
        let byte = if value {
            byte | 1 << bit
        } else {
            byte & !(1 << bit)
        };
        self.set(addr, byte);
    }

    pub fn as_bytes(&self) -> &[u8; BANK_SIZE] {
        &self.0
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8; BANK_SIZE] {
        &mut self.0
    }
}

impl Default for Sfr {
    fn default() -> Self {
        Self([0; BANK_SIZE])
    }
}

impl fmt::Debug for Sfr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sfr({:02X?})", &self.0[..])
    }
}

/// A register index outside `0..=7` was passed by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("register index {0} is out of range (expected 0-7)")]
pub struct RegisterIndexError(pub u8);

/// Absolute lower-RAM address of register `index` in the bank selected by
/// `psw` (RS1:RS0).
pub fn register_address(psw: u8, index: u8) -> Result<u8, RegisterIndexError> {
    if index > 7 {
        return Err(RegisterIndexError(index));
    }
    Ok(bank_base(psw) + index)
}

/// Byte address and bit position of a bit address: bits 0x00-0x7F live in
/// lower RAM 0x20-0x2F, bits 0x80-0xFF in the SFRs at multiples of 8.
pub fn bit_address(bit: u8) -> (u8, u8) {
    if bit < 0x80 {
        (0x20 + (bit >> 3), bit & 0x07)
    } else {
        (bit & 0xF8, bit & 0x07)
    }
}

/// Start of the active register bank. RS1:RS0 sit at bits 4:3, so masking
/// the PSW yields `bank * 8` directly.
#[inline(always)]
pub(crate) fn bank_base(psw: u8) -> u8 {
    psw & 0x18
}

/// All memory owned by one CPU instance.
#[derive(Clone, PartialEq, Eq)]
pub struct Memory {
    variant: Variant,
    code: Box<[u8]>,
    xdata: Box<[u8]>,
    lower: [u8; BANK_SIZE],
    upper: Option<Box<[u8; BANK_SIZE]>>,
    sfr: Sfr,
}

impl Memory {
    /// Allocates zeroed memory for `variant`, including upper internal RAM.
    pub fn new(variant: Variant) -> Self {
        Self {
            variant,
            code: vec![0; variant.code_size()].into_boxed_slice(),
            xdata: vec![0; variant.xdata_size()].into_boxed_slice(),
            lower: [0; BANK_SIZE],
            upper: Some(Box::new([0; BANK_SIZE])),
            sfr: Sfr::default(),
        }
    }

    /// Drops the upper 128 bytes of internal RAM, as on a classic 8051 core.
    /// Stack pushes above 0x7F then raise a stack exception.
    pub fn without_upper_ram(mut self) -> Self {
        self.upper = None;
        self
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn has_upper_ram(&self) -> bool {
        self.upper.is_some()
    }

    pub fn code(&self) -> &[u8] {
        &self.code
    }

    pub fn code_mut(&mut self) -> &mut [u8] {
        &mut self.code
    }

    pub fn xdata(&self) -> &[u8] {
        &self.xdata
    }

    pub fn xdata_mut(&mut self) -> &mut [u8] {
        &mut self.xdata
    }

    pub fn lower(&self) -> &[u8; BANK_SIZE] {
        &self.lower
    }

    pub fn lower_mut(&mut self) -> &mut [u8; BANK_SIZE] {
        &mut self.lower
    }

    pub fn upper(&self) -> Option<&[u8; BANK_SIZE]> {
        self.upper.as_deref()
    }

    pub fn upper_mut(&mut self) -> Option<&mut [u8; BANK_SIZE]> {
        self.upper.as_deref_mut()
    }

    pub fn sfr(&self) -> &Sfr {
        &self.sfr
    }

    pub fn sfr_mut(&mut self) -> &mut Sfr {
        &mut self.sfr
    }

    /// Code byte at `addr`, wrapped to the code memory size.
    pub fn code_byte(&self, addr: u16) -> u8 {
        self.code[addr as usize % self.code.len()]
    }

    /// Internal RAM through indirect addressing (`@Ri`, stack).
    pub fn read_indirect(&self, addr: u8) -> u8 {
        if addr < 0x80 {
            self.lower[addr as usize]
        } else {
            match &self.upper {
                Some(upper) => upper[(addr - 0x80) as usize],
                None => UNMAPPED,
            }
        }
    }

    /// Writes through indirect addressing. Writes above 0x7F are dropped
    /// when there is no upper RAM.
    pub fn write_indirect(&mut self, addr: u8, value: u8) {
        if addr < 0x80 {
            self.lower[addr as usize] = value;
        } else if let Some(upper) = &mut self.upper {
            upper[(addr - 0x80) as usize] = value;
        }
    }

    /// Zeroes every region and loads the power-on SFR values.
    pub(crate) fn wipe(&mut self) {
        self.code.fill(0);
        self.xdata.fill(0);
        self.lower.fill(0);
        if let Some(upper) = &mut self.upper {
            upper.fill(0);
        }
        self.sfr = Sfr::default();
        self.sfr.set(SFR_SP, SP_RESET);
        for port in [SFR_P0, SFR_P1, SFR_P2, SFR_P3] {
            self.sfr.set(port, 0xFF);
        }
    }
}

impl fmt::Debug for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memory")
            .field("variant", &self.variant)
            .field("code", &format_args!("[{} bytes]", self.code.len()))
            .field("xdata", &format_args!("[{} bytes]", self.xdata.len()))
            .field("upper", &self.upper.is_some())
            .finish_non_exhaustive()
    }
}

/// Reduces `addr` into a region of `len` bytes.
#[inline(always)]
pub(crate) fn wrap(addr: u16, len: usize) -> usize {
    addr as usize % len.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_address_follows_bank_select() {
        assert_eq!(register_address(0x00, 0), Ok(0x00));
        assert_eq!(register_address(0x08, 7), Ok(0x0F));
        assert_eq!(register_address(0x10, 2), Ok(0x12));
        assert_eq!(register_address(0x18 | 0xE7, 5), Ok(0x1D));
    }

    #[test]
    fn register_address_rejects_out_of_range_index() {
        assert_eq!(register_address(0, 8), Err(RegisterIndexError(8)));
        assert_eq!(
            RegisterIndexError(9).to_string(),
            "register index 9 is out of range (expected 0-7)"
        );
    }

    #[test]
    fn bit_addresses() {
        assert_eq!(bit_address(0x00), (0x20, 0));
        assert_eq!(bit_address(0x7F), (0x2F, 7));
        assert_eq!(bit_address(0xAF), (0xA8, 7));
        assert_eq!(bit_address(0xD5), (0xD0, 5));
    }

    #[test]
    fn variant_profiles() {
        assert_eq!(Variant::Ch551.code_size(), 10240);
        assert_eq!(Variant::Ch551.xdata_size(), 512);
        assert_eq!(Variant::Ch559.code_size(), 65536);
        assert_eq!(Variant::Ch559.xdata_size(), 6144);
        for variant in Variant::ALL {
            let memory = Memory::new(variant);
            assert_eq!(memory.code().len(), variant.code_size());
            assert_eq!(memory.xdata().len(), variant.xdata_size());
            assert!(memory.has_upper_ram());
        }
    }

    #[test]
    fn indirect_access_without_upper_ram() {
        let mut memory = Memory::new(Variant::Ch552).without_upper_ram();
        memory.write_indirect(0x90, 0x12);
        assert_eq!(memory.read_indirect(0x90), UNMAPPED);
        memory.write_indirect(0x10, 0x34);
        assert_eq!(memory.read_indirect(0x10), 0x34);
        assert_eq!(memory.upper(), None);
    }

    #[test]
    fn indirect_access_with_upper_ram() {
        let mut memory = Memory::new(Variant::Ch552);
        memory.write_indirect(0x90, 0x12);
        assert_eq!(memory.read_indirect(0x90), 0x12);
        assert_eq!(memory.upper().map(|upper| upper[0x10]), Some(0x12));
    }

    #[test]
    fn code_reads_wrap_on_non_power_of_two_sizes() {
        let mut memory = Memory::new(Variant::Ch551);
        memory.code_mut()[0] = 0xAB;
        assert_eq!(memory.code_byte(10240), 0xAB);
    }

    #[test]
    fn wipe_loads_power_on_sfr_values() {
        let mut memory = Memory::new(Variant::Ch554);
        memory.lower_mut()[3] = 1;
        memory.code_mut()[3] = 1;
        memory.wipe();
        assert_eq!(memory.lower()[3], 0);
        assert_eq!(memory.code()[3], 0);
        assert_eq!(memory.sfr().get(SFR_SP), SP_RESET);
        assert_eq!(memory.sfr().get(SFR_P1), 0xFF);
    }
}
