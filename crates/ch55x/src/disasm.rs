use std::fmt;

use crate::memory::{bit_address, wrap};
use crate::opcode::{Opcode, Piece, Placeholder, template};
use crate::sfr::sfr_name;

/// One decoded instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disassembly {
    pub address: u16,
    /// Raw instruction bytes, opcode first.
    pub bytes: Vec<u8>,
    pub text: String,
}

/// `{}` prints the mnemonic; `{:#}` prints a listing line with the address
/// and bytes.
impl fmt::Display for Disassembly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            write!(f, "{:04X}: ", self.address)?;
            for byte in &self.bytes {
                write!(f, "{byte:02X} ")?;
            }
            for _ in self.bytes.len()..3 {
                f.write_str("   ")?;
            }
            write!(f, " {}", self.text)
        } else {
            f.write_str(&self.text)
        }
    }
}

enum Direct {
    Register(u8),
    Ram(u8),
    Sfr(u8),
}

impl From<u8> for Direct {
    fn from(value: u8) -> Self {
        match value {
            0x00..=0x1F => Self::Register(value),
            0x20..=0x7F => Self::Ram(value),
            _ => Self::Sfr(value),
        }
    }
}

impl fmt::Display for Direct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Register(value) => write!(f, "R{}.BANK{}", value % 8, value / 8),
            Self::Ram(value) => write!(f, "RAM(#{value:02X})"),
            Self::Sfr(value) => match sfr_name(value) {
                Some(name) => f.write_str(name),
                None => write!(f, "SFR(#{value:02X})"),
            },
        }
    }
}

struct Bit(u8);

impl fmt::Display for Bit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (byte, pos) = bit_address(self.0);
        write!(f, "{}.{}", Direct::from(byte), pos)
    }
}

/// Decodes the instruction at `address`. Reads wrap around the end of
/// `code`, like instruction fetch does.
pub fn disassemble(code: &[u8], address: u16) -> Disassembly {
    let byte = |offset: u16| {
        code.get(wrap(address.wrapping_add(offset), code.len()))
            .copied()
            .unwrap_or(0)
    };
    let opcode = Opcode::of(byte(0));
    let bytes: Vec<u8> = (0..opcode.len as u16).map(byte).collect();

    let mut text = String::new();
    let mut cursor = 1;
    for piece in template(opcode.mnemonic) {
        match piece {
            Piece::Text(literal) => text.push_str(literal),
            Piece::Field(field) => {
                text.push_str(&render(field, opcode, address, &bytes, cursor));
                cursor += field.width() as usize;
            }
        }
    }

    Disassembly {
        address,
        bytes,
        text,
    }
}

fn render(field: Placeholder, opcode: &Opcode, address: u16, bytes: &[u8], cursor: usize) -> String {
    let at = |index: usize| bytes.get(index).copied().unwrap_or(0);
    match field {
        Placeholder::N => (opcode.opcode & 0x07).to_string(),
        Placeholder::I => (opcode.opcode & 0x01).to_string(),
        Placeholder::Direct => Direct::from(at(cursor)).to_string(),
        Placeholder::Imm => format!("#{:02X}", at(cursor)),
        Placeholder::Bit => Bit(at(cursor)).to_string(),
        Placeholder::Rel => format!("{:+}", at(bytes.len() - 1) as i8),
        Placeholder::Imm16 | Placeholder::Addr16 => {
            format!("#{:04X}", u16::from_be_bytes([at(1), at(2)]))
        }
        Placeholder::Addr11 => {
            let next = address.wrapping_add(opcode.len as u16);
            let target = (next & 0xF800) | ((opcode.opcode as u16 & 0xE0) << 3) | at(1) as u16;
            format!("#{target:04X}")
        }
        Placeholder::Dst => Direct::from(at(2)).to_string(),
        Placeholder::Src => Direct::from(at(1)).to_string(),
    }
}
