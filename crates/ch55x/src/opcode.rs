//! The 256-entry instruction table shared by the engine and the disassembler.
//!
//! Each row of [`op_table!`] matches an opcode against a pattern, with the
//! embedded-operand bits (register `n`, `@Ri` index `i`, or the AJMP/ACALL
//! page) masked off. Operands carried in later instruction bytes are named by
//! their byte index so the table stays `const`.

/// Operand of a byte-wide operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    /// The accumulator (implicit, bypasses the SFR hook).
    A,
    /// `Rn` in the active register bank.
    R(u8),
    /// `@Ri`: internal RAM addressed by `R0`/`R1`.
    Indirect(u8),
    /// Direct address taken from instruction byte `k`.
    Direct(u8),
    /// Immediate value taken from instruction byte `k`.
    Immediate(u8),
}

/// Operand of a bit-wide operation. The bit address is always byte 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitOperand {
    C,
    Bit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Carry,
    NoCarry,
    Zero,
    NotZero,
}

/// External data address of a `MOVX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XAddr {
    Dptr,
    R(u8),
}

/// Addressing-mode tag of the instruction's principal operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Implied,
    Register,
    Immediate,
    Direct,
    Indirect,
    Bit,
    Relative,
    Absolute,
    Long,
    Indexed,
}

/// What an instruction does. Branch displacements are always the last
/// instruction byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Illegal,
    Nop,
    Ajmp,
    Acall,
    Ljmp,
    Lcall,
    Ret,
    Reti,
    Sjmp,
    JmpIndexed,
    Jump(Condition),
    /// `JB` / `JNB` / `JBC`: branch when the bit equals `set`, clearing it
    /// first if `clear`.
    JumpBit { set: bool, clear: bool },
    Djnz(Operand),
    Cjne(Operand, Operand),
    Mov(Operand, Operand),
    MovDptr,
    MovcDptr,
    MovcPc,
    MovxRead(XAddr),
    MovxWrite(XAddr),
    Push,
    Pop,
    Xch(Operand),
    Xchd(u8),
    Inc(Operand),
    Dec(Operand),
    IncDptr,
    Add(Operand),
    Addc(Operand),
    Subb(Operand),
    Anl(Operand, Operand),
    Orl(Operand, Operand),
    Xrl(Operand, Operand),
    AnlC { invert: bool },
    OrlC { invert: bool },
    MovCBit,
    MovBitC,
    Clr(BitOperand),
    Setb(BitOperand),
    Cpl(BitOperand),
    ClrA,
    CplA,
    Rl,
    Rlc,
    Rr,
    Rrc,
    Swap,
    Da,
    Mul,
    Div,
}

/// One instruction descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    pub opcode: u8,
    /// Mnemonic template, rendered by the disassembler.
    pub mnemonic: &'static str,
    /// Encoded length in bytes (1-3).
    pub len: u8,
    /// Base cost in machine cycles.
    pub cycles: u8,
    pub mode: Mode,
    pub operation: Operation,
}

impl Opcode {
    /// Descriptor for `opcode`.
    #[inline(always)]
    pub fn of(opcode: u8) -> &'static Opcode {
        &OPCODES[opcode as usize]
    }

    pub fn is_illegal(&self) -> bool {
        self.operation == Operation::Illegal
    }
}

macro_rules! op_table {
    (
        ($op:ident, $n:ident, $i:ident)
        $(
            $mnemonic:literal $pattern:literal $(- $mask:literal)? => $len:literal, $cycles:literal, $mode:ident, $operation:expr ;
        )*
    ) => {
        const fn lookup($op: u8) -> Opcode {
            #![allow(unused_variables)]
            use Operand::*;
            use Operation::*;

            let $n = $op & 0x07;
            let $i = $op & 0x01;
            $(
                if $op $(& !$mask)? == $pattern {
                    return Opcode {
                        opcode: $op,
                        mnemonic: $mnemonic,
                        len: $len,
                        cycles: $cycles,
                        mode: Mode::$mode,
                        operation: $operation,
                    };
                }
            )*
            Opcode {
                opcode: $op,
                mnemonic: "???",
                len: 1,
                cycles: 0,
                mode: Mode::Implied,
                operation: Illegal,
            }
        }
    };
}

op_table! {
    (op, n, i)

    // Control flow
    "NOP"                    0x00        => 1, 1, Implied, Nop;
    "AJMP {addr11}"          0x01 - 0xE0 => 2, 2, Absolute, Ajmp;
    "ACALL {addr11}"         0x11 - 0xE0 => 2, 2, Absolute, Acall;
    "LJMP {addr16}"          0x02        => 3, 2, Long, Ljmp;
    "LCALL {addr16}"         0x12        => 3, 2, Long, Lcall;
    "RET"                    0x22        => 1, 2, Implied, Ret;
    "RETI"                   0x32        => 1, 2, Implied, Reti;
    "SJMP {rel}"             0x80        => 2, 2, Relative, Sjmp;
    "JMP @A+DPTR"            0x73        => 1, 2, Indexed, JmpIndexed;
    "JC {rel}"               0x40        => 2, 2, Relative, Jump(Condition::Carry);
    "JNC {rel}"              0x50        => 2, 2, Relative, Jump(Condition::NoCarry);
    "JZ {rel}"               0x60        => 2, 2, Relative, Jump(Condition::Zero);
    "JNZ {rel}"              0x70        => 2, 2, Relative, Jump(Condition::NotZero);
    "JBC {bit},{rel}"        0x10        => 3, 2, Bit, JumpBit { set: true, clear: true };
    "JB {bit},{rel}"         0x20        => 3, 2, Bit, JumpBit { set: true, clear: false };
    "JNB {bit},{rel}"        0x30        => 3, 2, Bit, JumpBit { set: false, clear: false };

    // Compare and loop
    "DJNZ {direct},{rel}"    0xD5        => 3, 2, Direct, Djnz(Direct(1));
    "DJNZ R{n},{rel}"        0xD8 - 0x07 => 2, 2, Register, Djnz(R(n));
    "CJNE A,{imm},{rel}"     0xB4        => 3, 2, Immediate, Cjne(A, Immediate(1));
    "CJNE A,{direct},{rel}"  0xB5        => 3, 2, Direct, Cjne(A, Direct(1));
    "CJNE @R{i},{imm},{rel}" 0xB6 - 0x01 => 3, 2, Indirect, Cjne(Indirect(i), Immediate(1));
    "CJNE R{n},{imm},{rel}"  0xB8 - 0x07 => 3, 2, Register, Cjne(R(n), Immediate(1));

    // DPTR / MOVX / MOVC
    "MOV DPTR,{imm16}"       0x90        => 3, 2, Long, MovDptr;
    "INC DPTR"               0xA3        => 1, 2, Implied, IncDptr;
    "MOVC A,@A+DPTR"         0x93        => 1, 2, Indexed, MovcDptr;
    "MOVC A,@A+PC"           0x83        => 1, 2, Indexed, MovcPc;
    "MOVX A,@DPTR"           0xE0        => 1, 2, Indirect, MovxRead(XAddr::Dptr);
    "MOVX A,@R{i}"           0xE2 - 0x01 => 1, 2, Indirect, MovxRead(XAddr::R(i));
    "MOVX @DPTR,A"           0xF0        => 1, 2, Indirect, MovxWrite(XAddr::Dptr);
    "MOVX @R{i},A"           0xF2 - 0x01 => 1, 2, Indirect, MovxWrite(XAddr::R(i));

    // Increment / decrement
    "INC A"                  0x04        => 1, 1, Implied, Inc(A);
    "INC {direct}"           0x05        => 2, 1, Direct, Inc(Direct(1));
    "INC @R{i}"              0x06 - 0x01 => 1, 1, Indirect, Inc(Indirect(i));
    "INC R{n}"               0x08 - 0x07 => 1, 1, Register, Inc(R(n));
    "DEC A"                  0x14        => 1, 1, Implied, Dec(A);
    "DEC {direct}"           0x15        => 2, 1, Direct, Dec(Direct(1));
    "DEC @R{i}"              0x16 - 0x01 => 1, 1, Indirect, Dec(Indirect(i));
    "DEC R{n}"               0x18 - 0x07 => 1, 1, Register, Dec(R(n));

    // Arithmetic
    "ADD A,{imm}"            0x24        => 2, 1, Immediate, Add(Immediate(1));
    "ADD A,{direct}"         0x25        => 2, 1, Direct, Add(Direct(1));
    "ADD A,@R{i}"            0x26 - 0x01 => 1, 1, Indirect, Add(Indirect(i));
    "ADD A,R{n}"             0x28 - 0x07 => 1, 1, Register, Add(R(n));
    "ADDC A,{imm}"           0x34        => 2, 1, Immediate, Addc(Immediate(1));
    "ADDC A,{direct}"        0x35        => 2, 1, Direct, Addc(Direct(1));
    "ADDC A,@R{i}"           0x36 - 0x01 => 1, 1, Indirect, Addc(Indirect(i));
    "ADDC A,R{n}"            0x38 - 0x07 => 1, 1, Register, Addc(R(n));
    "SUBB A,{imm}"           0x94        => 2, 1, Immediate, Subb(Immediate(1));
    "SUBB A,{direct}"        0x95        => 2, 1, Direct, Subb(Direct(1));
    "SUBB A,@R{i}"           0x96 - 0x01 => 1, 1, Indirect, Subb(Indirect(i));
    "SUBB A,R{n}"            0x98 - 0x07 => 1, 1, Register, Subb(R(n));
    "MUL AB"                 0xA4        => 1, 4, Implied, Mul;
    "DIV AB"                 0x84        => 1, 4, Implied, Div;
    "DA A"                   0xD4        => 1, 1, Implied, Da;

    // Logic
    "ORL {direct},A"         0x42        => 2, 1, Direct, Orl(Direct(1), A);
    "ORL {direct},{imm}"     0x43        => 3, 2, Direct, Orl(Direct(1), Immediate(2));
    "ORL A,{imm}"            0x44        => 2, 1, Immediate, Orl(A, Immediate(1));
    "ORL A,{direct}"         0x45        => 2, 1, Direct, Orl(A, Direct(1));
    "ORL A,@R{i}"            0x46 - 0x01 => 1, 1, Indirect, Orl(A, Indirect(i));
    "ORL A,R{n}"             0x48 - 0x07 => 1, 1, Register, Orl(A, R(n));
    "ANL {direct},A"         0x52        => 2, 1, Direct, Anl(Direct(1), A);
    "ANL {direct},{imm}"     0x53        => 3, 2, Direct, Anl(Direct(1), Immediate(2));
    "ANL A,{imm}"            0x54        => 2, 1, Immediate, Anl(A, Immediate(1));
    "ANL A,{direct}"         0x55        => 2, 1, Direct, Anl(A, Direct(1));
    "ANL A,@R{i}"            0x56 - 0x01 => 1, 1, Indirect, Anl(A, Indirect(i));
    "ANL A,R{n}"             0x58 - 0x07 => 1, 1, Register, Anl(A, R(n));
    "XRL {direct},A"         0x62        => 2, 1, Direct, Xrl(Direct(1), A);
    "XRL {direct},{imm}"     0x63        => 3, 2, Direct, Xrl(Direct(1), Immediate(2));
    "XRL A,{imm}"            0x64        => 2, 1, Immediate, Xrl(A, Immediate(1));
    "XRL A,{direct}"         0x65        => 2, 1, Direct, Xrl(A, Direct(1));
    "XRL A,@R{i}"            0x66 - 0x01 => 1, 1, Indirect, Xrl(A, Indirect(i));
    "XRL A,R{n}"             0x68 - 0x07 => 1, 1, Register, Xrl(A, R(n));
    "CLR A"                  0xE4        => 1, 1, Implied, ClrA;
    "CPL A"                  0xF4        => 1, 1, Implied, CplA;
    "RR A"                   0x03        => 1, 1, Implied, Rr;
    "RRC A"                  0x13        => 1, 1, Implied, Rrc;
    "RL A"                   0x23        => 1, 1, Implied, Rl;
    "RLC A"                  0x33        => 1, 1, Implied, Rlc;
    "SWAP A"                 0xC4        => 1, 1, Implied, Swap;

    // MOV families
    "MOV A,{imm}"            0x74        => 2, 1, Immediate, Mov(A, Immediate(1));
    "MOV {direct},{imm}"     0x75        => 3, 2, Direct, Mov(Direct(1), Immediate(2));
    "MOV @R{i},{imm}"        0x76 - 0x01 => 2, 1, Immediate, Mov(Indirect(i), Immediate(1));
    "MOV R{n},{imm}"         0x78 - 0x07 => 2, 1, Immediate, Mov(R(n), Immediate(1));
    "MOV {dst},{src}"        0x85        => 3, 2, Direct, Mov(Direct(2), Direct(1));
    "MOV {direct},@R{i}"     0x86 - 0x01 => 2, 2, Direct, Mov(Direct(1), Indirect(i));
    "MOV {direct},R{n}"      0x88 - 0x07 => 2, 2, Direct, Mov(Direct(1), R(n));
    "MOV @R{i},{direct}"     0xA6 - 0x01 => 2, 2, Direct, Mov(Indirect(i), Direct(1));
    "MOV R{n},{direct}"      0xA8 - 0x07 => 2, 2, Direct, Mov(R(n), Direct(1));
    "MOV A,{direct}"         0xE5        => 2, 1, Direct, Mov(A, Direct(1));
    "MOV A,@R{i}"            0xE6 - 0x01 => 1, 1, Indirect, Mov(A, Indirect(i));
    "MOV A,R{n}"             0xE8 - 0x07 => 1, 1, Register, Mov(A, R(n));
    "MOV {direct},A"         0xF5        => 2, 1, Direct, Mov(Direct(1), A);
    "MOV @R{i},A"            0xF6 - 0x01 => 1, 1, Indirect, Mov(Indirect(i), A);
    "MOV R{n},A"             0xF8 - 0x07 => 1, 1, Register, Mov(R(n), A);

    // Stack and exchange
    "PUSH {direct}"          0xC0        => 2, 2, Direct, Push;
    "POP {direct}"           0xD0        => 2, 2, Direct, Pop;
    "XCH A,{direct}"         0xC5        => 2, 1, Direct, Xch(Direct(1));
    "XCH A,@R{i}"            0xC6 - 0x01 => 1, 1, Indirect, Xch(Indirect(i));
    "XCH A,R{n}"             0xC8 - 0x07 => 1, 1, Register, Xch(R(n));
    "XCHD A,@R{i}"           0xD6 - 0x01 => 1, 1, Indirect, Xchd(i);

    // Carry and bit operations
    "CLR C"                  0xC3        => 1, 1, Implied, Clr(BitOperand::C);
    "SETB C"                 0xD3        => 1, 1, Implied, Setb(BitOperand::C);
    "CPL C"                  0xB3        => 1, 1, Implied, Cpl(BitOperand::C);
    "CLR {bit}"              0xC2        => 2, 1, Bit, Clr(BitOperand::Bit);
    "SETB {bit}"             0xD2        => 2, 1, Bit, Setb(BitOperand::Bit);
    "CPL {bit}"              0xB2        => 2, 1, Bit, Cpl(BitOperand::Bit);
    "MOV C,{bit}"            0xA2        => 2, 1, Bit, MovCBit;
    "MOV {bit},C"            0x92        => 2, 2, Bit, MovBitC;
    "ANL C,{bit}"            0x82        => 2, 2, Bit, AnlC { invert: false };
    "ANL C,/{bit}"           0xB0        => 2, 2, Bit, AnlC { invert: true };
    "ORL C,{bit}"            0x72        => 2, 2, Bit, OrlC { invert: false };
    "ORL C,/{bit}"           0xA0        => 2, 2, Bit, OrlC { invert: true };
}

const fn build() -> [Opcode; 256] {
    let mut table = [lookup(0); 256];
    let mut op = 0;
    while op < 256 {
        table[op] = lookup(op as u8);
        op += 1;
    }
    table
}

/// Every opcode, indexed by its byte.
pub static OPCODES: [Opcode; 256] = build();

/// Placeholder in a mnemonic template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Placeholder {
    /// Register index from the low three opcode bits.
    N,
    /// `@Ri` index from the low opcode bit.
    I,
    Direct,
    Imm,
    Bit,
    Rel,
    Imm16,
    Addr16,
    Addr11,
    /// Destination of `MOV dir,dir` (byte 2).
    Dst,
    /// Source of `MOV dir,dir` (byte 1).
    Src,
}

impl Placeholder {
    pub(crate) fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "n" => Placeholder::N,
            "i" => Placeholder::I,
            "direct" => Placeholder::Direct,
            "imm" => Placeholder::Imm,
            "bit" => Placeholder::Bit,
            "rel" => Placeholder::Rel,
            "imm16" => Placeholder::Imm16,
            "addr16" => Placeholder::Addr16,
            "addr11" => Placeholder::Addr11,
            "dst" => Placeholder::Dst,
            "src" => Placeholder::Src,
            _ => return None,
        })
    }

    /// Instruction bytes the placeholder stands for.
    pub(crate) fn width(self) -> u8 {
        match self {
            Placeholder::N | Placeholder::I => 0,
            Placeholder::Imm16 | Placeholder::Addr16 => 2,
            _ => 1,
        }
    }
}

/// A run of literal text or a placeholder in a mnemonic template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Piece {
    Text(&'static str),
    Field(Placeholder),
}

/// Splits a template into literal text and placeholders.
pub(crate) fn template(mnemonic: &'static str) -> impl Iterator<Item = Piece> {
    let mut rest = mnemonic;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let piece = match (rest.find('{'), rest.find('}')) {
            (Some(0), Some(end)) => {
                let (token, tail) = rest.split_at(end + 1);
                rest = tail;
                match Placeholder::parse(&token[1..end]) {
                    Some(field) => Piece::Field(field),
                    None => Piece::Text(token),
                }
            }
            (Some(start), _) if start > 0 => {
                let (text, tail) = rest.split_at(start);
                rest = tail;
                Piece::Text(text)
            }
            _ => Piece::Text(std::mem::take(&mut rest)),
        };
        Some(piece)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_a5_is_illegal() {
        let illegal: Vec<u8> = OPCODES
            .iter()
            .filter(|op| op.is_illegal())
            .map(|op| op.opcode)
            .collect();
        assert_eq!(illegal, vec![0xA5]);
    }

    #[test]
    fn table_is_indexed_by_opcode() {
        for (index, op) in OPCODES.iter().enumerate() {
            assert_eq!(op.opcode as usize, index);
            assert!((1..=3).contains(&op.len), "{:02X}", op.opcode);
        }
    }

    #[test]
    fn templates_account_for_every_operand_byte() {
        for op in OPCODES.iter().filter(|op| !op.is_illegal()) {
            let width: u8 = template(op.mnemonic)
                .map(|piece| match piece {
                    Piece::Field(field) => field.width(),
                    Piece::Text(_) => 0,
                })
                .sum();
            assert_eq!(width + 1, op.len, "{:02X} {}", op.opcode, op.mnemonic);
        }
    }

    #[test]
    fn embedded_operands() {
        assert_eq!(Opcode::of(0x2D).operation, Operation::Add(Operand::R(5)));
        assert_eq!(
            Opcode::of(0xB7).operation,
            Operation::Cjne(Operand::Indirect(1), Operand::Immediate(1))
        );
        assert_eq!(Opcode::of(0xE1).operation, Operation::Ajmp);
        assert_eq!(Opcode::of(0xF1).operation, Operation::Acall);
        assert_eq!(
            Opcode::of(0x85).operation,
            Operation::Mov(Operand::Direct(2), Operand::Direct(1))
        );
    }

    #[test]
    fn cycle_costs() {
        assert_eq!(Opcode::of(0x00).cycles, 1);
        assert_eq!(Opcode::of(0x12).cycles, 2);
        assert_eq!(Opcode::of(0xA4).cycles, 4);
        assert_eq!(Opcode::of(0x84).cycles, 4);
        assert_eq!(Opcode::of(0xA5).cycles, 0);
    }

    #[test]
    fn addressing_modes() {
        assert_eq!(Opcode::of(0x85).mode, Mode::Direct);
        assert_eq!(Opcode::of(0x80).mode, Mode::Relative);
        assert_eq!(Opcode::of(0x02).mode, Mode::Long);
        assert_eq!(Opcode::of(0x21).mode, Mode::Absolute);
        assert_eq!(Opcode::of(0xE7).mode, Mode::Indirect);
        assert_eq!(Opcode::of(0xEC).mode, Mode::Register);
        assert_eq!(Opcode::of(0x73).mode, Mode::Indexed);
    }
}
