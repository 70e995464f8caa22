use core::fmt;

/// Raw 16-bit instruction word together with its field accessors
///
/// Every `u16` is a valid `Instruction`, splitting it never fails:
///
/// ```
/// use chip8_core::opcode::Instruction;
///
/// let instruction = Instruction::new(0xD12F);
/// assert_eq!(instruction.f(), 0xD);
/// assert_eq!(instruction.x(), 0x1);
/// assert_eq!(instruction.y(), 0x2);
/// assert_eq!(instruction.n(), 0xF);
/// assert_eq!(instruction.nn(), 0x2F);
/// assert_eq!(instruction.nnn(), 0x12F);
/// ```
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Instruction(u16);

impl Instruction {
    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    /// Assemble an instruction from two bytes stored big-endian in memory
    pub const fn from_be_bytes(hi: u8, lo: u8) -> Self {
        Self((hi as u16) << 8 | lo as u16)
    }

    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Instruction group, bits 15-12
    pub const fn f(self) -> u8 {
        (self.0 >> 12 & 0x000Fu16) as u8
    }

    /// Bits 11-8
    pub const fn x(self) -> u8 {
        (self.0 >> 8 & 0x000Fu16) as u8
    }

    /// Bits 7-4
    pub const fn y(self) -> u8 {
        (self.0 >> 4 & 0x000Fu16) as u8
    }

    /// Bits 3-0
    pub const fn n(self) -> u8 {
        (self.0 & 0x000Fu16) as u8
    }

    /// Bits 7-0
    pub const fn nn(self) -> u8 {
        (self.0 & 0x00FFu16) as u8
    }

    /// Bits 11-0
    pub const fn nnn(self) -> u16 {
        self.0 & 0x0FFFu16
    }
}

impl From<u16> for Instruction {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

impl fmt::UpperHex for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::UpperHex::fmt(&self.0, f)
    }
}

/// An enum representing the 35 opcodes of chip-8 architecture, and a single
/// variant for anything else
///
/// Based on [chip8 mastering](http://mattmik.com/files/chip8/mastering/chip8.html)
///
/// Examples:
/// ```
/// use chip8_core::opcode::OpCode;
///
/// assert_eq!(OpCode::from(0x1ABC), OpCode::_1NNN { nnn: 0x0ABC });
/// assert_eq!(OpCode::from(0x0ABC), OpCode::Unknown { raw: 0x0ABC });
/// ```
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum OpCode {
    /// Clear the screen
    _00E0,
    /// Return from a subroutine
    _00EE,
    /// Jump to address NNN
    _1NNN { nnn: u16 },
    /// Execute subroutine starting at address NNN
    _2NNN { nnn: u16 },
    /// Skip the following instruction if the value of register VX equals NN
    _3XNN { x: u8, nn: u8 },
    /// Skip the following instruction if the value of register VX is not equal to NN
    _4XNN { x: u8, nn: u8 },
    /// Skip the following instruction if the value of register VX is equal to the value of register VY
    _5XY0 { x: u8, y: u8 },
    /// Store number NN in register VX
    _6XNN { x: u8, nn: u8 },
    /// Add the value NN to register VX
    _7XNN { x: u8, nn: u8 },
    /// Store the value of register VY in register VX
    _8XY0 { x: u8, y: u8 },
    /// Set VX to VX OR VY
    _8XY1 { x: u8, y: u8 },
    /// Set VX to VX AND VY
    _8XY2 { x: u8, y: u8 },
    /// Set VX to VX XOR VY
    _8XY3 { x: u8, y: u8 },
    /// Add the value of register VY to register VX, Set VF to 01 if a carry occurs, Set VF to 00 if a carry does not occur
    _8XY4 { x: u8, y: u8 },
    /// Subtract the value of register VY from register VX, Set VF to 01 if VX was greater than VY, 00 otherwise
    _8XY5 { x: u8, y: u8 },
    /// Shift VX right by one bit, Set register VF to the least significant bit prior to the shift
    _8XY6 { x: u8, y: u8 },
    /// Set register VX to the value of VY minus VX, Set VF to 01 if VY was greater than VX, 00 otherwise
    _8XY7 { x: u8, y: u8 },
    /// Shift VX left by one bit, Set register VF to the most significant bit prior to the shift
    _8XYE { x: u8, y: u8 },
    /// Skip the following instruction if the value of register VX is not equal to the value of register VY
    _9XY0 { x: u8, y: u8 },
    /// Store memory address NNN in register I
    _ANNN { nnn: u16 },
    /// Jump to address NNN + V0
    _BNNN { nnn: u16 },
    /// Set VX to a random number with a mask of NN
    _CXNN { x: u8, nn: u8 },
    /// Draw a sprite at position VX, VY with N bytes of sprite data starting at the address stored in I, Set VF to 01 if any set pixels are changed to unset, and 00 otherwise
    _DXYN { x: u8, y: u8, n: u8 },
    /// Skip the following instruction if the key corresponding to the hex value currently stored in register VX is pressed
    _EX9E { x: u8 },
    /// Skip the following instruction if the key corresponding to the hex value currently stored in register VX is not pressed
    _EXA1 { x: u8 },
    /// Store the current value of the delay timer in register VX
    _FX07 { x: u8 },
    /// Wait for a keypress and store the result in register VX
    _FX0A { x: u8 },
    /// Set the delay timer to the value of register VX
    _FX15 { x: u8 },
    /// Set the sound timer to the value of register VX
    _FX18 { x: u8 },
    /// Add the value stored in register VX to register I
    _FX1E { x: u8 },
    /// Set I to the memory address of the sprite data corresponding to the hexadecimal digit stored in register VX
    _FX29 { x: u8 },
    /// Store the binary-coded decimal equivalent of the value stored in register VX at addresses I, I+1, and I+2
    _FX33 { x: u8 },
    /// Store the values of registers V0 to VX inclusive in memory starting at address I
    _FX55 { x: u8 },
    /// Fill registers V0 to VX inclusive with the values stored in memory starting at address I
    _FX65 { x: u8 },
    /// Any instruction word not listed above, `0NNN` machine routines included
    Unknown { raw: u16 },
}

impl OpCode {
    pub fn from(raw: u16) -> Self {
        Self::decode(Instruction::new(raw))
    }

    pub fn decode(ins: Instruction) -> Self {
        let (x, y) = (ins.x(), ins.y());
        match ins.f() {
            0x0u8 => match ins.nnn() {
                0x0E0u16 => OpCode::_00E0,
                0x0EEu16 => OpCode::_00EE,
                _ => OpCode::Unknown { raw: ins.raw() },
            },
            0x1u8 => OpCode::_1NNN { nnn: ins.nnn() },
            0x2u8 => OpCode::_2NNN { nnn: ins.nnn() },
            0x3u8 => OpCode::_3XNN { x, nn: ins.nn() },
            0x4u8 => OpCode::_4XNN { x, nn: ins.nn() },
            0x5u8 if ins.n() == 0x0u8 => OpCode::_5XY0 { x, y },
            0x6u8 => OpCode::_6XNN { x, nn: ins.nn() },
            0x7u8 => OpCode::_7XNN { x, nn: ins.nn() },
            0x8u8 => match ins.n() {
                0x0u8 => OpCode::_8XY0 { x, y },
                0x1u8 => OpCode::_8XY1 { x, y },
                0x2u8 => OpCode::_8XY2 { x, y },
                0x3u8 => OpCode::_8XY3 { x, y },
                0x4u8 => OpCode::_8XY4 { x, y },
                0x5u8 => OpCode::_8XY5 { x, y },
                0x6u8 => OpCode::_8XY6 { x, y },
                0x7u8 => OpCode::_8XY7 { x, y },
                0xEu8 => OpCode::_8XYE { x, y },
                _ => OpCode::Unknown { raw: ins.raw() },
            },
            0x9u8 if ins.n() == 0x0u8 => OpCode::_9XY0 { x, y },
            0xAu8 => OpCode::_ANNN { nnn: ins.nnn() },
            0xBu8 => OpCode::_BNNN { nnn: ins.nnn() },
            0xCu8 => OpCode::_CXNN { x, nn: ins.nn() },
            0xDu8 => OpCode::_DXYN { x, y, n: ins.n() },
            0xEu8 => match ins.nn() {
                0x9Eu8 => OpCode::_EX9E { x },
                0xA1u8 => OpCode::_EXA1 { x },
                _ => OpCode::Unknown { raw: ins.raw() },
            },
            0xFu8 => match ins.nn() {
                0x07u8 => OpCode::_FX07 { x },
                0x0Au8 => OpCode::_FX0A { x },
                0x15u8 => OpCode::_FX15 { x },
                0x18u8 => OpCode::_FX18 { x },
                0x1Eu8 => OpCode::_FX1E { x },
                0x29u8 => OpCode::_FX29 { x },
                0x33u8 => OpCode::_FX33 { x },
                0x55u8 => OpCode::_FX55 { x },
                0x65u8 => OpCode::_FX65 { x },
                _ => OpCode::Unknown { raw: ins.raw() },
            },
            _ => OpCode::Unknown { raw: ins.raw() },
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, OpCode::Unknown { .. })
    }
}

impl From<Instruction> for OpCode {
    fn from(ins: Instruction) -> Self {
        Self::decode(ins)
    }
}
