//! Per-step register dump, emitted through `log` before an instruction runs.

use core::fmt;

use crate::opcode::Instruction;

/// Log target of trace records, so they can be filtered apart from the rest
pub const TARGET: &str = "chip8_core::trace";

/// Borrowed snapshot of the registers shown in a trace line
#[derive(Debug, Copy, Clone)]
pub struct TraceLine<'a> {
    pub pc: u16,
    pub instruction: Instruction,
    pub sp: usize,
    pub i: u16,
    pub v: &'a [u8; 16],
}

impl<'a> fmt::Display for TraceLine<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PC: {:03X} | Instr: {:04X} | SP: {} | I: {:03X} | V: [",
            self.pc, self.instruction, self.sp, self.i
        )?;
        for (n, v) in self.v.iter().enumerate() {
            if n > 0 {
                write!(f, " ")?;
            }
            write!(f, "{:02X}", v)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::fmt::Write;
    use heapless::{consts::U256, String};

    #[test]
    fn renders_registers() {
        let mut v = [0u8; 16];
        v[0] = 0x05;
        v[15] = 0xFF;
        let line = TraceLine {
            pc: 0x200,
            instruction: Instruction::new(0x6A05),
            sp: 1,
            i: 0x50,
            v: &v,
        };

        let mut out: String<U256> = String::new();
        write!(out, "{}", line).unwrap();
        assert_eq!(
            out.as_str(),
            "PC: 200 | Instr: 6A05 | SP: 1 | I: 050 | \
             V: [05 00 00 00 00 00 00 00 00 00 00 00 00 00 00 FF]"
        );
    }
}
