use heapless::{consts::U16, Vec};
use log::{debug, error, trace, warn};

use crate::context::Context;
use crate::error::Error;
use crate::frame::{Frame, FrameView};
use crate::opcode::{Instruction, OpCode};
use crate::quirks::Quirks;
use crate::timer::{SoundFlag, Timers};
use crate::trace::{self, TraceLine};

pub const MEMORY_SIZE: usize = 4096;
pub const PROGRAM_START: u16 = 0x200;
pub const MAX_PROGRAM_SIZE: usize = MEMORY_SIZE - PROGRAM_START as usize;
pub const FONT_START: u16 = 0x050;
pub const STACK_SIZE: usize = 16;
/// Instructions `run_frame` executes per timer tick
pub const CYCLES_PER_FRAME: usize = 10;

/// Hexadecimal digits 0-F, 5 rows each
#[rustfmt::skip]
pub const FONTSET: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

const VF: usize = 0xF;
const FONT_AREA: core::ops::Range<usize> = FONT_START as usize..FONT_START as usize + FONTSET.len();

/// Mask an address into the 4K address space
#[inline]
fn addr(address: u16) -> usize {
    (address & 0x0FFFu16) as usize
}

/// CHIP-8 interpreter state
///
/// The interpreter is driven from outside:
/// - `tick_chip` runs a single instruction,
/// - `tick_timers` is expected to be called at 60Hz, no matter how many
///   instructions were executed in between,
/// - `frame`, `sound_flag` and `set_keys` move data between the interpreter
///   and the platform.
pub struct Chip8<C: Context> {
    pub ctx: C,
    quirks: Quirks,
    trace: bool,
    v: [u8; 16],
    i: u16,
    pc: u16,
    frame: Frame,
    memory: [u8; MEMORY_SIZE],
    stack: Vec<u16, U16>,
    timers: Timers,
    keys: [bool; 16],
}

impl<C: Context> Chip8<C> {
    pub fn new(ctx: C) -> Self {
        let mut memory = [0; MEMORY_SIZE];
        memory[FONT_AREA].copy_from_slice(&FONTSET);
        Self {
            ctx,
            quirks: Quirks::default(),
            trace: false,
            v: [0; 16],
            i: 0,
            pc: PROGRAM_START,
            frame: Frame::new(),
            memory,
            stack: Vec::new(),
            timers: Timers::new(),
            keys: [false; 16],
        }
    }

    /// Create an interpreter with `prog` already loaded
    pub fn load(ctx: C, prog: &[u8]) -> Self {
        let mut chip = Self::new(ctx);
        chip.load_program(prog);
        chip
    }

    /// Load program from slice of bytes to memory from 0x200 (_start address)
    ///
    /// Anything past the end of memory is dropped. Returns the number of bytes
    /// actually loaded.
    pub fn load_program(&mut self, prog: &[u8]) -> usize {
        let start = PROGRAM_START as usize;
        let loaded = prog.len().min(MAX_PROGRAM_SIZE);
        self.memory[start..start + loaded].copy_from_slice(&prog[..loaded]);
        if loaded < prog.len() {
            debug!(
                "program truncated to {} bytes, {} bytes dropped",
                loaded,
                prog.len() - loaded
            );
        } else {
            debug!("loaded program of {} bytes", loaded);
        }
        loaded
    }

    pub(crate) fn set_quirks(&mut self, quirks: Quirks) {
        self.quirks = quirks;
    }

    pub(crate) fn set_trace(&mut self, enabled: bool) {
        self.trace = enabled;
    }

    pub fn quirks(&self) -> Quirks {
        self.quirks
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn i(&self) -> u16 {
        self.i
    }

    /// Number of return addresses on the stack
    pub fn sp(&self) -> usize {
        self.stack.len()
    }

    pub fn stack(&self) -> &[u16] {
        &self.stack
    }

    /// Value of register V`x`, `x` is masked to a nibble
    pub fn v(&self, x: u8) -> u8 {
        self.v[(x & 0xF) as usize]
    }

    pub fn registers(&self) -> &[u8; 16] {
        &self.v
    }

    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    pub fn delay_timer(&self) -> u8 {
        self.timers.delay.load()
    }

    pub fn sound_timer(&self) -> u8 {
        self.timers.sound.load()
    }

    /// Handle to the sound signal, clones can be handed to an audio thread
    pub fn sound_flag(&self) -> SoundFlag {
        self.timers.sound_active.clone()
    }

    pub fn frame(&self) -> FrameView<'_> {
        self.frame.view()
    }

    pub fn keys(&self) -> &[bool; 16] {
        &self.keys
    }

    /// Overwrite the state of all 16 keys at once
    pub fn set_keys(&mut self, keys: [bool; 16]) {
        self.keys = keys;
    }

    /// Advance delay and sound timers by a single 60Hz tick
    pub fn tick_timers(&mut self) {
        self.timers.tick();
    }

    /// Fetch, decode and execute a single instruction
    ///
    /// Returns the executed opcode. `WouldBlock` means the program waits for
    /// a key press (`FX0A`) and the same instruction will run again on the next
    /// call. Errors leave PC at the faulting instruction.
    pub fn tick_chip(&mut self) -> nb::Result<OpCode, Error> {
        let pc = self.pc;
        let instruction = self.fetch();
        if self.trace {
            trace!(target: trace::TARGET, "{}", self.trace_line(instruction));
        }
        self.pc = self.pc.wrapping_add(2);

        let opcode = OpCode::decode(instruction);
        match self.execute(opcode) {
            Ok(()) => Ok(opcode),
            Err(nb::Error::WouldBlock) => Err(nb::Error::WouldBlock),
            Err(nb::Error::Other(err)) => {
                error!("halted at {:#05x}: {}", pc, err);
                self.pc = pc;
                Err(nb::Error::Other(err))
            }
        }
    }

    /// Run up to `CYCLES_PER_FRAME` instructions followed by one timer tick
    ///
    /// The batch ends early when the program starts waiting for a key.
    pub fn run_frame(&mut self) -> Result<(), Error> {
        for _ in 0..CYCLES_PER_FRAME {
            match self.tick_chip() {
                Ok(_) => {}
                Err(nb::Error::WouldBlock) => break,
                Err(nb::Error::Other(err)) => return Err(err),
            }
        }
        self.tick_timers();
        Ok(())
    }

    fn fetch(&self) -> Instruction {
        Instruction::from_be_bytes(
            self.memory[addr(self.pc)],
            self.memory[addr(self.pc.wrapping_add(1))],
        )
    }

    fn trace_line(&self, instruction: Instruction) -> TraceLine<'_> {
        TraceLine {
            pc: self.pc,
            instruction,
            sp: self.stack.len(),
            i: self.i,
            v: &self.v,
        }
    }

    /// Write a byte on behalf of the running program, the font area is read-only
    fn store(&mut self, address: u16, value: u8) {
        let address = addr(address);
        if FONT_AREA.contains(&address) {
            debug!("write to font memory at {:#05x} dropped", address);
            return;
        }
        self.memory[address] = value;
    }

    fn skip_if(&mut self, condition: bool) {
        if condition {
            self.pc = self.pc.wrapping_add(2);
        }
    }

    /// Source register of a shift, depends on `shift_uses_vy`
    fn shift_source(&self, x: u8, y: u8) -> u8 {
        if self.quirks.shift_uses_vy {
            self.v[y as usize]
        } else {
            self.v[x as usize]
        }
    }
}

// OpCodes impls
impl<C: Context> Chip8<C> {
    /// Apply a decoded opcode to the machine state
    ///
    /// PC is expected to already point past the instruction.
    #[rustfmt::skip]
    pub fn execute(&mut self, opcode: OpCode) -> nb::Result<(), Error> {
        match opcode {
            OpCode::_00E0             => self.clear_screen(),
            OpCode::_00EE             => return self.subroutine_return(),
            OpCode::_1NNN { nnn }     => self.jump_to(nnn),
            OpCode::_2NNN { nnn }     => return self.exec_subroutine_at(nnn),
            OpCode::_3XNN { x, nn }   => self.skip_if_vx_eq_nn(x, nn),
            OpCode::_4XNN { x, nn }   => self.skip_if_vx_ne_nn(x, nn),
            OpCode::_5XY0 { x, y }    => self.skip_if_vx_eq_vy(x, y),
            OpCode::_6XNN { x, nn }   => self.assign_vx_nn(x, nn),
            OpCode::_7XNN { x, nn }   => self.assign_add_vx_nn(x, nn),
            OpCode::_8XY0 { x, y }    => self.assign_vx_vy(x, y),
            OpCode::_8XY1 { x, y }    => self.assign_or_vx_vy(x, y),
            OpCode::_8XY2 { x, y }    => self.assign_and_vx_vy(x, y),
            OpCode::_8XY3 { x, y }    => self.assign_xor_vx_vy(x, y),
            OpCode::_8XY4 { x, y }    => self.assign_add_vx_vy(x, y),
            OpCode::_8XY5 { x, y }    => self.assign_sub_vx_vy(x, y),
            OpCode::_8XY6 { x, y }    => self.assign_vx_shifted_r(x, y),
            OpCode::_8XY7 { x, y }    => self.assign_vx_vy_sub_vx(x, y),
            OpCode::_8XYE { x, y }    => self.assign_vx_shifted_l(x, y),
            OpCode::_9XY0 { x, y }    => self.skip_if_vx_ne_vy(x, y),
            OpCode::_ANNN { nnn }     => self.assign_i_nnn(nnn),
            OpCode::_BNNN { nnn }     => self.jump_to_nnn_add_v0(nnn),
            OpCode::_CXNN { x, nn }   => self.assign_vx_random_and_nn(x, nn),
            OpCode::_DXYN { x, y, n } => self.draw_n_at_vx_vy(x, y, n),
            OpCode::_EX9E { x }       => self.skip_if_vx_in_keys(x),
            OpCode::_EXA1 { x }       => self.skip_if_vx_not_in_keys(x),
            OpCode::_FX07 { x }       => self.assign_vx_delay_t(x),
            OpCode::_FX0A { x }       => return self.assign_vx_wait_for_key(x),
            OpCode::_FX15 { x }       => self.assign_delay_t_vx(x),
            OpCode::_FX18 { x }       => self.assign_sound_t_vx(x),
            OpCode::_FX1E { x }       => self.assign_add_i_vx(x),
            OpCode::_FX29 { x }       => self.assign_i_addr_of_sprite_vx(x),
            OpCode::_FX33 { x }       => self.assign_mem_at_i_bcd_of_vx(x),
            OpCode::_FX55 { x }       => self.assign_mem_at_i_v0_to_vx(x),
            OpCode::_FX65 { x }       => self.assign_v0_to_vx_mem_at_i(x),
            OpCode::Unknown { raw }   => self.unknown(raw),
        }
        Ok(())
    }

    /// Clear the screen
    /// 00E0
    fn clear_screen(&mut self) {
        self.frame.clear();
    }

    /// Return from a subroutine
    /// 00EE
    fn subroutine_return(&mut self) -> nb::Result<(), Error> {
        match self.stack.pop() {
            Some(addr) => {
                self.pc = addr;
                Ok(())
            }
            None if self.quirks.halt_on_empty_return => Err(nb::Error::Other(Error::StackUnderflow)),
            None => {
                debug!("return outside of subroutine ignored");
                Ok(())
            }
        }
    }

    /// Jump to address NNN
    /// 1NNN { nnn: u16 }
    fn jump_to(&mut self, nnn: u16) {
        self.pc = nnn;
    }

    /// Execute subroutine starting at address NNN
    /// 2NNN { nnn: u16 }
    fn exec_subroutine_at(&mut self, nnn: u16) -> nb::Result<(), Error> {
        self.stack
            .push(self.pc)
            .map_err(|_| nb::Error::Other(Error::StackOverflow { addr: nnn }))?;
        self.pc = nnn;
        Ok(())
    }

    /// Skip the following instruction if the value of register VX equals NN
    /// 3XNN { x: u8, nn: u8 }
    fn skip_if_vx_eq_nn(&mut self, x: u8, nn: u8) {
        self.skip_if(self.v[x as usize] == nn);
    }

    /// Skip the following instruction if the value of register VX is not equal to NN
    /// 4XNN { x: u8, nn: u8 }
    fn skip_if_vx_ne_nn(&mut self, x: u8, nn: u8) {
        self.skip_if(self.v[x as usize] != nn);
    }

    /// Skip the following instruction if the value of register VX is equal to the value of register VY
    /// 5XY0 { x: u8, y: u8 }
    fn skip_if_vx_eq_vy(&mut self, x: u8, y: u8) {
        self.skip_if(self.v[x as usize] == self.v[y as usize]);
    }

    /// Store number NN in register VX
    /// 6XNN { x: u8, nn: u8 }
    fn assign_vx_nn(&mut self, x: u8, nn: u8) {
        self.v[x as usize] = nn;
    }

    /// Add the value NN to register VX, carry is not reported
    /// 7XNN { x: u8, nn: u8 }
    fn assign_add_vx_nn(&mut self, x: u8, nn: u8) {
        self.v[x as usize] = self.v[x as usize].wrapping_add(nn);
    }

    /// Store the value of register VY in register VX
    /// 8XY0 { x: u8, y: u8 }
    fn assign_vx_vy(&mut self, x: u8, y: u8) {
        self.v[x as usize] = self.v[y as usize];
    }

    /// Set VX to VX OR VY
    /// 8XY1 { x: u8, y: u8 }
    fn assign_or_vx_vy(&mut self, x: u8, y: u8) {
        self.v[x as usize] |= self.v[y as usize];
        self.reset_vf_after_logic();
    }

    /// Set VX to VX AND VY
    /// 8XY2 { x: u8, y: u8 }
    fn assign_and_vx_vy(&mut self, x: u8, y: u8) {
        self.v[x as usize] &= self.v[y as usize];
        self.reset_vf_after_logic();
    }

    /// Set VX to VX XOR VY
    /// 8XY3 { x: u8, y: u8 }
    fn assign_xor_vx_vy(&mut self, x: u8, y: u8) {
        self.v[x as usize] ^= self.v[y as usize];
        self.reset_vf_after_logic();
    }

    fn reset_vf_after_logic(&mut self) {
        if self.quirks.logic_resets_vf {
            self.v[VF] = 0;
        }
    }

    /// Add the value of register VY to register VX, Set VF to 01 if a carry occurs, Set VF to 00 if a carry does not occur
    /// 8XY4 { x: u8, y: u8 }
    fn assign_add_vx_vy(&mut self, x: u8, y: u8) {
        let (value, carry) = self.v[x as usize].overflowing_add(self.v[y as usize]);
        self.v[x as usize] = value;
        self.v[VF] = carry as u8;
    }

    /// Subtract the value of register VY from register VX, Set VF to 01 if VX was greater than VY, 00 otherwise
    /// 8XY5 { x: u8, y: u8 }
    fn assign_sub_vx_vy(&mut self, x: u8, y: u8) {
        let (vx, vy) = (self.v[x as usize], self.v[y as usize]);
        self.v[x as usize] = vx.wrapping_sub(vy);
        self.v[VF] = (vx > vy) as u8;
    }

    /// Shift right by one bit, Set register VF to the least significant bit prior to the shift
    /// 8XY6 { x: u8, y: u8 }
    fn assign_vx_shifted_r(&mut self, x: u8, y: u8) {
        let value = self.shift_source(x, y);
        self.v[x as usize] = value >> 1;
        self.v[VF] = value & 1u8;
    }

    /// Set register VX to the value of VY minus VX, Set VF to 01 if VY was greater than VX, 00 otherwise
    /// 8XY7 { x: u8, y: u8 }
    fn assign_vx_vy_sub_vx(&mut self, x: u8, y: u8) {
        let (vx, vy) = (self.v[x as usize], self.v[y as usize]);
        self.v[x as usize] = vy.wrapping_sub(vx);
        self.v[VF] = (vy > vx) as u8;
    }

    /// Shift left by one bit, Set register VF to the most significant bit prior to the shift
    /// 8XYE { x: u8, y: u8 }
    fn assign_vx_shifted_l(&mut self, x: u8, y: u8) {
        let value = self.shift_source(x, y);
        self.v[x as usize] = value << 1;
        self.v[VF] = value >> 7;
    }

    /// Skip the following instruction if the value of register VX is not equal to the value of register VY
    /// 9XY0 { x: u8, y: u8 }
    fn skip_if_vx_ne_vy(&mut self, x: u8, y: u8) {
        self.skip_if(self.v[x as usize] != self.v[y as usize]);
    }

    /// Store memory address NNN in register I
    /// ANNN { nnn: u16 }
    fn assign_i_nnn(&mut self, nnn: u16) {
        self.i = nnn;
    }

    /// Jump to address NNN + V0, or XNN + VX with `jump_uses_vx`
    /// BNNN { nnn: u16 }
    fn jump_to_nnn_add_v0(&mut self, nnn: u16) {
        let offset = if self.quirks.jump_uses_vx {
            self.v[(nnn >> 8) as usize]
        } else {
            self.v[0]
        };
        self.pc = nnn + offset as u16;
    }

    /// Set VX to a random number with a mask of NN
    /// CXNN { x: u8, nn: u8 }
    fn assign_vx_random_and_nn(&mut self, x: u8, nn: u8) {
        self.v[x as usize] = self.ctx.gen_random() & nn;
    }

    /// Draw a sprite at position VX, VY with N bytes of sprite data starting at the address stored in I, Set VF to 01 if any set pixels are changed to unset, and 00 otherwise
    /// DXYN { x: u8, y: u8, n: u8 }
    fn draw_n_at_vx_vy(&mut self, x: u8, y: u8, n: u8) {
        let mut sprite = [0u8; 15];
        for (row, byte) in sprite.iter_mut().enumerate().take(n as usize) {
            *byte = self.memory[addr(self.i.wrapping_add(row as u16))];
        }
        let collision = self.frame.draw_sprite(
            self.v[x as usize] as usize,
            self.v[y as usize] as usize,
            &sprite[..n as usize],
        );
        self.v[VF] = collision as u8;
    }

    /// Skip the following instruction if the key corresponding to the hex value currently stored in register VX is pressed
    /// EX9E { x: u8 }
    fn skip_if_vx_in_keys(&mut self, x: u8) {
        self.skip_if(self.keys[(self.v[x as usize] & 0xF) as usize]);
    }

    /// Skip the following instruction if the key corresponding to the hex value currently stored in register VX is not pressed
    /// EXA1 { x: u8 }
    fn skip_if_vx_not_in_keys(&mut self, x: u8) {
        self.skip_if(!self.keys[(self.v[x as usize] & 0xF) as usize]);
    }

    /// Store the current value of the delay timer in register VX
    /// FX07 { x: u8 }
    fn assign_vx_delay_t(&mut self, x: u8) {
        self.v[x as usize] = self.timers.delay.load();
    }

    /// Wait for a keypress and store the result in register VX
    /// FX0A { x: u8 }
    ///
    /// Waiting does not block: PC is wound back so the instruction is
    /// fetched again on the next tick.
    fn assign_vx_wait_for_key(&mut self, x: u8) -> nb::Result<(), Error> {
        match self.keys.iter().position(|&pressed| pressed) {
            Some(key) => {
                self.v[x as usize] = key as u8;
                Ok(())
            }
            None => {
                self.pc = self.pc.wrapping_sub(2);
                Err(nb::Error::WouldBlock)
            }
        }
    }

    /// Set the delay timer to the value of register VX
    /// FX15 { x: u8 }
    fn assign_delay_t_vx(&mut self, x: u8) {
        self.timers.delay.store(self.v[x as usize]);
    }

    /// Set the sound timer to the value of register VX
    /// FX18 { x: u8 }
    fn assign_sound_t_vx(&mut self, x: u8) {
        self.timers.sound.store(self.v[x as usize]);
    }

    /// Add the value stored in register VX to register I, Set VF to 01 if I leaves the address space
    /// FX1E { x: u8 }
    fn assign_add_i_vx(&mut self, x: u8) {
        let result = self.i.wrapping_add(self.v[x as usize] as u16);
        self.v[VF] = (result > 0x0FFFu16) as u8;
        self.i = result;
    }

    /// Set I to the memory address of the sprite data corresponding to the hexadecimal digit stored in register VX
    /// FX29 { x: u8 }
    fn assign_i_addr_of_sprite_vx(&mut self, x: u8) {
        self.i = FONT_START + (self.v[x as usize] & 0xF) as u16 * 5;
    }

    /// Store the binary-coded decimal equivalent of the value stored in register VX at addresses I, I+1, and I+2
    /// FX33 { x: u8 }
    fn assign_mem_at_i_bcd_of_vx(&mut self, x: u8) {
        let value = self.v[x as usize];
        self.store(self.i, value / 100u8);
        self.store(self.i.wrapping_add(1), (value % 100) / 10u8);
        self.store(self.i.wrapping_add(2), value % 10u8);
    }

    /// Store the values of registers V0 to VX inclusive in memory starting at address I
    /// FX55 { x: u8 }
    fn assign_mem_at_i_v0_to_vx(&mut self, x: u8) {
        for idx in 0..=x {
            self.store(self.i.wrapping_add(idx as u16), self.v[idx as usize]);
        }
        if self.quirks.memory_increments_i {
            self.i = self.i.wrapping_add(x as u16 + 1);
        }
    }

    /// Fill registers V0 to VX inclusive with the values stored in memory starting at address I
    /// FX65 { x: u8 }
    fn assign_v0_to_vx_mem_at_i(&mut self, x: u8) {
        for idx in 0..=x {
            self.v[idx as usize] = self.memory[addr(self.i.wrapping_add(idx as u16))];
        }
        if self.quirks.memory_increments_i {
            self.i = self.i.wrapping_add(x as u16 + 1);
        }
    }

    fn unknown(&mut self, raw: u16) {
        warn!(
            "unknown instruction {:04X} at {:#05x}",
            raw,
            self.pc.wrapping_sub(2)
        );
    }
}
