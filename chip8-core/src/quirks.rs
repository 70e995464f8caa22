//! Behavioural switches for opcodes that historical interpreters disagree on.
//!
//! Resolved once, when the interpreter is built. `Quirks::default()` is the
//! convention most modern ROMs and test suites assume.

/// Set of interpreter quirks
///
/// ```
/// use chip8_core::Quirks;
///
/// let quirks = Quirks {
///     jump_uses_vx: true,
///     ..Quirks::default()
/// };
/// assert!(!quirks.shift_uses_vy);
/// ```
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Quirks {
    /// `8XY6`/`8XYE` shift VY and store the result in VX, instead of
    /// shifting VX in place
    pub shift_uses_vy: bool,
    /// `BNNN` is read as `BXNN` and jumps to XNN + VX, instead of NNN + V0
    pub jump_uses_vx: bool,
    /// `FX55`/`FX65` leave I pointing past the last transferred byte
    pub memory_increments_i: bool,
    /// `8XY1`/`8XY2`/`8XY3` clear VF
    pub logic_resets_vf: bool,
    /// `00EE` on an empty stack halts with an error, instead of being ignored
    pub halt_on_empty_return: bool,
}

impl Quirks {
    /// Behaviour of the modern interpreters most ROMs target
    pub const MODERN: Quirks = Quirks {
        shift_uses_vy: false,
        jump_uses_vx: false,
        memory_increments_i: false,
        logic_resets_vf: false,
        halt_on_empty_return: false,
    };

    /// Behaviour of the original COSMAC VIP interpreter
    pub const COSMAC: Quirks = Quirks {
        shift_uses_vy: true,
        jump_uses_vx: false,
        memory_increments_i: true,
        logic_resets_vf: true,
        halt_on_empty_return: true,
    };

    /// Behaviour of SUPER-CHIP on the HP48
    pub const SUPER_CHIP: Quirks = Quirks {
        shift_uses_vy: false,
        jump_uses_vx: true,
        memory_increments_i: false,
        logic_resets_vf: false,
        halt_on_empty_return: false,
    };
}

impl Default for Quirks {
    fn default() -> Self {
        Self::MODERN
    }
}
