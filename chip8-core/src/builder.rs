use crate::chip8::Chip8;
use crate::context::Context;
use crate::error::Error;
use crate::quirks::Quirks;

/// Step-by-step construction of a `Chip8`
///
/// ```
/// use chip8_core::{Builder, Quirks, SeededContext};
///
/// let chip = Builder::new()
///     .with_context(SeededContext::new(0))
///     .with_program(&[0x12, 0x00])
///     .with_quirks(Quirks::COSMAC)
///     .build()
///     .unwrap();
/// assert_eq!(chip.pc(), 0x200);
/// ```
pub struct Builder<'a, C: Context> {
    context: Option<C>,
    program: Option<&'a [u8]>,
    quirks: Quirks,
    trace: bool,
}

impl<'a, C: Context> Builder<'a, C> {
    pub fn new() -> Self {
        Self {
            context: None,
            program: None,
            quirks: Quirks::default(),
            trace: false,
        }
    }

    pub fn with_context(mut self, ctx: C) -> Self {
        self.context = Some(ctx);
        self
    }

    pub fn with_program(mut self, prog: &'a [u8]) -> Self {
        self.program = Some(prog);
        self
    }

    pub fn with_quirks(mut self, quirks: Quirks) -> Self {
        self.quirks = quirks;
        self
    }

    /// Log every executed instruction at `trace` level under `trace::TARGET`
    pub fn with_trace(mut self, enabled: bool) -> Self {
        self.trace = enabled;
        self
    }

    pub fn build(self) -> Result<Chip8<C>, Error> {
        let context = self.context.ok_or(Error::MissingContext)?;
        let program = self.program.ok_or(Error::MissingProgram)?;
        let mut chip = Chip8::load(context, program);
        chip.set_quirks(self.quirks);
        chip.set_trace(self.trace);
        Ok(chip)
    }
}

impl<'a, C: Context> Default for Builder<'a, C> {
    fn default() -> Self {
        Self::new()
    }
}
