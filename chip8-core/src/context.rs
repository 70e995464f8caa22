//! Context for accessing functionalities of platform that `Chip8` is
//! emulated on.
//!
//! Display, sound and keyboard are not part of it: the interpreter exposes
//! its frame, sound flag and key latch, and the driver moves data in and out.

use nanorand::{rand::pcg64::Pcg64 as Rng, RNG};

/// Trait aggregating platform functionalities
pub trait Context {
    /// Generate random 8-bit number
    ///
    /// Called by `tick_chip` whenever requested by executing program
    fn gen_random(&mut self) -> u8;
}

/// Context backed by a seeded PCG64 generator
pub struct SeededContext {
    rng: Rng,
}

impl SeededContext {
    pub fn new(seed: u128) -> Self {
        Self {
            rng: Rng::new_seed(seed),
        }
    }
}

impl Context for SeededContext {
    fn gen_random(&mut self) -> u8 {
        self.rng.generate::<u8>()
    }
}

impl<C: Context + ?Sized> Context for &mut C {
    fn gen_random(&mut self) -> u8 {
        (**self).gen_random()
    }
}
