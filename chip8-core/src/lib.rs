#![no_std]
extern crate alloc;

pub mod audio;
pub mod builder;
pub mod chip8;
pub mod context;
pub mod error;
pub mod frame;
pub mod opcode;
pub mod quirks;
pub mod timer;
pub mod trace;

pub use audio::AudioState;
pub use builder::Builder;
pub use chip8::Chip8;
pub use context::{Context, SeededContext};
pub use error::Error;
pub use frame::FrameView;
pub use opcode::OpCode;
pub use quirks::Quirks;
pub use timer::SoundFlag;

pub use nb;

#[cfg(feature = "embedded-graphics")]
pub use embedded_graphics;
