//! Countdown timers and the sound signal shared with an audio backend.
//!
//! Both timers are owned by the interpreter and only ever touched from the
//! thread running it. The derived "sound active" signal is the exception: it
//! is read from an audio callback, so it lives behind an atomic in `SoundFlag`.

use alloc::sync::Arc;
use core::sync::atomic::{AtomicBool, Ordering};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TimerState {
    On,
    Off,
    Finished,
}

#[derive(Debug, Default)]
pub struct Timer(u8);

impl Timer {
    pub fn new() -> Self {
        Self(0)
    }

    #[inline]
    pub fn store(&mut self, value: u8) {
        self.0 = value;
    }

    #[inline]
    pub fn load(&self) -> u8 {
        self.0
    }

    /// Count down by one, saturating at zero
    #[inline]
    pub fn decrement(&mut self) -> TimerState {
        if self.0 > 0 {
            self.0 -= 1;
            if self.0 == 0 {
                TimerState::Finished
            } else {
                TimerState::On
            }
        } else {
            TimerState::Off
        }
    }
}

/// Cloneable handle to the "sound active" signal
///
/// The interpreter is the single writer, any clone may be moved to the audio
/// side and polled from there:
///
/// ```
/// use chip8_core::timer::SoundFlag;
///
/// let flag = SoundFlag::new();
/// let audio_side = flag.clone();
/// flag.set(true);
/// assert!(audio_side.is_active());
/// ```
#[derive(Clone, Debug, Default)]
pub struct SoundFlag(Arc<AtomicBool>);

impl SoundFlag {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set(&self, active: bool) {
        self.0.store(active, Ordering::Release);
    }
}

/// Delay and sound timers, ticked together at 60Hz
#[derive(Debug, Default)]
pub struct Timers {
    pub(crate) delay: Timer,
    pub(crate) sound: Timer,
    pub(crate) sound_active: SoundFlag,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance both timers by one logical tick
    ///
    /// The sound signal stays up for every tick that found the sound timer
    /// running, including the one that brings it down to zero.
    pub fn tick(&mut self) {
        self.delay.decrement();
        match self.sound.decrement() {
            TimerState::On | TimerState::Finished => self.sound_active.set(true),
            TimerState::Off => self.sound_active.set(false),
        }
    }
}
