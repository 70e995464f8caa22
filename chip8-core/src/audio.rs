//! Square-wave tone state for audio backends.
//!
//! The backend owns an `AudioState` and hands it to `fill` from its sample
//! callback, together with the current `SoundFlag` reading. Phase carries over
//! between calls so consecutive buffers join without clicks.

pub const SAMPLE_RATE: u32 = 44_100;
pub const BEEP_FREQ: u32 = 440;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioState {
    sample_rate: u32,
    frequency: u32,
    amplitude: i16,
    phase: u32,
}

impl AudioState {
    pub fn new(sample_rate: u32, frequency: u32, amplitude: i16) -> Self {
        Self {
            sample_rate,
            frequency,
            amplitude,
            phase: 0,
        }
    }

    /// Samples in one full period of the tone
    pub fn period(&self) -> u32 {
        (self.sample_rate / self.frequency.max(1)).max(2)
    }

    pub fn phase(&self) -> u32 {
        self.phase
    }

    /// Fill `out` with the tone when `active`, with silence otherwise
    ///
    /// Phase is only advanced while the tone plays.
    pub fn fill(&mut self, active: bool, out: &mut [i16]) {
        if !active {
            out.iter_mut().for_each(|sample| *sample = 0);
            return;
        }
        let period = self.period();
        for sample in out.iter_mut() {
            *sample = if self.phase < period / 2 {
                self.amplitude
            } else {
                -self.amplitude
            };
            self.phase = (self.phase + 1) % period;
        }
    }
}

impl Default for AudioState {
    fn default() -> Self {
        Self::new(SAMPLE_RATE, BEEP_FREQ, i16::MAX / 8)
    }
}
