//! Experience state machine.
//!
//! The controller owns the current phase and the timestamp of the last
//! transition. It is sampled once per rendered frame with a wall-clock
//! timestamp and the most recent microphone amplitude (if any); it never
//! reads a clock itself, so the phase/progress sequence is a pure function
//! of the `(now, amplitude)` samples it is fed.

use std::fmt;

use crate::constants::{AMPLITUDE_THRESHOLD, BLOW_OUT_MS, COUNTDOWN_MS, MORPH_CAKE_MS};

/// The seven phases of the experience, in rough chronological order.
///
/// `Idle` only leaves via [`PhaseController::begin`]; `GiftOpen` is
/// terminal. The `Listening -> Countdown` and `CandlesLit -> BlowOut`
/// edges are audio-triggered, everything else advances on a timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Listening,
    Countdown,
    MorphCake,
    CandlesLit,
    BlowOut,
    GiftOpen,
}

impl Phase {
    /// Nominal duration of the phase, or `None` for phases that never
    /// advance on a timer.
    pub fn duration_ms(self) -> Option<f64> {
        match self {
            Phase::Countdown => Some(COUNTDOWN_MS),
            Phase::MorphCake => Some(MORPH_CAKE_MS),
            Phase::BlowOut => Some(BLOW_OUT_MS),
            Phase::Idle | Phase::Listening | Phase::CandlesLit | Phase::GiftOpen => None,
        }
    }

    /// Fixed successor when the timer expires. `None` for untimed phases.
    fn timer_successor(self) -> Option<Phase> {
        match self {
            Phase::Countdown => Some(Phase::MorphCake),
            Phase::MorphCake => Some(Phase::CandlesLit),
            Phase::BlowOut => Some(Phase::GiftOpen),
            Phase::Idle | Phase::Listening | Phase::CandlesLit | Phase::GiftOpen => None,
        }
    }

    /// Successor when the amplitude signal crosses the trigger threshold.
    /// Only the two "blow into the microphone" edges react to audio.
    fn audio_successor(self) -> Option<Phase> {
        match self {
            Phase::Listening => Some(Phase::Countdown),
            Phase::CandlesLit => Some(Phase::BlowOut),
            Phase::Idle
            | Phase::Countdown
            | Phase::MorphCake
            | Phase::BlowOut
            | Phase::GiftOpen => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Listening => "listening",
            Phase::Countdown => "countdown",
            Phase::MorphCake => "morph-cake",
            Phase::CandlesLit => "candles-lit",
            Phase::BlowOut => "blow-out",
            Phase::GiftOpen => "gift-open",
        };
        f.write_str(name)
    }
}

/// Output of one controller tick, consumed by the particle field and the
/// overlay layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhaseOutput {
    pub phase: Phase,
    /// Fraction of the phase's nominal duration elapsed, clamped to
    /// \[0, 1\]. Always 0 for untimed phases.
    pub progress: f32,
}

/// Timer/audio driven state machine over [`Phase`].
#[derive(Clone, Debug)]
pub struct PhaseController {
    phase: Phase,
    last_transition_ms: f64,
}

impl Default for PhaseController {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseController {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            last_transition_ms: 0.0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// External command that starts the experience. Only meaningful from
    /// `Idle`; a no-op anywhere else.
    pub fn begin(&mut self, now_ms: f64) {
        if self.phase == Phase::Idle {
            self.transition(Phase::Listening, now_ms);
        }
    }

    /// Manual stand-in for the audio trigger, for hosts without a working
    /// microphone. Degraded mode, not an error.
    pub fn trigger(&mut self, now_ms: f64) {
        if let Some(next) = self.phase.audio_successor() {
            self.transition(next, now_ms);
        }
    }

    /// Advance the machine by one frame.
    ///
    /// The audio rule is evaluated first and wins the tick when it fires;
    /// it can only fire from untimed phases, so it never actually contends
    /// with the timer rule. At most one transition happens per call, even
    /// when `now_ms` jumps far past a deadline.
    pub fn tick(&mut self, now_ms: f64, amplitude: Option<u8>) -> PhaseOutput {
        if amplitude.map_or(false, |a| a > AMPLITUDE_THRESHOLD) {
            if let Some(next) = self.phase.audio_successor() {
                self.transition(next, now_ms);
                return self.output(now_ms);
            }
        }

        if let (Some(duration), Some(next)) =
            (self.phase.duration_ms(), self.phase.timer_successor())
        {
            let elapsed = now_ms - self.last_transition_ms;
            if elapsed > duration {
                self.transition(next, now_ms);
            }
        }

        self.output(now_ms)
    }

    fn transition(&mut self, next: Phase, now_ms: f64) {
        log::debug!("phase {} -> {} at {:.0}ms", self.phase, next, now_ms);
        self.phase = next;
        self.last_transition_ms = now_ms;
    }

    fn output(&self, now_ms: f64) -> PhaseOutput {
        let progress = match self.phase.duration_ms() {
            Some(duration) => {
                let elapsed = now_ms - self.last_transition_ms;
                (elapsed / duration).clamp(0.0, 1.0) as f32
            }
            None => 0.0,
        };
        PhaseOutput {
            phase: self.phase,
            progress,
        }
    }
}
