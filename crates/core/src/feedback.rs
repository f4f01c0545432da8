use thiserror::Error;

/// Notes of the closing flourish, in Hz, played 60 ms apart.
pub const FINALE_NOTES_HZ: [u32; 6] = [523, 659, 784, 1047, 880, 1175];
pub const FINALE_NOTE_SPACING_MS: u64 = 60;
/// Offsets of the celebration bursts after the cue.
pub const CELEBRATION_BURSTS_MS: [u64; 3] = [0, 350, 800];
/// Base sweep of a flip tone before the pitch multiplier.
pub const TONE_SWEEP_HZ: (f64, f64) = (1047.0, 1568.0);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FeedbackError {
    #[error("feedback unavailable: {0}")]
    Unavailable(String),
}

/// Audible and visual cues. Implementations may fail; the sequencer ignores
/// every error they return.
pub trait Feedback {
    fn play_tone(&mut self, pitch: f64) -> Result<(), FeedbackError>;
    fn play_finale(&mut self) -> Result<(), FeedbackError>;
    fn play_celebration(&mut self) -> Result<(), FeedbackError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SilentFeedback;

impl Feedback for SilentFeedback {
    fn play_tone(&mut self, _pitch: f64) -> Result<(), FeedbackError> {
        Ok(())
    }

    fn play_finale(&mut self) -> Result<(), FeedbackError> {
        Ok(())
    }

    fn play_celebration(&mut self) -> Result<(), FeedbackError> {
        Ok(())
    }
}

pub(crate) fn swallow(cue: &str, result: Result<(), FeedbackError>) {
    if let Err(err) = result {
        tracing::debug!(cue, "feedback skipped: {}", err);
    }
}
