use lixi_core::{Feedback, FeedbackError, Presenter, RevealResult, CELEBRATION_BURSTS_MS};
use std::time::Duration;

const CELEBRATION_LINGER: Duration = Duration::from_millis(2_400);

/// What the grid shows: which cards are turned and the final banner.
#[derive(Debug, Default)]
pub struct Board {
    pub flipped: Vec<bool>,
    pub result: Option<RevealResult>,
}

impl Board {
    pub fn new(cards: usize) -> Self {
        Self {
            flipped: vec![false; cards],
            result: None,
        }
    }

    pub fn is_flipped(&self, index: usize) -> bool {
        self.flipped.get(index).copied().unwrap_or(false)
    }
}

impl Presenter for Board {
    fn flip(&mut self, index: usize) {
        if let Some(slot) = self.flipped.get_mut(index) {
            *slot = true;
        }
    }

    fn show_result(&mut self, result: &RevealResult) {
        self.result = Some(result.clone());
    }
}

/// Terminal feedback: a sparkle marker per tone, a bell for the finale and a
/// timed confetti banner.
#[derive(Debug, Default)]
pub struct TerminalEffects {
    pub last_pitch: Option<f64>,
    bell_pending: bool,
    celebration_at: Option<Duration>,
    now: Duration,
}

impl TerminalEffects {
    pub fn set_now(&mut self, now: Duration) {
        self.now = now;
    }

    pub fn take_bell(&mut self) -> bool {
        std::mem::take(&mut self.bell_pending)
    }

    /// Number of confetti bursts already fired, or `None` outside a celebration.
    pub fn celebration_bursts(&self) -> Option<usize> {
        let start = self.celebration_at?;
        let elapsed = self.now.checked_sub(start)?;
        if elapsed > CELEBRATION_LINGER {
            return None;
        }
        Some(
            CELEBRATION_BURSTS_MS
                .iter()
                .filter(|at| Duration::from_millis(**at) <= elapsed)
                .count(),
        )
    }
}

impl Feedback for TerminalEffects {
    fn play_tone(&mut self, pitch: f64) -> Result<(), FeedbackError> {
        self.last_pitch = Some(pitch);
        Ok(())
    }

    fn play_finale(&mut self) -> Result<(), FeedbackError> {
        self.bell_pending = true;
        Ok(())
    }

    fn play_celebration(&mut self) -> Result<(), FeedbackError> {
        self.celebration_at = Some(self.now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flip_ignores_out_of_range() {
        let mut board = Board::new(3);
        board.flip(1);
        board.flip(7);
        assert_eq!(board.flipped, vec![false, true, false]);
    }

    #[test]
    fn celebration_bursts_follow_schedule() {
        let mut fx = TerminalEffects::default();
        assert_eq!(fx.celebration_bursts(), None);
        fx.set_now(Duration::from_millis(2_000));
        fx.play_celebration().expect("celebrate");
        assert_eq!(fx.celebration_bursts(), Some(1));
        fx.set_now(Duration::from_millis(2_400));
        assert_eq!(fx.celebration_bursts(), Some(2));
        fx.set_now(Duration::from_millis(2_800));
        assert_eq!(fx.celebration_bursts(), Some(3));
        fx.set_now(Duration::from_millis(6_000));
        assert_eq!(fx.celebration_bursts(), None);
    }

    #[test]
    fn bell_is_taken_once() {
        let mut fx = TerminalEffects::default();
        fx.play_finale().expect("finale");
        assert!(fx.take_bell());
        assert!(!fx.take_bell());
    }
}
