use crate::RevealResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Cue {
    Flip { index: usize },
    Tone { pitch: f64 },
    Finale,
    Celebration,
    ShowResult { result: RevealResult },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimedCue {
    pub at_ms: u64,
    #[serde(flatten)]
    pub cue: Cue,
}

/// Cues in the order they were emitted.
#[derive(Debug, Default, Clone)]
pub struct CueTrace {
    cues: Vec<TimedCue>,
}

impl CueTrace {
    pub fn push(&mut self, at_ms: u64, cue: Cue) {
        self.cues.push(TimedCue { at_ms, cue });
    }

    pub fn drain(&mut self) -> impl Iterator<Item = TimedCue> + '_ {
        self.cues.drain(..)
    }

    pub fn cues(&self) -> &[TimedCue] {
        &self.cues
    }

    pub fn flips(&self) -> impl Iterator<Item = (u64, usize)> + '_ {
        self.cues.iter().filter_map(|timed| match timed.cue {
            Cue::Flip { index } => Some((timed.at_ms, index)),
            _ => None,
        })
    }
}
