use crate::feedback::swallow;
use crate::{
    display_name, format_vnd, short_amount, Cue, CueTrace, Feedback, GameConfig, KeyValueStore,
    ParticipationGate, ParticipationRecord, PrizeSet, Randomness, RevealTiming, RngState,
    Scheduler, Timeline,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const OTHER_PITCH_BASE: f64 = 0.7;
const OTHER_PITCH_SPAN: f64 = 0.8;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RevealError {
    #[error("card {index} does not exist (have {total})")]
    OutOfRange { index: usize, total: usize },
    #[error("card {index} is not the player's envelope")]
    NotYourCard { index: usize },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RevealPhase {
    Idle,
    UserRevealing,
    OthersRevealing,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealEvent {
    BeginOthers,
    FlipOther { index: usize },
    Settle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickOutcome {
    Started,
    AlreadyPicked,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RevealResult {
    pub amount: u64,
    pub amount_label: String,
    /// Short top prize name for the "missed" line, e.g. `100K`.
    pub top_prize_label: String,
    pub user_slot: usize,
    /// 1-based.
    pub missed_positions: Vec<usize>,
}

impl RevealResult {
    pub fn from_prizes(prizes: &PrizeSet) -> Self {
        let amount = prizes.user_amount();
        Self {
            amount,
            amount_label: format_vnd(amount),
            top_prize_label: short_amount(prizes.top_prize()),
            user_slot: prizes.user_slot(),
            missed_positions: prizes.missed_positions(),
        }
    }
}

/// Renders cards and results.
pub trait Presenter {
    fn flip(&mut self, index: usize);
    fn show_result(&mut self, result: &RevealResult);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPresenter;

impl Presenter for NoopPresenter {
    fn flip(&mut self, _index: usize) {}
    fn show_result(&mut self, _result: &RevealResult) {}
}

/// Synchronous name request; `None` when the user declines.
pub trait NamePrompt {
    fn ask_name(&mut self) -> Option<String>;
}

impl<F> NamePrompt for F
where
    F: FnMut() -> Option<String>,
{
    fn ask_name(&mut self) -> Option<String> {
        self()
    }
}

/// Collaborators the sequencer drives while it runs.
pub struct Stage<'a> {
    pub store: &'a mut dyn KeyValueStore,
    pub feedback: &'a mut dyn Feedback,
    pub presenter: &'a mut dyn Presenter,
    pub prompt: &'a mut dyn NamePrompt,
}

/// Reveal state machine for one page load. Owns the deal, the pick latch and
/// the trace of emitted cues.
#[derive(Debug)]
pub struct RevealSequencer {
    prizes: PrizeSet,
    gate: ParticipationGate,
    timing: RevealTiming,
    anonymous_name: String,
    rng: RngState,
    phase: RevealPhase,
    picked: bool,
    record: Option<ParticipationRecord>,
    result: Option<RevealResult>,
    trace: CueTrace,
}

impl RevealSequencer {
    pub fn new(
        prizes: PrizeSet,
        gate: ParticipationGate,
        config: &GameConfig,
        rng: RngState,
    ) -> Self {
        Self {
            prizes,
            gate,
            timing: config.timing,
            anonymous_name: config.anonymous_name.clone(),
            rng,
            phase: RevealPhase::Idle,
            picked: false,
            record: None,
            result: None,
            trace: CueTrace::default(),
        }
    }

    pub fn prizes(&self) -> &PrizeSet {
        &self.prizes
    }

    pub fn gate(&self) -> &ParticipationGate {
        &self.gate
    }

    pub fn phase(&self) -> RevealPhase {
        self.phase
    }

    pub fn is_done(&self) -> bool {
        self.phase == RevealPhase::Done
    }

    pub fn record(&self) -> Option<&ParticipationRecord> {
        self.record.as_ref()
    }

    pub fn result(&self) -> Option<&RevealResult> {
        self.result.as_ref()
    }

    pub fn trace(&self) -> &CueTrace {
        &self.trace
    }

    pub fn trace_mut(&mut self) -> &mut CueTrace {
        &mut self.trace
    }

    /// The user's click on a card. Only the first click on the user's own
    /// card starts the reveal; anything after that is a no-op.
    pub fn pick(
        &mut self,
        index: usize,
        stage: &mut Stage<'_>,
        scheduler: &mut dyn Scheduler<RevealEvent>,
    ) -> Result<PickOutcome, RevealError> {
        if self.picked {
            return Ok(PickOutcome::AlreadyPicked);
        }
        if index >= self.prizes.len() {
            return Err(RevealError::OutOfRange {
                index,
                total: self.prizes.len(),
            });
        }
        if !self.prizes.is_user_slot(index) {
            return Err(RevealError::NotYourCard { index });
        }
        self.picked = true;

        let name = display_name(stage.prompt.ask_name(), &self.anonymous_name);
        let record = self
            .gate
            .record(name, self.prizes.user_amount(), Utc::now());
        self.gate.append(stage.store, &record);
        self.gate.mark_played(stage.store);
        tracing::info!(
            device = %self.gate.device(),
            slot = index,
            name = %record.name,
            "envelope picked"
        );
        self.record = Some(record);

        self.phase = RevealPhase::UserRevealing;
        let at = scheduler.now();
        self.emit(stage, at, Cue::Flip { index });
        self.emit(stage, at, Cue::Tone { pitch: 1.0 });
        scheduler.schedule_after(self.timing.user_flip(), RevealEvent::BeginOthers);
        Ok(PickOutcome::Started)
    }

    pub fn handle(
        &mut self,
        event: RevealEvent,
        stage: &mut Stage<'_>,
        scheduler: &mut dyn Scheduler<RevealEvent>,
    ) {
        let at = scheduler.now();
        match event {
            RevealEvent::BeginOthers => {
                if self.phase != RevealPhase::UserRevealing {
                    return;
                }
                self.phase = RevealPhase::OthersRevealing;
                let others: Vec<usize> = self.prizes.other_indices().collect();
                for (step, index) in others.iter().enumerate() {
                    scheduler.schedule_after(
                        self.timing.flip_after(step),
                        RevealEvent::FlipOther { index: *index },
                    );
                }
                scheduler.schedule_after(
                    self.timing.settle_after(others.len()),
                    RevealEvent::Settle,
                );
            }
            RevealEvent::FlipOther { index } => {
                if self.phase != RevealPhase::OthersRevealing {
                    return;
                }
                let pitch = OTHER_PITCH_BASE + self.rng.unit() * OTHER_PITCH_SPAN;
                self.emit(stage, at, Cue::Flip { index });
                self.emit(stage, at, Cue::Tone { pitch });
            }
            RevealEvent::Settle => {
                if self.phase != RevealPhase::OthersRevealing {
                    return;
                }
                self.phase = RevealPhase::Done;
                let result = RevealResult::from_prizes(&self.prizes);
                tracing::info!(
                    device = %self.gate.device(),
                    amount = result.amount,
                    missed = ?result.missed_positions,
                    "reveal finished"
                );
                self.emit(stage, at, Cue::Finale);
                self.emit(stage, at, Cue::Celebration);
                self.emit(
                    stage,
                    at,
                    Cue::ShowResult {
                        result: result.clone(),
                    },
                );
                self.result = Some(result);
            }
        }
    }

    /// Fires every event due by `now`, then moves the clock there.
    pub fn tick(
        &mut self,
        stage: &mut Stage<'_>,
        timeline: &mut Timeline<RevealEvent>,
        now: Duration,
    ) {
        while let Some(event) = timeline.pop_due(now) {
            self.handle(event, stage, timeline);
        }
        timeline.advance_to(now);
    }

    /// Drains the timeline without real delays.
    pub fn run_to_completion(
        &mut self,
        stage: &mut Stage<'_>,
        timeline: &mut Timeline<RevealEvent>,
    ) -> Option<&RevealResult> {
        while let Some(event) = timeline.advance_to_next() {
            self.handle(event, stage, timeline);
        }
        self.result.as_ref()
    }

    fn emit(&mut self, stage: &mut Stage<'_>, at: Duration, cue: Cue) {
        match &cue {
            Cue::Flip { index } => stage.presenter.flip(*index),
            Cue::Tone { pitch } => swallow("tone", stage.feedback.play_tone(*pitch)),
            Cue::Finale => swallow("finale", stage.feedback.play_finale()),
            Cue::Celebration => swallow("celebration", stage.feedback.play_celebration()),
            Cue::ShowResult { result } => stage.presenter.show_result(result),
        }
        self.trace.push(at.as_millis() as u64, cue);
    }
}
