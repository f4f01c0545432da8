use lixi_core::{
    read_log, Cue, DeviceFingerprint, Eligibility, Feedback, FeedbackError, GameConfig,
    KeyValueStore, MemoryStore, ParticipationGate, PickOutcome, Presenter, PrizeSet,
    RevealError, RevealEvent, RevealPhase, RevealResult, RevealSequencer, RngState, Stage,
    StorageKeys, Timeline, UnavailableStore,
};
use std::time::Duration;

#[derive(Default)]
struct RecordingPresenter {
    flipped: Vec<usize>,
    shown: Option<RevealResult>,
}

impl Presenter for RecordingPresenter {
    fn flip(&mut self, index: usize) {
        self.flipped.push(index);
    }

    fn show_result(&mut self, result: &RevealResult) {
        self.shown = Some(result.clone());
    }
}

#[derive(Default)]
struct RecordingFeedback {
    tones: Vec<f64>,
    finales: usize,
    celebrations: usize,
}

impl Feedback for RecordingFeedback {
    fn play_tone(&mut self, pitch: f64) -> Result<(), FeedbackError> {
        self.tones.push(pitch);
        Ok(())
    }

    fn play_finale(&mut self) -> Result<(), FeedbackError> {
        self.finales += 1;
        Ok(())
    }

    fn play_celebration(&mut self) -> Result<(), FeedbackError> {
        self.celebrations += 1;
        Ok(())
    }
}

struct BlockedAudio;

impl Feedback for BlockedAudio {
    fn play_tone(&mut self, _pitch: f64) -> Result<(), FeedbackError> {
        Err(FeedbackError::Unavailable("autoplay policy".to_string()))
    }

    fn play_finale(&mut self) -> Result<(), FeedbackError> {
        Err(FeedbackError::Unavailable("autoplay policy".to_string()))
    }

    fn play_celebration(&mut self) -> Result<(), FeedbackError> {
        Err(FeedbackError::Unavailable("no renderer".to_string()))
    }
}

const DEVICE: &str = "lixi2026_test";

/// User holds 15000 at slot 3, top prizes at slots 1 and 7.
fn two_top_deal() -> PrizeSet {
    let others = vec![
        1_000, 100_000, 2_000, 5_000, 10_000, 20_000, 100_000, 50_000, 1_000, 2_000, 5_000,
    ];
    PrizeSet::assemble(others, 15_000, 3, 100_000)
}

fn sequencer(prizes: PrizeSet, device: &str) -> RevealSequencer {
    let config = GameConfig::default();
    let gate = ParticipationGate::new(
        DeviceFingerprint::from_raw(device),
        config.storage.clone(),
    );
    RevealSequencer::new(prizes, gate, &config, RngState::from_seed(8))
}

#[test]
fn full_reveal_reports_amount_and_misses() {
    let mut seq = sequencer(two_top_deal(), DEVICE);
    let mut store = MemoryStore::new();
    let mut feedback = RecordingFeedback::default();
    let mut presenter = RecordingPresenter::default();
    let mut prompt = || Some("  Lan ".to_string());
    let mut timeline = Timeline::new();
    let mut stage = Stage {
        store: &mut store,
        feedback: &mut feedback,
        presenter: &mut presenter,
        prompt: &mut prompt,
    };

    assert_eq!(seq.phase(), RevealPhase::Idle);
    assert_eq!(seq.pick(3, &mut stage, &mut timeline), Ok(PickOutcome::Started));
    assert_eq!(seq.phase(), RevealPhase::UserRevealing);
    let result = seq
        .run_to_completion(&mut stage, &mut timeline)
        .cloned()
        .expect("result");
    assert_eq!(seq.phase(), RevealPhase::Done);
    assert_eq!(result.amount, 15_000);
    assert_eq!(result.amount_label, "15.000đ");
    assert_eq!(result.top_prize_label, "100K");
    assert_eq!(result.missed_positions, vec![2, 8]);

    assert_eq!(presenter.flipped.len(), 12);
    assert_eq!(presenter.flipped[0], 3);
    assert_eq!(presenter.shown, Some(result));
    assert_eq!(feedback.tones.len(), 12);
    assert_eq!(feedback.tones[0], 1.0);
    assert!(feedback.tones[1..].iter().all(|p| (0.7..1.5).contains(p)));
    assert_eq!(feedback.finales, 1);
    assert_eq!(feedback.celebrations, 1);

    assert_eq!(seq.record().map(|r| r.name.as_str()), Some("Lan"));
    let log = read_log(&store, &StorageKeys::default()).expect("log");
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].amount, 15_000);
    assert_eq!(log[0].device_id.as_str(), DEVICE);
}

#[test]
fn cue_trace_is_ordered_and_staggered() {
    let mut seq = sequencer(two_top_deal(), DEVICE);
    let mut store = MemoryStore::new();
    let mut feedback = RecordingFeedback::default();
    let mut presenter = RecordingPresenter::default();
    let mut prompt = || None::<String>;
    let mut timeline = Timeline::new();
    let mut stage = Stage {
        store: &mut store,
        feedback: &mut feedback,
        presenter: &mut presenter,
        prompt: &mut prompt,
    };
    seq.pick(3, &mut stage, &mut timeline).expect("pick");
    seq.run_to_completion(&mut stage, &mut timeline);

    let flips: Vec<(u64, usize)> = seq.trace().flips().collect();
    assert_eq!(flips[0], (0, 3));
    let others = &flips[1..];
    let order: Vec<usize> = others.iter().map(|(_, idx)| *idx).collect();
    assert_eq!(order, vec![0, 1, 2, 4, 5, 6, 7, 8, 9, 10, 11]);
    for (step, (at, _)) in others.iter().enumerate() {
        assert!(*at > flips[0].0);
        assert_eq!(*at, 900 + 55 * step as u64);
    }
    let last = seq.trace().cues().last().expect("cues");
    assert_eq!(last.at_ms, 900 + 55 * 11 + 700);
    assert!(matches!(last.cue, Cue::ShowResult { .. }));
    assert_eq!(seq.record().map(|r| r.name.as_str()), Some("Ẩn danh"));
}

#[test]
fn second_pick_changes_nothing() {
    let mut seq = sequencer(two_top_deal(), DEVICE);
    let mut store = MemoryStore::new();
    let mut feedback = RecordingFeedback::default();
    let mut presenter = RecordingPresenter::default();
    let mut asked = 0;
    let mut prompt = || {
        asked += 1;
        Some("Minh".to_string())
    };
    let mut timeline = Timeline::new();
    {
        let mut stage = Stage {
            store: &mut store,
            feedback: &mut feedback,
            presenter: &mut presenter,
            prompt: &mut prompt,
        };
        seq.pick(3, &mut stage, &mut timeline).expect("pick");
        let prizes_before = seq.prizes().clone();
        let pending_before = timeline.pending();
        assert_eq!(
            seq.pick(3, &mut stage, &mut timeline),
            Ok(PickOutcome::AlreadyPicked)
        );
        assert_eq!(seq.pick(5, &mut stage, &mut timeline), Ok(PickOutcome::AlreadyPicked));
        assert_eq!(seq.prizes(), &prizes_before);
        assert_eq!(timeline.pending(), pending_before);
        seq.run_to_completion(&mut stage, &mut timeline);
        assert_eq!(
            seq.pick(3, &mut stage, &mut timeline),
            Ok(PickOutcome::AlreadyPicked)
        );
    }
    assert_eq!(asked, 1);
    let log = read_log(&store, &StorageKeys::default()).expect("log");
    assert_eq!(log.len(), 1);
    assert_eq!(store.get(DEVICE).expect("get").as_deref(), Some("picked"));
    assert_eq!(presenter.flipped.iter().filter(|idx| **idx == 3).count(), 1);
}

#[test]
fn picking_someone_elses_card_is_refused() {
    let mut seq = sequencer(two_top_deal(), DEVICE);
    let mut store = MemoryStore::new();
    let mut feedback = RecordingFeedback::default();
    let mut presenter = RecordingPresenter::default();
    let mut prompt = || None::<String>;
    let mut timeline = Timeline::new();
    let mut stage = Stage {
        store: &mut store,
        feedback: &mut feedback,
        presenter: &mut presenter,
        prompt: &mut prompt,
    };
    assert_eq!(
        seq.pick(0, &mut stage, &mut timeline),
        Err(RevealError::NotYourCard { index: 0 })
    );
    assert_eq!(
        seq.pick(12, &mut stage, &mut timeline),
        Err(RevealError::OutOfRange { index: 12, total: 12 })
    );
    assert_eq!(seq.phase(), RevealPhase::Idle);
    assert!(timeline.is_idle());
    assert_eq!(seq.pick(3, &mut stage, &mut timeline), Ok(PickOutcome::Started));
}

#[test]
fn gate_blocks_replay_on_fresh_load() {
    let mut store = MemoryStore::new();
    {
        let mut seq = sequencer(two_top_deal(), DEVICE);
        let mut feedback = RecordingFeedback::default();
        let mut presenter = RecordingPresenter::default();
        let mut prompt = || None::<String>;
        let mut timeline = Timeline::new();
        let mut stage = Stage {
            store: &mut store,
            feedback: &mut feedback,
            presenter: &mut presenter,
            prompt: &mut prompt,
        };
        seq.pick(3, &mut stage, &mut timeline).expect("pick");
        seq.run_to_completion(&mut stage, &mut timeline);
    }
    let keys = StorageKeys::default();
    let same = ParticipationGate::new(DeviceFingerprint::from_raw(DEVICE), keys.clone());
    let other = ParticipationGate::new(DeviceFingerprint::from_raw("lixi2026_other"), keys);
    assert_eq!(same.check(&store), Eligibility::Blocked);
    assert_eq!(other.check(&store), Eligibility::Eligible);
}

#[test]
fn broken_storage_and_audio_still_finish() {
    let mut seq = sequencer(two_top_deal(), DEVICE);
    let mut store = UnavailableStore;
    let mut feedback = BlockedAudio;
    let mut presenter = RecordingPresenter::default();
    let mut prompt = || Some("Lan".to_string());
    let mut timeline = Timeline::new();
    let mut stage = Stage {
        store: &mut store,
        feedback: &mut feedback,
        presenter: &mut presenter,
        prompt: &mut prompt,
    };
    seq.pick(3, &mut stage, &mut timeline).expect("pick");
    let result = seq.run_to_completion(&mut stage, &mut timeline).cloned();
    assert_eq!(seq.phase(), RevealPhase::Done);
    assert_eq!(result.map(|r| r.amount), Some(15_000));
    assert_eq!(presenter.flipped.len(), 12);
    assert!(presenter.shown.is_some());
}

#[test]
fn tick_follows_wall_clock() {
    let mut seq = sequencer(two_top_deal(), DEVICE);
    let mut store = MemoryStore::new();
    let mut feedback = RecordingFeedback::default();
    let mut presenter = RecordingPresenter::default();
    let mut prompt = || None::<String>;
    let mut timeline: Timeline<RevealEvent> = Timeline::new();
    {
        let mut stage = Stage {
            store: &mut store,
            feedback: &mut feedback,
            presenter: &mut presenter,
            prompt: &mut prompt,
        };
        seq.pick(3, &mut stage, &mut timeline).expect("pick");
        seq.tick(&mut stage, &mut timeline, Duration::from_millis(899));
        assert_eq!(seq.phase(), RevealPhase::UserRevealing);
        seq.tick(&mut stage, &mut timeline, Duration::from_millis(1_010));
        assert_eq!(seq.phase(), RevealPhase::OthersRevealing);
        seq.tick(&mut stage, &mut timeline, Duration::from_millis(2_204));
        assert!(!seq.is_done());
        seq.tick(&mut stage, &mut timeline, Duration::from_millis(2_205));
        assert!(seq.is_done());
    }
    // user card, then others at 900, 955 and 1010
    assert_eq!(presenter.flipped[..4], [3, 0, 1, 2]);
    assert_eq!(presenter.flipped.len(), 12);
}

#[test]
fn huge_stagger_saturates_instead_of_panicking() {
    let mut config = GameConfig::default();
    config.timing.stagger_ms = u64::MAX / 4;
    let gate = ParticipationGate::new(DeviceFingerprint::from_raw(DEVICE), config.storage.clone());
    let mut seq = RevealSequencer::new(two_top_deal(), gate, &config, RngState::from_seed(8));
    let mut store = MemoryStore::new();
    let mut feedback = RecordingFeedback::default();
    let mut presenter = RecordingPresenter::default();
    let mut prompt = || None::<String>;
    let mut timeline = Timeline::new();
    let mut stage = Stage {
        store: &mut store,
        feedback: &mut feedback,
        presenter: &mut presenter,
        prompt: &mut prompt,
    };
    seq.pick(3, &mut stage, &mut timeline).expect("pick");
    let result = seq.run_to_completion(&mut stage, &mut timeline).cloned();
    assert_eq!(result.map(|r| r.amount), Some(15_000));
    assert_eq!(presenter.flipped.len(), 12);
}
