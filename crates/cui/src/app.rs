use crate::board::{Board, TerminalEffects};
use crate::signals::terminal_signals;
use anyhow::{Context, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use lixi_core::{
    DeviceFingerprint, Eligibility, GameConfig, KeyValueStore, ParticipationGate, PickOutcome,
    PrizeEngine, RevealEvent, RevealSequencer, RngState, Stage, Timeline,
};
use lixi_data::{load_game_config, JsonFileStore};
use std::path::PathBuf;
use std::time::{Duration, Instant};

pub const GRID_COLUMNS: usize = 4;
const MAX_NAME_LEN: usize = 40;

#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub assets_dir: PathBuf,
    pub store_path: PathBuf,
    pub seed: Option<u64>,
}

pub struct App {
    pub config: GameConfig,
    pub device: DeviceFingerprint,
    pub eligibility: Eligibility,
    pub seed: u64,
    pub sequencer: Option<RevealSequencer>,
    pub board: Board,
    pub effects: TerminalEffects,
    pub cursor: usize,
    pub name_input: Option<String>,
    pub status_line: String,
    pub should_quit: bool,
    store: Box<dyn KeyValueStore>,
    timeline: Timeline<RevealEvent>,
    started: Option<Instant>,
}

impl App {
    pub fn bootstrap(options: &LaunchOptions) -> Result<Self> {
        let config = load_game_config(&options.assets_dir)
            .with_context(|| format!("load config from {}", options.assets_dir.display()))?;
        let device =
            DeviceFingerprint::derive(&terminal_signals(), &config.storage.fingerprint_prefix);
        let store = Box::new(JsonFileStore::new(&options.store_path));
        let rng = match options.seed {
            Some(seed) => RngState::from_seed(seed),
            None => RngState::from_entropy(),
        };
        Self::with_parts(config, store, device, rng)
    }

    /// One page load: gate check, then a deal when the device may still play.
    pub fn with_parts(
        config: GameConfig,
        store: Box<dyn KeyValueStore>,
        device: DeviceFingerprint,
        mut rng: RngState,
    ) -> Result<Self> {
        let engine = PrizeEngine::new(config.prizes.clone()).context("validate prize rules")?;
        let gate = ParticipationGate::new(device.clone(), config.storage.clone());
        let eligibility = gate.check(store.as_ref());
        let seed = rng.seed();
        let (sequencer, cursor, status_line) = if eligibility.is_blocked() {
            (
                None,
                0,
                "Thiết bị này đã nhận lì xì rồi! (q to quit)".to_string(),
            )
        } else {
            let prizes = engine.deal(&mut rng);
            let slot = prizes.user_slot();
            (
                Some(RevealSequencer::new(prizes, gate, &config, rng)),
                slot,
                "Chọn bao lì xì của bạn: arrows to move, Enter to open".to_string(),
            )
        };
        Ok(Self {
            board: Board::new(config.prizes.total_cards),
            config,
            device,
            eligibility,
            seed,
            sequencer,
            effects: TerminalEffects::default(),
            cursor,
            name_input: None,
            status_line,
            should_quit: false,
            store,
            timeline: Timeline::new(),
            started: None,
        })
    }

    pub fn total_cards(&self) -> usize {
        self.config.prizes.total_cards
    }

    pub fn user_slot(&self) -> Option<usize> {
        self.sequencer.as_ref().map(|seq| seq.prizes().user_slot())
    }

    pub fn move_cursor(&mut self, dx: isize, dy: isize) {
        let total = self.total_cards() as isize;
        let cols = GRID_COLUMNS as isize;
        let next = self.cursor as isize + dx + dy * cols;
        if (0..total).contains(&next) {
            self.cursor = next as usize;
        }
    }

    pub fn activate(&mut self) {
        let Some(slot) = self.user_slot() else {
            self.status_line = "Thiết bị này đã nhận lì xì rồi!".to_string();
            return;
        };
        if self.started.is_some() {
            return;
        }
        if self.cursor != slot {
            self.status_line = format!("Envelope {} is not yours", self.cursor + 1);
            return;
        }
        self.name_input = Some(String::new());
        self.status_line = "Nhập tên của bạn để lưu kết quả 🧧".to_string();
    }

    /// Returns true when the key was consumed by the name prompt.
    pub fn handle_name_key(&mut self, key: KeyEvent) -> bool {
        let Some(input) = self.name_input.as_mut() else {
            return false;
        };
        match key.code {
            KeyCode::Esc => {
                self.name_input = None;
                self.open_envelope(None);
            }
            KeyCode::Enter => {
                let name = self.name_input.take();
                self.open_envelope(name);
            }
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Char(ch) => {
                if !key.modifiers.contains(KeyModifiers::CONTROL)
                    && !key.modifiers.contains(KeyModifiers::ALT)
                    && input.chars().count() < MAX_NAME_LEN
                {
                    input.push(ch);
                }
            }
            _ => {}
        }
        true
    }

    /// Starts the reveal with the captured name.
    pub fn open_envelope(&mut self, name: Option<String>) {
        let Some(sequencer) = self.sequencer.as_mut() else {
            return;
        };
        let slot = sequencer.prizes().user_slot();
        let mut prompt = move || name.clone();
        let mut stage = Stage {
            store: self.store.as_mut(),
            feedback: &mut self.effects,
            presenter: &mut self.board,
            prompt: &mut prompt,
        };
        match sequencer.pick(slot, &mut stage, &mut self.timeline) {
            Ok(PickOutcome::Started) => {
                self.started = Some(Instant::now());
                self.status_line = "Đang mở...".to_string();
            }
            Ok(PickOutcome::AlreadyPicked) => {}
            Err(err) => self.status_line = err.to_string(),
        }
    }

    pub fn on_tick(&mut self) {
        let Some(started) = self.started else {
            return;
        };
        self.advance(started.elapsed());
    }

    /// Moves the reveal clock to `elapsed` since the pick.
    pub fn advance(&mut self, elapsed: Duration) {
        let Some(sequencer) = self.sequencer.as_mut() else {
            return;
        };
        self.effects.set_now(elapsed);
        let mut prompt = || None::<String>;
        let mut stage = Stage {
            store: self.store.as_mut(),
            feedback: &mut self.effects,
            presenter: &mut self.board,
            prompt: &mut prompt,
        };
        let was_done = sequencer.is_done();
        sequencer.tick(&mut stage, &mut self.timeline, elapsed);
        if !was_done && sequencer.is_done() {
            self.status_line = "Chúc mừng năm mới! (q to quit)".to_string();
        }
    }
}
