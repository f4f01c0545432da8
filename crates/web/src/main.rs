use lixi_core::{
    read_log, CardFace, DeviceFingerprint, DeviceSignals, Eligibility, GameConfig, NoopPresenter,
    ParticipationGate, ParticipationRecord, PickOutcome, PrizeEngine, RevealResult,
    RevealSequencer, RevealTiming, RngState, SilentFeedback, Stage, TimedCue, Timeline,
    CELEBRATION_BURSTS_MS, FINALE_NOTES_HZ, FINALE_NOTE_SPACING_MS, TONE_SWEEP_HZ,
};
use lixi_data::{default_assets_dir, default_store_path, load_game_config, JsonFileStore};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Read;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tiny_http::{Header, Method, Response, Server, StatusCode};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type HandlerResult = Result<(), Box<dyn std::error::Error>>;

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new("lixi_web=info,lixi_core=info")
                }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = load_game_config(&default_assets_dir())?;
    let store_path = default_store_path().unwrap_or_else(|| PathBuf::from("lixi_store.json"));
    let addr = std::env::var("LIXI_ADDR").unwrap_or_else(|_| "0.0.0.0:7878".to_string());
    let state = Arc::new(Mutex::new(AppState::new(config, JsonFileStore::new(&store_path))?));

    let server = Server::http(&addr)?;
    tracing::info!(%addr, store = %store_path.display(), "lucky money server listening");
    for request in server.incoming_requests() {
        let state = state.clone();
        if let Err(err) = handle_request(request, state) {
            tracing::warn!("request error: {err}");
        }
    }
    Ok(())
}

struct AppState {
    config: GameConfig,
    engine: PrizeEngine,
    store: JsonFileStore,
    sessions: HashMap<DeviceFingerprint, RevealSequencer>,
}

impl AppState {
    fn new(
        config: GameConfig,
        store: JsonFileStore,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let engine = PrizeEngine::new(config.prizes.clone())?;
        Ok(Self {
            config,
            engine,
            store,
            sessions: HashMap::new(),
        })
    }

    /// A page load: gate check, then a fresh deal for eligible devices.
    fn open_session(&mut self, signals: &DeviceSignals) -> SessionView {
        let device = DeviceFingerprint::derive(signals, &self.config.storage.fingerprint_prefix);
        let gate = ParticipationGate::new(device.clone(), self.config.storage.clone());
        let eligibility = gate.check(&self.store);
        if eligibility.is_blocked() {
            tracing::info!(%device, "device already played");
            self.sessions.remove(&device);
            return SessionView {
                device_id: device.to_string(),
                eligibility,
                cards: self.config.prizes.total_cards,
                user_slot: None,
                timing: self.config.timing,
                sound: SoundView::default(),
            };
        }
        let mut rng = RngState::from_entropy();
        let prizes = self.engine.deal(&mut rng);
        let user_slot = prizes.user_slot();
        tracing::info!(%device, seed = rng.seed(), user_slot, "new deal");
        let sequencer = RevealSequencer::new(prizes, gate, &self.config, rng);
        self.sessions.insert(device.clone(), sequencer);
        SessionView {
            device_id: device.to_string(),
            eligibility,
            cards: self.config.prizes.total_cards,
            user_slot: Some(user_slot),
            timing: self.config.timing,
            sound: SoundView::default(),
        }
    }

    /// Runs the whole reveal on a virtual clock; the browser replays the cues
    /// at their offsets.
    fn pick(&mut self, req: PickRequest) -> Result<PickView, String> {
        let device = DeviceFingerprint::from_raw(req.device_id);
        let sequencer = self
            .sessions
            .get_mut(&device)
            .ok_or_else(|| "no open session for this device".to_string())?;
        let mut feedback = SilentFeedback;
        let mut presenter = NoopPresenter;
        let name = req.name;
        let mut prompt = move || name.clone();
        let mut timeline = Timeline::new();
        let mut stage = Stage {
            store: &mut self.store,
            feedback: &mut feedback,
            presenter: &mut presenter,
            prompt: &mut prompt,
        };
        let outcome = sequencer
            .pick(req.index, &mut stage, &mut timeline)
            .map_err(|err| err.to_string())?;
        sequencer.run_to_completion(&mut stage, &mut timeline);
        let view = PickView {
            outcome: match outcome {
                PickOutcome::Started => "started",
                PickOutcome::AlreadyPicked => "already_picked",
            },
            cues: sequencer.trace_mut().drain().collect(),
            cards: sequencer.prizes().faces(),
            result: sequencer.result().cloned(),
        };
        // the gate flag now blocks this device; later picks find no session
        if sequencer.is_done() {
            self.sessions.remove(&device);
        }
        Ok(view)
    }
}

#[derive(Serialize)]
struct ApiResponse<T: Serialize> {
    ok: bool,
    error: Option<String>,
    data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    fn from_result(result: Result<T, String>) -> Self {
        match result {
            Ok(data) => Self {
                ok: true,
                error: None,
                data: Some(data),
            },
            Err(err) => Self {
                ok: false,
                error: Some(err),
                data: None,
            },
        }
    }
}

#[derive(Serialize)]
struct SessionView {
    device_id: String,
    eligibility: Eligibility,
    cards: usize,
    user_slot: Option<usize>,
    timing: RevealTiming,
    sound: SoundView,
}

#[derive(Serialize)]
struct SoundView {
    tone_sweep_hz: (f64, f64),
    finale_notes_hz: [u32; 6],
    finale_note_spacing_ms: u64,
    celebration_bursts_ms: [u64; 3],
}

impl Default for SoundView {
    fn default() -> Self {
        Self {
            tone_sweep_hz: TONE_SWEEP_HZ,
            finale_notes_hz: FINALE_NOTES_HZ,
            finale_note_spacing_ms: FINALE_NOTE_SPACING_MS,
            celebration_bursts_ms: CELEBRATION_BURSTS_MS,
        }
    }
}

#[derive(Serialize)]
struct PickView {
    outcome: &'static str,
    cues: Vec<TimedCue>,
    cards: Vec<CardFace>,
    result: Option<RevealResult>,
}

#[derive(Deserialize)]
struct SessionRequest {
    #[serde(default)]
    signals: DeviceSignals,
}

#[derive(Deserialize)]
struct PickRequest {
    device_id: String,
    index: usize,
    #[serde(default)]
    name: Option<String>,
}

fn handle_request(mut request: tiny_http::Request, state: Arc<Mutex<AppState>>) -> HandlerResult {
    let url = request.url().to_string();
    match (request.method(), url.as_str()) {
        (&Method::Get, "/") => {
            respond_with_file(request, web_path("index.html"), "text/html; charset=utf-8")?;
        }
        (&Method::Get, "/app.js") => {
            respond_with_file(request, web_path("app.js"), "application/javascript")?;
        }
        (&Method::Get, "/styles.css") => {
            respond_with_file(request, web_path("styles.css"), "text/css; charset=utf-8")?;
        }
        (&Method::Post, "/api/session") => {
            let mut body = String::new();
            request.as_reader().read_to_string(&mut body)?;
            let mut req: SessionRequest = if body.trim().is_empty() {
                SessionRequest {
                    signals: DeviceSignals::default(),
                }
            } else {
                serde_json::from_str(&body)?
            };
            if req.signals.user_agent.is_empty() {
                req.signals.user_agent = header_value(&request, "User-Agent").unwrap_or_default();
            }
            if req.signals.language.is_empty() {
                req.signals.language = header_value(&request, "Accept-Language")
                    .and_then(|value| value.split(',').next().map(str::to_string))
                    .unwrap_or_default();
            }
            let view = lock(&state)?.open_session(&req.signals);
            respond_json(request, &ApiResponse::from_result(Ok(view)))?;
        }
        (&Method::Post, "/api/pick") => {
            let mut body = String::new();
            request.as_reader().read_to_string(&mut body)?;
            let req: PickRequest = serde_json::from_str(&body)?;
            let result = lock(&state)?.pick(req);
            respond_json(request, &ApiResponse::from_result(result))?;
        }
        (&Method::Get, "/api/log") => {
            let guard = lock(&state)?;
            let log: Result<Vec<ParticipationRecord>, String> =
                read_log(&guard.store, &guard.config.storage).map_err(|err| err.to_string());
            drop(guard);
            respond_json(request, &ApiResponse::from_result(log))?;
        }
        _ => {
            let response = Response::empty(StatusCode(404));
            request.respond(response)?;
        }
    }
    Ok(())
}

fn lock(
    state: &Mutex<AppState>,
) -> Result<std::sync::MutexGuard<'_, AppState>, Box<dyn std::error::Error>> {
    state
        .lock()
        .map_err(|_| "app state lock poisoned".into())
}

fn header_value(request: &tiny_http::Request, name: &'static str) -> Option<String> {
    request
        .headers()
        .iter()
        .find(|header| header.field.equiv(name))
        .map(|header| header.value.as_str().to_string())
}

fn web_path(file: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("web")
        .join(file)
}

fn content_type_header(value: &str) -> Result<Header, Box<dyn std::error::Error>> {
    Header::from_bytes(&b"Content-Type"[..], value).map_err(|_| "invalid header".into())
}

fn respond_with_file(
    request: tiny_http::Request,
    path: PathBuf,
    content_type: &str,
) -> HandlerResult {
    let mut file = std::fs::File::open(path)?;
    let mut content = Vec::new();
    file.read_to_end(&mut content)?;
    let header = content_type_header(content_type)?;
    let response = Response::from_data(content).with_header(header);
    request.respond(response)?;
    Ok(())
}

fn respond_json<T: Serialize>(
    request: tiny_http::Request,
    response: &ApiResponse<T>,
) -> HandlerResult {
    let body = serde_json::to_vec_pretty(response)?;
    let header = content_type_header("application/json")?;
    request.respond(Response::from_data(body).with_header(header))?;
    Ok(())
}
