//! Scripted end-to-end flow client.
//!
//! Drives one complete play session against a running backend:
//! register, login, ensure player data exists, fetch the current event's
//! dialogue script, step through it, apply a growth round, save, then
//! log back in and check the saved state. The session logic is the same
//! `rpg_core` state machine a game client ships; this binary only adds
//! the HTTP plumbing around it.
//!
//! Usage:
//!   cargo run --bin rpg-test-client -- --server http://127.0.0.1:7070 \
//!       --user hero01 --password password123 --deltas 400,400,400,400
//!
//! Requires: rpg-backend-server running on the target address.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use rpg_core::constants::{INITIAL_EVENT_ID, PARAM_MAX, PARAM_MIN};
use rpg_core::dialogue::fallback_lines;
use rpg_core::{CharacterClass, DialogueLine, GameSession, PlayerProgress, StatDeltas};

type FlowError = Box<dyn std::error::Error + Send + Sync>;

// ============================================================================
// Configuration
// ============================================================================

const DEFAULT_SERVER: &str = "http://127.0.0.1:7070";
const DEFAULT_USER: &str = "demo_hero";
const DEFAULT_PASSWORD: &str = "password1234";
const DEFAULT_NAME: &str = "デモ勇者";

struct FlowConfig {
    server: String,
    user: String,
    password: String,
    name: String,
    deltas: Vec<StatDeltas>,
    skip_register: bool,
}

impl FlowConfig {
    fn from_args(args: &[String]) -> Result<Self, FlowError> {
        let mut deltas = Vec::new();
        for (i, arg) in args.iter().enumerate() {
            if arg == "--deltas" {
                let raw = args
                    .get(i + 1)
                    .ok_or("--deltas needs a p1,p2,p3,p4 value")?;
                deltas.push(StatDeltas::parse(raw)?);
            }
        }
        if deltas.is_empty() {
            // One round big enough to evolve a fresh player.
            deltas.push(StatDeltas::new(400, 400, 400, 400));
        }
        Ok(Self {
            server: parse_str_arg(args, "--server").unwrap_or_else(|| DEFAULT_SERVER.into()),
            user: parse_str_arg(args, "--user").unwrap_or_else(|| DEFAULT_USER.into()),
            password: parse_str_arg(args, "--password").unwrap_or_else(|| DEFAULT_PASSWORD.into()),
            name: parse_str_arg(args, "--name").unwrap_or_else(|| DEFAULT_NAME.into()),
            deltas,
            skip_register: args.iter().any(|a| a == "--skip-register"),
        })
    }
}

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(rename = "Result")]
    result: String,
    #[serde(rename = "Message")]
    message: String,
    #[serde(rename = "UserName")]
    user_name: Option<String>,
    #[serde(rename = "CharId")]
    char_id: Option<i64>,
    #[serde(rename = "Exp")]
    exp: Option<i64>,
    #[serde(rename = "Parameter1")]
    parameter1: Option<i64>,
    #[serde(rename = "Parameter2")]
    parameter2: Option<i64>,
    #[serde(rename = "Parameter3")]
    parameter3: Option<i64>,
    #[serde(rename = "Parameter4")]
    parameter4: Option<i64>,
    #[serde(rename = "CurrentEventId")]
    current_event_id: Option<i64>,
    #[serde(rename = "CurrentSeq")]
    current_seq: Option<i64>,
}

impl LoginResponse {
    /// The player record embedded in a login reply, when one exists.
    /// A login without player data carries no `CharId`.
    fn to_progress(&self, user_id: &str) -> Option<PlayerProgress> {
        let char_id = self.char_id?;
        Some(PlayerProgress {
            user_id: user_id.to_string(),
            class: CharacterClass::from_code(char_id).unwrap_or_default(),
            exp: self.exp.unwrap_or(0),
            parameter1: self.parameter1.unwrap_or(0),
            parameter2: self.parameter2.unwrap_or(0),
            parameter3: self.parameter3.unwrap_or(0),
            parameter4: self.parameter4.unwrap_or(0),
            current_event_id: self.current_event_id.unwrap_or(INITIAL_EVENT_ID),
            current_seq: self.current_seq.unwrap_or(0),
        })
    }
}

#[derive(Debug, Deserialize)]
struct EventLinesResponse {
    #[serde(rename = "EventLines")]
    event_lines: Vec<EventLineRecord>,
}

#[derive(Debug, Deserialize)]
struct EventLineRecord {
    #[serde(rename = "EventId")]
    event_id: i64,
    #[serde(rename = "Seq")]
    seq: i64,
    #[serde(rename = "Speaker")]
    speaker: String,
    #[serde(rename = "Text")]
    text: String,
}

impl From<EventLineRecord> for DialogueLine {
    fn from(r: EventLineRecord) -> Self {
        DialogueLine::new(r.event_id, r.seq, r.speaker, r.text)
    }
}

/// What the save step actually pushed. /UPDATE only accepts parameters
/// in the store's 0..=100 range, so oversized demo growth is clamped
/// into range before saving, and verification compares against the
/// clamped values.
struct SavedState {
    char_id: i64,
    exp: i64,
    parameters: [i64; 4],
    current_event_id: i64,
    current_seq: i64,
}

// ============================================================================
// HTTP steps
// ============================================================================

struct FlowClient {
    http: Client,
    server: String,
}

impl FlowClient {
    fn new(server: &str) -> Result<Self, FlowError> {
        let http = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            http,
            server: server.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.server, path)
    }

    async fn register(&self, cfg: &FlowConfig) -> Result<(), FlowError> {
        let resp = self
            .http
            .post(self.url("/INSERTUSER"))
            .json(&json!({"ID": cfg.user, "Password": cfg.password, "Name": cfg.name}))
            .send()
            .await?;
        match resp.status() {
            s if s.is_success() => info!("registered user {}", cfg.user),
            StatusCode::CONFLICT => info!("user {} already registered, continuing", cfg.user),
            s => return Err(step_error("INSERTUSER", s, resp.text().await?).into()),
        }
        Ok(())
    }

    async fn login(&self, cfg: &FlowConfig) -> Result<LoginResponse, FlowError> {
        let resp = self
            .http
            .post(self.url("/LOGIN"))
            .json(&json!({"ID": cfg.user, "Password": cfg.password}))
            .send()
            .await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(step_error("LOGIN", status, text).into());
        }
        let login: LoginResponse = serde_json::from_str(&text)?;
        if login.result != "Succeeded" {
            return Err(format!("LOGIN replied 200 but Result={}", login.result).into());
        }
        Ok(login)
    }

    async fn create_player(&self, cfg: &FlowConfig) -> Result<(), FlowError> {
        let resp = self
            .http
            .post(self.url("/INSERTPLAYER"))
            .json(&json!({"UserId": cfg.user}))
            .send()
            .await?;
        match resp.status() {
            s if s.is_success() => info!("created player data for {}", cfg.user),
            StatusCode::CONFLICT => info!("player data already present, continuing"),
            s => return Err(step_error("INSERTPLAYER", s, resp.text().await?).into()),
        }
        Ok(())
    }

    async fn fetch_lines(&self, event_id: i64) -> Result<Vec<DialogueLine>, FlowError> {
        let resp = self
            .http
            .get(self.url(&format!("/SELECTEVENTS?eventId={event_id}")))
            .send()
            .await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(step_error("SELECTEVENTS", status, text).into());
        }
        let body: EventLinesResponse = serde_json::from_str(&text)?;
        Ok(body.event_lines.into_iter().map(DialogueLine::from).collect())
    }

    async fn save(&self, progress: &PlayerProgress) -> Result<SavedState, FlowError> {
        let saved = SavedState {
            char_id: progress.class.code(),
            exp: progress.exp,
            parameters: progress.params().map(|v| v.clamp(PARAM_MIN, PARAM_MAX)),
            current_event_id: progress.current_event_id,
            current_seq: progress.current_seq,
        };
        let resp = self
            .http
            .post(self.url("/UPDATE"))
            .json(&json!({
                "UserId": progress.user_id,
                "CharId": saved.char_id,
                "Exp": saved.exp,
                "Parameter1": saved.parameters[0],
                "Parameter2": saved.parameters[1],
                "Parameter3": saved.parameters[2],
                "Parameter4": saved.parameters[3],
                "CurrentEventId": saved.current_event_id,
                "CurrentSeq": saved.current_seq,
            }))
            .send()
            .await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(step_error("UPDATE", status, text).into());
        }
        info!("saved progress: {}", text);
        Ok(saved)
    }
}

fn step_error(step: &str, status: StatusCode, body: String) -> String {
    format!("{step} failed: HTTP {status}: {body}")
}

fn verify_saved(login: &LoginResponse, saved: &SavedState) -> Result<(), FlowError> {
    let fields = [
        ("CharId", login.char_id, saved.char_id),
        ("Exp", login.exp, saved.exp),
        ("Parameter1", login.parameter1, saved.parameters[0]),
        ("Parameter2", login.parameter2, saved.parameters[1]),
        ("Parameter3", login.parameter3, saved.parameters[2]),
        ("Parameter4", login.parameter4, saved.parameters[3]),
        ("CurrentEventId", login.current_event_id, saved.current_event_id),
        ("CurrentSeq", login.current_seq, saved.current_seq),
    ];
    for (name, got, expected) in fields {
        if got != Some(expected) {
            return Err(format!(
                "verification failed: {} came back as {:?}, expected {}",
                name, got, expected
            )
            .into());
        }
    }
    Ok(())
}

// ============================================================================
// Flow
// ============================================================================

async fn run_flow(cfg: &FlowConfig) -> Result<(), FlowError> {
    let client = FlowClient::new(&cfg.server)?;

    if cfg.skip_register {
        info!("skipping registration");
    } else {
        client.register(cfg).await?;
    }

    let login = client.login(cfg).await?;
    info!("logged in: {}", login.message);
    if let Some(name) = &login.user_name {
        info!("welcome back, {}", name);
    }

    let progress = match login.to_progress(&cfg.user) {
        Some(progress) => progress,
        None => {
            client.create_player(cfg).await?;
            PlayerProgress::new(cfg.user.clone())
        }
    };
    let mut session = GameSession::new(progress);
    info!(
        "session start: class {} exp {} event {}",
        session.progress().class.display_name(),
        session.progress().exp,
        session.progress().current_event_id
    );

    let event_id = session.progress().current_event_id;
    let lines = match client.fetch_lines(event_id).await {
        Ok(lines) if !lines.is_empty() => lines,
        Ok(_) => {
            info!("event {} has no script, using the fallback", event_id);
            fallback_lines(event_id)
        }
        Err(e) => {
            info!("script fetch failed ({}), using the fallback", e);
            fallback_lines(event_id)
        }
    };
    session.load_lines(lines);
    loop {
        if let Some(line) = session.current_line() {
            info!("  [{}] {}: {}", line.seq, line.speaker, line.text);
        }
        if !session.advance_line() {
            break;
        }
    }

    for deltas in &cfg.deltas {
        let outcome = session.apply_deltas(deltas);
        let p = session.progress();
        info!("growth round: exp {} params {:?}", p.exp, p.params());
        if outcome.evolved_now() {
            if let Some(line) = session.lines().last() {
                info!("  [{}] {}: {}", line.seq, line.speaker, line.text);
            }
            info!(
                "evolved into {} (next event {})",
                p.class.display_name(),
                p.current_event_id
            );
        }
    }

    let saved = client.save(session.progress()).await?;
    let verify_login = client.login(cfg).await?;
    verify_saved(&verify_login, &saved)?;
    info!("saved state verified after re-login");

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_target(false).with_level(true).init();

    let args: Vec<String> = std::env::args().collect();
    let config = match FlowConfig::from_args(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Bad arguments: {}", e);
            std::process::exit(2);
        }
    };

    println!("=== RPG Flow Client ===");
    println!("  Server: {}", config.server);
    println!("  User:   {}", config.user);
    println!();

    if let Err(e) = run_flow(&config).await {
        eprintln!("\nFlow failed: {}", e);
        std::process::exit(1);
    }
    println!("\nFlow completed.");
}
