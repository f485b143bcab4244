mod display;

use std::collections::HashMap;
use std::fs::File;
use std::io::{stdout, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Parser;
use crossterm::{
    cursor,
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    terminal, ExecutableCommand,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use gesture_shooter::compute::{init_state, reset, step};
use gesture_shooter::config::AppConfig;
use gesture_shooter::entities::{GameState, Intent, SoundCue};
use gesture_shooter::gesture::GestureClassifier;
use gesture_shooter::source::{
    Detection, LandmarkSource, ReplaySource, VirtualHand, VIRTUAL_HAND_SPEED,
};

#[derive(Parser)]
#[command(name = "gesture_shooter")]
#[command(about = "Arcade shooter steered by index-finger hand gestures")]
struct Args {
    /// JSON config overriding frame geometry, gameplay and gesture tunables
    #[arg(long)]
    config: Option<PathBuf>,
    /// Replay recorded landmarks (JSON lines) instead of the virtual hand
    #[arg(long)]
    replay: Option<PathBuf>,
    /// Run a replay without a terminal UI and print a summary
    #[arg(long, requires = "replay")]
    headless: bool,
    /// Seed the spawn / boss-heading RNG
    #[arg(long)]
    seed: Option<u64>,
    /// Write tracing output to this file (interactive mode owns the terminal)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

// ── Held-key tracking ─────────────────────────────────────────────────────────

/// A key is considered "held" if its last press/repeat event arrived within
/// this window.  Covers terminals that don't emit key-release events: the OS
/// key-repeat rate is ≥ 15 Hz, so the window is refreshed before it expires.
const HOLD_WINDOW: Duration = Duration::from_millis(150);

/// Returns true if `key` was seen within the last `HOLD_WINDOW`.
fn is_held(key_seen: &HashMap<KeyCode, Instant>, key: &KeyCode, now: Instant) -> bool {
    key_seen
        .get(key)
        .map(|&last| now.saturating_duration_since(last) <= HOLD_WINDOW)
        .unwrap_or(false)
}

fn any_held(key_seen: &HashMap<KeyCode, Instant>, keys: &[KeyCode], now: Instant) -> bool {
    keys.iter().any(|k| is_held(key_seen, k, now))
}

// ── Audio sink ────────────────────────────────────────────────────────────────

/// The terminal has no mixer; cues are logged and flashed in the HUD.
#[derive(Default)]
struct CueSink {
    last: Option<(SoundCue, Instant)>,
}

impl CueSink {
    const FLASH: Duration = Duration::from_millis(600);

    fn play(&mut self, cue: SoundCue) {
        debug!(?cue, "sound cue");
        self.last = Some((cue, Instant::now()));
    }

    fn current(&self) -> Option<SoundCue> {
        self.last
            .filter(|(_, at)| at.elapsed() < Self::FLASH)
            .map(|(cue, _)| cue)
    }
}

// ── Game loop ─────────────────────────────────────────────────────────────────

/// One camera poll, one classification, one step and one render per
/// iteration, capped at `max_fps`.  Returns when the player quits.
///
/// With no replay file, the landmarks come from a `VirtualHand` steered by
/// held keys: arrows / WASD move the fingertip, Space curls the finger.
fn game_loop<W: Write>(
    out: &mut W,
    config: &AppConfig,
    rx: &mpsc::Receiver<Event>,
    mut replay: Option<ReplaySource<std::io::BufReader<File>>>,
    rng: &mut StdRng,
) -> Result<()> {
    let frame_budget = Duration::from_secs_f64(1.0 / f64::from(config.max_fps));
    let clock = Instant::now();
    let mut classifier = GestureClassifier::new(config.gesture.clone(), config.frame);
    let mut state: GameState = init_state(&config.game, config.frame, 0.0, rng);
    let mut hand = VirtualHand::default();
    let mut cues = CueSink::default();
    let mut key_seen: HashMap<KeyCode, Instant> = HashMap::new();
    let mut last_tick = Instant::now();
    let source_label = if replay.is_some() { "replay" } else { "virtual hand" };

    loop {
        let frame_start = Instant::now();
        let now = clock.elapsed().as_secs_f64();
        let dt = frame_start.duration_since(last_tick).as_secs_f32();
        last_tick = frame_start;

        // ── Drain all pending input events (non-blocking) ─────────────────────
        while let Ok(Event::Key(KeyEvent { code, kind, modifiers, .. })) = rx.try_recv() {
            match kind {
                KeyEventKind::Press => {
                    key_seen.insert(code.clone(), frame_start);
                    match code {
                        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                            return Ok(());
                        }
                        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                            return Ok(());
                        }
                        KeyCode::Char('r') | KeyCode::Char('R') if state.is_over() => {
                            reset(&mut state, &config.game, now, rng);
                            classifier = GestureClassifier::new(config.gesture.clone(), config.frame);
                        }
                        KeyCode::Char('h') | KeyCode::Char('H') => {
                            hand.visible = !hand.visible;
                        }
                        _ => {}
                    }
                }
                KeyEventKind::Repeat => {
                    key_seen.insert(code.clone(), frame_start);
                }
                KeyEventKind::Release => {
                    key_seen.remove(&code);
                }
            }
        }

        // ── Steer the virtual hand from held keys ─────────────────────────────
        let left = any_held(&key_seen, &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')], frame_start);
        let right = any_held(&key_seen, &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')], frame_start);
        let up = any_held(&key_seen, &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')], frame_start);
        let down = any_held(&key_seen, &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')], frame_start);
        let axis = |neg: bool, pos: bool| (pos as i8 - neg as i8) as f32;
        let step_len = VIRTUAL_HAND_SPEED * dt;
        hand.nudge(axis(left, right) * step_len, axis(up, down) * step_len);
        hand.curled = is_held(&key_seen, &KeyCode::Char(' '), frame_start);

        // ── Detector → classifier → simulation ────────────────────────────────
        let detection = match replay.as_mut() {
            Some(source) => source.poll()?.unwrap_or(Detection::NoHand),
            None => hand.poll()?.unwrap_or(Detection::NoHand),
        };
        let intent = classifier.classify(detection.hands(), now);

        if !state.is_over() {
            let result = step(&mut state, &config.game, intent, dt, now, rng);
            for cue in result.cues {
                cues.play(cue);
            }
        }

        let hud = display::Hud {
            intent,
            last_cue: cues.current(),
            source: source_label,
        };
        display::render(out, &state, &hud)?;

        let elapsed = frame_start.elapsed();
        if elapsed < frame_budget {
            thread::sleep(frame_budget - elapsed);
        }
    }
}

// ── Headless replay ───────────────────────────────────────────────────────────

/// Drive a replay at a fixed `1 / max_fps` tick until it runs dry or the
/// session ends.
fn run_headless(config: &AppConfig, path: &Path, rng: &mut StdRng) -> Result<()> {
    let mut source = ReplaySource::open(path)
        .with_context(|| format!("open replay {}", path.display()))?;
    let dt = 1.0 / config.max_fps as f32;
    let mut classifier = GestureClassifier::new(config.gesture.clone(), config.frame);
    let mut state = init_state(&config.game, config.frame, 0.0, rng);
    let mut ticks: u64 = 0;
    let mut shots: u32 = 0;

    while let Some(detection) = source.poll().context("read replay frame")? {
        let now = ticks as f64 * f64::from(dt);
        let intent = classifier.classify(detection.hands(), now);
        if intent == Intent::Shoot {
            shots += 1;
        }
        let result = step(&mut state, &config.game, intent, dt, now, rng);
        ticks += 1;
        if result.boss_activated {
            info!(tick = ticks, "boss entered");
        }
        if result.game_over {
            break;
        }
    }

    println!("=== SESSION ===");
    println!("  Ticks:      {}", ticks);
    println!("  Shots:      {}", shots);
    println!("  Score:      {}", state.score);
    println!("  Lives:      {}", state.life);
    println!("  Kills:      {}", state.kills);
    println!("  Boss HP:    {}", state.boss.life);
    println!(
        "  Status:     {}",
        if state.is_over() { "game over" } else { "running" }
    );
    Ok(())
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn init_tracing(log_file: Option<&Path>, headless: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("create log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None if headless => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
        None => {}
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_file.as_deref(), args.headless)?;

    let config = match &args.config {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("load config {}", path.display()))?,
        None => AppConfig::default(),
    };
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    info!(
        width = config.frame.width,
        height = config.frame.height,
        max_fps = config.max_fps,
        "starting"
    );

    if args.headless {
        let Some(path) = args.replay.as_deref() else {
            bail!("--headless needs --replay");
        };
        return run_headless(&config, path, &mut rng);
    }

    let replay = match args.replay.as_deref() {
        Some(path) => Some(
            ReplaySource::open(path).with_context(|| format!("open replay {}", path.display()))?,
        ),
        None => None,
    };

    let raw_out = stdout();
    let mut out = BufWriter::new(raw_out);

    terminal::enable_raw_mode().context("enable raw mode")?;
    out.execute(terminal::EnterAlternateScreen)?;
    out.execute(cursor::Hide)?;

    // Request key-release (and key-repeat) events from the terminal.
    // Kitty-protocol terminals support this; others fall back gracefully.
    let keyboard_enhanced = out
        .execute(PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
        ))
        .is_ok();

    // Dedicate a thread exclusively to blocking event reads, sending them
    // through a channel so the game loop never has to block on I/O.
    let (tx, rx) = mpsc::channel::<Event>();
    thread::spawn(move || loop {
        match event::read() {
            Ok(ev) => {
                if tx.send(ev).is_err() {
                    break; // receiver dropped → program exiting
                }
            }
            Err(e) => {
                warn!(error = %e, "input thread stopped");
                break;
            }
        }
    });

    let result = game_loop(&mut out, &config, &rx, replay, &mut rng);

    // Always restore the terminal
    if keyboard_enhanced {
        let _ = out.execute(PopKeyboardEnhancementFlags);
    }
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    result?;
    info!("quit");
    Ok(())
}
