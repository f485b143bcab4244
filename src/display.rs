/// Rendering layer: all terminal I/O lives here.
///
/// Each function receives a mutable writer and an immutable view of the
/// game state.  No game logic is performed; this module only scales frame
/// pixels onto terminal cells and translates state into terminal commands.

use std::io::Write;

use crossterm::{
    cursor,
    style::{self, Color, Print},
    terminal,
    QueueableCommand,
};
use gesture_shooter::entities::{Bullet, GameState, Intent, Movable, SoundCue};

// ── Colour palette ────────────────────────────────────────────────────────────

const C_BORDER: Color = Color::DarkBlue;
const C_HUD_SCORE: Color = Color::Yellow;
const C_HUD_LIVES: Color = Color::Red;
const C_HUD_BOSS: Color = Color::Red;
const C_HUD_INTENT: Color = Color::Cyan;
const C_PLAYER: Color = Color::White;
const C_ENEMY: Color = Color::Green;
const C_BOSS: Color = Color::Magenta;
const C_BULLET_PLAYER: Color = Color::Cyan;
const C_BULLET_ENEMY: Color = Color::Magenta;
const C_BULLET_HOMING: Color = Color::Red;
const C_HINT: Color = Color::DarkGrey;

/// Per-frame extras shown next to the simulation.
pub struct Hud<'a> {
    pub intent: Intent,
    pub last_cue: Option<SoundCue>,
    pub source: &'a str,
}

/// Maps frame pixels onto the bordered play area of the terminal.
struct Viewport {
    cols: u16,
    rows: u16,
    frame_width: f32,
    frame_height: f32,
}

impl Viewport {
    fn new(state: &GameState) -> std::io::Result<Self> {
        let (cols, rows) = terminal::size()?;
        Ok(Self {
            cols,
            rows,
            frame_width: state.width,
            frame_height: state.height,
        })
    }

    /// Play area spans columns 1..cols-1 and rows 2..rows-2.
    fn cell(&self, x: f32, y: f32) -> Option<(u16, u16)> {
        let inner_w = self.cols.saturating_sub(2) as f32;
        let inner_h = self.rows.saturating_sub(4) as f32;
        if inner_w < 1.0 || inner_h < 1.0 {
            return None;
        }
        let col = (x / self.frame_width * inner_w).floor();
        let row = (y / self.frame_height * inner_h).floor();
        if !(0.0..inner_w).contains(&col) || !(0.0..inner_h).contains(&row) {
            return None;
        }
        Some((col as u16 + 1, row as u16 + 2))
    }

    fn center_cell(&self, body: &Movable) -> Option<(u16, u16)> {
        let (cx, cy) = body.center();
        self.cell(cx, cy)
    }
}

// ── Public entry point ────────────────────────────────────────────────────────

/// Render one complete frame.
pub fn render<W: Write>(out: &mut W, state: &GameState, hud: &Hud) -> std::io::Result<()> {
    let view = Viewport::new(state)?;
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    draw_border(out, &view)?;
    draw_hud(out, state, hud, &view)?;

    for (_, enemy) in state.enemies.iter() {
        draw_sprite(out, &view, &enemy.body, "«▼»", C_ENEMY)?;
        draw_bullet(out, &view, &enemy.bullet, "↓", C_BULLET_ENEMY)?;
    }
    if state.boss.active && state.boss.life > 0 {
        draw_sprite(out, &view, &state.boss.body, "<[■■]>", C_BOSS)?;
        draw_bullet(out, &view, &state.boss.homing_bullet, "●", C_BULLET_HOMING)?;
    }
    draw_bullet(out, &view, &state.player.bullet, "║", C_BULLET_PLAYER)?;
    draw_sprite(out, &view, &state.player.body, "/▲\\", C_PLAYER)?;

    draw_controls_hint(out, &view)?;

    if state.is_over() {
        draw_game_over(out, state, &view)?;
    }

    // Park cursor in a harmless spot and flush
    out.queue(style::ResetColor)?;
    out.queue(cursor::MoveTo(0, view.rows.saturating_sub(1)))?;
    out.flush()?;
    Ok(())
}

// ── Border ────────────────────────────────────────────────────────────────────

fn draw_border<W: Write>(out: &mut W, view: &Viewport) -> std::io::Result<()> {
    let w = view.cols as usize;
    let h = view.rows;

    out.queue(style::SetForegroundColor(C_BORDER))?;

    out.queue(cursor::MoveTo(0, 1))?;
    out.queue(Print(format!("┌{}┐", "─".repeat(w.saturating_sub(2)))))?;

    out.queue(cursor::MoveTo(0, h.saturating_sub(2)))?;
    out.queue(Print(format!("└{}┘", "─".repeat(w.saturating_sub(2)))))?;

    for row in 2..h.saturating_sub(2) {
        out.queue(cursor::MoveTo(0, row))?;
        out.queue(Print("│"))?;
        out.queue(cursor::MoveTo(view.cols.saturating_sub(1), row))?;
        out.queue(Print("│"))?;
    }

    Ok(())
}

// ── HUD (row 0) ───────────────────────────────────────────────────────────────

fn draw_hud<W: Write>(
    out: &mut W,
    state: &GameState,
    hud: &Hud,
    view: &Viewport,
) -> std::io::Result<()> {
    out.queue(cursor::MoveTo(1, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_SCORE))?;
    out.queue(Print(format!("Score:{:>6}  Kills:{:>3}", state.score, state.kills)))?;

    out.queue(style::SetForegroundColor(C_HUD_LIVES))?;
    out.queue(Print(format!("  Lives:{}", "♥".repeat(state.life as usize))))?;

    if state.boss.active && state.boss.life > 0 {
        out.queue(style::SetForegroundColor(C_HUD_BOSS))?;
        out.queue(Print(format!("  Boss HP:{:>3}", state.boss.life)))?;
    }

    // Intent and last cue, right-aligned
    let intent = match hud.intent {
        Intent::None => "·".to_string(),
        Intent::Move { x, y } => format!("move {:>4.0},{:>4.0}", x, y),
        Intent::Shoot => "SHOOT".to_string(),
    };
    let cue = hud.last_cue.map(cue_label).unwrap_or("");
    let right = format!("[{}] {} {}", hud.source, intent, cue);
    let rx = view.cols.saturating_sub(right.chars().count() as u16 + 1);
    out.queue(cursor::MoveTo(rx, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_INTENT))?;
    out.queue(Print(&right))?;

    Ok(())
}

fn cue_label(cue: SoundCue) -> &'static str {
    match cue {
        SoundCue::EnemyExplosion => "*boom*",
        SoundCue::PlayerFire => "*pew*",
        SoundCue::PlayerHit => "*ouch*",
        SoundCue::BossHit => "*clang*",
        SoundCue::GameOver => "*game over*",
    }
}

// ── Entities ──────────────────────────────────────────────────────────────────

/// Draw `glyph` centred on the body's centre cell.
fn draw_sprite<W: Write>(
    out: &mut W,
    view: &Viewport,
    body: &Movable,
    glyph: &str,
    color: Color,
) -> std::io::Result<()> {
    let Some((col, row)) = view.center_cell(body) else {
        return Ok(());
    };
    let half = glyph.chars().count() as u16 / 2;
    let col = col.saturating_sub(half).max(1);
    out.queue(cursor::MoveTo(col, row))?;
    out.queue(style::SetForegroundColor(color))?;
    out.queue(Print(glyph))?;
    Ok(())
}

fn draw_bullet<W: Write>(
    out: &mut W,
    view: &Viewport,
    bullet: &Bullet,
    glyph: &str,
    color: Color,
) -> std::io::Result<()> {
    if !bullet.fired {
        return Ok(());
    }
    draw_sprite(out, view, &bullet.body, glyph, color)
}

// ── Controls hint (last row) ──────────────────────────────────────────────────

fn draw_controls_hint<W: Write>(out: &mut W, view: &Viewport) -> std::io::Result<()> {
    out.queue(cursor::MoveTo(1, view.rows.saturating_sub(1)))?;
    out.queue(style::SetForegroundColor(C_HINT))?;
    out.queue(Print(
        "← → ↑ ↓ / WASD : Point   SPACE : Curl finger   H : Hide hand   Q : Quit",
    ))?;
    Ok(())
}

// ── Game-over overlay ─────────────────────────────────────────────────────────

fn draw_game_over<W: Write>(out: &mut W, state: &GameState, view: &Viewport) -> std::io::Result<()> {
    let banner = if state.boss.life == 0 {
        "║   BOSS DEFEATED    ║"
    } else {
        "║    GAME  OVER      ║"
    };
    let lines: [&str; 3] = [
        "╔════════════════════╗",
        banner,
        "╚════════════════════╝",
    ];
    let score_line = format!("Final Score: {:>6}", state.score);
    let hint = "R - Play Again  Q - Quit";

    let cx = view.cols / 2;
    let total_rows = lines.len() as u16 + 2;
    let start_row = (view.rows / 2).saturating_sub(total_rows / 2);

    out.queue(style::SetForegroundColor(Color::Red))?;
    for (i, msg) in lines.iter().enumerate() {
        let col = cx.saturating_sub(msg.chars().count() as u16 / 2);
        out.queue(cursor::MoveTo(col, start_row + i as u16))?;
        out.queue(Print(*msg))?;
    }

    let score_row = start_row + lines.len() as u16;
    let col = cx.saturating_sub(score_line.chars().count() as u16 / 2);
    out.queue(cursor::MoveTo(col, score_row))?;
    out.queue(style::SetForegroundColor(Color::Yellow))?;
    out.queue(Print(&score_line))?;

    let col = cx.saturating_sub(hint.chars().count() as u16 / 2);
    out.queue(cursor::MoveTo(col, score_row + 1))?;
    out.queue(style::SetForegroundColor(Color::White))?;
    out.queue(Print(hint))?;

    Ok(())
}
