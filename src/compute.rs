/// Game rules.
///
/// Every public function works on a caller-owned `GameState` through a
/// mutable reference.  Randomness comes in through an injected `Rng` so
/// tests can drive the simulation with a seeded generator.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info};

use crate::config::{FrameGeometry, GameConfig};
use crate::entities::{
    Boss, Bullet, Enemy, EnemyRoster, GameState, GameStatus, Intent, Movable, Player, SoundCue,
    StepResult,
};

// ── Collision ─────────────────────────────────────────────────────────────────

/// Circle test: centres closer than the sum of half-widths.
pub fn is_collision(a: &Movable, b: &Movable) -> bool {
    let (ax, ay) = a.center();
    let (bx, by) = b.center();
    let distance = ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt();
    distance < a.radius() + b.radius()
}

// ── Constructors ─────────────────────────────────────────────────────────────

/// Build a fresh session: player at the bottom centre, one enemy already on
/// the field, and a dormant boss with a randomly drawn heading.
pub fn init_state(
    config: &GameConfig,
    frame: FrameGeometry,
    now: f64,
    rng: &mut impl Rng,
) -> GameState {
    let player = Player {
        body: Movable::new(
            frame.width / 2.0,
            frame.height - config.player_bottom_margin,
            config.player_size,
        ),
        bullet: Bullet::new(config.player_bullet_size, 0.0, -config.player_bullet_speed),
    };

    let mut enemies = EnemyRoster::new();
    enemies.insert(new_enemy(config, frame.width, rng));

    let dx = config.boss_dx_choices.choose(rng).copied().unwrap_or(1.0);
    let dy = config.boss_dy_choices.choose(rng).copied().unwrap_or(1.0);
    let boss = Boss {
        body: Movable::new(
            frame.width / 2.0 - config.boss_size.width / 2.0,
            config.boss_start_y,
            config.boss_size,
        )
        .with_velocity(dx, dy),
        homing_bullet: Bullet::new(config.homing_bullet_size, 0.0, 0.0),
        active: false,
        life: config.boss_life,
    };

    GameState {
        player,
        enemies,
        boss,
        score: 0,
        life: config.starting_life,
        kills: 0,
        spawn_timer: now,
        status: GameStatus::Playing,
        width: frame.width,
        height: frame.height,
    }
}

/// Start over on the same frame; the only way out of `GameOver`.
pub fn reset(state: &mut GameState, config: &GameConfig, now: f64, rng: &mut impl Rng) {
    let frame = FrameGeometry {
        width: state.width,
        height: state.height,
    };
    *state = init_state(config, frame, now, rng);
    info!("session reset");
}

fn new_enemy(config: &GameConfig, frame_width: f32, rng: &mut impl Rng) -> Enemy {
    let size = config.enemy_size;
    let x = rng.gen_range(0.0..=(frame_width - size.width).max(0.0));
    let y = rng.gen_range(config.enemy_spawn_y_min..=config.enemy_spawn_y_max);
    Enemy {
        body: Movable::new(x, y, size).with_velocity(config.enemy_speed, 0.0),
        bullet: Bullet::new(config.enemy_bullet_size, 0.0, config.enemy_bullet_speed),
    }
}

// ── Input-driven transitions ──────────────────────────────────────────────────

/// Centre the player horizontally on `x`, kept fully inside the frame.
pub fn move_player(state: &mut GameState, x: f32) {
    let body = &mut state.player.body;
    let max_x = (state.width - body.width).max(0.0);
    body.x = (x - body.width / 2.0).clamp(0.0, max_x);
}

/// Fire from the muzzle unless the single player bullet is still in flight.
/// Returns whether a shot left the barrel.
pub fn player_shoot(state: &mut GameState) -> bool {
    let player = &mut state.player;
    if player.bullet.fired {
        return false;
    }
    let bullet = &mut player.bullet.body;
    bullet.x = player.body.x + player.body.width / 2.0 - bullet.width / 2.0;
    bullet.y = player.body.y;
    player.bullet.fired = true;
    true
}

/// Move the player or pull the trigger.
pub fn apply_intent(state: &mut GameState, intent: Intent, cues: &mut Vec<SoundCue>) {
    match intent {
        Intent::Move { x, .. } => move_player(state, x),
        Intent::Shoot => {
            if player_shoot(state) {
                debug!(x = state.player.bullet.body.x, "player fired");
                cues.push(SoundCue::PlayerFire);
            }
        }
        Intent::None => {}
    }
}

// ── Per-tick step ────────────────────────────────────────────────────────────

/// Advance the session by one tick of `dt` seconds at wall-clock `now`.
///
/// A finished session is left untouched; call [`reset`] to play again.
pub fn step(
    state: &mut GameState,
    config: &GameConfig,
    intent: Intent,
    dt: f32,
    now: f64,
    rng: &mut impl Rng,
) -> StepResult {
    let mut cues = Vec::new();
    if state.is_over() {
        return summarize(state, false, cues);
    }
    let scale = dt.max(0.0) * config.reference_fps;

    // ── 1. Intent ────────────────────────────────────────────────────────────
    apply_intent(state, intent, &mut cues);

    // ── 2. Spawn ─────────────────────────────────────────────────────────────
    if !state.boss.active {
        spawn_enemy(state, config, now, rng);
    }

    // ── 3. Player bullet ↔ enemies ───────────────────────────────────────────
    player_bullet_vs_enemies(state, config, &mut cues);

    // ── 4. Enemy fire, enemy bullets ↔ player ────────────────────────────────
    enemy_fire(state, config, &mut cues);
    if state.is_over() {
        return summarize(state, false, cues);
    }

    // ── 5. Enemy motion ──────────────────────────────────────────────────────
    move_enemies(state, config, scale);

    // ── 6. Boss activation ───────────────────────────────────────────────────
    let boss_activated = activate_boss(state, config);

    // ── 7. Boss ──────────────────────────────────────────────────────────────
    if state.boss.active && state.boss.life > 0 {
        boss_turn(state, config, scale, &mut cues);
        if state.is_over() {
            return summarize(state, boss_activated, cues);
        }
    }

    // ── 8. Projectiles & off-screen reset ────────────────────────────────────
    advance_projectiles(state, scale);

    summarize(state, boss_activated, cues)
}

fn summarize(state: &GameState, boss_activated: bool, cues: Vec<SoundCue>) -> StepResult {
    StepResult {
        score: state.score,
        life: state.life,
        boss_life: state.boss.life,
        game_over: state.is_over(),
        boss_activated,
        cues,
    }
}

// ── Systems ──────────────────────────────────────────────────────────────────

/// A fresh whole-second threshold is drawn on every tick.
fn spawn_enemy(state: &mut GameState, config: &GameConfig, now: f64, rng: &mut impl Rng) {
    if state.enemies.len() >= config.max_enemies {
        return;
    }
    let threshold = rng.gen_range(config.spawn_interval_min..=config.spawn_interval_max);
    if now - state.spawn_timer > f64::from(threshold) {
        let id = state.enemies.insert(new_enemy(config, state.width, rng));
        state.spawn_timer = now;
        debug!(?id, population = state.enemies.len(), "enemy spawned");
    }
}

fn player_bullet_vs_enemies(state: &mut GameState, config: &GameConfig, cues: &mut Vec<SoundCue>) {
    for id in state.enemies.ids() {
        if !state.player.bullet.fired {
            break;
        }
        let hit = state
            .enemies
            .get(id)
            .is_some_and(|enemy| is_collision(&state.player.bullet.body, &enemy.body));
        if hit {
            state.enemies.destroy(id);
            state.player.bullet.fired = false;
            state.score = state.score.saturating_add(config.kill_reward);
            state.kills += 1;
            cues.push(SoundCue::EnemyExplosion);
            debug!(?id, score = state.score, kills = state.kills, "enemy destroyed");
        }
    }
}

fn enemy_fire(state: &mut GameState, config: &GameConfig, cues: &mut Vec<SoundCue>) {
    for id in state.enemies.ids() {
        let Some(enemy) = state.enemies.get_mut(id) else {
            continue;
        };
        if !enemy.bullet.fired {
            let (cx, cy) = enemy.body.center();
            enemy.bullet.body.center_on(cx, cy);
            enemy.bullet.fired = true;
        }
        if is_collision(&enemy.bullet.body, &state.player.body) {
            enemy.bullet.fired = false;
            player_hit(state, config, cues);
            if state.is_over() {
                return;
            }
        }
    }
}

/// Shared by enemy bullets and the boss's homing bullet.
fn player_hit(state: &mut GameState, config: &GameConfig, cues: &mut Vec<SoundCue>) {
    state.life = state.life.saturating_sub(1);
    state.score = state.score.saturating_sub(config.hit_penalty);
    cues.push(SoundCue::PlayerHit);
    debug!(life = state.life, score = state.score, "player hit");
    if state.life == 0 {
        end_game(state, cues);
    }
}

fn end_game(state: &mut GameState, cues: &mut Vec<SoundCue>) {
    state.status = GameStatus::GameOver;
    cues.push(SoundCue::GameOver);
    info!(score = state.score, kills = state.kills, "game over");
}

/// Horizontal patrol; each wall bounce reverses and drops one row.
/// Enemies are never stopped at the bottom edge.
fn move_enemies(state: &mut GameState, config: &GameConfig, scale: f32) {
    let width = state.width;
    for (_, enemy) in state.enemies.iter_mut() {
        let body = &mut enemy.body;
        body.x += body.dx * scale;
        let max_x = (width - body.width).max(0.0);
        if (body.x <= 0.0 && body.dx < 0.0) || (body.x >= max_x && body.dx > 0.0) {
            body.x = body.x.clamp(0.0, max_x);
            body.dx = -body.dx;
            body.y += config.enemy_row_step;
        }
    }
}

/// One-way latch; clears the roster on the tick it fires.
fn activate_boss(state: &mut GameState, config: &GameConfig) -> bool {
    if state.boss.active || state.score < config.boss_score_threshold {
        return false;
    }
    state.boss.active = true;
    state.enemies.clear();
    info!(score = state.score, "boss activated");
    true
}

fn boss_turn(state: &mut GameState, config: &GameConfig, scale: f32, cues: &mut Vec<SoundCue>) {
    let (width, height) = (state.width, state.height);
    move_boss(&mut state.boss, width, height, scale);
    steer_homing_bullet(&mut state.boss, &state.player.body, config.homing_speed, scale);

    if state.boss.homing_bullet.fired
        && is_collision(&state.boss.homing_bullet.body, &state.player.body)
    {
        state.boss.homing_bullet.fired = false;
        player_hit(state, config, cues);
        if state.is_over() {
            return;
        }
    }

    if state.player.bullet.fired && is_collision(&state.player.bullet.body, &state.boss.body) {
        state.player.bullet.fired = false;
        state.boss.life = state.boss.life.saturating_sub(1);
        cues.push(SoundCue::BossHit);
        debug!(boss_life = state.boss.life, "boss hit");
        if state.boss.life == 0 {
            state.score = state.score.saturating_add(config.boss_reward);
            info!(score = state.score, "boss defeated");
            end_game(state, cues);
        }
    }
}

/// Bounce around the upper half of the frame.
fn move_boss(boss: &mut Boss, width: f32, height: f32, scale: f32) {
    let body = &mut boss.body;
    body.advance(scale);

    let max_x = (width - body.width).max(0.0);
    if (body.x <= 0.0 && body.dx < 0.0) || (body.x >= max_x && body.dx > 0.0) {
        body.x = body.x.clamp(0.0, max_x);
        body.dx = -body.dx;
    }
    let max_y = height / 2.0;
    if (body.y <= 0.0 && body.dy < 0.0) || (body.y >= max_y && body.dy > 0.0) {
        body.y = body.y.clamp(0.0, max_y);
        body.dy = -body.dy;
    }
}

/// Arm the homing bullet at the boss if idle, then aim it at the player.
fn steer_homing_bullet(boss: &mut Boss, target: &Movable, speed: f32, scale: f32) {
    let bullet = &mut boss.homing_bullet;
    if !bullet.fired {
        let (cx, cy) = boss.body.center();
        bullet.body.center_on(cx, cy);
        bullet.fired = true;
    }

    let (bx, by) = bullet.body.center();
    let (tx, ty) = target.center();
    let (dir_x, dir_y) = (tx - bx, ty - by);
    let distance = (dir_x * dir_x + dir_y * dir_y).sqrt();
    if distance > 0.0 {
        bullet.body.dx = dir_x / distance * speed;
        bullet.body.dy = dir_y / distance * speed;
    }
    bullet.body.advance(scale);
}

/// Integrate straight-flying bullets, then recycle every fired bullet that
/// has left the vertical play range, homing bullet included.
fn advance_projectiles(state: &mut GameState, scale: f32) {
    let height = state.height;

    let bullet = &mut state.player.bullet;
    if bullet.fired {
        bullet.body.advance(scale);
    }
    recycle_if_off_screen(bullet, height);

    for (_, enemy) in state.enemies.iter_mut() {
        if enemy.bullet.fired {
            enemy.bullet.body.advance(scale);
        }
        recycle_if_off_screen(&mut enemy.bullet, height);
    }

    recycle_if_off_screen(&mut state.boss.homing_bullet, height);
}

fn recycle_if_off_screen(bullet: &mut Bullet, height: f32) {
    if bullet.fired && bullet.is_off_screen(height) {
        bullet.fired = false;
    }
}
