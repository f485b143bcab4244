/// All game entity types: pure data, no game rules.
///
/// Positions are the top-left corner of a sprite in frame pixels.
/// Collision treats every sprite as a circle of radius `width / 2`
/// around its centre.

use crate::config::Size;

// ── Intent ────────────────────────────────────────────────────────────────────

/// The per-frame decision produced by gesture classification.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Intent {
    #[default]
    None,
    /// Absolute target position in frame pixels.
    Move { x: f32, y: f32 },
    Shoot,
}

// ── Sound cues ────────────────────────────────────────────────────────────────

/// Fire-and-forget audio triggers raised by a step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SoundCue {
    EnemyExplosion,
    PlayerFire,
    PlayerHit,
    BossHit,
    GameOver,
}

// ── Shared movement capability ────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Movable {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub dx: f32,
    pub dy: f32,
}

impl Movable {
    pub fn new(x: f32, y: f32, size: Size) -> Self {
        Self {
            x,
            y,
            width: size.width,
            height: size.height,
            dx: 0.0,
            dy: 0.0,
        }
    }

    pub fn with_velocity(mut self, dx: f32, dy: f32) -> Self {
        self.dx = dx;
        self.dy = dy;
        self
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn radius(&self) -> f32 {
        self.width / 2.0
    }

    /// Move the body so its centre sits at `(cx, cy)`.
    pub fn center_on(&mut self, cx: f32, cy: f32) {
        self.x = cx - self.width / 2.0;
        self.y = cy - self.height / 2.0;
    }

    /// Integrate velocity over `scale` reference frames.
    pub fn advance(&mut self, scale: f32) {
        self.x += self.dx * scale;
        self.y += self.dy * scale;
    }
}

// ── Projectiles ───────────────────────────────────────────────────────────────

/// Each shooter owns exactly one bullet; it is reused rather than respawned.
#[derive(Clone, Debug, PartialEq)]
pub struct Bullet {
    pub body: Movable,
    pub fired: bool,
}

impl Bullet {
    pub fn new(size: Size, dx: f32, dy: f32) -> Self {
        Self {
            body: Movable::new(0.0, 0.0, size).with_velocity(dx, dy),
            fired: false,
        }
    }

    /// Outside the vertical play range `[0, height]`.
    pub fn is_off_screen(&self, frame_height: f32) -> bool {
        self.body.y < 0.0 || self.body.y > frame_height
    }
}

// ── Player, enemies & boss ────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    pub body: Movable,
    pub bullet: Bullet,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Enemy {
    pub body: Movable,
    pub bullet: Bullet,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Boss {
    pub body: Movable,
    pub homing_bullet: Bullet,
    /// Latches once the score threshold is reached.
    pub active: bool,
    pub life: u32,
}

// ── Enemy roster ──────────────────────────────────────────────────────────────

/// Stable handle for an enemy; the slot index inside [`EnemyRoster`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnemyId(pub usize);

/// Slot arena of enemies.  Destroying an enemy empties its slot, so ids
/// held by other enemies never shift while the roster is being walked.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EnemyRoster {
    slots: Vec<Option<Enemy>>,
}

impl EnemyRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live enemies.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Place an enemy in the first free slot, growing the arena if needed.
    pub fn insert(&mut self, enemy: Enemy) -> EnemyId {
        if let Some(i) = self.slots.iter().position(|s| s.is_none()) {
            self.slots[i] = Some(enemy);
            EnemyId(i)
        } else {
            self.slots.push(Some(enemy));
            EnemyId(self.slots.len() - 1)
        }
    }

    pub fn get(&self, id: EnemyId) -> Option<&Enemy> {
        self.slots.get(id.0).and_then(|s| s.as_ref())
    }

    pub fn get_mut(&mut self, id: EnemyId) -> Option<&mut Enemy> {
        self.slots.get_mut(id.0).and_then(|s| s.as_mut())
    }

    /// Empty a slot; returns the enemy that lived there.
    pub fn destroy(&mut self, id: EnemyId) -> Option<Enemy> {
        self.slots.get_mut(id.0).and_then(Option::take)
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Ids of live enemies in slot order.
    pub fn ids(&self) -> Vec<EnemyId> {
        self.iter().map(|(id, _)| id).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EnemyId, &Enemy)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|e| (EnemyId(i), e)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EnemyId, &mut Enemy)> + '_ {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, s)| s.as_mut().map(|e| (EnemyId(i), e)))
    }
}

// ── Master game state ─────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub enum GameStatus {
    Playing,
    GameOver,
}

/// The entire session.  Owned by the caller and advanced through
/// [`crate::compute::step`].
#[derive(Clone, Debug, PartialEq)]
pub struct GameState {
    pub player: Player,
    pub enemies: EnemyRoster,
    pub boss: Boss,
    pub score: u32,
    pub life: u32,
    pub kills: u32,
    /// Timestamp (seconds) of the last enemy spawn.
    pub spawn_timer: f64,
    pub status: GameStatus,
    pub width: f32,
    pub height: f32,
}

impl GameState {
    pub fn is_over(&self) -> bool {
        self.status == GameStatus::GameOver
    }
}

/// Counters observed after one step, plus what happened during it.
#[derive(Clone, Debug, PartialEq)]
pub struct StepResult {
    pub score: u32,
    pub life: u32,
    pub boss_life: u32,
    pub game_over: bool,
    /// True only on the tick the boss wakes up.
    pub boss_activated: bool,
    pub cues: Vec<SoundCue>,
}
