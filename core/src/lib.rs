#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Gridfall simulation engine.
//!
//! This crate defines the vocabulary that connects the grid world, the pure
//! simulation systems, and the driving adapter: entity identifiers, discrete
//! and continuous coordinates, archetype enumerations, the explicit player
//! state, and the per-tick message values systems exchange instead of holding
//! references into each other. Configuration value tables live in [`config`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub mod config;

/// Unique identifier assigned to a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectileId(u32);

impl ProjectileId {
    /// Creates a new projectile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPos {
    x: u32,
    y: u32,
}

impl GridPos {
    /// Creates a new grid position.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }

    /// Computes the Manhattan distance between two grid positions.
    #[must_use]
    pub fn manhattan_distance(self, other: GridPos) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Computes the Euclidean distance between two grid positions in cells.
    #[must_use]
    pub fn euclidean_distance(self, other: GridPos) -> f32 {
        let dx = self.x as f32 - other.x as f32;
        let dy = self.y as f32 - other.y as f32;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Continuous position expressed in world (canvas pixel) coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldPoint {
    /// Horizontal coordinate in pixels.
    pub x: f32,
    /// Vertical coordinate in pixels.
    pub y: f32,
}

impl WorldPoint {
    /// Creates a new world point from pixel coordinates.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Computes the Euclidean distance to another point in pixels.
    #[must_use]
    pub fn distance_to(self, other: WorldPoint) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Advances this point toward `target` by at most `step` pixels.
    ///
    /// Returns the new position and whether the target was reached. When the
    /// remaining distance is smaller than the step the result snaps exactly
    /// onto the target so accumulated float error never drifts past a node.
    #[must_use]
    pub fn advanced_toward(self, target: WorldPoint, step: f32) -> (WorldPoint, bool) {
        let distance = self.distance_to(target);
        if distance < step {
            return (target, true);
        }
        if distance == 0.0 {
            return (self, true);
        }
        let scale = step / distance;
        (
            WorldPoint::new(self.x + (target.x - self.x) * scale, self.y + (target.y - self.y) * scale),
            false,
        )
    }
}

/// Classification of a single grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    /// Buildable ground with nothing on it.
    Empty,
    /// Part of the enemy route; walkable, never buildable.
    Path,
    /// Decorative wall; neither walkable nor buildable.
    Wall,
    /// Terrain obstruction; neither walkable nor buildable.
    Blocked,
    /// Occupied by a constructed tower.
    Tower,
}

/// Types of towers that can be constructed on the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TowerKind {
    /// Balanced single-target tower.
    Turret,
    /// Short-range tower with a slow, heavy shot.
    Bastion,
    /// Long-range tower that snipes the healthiest enemy.
    Sniper,
    /// Fast low-damage tower whose shots slow enemies on hit.
    Rapid,
    /// Support tower generating passive income; never fires.
    Harvester,
    /// Support tower emitting an attack-speed aura; never fires.
    Overseer,
    /// Support tower emitting a range aura; never fires.
    Surveyor,
}

impl TowerKind {
    /// Every constructible tower kind in catalog order.
    pub const ALL: [TowerKind; 7] = [
        TowerKind::Turret,
        TowerKind::Bastion,
        TowerKind::Sniper,
        TowerKind::Rapid,
        TowerKind::Harvester,
        TowerKind::Overseer,
        TowerKind::Surveyor,
    ];

    /// Reports whether this kind is a support tower that never fires.
    #[must_use]
    pub const fn is_support(self) -> bool {
        matches!(
            self,
            TowerKind::Harvester | TowerKind::Overseer | TowerKind::Surveyor
        )
    }

    /// Buff kind emitted by this tower as an aura, if any.
    #[must_use]
    pub const fn emitted_aura(self) -> Option<BuffKind> {
        match self {
            TowerKind::Overseer => Some(BuffKind::AttackSpeed),
            TowerKind::Surveyor => Some(BuffKind::Range),
            _ => None,
        }
    }
}

/// Types of enemies advancing along the route.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Baseline enemy with average health and speed.
    Grunt,
    /// Slow, heavily armored enemy.
    Brute,
    /// Fast, fragile enemy.
    Sprinter,
    /// Boss enemy able to knock out nearby towers.
    Behemoth,
}

/// Stat modifiers a tower can receive from support towers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuffKind {
    /// Passive gold generation; tracked per emitter, never per target.
    Income,
    /// Multiplicative cooldown reduction.
    AttackSpeed,
    /// Additive range extension measured in cells.
    Range,
}

impl BuffKind {
    /// Reports whether multiple sources of this kind stack on one target.
    #[must_use]
    pub const fn stacks(self) -> bool {
        matches!(self, BuffKind::AttackSpeed | BuffKind::Range)
    }
}

/// Explicit player state threaded into subsystems that report outcomes.
///
/// Subsystems receive this by mutable reference and call through its narrow
/// mutation surface; no global state exists anywhere in the simulation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerState {
    gold: u32,
    hp: u32,
    max_hp: u32,
    wave: u32,
    game_over: bool,
    victory: bool,
}

impl PlayerState {
    /// Creates a new player state with the provided starting resources.
    #[must_use]
    pub const fn new(gold: u32, hp: u32) -> Self {
        Self {
            gold,
            hp,
            max_hp: hp,
            wave: 0,
            game_over: false,
            victory: false,
        }
    }

    /// Gold currently available to the player.
    #[must_use]
    pub const fn gold(&self) -> u32 {
        self.gold
    }

    /// Remaining base hit points.
    #[must_use]
    pub const fn hp(&self) -> u32 {
        self.hp
    }

    /// Maximum base hit points.
    #[must_use]
    pub const fn max_hp(&self) -> u32 {
        self.max_hp
    }

    /// One-based number of the wave currently in play.
    #[must_use]
    pub const fn wave(&self) -> u32 {
        self.wave
    }

    /// Reports whether the base was destroyed.
    #[must_use]
    pub const fn is_defeated(&self) -> bool {
        self.game_over
    }

    /// Reports whether every wave has been cleared.
    #[must_use]
    pub const fn is_victorious(&self) -> bool {
        self.victory
    }

    /// Credits gold to the player.
    pub fn add_gold(&mut self, amount: u32) {
        self.gold = self.gold.saturating_add(amount);
    }

    /// Debits gold if the balance allows it, reporting success.
    #[must_use]
    pub fn try_spend(&mut self, amount: u32) -> bool {
        if self.gold < amount {
            return false;
        }
        self.gold -= amount;
        true
    }

    /// Applies damage to the base, flagging defeat when hit points run out.
    pub fn take_damage(&mut self, amount: u32) {
        self.hp = self.hp.saturating_sub(amount);
        if self.hp == 0 {
            self.game_over = true;
        }
    }

    /// Restores base hit points up to the configured maximum.
    pub fn heal(&mut self, amount: u32) {
        self.hp = self.hp.saturating_add(amount).min(self.max_hp);
    }

    /// Records that the level was cleared.
    pub fn set_victory(&mut self) {
        self.victory = true;
    }

    /// Updates the wave counter shown to the player.
    pub fn set_wave(&mut self, wave: u32) {
        self.wave = wave;
    }
}

/// Area effect emitted by a boss enemy that knocks out nearby towers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisablePulse {
    /// World position the pulse originates from.
    pub center: WorldPoint,
    /// Radius of the pulse in pixels.
    pub radius: f32,
    /// How long affected towers stay disabled.
    pub duration: Duration,
}

/// Experience earned by a tower for a projectile kill.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExperienceAward {
    /// Tower that fired the killing projectile.
    pub tower: TowerId,
    /// Experience points to credit.
    pub amount: f32,
}

/// Notifications the wave scheduler emits for the driving adapter.
#[derive(Clone, Debug, PartialEq)]
pub enum WaveSignal {
    /// A wave finished its preparation delay and went live.
    WaveStarted {
        /// One-based wave number.
        wave: u32,
    },
    /// A wave was cleared; the adapter must call back to resume.
    Transition {
        /// One-based wave number that completed.
        wave: u32,
        /// Reward values configured for the wave.
        rewards: config::WaveRewards,
        /// Configured transition timeout; enforced by the adapter, not here.
        timeout: Duration,
    },
    /// Every configured wave has been cleared.
    LevelComplete,
}
