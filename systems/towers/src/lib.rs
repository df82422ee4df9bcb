#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Tower construction, combat, and upkeep for the Gridfall simulation.
//!
//! The registry owns every constructed tower, runs the build and sell
//! economy against the explicit player state, drives target selection and
//! firing through the projectile volley, and re-sweeps support auras
//! whenever the set of towers changes.

use std::{collections::HashMap, time::Duration};

use gridfall_core::{
    config::{ExperienceCurve, TowerCatalog},
    BuffKind, DisablePulse, ExperienceAward, GridPos, PlayerState, TowerId, TowerKind,
};
use gridfall_system_buffs::BuffBoard;
use gridfall_system_enemies::EnemyPopulation;
use gridfall_system_experience::{self as experience, Progression, StatKind};
use gridfall_system_projectiles::{HitEffect, ProjectileVolley};
use gridfall_world::Grid;
use thiserror::Error;

/// Speed multiplier applied by rapid-tower shots.
const RAPID_SLOW_FACTOR: f32 = 0.5;
/// Duration of the rapid-tower slow.
const RAPID_SLOW_DURATION: Duration = Duration::from_secs(2);

/// Error raised when a build request cannot be honored.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    /// The requested cell lies outside the grid.
    #[error("cell is outside the grid")]
    OutOfBounds,
    /// The requested cell is not empty buildable ground.
    #[error("cell is not buildable")]
    Occupied,
    /// The player cannot afford the tower.
    #[error("tower costs {needed} gold but only {available} is available")]
    InsufficientFunds {
        /// Gold the build would cost.
        needed: u32,
        /// Gold the player currently holds.
        available: u32,
    },
}

/// One constructed tower.
#[derive(Clone, Debug)]
pub struct Tower {
    id: TowerId,
    kind: TowerKind,
    cell: GridPos,
    range_cells: f32,
    damage: f32,
    cooldown: Duration,
    last_fired: Option<Duration>,
    disabled_until: Duration,
    progression: Progression,
    total_investment: u32,
}

impl Tower {
    /// Identifier of the tower.
    #[must_use]
    pub const fn id(&self) -> TowerId {
        self.id
    }

    /// Archetype of the tower.
    #[must_use]
    pub const fn kind(&self) -> TowerKind {
        self.kind
    }

    /// Cell the tower occupies.
    #[must_use]
    pub const fn cell(&self) -> GridPos {
        self.cell
    }

    /// Current leveled damage per shot.
    #[must_use]
    pub const fn damage(&self) -> f32 {
        self.damage
    }

    /// Current leveled range in cells, before range buffs.
    #[must_use]
    pub const fn range_cells(&self) -> f32 {
        self.range_cells
    }

    /// Level and experience bookkeeping.
    #[must_use]
    pub const fn progression(&self) -> &Progression {
        &self.progression
    }

    /// Reports whether the tower is knocked out at the given time.
    #[must_use]
    pub fn is_disabled(&self, now: Duration) -> bool {
        self.disabled_until > now
    }
}

/// Owner of every constructed tower, indexed for constant-time lookup.
#[derive(Debug)]
pub struct TowerRegistry {
    towers: Vec<Tower>,
    index: HashMap<TowerId, usize>,
    next_id: u32,
    catalog: TowerCatalog,
    curve: ExperienceCurve,
}

impl TowerRegistry {
    /// Creates an empty registry with the provided value tables.
    #[must_use]
    pub fn new(catalog: TowerCatalog, curve: ExperienceCurve) -> Self {
        Self {
            towers: Vec::new(),
            index: HashMap::new(),
            next_id: 0,
            catalog,
            curve,
        }
    }

    /// Gold a new tower of the given kind would cost right now.
    ///
    /// Harvesters get more expensive with each one already standing.
    #[must_use]
    pub fn price(&self, kind: TowerKind) -> u32 {
        let base = self.catalog.stats(kind).base_cost;
        if kind == TowerKind::Harvester {
            let standing = self
                .towers
                .iter()
                .filter(|tower| tower.kind == TowerKind::Harvester)
                .count() as u32;
            base + self.catalog.harvester_increment * standing
        } else {
            base
        }
    }

    /// Constructs a tower, charging the player and occupying the cell.
    ///
    /// Funds are only debited once placement is known to be valid, so a
    /// failed build never mutates anything.
    pub fn build(
        &mut self,
        kind: TowerKind,
        cell: GridPos,
        grid: &mut Grid,
        player: &mut PlayerState,
        buffs: &mut BuffBoard,
        now: Duration,
    ) -> Result<TowerId, BuildError> {
        if !grid.in_bounds(cell) {
            return Err(BuildError::OutOfBounds);
        }
        if !grid.is_buildable(cell) {
            return Err(BuildError::Occupied);
        }
        let cost = self.price(kind);
        if !player.try_spend(cost) {
            return Err(BuildError::InsufficientFunds {
                needed: cost,
                available: player.gold(),
            });
        }

        let stats = self.catalog.stats(kind);
        let id = TowerId::new(self.next_id);
        self.next_id += 1;
        let tower = Tower {
            id,
            kind,
            cell,
            range_cells: stats.range_cells,
            damage: stats.damage,
            cooldown: stats.cooldown,
            last_fired: None,
            disabled_until: Duration::ZERO,
            progression: Progression::fresh(&self.curve),
            total_investment: cost,
        };
        let _ = self.index.insert(id, self.towers.len());
        self.towers.push(tower);
        grid.occupy(cell, id);
        if kind == TowerKind::Harvester {
            buffs.enroll_harvester(id);
        }
        self.recompute_auras(buffs, now);
        log::debug!("built {kind:?} at ({}, {}) for {cost} gold", cell.x(), cell.y());
        Ok(id)
    }

    /// Demolishes a tower, refunding part of its total investment.
    ///
    /// Every buff the tower granted or held disappears with it. Returns the
    /// refund, or `None` for an unknown identifier.
    pub fn sell(
        &mut self,
        id: TowerId,
        grid: &mut Grid,
        player: &mut PlayerState,
        buffs: &mut BuffBoard,
        now: Duration,
    ) -> Option<u32> {
        let slot = self.index.remove(&id)?;
        let tower = self.towers.remove(slot);
        self.index.clear();
        for (position, remaining) in self.towers.iter().enumerate() {
            let _ = self.index.insert(remaining.id, position);
        }

        let refund = (tower.total_investment as f32 * self.catalog.sell_ratio).floor() as u32;
        player.add_gold(refund);
        grid.vacate(tower.cell);
        buffs.purge_source(id);
        buffs.purge_target(id);
        buffs.withdraw_harvester(id);
        self.recompute_auras(buffs, now);
        log::debug!("sold tower {} for {refund} gold", id.get());
        Some(refund)
    }

    /// Knocks a tower out until `now + duration`; unknown ids are ignored.
    pub fn disable(&mut self, id: TowerId, duration: Duration, now: Duration) {
        if let Some(&slot) = self.index.get(&id) {
            if let Some(tower) = self.towers.get_mut(slot) {
                tower.disabled_until = tower.disabled_until.max(now + duration);
            }
        }
    }

    /// Applies a boss pulse, disabling every tower inside its radius.
    pub fn apply_disable_pulse(&mut self, pulse: &DisablePulse, grid: &Grid, now: Duration) {
        let affected: Vec<TowerId> = self
            .towers
            .iter()
            .filter(|tower| {
                grid.cell_center(tower.cell).distance_to(pulse.center) <= pulse.radius
            })
            .map(|tower| tower.id)
            .collect();
        for id in &affected {
            self.disable(*id, pulse.duration, now);
        }
        if !affected.is_empty() {
            log::debug!("disable pulse knocked out {} towers", affected.len());
        }
    }

    /// Runs one combat tick: every ready tower acquires a target and fires.
    ///
    /// Towers fire in build order. A tower fires only when it is not
    /// disabled, its buffed cooldown has elapsed, and an enemy stands inside
    /// its buffed range.
    pub fn update(
        &mut self,
        now: Duration,
        grid: &Grid,
        enemies: &EnemyPopulation,
        buffs: &BuffBoard,
        volley: &mut ProjectileVolley,
    ) {
        for tower in &mut self.towers {
            if tower.kind.is_support() {
                continue;
            }
            if tower.disabled_until > now {
                continue;
            }

            let speed_bonus = buffs.total(tower.id, BuffKind::AttackSpeed);
            let cooldown = tower.cooldown.mul_f32((1.0 - speed_bonus).max(0.0));
            let ready = tower
                .last_fired
                .map_or(true, |fired| now.saturating_sub(fired) >= cooldown);
            if !ready {
                continue;
            }

            let range_cells = tower.range_cells + buffs.total(tower.id, BuffKind::Range);
            let range = range_cells * grid.cell_size();
            let origin = grid.cell_center(tower.cell);

            let target = match tower.kind {
                TowerKind::Sniper => enemies
                    .iter_active()
                    .filter(|enemy| enemy.position().distance_to(origin) <= range)
                    .max_by(|a, b| {
                        a.hp()
                            .total_cmp(&b.hp())
                            .then_with(|| b.id().cmp(&a.id()))
                    }),
                _ => enemies
                    .iter_active()
                    .filter(|enemy| enemy.position().distance_to(origin) <= range)
                    .max_by(|a, b| {
                        a.path_index()
                            .cmp(&b.path_index())
                            .then_with(|| b.id().cmp(&a.id()))
                    }),
            };
            let Some(target) = target else {
                continue;
            };

            let effect = (tower.kind == TowerKind::Rapid).then_some(HitEffect::Slow {
                factor: RAPID_SLOW_FACTOR,
                duration: RAPID_SLOW_DURATION,
            });
            let _ = volley.spawn(
                origin,
                target.id(),
                target.position(),
                tower.damage,
                effect,
                tower.id,
            );
            tower.last_fired = Some(now);
        }
    }

    /// Credits kill experience, recomputing stats on every level-up.
    ///
    /// Awards for towers sold before the projectile landed are dropped.
    pub fn award_experience(&mut self, awards: &[ExperienceAward]) {
        let curve = self.curve;
        for award in awards {
            let Some(&slot) = self.index.get(&award.tower) else {
                continue;
            };
            let base = match self.towers.get(slot) {
                Some(tower) => *self.catalog.stats(tower.kind),
                None => continue,
            };
            let Some(tower) = self.towers.get_mut(slot) else {
                continue;
            };
            if experience::gain(&curve, &mut tower.progression, award.amount) {
                let level = tower.progression.level;
                tower.damage =
                    experience::stat_at_level(&curve, base.damage, level, StatKind::Damage);
                tower.range_cells =
                    experience::stat_at_level(&curve, base.range_cells, level, StatKind::Range);
                tower.cooldown = Duration::from_secs_f32(experience::stat_at_level(
                    &curve,
                    base.cooldown.as_secs_f32(),
                    level,
                    StatKind::Cooldown,
                ));
            }
        }
    }

    /// Re-sweeps every support aura over the current tower layout.
    fn recompute_auras(&self, buffs: &mut BuffBoard, now: Duration) {
        let candidates: Vec<(TowerId, GridPos)> = self
            .towers
            .iter()
            .map(|tower| (tower.id, tower.cell))
            .collect();
        for tower in &self.towers {
            let Some(kind) = tower.kind.emitted_aura() else {
                continue;
            };
            let value = match kind {
                BuffKind::AttackSpeed => buffs.tuning().attack_speed_bonus,
                BuffKind::Range => buffs.tuning().range_bonus_cells,
                BuffKind::Income => continue,
            };
            buffs.apply_aura(tower.id, tower.cell, kind, value, &candidates, now);
        }
    }

    /// Looks up a tower by identifier.
    #[must_use]
    pub fn get(&self, id: TowerId) -> Option<&Tower> {
        let slot = *self.index.get(&id)?;
        self.towers.get(slot)
    }

    /// Iterates over every constructed tower in build order.
    pub fn iter(&self) -> impl Iterator<Item = &Tower> {
        self.towers.iter()
    }

    /// Number of constructed towers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.towers.len()
    }

    /// Reports whether no tower has been constructed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.towers.is_empty()
    }
}
