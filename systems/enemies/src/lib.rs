#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Enemy population and route traversal for the Gridfall simulation.
//!
//! Enemies walk the grid's precomputed route node by node, advancing at most
//! one node per tick. Deaths and breaches deactivate an enemy immediately but
//! the slot is only compacted at the end of the next update, so identifiers
//! handed to projectiles stay resolvable within a tick.

use std::{collections::HashMap, time::Duration};

use gridfall_core::{DisablePulse, EnemyId, EnemyKind, PlayerState, WorldPoint};
use gridfall_core::config::EnemyCatalog;
use gridfall_world::Grid;
use rand::Rng;

/// Chance per tick that a boss knocks out nearby towers.
const BOSS_DISABLE_CHANCE: f64 = 0.01;
/// Boss pulse radius in cells.
const BOSS_PULSE_RADIUS_CELLS: f32 = 5.0;
/// How long a boss pulse keeps towers disabled.
const BOSS_DISABLE_DURATION: Duration = Duration::from_secs(5);

/// A single enemy advancing along the route.
#[derive(Clone, Debug)]
pub struct Enemy {
    id: EnemyId,
    kind: EnemyKind,
    hp: f32,
    max_hp: f32,
    speed: f32,
    position: WorldPoint,
    path_index: usize,
    slow_factor: f32,
    slow_remaining: Duration,
    active: bool,
}

impl Enemy {
    /// Identifier of the enemy.
    #[must_use]
    pub const fn id(&self) -> EnemyId {
        self.id
    }

    /// Archetype of the enemy.
    #[must_use]
    pub const fn kind(&self) -> EnemyKind {
        self.kind
    }

    /// Remaining hit points.
    #[must_use]
    pub const fn hp(&self) -> f32 {
        self.hp
    }

    /// Hit points the enemy spawned with.
    #[must_use]
    pub const fn max_hp(&self) -> f32 {
        self.max_hp
    }

    /// Current world position.
    #[must_use]
    pub const fn position(&self) -> WorldPoint {
        self.position
    }

    /// Index of the route node the enemy is heading toward.
    #[must_use]
    pub const fn path_index(&self) -> usize {
        self.path_index
    }
}

/// Gold and experience owed for a kill.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KillReward {
    /// Gold credited to the player.
    pub gold: u32,
    /// Experience credited to the killing tower.
    pub exp: f32,
}

/// Owner of every live enemy, indexed for constant-time lookup.
#[derive(Debug)]
pub struct EnemyPopulation {
    enemies: Vec<Enemy>,
    index: HashMap<EnemyId, usize>,
    next_id: u32,
    catalog: EnemyCatalog,
    base_damage: u32,
}

impl EnemyPopulation {
    /// Creates an empty population.
    #[must_use]
    pub fn new(catalog: EnemyCatalog, base_damage: u32) -> Self {
        Self {
            enemies: Vec::new(),
            index: HashMap::new(),
            next_id: 0,
            catalog,
            base_damage,
        }
    }

    /// Spawns an enemy at the route entry, returning its identifier.
    ///
    /// Returns `None` when the grid has no route to walk.
    pub fn spawn(&mut self, kind: EnemyKind, grid: &Grid) -> Option<EnemyId> {
        let entry = *grid.path().first()?;
        let stats = self.catalog.stats(kind);
        let id = EnemyId::new(self.next_id);
        self.next_id += 1;
        let enemy = Enemy {
            id,
            kind,
            hp: stats.hp,
            max_hp: stats.hp,
            speed: stats.speed,
            position: grid.world_position(entry),
            path_index: 0,
            slow_factor: 1.0,
            slow_remaining: Duration::ZERO,
            active: true,
        };
        let _ = self.index.insert(id, self.enemies.len());
        self.enemies.push(enemy);
        Some(id)
    }

    /// Advances every active enemy by one tick.
    ///
    /// Expired slows clear, bosses roll their disable pulse into `pulses`,
    /// and enemies that arrive at the final route node damage the base and
    /// deactivate. Inactive slots are compacted at the end.
    pub fn update(
        &mut self,
        dt: Duration,
        grid: &Grid,
        player: &mut PlayerState,
        rng: &mut impl Rng,
        pulses: &mut Vec<DisablePulse>,
    ) {
        let path = grid.path();
        let last_index = path.len().saturating_sub(1);

        for enemy in self.enemies.iter_mut().filter(|enemy| enemy.active) {
            // Slow expiry runs before movement, so an expiring slow never
            // taxes the tick it ends in.
            if enemy.slow_remaining > Duration::ZERO {
                enemy.slow_remaining = enemy.slow_remaining.saturating_sub(dt);
                if enemy.slow_remaining == Duration::ZERO {
                    enemy.slow_factor = 1.0;
                }
            }

            if enemy.kind == EnemyKind::Behemoth && rng.gen_bool(BOSS_DISABLE_CHANCE) {
                pulses.push(DisablePulse {
                    center: enemy.position,
                    radius: BOSS_PULSE_RADIUS_CELLS * grid.cell_size(),
                    duration: BOSS_DISABLE_DURATION,
                });
            }

            let Some(&target_cell) = path.get(enemy.path_index) else {
                continue;
            };
            let target = grid.world_position(target_cell);
            let step = enemy.speed * enemy.slow_factor * dt.as_secs_f32();
            let (position, arrived) = enemy.position.advanced_toward(target, step);
            enemy.position = position;
            if !arrived {
                continue;
            }
            if enemy.path_index == last_index {
                player.take_damage(self.base_damage);
                enemy.active = false;
                log::debug!("enemy {} breached the base", enemy.id.get());
            } else {
                enemy.path_index += 1;
            }
        }

        self.compact();
    }

    /// Applies damage, deactivating the enemy and reporting rewards on a kill.
    ///
    /// Unknown or already inactive identifiers yield `None`, as do hits on an
    /// enemy that survives.
    pub fn deal_damage(&mut self, id: EnemyId, amount: f32) -> Option<KillReward> {
        let slot = *self.index.get(&id)?;
        let enemy = self.enemies.get_mut(slot)?;
        if !enemy.active {
            return None;
        }
        enemy.hp -= amount;
        if enemy.hp > 0.0 {
            return None;
        }
        enemy.active = false;
        let stats = self.catalog.stats(enemy.kind);
        Some(KillReward {
            gold: stats.gold_reward,
            exp: stats.exp_reward,
        })
    }

    /// Applies a movement slow to an enemy, replacing any active slow.
    pub fn apply_slow(&mut self, id: EnemyId, factor: f32, duration: Duration) {
        if let Some(&slot) = self.index.get(&id) {
            if let Some(enemy) = self.enemies.get_mut(slot) {
                if enemy.active {
                    enemy.slow_factor = factor;
                    enemy.slow_remaining = duration;
                }
            }
        }
    }

    /// Current position of an active enemy.
    #[must_use]
    pub fn position(&self, id: EnemyId) -> Option<WorldPoint> {
        self.get_active(id).map(Enemy::position)
    }

    /// Reports whether the identifier refers to a live, active enemy.
    #[must_use]
    pub fn is_active(&self, id: EnemyId) -> bool {
        self.get_active(id).is_some()
    }

    /// Iterates over every active enemy.
    pub fn iter_active(&self) -> impl Iterator<Item = &Enemy> {
        self.enemies.iter().filter(|enemy| enemy.active)
    }

    /// Reports whether no active enemy remains.
    #[must_use]
    pub fn is_cleared(&self) -> bool {
        self.iter_active().next().is_none()
    }

    fn get_active(&self, id: EnemyId) -> Option<&Enemy> {
        let slot = *self.index.get(&id)?;
        self.enemies.get(slot).filter(|enemy| enemy.active)
    }

    fn compact(&mut self) {
        if self.enemies.iter().all(|enemy| enemy.active) {
            return;
        }
        self.enemies.retain(|enemy| enemy.active);
        self.index.clear();
        for (slot, enemy) in self.enemies.iter().enumerate() {
            let _ = self.index.insert(enemy.id, slot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridfall_core::GridPos;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn corridor_grid() -> Grid {
        let layout = vec![
            vec![0, 0, 0, 0, 0],
            vec![1, 1, 1, 1, 1],
            vec![0, 0, 0, 0, 0],
        ];
        Grid::from_layout(&layout, 10.0).expect("grid")
    }

    fn catalog() -> EnemyCatalog {
        EnemyCatalog::standard()
    }

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(7)
    }

    #[test]
    fn spawned_enemy_starts_at_route_entry() {
        let grid = corridor_grid();
        let mut population = EnemyPopulation::new(catalog(), 10);
        let id = population.spawn(EnemyKind::Grunt, &grid).expect("spawn");
        assert_eq!(
            population.position(id),
            Some(grid.world_position(GridPos::new(0, 1)))
        );
    }

    #[test]
    fn enemy_walks_the_route_and_damages_the_base() {
        let grid = corridor_grid();
        let mut population = EnemyPopulation::new(catalog(), 10);
        let mut player = PlayerState::new(0, 100);
        let mut pulses = Vec::new();
        let mut rng = rng();
        let _ = population.spawn(EnemyKind::Sprinter, &grid).expect("spawn");
        let dt = Duration::from_millis(100);
        let mut ticks = 0;
        while !population.is_cleared() && ticks < 200 {
            population.update(dt, &grid, &mut player, &mut rng, &mut pulses);
            ticks += 1;
        }
        assert!(population.is_cleared());
        assert_eq!(player.hp(), 90);
        assert!(pulses.is_empty());
    }

    #[test]
    fn killed_enemy_yields_rewards_and_goes_inactive() {
        let grid = corridor_grid();
        let mut population = EnemyPopulation::new(catalog(), 10);
        let id = population.spawn(EnemyKind::Sprinter, &grid).expect("spawn");
        assert!(population.deal_damage(id, 10.0).is_none());
        let reward = population.deal_damage(id, 25.0).expect("kill");
        assert_eq!(reward, KillReward { gold: 5, exp: 8.0 });
        assert!(!population.is_active(id));
        assert!(population.deal_damage(id, 5.0).is_none());
    }

    #[test]
    fn slow_halves_progress_until_it_expires() {
        let grid = corridor_grid();
        let mut population = EnemyPopulation::new(catalog(), 10);
        let mut player = PlayerState::new(0, 100);
        let mut pulses = Vec::new();
        let mut rng = rng();
        let id = population.spawn(EnemyKind::Grunt, &grid).expect("spawn");
        let dt = Duration::from_millis(100);
        // First tick only clears the entry node the enemy spawned on.
        population.update(dt, &grid, &mut player, &mut rng, &mut pulses);
        population.apply_slow(id, 0.5, Duration::from_millis(200));
        // 100 px/s halved over 0.1 s moves 5 px along the segment.
        population.update(dt, &grid, &mut player, &mut rng, &mut pulses);
        let position = population.position(id).expect("active");
        assert!((position.x - 5.0).abs() < 1e-3);
        population.update(dt, &grid, &mut player, &mut rng, &mut pulses);
        let position = population.position(id).expect("active");
        assert!((position.x - 10.0).abs() < 1e-3);
    }

    #[test]
    fn slow_expires_before_the_movement_of_its_final_tick() {
        let grid = corridor_grid();
        let mut population = EnemyPopulation::new(catalog(), 10);
        let mut player = PlayerState::new(0, 100);
        let mut pulses = Vec::new();
        let mut rng = rng();
        let id = population.spawn(EnemyKind::Grunt, &grid).expect("spawn");
        let dt = Duration::from_millis(100);
        population.update(dt, &grid, &mut player, &mut rng, &mut pulses);
        // A slow lasting exactly one tick is gone before the next move, so
        // the enemy covers the full 10 px instead of a halved 5 px.
        population.apply_slow(id, 0.5, Duration::from_millis(100));
        population.update(dt, &grid, &mut player, &mut rng, &mut pulses);
        let position = population.position(id).expect("active");
        assert!((position.x - 10.0).abs() < 1e-3);
    }

    #[test]
    fn boss_emits_disable_pulses_over_time() {
        let grid = corridor_grid();
        let mut population = EnemyPopulation::new(catalog(), 10);
        let mut player = PlayerState::new(0, 10_000);
        let mut pulses = Vec::new();
        let mut rng = rng();
        let _ = population.spawn(EnemyKind::Behemoth, &grid).expect("spawn");
        // 1% per tick across 2000 ticks makes a pulse overwhelmingly likely.
        for _ in 0..2_000 {
            population.update(
                Duration::from_millis(1),
                &grid,
                &mut player,
                &mut rng,
                &mut pulses,
            );
        }
        assert!(!pulses.is_empty());
        let pulse = pulses[0];
        assert!((pulse.radius - 50.0).abs() < 1e-6);
        assert_eq!(pulse.duration, Duration::from_secs(5));
    }

    #[test]
    fn compaction_preserves_lookup_for_survivors() {
        let grid = corridor_grid();
        let mut population = EnemyPopulation::new(catalog(), 10);
        let mut player = PlayerState::new(0, 100);
        let mut pulses = Vec::new();
        let mut rng = rng();
        let first = population.spawn(EnemyKind::Grunt, &grid).expect("spawn");
        let second = population.spawn(EnemyKind::Grunt, &grid).expect("spawn");
        let _ = population.deal_damage(first, 1_000.0).expect("kill");
        population.update(
            Duration::from_millis(1),
            &grid,
            &mut player,
            &mut rng,
            &mut pulses,
        );
        assert!(!population.is_active(first));
        assert!(population.is_active(second));
        assert_eq!(population.iter_active().count(), 1);
    }
}
