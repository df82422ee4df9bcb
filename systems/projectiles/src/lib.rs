#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Projectile flight and hit resolution for the Gridfall simulation.
//!
//! Shots home on their target while it lives and fly to the last known
//! position once it dies, so damage lands positionally: whichever active
//! enemy stands closest to the impact point takes the hit. A shot whose
//! impact point is empty simply fizzles.

use std::time::Duration;

use gridfall_core::{EnemyId, ExperienceAward, PlayerState, ProjectileId, TowerId, WorldPoint};
use gridfall_system_enemies::EnemyPopulation;

/// Flight speed of every projectile in pixels per second.
pub const PROJECTILE_SPEED: f32 = 400.0;
/// Impact radius within which an enemy counts as hit, in pixels.
pub const HIT_RADIUS: f32 = 10.0;

/// Side effect a projectile applies to the enemy it hits.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HitEffect {
    /// Multiplies the victim's speed by `factor` for `duration`.
    Slow {
        /// Speed multiplier below 1.
        factor: f32,
        /// How long the slow lasts.
        duration: Duration,
    },
}

/// One projectile in flight.
#[derive(Clone, Copy, Debug)]
pub struct Projectile {
    id: ProjectileId,
    position: WorldPoint,
    aim: WorldPoint,
    target: EnemyId,
    damage: f32,
    effect: Option<HitEffect>,
    source: TowerId,
    active: bool,
}

impl Projectile {
    /// Identifier of the projectile.
    #[must_use]
    pub const fn id(&self) -> ProjectileId {
        self.id
    }

    /// Current world position.
    #[must_use]
    pub const fn position(&self) -> WorldPoint {
        self.position
    }

    /// Enemy the projectile was fired at.
    #[must_use]
    pub const fn target(&self) -> EnemyId {
        self.target
    }
}

/// Owner of every projectile in flight.
#[derive(Debug, Default)]
pub struct ProjectileVolley {
    projectiles: Vec<Projectile>,
    next_id: u32,
}

impl ProjectileVolley {
    /// Creates an empty volley.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Launches a projectile from `origin` at the given enemy.
    ///
    /// `aim` is the target's position at launch; it is refreshed every tick
    /// while the target remains alive.
    pub fn spawn(
        &mut self,
        origin: WorldPoint,
        target: EnemyId,
        aim: WorldPoint,
        damage: f32,
        effect: Option<HitEffect>,
        source: TowerId,
    ) -> ProjectileId {
        let id = ProjectileId::new(self.next_id);
        self.next_id += 1;
        self.projectiles.push(Projectile {
            id,
            position: origin,
            aim,
            target,
            damage,
            effect,
            source,
            active: true,
        });
        id
    }

    /// Advances every projectile and resolves impacts.
    ///
    /// Kill gold is credited to the player immediately; experience owed to
    /// the firing tower is appended to `awards` for the registry to apply.
    pub fn update(
        &mut self,
        dt: Duration,
        enemies: &mut EnemyPopulation,
        player: &mut PlayerState,
        awards: &mut Vec<ExperienceAward>,
    ) {
        let step = PROJECTILE_SPEED * dt.as_secs_f32();

        for slot in 0..self.projectiles.len() {
            let projectile = self.projectiles[slot];
            if !projectile.active {
                continue;
            }

            let aim = match enemies.position(projectile.target) {
                Some(position) => position,
                None => projectile.aim,
            };
            let (position, arrived) = projectile.position.advanced_toward(aim, step);
            {
                let stored = &mut self.projectiles[slot];
                stored.aim = aim;
                stored.position = position;
            }
            if !arrived {
                continue;
            }
            self.projectiles[slot].active = false;

            let Some(victim) = closest_enemy_within(enemies, position, HIT_RADIUS) else {
                continue;
            };
            if let Some(reward) = enemies.deal_damage(victim, projectile.damage) {
                player.add_gold(reward.gold);
                awards.push(ExperienceAward {
                    tower: projectile.source,
                    amount: reward.exp,
                });
                log::debug!(
                    "projectile {} killed enemy {}",
                    projectile.id.get(),
                    victim.get()
                );
            } else if let Some(HitEffect::Slow { factor, duration }) = projectile.effect {
                enemies.apply_slow(victim, factor, duration);
            }
        }

        self.projectiles.retain(|projectile| projectile.active);
    }

    /// Iterates over every projectile in flight.
    pub fn iter_active(&self) -> impl Iterator<Item = &Projectile> {
        self.projectiles.iter().filter(|projectile| projectile.active)
    }

    /// Number of projectiles currently in flight.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.projectiles.len()
    }
}

/// Finds the active enemy closest to `point` within `radius`.
///
/// Distance ties resolve toward the smaller identifier so impacts are
/// deterministic regardless of storage order.
fn closest_enemy_within(
    enemies: &EnemyPopulation,
    point: WorldPoint,
    radius: f32,
) -> Option<EnemyId> {
    enemies
        .iter_active()
        .filter_map(|enemy| {
            let distance = enemy.position().distance_to(point);
            (distance <= radius).then_some((distance, enemy.id()))
        })
        .min_by(|(da, ia), (db, ib)| da.total_cmp(db).then_with(|| ia.cmp(ib)))
        .map(|(_, id)| id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridfall_core::config::EnemyCatalog;
    use gridfall_core::EnemyKind;
    use gridfall_world::Grid;
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

    fn population(grid: &Grid, kind: EnemyKind) -> (EnemyPopulation, EnemyId) {
        let mut population = EnemyPopulation::new(EnemyCatalog::standard(), 10);
        let id = population.spawn(kind, grid).expect("spawn");
        (population, id)
    }

    #[test]
    fn projectile_tracks_and_kills_its_target() {
        let grid = corridor_grid();
        let (mut enemies, target) = population(&grid, EnemyKind::Sprinter);
        let mut player = PlayerState::new(0, 100);
        let mut awards = Vec::new();
        let mut volley = ProjectileVolley::new();
        let aim = enemies.position(target).expect("position");
        let _ = volley.spawn(
            WorldPoint::new(100.0, 10.0),
            target,
            aim,
            100.0,
            None,
            TowerId::new(1),
        );
        for _ in 0..20 {
            volley.update(Duration::from_millis(50), &mut enemies, &mut player, &mut awards);
        }
        assert!(!enemies.is_active(target));
        assert_eq!(player.gold(), 5);
        assert_eq!(awards.len(), 1);
        assert_eq!(awards[0].tower, TowerId::new(1));
        assert!((awards[0].amount - 8.0).abs() < 1e-6);
        assert_eq!(volley.in_flight(), 0);
    }

    #[test]
    fn stale_shot_hits_whoever_stands_at_the_impact_point() {
        let grid = corridor_grid();
        let mut enemies = EnemyPopulation::new(EnemyCatalog::standard(), 10);
        let doomed = enemies.spawn(EnemyKind::Sprinter, &grid).expect("spawn");
        let bystander = enemies.spawn(EnemyKind::Grunt, &grid).expect("spawn");
        let mut player = PlayerState::new(0, 100);
        let mut awards = Vec::new();
        let mut volley = ProjectileVolley::new();
        let aim = enemies.position(doomed).expect("position");
        let _ = volley.spawn(
            WorldPoint::new(200.0, 10.0),
            doomed,
            aim,
            50.0,
            None,
            TowerId::new(1),
        );
        // The original target dies before the shot lands.
        let _ = enemies.deal_damage(doomed, 1_000.0).expect("kill");
        for _ in 0..20 {
            volley.update(Duration::from_millis(50), &mut enemies, &mut player, &mut awards);
        }
        // The bystander shares the spawn cell and absorbs the stale shot.
        let hp = enemies
            .iter_active()
            .find(|enemy| enemy.id() == bystander)
            .map(|enemy| enemy.hp())
            .expect("bystander alive");
        assert!((hp - 50.0).abs() < 1e-4);
    }

    #[test]
    fn missed_shot_fizzles_without_damage() {
        let grid = corridor_grid();
        let (mut enemies, target) = population(&grid, EnemyKind::Grunt);
        let mut player = PlayerState::new(0, 100);
        let mut awards = Vec::new();
        let mut volley = ProjectileVolley::new();
        // Aim far from any enemy and kill the target so the aim goes stale.
        let _ = volley.spawn(
            WorldPoint::new(0.0, 0.0),
            target,
            WorldPoint::new(300.0, 300.0),
            50.0,
            None,
            TowerId::new(1),
        );
        let _ = enemies.deal_damage(target, 1_000.0).expect("kill");
        for _ in 0..30 {
            volley.update(Duration::from_millis(50), &mut enemies, &mut player, &mut awards);
        }
        assert_eq!(player.gold(), 0);
        assert!(awards.is_empty());
        assert_eq!(volley.in_flight(), 0);
    }

    #[test]
    fn slow_effect_lands_on_surviving_victims() {
        let grid = corridor_grid();
        let (mut enemies, target) = population(&grid, EnemyKind::Brute);
        let mut player = PlayerState::new(0, 100);
        let mut awards = Vec::new();
        let mut pulses = Vec::new();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut volley = ProjectileVolley::new();
        let aim = enemies.position(target).expect("position");
        let _ = volley.spawn(
            WorldPoint::new(10.0, 10.0),
            target,
            aim,
            5.0,
            Some(HitEffect::Slow {
                factor: 0.5,
                duration: Duration::from_secs(2),
            }),
            TowerId::new(1),
        );
        volley.update(Duration::from_millis(100), &mut enemies, &mut player, &mut awards);
        assert!(enemies.is_active(target));
        // Clear the entry node, then measure one slowed segment tick.
        enemies.update(
            Duration::from_millis(100),
            &grid,
            &mut player,
            &mut rng,
            &mut pulses,
        );
        enemies.update(
            Duration::from_millis(100),
            &grid,
            &mut player,
            &mut rng,
            &mut pulses,
        );
        // Brute at 50 px/s halved covers 2.5 px in 0.1 s.
        let position = enemies.position(target).expect("active");
        assert!((position.x - 2.5).abs() < 1e-3);
    }
}
