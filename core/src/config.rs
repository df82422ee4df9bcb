//! Externally supplied configuration value tables.
//!
//! Everything in this module is plain data: the simulation consumes the
//! values but never loads, persists, or mutates them. The `standard`
//! constructors provide the tuning the engine ships with; an adapter may
//! deserialize replacement tables instead.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{EnemyKind, TowerKind};

/// Cooldown assigned to support towers so the firing gate never opens.
pub const SUPPORT_COOLDOWN: Duration = Duration::from_secs(999_999);

/// Base combat statistics for one tower archetype.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TowerStats {
    /// Targeting radius measured in grid cells.
    pub range_cells: f32,
    /// Damage applied per projectile hit.
    pub damage: f32,
    /// Minimum time between shots before buffs apply.
    pub cooldown: Duration,
    /// Gold cost of the first tower of this kind.
    pub base_cost: u32,
}

/// Stat table and pricing rules for every tower archetype.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TowerCatalog {
    entries: [TowerStats; 7],
    /// Fraction of the total investment refunded when a tower is sold.
    pub sell_ratio: f32,
    /// Cost added per already-built harvester when pricing the next one.
    pub harvester_increment: u32,
}

impl TowerCatalog {
    /// Builds the catalog the engine ships with.
    #[must_use]
    pub fn standard() -> Self {
        let entries = [
            // Turret
            TowerStats {
                range_cells: 3.0,
                damage: 20.0,
                cooldown: Duration::from_millis(500),
                base_cost: 100,
            },
            // Bastion
            TowerStats {
                range_cells: 2.0,
                damage: 10.0,
                cooldown: Duration::from_millis(1_000),
                base_cost: 200,
            },
            // Sniper
            TowerStats {
                range_cells: 6.0,
                damage: 100.0,
                cooldown: Duration::from_millis(2_000),
                base_cost: 300,
            },
            // Rapid
            TowerStats {
                range_cells: 3.0,
                damage: 5.0,
                cooldown: Duration::from_millis(200),
                base_cost: 150,
            },
            // Harvester
            TowerStats {
                range_cells: 0.0,
                damage: 0.0,
                cooldown: SUPPORT_COOLDOWN,
                base_cost: 250,
            },
            // Overseer
            TowerStats {
                range_cells: 2.0,
                damage: 0.0,
                cooldown: SUPPORT_COOLDOWN,
                base_cost: 300,
            },
            // Surveyor
            TowerStats {
                range_cells: 2.0,
                damage: 0.0,
                cooldown: SUPPORT_COOLDOWN,
                base_cost: 350,
            },
        ];
        Self {
            entries,
            sell_ratio: 0.7,
            harvester_increment: 100,
        }
    }

    /// Base statistics for the provided tower kind.
    #[must_use]
    pub fn stats(&self, kind: TowerKind) -> &TowerStats {
        &self.entries[kind_index(kind)]
    }
}

fn kind_index(kind: TowerKind) -> usize {
    match kind {
        TowerKind::Turret => 0,
        TowerKind::Bastion => 1,
        TowerKind::Sniper => 2,
        TowerKind::Rapid => 3,
        TowerKind::Harvester => 4,
        TowerKind::Overseer => 5,
        TowerKind::Surveyor => 6,
    }
}

/// Magnitudes, radii, and caps for the buff layer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BuffTuning {
    /// Cooldown reduction per overseer stack (0.2 = 20% faster).
    pub attack_speed_bonus: f32,
    /// Range extension per surveyor stack, in cells.
    pub range_bonus_cells: f32,
    /// Maximum number of concurrent sources counted per stackable kind.
    pub max_stacks: usize,
    /// Aura radius of support towers, in cells.
    pub aura_radius_cells: f32,
    /// Gold generated per second per harvester.
    pub income_per_second: f32,
}

impl BuffTuning {
    /// Builds the buff tuning the engine ships with.
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            attack_speed_bonus: 0.2,
            range_bonus_cells: 1.0,
            max_stacks: 2,
            aura_radius_cells: 2.0,
            income_per_second: 5.0,
        }
    }
}

/// Leveling curve parameters shared by every tower.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExperienceCurve {
    /// Experience required to leave level 1.
    pub base_requirement: f32,
    /// Multiplier applied to the requirement per level.
    pub scaling: f32,
    /// Highest attainable level.
    pub max_level: u32,
    /// Damage multiplier per level (greater than 1).
    pub damage_growth: f32,
    /// Range multiplier per level (greater than 1).
    pub range_growth: f32,
    /// Cooldown multiplier per level (less than 1, so towers fire faster).
    pub cooldown_growth: f32,
}

impl ExperienceCurve {
    /// Builds the leveling curve the engine ships with.
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            base_requirement: 100.0,
            scaling: 1.5,
            max_level: 10,
            damage_growth: 1.05,
            range_growth: 1.02,
            cooldown_growth: 0.98,
        }
    }
}

/// Base statistics and kill rewards for one enemy archetype.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyStats {
    /// Hit points at spawn.
    pub hp: f32,
    /// Movement speed in pixels per second.
    pub speed: f32,
    /// Gold credited to the player on a kill.
    pub gold_reward: u32,
    /// Experience credited to the killing tower.
    pub exp_reward: f32,
}

/// Stat table for every enemy archetype.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyCatalog {
    entries: [EnemyStats; 4],
}

impl EnemyCatalog {
    /// Builds the catalog the engine ships with.
    #[must_use]
    pub const fn standard() -> Self {
        let entries = [
            // Grunt
            EnemyStats {
                hp: 100.0,
                speed: 100.0,
                gold_reward: 10,
                exp_reward: 15.0,
            },
            // Brute
            EnemyStats {
                hp: 300.0,
                speed: 50.0,
                gold_reward: 25,
                exp_reward: 40.0,
            },
            // Sprinter
            EnemyStats {
                hp: 30.0,
                speed: 200.0,
                gold_reward: 5,
                exp_reward: 8.0,
            },
            // Behemoth
            EnemyStats {
                hp: 1_000.0,
                speed: 40.0,
                gold_reward: 200,
                exp_reward: 300.0,
            },
        ];
        Self { entries }
    }

    /// Base statistics for the provided enemy kind.
    #[must_use]
    pub fn stats(&self, kind: EnemyKind) -> &EnemyStats {
        let index = match kind {
            EnemyKind::Grunt => 0,
            EnemyKind::Brute => 1,
            EnemyKind::Sprinter => 2,
            EnemyKind::Behemoth => 3,
        };
        &self.entries[index]
    }
}

/// A burst entry within a [`SpawnPolicy::Burst`] schedule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurstSpec {
    /// Offset from wave start at which the burst fires.
    pub at: Duration,
    /// Number of enemies released by the burst.
    pub count: u32,
}

/// Rule governing when enemies of a group appear during a wave.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SpawnPolicy {
    /// One spawn every fixed interval from wave start.
    Interval {
        /// Time between consecutive spawns.
        every: Duration,
    },
    /// Fixed counts released when scheduled burst times are crossed.
    Burst {
        /// Scheduled bursts in ascending time order.
        bursts: Vec<BurstSpec>,
    },
    /// One spawn at each explicit timestamp.
    Custom {
        /// Spawn offsets from wave start.
        times: Vec<Duration>,
    },
    /// Spawn times drawn once at wave load from random gaps.
    Random {
        /// Smallest gap between consecutive spawns.
        min_gap: Duration,
        /// Largest gap between consecutive spawns.
        max_gap: Duration,
        /// Window the whole group must spawn within.
        duration: Duration,
    },
}

/// One enemy group inside a wave definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyGroup {
    /// Archetype spawned by this group.
    pub kind: EnemyKind,
    /// Total number of enemies the group releases.
    pub count: u32,
    /// Schedule the group spawns on.
    pub policy: SpawnPolicy,
}

/// Gold rewards configured for clearing a wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveRewards {
    /// Gold granted unconditionally on completion.
    pub base_gold: u32,
    /// Maximum bonus the adapter may grant for a fast clear.
    pub bonus_gold: u32,
}

/// Definition of a single wave.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WavePlan {
    /// Enemy groups released during the wave.
    pub enemies: Vec<EnemyGroup>,
    /// Delay between loading the wave and the first spawn evaluation.
    pub prep_delay: Duration,
    /// Transition timeout handed to the adapter; not enforced internally.
    pub timeout: Duration,
    /// Rewards granted on completion.
    pub rewards: WaveRewards,
}

/// Complete definition of a level: map, waves, and starting resources.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelPlan {
    /// Cell edge length in pixels.
    pub cell_size: f32,
    /// Walkability grid: 0 = empty, 1 = path, 2 = blocked.
    pub layout: Vec<Vec<u8>>,
    /// Ordered wave definitions.
    pub waves: Vec<WavePlan>,
    /// Gold the player starts with.
    pub starting_gold: u32,
    /// Base hit points the player starts with.
    pub starting_hp: u32,
    /// Damage the base takes per enemy breach.
    pub base_damage: u32,
    /// A heal is granted every this many completed waves.
    pub heal_interval: u32,
    /// Hit points restored by the periodic heal.
    pub heal_amount: u32,
}

impl LevelPlan {
    /// Builds the 20x12 demonstration level the engine ships with.
    #[must_use]
    pub fn standard() -> Self {
        let mut layout = vec![vec![0_u8; 20]; 12];
        let route: [(usize, usize); 26] = [
            (0, 2), (1, 2), (2, 2), (3, 2), (4, 2),
            (4, 3), (4, 4),
            (5, 4), (6, 4), (7, 4), (8, 4), (9, 4),
            (9, 5), (9, 6),
            (10, 6), (11, 6), (12, 6),
            (12, 7), (12, 8),
            (13, 8), (14, 8), (15, 8), (16, 8), (17, 8), (18, 8), (19, 8),
        ];
        for (x, y) in route {
            layout[y][x] = 1;
        }
        layout[6][6] = 2;
        layout[6][7] = 2;

        let waves = vec![
            WavePlan {
                enemies: vec![EnemyGroup {
                    kind: EnemyKind::Grunt,
                    count: 6,
                    policy: SpawnPolicy::Interval {
                        every: Duration::from_millis(1_000),
                    },
                }],
                prep_delay: Duration::from_secs(2),
                timeout: Duration::from_secs(60),
                rewards: WaveRewards {
                    base_gold: 50,
                    bonus_gold: 25,
                },
            },
            WavePlan {
                enemies: vec![
                    EnemyGroup {
                        kind: EnemyKind::Grunt,
                        count: 8,
                        policy: SpawnPolicy::Interval {
                            every: Duration::from_millis(800),
                        },
                    },
                    EnemyGroup {
                        kind: EnemyKind::Sprinter,
                        count: 4,
                        policy: SpawnPolicy::Burst {
                            bursts: vec![
                                BurstSpec {
                                    at: Duration::from_secs(3),
                                    count: 2,
                                },
                                BurstSpec {
                                    at: Duration::from_secs(6),
                                    count: 2,
                                },
                            ],
                        },
                    },
                ],
                prep_delay: Duration::from_secs(3),
                timeout: Duration::from_secs(75),
                rewards: WaveRewards {
                    base_gold: 75,
                    bonus_gold: 40,
                },
            },
            WavePlan {
                enemies: vec![
                    EnemyGroup {
                        kind: EnemyKind::Brute,
                        count: 3,
                        policy: SpawnPolicy::Custom {
                            times: vec![
                                Duration::from_secs(1),
                                Duration::from_secs(4),
                                Duration::from_secs(8),
                            ],
                        },
                    },
                    EnemyGroup {
                        kind: EnemyKind::Sprinter,
                        count: 6,
                        policy: SpawnPolicy::Random {
                            min_gap: Duration::from_millis(500),
                            max_gap: Duration::from_millis(1_500),
                            duration: Duration::from_secs(10),
                        },
                    },
                ],
                prep_delay: Duration::from_secs(3),
                timeout: Duration::from_secs(90),
                rewards: WaveRewards {
                    base_gold: 100,
                    bonus_gold: 60,
                },
            },
            WavePlan {
                enemies: vec![EnemyGroup {
                    kind: EnemyKind::Behemoth,
                    count: 1,
                    policy: SpawnPolicy::Burst {
                        bursts: vec![BurstSpec {
                            at: Duration::from_secs(2),
                            count: 1,
                        }],
                    },
                }],
                prep_delay: Duration::from_secs(4),
                timeout: Duration::from_secs(120),
                rewards: WaveRewards {
                    base_gold: 200,
                    bonus_gold: 100,
                },
            },
        ];

        Self {
            cell_size: 64.0,
            layout,
            waves,
            starting_gold: 500,
            starting_hp: 100,
            base_damage: 10,
            heal_interval: 5,
            heal_amount: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_stats_match_archetype_roles() {
        let catalog = TowerCatalog::standard();
        assert!(catalog.stats(TowerKind::Sniper).range_cells > catalog.stats(TowerKind::Turret).range_cells);
        assert!(catalog.stats(TowerKind::Rapid).cooldown < catalog.stats(TowerKind::Turret).cooldown);
        for kind in TowerKind::ALL {
            if kind.is_support() {
                assert_eq!(catalog.stats(kind).damage, 0.0);
                assert_eq!(catalog.stats(kind).cooldown, SUPPORT_COOLDOWN);
            }
        }
    }

    #[test]
    fn enemy_catalog_orders_speed_and_bulk() {
        let catalog = EnemyCatalog::standard();
        assert!(catalog.stats(EnemyKind::Sprinter).speed > catalog.stats(EnemyKind::Grunt).speed);
        assert!(catalog.stats(EnemyKind::Brute).hp > catalog.stats(EnemyKind::Grunt).hp);
        assert!(catalog.stats(EnemyKind::Behemoth).hp > catalog.stats(EnemyKind::Brute).hp);
    }

    #[test]
    fn standard_level_layout_is_rectangular() {
        let plan = LevelPlan::standard();
        assert_eq!(plan.layout.len(), 12);
        for row in &plan.layout {
            assert_eq!(row.len(), 20);
        }
        assert_eq!(plan.layout[2][0], 1);
        assert_eq!(plan.layout[8][19], 1);
    }

    #[test]
    fn level_plan_round_trips_through_bincode() {
        let plan = LevelPlan::standard();
        let bytes = bincode::serialize(&plan).expect("serialize");
        let restored: LevelPlan = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(restored, plan);
    }
}
