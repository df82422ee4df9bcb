#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave sequencing and enemy spawn scheduling for the Gridfall simulation.
//!
//! The scheduler walks the level's wave list, releases enemies on each
//! group's spawn policy, and declares a wave complete once every enemy has
//! spawned and none remains active. It then parks in a transition phase and
//! waits for the driving adapter to call back; the configured transition
//! timeout is reported outward but never enforced here.
//!
//! Random spawn schedules are resolved once at wave load from a ChaCha
//! stream seeded by hashing the session seed with the wave index, so replays
//! with the same seed produce identical waves.

use std::time::Duration;

use gridfall_core::{
    config::{EnemyGroup, LevelPlan, SpawnPolicy, WavePlan},
    EnemyKind, PlayerState, WaveSignal,
};
use gridfall_system_enemies::EnemyPopulation;
use gridfall_world::Grid;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};

/// Phase the scheduler is currently in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WavePhase {
    /// No wave loaded yet; waiting for [`WaveScheduler::start`].
    Idle,
    /// A wave is loaded and counting down its preparation delay.
    Preparing {
        /// Time left before the wave goes live.
        remaining: Duration,
    },
    /// Enemies are spawning or still alive on the field.
    Active,
    /// The wave was cleared; waiting for the adapter to resume.
    Transition,
    /// Every wave has been cleared.
    LevelComplete,
}

/// Spawn bookkeeping for one enemy group of the active wave.
#[derive(Clone, Debug)]
struct SpawnTracker {
    kind: EnemyKind,
    total: u32,
    spawned: u32,
    policy: SpawnPolicy,
    // Spawn times drawn at wave load; only used by the random policy.
    resolved_times: Vec<Duration>,
}

impl SpawnTracker {
    fn from_group(group: &EnemyGroup, rng: &mut ChaCha8Rng) -> Self {
        let resolved_times = match &group.policy {
            SpawnPolicy::Random {
                min_gap,
                max_gap,
                duration,
            } => generate_random_spawn_times(rng, group.count, *min_gap, *max_gap, *duration),
            _ => Vec::new(),
        };
        Self {
            kind: group.kind,
            total: group.count,
            spawned: 0,
            policy: group.policy.clone(),
            resolved_times,
        }
    }

    /// How many enemies of this group should exist by `elapsed`.
    fn due_count(&self, elapsed: Duration) -> u32 {
        let due = match &self.policy {
            SpawnPolicy::Interval { every } => {
                if every.is_zero() {
                    self.total
                } else {
                    (elapsed.as_secs_f64() / every.as_secs_f64()).floor() as u32
                }
            }
            SpawnPolicy::Burst { bursts } => bursts
                .iter()
                .filter(|burst| burst.at <= elapsed)
                .map(|burst| burst.count)
                .sum(),
            SpawnPolicy::Custom { times } => {
                times.iter().filter(|&&time| time <= elapsed).count() as u32
            }
            SpawnPolicy::Random { .. } => self
                .resolved_times
                .iter()
                .filter(|&&time| time <= elapsed)
                .count() as u32,
        };
        due.min(self.total)
    }

    fn is_exhausted(&self) -> bool {
        self.spawned >= self.total
    }
}

/// Sequencer driving the level's waves against the enemy population.
#[derive(Debug)]
pub struct WaveScheduler {
    waves: Vec<WavePlan>,
    heal_interval: u32,
    heal_amount: u32,
    wave_index: usize,
    phase: WavePhase,
    elapsed: Duration,
    trackers: Vec<SpawnTracker>,
    seed: u64,
}

impl WaveScheduler {
    /// Creates a scheduler for the level's waves, seeded for this session.
    #[must_use]
    pub fn new(plan: &LevelPlan, seed: u64) -> Self {
        Self {
            waves: plan.waves.clone(),
            heal_interval: plan.heal_interval,
            heal_amount: plan.heal_amount,
            wave_index: 0,
            phase: WavePhase::Idle,
            elapsed: Duration::ZERO,
            trackers: Vec::new(),
            seed,
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> WavePhase {
        self.phase
    }

    /// One-based number of the loaded wave.
    #[must_use]
    pub fn wave_number(&self) -> u32 {
        self.wave_index as u32 + 1
    }

    /// Loads the first wave; a no-op unless the scheduler is idle.
    pub fn start(&mut self, player: &mut PlayerState, signals: &mut Vec<WaveSignal>) {
        if self.phase == WavePhase::Idle {
            self.load_wave(player, signals);
        }
    }

    /// Resumes after a transition, granting the adapter's bonus gold first.
    ///
    /// Ignored outside the transition phase, so a late or duplicate callback
    /// cannot skip a wave.
    pub fn start_next_wave(
        &mut self,
        bonus_gold: u32,
        player: &mut PlayerState,
        signals: &mut Vec<WaveSignal>,
    ) {
        if self.phase != WavePhase::Transition {
            return;
        }
        player.add_gold(bonus_gold);
        self.wave_index += 1;
        self.load_wave(player, signals);
    }

    /// Advances the scheduler by one tick, spawning whatever is due.
    pub fn update(
        &mut self,
        dt: Duration,
        grid: &Grid,
        enemies: &mut EnemyPopulation,
        player: &mut PlayerState,
        signals: &mut Vec<WaveSignal>,
    ) {
        match self.phase {
            WavePhase::Idle | WavePhase::Transition | WavePhase::LevelComplete => {}
            WavePhase::Preparing { remaining } => {
                let remaining = remaining.saturating_sub(dt);
                if remaining.is_zero() {
                    self.phase = WavePhase::Active;
                    self.elapsed = Duration::ZERO;
                    signals.push(WaveSignal::WaveStarted {
                        wave: self.wave_number(),
                    });
                    log::info!("wave {} started", self.wave_number());
                } else {
                    self.phase = WavePhase::Preparing { remaining };
                }
            }
            WavePhase::Active => {
                self.elapsed += dt;
                for tracker in &mut self.trackers {
                    let due = tracker.due_count(self.elapsed);
                    while tracker.spawned < due {
                        tracker.spawned += 1;
                        if enemies.spawn(tracker.kind, grid).is_none() {
                            log::warn!("spawn of {:?} failed, no route", tracker.kind);
                        }
                    }
                }
                let exhausted = self.trackers.iter().all(SpawnTracker::is_exhausted);
                if exhausted && enemies.is_cleared() {
                    self.complete_wave(player, signals);
                }
            }
        }
    }

    fn complete_wave(&mut self, player: &mut PlayerState, signals: &mut Vec<WaveSignal>) {
        let wave = self.wave_number();
        let plan = &self.waves[self.wave_index];
        player.add_gold(plan.rewards.base_gold);
        if self.heal_interval > 0 && wave % self.heal_interval == 0 {
            player.heal(self.heal_amount);
        }
        self.phase = WavePhase::Transition;
        signals.push(WaveSignal::Transition {
            wave,
            rewards: plan.rewards,
            timeout: plan.timeout,
        });
        log::info!("wave {wave} cleared");
    }

    fn load_wave(&mut self, player: &mut PlayerState, signals: &mut Vec<WaveSignal>) {
        let Some(plan) = self.waves.get(self.wave_index) else {
            self.phase = WavePhase::LevelComplete;
            player.set_victory();
            signals.push(WaveSignal::LevelComplete);
            log::info!("all waves cleared");
            return;
        };
        let mut rng = ChaCha8Rng::from_seed(wave_seed(self.seed, self.wave_index));
        self.trackers = plan
            .enemies
            .iter()
            .map(|group| SpawnTracker::from_group(group, &mut rng))
            .collect();
        self.elapsed = Duration::ZERO;
        self.phase = WavePhase::Preparing {
            remaining: plan.prep_delay,
        };
        player.set_wave(self.wave_number());
    }
}

/// Derives a per-wave RNG seed from the session seed and wave index.
fn wave_seed(seed: u64, wave_index: usize) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(seed.to_le_bytes());
    hasher.update((wave_index as u64).to_le_bytes());
    hasher.finalize().into()
}

/// Draws `count` ascending spawn times from random gaps.
///
/// Gaps accumulate from zero; when the accumulated time overruns the window
/// the remaining spawns fall back to evenly spaced slots inside it, so every
/// enemy always spawns within `duration`.
fn generate_random_spawn_times(
    rng: &mut ChaCha8Rng,
    count: u32,
    min_gap: Duration,
    max_gap: Duration,
    duration: Duration,
) -> Vec<Duration> {
    let mut times = Vec::with_capacity(count as usize);
    let mut current = Duration::ZERO;
    for i in 0..count {
        let gap = if max_gap > min_gap {
            let span = (max_gap - min_gap).as_secs_f64();
            min_gap + Duration::from_secs_f64(rng.gen::<f64>() * span)
        } else {
            min_gap
        };
        current += gap;
        if current > duration {
            current = duration.mul_f64((i + 1) as f64 / count as f64);
        }
        times.push(current);
    }
    times.sort_unstable();
    times
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridfall_core::config::{BurstSpec, EnemyCatalog, WaveRewards};

    fn corridor_grid() -> Grid {
        let layout = vec![
            vec![0, 0, 0],
            vec![1, 1, 1],
            vec![0, 0, 0],
        ];
        Grid::from_layout(&layout, 10.0).expect("grid")
    }

    fn single_wave_plan(policy: SpawnPolicy, count: u32) -> LevelPlan {
        LevelPlan {
            cell_size: 10.0,
            layout: vec![
                vec![0, 0, 0],
                vec![1, 1, 1],
                vec![0, 0, 0],
            ],
            waves: vec![WavePlan {
                enemies: vec![EnemyGroup {
                    kind: EnemyKind::Grunt,
                    count,
                    policy,
                }],
                prep_delay: Duration::from_millis(100),
                timeout: Duration::from_secs(30),
                rewards: WaveRewards {
                    base_gold: 50,
                    bonus_gold: 20,
                },
            }],
            starting_gold: 100,
            starting_hp: 100,
            base_damage: 10,
            heal_interval: 1,
            heal_amount: 5,
        }
    }

    fn kill_all(enemies: &mut EnemyPopulation) {
        let ids: Vec<_> = enemies.iter_active().map(|enemy| enemy.id()).collect();
        for id in ids {
            let _ = enemies.deal_damage(id, 1_000_000.0);
        }
    }

    #[test]
    fn random_spawn_times_stay_inside_the_window() {
        let mut rng = ChaCha8Rng::from_seed(wave_seed(42, 0));
        let times = generate_random_spawn_times(
            &mut rng,
            10,
            Duration::from_millis(100),
            Duration::from_millis(400),
            Duration::from_secs(2),
        );
        assert_eq!(times.len(), 10);
        assert!(times.windows(2).all(|pair| pair[0] <= pair[1]));
        assert!(times.iter().all(|&time| time <= Duration::from_secs(2)));
    }

    #[test]
    fn random_spawn_times_replay_identically_for_a_seed() {
        let draw = || {
            let mut rng = ChaCha8Rng::from_seed(wave_seed(42, 3));
            generate_random_spawn_times(
                &mut rng,
                6,
                Duration::from_millis(200),
                Duration::from_millis(900),
                Duration::from_secs(5),
            )
        };
        assert_eq!(draw(), draw());
        let mut other = ChaCha8Rng::from_seed(wave_seed(43, 3));
        let different = generate_random_spawn_times(
            &mut other,
            6,
            Duration::from_millis(200),
            Duration::from_millis(900),
            Duration::from_secs(5),
        );
        assert_ne!(draw(), different);
    }

    #[test]
    fn interval_policy_releases_one_spawn_per_period() {
        let tracker = SpawnTracker {
            kind: EnemyKind::Grunt,
            total: 5,
            spawned: 0,
            policy: SpawnPolicy::Interval {
                every: Duration::from_secs(1),
            },
            resolved_times: Vec::new(),
        };
        assert_eq!(tracker.due_count(Duration::from_millis(900)), 0);
        assert_eq!(tracker.due_count(Duration::from_secs(1)), 1);
        assert_eq!(tracker.due_count(Duration::from_millis(3_500)), 3);
        assert_eq!(tracker.due_count(Duration::from_secs(60)), 5);
    }

    #[test]
    fn burst_policy_releases_whole_bursts_when_crossed() {
        let tracker = SpawnTracker {
            kind: EnemyKind::Sprinter,
            total: 4,
            spawned: 0,
            policy: SpawnPolicy::Burst {
                bursts: vec![
                    BurstSpec {
                        at: Duration::from_secs(1),
                        count: 2,
                    },
                    BurstSpec {
                        at: Duration::from_secs(3),
                        count: 2,
                    },
                ],
            },
            resolved_times: Vec::new(),
        };
        assert_eq!(tracker.due_count(Duration::from_millis(500)), 0);
        assert_eq!(tracker.due_count(Duration::from_secs(1)), 2);
        assert_eq!(tracker.due_count(Duration::from_secs(5)), 4);
    }

    #[test]
    fn wave_completes_only_after_the_field_is_cleared() {
        let plan = single_wave_plan(
            SpawnPolicy::Interval {
                every: Duration::from_millis(100),
            },
            2,
        );
        let grid = corridor_grid();
        let mut scheduler = WaveScheduler::new(&plan, 1);
        let mut enemies = EnemyPopulation::new(EnemyCatalog::standard(), plan.base_damage);
        let mut player = PlayerState::new(plan.starting_gold, plan.starting_hp);
        let mut signals = Vec::new();
        scheduler.start(&mut player, &mut signals);
        assert_eq!(player.wave(), 1);

        let dt = Duration::from_millis(100);
        // Preparation tick, then two spawn ticks.
        scheduler.update(dt, &grid, &mut enemies, &mut player, &mut signals);
        assert_eq!(scheduler.phase(), WavePhase::Active);
        scheduler.update(dt, &grid, &mut enemies, &mut player, &mut signals);
        scheduler.update(dt, &grid, &mut enemies, &mut player, &mut signals);
        assert_eq!(enemies.iter_active().count(), 2);

        // All spawned but still alive: the wave must stay active.
        scheduler.update(dt, &grid, &mut enemies, &mut player, &mut signals);
        assert_eq!(scheduler.phase(), WavePhase::Active);

        kill_all(&mut enemies);
        scheduler.update(dt, &grid, &mut enemies, &mut player, &mut signals);
        assert_eq!(scheduler.phase(), WavePhase::Transition);
        assert!(signals.iter().any(|signal| matches!(
            signal,
            WaveSignal::Transition { wave: 1, .. }
        )));
        // Base reward landed; heal interval 1 heals an undamaged base by 0.
        assert_eq!(player.gold(), 150);
    }

    #[test]
    fn finishing_the_last_wave_declares_victory() {
        let plan = single_wave_plan(
            SpawnPolicy::Custom {
                times: vec![Duration::ZERO],
            },
            1,
        );
        let grid = corridor_grid();
        let mut scheduler = WaveScheduler::new(&plan, 1);
        let mut enemies = EnemyPopulation::new(EnemyCatalog::standard(), plan.base_damage);
        let mut player = PlayerState::new(0, 100);
        let mut signals = Vec::new();
        scheduler.start(&mut player, &mut signals);

        let dt = Duration::from_millis(100);
        scheduler.update(dt, &grid, &mut enemies, &mut player, &mut signals);
        scheduler.update(dt, &grid, &mut enemies, &mut player, &mut signals);
        kill_all(&mut enemies);
        scheduler.update(dt, &grid, &mut enemies, &mut player, &mut signals);
        assert_eq!(scheduler.phase(), WavePhase::Transition);

        scheduler.start_next_wave(20, &mut player, &mut signals);
        assert_eq!(scheduler.phase(), WavePhase::LevelComplete);
        assert!(player.is_victorious());
        assert_eq!(player.gold(), 70);
        assert!(signals.iter().any(|signal| matches!(signal, WaveSignal::LevelComplete)));
    }

    #[test]
    fn resume_callback_is_ignored_outside_transition() {
        let plan = single_wave_plan(
            SpawnPolicy::Interval {
                every: Duration::from_secs(1),
            },
            1,
        );
        let mut scheduler = WaveScheduler::new(&plan, 1);
        let mut player = PlayerState::new(0, 100);
        let mut signals = Vec::new();
        scheduler.start_next_wave(500, &mut player, &mut signals);
        assert_eq!(scheduler.phase(), WavePhase::Idle);
        assert_eq!(player.gold(), 0);
    }

    #[test]
    fn periodic_heal_restores_the_base() {
        let plan = single_wave_plan(
            SpawnPolicy::Custom {
                times: vec![Duration::ZERO],
            },
            1,
        );
        let grid = corridor_grid();
        let mut scheduler = WaveScheduler::new(&plan, 1);
        let mut enemies = EnemyPopulation::new(EnemyCatalog::standard(), plan.base_damage);
        let mut player = PlayerState::new(0, 100);
        player.take_damage(20);
        let mut signals = Vec::new();
        scheduler.start(&mut player, &mut signals);

        let dt = Duration::from_millis(100);
        scheduler.update(dt, &grid, &mut enemies, &mut player, &mut signals);
        scheduler.update(dt, &grid, &mut enemies, &mut player, &mut signals);
        kill_all(&mut enemies);
        scheduler.update(dt, &grid, &mut enemies, &mut player, &mut signals);
        // Wave 1 with heal interval 1 restores 5 hp on completion.
        assert_eq!(player.hp(), 85);
    }
}
