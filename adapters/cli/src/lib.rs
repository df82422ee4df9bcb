#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless session driver wiring every Gridfall subsystem together.
//!
//! The session owns the canonical tick order: wave scheduling, enemy
//! movement, tower combat, projectile resolution, then passive income. It is
//! the single place where cross-system messages are forwarded, and it is the
//! adapter responsible for answering wave transitions; clears are resumed
//! immediately, which grants the full speed bonus every time.

use std::time::Duration;

use anyhow::Context;
use gridfall_core::{
    config::{BuffTuning, EnemyCatalog, ExperienceCurve, LevelPlan, TowerCatalog},
    GridPos, PlayerState, TowerId, TowerKind, WaveSignal,
};
use gridfall_system_buffs::BuffBoard;
use gridfall_system_enemies::EnemyPopulation;
use gridfall_system_projectiles::ProjectileVolley;
use gridfall_system_towers::{BuildError, TowerRegistry};
use gridfall_system_waves::{WavePhase, WaveScheduler};
use gridfall_world::Grid;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Terminal state of a finished or exhausted session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Every wave was cleared.
    Victory,
    /// The base was destroyed.
    Defeat,
    /// The tick budget ran out first.
    OutOfTicks,
}

/// One running game session over a loaded level.
pub struct Session {
    grid: Grid,
    player: PlayerState,
    buffs: BuffBoard,
    enemies: EnemyPopulation,
    towers: TowerRegistry,
    volley: ProjectileVolley,
    scheduler: WaveScheduler,
    rng: ChaCha8Rng,
    now: Duration,
}

impl Session {
    /// Loads a level and seeds the session.
    pub fn new(plan: &LevelPlan, seed: u64) -> anyhow::Result<Self> {
        let grid = Grid::from_layout(&plan.layout, plan.cell_size)
            .context("level layout rejected")?;
        Ok(Self {
            grid,
            player: PlayerState::new(plan.starting_gold, plan.starting_hp),
            buffs: BuffBoard::new(BuffTuning::standard()),
            enemies: EnemyPopulation::new(EnemyCatalog::standard(), plan.base_damage),
            towers: TowerRegistry::new(TowerCatalog::standard(), ExperienceCurve::standard()),
            volley: ProjectileVolley::new(),
            scheduler: WaveScheduler::new(plan, seed),
            rng: ChaCha8Rng::seed_from_u64(seed),
            now: Duration::ZERO,
        })
    }

    /// Player resources and flags.
    #[must_use]
    pub const fn player(&self) -> &PlayerState {
        &self.player
    }

    /// Tower registry, for inspecting the defense.
    #[must_use]
    pub const fn towers(&self) -> &TowerRegistry {
        &self.towers
    }

    /// Simulation time elapsed since the session started.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Constructs a tower before or between ticks.
    pub fn build_tower(&mut self, kind: TowerKind, cell: GridPos) -> Result<TowerId, BuildError> {
        self.towers.build(
            kind,
            cell,
            &mut self.grid,
            &mut self.player,
            &mut self.buffs,
            self.now,
        )
    }

    /// Sells a tower, returning the refund.
    pub fn sell_tower(&mut self, id: TowerId) -> Option<u32> {
        self.towers
            .sell(id, &mut self.grid, &mut self.player, &mut self.buffs, self.now)
    }

    /// Advances the whole simulation by one tick.
    pub fn tick(&mut self, dt: Duration) {
        self.now += dt;

        let mut signals = Vec::new();
        if self.scheduler.phase() == WavePhase::Idle {
            self.scheduler.start(&mut self.player, &mut signals);
        }
        self.scheduler.update(
            dt,
            &self.grid,
            &mut self.enemies,
            &mut self.player,
            &mut signals,
        );

        let mut pulses = Vec::new();
        self.enemies.update(
            dt,
            &self.grid,
            &mut self.player,
            &mut self.rng,
            &mut pulses,
        );
        for pulse in &pulses {
            self.towers.apply_disable_pulse(pulse, &self.grid, self.now);
        }

        self.towers.update(
            self.now,
            &self.grid,
            &self.enemies,
            &self.buffs,
            &mut self.volley,
        );

        let mut awards = Vec::new();
        self.volley
            .update(dt, &mut self.enemies, &mut self.player, &mut awards);
        self.towers.award_experience(&awards);

        self.buffs.accrue_income(dt, &mut self.player);

        for signal in signals {
            match signal {
                WaveSignal::WaveStarted { wave } => log::info!("wave {wave} is live"),
                WaveSignal::Transition { wave, rewards, .. } => {
                    log::info!("wave {wave} cleared, resuming immediately");
                    let mut follow_up = Vec::new();
                    self.scheduler.start_next_wave(
                        rewards.bonus_gold,
                        &mut self.player,
                        &mut follow_up,
                    );
                    if follow_up
                        .iter()
                        .any(|signal| matches!(signal, WaveSignal::LevelComplete))
                    {
                        log::info!("level complete");
                    }
                }
                WaveSignal::LevelComplete => log::info!("level complete"),
            }
        }
    }

    /// Runs ticks until the session resolves or the budget is spent.
    pub fn run(&mut self, dt: Duration, max_ticks: u64) -> SessionOutcome {
        for _ in 0..max_ticks {
            if self.player.is_defeated() {
                return SessionOutcome::Defeat;
            }
            if self.player.is_victorious() {
                return SessionOutcome::Victory;
            }
            self.tick(dt);
        }
        if self.player.is_defeated() {
            SessionOutcome::Defeat
        } else if self.player.is_victorious() {
            SessionOutcome::Victory
        } else {
            SessionOutcome::OutOfTicks
        }
    }
}
