#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Buff ledger and passive income for the Gridfall simulation.
//!
//! The board tracks which towers currently receive which stat modifiers and
//! from whom, enforces the per-kind stack cap at query time, and accrues the
//! harvester gold trickle. It never inspects towers directly; the tower
//! registry feeds it positions and tears buffs down when emitters vanish.

use std::{
    collections::{BTreeSet, HashMap},
    time::Duration,
};

use gridfall_core::{config::BuffTuning, BuffKind, GridPos, PlayerState, TowerId};

/// One stat modifier granted to a tower by a support tower.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Buff {
    /// Modifier category.
    pub kind: BuffKind,
    /// Support tower granting the modifier.
    pub source: TowerId,
    /// Magnitude; interpretation depends on the kind.
    pub value: f32,
    /// Simulation time the modifier was (re)applied.
    pub applied_at: Duration,
}

/// Ledger of active buffs plus the harvester income roster.
#[derive(Debug)]
pub struct BuffBoard {
    ledger: HashMap<TowerId, Vec<Buff>>,
    harvesters: BTreeSet<TowerId>,
    tuning: BuffTuning,
    income_carry: f32,
}

impl BuffBoard {
    /// Creates an empty board with the provided tuning.
    #[must_use]
    pub fn new(tuning: BuffTuning) -> Self {
        Self {
            ledger: HashMap::new(),
            harvesters: BTreeSet::new(),
            tuning,
            income_carry: 0.0,
        }
    }

    /// Tuning values the board was created with.
    #[must_use]
    pub const fn tuning(&self) -> &BuffTuning {
        &self.tuning
    }

    /// Grants or refreshes a buff on a target.
    ///
    /// Reapplying from the same source with the same kind replaces the stored
    /// entry, so repeated aura sweeps never inflate stacks.
    pub fn apply(&mut self, target: TowerId, buff: Buff) {
        let entries = self.ledger.entry(target).or_default();
        if let Some(existing) = entries
            .iter_mut()
            .find(|entry| entry.kind == buff.kind && entry.source == buff.source)
        {
            *existing = buff;
        } else {
            entries.push(buff);
        }
    }

    /// Combined magnitude of a buff kind on a target.
    ///
    /// Stackable kinds sum the oldest entries up to the stack cap; when a
    /// counted source disappears the next stored entry is promoted on the
    /// following query. Non-stacking kinds report the oldest entry alone.
    #[must_use]
    pub fn total(&self, target: TowerId, kind: BuffKind) -> f32 {
        let Some(entries) = self.ledger.get(&target) else {
            return 0.0;
        };
        let counted = if kind.stacks() { self.tuning.max_stacks } else { 1 };
        entries
            .iter()
            .filter(|entry| entry.kind == kind)
            .take(counted)
            .map(|entry| entry.value)
            .sum()
    }

    /// Removes every buff granted by the given source, on any target.
    pub fn purge_source(&mut self, source: TowerId) {
        for entries in self.ledger.values_mut() {
            entries.retain(|entry| entry.source != source);
        }
        self.ledger.retain(|_, entries| !entries.is_empty());
    }

    /// Removes every buff held by the given target.
    pub fn purge_target(&mut self, target: TowerId) {
        let _ = self.ledger.remove(&target);
    }

    /// Re-applies an aura from a support tower to every tower in range.
    ///
    /// Existing grants from this source are purged first, so the sweep is
    /// idempotent and towers that moved out of range lose the buff. The
    /// source never buffs itself.
    pub fn apply_aura(
        &mut self,
        source: TowerId,
        source_cell: GridPos,
        kind: BuffKind,
        value: f32,
        candidates: &[(TowerId, GridPos)],
        now: Duration,
    ) {
        self.purge_source(source);
        for &(target, cell) in candidates {
            if target == source {
                continue;
            }
            if source_cell.euclidean_distance(cell) > self.tuning.aura_radius_cells {
                continue;
            }
            self.apply(
                target,
                Buff {
                    kind,
                    source,
                    value,
                    applied_at: now,
                },
            );
        }
    }

    /// Registers a harvester so it contributes passive income.
    pub fn enroll_harvester(&mut self, id: TowerId) {
        if self.harvesters.insert(id) {
            log::debug!("harvester {} enrolled, {} total", id.get(), self.harvesters.len());
        }
    }

    /// Removes a harvester from the income roster.
    pub fn withdraw_harvester(&mut self, id: TowerId) {
        let _ = self.harvesters.remove(&id);
    }

    /// Gold generated per second by the current harvester roster.
    #[must_use]
    pub fn passive_income_rate(&self) -> f32 {
        self.harvesters.len() as f32 * self.tuning.income_per_second
    }

    /// Accrues passive income for the elapsed tick, crediting whole gold.
    ///
    /// Fractional remainders carry over between ticks so small timesteps lose
    /// nothing to truncation.
    pub fn accrue_income(&mut self, dt: Duration, player: &mut PlayerState) {
        let earned = self.passive_income_rate() * dt.as_secs_f32() + self.income_carry;
        let whole = earned.floor();
        self.income_carry = earned - whole;
        if whole > 0.0 {
            player.add_gold(whole as u32);
        }
    }
}
