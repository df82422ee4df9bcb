#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Tower leveling curve and stat growth for the Gridfall simulation.
//!
//! Towers embed a [`Progression`] and feed kill experience through [`gain`].
//! Stats are never mutated incrementally: callers recompute each stat from
//! its base value with [`stat_at_level`], so growth stays exact regardless of
//! how many level-ups happen in one award.

use gridfall_core::config::ExperienceCurve;

/// Stat dimension affected by leveling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatKind {
    /// Damage per hit; grows with level.
    Damage,
    /// Targeting radius in cells; grows with level.
    Range,
    /// Time between shots; shrinks with level.
    Cooldown,
}

/// Level and experience bookkeeping embedded in each tower.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Progression {
    /// Current level, starting at 1.
    pub level: u32,
    /// Experience accumulated toward the next level.
    pub exp: f32,
    /// Experience required to reach the next level.
    pub max_exp: f32,
}

impl Progression {
    /// Creates the level-1 progression a freshly built tower starts with.
    #[must_use]
    pub fn fresh(curve: &ExperienceCurve) -> Self {
        Self {
            level: 1,
            exp: 0.0,
            max_exp: requirement(curve, 1),
        }
    }

    /// Percentage of the current level's requirement already earned.
    ///
    /// Saturates at 100 so a maxed tower reports a full bar.
    #[must_use]
    pub fn progress_percent(&self) -> f32 {
        if !self.max_exp.is_finite() || self.max_exp <= 0.0 {
            return 100.0;
        }
        (self.exp / self.max_exp * 100.0).min(100.0)
    }
}

/// Experience required to advance past the given level.
///
/// The requirement grows geometrically and becomes infinite at the curve's
/// maximum level, which makes further gains a no-op.
#[must_use]
pub fn requirement(curve: &ExperienceCurve, level: u32) -> f32 {
    if level >= curve.max_level {
        return f32::INFINITY;
    }
    curve.base_requirement * curve.scaling.powi(level.saturating_sub(1) as i32)
}

/// Value of a base stat at the given level.
#[must_use]
pub fn stat_at_level(curve: &ExperienceCurve, base: f32, level: u32, kind: StatKind) -> f32 {
    let growth = match kind {
        StatKind::Damage => curve.damage_growth,
        StatKind::Range => curve.range_growth,
        StatKind::Cooldown => curve.cooldown_growth,
    };
    base * growth.powi(level.saturating_sub(1) as i32)
}

/// Credits experience, advancing levels while thresholds are crossed.
///
/// Surplus experience carries into the next level. Returns whether at least
/// one level was gained, so the caller knows to recompute stats.
pub fn gain(curve: &ExperienceCurve, progression: &mut Progression, amount: f32) -> bool {
    if progression.level >= curve.max_level {
        return false;
    }
    progression.exp += amount;
    let mut leveled = false;
    while progression.exp >= progression.max_exp {
        progression.exp -= progression.max_exp;
        progression.level += 1;
        progression.max_exp = requirement(curve, progression.level);
        leveled = true;
        log::debug!("tower reached level {}", progression.level);
    }
    leveled
}
