//! Engine configuration with documented constants
//!
//! All tuning values for the tick loop, event rolls, expedition resolution
//! and prestige scoring are collected here with explanations of their
//! purpose and how they interact with each other.

/// Configuration for the simulation engine
///
/// These values set the pacing of a run. Changing them changes game feel
/// but never the composition order of the rate pipeline.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    // === TICK SCHEDULER ===
    /// Base wall-clock interval between ticks, in milliseconds
    ///
    /// The effective interval is this divided by the tick-speed multiplier,
    /// recomputed at the end of every tick.
    pub base_tick_interval_ms: u64,

    /// Lower bound on the effective tick interval, in milliseconds
    ///
    /// Keeps runaway tick-speed stacking from turning the scheduler into a
    /// busy loop.
    pub min_tick_interval_ms: u64,

    // === TIMED EVENTS ===
    /// Probability that an eligible, weighted-picked event actually fires
    ///
    /// Applied after weighted selection, once per tick. At 0.08 an event
    /// fires on average every ~12 ticks of continuous eligibility, which
    /// keeps event noise low without a second cooldown dimension.
    pub event_fire_chance: f64,

    // === EXPEDITIONS ===
    /// Floor on effective expedition difficulty
    ///
    /// Even an overwhelming army keeps a 5% failure chance.
    pub expedition_min_difficulty: f64,

    /// How strongly the military bonus reduces difficulty
    ///
    /// effective = base - military_bonus * this factor.
    pub military_difficulty_factor: f64,

    /// Chance factor for losing one soldier on a successful expedition
    ///
    /// chance = effective_difficulty * this factor.
    pub success_loss_factor: f64,

    /// Fraction of the reward vector paid out on a failed expedition
    pub failure_reward_factor: f64,

    // === POPULATION ===
    /// Population capacity before any housing or bonuses
    pub base_population_cap: u32,

    // === PRESTIGE SCORING ===
    /// Milestones completed per prestige point
    pub prestige_milestone_divisor: f64,

    /// Technologies researched per prestige point
    pub prestige_tech_divisor: f64,

    /// Buildings built per prestige point
    pub prestige_building_divisor: f64,

    // === RANDOMNESS ===
    /// Seed for the world RNG (events, expeditions)
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_tick_interval_ms: 2000,
            min_tick_interval_ms: 250,

            event_fire_chance: 0.08,

            expedition_min_difficulty: 0.05,
            military_difficulty_factor: 0.3,
            success_loss_factor: 0.3,
            failure_reward_factor: 0.3,

            base_population_cap: 5,

            prestige_milestone_divisor: 10.0,
            prestige_tech_divisor: 15.0,
            prestige_building_divisor: 50.0,

            seed: 0,
        }
    }
}

impl EngineConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.min_tick_interval_ms == 0 || self.base_tick_interval_ms == 0 {
            return Err("tick intervals must be positive".into());
        }
        if self.min_tick_interval_ms > self.base_tick_interval_ms {
            return Err(format!(
                "min_tick_interval_ms ({}) must be <= base_tick_interval_ms ({})",
                self.min_tick_interval_ms, self.base_tick_interval_ms
            ));
        }
        if !(0.0..=1.0).contains(&self.event_fire_chance) {
            return Err(format!(
                "event_fire_chance ({}) must be within [0, 1]",
                self.event_fire_chance
            ));
        }
        if self.expedition_min_difficulty <= 0.0 || self.expedition_min_difficulty >= 1.0 {
            return Err("expedition_min_difficulty must be within (0, 1)".into());
        }
        if self.prestige_milestone_divisor <= 0.0
            || self.prestige_tech_divisor <= 0.0
            || self.prestige_building_divisor <= 0.0
        {
            return Err("prestige divisors must be positive".into());
        }
        Ok(())
    }
}
