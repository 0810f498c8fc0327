use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Compound {
    Soft,
    Medium,
    Hard,
    Intermediate,
    Wet,
}

impl Compound {
    /// Dry-weather compounds available to the AI pit policy.
    pub const DRY: [Compound; 3] = [Compound::Soft, Compound::Medium, Compound::Hard];

    pub fn short_code(&self) -> &'static str {
        match self {
            Compound::Soft => "S",
            Compound::Medium => "M",
            Compound::Hard => "H",
            Compound::Intermediate => "I",
            Compound::Wet => "W",
        }
    }
}

/// * `degradation_rate` - (% wear) Wear added per lap at nominal pace
/// * `grip_multiplier` - Multiplicative factor on achievable speed, <= 1
/// * `warmup_laps` - Laps on a fresh set before the compound reaches full grip
#[derive(Debug, Deserialize, Clone)]
pub struct CompoundSpec {
    pub degradation_rate: f64,
    pub grip_multiplier: f64,
    pub warmup_laps: u32,
}

/// Global lookup of compound -> spec, shared read-only by all agents.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CompoundTable {
    pub soft: CompoundSpec,
    pub medium: CompoundSpec,
    pub hard: CompoundSpec,
    pub intermediate: CompoundSpec,
    pub wet: CompoundSpec,
}

impl Default for CompoundTable {
    fn default() -> Self {
        CompoundTable {
            soft: CompoundSpec {
                degradation_rate: 3.8,
                grip_multiplier: 1.0,
                warmup_laps: 1,
            },
            medium: CompoundSpec {
                degradation_rate: 2.4,
                grip_multiplier: 0.985,
                warmup_laps: 2,
            },
            hard: CompoundSpec {
                degradation_rate: 1.5,
                grip_multiplier: 0.97,
                warmup_laps: 3,
            },
            intermediate: CompoundSpec {
                degradation_rate: 2.8,
                grip_multiplier: 0.9,
                warmup_laps: 1,
            },
            wet: CompoundSpec {
                degradation_rate: 2.2,
                grip_multiplier: 0.84,
                warmup_laps: 1,
            },
        }
    }
}

impl CompoundTable {
    pub fn for_compound(&self, compound: Compound) -> &CompoundSpec {
        match compound {
            Compound::Soft => &self.soft,
            Compound::Medium => &self.medium,
            Compound::Hard => &self.hard,
            Compound::Intermediate => &self.intermediate,
            Compound::Wet => &self.wet,
        }
    }

    /// Grip factor of a compound including the cold-tyre phase: below `warmup_laps` on the
    /// current set, grip is reduced by the warmup penalty.
    pub fn grip_factor(&self, compound: Compound, tyre_age: u32, cold_penalty: f64) -> f64 {
        let spec = self.for_compound(compound);

        if tyre_age < spec.warmup_laps {
            spec.grip_multiplier - cold_penalty
        } else {
            spec.grip_multiplier
        }
    }
}
