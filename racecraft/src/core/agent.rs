use crate::core::compound::{Compound, CompoundTable};
use serde::Deserialize;

fn default_start_compound() -> Compound {
    Compound::Medium
}

/// * `display_name` - Driver name shown in standings, e.g. "J. Varga"
/// * `team` - Team name
/// * `color` - Team color as a hex string, e.g. "#d40000"
/// * `is_player` - True for the single player-controlled entry
/// * `compound` - Starting tyre compound
#[derive(Debug, Deserialize, Clone)]
pub struct EntryPars {
    pub display_name: String,
    pub team: String,
    pub color: String,
    #[serde(default)]
    pub is_player: bool,
    #[serde(default = "default_start_compound")]
    pub compound: Compound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentKind {
    Player,
    Ai,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveMode {
    Push,
    Normal,
    Conserve,
}

/// Pit status as a tagged state so a car cannot be in the pit without a remaining stop time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PitState {
    OnTrack,
    InPit { timer_ticks: u32 },
}

/// Mutable per-car state. Player and AI share the same record; the decision source differs by
/// `kind` inside the update loop. Mutated exclusively by the update loop.
#[derive(Debug, Clone)]
pub struct Agent {
    pub id: usize,
    pub kind: AgentKind,
    pub display_name: String,
    pub team: String,
    pub color: String,

    pub pos_on_track: f64,
    pub lap: u32,
    pub speed_kmh: f64,

    pub compound: Compound,
    pub tyre_age: u32,
    pub tyre_wear: f64,
    pub fuel_pct: f64,

    pub pit: PitState,
    pub mode: DriveMode,
    pub drs_open: bool,
    pub drs_eligible: bool,
    pub ers_charge: f64,
    pub ers_deploying: bool,
    pub retired: bool,

    // intent flags set by commands (player) or the AI policy, consumed on the next tick
    pub pit_requested: bool,
    pub next_compound: Option<Compound>,

    // per-entry base speed offset (km/h), fixed at creation for field spread
    pub pace_offset: f64,
}

impl Agent {
    pub fn new(id: usize, entry_pars: &EntryPars, start_pos: f64, pace_offset: f64) -> Agent {
        Agent {
            id,
            kind: if entry_pars.is_player {
                AgentKind::Player
            } else {
                AgentKind::Ai
            },
            display_name: entry_pars.display_name.to_owned(),
            team: entry_pars.team.to_owned(),
            color: entry_pars.color.to_owned(),
            pos_on_track: start_pos.rem_euclid(1.0),
            lap: 1,
            speed_kmh: 0.0,
            compound: entry_pars.compound,
            tyre_age: 0,
            tyre_wear: 0.0,
            fuel_pct: 100.0,
            pit: PitState::OnTrack,
            mode: DriveMode::Normal,
            drs_open: false,
            drs_eligible: false,
            ers_charge: 100.0,
            ers_deploying: false,
            retired: false,
            pit_requested: false,
            next_compound: None,
            pace_offset,
        }
    }

    pub fn in_pit(&self) -> bool {
        matches!(self.pit, PitState::InPit { .. })
    }

    /// Combined race progress used for ordering: completed laps plus current lap fraction.
    pub fn race_prog(&self) -> f64 {
        self.lap as f64 + self.pos_on_track
    }

    /// True once the agent has crossed the finish line of the final lap.
    pub fn finished(&self, lap_count: u32) -> bool {
        self.lap > lap_count
    }

    /// Book-keeping applied once per completed lap: tyre age and wear grow, fuel burns.
    pub fn complete_lap(&mut self, compounds: &CompoundTable, wear_factor: f64, fuel_per_lap: f64) {
        self.lap += 1;
        self.tyre_age += 1;

        let degr_rate = compounds.for_compound(self.compound).degradation_rate;
        self.tyre_wear = (self.tyre_wear + degr_rate * wear_factor).clamp(0.0, 100.0);
        self.fuel_pct = (self.fuel_pct - fuel_per_lap).clamp(0.0, 100.0);
    }

    /// Tyre service performed on pit entry: mount the staged compound (or keep the current one)
    /// as a fresh set and clear the request.
    pub fn service_tyres(&mut self) {
        if let Some(compound) = self.next_compound.take() {
            self.compound = compound;
        }

        self.tyre_wear = 0.0;
        self.tyre_age = 0;
        self.pit_requested = false;
    }
}
