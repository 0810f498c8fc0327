use crate::core::agent::{Agent, AgentKind, DriveMode, EntryPars, PitState};
use crate::core::circuit::{Circuit, CircuitPars};
use crate::core::compound::{Compound, CompoundTable};
use anyhow::Result;
use helpers::general::InputValueError;
use log::{debug, info};
use rand::{Rng, RngCore};
use rand_distr::{Distribution, Normal};
use serde::Deserialize;
use std::collections::VecDeque;

/// Engine tuning constants. The values are tuned ad hoc (no deeper rationale is documented), so
/// they are kept as one configurable block: any field may be overridden from the session
/// parameter file, missing fields fall back to the defaults below.
///
/// * `tick_seconds` - (s) Fixed physics step
/// * `base_speed_player` / `base_speed_ai` - (km/h) Base target speed per agent kind
/// * `pace_jitter_std` - (km/h) Std dev of the per-entry pace offset drawn once at race start
/// * `push_*` / `conserve_*` - Drive mode multipliers on speed and tyre wear
/// * `safety_car_prob_per_tick` - Per-tick probability of a safety-car deployment
/// * `safety_car_duration_ticks` - Countdown set when the safety car comes out
/// * `tyre_wear_grip_slope` - Grip lost per percent of tyre wear (linear, floored)
/// * `grid_slot_gap` - (lap fraction) Spacing between two grid slots at the start
/// * `sync_interval_ticks` - Cadence of the standings/snapshot computation
/// * `advisory_period_ticks` - Cadence of the advisory engine (8 simulated seconds)
/// * `seconds_per_lap_gap` - (s) Constant-pace approximation used for gap strings
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SimConstants {
    pub tick_seconds: f64,
    pub base_speed_player: f64,
    pub base_speed_ai: f64,
    pub pace_jitter_std: f64,
    pub push_speed_factor: f64,
    pub conserve_speed_factor: f64,
    pub push_wear_factor: f64,
    pub conserve_wear_factor: f64,
    pub safety_car_speed_factor: f64,
    pub yellow_speed_factor: f64,
    pub red_speed_factor: f64,
    pub safety_car_prob_per_tick: f64,
    pub safety_car_duration_ticks: u32,
    pub drs_speed_factor: f64,
    pub ers_speed_factor: f64,
    pub ers_drain_per_tick: f64,
    pub ers_regen_per_tick: f64,
    pub tyre_wear_grip_slope: f64,
    pub tyre_grip_floor: f64,
    pub cold_tyre_grip_penalty: f64,
    pub fuel_per_lap: f64,
    pub speed_smoothing: f64,
    pub pit_lane_speed_kmh: f64,
    pub pit_stop_ticks: u32,
    pub ai_pit_wear_threshold: f64,
    pub ai_min_laps_remaining: u32,
    pub player_pit_window_wear: f64,
    pub tyre_critical_wear: f64,
    pub grid_slot_gap: f64,
    pub sync_interval_ticks: u32,
    pub advisory_period_ticks: u32,
    pub seconds_per_lap_gap: f64,
}

impl Default for SimConstants {
    fn default() -> Self {
        SimConstants {
            tick_seconds: 1.0 / 60.0,
            base_speed_player: 318.0,
            base_speed_ai: 315.0,
            pace_jitter_std: 2.5,
            push_speed_factor: 1.04,
            conserve_speed_factor: 0.93,
            push_wear_factor: 1.45,
            conserve_wear_factor: 0.65,
            safety_car_speed_factor: 0.55,
            yellow_speed_factor: 0.85,
            red_speed_factor: 0.0,
            safety_car_prob_per_tick: 0.00035,
            safety_car_duration_ticks: 1500,
            drs_speed_factor: 1.12,
            ers_speed_factor: 1.06,
            ers_drain_per_tick: 0.45,
            ers_regen_per_tick: 0.08,
            tyre_wear_grip_slope: 0.003,
            tyre_grip_floor: 0.7,
            cold_tyre_grip_penalty: 0.03,
            fuel_per_lap: 1.7,
            speed_smoothing: 0.92,
            pit_lane_speed_kmh: 80.0,
            pit_stop_ticks: 150,
            ai_pit_wear_threshold: 72.0,
            ai_min_laps_remaining: 3,
            player_pit_window_wear: 65.0,
            tyre_critical_wear: 85.0,
            grid_slot_gap: 0.008,
            sync_interval_ticks: 30,
            advisory_period_ticks: 480,
            seconds_per_lap_gap: 88.0,
        }
    }
}

impl SimConstants {
    pub fn mode_speed_factor(&self, mode: DriveMode) -> f64 {
        match mode {
            DriveMode::Push => self.push_speed_factor,
            DriveMode::Normal => 1.0,
            DriveMode::Conserve => self.conserve_speed_factor,
        }
    }

    pub fn mode_wear_factor(&self, mode: DriveMode) -> f64 {
        match mode {
            DriveMode::Push => self.push_wear_factor,
            DriveMode::Normal => 1.0,
            DriveMode::Conserve => self.conserve_wear_factor,
        }
    }
}

/// Global race condition applied uniformly to all agents' pace. Yellow and Red are recognized
/// states without a documented trigger; the stochastic controller only produces Green and
/// SafetyCar.
#[derive(Debug, Clone, PartialEq)]
pub enum FlagState {
    Green,
    Yellow,
    SafetyCar { timer_ticks: u32 },
    Red,
}

impl Default for FlagState {
    fn default() -> Self {
        FlagState::Green
    }
}

impl FlagState {
    pub fn is_safety_car(&self) -> bool {
        matches!(self, FlagState::SafetyCar { .. })
    }

    pub fn code(&self) -> &'static str {
        match self {
            FlagState::Green => "GREEN",
            FlagState::Yellow => "YELLOW",
            FlagState::SafetyCar { .. } => "SC",
            FlagState::Red => "RED",
        }
    }

    fn speed_factor(&self, consts: &SimConstants) -> f64 {
        match self {
            FlagState::Green => 1.0,
            FlagState::Yellow => consts.yellow_speed_factor,
            FlagState::SafetyCar { .. } => consts.safety_car_speed_factor,
            FlagState::Red => consts.red_speed_factor,
        }
    }
}

/// RaceCtrl owns the full simulation state and is its single mutator. All other components
/// (standings, advisory, snapshot) borrow it read-only; commands only set intent flags that the
/// next tick consumes.
pub struct RaceCtrl {
    pub consts: SimConstants,
    pub circuit: Circuit,
    pub compounds: CompoundTable,
    pub agents: Vec<Agent>,
    pub flag: FlagState,
    pub paused: bool,
    pub speed_multiplier: u32,
    pub tick: u64,
    pub race_complete: bool,
    pub latest_advisory: String,
    player_idx: usize,
    broadcasts: VecDeque<String>,
    rng: Box<dyn RngCore + Send>,
}

impl std::fmt::Debug for RaceCtrl {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("RaceCtrl")
            .field("tick", &self.tick)
            .field("flag", &self.flag)
            .field("paused", &self.paused)
            .field("race_complete", &self.race_complete)
            .field("agents", &self.agents.len())
            .finish()
    }
}

impl RaceCtrl {
    pub fn new(
        circuit_pars: &CircuitPars,
        entry_pars_all: &[EntryPars],
        compounds: CompoundTable,
        consts: SimConstants,
        mut rng: Box<dyn RngCore + Send>,
    ) -> Result<RaceCtrl> {
        let circuit = Circuit::new(circuit_pars)?;

        let no_players = entry_pars_all.iter().filter(|e| e.is_player).count();
        if no_players != 1 {
            return Err(InputValueError(format!(
                "Exactly one player entry is required, found {}!",
                no_players
            ))
            .into());
        }

        // create agents in grid order, first entry on pole
        let no_entries = entry_pars_all.len();
        let jitter = Normal::new(0.0, consts.pace_jitter_std)
            .map_err(|e| InputValueError(format!("Invalid pace jitter std dev: {}", e)))?;

        let mut agents = Vec::with_capacity(no_entries);
        for (slot, entry_pars) in entry_pars_all.iter().enumerate() {
            let start_pos = (no_entries - slot) as f64 * consts.grid_slot_gap;
            let pace_offset = if entry_pars.is_player {
                0.0
            } else {
                jitter.sample(&mut rng)
            };
            agents.push(Agent::new(slot, entry_pars, start_pos, pace_offset));
        }

        let player_idx = agents
            .iter()
            .position(|a| a.kind == AgentKind::Player)
            .unwrap();

        info!(
            "Race initialized: {} laps at {} with {} cars",
            circuit.lap_count, circuit.name, no_entries
        );

        Ok(RaceCtrl {
            consts,
            circuit,
            compounds,
            agents,
            flag: FlagState::Green,
            paused: false,
            speed_multiplier: 1,
            tick: 0,
            race_complete: false,
            latest_advisory: String::new(),
            player_idx,
            broadcasts: VecDeque::new(),
            rng,
        })
    }

    // ---------------------------------------------------------------------------------------------
    // MAIN METHOD ---------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// Advances the whole world by one fixed physics step. No-op while paused or after the
    /// chequered flag.
    pub fn simulate_tick(&mut self) {
        if self.paused || self.race_complete {
            return;
        }

        self.tick += 1;

        self.update_flag();

        for idx in 0..self.agents.len() {
            self.advance_agent(idx);
        }

        self.run_ai_policy();

        if self.agents[self.player_idx].finished(self.circuit.lap_count) {
            self.race_complete = true;
            info!("Chequered flag after {} laps", self.circuit.lap_count);
            self.broadcasts
                .push_back("And that is the chequered flag. Good race.".to_string());
        }
    }

    // ---------------------------------------------------------------------------------------------
    // SIMULATOR PARTS -----------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// Stochastic safety-car controller: Green -> SafetyCar with a constant per-tick probability,
    /// SafetyCar -> Green when the countdown expires. Not tied to any on-track incident; it
    /// exists to open sporadic strategic windows.
    fn update_flag(&mut self) {
        match self.flag {
            FlagState::SafetyCar { timer_ticks } => {
                if timer_ticks <= 1 {
                    self.flag = FlagState::Green;
                    info!("Safety car in this lap, race resuming");
                    self.broadcasts
                        .push_back("Safety car is coming in. Green flag, race on.".to_string());
                } else {
                    self.flag = FlagState::SafetyCar {
                        timer_ticks: timer_ticks - 1,
                    };
                }
            }
            FlagState::Green => {
                if self.rng.gen::<f64>() < self.consts.safety_car_prob_per_tick {
                    self.flag = FlagState::SafetyCar {
                        timer_ticks: self.consts.safety_car_duration_ticks,
                    };
                    info!("Safety car deployed");
                    self.broadcasts
                        .push_back("Safety car deployed. Pit window is open.".to_string());
                }
            }
            // Yellow/Red have no documented trigger or expiry
            _ => {}
        }
    }

    /// Target speed before smoothing: base speed scaled by drive mode, flag state, tyre grip
    /// (linear in wear with a floor), compound grip and the DRS/ERS boosts.
    pub fn target_speed_kmh(&self, agent: &Agent) -> f64 {
        if agent.in_pit() {
            return self.consts.pit_lane_speed_kmh;
        }

        let consts = &self.consts;
        let base = match agent.kind {
            AgentKind::Player => consts.base_speed_player,
            AgentKind::Ai => consts.base_speed_ai,
        } + agent.pace_offset;

        let tyre_grip =
            (1.0 - agent.tyre_wear * consts.tyre_wear_grip_slope).max(consts.tyre_grip_floor);
        let compound_grip = self.compounds.grip_factor(
            agent.compound,
            agent.tyre_age,
            consts.cold_tyre_grip_penalty,
        );
        let drs = if agent.drs_open {
            consts.drs_speed_factor
        } else {
            1.0
        };
        let ers = if agent.ers_deploying {
            consts.ers_speed_factor
        } else {
            1.0
        };

        (base * consts.mode_speed_factor(agent.mode)
            * self.flag.speed_factor(consts)
            * tyre_grip
            * compound_grip
            * drs
            * ers)
            .max(0.0)
    }

    fn advance_agent(&mut self, idx: usize) {
        let lap_count = self.circuit.lap_count;

        if self.agents[idx].retired || self.agents[idx].finished(lap_count) {
            return;
        }

        // pit box: hold the car, count the stop down, snap to the pit exit when released
        if let PitState::InPit { timer_ticks } = self.agents[idx].pit {
            let pit_exit = self.circuit.pit_exit();
            let agent = &mut self.agents[idx];

            agent.speed_kmh = self.consts.pit_lane_speed_kmh;
            if timer_ticks <= 1 {
                agent.pit = PitState::OnTrack;
                agent.pos_on_track = pit_exit;
                debug!("{} leaves the pit lane", agent.display_name);
            } else {
                agent.pit = PitState::InPit {
                    timer_ticks: timer_ticks - 1,
                };
            }
            return;
        }

        let target = self.target_speed_kmh(&self.agents[idx]);
        let consts = &self.consts;
        let agent = &mut self.agents[idx];

        // exponential approach models accel/brake inertia without force integration
        agent.speed_kmh =
            agent.speed_kmh * consts.speed_smoothing + target * (1.0 - consts.speed_smoothing);

        let lap_frac_per_s = agent.speed_kmh / 3.6 / self.circuit.length_m;
        agent.pos_on_track += lap_frac_per_s * consts.tick_seconds;

        if agent.pos_on_track >= 1.0 {
            agent.pos_on_track -= 1.0;
            let wear_factor = consts.mode_wear_factor(agent.mode);
            agent.complete_lap(&self.compounds, wear_factor, consts.fuel_per_lap);
            debug!(
                "{} starts lap {} (wear {:.1}%, fuel {:.1}%)",
                agent.display_name, agent.lap, agent.tyre_wear, agent.fuel_pct
            );
        }

        agent.drs_eligible =
            self.circuit.in_drs_zone(agent.pos_on_track) && !self.flag.is_safety_car();
        if !agent.drs_eligible {
            agent.drs_open = false;
        }

        if agent.ers_deploying {
            agent.ers_charge -= consts.ers_drain_per_tick;
            if agent.ers_charge <= 0.0 {
                agent.ers_deploying = false;
            }
        } else {
            agent.ers_charge += consts.ers_regen_per_tick;
        }
        agent.ers_charge = agent.ers_charge.clamp(0.0, 100.0);

        if agent.pit_requested && self.circuit.in_pit_lane(agent.pos_on_track) {
            agent.pit = PitState::InPit {
                timer_ticks: consts.pit_stop_ticks,
            };
            agent.speed_kmh = consts.pit_lane_speed_kmh;
            agent.drs_eligible = false;
            agent.drs_open = false;
            agent.ers_deploying = false;
            agent.service_tyres();
            debug!("{} enters the pit lane", agent.display_name);
        }
    }

    /// AI decision policy: a worn set plus enough laps remaining triggers a stop with a
    /// uniformly random dry compound. No undercut/overcut planning beyond this threshold rule.
    fn run_ai_policy(&mut self) {
        let lap_count = self.circuit.lap_count;

        for idx in 0..self.agents.len() {
            let agent = &self.agents[idx];
            if agent.kind != AgentKind::Ai
                || agent.retired
                || agent.in_pit()
                || agent.pit_requested
                || agent.finished(lap_count)
            {
                continue;
            }

            let laps_remaining = lap_count.saturating_sub(agent.lap);
            if agent.tyre_wear > self.consts.ai_pit_wear_threshold
                && laps_remaining > self.consts.ai_min_laps_remaining
            {
                let compound = Compound::DRY[self.rng.gen_range(0..Compound::DRY.len())];

                let agent = &mut self.agents[idx];
                agent.pit_requested = true;
                agent.next_compound = Some(compound);
                debug!(
                    "{} will pit for {:?} (wear {:.1}%)",
                    agent.display_name, compound, agent.tyre_wear
                );
            }
        }
    }

    // ---------------------------------------------------------------------------------------------
    // METHODS (HELPERS) ---------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    pub fn player(&self) -> &Agent {
        &self.agents[self.player_idx]
    }

    pub fn player_mut(&mut self) -> &mut Agent {
        &mut self.agents[self.player_idx]
    }

    pub fn player_idx(&self) -> usize {
        self.player_idx
    }

    pub fn laps_remaining(&self, agent: &Agent) -> u32 {
        self.circuit.lap_count.saturating_sub(agent.lap)
    }

    /// Pops the oldest queued race-control broadcast, if any. Consumed by the advisory engine.
    pub fn take_broadcast(&mut self) -> Option<String> {
        self.broadcasts.pop_front()
    }

    pub fn is_sync_tick(&self) -> bool {
        self.tick % self.consts.sync_interval_ticks as u64 == 0
    }

    pub fn is_advisory_tick(&self) -> bool {
        self.tick % self.consts.advisory_period_ticks as u64 == 0
    }

    pub fn rng_mut(&mut self) -> &mut (dyn RngCore + Send) {
        &mut *self.rng
    }
}
