use crate::core::agent::{DriveMode, PitState};
use crate::core::compound::Compound;
use crate::core::race::{FlagState, RaceCtrl};
use crate::core::standings::{compute_standings, player_gaps};
use anyhow::{Context, Result};
use helpers::general::lin_interp;

/// Lower speed bound (km/h) of each of the 7 gear bands. The gear shown on the HUD is the index
/// of the highest band at or below the current speed.
pub const GEAR_SPEED_THRESHOLDS_KMH: [f64; 7] =
    [0.0, 45.0, 95.0, 145.0, 190.0, 235.0, 280.0];

// wear -> estimated tread temperature curve for the HUD readout
const TEMP_WEAR_PTS: [f64; 4] = [0.0, 30.0, 70.0, 100.0];
const TEMP_C_PTS: [f64; 4] = [82.0, 96.0, 106.0, 118.0];

#[derive(Debug, Clone, Copy, Default)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// One ranked row of the live timing tower.
#[derive(Debug, Clone)]
pub struct StandingRow {
    pub rank: u32,
    pub agent_id: usize,
    pub display_name: String,
    pub team: String,
    pub color: RgbColor,
    pub lap: u32,
    pub pos_on_track: f64,
    pub in_pit: bool,
}

/// Everything the player HUD needs for one frame. Gear, throttle and brake are derived display
/// values, not simulated quantities.
#[derive(Debug, Clone)]
pub struct PlayerBoard {
    pub lap: u32,
    pub rank: u32,
    pub speed_kmh: f64,
    pub gear: u8,
    pub throttle_pct: f64,
    pub brake_pct: f64,
    pub compound: Compound,
    pub tyre_wear: f64,
    pub tyre_age: u32,
    pub tyre_temp_c: f64,
    pub fuel_pct: f64,
    pub drs_eligible: bool,
    pub drs_open: bool,
    pub ers_charge: f64,
    pub ers_deploying: bool,
    pub in_pit: bool,
    pub mode: DriveMode,
    pub gap_ahead: String,
    pub gap_behind: String,
}

/// Read-only world snapshot handed to presentation consumers each sync interval.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub tick: u64,
    pub race_complete: bool,
    pub paused: bool,
    pub flag: FlagState,
    pub total_laps: u32,
    pub player: PlayerBoard,
    pub standings: Vec<StandingRow>,
    pub advisory: String,
}

pub fn gear_for_speed(speed_kmh: f64) -> u8 {
    let mut gear = 1;
    for (i, &threshold) in GEAR_SPEED_THRESHOLDS_KMH.iter().enumerate() {
        if speed_kmh >= threshold {
            gear = i as u8 + 1;
        }
    }
    gear
}

/// Throttle/brake indicator values from the gap between current and target speed.
fn throttle_brake_indicators(speed_kmh: f64, target_kmh: f64) -> (f64, f64) {
    let delta = target_kmh - speed_kmh;

    if delta >= 0.0 {
        (((0.6 + delta * 0.02) * 100.0).clamp(0.0, 100.0), 0.0)
    } else if delta > -5.0 {
        // coasting band: partially lifted, no brake
        (40.0, 0.0)
    } else {
        (0.0, (((-delta - 5.0) * 0.04) * 100.0).clamp(0.0, 100.0))
    }
}

fn tyre_temp_estimate(tyre_wear: f64, mode: DriveMode) -> f64 {
    let base = lin_interp(tyre_wear, &TEMP_WEAR_PTS, &TEMP_C_PTS);
    match mode {
        DriveMode::Push => base + 4.0,
        DriveMode::Normal => base,
        DriveMode::Conserve => base - 3.0,
    }
}

/// Builds the snapshot for the current tick. Fails only if an entry color string cannot be
/// parsed.
pub fn build_snapshot(ctrl: &RaceCtrl) -> Result<Snapshot> {
    let entries = compute_standings(ctrl);
    let (gap_ahead, gap_behind) = player_gaps(ctrl, &entries);

    let mut standings = Vec::with_capacity(entries.len());
    for entry in entries.iter() {
        let agent = &ctrl.agents[entry.agent_id];
        let tmp_color = agent
            .color
            .parse::<css_color_parser::Color>()
            .context("Could not parse hex color!")?;

        standings.push(StandingRow {
            rank: entry.rank,
            agent_id: entry.agent_id,
            display_name: entry.display_name.to_owned(),
            team: entry.team.to_owned(),
            color: RgbColor {
                r: tmp_color.r,
                g: tmp_color.g,
                b: tmp_color.b,
            },
            lap: entry.lap,
            pos_on_track: entry.pos_on_track,
            in_pit: entry.in_pit,
        });
    }

    let player = ctrl.player();
    let rank = entries
        .iter()
        .find(|e| e.agent_id == player.id)
        .map(|e| e.rank)
        .unwrap_or(0);

    let (throttle_pct, brake_pct) = if matches!(player.pit, PitState::InPit { .. }) {
        (0.0, 0.0)
    } else {
        throttle_brake_indicators(player.speed_kmh, ctrl.target_speed_kmh(player))
    };

    let player_board = PlayerBoard {
        lap: player.lap.min(ctrl.circuit.lap_count),
        rank,
        speed_kmh: player.speed_kmh,
        gear: gear_for_speed(player.speed_kmh),
        throttle_pct,
        brake_pct,
        compound: player.compound,
        tyre_wear: player.tyre_wear,
        tyre_age: player.tyre_age,
        tyre_temp_c: tyre_temp_estimate(player.tyre_wear, player.mode),
        fuel_pct: player.fuel_pct,
        drs_eligible: player.drs_eligible,
        drs_open: player.drs_open,
        ers_charge: player.ers_charge,
        ers_deploying: player.ers_deploying,
        in_pit: player.in_pit(),
        mode: player.mode,
        gap_ahead,
        gap_behind,
    };

    Ok(Snapshot {
        tick: ctrl.tick,
        race_complete: ctrl.race_complete,
        paused: ctrl.paused,
        flag: ctrl.flag.to_owned(),
        total_laps: ctrl.circuit.lap_count,
        player: player_board,
        standings,
        advisory: ctrl.latest_advisory.to_owned(),
    })
}
