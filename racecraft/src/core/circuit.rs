use anyhow::Result;
use helpers::general::InputValueError;
use serde::Deserialize;

// step size for the forward difference in heading_at
const HEADING_EPS: f64 = 1e-3;

/// * `name` - Circuit name
/// * `lap_count` - Number of laps in the race distance
/// * `length_m` - (m) Nominal length of the circuit, used to convert speed into lap fraction
/// * `path` - Ordered path points in normalized [0, 1] x [0, 1] space, treated as a closed loop
/// * `drs_zones` - Start and end of the DRS zones (lap fractions, non-overlapping)
/// * `pit_lane` - Start and end of the pit lane (lap fractions, entry < exit)
/// * `corners` - Named corner markers (informational only)
#[derive(Debug, Deserialize, Clone)]
pub struct CircuitPars {
    pub name: String,
    pub lap_count: u32,
    pub length_m: f64,
    pub path: Vec<[f64; 2]>,
    pub drs_zones: Vec<[f64; 2]>,
    pub pit_lane: [f64; 2],
    #[serde(default)]
    pub corners: Vec<CornerPars>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CornerPars {
    pub pos: f64,
    pub name: String,
}

/// Static description of a track. Immutable once the session is created.
#[derive(Debug, Clone)]
pub struct Circuit {
    pub name: String,
    pub lap_count: u32,
    pub length_m: f64,
    pub path: Vec<[f64; 2]>,
    pub drs_zones: Vec<[f64; 2]>,
    pub pit_lane: [f64; 2],
    pub corners: Vec<CornerPars>,
}

impl Circuit {
    pub fn new(circuit_pars: &CircuitPars) -> Result<Circuit> {
        if circuit_pars.path.len() < 2 {
            return Err(InputValueError(format!(
                "Circuit {} must have at least 2 path points!",
                circuit_pars.name
            ))
            .into());
        }

        if circuit_pars.lap_count < 1 {
            return Err(InputValueError("Lap count must be at least 1!".to_string()).into());
        }

        if !(circuit_pars.length_m > 0.0) {
            return Err(InputValueError("Circuit length must be positive!".to_string()).into());
        }

        for point in circuit_pars.path.iter() {
            if point.iter().any(|&c| !(0.0..=1.0).contains(&c)) {
                return Err(InputValueError(format!(
                    "Path point ({:.3}, {:.3}) lies outside [0, 1] x [0, 1]!",
                    point[0], point[1]
                ))
                .into());
            }
        }

        for zone in circuit_pars.drs_zones.iter() {
            if !(0.0 <= zone[0] && zone[0] < zone[1] && zone[1] <= 1.0) {
                return Err(InputValueError(format!(
                    "DRS zone [{:.3}, {:.3}] is not an increasing range within [0, 1]!",
                    zone[0], zone[1]
                ))
                .into());
            }
        }

        let pit_lane = circuit_pars.pit_lane;
        if !(0.0 <= pit_lane[0] && pit_lane[0] < pit_lane[1] && pit_lane[1] <= 1.0) {
            return Err(InputValueError(format!(
                "Pit lane [{:.3}, {:.3}] is not an increasing range within [0, 1]!",
                pit_lane[0], pit_lane[1]
            ))
            .into());
        }

        for corner in circuit_pars.corners.iter() {
            if !(0.0..=1.0).contains(&corner.pos) {
                return Err(InputValueError(format!(
                    "Corner marker {} at {:.3} lies outside [0, 1]!",
                    corner.name, corner.pos
                ))
                .into());
            }
        }

        Ok(Circuit {
            name: circuit_pars.name.to_owned(),
            lap_count: circuit_pars.lap_count,
            length_m: circuit_pars.length_m,
            path: circuit_pars.path.to_owned(),
            drs_zones: circuit_pars.drs_zones.to_owned(),
            pit_lane,
            corners: circuit_pars.corners.to_owned(),
        })
    }

    /// point_at returns the (x, y) track point for a lap fraction. The path is treated as a
    /// closed loop and the input is taken modulo 1, so the method is defined for all real input.
    pub fn point_at(&self, pos: f64) -> (f64, f64) {
        let no_points = self.path.len();
        let scaled = pos.rem_euclid(1.0) * no_points as f64;

        let idx = (scaled.floor() as usize) % no_points;
        let idx_next = (idx + 1) % no_points;
        let frac = scaled - scaled.floor();

        let p0 = self.path[idx];
        let p1 = self.path[idx_next];

        (
            p0[0] + (p1[0] - p0[0]) * frac,
            p0[1] + (p1[1] - p0[1]) * frac,
        )
    }

    /// heading_at returns the forward direction angle (rad) at a lap fraction, approximated by a
    /// forward difference of point_at. Used only by rendering consumers.
    pub fn heading_at(&self, pos: f64) -> f64 {
        let (x0, y0) = self.point_at(pos);
        let (x1, y1) = self.point_at(pos + HEADING_EPS);
        (y1 - y0).atan2(x1 - x0)
    }

    pub fn in_drs_zone(&self, pos: f64) -> bool {
        let pos = pos.rem_euclid(1.0);
        self.drs_zones
            .iter()
            .any(|zone| zone[0] <= pos && pos <= zone[1])
    }

    pub fn in_pit_lane(&self, pos: f64) -> bool {
        let pos = pos.rem_euclid(1.0);
        self.pit_lane[0] <= pos && pos <= self.pit_lane[1]
    }

    /// Lap fraction a car is snapped to when it leaves its pit box.
    pub fn pit_exit(&self) -> f64 {
        self.pit_lane[1]
    }
}
