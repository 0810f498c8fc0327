use crate::core::agent::EntryPars;
use crate::core::circuit::{CircuitPars, CornerPars};
use crate::core::compound::{Compound, CompoundTable};
use crate::core::race::SimConstants;
use anyhow::Context;
use serde::Deserialize;
use std::fs::OpenOptions;
use std::path::Path;

/// SessionPars is used to store all parameter structs of one race session. The compound table
/// and the engine constants are optional in the file and fall back to the tuned defaults.
#[derive(Debug, Deserialize, Clone)]
pub struct SessionPars {
    pub circuit_pars: CircuitPars,
    pub entry_pars_all: Vec<EntryPars>,
    #[serde(default)]
    pub compounds: CompoundTable,
    #[serde(default)]
    pub consts: SimConstants,
}

/// read_session_pars reads the JSON file and decodes the JSON string into the session parameter
/// struct.
pub fn read_session_pars(filepath: &Path) -> anyhow::Result<SessionPars> {
    let fh = OpenOptions::new()
        .read(true)
        .open(filepath)
        .context(format!(
            "Failed to open parameter file {}!",
            filepath.to_str().unwrap_or("unknown")
        ))?;
    let pars = serde_json::from_reader(&fh).context(format!(
        "Failed to parse parameter file {}!",
        filepath.to_str().unwrap_or("unknown")
    ))?;
    Ok(pars)
}

impl SessionPars {
    /// Built-in session used when no parameter file is given: a 52-lap race on a generic oval
    /// circuit with one player entry and nine AI entries.
    pub fn demo() -> SessionPars {
        let no_points = 36;
        let path = (0..no_points)
            .map(|i| {
                let angle = i as f64 / no_points as f64 * std::f64::consts::TAU;
                [0.5 + 0.42 * angle.cos(), 0.5 + 0.36 * angle.sin()]
            })
            .collect();

        let circuit_pars = CircuitPars {
            name: "Autodromo Nazionale Demo".to_string(),
            lap_count: 52,
            length_m: 5280.0,
            path,
            drs_zones: vec![[0.03, 0.16], [0.52, 0.64]],
            pit_lane: [0.88, 0.965],
            corners: vec![
                CornerPars {
                    pos: 0.18,
                    name: "Curva Uno".to_string(),
                },
                CornerPars {
                    pos: 0.47,
                    name: "Tornante".to_string(),
                },
                CornerPars {
                    pos: 0.74,
                    name: "Parabolica".to_string(),
                },
            ],
        };

        let entry = |display_name: &str, team: &str, color: &str, is_player: bool| EntryPars {
            display_name: display_name.to_string(),
            team: team.to_string(),
            color: color.to_string(),
            is_player,
            compound: Compound::Medium,
        };

        let entry_pars_all = vec![
            entry("N. Varga", "Vortex", "#7a00e0", false),
            entry("A. Keller", "Meridian", "#1e9be6", true),
            entry("L. Okafor", "Vortex", "#7a00e0", false),
            entry("M. Sato", "Meridian", "#1e9be6", false),
            entry("J. Duarte", "Solari", "#e6b800", false),
            entry("P. Lindqvist", "Solari", "#e6b800", false),
            entry("R. Castellanos", "Kestrel", "#d40000", false),
            entry("T. Abara", "Kestrel", "#d40000", false),
            entry("H. Brandt", "Arcadia", "#00b36b", false),
            entry("E. Moreau", "Arcadia", "#00b36b", false),
        ];

        SessionPars {
            circuit_pars,
            entry_pars_all,
            compounds: CompoundTable::default(),
            consts: SimConstants::default(),
        }
    }
}
