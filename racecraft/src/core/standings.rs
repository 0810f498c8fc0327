use crate::core::agent::Agent;
use crate::core::race::RaceCtrl;
use helpers::general::{argsort, SortOrder};

/// One row of the ranked order derived from agent progress each sync interval.
#[derive(Debug, Clone)]
pub struct StandingEntry {
    pub rank: u32,
    pub agent_id: usize,
    pub display_name: String,
    pub team: String,
    pub lap: u32,
    pub pos_on_track: f64,
    pub in_pit: bool,
}

/// Ranks all non-retired agents by (lap, position on track) descending. Ties are broken
/// deterministically by agent id since argsort is stable and agents are scanned in id order.
pub fn compute_standings(ctrl: &RaceCtrl) -> Vec<StandingEntry> {
    let running: Vec<&Agent> = ctrl.agents.iter().filter(|a| !a.retired).collect();
    let progs: Vec<f64> = running.iter().map(|a| a.race_prog()).collect();

    argsort(&progs, SortOrder::Descending)
        .into_iter()
        .enumerate()
        .map(|(i, idx)| {
            let agent = running[idx];
            StandingEntry {
                rank: i as u32 + 1,
                agent_id: agent.id,
                display_name: agent.display_name.to_owned(),
                team: agent.team.to_owned(),
                lap: agent.lap,
                pos_on_track: agent.pos_on_track,
                in_pit: agent.in_pit(),
            }
        })
        .collect()
}

/// Gap strings to the cars directly ahead of and behind the player. The gap is the progress
/// delta times a constant seconds-per-lap approximation, not a physically derived delta. Cars
/// in the pit report a literal status instead of a number.
pub fn player_gaps(ctrl: &RaceCtrl, standings: &[StandingEntry]) -> (String, String) {
    let player = ctrl.player();
    let player_rank_idx = standings.iter().position(|e| e.agent_id == player.id);

    let idx = match player_rank_idx {
        Some(idx) => idx,
        // player retired or not ranked
        None => return ("-".to_string(), "-".to_string()),
    };

    let gap_to = |entry: &StandingEntry| -> String {
        if entry.in_pit {
            return "IN PIT".to_string();
        }
        let other_prog = entry.lap as f64 + entry.pos_on_track;
        let delta_s = (other_prog - player.race_prog()).abs() * ctrl.consts.seconds_per_lap_gap;
        format!("+{:.1}s", delta_s)
    };

    let ahead = if idx == 0 {
        "LEADER".to_string()
    } else {
        gap_to(&standings[idx - 1])
    };

    let behind = if idx + 1 >= standings.len() {
        "-".to_string()
    } else {
        gap_to(&standings[idx + 1])
    };

    (ahead, behind)
}

/// Progress delta (in approximate seconds) to the nearest running car ahead of the player,
/// if any. Used by the advisory engine for attack calls.
pub fn gap_ahead_seconds(ctrl: &RaceCtrl) -> Option<f64> {
    let player = ctrl.player();
    ctrl.agents
        .iter()
        .filter(|a| !a.retired && a.id != player.id && a.race_prog() > player.race_prog())
        .map(|a| (a.race_prog() - player.race_prog()) * ctrl.consts.seconds_per_lap_gap)
        .fold(None, |acc: Option<f64>, gap| match acc {
            Some(best) if best <= gap => Some(best),
            _ => Some(gap),
        })
}
