use crate::core::race::RaceCtrl;
use crate::core::standings::gap_ahead_seconds;
use rand::Rng;

// gap under which a DRS attack call is worth making
const ATTACK_GAP_S: f64 = 1.2;
// advisory fires on the last laps of the race
const FINAL_LAPS: u32 = 3;
// filler lines used when no predicate matches
const FILLER_LINES: [&str; 5] = [
    "All channels quiet. Keep hitting your marks.",
    "Pace looks tidy. Stay with it.",
    "Telemetry is clean, nothing to report.",
    "Watch your braking references, track is evolving.",
    "Head down, lap by lap.",
];

/// Evaluates the ordered heuristic list against the current world state and returns the first
/// matching advisory. The evaluation order is the priority contract: race-control broadcasts
/// first, then tyre-critical warnings, then strategy, then tactical opportunities, then filler.
pub fn evaluate(ctrl: &mut RaceCtrl) -> String {
    if let Some(broadcast) = ctrl.take_broadcast() {
        return broadcast;
    }

    let consts = ctrl.consts.clone();
    let player = ctrl.player();
    let laps_remaining = ctrl.laps_remaining(player);

    if player.tyre_wear >= consts.tyre_critical_wear {
        return format!(
            "Tyres are gone, {:.0}% wear. Box this lap, box box.",
            player.tyre_wear
        );
    }

    if player.tyre_wear >= consts.player_pit_window_wear
        && laps_remaining > consts.ai_min_laps_remaining
    {
        return "Pit window is open. Thinking about the undercut.".to_string();
    }

    if player.fuel_pct < laps_remaining as f64 * consts.fuel_per_lap {
        return "Fuel is marginal. Lift and coast, switch to conserve.".to_string();
    }

    if ctrl.flag.is_safety_car() && player.tyre_wear >= consts.player_pit_window_wear * 0.5 {
        return "Safety car on track. Cheap stop if you want it.".to_string();
    }

    if player.drs_eligible {
        if let Some(gap) = gap_ahead_seconds(ctrl) {
            if gap < ATTACK_GAP_S {
                return format!("Car ahead within {:.1}s. DRS enabled, go get him.", gap);
            }
        }
    }

    if player.ers_charge >= 99.0 && !player.ers_deploying {
        return "ERS is full. Deploy when you need it.".to_string();
    }

    if laps_remaining <= FINAL_LAPS && laps_remaining > 0 {
        return format!("{} laps to go. Everything you have now.", laps_remaining);
    }

    let pick = ctrl.rng_mut().gen_range(0..FILLER_LINES.len());
    FILLER_LINES[pick].to_string()
}
