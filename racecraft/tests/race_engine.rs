use racecraft::core::advisory;
use racecraft::core::agent::{DriveMode, PitState};
use racecraft::core::command::Command;
use racecraft::core::compound::Compound;
use racecraft::core::handle_session::handle_session;
use racecraft::core::race::{FlagState, RaceCtrl};
use racecraft::core::standings::compute_standings;
use racecraft::pre::read_pars::SessionPars;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Demo grid on a short lap so races wrap quickly in tests.
fn test_pars() -> SessionPars {
    let mut pars = SessionPars::demo();
    pars.circuit_pars.length_m = 300.0;
    pars
}

fn ctrl_with_seed(pars: &SessionPars, seed: u64) -> RaceCtrl {
    RaceCtrl::new(
        &pars.circuit_pars,
        &pars.entry_pars_all,
        pars.compounds.clone(),
        pars.consts.clone(),
        Box::new(StdRng::seed_from_u64(seed)),
    )
    .unwrap()
}

#[test]
fn state_invariants_hold_over_many_ticks() {
    let pars = test_pars();
    let mut ctrl = ctrl_with_seed(&pars, 7);

    for _ in 0..5000 {
        ctrl.simulate_tick();

        for agent in ctrl.agents.iter() {
            assert!((0.0..=100.0).contains(&agent.tyre_wear));
            assert!((0.0..=100.0).contains(&agent.fuel_pct));
            assert!((0.0..=100.0).contains(&agent.ers_charge));
            assert!((0.0..1.0).contains(&agent.pos_on_track));
            assert!(agent.speed_kmh >= 0.0);
            // DRS may only be open while eligible
            assert!(!agent.drs_open || agent.drs_eligible);
        }
    }
}

#[test]
fn lap_increments_exactly_once_per_wrap() {
    let mut pars = test_pars();
    // no pit stops, so the only backwards position jump is a lap wrap
    pars.consts.ai_pit_wear_threshold = 1e9;
    let mut ctrl = ctrl_with_seed(&pars, 11);

    let player_idx = ctrl.player_idx();
    let mut wraps = 0u32;
    let mut prev_pos = ctrl.agents[player_idx].pos_on_track;
    let start_lap = ctrl.agents[player_idx].lap;

    for _ in 0..4000 {
        ctrl.simulate_tick();
        let pos = ctrl.agents[player_idx].pos_on_track;
        if pos < prev_pos {
            wraps += 1;
        }
        prev_pos = pos;
    }

    assert!(wraps > 0, "test must cover at least one lap wrap");
    assert_eq!(ctrl.agents[player_idx].lap - start_lap, wraps);
}

#[test]
fn pit_stop_round_trip_services_the_tyres() {
    let mut pars = test_pars();
    pars.consts.safety_car_prob_per_tick = 0.0;
    let mut ctrl = ctrl_with_seed(&pars, 3);

    let pit_entry = ctrl.circuit.pit_lane[0];
    let pit_exit = ctrl.circuit.pit_exit();
    let pit_ticks = ctrl.consts.pit_stop_ticks;

    // age the tyres a little so the reset is observable
    for _ in 0..3000 {
        ctrl.simulate_tick();
    }
    assert!(ctrl.player().tyre_wear > 0.0);

    // issue the request well before the pit entry so the crossing is observable
    for _ in 0..1000 {
        if ctrl.player().pos_on_track < 0.5 {
            break;
        }
        ctrl.simulate_tick();
    }
    assert!(ctrl.player().pos_on_track < 0.5);

    ctrl.apply_command(Command::SetNextCompound(Compound::Hard));
    ctrl.apply_command(Command::RequestPit);

    // drive until the car crosses the pit entry; it must stay out until then
    let mut entered = false;
    for _ in 0..30_000 {
        let pos_before = ctrl.player().pos_on_track;
        ctrl.simulate_tick();

        if ctrl.player().in_pit() {
            assert!(
                pos_before < pit_entry || pos_before > pit_exit,
                "car was already inside the pit lane before the entry tick"
            );
            entered = true;
            break;
        }
    }
    assert!(entered, "pit request never led to a pit entry");

    // tyres are serviced on entry
    assert_eq!(ctrl.player().tyre_wear, 0.0);
    assert_eq!(ctrl.player().tyre_age, 0);
    assert_eq!(ctrl.player().compound, Compound::Hard);
    assert!(!ctrl.player().pit_requested);

    // the stop runs its full standstill time, then releases at the pit exit
    for _ in 0..pit_ticks {
        assert!(ctrl.player().in_pit());
        ctrl.simulate_tick();
    }
    assert_eq!(ctrl.player().pit, PitState::OnTrack);
    assert_eq!(ctrl.player().pos_on_track, pit_exit);
}

#[test]
fn safety_car_episode_self_terminates() {
    let mut pars = test_pars();
    pars.consts.safety_car_prob_per_tick = 0.0;
    let mut ctrl = ctrl_with_seed(&pars, 5);

    ctrl.flag = FlagState::SafetyCar { timer_ticks: 50 };

    for _ in 0..49 {
        ctrl.simulate_tick();
        assert!(ctrl.flag.is_safety_car());
    }

    ctrl.simulate_tick();
    assert_eq!(ctrl.flag, FlagState::Green);
}

#[test]
fn safety_car_revokes_drs_eligibility() {
    let mut pars = test_pars();
    pars.consts.safety_car_prob_per_tick = 0.0;
    let mut ctrl = ctrl_with_seed(&pars, 5);

    // drive until the player is eligible inside a DRS zone
    let mut eligible_seen = false;
    for _ in 0..30_000 {
        ctrl.simulate_tick();
        if ctrl.player().drs_eligible {
            eligible_seen = true;
            break;
        }
    }
    assert!(eligible_seen);

    ctrl.apply_command(Command::ToggleDrs);
    assert!(ctrl.player().drs_open);

    ctrl.flag = FlagState::SafetyCar { timer_ticks: 500 };
    ctrl.simulate_tick();

    assert!(!ctrl.player().drs_eligible);
    assert!(!ctrl.player().drs_open);
}

#[test]
fn drs_toggle_outside_zone_is_ignored() {
    let pars = test_pars();
    let mut ctrl = ctrl_with_seed(&pars, 9);

    ctrl.simulate_tick();
    if !ctrl.player().drs_eligible {
        ctrl.apply_command(Command::ToggleDrs);
        assert!(!ctrl.player().drs_open);
    }

    // force the ineligible case regardless of where the first tick landed
    ctrl.player_mut().drs_eligible = false;
    ctrl.player_mut().drs_open = false;
    ctrl.apply_command(Command::ToggleDrs);
    assert!(!ctrl.player().drs_open);
}

#[test]
fn standings_are_a_strict_total_order_with_stable_ties() {
    let pars = test_pars();
    let mut ctrl = ctrl_with_seed(&pars, 21);

    for _ in 0..2000 {
        ctrl.simulate_tick();
    }

    let standings = compute_standings(&ctrl);
    assert_eq!(standings.len(), ctrl.agents.len());

    for (i, entry) in standings.iter().enumerate() {
        assert_eq!(entry.rank, i as u32 + 1);
    }
    for pair in standings.windows(2) {
        let prog_front = pair[0].lap as f64 + pair[0].pos_on_track;
        let prog_rear = pair[1].lap as f64 + pair[1].pos_on_track;
        assert!(prog_front >= prog_rear);
    }

    // exact progress ties rank the lower agent id first
    ctrl.agents[5].lap = ctrl.agents[2].lap;
    ctrl.agents[5].pos_on_track = ctrl.agents[2].pos_on_track;
    let standings = compute_standings(&ctrl);
    let rank_of = |id: usize| standings.iter().find(|e| e.agent_id == id).unwrap().rank;
    assert!(rank_of(2) < rank_of(5));
}

#[test]
fn thousand_ticks_progress_scenario() {
    let mut pars = test_pars();
    pars.consts.ai_pit_wear_threshold = 1e9;
    pars.consts.safety_car_prob_per_tick = 0.0;
    assert_eq!(pars.circuit_pars.lap_count, 52);

    let mut ctrl = ctrl_with_seed(&pars, 1);
    {
        let player = ctrl.player_mut();
        player.pos_on_track = 0.04;
        player.speed_kmh = 0.0;
        player.mode = DriveMode::Normal;
    }
    let fuel_start = ctrl.player().fuel_pct;
    let wear_start = ctrl.player().tyre_wear;
    let lap_start = ctrl.player().lap;

    for _ in 0..1000 {
        ctrl.simulate_tick();
    }

    assert!(ctrl.player().lap > lap_start);
    assert!(ctrl.player().tyre_wear > wear_start);
    assert!(ctrl.player().fuel_pct < fuel_start);
}

#[test]
fn pause_is_idempotent_and_stops_ticks() {
    let pars = test_pars();
    let mut ctrl = ctrl_with_seed(&pars, 2);

    ctrl.apply_command(Command::Pause);
    ctrl.apply_command(Command::Pause);
    assert!(ctrl.paused);

    let tick_before = ctrl.tick;
    ctrl.simulate_tick();
    assert_eq!(ctrl.tick, tick_before);

    ctrl.apply_command(Command::Resume);
    ctrl.simulate_tick();
    assert_eq!(ctrl.tick, tick_before + 1);
}

#[test]
fn invalid_commands_are_ignored() {
    let pars = test_pars();
    let mut ctrl = ctrl_with_seed(&pars, 2);

    ctrl.apply_command(Command::SetSpeedMultiplier(0));
    assert_eq!(ctrl.speed_multiplier, 1);
    ctrl.apply_command(Command::SetSpeedMultiplier(8));
    assert_eq!(ctrl.speed_multiplier, 8);

    // pit request while already in the pit box is a no-op
    ctrl.player_mut().pit = PitState::InPit { timer_ticks: 100 };
    ctrl.apply_command(Command::RequestPit);
    assert!(!ctrl.player().pit_requested);
    ctrl.player_mut().pit = PitState::OnTrack;

    // car commands after the chequered flag are ignored, viewer commands are not
    ctrl.race_complete = true;
    ctrl.apply_command(Command::SetMode(DriveMode::Push));
    assert_eq!(ctrl.player().mode, DriveMode::Normal);
    ctrl.apply_command(Command::RequestPit);
    assert!(!ctrl.player().pit_requested);
    ctrl.apply_command(Command::SetSpeedMultiplier(2));
    assert_eq!(ctrl.speed_multiplier, 2);
    ctrl.apply_command(Command::Pause);
    assert!(ctrl.paused);
    ctrl.apply_command(Command::Resume);
    assert!(!ctrl.paused);
}

#[test]
fn ers_deploys_and_regenerates() {
    let mut pars = test_pars();
    pars.consts.safety_car_prob_per_tick = 0.0;
    let mut ctrl = ctrl_with_seed(&pars, 13);

    ctrl.apply_command(Command::ToggleErs);
    assert!(ctrl.player().ers_deploying);

    for _ in 0..50 {
        ctrl.simulate_tick();
    }
    let drained = ctrl.player().ers_charge;
    assert!(drained < 100.0);

    ctrl.apply_command(Command::ToggleErs);
    assert!(!ctrl.player().ers_deploying);

    for _ in 0..50 {
        ctrl.simulate_tick();
    }
    assert!(ctrl.player().ers_charge > drained);
    assert!(ctrl.player().ers_charge <= 100.0);
}

#[test]
fn advisory_prefers_broadcasts_over_tyre_warnings() {
    let mut pars = test_pars();
    // deploy the safety car on the first tick
    pars.consts.safety_car_prob_per_tick = 1.0;
    let mut ctrl = ctrl_with_seed(&pars, 17);

    ctrl.player_mut().tyre_wear = 90.0;
    ctrl.simulate_tick();

    // race-control broadcast outranks the tyre warning
    let first = advisory::evaluate(&mut ctrl);
    assert!(first.contains("Safety car deployed"), "got: {}", first);

    // with the broadcast consumed, the tyre-critical warning wins
    let second = advisory::evaluate(&mut ctrl);
    assert!(second.contains("Box this lap"), "got: {}", second);
}

#[test]
fn advisory_falls_through_to_ers_hint() {
    let mut pars = test_pars();
    pars.consts.safety_car_prob_per_tick = 0.0;
    let mut ctrl = ctrl_with_seed(&pars, 17);
    ctrl.simulate_tick();

    // healthy car, full battery, nothing urgent on track
    let player = ctrl.player_mut();
    player.tyre_wear = 0.0;
    player.fuel_pct = 100.0;
    player.ers_charge = 100.0;
    player.ers_deploying = false;
    player.drs_eligible = false;

    let advisory = advisory::evaluate(&mut ctrl);
    assert!(advisory.contains("ERS is full"), "got: {}", advisory);
}

#[test]
fn paused_session_reports_the_pause_once() {
    let pars = test_pars();
    let (snapshot_tx, snapshot_rx) = flume::unbounded();
    let (command_tx, command_rx) = flume::unbounded();

    // queue the pause before the session starts, so no tick is ever simulated
    command_tx.send(Command::Pause).unwrap();

    let handle = std::thread::spawn(move || {
        handle_session(&pars, &snapshot_tx, &command_rx, false, 1.0)
    });

    let snapshot = snapshot_rx
        .recv_timeout(std::time::Duration::from_secs(5))
        .unwrap();
    assert!(snapshot.paused);
    assert_eq!(snapshot.tick, 0);

    // no further snapshots while nothing can change
    std::thread::sleep(std::time::Duration::from_millis(200));
    assert!(snapshot_rx.is_empty());

    // closing the command channel ends the session cleanly
    drop(command_tx);
    handle.join().unwrap().unwrap();
}

#[test]
fn same_seed_same_standings() {
    let pars = test_pars();
    let mut ctrl_a = ctrl_with_seed(&pars, 42);
    let mut ctrl_b = ctrl_with_seed(&pars, 42);

    for _ in 0..3000 {
        ctrl_a.simulate_tick();
        ctrl_b.simulate_tick();
    }

    let key = |ctrl: &RaceCtrl| -> Vec<(usize, u32, f64)> {
        compute_standings(ctrl)
            .iter()
            .map(|e| (e.agent_id, e.lap, e.pos_on_track))
            .collect()
    };
    assert_eq!(key(&ctrl_a), key(&ctrl_b));
}
