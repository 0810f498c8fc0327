use clap::Parser;
use racecraft::core::command::Command;
use racecraft::core::handle_session::handle_session;
use racecraft::interfaces::snapshot::Snapshot;
use racecraft::pre::read_pars::{read_session_pars, SessionPars};
use racecraft::pre::sim_opts::SimOpts;
use std::thread;
use std::time::Instant;

fn print_standings(snapshot: &Snapshot) {
    println!(
        "LAP {:2}/{} | FLAG {} | P{} | ahead {} | behind {} | {} wear {:4.1}% | fuel {:4.1}%",
        snapshot.player.lap,
        snapshot.total_laps,
        snapshot.flag.code(),
        snapshot.player.rank,
        snapshot.player.gap_ahead,
        snapshot.player.gap_behind,
        snapshot.player.compound.short_code(),
        snapshot.player.tyre_wear,
        snapshot.player.fuel_pct,
    );
}

fn print_final_classification(snapshot: &Snapshot) {
    println!("RESULT: Final classification");
    for row in snapshot.standings.iter() {
        println!(
            "  P{:<2} {:18} {:10} lap {:2}{}",
            row.rank,
            row.display_name,
            row.team,
            row.lap,
            if row.in_pit { "  (in pit)" } else { "" }
        );
    }
}

fn main() -> anyhow::Result<()> {
    // PRE-PROCESSING ------------------------------------------------------------------------------
    // get simulation options from the command line arguments
    let sim_opts: SimOpts = SimOpts::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if sim_opts.debug {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();

    // get session parameters
    let mut session_pars = if let Some(parfile_path) = &sim_opts.parfile_path {
        log::info!("Reading session parameters from {:?}", parfile_path);
        read_session_pars(parfile_path)?
    } else {
        log::info!("No parameter file provided, using the built-in demo grid");
        SessionPars::demo()
    };

    if let Some(laps) = sim_opts.laps {
        session_pars.circuit_pars.lap_count = laps;
    }

    log::info!(
        "Simulating {} laps at {} with {} cars",
        session_pars.circuit_pars.lap_count,
        session_pars.circuit_pars.name,
        session_pars.entry_pars_all.len()
    );

    // EXECUTION -----------------------------------------------------------------------------------
    let (snapshot_tx, snapshot_rx) = flume::unbounded();
    let (command_tx, command_rx) = flume::unbounded();

    let realtime = !sim_opts.headless;
    let realtime_factor = sim_opts.realtime_factor;
    let session_pars_thread = session_pars.clone();

    let sim_handle = thread::spawn(move || {
        handle_session(
            &session_pars_thread,
            &snapshot_tx,
            &command_rx,
            realtime,
            realtime_factor,
        )
    });

    if sim_opts.speed_multiplier > 1 {
        command_tx.send(Command::SetSpeedMultiplier(sim_opts.speed_multiplier))?;
    }

    let t_start = Instant::now();
    let mut last_printed_lap = 0u32;
    let mut last_advisory = String::new();
    let mut final_snapshot: Option<Snapshot> = None;

    for snapshot in snapshot_rx.iter() {
        if !sim_opts.headless {
            if snapshot.player.lap > last_printed_lap {
                print_standings(&snapshot);
                last_printed_lap = snapshot.player.lap;
            }

            if !snapshot.advisory.is_empty() && snapshot.advisory != last_advisory {
                println!("RADIO: {}", snapshot.advisory);
                last_advisory = snapshot.advisory.to_owned();
            }
        }

        if snapshot.race_complete {
            final_snapshot = Some(snapshot);
            break;
        }
    }

    drop(command_tx);
    sim_handle
        .join()
        .map_err(|_| anyhow::anyhow!("Simulation thread panicked!"))??;

    log::info!("Execution time: {}ms", t_start.elapsed().as_millis());

    if let Some(snapshot) = final_snapshot {
        print_final_classification(&snapshot);
    }

    Ok(())
}
