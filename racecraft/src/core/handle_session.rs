use crate::core::advisory;
use crate::core::command::Command;
use crate::core::race::RaceCtrl;
use crate::interfaces::snapshot::{build_snapshot, Snapshot};
use crate::pre::read_pars::SessionPars;
use anyhow::Context;
use flume::{Receiver, Sender, TryRecvError};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::thread::sleep;
use std::time::{Duration, Instant};

// frame delay while paused in non-realtime mode, to avoid spinning
const PAUSED_FRAME_MS: u64 = 10;

/// handle_session creates a race from the inserted parameters and runs it to the chequered flag
/// on the calling thread. It is the single mutator of the simulation state: commands arrive over
/// `command_rx` and are applied between frames, snapshots leave over `snapshot_tx` every sync
/// interval. In realtime mode each frame is padded to the physics step divided by the realtime
/// factor; `speed_multiplier` ticks are applied per frame either way.
pub fn handle_session(
    session_pars: &SessionPars,
    snapshot_tx: &Sender<Snapshot>,
    command_rx: &Receiver<Command>,
    realtime: bool,
    realtime_factor: f64,
) -> anyhow::Result<()> {
    let mut ctrl = RaceCtrl::new(
        &session_pars.circuit_pars,
        &session_pars.entry_pars_all,
        session_pars.compounds.to_owned(),
        session_pars.consts.to_owned(),
        Box::new(StdRng::from_entropy()),
    )?;

    let sync_interval = ctrl.consts.sync_interval_ticks as u64;
    let mut last_snap_tick = 0u64;
    let mut pause_reported = false;

    loop {
        let t_start = Instant::now();

        // route queued commands onto the simulation thread, in arrival order
        loop {
            match command_rx.try_recv() {
                Ok(command) => ctrl.apply_command(command),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    info!("Command channel closed, ending session");
                    return Ok(());
                }
            }
        }

        if !ctrl.paused && !ctrl.race_complete {
            for _ in 0..ctrl.speed_multiplier {
                ctrl.simulate_tick();

                if ctrl.is_advisory_tick() {
                    ctrl.latest_advisory = advisory::evaluate(&mut ctrl);
                }

                if ctrl.race_complete {
                    break;
                }
            }
        }

        // while paused the state cannot change, so only the pause transition is reported
        if ctrl.tick >= last_snap_tick + sync_interval
            || ctrl.race_complete
            || (ctrl.paused && !pause_reported)
        {
            let snapshot = build_snapshot(&ctrl)?;
            snapshot_tx
                .send(snapshot)
                .context("Failed to send snapshot to the consumer!")?;
            last_snap_tick = ctrl.tick;
        }
        pause_reported = ctrl.paused;

        if ctrl.race_complete {
            info!("Session finished after {} ticks", ctrl.tick);
            return Ok(());
        }

        if realtime {
            // sleep until the frame is finished in real time as well (calculation in ms)
            let t_sleep = (ctrl.consts.tick_seconds * 1000.0 / realtime_factor) as i64
                - t_start.elapsed().as_millis() as i64;

            if t_sleep > 0 {
                sleep(Duration::from_millis(t_sleep as u64));
            } else {
                warn!("Could not keep up with real-time!");
            }
        } else if ctrl.paused {
            sleep(Duration::from_millis(PAUSED_FRAME_MS));
        }
    }
}
