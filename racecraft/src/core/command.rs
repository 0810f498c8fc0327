use crate::core::agent::DriveMode;
use crate::core::compound::Compound;
use crate::core::race::RaceCtrl;
use log::debug;

/// Intents the presentation layer may issue to a running simulation. Each is validated before
/// effect; invalid commands are silently ignored to keep the UI responsive. None of them mutate
/// physics synchronously: they set intent flags or control fields that the next tick consumes.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetMode(DriveMode),
    RequestPit,
    SetNextCompound(Compound),
    ToggleDrs,
    ToggleErs,
    Pause,
    Resume,
    SetSpeedMultiplier(u32),
}

impl RaceCtrl {
    pub fn apply_command(&mut self, command: Command) {
        match command {
            // viewer controls stay available after the chequered flag
            Command::Pause => {
                self.paused = true;
            }
            Command::Resume => {
                self.paused = false;
            }
            Command::SetSpeedMultiplier(factor) => {
                if factor >= 1 {
                    self.speed_multiplier = factor;
                } else {
                    debug!("Ignoring speed multiplier of 0");
                }
            }
            // car controls are dropped after the chequered flag
            _ if self.race_complete => {
                debug!("Ignoring car command after the chequered flag");
            }
            Command::SetMode(mode) => {
                self.player_mut().mode = mode;
            }
            Command::RequestPit => {
                let player = self.player_mut();
                if !player.in_pit() {
                    player.pit_requested = true;
                } else {
                    debug!("Ignoring pit request while already in pit");
                }
            }
            Command::SetNextCompound(compound) => {
                self.player_mut().next_compound = Some(compound);
            }
            Command::ToggleDrs => {
                let player = self.player_mut();
                if player.drs_eligible {
                    player.drs_open = !player.drs_open;
                } else {
                    debug!("Ignoring DRS toggle outside a DRS zone");
                }
            }
            Command::ToggleErs => {
                let player = self.player_mut();
                if player.ers_deploying {
                    player.ers_deploying = false;
                } else if player.ers_charge > 0.0 {
                    player.ers_deploying = true;
                }
            }
        }
    }
}
