// SPDX-License-Identifier: GPL-3.0-only

//! System power-off

use crate::errors::ShutdownError;
use std::process::Command;
use tracing::{error, warn};

/// Irreversible power-off of the unit
pub trait PowerControl: Send + Sync {
    /// Power the system off; returns only if the command failed or the OS is
    /// still shutting down
    fn power_off(&self) -> Result<(), ShutdownError>;
}

/// Runs an external command (default `sudo poweroff`)
#[derive(Debug, Clone)]
pub struct SystemPowerControl {
    command: Vec<String>,
}

impl SystemPowerControl {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }
}

impl PowerControl for SystemPowerControl {
    fn power_off(&self) -> Result<(), ShutdownError> {
        let (program, args) = self.command.split_first().ok_or(ShutdownError::NoCommand)?;

        warn!(program = %program, ?args, "Powering off");

        let status = Command::new(program)
            .args(args)
            .status()
            .map_err(|source| ShutdownError::Spawn {
                program: program.clone(),
                source,
            })?;

        if !status.success() {
            error!(program = %program, %status, "Power-off command failed");
            return Err(ShutdownError::Failed {
                program: program.clone(),
                status,
            });
        }

        Ok(())
    }
}
