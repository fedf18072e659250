//! Power-off action triggered by the power-key gesture.

use log::info;
use std::fmt::Debug;
use std::io;
use std::process::Command;

pub trait PowerControl: Debug {
    fn shutdown(&mut self) -> io::Result<()>;
}

/// Shuts the machine down through systemd.
#[derive(Debug, Default)]
pub struct SystemPower;

impl PowerControl for SystemPower {
    fn shutdown(&mut self) -> io::Result<()> {
        info!("Power down");
        let status = Command::new("systemctl").arg("poweroff").status()?;
        if !status.success() {
            return Err(io::Error::other(format!(
                "systemctl poweroff exited with {}",
                status
            )));
        }
        Ok(())
    }
}
