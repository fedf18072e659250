//! Status indicator: surfaces the active mode as an icon and tooltip.
//!
//! The daemon has no GUI of its own; it publishes the current state to a
//! small JSON file that a tray applet (or anything else) can watch.

use crate::mode::Mode;
use log::debug;
use serde::Serialize;
use std::fmt::Debug as FmtDebug;
use std::io;
use std::path::{Path, PathBuf};

pub trait StatusIndicator: FmtDebug {
    /// Called once per confirmed mode change; publishes both the icon
    /// and the tooltip for the mode.
    fn show_mode(&mut self, mode: Mode) -> io::Result<()>;
}

pub fn icon_for_mode(mode: Mode) -> &'static str {
    match mode {
        Mode::Second => "2nd.png",
        Mode::AlphaLower => "lowercase.png",
        Mode::AlphaUpper => "uppercase.png",
        Mode::Calculator => "ti83mode.png",
        Mode::Normal => "numbers.png",
    }
}

pub fn tooltip_for_mode(mode: Mode) -> &'static str {
    match mode {
        Mode::Second => "2nd",
        Mode::AlphaLower => "Alpha (lowercase)",
        Mode::AlphaUpper => "Alpha (uppercase)",
        Mode::Calculator => "Calculator",
        Mode::Normal => "Normal",
    }
}

#[derive(Serialize)]
struct Status<'a> {
    icon: &'a str,
    tooltip: &'a str,
}

/// Writes `{ "icon": ..., "tooltip": ... }` to a status file on every
/// mode change.
#[derive(Debug)]
pub struct FileIndicator {
    path: PathBuf,
    icon_dir: PathBuf,
    icon: String,
    tooltip: String,
}

impl FileIndicator {
    pub fn new(path: impl Into<PathBuf>, icon_dir: impl Into<PathBuf>) -> Self {
        FileIndicator {
            path: path.into(),
            icon_dir: icon_dir.into(),
            icon: String::new(),
            tooltip: String::new(),
        }
    }

    fn icon_path(&self, image_file: &str) -> String {
        self.icon_dir.join(image_file).to_string_lossy().into_owned()
    }

    fn publish(&self) -> io::Result<()> {
        let status = Status {
            icon: &self.icon,
            tooltip: &self.tooltip,
        };
        if let Some(parent) = self.path.parent() {
            if parent != Path::new("") && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = std::fs::File::create(&self.path)?;
        let writer = io::BufWriter::new(file);
        serde_json::to_writer(writer, &status)?;
        Ok(())
    }
}

impl StatusIndicator for FileIndicator {
    fn show_mode(&mut self, mode: Mode) -> io::Result<()> {
        debug!("Indicator: {:?}", mode);
        self.icon = self.icon_path(icon_for_mode(mode));
        self.tooltip = tooltip_for_mode(mode).to_string();
        self.publish()
    }
}
