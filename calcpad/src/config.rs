use crate::backlight;
use crate::mode::Mode;
use dotenv::var;
use serde::{Deserialize, Serialize};
use std::env::var_os;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

#[derive(Serialize, Deserialize, Debug)]
#[serde(default)]
pub struct Config {
    /// Mode the driver starts in.
    pub start_mode: Mode,
    /// Scan loop period.
    pub scan_delay_ms: u64,
    /// Quiet window after a key release.
    pub bounce_delay_ms: u64,
    /// Initial backlight level, 0..=10.
    pub brightness: u8,
    /// Fire brightness commands on press instead of release.
    pub brightness_on_press: bool,
    /// PWM chip index under /sys/class/pwm.
    pub pwm_chip: usize,
    /// PWM channel driving the backlight.
    pub pwm_channel: usize,
    /// Where the status file for the tray indicator is written.
    pub status_path: PathBuf,
    /// Directory the mode icons are read from.
    pub icon_dir: PathBuf,
}

impl Config {
    pub fn try_load() -> Option<Self> {
        let config_str = var_os("CONFIG_FILE");
        let config_str: &OsStr = config_str.as_deref().unwrap_or(OsStr::new("config.json"));
        let config_path = Path::new(config_str);
        if config_path.exists() {
            let file = std::fs::File::open(config_path).ok()?;
            let reader = std::io::BufReader::new(file);
            serde_json::from_reader(reader).ok()
        } else {
            None
        }
    }

    pub fn save(&self) -> std::io::Result<()> {
        let config_str = var("CONFIG_FILE").unwrap_or_else(|_| "config.json".to_string());
        let config_path = Path::new(&config_str);
        let file = std::fs::File::create(config_path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            start_mode: Mode::Normal,
            scan_delay_ms: 5,
            bounce_delay_ms: 250,
            brightness: backlight::MAX_BRIGHTNESS,
            brightness_on_press: false,
            pwm_chip: 0,
            pwm_channel: 0,
            status_path: PathBuf::from("/run/calcpad/status.json"),
            icon_dir: PathBuf::from("/usr/share/calcpad/icons"),
        }
    }
}
