mod backlight;
mod config;
mod dispatch;
mod emulator;
mod indicator;
mod inject;
mod keys;
mod layout;
mod mode;
mod power;
mod scanner;

use crate::backlight::{Backlight, NullBacklight, PwmBacklight};
use crate::config::Config;
use crate::emulator::KeyEmulator;
use crate::indicator::FileIndicator;
use crate::inject::UinputInjector;
use crate::mode::ModeController;
use crate::power::SystemPower;
use crate::scanner::Scanner;
use calcpad_gpio::GpioActiveLevel::Low;
use calcpad_gpio::GpioBias::{PullDown, PullUp};
use calcpad_gpio::debounce::StableDebounce;
use calcpad_gpio::keypad::ShiftRegisterMatrix;
use calcpad_gpio::pwm::{PwmDriver, SysfsPwmDriver};
use calcpad_gpio::raw::RawGpioDriver;
use calcpad_gpio::sr595::ShiftRegister595;
use calcpad_gpio::{GpioDriver, GpioInput, GpioResult};
use dotenv::dotenv;
use log::{debug, error, info, warn};
use std::env::var;
use std::process;
use std::thread;
use std::time::Duration;

// Exit codes reported to the service manager.
const EXIT_GPIO: i32 = 1;
const EXIT_INJECTOR: i32 = 2;
const EXIT_PRIVILEGE: i32 = 3;

fn parse_pins(pin_str: &str) -> eyre::Result<Vec<usize>> {
    let pins: Vec<usize> = pin_str
        .split([',', ' ', ';'])
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse())
        .collect::<Result<_, _>>()?;
    if pins.is_empty() {
        return Err(eyre::eyre!("No column pins given"));
    }
    Ok(pins)
}

fn exit_on_gpio<T>(result: GpioResult<T>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            error!("GPIO initialization failed: {}", e);
            process::exit(EXIT_GPIO);
        }
    }
}

fn main() -> eyre::Result<()> {
    // Initialize environment and logger
    dotenv().ok();
    pretty_env_logger::init();

    info!("calcpad v{} starting...", env!("CARGO_PKG_VERSION"));

    // /dev/gpiomem and /dev/uinput both need root on a stock image.
    if unsafe { libc::geteuid() } != 0 {
        error!("calcpad must be run as root");
        process::exit(EXIT_PRIVILEGE);
    }

    // Get pin numbers from env
    let sr_data_pin_no: usize = var("CALCPAD_PIN_SR_DATA")?.parse()?;
    let sr_clock_pin_no: usize = var("CALCPAD_PIN_SR_CLOCK")?.parse()?;
    let sr_latch_pin_no: usize = var("CALCPAD_PIN_SR_LATCH")?.parse()?;
    let col_pin_nos = parse_pins(&var("CALCPAD_PINS_COLS")?)?;
    let power_pin_no: usize = var("CALCPAD_PIN_POWER")?.parse()?;

    info!(
        "Shift register @ Data: {}, Clock: {}, Latch: {}; Cols: {:?}; Power: {}",
        sr_data_pin_no, sr_clock_pin_no, sr_latch_pin_no, col_pin_nos, power_pin_no
    );

    debug!("Trying to load config...");
    let config = if let Some(config) = Config::try_load() {
        info!("Config loaded.");
        config
    } else {
        info!("Config not found. Using default");
        let config = Config::default();
        config.save()?;
        info!("Default config saved.");
        config
    };

    debug!("Initializing GPIO driver...");
    let gpio = match RawGpioDriver::new_gpiomem() {
        Ok(gpio) => gpio,
        Err(e) => {
            error!("Failed to open /dev/gpiomem: {}", e);
            process::exit(EXIT_GPIO);
        }
    };
    debug!("{:?} initialized.", gpio);

    let mut sr_data_pin = exit_on_gpio(gpio.get_pin(sr_data_pin_no));
    let sr_data_out = exit_on_gpio(sr_data_pin.as_output());
    let mut sr_clock_pin = exit_on_gpio(gpio.get_pin(sr_clock_pin_no));
    let sr_clock_out = exit_on_gpio(sr_clock_pin.as_output());
    let mut sr_latch_pin = exit_on_gpio(gpio.get_pin(sr_latch_pin_no));
    let sr_latch_out = exit_on_gpio(sr_latch_pin.as_output());

    let mut col_pins = Vec::with_capacity(col_pin_nos.len());
    for &pin_no in &col_pin_nos {
        let mut pin = exit_on_gpio(gpio.get_pin(pin_no));
        exit_on_gpio(pin.set_bias(PullDown));
        col_pins.push(pin);
    }
    let col_inputs: Vec<_> = col_pins
        .iter_mut()
        .map(|pin| exit_on_gpio(pin.as_input()))
        .collect();
    let cols: Vec<&dyn GpioInput> = col_inputs.iter().map(|input| &**input).collect();

    // The power key shorts to ground when pressed.
    let mut power_pin = exit_on_gpio(gpio.get_pin(power_pin_no));
    exit_on_gpio(power_pin.set_bias(PullUp));
    exit_on_gpio(power_pin.set_active_level(Low));
    let power_raw = exit_on_gpio(power_pin.as_input());
    let power_key = StableDebounce::new(&*power_raw);

    let rows = ShiftRegister595::new(&*sr_data_out, &*sr_clock_out, &*sr_latch_out, layout::ROWS);
    let matrix = ShiftRegisterMatrix::new(rows, cols);
    debug!("{:?} initialized.", matrix);

    debug!("Initializing key injector...");
    let mut injector = match UinputInjector::new() {
        Ok(injector) => injector,
        Err(e) => {
            error!("Failed to create uinput device: {}", e);
            process::exit(EXIT_INJECTOR);
        }
    };

    debug!("Initializing backlight...");
    let pwm_driver = SysfsPwmDriver::get_chip(config.pwm_chip);
    let mut pwm_backlight = None;
    match &pwm_driver {
        Ok(driver) => {
            match driver
                .get_pin(config.pwm_channel)
                .and_then(|pin| PwmBacklight::new(pin, config.brightness))
            {
                Ok(backlight) => pwm_backlight = Some(backlight),
                Err(e) => warn!("Backlight unavailable: {}", e),
            }
        }
        Err(e) => warn!("PWM chip {} unavailable: {}", config.pwm_chip, e),
    }
    let mut null_backlight = NullBacklight::new(config.brightness);
    let backlight: &mut dyn Backlight = match pwm_backlight.as_mut() {
        Some(backlight) => backlight,
        None => &mut null_backlight,
    };

    let mut indicator = FileIndicator::new(config.status_path.clone(), config.icon_dir.clone());
    let modes = ModeController::new(config.start_mode, &mut indicator);
    let emulator = KeyEmulator::new(&mut injector);
    let mut system_power = SystemPower;

    let mut scanner = Scanner::new(
        &matrix,
        &power_key,
        modes,
        emulator,
        backlight,
        &mut system_power,
        Duration::from_millis(config.bounce_delay_ms),
        config.brightness_on_press,
    );

    info!("calcpad initialized.");

    let scan_delay = Duration::from_millis(config.scan_delay_ms);
    info!("Starting scan loop...");
    while scanner.tick()? {
        thread::sleep(scan_delay);
    }

    info!("calcpad exiting.");
    Ok(())
}
