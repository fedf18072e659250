//! Keypad backlight over a PWM channel, in discrete brightness steps.

use calcpad_gpio::GpioResult;
use calcpad_gpio::pwm::PwmPin;
use log::info;
use std::fmt::{Debug, Formatter};

pub const MAX_BRIGHTNESS: u8 = 10;

pub trait Backlight: Debug {
    fn level(&self) -> u8;

    /// Sets an absolute level, clamped to `0..=MAX_BRIGHTNESS`.
    fn set_level(&mut self, level: u8) -> GpioResult<()>;

    fn step_up(&mut self) -> GpioResult<()> {
        self.set_level(self.level().saturating_add(1))
    }

    fn step_down(&mut self) -> GpioResult<()> {
        self.set_level(self.level().saturating_sub(1))
    }
}

/// Fallback used when no PWM channel is available. Tracks the level so
/// the brightness keys still behave consistently.
#[derive(Debug)]
pub struct NullBacklight {
    level: u8,
}

impl NullBacklight {
    pub fn new(initial: u8) -> Self {
        NullBacklight {
            level: initial.min(MAX_BRIGHTNESS),
        }
    }
}

impl Backlight for NullBacklight {
    fn level(&self) -> u8 {
        self.level
    }

    fn set_level(&mut self, level: u8) -> GpioResult<()> {
        self.level = level.min(MAX_BRIGHTNESS);
        Ok(())
    }
}

const PERIOD_NS: u32 = 1_000_000; // 1 kHz

pub struct PwmBacklight<'a> {
    pin: Box<dyn PwmPin + 'a>,
    level: u8,
}

impl<'a> PwmBacklight<'a> {
    pub fn new(mut pin: Box<dyn PwmPin + 'a>, initial: u8) -> GpioResult<Self> {
        pin.set_period_ns(PERIOD_NS)?;
        let mut backlight = PwmBacklight { pin, level: 0 };
        backlight.set_level(initial)?;
        backlight.pin.enable()?;
        Ok(backlight)
    }
}

impl Debug for PwmBacklight<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "PwmBacklight({:?}, level {})", self.pin, self.level)
    }
}

impl Backlight for PwmBacklight<'_> {
    fn level(&self) -> u8 {
        self.level
    }

    fn set_level(&mut self, level: u8) -> GpioResult<()> {
        let level = level.min(MAX_BRIGHTNESS);
        let duty = PERIOD_NS / MAX_BRIGHTNESS as u32 * level as u32;
        self.pin.set_duty_ns(duty)?;
        self.level = level;
        info!("Backlight level {}", level);
        Ok(())
    }
}
