//! PWM through the kernel's `/sys/class/pwm` interface.

use crate::pwm::{PwmDriver, PwmPin, PwmPolarity};
use crate::{GpioError, GpioResult};
use std::fmt::{Debug, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

fn read_attr(base: &Path, name: &str) -> GpioResult<String> {
    let content = std::fs::read_to_string(base.join(name))?;
    Ok(content.trim().to_string())
}

fn write_attr(base: &Path, name: &str, value: impl ToString) -> GpioResult<()> {
    std::fs::write(base.join(name), value.to_string())?;
    Ok(())
}

pub struct SysfsPwmDriver {
    base_path: PathBuf,
}

impl SysfsPwmDriver {
    pub fn get_chip(index: usize) -> GpioResult<Self> {
        let chip_path = Path::new("/sys/class/pwm").join(format!("pwmchip{}", index));
        if !chip_path.exists() {
            return Err(GpioError::InvalidArgument);
        }
        Ok(SysfsPwmDriver {
            base_path: chip_path,
        })
    }
}

impl Debug for SysfsPwmDriver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "SysfsPwmDriver({:?})", self.base_path)
    }
}

impl PwmDriver for SysfsPwmDriver {
    fn count(&self) -> GpioResult<usize> {
        read_attr(&self.base_path, "npwm")?
            .parse()
            .map_err(|_| GpioError::Other("parsing PWM pin count failed".to_string()))
    }

    fn get_pin(&self, index: usize) -> GpioResult<Box<dyn PwmPin + '_>> {
        let path = self.base_path.join(format!("pwm{}", index));
        if !path.exists() {
            // Channels appear only after being exported.
            write_attr(&self.base_path, "export", index)?;
        }
        if !path.exists() {
            return Err(GpioError::InvalidArgument);
        }
        Ok(Box::new(SysfsPwmPin { base_path: path }))
    }
}

pub struct SysfsPwmPin {
    base_path: PathBuf,
}

impl Debug for SysfsPwmPin {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "SysfsPwmPin({:?})", self.base_path)
    }
}

impl PwmPin for SysfsPwmPin {
    fn period_ns(&self) -> GpioResult<u32> {
        read_attr(&self.base_path, "period")?
            .parse()
            .map_err(|_| GpioError::Other("parsing PWM period failed".to_string()))
    }

    fn set_period_ns(&mut self, period_ns: u32) -> GpioResult<()> {
        write_attr(&self.base_path, "period", period_ns)
    }

    fn duty_ns(&self) -> GpioResult<u32> {
        read_attr(&self.base_path, "duty_cycle")?
            .parse()
            .map_err(|_| GpioError::Other("parsing PWM duty cycle failed".to_string()))
    }

    fn set_duty_ns(&mut self, duty_ns: u32) -> GpioResult<()> {
        write_attr(&self.base_path, "duty_cycle", duty_ns)
    }

    fn polarity(&self) -> GpioResult<PwmPolarity> {
        PwmPolarity::from_str(&read_attr(&self.base_path, "polarity")?)
    }

    fn set_polarity(&mut self, polarity: PwmPolarity) -> GpioResult<()> {
        write_attr(&self.base_path, "polarity", polarity)
    }

    fn is_enabled(&self) -> GpioResult<bool> {
        match read_attr(&self.base_path, "enable")?.as_str() {
            "1" => Ok(true),
            "0" => Ok(false),
            _ => Err(GpioError::Other(
                "parsing PWM enabled state failed".to_string(),
            )),
        }
    }

    fn enable(&mut self) -> GpioResult<()> {
        write_attr(&self.base_path, "enable", 1)
    }

    fn disable(&mut self) -> GpioResult<()> {
        write_attr(&self.base_path, "enable", 0)
    }
}
