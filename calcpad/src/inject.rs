//! Key injection into the host's input stack.
//!
//! A uinput virtual keyboard is the injection primitive: whatever display
//! server is running picks the events up like any other keyboard. Each
//! event is emitted (and therefore flushed with its own SYN report)
//! before the next one is issued, so ordering across modifier and key
//! events is guaranteed.

use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{AttributeSet, EventType, InputEvent, Key};
use log::trace;
use std::fmt::{Debug, Formatter};
use std::io;

pub trait KeyInjector: Debug {
    /// Injects one key transition and flushes it.
    fn inject(&mut self, key: Key, down: bool) -> io::Result<()>;
}

pub struct UinputInjector {
    device: VirtualDevice,
}

impl UinputInjector {
    pub fn new() -> io::Result<Self> {
        let mut keys = AttributeSet::<Key>::new();
        // Advertise the whole keyboard range rather than enumerating the
        // exact set the layouts use.
        for code in 1..=Key::KEY_MICMUTE.code() {
            keys.insert(Key::new(code));
        }

        let device = VirtualDeviceBuilder::new()?
            .name("calcpad keypad")
            .with_keys(&keys)?
            .build()?;

        Ok(UinputInjector { device })
    }
}

impl Debug for UinputInjector {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "UinputInjector")
    }
}

impl KeyInjector for UinputInjector {
    fn inject(&mut self, key: Key, down: bool) -> io::Result<()> {
        trace!("Inject {:?} {}", key, if down { "down" } else { "up" });
        let value = if down { 1 } else { 0 };
        self.device
            .emit(&[InputEvent::new(EventType::KEY, key.code(), value)])
    }
}
