//! Raspberry Pi GPIO backend via `rppal`.

use rppal::gpio::{Gpio, InputPin, OutputPin};
use sonar_traits::{EchoLine, Indicator, TriggerLine};

use crate::error::HwError;

fn gpio_err(e: rppal::gpio::Error) -> HwError {
    HwError::Gpio(e.to_string())
}

pub struct GpioTrigger {
    pin: OutputPin,
}

impl TriggerLine for GpioTrigger {
    fn set_high(&mut self) {
        self.pin.set_high();
    }
    fn set_low(&mut self) {
        self.pin.set_low();
    }
}

pub struct GpioEcho {
    pin: InputPin,
}

impl EchoLine for GpioEcho {
    fn is_high(&mut self) -> bool {
        self.pin.is_high()
    }
}

pub struct GpioIndicator {
    pin: OutputPin,
}

impl Indicator for GpioIndicator {
    fn set(&mut self, active: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if active {
            self.pin.set_high();
        } else {
            self.pin.set_low();
        }
        Ok(())
    }
}

/// Claim the trigger (output, driven low) and echo (input) pins. BCM numbering.
pub fn open_sensor(trigger_pin: u8, echo_pin: u8) -> Result<(GpioTrigger, GpioEcho), HwError> {
    let gpio = Gpio::new().map_err(gpio_err)?;
    let trigger = gpio.get(trigger_pin).map_err(gpio_err)?.into_output_low();
    let echo = gpio.get(echo_pin).map_err(gpio_err)?.into_input();
    tracing::debug!(trigger_pin, echo_pin, "sensor pins claimed");
    Ok((GpioTrigger { pin: trigger }, GpioEcho { pin: echo }))
}

/// Claim the indicator pin, initially off.
pub fn open_indicator(pin: u8) -> Result<GpioIndicator, HwError> {
    let gpio = Gpio::new().map_err(gpio_err)?;
    let out = gpio.get(pin).map_err(gpio_err)?.into_output_low();
    tracing::debug!(pin, "indicator pin claimed");
    Ok(GpioIndicator { pin: out })
}
