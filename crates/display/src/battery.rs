//! Battery calibration math, kept free of ADC specifics so it runs on the
//! host. The firmware feeds in the averaged ADC reading in millivolts.

use uom::si::electric_potential::{millivolt, volt};

pub type Voltage = uom::si::f32::ElectricPotential;

/// Discharge window of the single-cell LiPo behind the divider.
pub const BATTERY_EMPTY_VOLTS: f32 = 3.1;
pub const BATTERY_FULL_VOLTS: f32 = 4.2;

/// The battery sits behind a 1:2 resistor divider.
const DIVIDER_RATIO: f32 = 2.0;

/// Converts the calibrated ADC reading (pin millivolts) to battery voltage.
pub fn voltage_from_adc_millivolts(millivolts: f32) -> Voltage {
    Voltage::new::<millivolt>(millivolts * DIVIDER_RATIO)
}

/// Normalizes voltage linearly over the discharge window to an integer
/// percentage, rounded to nearest and clamped to [0, 100].
pub fn level_from_voltage(voltage: Voltage) -> u8 {
    let fraction = (voltage.get::<volt>() - BATTERY_EMPTY_VOLTS)
        / (BATTERY_FULL_VOLTS - BATTERY_EMPTY_VOLTS);
    (fraction * 100.0).round().clamp(0.0, 100.0) as u8
}
