use embedded_graphics::pixelcolor::Gray4;
use embedded_graphics::prelude::*;
use esp_idf_svc::sys::EspError;
use it8951::WaveformMode;
use log::info;

use display::renderer::Renderer;
use display::snapshot::Snapshot;

use crate::hardware::{display_create, DisplayPeripherals};

/// Full clearing refreshes before drawing. One pass is not enough to kill
/// ghosting from the image that sat on the panel for the last interval.
const CLEAR_PASSES: usize = 2;

pub fn render_and_flush(
    peripherals: &mut DisplayPeripherals,
    snapshot: &Snapshot,
    battery_level: u8,
) -> Result<(), EspError> {
    let mut display = display_create(peripherals)?;

    for _ in 0..CLEAR_PASSES {
        display.clear(Gray4::WHITE).expect("clear");
        display.display(WaveformMode::Init).expect("clear refresh");
    }

    let renderer = Renderer::new();
    renderer
        .draw(snapshot, battery_level, &mut display)
        .expect("Draw error");

    // The first pass sets the pixel state; the second runs after the boost
    // converter has settled under load and visibly raises contrast. Both
    // passes are required.
    display.display(WaveformMode::GC16).expect("display update");
    display.display(WaveformMode::GC16).expect("display update");

    info!("Display refreshed, powering panel down");
    display.sleep().expect("panel power down");

    Ok(())
}
