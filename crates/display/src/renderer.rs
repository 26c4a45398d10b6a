//! Draws one complete dashboard frame into any `Gray4` draw target.
//!
//! Rendering is a pure function of `(snapshot, battery_level)`; the firmware
//! flushes the resulting frame to the panel, the tests read it back from a
//! simulator display.

use embedded_graphics::{
    pixelcolor::Gray4,
    prelude::*,
    primitives::{Circle, Line, PrimitiveStyle, Triangle},
};
use thiserror::Error;
use u8g2_fonts::{
    fonts,
    types::{FontColor, VerticalPosition},
    FontRenderer,
};

use crate::icons;
use crate::layout;
use crate::snapshot::{ForecastHour, RoomReading, Snapshot};
use crate::util::log_font_err;

#[derive(Error, Debug)]
pub enum Error<DisplayError> {
    #[error("display error")]
    DisplayError(#[from] DisplayError),
    #[error("font rendering error")]
    FontError(#[from] u8g2_fonts::Error<DisplayError>),
}

pub struct Renderer {
    label_font: FontRenderer,
    value_font: FontRenderer,
    weather_font: FontRenderer,
}

impl Renderer {
    pub fn new() -> Renderer {
        Renderer {
            label_font: FontRenderer::new::<fonts::u8g2_font_helvR12_tf>(),
            value_font: FontRenderer::new::<fonts::u8g2_font_logisoso20_tf>(),
            weather_font: FontRenderer::new::<fonts::u8g2_font_logisoso58_tf>(),
        }
    }

    pub fn draw<Display, DisplayError>(
        &self,
        snapshot: &Snapshot,
        battery_level: u8,
        display: &mut Display,
    ) -> Result<(), Error<DisplayError>>
    where
        Display: DrawTarget<Color = Gray4, Error = DisplayError>,
    {
        self.draw_status_bar(&snapshot.updated, battery_level, display)?;

        let panels = [
            ("Zelt", &snapshot.tent, None),
            ("Wohn", &snapshot.living, Some(snapshot.living_door_open)),
            ("Schlaf", &snapshot.sleep, Some(snapshot.sleep_door_open)),
        ];
        for (index, (title, reading, door_open)) in panels.into_iter().enumerate() {
            self.draw_room(index, title, reading, door_open, display)?;
        }
        for rule in layout::room_separators() {
            rule.into_styled(fill_style()).draw(display)?;
        }

        layout::forecast_rule()
            .into_styled(fill_style())
            .draw(display)?;
        for (index, hour) in snapshot.forecast.iter().enumerate() {
            self.draw_forecast_slot(index, hour, display)?;
        }

        Ok(())
    }

    fn draw_status_bar<Display, DisplayError>(
        &self,
        updated: &str,
        battery_level: u8,
        display: &mut Display,
    ) -> Result<(), Error<DisplayError>>
    where
        Display: DrawTarget<Color = Gray4, Error = DisplayError>,
    {
        self.label_font.render(
            format_updated(updated).as_str(),
            layout::updated_text_origin(),
            VerticalPosition::Baseline,
            FontColor::Transparent(Gray4::BLACK),
            display,
        )?;

        layout::battery_outline()
            .into_styled(stroke_style(1))
            .draw(display)?;
        layout::battery_terminal()
            .into_styled(fill_style())
            .draw(display)?;
        layout::battery_fill(battery_level)
            .into_styled(fill_style())
            .draw(display)?;
        self.label_font.render(
            format_battery_label(battery_level).as_str(),
            layout::battery_label_origin(),
            VerticalPosition::Baseline,
            FontColor::Transparent(Gray4::BLACK),
            display,
        )?;

        layout::status_rule()
            .into_styled(fill_style())
            .draw(display)?;
        Ok(())
    }

    fn draw_room<Display, DisplayError>(
        &self,
        index: usize,
        title: &str,
        reading: &RoomReading,
        door_open: Option<bool>,
        display: &mut Display,
    ) -> Result<(), Error<DisplayError>>
    where
        Display: DrawTarget<Color = Gray4, Error = DisplayError>,
    {
        let origin = layout::room_panel(index).top_left;

        self.value_font.render(
            title,
            origin + layout::ROOM_TITLE_OFFSET,
            VerticalPosition::Baseline,
            FontColor::Transparent(Gray4::BLACK),
            display,
        )?;

        draw_humidity_icon(origin + layout::HUMIDITY_ICON_OFFSET, display)?;
        self.value_font.render(
            format_humidity(reading.humidity).as_str(),
            origin + layout::HUMIDITY_VALUE_OFFSET,
            VerticalPosition::Baseline,
            FontColor::Transparent(Gray4::BLACK),
            display,
        )?;

        draw_temperature_icon(origin + layout::TEMPERATURE_ICON_OFFSET, display)?;
        self.value_font.render(
            format_temperature(reading.temperature).as_str(),
            origin + layout::TEMPERATURE_VALUE_OFFSET,
            VerticalPosition::Baseline,
            FontColor::Transparent(Gray4::BLACK),
            display,
        )?;

        if door_open == Some(true) {
            draw_open_door_icon(origin + layout::DOOR_ICON_OFFSET, display)?;
        }
        Ok(())
    }

    fn draw_forecast_slot<Display, DisplayError>(
        &self,
        index: usize,
        hour: &ForecastHour,
        display: &mut Display,
    ) -> Result<(), Error<DisplayError>>
    where
        Display: DrawTarget<Color = Gray4, Error = DisplayError>,
    {
        let slot = layout::forecast_slot(index);

        self.value_font.render(
            hour.time.as_str(),
            slot.time_origin,
            VerticalPosition::Baseline,
            FontColor::Transparent(Gray4::BLACK),
            display,
        )?;

        let glyph = icons::translate(&hour.icon);
        if !glyph.is_empty() {
            // Unknown codes translate to "" and the slot art stays empty;
            // time and probability still draw.
            self.weather_font
                .render(
                    glyph,
                    slot.glyph_origin,
                    VerticalPosition::Baseline,
                    FontColor::Transparent(Gray4::BLACK),
                    display,
                )
                .map(|_| ())
                .or_else(log_font_err)?;
        }

        self.value_font.render(
            format_pop(hour.pop).as_str(),
            slot.pop_origin,
            VerticalPosition::Baseline,
            FontColor::Transparent(Gray4::BLACK),
            display,
        )?;
        Ok(())
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Renderer::new()
    }
}

pub fn format_updated(updated: &str) -> String {
    format!("Updated: {updated}")
}

pub fn format_battery_label(level: u8) -> String {
    format!("{level}%")
}

pub fn format_humidity(humidity: f32) -> String {
    format!("{humidity:.1} %")
}

pub fn format_temperature(temperature: f32) -> String {
    format!("{temperature:.1} °C")
}

/// Probability comes in as [0, 1]; shown as a percentage with no forced
/// decimals, matching the minimal float formatting of the backend.
pub fn format_pop(pop: f32) -> String {
    format!("{} %", pop * 100.0)
}

fn fill_style() -> PrimitiveStyle<Gray4> {
    PrimitiveStyle::with_fill(Gray4::BLACK)
}

fn stroke_style(width: u32) -> PrimitiveStyle<Gray4> {
    PrimitiveStyle::with_stroke(Gray4::BLACK, width)
}

fn draw_humidity_icon<Display>(origin: Point, display: &mut Display) -> Result<(), Display::Error>
where
    Display: DrawTarget<Color = Gray4>,
{
    // Droplet: triangle tip over a filled circle.
    Triangle::new(
        origin + Point::new(20, 0),
        origin + Point::new(4, 28),
        origin + Point::new(36, 28),
    )
    .into_styled(fill_style())
    .draw(display)?;
    Circle::new(origin + Point::new(2, 16), 36)
        .into_styled(fill_style())
        .draw(display)?;
    Ok(())
}

fn draw_temperature_icon<Display>(
    origin: Point,
    display: &mut Display,
) -> Result<(), Display::Error>
where
    Display: DrawTarget<Color = Gray4>,
{
    // Thermometer: stem with a filled bulb at the bottom.
    embedded_graphics::primitives::Rectangle::new(origin + Point::new(12, 0), Size::new(10, 32))
        .into_styled(stroke_style(2))
        .draw(display)?;
    embedded_graphics::primitives::Rectangle::new(origin + Point::new(15, 6), Size::new(4, 26))
        .into_styled(fill_style())
        .draw(display)?;
    Circle::new(origin + Point::new(7, 28), 20)
        .into_styled(fill_style())
        .draw(display)?;
    Ok(())
}

fn draw_open_door_icon<Display>(origin: Point, display: &mut Display) -> Result<(), Display::Error>
where
    Display: DrawTarget<Color = Gray4>,
{
    // Door frame with the leaf swung outwards.
    embedded_graphics::primitives::Rectangle::new(origin, Size::new(26, 34))
        .into_styled(stroke_style(2))
        .draw(display)?;
    Line::new(origin + Point::new(25, 0), origin + Point::new(38, 8))
        .into_styled(stroke_style(2))
        .draw(display)?;
    Line::new(origin + Point::new(38, 8), origin + Point::new(38, 40))
        .into_styled(stroke_style(2))
        .draw(display)?;
    Line::new(origin + Point::new(25, 33), origin + Point::new(38, 40))
        .into_styled(stroke_style(2))
        .draw(display)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::FORECAST_HOURS;
    use embedded_graphics::primitives::{ContainsPoint, PointsIter, Rectangle};
    use embedded_graphics_simulator::SimulatorDisplay;

    fn sample_snapshot() -> Snapshot {
        Snapshot {
            updated: "2024-06-01 12:00".to_owned(),
            tent: RoomReading {
                humidity: 45.3,
                temperature: 21.7,
            },
            living: RoomReading {
                humidity: 51.0,
                temperature: 22.4,
            },
            sleep: RoomReading {
                humidity: 48.2,
                temperature: 19.9,
            },
            living_door_open: false,
            sleep_door_open: false,
            forecast: core::array::from_fn(|i| ForecastHour {
                icon: "01d".to_owned(),
                time: format!("{}:00", 13 + i),
                pop: 0.25,
            }),
        }
    }

    fn render(snapshot: &Snapshot, battery_level: u8) -> anyhow::Result<SimulatorDisplay<Gray4>> {
        let mut display =
            SimulatorDisplay::with_default_color(layout::SCREEN_SIZE, Gray4::WHITE);
        Renderer::new().draw(snapshot, battery_level, &mut display)?;
        Ok(display)
    }

    fn black_pixels_in(display: &SimulatorDisplay<Gray4>, rect: Rectangle) -> usize {
        rect.points()
            .filter(|point| display.get_pixel(*point) == Gray4::BLACK)
            .count()
    }

    #[test]
    fn value_formatting() {
        assert_eq!(format_humidity(45.3), "45.3 %");
        assert_eq!(format_temperature(21.7), "21.7 °C");
        assert_eq!(format_temperature(-3.25), "-3.2 °C");
        assert_eq!(format_pop(0.5), "50 %");
        assert_eq!(format_pop(0.0), "0 %");
        assert_eq!(format_pop(0.125), "12.5 %");
        assert_eq!(format_updated("now"), "Updated: now");
        assert_eq!(format_battery_label(7), "7%");
    }

    #[test]
    fn rendering_is_deterministic() -> anyhow::Result<()> {
        let snapshot = sample_snapshot();
        let first = render(&snapshot, 73)?;
        let second = render(&snapshot, 73)?;

        let screen = Rectangle::new(Point::zero(), layout::SCREEN_SIZE);
        for point in screen.points() {
            assert_eq!(first.get_pixel(point), second.get_pixel(point), "{point:?}");
        }
        Ok(())
    }

    #[test]
    fn every_template_region_receives_ink() -> anyhow::Result<()> {
        let display = render(&sample_snapshot(), 73)?;
        for region in layout::template() {
            assert!(
                black_pixels_in(&display, region.rect) > 0,
                "empty region {region:?}"
            );
        }
        Ok(())
    }

    #[test]
    fn unknown_icon_code_leaves_slot_art_empty() -> anyhow::Result<()> {
        let mut snapshot = sample_snapshot();
        snapshot.forecast[0].icon = "99x".to_owned();
        let display = render(&snapshot, 73)?;

        // Band around slot 0's glyph, clear of the time and probability rows.
        let glyph_band = Rectangle::new(Point::new(35, 360), Size::new(80, 70));
        assert_eq!(black_pixels_in(&display, glyph_band), 0);

        let known = render(&sample_snapshot(), 73)?;
        assert!(black_pixels_in(&known, glyph_band) > 0);
        Ok(())
    }

    #[test]
    fn room_values_render_inside_their_own_panel() -> anyhow::Result<()> {
        // Tent reads 45.3 % / 21.7 °C in the sample snapshot.
        let mut snapshot = sample_snapshot();
        let base = render(&snapshot, 73)?;
        snapshot.tent.humidity = 88.8;
        let changed = render(&snapshot, 73)?;

        let humidity_value_area = Rectangle::new(
            layout::room_panel(0).top_left + layout::HUMIDITY_VALUE_OFFSET - Point::new(0, 28),
            Size::new(170, 36),
        );
        assert!(black_pixels_in(&base, humidity_value_area) > 0);

        // Changing one reading may only repaint that reading's value area.
        let screen = Rectangle::new(Point::zero(), layout::SCREEN_SIZE);
        let mut differing = 0;
        for point in screen.points() {
            if base.get_pixel(point) != changed.get_pixel(point) {
                differing += 1;
                assert!(humidity_value_area.contains(point), "stray diff at {point:?}");
            }
        }
        assert!(differing > 0);
        Ok(())
    }

    #[test]
    fn door_overlay_follows_the_sensor_flag() -> anyhow::Result<()> {
        let mut snapshot = sample_snapshot();
        let closed = render(&snapshot, 73)?;
        snapshot.living_door_open = true;
        let open = render(&snapshot, 73)?;

        let door_area = Rectangle::new(
            layout::room_panel(1).top_left + layout::DOOR_ICON_OFFSET,
            Size::new(44, 44),
        );
        assert_eq!(black_pixels_in(&closed, door_area), 0);
        assert!(black_pixels_in(&open, door_area) > 0);

        // The tent panel has no door sensor and must stay identical.
        let tent_panel = layout::room_panel(0);
        assert_eq!(
            black_pixels_in(&closed, tent_panel),
            black_pixels_in(&open, tent_panel)
        );
        Ok(())
    }

    #[test]
    fn battery_fill_tracks_the_level() -> anyhow::Result<()> {
        let snapshot = sample_snapshot();
        let empty = render(&snapshot, 0)?;
        let full = render(&snapshot, 100)?;

        let outline = layout::battery_outline();
        assert!(black_pixels_in(&full, outline) > black_pixels_in(&empty, outline));
        Ok(())
    }

    #[test]
    fn five_forecast_slots_are_drawn() -> anyhow::Result<()> {
        let display = render(&sample_snapshot(), 73)?;
        for index in 0..FORECAST_HOURS {
            let slot = layout::forecast_slot(index);
            let glyph_band =
                Rectangle::new(slot.glyph_origin - Point::new(5, 64), Size::new(80, 70));
            assert!(
                black_pixels_in(&display, glyph_band) > 0,
                "slot {index} has no glyph"
            );
        }
        Ok(())
    }
}
