//! The fixed screen template, 960x540 landscape.
//!
//! Every region is a compile-time constant; only the battery fill width and
//! the door overlays vary at runtime, and never with data magnitudes. All
//! geometry lives here so the renderer contains no coordinate arithmetic.

use embedded_graphics::{prelude::*, primitives::Rectangle};

use crate::snapshot::{FORECAST_HOURS, ROOM_COUNT};

pub const SCREEN_SIZE: Size = Size::new(960, 540);

pub const SEPARATOR_THICKNESS: u32 = 4;

const STATUS_BASELINE_Y: i32 = 32;
const STATUS_RULE_Y: i32 = STATUS_BASELINE_Y + 12;
const PANELS_TOP: i32 = 48;

const ROOM_X0: i32 = 20;
const ROOM_WIDTH: i32 = (SCREEN_SIZE.width as i32 - ROOM_X0) / ROOM_COUNT as i32;
const ROOM_HEIGHT: u32 = 222;

const FORECAST_RULE_Y: i32 = PANELS_TOP + ROOM_HEIGHT as i32;
const FORECAST_TOP: i32 = FORECAST_RULE_Y + SEPARATOR_THICKNESS as i32;
const FORECAST_X0: i32 = 40;
const FORECAST_STRIDE: i32 = 180;

const BATTERY_ORIGIN: Point = Point::new(SCREEN_SIZE.width as i32 - 70, 15);
const BATTERY_SIZE: Size = Size::new(50, 20);

/// Region role, for template enumeration and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    StatusBar,
    Separator,
    RoomPanel,
    ForecastSlot,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub rect: Rectangle,
    pub role: Role,
}

/// The complete fixed template as region/role pairs.
pub fn template() -> Vec<Region> {
    let mut regions = vec![
        Region {
            rect: status_bar(),
            role: Role::StatusBar,
        },
        Region {
            rect: status_rule(),
            role: Role::Separator,
        },
        Region {
            rect: forecast_rule(),
            role: Role::Separator,
        },
    ];
    regions.extend((0..ROOM_COUNT).map(|index| Region {
        rect: room_panel(index),
        role: Role::RoomPanel,
    }));
    regions.extend(room_separators().into_iter().map(|rect| Region {
        rect,
        role: Role::Separator,
    }));
    regions.extend((0..FORECAST_HOURS).map(|index| Region {
        rect: forecast_slot_rect(index),
        role: Role::ForecastSlot,
    }));
    regions
}

pub fn status_bar() -> Rectangle {
    Rectangle::new(Point::zero(), Size::new(SCREEN_SIZE.width, PANELS_TOP as u32))
}

pub fn updated_text_origin() -> Point {
    Point::new(ROOM_X0, STATUS_BASELINE_Y)
}

pub fn status_rule() -> Rectangle {
    Rectangle::new(
        Point::new(0, STATUS_RULE_Y),
        Size::new(SCREEN_SIZE.width, SEPARATOR_THICKNESS),
    )
}

pub fn battery_outline() -> Rectangle {
    Rectangle::new(BATTERY_ORIGIN, BATTERY_SIZE)
}

/// The terminal nub on the battery outline's right edge.
pub fn battery_terminal() -> Rectangle {
    Rectangle::new(
        BATTERY_ORIGIN + Point::new(BATTERY_SIZE.width as i32, (BATTERY_SIZE.height as i32 - 8) / 2),
        Size::new(4, 8),
    )
}

/// Fill bar inside the outline, width proportional to `level`.
pub fn battery_fill(level: u8) -> Rectangle {
    let inner_width = BATTERY_SIZE.width - 4;
    Rectangle::new(
        BATTERY_ORIGIN + Point::new(2, 2),
        Size::new(inner_width * u32::from(level) / 100, BATTERY_SIZE.height - 4),
    )
}

pub fn battery_label_origin() -> Point {
    Point::new(BATTERY_ORIGIN.x - 65, STATUS_BASELINE_Y + 2)
}

pub fn room_panel(index: usize) -> Rectangle {
    Rectangle::new(
        Point::new(ROOM_X0 + index as i32 * ROOM_WIDTH, PANELS_TOP),
        Size::new(ROOM_WIDTH as u32, ROOM_HEIGHT),
    )
}

/// One vertical rule per panel boundary, inset from the boundary edge.
pub fn room_separators() -> Vec<Rectangle> {
    (1..ROOM_COUNT as i32)
        .map(|boundary| {
            Rectangle::new(
                Point::new(ROOM_X0 + boundary * ROOM_WIDTH - 23, PANELS_TOP),
                Size::new(SEPARATOR_THICKNESS, ROOM_HEIGHT),
            )
        })
        .collect()
}

// Content anchors within a room panel, relative to its top-left corner.
pub const ROOM_TITLE_OFFSET: Point = Point::new(90, 42);
pub const DOOR_ICON_OFFSET: Point = Point::new(170, 8);
pub const HUMIDITY_ICON_OFFSET: Point = Point::new(40, 62);
pub const HUMIDITY_VALUE_OFFSET: Point = Point::new(114, 110);
pub const TEMPERATURE_ICON_OFFSET: Point = Point::new(44, 140);
pub const TEMPERATURE_VALUE_OFFSET: Point = Point::new(114, 196);

pub fn forecast_rule() -> Rectangle {
    Rectangle::new(
        Point::new(0, FORECAST_RULE_Y),
        Size::new(SCREEN_SIZE.width, SEPARATOR_THICKNESS),
    )
}

/// Text/glyph anchors for the i-th forecast slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastSlot {
    pub time_origin: Point,
    pub glyph_origin: Point,
    pub pop_origin: Point,
}

pub fn forecast_slot(index: usize) -> ForecastSlot {
    let x = FORECAST_X0 + index as i32 * FORECAST_STRIDE;
    ForecastSlot {
        time_origin: Point::new(x - 33, FORECAST_TOP + 50),
        glyph_origin: Point::new(x, FORECAST_TOP + 160),
        pop_origin: Point::new(x - 11, FORECAST_TOP + 200),
    }
}

fn forecast_slot_rect(index: usize) -> Rectangle {
    Rectangle::new(
        Point::new(index as i32 * FORECAST_STRIDE, FORECAST_TOP),
        Size::new(
            FORECAST_STRIDE as u32,
            SCREEN_SIZE.height - FORECAST_TOP as u32,
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen() -> Rectangle {
        Rectangle::new(Point::zero(), SCREEN_SIZE)
    }

    #[test]
    fn room_panels_are_equal_width_and_adjacent() {
        for index in 0..ROOM_COUNT {
            let panel = room_panel(index);
            assert_eq!(panel.size.width, ROOM_WIDTH as u32);
            assert_eq!(screen().intersection(&panel), panel);
        }
        for index in 0..ROOM_COUNT - 1 {
            let right_edge = room_panel(index).top_left.x + ROOM_WIDTH;
            assert_eq!(right_edge, room_panel(index + 1).top_left.x);
        }
    }

    #[test]
    fn separators_stay_inside_the_panel_band() {
        let rules = room_separators();
        assert_eq!(rules.len(), ROOM_COUNT - 1);
        // boundary rules sit just left of x=333 and x=646
        assert_eq!(rules[0].top_left.x, 310);
        assert_eq!(rules[1].top_left.x, 623);
        for rule in rules {
            assert_eq!(rule.size.width, SEPARATOR_THICKNESS);
            assert_eq!(rule.size.height, ROOM_HEIGHT);
            assert_eq!(screen().intersection(&rule), rule);
        }
    }

    #[test]
    fn forecast_slots_are_equally_spaced() {
        for index in 0..FORECAST_HOURS - 1 {
            let delta = forecast_slot(index + 1).glyph_origin.x - forecast_slot(index).glyph_origin.x;
            assert_eq!(delta, FORECAST_STRIDE);
        }
    }

    #[test]
    fn battery_fill_scales_and_stays_inside_the_outline() {
        assert_eq!(battery_fill(0).size.width, 0);
        let mut previous = 0;
        for level in 0..=100 {
            let fill = battery_fill(level);
            assert!(fill.size.width >= previous);
            previous = fill.size.width;
            if fill.size.width > 0 {
                assert_eq!(battery_outline().intersection(&fill), fill);
            }
        }
        assert_eq!(battery_fill(100).size.width, BATTERY_SIZE.width - 4);
    }

    #[test]
    fn template_covers_every_role() {
        let regions = template();
        let count = |role| regions.iter().filter(|r| r.role == role).count();
        assert_eq!(count(Role::StatusBar), 1);
        assert_eq!(count(Role::RoomPanel), ROOM_COUNT);
        assert_eq!(count(Role::ForecastSlot), FORECAST_HOURS);
        // status rule, forecast rule, two vertical rules
        assert_eq!(count(Role::Separator), 2 + (ROOM_COUNT - 1));
        for region in regions {
            assert_eq!(screen().intersection(&region.rect), region.rect);
        }
    }
}
