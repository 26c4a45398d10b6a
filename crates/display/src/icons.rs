//! Condition-code translation for the forecast strip.
//!
//! The backend passes OpenWeatherMap icon codes through; the weather art
//! font indexes its glyphs by single ASCII letters.

/// Maps an external condition code to the glyph drawn in a forecast slot.
///
/// Unknown codes yield `""` and the caller draws nothing for that slot.
pub fn translate(icon_code: &str) -> &'static str {
    match icon_code {
        // day
        "01d" => "J",                 // clear
        "02d" | "03d" | "04d" => "F", // clouds
        "09d" | "10d" => "G",         // rain
        "11d" => "I",                 // thunderstorm
        "13d" => "H",                 // snow
        "50d" => "C",                 // mist
        // night
        "01n" => "D",
        "02n" | "03n" | "04n" => "E",
        "09n" | "10n" => "G",
        "11n" => "I",
        "13n" => "H",
        "50n" => "C",
        _ => "",
    }
}
