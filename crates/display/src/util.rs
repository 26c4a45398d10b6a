use log::warn;

/// Downgrades recoverable font errors to a logged no-op, so a glyph missing
/// from the art font skips that draw instead of aborting the frame.
pub(crate) fn log_font_err<DisplayError>(
    err: u8g2_fonts::Error<DisplayError>,
) -> Result<(), DisplayError> {
    match err {
        u8g2_fonts::Error::BackgroundColorNotSupported => {
            warn!("Background color not supported");
            Ok(())
        }
        u8g2_fonts::Error::GlyphNotFound(g) => {
            warn!("Glyph not found {}", g);
            Ok(())
        }
        u8g2_fonts::Error::DisplayError(e) => Err(e),
    }
}
