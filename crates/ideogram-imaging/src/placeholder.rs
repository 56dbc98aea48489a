use image::{DynamicImage, Rgb, RgbImage};

pub const ERROR_BACKGROUND: Rgb<u8> = Rgb([128, 0, 0]);
pub const ERROR_TEXT: Rgb<u8> = Rgb([255, 255, 255]);
pub const DEFAULT_ERROR_IMAGE_SIZE: u32 = 512;
pub const MAX_MESSAGE_LINES: usize = 10;
pub const LINE_HEIGHT: u32 = 25;

pub fn create_default_error_image(message: &str) -> DynamicImage {
    create_error_image(message, DEFAULT_ERROR_IMAGE_SIZE, DEFAULT_ERROR_IMAGE_SIZE)
}

/// Dark red placeholder with `message` drawn in white when a font can be
/// loaded. Text rendering is best effort and never fails the call.
///
/// There is no built-in fallback font. The font comes from `IDEOGRAM_FONT_PATH`
/// or a short list of common system font paths. If none of them can be read,
/// or the `text` feature is off, the placeholder is returned without a caption.
pub fn create_error_image(message: &str, width: u32, height: u32) -> DynamicImage {
    let mut canvas = RgbImage::from_pixel(width, height, ERROR_BACKGROUND);
    #[cfg(feature = "text")]
    text::draw_message(&mut canvas, message);
    #[cfg(not(feature = "text"))]
    tracing::debug!(
        chars = message.len(),
        "text feature disabled; error image has no caption"
    );
    DynamicImage::ImageRgb8(canvas)
}

/// Lines that will be drawn, top to bottom.
pub fn message_lines(message: &str) -> Vec<&str> {
    message.split('\n').take(MAX_MESSAGE_LINES).collect()
}

/// Y coordinate of the first line so the block is centered vertically.
pub fn first_line_top(height: u32, line_count: usize) -> i32 {
    let block = i64::from(LINE_HEIGHT) * line_count as i64;
    (i64::from(height) / 2 - block / 2) as i32
}

#[cfg(feature = "text")]
mod text {
    use std::env;
    use std::fs;
    use std::path::{Path, PathBuf};

    use ab_glyph::{FontVec, PxScale};
    use image::RgbImage;
    use imageproc::drawing::{draw_text_mut, text_size};
    use tracing::debug;

    use super::{first_line_top, message_lines, ERROR_TEXT, LINE_HEIGHT};

    const FONT_SCALE: f32 = 20.0;

    const SYSTEM_FONTS: &[&str] = &[
        "arial.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/Library/Fonts/Arial.ttf",
        "/System/Library/Fonts/Supplemental/Arial.ttf",
        "C:\\Windows\\Fonts\\arial.ttf",
    ];

    pub(super) fn draw_message(canvas: &mut RgbImage, message: &str) {
        let Some(font) = load_font(&font_candidates()) else {
            debug!("no usable font found; error image has no caption");
            return;
        };
        draw_lines(canvas, &message_lines(message), &font);
    }

    pub(super) fn draw_lines(canvas: &mut RgbImage, lines: &[&str], font: &FontVec) {
        let scale = PxScale::from(FONT_SCALE);
        let width = i64::from(canvas.width());
        let mut y = first_line_top(canvas.height(), lines.len());
        for line in lines {
            let (text_width, _) = text_size(scale, font, line);
            let x = ((width - i64::from(text_width)) / 2) as i32;
            draw_text_mut(canvas, ERROR_TEXT, x, y, scale, font, line);
            y += LINE_HEIGHT as i32;
        }
    }

    pub(super) fn font_candidates() -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        if let Some(path) = env::var_os("IDEOGRAM_FONT_PATH").filter(|value| !value.is_empty()) {
            candidates.push(PathBuf::from(path));
        }
        candidates.extend(SYSTEM_FONTS.iter().map(PathBuf::from));
        candidates
    }

    /// First candidate that exists and parses as a TrueType/OpenType font.
    pub(super) fn load_font(candidates: &[PathBuf]) -> Option<FontVec> {
        candidates.iter().find_map(|path| read_font(path))
    }

    fn read_font(path: &Path) -> Option<FontVec> {
        let bytes = fs::read(path).ok()?;
        match FontVec::try_from_vec(bytes) {
            Ok(font) => Some(font),
            Err(err) => {
                debug!(path = %path.display(), "skipping unreadable font: {err}");
                None
            }
        }
    }
}
