use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Hue of the sequential palette used for pie slices (blue).
const SEQUENTIAL_HUE: f32 = 210.0;

fn hsl_to_color32(hsl: Hsl) -> Color32 {
    let rgb: Srgb = hsl.into_color();
    Color32::from_rgb(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    )
}

/// `n` shades of one hue, darkest first, so the largest slice is the
/// strongest colour.
pub fn sequential_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let t = if n == 1 { 0.0 } else { i as f32 / (n - 1) as f32 };
            let lightness = 0.25 + t * 0.55;
            hsl_to_color32(Hsl::new(SEQUENTIAL_HUE, 0.65, lightness))
        })
        .collect()
}

/// Parse `#rrggbb` (leading `#` optional).
pub fn parse_hex(s: &str) -> Option<Color32> {
    let hex = s.trim().trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some(Color32::from_rgb(channel(0)?, channel(2)?, channel(4)?))
}

/// Configured chart colour, falling back to blue on a malformed value.
pub fn chart_color(s: &str) -> Color32 {
    parse_hex(s).unwrap_or_else(|| {
        log::warn!("Invalid chart colour '{s}', using default");
        Color32::from_rgb(0x1f, 0x77, 0xb4)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colours() {
        assert_eq!(parse_hex("#d62728"), Some(Color32::from_rgb(0xd6, 0x27, 0x28)));
        assert_eq!(parse_hex("2ca02c"), Some(Color32::from_rgb(0x2c, 0xa0, 0x2c)));
        assert_eq!(parse_hex("#12345"), None);
        assert_eq!(parse_hex("#zzzzzz"), None);
    }

    #[test]
    fn sequential_palette_gets_lighter() {
        assert!(sequential_palette(0).is_empty());
        let p = sequential_palette(4);
        assert_eq!(p.len(), 4);
        let brightness = |c: Color32| c.r() as u32 + c.g() as u32 + c.b() as u32;
        assert!(brightness(p[0]) < brightness(p[3]));
    }
}
