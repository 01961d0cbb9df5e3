//! Sequential colour scales and colour parsing.

use plotters::style::RGBColor;
use serde::Serialize;

/// Sequential scale used to colour bars, slices and markers by value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScale {
    Turbo,
    Plasma,
    Viridis,
    Solar,
}

const TURBO: [(u8, u8, u8); 9] = [
    (48, 18, 59),
    (70, 107, 227),
    (40, 187, 236),
    (50, 241, 152),
    (164, 252, 60),
    (237, 208, 58),
    (251, 128, 34),
    (215, 54, 6),
    (122, 4, 3),
];

const PLASMA: [(u8, u8, u8); 9] = [
    (13, 8, 135),
    (75, 3, 161),
    (125, 3, 168),
    (168, 34, 150),
    (203, 70, 121),
    (229, 107, 93),
    (248, 148, 65),
    (253, 195, 40),
    (240, 249, 33),
];

const VIRIDIS: [(u8, u8, u8); 9] = [
    (68, 1, 84),
    (72, 40, 120),
    (62, 74, 137),
    (49, 104, 142),
    (38, 130, 142),
    (31, 158, 137),
    (53, 183, 121),
    (110, 206, 88),
    (253, 231, 37),
];

const SOLAR: [(u8, u8, u8); 9] = [
    (51, 20, 24),
    (91, 30, 25),
    (128, 43, 22),
    (161, 62, 19),
    (189, 87, 20),
    (211, 116, 27),
    (228, 150, 38),
    (239, 186, 52),
    (225, 253, 75),
];

impl ColorScale {
    fn stops(self) -> &'static [(u8, u8, u8)] {
        match self {
            ColorScale::Turbo => &TURBO,
            ColorScale::Plasma => &PLASMA,
            ColorScale::Viridis => &VIRIDIS,
            ColorScale::Solar => &SOLAR,
        }
    }

    /// Colour at position `t` in [0, 1]; values outside are clamped
    pub fn at(self, t: f64) -> RGBColor {
        let stops = self.stops();
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let pos = t * (stops.len() - 1) as f64;
        let lower = pos.floor() as usize;
        let upper = (lower + 1).min(stops.len() - 1);
        let weight = pos - lower as f64;

        let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * weight).round() as u8;
        let (a, b) = (stops[lower], stops[upper]);
        RGBColor(lerp(a.0, b.0), lerp(a.1, b.1), lerp(a.2, b.2))
    }

    /// Colour for `value` relative to the `[min, max]` domain of a view.
    /// A degenerate domain maps to the middle of the scale.
    pub fn color_for(self, value: f64, min: f64, max: f64) -> RGBColor {
        if max > min {
            self.at((value - min) / (max - min))
        } else {
            self.at(0.5)
        }
    }

    /// `n` evenly spaced colours, for categorical series such as pie slices
    pub fn sample(self, n: usize) -> Vec<RGBColor> {
        match n {
            0 => Vec::new(),
            1 => vec![self.at(0.5)],
            _ => (0..n).map(|i| self.at(i as f64 / (n - 1) as f64)).collect(),
        }
    }
}

/// Parse a colour given as `#rrggbb`, `#rgb` or a basic name
pub fn parse_color(color_str: &str) -> Option<RGBColor> {
    let color_str = color_str.trim();

    if color_str.starts_with('#') {
        return parse_hex_color(color_str);
    }

    match color_str.to_lowercase().as_str() {
        "white" => Some(RGBColor(255, 255, 255)),
        "black" => Some(RGBColor(0, 0, 0)),
        "red" => Some(RGBColor(255, 0, 0)),
        "green" => Some(RGBColor(0, 128, 0)),
        "blue" => Some(RGBColor(0, 0, 255)),
        "gray" | "grey" => Some(RGBColor(128, 128, 128)),
        "lightgray" | "lightgrey" => Some(RGBColor(192, 192, 192)),
        "whitesmoke" => Some(RGBColor(245, 245, 245)),
        _ => None,
    }
}

fn parse_hex_color(hex: &str) -> Option<RGBColor> {
    let hex = hex.trim_start_matches('#');
    match hex.len() {
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(RGBColor(r, g, b))
        }
        3 => {
            let r = u8::from_str_radix(&hex[0..1], 16).ok()? * 17;
            let g = u8::from_str_radix(&hex[1..2], 16).ok()? * 17;
            let b = u8::from_str_radix(&hex[2..3], 16).ok()? * 17;
            Some(RGBColor(r, g, b))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_endpoints() {
        assert_eq!(ColorScale::Viridis.at(0.0), RGBColor(68, 1, 84));
        assert_eq!(ColorScale::Viridis.at(1.0), RGBColor(253, 231, 37));
        assert_eq!(ColorScale::Turbo.at(-3.0), ColorScale::Turbo.at(0.0));
        assert_eq!(ColorScale::Turbo.at(7.0), ColorScale::Turbo.at(1.0));
    }

    #[test]
    fn test_color_for_degenerate_domain() {
        assert_eq!(ColorScale::Plasma.color_for(5.0, 5.0, 5.0), ColorScale::Plasma.at(0.5));
    }

    #[test]
    fn test_sample_counts() {
        assert!(ColorScale::Solar.sample(0).is_empty());
        assert_eq!(ColorScale::Solar.sample(1).len(), 1);
        let colors = ColorScale::Solar.sample(4);
        assert_eq!(colors.len(), 4);
        assert_eq!(colors[0], ColorScale::Solar.at(0.0));
        assert_eq!(colors[3], ColorScale::Solar.at(1.0));
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_color("#FF5A5F"), Some(RGBColor(255, 90, 95)));
        assert_eq!(parse_color("#fff"), Some(RGBColor(255, 255, 255)));
        assert_eq!(parse_color("#12"), None);
    }

    #[test]
    fn test_parse_named_color() {
        assert_eq!(parse_color(" White "), Some(RGBColor(255, 255, 255)));
        assert_eq!(parse_color("chartreuse"), None);
    }
}
