use ratatui::style::Color;
use std::time::Duration;

use crate::config::Tui;

#[derive(Clone, Copy, Debug)]
pub struct TuiTheme {
    pub highlight_fg: Color,
    pub highlight_bg: Color,
    pub border_fg: Color,
    pub help_fg: Color,
    pub toast: Duration,
}

impl Default for TuiTheme {
    fn default() -> Self {
        Self {
            highlight_fg: Color::Black,
            highlight_bg: Color::Cyan,
            border_fg: Color::Gray,
            help_fg: Color::Yellow,
            toast: Duration::from_millis(2000),
        }
    }
}

impl TuiTheme {
    /// Unparseable colours keep their default.
    pub fn from_settings(tui: &Tui) -> Self {
        let d = Self::default();
        let pick = |raw: &Option<String>, fallback: Color| {
            raw.as_deref().and_then(parse_color_str).unwrap_or(fallback)
        };
        Self {
            highlight_fg: pick(&tui.highlight_fg, d.highlight_fg),
            highlight_bg: pick(&tui.highlight_bg, d.highlight_bg),
            border_fg: pick(&tui.border_fg, d.border_fg),
            help_fg: pick(&tui.help_fg, d.help_fg),
            toast: tui.toast_ms.map(Duration::from_millis).unwrap_or(d.toast),
        }
    }
}

pub fn parse_color_str(s: &str) -> Option<Color> {
    let k = s.trim().to_ascii_lowercase();
    match k.as_str() {
        "black" => Some(Color::Black),
        "red" => Some(Color::Red),
        "green" => Some(Color::Green),
        "yellow" => Some(Color::Yellow),
        "blue" => Some(Color::Blue),
        "magenta" => Some(Color::Magenta),
        "cyan" => Some(Color::Cyan),
        "white" => Some(Color::White),
        "gray" | "grey" => Some(Color::Gray),
        "darkgray" | "darkgrey" => Some(Color::DarkGray),
        _ => {
            if let Some(hex) = k.strip_prefix('#') {
                return parse_hex(hex);
            }
            if let Some(rest) = k.strip_prefix("rgb(") {
                return parse_rgb_tuple(rest);
            }
            None
        }
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(hex.get(0..2)?, 16).ok()?;
    let g = u8::from_str_radix(hex.get(2..4)?, 16).ok()?;
    let b = u8::from_str_radix(hex.get(4..6)?, 16).ok()?;
    Some(Color::Rgb(r, g, b))
}

fn parse_rgb_tuple(rest: &str) -> Option<Color> {
    let t = rest.strip_suffix(')')?;
    let parts: Vec<_> = t.split(',').map(|p| p.trim()).collect();
    if parts.len() != 3 {
        return None;
    }
    let r = parts[0].parse::<u8>().ok()?;
    let g = parts[1].parse::<u8>().ok()?;
    let b = parts[2].parse::<u8>().ok()?;
    Some(Color::Rgb(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_hex_and_rgb() {
        assert_eq!(parse_color_str(" Grey "), Some(Color::Gray));
        assert_eq!(parse_color_str("#10ff0A"), Some(Color::Rgb(16, 255, 10)));
        assert_eq!(parse_color_str("rgb(1, 2, 3)"), Some(Color::Rgb(1, 2, 3)));
        assert_eq!(parse_color_str("#fff"), None);
        assert_eq!(parse_color_str("rgb(1,2)"), None);
        assert_eq!(parse_color_str("mauve"), None);
    }

    #[test]
    fn settings_override_defaults() {
        let tui = Tui {
            highlight_bg: Some("#000080".into()),
            border_fg: Some("not-a-colour".into()),
            toast_ms: Some(250),
            ..Tui::default()
        };
        let t = TuiTheme::from_settings(&tui);
        assert_eq!(t.highlight_bg, Color::Rgb(0, 0, 128));
        assert_eq!(t.border_fg, Color::Gray);
        assert_eq!(t.toast, Duration::from_millis(250));
    }
}
