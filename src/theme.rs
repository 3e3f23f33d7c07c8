//! Dark/light preference and the colors derived from it.

use ratatui::style::Color;
use tracing::warn;

use crate::error::Result;
use crate::storage::{self, KeyValueStore, THEME_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub fg: Color,
    pub muted: Color,
    pub accent: Color,
    pub border: Color,
    pub highlight_bg: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
}

impl Palette {
    pub fn for_mode(dark: bool) -> Self {
        if dark {
            Self {
                fg: Color::Gray,
                muted: Color::DarkGray,
                accent: Color::Cyan,
                border: Color::DarkGray,
                highlight_bg: Color::Rgb(51, 65, 85),
                success: Color::Green,
                warning: Color::Yellow,
                error: Color::LightRed,
            }
        } else {
            Self {
                fg: Color::Black,
                muted: Color::Gray,
                accent: Color::Blue,
                border: Color::Gray,
                highlight_bg: Color::Rgb(226, 232, 240),
                success: Color::Rgb(21, 128, 61),
                warning: Color::Rgb(161, 98, 7),
                error: Color::Red,
            }
        }
    }
}

/// Stored preference, else `fallback`.
pub fn load_dark_mode(store: &dyn KeyValueStore, fallback: bool) -> bool {
    match storage::load_json::<bool>(store, THEME_KEY) {
        Ok(Some(dark)) => dark,
        Ok(None) => fallback,
        Err(err) => {
            warn!(error = %err, "ignoring unreadable theme preference");
            fallback
        }
    }
}

pub fn save_dark_mode(store: &mut dyn KeyValueStore, dark: bool) -> Result<()> {
    storage::save_json(store, THEME_KEY, &dark)
}

/// Guess from the `COLORFGBG` hint ("fg;bg") that many terminals export.
/// Unknown means dark.
pub fn detect_system_dark(colorfgbg: Option<&str>) -> bool {
    colorfgbg
        .and_then(|v| v.rsplit(';').next())
        .and_then(|bg| bg.trim().parse::<u8>().ok())
        .map(|bg| bg <= 6 || bg == 8)
        .unwrap_or(true)
}

/// Parses `#rrggbb` into a terminal color.
pub fn hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_preference_round_trip() {
        let mut store = MemoryStore::new();
        assert!(load_dark_mode(&store, true));
        save_dark_mode(&mut store, false).unwrap();
        assert!(!load_dark_mode(&store, true));
        assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("false"));
    }

    #[test]
    fn test_malformed_preference_uses_fallback() {
        let mut store = MemoryStore::new();
        store.set(THEME_KEY, "\"yes\"").unwrap();
        assert!(!load_dark_mode(&store, false));
    }

    #[test]
    fn test_detect_system_dark() {
        assert!(detect_system_dark(Some("15;0")));
        assert!(!detect_system_dark(Some("0;15")));
        assert!(!detect_system_dark(Some("0;default;7")));
        assert!(detect_system_dark(None));
        assert!(detect_system_dark(Some("garbage")));
    }

    #[test]
    fn test_hex_color() {
        assert_eq!(hex_color("#3b82f6"), Some(Color::Rgb(0x3b, 0x82, 0xf6)));
        assert_eq!(hex_color("3b82f6"), None);
        assert_eq!(hex_color("#zzzzzz"), None);
    }
}
