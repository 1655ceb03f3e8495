use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Display mode. The strum form is the marker carried by the document root
/// and written to storage.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
    EnumIter,
)]
#[serde(rename_all = "kebab-case")]
pub enum ThemeMode {
    #[strum(serialize = "light-theme")]
    Light,
    #[strum(serialize = "dark-theme")]
    Dark,
}

impl ThemeMode {
    pub fn flipped(self) -> Self {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        }
    }

    /// Class name carried by the document root, e.g. `dark-theme`.
    pub fn marker(self) -> &'static str {
        self.into()
    }
}

impl Default for ThemeMode {
    fn default() -> Self {
        ThemeMode::Light
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub background: Color,
    pub foreground: Color,
    pub muted: Color,
    pub accent: Color,
    pub highlight_bg: Color,
    pub highlight_fg: Color,
    pub match_fg: Color,
    pub disabled: Color,
}

impl Palette {
    pub fn for_mode(mode: ThemeMode) -> Self {
        match mode {
            ThemeMode::Light => Self {
                background: Color::White,
                foreground: Color::Black,
                muted: Color::DarkGray,
                accent: Color::Blue,
                highlight_bg: Color::LightBlue,
                highlight_fg: Color::Black,
                match_fg: Color::Magenta,
                disabled: Color::Gray,
            },
            ThemeMode::Dark => Self {
                background: Color::Black,
                foreground: Color::White,
                muted: Color::Gray,
                accent: Color::Cyan,
                highlight_bg: Color::Blue,
                highlight_fg: Color::Black,
                match_fg: Color::Yellow,
                disabled: Color::DarkGray,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn markers_parse_back_to_modes() {
        for mode in ThemeMode::iter() {
            assert_eq!(ThemeMode::from_str(mode.marker()).ok(), Some(mode));
            assert_eq!(mode.to_string(), mode.marker());
        }
        assert_eq!(ThemeMode::Light.marker(), "light-theme");
        assert_eq!(ThemeMode::Dark.marker(), "dark-theme");
        assert!(ThemeMode::from_str("solarized").is_err());
    }

    #[test]
    fn palettes_differ_between_modes() {
        let light = Palette::for_mode(ThemeMode::Light);
        let dark = Palette::for_mode(ThemeMode::Dark);
        assert_ne!(light.background, dark.background);
    }
}
