use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ThemeError;

pub const DEFAULT_PRIMARY: &str = "#4ade80";
pub const DEFAULT_SECONDARY: &str = "#3b82f6";
pub const DEFAULT_ACCENT: &str = "#a855f7";
pub const DEFAULT_LEVEL: i64 = 50;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundMode {
    #[default]
    DeepOcean,
    ClassicLava,
    NeonNight,
    MonochromeGlass,
    Infrared,
    #[serde(other)]
    Unknown,
}

impl BackgroundMode {
    /// `(--lava-blend, --bg-base)` for the mode.
    pub fn blend(self) -> (&'static str, &'static str) {
        match self {
            BackgroundMode::NeonNight => ("screen", "#000000"),
            BackgroundMode::MonochromeGlass => ("overlay", "#111"),
            BackgroundMode::Infrared => ("difference", "#222"),
            _ => ("normal", "#05040a"),
        }
    }
}

/// One set of background settings, either the default or an album override.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThemeSettings {
    #[serde(default)]
    pub use_custom_colors: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lava_color_primary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lava_color_secondary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lava_color_accent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lava_speed: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lava_intensity: Option<i64>,
    #[serde(default)]
    pub background_mode: BackgroundMode,
}

impl ThemeSettings {
    pub fn validate(&self) -> Result<(), ThemeError> {
        for (field, value) in [
            ("lava_speed", self.lava_speed),
            ("lava_intensity", self.lava_intensity),
        ] {
            if let Some(value) = value
                && !(0..=100).contains(&value)
            {
                return Err(ThemeError::OutOfRange { field, value });
            }
        }

        for (field, value) in [
            ("lava_color_primary", &self.lava_color_primary),
            ("lava_color_secondary", &self.lava_color_secondary),
            ("lava_color_accent", &self.lava_color_accent),
        ] {
            if let Some(value) = value
                && !is_hex_color(value)
            {
                return Err(ThemeError::InvalidColor {
                    field,
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }

    /// CSS custom properties driving the animated background.
    pub fn css_variables(&self) -> BTreeMap<&'static str, String> {
        let color = |custom: &Option<String>, fallback: &str| -> String {
            match custom {
                Some(c) if self.use_custom_colors && !c.is_empty() => c.clone(),
                _ => fallback.to_string(),
            }
        };

        let speed = self.lava_speed.unwrap_or(DEFAULT_LEVEL).clamp(0, 100);
        let intensity = self.lava_intensity.unwrap_or(DEFAULT_LEVEL).clamp(0, 100);
        let (blend, base) = self.background_mode.blend();

        let mut vars = BTreeMap::new();
        vars.insert("--lava-c1", color(&self.lava_color_primary, DEFAULT_PRIMARY));
        vars.insert("--lava-c2", color(&self.lava_color_secondary, DEFAULT_SECONDARY));
        vars.insert("--lava-c3", color(&self.lava_color_accent, DEFAULT_ACCENT));
        // 60 - speed * 0.5 seconds, in tenths
        vars.insert("--lava-duration", format!("{}s", decimal(600 - speed * 5, 10)));
        // 0.3 + intensity / 200, in thousandths
        vars.insert("--lava-opacity", decimal(300 + intensity * 5, 1000));
        vars.insert("--lava-blend", blend.to_string());
        vars.insert("--bg-base", base.to_string());
        vars
    }
}

/// Theme document of one design context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DesignTheme {
    #[serde(default)]
    pub default_theme: ThemeSettings,
    /// Per-album overrides keyed by album slug.
    #[serde(default)]
    pub albums: BTreeMap<String, ThemeSettings>,
}

impl DesignTheme {
    pub fn effective(&self, album: Option<&str>) -> &ThemeSettings {
        album
            .and_then(|slug| self.albums.get(slug))
            .unwrap_or(&self.default_theme)
    }

    pub fn validate(&self) -> Result<(), ThemeError> {
        self.default_theme.validate()?;
        self.albums.values().try_for_each(ThemeSettings::validate)
    }
}

fn is_hex_color(value: &str) -> bool {
    value
        .strip_prefix('#')
        .is_some_and(|hex| matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Formats `value / scale` without trailing zeros.
fn decimal(value: i64, scale: i64) -> String {
    let whole = value / scale;
    let frac = value % scale;
    if frac == 0 {
        return whole.to_string();
    }
    let width = scale.ilog10() as usize;
    let digits = format!("{:0width$}", frac, width = width);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}
