use std::path::Path;

use eframe::egui;
use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use super::shapes::FontSize;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontSettings {
    pub x_small: f32,
    pub small: f32,
    pub medium: f32,
    pub large: f32,
    pub line_height: f32,
}

impl Default for FontSettings {
    fn default() -> Self {
        Self {
            x_small: 10.0,
            small: 12.0,
            medium: 14.0,
            large: 18.0,
            line_height: 1.2,
        }
    }
}

impl FontSettings {
    pub fn size_of(&self, size: FontSize) -> f32 {
        match size {
            FontSize::XSmall => self.x_small,
            FontSize::Small => self.small,
            FontSize::Medium => self.medium,
            FontSize::Large => self.large,
            FontSize::Points(p) => p,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorSettings {
    pub fill: String,
    pub stroke: String,
    pub text: String,
}

impl Default for ColorSettings {
    fn default() -> Self {
        Self {
            fill: "#ffffff".to_owned(),
            stroke: "#000000".to_owned(),
            text: "#000000".to_owned(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub padding: f32,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self { padding: 10.0 }
    }
}

/// Viewer and renderer settings, read from TOML.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub language: Option<String>,
    pub fonts: FontSettings,
    pub colors: ColorSettings,
    pub export: ExportSettings,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Palette {
    pub fill: egui::Color32,
    pub stroke: egui::Color32,
    pub text: egui::Color32,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            fill: egui::Color32::WHITE,
            stroke: egui::Color32::BLACK,
            text: egui::Color32::BLACK,
        }
    }
}

fn parse_color(field: &'static str, value: &str) -> Result<egui::Color32, ConfigError> {
    egui::Color32::from_hex(value).map_err(|_| ConfigError::InvalidColor {
        field,
        value: value.to_owned(),
    })
}

impl Settings {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(s)?;
        settings.palette()?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn palette(&self) -> Result<Palette, ConfigError> {
        Ok(Palette {
            fill: parse_color("colors.fill", &self.colors.fill)?,
            stroke: parse_color("colors.stroke", &self.colors.stroke)?,
            text: parse_color("colors.text", &self.colors.text)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let settings = Settings::from_toml_str("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.palette().unwrap(), Palette::default());
    }

    #[test]
    fn partial_tables_keep_other_defaults() {
        let settings = Settings::from_toml_str(
            r##"
language = "en-US"

[fonts]
x_small = 8.0

[colors]
fill = "#ffffcc"
"##,
        )
        .unwrap();
        assert_eq!(settings.language.as_deref(), Some("en-US"));
        assert_eq!(settings.fonts.x_small, 8.0);
        assert_eq!(settings.fonts.medium, 14.0);
        assert_eq!(
            settings.palette().unwrap().fill,
            egui::Color32::from_rgb(0xff, 0xff, 0xcc)
        );
        assert_eq!(settings.export.padding, 10.0);
    }

    #[test]
    fn invalid_color_is_reported() {
        let err = Settings::from_toml_str("[colors]\nstroke = \"blackish\"\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidColor {
                field: "colors.stroke",
                ..
            }
        ));
    }

    #[test]
    fn invalid_toml_is_reported() {
        let err = Settings::from_toml_str("fonts = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_reads_file() {
        let path = std::env::temp_dir().join(format!("nh-glyphs-{}.toml", uuid::Uuid::now_v7()));
        std::fs::write(&path, "[export]\npadding = 4.0\n").unwrap();
        let settings = Settings::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(settings.export.padding, 4.0);

        assert!(matches!(Settings::load(&path), Err(ConfigError::Io(_))));
    }

    #[test]
    fn keyword_sizes() {
        let fonts = FontSettings::default();
        assert_eq!(fonts.size_of(FontSize::XSmall), 10.0);
        assert_eq!(fonts.size_of(FontSize::Points(11.0)), 11.0);
    }
}
