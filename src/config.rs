use anyhow::{anyhow, Context, Result};
use eframe::egui::Color32;
use serde::Deserialize;
use std::{env, fs, path::PathBuf};

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub ui: UiConfig,
    pub storage: StorageConfig,
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut candidates = Vec::new();

        if let Ok(current_dir) = env::current_dir() {
            candidates.push(current_dir.join("config.toml"));
            candidates.push(current_dir.join("config").join("config.toml"));
            candidates.push(current_dir.join("config").join("bookmarks_gui.toml"));
        }

        if let Ok(exe) = env::current_exe() {
            if let Some(dir) = exe.parent() {
                candidates.push(dir.join("config.toml"));
                candidates.push(dir.join("config").join("config.toml"));
                candidates.push(dir.join("config").join("bookmarks_gui.toml"));
            }
        }

        for path in candidates {
            if path.exists() {
                let data = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config file: {}", path.display()))?;
                let doc: ConfigDocument = toml::from_str(&data)
                    .with_context(|| format!("Failed to parse config: {}", path.display()))?;
                return Ok(doc.into());
            }
        }

        Ok(Config::default())
    }
}

#[derive(Debug, Clone, Default)]
pub struct UiConfig {
    pub markers: MarkerStyleConfig,
}

#[derive(Debug, Clone)]
pub struct MarkerStyleConfig {
    pub color: Color32,
    pub width: f32,
}

impl Default for MarkerStyleConfig {
    fn default() -> Self {
        Self {
            color: Color32::from_rgb(255, 200, 87),
            width: 3.0,
        }
    }
}

impl MarkerStyleConfig {
    pub fn width(&self) -> f32 {
        self.width.clamp(1.0, 8.0)
    }
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub bookmarks_path: Option<PathBuf>,
    pub settings_path: Option<PathBuf>,
    pub watch_bookmarks: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bookmarks_path: None,
            settings_path: None,
            watch_bookmarks: true,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigDocument {
    #[serde(default)]
    ui: UiSection,
    #[serde(default)]
    storage: StorageSection,
}

impl From<ConfigDocument> for Config {
    fn from(value: ConfigDocument) -> Self {
        let defaults = MarkerStyleConfig::default();
        let color = match value.ui.markers.color.as_deref() {
            Some(raw) => parse_color(raw).unwrap_or_else(|err| {
                log::warn!("Ignoring marker color: {err}");
                defaults.color
            }),
            None => defaults.color,
        };

        Config {
            ui: UiConfig {
                markers: MarkerStyleConfig {
                    color,
                    width: value.ui.markers.width.unwrap_or(defaults.width),
                },
            },
            storage: StorageConfig {
                bookmarks_path: value.storage.bookmarks_path,
                settings_path: value.storage.settings_path,
                watch_bookmarks: value.storage.watch_bookmarks.unwrap_or(true),
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct UiSection {
    #[serde(default)]
    markers: MarkerSection,
}

#[derive(Debug, Default, Deserialize)]
struct MarkerSection {
    color: Option<String>,
    width: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
struct StorageSection {
    bookmarks_path: Option<PathBuf>,
    settings_path: Option<PathBuf>,
    watch_bookmarks: Option<bool>,
}

fn parse_color(value: &str) -> Result<Color32> {
    let v = value.trim();
    let Some(hex) = v.strip_prefix('#') else {
        return Err(anyhow!("Unsupported color format: {v}"));
    };

    let bytes = match hex.len() {
        6 | 8 => u32::from_str_radix(hex, 16).ok(),
        _ => None,
    }
    .ok_or_else(|| anyhow!("Invalid hex color: #{hex}"))?;

    Ok(match hex.len() {
        6 => {
            let r = ((bytes >> 16) & 0xFF) as u8;
            let g = ((bytes >> 8) & 0xFF) as u8;
            let b = (bytes & 0xFF) as u8;
            Color32::from_rgb(r, g, b)
        }
        _ => {
            let a = (bytes & 0xFF) as u8;
            let b = ((bytes >> 8) & 0xFF) as u8;
            let g = ((bytes >> 16) & 0xFF) as u8;
            let r = ((bytes >> 24) & 0xFF) as u8;
            Color32::from_rgba_premultiplied(r, g, b, a)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn hex_colors_parse() {
        assert_eq!(parse_color("#ff0000").unwrap(), Color32::from_rgb(255, 0, 0));
        assert_eq!(
            parse_color(" #00FF00 ").unwrap(),
            Color32::from_rgb(0, 255, 0)
        );
        assert!(parse_color("blue").is_err());
        assert!(parse_color("#12345").is_err());
    }

    #[test]
    fn document_defaults_fill_missing_sections() {
        let doc: ConfigDocument = toml::from_str("").unwrap();
        let config: Config = doc.into();
        assert_eq!(config.ui.markers.width, 3.0);
        assert!(config.storage.watch_bookmarks);
        assert!(config.storage.bookmarks_path.is_none());
    }

    #[test]
    fn invalid_marker_color_falls_back_to_default() {
        let doc: ConfigDocument =
            toml::from_str("[ui.markers]\ncolor = \"chartreuse\"\nwidth = 20.0\n").unwrap();
        let config: Config = doc.into();
        assert_eq!(config.ui.markers.color, MarkerStyleConfig::default().color);
        assert_eq!(config.ui.markers.width(), 8.0);
    }
}
