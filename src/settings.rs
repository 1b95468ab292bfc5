use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Persisted key-value settings backed by a TOML file. Each key is
/// independent; every write saves the whole file.
#[derive(Debug)]
pub struct Settings {
    path: PathBuf,
    values: toml::Table,
}

impl Settings {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let values = if path.exists() {
            let data = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
            match data.parse::<toml::Table>() {
                Ok(values) => values,
                Err(err) => {
                    log::warn!("Failed to parse settings {}: {err}", path.display());
                    toml::Table::new()
                }
            }
        } else {
            toml::Table::new()
        };
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.values
            .get(key)
            .and_then(toml::Value::as_bool)
            .unwrap_or(default)
    }

    pub fn set_bool(&mut self, key: &str, value: bool) -> Result<()> {
        self.values
            .insert(key.to_string(), toml::Value::Boolean(value));
        self.save()
    }

    /// Numeric reads never fail: a missing key, a non-numeric value or an
    /// unparsable numeric string all read as zero.
    pub fn get_i64(&self, key: &str) -> i64 {
        match self.values.get(key) {
            Some(toml::Value::Integer(value)) => *value,
            Some(toml::Value::String(value)) => value.trim().parse().unwrap_or(0),
            _ => 0,
        }
    }

    pub fn set_i64(&mut self, key: &str, value: i64) -> Result<()> {
        self.values
            .insert(key.to_string(), toml::Value::Integer(value));
        self.save()
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create settings directory: {}", parent.display())
                })?;
            }
        }
        let data = toml::to_string_pretty(&self.values).context("Failed to serialize settings")?;
        fs::write(&self.path, data)
            .with_context(|| format!("Failed to write settings file: {}", self.path.display()))
    }
}

pub fn default_settings_path() -> PathBuf {
    PathBuf::from("settings.toml")
}
