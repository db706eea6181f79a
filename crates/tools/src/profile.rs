//! Profile store
//!
//! One TOML table per remote profile, holding the device identity, the
//! current rolling code, and the bucket calibration captured during
//! initialization. The whole file is rewritten on save; concurrent
//! invocations against the same profile are expected to be serialized
//! by the caller (single-process use).

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use somfy_rfraw::prelude::SyncTokens;

/// One remote's persisted identity and calibration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Device id as a hex string, e.g. "0xC0FFEE".
    pub device: String,
    /// Rolling code of the last transmitted frame.
    pub rolling_code: u16,
    /// Comma-separated bucket durations in microseconds.
    pub buckets: String,
    /// Calibrated timing tokens (bucket indices as hex digits).
    pub hw_sync: String,
    pub sw_sync: String,
    pub long: String,
    pub short: String,
    /// Bridge hostname for the `run` subcommand.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

impl Profile {
    /// Parse the stored device id ("0x"-prefixed hex or decimal).
    pub fn device_id(&self) -> Result<u32> {
        parse_device_id(&self.device)
            .with_context(|| format!("invalid stored device id '{}'", self.device))
    }

    /// Parse the stored bucket durations.
    pub fn bucket_values(&self) -> Result<Vec<u32>> {
        self.buckets
            .split(',')
            .map(|v| {
                v.trim()
                    .parse::<u32>()
                    .with_context(|| format!("invalid bucket duration '{}'", v))
            })
            .collect()
    }

    /// The calibrated timing tokens for transmit assembly.
    pub fn sync_tokens(&self) -> SyncTokens {
        SyncTokens {
            hw_sync: self.hw_sync.clone(),
            sw_sync: self.sw_sync.clone(),
            long: self.long.clone(),
            short: self.short.clone(),
        }
    }
}

/// Parse a device id: "0x"-prefixed hex or plain decimal.
pub fn parse_device_id(s: &str) -> Result<u32> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).context("invalid hex device id")
    } else {
        s.parse::<u32>().context("invalid decimal device id")
    }
}

/// All profiles of one store file.
#[derive(Debug)]
pub struct ProfileStore {
    path: PathBuf,
    profiles: BTreeMap<String, Profile>,
}

impl ProfileStore {
    /// Load a store, treating a missing file as an empty store.
    pub fn load(path: &Path) -> Result<Self> {
        let profiles = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read profile store {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("failed to parse profile store {:?}", path))?
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path: path.to_path_buf(),
            profiles,
        })
    }

    /// Persist the whole store.
    pub fn save(&self) -> Result<()> {
        let content =
            toml::to_string_pretty(&self.profiles).context("failed to serialize profile store")?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("failed to write profile store {:?}", self.path))?;
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&Profile> {
        match self.profiles.get(name) {
            Some(profile) => Ok(profile),
            None => bail!("profile '{}' not found in {:?}", name, self.path),
        }
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut Profile> {
        match self.profiles.get_mut(name) {
            Some(profile) => Ok(profile),
            None => bail!("profile '{}' not found in {:?}", name, self.path),
        }
    }

    /// Create or replace a profile.
    pub fn insert(&mut self, name: &str, profile: Profile) {
        self.profiles.insert(name.to_string(), profile);
    }
}
