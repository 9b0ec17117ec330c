//! `player.json` loading, with the same acceptance rules the board applies
//! at boot.

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::fs;

use super::song::{float, positive_int, SdCard, Song};

pub const CONFIG_FILENAME: &str = "player.json";

/// A validated `player.json`: the settings the board applies plus every
/// usable song. Holds at least one song.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerConfig {
    /// Output level in 0.0..=1.0, when configured.
    pub volume: Option<f32>,
    /// MIDI output channel, when configured as an integer > 0.
    pub midi_channel: Option<u32>,
    pub songs: Vec<Song>,
    /// Indices into the `songs` array that were skipped.
    pub rejected: Vec<usize>,
}

impl PlayerConfig {
    /// Read and validate `player.json` at the root of the card.
    ///
    /// # Returns
    ///
    /// * `Err` if the file is missing, not JSON, not an object, has no song
    ///   list, or none of its songs are usable
    pub fn load(sd: &SdCard) -> Result<Self> {
        let path = sd.root().join(CONFIG_FILENAME);
        let invalid = || {
            format!(
                "Invalid configuration or configuration file not found. Must provide valid /{CONFIG_FILENAME} file ('{}')",
                path.display()
            )
        };
        let raw = fs::read(&path).with_context(invalid)?;
        let value: Value = serde_json::from_slice(&raw).with_context(invalid)?;
        Self::from_value(&value, sd)
    }

    /// Validate an already-parsed config against the card's files.
    pub fn from_value(config: &Value, sd: &SdCard) -> Result<Self> {
        if !config.is_object() {
            bail!(
                "Invalid configuration or configuration file not found. Must provide valid /{CONFIG_FILENAME} file."
            );
        }

        let volume = float(config.get("volume")).map(|v| v.clamp(0.0, 1.0) as f32);
        let midi_channel =
            positive_int(config.get("midi_channel")).and_then(|c| u32::try_from(c).ok());

        let entries = match config.get("songs") {
            Some(Value::Array(entries)) if !entries.is_empty() => entries,
            _ => bail!("Must provide list of songs in /{CONFIG_FILENAME}."),
        };

        let mut songs = Vec::with_capacity(entries.len());
        let mut rejected = Vec::new();
        for (index, entry) in entries.iter().enumerate() {
            match Song::from_value(entry, sd) {
                Some(song) => songs.push(song),
                None => rejected.push(index),
            }
        }

        if songs.is_empty() {
            bail!(
                "No valid songs available. Please check configuration at /{CONFIG_FILENAME}."
            );
        }

        Ok(Self {
            volume,
            midi_channel,
            songs,
            rejected,
        })
    }
}
