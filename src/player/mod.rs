//! Host-side model of the song player that runs on the board.
//!
//! The board reads `/sd/player.json`, builds a song list from it and lets
//! the user pick and play songs with one or two rotary encoders. Songs are
//! a `.wav` file, a `.mid` file, or both played in sync. This module holds
//! the same rules so a card can be checked before it goes into the board.

pub mod config;
pub mod controller;
pub mod playback;
pub mod song;

pub use config::{PlayerConfig, CONFIG_FILENAME};
pub use controller::{Controller, EncoderInput, EncoderLayout, Transport};
pub use playback::{MidiEvent, MidiMessage, MidiSink, MidiTimeline, SongPlayback};
pub use song::{SdCard, Song};
