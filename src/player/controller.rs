//! Encoder-driven song selection and volume, plus the 16x2 status display.

use anyhow::{bail, Result};

use super::config::PlayerConfig;
use super::song::Song;

pub const DISPLAY_COLUMNS: usize = 16;
pub const GRAPH_WIDTH: usize = 15;
pub const VOLUME_STEP: f32 = 0.05;

const PLAYING_GLYPH: char = '"';
const STOPPED_GLYPH: char = '>';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderInput {
    Increment,
    Decrement,
    Click,
}

/// How the board's rotary encoders are wired to controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderLayout {
    None,
    /// Turn selects a song, click plays or stops.
    Single,
    /// Encoder 0 sets volume; encoder 1 selects and plays.
    Dual,
}

impl EncoderLayout {
    pub fn for_count(count: usize) -> Self {
        match count {
            0 => EncoderLayout::None,
            1 => EncoderLayout::Single,
            _ => EncoderLayout::Dual,
        }
    }
}

/// What the caller must do to the audio/MIDI outputs after a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Start(usize),
    Stop,
}

/// Selection, volume and play state driven by the board's encoders.
///
/// Always holds at least one song, so the selected index is valid.
#[derive(Debug, Clone)]
pub struct Controller {
    songs: Vec<Song>,
    selected: usize,
    level: f32,
    playing: bool,
}

impl Controller {
    /// Controller over `songs`, starting stopped on the first one.
    ///
    /// # Returns
    ///
    /// * `Err` if `songs` is empty
    pub fn new(songs: Vec<Song>, level: f32) -> Result<Self> {
        if songs.is_empty() {
            bail!("controller needs at least one song");
        }
        Ok(Self {
            songs,
            selected: 0,
            level: level.clamp(0.0, 1.0),
            playing: false,
        })
    }

    /// Controller over a loaded config's songs at its configured volume,
    /// or `default_level` when the config sets none.
    pub fn from_config(config: &PlayerConfig, default_level: f32) -> Result<Self> {
        Self::new(config.songs.clone(), config.volume.unwrap_or(default_level))
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_song(&self) -> &Song {
        &self.songs[self.selected]
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn next_song(&mut self) {
        if !self.playing {
            self.selected = (self.selected + 1) % self.songs.len();
        }
    }

    pub fn previous_song(&mut self) {
        if !self.playing {
            self.selected = (self.selected + self.songs.len() - 1) % self.songs.len();
        }
    }

    pub fn toggle(&mut self, index: Option<usize>) -> Transport {
        if let Some(index) = index {
            self.selected = index % self.songs.len();
        }
        if self.playing {
            self.playing = false;
            Transport::Stop
        } else {
            self.playing = true;
            Transport::Start(self.selected)
        }
    }

    /// Playback ran out on its own.
    pub fn finished(&mut self) {
        self.playing = false;
    }

    /// Select the song bound to a keyboard key and start it.
    pub fn play_key(&mut self, key: u64) -> Option<Transport> {
        let index = self.songs.iter().position(|song| song.is_key(key))?;
        self.selected = index;
        self.playing = true;
        Some(Transport::Start(index))
    }

    pub fn volume_up(&mut self) {
        if self.level < 1.0 {
            self.level = (self.level + VOLUME_STEP).min(1.0);
        }
    }

    pub fn volume_down(&mut self) {
        if self.level > 0.0 {
            self.level = (self.level - VOLUME_STEP).max(0.0);
        }
    }

    /// Route an encoder event. Returns a transport change when the event
    /// toggled playback.
    pub fn handle(
        &mut self,
        layout: EncoderLayout,
        encoder: usize,
        input: EncoderInput,
    ) -> Option<Transport> {
        match (layout, encoder, input) {
            (EncoderLayout::Dual, 0, EncoderInput::Increment) => self.volume_up(),
            (EncoderLayout::Dual, 0, EncoderInput::Decrement) => self.volume_down(),
            (EncoderLayout::Single, 0, EncoderInput::Increment)
            | (EncoderLayout::Dual, 1, EncoderInput::Increment) => self.next_song(),
            (EncoderLayout::Single, 0, EncoderInput::Decrement)
            | (EncoderLayout::Dual, 1, EncoderInput::Decrement) => self.previous_song(),
            (EncoderLayout::Single, 0, EncoderInput::Click)
            | (EncoderLayout::Dual, 1, EncoderInput::Click) => return Some(self.toggle(None)),
            _ => {}
        }
        None
    }

    /// Both display lines, each exactly [`DISPLAY_COLUMNS`] wide.
    pub fn render(&self) -> [String; 2] {
        let filled = ((self.level * GRAPH_WIDTH as f32).round() as usize).min(GRAPH_WIDTH);
        let mut top = String::with_capacity(DISPLAY_COLUMNS);
        top.extend(std::iter::repeat('#').take(filled));
        top.extend(std::iter::repeat(' ').take(GRAPH_WIDTH - filled));
        top.push(if self.playing {
            PLAYING_GLYPH
        } else {
            STOPPED_GLYPH
        });

        let title: String = self
            .selected_song()
            .title
            .chars()
            .take(DISPLAY_COLUMNS)
            .collect();
        let bottom = format!("{title:<width$}", width = DISPLAY_COLUMNS);

        [top, bottom]
    }
}
