//! Time-driven playback of a song's MIDI track alongside its audio file.
//!
//! The board runs one update task every millisecond. Each update asks the
//! timeline for everything that is due, forwards the messages the synth
//! understands and learns how long it may sleep before the next one.

/// Messages read from a MIDI file track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiMessage {
    NoteOn { channel: u8, note: u8, velocity: u8 },
    NoteOff { channel: u8, note: u8 },
    ControlChange { channel: u8, control: u8, value: u8 },
    ProgramChange { channel: u8, program: u8 },
    /// Anything else in the file (meta events, sysex, pitch bend, ...).
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MidiEvent {
    /// Microseconds since the previous event.
    pub delta_us: u64,
    pub message: MidiMessage,
}

/// MIDI output port.
pub trait MidiSink {
    fn send(&mut self, message: MidiMessage);
}

impl MidiSink for Vec<MidiMessage> {
    fn send(&mut self, message: MidiMessage) {
        self.push(message);
    }
}

#[derive(Debug, Clone)]
pub struct MidiTimeline {
    events: Vec<MidiEvent>,
    cursor: usize,
    /// Absolute time of `events[cursor]`.
    due_us: u64,
    stopped: bool,
}

impl MidiTimeline {
    pub fn new(events: Vec<MidiEvent>) -> Self {
        let due_us = events.first().map_or(0, |e| e.delta_us);
        Self {
            events,
            cursor: 0,
            due_us,
            stopped: false,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.stopped || self.cursor >= self.events.len()
    }

    pub fn stop(&mut self) {
        self.stopped = true;
    }

    /// Dispatch every event due at `elapsed_us` (time since playback
    /// started). Returns the wait until the next event, or `None` once the
    /// track is exhausted or stopped.
    pub fn poll(&mut self, elapsed_us: u64, sink: &mut impl MidiSink) -> Option<u64> {
        while !self.is_finished() && self.due_us <= elapsed_us {
            let message = self.events[self.cursor].message;
            if !matches!(message, MidiMessage::Other) {
                sink.send(message);
            }
            self.cursor += 1;
            if let Some(next) = self.events.get(self.cursor) {
                self.due_us = self.due_us.saturating_add(next.delta_us);
            }
        }
        if self.is_finished() {
            None
        } else {
            Some(self.due_us - elapsed_us)
        }
    }
}

/// A song in progress: its MIDI timeline and whether its audio file is
/// still streaming. Playback ends when both are done.
#[derive(Debug, Clone)]
pub struct SongPlayback {
    midi: Option<MidiTimeline>,
    audio_playing: bool,
}

impl SongPlayback {
    pub fn new(midi: Option<MidiTimeline>, has_audio: bool) -> Self {
        Self {
            midi,
            audio_playing: has_audio,
        }
    }

    /// Advance playback. `audio_active` reports whether the audio driver
    /// is still outputting. Returns false when the song has finished.
    pub fn update(
        &mut self,
        elapsed_us: u64,
        audio_active: bool,
        sink: &mut impl MidiSink,
    ) -> bool {
        if let Some(midi) = self.midi.as_mut() {
            midi.poll(elapsed_us, sink);
        }
        if self.audio_playing && !audio_active {
            self.audio_playing = false;
        }
        self.is_playing()
    }

    pub fn is_playing(&self) -> bool {
        let midi_playing = self.midi.as_ref().is_some_and(|m| !m.is_finished());
        midi_playing || self.audio_playing
    }

    pub fn stop(&mut self) {
        if let Some(midi) = self.midi.as_mut() {
            midi.stop();
        }
        self.audio_playing = false;
    }
}
