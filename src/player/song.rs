use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};

pub const AUDIO_EXT: &str = "wav";
pub const MIDI_EXT: &str = "mid";

/// Mount point of the SD card on the board.
pub const DEVICE_SD_ROOT: &str = "/sd";

/// An SD card's content as seen from the host.
#[derive(Debug, Clone)]
pub struct SdCard {
    root: PathBuf,
}

impl SdCard {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Host location of a path written relative to the card root.
    pub fn host_path(&self, configured: &str) -> PathBuf {
        self.root.join(configured.trim_start_matches('/'))
    }

    pub fn exists(&self, configured: &str) -> bool {
        self.host_path(configured).exists()
    }
}

/// Path as the board opens it: rooted, under `/sd`.
pub fn device_path(configured: &str) -> String {
    if configured.starts_with('/') {
        format!("{DEVICE_SD_ROOT}{configured}")
    } else {
        format!("{DEVICE_SD_ROOT}/{configured}")
    }
}

/// Positive JSON integer. Floats and booleans never qualify.
///
/// serde_json reads integer literals beyond `u64` as `f64`, so those fail
/// here and pass [`float`]; the board would see a Python `int`. No sane
/// key, note or channel is that large.
pub(crate) fn positive_int(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) if n.is_u64() => n.as_u64().filter(|v| *v > 0),
        _ => None,
    }
}

/// JSON float literal; integer literals are rejected.
pub(crate) fn float(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) if n.is_f64() => n.as_f64(),
        _ => None,
    }
}

pub(crate) fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.as_str()),
        _ => None,
    }
}

/// Case-insensitive extension check; the name must be longer than the
/// extension itself.
pub fn has_extension(value: &str, ext: &str) -> bool {
    let ext = if ext.starts_with('.') {
        ext.to_string()
    } else {
        format!(".{ext}")
    };
    value.len() > ext.len() && value.to_lowercase().ends_with(&ext.to_lowercase())
}

/// File name without directory or extension.
pub fn basename(path: &str) -> &str {
    let name = match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    };
    match name.rfind('.') {
        Some(idx) => &name[..idx],
        None => name,
    }
}

fn media_path<'a>(data: &'a Value, key: &str, ext: &str, sd: &SdCard) -> Option<&'a str> {
    non_empty_str(data.get(key)).filter(|path| has_extension(path, ext) && sd.exists(path))
}

#[derive(Debug, Clone, PartialEq)]
pub struct Song {
    pub key: u64,
    pub midi_note: Option<u64>,
    /// Device paths (`/sd/...`).
    pub audio_file: Option<String>,
    pub midi_file: Option<String>,
    pub title: String,
}

impl Song {
    /// Parse one `songs` entry. `None` means the entry is unusable: not an
    /// object, no positive `key`, or neither a present `.wav` nor `.mid`.
    pub fn from_value(data: &Value, sd: &SdCard) -> Option<Self> {
        if !data.is_object() {
            return None;
        }
        let key = positive_int(data.get("key"))?;
        let audio_file = media_path(data, "audio", AUDIO_EXT, sd).map(device_path);
        let midi_file = media_path(data, "midi", MIDI_EXT, sd).map(device_path);
        if audio_file.is_none() && midi_file.is_none() {
            return None;
        }

        let title = match non_empty_str(data.get("title")) {
            Some(title) => title.to_string(),
            None => {
                let source = audio_file.as_deref().or(midi_file.as_deref()).unwrap_or("");
                basename(source).to_string()
            }
        };

        Some(Self {
            key,
            midi_note: positive_int(data.get("notenum")),
            audio_file,
            midi_file,
            title,
        })
    }

    pub fn is_key(&self, key: u64) -> bool {
        self.key == key
    }

    pub fn has_audio(&self) -> bool {
        self.audio_file.is_some()
    }

    pub fn has_midi(&self) -> bool {
        self.midi_file.is_some()
    }
}

impl fmt::Display for Song {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, ":: {} ::", self.title)?;
        write!(f, "Key = {}", self.key)?;
        if let Some(audio) = &self.audio_file {
            write!(f, "\nAudio = {audio}")?;
        }
        if let Some(midi) = &self.midi_file {
            write!(f, "\nMidi = {midi}")?;
        }
        if let Some(note) = self.midi_note {
            write!(f, "\nMidi Note = {note}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn card() -> (TempDir, SdCard) {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("songs")).unwrap();
        fs::write(temp.path().join("songs/intro.WAV"), b"RIFF").unwrap();
        fs::write(temp.path().join("songs/intro.mid"), b"MThd").unwrap();
        let sd = SdCard::new(temp.path());
        (temp, sd)
    }

    #[test]
    fn extension_check_is_case_insensitive_and_needs_a_name() {
        assert!(has_extension("a.WAV", "wav"));
        assert!(has_extension("a.wav", ".wav"));
        assert!(!has_extension(".wav", "wav"));
        assert!(!has_extension("a.wave", "wav"));
    }

    #[test]
    fn basename_strips_directory_and_extension() {
        assert_eq!(basename("/sd/songs/intro.wav"), "intro");
        assert_eq!(basename("intro.tar.mid"), "intro.tar");
        assert_eq!(basename("noext"), "noext");
    }

    #[test]
    fn device_path_roots_under_sd() {
        assert_eq!(device_path("songs/a.wav"), "/sd/songs/a.wav");
        assert_eq!(device_path("/songs/a.wav"), "/sd/songs/a.wav");
    }

    #[test]
    fn integers_exclude_floats_and_booleans() {
        assert_eq!(positive_int(Some(&json!(3))), Some(3));
        assert_eq!(positive_int(Some(&json!(0))), None);
        assert_eq!(positive_int(Some(&json!(-2))), None);
        assert_eq!(positive_int(Some(&json!(3.0))), None);
        assert_eq!(positive_int(Some(&json!(true))), None);
        assert_eq!(float(Some(&json!(0.5))), Some(0.5));
        assert_eq!(float(Some(&json!(1))), None);
    }

    #[test]
    fn integers_beyond_u64_read_as_floats() {
        let huge: Value = serde_json::from_str("18446744073709551616").unwrap();
        assert_eq!(positive_int(Some(&huge)), None);
        assert_eq!(float(Some(&huge)), Some(18446744073709551616.0));
    }

    #[test]
    fn midi_only_song_is_titled_after_the_midi_file() {
        let (_temp, sd) = card();
        let song = Song::from_value(&json!({"key": 5, "midi": "songs/intro.mid"}), &sd).unwrap();
        assert!(!song.has_audio());
        assert_eq!(song.title, "intro");
    }

    #[test]
    fn song_with_both_files_and_default_title() {
        let (_temp, sd) = card();
        let song = Song::from_value(
            &json!({"key": 2, "audio": "songs/intro.WAV", "midi": "/songs/intro.mid", "notenum": 60}),
            &sd,
        )
        .unwrap();
        assert_eq!(song.audio_file.as_deref(), Some("/sd/songs/intro.WAV"));
        assert_eq!(song.midi_file.as_deref(), Some("/sd/songs/intro.mid"));
        assert_eq!(song.midi_note, Some(60));
        assert_eq!(song.title, "intro");
        assert!(song.is_key(2));
    }

    #[test]
    fn missing_audio_falls_back_to_midi_only() {
        let (_temp, sd) = card();
        let song = Song::from_value(
            &json!({"key": 1, "audio": "songs/gone.wav", "midi": "songs/intro.mid", "title": "Intro"}),
            &sd,
        )
        .unwrap();
        assert!(!song.has_audio());
        assert!(song.has_midi());
        assert_eq!(song.title, "Intro");
    }

    #[test]
    fn unusable_entries_are_rejected() {
        let (_temp, sd) = card();
        assert!(Song::from_value(&json!([1, 2]), &sd).is_none());
        assert!(Song::from_value(&json!({"audio": "songs/intro.WAV"}), &sd).is_none());
        assert!(Song::from_value(&json!({"key": 0, "audio": "songs/intro.WAV"}), &sd).is_none());
        assert!(Song::from_value(&json!({"key": 1, "audio": "songs/intro.mid"}), &sd).is_none());
        assert!(Song::from_value(&json!({"key": 1}), &sd).is_none());
    }

    #[test]
    fn display_lists_present_fields() {
        let song = Song {
            key: 4,
            midi_note: None,
            audio_file: Some("/sd/a.wav".into()),
            midi_file: None,
            title: "a".into(),
        };
        assert_eq!(song.to_string(), ":: a ::\nKey = 4\nAudio = /sd/a.wav");
    }
}
