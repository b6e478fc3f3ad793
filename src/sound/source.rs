//! Sound source management.
//!
//! This module picks the sound played when a break is due. Platform system
//! sounds are preferred; the synthesized chime is the fallback.

use std::path::PathBuf;

use super::error::SoundError;

/// Represents the source of a sound to be played.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoundSource {
    /// A sound file shipped with the operating system.
    System {
        /// The name of the sound (e.g., "Glass").
        name: String,
        /// The full path to the sound file.
        path: PathBuf,
    },
    /// The two-tone chime synthesized at playback time.
    Chime,
}

impl SoundSource {
    /// Creates a new system sound source.
    #[must_use]
    pub fn system(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::System {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Returns the name of the sound source.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::System { name, .. } => name,
            Self::Chime => "chime",
        }
    }

    /// Returns true if this is a system sound.
    #[must_use]
    pub fn is_system(&self) -> bool {
        matches!(self, Self::System { .. })
    }

    /// Returns the file path if this is a system sound.
    #[must_use]
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::System { path, .. } => Some(path),
            Self::Chime => None,
        }
    }
}

/// Directories to search for system sounds, in order of priority.
#[cfg(target_os = "macos")]
const SYSTEM_SOUND_DIRS: &[&str] = &["/System/Library/Sounds", "/Library/Sounds"];

#[cfg(target_os = "windows")]
const SYSTEM_SOUND_DIRS: &[&str] = &["C:\\Windows\\Media"];

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const SYSTEM_SOUND_DIRS: &[&str] = &[
    "/usr/share/sounds/freedesktop/stereo",
    "/usr/share/sounds/gnome/default/alerts",
];

/// Supported audio file extensions.
const SUPPORTED_EXTENSIONS: &[&str] = &["aiff", "wav", "mp3", "ogg", "oga", "flac"];

/// Default sound names to try, in order of preference.
const DEFAULT_SOUND_NAMES: &[&str] = &[
    "Glass",
    "Ping",
    "complete",
    "bell",
    "Windows Notify System Generic",
    "chimes",
];

/// Discovers available system sounds.
///
/// Returns an empty vector if no sounds are found.
#[must_use]
pub fn discover_system_sounds() -> Vec<SoundSource> {
    let mut sounds = Vec::new();

    for dir in SYSTEM_SOUND_DIRS {
        let Ok(entries) = std::fs::read_dir(dir) else {
            continue;
        };

        for entry in entries.flatten() {
            let file_path = entry.path();
            let supported = file_path
                .extension()
                .map(|ext| ext.to_string_lossy().to_lowercase())
                .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()));
            if !supported {
                continue;
            }
            if let Some(stem) = file_path.file_stem() {
                sounds.push(SoundSource::System {
                    name: stem.to_string_lossy().into_owned(),
                    path: file_path,
                });
            }
        }
    }

    sounds.sort_by(|a, b| a.name().cmp(b.name()));
    sounds
}

/// Gets the sound played when a break is due.
///
/// Prefers a known system sound, then any system sound, then the chime.
#[must_use]
pub fn get_default_sound() -> SoundSource {
    let system_sounds = discover_system_sounds();

    for preferred_name in DEFAULT_SOUND_NAMES {
        if let Some(sound) = system_sounds.iter().find(|s| s.name() == *preferred_name) {
            return sound.clone();
        }
    }

    system_sounds.into_iter().next().unwrap_or(SoundSource::Chime)
}

/// Finds a system sound by name.
///
/// # Errors
///
/// Returns `SoundError::FileNotFound` if no sound with the given name exists.
pub fn find_system_sound(name: &str) -> Result<SoundSource, SoundError> {
    discover_system_sounds()
        .into_iter()
        .find(|s| s.name().eq_ignore_ascii_case(name))
        .ok_or_else(|| SoundError::FileNotFound(format!("System sound '{}' not found", name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sound_source_system() {
        let source = SoundSource::system("Glass", "/System/Library/Sounds/Glass.aiff");
        assert!(source.is_system());
        assert_eq!(source.name(), "Glass");
        assert!(source.path().is_some());
    }

    #[test]
    fn test_sound_source_chime() {
        let source = SoundSource::Chime;
        assert!(!source.is_system());
        assert_eq!(source.name(), "chime");
        assert!(source.path().is_none());
    }

    #[test]
    fn test_discover_system_sounds_no_panic() {
        // Results depend on the host; containers usually have none.
        let sounds = discover_system_sounds();
        assert!(sounds.iter().all(SoundSource::is_system));
    }

    #[test]
    fn test_get_default_sound_returns_source() {
        let source = get_default_sound();
        assert!(!source.name().is_empty());
    }

    #[test]
    fn test_find_system_sound_not_found() {
        let result = find_system_sound("NonExistentSound12345");
        match result {
            Err(SoundError::FileNotFound(msg)) => assert!(msg.contains("NonExistentSound12345")),
            other => panic!("Expected FileNotFound error, got {:?}", other),
        }
    }

    #[test]
    fn test_supported_extensions() {
        assert!(SUPPORTED_EXTENSIONS.contains(&"wav"));
        assert!(SUPPORTED_EXTENSIONS.contains(&"oga"));
    }
}
