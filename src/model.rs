use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayableFile(PathBuf);

impl PlayableFile {
    /// Normalizes `path` into a queue entry. This grants nothing: the bridge
    /// still refuses to read a file the resolver never handed out.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self(crate::resolver::normalize_path(path.as_ref()))
    }

    pub(crate) fn from_normalized(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl AsRef<Path> for PlayableFile {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for PlayableFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Files(Vec<PathBuf>),
    Folders(Vec<PathBuf>),
    Dropped(Vec<PathBuf>),
}

impl Selection {
    pub fn paths(&self) -> &[PathBuf] {
        match self {
            Self::Files(paths) | Self::Folders(paths) | Self::Dropped(paths) => paths,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Files(_) => "file picker",
            Self::Folders(_) => "folder picker",
            Self::Dropped(_) => "drop",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppMode {
    Development,
    #[default]
    Production,
}

impl AppMode {
    pub fn from_env() -> Self {
        match std::env::var("KURENAI_ENV") {
            Ok(value) if value.eq_ignore_ascii_case("development") => Self::Development,
            _ => Self::Production,
        }
    }

    pub fn is_development(self) -> bool {
        self == Self::Development
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistedState {
    #[serde(default = "default_saved_volume")]
    pub saved_volume: f32,
    #[serde(default = "default_media_extensions")]
    pub media_extensions: Vec<String>,
    #[serde(default = "default_case_sensitive_extensions")]
    pub case_sensitive_extensions: bool,
}

fn default_saved_volume() -> f32 {
    1.0
}

fn default_media_extensions() -> Vec<String> {
    vec![String::from("mp3"), String::from("mp4")]
}

fn default_case_sensitive_extensions() -> bool {
    true
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            saved_volume: default_saved_volume(),
            media_extensions: default_media_extensions(),
            case_sensitive_extensions: default_case_sensitive_extensions(),
        }
    }
}
