use crate::model::{PersistedState, PlayableFile, Selection};
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionFilter {
    extensions: Vec<String>,
    case_sensitive: bool,
}

impl ExtensionFilter {
    pub fn new<I, S>(extensions: I, case_sensitive: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim().trim_start_matches('.').to_string())
            .filter(|ext| !ext.is_empty())
            .map(|ext| {
                if case_sensitive {
                    ext
                } else {
                    ext.to_lowercase()
                }
            })
            .collect();
        Self {
            extensions,
            case_sensitive,
        }
    }

    pub fn from_state(state: &PersistedState) -> Self {
        Self::new(&state.media_extensions, state.case_sensitive_extensions)
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn matches(&self, path: &Path) -> bool {
        let Some(name) = path.file_name() else {
            return false;
        };
        let name = name.to_string_lossy();
        let name = if self.case_sensitive {
            name.into_owned()
        } else {
            name.to_lowercase()
        };

        self.extensions
            .iter()
            .any(|ext| name.strip_suffix(ext.as_str()).is_some_and(|stem| stem.ends_with('.')))
    }
}

impl Default for ExtensionFilter {
    fn default() -> Self {
        Self::from_state(&PersistedState::default())
    }
}

#[derive(Debug, Clone, Default)]
pub struct PathResolver {
    filter: ExtensionFilter,
}

impl PathResolver {
    pub fn new(filter: ExtensionFilter) -> Self {
        Self { filter }
    }

    pub fn filter(&self) -> &ExtensionFilter {
        &self.filter
    }

    pub fn resolve(&self, selection: &Selection) -> Vec<PlayableFile> {
        let (files, dirs) = partition(selection.paths());

        let mut resolved = Vec::new();
        let mut seen = HashSet::new();
        let mut push = |path: &Path| {
            let normalized = normalize_path(path);
            if seen.insert(normalized.clone()) {
                resolved.push(PlayableFile::from_normalized(normalized));
            }
        };

        for file in files.iter().filter(|path| self.filter.matches(path)) {
            push(file);
        }

        for dir in &dirs {
            match self.expand_directory(dir) {
                Ok(children) => children.iter().for_each(|child| push(child)),
                Err(err) => warn!("skipping directory {}: {err:#}", dir.display()),
            }
        }

        info!(
            source = selection.label(),
            inputs = selection.paths().len(),
            resolved = resolved.len(),
            "resolved selection"
        );
        resolved
    }

    pub fn expand_directory(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut children = Vec::new();

        for entry in WalkDir::new(dir)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if err.depth() == 0 => {
                    return Err(err)
                        .with_context(|| format!("failed to list {}", dir.display()));
                }
                Err(err) => {
                    debug!("skipping unreadable entry in {}: {err}", dir.display());
                    continue;
                }
            };

            if entry.depth() == 0 || !entry.file_type().is_file() {
                continue;
            }
            if self.filter.matches(entry.path()) {
                children.push(dir.join(entry.file_name()));
            }
        }

        Ok(children)
    }
}

fn partition(paths: &[PathBuf]) -> (Vec<PathBuf>, Vec<PathBuf>) {
    let mut files = Vec::new();
    let mut dirs = Vec::new();

    for path in paths {
        match fs::metadata(path) {
            Ok(meta) if meta.is_file() => files.push(path.clone()),
            Ok(meta) if meta.is_dir() => dirs.push(path.clone()),
            Ok(_) => debug!("ignoring special file {}", path.display()),
            Err(err) => debug!("ignoring {}: {err}", path.display()),
        }
    }

    (files, dirs)
}

pub fn normalize_path(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let stripped = strip_windows_verbatim_prefix(&absolute);

    let mut out = PathBuf::new();
    for component in stripped.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }

    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

pub fn strip_windows_verbatim_prefix(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();

    if let Some(trimmed) = raw.strip_prefix(r"\\?\UNC\") {
        return PathBuf::from(format!(r"\\{trimmed}"));
    }

    if let Some(trimmed) = raw.strip_prefix(r"\\?\") {
        return PathBuf::from(trimmed);
    }

    path.to_path_buf()
}
