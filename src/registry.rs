//! Project discovery and configuration.
//!
//! The registry scans the projects root for subdirectories carrying a
//! settings file, resolves defaults, and derives each project's build
//! command from its engine tag. Discovery is read-only; the resulting
//! [`Project`] values are immutable after load (lifecycle status and output
//! live in [`crate::lifecycle::ProjectSet`], not here).

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;

use crate::fleet_config::SETTINGS_FILE_NAME;
use crate::settings;

/// Build engine tag, selecting the build-command template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildEngine {
    /// Static Go cross-compilation (default).
    Go,
    /// Go with cgo and static external linking.
    Cgo,
    /// Unrecognized tag; the project builds only via an explicit override.
    Other(String),
}

impl FromStr for BuildEngine {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "go" => BuildEngine::Go,
            "cgo" => BuildEngine::Cgo,
            other => BuildEngine::Other(other.to_string()),
        })
    }
}

impl std::fmt::Display for BuildEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildEngine::Go => write!(f, "go"),
            BuildEngine::Cgo => write!(f, "cgo"),
            BuildEngine::Other(tag) => write!(f, "{}", tag),
        }
    }
}

impl BuildEngine {
    /// The fixed command template for a recognized engine, targeting the
    /// build artifact at `<project dir>/<id>`. `None` for unrecognized tags.
    fn command_template(&self, artifact: &Path) -> Option<String> {
        match self {
            BuildEngine::Go => Some(format!(
                "CGO_ENABLED=0 GOOS=linux go build -o {}",
                artifact.display()
            )),
            BuildEngine::Cgo => Some(format!(
                "CGO_ENABLED=1 GOOS=linux go build -ldflags '-linkmode external -extldflags \"-static\"' -o {}",
                artifact.display()
            )),
            BuildEngine::Other(_) => None,
        }
    }
}

/// One managed unit of source code. Immutable after registry load.
#[derive(Debug, Clone, Serialize)]
pub struct Project {
    /// Stable id, equal to the project's directory name.
    pub id: String,
    /// Container image name; defaults to the id.
    pub image_name: String,
    /// Source subdirectory the build command runs in; defaults to `src`.
    pub src_dir: String,
    /// Build engine tag as configured.
    pub engine: String,
    /// Derived build command; `None` means present but unbuildable.
    pub build_command: Option<String>,
    /// Absolute project directory.
    pub dir: PathBuf,
}

impl Project {
    /// Materialize a project from its directory and parsed settings.
    fn from_settings(
        id: &str,
        dir: PathBuf,
        parsed: &std::collections::HashMap<String, String>,
    ) -> Self {
        let non_empty = |key: &str| {
            parsed
                .get(key)
                .map(String::as_str)
                .filter(|v| !v.is_empty())
        };

        let image_name = non_empty(settings::KEY_IMAGE_NAME).unwrap_or(id);
        let src_dir = non_empty(settings::KEY_SRC_DIR).unwrap_or("src");
        let engine_tag = non_empty(settings::KEY_ENGINE).unwrap_or("go");
        let override_command = non_empty(settings::KEY_BUILD_COMMAND);

        let engine = BuildEngine::from_str(engine_tag).unwrap_or(BuildEngine::Go);
        let artifact = dir.join(id);
        // A recognized engine's template wins; the explicit override only
        // applies to unrecognized tags.
        let build_command = engine
            .command_template(&artifact)
            .or_else(|| override_command.map(str::to_string));

        Self {
            id: id.to_string(),
            image_name: image_name.to_string(),
            src_dir: src_dir.to_string(),
            engine: engine.to_string(),
            build_command,
            dir,
        }
    }

    /// Directory the build command runs in.
    pub fn src_path(&self) -> PathBuf {
        if self.src_dir.is_empty() {
            self.dir.clone()
        } else {
            self.dir.join(&self.src_dir)
        }
    }
}

/// Scan `root` for projects, sorted by id.
///
/// A subdirectory is a candidate iff it contains the settings file. An
/// unreadable root yields an empty set with a logged warning; discovery is
/// never fatal.
pub fn load(root: &Path) -> Vec<Project> {
    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!(root = %root.display(), %err, "projects root not readable");
            return Vec::new();
        }
    };

    let mut projects = Vec::new();
    for entry in entries.flatten() {
        let dir = entry.path();
        if !dir.is_dir() {
            continue;
        }
        let settings_path = dir.join(SETTINGS_FILE_NAME);
        if !settings_path.is_file() {
            continue;
        }
        let Some(id) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        let parsed = settings::load(&settings_path);
        projects.push(Project::from_settings(&id, dir, &parsed));
    }

    projects.sort_by(|a, b| a.id.cmp(&b.id));
    projects
}
