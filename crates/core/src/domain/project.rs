// Project Domain Model

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// How a project is launched. Resolved once, when the project is
/// constructed; the launcher dispatches on this variant and never
/// re-inspects the path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectKind {
    PythonScript,
    NodeProject,
    NativeExecutable,
    Unsupported,
}

impl std::fmt::Display for ProjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectKind::PythonScript => write!(f, "PYTHON_SCRIPT"),
            ProjectKind::NodeProject => write!(f, "NODE_PROJECT"),
            ProjectKind::NativeExecutable => write!(f, "NATIVE_EXECUTABLE"),
            ProjectKind::Unsupported => write!(f, "UNSUPPORTED"),
        }
    }
}

impl ProjectKind {
    /// Classify a path by its suffix.
    ///
    /// `package.json` marks a Node project, `.py` a Python script, `.exe`
    /// or an extension-less file a native executable. Everything else is
    /// `Unsupported` and will be skipped at launch time with a warning.
    pub fn from_path(path: &Path) -> Self {
        if path
            .file_name()
            .is_some_and(|f| f.eq_ignore_ascii_case("package.json"))
        {
            return ProjectKind::NodeProject;
        }

        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("py") => ProjectKind::PythonScript,
            Some(ext) if ext.eq_ignore_ascii_case("exe") => ProjectKind::NativeExecutable,
            // Plain binaries carry no extension on Unix
            None => ProjectKind::NativeExecutable,
            Some(_) => ProjectKind::Unsupported,
        }
    }
}

/// A launchable unit: a named script or executable on the local machine.
///
/// Immutable for the duration of a supervisor run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub path: PathBuf,
    pub kind: ProjectKind,
}

impl Project {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let kind = ProjectKind::from_path(&path);
        Self {
            name: name.into(),
            path,
            kind,
        }
    }

    /// Directory the project runs in (the path's parent, or `.` for bare
    /// file names).
    pub fn directory(&self) -> PathBuf {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}
