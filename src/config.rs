//! Project configuration (`tixpack.toml`) and resolved build paths.
//!
//! The file is optional. Every key has a default matching the TixQuic Grabber
//! layout, so a bare project with `src/main.py` packages without any setup.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "tixpack.toml";
pub const PYTHON_ENV: &str = "TIXPACK_PYTHON";

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct PackConfig {
    pub app: AppConfig,
    pub paths: PathsConfig,
    pub python: PythonConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub name: String,
    pub executable: String,
    pub entry: String,
    pub title: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "TixQuic_Grabber".to_string(),
            executable: "TixQuic_Grabber.exe".to_string(),
            entry: "main.py".to_string(),
            title: "TixQuic Grabber".to_string(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct PathsConfig {
    pub source: String,
    pub dist: String,
    pub staging: String,
    pub archive: String,
    pub icon: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source: "src".to_string(),
            dist: "dist".to_string(),
            staging: "website_download".to_string(),
            archive: "TixQuic_Grabber_Web_Download.zip".to_string(),
            icon: "assets/icon.ico".to_string(),
        }
    }
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct PythonConfig {
    pub interpreter: Option<String>,
}

impl PackConfig {
    /// Read `tixpack.toml` from `root`, falling back to defaults when absent.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| {
            format!(
                "Failed to parse {} - check for syntax errors (missing quotes, brackets)",
                path.display()
            )
        })
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Names the templates and the locator need about the packaged app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppNames {
    /// Directory name of the app inside the staging directory.
    pub dir_name: String,
    pub executable: String,
    pub title: String,
}

/// Every path the pipeline touches, resolved once at startup.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub root: PathBuf,
    pub source_dir: PathBuf,
    pub entry_file: PathBuf,
    pub icon_file: PathBuf,
    pub dist_dir: PathBuf,
    pub staging_dir: PathBuf,
    pub archive_path: PathBuf,
    pub python: String,
    pub app: AppNames,
}

impl BuildConfig {
    /// Resolve the build layout for `root`.
    ///
    /// Interpreter precedence: explicit override, then `TIXPACK_PYTHON`,
    /// then `[python].interpreter`, then the platform default.
    pub fn resolve(root: &Path, python_override: Option<String>) -> Result<Self> {
        let root = root
            .canonicalize()
            .with_context(|| format!("Project root not found: {}", root.display()))?;
        let pack = PackConfig::load(&root)?;
        let env_python = std::env::var(PYTHON_ENV).ok().filter(|s| !s.is_empty());
        Ok(Self::from_pack(
            &root,
            &pack,
            python_override.or(env_python),
        ))
    }

    pub fn from_pack(root: &Path, pack: &PackConfig, python_override: Option<String>) -> Self {
        let source_dir = root.join(&pack.paths.source);
        let python = python_override
            .or_else(|| pack.python.interpreter.clone())
            .unwrap_or_else(default_python);

        Self {
            root: root.to_path_buf(),
            entry_file: source_dir.join(&pack.app.entry),
            icon_file: source_dir.join(&pack.paths.icon),
            source_dir,
            dist_dir: root.join(&pack.paths.dist),
            staging_dir: root.join(&pack.paths.staging),
            archive_path: root.join(&pack.paths.archive),
            python,
            app: AppNames {
                dir_name: pack.app.name.clone(),
                executable: pack.app.executable.clone(),
                title: pack.app.title.clone(),
            },
        }
    }

    /// Directory the app is copied into inside staging.
    pub fn staged_app_dir(&self) -> PathBuf {
        self.staging_dir.join(&self.app.dir_name)
    }

    /// Output directories the compiler conventionally writes to, in search order.
    pub fn artifact_candidates(&self) -> Vec<PathBuf> {
        let entry_stem = self
            .entry_file
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "main".to_string());
        let exe_stem = Path::new(&self.app.executable)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| self.app.dir_name.clone());

        let mut candidates = vec![self.dist_dir.join(format!("{}.dist", entry_stem))];
        let by_exe = self.dist_dir.join(format!("{}.dist", exe_stem));
        if !candidates.contains(&by_exe) {
            candidates.push(by_exe);
        }
        candidates
    }
}

fn default_python() -> String {
    if cfg!(windows) {
        "python".to_string()
    } else {
        "python3".to_string()
    }
}
