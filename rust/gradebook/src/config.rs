use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calc::DEFAULT_TOTAL_POINTS;

pub const DATA_DIR_ENV: &str = "GRADEBOOK_DATA_DIR";

/// Where the flat files live and how grades are scaled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct GradebookConfig {
    pub data_dir: PathBuf,
    pub students_file: String,
    pub assignments_file: String,
    pub submissions_dir: String,
    pub total_points: u32,
}

impl Default for GradebookConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            students_file: "students.txt".to_string(),
            assignments_file: "assignments.txt".to_string(),
            submissions_dir: "submissions".to_string(),
            total_points: DEFAULT_TOTAL_POINTS,
        }
    }
}

impl GradebookConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.to_string_lossy()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("invalid config {}", path.to_string_lossy()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.total_points == 0 {
            bail!("totalPoints must be greater than zero");
        }
        Ok(())
    }

    pub fn students_path(&self) -> PathBuf {
        self.data_dir.join(&self.students_file)
    }

    pub fn assignments_path(&self) -> PathBuf {
        self.data_dir.join(&self.assignments_file)
    }

    pub fn submissions_path(&self) -> PathBuf {
        self.data_dir.join(&self.submissions_dir)
    }
}

/// Data dir precedence: command-line flag, then environment, then config file, then default.
pub fn resolve(
    config_path: Option<&Path>,
    data_dir_flag: Option<PathBuf>,
    data_dir_env: Option<OsString>,
) -> anyhow::Result<GradebookConfig> {
    let mut config = match config_path {
        Some(p) => GradebookConfig::load(p)?,
        None => GradebookConfig::default(),
    };

    if let Some(dir) = data_dir_flag {
        config.data_dir = dir;
    } else if let Some(dir) = data_dir_env.filter(|v| !v.is_empty()) {
        debug!(env = DATA_DIR_ENV, "data dir taken from environment");
        config.data_dir = PathBuf::from(dir);
    }

    debug!(
        data_dir = %config.data_dir.display(),
        total_points = config.total_points,
        "resolved config"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, body: &str) -> PathBuf {
        let p = dir.path().join("gradebook.json");
        std::fs::write(&p, body).expect("write config");
        p
    }

    #[test]
    fn defaults_point_at_data_folder() {
        let c = GradebookConfig::default();
        assert_eq!(c.students_path(), PathBuf::from("data/students.txt"));
        assert_eq!(c.assignments_path(), PathBuf::from("data/assignments.txt"));
        assert_eq!(c.submissions_path(), PathBuf::from("data/submissions"));
        assert_eq!(c.total_points, 1000);
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let dir = TempDir::new().expect("tempdir");
        let p = write_config(&dir, r#"{ "dataDir": "term2", "totalPoints": 500 }"#);
        let c = GradebookConfig::load(&p).expect("load config");
        assert_eq!(c.data_dir, PathBuf::from("term2"));
        assert_eq!(c.total_points, 500);
        assert_eq!(c.students_file, "students.txt");
    }

    #[test]
    fn rejects_zero_total_and_unknown_keys() {
        let dir = TempDir::new().expect("tempdir");
        let p = write_config(&dir, r#"{ "totalPoints": 0 }"#);
        assert!(GradebookConfig::load(&p).is_err());

        let p = write_config(&dir, r#"{ "totlPoints": 900 }"#);
        let err = GradebookConfig::load(&p).unwrap_err();
        assert!(format!("{err:#}").contains("totlPoints"));
    }

    #[test]
    fn flag_beats_env_beats_file() {
        let dir = TempDir::new().expect("tempdir");
        let p = write_config(&dir, r#"{ "dataDir": "from-file" }"#);

        let c = resolve(Some(&p), None, None).expect("resolve");
        assert_eq!(c.data_dir, PathBuf::from("from-file"));

        let c = resolve(Some(&p), None, Some(OsString::from("from-env"))).expect("resolve");
        assert_eq!(c.data_dir, PathBuf::from("from-env"));

        let c = resolve(
            Some(&p),
            Some(PathBuf::from("from-flag")),
            Some(OsString::from("from-env")),
        )
        .expect("resolve");
        assert_eq!(c.data_dir, PathBuf::from("from-flag"));

        let c = resolve(None, None, Some(OsString::new())).expect("resolve");
        assert_eq!(c.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let dir = TempDir::new().expect("tempdir");
        let missing = dir.path().join("nope.json");
        assert!(resolve(Some(&missing), None, None).is_err());
    }
}
