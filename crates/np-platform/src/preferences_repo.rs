use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs;
use tracing::info;

use np_core::{
    ports::PreferencesRepositoryPort,
    prefs::{NotationPrefs, CURRENT_SCHEMA_VERSION},
};

/// JSON file holding [`NotationPrefs`].
///
/// 偏好设置 JSON 文件仓库。
pub struct FilePreferencesRepository {
    path: PathBuf,
}

impl FilePreferencesRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .await
                .with_context(|| format!("create preferences dir failed: {}", dir.display()))?;
        }
        Ok(())
    }

    /// Write to a sibling temp file, then rename over the target.
    async fn atomic_write(&self, content: &str) -> Result<()> {
        self.ensure_parent_dir().await?;

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, content)
            .await
            .with_context(|| format!("write temp preferences failed: {}", tmp_path.display()))?;

        fs::rename(&tmp_path, &self.path).await.with_context(|| {
            format!(
                "rename temp preferences to target failed: {} -> {}",
                tmp_path.display(),
                self.path.display()
            )
        })?;

        Ok(())
    }
}

#[async_trait]
impl PreferencesRepositoryPort for FilePreferencesRepository {
    /// Missing file yields the defaults. Files written by an older schema
    /// are stamped with the current version and written back.
    async fn load(&self) -> Result<NotationPrefs> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(NotationPrefs::default());
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("read preferences failed: {}", self.path.display()))
            }
        };

        let mut prefs: NotationPrefs = serde_json::from_str(&content)
            .with_context(|| format!("parse preferences failed: {}", self.path.display()))?;

        if prefs.schema_version < CURRENT_SCHEMA_VERSION {
            info!(
                from = prefs.schema_version,
                to = CURRENT_SCHEMA_VERSION,
                "upgrading preferences schema"
            );
            prefs.schema_version = CURRENT_SCHEMA_VERSION;
            self.save(&prefs).await?;
        }

        Ok(prefs)
    }

    async fn save(&self, prefs: &NotationPrefs) -> Result<()> {
        let content =
            serde_json::to_string_pretty(prefs).context("serialize preferences failed")?;
        self.atomic_write(&content).await
    }
}
