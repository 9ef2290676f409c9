//! Default locations for files the coordinator writes.
//! 默认数据目录解析。

use std::path::PathBuf;

const APP_DIR_NAME: &str = "notation-prefs";

fn resolved_app_dir_name() -> String {
    match std::env::var("NP_PROFILE") {
        Ok(profile) if !profile.is_empty() => format!("{APP_DIR_NAME}-{profile}"),
        _ => APP_DIR_NAME.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppDirs {
    pub data_dir: PathBuf,
}

impl AppDirs {
    /// Resolve `<data_local_dir>/notation-prefs[-<profile>]`.
    ///
    /// Returns `None` when the platform has no local data directory.
    pub fn resolve() -> Option<Self> {
        Self::under(dirs::data_local_dir()?)
    }

    /// Same layout rooted at `base`.
    pub fn under(base: PathBuf) -> Option<Self> {
        Some(Self {
            data_dir: base.join(resolved_app_dir_name()),
        })
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.data_dir.join("preferences.json")
    }

    pub fn credential_dir(&self) -> PathBuf {
        self.data_dir.join("credentials")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_rooted_at_base() {
        let dirs = AppDirs::under(PathBuf::from("/tmp/base")).expect("dirs");
        assert!(dirs.data_dir.starts_with("/tmp/base"));
        assert!(dirs.preferences_path().ends_with("preferences.json"));
        assert!(dirs.credential_dir().starts_with(&dirs.data_dir));
        assert!(dirs.log_dir().ends_with("logs"));
    }
}
