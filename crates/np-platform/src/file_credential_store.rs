use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use np_core::{
    ports::{CredentialStoreError, CredentialStorePort},
    SecretString,
};

/// File-based credential store for headless machines without a keychain.
///
/// One file per account, named after the hex-encoded account so arbitrary
/// account names (`sync:me@example.com`) stay valid file names.
///
/// 基于文件的凭据存储（无桌面环境回退）。
#[derive(Clone)]
pub struct FileCredentialStore {
    base_dir: PathBuf,
}

impl FileCredentialStore {
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn file_path(&self, account: &str) -> PathBuf {
        self.base_dir
            .join(format!("{}.secret", hex::encode(account.as_bytes())))
    }

    fn map_io_error(context: &str, err: io::Error) -> CredentialStoreError {
        match err.kind() {
            io::ErrorKind::PermissionDenied => {
                CredentialStoreError::PermissionDenied(format!("{context}: {err}"))
            }
            _ => CredentialStoreError::Other(format!("{context}: {err}")),
        }
    }
}

#[async_trait]
impl CredentialStorePort for FileCredentialStore {
    async fn save(&self, account: &str, secret: &SecretString) -> Result<(), CredentialStoreError> {
        fs::create_dir_all(&self.base_dir)
            .await
            .map_err(|err| Self::map_io_error("failed to create credential dir", err))?;

        let path = self.file_path(account);
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, secret.expose().as_bytes())
            .await
            .map_err(|err| Self::map_io_error("failed to write credential temp file", err))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600))
                .await
                .map_err(|err| Self::map_io_error("failed to set credential permissions", err))?;
        }

        fs::rename(&temp_path, &path)
            .await
            .map_err(|err| Self::map_io_error("failed to rename credential file", err))?;
        Ok(())
    }

    async fn retrieve(&self, account: &str) -> Result<SecretString, CredentialStoreError> {
        let bytes = match fs::read(self.file_path(account)).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(CredentialStoreError::NotFound)
            }
            Err(err) => return Err(Self::map_io_error("failed to read credential file", err)),
        };
        String::from_utf8(bytes)
            .map(SecretString::new)
            .map_err(|_| CredentialStoreError::Corrupt("credential file is not valid UTF-8".into()))
    }

    async fn delete(&self, account: &str) -> Result<(), CredentialStoreError> {
        match fs::remove_file(self.file_path(account)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(Self::map_io_error("failed to delete credential file", err)),
        }
    }
}
