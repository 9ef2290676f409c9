use async_trait::async_trait;

use crate::prefs::NotationPrefs;

#[async_trait]
pub trait PreferencesRepositoryPort: Send + Sync {
    async fn load(&self) -> anyhow::Result<NotationPrefs>;
    async fn save(&self, prefs: &NotationPrefs) -> anyhow::Result<()>;
}
