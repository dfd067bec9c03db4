//! This module defines the storage interface and implementation for the
//! persisted view settings (current tool and configured levels).
use crate::monitor::PersistedView;
use anyhow::Result;
use async_trait::async_trait;
use sled::Db;
use tracing::debug;

/// Key under which the view settings are stored.
pub const VIEW_KEY: &str = "view";

/// A trait for loading and saving the console's view settings.
#[async_trait]
pub trait SettingsStore {
    /// Loads the stored view settings.
    ///
    /// Missing or malformed data yields the defaults rather than an error.
    ///
    /// # Errors
    ///
    /// This function will return an error if the underlying store fails.
    async fn load_view(&self) -> Result<PersistedView>;

    /// Saves the view settings, replacing any previous value.
    ///
    /// # Errors
    ///
    /// This function will return an error if the settings cannot be written.
    async fn save_view(&self, view: &PersistedView) -> Result<()>;
}

/// A `SettingsStore` implementation using `sled` for storage.
pub struct SledSettingsStore {
    tree: sled::Tree,
}

impl SledSettingsStore {
    /// Creates a new `SledSettingsStore`.
    ///
    /// # Errors
    ///
    /// This function will return an error if the `settings` tree cannot be opened.
    pub fn new(db: Db) -> Result<Self> {
        let tree = db.open_tree("settings")?;
        Ok(Self { tree })
    }
}

#[async_trait]
impl SettingsStore for SledSettingsStore {
    async fn load_view(&self) -> Result<PersistedView> {
        match self.tree.get(VIEW_KEY)? {
            Some(data) => Ok(PersistedView::decode(&data)),
            None => {
                debug!("No stored view settings, using defaults");
                Ok(PersistedView::default())
            }
        }
    }

    async fn save_view(&self, view: &PersistedView) -> Result<()> {
        let value = serde_json::to_vec(view)?;
        self.tree.insert(VIEW_KEY, value)?;
        self.tree.flush_async().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::severity::SeverityLevel;
    use crate::types::ToolId;

    fn temp_store() -> SledSettingsStore {
        let db = sled::Config::new().temporary(true).open().unwrap();
        SledSettingsStore::new(db).unwrap()
    }

    #[tokio::test]
    async fn missing_settings_load_as_defaults() {
        let store = temp_store();
        assert_eq!(store.load_view().await.unwrap(), PersistedView::default());
    }

    #[tokio::test]
    async fn saved_settings_load_back() {
        let store = temp_store();
        let mut view = PersistedView::default();
        view.current_tool = ToolId::from("mutex");
        view.default_level = SeverityLevel::Warning;
        view.levels_by_tool
            .insert(ToolId::from("codec"), SeverityLevel::Debug);

        store.save_view(&view).await.unwrap();
        assert_eq!(store.load_view().await.unwrap(), view);
    }

    #[tokio::test]
    async fn corrupt_settings_load_as_defaults() {
        let store = temp_store();
        store.tree.insert(VIEW_KEY, &b"\x00\x01garbage"[..]).unwrap();
        assert_eq!(store.load_view().await.unwrap(), PersistedView::default());
    }
}
