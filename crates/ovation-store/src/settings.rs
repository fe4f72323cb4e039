//! Persistence for user-editable pacing settings.

use std::sync::Arc;

use rusqlite::OptionalExtension;

use ovation_core::error::OvationError;
use ovation_core::types::{KudoSettings, SettingsPatch};

use crate::db::Database;

/// Repository for the single settings row.
#[derive(Clone)]
pub struct SettingsRepository {
    db: Arc<Database>,
}

impl SettingsRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Load settings, falling back to defaults when no row exists.
    pub fn load(&self) -> Result<KudoSettings, OvationError> {
        self.db.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT min_delay_ms, show_debug_controls FROM settings WHERE id = 1",
                    [],
                    |row| {
                        Ok(KudoSettings {
                            min_delay_ms: row.get::<_, i64>(0)? as u64,
                            show_debug_controls: row.get::<_, i64>(1)? != 0,
                        })
                    },
                )
                .optional()
                .map_err(|e| OvationError::Storage(format!("Failed to load settings: {}", e)))?;

            Ok(row.unwrap_or_default())
        })
    }

    /// Apply a partial update and persist the merged settings.
    ///
    /// Rejects `min_delay_ms == 0`; the pacing policy requires a positive base.
    pub fn update(&self, patch: SettingsPatch) -> Result<KudoSettings, OvationError> {
        if patch.min_delay_ms == Some(0) {
            return Err(OvationError::Config(
                "min_delay_ms must be greater than zero".to_string(),
            ));
        }

        self.db.with_conn(|conn| {
            let current = conn
                .query_row(
                    "SELECT min_delay_ms, show_debug_controls FROM settings WHERE id = 1",
                    [],
                    |row| {
                        Ok(KudoSettings {
                            min_delay_ms: row.get::<_, i64>(0)? as u64,
                            show_debug_controls: row.get::<_, i64>(1)? != 0,
                        })
                    },
                )
                .optional()
                .map_err(|e| OvationError::Storage(format!("Failed to load settings: {}", e)))?
                .unwrap_or_default();

            let merged = current.merged(patch);

            conn.execute(
                "INSERT INTO settings (id, min_delay_ms, show_debug_controls) VALUES (1, ?1, ?2)
                 ON CONFLICT(id) DO UPDATE SET
                     min_delay_ms = excluded.min_delay_ms,
                     show_debug_controls = excluded.show_debug_controls",
                rusqlite::params![merged.min_delay_ms as i64, merged.show_debug_controls as i64],
            )
            .map_err(|e| OvationError::Storage(format!("Failed to save settings: {}", e)))?;

            Ok(merged)
        })
    }
}
