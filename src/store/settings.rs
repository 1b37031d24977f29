//! `app_settings` key/value rows and `app_counters`.

use rusqlite::{OptionalExtension, params};
use tracing::debug;

use crate::config::Policy;
use crate::error::HrResult;

use super::Database;

impl Database {
    /// Reads one stored setting.
    pub fn get_setting(&self, key: &str) -> HrResult<Option<String>> {
        Ok(self
            .conn()
            .query_row(
                "SELECT setting_value FROM app_settings WHERE setting_key = ?1",
                params![key],
                |r| r.get(0),
            )
            .optional()?)
    }

    /// Inserts or replaces a setting.
    pub fn set_setting(&self, key: &str, value: &str) -> HrResult<()> {
        self.conn().execute(
            "INSERT INTO app_settings (setting_key, setting_value) VALUES (?1, ?2)
             ON CONFLICT(setting_key) DO UPDATE SET setting_value = excluded.setting_value",
            params![key, value],
        )?;
        debug!(setting = key, value, "setting stored");
        Ok(())
    }

    /// Every stored setting, ordered by key.
    pub fn all_settings(&self) -> HrResult<Vec<(String, String)>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT setting_key, setting_value FROM app_settings ORDER BY setting_key")?;
        let rows = stmt.query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Returns the counter's current value and advances it by one.
    ///
    /// Runs inside the caller's transaction when there is one; a missing
    /// counter starts at 1.
    pub fn increment_counter(&self, name: &str) -> HrResult<i64> {
        self.conn().execute(
            "INSERT OR IGNORE INTO app_counters (counter_name, current_value) VALUES (?1, 1)",
            params![name],
        )?;
        let value: i64 = self.conn().query_row(
            "SELECT current_value FROM app_counters WHERE counter_name = ?1",
            params![name],
            |r| r.get(0),
        )?;
        self.conn().execute(
            "UPDATE app_counters SET current_value = current_value + 1 WHERE counter_name = ?1",
            params![name],
        )?;
        Ok(value)
    }

    /// The default policy overlaid with stored settings.
    ///
    /// Values that do not parse are logged and the default is kept.
    pub fn load_policy(&self) -> HrResult<Policy> {
        let mut policy = self.default_policy().clone();
        for (key, value) in self.all_settings()? {
            if !policy.apply_setting(&key, &value) {
                debug!(setting = %key, "setting not applied");
            }
        }
        Ok(policy)
    }
}
