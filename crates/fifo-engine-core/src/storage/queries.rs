use super::models::*;
use super::sqlite::Store;
use rusqlite::types::ToSql;
use rusqlite::{params, Result};
use tracing::debug;

fn category_from_column(text: Option<String>) -> Category {
    text.and_then(|s| s.chars().next())
        .and_then(Category::from_char)
        .unwrap_or(Category::Any)
}

impl Store {
    // ── Storage history ──────────────────────────────────────────

    /// Append one snapshot row. Same-day re-scans append again; history
    /// queries aggregate per date, so duplicates are valid.
    pub fn insert_snapshot(&self, snap: &StorageSnapshot) -> Result<()> {
        self.connection().execute(
            "INSERT INTO storage_history \
             (asset, index_val, category, measurement_date, size_mb, file_count) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                snap.asset,
                snap.index_val,
                snap.category.as_char().to_string(),
                snap.measurement_date,
                snap.size_mb,
                snap.file_count,
            ],
        )?;
        Ok(())
    }

    /// Rows from the last `days` local days, optionally filtered by entity
    /// fields, ordered by date ascending.
    pub fn get_history(&self, days: u32, filter: &EntityFilter) -> Result<Vec<StorageSnapshot>> {
        let mut sql = String::from(
            "SELECT asset, index_val, category, measurement_date, size_mb, file_count \
             FROM storage_history \
             WHERE measurement_date >= date('now', 'localtime', ?1)",
        );
        let window = format!("-{} days", days);
        let mut bind: Vec<&dyn ToSql> = vec![&window];

        let category_text;
        if !filter.asset.is_empty() {
            sql.push_str(&format!(" AND asset = ?{}", bind.len() + 1));
            bind.push(&filter.asset);
        }
        if filter.index_val >= 0 {
            sql.push_str(&format!(" AND index_val = ?{}", bind.len() + 1));
            bind.push(&filter.index_val);
        }
        if filter.category != Category::Any {
            category_text = filter.category.as_char().to_string();
            sql.push_str(&format!(" AND category = ?{}", bind.len() + 1));
            bind.push(&category_text);
        }
        sql.push_str(" ORDER BY measurement_date ASC");

        let mut stmt = self.connection().prepare(&sql)?;
        let rows = stmt
            .query_map(bind.as_slice(), |row| {
                Ok(StorageSnapshot {
                    asset: row.get(0)?,
                    index_val: row.get(1)?,
                    category: category_from_column(row.get(2)?),
                    measurement_date: row.get(3)?,
                    size_mb: row.get(4)?,
                    file_count: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Sum of all snapshot rows stamped with today's local date.
    pub fn get_total_current_mb(&self) -> Result<f64> {
        self.connection().query_row(
            "SELECT COALESCE(SUM(size_mb), 0) FROM storage_history \
             WHERE measurement_date = date('now', 'localtime')",
            [],
            |row| row.get(0),
        )
    }

    /// Per-entity averages over the trailing window, grouped by
    /// (asset, index_val, category).
    pub fn get_average_weights(&self, days: u32) -> Result<Vec<WeightRecord>> {
        let window = format!("-{} days", days);
        let mut stmt = self.connection().prepare(
            "SELECT asset, index_val, category, \
                    AVG(size_mb), SUM(size_mb), COUNT(DISTINCT measurement_date) \
             FROM storage_history \
             WHERE measurement_date >= date('now', 'localtime', ?1) \
             GROUP BY asset, index_val, category \
             ORDER BY asset, index_val, category",
        )?;
        let rows = stmt
            .query_map(params![window], |row| {
                Ok(WeightRecord {
                    asset: row.get(0)?,
                    index_val: row.get(1)?,
                    category: category_from_column(row.get(2)?),
                    avg_mb: row.get(3)?,
                    total_mb: row.get(4)?,
                    day_count: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Number of distinct measurement dates across all history.
    pub fn history_day_count(&self) -> Result<i64> {
        self.connection().query_row(
            "SELECT COUNT(DISTINCT measurement_date) FROM storage_history",
            [],
            |row| row.get(0),
        )
    }

    // ── Forecasts ────────────────────────────────────────────────

    pub fn insert_forecast(&self, forecast_date: &str, predicted_mb: f64) -> Result<()> {
        self.connection().execute(
            "INSERT INTO storage_forecast (forecast_date, predicted_mb) VALUES (?1, ?2)",
            params![forecast_date, predicted_mb],
        )?;
        Ok(())
    }

    pub fn get_latest_forecast(&self) -> Result<Option<ForecastRecord>> {
        match self.connection().query_row(
            "SELECT forecast_date, predicted_mb, created_at \
             FROM storage_forecast ORDER BY id DESC LIMIT 1",
            [],
            |row| {
                Ok(ForecastRecord {
                    forecast_date: row.get(0)?,
                    predicted_mb: row.get(1)?,
                    created_at: row.get(2)?,
                })
            },
        ) {
            Ok(rec) => Ok(Some(rec)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    // ── Deletion ledger ──────────────────────────────────────────

    /// Append a ledger entry. Entries are immutable once written and are
    /// never pruned by the engine.
    pub fn log_deletion(&self, rec: &DeletionRecord) -> Result<()> {
        self.connection().execute(
            "INSERT INTO deletion_log (file_path, asset, size_mb, reason) \
             VALUES (?1, ?2, ?3, ?4)",
            params![rec.file_path, rec.asset, rec.size_mb, rec.reason],
        )?;
        Ok(())
    }

    pub fn get_deletion_logs(&self, limit: u32) -> Result<Vec<DeletionRecord>> {
        let mut stmt = self.connection().prepare(
            "SELECT file_path, asset, size_mb, reason, deleted_at \
             FROM deletion_log ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit], |row| {
                Ok(DeletionRecord {
                    file_path: row.get(0)?,
                    asset: row.get(1)?,
                    size_mb: row.get(2)?,
                    reason: row.get(3)?,
                    deleted_at: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
                })
            })?
            .collect::<Result<Vec<_>>>()?;
        Ok(rows)
    }

    // ── Scheduler config ─────────────────────────────────────────

    pub fn get_schedule(&self) -> Result<ScheduleRow> {
        self.connection().query_row(
            "SELECT schedule_hour, schedule_minute, last_run, is_enabled \
             FROM scheduler_config WHERE id = 1",
            [],
            |row| {
                Ok(ScheduleRow {
                    schedule_hour: row.get(0)?,
                    schedule_minute: row.get(1)?,
                    last_run: row.get(2)?,
                    is_enabled: row.get::<_, i64>(3)? != 0,
                })
            },
        )
    }

    pub fn update_schedule(&self, hour: u32, minute: u32, enabled: bool) -> Result<()> {
        self.connection().execute(
            "UPDATE scheduler_config SET schedule_hour = ?1, schedule_minute = ?2, \
             is_enabled = ?3 WHERE id = 1",
            params![hour, minute, enabled as i64],
        )?;
        debug!("Schedule updated to {:02}:{:02} (enabled={})", hour, minute, enabled);
        Ok(())
    }

    pub fn set_schedule_enabled(&self, enabled: bool) -> Result<()> {
        self.connection().execute(
            "UPDATE scheduler_config SET is_enabled = ?1 WHERE id = 1",
            params![enabled as i64],
        )?;
        Ok(())
    }

    // ── Key/value configuration ──────────────────────────────────

    pub fn set_config(&self, key: &str, value: &str) -> Result<()> {
        self.connection().execute(
            "INSERT OR REPLACE INTO configuration (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn get_config(&self, key: &str, default: &str) -> Result<String> {
        match self.connection().query_row(
            "SELECT value FROM configuration WHERE key = ?1",
            params![key],
            |row| row.get(0),
        ) {
            Ok(value) => Ok(value),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(default.to_string()),
            Err(e) => Err(e),
        }
    }
}
