use crate::cleanup::{self, CleanupLimits};
use crate::datagen;
use crate::error::Error;
use crate::evaluate::{self, Action, Evaluation};
use crate::forecast::{self, ForecastData};
use crate::progress::ProgressReporter;
use crate::scanner::{self, Granularity, ScanResult};
use crate::scheduler::{ScheduleJob, ScheduleMode, Scheduler};
use crate::storage::models::{DeletionRecord, WeightRecord};
use crate::storage::Store;
use chrono::Local;
use serde::Serialize;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// Totals reported by a standalone scan.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ScanTotals {
    pub total_mb: f64,
    pub total_files: usize,
}

/// Result of a standalone cleanup call.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CleanupOutcome {
    pub files_deleted: usize,
    pub mb_freed: f64,
    pub new_usage_mb: f64,
    pub new_usage_pct: f64,
}

/// Composite result of one full scan → forecast → evaluate → cleanup cycle.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CycleReport {
    pub current_mb: f64,
    pub predicted_mb: f64,
    pub growth_rate: f64,
    pub limit_mb: f64,
    pub usage_pct: f64,
    pub action: Action,
    pub files_deleted: usize,
    pub mb_freed: f64,
    pub history_days: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub is_scheduled: bool,
    pub schedule_hour: u32,
    pub schedule_minute: u32,
    pub last_run: String,
    pub next_run: String,
    pub current_mb: f64,
    pub predicted_mb: f64,
}

struct EngineInner {
    store: Option<Store>,
    last_scan: Option<ScanResult>,
    last_forecast: Option<ForecastData>,
}

/// The engine facade. One value owns the store handle, the last-scan and
/// last-forecast caches, and the scheduler; every operation serializes on
/// the internal mutex. The scheduler worker runs outside that mutex with
/// its own store handle, so facade caches may lag what it wrote.
pub struct Engine {
    db_path: String,
    inner: Mutex<EngineInner>,
    scheduler: Scheduler,
}

impl Engine {
    /// Open the store at `db_path`, creating schema on first use.
    pub fn open(db_path: &str) -> Result<Engine, Error> {
        let store = Store::open(db_path)?;
        info!("Engine opened against {}", db_path);
        Ok(Engine {
            db_path: db_path.to_string(),
            inner: Mutex::new(EngineInner {
                store: Some(store),
                last_scan: None,
                last_forecast: None,
            }),
            scheduler: Scheduler::new(),
        })
    }

    /// Stop the scheduler and release the store handle.
    pub fn shutdown(&self) {
        self.scheduler.stop();
        let mut inner = self.inner.lock().unwrap();
        inner.store = None;
        info!("Engine shut down");
    }

    pub fn is_open(&self) -> bool {
        self.inner.lock().unwrap().store.is_some()
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    /// Scan the archive root and persist today's aggregated snapshot rows.
    /// An empty tree is cached but not persisted, and reports `NoData`.
    pub fn scan(&self, root: &Path, granularity: Granularity) -> Result<ScanTotals, Error> {
        let mut inner = self.inner.lock().unwrap();
        let store = inner.store.as_ref().ok_or(Error::StoreClosed)?;

        let result = scanner::scan_tree(root, granularity)?;
        let totals = ScanTotals {
            total_mb: result.total_mb,
            total_files: result.total_files,
        };
        if result.total_files == 0 {
            inner.last_scan = Some(result);
            return Err(Error::NoData);
        }
        scanner::store_scan_results(store, &result)?;
        inner.last_scan = Some(result);
        Ok(totals)
    }

    /// Compute and persist a forecast from history plus the last scan's
    /// total (zero when nothing has been scanned yet).
    pub fn forecast(&self) -> Result<ForecastData, Error> {
        let mut inner = self.inner.lock().unwrap();
        let store = inner.store.as_ref().ok_or(Error::StoreClosed)?;

        let current_mb = inner.last_scan.as_ref().map(|s| s.total_mb).unwrap_or(0.0);
        let data = forecast::compute_forecast(store, current_mb)?;
        forecast::store_forecast(store, &data)?;
        inner.last_forecast = Some(data);
        Ok(data)
    }

    /// Map the cached forecast against a capacity limit.
    pub fn evaluate(&self, limit_mb: f64) -> Evaluation {
        let inner = self.inner.lock().unwrap();
        let predicted_mb = inner
            .last_forecast
            .map(|f| f.predicted_mb)
            .unwrap_or(0.0);
        evaluate::evaluate_threshold(predicted_mb, limit_mb)
    }

    /// Standalone FIFO cleanup against the cached scan. The amount derives
    /// from the last scan's total and the caller's target fraction; prefer
    /// `execute_full` for decisions driven by the forecast.
    pub fn cleanup(&self, limit_mb: f64, target_pct: f64) -> Result<CleanupOutcome, Error> {
        let mut inner = self.inner.lock().unwrap();
        let inner = &mut *inner;
        let store = inner.store.as_ref().ok_or(Error::StoreClosed)?;

        let total_mb = inner.last_scan.as_ref().map(|s| s.total_mb).unwrap_or(0.0);
        let amount = total_mb - limit_mb * target_pct;
        if amount <= 0.0 {
            return Ok(CleanupOutcome {
                files_deleted: 0,
                mb_freed: 0.0,
                new_usage_mb: total_mb,
                new_usage_pct: usage_pct(total_mb, limit_mb),
            });
        }

        let scan = match inner.last_scan.as_mut() {
            Some(scan) => scan,
            None => {
                return Ok(CleanupOutcome {
                    files_deleted: 0,
                    mb_freed: 0.0,
                    new_usage_mb: 0.0,
                    new_usage_pct: 0.0,
                })
            }
        };
        let stats =
            cleanup::execute_cleanup(store, &mut scan.files, amount, CleanupLimits::default())?;

        let new_usage_mb = total_mb - stats.mb_freed;
        Ok(CleanupOutcome {
            files_deleted: stats.files_deleted,
            mb_freed: stats.mb_freed,
            new_usage_mb,
            new_usage_pct: usage_pct(new_usage_mb, limit_mb),
        })
    }

    /// Run the four-stage pipeline atomically and cache its scan and
    /// forecast for subsequent single-stage calls.
    pub fn execute_full(
        &self,
        root: &Path,
        granularity: Granularity,
        limit_mb: f64,
    ) -> Result<CycleReport, Error> {
        let mut inner = self.inner.lock().unwrap();
        let store = inner.store.as_ref().ok_or(Error::StoreClosed)?;

        let output = run_cycle(store, root, granularity, limit_mb)?;
        inner.last_scan = Some(output.scan);
        inner.last_forecast = Some(output.forecast);
        Ok(output.report)
    }

    /// Populate `root` with a synthetic 14-day archive and matching history.
    pub fn generate_test_data(
        &self,
        root: &Path,
        size_gb: f64,
        reporter: &dyn ProgressReporter,
    ) -> Result<(), Error> {
        let inner = self.inner.lock().unwrap();
        let store = inner.store.as_ref().ok_or(Error::StoreClosed)?;
        datagen::generate_dataset(store, root, size_gb, reporter)
    }

    /// Add one synthetic day of data, `day_offset` days from today.
    pub fn generate_one_day(
        &self,
        root: &Path,
        day_size_mb: f64,
        day_offset: i64,
        reporter: &dyn ProgressReporter,
    ) -> Result<(), Error> {
        let inner = self.inner.lock().unwrap();
        let store = inner.store.as_ref().ok_or(Error::StoreClosed)?;
        datagen::generate_one_day(store, root, day_size_mb, day_offset, reporter)
    }

    /// Start the background worker. Daily mode persists the schedule into
    /// the scheduler-config singleton.
    pub fn schedule_start(&self, job: ScheduleJob) -> Result<(), Error> {
        if self.scheduler.is_running() {
            return Err(Error::SchedulerBusy);
        }
        if let ScheduleMode::Daily { hour, minute } = job.mode {
            let inner = self.inner.lock().unwrap();
            let store = inner.store.as_ref().ok_or(Error::StoreClosed)?;
            store.update_schedule(hour.min(23), minute.min(59), true)?;
        }
        self.scheduler.start(job, self.db_path.clone());
        Ok(())
    }

    /// Stop the background worker and mark the persisted schedule disabled.
    pub fn schedule_stop(&self) -> Result<(), Error> {
        self.scheduler.stop();
        let inner = self.inner.lock().unwrap();
        if let Some(store) = inner.store.as_ref() {
            store.set_schedule_enabled(false)?;
        }
        Ok(())
    }

    pub fn status(&self) -> Result<EngineStatus, Error> {
        let inner = self.inner.lock().unwrap();
        let (last_run, schedule_hour, schedule_minute) = match inner.store.as_ref() {
            Some(store) => {
                let row = store.get_schedule()?;
                (
                    store.get_config("last_run", "")?,
                    row.schedule_hour,
                    row.schedule_minute,
                )
            }
            None => (String::new(), 3, 0),
        };

        Ok(EngineStatus {
            is_scheduled: self.scheduler.is_running(),
            schedule_hour,
            schedule_minute,
            last_run,
            next_run: self.scheduler.next_run(),
            current_mb: inner.last_scan.as_ref().map(|s| s.total_mb).unwrap_or(0.0),
            predicted_mb: inner
                .last_forecast
                .map(|f| f.predicted_mb)
                .unwrap_or(0.0),
        })
    }

    pub fn set_config(&self, key: &str, value: &str) -> Result<(), Error> {
        let inner = self.inner.lock().unwrap();
        let store = inner.store.as_ref().ok_or(Error::StoreClosed)?;
        store.set_config(key, value)?;
        Ok(())
    }

    pub fn get_config(&self, key: &str, default: &str) -> Result<String, Error> {
        let inner = self.inner.lock().unwrap();
        let store = inner.store.as_ref().ok_or(Error::StoreClosed)?;
        Ok(store.get_config(key, default)?)
    }

    /// Per-entity average weights over the trailing window.
    pub fn weights(&self, days: u32) -> Result<Vec<WeightRecord>, Error> {
        let inner = self.inner.lock().unwrap();
        let store = inner.store.as_ref().ok_or(Error::StoreClosed)?;
        Ok(store.get_average_weights(days)?)
    }

    pub fn history_day_count(&self) -> Result<i64, Error> {
        let inner = self.inner.lock().unwrap();
        let store = inner.store.as_ref().ok_or(Error::StoreClosed)?;
        Ok(store.history_day_count()?)
    }

    pub fn deletion_logs(&self, limit: u32) -> Result<Vec<DeletionRecord>, Error> {
        let inner = self.inner.lock().unwrap();
        let store = inner.store.as_ref().ok_or(Error::StoreClosed)?;
        Ok(store.get_deletion_logs(limit)?)
    }
}

pub(crate) struct CycleOutput {
    pub scan: ScanResult,
    pub forecast: ForecastData,
    pub report: CycleReport,
}

/// One full cycle against an explicit store handle: scan, persist
/// snapshots, forecast, evaluate, clean up when warranted, and record
/// `last_run`. Aborts with `NoData` before forecasting when the scan found
/// nothing.
pub(crate) fn run_cycle(
    store: &Store,
    root: &Path,
    granularity: Granularity,
    limit_mb: f64,
) -> Result<CycleOutput, Error> {
    let mut scan = scanner::scan_tree(root, granularity)?;
    if scan.total_files == 0 {
        return Err(Error::NoData);
    }
    scanner::store_scan_results(store, &scan)?;
    debug!(
        "Cycle scan: {} files, {:.2} MB",
        scan.total_files, scan.total_mb
    );

    let forecast_data = forecast::compute_forecast(store, scan.total_mb)?;
    forecast::store_forecast(store, &forecast_data)?;

    let eval = evaluate::evaluate_threshold(forecast_data.predicted_mb, limit_mb);

    let mut files_deleted = 0;
    let mut mb_freed = 0.0;
    if eval.action == Action::Cleanup && eval.amount_to_delete_mb > 0.0 {
        let stats = cleanup::execute_cleanup(
            store,
            &mut scan.files,
            eval.amount_to_delete_mb,
            CleanupLimits::default(),
        )?;
        files_deleted = stats.files_deleted;
        mb_freed = stats.mb_freed;
    }

    let ts = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    store.set_config("last_run", &ts)?;

    let report = CycleReport {
        current_mb: scan.total_mb,
        predicted_mb: forecast_data.predicted_mb,
        growth_rate: forecast_data.growth_rate,
        limit_mb,
        usage_pct: usage_pct(scan.total_mb, limit_mb),
        action: eval.action,
        files_deleted,
        mb_freed,
        history_days: forecast_data.days_available,
    };
    info!(
        "Cycle complete: {:.2} MB current, {:.2} MB predicted, action {:?}",
        report.current_mb, report.predicted_mb, report.action,
    );

    Ok(CycleOutput {
        scan,
        forecast: forecast_data,
        report,
    })
}

fn usage_pct(used_mb: f64, limit_mb: f64) -> f64 {
    if limit_mb > 0.0 {
        used_mb / limit_mb * 100.0
    } else {
        0.0
    }
}
