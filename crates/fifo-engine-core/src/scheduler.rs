use crate::engine::{run_cycle, CycleReport};
use crate::error::Error;
use crate::scanner::Granularity;
use crate::storage::Store;
use chrono::{DateTime, Duration, Local, TimeZone};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use tracing::{info, warn};

/// When to trigger a cycle: a daily wall-clock time or a fixed interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleMode {
    Daily { hour: u32, minute: u32 },
    Interval { minutes: u32 },
}

/// Everything a scheduled cycle needs, captured at start time.
#[derive(Debug, Clone)]
pub struct ScheduleJob {
    pub root_path: PathBuf,
    pub granularity: Granularity,
    pub limit_mb: f64,
    pub target_pct: f64,
    pub mode: ScheduleMode,
}

/// Background worker driving full cycles. At most one worker is active;
/// it holds its own store handle per tick and never touches the engine's.
pub struct Scheduler {
    running: Arc<AtomicBool>,
    job: Mutex<Option<ScheduleJob>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    last_run: Arc<Mutex<String>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Scheduler {
            running: Arc::new(AtomicBool::new(false)),
            job: Mutex::new(None),
            worker: Mutex::new(None),
            last_run: Arc::new(Mutex::new(String::new())),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Spawn the worker. No-op when one is already active.
    pub fn start(&self, job: ScheduleJob, db_path: String) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        *self.job.lock().unwrap() = Some(job.clone());
        let running = Arc::clone(&self.running);
        let last_run = Arc::clone(&self.last_run);
        let handle = thread::spawn(move || run_loop(running, last_run, job, db_path));
        *self.worker.lock().unwrap() = Some(handle);
        info!("Scheduler started");
    }

    /// Request termination and join the worker. Returns within about one
    /// second of the request; a cycle already in progress runs to
    /// completion first.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.worker.lock().unwrap().take() {
            let _ = handle.join();
            info!("Scheduler stopped");
        }
    }

    /// Local timestamp of the last successful scheduled cycle, or empty.
    pub fn last_run(&self) -> String {
        self.last_run.lock().unwrap().clone()
    }

    /// Forward-looking scheduled instant as `YYYY-MM-DD HH:MM`, or empty
    /// when not running.
    pub fn next_run(&self) -> String {
        if !self.is_running() {
            return String::new();
        }
        match self.job.lock().unwrap().as_ref() {
            Some(job) => next_fire(Local::now(), job.mode)
                .format("%Y-%m-%d %H:%M")
                .to_string(),
            None => String::new(),
        }
    }

    /// Run one full cycle against a fresh store handle. The handle is
    /// released on every exit path; errors are reported, never retried.
    pub fn execute_once(db_path: &str, job: &ScheduleJob) -> Result<CycleReport, Error> {
        let store = Store::open(db_path)?;
        let output = run_cycle(&store, &job.root_path, job.granularity, job.limit_mb)?;
        Ok(output.report)
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Scheduler::new()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_loop(
    running: Arc<AtomicBool>,
    last_run: Arc<Mutex<String>>,
    job: ScheduleJob,
    db_path: String,
) {
    while running.load(Ordering::SeqCst) {
        let wait_secs = seconds_until_next(Local::now(), job.mode);
        // Sleep in one-second slices so stop() stays responsive.
        for _ in 0..wait_secs {
            if !running.load(Ordering::SeqCst) {
                return;
            }
            thread::sleep(std::time::Duration::from_secs(1));
        }
        if !running.load(Ordering::SeqCst) {
            return;
        }

        match Scheduler::execute_once(&db_path, &job) {
            Ok(report) => {
                *last_run.lock().unwrap() =
                    Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
                info!(
                    "Scheduled cycle complete: action {:?}, {} files deleted, {:.2} MB freed",
                    report.action, report.files_deleted, report.mb_freed,
                );
            }
            Err(e) => warn!("Scheduled cycle failed: {}", e),
        }
    }
}

fn seconds_until_next(now: DateTime<Local>, mode: ScheduleMode) -> i64 {
    match mode {
        ScheduleMode::Interval { minutes } => i64::from(minutes).max(1) * 60,
        ScheduleMode::Daily { .. } => (next_fire(now, mode) - now).num_seconds().max(0),
    }
}

/// Next occurrence of the scheduled instant. A daily time that has already
/// passed today targets the same time tomorrow.
fn next_fire(now: DateTime<Local>, mode: ScheduleMode) -> DateTime<Local> {
    match mode {
        ScheduleMode::Interval { minutes } => now + Duration::minutes(i64::from(minutes).max(1)),
        ScheduleMode::Daily { hour, minute } => {
            let target_naive = now
                .date_naive()
                .and_hms_opt(hour.min(23), minute.min(59), 0)
                .unwrap_or_else(|| now.naive_local());
            let target = Local
                .from_local_datetime(&target_naive)
                .earliest()
                .unwrap_or(now);
            if target <= now {
                target + Duration::days(1)
            } else {
                target
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_next_fire_daily_rolls_to_tomorrow() {
        let now = Local::now();
        let mode = ScheduleMode::Daily {
            hour: now.hour(),
            minute: now.minute(),
        };
        // The current minute has already started, so the target is tomorrow.
        let next = next_fire(now, mode);
        assert!(next > now);
        assert!(next - now > Duration::hours(23));
    }

    #[test]
    fn test_next_fire_interval() {
        let now = Local::now();
        let next = next_fire(now, ScheduleMode::Interval { minutes: 5 });
        assert_eq!((next - now).num_minutes(), 5);
    }

    #[test]
    fn test_seconds_until_interval_floor() {
        let now = Local::now();
        assert_eq!(
            seconds_until_next(now, ScheduleMode::Interval { minutes: 0 }),
            60
        );
        assert_eq!(
            seconds_until_next(now, ScheduleMode::Interval { minutes: 2 }),
            120
        );
    }

    #[test]
    fn test_stop_without_start_is_noop() {
        let scheduler = Scheduler::new();
        assert!(!scheduler.is_running());
        scheduler.stop();
        assert!(!scheduler.is_running());
        assert_eq!(scheduler.next_run(), "");
    }
}
