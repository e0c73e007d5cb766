use fifo_engine_core::ProgressReporter;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;

/// Percentage bar for test-data generation, driven by the core progress
/// callback.
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn ensure_bar(&self) -> ProgressBar {
        let mut guard = self.bar.lock().unwrap();
        if let Some(pb) = guard.as_ref() {
            return pb.clone();
        }
        let pb = ProgressBar::new(100);
        pb.set_style(
            ProgressStyle::with_template(
                "  {spinner:.cyan} Generating [{bar:30.cyan/dim}] {pos}% {msg}",
            )
            .unwrap()
            .progress_chars("━╸─")
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        pb.enable_steady_tick(std::time::Duration::from_millis(80));
        *guard = Some(pb.clone());
        pb
    }
}

impl ProgressReporter for CliReporter {
    fn on_generate_progress(&self, percent: u32, message: &str) {
        let pb = self.ensure_bar();
        pb.set_position(u64::from(percent.min(100)));
        pb.set_message(message.to_string());
        if percent >= 100 {
            pb.finish_and_clear();
            let mut guard = self.bar.lock().unwrap();
            *guard = None;
            eprintln!("  \x1b[32m✓\x1b[0m {}", message);
        }
    }
}
