use crate::error::Error;
use crate::progress::ProgressReporter;
use crate::storage::models::{Category, StorageSnapshot};
use crate::storage::Store;
use chrono::{Duration, Local};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

const ASSETS: [&str; 3] = ["ASSET_01", "ASSET_02", "ASSET_03"];
const INDICES_PER_ASSET: i32 = 5;
const CATEGORIES: [Category; 2] = [Category::E, Category::F];
const RAMP_DAYS: i64 = 14;
const MIN_FILE_BYTES: u64 = 1024;
const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Populate `root` with a 14-day synthetic archive across 30 entities,
/// linearly ramping from 70% to 130% of the average daily size, and insert
/// matching per-day snapshot rows so forecasts have history to work with.
pub fn generate_dataset(
    store: &Store,
    root: &Path,
    size_gb: f64,
    reporter: &dyn ProgressReporter,
) -> Result<(), Error> {
    let total_folders = ASSETS.len() as i64 * i64::from(INDICES_PER_ASSET) * 2 * RAMP_DAYS;
    let total_bytes = size_gb * 1024.0 * 1024.0 * 1024.0;
    let bytes_per_file = ((total_bytes / total_folders as f64) as u64).max(MIN_FILE_BYTES);

    let mut rng = SplitMix::from_clock();
    let mut folder_idx = 0i64;

    for asset in ASSETS {
        for index_val in 1..=INDICES_PER_ASSET {
            for category in CATEGORIES {
                for day in 0..RAMP_DAYS {
                    // day 0 is the oldest; today is the last day of the ramp.
                    let date = Local::now() - Duration::days(RAMP_DAYS - 1 - day);
                    let date_str = date.format("%Y-%m-%d").to_string();

                    let growth = 0.7 + 0.6 * day as f64 / (RAMP_DAYS - 1) as f64;
                    let file_bytes = (bytes_per_file as f64 * growth) as u64;

                    let file_path =
                        entity_day_dir(root, asset, index_val, category, &date_str)?.join(
                            format!("{}_{}_{}_{}.dat", asset, index_val, category, date_str),
                        );
                    write_filler_file(&file_path, file_bytes, &mut rng)?;

                    store.insert_snapshot(&StorageSnapshot {
                        asset: asset.to_string(),
                        index_val,
                        category,
                        measurement_date: date_str,
                        size_mb: file_bytes as f64 / BYTES_PER_MB,
                        file_count: 1,
                    })?;

                    folder_idx += 1;
                    let percent = (folder_idx * 100 / total_folders) as u32;
                    reporter.on_generate_progress(
                        percent,
                        &format!(
                            "Generating {}/{}/{} day {}/{}",
                            asset,
                            index_val,
                            category,
                            day + 1,
                            RAMP_DAYS,
                        ),
                    );
                }
            }
        }
    }

    reporter.on_generate_progress(100, "Test data generation complete");
    info!(
        "Generated {} day-folders under {} ({:.2} GB requested)",
        total_folders,
        root.display(),
        size_gb,
    );
    Ok(())
}

/// Add one synthetic day of data, `day_offset` days from today (negative
/// for the past), one file per entity with ±20% size variation.
pub fn generate_one_day(
    store: &Store,
    root: &Path,
    day_size_mb: f64,
    day_offset: i64,
    reporter: &dyn ProgressReporter,
) -> Result<(), Error> {
    let total_entities = ASSETS.len() as i64 * i64::from(INDICES_PER_ASSET) * 2;
    let bytes_per_file =
        ((day_size_mb * BYTES_PER_MB / total_entities as f64) as u64).max(MIN_FILE_BYTES);

    let date = Local::now() + Duration::days(day_offset);
    let date_str = date.format("%Y-%m-%d").to_string();

    let mut rng = SplitMix::from_clock();
    let mut entity_idx = 0i64;

    for asset in ASSETS {
        for index_val in 1..=INDICES_PER_ASSET {
            for category in CATEGORIES {
                let variation = 0.8 + (rng.next() % 40) as f64 / 100.0;
                let file_bytes = (bytes_per_file as f64 * variation) as u64;

                let file_path = entity_day_dir(root, asset, index_val, category, &date_str)?
                    .join(format!("{}_{}_{}_{}.dat", asset, index_val, category, date_str));
                write_filler_file(&file_path, file_bytes, &mut rng)?;

                store.insert_snapshot(&StorageSnapshot {
                    asset: asset.to_string(),
                    index_val,
                    category,
                    measurement_date: date_str.clone(),
                    size_mb: file_bytes as f64 / BYTES_PER_MB,
                    file_count: 1,
                })?;

                entity_idx += 1;
                let percent = (entity_idx * 100 / total_entities) as u32;
                reporter.on_generate_progress(
                    percent,
                    &format!("Day {}: {}/{}/{}", date_str, asset, index_val, category),
                );
            }
        }
    }

    reporter.on_generate_progress(100, "One day of data generated");
    Ok(())
}

/// Build (and create) `root/asset/index/category/YYYY/MM/DD`.
fn entity_day_dir(
    root: &Path,
    asset: &str,
    index_val: i32,
    category: Category,
    date_str: &str,
) -> Result<PathBuf, Error> {
    let mut dir = root.join(asset).join(index_val.to_string());
    dir.push(category.as_char().to_string());
    for part in date_str.split('-') {
        dir.push(part);
    }
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn write_filler_file(path: &Path, bytes: u64, rng: &mut SplitMix) -> Result<(), Error> {
    let mut out = fs::File::create(path)?;
    let mut buf = [0u8; 8192];
    let mut written = 0u64;
    while written < bytes {
        for b in buf.iter_mut() {
            *b = rng.next() as u8;
        }
        let chunk = (bytes - written).min(buf.len() as u64) as usize;
        out.write_all(&buf[..chunk])?;
        written += chunk as u64;
    }
    Ok(())
}

/// Small splitmix64 generator; filler content only needs to be incompressible.
struct SplitMix(u64);

impl SplitMix {
    fn from_clock() -> Self {
        let seed = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0x9e3779b97f4a7c15);
        SplitMix(seed | 1)
    }

    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9e3779b97f4a7c15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
        z ^ (z >> 31)
    }
}
