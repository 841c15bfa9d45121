//! Logging-behaviour and logging-timing obfuscation over cleaned datasets
//!
//! Real patients neither log every meal nor log it at the exact meal time.
//! This module simulates both axes over a cleaned series: a behaviour profile
//! decides WHICH meals get announced, a timing profile decides WHEN the
//! announcement lands. The glucose ground truth is untouched. Simulated
//! labels live in separate layers (`msg_type_log`, `msg_type_log_shifted`)
//! alongside the unchanged `msg_type`, so one output file carries both the
//! truth and the simulation, and carb values stay in place for comparison.

use crate::cleaner_core::{MsgType, TimeSeries};
use chrono::{Datelike, Duration, NaiveDateTime};
use rand::Rng;
use rand_distr::{Distribution, Gamma, Normal};
use std::collections::BTreeMap;

/// How diligently the simulated patient logs meals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggerProfile {
    /// Logs every meal.
    Full,
    /// Logs the one or two largest meals per day.
    TopMealsDaily,
    /// Logs only the largest meal each day.
    OnceDaily,
    /// Logs a few meals per week.
    FewPerWeek,
    /// Never logs.
    Never,
}

impl LoggerProfile {
    /// Short tag used in obfuscated output filenames.
    pub fn as_str(&self) -> &'static str {
        match self {
            LoggerProfile::Full => "full",
            LoggerProfile::TopMealsDaily => "top2",
            LoggerProfile::OnceDaily => "once",
            LoggerProfile::FewPerWeek => "weekly",
            LoggerProfile::Never => "none",
        }
    }

    /// Pick a profile from a uniform draw in `[0, 1)` against a cumulative
    /// population distribution.
    pub fn from_draw(draw: f64, distribution: &[f64; 6]) -> Self {
        let profiles = [
            LoggerProfile::Full,
            LoggerProfile::TopMealsDaily,
            LoggerProfile::OnceDaily,
            LoggerProfile::FewPerWeek,
            LoggerProfile::Never,
        ];
        for (i, profile) in profiles.iter().enumerate() {
            if draw < distribution[i + 1] {
                return *profile;
            }
        }
        LoggerProfile::Never
    }

    pub fn sample<R: Rng>(rng: &mut R, distribution: &[f64; 6]) -> Self {
        Self::from_draw(rng.gen_range(0.0..1.0), distribution)
    }
}

/// Population shares of each logging style, cumulative.
pub const DEFAULT_LOGGER_DISTRIBUTION: [f64; 6] = [0.0, 0.20, 0.45, 0.65, 0.85, 1.0];

/// When the simulated patient logs relative to the actual meal time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingProfile {
    /// Logs late; shift minutes drawn from a right-skewed gamma.
    Forgetful,
    /// Logs early; shift minutes drawn from a left-shifted gamma.
    Hasty,
    /// Symmetric shifts around the actual meal time.
    Normal,
    /// Logs exactly on time.
    Unchanged,
}

impl TimingProfile {
    /// Short tag used in obfuscated output filenames.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimingProfile::Forgetful => "forgetful",
            TimingProfile::Hasty => "hasty",
            TimingProfile::Normal => "normal",
            TimingProfile::Unchanged => "unchanged",
        }
    }

    pub fn from_draw(draw: f64, distribution: &[f64; 5]) -> Self {
        let profiles = [
            TimingProfile::Forgetful,
            TimingProfile::Hasty,
            TimingProfile::Normal,
            TimingProfile::Unchanged,
        ];
        for (i, profile) in profiles.iter().enumerate() {
            if draw < distribution[i + 1] {
                return *profile;
            }
        }
        TimingProfile::Unchanged
    }

    pub fn sample<R: Rng>(rng: &mut R, distribution: &[f64; 5]) -> Self {
        Self::from_draw(rng.gen_range(0.0..1.0), distribution)
    }
}

/// Population shares of each timing style, cumulative.
pub const DEFAULT_TIMING_DISTRIBUTION: [f64; 5] = [0.0, 0.38, 0.61, 0.89, 1.0];

/// One obfuscation result: the untouched ground truth plus both simulated
/// label layers, index-aligned with `series.events`.
#[derive(Debug, Clone)]
pub struct ObfuscatedSeries {
    pub series: TimeSeries,
    pub behaviour: LoggerProfile,
    pub timing: TimingProfile,
    /// What the simulated patient logged: `msg_type` with unlogged meals
    /// cleared.
    pub msg_type_log: Vec<Option<MsgType>>,
    /// Where the logged announcements landed after the timing shift.
    pub msg_type_log_shifted: Vec<Option<MsgType>>,
}

/// Run both obfuscation passes over a cleaned series.
pub fn obfuscate_series<R: Rng>(
    series: &TimeSeries,
    behaviour: LoggerProfile,
    timing: TimingProfile,
    rng: &mut R,
) -> ObfuscatedSeries {
    let msg_type_log = apply_logger_profile(series, behaviour);
    let msg_type_log_shifted = shift_logged_meals(series, &msg_type_log, timing, rng);
    ObfuscatedSeries {
        series: series.clone(),
        behaviour,
        timing,
        msg_type_log,
        msg_type_log_shifted,
    }
}

/// Carb threshold whose crossing rate averages `target_per_day` announced
/// meals per calendar day. `None` when the series has no meals.
pub fn find_meals_threshold_daily(series: &TimeSeries, target_per_day: f64) -> Option<f64> {
    let carbs = meal_carbs(series);
    if carbs.is_empty() {
        return None;
    }
    let days = series
        .events
        .iter()
        .filter(|e| e.msg_type.is_meal())
        .map(|e| e.timestamp.date())
        .collect::<std::collections::BTreeSet<_>>()
        .len();
    let avg_per_day = carbs.len() as f64 / days.max(1) as f64;
    Some(threshold_for_target(&carbs, target_per_day, avg_per_day))
}

/// Same idea per ISO week, targeting `target_per_week` announcements.
pub fn find_meals_threshold_weekly(series: &TimeSeries, target_per_week: f64) -> Option<f64> {
    let carbs = meal_carbs(series);
    if carbs.is_empty() {
        return None;
    }
    let weeks = series
        .events
        .iter()
        .filter(|e| e.msg_type.is_meal())
        .map(|e| (e.timestamp.iso_week().year(), e.timestamp.iso_week().week()))
        .collect::<std::collections::BTreeSet<_>>()
        .len();
    let avg_per_week = carbs.len() as f64 / weeks.max(1) as f64;
    Some(threshold_for_target(&carbs, target_per_week, avg_per_week))
}

fn meal_carbs(series: &TimeSeries) -> Vec<f64> {
    series
        .events
        .iter()
        .filter(|e| e.msg_type.is_meal())
        .map(|e| e.food_g)
        .collect()
}

fn threshold_for_target(carbs: &[f64], target: f64, avg: f64) -> f64 {
    // The percentile whose upper tail yields the target logging rate.
    let percentile = ((1.0 - target / avg).max(0.0)).min(1.0);
    let mut sorted = carbs.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let rank = ((sorted.len() - 1) as f64 * percentile).round() as usize;
    sorted[rank]
}

/// Build the logged-label layer for a behaviour profile: a copy of each
/// row's `msg_type` with the meals the simulated patient would not have
/// logged cleared to `None`. The series itself is never modified, so the
/// ground-truth labels stay available next to the simulated ones.
pub fn apply_logger_profile(series: &TimeSeries, profile: LoggerProfile) -> Vec<Option<MsgType>> {
    let mut logged: Vec<Option<MsgType>> = series
        .events
        .iter()
        .map(|e| Some(e.msg_type.clone()))
        .collect();

    match profile {
        LoggerProfile::Full => {}
        LoggerProfile::TopMealsDaily => {
            if let Some(threshold) = find_meals_threshold_daily(series, 1.8) {
                unlog_meals_below(series, &mut logged, threshold);
            }
        }
        LoggerProfile::OnceDaily => unlog_all_but_daily_max(series, &mut logged),
        LoggerProfile::FewPerWeek => {
            if let Some(threshold) = find_meals_threshold_weekly(series, 3.0) {
                unlog_meals_below(series, &mut logged, threshold);
            }
        }
        LoggerProfile::Never => {
            for slot in &mut logged {
                *slot = None;
            }
        }
    }
    logged
}

fn unlog_meals_below(series: &TimeSeries, logged: &mut [Option<MsgType>], threshold: f64) {
    for (idx, event) in series.events.iter().enumerate() {
        if event.msg_type.is_meal() && event.food_g < threshold {
            logged[idx] = None;
        }
    }
}

fn unlog_all_but_daily_max(series: &TimeSeries, logged: &mut [Option<MsgType>]) {
    let mut best: BTreeMap<chrono::NaiveDate, usize> = BTreeMap::new();
    for (idx, event) in series.events.iter().enumerate() {
        if !event.msg_type.is_meal() {
            continue;
        }
        let day = event.timestamp.date();
        match best.get(&day) {
            Some(&prev) if series.events[prev].food_g >= event.food_g => {}
            _ => {
                best.insert(day, idx);
            }
        }
    }
    let keep: std::collections::BTreeSet<usize> = best.into_values().collect();
    for (idx, event) in series.events.iter().enumerate() {
        if event.msg_type.is_meal() && !keep.contains(&idx) {
            logged[idx] = None;
        }
    }
}

/// Shift the logged announcements in time according to a timing profile.
///
/// Each announcement gets its own shift draw with fresh distribution
/// parameters, the way a patient's delay varies meal to meal: gamma-based
/// minutes for the skewed profiles, normal for the symmetric one. A shifted
/// announcement snaps to the nearest existing row; a shift landing outside
/// the series range drops the announcement. `Unchanged` copies the logged
/// layer through.
pub fn shift_logged_meals<R: Rng>(
    series: &TimeSeries,
    logged: &[Option<MsgType>],
    profile: TimingProfile,
    rng: &mut R,
) -> Vec<Option<MsgType>> {
    if profile == TimingProfile::Unchanged {
        return logged.to_vec();
    }

    let mut shifted: Vec<Option<MsgType>> = vec![None; series.len()];
    if series.is_empty() {
        return shifted;
    }
    let min_ts = series.events[0].timestamp;
    let max_ts = series.events[series.len() - 1].timestamp;

    for (idx, slot) in logged.iter().enumerate() {
        if !matches!(slot, Some(m) if m.is_meal()) {
            continue;
        }
        let minutes = draw_shift_minutes(profile, rng);
        let new_time =
            series.events[idx].timestamp + Duration::seconds((minutes * 60.0) as i64);
        if new_time < min_ts || new_time > max_ts {
            continue;
        }
        shifted[nearest_row(series, new_time)] = Some(MsgType::AnnounceMeal);
    }
    shifted
}

// Standard normal quantiles feeding the Wilson-Hilferty gamma quantile.
const Z_P05: f64 = -1.6449;
const Z_P01: f64 = -2.3263;

fn draw_shift_minutes<R: Rng>(profile: TimingProfile, rng: &mut R) -> f64 {
    match profile {
        TimingProfile::Normal => {
            let mean = rng.gen_range(-15.0..15.0);
            let std = rng.gen_range(8.0..12.0);
            match Normal::new(mean, std) {
                Ok(dist) => dist.sample(rng),
                Err(_) => mean,
            }
        }
        TimingProfile::Hasty => {
            let shape = rng.gen_range(2.5..3.5);
            let scale = rng.gen_range(2.0..3.0);
            let offset = rng.gen_range(-8.0..-5.0);
            let raw = gamma_sample(rng, shape, scale);
            // Mean below median: the bulk of announcements come early.
            raw + gamma_quantile(shape, scale, Z_P05) + offset - gamma_median(shape, scale) / 2.0
        }
        TimingProfile::Forgetful => {
            let shape = rng.gen_range(1.5..2.5);
            let scale = rng.gen_range(4.0..6.0);
            let offset = rng.gen_range(5.0..10.0);
            let raw = gamma_sample(rng, shape, scale);
            // Mean above median: a long late tail.
            raw + gamma_quantile(shape, scale, Z_P01) + offset - gamma_median(shape, scale)
        }
        TimingProfile::Unchanged => 0.0,
    }
}

fn gamma_sample<R: Rng>(rng: &mut R, shape: f64, scale: f64) -> f64 {
    match Gamma::new(shape, scale) {
        Ok(dist) => dist.sample(rng),
        Err(_) => shape * scale,
    }
}

/// Wilson-Hilferty approximation of the gamma median (quantile at z = 0).
fn gamma_median(shape: f64, scale: f64) -> f64 {
    shape * scale * (1.0 - 2.0 / (9.0 * shape)).powi(3)
}

/// Wilson-Hilferty gamma quantile for standard normal quantile `z`.
fn gamma_quantile(shape: f64, scale: f64, z: f64) -> f64 {
    let k = 2.0 / (9.0 * shape);
    (shape * scale * (1.0 - k + z * k.sqrt()).powi(3)).max(0.0)
}

/// Row index whose timestamp is closest to `target`. The series is sorted.
fn nearest_row(series: &TimeSeries, target: NaiveDateTime) -> usize {
    let pos = series.events.partition_point(|e| e.timestamp < target);
    if pos == 0 {
        return 0;
    }
    if pos == series.len() {
        return series.len() - 1;
    }
    let before = target - series.events[pos - 1].timestamp;
    let after = series.events[pos].timestamp - target;
    if after < before {
        pos
    } else {
        pos - 1
    }
}
