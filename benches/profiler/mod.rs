// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Yarnloom-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Yarnloom and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Shared criterion setup.
//!
//! `YARNLOOM_BENCH=quick` picks a short preset without flamegraphs. `YARNLOOM_BENCH_SAMPLES`,
//! `YARNLOOM_BENCH_WARMUP_MS`, `YARNLOOM_BENCH_MEASURE_MS` and `YARNLOOM_PROFILE_HZ` (0 turns
//! the profiler off) override single knobs. Flamegraphs are written with
//! `cargo bench -- --profile-time 10`.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use criterion::Criterion;
use pprof::criterion::{Output, PProfProfiler};

#[derive(Debug, Clone, Copy)]
struct BenchConfig {
    samples: usize,
    warm_up: Duration,
    measurement: Duration,
    /// Flamegraph sampling frequency; `None` runs without the profiler.
    profile_hz: Option<i32>,
}

impl BenchConfig {
    fn preset(name: &str) -> Self {
        match name {
            "quick" => Self {
                samples: 10,
                warm_up: Duration::from_millis(300),
                measurement: Duration::from_secs(1),
                profile_hz: None,
            },
            _ => Self {
                samples: 50,
                warm_up: Duration::from_secs(2),
                measurement: Duration::from_secs(5),
                profile_hz: Some(100),
            },
        }
    }

    fn from_env() -> Self {
        let preset = env::var("YARNLOOM_BENCH").unwrap_or_default();
        let mut config = Self::preset(preset.trim());
        if let Some(samples) = read::<usize>("YARNLOOM_BENCH_SAMPLES") {
            // criterion rejects fewer than ten samples
            config.samples = samples.clamp(10, 500);
        }
        if let Some(ms) = read::<u64>("YARNLOOM_BENCH_WARMUP_MS") {
            config.warm_up = Duration::from_millis(ms.clamp(50, 60_000));
        }
        if let Some(ms) = read::<u64>("YARNLOOM_BENCH_MEASURE_MS") {
            config.measurement = Duration::from_millis(ms.clamp(100, 120_000));
        }
        if let Some(hz) = read::<i32>("YARNLOOM_PROFILE_HZ") {
            config.profile_hz = (hz > 0).then(|| hz.min(1000));
        }
        config
    }

    fn into_criterion(self) -> Criterion {
        let criterion = Criterion::default()
            .sample_size(self.samples)
            .warm_up_time(self.warm_up)
            .measurement_time(self.measurement);
        match self.profile_hz {
            Some(hz) => criterion.with_profiler(PProfProfiler::new(hz, Output::Flamegraph(None))),
            None => criterion,
        }
    }
}

fn read<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok()?.trim().parse().ok()
}

pub fn criterion() -> Criterion {
    BenchConfig::from_env().into_criterion()
}
