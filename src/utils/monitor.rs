#[cfg(feature = "cli")]
use std::sync::Mutex;
#[cfg(feature = "cli")]
use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

/// One reading of this process's resource usage.
#[cfg(feature = "cli")]
#[derive(Debug, Clone)]
pub struct ResourceSample {
    pub cpu_percent: f32,
    pub rss_mb: u64,
    pub share_of_total: f32,
    pub peak_rss_mb: u64,
    pub elapsed: Duration,
    /// Time since the previous sample, i.e. the length of the phase just finished.
    pub phase_elapsed: Duration,
}

#[cfg(feature = "cli")]
struct MonitorState {
    system: System,
    peak_rss_mb: u64,
    last_sample: Instant,
    phases: Vec<(String, Duration)>,
}

/// Per-phase CPU and memory logging for long stages (thousands of downloads).
#[cfg(feature = "cli")]
pub struct SystemMonitor {
    state: Option<Mutex<MonitorState>>,
    pid: Option<Pid>,
    started: Instant,
}

#[cfg(feature = "cli")]
impl SystemMonitor {
    pub fn new(enabled: bool) -> Self {
        let started = Instant::now();
        if !enabled {
            return Self {
                state: None,
                pid: None,
                started,
            };
        }

        let pid = sysinfo::get_current_pid()
            .map_err(|e| tracing::warn!("Process monitoring unavailable: {}", e))
            .ok();
        let mut system = System::new();
        system.refresh_memory();

        Self {
            state: Some(Mutex::new(MonitorState {
                system,
                peak_rss_mb: 0,
                last_sample: started,
                phases: Vec::new(),
            })),
            pid,
            started,
        }
    }

    pub fn sample(&self) -> Option<ResourceSample> {
        let mut state = self.state.as_ref()?.lock().ok()?;
        let pid = self.pid?;

        state.system.refresh_memory();
        state.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_cpu().with_memory(),
        );

        let total_mb = state.system.total_memory() / 1024 / 1024;
        let (cpu_percent, rss_mb) = {
            let process = state.system.process(pid)?;
            (process.cpu_usage(), process.memory() / 1024 / 1024)
        };
        state.peak_rss_mb = state.peak_rss_mb.max(rss_mb);

        let now = Instant::now();
        let phase_elapsed = now.duration_since(state.last_sample);
        state.last_sample = now;

        Some(ResourceSample {
            cpu_percent,
            rss_mb,
            share_of_total: if total_mb > 0 {
                rss_mb as f32 / total_mb as f32 * 100.0
            } else {
                0.0
            },
            peak_rss_mb: state.peak_rss_mb,
            elapsed: self.started.elapsed(),
            phase_elapsed,
        })
    }

    pub fn log_stats(&self, stage: &str, phase: &str) {
        let Some(sample) = self.sample() else {
            return;
        };
        if let Some(mut state) = self.state.as_ref().and_then(|s| s.lock().ok()) {
            state.phases.push((phase.to_string(), sample.phase_elapsed));
        }
        tracing::info!(
            "📊 {} / {} took {:?} - CPU: {:.1}%, Memory: {}MB ({:.1}%), Peak: {}MB",
            stage,
            phase,
            sample.phase_elapsed,
            sample.cpu_percent,
            sample.rss_mb,
            sample.share_of_total,
            sample.peak_rss_mb
        );
    }

    pub fn log_final_stats(&self, stage: &str) {
        let Some(sample) = self.sample() else {
            return;
        };
        let slowest = self.state.as_ref().and_then(|s| {
            let state = s.lock().ok()?;
            state.phases.iter().max_by_key(|(_, d)| *d).cloned()
        });
        match slowest {
            Some((phase, took)) => tracing::info!(
                "📊 {} finished in {:?}, peak memory {}MB, slowest phase {} ({:?})",
                stage,
                sample.elapsed,
                sample.peak_rss_mb,
                phase,
                took
            ),
            None => tracing::info!(
                "📊 {} finished in {:?}, peak memory {}MB",
                stage,
                sample.elapsed,
                sample.peak_rss_mb
            ),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.state.is_some()
    }
}

// 未啟用 cli 功能時不量測
#[cfg(not(feature = "cli"))]
pub struct SystemMonitor;

#[cfg(not(feature = "cli"))]
impl SystemMonitor {
    pub fn new(_enabled: bool) -> Self {
        Self
    }

    pub fn log_stats(&self, _stage: &str, _phase: &str) {}

    pub fn log_final_stats(&self, _stage: &str) {}

    pub fn is_enabled(&self) -> bool {
        false
    }
}
