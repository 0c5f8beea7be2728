//! Frame timing over a rolling window, plus named timing spans.

use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

/// One frame at 60 Hz.
pub const DEFAULT_FRAME_BUDGET_MS: f64 = 1000.0 / 60.0;
/// Frames kept in the rolling window.
pub const DEFAULT_FRAME_WINDOW: usize = 120;

/// Statistics over the frames in the window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameStats {
    pub samples: usize,
    pub fps: f64,
    pub average_ms: f64,
    pub p95_ms: f64,
    pub max_ms: f64,
    /// Frames missed because a frame ran over budget.
    pub dropped_frames: u64,
}

/// Accumulated timings of one named operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpanStats {
    pub name: String,
    pub count: u64,
    pub total_ms: f64,
    pub max_ms: f64,
}

impl SpanStats {
    /// Mean span duration in milliseconds.
    pub fn average_ms(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total_ms / self.count as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    pub frame_budget_ms: f64,
    pub frames: FrameStats,
    /// Slowest first by total time.
    pub spans: Vec<SpanStats>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct PerformanceMonitor {
    frames: VecDeque<f64>,
    capacity: usize,
    budget_ms: f64,
    dropped: u64,
    spans: HashMap<String, SpanStats>,
    last_tick: Option<Instant>,
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_BUDGET_MS, DEFAULT_FRAME_WINDOW)
    }
}

impl PerformanceMonitor {
    /// Monitor keeping the last `capacity` frames against `budget_ms`.
    pub fn new(budget_ms: f64, capacity: usize) -> Self {
        Self {
            frames: VecDeque::with_capacity(capacity.max(1)),
            capacity: capacity.max(1),
            budget_ms,
            dropped: 0,
            spans: HashMap::new(),
            last_tick: None,
        }
    }

    /// Frame budget in milliseconds.
    pub fn budget_ms(&self) -> f64 {
        self.budget_ms
    }

    /// Record one frame's duration.
    pub fn record_frame(&mut self, duration: Duration) {
        let ms = duration.as_secs_f64() * 1000.0;
        if self.budget_ms > 0.0 && ms > self.budget_ms {
            self.dropped += ((ms / self.budget_ms).ceil() as u64).saturating_sub(1);
        }
        if self.frames.len() == self.capacity {
            self.frames.pop_front();
        }
        self.frames.push_back(ms);
    }

    /// Mark a frame boundary at `now`; records the time since the previous one.
    pub fn tick(&mut self, now: Instant) {
        if let Some(last) = self.last_tick {
            self.record_frame(now.saturating_duration_since(last));
        }
        self.last_tick = Some(now);
    }

    /// Add a measured duration to the span called `name`.
    pub fn record_span(&mut self, name: &str, duration: Duration) {
        let ms = duration.as_secs_f64() * 1000.0;
        let span = self
            .spans
            .entry(name.to_string())
            .or_insert_with(|| SpanStats {
                name: name.to_string(),
                count: 0,
                total_ms: 0.0,
                max_ms: 0.0,
            });
        span.count += 1;
        span.total_ms += ms;
        span.max_ms = span.max_ms.max(ms);
    }

    /// Run `f`, recording its duration under `name`.
    pub fn time<T>(&mut self, name: &str, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let result = f();
        self.record_span(name, start.elapsed());
        result
    }

    /// Stats for one span.
    pub fn span(&self, name: &str) -> Option<&SpanStats> {
        self.spans.get(name)
    }

    /// Aggregate stats over the frame window.
    pub fn stats(&self) -> FrameStats {
        let samples = self.frames.len();
        if samples == 0 {
            return FrameStats {
                dropped_frames: self.dropped,
                ..FrameStats::default()
            };
        }
        let total: f64 = self.frames.iter().sum();
        let average_ms = total / samples as f64;
        let mut sorted: Vec<f64> = self.frames.iter().copied().collect();
        sorted.sort_by(f64::total_cmp);
        // Nearest-rank percentile.
        let rank = ((0.95 * samples as f64).ceil() as usize).clamp(1, samples);
        FrameStats {
            samples,
            fps: if average_ms > 0.0 { 1000.0 / average_ms } else { 0.0 },
            average_ms,
            p95_ms: sorted[rank - 1],
            max_ms: sorted[samples - 1],
            dropped_frames: self.dropped,
        }
    }

    /// Frames, spans (slowest first) and budget warnings.
    pub fn report(&self) -> PerformanceReport {
        let frames = self.stats();
        let mut spans: Vec<SpanStats> = self.spans.values().cloned().collect();
        spans.sort_by(|a, b| b.total_ms.total_cmp(&a.total_ms));

        let mut warnings = Vec::new();
        if frames.samples > 0 && frames.p95_ms > self.budget_ms {
            warnings.push(format!(
                "95th percentile frame time {:.1} ms exceeds the {:.1} ms budget",
                frames.p95_ms, self.budget_ms
            ));
        }
        for span in spans.iter().filter(|s| s.max_ms > self.budget_ms) {
            warnings.push(format!(
                "'{}' took up to {:.1} ms, longer than a frame",
                span.name, span.max_ms
            ));
        }
        PerformanceReport {
            frame_budget_ms: self.budget_ms,
            frames,
            spans,
            warnings,
        }
    }

    /// Forget all frames and spans.
    pub fn reset(&mut self) {
        self.frames.clear();
        self.spans.clear();
        self.dropped = 0;
        self.last_tick = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn test_empty_stats() {
        let monitor = PerformanceMonitor::default();
        assert_eq!(monitor.stats(), FrameStats::default());
        assert!(monitor.report().warnings.is_empty());
    }

    #[test]
    fn test_fps_and_percentile() {
        let mut monitor = PerformanceMonitor::new(20.0, 100);
        for _ in 0..95 {
            monitor.record_frame(ms(10));
        }
        for _ in 0..5 {
            monitor.record_frame(ms(50));
        }
        let stats = monitor.stats();
        assert_eq!(stats.samples, 100);
        assert!((stats.average_ms - 12.0).abs() < 1e-9);
        assert!((stats.fps - 1000.0 / 12.0).abs() < 1e-9);
        assert!((stats.p95_ms - 10.0).abs() < 1e-9);
        assert!((stats.max_ms - 50.0).abs() < 1e-9);
        // Each 50 ms frame spans three 20 ms budgets: two missed.
        assert_eq!(stats.dropped_frames, 10);
    }

    #[test]
    fn test_window_rolls() {
        let mut monitor = PerformanceMonitor::new(16.0, 3);
        for value in [100, 1, 1, 1] {
            monitor.record_frame(ms(value));
        }
        let stats = monitor.stats();
        assert_eq!(stats.samples, 3);
        assert!((stats.max_ms - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_tick() {
        let mut monitor = PerformanceMonitor::default();
        let start = Instant::now();
        monitor.tick(start);
        monitor.tick(start + ms(16));
        monitor.tick(start + ms(32));
        assert_eq!(monitor.stats().samples, 2);
    }

    #[test]
    fn test_spans_and_warnings() {
        let mut monitor = PerformanceMonitor::new(16.0, 10);
        let value = monitor.time("reduce", || 2 + 2);
        assert_eq!(value, 4);
        monitor.record_span("render", ms(40));
        monitor.record_span("render", ms(10));

        let render = monitor.span("render").unwrap();
        assert_eq!(render.count, 2);
        assert!((render.average_ms() - 25.0).abs() < 1e-9);

        let report = monitor.report();
        assert_eq!(report.spans[0].name, "render");
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("render"));
        assert_eq!(monitor.span("reduce").unwrap().count, 1);
    }
}
