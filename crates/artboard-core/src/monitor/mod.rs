//! Runtime instrumentation: frame timing and memory accounting.

mod memory;
mod performance;

pub use memory::{DEFAULT_MEMORY_BUDGET_BYTES, MemoryReport, MemoryWarning, format_bytes};
pub use performance::{
    DEFAULT_FRAME_BUDGET_MS, DEFAULT_FRAME_WINDOW, FrameStats, PerformanceMonitor,
    PerformanceReport, SpanStats,
};
