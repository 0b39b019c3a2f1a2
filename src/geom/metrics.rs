//! Opt-in timing hooks for the extrusion kernel.
//!
//! Timing is only collected when the `extrusion_metrics` feature is enabled
//! and the target is not WASM (`std::time::Instant` is unavailable there).
//! Otherwise every call compiles down to running the closure.
//!
//! ```ignore
//! let mut metrics = GeomMetrics::default();
//! metrics.begin();
//! let frames = metrics.time(TimingBucket::Frames, || compute_spine_frames(&spine, None, tol));
//! if let Some(report) = metrics.end() {
//!     println!("frames: {} ns", report.frames_ns);
//! }
//! ```

/// Phases of extrusion work that are timed separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimingBucket {
    /// Frame construction along the spine.
    Frames,
    /// Ring vertex placement (positions, normals, texture coordinates).
    Vertices,
    /// Triangle strip assembly.
    Strips,
}

/// Cumulative nanoseconds per bucket.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GeomTimingReport {
    pub frames_ns: u64,
    pub vertices_ns: u64,
    pub strips_ns: u64,
}

impl GeomTimingReport {
    #[must_use]
    pub fn total_ns(&self) -> u64 {
        self.frames_ns
            .saturating_add(self.vertices_ns)
            .saturating_add(self.strips_ns)
    }

    /// Returns the total time in milliseconds (for display purposes).
    #[must_use]
    pub fn total_ms(&self) -> f64 {
        self.total_ns() as f64 / 1_000_000.0
    }
}

/// Accumulator for timing extrusion operations.
///
/// When the `extrusion_metrics` feature is disabled (or on WASM), all methods
/// are no-ops and [`end`](Self::end) returns `None`.
#[derive(Debug, Default)]
pub struct GeomMetrics {
    #[cfg(all(feature = "extrusion_metrics", not(target_arch = "wasm32")))]
    report: GeomTimingReport,
}

impl GeomMetrics {
    /// Resets all timing counters to zero.
    pub fn begin(&mut self) {
        #[cfg(all(feature = "extrusion_metrics", not(target_arch = "wasm32")))]
        {
            self.report = GeomTimingReport::default();
        }
    }

    /// Returns the accumulated timing report, or `None` if metrics are disabled.
    #[must_use]
    pub fn end(&self) -> Option<GeomTimingReport> {
        #[cfg(all(feature = "extrusion_metrics", not(target_arch = "wasm32")))]
        {
            Some(self.report.clone())
        }
        #[cfg(not(all(feature = "extrusion_metrics", not(target_arch = "wasm32"))))]
        {
            None
        }
    }

    /// Times the execution of `f` and accumulates the elapsed time in `bucket`.
    pub fn time<R>(&mut self, bucket: TimingBucket, f: impl FnOnce() -> R) -> R {
        #[cfg(all(feature = "extrusion_metrics", not(target_arch = "wasm32")))]
        {
            let start = std::time::Instant::now();
            let result = f();
            let nanos = start.elapsed().as_nanos().min(u128::from(u64::MAX)) as u64;
            self.add_to_bucket(bucket, nanos);
            result
        }

        #[cfg(not(all(feature = "extrusion_metrics", not(target_arch = "wasm32"))))]
        {
            let _ = bucket;
            f()
        }
    }

    #[cfg(all(feature = "extrusion_metrics", not(target_arch = "wasm32")))]
    fn add_to_bucket(&mut self, bucket: TimingBucket, nanos: u64) {
        let slot = match bucket {
            TimingBucket::Frames => &mut self.report.frames_ns,
            TimingBucket::Vertices => &mut self.report.vertices_ns,
            TimingBucket::Strips => &mut self.report.strips_ns,
        };
        *slot = slot.saturating_add(nanos);
    }
}
