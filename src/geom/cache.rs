//! Lazily regenerated mesh storage for an extrusion shape.
//!
//! The cache holds at most one generated mesh. Any input change marks it
//! dirty; the next read regenerates it. Reads of a clean cache return the
//! stored mesh untouched, so repeated reads are idempotent.
//!
//! # Example
//! ```ignore
//! let mut cache = MeshCache::new();
//! let entry = cache.get_or_generate(|| extrude(&spine, &section, &options));
//! println!("vertices: {}", entry.mesh.vertex_count());
//! cache.invalidate();
//! assert!(cache.is_dirty());
//! ```

use std::sync::Arc;

use super::diagnostics::ExtrusionDiagnostics;
use super::extrusion::ExtrusionMesh;

/// Generated mesh plus the diagnostics of the pass that produced it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CachedMesh {
    pub mesh: Arc<ExtrusionMesh>,
    pub diagnostics: ExtrusionDiagnostics,
}

#[derive(Debug, Default)]
pub struct MeshCache {
    entry: Option<CachedMesh>,
    dirty: bool,
    hits: usize,
    misses: usize,
    invalidations: usize,
}

/// Cache statistics for diagnostics and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MeshCacheStats {
    /// Reads served from the stored mesh.
    pub hits: usize,
    /// Reads that had to regenerate.
    pub misses: usize,
    /// Times the cache was marked dirty.
    pub invalidations: usize,
    /// Estimated memory usage in bytes.
    pub estimated_memory_bytes: usize,
}

impl MeshCacheStats {
    /// Returns the cache hit rate as a value between 0.0 and 1.0.
    /// Returns 0.0 if no reads have been made.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl MeshCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the next read regenerates.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty || self.entry.is_none()
    }

    /// Marks the stored mesh stale. The old mesh is kept until the next read
    /// replaces it.
    pub fn invalidate(&mut self) {
        if !self.dirty {
            self.invalidations += 1;
        }
        self.dirty = true;
    }

    /// Returns the stored mesh, running `generate` first when dirty.
    pub fn get_or_generate(
        &mut self,
        generate: impl FnOnce() -> (ExtrusionMesh, ExtrusionDiagnostics),
    ) -> &CachedMesh {
        if self.is_dirty() {
            self.misses += 1;
            let (mesh, diagnostics) = generate();
            self.dirty = false;
            self.entry.insert(CachedMesh {
                mesh: Arc::new(mesh),
                diagnostics,
            })
        } else {
            self.hits += 1;
            self.entry.get_or_insert_with(CachedMesh::default)
        }
    }

    /// Stored mesh without regenerating; may be stale.
    #[must_use]
    pub fn peek(&self) -> Option<&CachedMesh> {
        self.entry.as_ref()
    }

    #[must_use]
    pub fn stats(&self) -> MeshCacheStats {
        MeshCacheStats {
            hits: self.hits,
            misses: self.misses,
            invalidations: self.invalidations,
            estimated_memory_bytes: self.estimate_memory_usage(),
        }
    }

    /// Drops the stored mesh and resets counters.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Rough estimate of bytes held by the stored mesh buffers.
    #[must_use]
    pub fn estimate_memory_usage(&self) -> usize {
        use std::mem::size_of;

        self.entry.as_ref().map_or(0, |entry| {
            let mesh = &entry.mesh;
            mesh.positions.len() * size_of::<[f64; 3]>()
                + mesh.normals.len() * size_of::<[f64; 3]>()
                + mesh.uvs.len() * size_of::<[f64; 2]>()
                + mesh.spine_indices.len() * size_of::<u32>()
                + mesh.indices.len() * size_of::<u32>()
                + mesh.segment_offsets.len() * size_of::<usize>()
        })
    }
}
