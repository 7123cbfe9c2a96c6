//! Health snapshots aggregated from the storage ports.

use std::sync::Arc;
use std::time::Instant;

use crate::storage::{AnalyticsSink, EventLog, MetadataStore, ObjectStore, VectorIndexStore};
use crate::types::{HealthStatus, StorageUsage, SystemHealth};

pub struct SystemMonitor {
    started: Instant,
    objects: Arc<dyn ObjectStore>,
    metadata: Arc<dyn MetadataStore>,
    vectors: Arc<dyn VectorIndexStore>,
    events: Arc<dyn EventLog>,
    analytics: Arc<dyn AnalyticsSink>,
}

impl SystemMonitor {
    pub fn new(
        objects: Arc<dyn ObjectStore>,
        metadata: Arc<dyn MetadataStore>,
        vectors: Arc<dyn VectorIndexStore>,
        events: Arc<dyn EventLog>,
        analytics: Arc<dyn AnalyticsSink>,
    ) -> Self {
        Self {
            started: Instant::now(),
            objects,
            metadata,
            vectors,
            events,
            analytics,
        }
    }

    /// Recompute the health snapshot from live port counters. Latency is the
    /// measured duration of the snapshot itself; the local build runs no
    /// background jobs.
    pub fn health(&self) -> SystemHealth {
        let probe = Instant::now();
        let storage = StorageUsage {
            metadata_rows: self.metadata.row_count(),
            vector_count: self.vectors.vector_count(),
            object_count: self.objects.object_count(),
            analytics_rows: self.analytics.row_count(),
            event_rows: self.events.row_count(),
        };

        SystemHealth {
            status: HealthStatus::Healthy,
            latency_ms: probe.elapsed().as_millis() as u64,
            active_jobs: 0,
            storage,
            uptime_secs: self.started.elapsed().as_secs(),
        }
    }
}
