//! Evaluation counters for observability

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Evaluator counters
#[derive(Debug, Clone, Default)]
pub struct EvaluatorMetrics {
    /// Total number of evaluations
    pub total_evaluations: u64,

    /// Allowed decisions
    pub allowed_decisions: u64,

    /// Denied decisions
    pub denied_decisions: u64,

    /// Evaluations short-circuited by an unrestricted page
    pub unrestricted: u64,

    /// Evaluations short-circuited by the privileged bypass
    pub bypassed: u64,

    /// Specifiers that failed to resolve
    pub resolution_errors: u64,

    /// Average latency
    pub avg_latency_ms: f64,
}

impl EvaluatorMetrics {
    /// Calculate allow rate
    pub fn allow_rate(&self) -> f64 {
        let total = self.allowed_decisions + self.denied_decisions;
        if total == 0 {
            0.0
        } else {
            self.allowed_decisions as f64 / total as f64
        }
    }
}

/// Metrics collector shared by evaluators
pub struct MetricsCollector {
    metrics: Arc<RwLock<EvaluatorMetrics>>,
}

impl MetricsCollector {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            metrics: Arc::new(RwLock::new(EvaluatorMetrics::default())),
        }
    }

    /// Record a finished evaluation
    pub async fn record_decision(&self, allowed: bool, latency: Duration) {
        let latency_ms = latency.as_secs_f64() * 1000.0;
        let mut metrics = self.metrics.write().await;

        metrics.total_evaluations += 1;
        if allowed {
            metrics.allowed_decisions += 1;
        } else {
            metrics.denied_decisions += 1;
        }

        let n = metrics.total_evaluations as f64;
        metrics.avg_latency_ms += (latency_ms - metrics.avg_latency_ms) / n;
    }

    /// Record an unrestricted short-circuit
    pub async fn record_unrestricted(&self) {
        let mut metrics = self.metrics.write().await;
        metrics.unrestricted += 1;
    }

    /// Record a privileged bypass
    pub async fn record_bypass(&self) {
        let mut metrics = self.metrics.write().await;
        metrics.bypassed += 1;
    }

    /// Record a failed specifier resolution
    pub async fn record_resolution_error(&self) {
        let mut metrics = self.metrics.write().await;
        metrics.resolution_errors += 1;
    }

    /// Snapshot of the current counters
    pub async fn get_metrics(&self) -> EvaluatorMetrics {
        self.metrics.read().await.clone()
    }

    /// Reset all counters
    pub async fn reset(&self) {
        let mut metrics = self.metrics.write().await;
        *metrics = EvaluatorMetrics::default();
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}
