//! Prometheus counters for inspection passes

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, Registry, TextEncoder};
use std::time::Duration;

/// Inspection metrics collector. Clones share the same counters.
#[derive(Clone)]
pub struct InspectionMetrics {
    /// Member passes run
    passes: IntCounter,

    /// Members evaluated, regardless of outcome
    members_evaluated: IntCounter,

    /// Members whose evaluation failed
    member_failures: IntCounter,

    /// Unsupported placeholders emitted
    unsupported_members: IntCounter,

    /// Extension entries evaluated
    extension_entries: IntCounter,

    /// Per-member evaluation time
    evaluation_duration: Histogram,

    registry: Registry,
}

impl InspectionMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let passes = IntCounter::new("lookup_passes_total", "Total number of member passes")?;
        registry.register(Box::new(passes.clone()))?;

        let members_evaluated = IntCounter::new(
            "lookup_members_evaluated_total",
            "Total number of members evaluated",
        )?;
        registry.register(Box::new(members_evaluated.clone()))?;

        let member_failures = IntCounter::new(
            "lookup_member_failures_total",
            "Total number of members whose evaluation failed",
        )?;
        registry.register(Box::new(member_failures.clone()))?;

        let unsupported_members = IntCounter::new(
            "lookup_unsupported_members_total",
            "Total number of unsupported member placeholders",
        )?;
        registry.register(Box::new(unsupported_members.clone()))?;

        let extension_entries = IntCounter::new(
            "lookup_extension_entries_total",
            "Total number of extension entries evaluated",
        )?;
        registry.register(Box::new(extension_entries.clone()))?;

        let evaluation_duration = Histogram::with_opts(
            HistogramOpts::new(
                "lookup_member_evaluation_seconds",
                "Member evaluation duration in seconds",
            )
            .buckets(vec![0.0001, 0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        )?;
        registry.register(Box::new(evaluation_duration.clone()))?;

        Ok(Self {
            passes,
            members_evaluated,
            member_failures,
            unsupported_members,
            extension_entries,
            evaluation_duration,
            registry,
        })
    }

    pub fn pass_started(&self) {
        self.passes.inc();
    }

    pub fn member_evaluated(&self, elapsed: Duration, failed: bool) {
        self.members_evaluated.inc();
        self.evaluation_duration.observe(elapsed.as_secs_f64());
        if failed {
            self.member_failures.inc();
        }
    }

    pub fn unsupported_member(&self) {
        self.unsupported_members.inc();
    }

    pub fn extension_evaluated(&self, elapsed: Duration, failed: bool) {
        self.extension_entries.inc();
        self.member_evaluated(elapsed, failed);
    }

    pub fn passes(&self) -> u64 {
        self.passes.get()
    }

    pub fn members_evaluated(&self) -> u64 {
        self.members_evaluated.get()
    }

    pub fn member_failures(&self) -> u64 {
        self.member_failures.get()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Text exposition of every registered metric
    pub fn gather_text(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let metrics = InspectionMetrics::new().unwrap();
        metrics.pass_started();
        metrics.member_evaluated(Duration::from_millis(1), false);
        metrics.member_evaluated(Duration::from_millis(1), true);
        metrics.extension_evaluated(Duration::from_millis(1), false);

        assert_eq!(metrics.passes(), 1);
        assert_eq!(metrics.members_evaluated(), 3);
        assert_eq!(metrics.member_failures(), 1);

        let text = metrics.gather_text().unwrap();
        assert!(text.contains("lookup_passes_total 1"));
        assert!(text.contains("lookup_extension_entries_total 1"));
    }
}
