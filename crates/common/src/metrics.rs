use std::sync::Arc;

use prometheus::{CounterVec, Encoder, Opts, Registry, TextEncoder};

/// Planner counters, exported in Prometheus text format.
///
/// Cloning is cheap; clones share the same underlying registry.
#[derive(Clone, Debug)]
pub struct MetricsRegistry {
    inner: Arc<MetricsInner>,
}

#[derive(Debug)]
struct MetricsInner {
    registry: Registry,
    builder_invocations: CounterVec,
    pushdown_columns: CounterVec,
    internal_errors: CounterVec,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner::new()),
        }
    }

    /// Count one invocation of a statement or leaf builder.
    pub fn record_builder(&self, builder: &str) {
        self.inner
            .builder_invocations
            .with_label_values(&[builder])
            .inc();
    }

    /// Count column references pushed into an internal select list, split by
    /// whether they got a fresh slot or reused an existing one.
    pub fn record_pushdown(&self, inserted: usize, reused: usize) {
        self.inner
            .pushdown_columns
            .with_label_values(&["inserted"])
            .inc_by(inserted as f64);
        self.inner
            .pushdown_columns
            .with_label_values(&["reused"])
            .inc_by(reused as f64);
    }

    pub fn record_internal_error(&self, kind: &str) {
        self.inner
            .internal_errors
            .with_label_values(&[kind])
            .inc();
    }

    pub fn builder_invocations(&self, builder: &str) -> u64 {
        self.inner
            .builder_invocations
            .with_label_values(&[builder])
            .get() as u64
    }

    /// `outcome` is `"inserted"` or `"reused"`.
    pub fn pushdown_columns(&self, outcome: &str) -> u64 {
        self.inner
            .pushdown_columns
            .with_label_values(&[outcome])
            .get() as u64
    }

    pub fn internal_errors(&self, kind: &str) -> u64 {
        self.inner
            .internal_errors
            .with_label_values(&[kind])
            .get() as u64
    }

    pub fn render_prometheus(&self) -> String {
        let metric_families = self.inner.registry.gather();
        let mut out = Vec::new();
        let enc = TextEncoder::new();
        if enc.encode(&metric_families, &mut out).is_err() {
            return String::new();
        }
        String::from_utf8_lossy(&out).to_string()
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsInner {
    fn new() -> Self {
        let registry = Registry::new();
        let builder_invocations = counter_vec(
            &registry,
            "mq_planner_builder_invocations_total",
            "Plan builder invocations by builder",
            &["builder"],
        );
        let pushdown_columns = counter_vec(
            &registry,
            "mq_planner_pushdown_columns_total",
            "Column references pushed into internal select lists",
            &["outcome"],
        );
        let internal_errors = counter_vec(
            &registry,
            "mq_planner_internal_errors_total",
            "Internal-consistency failures by kind",
            &["kind"],
        );
        Self {
            registry,
            builder_invocations,
            pushdown_columns,
            internal_errors,
        }
    }
}

fn counter_vec(registry: &Registry, name: &str, help: &str, labels: &[&str]) -> CounterVec {
    let c = CounterVec::new(Opts::new(name, help), labels).expect("counter vec");
    registry
        .register(Box::new(c.clone()))
        .expect("register counter");
    c
}
