use crate::config::LabelMode;
use prometheus::{
    Encoder, GaugeVec, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};

pub const LABEL_NAME: &str = "name";

pub const POLL_STATUS_OK: &str = "ok";
pub const POLL_STATUS_TRANSIENT: &str = "transient";
pub const POLL_STATUS_FATAL: &str = "fatal";

/// Wrapper around a prometheus [`Registry`]. Metrics are registered once at
/// startup; registering the same name twice is a programming error.
#[derive(Clone, Debug, Default)]
pub struct MetricsRegistry {
    registry: Registry,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gauge_vec(&self, name: &str, help: &str, label_names: &[&str]) -> GaugeVec {
        self.register(
            GaugeVec::new(Opts::new(name, help), label_names)
                .unwrap_or_else(|err| panic!("invalid gauge {name}: {err}")),
        )
    }

    pub fn int_counter_vec(&self, name: &str, help: &str, label_names: &[&str]) -> IntCounterVec {
        self.register(
            IntCounterVec::new(Opts::new(name, help), label_names)
                .unwrap_or_else(|err| panic!("invalid counter {name}: {err}")),
        )
    }

    pub fn histogram_vec(
        &self,
        name: &str,
        help: &str,
        buckets: Vec<f64>,
        label_names: &[&str],
    ) -> HistogramVec {
        self.register(
            HistogramVec::new(HistogramOpts::new(name, help).buckets(buckets), label_names)
                .unwrap_or_else(|err| panic!("invalid histogram {name}: {err}")),
        )
    }

    fn register<C: prometheus::core::Collector + Clone + 'static>(&self, collector: C) -> C {
        self.registry
            .register(Box::new(collector.clone()))
            .unwrap_or_else(|err| panic!("failed to register metric: {err}"));
        collector
    }

    pub fn prometheus_registry(&self) -> &Registry {
        &self.registry
    }

    /// Renders every registered metric in the text exposition format.
    pub fn render(&self) -> Result<Vec<u8>, prometheus::Error> {
        let mut buffer = vec![];
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(buffer)
    }
}

/// Label values of one node. In the unnamed mode the node's name is not
/// part of any series.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeLabels {
    name: Option<String>,
}

impl NodeLabels {
    pub fn new(label_mode: LabelMode, name: &str) -> Self {
        let name = match label_mode {
            LabelMode::Named => Some(name.to_string()),
            LabelMode::Unnamed => None,
        };
        Self { name }
    }

    /// `values` prefixed with the node's name, if any.
    pub fn with<'a>(&'a self, values: &[&'a str]) -> Vec<&'a str> {
        self.name
            .as_deref()
            .into_iter()
            .chain(values.iter().copied())
            .collect()
    }
}

/// The published catalog. Label names are part of the public contract.
#[derive(Clone)]
pub struct ExporterMetrics {
    pub version: GaugeVec,
    pub latest: GaugeVec,
    pub sync: GaugeVec,
    pub size: GaugeVec,
    pub mempool: GaugeVec,
    pub fee: GaugeVec,
    pub peers: GaugeVec,
    pub polls: IntCounterVec,
    pub poll_duration: HistogramVec,
}

impl ExporterMetrics {
    pub fn new(metrics_registry: &MetricsRegistry, label_mode: LabelMode) -> Self {
        let labels = |names: &[&'static str]| -> Vec<&'static str> {
            match label_mode {
                LabelMode::Named => std::iter::once(LABEL_NAME)
                    .chain(names.iter().copied())
                    .collect(),
                LabelMode::Unnamed => names.to_vec(),
            }
        };

        Self {
            version: metrics_registry.gauge_vec(
                "bitcoind_version",
                "Client version",
                &labels(&["value"]),
            ),
            latest: metrics_registry.gauge_vec(
                "bitcoind_blockchain_latest",
                "Latest block information",
                &labels(&["hash"]),
            ),
            sync: metrics_registry.gauge_vec(
                "bitcoind_blockchain_sync",
                "Blockchain sync info",
                &labels(&["type"]),
            ),
            size: metrics_registry.gauge_vec(
                "bitcoind_blockchain_size_bytes",
                "Blockchain size on disk",
                &labels(&[]),
            ),
            mempool: metrics_registry.gauge_vec(
                "bitcoind_mempool_size",
                "Mempool information",
                &labels(&["type"]),
            ),
            fee: metrics_registry.gauge_vec(
                "bitcoind_fee",
                "Approximate fee per kilobyte by estimatesmartfee method",
                &labels(&["target", "mode"]),
            ),
            peers: metrics_registry.gauge_vec(
                "bitcoind_peers",
                "Connected peers",
                &labels(&["version"]),
            ),
            polls: metrics_registry.int_counter_vec(
                "bitcoind_exporter_polls_total",
                "Node polls by outcome",
                &labels(&["status"]),
            ),
            // 0.01s .. 10s
            poll_duration: metrics_registry.histogram_vec(
                "bitcoind_exporter_poll_duration_seconds",
                "Time to collect and reconcile one node",
                prometheus::exponential_buckets(0.01, 2.0, 11)
                    .unwrap_or_else(|err| panic!("invalid buckets: {err}")),
                &labels(&[]),
            ),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use prometheus::proto::MetricType;
    use std::collections::BTreeMap;

    use super::MetricsRegistry;

    /// A published series: its labels and current value.
    pub type Series = (BTreeMap<String, String>, f64);

    /// Every series of the metric family `name`, as currently gathered.
    pub fn series(registry: &MetricsRegistry, name: &str) -> Vec<Series> {
        registry
            .prometheus_registry()
            .gather()
            .into_iter()
            .filter(|family| family.get_name() == name)
            .flat_map(|family| {
                let metric_type = family.get_field_type();
                family
                    .get_metric()
                    .iter()
                    .map(|metric| {
                        let labels = metric
                            .get_label()
                            .iter()
                            .map(|l| (l.get_name().to_string(), l.get_value().to_string()))
                            .collect();
                        let value = match metric_type {
                            MetricType::COUNTER => metric.get_counter().get_value(),
                            MetricType::HISTOGRAM => {
                                metric.get_histogram().get_sample_count() as f64
                            }
                            _ => metric.get_gauge().get_value(),
                        };
                        (labels, value)
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// The value of the single series matching all `labels`, if any.
    pub fn value(registry: &MetricsRegistry, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
        let matching: Vec<_> = series(registry, name)
            .into_iter()
            .filter(|(series_labels, _)| {
                labels
                    .iter()
                    .all(|(k, v)| series_labels.get(*k).map(String::as_str) == Some(*v))
            })
            .collect();
        assert!(
            matching.len() <= 1,
            "{name} has several series matching {labels:?}"
        );
        matching.first().map(|(_, value)| *value)
    }
}
