//! Metrics definitions for the gateway.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Counter,
    Histogram,
}

#[derive(Debug, Clone, Copy)]
pub struct MetricDef {
    pub name: &'static str,
    pub metric_type: MetricType,
    pub description: &'static str,
}

pub const SUBMISSION_ENQUEUED: MetricDef = MetricDef {
    name: "submission.enqueued",
    metric_type: MetricType::Counter,
    description: "Jobs created on a hive queue, tagged by pipeline",
};

pub const SUBMISSION_BLOCKED: MetricDef = MetricDef {
    name: "submission.blocked",
    metric_type: MetricType::Counter,
    description: "Submissions refused by the status gate",
};

pub const STATUS_GATE_DURATION: MetricDef = MetricDef {
    name: "status_gate.duration",
    metric_type: MetricType::Histogram,
    description: "Time to query a GIFTs service status in seconds",
};

pub const ALL_METRICS: &[MetricDef] = &[
    SUBMISSION_ENQUEUED,
    SUBMISSION_BLOCKED,
    STATUS_GATE_DURATION,
];
