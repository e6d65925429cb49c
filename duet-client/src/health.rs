use crate::provider::IceTransportState;
use std::fmt;
use std::time::Duration;
use tokio::time::{Interval, MissedTickBehavior};

/// Point-in-time view of what a call depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthSnapshot {
    pub local_media_present: bool,
    pub remote_media_present: bool,
    /// `None` while no peer link exists.
    pub transport_state: Option<IceTransportState>,
    pub signaling_connected: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthIssue {
    LocalMediaAbsent,
    TransportDegraded(IceTransportState),
    SignalingDisconnected,
}

impl HealthIssue {
    pub fn severity(&self) -> Severity {
        match self {
            Self::TransportDegraded(_) => Severity::Warning,
            Self::LocalMediaAbsent | Self::SignalingDisconnected => Severity::Error,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::LocalMediaAbsent => "local-media-absent",
            Self::TransportDegraded(_) => "transport-degraded",
            Self::SignalingDisconnected => "signaling-disconnected",
        }
    }
}

impl fmt::Display for HealthIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LocalMediaAbsent => f.write_str("local media stream lost"),
            Self::TransportDegraded(state) => {
                write!(f, "connection quality issues detected (ice {state:?})")
            }
            Self::SignalingDisconnected => f.write_str("signaling server connection lost"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthReport {
    pub snapshot: HealthSnapshot,
    pub issues: Vec<HealthIssue>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn worst(&self) -> Option<Severity> {
        self.issues.iter().map(HealthIssue::severity).max()
    }
}

/// Periodic health sampling. Reports problems; never repairs them.
#[derive(Debug, Clone)]
pub struct HealthMonitor {
    interval: Duration,
}

impl HealthMonitor {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn assess(&self, snapshot: HealthSnapshot) -> HealthReport {
        let mut issues = Vec::new();

        if !snapshot.local_media_present {
            issues.push(HealthIssue::LocalMediaAbsent);
        }
        if let Some(state) = snapshot.transport_state {
            if !state.is_healthy() {
                issues.push(HealthIssue::TransportDegraded(state));
            }
        }
        if !snapshot.signaling_connected {
            issues.push(HealthIssue::SignalingDisconnected);
        }

        HealthReport { snapshot, issues }
    }

    /// Ticker for the sampling loop. The first tick fires one interval from now.
    pub fn ticker(&self) -> Interval {
        let start = tokio::time::Instant::now() + self.interval;
        let mut ticker = tokio::time::interval_at(start, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    }
}
