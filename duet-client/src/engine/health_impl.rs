use tracing::warn;

use crate::engine::CallEngine;
use crate::event::ClientEvent;
use crate::health::{HealthReport, HealthSnapshot};

impl CallEngine {
    pub(super) fn sample_health(&self) -> HealthReport {
        let snapshot = HealthSnapshot {
            local_media_present: self.local_media.as_ref().is_some_and(|m| m.is_live()),
            remote_media_present: self.remote_media_present,
            transport_state: self.link.as_ref().map(|link| link.transport_state()),
            signaling_connected: self.transport.is_ready(),
        };
        self.health.assess(snapshot)
    }

    pub(super) fn on_health_tick(&self) {
        if !self.state.is_in_call() {
            return;
        }

        let report = self.sample_health();
        if !report.is_healthy() {
            for issue in &report.issues {
                warn!("Health check: {} ({:?})", issue, issue.severity());
            }
            self.emit(ClientEvent::HealthDegraded { report });
        }
    }
}
