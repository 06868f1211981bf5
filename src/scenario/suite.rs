//! Receive suite
//!
//! Owns the collaborators for one run. Each protocol gets its own device and
//! its own connection, so scenarios share nothing and run concurrently. A
//! failing scenario never aborts its siblings; only provisioning failures are
//! fatal to the run.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::collaborators::{ConnectionFactory, DeviceIdentity, IdentityRegistry, RemoteSender};
use super::runner::{ScenarioReport, ScenarioResult, ScenarioRunner};
use crate::config::Settings;
use crate::message::Protocol;
use crate::utils::HarnessError;

#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub scenarios: Vec<ScenarioReport>,
}

impl SuiteReport {
    pub fn all_passed(&self) -> bool {
        self.scenarios.iter().all(|s| s.result.is_success())
    }

    pub fn result_for(&self, protocol: Protocol) -> Option<ScenarioResult> {
        self.scenarios
            .iter()
            .find(|s| s.protocol == protocol)
            .map(|s| s.result)
    }
}

pub struct ReceiveSuite {
    registry: Arc<dyn IdentityRegistry>,
    sender: Arc<dyn RemoteSender>,
    connections: Arc<dyn ConnectionFactory>,
    runner: ScenarioRunner,
    device_prefix: String,
    run_id: Uuid,
    devices: Vec<(Protocol, DeviceIdentity)>,
}

impl ReceiveSuite {
    pub fn new(
        registry: Arc<dyn IdentityRegistry>,
        sender: Arc<dyn RemoteSender>,
        connections: Arc<dyn ConnectionFactory>,
        settings: &Settings,
    ) -> Self {
        Self {
            registry,
            sender,
            connections,
            runner: ScenarioRunner::from_settings(settings),
            device_prefix: settings.suite.device_prefix.clone(),
            run_id: Uuid::new_v4(),
            devices: Vec::new(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn devices(&self) -> &[(Protocol, DeviceIdentity)] {
        &self.devices
    }

    pub fn device_id_for(&self, protocol: Protocol) -> String {
        format!("{}-{}-{}", self.device_prefix, protocol, self.run_id)
    }

    /// Provisions one device per protocol. On failure the devices created so
    /// far are removed again before the error is returned.
    pub async fn setup(&mut self, protocols: &[Protocol]) -> Result<(), HarnessError> {
        for &protocol in protocols {
            let device_id = self.device_id_for(protocol);
            match self.registry.create_device(&device_id).await {
                Ok(identity) => {
                    info!(%protocol, %device_id, "device provisioned");
                    self.devices.push((protocol, identity));
                }
                Err(e) => {
                    self.teardown().await;
                    return Err(HarnessError::Provisioning(e));
                }
            }
        }
        Ok(())
    }

    /// Runs every provisioned scenario concurrently.
    pub async fn run(&self) -> SuiteReport {
        let started_at = Utc::now();
        let scenarios = self
            .devices
            .iter()
            .map(|(protocol, device)| self.run_scenario(*protocol, device));
        let scenarios = join_all(scenarios).await;

        SuiteReport {
            run_id: self.run_id,
            started_at,
            scenarios,
        }
    }

    /// Deletes every provisioned device. Failures are logged, not returned.
    pub async fn teardown(&mut self) {
        for (protocol, device) in self.devices.drain(..) {
            if let Err(e) = self.registry.delete_device(&device.device_id).await {
                warn!(%protocol, device_id = %device.device_id, error = %e, "failed to delete device");
            }
        }
    }

    /// Setup, run and teardown in one call.
    pub async fn execute(mut self, protocols: &[Protocol]) -> Result<SuiteReport, HarnessError> {
        self.setup(protocols).await?;
        let report = self.run().await;
        self.teardown().await;
        Ok(report)
    }

    async fn run_scenario(&self, protocol: Protocol, device: &DeviceIdentity) -> ScenarioReport {
        match self.connections.connect(device, protocol) {
            Ok(mut connection) => {
                self.runner
                    .run(protocol, device, connection.as_mut(), self.sender.as_ref())
                    .await
            }
            Err(e) => {
                warn!(%protocol, device_id = %device.device_id, error = %e, "could not create connection");
                ScenarioReport {
                    protocol,
                    device_id: device.device_id.clone(),
                    result: ScenarioResult::TransportError,
                    elapsed_ms: 0,
                    detail: Some(e.to_string()),
                }
            }
        }
    }
}
