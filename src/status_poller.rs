use crate::coordinator::Coordinator;
use crate::entity_factory::{ApexEntity, EntityRegistrar};
use crate::status_payload::StatusPayload;
use anyhow::Context;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::{interval, sleep};

const MAX_RETRIES: u32 = 3;

pub async fn read_json_file<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Registrar that keeps the entities for the poller to drive.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    entities: Vec<ApexEntity>,
}

impl EntityRegistry {
    pub fn entities(&self) -> &[ApexEntity] {
        &self.entities
    }

    pub fn into_entities(self) -> Vec<ApexEntity> {
        self.entities
    }
}

impl EntityRegistrar for EntityRegistry {
    fn register_entities(
        &mut self,
        mut entities: Vec<ApexEntity>,
        update_before_add: bool,
    ) -> anyhow::Result<()> {
        if update_before_add {
            entities.iter_mut().for_each(ApexEntity::update);
        }
        tracing::info!("Registered {} entities", entities.len());
        self.entities.append(&mut entities);
        Ok(())
    }
}

/// Refreshes the coordinator from a status dump and updates every entity.
pub struct StatusPoller {
    status_path: PathBuf,
    coordinator: Coordinator,
    entities: Vec<ApexEntity>,
    poll_interval: Duration,
}

impl StatusPoller {
    pub fn new(
        status_path: PathBuf,
        coordinator: Coordinator,
        entities: Vec<ApexEntity>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            status_path,
            coordinator,
            entities,
            poll_interval,
        }
    }

    pub fn entities(&self) -> &[ApexEntity] {
        &self.entities
    }

    /// Spawns the poller on the runtime
    pub fn spawn(mut self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    /// Main polling loop, never returns
    pub async fn run(&mut self) {
        tracing::info!(
            "Starting status poller for {} every {:?}",
            self.status_path.display(),
            self.poll_interval
        );
        let mut poll_interval = interval(self.poll_interval);

        loop {
            poll_interval.tick().await;
            if let Err(e) = self.poll_once().await {
                // Entities keep showing the last payload until the next good read
                tracing::warn!("Status refresh failed: {e:#}");
            }
            self.update_entities();
        }
    }

    /// Fetches the payload once (with retry) and swaps it into the coordinator.
    pub async fn poll_once(&mut self) -> anyhow::Result<()> {
        let payload = self.read_status_with_retry().await?;
        self.coordinator.refresh(payload);
        Ok(())
    }

    /// Runs one update on every entity, logging what the host would see at debug level.
    pub fn update_entities(&mut self) {
        let log_states = tracing::enabled!(tracing::Level::DEBUG);
        for entity in &mut self.entities {
            entity.update();
            if !log_states {
                continue;
            }
            let snapshot = entity.snapshot();
            tracing::debug!(
                "{} = {} {}",
                snapshot.unique_id,
                snapshot.state.as_deref().unwrap_or("unknown"),
                snapshot.unit_of_measurement.unwrap_or_default()
            );
        }
    }

    async fn read_status_with_retry(&self) -> anyhow::Result<StatusPayload> {
        let mut attempt = 1;
        loop {
            match read_json_file(&self.status_path).await {
                Ok(payload) => return Ok(payload),
                Err(e) if attempt < MAX_RETRIES => {
                    tracing::debug!("Status read attempt {attempt} failed: {e:#}. Retrying...");
                    sleep(Duration::from_millis(200 * u64::from(attempt))).await;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(e.context(format!("All {MAX_RETRIES} attempts failed")));
                }
            }
        }
    }
}
