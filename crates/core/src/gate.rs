use crate::{DeviceFingerprint, KeyValueStore, StorageKeys, StoreError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GateError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("participation log is not valid json: {0}")]
    Log(#[from] serde_json::Error),
}

/// One completed play.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParticipationRecord {
    pub name: String,
    pub amount: u64,
    pub time: DateTime<Utc>,
    #[serde(rename = "deviceId")]
    pub device_id: DeviceFingerprint,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Eligibility {
    Eligible,
    Blocked,
}

impl Eligibility {
    pub fn is_blocked(self) -> bool {
        matches!(self, Self::Blocked)
    }
}

/// Trims a prompted name, falling back to the placeholder when nothing usable
/// was entered.
pub fn display_name(raw: Option<String>, placeholder: &str) -> String {
    raw.map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| placeholder.to_string())
}

/// One-play-per-device gate and the participation log, over a key/value store.
#[derive(Debug, Clone)]
pub struct ParticipationGate {
    device: DeviceFingerprint,
    keys: StorageKeys,
}

impl ParticipationGate {
    pub fn new(device: DeviceFingerprint, keys: StorageKeys) -> Self {
        Self { device, keys }
    }

    pub fn device(&self) -> &DeviceFingerprint {
        &self.device
    }

    /// Fails open: an unreadable store never blocks play.
    pub fn check(&self, store: &dyn KeyValueStore) -> Eligibility {
        match store.get(self.device.as_str()) {
            Ok(Some(value)) if value == self.keys.played_marker => Eligibility::Blocked,
            Ok(_) => Eligibility::Eligible,
            Err(err) => {
                tracing::warn!(device = %self.device, "gate check failed open: {}", err);
                Eligibility::Eligible
            }
        }
    }

    pub fn mark_played(&self, store: &mut dyn KeyValueStore) {
        if let Err(err) = store.set(self.device.as_str(), &self.keys.played_marker) {
            tracing::warn!(device = %self.device, "could not mark device as played: {}", err);
        }
    }

    pub fn record(&self, name: String, amount: u64, time: DateTime<Utc>) -> ParticipationRecord {
        ParticipationRecord {
            name,
            amount,
            time,
            device_id: self.device.clone(),
        }
    }

    /// Best effort: the record is dropped when the store fails.
    pub fn append(&self, store: &mut dyn KeyValueStore, record: &ParticipationRecord) {
        if let Err(err) = self.try_append(store, record) {
            tracing::warn!(device = %self.device, "dropped participation record: {}", err);
        }
    }

    fn try_append(
        &self,
        store: &mut dyn KeyValueStore,
        record: &ParticipationRecord,
    ) -> Result<(), GateError> {
        let mut log = read_log(store, &self.keys)?;
        log.push(record.clone());
        let body = serde_json::to_string(&log)?;
        store.set(&self.keys.log_key, &body)?;
        Ok(())
    }
}

pub fn read_log(
    store: &dyn KeyValueStore,
    keys: &StorageKeys,
) -> Result<Vec<ParticipationRecord>, GateError> {
    match store.get(&keys.log_key)? {
        Some(body) if !body.trim().is_empty() => Ok(serde_json::from_str(&body)?),
        _ => Ok(Vec::new()),
    }
}
