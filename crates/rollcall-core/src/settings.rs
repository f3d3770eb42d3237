//! Live configuration snapshots.
//!
//! Operator commands never mutate a config in place. Each change builds a new
//! [`Config`] and publishes it as a fresh `Arc`; the sync driver picks up the
//! latest snapshot at the start of every tick.

use std::sync::Arc;
use tokio::sync::watch;

use crate::config::Config;
use crate::error::{Result, RollcallError};

#[derive(Clone, Debug)]
pub struct SettingsStore {
    tx: Arc<watch::Sender<Arc<Config>>>,
}

impl SettingsStore {
    pub fn new(config: Config) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(config));
        SettingsStore { tx: Arc::new(tx) }
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<Config> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Config>> {
        self.tx.subscribe()
    }

    /// Apply `change` to a copy of the current config and publish it.
    ///
    /// If `change` fails, nothing is published and the error is returned.
    pub fn update<R>(&self, change: impl FnOnce(&mut Config) -> Result<R>) -> Result<R> {
        let mut outcome = None;
        self.tx.send_if_modified(|current| {
            let mut next = Config::clone(current);
            match change(&mut next) {
                Ok(value) => {
                    *current = Arc::new(next);
                    outcome = Some(Ok(value));
                    true
                }
                Err(err) => {
                    outcome = Some(Err(err));
                    false
                }
            }
        });
        outcome.unwrap_or_else(|| {
            Err(RollcallError::InvalidConfig(
                "settings update was not applied".to_string(),
            ))
        })
    }
}
