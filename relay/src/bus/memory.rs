//! In-memory bus used by handler tests.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{BusError, MessageBus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behaviour {
    Ok,
    Fail,
    Hang,
}

/// Records every publish; can be told to fail or to never answer.
pub struct MemoryBus {
    behaviour: Behaviour,
    published: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemoryBus {
    pub fn new(behaviour: Behaviour) -> Self {
        Self {
            behaviour,
            published: Mutex::new(Vec::new()),
        }
    }

    pub fn published(&self) -> Vec<(String, Vec<u8>)> {
        self.published.lock().unwrap().clone()
    }

    async fn respond(&self) -> Result<(), BusError> {
        match self.behaviour {
            Behaviour::Ok => Ok(()),
            Behaviour::Fail => Err(BusError::Redis(redis::RedisError::from((
                redis::ErrorKind::IoError,
                "connection refused",
            )))),
            Behaviour::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            }
        }
    }
}

#[async_trait]
impl MessageBus for MemoryBus {
    async fn publish(&self, channel: &str, payload: &[u8]) -> Result<u64, BusError> {
        self.published
            .lock()
            .unwrap()
            .push((channel.to_string(), payload.to_vec()));
        self.respond().await?;
        Ok(1)
    }

    async fn ping(&self) -> Result<(), BusError> {
        self.respond().await
    }
}
