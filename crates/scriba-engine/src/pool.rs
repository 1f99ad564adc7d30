//! Configuration-keyed engine pool.
//!
//! Replaces a lazily initialized singleton with an explicitly owned pool.
//! The policy is single-slot: at most one engine is resident, and asking
//! for a different configuration evicts the current one before building
//! the replacement. Concurrent jobs requesting different configurations
//! therefore serialize on the slot; this mirrors the one-model-in-VRAM
//! constraint of the underlying inference engine.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;

use crate::engine::{EngineConfig, SpeechEngine};
use crate::error::EngineResult;

/// Builds engines for the pool.
#[async_trait]
pub trait EngineFactory: Send + Sync {
    async fn build(&self, config: &EngineConfig) -> EngineResult<Arc<dyn SpeechEngine>>;
}

/// Single-slot engine cache keyed by configuration.
pub struct EnginePool {
    factory: Arc<dyn EngineFactory>,
    slot: Mutex<Option<(EngineConfig, Arc<dyn SpeechEngine>)>>,
}

impl EnginePool {
    pub fn new(factory: Arc<dyn EngineFactory>) -> Self {
        Self {
            factory,
            slot: Mutex::new(None),
        }
    }

    /// Get an engine for `config`, reusing the resident one when the
    /// configuration matches and rebuilding otherwise.
    pub async fn acquire(&self, config: &EngineConfig) -> EngineResult<Arc<dyn SpeechEngine>> {
        let mut slot = self.slot.lock().await;

        if let Some((resident, engine)) = slot.as_ref() {
            if resident == config {
                return Ok(Arc::clone(engine));
            }
            info!(from = %resident, to = %config, "evicting resident engine");
        }

        // Drop the old engine before building its replacement so both are
        // never resident at once.
        *slot = None;
        let engine = self.factory.build(config).await?;
        *slot = Some((config.clone(), Arc::clone(&engine)));
        Ok(engine)
    }

    /// Tear down the resident engine, if any.
    pub async fn evict(&self) {
        *self.slot.lock().await = None;
    }
}
