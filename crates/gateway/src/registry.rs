//! Service registration
//!
//! Registration with the discovery service is fire-and-forget: a failure is
//! logged and ignored, since discovery is not on the adoption or chat
//! critical path.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use thiserror::Error;

/// Registration failure
#[derive(Debug, Error)]
#[error("Registration failed: {0}")]
pub struct RegistryError(pub String);

/// Service discovery client
#[async_trait]
pub trait ServiceRegistry: Send + Sync {
    async fn register(&self, service_name: &str, service_url: &str) -> Result<(), RegistryError>;
}

/// In-process registry for tests and the local demo
#[derive(Default)]
pub struct LocalServiceRegistry {
    services: Mutex<HashMap<String, String>>,
}

impl LocalServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, service_name: &str) -> Option<String> {
        self.services.lock().get(service_name).cloned()
    }
}

#[async_trait]
impl ServiceRegistry for LocalServiceRegistry {
    async fn register(&self, service_name: &str, service_url: &str) -> Result<(), RegistryError> {
        self.services
            .lock()
            .insert(service_name.to_string(), service_url.to_string());
        Ok(())
    }
}

/// Register a service, logging and swallowing any failure
pub async fn register_service(registry: &dyn ServiceRegistry, name: &str, url: &str) {
    if let Err(err) = registry.register(name, url).await {
        tracing::warn!(service = name, %err, "failed to register service");
    }
}
