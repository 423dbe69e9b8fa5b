use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use filedepot_types::Status;

use crate::call::ServerCall;

/// Trait implemented by RPC service handlers.
///
/// Each service is identified by a numeric `service_id` and exposes methods
/// identified by `method_id`. The handler receives the request body plus a
/// `ServerCall` for streaming access to the connection, and must send its
/// terminal frame (a reply or a stream end) before returning `Ok`. A
/// returned `Status` is delivered to the client as an error frame by the
/// server.
#[async_trait]
pub trait ServiceHandler: Send + Sync {
    /// Unique numeric identifier for this service.
    fn service_id(&self) -> u16;

    /// Human-readable name (used for logging / diagnostics).
    fn service_name(&self) -> &str;

    /// Dispatch a method call.
    async fn handle(
        &self,
        method_id: u16,
        request: Bytes,
        call: &mut ServerCall<'_>,
    ) -> Result<(), Status>;
}

/// Registry mapping service IDs to their handlers.
pub struct ServiceRegistry {
    services: DashMap<u16, Box<dyn ServiceHandler>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self {
            services: DashMap::new(),
        }
    }

    /// Register a service handler. Replaces any previously registered handler
    /// with the same service ID.
    pub fn register(&self, service: Box<dyn ServiceHandler>) {
        let id = service.service_id();
        self.services.insert(id, service);
    }

    /// Look up a service by its ID.
    pub fn get(
        &self,
        service_id: u16,
    ) -> Option<dashmap::mapref::one::Ref<'_, u16, Box<dyn ServiceHandler>>> {
        self.services.get(&service_id)
    }

    /// Remove a service by its ID.
    pub fn unregister(&self, service_id: u16) -> bool {
        self.services.remove(&service_id).is_some()
    }

    /// Return the number of registered services.
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Return whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
