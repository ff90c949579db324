//! Protocol → adapter registry.

use dashmap::DashMap;
use std::sync::Arc;

use crate::bridges::adapter::BridgeAdapter;
use crate::bridges::types::{BridgeError, BridgeProtocol, BridgeResult};

#[derive(Default)]
pub struct BridgeRegistry {
    adapters: DashMap<BridgeProtocol, Arc<dyn BridgeAdapter>>,
}

impl BridgeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `adapter` under its protocol. The first registration wins.
    pub fn register(&self, adapter: Arc<dyn BridgeAdapter>) {
        let protocol = adapter.protocol();
        self.adapters.entry(protocol).or_insert_with(|| {
            tracing::debug!(protocol = %protocol, "Registered bridge adapter");
            adapter
        });
    }

    pub fn get(&self, protocol: BridgeProtocol) -> BridgeResult<Arc<dyn BridgeAdapter>> {
        self.adapters
            .get(&protocol)
            .map(|entry| entry.value().clone())
            .ok_or(BridgeError::NotRegistered(protocol))
    }

    /// Every adapter, ordered by protocol.
    pub fn all(&self) -> Vec<Arc<dyn BridgeAdapter>> {
        let mut adapters: Vec<_> = self
            .adapters
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        adapters.sort_by_key(|(protocol, _)| *protocol);
        adapters.into_iter().map(|(_, adapter)| adapter).collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    pub fn clear(&self) {
        self.adapters.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridges::types::{Quote, TransactionCallback, TransferRequest};
    use crate::lifecycle::Subscription;
    use crate::teleport::types::TeleportParams;
    use async_trait::async_trait;

    struct NamedAdapter(&'static str);

    #[async_trait]
    impl BridgeAdapter for NamedAdapter {
        fn protocol(&self) -> BridgeProtocol {
            BridgeProtocol::Xcm
        }

        async fn get_quote(&self, _params: &TeleportParams) -> BridgeResult<Option<Quote>> {
            Err(BridgeError::Build(self.0.to_string()))
        }

        async fn transfer(&self, _request: &TransferRequest, _callback: TransactionCallback) -> BridgeResult<Subscription> {
            Ok(Subscription::noop())
        }
    }

    #[test]
    fn test_unregistered_protocol_errors() {
        let registry = BridgeRegistry::new();
        assert_eq!(
            registry.get(BridgeProtocol::Xcm).err().map(|e| e.to_string()),
            Some("Bridge adapter not registered: XCM".to_string())
        );
    }

    #[tokio::test]
    async fn test_register_is_idempotent() {
        let registry = BridgeRegistry::new();
        registry.register(Arc::new(NamedAdapter("first")));
        registry.register(Arc::new(NamedAdapter("second")));

        assert_eq!(registry.len(), 1);

        let params = TeleportParams {
            address: "a".into(),
            destination: crate::chains::Chain::Polkadot,
            amount: alloy::primitives::U256::from(1),
            asset: crate::chains::Asset::Dot,
            teleport_mode: Default::default(),
        };
        let adapter = registry.get(BridgeProtocol::Xcm).unwrap();
        assert_eq!(
            adapter.get_quote(&params).await.unwrap_err(),
            BridgeError::Build("first".into())
        );
    }
}
