//! Worker-scoped context: the protocol registry and the read-only
//! endpoint / remote-key configuration stores.
//!
//! The engine runs single-threaded per worker; callers serialize access.

use crate::select::param::MemType;
use crate::select::proto::{ProtoId, Protocol, PROTO_MAX_COUNT};

/// Index into the worker's endpoint or rkey configuration store.
pub type CfgIndex = u8;

/// Resolved endpoint configuration key. Read-only for the engine; protocols
/// consult it during init.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpConfigKey {
    /// Largest fragment the endpoint's lanes can carry.
    pub mtu: usize,
    /// Number of lanes available on the endpoint.
    pub num_lanes: u8,
}

/// Remote-key configuration key; always tied to one endpoint configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RkeyConfigKey {
    pub ep_cfg_index: CfgIndex,
    /// Memory type of the remote region.
    pub mem_type: MemType,
}

/// One worker's selection context.
pub struct Worker {
    protocols: Vec<Box<dyn Protocol>>,
    ep_configs: Vec<EpConfigKey>,
    rkey_configs: Vec<RkeyConfigKey>,
}

impl Worker {
    pub fn new() -> Self {
        Self {
            protocols: Vec::new(),
            ep_configs: Vec::new(),
            rkey_configs: Vec::new(),
        }
    }

    /// Register a protocol; ids are assigned in registration order and stay
    /// stable for the worker's lifetime.
    pub fn register_protocol(&mut self, proto: Box<dyn Protocol>) -> ProtoId {
        assert!(
            self.protocols.len() < PROTO_MAX_COUNT,
            "protocol table full ({PROTO_MAX_COUNT} entries)"
        );
        self.protocols.push(proto);
        self.protocols.len() - 1
    }

    pub fn add_ep_config(&mut self, key: EpConfigKey) -> CfgIndex {
        let index = self.ep_configs.len();
        assert!(index < CfgIndex::MAX as usize, "endpoint config store full");
        self.ep_configs.push(key);
        index as CfgIndex
    }

    /// Add an rkey configuration; it must reference an existing endpoint
    /// configuration.
    pub fn add_rkey_config(&mut self, key: RkeyConfigKey) -> CfgIndex {
        assert!(
            (key.ep_cfg_index as usize) < self.ep_configs.len(),
            "rkey config references unknown ep config {}",
            key.ep_cfg_index
        );
        let index = self.rkey_configs.len();
        assert!(index < CfgIndex::MAX as usize, "rkey config store full");
        self.rkey_configs.push(key);
        index as CfgIndex
    }

    pub fn protocols_count(&self) -> usize {
        self.protocols.len()
    }

    pub fn proto(&self, id: ProtoId) -> &dyn Protocol {
        self.protocols[id].as_ref()
    }

    pub fn ep_config(&self, index: CfgIndex) -> &EpConfigKey {
        &self.ep_configs[index as usize]
    }

    pub fn rkey_config(&self, index: CfgIndex) -> &RkeyConfigKey {
        &self.rkey_configs[index as usize]
    }
}

impl Default for Worker {
    fn default() -> Self {
        Self::new()
    }
}
