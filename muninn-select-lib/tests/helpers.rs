//! Shared test helpers for the selection integration tests.

use muninn_select_lib::{
    CfgIndex, DtClass, EpConfigKey, InitParams, LinearFunc, MemType, Op, ProtoCaps, ProtoInit,
    Protocol, SelectParam, ThreshConfig, Worker,
};

/// Protocol stub with fixed capabilities; accepts every selection.
pub struct StubProto {
    pub name: String,
    pub caps: ProtoCaps,
    pub priv_bytes: Vec<u8>,
}

impl StubProto {
    pub fn new(name: &str, caps: ProtoCaps) -> Self {
        Self {
            name: name.to_string(),
            caps,
            priv_bytes: Vec::new(),
        }
    }

    pub fn with_priv(mut self, bytes: &[u8]) -> Self {
        self.priv_bytes = bytes.to_vec();
        self
    }
}

impl Protocol for StubProto {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(&self, _params: &InitParams<'_>, priv_area: &mut [u8]) -> Option<ProtoInit> {
        priv_area[..self.priv_bytes.len()].copy_from_slice(&self.priv_bytes);
        Some(ProtoInit {
            priv_size: self.priv_bytes.len(),
            caps: self.caps.clone(),
        })
    }

    fn config_str(&self, priv_area: &[u8]) -> String {
        format!("priv:{}B", priv_area.len())
    }
}

/// Protocol that declines every selection.
pub struct DeclineProto;

impl Protocol for DeclineProto {
    fn name(&self) -> &str {
        "decline"
    }

    fn init(&self, _params: &InitParams<'_>, _priv_area: &mut [u8]) -> Option<ProtoInit> {
        None
    }

    fn config_str(&self, _priv_area: &[u8]) -> String {
        String::new()
    }
}

/// Worker with the given protocols registered and one endpoint config.
pub fn worker_with(protos: Vec<Box<dyn Protocol>>) -> (Worker, CfgIndex) {
    let mut worker = Worker::new();
    for proto in protos {
        worker.register_protocol(proto);
    }
    let ep_cfg_index = worker.add_ep_config(EpConfigKey {
        mtu: 8192,
        num_lanes: 1,
    });
    (worker, ep_cfg_index)
}

pub fn param() -> SelectParam {
    SelectParam {
        op: Op::AmSend,
        op_flags: 0,
        dt_class: DtClass::Contig,
        sg_count: 1,
        mem_type: MemType::Host,
    }
}

/// Capability with one open-ended range.
pub fn caps_single(min_length: usize, c: f64, m: f64, cfg_thresh: ThreshConfig) -> ProtoCaps {
    ProtoCaps::single(min_length, LinearFunc::new(c, m), cfg_thresh)
}
