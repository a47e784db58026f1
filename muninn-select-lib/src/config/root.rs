use serde::Deserialize;

use super::protocol::ProtocolSpec;
use crate::memunits;
use crate::select::param::{op_flags, DtClass, MemType, Op, SelectParam};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Protocol table: one entry per candidate transport protocol
    /// At least one protocol is required
    pub protocols: Vec<ProtocolSpec>,
    /// Endpoint profile the selections run against
    #[serde(default)]
    pub endpoint: EndpointSpec,
    /// Remote-key profile for rkey-dependent selections (optional)
    #[serde(default)]
    pub rkey: Option<RkeySpec>,
    /// Selections to evaluate and dump
    #[serde(default)]
    pub selections: Vec<SelectionSpec>,
}

/// Endpoint profile: the read-only facts protocols consult during init
#[derive(Debug, Deserialize, Clone)]
pub struct EndpointSpec {
    /// Largest fragment the endpoint's lanes can carry
    /// Accepts plain bytes or memunits strings ("8K")
    #[serde(default = "default_mtu", deserialize_with = "memunits::deserialize_size")]
    pub mtu: usize,
    /// Number of lanes available on the endpoint
    #[serde(default = "default_num_lanes")]
    pub num_lanes: u8,
}

impl Default for EndpointSpec {
    fn default() -> Self {
        Self {
            mtu: default_mtu(),
            num_lanes: default_num_lanes(),
        }
    }
}

/// Remote-key profile, always tied to the endpoint profile
#[derive(Debug, Deserialize, Clone)]
pub struct RkeySpec {
    /// Memory type of the remote region
    pub mem_type: MemType,
}

/// One selection parameter tuple to evaluate
#[derive(Debug, Deserialize, Clone)]
pub struct SelectionSpec {
    pub op: Op,
    #[serde(default)]
    pub dt_class: DtClass,
    #[serde(default = "default_sg_count")]
    pub sg_count: u8,
    #[serde(default)]
    pub mem_type: MemType,
    /// Request fast completion
    #[serde(default)]
    pub fast_cmpl: bool,
    /// Evaluate against the rkey profile
    #[serde(default)]
    pub use_rkey: bool,
}

impl SelectionSpec {
    pub fn to_param(&self) -> SelectParam {
        let mut flags = 0u8;
        if self.fast_cmpl {
            flags |= op_flags::FAST_CMPL;
        }
        SelectParam {
            op: self.op,
            op_flags: flags,
            dt_class: self.dt_class,
            sg_count: self.sg_count,
            mem_type: self.mem_type,
        }
    }
}

fn default_mtu() -> usize {
    8192
}

fn default_num_lanes() -> u8 {
    1
}

fn default_sg_count() -> u8 {
    1
}
