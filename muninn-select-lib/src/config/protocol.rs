use serde::Deserialize;

use crate::memunits;
use crate::select::caps::ThreshConfig;
use crate::select::param::{MemType, Op};

/// One protocol table entry
#[derive(Debug, Deserialize, Clone)]
pub struct ProtocolSpec {
    /// Display name; must be unique within the table
    pub name: String,
    /// Operations the protocol accepts; empty means all
    #[serde(default)]
    pub ops: Vec<Op>,
    /// Memory types the protocol accepts; empty means all
    #[serde(default)]
    pub mem_types: Vec<MemType>,
    /// Smallest supported message length, bytes
    #[serde(default, deserialize_with = "memunits::deserialize_size")]
    pub min_length: usize,
    /// Preferred fragment size; clamped by the endpoint MTU at init
    #[serde(
        default = "default_frag_size",
        deserialize_with = "memunits::deserialize_size"
    )]
    pub frag_size: usize,
    /// Send from registered memory without bounce buffers
    #[serde(default)]
    pub zcopy: bool,
    /// User threshold: "auto", "inf", or a byte count
    #[serde(default)]
    pub threshold: ThreshConfig,
    /// Piecewise cost model, ordered by strictly increasing max_length
    /// The last range should end at "inf" unless the protocol truly caps
    pub ranges: Vec<RangeSpec>,
}

/// One piecewise-linear segment of a protocol's cost model
#[derive(Debug, Deserialize, Clone)]
pub struct RangeSpec {
    /// Largest message length of the segment; "inf" for open-ended
    #[serde(deserialize_with = "memunits::deserialize_size")]
    pub max_length: usize,
    /// Constant cost term, nanoseconds
    pub overhead_ns: f64,
    /// Per-byte cost, nanoseconds
    pub per_byte_ns: f64,
}

fn default_frag_size() -> usize {
    8192
}
