//! Protocol capability reports: applicability and piecewise cost model.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};

use crate::memunits;
use crate::perf::LinearFunc;

/// User-configured threshold policy for one protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThreshConfig {
    /// No override; the engine chooses by cost.
    #[default]
    Auto,
    /// Protocol disabled for all lengths.
    Inf,
    /// Disabled below `N` bytes, forced-preferred at `N` and above.
    Bytes(usize),
}

impl fmt::Display for ThreshConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThreshConfig::Auto => f.write_str("auto"),
            ThreshConfig::Inf => f.write_str("inf"),
            ThreshConfig::Bytes(n) => f.write_str(&memunits::to_str(*n)),
        }
    }
}

struct ThreshVisitor;

impl Visitor<'_> for ThreshVisitor {
    type Value = ThreshConfig;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("\"auto\", \"inf\", or a byte count")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<ThreshConfig, E> {
        let n = usize::try_from(v).map_err(|_| E::custom(format!("negative threshold: {v}")))?;
        Ok(ThreshConfig::Bytes(n))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<ThreshConfig, E> {
        let n = usize::try_from(v).map_err(|_| E::custom(format!("threshold out of range: {v}")))?;
        Ok(ThreshConfig::Bytes(n))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<ThreshConfig, E> {
        if v.eq_ignore_ascii_case("auto") {
            return Ok(ThreshConfig::Auto);
        }
        match memunits::parse(v) {
            Some(usize::MAX) => Ok(ThreshConfig::Inf),
            Some(n) => Ok(ThreshConfig::Bytes(n)),
            None => Err(E::custom(format!("invalid threshold: {v:?}"))),
        }
    }
}

impl<'de> Deserialize<'de> for ThreshConfig {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        d.deserialize_any(ThreshVisitor)
    }
}

/// One piecewise-linear segment of a protocol's cost model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProtoRange {
    /// Largest message length covered by this segment, inclusive.
    pub max_length: usize,
    /// Estimated cost over the segment.
    pub perf: LinearFunc,
}

/// A protocol's self-reported applicability for one selection.
///
/// `ranges` is ordered by strictly increasing `max_length`; the last segment
/// ends at `usize::MAX` unless the protocol truly caps at a smaller size.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtoCaps {
    /// Smallest supported message length, inclusive.
    pub min_length: usize,
    /// User threshold policy applied on top of the cost model.
    pub cfg_thresh: ThreshConfig,
    pub ranges: Vec<ProtoRange>,
}

impl ProtoCaps {
    /// Capability with a single segment covering `[min_length, usize::MAX]`.
    pub fn single(min_length: usize, perf: LinearFunc, cfg_thresh: ThreshConfig) -> Self {
        Self {
            min_length,
            cfg_thresh,
            ranges: vec![ProtoRange { max_length: usize::MAX, perf }],
        }
    }
}
