//! Table-driven protocol: a [`Protocol`] backed by a configuration entry.
//!
//! The engine core never instantiates concrete transports; this adapter
//! turns one [`ProtocolSpec`] from the protocol table into a candidate the
//! engine can probe, letting the CLI and the integration tests drive the
//! full selection path from a TOML file.

use crate::config::ProtocolSpec;
use crate::memunits;
use crate::perf::LinearFunc;
use crate::select::caps::{ProtoCaps, ProtoRange};
use crate::select::proto::{InitParams, ProtoInit, Protocol};

/// Private record layout: fragment size (u64 le), lane count, flag byte.
pub(crate) const TABLE_PRIV_SIZE: usize = 10;

const FLAG_ZCOPY: u8 = 1 << 0;

const NSEC_PER_SEC: f64 = 1e9;

pub struct TableProto {
    spec: ProtocolSpec,
}

impl TableProto {
    pub fn new(spec: ProtocolSpec) -> Self {
        Self { spec }
    }

    fn caps(&self) -> ProtoCaps {
        ProtoCaps {
            min_length: self.spec.min_length,
            cfg_thresh: self.spec.threshold,
            ranges: self
                .spec
                .ranges
                .iter()
                .map(|range| ProtoRange {
                    max_length: range.max_length,
                    perf: LinearFunc::new(
                        range.overhead_ns / NSEC_PER_SEC,
                        range.per_byte_ns / NSEC_PER_SEC,
                    ),
                })
                .collect(),
        }
    }
}

impl Protocol for TableProto {
    fn name(&self) -> &str {
        &self.spec.name
    }

    fn init(&self, params: &InitParams<'_>, priv_area: &mut [u8]) -> Option<ProtoInit> {
        let spec = &self.spec;
        let param = params.select_param;

        // An empty accept-list means "everything"
        if !spec.ops.is_empty() && !spec.ops.contains(&param.op) {
            return None;
        }
        if !spec.mem_types.is_empty() && !spec.mem_types.contains(&param.mem_type) {
            return None;
        }
        if let Some(rkey) = params.rkey_config {
            if !spec.mem_types.is_empty() && !spec.mem_types.contains(&rkey.mem_type) {
                return None;
            }
        }

        let frag_size = spec.frag_size.min(params.ep_config.mtu) as u64;
        let flags = if spec.zcopy { FLAG_ZCOPY } else { 0 };
        priv_area[0..8].copy_from_slice(&frag_size.to_le_bytes());
        priv_area[8] = params.ep_config.num_lanes;
        priv_area[9] = flags;

        Some(ProtoInit {
            priv_size: TABLE_PRIV_SIZE,
            caps: self.caps(),
        })
    }

    fn config_str(&self, priv_area: &[u8]) -> String {
        let Some(frag_bytes) = priv_area.get(0..8) else {
            return String::new();
        };
        let frag_size = u64::from_le_bytes(frag_bytes.try_into().unwrap_or([0u8; 8]));
        let num_lanes = priv_area.get(8).copied().unwrap_or(0);
        let flags = priv_area.get(9).copied().unwrap_or(0);
        format!(
            "frag:{} lanes:{}{}",
            memunits::to_str(frag_size as usize),
            num_lanes,
            if flags & FLAG_ZCOPY != 0 { " zcopy" } else { "" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RangeSpec;
    use crate::select::caps::ThreshConfig;
    use crate::select::param::{DtClass, MemType, Op, SelectParam};
    use crate::select::proto::PROTO_PRIV_MAX;
    use crate::worker::{EpConfigKey, RkeyConfigKey};

    fn spec() -> ProtocolSpec {
        ProtocolSpec {
            name: "eager".to_string(),
            ops: vec![Op::AmSend],
            mem_types: vec![MemType::Host],
            min_length: 0,
            frag_size: 64 << 10,
            zcopy: true,
            threshold: ThreshConfig::Auto,
            ranges: vec![RangeSpec {
                max_length: usize::MAX,
                overhead_ns: 100.0,
                per_byte_ns: 0.5,
            }],
        }
    }

    fn param(op: Op, mem_type: MemType) -> SelectParam {
        SelectParam {
            op,
            op_flags: 0,
            dt_class: DtClass::Contig,
            sg_count: 1,
            mem_type,
        }
    }

    fn init_with(
        proto: &TableProto,
        param: &SelectParam,
        rkey_config: Option<&RkeyConfigKey>,
    ) -> Option<(ProtoInit, Vec<u8>)> {
        let ep_config = EpConfigKey {
            mtu: 8192,
            num_lanes: 2,
        };
        let mut priv_area = vec![0u8; PROTO_PRIV_MAX];
        let init = proto.init(
            &InitParams {
                select_param: param,
                ep_config: &ep_config,
                rkey_config,
                proto_name: proto.name(),
            },
            &mut priv_area,
        )?;
        priv_area.truncate(init.priv_size);
        Some((init, priv_area))
    }

    #[test]
    fn accepts_matching_selection_and_converts_caps() {
        let proto = TableProto::new(spec());
        let (init, _) = init_with(&proto, &param(Op::AmSend, MemType::Host), None).unwrap();
        assert_eq!(init.priv_size, TABLE_PRIV_SIZE);
        assert_eq!(init.caps.ranges.len(), 1);
        let perf = init.caps.ranges[0].perf;
        assert!((perf.c - 100.0e-9).abs() < 1e-15);
        assert!((perf.m - 0.5e-9).abs() < 1e-15);
    }

    #[test]
    fn declines_unsupported_op_and_mem_type() {
        let proto = TableProto::new(spec());
        assert!(init_with(&proto, &param(Op::Put, MemType::Host), None).is_none());
        assert!(init_with(&proto, &param(Op::AmSend, MemType::Device), None).is_none());
    }

    #[test]
    fn declines_rkey_memory_outside_accepted_set() {
        let proto = TableProto::new(spec());
        let local = param(Op::AmSend, MemType::Host);
        let remote_device = RkeyConfigKey {
            ep_cfg_index: 0,
            mem_type: MemType::Device,
        };
        assert!(init_with(&proto, &local, Some(&remote_device)).is_none());

        // a matching remote memory type still passes
        let remote_host = RkeyConfigKey {
            ep_cfg_index: 0,
            mem_type: MemType::Host,
        };
        assert!(init_with(&proto, &local, Some(&remote_host)).is_some());
    }

    #[test]
    fn private_record_round_trips_through_config_str() {
        let proto = TableProto::new(spec());
        let (_, priv_area) = init_with(&proto, &param(Op::AmSend, MemType::Host), None).unwrap();
        // frag_size clamped by the endpoint mtu
        assert_eq!(proto.config_str(&priv_area), "frag:8K lanes:2 zcopy");
    }

    #[test]
    fn config_str_tolerates_short_private_area() {
        let proto = TableProto::new(spec());
        assert_eq!(proto.config_str(&[]), "");
    }
}
