//! Candidate initialization: probe every registered protocol for one
//! selection parameter tuple.

use std::ops::Range;

use tracing::debug;

use crate::error::{Result, SelectError};
use crate::select::caps::ProtoCaps;
use crate::select::param::SelectParam;
use crate::select::proto::{mask_bit, InitParams, ProtoId, ProtoMask, PROTO_PRIV_MAX};
use crate::worker::{CfgIndex, Worker};

/// Transient result of probing the protocol table: the accepted subset,
/// their capabilities, and the shared private-area buffer.
pub struct InitProtocols {
    pub(crate) mask: ProtoMask,
    pub(crate) caps: Vec<Option<ProtoCaps>>,
    pub(crate) priv_buf: Vec<u8>,
    pub(crate) priv_regions: Vec<Option<Range<usize>>>,
}

impl InitProtocols {
    pub fn mask(&self) -> ProtoMask {
        self.mask
    }

    pub fn caps(&self, id: ProtoId) -> Option<&ProtoCaps> {
        self.caps.get(id).and_then(|c| c.as_ref())
    }

    pub(crate) fn caps_all(&self) -> &[Option<ProtoCaps>] {
        &self.caps
    }

    /// Private region written by protocol `id` during init, if it accepted.
    pub fn priv_area(&self, id: ProtoId) -> Option<&[u8]> {
        let region = self.priv_regions.get(id)?.clone()?;
        Some(&self.priv_buf[region])
    }
}

/// Call every registered protocol's `init` in stable id order, collecting
/// the subset that accepted `select_param`.
///
/// Each accepted protocol fills a region of the shared private buffer; the
/// buffer is sized for the worst case up front and shrunk to fit afterwards.
pub fn init_protocols(
    worker: &Worker,
    ep_cfg_index: CfgIndex,
    rkey_cfg_index: Option<CfgIndex>,
    select_param: &SelectParam,
) -> Result<InitProtocols> {
    let ep_config = worker.ep_config(ep_cfg_index);
    let rkey_config = rkey_cfg_index.map(|index| {
        let key = worker.rkey_config(index);
        // rkey configuration must be for the same ep
        assert_eq!(
            key.ep_cfg_index, ep_cfg_index,
            "rkey config {index} does not belong to ep config {ep_cfg_index}"
        );
        key
    });

    let count = worker.protocols_count();
    let mut mask: ProtoMask = 0;
    let mut caps: Vec<Option<ProtoCaps>> = vec![None; count];
    let mut priv_regions: Vec<Option<Range<usize>>> = vec![None; count];
    let mut priv_buf = vec![0u8; count * PROTO_PRIV_MAX];

    let mut offset = 0;
    for proto_id in 0..count {
        let proto = worker.proto(proto_id);
        let params = InitParams {
            select_param,
            ep_config,
            rkey_config,
            proto_name: proto.name(),
        };
        let area = &mut priv_buf[offset..offset + PROTO_PRIV_MAX];
        let Some(init) = proto.init(&params, area) else {
            continue;
        };
        assert!(
            init.priv_size <= PROTO_PRIV_MAX,
            "protocol {} overflowed its private region: {} > {PROTO_PRIV_MAX}",
            proto.name(),
            init.priv_size
        );
        debug_assert!(
            init.caps
                .ranges
                .windows(2)
                .all(|w| w[0].max_length < w[1].max_length),
            "protocol {} reported non-increasing ranges",
            proto.name()
        );
        mask |= mask_bit(proto_id);
        priv_regions[proto_id] = Some(offset..offset + init.priv_size);
        caps[proto_id] = Some(init.caps);
        offset += init.priv_size;
    }

    if mask == 0 {
        // No protocol can support the given selection parameters
        debug!(param = %select_param, "no protocols found");
        return Err(SelectError::NoProtocols);
    }

    priv_buf.truncate(offset);
    priv_buf.shrink_to_fit();

    Ok(InitProtocols {
        mask,
        caps,
        priv_buf,
        priv_regions,
    })
}
