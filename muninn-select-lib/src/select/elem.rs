//! The persistent per-parameter selection result.

use std::ops::Range;

use crate::select::init::InitProtocols;
use crate::select::param::SelectParam;
use crate::select::proto::ProtoId;
use crate::select::thresholds::ThreshTmpElem;

/// Selected protocol configuration carried by every threshold entry: enough
/// to dispatch a request without consulting the capability model again.
#[derive(Debug, Clone)]
pub struct ProtoConfig {
    /// Stable id of the selected protocol.
    pub proto_id: ProtoId,
    /// Copy of the originating selection parameters.
    pub select_param: SelectParam,
    priv_region: Range<usize>,
}

/// One entry of the threshold table: `proto_config` serves every message
/// length from the previous entry's bound (exclusive) up to
/// `max_msg_length` (inclusive).
#[derive(Debug, Clone)]
pub struct ThresholdElem {
    pub max_msg_length: usize,
    pub proto_config: ProtoConfig,
}

/// The persistent decision for one selection parameter tuple. Owns the
/// shared private-area buffer and the threshold array; created once by the
/// cache and never mutated.
#[derive(Debug)]
pub struct SelectElem {
    priv_buf: Box<[u8]>,
    thresholds: Box<[ThresholdElem]>,
}

impl SelectElem {
    /// Copy the temporary threshold list into an exact-length array and
    /// take ownership of the private buffer.
    pub(crate) fn assemble(
        proto_init: InitProtocols,
        list: Vec<ThreshTmpElem>,
        select_param: &SelectParam,
    ) -> SelectElem {
        assert!(!list.is_empty());
        assert_eq!(
            list[list.len() - 1].max_length,
            usize::MAX,
            "threshold list does not cover the full length domain"
        );

        let thresholds = list
            .iter()
            .map(|tmp| {
                let priv_region = proto_init.priv_regions[tmp.proto_id]
                    .clone()
                    .expect("private region recorded for every selected protocol");
                ThresholdElem {
                    max_msg_length: tmp.max_length,
                    proto_config: ProtoConfig {
                        proto_id: tmp.proto_id,
                        select_param: *select_param,
                        priv_region,
                    },
                }
            })
            .collect::<Vec<_>>()
            .into_boxed_slice();

        SelectElem {
            priv_buf: proto_init.priv_buf.into_boxed_slice(),
            thresholds,
        }
    }

    /// Threshold entries ordered by strictly increasing `max_msg_length`;
    /// the last entry always ends at `usize::MAX`.
    pub fn thresholds(&self) -> &[ThresholdElem] {
        &self.thresholds
    }

    /// The selection parameters this element was built for.
    pub fn select_param(&self) -> &SelectParam {
        &self.thresholds[0].proto_config.select_param
    }

    /// Find the threshold entry covering `msg_length`.
    ///
    /// The table is a handful of entries at most; a forward scan beats a
    /// binary search here.
    pub fn find(&self, msg_length: usize) -> &ThresholdElem {
        let mut idx = 0;
        while msg_length > self.thresholds[idx].max_msg_length {
            idx += 1;
        }
        &self.thresholds[idx]
    }

    /// The private region written during init by the protocol in `config`.
    pub fn priv_area(&self, config: &ProtoConfig) -> &[u8] {
        &self.priv_buf[config.priv_region.clone()]
    }
}
