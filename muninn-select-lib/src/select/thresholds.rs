//! Envelope construction: assign a best-cost protocol to every message
//! length in `[0, usize::MAX]`.
//!
//! The outer walk advances over windows in which the candidate set and each
//! candidate's linear cost function are constant; inside a window the lower
//! envelope of the candidate curves decides ownership.

use tracing::{trace, warn};

use crate::error::{Result, SelectError};
use crate::memunits;
use crate::perf::LinearFunc;
use crate::select::caps::{ProtoCaps, ThreshConfig};
use crate::select::param::SelectParam;
use crate::select::proto::{mask_bit, mask_iter, ProtoId, ProtoMask, PROTO_MAX_COUNT};

/// Two curves meeting exactly at an integer boundary tie there; evaluating
/// half a byte to the right picks the one that owns the next sub-range.
const MSGLEN_EPSILON: f64 = 0.5;

/// Temporary threshold tuple produced while building a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ThreshTmpElem {
    pub max_length: usize,
    pub proto_id: ProtoId,
}

/// Append `(max_length, proto_id)`, consolidating with the previous entry
/// when the protocol repeats.
fn thresholds_append(list: &mut Vec<ThreshTmpElem>, max_length: usize, proto_id: ProtoId) {
    if let Some(last) = list.last_mut() {
        assert!(
            max_length > last.max_length,
            "max_length={} last.max_length={}",
            max_length,
            last.max_length
        );
        if last.proto_id == proto_id {
            last.max_length = max_length;
            return;
        }
    }
    list.push(ThreshTmpElem {
        max_length,
        proto_id,
    });
}

/// Best-protocol envelope over `[start, end]`, where every candidate in
/// `mask` has the constant linear cost `perf[id]`.
fn select_best(
    mask: ProtoMask,
    perf: &[Option<LinearFunc>],
    list: &mut Vec<ThreshTmpElem>,
    mut start: usize,
    end: usize,
) {
    trace!(
        range = %memunits::range_str(start, end),
        candidates = mask.count_ones(),
        "selecting best protocol"
    );

    loop {
        debug_assert!(mask != 0);

        // Best candidate just right of 'start'; ties break to the lowest id.
        let mut best_id = ProtoId::MAX;
        let mut best_result = f64::MAX;
        for id in mask_iter(mask) {
            let Some(func) = perf[id] else { continue };
            let result = func.apply(start as f64 + MSGLEN_EPSILON);
            if result < best_result {
                best_result = result;
                best_id = id;
            }
        }
        assert!(best_id != ProtoId::MAX);
        let best_perf = perf[best_id].unwrap_or(LinearFunc::new(0.0, 0.0));

        // First point after 'start' where another candidate crosses below
        // the best one. Intersections at or before 'start' mean the best
        // candidate stays ahead through 'end'; intersections past the
        // representable range are no crossing at all.
        let mut midpoint = end;
        for id in mask_iter(mask & !mask_bit(best_id)) {
            let Some(func) = perf[id] else { continue };
            match func.intersect(&best_perf) {
                Some(x) if x > start as f64 && x < usize::MAX as f64 => {
                    midpoint = midpoint.min(x as usize);
                    trace!(proto_id = id, x, midpoint, "crossing inside window");
                }
                _ => {}
            }
        }

        thresholds_append(list, midpoint, best_id);

        if midpoint >= end {
            break;
        }
        start = midpoint + 1;
    }
}

/// Extend the threshold list over the window starting at `msg_length`.
///
/// Returns the last message length of the window, or `None` when no valid
/// protocol covers `msg_length`.
fn select_next(
    mask: ProtoMask,
    caps: &[Option<ProtoCaps>],
    list: &mut Vec<ThreshTmpElem>,
    msg_length: usize,
) -> Option<usize> {
    let mut perf: Vec<Option<LinearFunc>> = vec![None; caps.len()];
    let mut valid_mask: ProtoMask = 0;
    let mut forced_mask: ProtoMask = 0;
    let mut max_length = usize::MAX;

    // Collect the protocols valid at 'msg_length'. The window narrows at
    // every piecewise boundary, every not-yet-active min_length, and every
    // not-yet-reached configured threshold.
    for proto_id in mask_iter(mask) {
        let caps = caps[proto_id]
            .as_ref()
            .expect("capability recorded for every masked protocol");

        if msg_length < caps.min_length {
            trace!(
                proto_id,
                min_length = caps.min_length,
                msg_length,
                "protocol not active yet"
            );
            max_length = max_length.min(caps.min_length - 1);
            continue;
        }

        // First (and only) range containing 'msg_length'
        for range in &caps.ranges {
            if msg_length <= range.max_length {
                valid_mask |= mask_bit(proto_id);
                perf[proto_id] = Some(range.perf);
                max_length = max_length.min(range.max_length);
                break;
            }
        }

        match caps.cfg_thresh {
            ThreshConfig::Auto => {}
            ThreshConfig::Inf => {
                // disabled for all lengths
                valid_mask &= !mask_bit(proto_id);
            }
            ThreshConfig::Bytes(thresh) if thresh <= msg_length => {
                // force-activated on 'msg_length' and above
                forced_mask |= mask_bit(proto_id);
            }
            ThreshConfig::Bytes(thresh) => {
                // disabled up to 'thresh' - 1
                max_length = max_length.min(thresh - 1);
                valid_mask &= !mask_bit(proto_id);
            }
        }
    }
    assert!(
        msg_length <= max_length,
        "msg_length={msg_length} max_length={max_length}"
    );

    if valid_mask == 0 {
        return None;
    }

    // A user-forced protocol suppresses the cost comparison
    let forced_mask = forced_mask & valid_mask;
    if forced_mask != 0 {
        valid_mask = forced_mask;
    }

    select_best(valid_mask, &perf, list, msg_length, max_length);
    Some(max_length)
}

/// Build the full threshold list for `mask`/`caps`, covering every message
/// length up to `usize::MAX`.
pub(crate) fn build_thresholds(
    mask: ProtoMask,
    caps: &[Option<ProtoCaps>],
    select_param: &SelectParam,
) -> Result<Vec<ThreshTmpElem>> {
    let mut list = Vec::with_capacity(PROTO_MAX_COUNT);
    let mut msg_length = 0usize;
    loop {
        let Some(max_length) = select_next(mask, caps, &mut list, msg_length) else {
            warn!(param = %select_param, msg_length, "no protocol for message length");
            return Err(SelectError::Unsupported {
                param: select_param.to_string(),
                msg_length,
            });
        };
        if max_length == usize::MAX {
            break;
        }
        msg_length = max_length + 1;
    }

    assert!(!list.is_empty());
    Ok(list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::select::caps::ProtoRange;
    use crate::select::param::{DtClass, MemType, Op};

    fn param() -> SelectParam {
        SelectParam {
            op: Op::AmSend,
            op_flags: 0,
            dt_class: DtClass::Contig,
            sg_count: 1,
            mem_type: MemType::Host,
        }
    }

    fn single(min_length: usize, c: f64, m: f64, cfg_thresh: ThreshConfig) -> Option<ProtoCaps> {
        Some(ProtoCaps::single(
            min_length,
            LinearFunc::new(c, m),
            cfg_thresh,
        ))
    }

    fn tuples(list: &[ThreshTmpElem]) -> Vec<(usize, ProtoId)> {
        list.iter().map(|e| (e.max_length, e.proto_id)).collect()
    }

    #[test]
    fn append_consolidates_repeated_protocol() {
        let mut list = Vec::new();
        thresholds_append(&mut list, 100, 0);
        thresholds_append(&mut list, 200, 0);
        thresholds_append(&mut list, 300, 1);
        assert_eq!(tuples(&list), vec![(200, 0), (300, 1)]);
    }

    #[test]
    #[should_panic(expected = "max_length")]
    fn append_rejects_non_increasing_max_length() {
        let mut list = Vec::new();
        thresholds_append(&mut list, 100, 0);
        thresholds_append(&mut list, 100, 1);
    }

    #[test]
    fn select_best_splits_at_crossover() {
        let perf = vec![
            Some(LinearFunc::new(0.0, 10.0)),
            Some(LinearFunc::new(1000.0, 1.0)),
        ];
        let mut list = Vec::new();
        select_best(0b11, &perf, &mut list, 0, usize::MAX);
        assert_eq!(tuples(&list), vec![(111, 0), (usize::MAX, 1)]);
    }

    #[test]
    fn select_best_breaks_ties_to_lowest_id() {
        let perf = vec![
            Some(LinearFunc::new(5.0, 1.0)),
            Some(LinearFunc::new(5.0, 1.0)),
        ];
        let mut list = Vec::new();
        select_best(0b11, &perf, &mut list, 0, usize::MAX);
        assert_eq!(tuples(&list), vec![(usize::MAX, 0)]);
    }

    #[test]
    fn window_ends_before_inactive_protocol_activates() {
        let caps = vec![
            single(0, 0.0, 1.0, ThreshConfig::Auto),
            single(2048, 0.0, 0.5, ThreshConfig::Auto),
        ];
        let mut list = Vec::new();
        let max = select_next(0b11, &caps, &mut list, 0).unwrap();
        assert_eq!(max, 2047);
        assert_eq!(tuples(&list), vec![(2047, 0)]);
    }

    #[test]
    fn configured_threshold_defers_protocol_activation() {
        let caps = vec![
            single(0, 0.0, 10.0, ThreshConfig::Auto),
            single(0, 1000.0, 1.0, ThreshConfig::Bytes(50)),
        ];
        let mut list = Vec::new();
        // below the threshold only protocol 0 is valid
        let max = select_next(0b11, &caps, &mut list, 0).unwrap();
        assert_eq!(max, 49);
        assert_eq!(tuples(&list), vec![(49, 0)]);
        // at the threshold protocol 1 is forced despite its worse cost
        let max = select_next(0b11, &caps, &mut list, 50).unwrap();
        assert_eq!(max, usize::MAX);
        assert_eq!(tuples(&list), vec![(49, 0), (usize::MAX, 1)]);
    }

    #[test]
    fn disabled_protocol_never_selected() {
        let caps = vec![
            single(0, 100.0, 1.0, ThreshConfig::Auto),
            single(0, 0.0, 0.0, ThreshConfig::Inf),
        ];
        let list = build_thresholds(0b11, &caps, &param()).unwrap();
        assert_eq!(tuples(&list), vec![(usize::MAX, 0)]);
    }

    #[test]
    fn no_valid_protocol_is_unsupported() {
        // both protocols start above length 0
        let caps = vec![
            single(100, 0.0, 1.0, ThreshConfig::Auto),
            single(200, 0.0, 1.0, ThreshConfig::Auto),
        ];
        let err = build_thresholds(0b11, &caps, &param()).unwrap_err();
        assert!(matches!(
            err,
            SelectError::Unsupported { msg_length: 0, .. }
        ));
    }

    #[test]
    fn piecewise_ranges_split_windows() {
        let caps = vec![
            Some(ProtoCaps {
                min_length: 0,
                cfg_thresh: ThreshConfig::Auto,
                ranges: vec![
                    ProtoRange {
                        max_length: 1024,
                        perf: LinearFunc::new(0.0, 1.0),
                    },
                    ProtoRange {
                        max_length: usize::MAX,
                        perf: LinearFunc::new(0.0, 10.0),
                    },
                ],
            }),
            single(2048, 5000.0, 0.5, ThreshConfig::Auto),
        ];
        let list = build_thresholds(0b11, &caps, &param()).unwrap();
        assert_eq!(tuples(&list), vec![(2047, 0), (usize::MAX, 1)]);
    }
}
