//! Human-readable dump of cached selections: the chosen threshold tables
//! and the candidate protocols they were built from. Diagnostic only; never
//! mutates the cache.

use std::io::{self, Write};

use crate::memunits;
use crate::select::cache::SelectCache;
use crate::select::elem::SelectElem;
use crate::select::init;
use crate::select::param::SelectParam;
use crate::select::proto::mask_iter;
use crate::worker::{CfgIndex, Worker};

const MIB: f64 = (1 << 20) as f64;

/// Dump every cached selection for one ep/rkey configuration pair.
pub fn dump(
    worker: &Worker,
    ep_cfg_index: CfgIndex,
    rkey_cfg_index: Option<CfgIndex>,
    cache: &SelectCache,
    out: &mut dyn Write,
) -> io::Result<()> {
    let rkey_str = match rkey_cfg_index {
        Some(index) => index.to_string(),
        None => "none".to_string(),
    };
    writeln!(out, "#")?;
    writeln!(
        out,
        "# Protocol selection for ep_config[{}]/rkey_config[{}] ({} items)",
        ep_cfg_index,
        rkey_str,
        cache.len()
    )?;
    writeln!(out, "#")?;
    for elem in cache.iter() {
        dump_elem(worker, ep_cfg_index, rkey_cfg_index, elem, out)?;
    }
    Ok(())
}

fn dump_elem(
    worker: &Worker,
    ep_cfg_index: CfgIndex,
    rkey_cfg_index: Option<CfgIndex>,
    elem: &SelectElem,
    out: &mut dyn Write,
) -> io::Result<()> {
    let param = elem.select_param();
    let title = param.to_string();

    writeln!(out, "#")?;
    writeln!(out, "# {title}:")?;
    writeln!(out, "# {}", "=".repeat(title.len() + 1))?;
    writeln!(out, "#")?;

    writeln!(out, "#   Selected protocols:")?;
    dump_thresholds(worker, elem, out)?;
    writeln!(out, "#")?;

    writeln!(out, "#   Candidates:")?;
    dump_candidates(worker, ep_cfg_index, rkey_cfg_index, param, out)
}

fn dump_thresholds(worker: &Worker, elem: &SelectElem, out: &mut dyn Write) -> io::Result<()> {
    writeln!(
        out,
        "#     {:<16} {:<18} {}",
        "SIZE", "PROTOCOL", "CONFIGURATION"
    )?;

    let mut range_start = 0usize;
    for thresh_elem in elem.thresholds() {
        let config = &thresh_elem.proto_config;
        let proto = worker.proto(config.proto_id);
        writeln!(
            out,
            "#     {:<16} {:<18} {}",
            memunits::range_str(range_start, thresh_elem.max_msg_length),
            proto.name(),
            proto.config_str(elem.priv_area(config))
        )?;
        range_start = thresh_elem.max_msg_length.wrapping_add(1);
    }
    Ok(())
}

/// Re-initialize the candidates for `param` and print their capability
/// table. Runs against a fresh private buffer so cached state stays intact.
fn dump_candidates(
    worker: &Worker,
    ep_cfg_index: CfgIndex,
    rkey_cfg_index: Option<CfgIndex>,
    param: &SelectParam,
    out: &mut dyn Write,
) -> io::Result<()> {
    let proto_init = match init::init_protocols(worker, ep_cfg_index, rkey_cfg_index, param) {
        Ok(proto_init) => proto_init,
        Err(err) => {
            return writeln!(out, "#     <{err}>");
        }
    };

    writeln!(
        out,
        "#     {:<18} {:<12} {:<20} {:<18} {:<12} {}",
        "PROTOCOL", "SIZE", "TIME (nsec)", "BANDWIDTH (MiB/s)", "THRESHOLD", "CONFIGURATION"
    )?;

    for proto_id in mask_iter(proto_init.mask()) {
        let Some(caps) = proto_init.caps(proto_id) else {
            continue;
        };
        let proto = worker.proto(proto_id);
        let config = proto.config_str(proto_init.priv_area(proto_id).unwrap_or(&[]));
        let thresh = caps.cfg_thresh.to_string();

        let mut range_start = caps.min_length;
        for (i, range) in caps.ranges.iter().enumerate() {
            let perf_str = format!(
                "{:5.0} + {:.3} * N",
                range.perf.c * 1e9,
                range.perf.m * 1e9
            );
            let bw_str = format!("{:7.2}", 1.0 / (range.perf.m * MIB));
            writeln!(
                out,
                "#     {:<18} {:<12} {:<20} {:<18} {:<12} {}",
                if i == 0 { proto.name() } else { "" },
                memunits::range_str(range_start, range.max_length),
                perf_str,
                bw_str,
                if i == 0 { thresh.as_str() } else { "" },
                if i == 0 { config.as_str() } else { "" }
            )?;
            range_start = range.max_length.wrapping_add(1);
        }
    }
    writeln!(out, "#")
}
