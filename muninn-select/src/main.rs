#![forbid(unsafe_code)]

use std::path::PathBuf;

use clap::Parser;
use muninn_select_lib::config::load_from_path;
use muninn_select_lib::select::dump;
use muninn_select_lib::{
    EpConfigKey, Result, RkeyConfigKey, SelectCache, SelectError, TableProto, Worker,
};
use serde::Serialize;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Protocol selection inspector for the muninn runtime")]
struct Cli {
    /// Path to the protocol table TOML file
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "demos/config/basic.toml"
    )]
    config: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: Format,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum Format {
    Text,
    Json,
}

#[derive(Serialize)]
struct SelectionReport {
    param: String,
    thresholds: Vec<ThresholdReport>,
}

#[derive(Serialize)]
struct ThresholdReport {
    size: String,
    protocol: String,
    config: String,
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        error!(%err, "selection dump failed");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let cfg = load_from_path(&cli.config)?;
    info!(
        protocols = cfg.protocols.len(),
        selections = cfg.selections.len(),
        "configuration loaded"
    );

    let mut worker = Worker::new();
    for spec in &cfg.protocols {
        worker.register_protocol(Box::new(TableProto::new(spec.clone())));
    }
    let ep_cfg_index = worker.add_ep_config(EpConfigKey {
        mtu: cfg.endpoint.mtu,
        num_lanes: cfg.endpoint.num_lanes,
    });
    let rkey_cfg_index = cfg.rkey.as_ref().map(|rkey| {
        worker.add_rkey_config(RkeyConfigKey {
            ep_cfg_index,
            mem_type: rkey.mem_type,
        })
    });

    let mut cache = SelectCache::new();
    for sel in &cfg.selections {
        let param = sel.to_param();
        let rkey = if sel.use_rkey { rkey_cfg_index } else { None };
        if let Err(err) = cache.fast_lookup(&worker, ep_cfg_index, rkey, &param) {
            warn!(%err, param = %param, "selection failed");
        }
    }

    match cli.format {
        Format::Text => {
            let stdout = std::io::stdout();
            dump::dump(
                &worker,
                ep_cfg_index,
                rkey_cfg_index,
                &cache,
                &mut stdout.lock(),
            )?;
        }
        Format::Json => {
            let reports = build_reports(&worker, &cache);
            let rendered = serde_json::to_string_pretty(&reports)
                .map_err(|e| SelectError::Config(format!("Failed to render JSON: {e}")))?;
            println!("{rendered}");
        }
    }

    Ok(())
}

fn build_reports(worker: &Worker, cache: &SelectCache) -> Vec<SelectionReport> {
    cache
        .iter()
        .map(|elem| {
            let mut range_start = 0usize;
            let thresholds = elem
                .thresholds()
                .iter()
                .map(|thresh_elem| {
                    let config = &thresh_elem.proto_config;
                    let proto = worker.proto(config.proto_id);
                    let report = ThresholdReport {
                        size: muninn_select_lib::memunits::range_str(
                            range_start,
                            thresh_elem.max_msg_length,
                        ),
                        protocol: proto.name().to_string(),
                        config: proto.config_str(elem.priv_area(config)),
                    };
                    range_start = thresh_elem.max_msg_length.wrapping_add(1);
                    report
                })
                .collect();
            SelectionReport {
                param: elem.select_param().to_string(),
                thresholds,
            }
        })
        .collect()
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}
