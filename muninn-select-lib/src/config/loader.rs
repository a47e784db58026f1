use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::config::Config;
use crate::error::{Result, SelectError};

pub fn load_from_path<P: AsRef<Path>>(p: P) -> Result<Config> {
    let txt = fs::read_to_string(p)?;
    let cfg: Config = toml::from_str(&txt)
        .map_err(|e| SelectError::Config(format!("Failed to parse config: {e}")))?;

    validate_config(&cfg)?;

    Ok(cfg)
}

fn validate_config(cfg: &Config) -> Result<()> {
    if cfg.protocols.is_empty() {
        return Err(SelectError::Config("protocol table is empty".to_string()));
    }

    let mut names: HashSet<&str> = HashSet::new();
    for proto in &cfg.protocols {
        if !names.insert(proto.name.as_str()) {
            return Err(SelectError::Config(format!(
                "duplicate protocol name: {}",
                proto.name
            )));
        }

        if proto.ranges.is_empty() {
            return Err(SelectError::Config(format!(
                "protocol {} has no cost ranges",
                proto.name
            )));
        }
        for pair in proto.ranges.windows(2) {
            if pair[0].max_length >= pair[1].max_length {
                return Err(SelectError::Config(format!(
                    "protocol {} ranges are not strictly increasing",
                    proto.name
                )));
            }
        }
        for range in &proto.ranges {
            if range.overhead_ns < 0.0 || range.per_byte_ns < 0.0 {
                return Err(SelectError::Config(format!(
                    "protocol {} has a negative cost term",
                    proto.name
                )));
            }
        }

        let last_max = proto.ranges[proto.ranges.len() - 1].max_length;
        if proto.min_length > last_max {
            return Err(SelectError::Config(format!(
                "protocol {} min_length exceeds its last range",
                proto.name
            )));
        }
    }

    if cfg.rkey.is_none() {
        for sel in &cfg.selections {
            if sel.use_rkey {
                return Err(SelectError::Config(
                    "selection uses rkey but no rkey profile is configured".to_string(),
                ));
            }
        }
    }

    Ok(())
}
