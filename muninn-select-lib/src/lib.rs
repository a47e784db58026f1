#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod memunits;
pub mod perf;
pub mod select;
pub mod table;
pub mod worker;

pub use config::{load_from_path, Config};
pub use error::{Result, SelectError};
pub use perf::LinearFunc;
pub use select::cache::SelectCache;
pub use select::caps::{ProtoCaps, ProtoRange, ThreshConfig};
pub use select::elem::{ProtoConfig, SelectElem, ThresholdElem};
pub use select::param::{DtClass, MemType, Op, SelectParam};
pub use select::proto::{InitParams, ProtoId, ProtoInit, Protocol, PROTO_PRIV_MAX};
pub use table::TableProto;
pub use worker::{CfgIndex, EpConfigKey, RkeyConfigKey, Worker};
