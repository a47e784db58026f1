mod loader;
mod protocol;
mod root;

pub use loader::load_from_path;
pub use protocol::{ProtocolSpec, RangeSpec};
pub use root::{Config, EndpointSpec, RkeySpec, SelectionSpec};
