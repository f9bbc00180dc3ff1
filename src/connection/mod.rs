//! Connection descriptors and the live connection manager.

mod descriptor;
mod manager;

pub use descriptor::{redact_url, ConnectionDescriptor, DatabaseKind};
pub use manager::{
    ActiveConnection, ConnectOutcome, ConnectionManager, DEFAULT_SAMPLE_ROWS, NOT_CONNECTED,
};
