//! Copying files to, from and between hosts

mod endpoint;
mod engine;
mod report;

pub use endpoint::{CopyPlan, Endpoint, RemotePath};
pub use engine::TransferEngine;
pub use report::{HostOutcome, TransferReport};
