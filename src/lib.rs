//! schedview: read-only views over a GPU scheduler's cluster state
//!
//! A snapshot of nodes, queues and jobs goes in; a cluster summary, a queue
//! tree, a job listing and per-node GPU occupancy come out, either as JSON
//! over HTTP or as tables on the command line.

pub mod cli;
pub mod client;
pub mod config;
pub mod projection;
pub mod server;
pub mod snapshot;
