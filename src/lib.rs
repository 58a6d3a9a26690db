//! Glory convergence plot library
//!
//! Renders the synchronous/asynchronous convergence chart from the hub-weight
//! simulation results. Used by the `glory_plot` binary.

pub mod config;
pub mod pipeline;
pub mod report;
