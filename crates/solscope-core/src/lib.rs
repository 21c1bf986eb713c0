//! # Solscope Core
//!
//! Data models and the analytical pipeline behind Solscope, the Solana wallet
//! analytics server for AI agents.
//!
//! The pipeline turns a raw list of on-chain wallet activities into
//! behavioral patterns, inferred DeFi positions and risk-profiled strategy
//! recommendations, then renders them as markdown reports.

pub mod error;
pub mod models;
pub mod patterns;
pub mod positions;
pub mod profile;
pub mod protocols;
pub mod report;
pub mod strategy;

pub use error::*;
pub use models::*;
pub use patterns::*;
pub use positions::*;
pub use profile::*;
pub use protocols::*;
pub use report::*;
pub use strategy::*;
