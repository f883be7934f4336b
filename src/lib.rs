//! Chains independently normalised trend windows into one calibrated series.
//!
//! Every poll fetches a fresh window whose values are rescaled to 0-100 by the
//! trend service. The overlap with the previously persisted generation yields
//! per-timestamp correction factors, and the corrected window is stored as the
//! next generation of the chain.
pub mod application;
pub mod domain;
pub mod infrastructure;
