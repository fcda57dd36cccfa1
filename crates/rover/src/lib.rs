//! Umbrella crate that re-exports the `rover-*` building blocks.
//!
//! `core` holds the action contract and per-robot queue, `compound` the sequential, parallel and
//! retry combinators, `drive` the planner-backed drive actions, and `tools` completion sinks
//! and logging setup.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

#[cfg(feature = "core")]
#[cfg_attr(docsrs, doc(cfg(feature = "core")))]
pub use rover_core as core;

#[cfg(feature = "compound")]
#[cfg_attr(docsrs, doc(cfg(feature = "compound")))]
pub use rover_compound as compound;

#[cfg(feature = "drive")]
#[cfg_attr(docsrs, doc(cfg(feature = "drive")))]
pub use rover_drive as drive;

#[cfg(feature = "tools")]
#[cfg_attr(docsrs, doc(cfg(feature = "tools")))]
pub use rover_tools as tools;
