//! Challenge handling modules.
//!
//! Leaf-first: detectors decide whether a challenge is up, the widget module
//! resolves where its controls live, interaction clicks them like a human,
//! readiness confirms the page settled, and the solvers orchestrate the lot.

pub mod detectors;
pub mod interaction;
pub mod readiness;
pub mod solvers;
pub mod widget;
