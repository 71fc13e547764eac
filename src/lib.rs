//! Aureo Meteor — meteor-shower viewing-conditions engine.
//!
//! Combines a coarse lunar model, a weather snapshot, and a tiered
//! meteor-shower data pipeline into viewing scores, recommendations,
//! and alerts, served over a CLI and a small JSON API.

pub mod astro;
pub mod recommend;
pub mod scheduler;
pub mod score;
pub mod server;
pub mod showers;
pub mod store;
pub mod weather;
