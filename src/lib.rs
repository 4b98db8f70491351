//! Drydock: a dashboard service for a fleet of local projects.
//!
//! Each project under the configured root gets a build / compose-up /
//! compose-down lifecycle driven by a periodic scheduler, with a JSON API
//! as the boundary. See `DESIGN.md` for the component map.

pub mod exec;
pub mod fleet_config;
pub mod lifecycle;
pub mod registry;
pub mod runtime;
pub mod server;
pub mod settings;
pub mod view;
