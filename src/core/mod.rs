//! Core modules: registry model, region splicing, projections and the
//! governance validators.

pub mod boundary;
pub mod config;
pub mod contract;
pub mod error;
pub mod governance;
pub mod jobdesc;
pub mod loader;
pub mod model;
pub mod output;
pub mod projection;
pub mod region;
pub mod validate;
pub mod wiring;
