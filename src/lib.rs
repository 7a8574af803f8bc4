//! Sales analytics dashboard core.
//!
//! `data` holds the load → filter → aggregate pipeline, `config` the
//! dashboard settings and `state` the UI-independent application state the
//! desktop front end drives.

pub mod config;
pub mod data;
pub mod state;
