//! Life timer: elapsed calendar age for up to five people, refreshed on an
//! e-paper style screen after syncing wall-clock time from a web time API.

pub mod error;
pub mod models;
pub mod services;
pub mod utils;
