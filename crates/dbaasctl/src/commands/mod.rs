//! Command implementations for dbaasctl

pub mod catalog;
pub mod cleanup;
pub mod profile;
pub mod progress;
pub mod run;
