//! CLI command implementations

pub mod compare;
pub mod doctor;
pub mod list;
pub mod run;
