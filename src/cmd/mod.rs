//! Command module structure for the datree-validator CLI

pub mod config;
pub mod install;
pub mod validate;
