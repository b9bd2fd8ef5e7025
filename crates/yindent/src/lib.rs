//! yindent library interface for integration tests

#![allow(clippy::needless_pass_by_value)]

pub mod cli;
mod config;
mod files;
pub mod fix;
pub mod init;
pub mod lint;
mod output;
mod regime;
