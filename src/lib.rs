//! Hoststrap: bootstrap a Debian system from the packages installed on the host.
//!
//! The pipeline is strictly sequential:
//!
//! 1. [`catalog`] loads the host dpkg database.
//! 2. [`resolver`] computes the closure of the essential packages plus extras.
//! 3. [`repository`] repackages that closure into a local apt repository
//!    inside a [`scratch`] directory.
//! 4. [`bootstrap`] runs debootstrap against it.

pub mod bootstrap;
pub mod catalog;
pub mod commands;
pub mod config;
pub mod error;
pub mod preflight;
pub mod process;
pub mod repository;
pub mod resolver;
pub mod scratch;
pub mod target;
pub mod timing;

pub use error::{Error, Result};
