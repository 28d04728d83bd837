//! Crate for resolving how a Kubernetes API client reaches its cluster
//!
//! This crate parses the `~/.kube/config` format, reads the service account
//! credentials mounted into pods, and picks between those sources (and a few
//! environment overrides) to produce a single [`Configuration`].
//!
//! # Example
//!
//! The following example will infer what environment you are in, and resolve
//! a [`Configuration`] based on this.
//!
//! ```rust,no_run
//! use kube_config::Configuration;
//!
//! fn main() -> Result<(), kube_config::Error> {
//!     let config = Configuration::infer()?;
//!     println!("talking to {}", config.current_context.cluster.server);
//!     Ok(())
//! }
//! ```
//!
//! While it's recommended to use [`Configuration::infer`], every source can also
//! be used on its own, see the [`config`] module.
#![deny(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;

#[doc(inline)] pub use config::{AuthInfo, Cluster, Configuration, Context, PathOrData};
#[doc(inline)] pub use error::Error;

/// Convient alias for `Result<T, Error>`
pub type Result<T, E = Error> = std::result::Result<T, E>;
