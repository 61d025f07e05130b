#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Configuration options
pub mod config;

/// Content entities, drafts and patches
pub mod content;

/// Error (common error types)
pub mod error;

/// Content identifiers
pub mod id;

/// Media ingestion (validate, downsample, encode as data URL)
pub mod media;

/// Publish (shape drafts into site JSON and push them to a remote)
pub mod publish;

/// Remote repository client (read hash, conditional write, access check)
pub mod remote;

/// Key-value storage port and backends
pub mod storage;

/// Local content store (collections over the key-value area)
pub mod store;

#[cfg(test)]
pub(crate) mod test_utils;
