//! docbatch - batch PDF document-analysis pipeline driver.
//!
//! Sequences the managed-service calls needed to analyze large sets of PDF
//! documents: organizing files into batches, provisioning per-batch buckets,
//! submitting analysis jobs, consuming completion notifications, and turning
//! raw analysis output into fixed-schema result documents.

pub mod analysis;
pub mod aws;
pub mod cli;
pub mod config;
pub mod models;
pub mod notify;
pub mod pipeline;
pub mod storage;
pub mod tracking;
