//! Low-level plumbing for the managed services: environment credentials,
//! request signing, and a thin signed HTTP client.
//!
//! The pipeline only issues the services' published API calls; everything
//! here exists so those calls can be made without a vendor SDK.

mod client;
mod credentials;
pub mod sigv4;

pub use client::{AwsClient, AwsError};
pub use credentials::Credentials;
