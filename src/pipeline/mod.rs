//! Orchestration services, one per pipeline stage.
//!
//! The stages talk to the storage, analysis, tracking, and notify seams only
//! through their traits, so each service can be exercised against in-memory
//! stand-ins.

pub mod download;
pub mod export;
pub mod organize;
pub mod provision;
pub mod recover;
pub mod results;
pub mod status;
pub mod submit;
