//! Data models: tracked jobs and the fixed-schema result document.

mod job;
mod result;

pub use job::{JobRecord, JobStatus};
pub use result::{DocumentMetadata, KeyValuePair, ResultDocument, Table, TextLine};
