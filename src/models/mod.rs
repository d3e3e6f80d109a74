pub mod job;
pub mod provider;
pub mod search;

pub use job::{Job, Salary};
pub use provider::{Capability, ProviderDescriptor};
pub use search::{JobSearchQuery, JobSearchResult};
