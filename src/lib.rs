pub mod audit;
pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod resilience;
pub mod server;

pub use audit::{AuditRecord, ValidationOutcome};
pub use client::{build_provider, ProviderKind, SportsProvider, TokenBucket, UpstreamError};
pub use config::Config;
pub use dispatcher::{Dispatcher, Operation, Payload, ValidationResult};
pub use error::{Error, Result};
pub use resilience::{run_with_retry, RetryConfig};
