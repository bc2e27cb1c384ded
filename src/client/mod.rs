pub mod providers;
pub mod rate_limiter;

pub use providers::{build_provider, OpenLigaProvider, ProviderKind, SportsProvider, UpstreamError};
pub use rate_limiter::TokenBucket;
