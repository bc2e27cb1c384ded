pub mod openliga;
pub mod traits;

pub use openliga::OpenLigaProvider;
pub use traits::{SportsProvider, UpstreamError};

use crate::config::ProviderConfig;
use crate::{Error, Result};
use std::str::FromStr;
use std::sync::Arc;

/// Fixed enumeration of supported upstream providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenLiga,
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "openliga" => Ok(Self::OpenLiga),
            other => Err(Error::InvalidConfig {
                field: "provider.name".to_string(),
                reason: format!("unknown provider '{other}', available: openliga"),
            }),
        }
    }
}

/// Build the configured provider. Unknown names fail here, at startup,
/// never at dispatch time.
pub fn build_provider(config: &ProviderConfig) -> Result<Arc<dyn SportsProvider>> {
    match config.name.parse::<ProviderKind>()? {
        ProviderKind::OpenLiga => Ok(Arc::new(OpenLigaProvider::new(config)?)),
    }
}
