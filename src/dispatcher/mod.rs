pub mod operations;

use crate::client::providers::{SportsProvider, UpstreamError};
use crate::client::rate_limiter::TokenBucket;
use crate::resilience::{run_with_retry, RetryConfig};
use crate::{Error, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Structurally untyped request payload; each operation's validator decides
/// which keys it requires.
pub type Payload = serde_json::Map<String, Value>;

/// Outcome of payload validation. Missing fields are reported in the order
/// the validator discovered them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Pass,
    Fail { missing_fields: Vec<String> },
}

/// One registered operation: validation, execution against the provider,
/// and normalization of the raw result. Registered once at startup and
/// read-only afterwards.
#[async_trait]
pub trait Operation: Send + Sync {
    fn name(&self) -> &'static str;

    /// Required payload fields, in reporting order.
    fn required_fields(&self) -> &'static [&'static str] {
        &[]
    }

    /// Presence-only check: a field counts as missing when absent, `null`,
    /// or an empty string. No type coercion happens here.
    fn validate(&self, payload: &Payload) -> ValidationResult {
        let missing: Vec<String> = self
            .required_fields()
            .iter()
            .filter(|field| !field_present(payload, field))
            .map(|field| (*field).to_string())
            .collect();

        if missing.is_empty() {
            ValidationResult::Pass
        } else {
            ValidationResult::Fail {
                missing_fields: missing,
            }
        }
    }

    /// One provider call. Retry and rate limiting are layered on by the
    /// dispatcher; implementations stay single-shot.
    async fn execute(
        &self,
        provider: &dyn SportsProvider,
        payload: &Payload,
    ) -> std::result::Result<Value, UpstreamError>;

    /// Pure function from raw provider data to this operation's stable
    /// output shape. Must accept any raw shape the adapter can legally
    /// return.
    fn normalize(&self, raw: Value) -> Value;
}

fn field_present(payload: &Payload, field: &str) -> bool {
    match payload.get(field) {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

/// Read a payload field as a string. Validation has already confirmed
/// presence; non-string scalars are stringified the way upstream ids
/// commonly need.
pub(crate) fn string_field(payload: &Payload, field: &str) -> String {
    match payload.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

pub(crate) fn optional_string_field(payload: &Payload, field: &str) -> Option<String> {
    field_present(payload, field).then(|| string_field(payload, field))
}

/// Maps operation names to their validate/execute/normalize triple and
/// drives each request through the shared rate limiter and retry executor.
pub struct Dispatcher {
    registry: HashMap<&'static str, Box<dyn Operation>>,
    provider: Arc<dyn SportsProvider>,
    limiter: Arc<TokenBucket>,
    retry: RetryConfig,
}

impl Dispatcher {
    /// Build the dispatcher with the standard operation registry.
    #[must_use]
    pub fn new(
        provider: Arc<dyn SportsProvider>,
        limiter: Arc<TokenBucket>,
        retry: RetryConfig,
    ) -> Self {
        let mut registry: HashMap<&'static str, Box<dyn Operation>> = HashMap::new();
        for op in operations::all() {
            registry.insert(op.name(), op);
        }

        Self {
            registry,
            provider,
            limiter,
            retry,
        }
    }

    /// Registered operation names, for diagnostics.
    pub fn operation_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.registry.keys().copied()
    }

    /// Provider identifier, for audit records.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Execute one operation end to end.
    ///
    /// Unknown names and validation failures short-circuit before any
    /// upstream contact: no retry, no rate-limiter contention. Lookup is
    /// exact-match and case-sensitive.
    pub async fn dispatch(&self, operation_name: &str, payload: &Payload) -> Result<Value> {
        let op = self
            .registry
            .get(operation_name)
            .ok_or_else(|| Error::UnknownOperation {
                operation: operation_name.to_string(),
            })?;

        if let ValidationResult::Fail { missing_fields } = op.validate(payload) {
            debug!(operation = operation_name, ?missing_fields, "validation failed");
            return Err(Error::Validation { missing_fields });
        }

        let raw = run_with_retry(&self.limiter, &self.retry, op.name(), || {
            op.execute(self.provider.as_ref(), payload)
        })
        .await
        .map_err(|err| match err {
            // A malformed upstream body is an adapter contract violation,
            // not something the caller can act on.
            Error::Upstream {
                source: UpstreamError::Decode(message),
                ..
            } => Error::Internal(format!("provider returned malformed data: {message}")),
            other => other,
        })?;

        Ok(op.normalize(raw))
    }
}
