use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tracing::info;

/// Validation verdict recorded for one request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOutcome {
    pub pass: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<String>,
}

impl ValidationOutcome {
    #[must_use]
    pub const fn passed() -> Self {
        Self {
            pass: true,
            reasons: Vec::new(),
        }
    }

    #[must_use]
    pub fn failed(reasons: Vec<String>) -> Self {
        Self {
            pass: false,
            reasons,
        }
    }
}

/// One structured audit entry per proxied request.
///
/// Carries everything an external log consumer needs: operation name,
/// validation outcome, target call description, upstream status/kind,
/// latency, and final outcome. Emission goes through `tracing` on the
/// `audit` target, so the concrete sink stays a subscriber concern.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
    pub operation_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_outcome: Option<ValidationOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_error_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_outcome: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuditRecord {
    #[must_use]
    pub fn new(request_id: impl Into<String>, operation_type: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            timestamp: Utc::now(),
            operation_type: operation_type.into(),
            validation_outcome: None,
            provider: None,
            target: None,
            upstream_status_code: None,
            upstream_error_kind: None,
            latency_ms: None,
            final_outcome: None,
            error: None,
        }
    }

    #[must_use]
    pub fn validation(mut self, outcome: ValidationOutcome) -> Self {
        self.validation_outcome = Some(outcome);
        self
    }

    #[must_use]
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    #[must_use]
    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    #[must_use]
    pub fn upstream_status(mut self, status: Option<u16>) -> Self {
        self.upstream_status_code = status;
        self
    }

    #[must_use]
    pub fn upstream_kind(mut self, kind: impl Into<String>) -> Self {
        self.upstream_error_kind = Some(kind.into());
        self
    }

    #[must_use]
    pub fn latency_ms(mut self, latency_ms: f64) -> Self {
        // Two decimal places, matching the wire format log consumers expect.
        self.latency_ms = Some((latency_ms * 100.0).round() / 100.0);
        self
    }

    #[must_use]
    pub fn outcome(mut self, outcome: impl Into<String>) -> Self {
        self.final_outcome = Some(outcome.into());
        self
    }

    #[must_use]
    pub fn error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Emit this record as one JSON line on the `audit` tracing target.
    pub fn emit(&self) {
        match serde_json::to_string(self) {
            Ok(line) => info!(target: "audit", "{line}"),
            Err(e) => info!(
                target: "audit",
                request_id = %self.request_id,
                "failed to serialize audit record: {e}"
            ),
        }
    }

    /// RFC 3339 timestamp with a trailing `Z`, for tests and consumers
    /// that re-parse records.
    #[must_use]
    pub fn timestamp_rfc3339(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn record_serializes_with_camel_case_keys() {
        let record = AuditRecord::new("req-1", "ListLeagues")
            .validation(ValidationOutcome::passed())
            .provider("openliga")
            .upstream_status(Some(200))
            .latency_ms(12.3042)
            .outcome("success");

        let value: Value = serde_json::from_str(&serde_json::to_string(&record).unwrap()).unwrap();
        assert_eq!(value["requestId"], "req-1");
        assert_eq!(value["operationType"], "ListLeagues");
        assert_eq!(value["validationOutcome"]["pass"], true);
        assert_eq!(value["upstreamStatusCode"], 200);
        assert_eq!(value["latencyMs"], 12.3);
        assert_eq!(value["finalOutcome"], "success");
    }

    #[test]
    fn unset_fields_are_omitted_from_the_wire_format() {
        let record = AuditRecord::new("req-2", "GetTeam");
        let value: Value = serde_json::from_str(&serde_json::to_string(&record).unwrap()).unwrap();

        let obj = value.as_object().unwrap();
        assert!(!obj.contains_key("provider"));
        assert!(!obj.contains_key("error"));
        assert!(!obj.contains_key("latencyMs"));
        assert!(obj.contains_key("timestamp"));
    }

    #[test]
    fn failed_validation_carries_its_reasons() {
        let record = AuditRecord::new("req-3", "GetMatch").validation(ValidationOutcome::failed(
            vec!["missing required field matchId".to_string()],
        ));

        let value: Value = serde_json::from_str(&serde_json::to_string(&record).unwrap()).unwrap();
        assert_eq!(value["validationOutcome"]["pass"], false);
        assert_eq!(
            value["validationOutcome"]["reasons"][0],
            "missing required field matchId"
        );
    }

    #[test]
    fn timestamp_renders_with_utc_z_suffix() {
        let record = AuditRecord::new("req-4", "ListLeagues");
        assert!(record.timestamp_rfc3339().ends_with('Z'));
    }
}
