use super::traits::{SportsProvider, UpstreamError};
use crate::config::ProviderConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

/// Leagues scanned when a fetch-by-id operation arrives without a league
/// hint. OpenLigaDB has no direct team/match lookup endpoint, so those
/// operations list match data and filter client-side.
const SCAN_LEAGUES: [&str; 5] = ["bl1", "bl2", "pl", "sa", "ll"];

/// Reference adapter for the OpenLigaDB API.
///
/// Single-shot by design: no retry and no throttling in here. The retry
/// executor owns backoff and the shared token bucket owns pacing; this type
/// only shapes requests and returns raw, provider-shaped JSON.
pub struct OpenLigaProvider {
    client: Client,
    base_url: Url,
}

impl OpenLigaProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| Error::InvalidConfig {
            field: "provider.base_url".to_string(),
            reason: e.to_string(),
        })?;

        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .gzip(true)
            .build()
            .map_err(|e| Error::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, base_url })
    }

    async fn get_json(&self, path: &str) -> std::result::Result<Value, UpstreamError> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| UpstreamError::Decode(format!("invalid request path {path}: {e}")))?;
        debug!(%url, "openliga request");

        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Http {
                status: status.as_u16(),
                message: preview(&message),
            });
        }

        // OpenLigaDB occasionally serves HTML landing pages with status 200.
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();
        if content_type.contains("text/html") {
            return Err(UpstreamError::Decode(format!(
                "upstream returned HTML instead of JSON (content-type: {content_type})"
            )));
        }

        let body = response.text().await.map_err(classify_reqwest_error)?;
        if body.trim().is_empty() {
            return Err(UpstreamError::Decode("empty response body".to_string()));
        }

        serde_json::from_str(&body).map_err(|e| {
            UpstreamError::Decode(format!(
                "invalid JSON ({e}); body preview: {}",
                preview(&body)
            ))
        })
    }

    /// Scan the matches of `leagues` for a predicate hit, returning the
    /// extracted value for the first match. League listings that fail are
    /// noted and the scan moves on; if every league fails, the last error
    /// propagates instead of a not-found.
    async fn scan_leagues<F>(
        &self,
        leagues: &[&str],
        mut extract: F,
    ) -> std::result::Result<Option<Value>, UpstreamError>
    where
        F: FnMut(&Value) -> Option<Value>,
    {
        let mut last_error: Option<UpstreamError> = None;
        let mut any_succeeded = false;

        for league in leagues {
            let matches = match self.league_matches(league).await {
                Ok(value) => value,
                Err(err) => {
                    warn!(league, error = %err, "league scan step failed, continuing");
                    last_error = Some(err);
                    continue;
                }
            };
            any_succeeded = true;

            if let Some(items) = matches.as_array() {
                for item in items {
                    if let Some(found) = extract(item) {
                        return Ok(Some(found));
                    }
                }
            }
        }

        match (any_succeeded, last_error) {
            (false, Some(err)) => Err(err),
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl SportsProvider for OpenLigaProvider {
    fn name(&self) -> &'static str {
        "openliga"
    }

    async fn list_leagues(&self) -> std::result::Result<Value, UpstreamError> {
        self.get_json("/getavailableleagues").await
    }

    async fn league_matches(&self, league_id: &str) -> std::result::Result<Value, UpstreamError> {
        self.get_json(&format!("/getmatchdata/{league_id}")).await
    }

    async fn team_by_id(
        &self,
        team_id: &str,
        league_hint: Option<&str>,
    ) -> std::result::Result<Value, UpstreamError> {
        let leagues: Vec<&str> = match league_hint {
            Some(league) => vec![league],
            None => SCAN_LEAGUES.to_vec(),
        };

        let found = self
            .scan_leagues(&leagues, |m| extract_team(m, team_id))
            .await?;
        found.ok_or_else(|| UpstreamError::not_found("team", team_id))
    }

    async fn match_by_id(
        &self,
        match_id: &str,
        league_hint: Option<&str>,
    ) -> std::result::Result<Value, UpstreamError> {
        // Unscoped match lookup scans only the default league; callers who
        // know the league should pass the hint to avoid a miss.
        let leagues = [league_hint.unwrap_or(SCAN_LEAGUES[0])];

        let found = self
            .scan_leagues(&leagues, |m| {
                (field_as_string(m, "matchID").as_deref() == Some(match_id)).then(|| m.clone())
            })
            .await?;
        found.ok_or_else(|| UpstreamError::not_found("match", match_id))
    }
}

/// Pull `team1`/`team2` out of a match object when its `teamId` matches.
/// Each side is checked independently; a fixture missing one side can
/// still match on the other.
fn extract_team(match_obj: &Value, team_id: &str) -> Option<Value> {
    for side in ["team1", "team2"] {
        let Some(team) = match_obj.get(side) else {
            continue;
        };
        if field_as_string(team, "teamId").as_deref() == Some(team_id) {
            return Some(team.clone());
        }
    }
    None
}

/// Read a field as a string, accepting JSON numbers; upstream ids show up
/// both ways.
fn field_as_string(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn classify_reqwest_error(err: reqwest::Error) -> UpstreamError {
    if err.is_timeout() {
        UpstreamError::Timeout
    } else {
        UpstreamError::Network(err.to_string())
    }
}

fn preview(body: &str) -> String {
    const LIMIT: usize = 200;
    if body.len() > LIMIT {
        let mut end = LIMIT;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extract_team_matches_either_side_of_a_fixture() {
        let fixture = json!({
            "matchID": 101,
            "team1": {"teamId": 40, "teamName": "FC Bayern"},
            "team2": {"teamId": "7", "teamName": "BVB"},
        });

        let home = extract_team(&fixture, "40").unwrap();
        assert_eq!(home["teamName"], "FC Bayern");

        let away = extract_team(&fixture, "7").unwrap();
        assert_eq!(away["teamName"], "BVB");

        assert!(extract_team(&fixture, "999").is_none());
    }

    #[test]
    fn extract_team_tolerates_a_missing_side() {
        let away_only = json!({
            "matchID": 102,
            "team2": {"teamId": 7, "teamName": "BVB"},
        });
        let found = extract_team(&away_only, "7").unwrap();
        assert_eq!(found["teamName"], "BVB");

        let home_only = json!({
            "matchID": 103,
            "team1": {"teamId": 40, "teamName": "FC Bayern"},
        });
        assert!(extract_team(&home_only, "7").is_none());
    }

    #[test]
    fn field_as_string_accepts_numbers_and_strings() {
        let value = json!({"matchID": 66251, "label": "bl1", "nested": {}});
        assert_eq!(field_as_string(&value, "matchID").as_deref(), Some("66251"));
        assert_eq!(field_as_string(&value, "label").as_deref(), Some("bl1"));
        assert_eq!(field_as_string(&value, "nested"), None);
        assert_eq!(field_as_string(&value, "missing"), None);
    }

    #[test]
    fn preview_truncates_long_bodies() {
        let long = "x".repeat(500);
        let short = preview(&long);
        assert!(short.len() <= 210);
        assert!(short.ends_with("..."));
        assert_eq!(preview("ok"), "ok");
    }
}
