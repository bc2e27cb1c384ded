#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use sportsdata_proxy::client::{SportsProvider, TokenBucket, UpstreamError};
use sportsdata_proxy::dispatcher::Dispatcher;
use sportsdata_proxy::RetryConfig;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Scriptable in-memory provider: fails the first `fail_first` calls with a
/// configured error, then serves canned data. Counts every adapter call.
pub struct ScriptedProvider {
    pub calls: AtomicU32,
    pub fail_first: u32,
    pub failure: Option<UpstreamError>,
}

impl ScriptedProvider {
    pub fn healthy() -> Self {
        Self {
            calls: AtomicU32::new(0),
            fail_first: 0,
            failure: None,
        }
    }

    pub fn failing_first(n: u32, failure: UpstreamError) -> Self {
        Self {
            calls: AtomicU32::new(0),
            fail_first: n,
            failure: Some(failure),
        }
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn step(&self) -> Result<(), UpstreamError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(err) if n < self.fail_first => Err(err.clone()),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl SportsProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn list_leagues(&self) -> Result<Value, UpstreamError> {
        self.step()?;
        Ok(json!([
            {"leagueId": 4442, "leagueShortcut": "bl1"},
            {"leagueId": 4443, "leagueShortcut": "bl2"},
            {"leagueId": 4444, "leagueShortcut": "pl"},
        ]))
    }

    async fn league_matches(&self, league_id: &str) -> Result<Value, UpstreamError> {
        self.step()?;
        Ok(json!([
            {
                "matchID": 66251,
                "league": league_id,
                "team1": {"teamId": 40, "teamName": "FC Bayern"},
                "team2": {"teamId": 7, "teamName": "BVB"},
            },
            {
                "matchID": 66252,
                "league": league_id,
                "team1": {"teamId": 9, "teamName": "Schalke"},
                "team2": {"teamId": 40, "teamName": "FC Bayern"},
            },
        ]))
    }

    async fn team_by_id(
        &self,
        team_id: &str,
        _league_hint: Option<&str>,
    ) -> Result<Value, UpstreamError> {
        self.step()?;
        if team_id == "40" {
            Ok(json!({"teamId": 40, "teamName": "FC Bayern"}))
        } else {
            Err(UpstreamError::Http {
                status: 404,
                message: format!("team {team_id} not found"),
            })
        }
    }

    async fn match_by_id(
        &self,
        match_id: &str,
        _league_hint: Option<&str>,
    ) -> Result<Value, UpstreamError> {
        self.step()?;
        if match_id == "66251" {
            Ok(json!({"matchID": 66251, "matchIsFinished": true}))
        } else {
            Err(UpstreamError::Http {
                status: 404,
                message: format!("match {match_id} not found"),
            })
        }
    }
}

/// Retry config tuned for tests: real classification, negligible delays.
pub fn fast_retry(max_retries: u32) -> RetryConfig {
    RetryConfig {
        max_retries,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(10),
        jitter_enabled: false,
    }
}

pub fn dispatcher_over(provider: Arc<ScriptedProvider>, max_retries: u32) -> Dispatcher {
    Dispatcher::new(
        provider,
        Arc::new(TokenBucket::new(1000.0, 10_000.0)),
        fast_retry(max_retries),
    )
}

pub fn payload(value: Value) -> sportsdata_proxy::Payload {
    value.as_object().expect("object payload").clone()
}
