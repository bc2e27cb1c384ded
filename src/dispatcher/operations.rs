use super::{optional_string_field, string_field, Operation, Payload};
use crate::client::providers::{SportsProvider, UpstreamError};
use async_trait::async_trait;
use serde_json::{json, Value};

/// The standard operation set, in registration order.
pub fn all() -> Vec<Box<dyn Operation>> {
    vec![
        Box::new(ListLeagues),
        Box::new(GetLeagueMatches),
        Box::new(GetTeam),
        Box::new(GetMatch),
    ]
}

/// `ListLeagues` — no required fields; normalizes to `{leagues, count}`.
pub struct ListLeagues;

#[async_trait]
impl Operation for ListLeagues {
    fn name(&self) -> &'static str {
        "ListLeagues"
    }

    async fn execute(
        &self,
        provider: &dyn SportsProvider,
        _payload: &Payload,
    ) -> Result<Value, UpstreamError> {
        provider.list_leagues().await
    }

    fn normalize(&self, raw: Value) -> Value {
        normalize_list("leagues", raw)
    }
}

/// `GetLeagueMatches` — requires `leagueId`; normalizes to `{matches, count}`.
pub struct GetLeagueMatches;

#[async_trait]
impl Operation for GetLeagueMatches {
    fn name(&self) -> &'static str {
        "GetLeagueMatches"
    }

    fn required_fields(&self) -> &'static [&'static str] {
        &["leagueId"]
    }

    async fn execute(
        &self,
        provider: &dyn SportsProvider,
        payload: &Payload,
    ) -> Result<Value, UpstreamError> {
        provider
            .league_matches(&string_field(payload, "leagueId"))
            .await
    }

    fn normalize(&self, raw: Value) -> Value {
        normalize_list("matches", raw)
    }
}

/// `GetTeam` — requires `teamId`; an optional `leagueId` scopes the
/// provider's superset scan. Normalizes to `{team}`.
pub struct GetTeam;

#[async_trait]
impl Operation for GetTeam {
    fn name(&self) -> &'static str {
        "GetTeam"
    }

    fn required_fields(&self) -> &'static [&'static str] {
        &["teamId"]
    }

    async fn execute(
        &self,
        provider: &dyn SportsProvider,
        payload: &Payload,
    ) -> Result<Value, UpstreamError> {
        let league_hint = optional_string_field(payload, "leagueId");
        provider
            .team_by_id(&string_field(payload, "teamId"), league_hint.as_deref())
            .await
    }

    fn normalize(&self, raw: Value) -> Value {
        normalize_object("team", raw)
    }
}

/// `GetMatch` — requires `matchId`; optional `leagueId` scope. Normalizes
/// to `{match}`.
pub struct GetMatch;

#[async_trait]
impl Operation for GetMatch {
    fn name(&self) -> &'static str {
        "GetMatch"
    }

    fn required_fields(&self) -> &'static [&'static str] {
        &["matchId"]
    }

    async fn execute(
        &self,
        provider: &dyn SportsProvider,
        payload: &Payload,
    ) -> Result<Value, UpstreamError> {
        let league_hint = optional_string_field(payload, "leagueId");
        provider
            .match_by_id(&string_field(payload, "matchId"), league_hint.as_deref())
            .await
    }

    fn normalize(&self, raw: Value) -> Value {
        normalize_object("match", raw)
    }
}

fn normalize_list(key: &str, raw: Value) -> Value {
    let items = match raw {
        Value::Array(items) => items,
        _ => Vec::new(),
    };

    let mut out = serde_json::Map::new();
    out.insert("count".to_string(), json!(items.len()));
    out.insert(key.to_string(), Value::Array(items));
    Value::Object(out)
}

fn normalize_object(key: &str, raw: Value) -> Value {
    let item = match raw {
        Value::Object(_) => raw,
        _ => Value::Object(serde_json::Map::new()),
    };

    let mut out = serde_json::Map::new();
    out.insert(key.to_string(), item);
    Value::Object(out)
}
