//! In-memory stand-in for the account management API.
//!
//! Serves `/v1/organisation/accounts` with the same status codes and error
//! bodies as the real service, so the client can be exercised end to end
//! without external infrastructure.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const ACCOUNTS_ROUTE: &str = "/v1/organisation/accounts";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Account {
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
    pub created_on: DateTime<Utc>,
    pub id: Uuid,
    pub modified_on: DateTime<Utc>,
    pub organisation_id: Uuid,
    #[serde(rename = "type")]
    pub kind: String,
    pub version: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Links {
    #[serde(rename = "self")]
    pub self_link: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccountEnvelope {
    pub data: Account,
    pub links: Links,
}

#[derive(Deserialize)]
pub struct NewAccount {
    pub id: String,
    pub organisation_id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

#[derive(Deserialize)]
pub struct CreateAccount {
    pub data: NewAccount,
}

#[derive(Deserialize)]
pub struct DeleteParams {
    pub version: i64,
}

#[derive(Serialize)]
struct ErrorBody {
    error_message: String,
}

/// Failure responses: JSON `{error_message}` or a bare status.
#[derive(Debug)]
pub enum ApiFailure {
    Message(StatusCode, String),
    Empty(StatusCode),
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        match self {
            ApiFailure::Message(status, error_message) => {
                (status, Json(ErrorBody { error_message })).into_response()
            }
            ApiFailure::Empty(status) => status.into_response(),
        }
    }
}

pub type Db = Arc<RwLock<HashMap<Uuid, Account>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route(ACCOUNTS_ROUTE, post(create_account))
        .route(
            &format!("{ACCOUNTS_ROUTE}/{{id}}"),
            get(fetch_account).delete(delete_account),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn envelope(account: Account) -> AccountEnvelope {
    let links = Links {
        self_link: format!("{ACCOUNTS_ROUTE}/{}", account.id),
    };
    AccountEnvelope {
        data: account,
        links,
    }
}

fn parse_path_id(raw: &str) -> Result<Uuid, ApiFailure> {
    Uuid::parse_str(raw).map_err(|_| {
        ApiFailure::Message(StatusCode::BAD_REQUEST, "id is not a valid uuid".to_string())
    })
}

fn parse_body_uuid(raw: &str, field: &str) -> Result<Uuid, ApiFailure> {
    Uuid::parse_str(raw).map_err(|_| {
        ApiFailure::Message(
            StatusCode::BAD_REQUEST,
            format!("validation failure list:\n{field} in body must be of type uuid"),
        )
    })
}

async fn create_account(
    State(db): State<Db>,
    Json(input): Json<CreateAccount>,
) -> Result<(StatusCode, Json<AccountEnvelope>), ApiFailure> {
    let id = parse_body_uuid(&input.data.id, "id")?;
    let organisation_id = parse_body_uuid(&input.data.organisation_id, "organisation_id")?;

    let mut accounts = db.write().await;
    if accounts.contains_key(&id) {
        return Err(ApiFailure::Message(
            StatusCode::CONFLICT,
            "Account cannot be created as it violates a duplicate constraint".to_string(),
        ));
    }

    let now = Utc::now();
    let account = Account {
        attributes: input.data.attributes,
        created_on: now,
        id,
        modified_on: now,
        organisation_id,
        kind: input.data.kind,
        version: 0,
    };
    accounts.insert(id, account.clone());
    tracing::debug!(%id, "account created");
    Ok((StatusCode::CREATED, Json(envelope(account))))
}

async fn fetch_account(
    State(db): State<Db>,
    Path(raw_id): Path<String>,
) -> Result<Json<AccountEnvelope>, ApiFailure> {
    let id = parse_path_id(&raw_id)?;
    let accounts = db.read().await;
    accounts.get(&id).cloned().map(|a| Json(envelope(a))).ok_or_else(|| {
        ApiFailure::Message(StatusCode::NOT_FOUND, format!("record {id} does not exist"))
    })
}

async fn delete_account(
    State(db): State<Db>,
    Path(raw_id): Path<String>,
    Query(params): Query<DeleteParams>,
) -> Result<StatusCode, ApiFailure> {
    let id = parse_path_id(&raw_id)?;
    let mut accounts = db.write().await;
    let account = accounts
        .get(&id)
        .ok_or(ApiFailure::Empty(StatusCode::NOT_FOUND))?;
    if account.version != params.version {
        return Err(ApiFailure::Message(
            StatusCode::CONFLICT,
            "invalid version".to_string(),
        ));
    }
    accounts.remove(&id);
    tracing::debug!(%id, "account deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Account {
        let at = DateTime::parse_from_rfc3339("2021-10-15T03:19:57.796Z")
            .unwrap()
            .with_timezone(&Utc);
        Account {
            attributes: Map::new(),
            created_on: at,
            id: Uuid::nil(),
            modified_on: at,
            organisation_id: Uuid::nil(),
            kind: "accounts".to_string(),
            version: 0,
        }
    }

    #[test]
    fn envelope_serializes_to_json() {
        let json = serde_json::to_value(envelope(sample())).unwrap();
        assert_eq!(json["data"]["id"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(json["data"]["type"], "accounts");
        assert_eq!(json["data"]["version"], 0);
        assert!(json["data"].get("attributes").is_none());
        assert_eq!(
            json["links"]["self"],
            "/v1/organisation/accounts/00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn create_account_accepts_missing_attributes() {
        let raw = r#"{"data":{"id":"x","organisation_id":"y","type":"accounts"}}"#;
        let input: CreateAccount = serde_json::from_str(raw).unwrap();
        assert!(input.data.attributes.is_empty());
        assert_eq!(input.data.kind, "accounts");
    }

    #[test]
    fn create_account_rejects_missing_id() {
        let result: Result<CreateAccount, _> =
            serde_json::from_str(r#"{"data":{"organisation_id":"y"}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn body_uuid_error_names_field() {
        let err = parse_body_uuid("123", "organisation_id").unwrap_err();
        match err {
            ApiFailure::Message(status, msg) => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert!(msg.contains("organisation_id in body must be of type uuid"));
            }
            ApiFailure::Empty(_) => panic!("expected message"),
        }
    }
}
