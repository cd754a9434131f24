// SPDX-FileCopyrightText: 2026 Toolvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers and their request/response bodies.
//!
//! Request bodies carrying plaintext secrets do not derive `Debug`; the
//! plaintext is moved into a `SecretString` before it reaches the domain layer.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};
use toolvault_core::{HealthStatus, Identity, PluginAdapter, Tool};
use toolvault_sharing::{
    CredentialUpdate, CredentialView, NewCredential, NewTool, ShareRequest, ToolUpdate,
};

use crate::error::ApiError;
use crate::extract::ClientIp;
use crate::server::GatewayState;

type ApiResult<T> = Result<T, ApiError>;

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

fn no_store<T: IntoResponse>(body: T) -> Response {
    ([(header::CACHE_CONTROL, "no-store")], body).into_response()
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

const OK: Json<OkResponse> = Json(OkResponse { ok: true });

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// GET /health
pub async fn get_health(State(state): State<GatewayState>) -> Response {
    let (code, status, detail) = match state.storage.health_check().await {
        Ok(HealthStatus::Healthy) => (StatusCode::OK, "ok", None),
        Ok(HealthStatus::Degraded(d)) => (StatusCode::OK, "degraded", Some(d)),
        Ok(HealthStatus::Unhealthy(d)) => (StatusCode::SERVICE_UNAVAILABLE, "unhealthy", Some(d)),
        Err(e) => (StatusCode::SERVICE_UNAVAILABLE, "unhealthy", Some(e.public_message())),
    };
    let body = HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        detail,
    };
    (code, Json(body)).into_response()
}

#[derive(Debug, Serialize)]
pub struct ToolBody {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub url: Option<String>,
    pub spend_amount: Option<f64>,
    pub spend_cycle: Option<String>,
    pub renewal_date: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Tool> for ToolBody {
    fn from(t: Tool) -> Self {
        Self {
            id: t.id,
            owner_id: t.owner_id,
            name: t.name,
            url: t.url,
            spend_amount: t.spend_amount,
            spend_cycle: t.spend_cycle,
            renewal_date: t.renewal_date,
            created_at: t.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ToolResponse {
    pub tool: ToolBody,
}

#[derive(Debug, Deserialize)]
pub struct CreateToolRequest {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub spend_amount: Option<f64>,
    #[serde(default)]
    pub spend_cycle: Option<String>,
    #[serde(default)]
    pub renewal_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateToolRequest {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Omitted keeps the URL, `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub url: Option<Option<String>>,
    #[serde(default)]
    pub spend_amount: Option<f64>,
    #[serde(default)]
    pub spend_cycle: Option<String>,
    #[serde(default)]
    pub renewal_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct AccessRequest {
    pub tool_id: String,
    pub user_id: String,
}

/// POST /api/tools
pub async fn create_tool(
    State(state): State<GatewayState>,
    Extension(identity): Extension<Identity>,
    body: Result<Json<CreateToolRequest>, JsonRejection>,
) -> ApiResult<Json<ToolResponse>> {
    let Json(body) = body?;
    let tool = state
        .tools
        .create_tool(
            &identity,
            NewTool {
                name: body.name,
                url: body.url,
                spend_amount: body.spend_amount,
                spend_cycle: body.spend_cycle,
                renewal_date: body.renewal_date,
            },
        )
        .await?;
    Ok(Json(ToolResponse { tool: tool.into() }))
}

/// PUT /api/tools
pub async fn update_tool(
    State(state): State<GatewayState>,
    Extension(identity): Extension<Identity>,
    body: Result<Json<UpdateToolRequest>, JsonRejection>,
) -> ApiResult<Json<ToolResponse>> {
    let Json(body) = body?;
    let tool = state
        .tools
        .update_tool(
            &identity,
            ToolUpdate {
                id: body.id,
                name: body.name,
                url: body.url,
                spend_amount: body.spend_amount,
                spend_cycle: body.spend_cycle,
                renewal_date: body.renewal_date,
            },
        )
        .await?;
    Ok(Json(ToolResponse { tool: tool.into() }))
}

/// DELETE /api/tools?id=
pub async fn delete_tool(
    State(state): State<GatewayState>,
    Extension(identity): Extension<Identity>,
    query: Result<Query<IdQuery>, QueryRejection>,
) -> ApiResult<Json<OkResponse>> {
    let Query(query) = query?;
    state.tools.delete_tool(&identity, &query.id).await?;
    Ok(OK)
}

/// POST /api/tools/access
pub async fn grant_access(
    State(state): State<GatewayState>,
    Extension(identity): Extension<Identity>,
    body: Result<Json<AccessRequest>, JsonRejection>,
) -> ApiResult<Json<OkResponse>> {
    let Json(body) = body?;
    state
        .tools
        .grant_access(&identity, &body.tool_id, &body.user_id)
        .await?;
    Ok(OK)
}

/// DELETE /api/tools/access
pub async fn revoke_access(
    State(state): State<GatewayState>,
    Extension(identity): Extension<Identity>,
    body: Result<Json<AccessRequest>, JsonRejection>,
) -> ApiResult<Json<OkResponse>> {
    let Json(body) = body?;
    state
        .tools
        .revoke_access(&identity, &body.tool_id, &body.user_id)
        .await?;
    Ok(OK)
}

#[derive(Deserialize)]
pub struct CreateCredentialRequest {
    pub tool_id: String,
    #[serde(default)]
    pub label: Option<String>,
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct UpdateCredentialRequest {
    pub id: String,
    #[serde(default, deserialize_with = "double_option")]
    pub label: Option<Option<String>>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ToolIdQuery {
    pub tool_id: String,
}

/// Metadata of a stored credential; never carries plaintext or ciphertext.
#[derive(Debug, Serialize)]
pub struct CredentialSummary {
    pub id: String,
    pub tool_id: String,
    pub label: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct CredentialCreatedResponse {
    pub credential: CredentialSummary,
}

#[derive(Serialize)]
pub struct CredentialBody {
    pub id: String,
    pub label: Option<String>,
    pub username: String,
    pub password: String,
    pub created_at: DateTime<Utc>,
}

impl From<CredentialView> for CredentialBody {
    fn from(v: CredentialView) -> Self {
        Self {
            id: v.id,
            label: v.label,
            username: v.username.expose_secret().to_string(),
            password: v.password.expose_secret().to_string(),
            created_at: v.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct CredentialListResponse {
    pub credentials: Vec<CredentialBody>,
}

/// POST /api/credentials
pub async fn create_credential(
    State(state): State<GatewayState>,
    Extension(identity): Extension<Identity>,
    body: Result<Json<CreateCredentialRequest>, JsonRejection>,
) -> ApiResult<Json<CredentialCreatedResponse>> {
    let Json(body) = body?;
    let record = state
        .credentials
        .create(
            &identity,
            NewCredential {
                tool_id: body.tool_id,
                label: body.label,
                username: SecretString::from(body.username),
                password: SecretString::from(body.password),
            },
        )
        .await?;
    Ok(Json(CredentialCreatedResponse {
        credential: CredentialSummary {
            id: record.id,
            tool_id: record.tool_id,
            label: record.label,
            created_by: record.created_by,
            created_at: record.created_at,
        },
    }))
}

/// GET /api/credentials?tool_id=
pub async fn list_credentials(
    State(state): State<GatewayState>,
    Extension(identity): Extension<Identity>,
    query: Result<Query<ToolIdQuery>, QueryRejection>,
) -> ApiResult<Response> {
    let Query(query) = query?;
    let views = state.credentials.list(&identity, &query.tool_id).await?;
    Ok(no_store(Json(CredentialListResponse {
        credentials: views.into_iter().map(Into::into).collect(),
    })))
}

/// PUT /api/credentials
pub async fn update_credential(
    State(state): State<GatewayState>,
    Extension(identity): Extension<Identity>,
    body: Result<Json<UpdateCredentialRequest>, JsonRejection>,
) -> ApiResult<Json<OkResponse>> {
    let Json(body) = body?;
    state
        .credentials
        .update(
            &identity,
            CredentialUpdate {
                id: body.id,
                label: body.label,
                username: body.username.map(SecretString::from),
                password: body.password.map(SecretString::from),
            },
        )
        .await?;
    Ok(OK)
}

/// DELETE /api/credentials?id=
pub async fn delete_credential(
    State(state): State<GatewayState>,
    Extension(identity): Extension<Identity>,
    query: Result<Query<IdQuery>, QueryRejection>,
) -> ApiResult<Json<OkResponse>> {
    let Query(query) = query?;
    state.credentials.delete(&identity, &query.id).await?;
    Ok(OK)
}

#[derive(Deserialize)]
pub struct CreateShareRequest {
    pub credential_id: String,
    #[serde(default)]
    pub expires_in_hours: Option<u32>,
    #[serde(default)]
    pub max_views: Option<u32>,
    #[serde(default)]
    pub one_time: Option<bool>,
    #[serde(default)]
    pub require_secret: bool,
    #[serde(default)]
    pub secret: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ShareBody {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub max_views: u32,
    pub one_time: bool,
    pub require_secret: bool,
}

#[derive(Serialize)]
pub struct CreateShareResponse {
    pub share: ShareBody,
    /// Plaintext secret, returned once. `null` when none is required.
    pub secret: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RevokeShareRequest {
    pub token: String,
}

#[derive(Deserialize)]
pub struct ResolveShareRequest {
    pub token: String,
    #[serde(default)]
    pub secret: Option<String>,
}

#[derive(Serialize)]
pub struct ResolveShareResponse {
    pub ok: bool,
    pub label: Option<String>,
    pub username: String,
    pub password: String,
    #[serde(rename = "toolName")]
    pub tool_name: Option<String>,
    #[serde(rename = "toolUrl")]
    pub tool_url: Option<String>,
}

/// POST /api/share
pub async fn create_share(
    State(state): State<GatewayState>,
    Extension(identity): Extension<Identity>,
    body: Result<Json<CreateShareRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(body) = body?;
    let grant = state
        .shares
        .create(
            &identity,
            ShareRequest {
                credential_id: body.credential_id,
                expires_in_hours: body.expires_in_hours,
                max_views: body.max_views,
                one_time: body.one_time,
                require_secret: body.require_secret,
                secret: body.secret.map(SecretString::from),
            },
        )
        .await?;
    Ok(no_store(Json(CreateShareResponse {
        secret: grant.secret.as_ref().map(|s| s.expose_secret().to_string()),
        share: ShareBody {
            token: grant.token,
            expires_at: grant.expires_at,
            max_views: grant.max_views,
            one_time: grant.one_time,
            require_secret: grant.require_secret,
        },
    })))
}

/// POST /api/share/revoke
pub async fn revoke_share(
    State(state): State<GatewayState>,
    Extension(identity): Extension<Identity>,
    body: Result<Json<RevokeShareRequest>, JsonRejection>,
) -> ApiResult<Json<OkResponse>> {
    let Json(body) = body?;
    state.shares.revoke(&identity, &body.token).await?;
    Ok(OK)
}

/// POST /api/share/resolve (anonymous)
pub async fn resolve_share(
    State(state): State<GatewayState>,
    client_ip: ClientIp,
    body: Result<Json<ResolveShareRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(body) = body?;
    let revealed = state
        .shares
        .resolve(&body.token, body.secret.as_deref(), client_ip.as_deref())
        .await?;
    Ok(no_store(Json(ResolveShareResponse {
        ok: true,
        label: revealed.label,
        username: revealed.username.expose_secret().to_string(),
        password: revealed.password.expose_secret().to_string(),
        tool_name: revealed.tool_name,
        tool_url: revealed.tool_url,
    })))
}
