//! Route handlers
//!
//! Each handler turns its request into an intent, runs it through a gateway
//! bound to the request's region and shapes the result.

use super::AppState;
use super::error::ApiError;
use super::models::{
    InstanceLaunchRequest, KeyPairRequest, RegionQuery, ResourceResponse, SecurityGroupRequest,
    WaitSummary, pem_filename,
};
use crate::aws::account::CallerIdentity;
use crate::aws::ec2::{InstanceSummary, KeyPairSummary, SecurityGroupSummary};
use crate::aws::provider::ProviderFactory;
use crate::gateway::Execution;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use ec2_gateway_common::Intent;
use serde_json::{Value, json};

type ApiResult<T> = Result<T, ApiError>;

fn resource_response(execution: Execution) -> Json<ResourceResponse> {
    Json(ResourceResponse {
        wait: execution.wait.as_ref().map(WaitSummary::from),
        resource: execution.descriptor,
    })
}

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "ec2-gateway is running" }))
}

pub async fn identity<F: ProviderFactory>(
    State(state): State<AppState<F>>,
    Query(query): Query<RegionQuery>,
) -> ApiResult<Json<CallerIdentity>> {
    let gateway = state.gateway(query.region.as_deref());
    Ok(Json(gateway.caller_identity().await?))
}

pub async fn list_instances<F: ProviderFactory>(
    State(state): State<AppState<F>>,
    Query(query): Query<RegionQuery>,
) -> ApiResult<Json<Vec<InstanceSummary>>> {
    let gateway = state.gateway(query.region.as_deref());
    Ok(Json(gateway.describe_instances().await?))
}

pub async fn launch_instance<F: ProviderFactory>(
    State(state): State<AppState<F>>,
    Json(request): Json<InstanceLaunchRequest>,
) -> ApiResult<(StatusCode, Json<ResourceResponse>)> {
    let gateway = state.gateway(Some(&request.region));
    let execution = gateway
        .execute_with_artifacts(request.into_intent())
        .await?;
    Ok((StatusCode::CREATED, resource_response(execution)))
}

pub async fn start_instance<F: ProviderFactory>(
    State(state): State<AppState<F>>,
    Path(instance_id): Path<String>,
    Query(query): Query<RegionQuery>,
) -> ApiResult<Json<ResourceResponse>> {
    let region = state.region_or_default(query.region);
    run(&state, Intent::start(region, instance_id)).await
}

pub async fn stop_instance<F: ProviderFactory>(
    State(state): State<AppState<F>>,
    Path(instance_id): Path<String>,
    Query(query): Query<RegionQuery>,
) -> ApiResult<Json<ResourceResponse>> {
    let region = state.region_or_default(query.region);
    run(&state, Intent::stop(region, instance_id)).await
}

pub async fn terminate_instance<F: ProviderFactory>(
    State(state): State<AppState<F>>,
    Path(instance_id): Path<String>,
    Query(query): Query<RegionQuery>,
) -> ApiResult<Json<ResourceResponse>> {
    let region = state.region_or_default(query.region);
    run(&state, Intent::terminate(region, instance_id)).await
}

pub async fn list_key_pairs<F: ProviderFactory>(
    State(state): State<AppState<F>>,
    Query(query): Query<RegionQuery>,
) -> ApiResult<Json<Vec<KeyPairSummary>>> {
    let gateway = state.gateway(query.region.as_deref());
    Ok(Json(gateway.list_key_pairs().await?))
}

/// Create a key pair and stream the private key back as `{key_name}.pem`
pub async fn create_key_pair<F: ProviderFactory>(
    State(state): State<AppState<F>>,
    Json(request): Json<KeyPairRequest>,
) -> ApiResult<Response> {
    let gateway = state.gateway(Some(&request.region));
    let filename = pem_filename(&request.key_name);
    let execution = gateway
        .execute_with_artifacts(request.into_intent())
        .await?;

    let pem = execution
        .key_material
        .map(|k| k.into_string())
        .unwrap_or_default();

    Ok((
        StatusCode::CREATED,
        [
            (header::CONTENT_TYPE, "application/x-pem-file".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        pem,
    )
        .into_response())
}

pub async fn delete_key_pair<F: ProviderFactory>(
    State(state): State<AppState<F>>,
    Path(key_name): Path<String>,
    Query(query): Query<RegionQuery>,
) -> ApiResult<Json<ResourceResponse>> {
    let region = state.region_or_default(query.region);
    run(&state, Intent::delete_key_pair(region, key_name)).await
}

pub async fn list_security_groups<F: ProviderFactory>(
    State(state): State<AppState<F>>,
    Query(query): Query<RegionQuery>,
) -> ApiResult<Json<Vec<SecurityGroupSummary>>> {
    let gateway = state.gateway(query.region.as_deref());
    Ok(Json(gateway.list_security_groups().await?))
}

pub async fn create_security_group<F: ProviderFactory>(
    State(state): State<AppState<F>>,
    Json(request): Json<SecurityGroupRequest>,
) -> ApiResult<(StatusCode, Json<ResourceResponse>)> {
    let gateway = state.gateway(Some(&request.region));
    let execution = gateway
        .execute_with_artifacts(request.into_intent())
        .await?;
    Ok((StatusCode::CREATED, resource_response(execution)))
}

pub async fn delete_security_group<F: ProviderFactory>(
    State(state): State<AppState<F>>,
    Path(group_id): Path<String>,
    Query(query): Query<RegionQuery>,
) -> ApiResult<Json<ResourceResponse>> {
    let region = state.region_or_default(query.region);
    run(&state, Intent::delete_security_group(region, group_id)).await
}

async fn run<F: ProviderFactory>(
    state: &AppState<F>,
    intent: Intent,
) -> ApiResult<Json<ResourceResponse>> {
    let gateway = state.gateway(Some(intent.target.region()));
    let execution = gateway.execute_with_artifacts(intent).await?;
    Ok(resource_response(execution))
}
