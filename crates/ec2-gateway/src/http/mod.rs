//! HTTP adapter
//!
//! Thin axum layer over the gateway. State holds the provider factory
//! (credentials loaded once at startup) and builds a region-bound gateway
//! per request.

mod error;
mod handlers;
pub mod models;

pub use error::ApiError;

use crate::aws::provider::ProviderFactory;
use crate::gateway::{Gateway, GatewaySettings, gateway_for};
use axum::Router;
use axum::routing::{delete, get, post};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared application state
pub struct AppState<F> {
    factory: Arc<F>,
    settings: GatewaySettings,
    default_region: Arc<str>,
}

impl<F> Clone for AppState<F> {
    fn clone(&self) -> Self {
        Self {
            factory: Arc::clone(&self.factory),
            settings: self.settings,
            default_region: Arc::clone(&self.default_region),
        }
    }
}

impl<F: ProviderFactory> AppState<F> {
    pub fn new(factory: F, settings: GatewaySettings, default_region: impl Into<String>) -> Self {
        Self {
            factory: Arc::new(factory),
            settings,
            default_region: Arc::from(default_region.into()),
        }
    }

    /// Region from the request, falling back to the configured default
    pub fn region_or_default(&self, region: Option<String>) -> String {
        region
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| self.default_region.to_string())
    }

    /// Gateway bound to `region` (or the default region)
    pub fn gateway(&self, region: Option<&str>) -> Gateway<F::Provider> {
        let region = self.region_or_default(region.map(str::to_string));
        gateway_for(self.factory.as_ref(), &region, self.settings)
    }
}

/// Build the router with all routes
pub fn router<F: ProviderFactory>(state: AppState<F>) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/identity", get(handlers::identity::<F>))
        .route(
            "/instances",
            get(handlers::list_instances::<F>).post(handlers::launch_instance::<F>),
        )
        .route("/instances/{id}/start", post(handlers::start_instance::<F>))
        .route("/instances/{id}/stop", post(handlers::stop_instance::<F>))
        .route(
            "/instances/{id}/terminate",
            post(handlers::terminate_instance::<F>),
        )
        .route(
            "/key-pairs",
            get(handlers::list_key_pairs::<F>).post(handlers::create_key_pair::<F>),
        )
        .route("/key-pairs/{name}", delete(handlers::delete_key_pair::<F>))
        .route(
            "/security-groups",
            get(handlers::list_security_groups::<F>).post(handlers::create_security_group::<F>),
        )
        .route(
            "/security-groups/{id}",
            delete(handlers::delete_security_group::<F>),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeCloud;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use ec2_gateway_common::ResourceStatus;
    use serde_json::{Value, json};

    fn server(cloud: &FakeCloud) -> TestServer {
        let state = AppState::new(cloud.clone(), GatewaySettings::default(), "ap-south-1");
        TestServer::new(router(state)).unwrap()
    }

    #[tokio::test]
    async fn root_is_alive() {
        let server = server(&FakeCloud::new());
        let response = server.get("/").await;
        assert_eq!(response.status_code(), StatusCode::OK);
        let body: Value = response.json();
        assert!(body["message"].as_str().unwrap().contains("running"));
    }

    #[tokio::test]
    async fn identity_reports_account() {
        let server = server(&FakeCloud::new());
        let response = server.get("/identity").await;
        assert_eq!(response.status_code(), StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["account"], "123456789012");
    }

    #[tokio::test]
    async fn identity_with_bad_credentials_is_401() {
        let server = server(&FakeCloud::new().with_invalid_credentials());
        let response = server.get("/identity").await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
        let body: Value = response.json();
        assert_eq!(body["error"], "credential");
    }

    #[tokio::test]
    async fn launch_then_list() {
        let cloud = FakeCloud::new().settle_after(0);
        let server = server(&cloud);

        let response = server
            .post("/instances")
            .json(&json!({
                "instance_type": "t3.micro",
                "ami_id": "ami-0abcdef",
                "key_name": "ops",
                "security_group_id": "sg-123",
            }))
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["resource"]["status"], "running");
        assert_eq!(body["resource"]["region"], "ap-south-1");
        assert_eq!(body["wait"]["polls"], 1);
        let id = body["resource"]["id"].as_str().unwrap().to_string();
        assert!(id.starts_with("i-"));

        let listed: Value = server.get("/instances").await.json();
        assert_eq!(listed[0]["instance_id"], id.as_str());
    }

    #[tokio::test]
    async fn stop_and_start_instance() {
        let cloud = FakeCloud::new().settle_after(0);
        let id = cloud.seed_instance(ResourceStatus::Running);
        let server = server(&cloud);

        let stopped: Value = server
            .post(&format!("/instances/{id}/stop?region=eu-west-1"))
            .await
            .json();
        assert_eq!(stopped["resource"]["status"], "stopped");
        assert_eq!(stopped["resource"]["region"], "eu-west-1");
        assert_eq!(stopped["resource"]["generation"], 1);

        let started = server.post(&format!("/instances/{id}/start")).await;
        assert_eq!(started.status_code(), StatusCode::OK);
        let started: Value = started.json();
        assert_eq!(started["resource"]["status"], "running");
    }

    #[tokio::test]
    async fn terminate_missing_instance_is_404() {
        let server = server(&FakeCloud::new());
        let response = server.post("/instances/i-missing/terminate").await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
        let body: Value = response.json();
        assert_eq!(body["error"], "not_found");
        assert_eq!(body["details"]["code"], "InvalidInstanceID.NotFound");
    }

    #[tokio::test]
    async fn key_pair_is_returned_as_pem_attachment() {
        let cloud = FakeCloud::new();
        let server = server(&cloud);

        let response = server
            .post("/key-pairs")
            .json(&json!({ "key_name": "ops" }))
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
        assert_eq!(
            response.header("content-disposition"),
            "attachment; filename=\"ops.pem\""
        );
        assert!(response.text().contains("BEGIN RSA PRIVATE KEY"));

        let listed: Value = server.get("/key-pairs").await.json();
        assert_eq!(listed[0]["key_name"], "ops");

        let deleted = server.delete("/key-pairs/ops").await;
        assert_eq!(deleted.status_code(), StatusCode::OK);
        let deleted: Value = deleted.json();
        assert_eq!(deleted["resource"]["status"], "absent");
    }

    #[tokio::test]
    async fn deleting_unknown_key_pair_is_404() {
        let server = server(&FakeCloud::new());
        let response = server.delete("/key-pairs/never-created").await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn rejected_rule_leaves_no_group_behind() {
        let cloud = FakeCloud::new().reject_port(9999);
        let server = server(&cloud);

        let response = server
            .post("/security-groups")
            .json(&json!({
                "group_name": "web",
                "description": "web servers",
                "rules": [{ "port": 80 }, { "port": 9999 }],
            }))
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
        let body: Value = response.json();
        assert_eq!(body["error"], "plan_execution");
        assert_eq!(body["details"]["compensation"]["status"], "succeeded");

        let listed: Value = server.get("/security-groups").await.json();
        let names: Vec<&str> = listed
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|g| g["group_name"].as_str())
            .collect();
        assert!(!names.contains(&"web"));
    }

    #[tokio::test]
    async fn create_and_delete_security_group() {
        let cloud = FakeCloud::new();
        let server = server(&cloud);

        let response = server
            .post("/security-groups")
            .json(&json!({
                "group_name": "web",
                "description": "web servers",
                "rules": [{ "port": 80 }, { "port": 443 }],
            }))
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["resource"]["status"], "present");
        let id = body["resource"]["id"].as_str().unwrap().to_string();

        let listed: Value = server.get("/security-groups").await.json();
        assert_eq!(listed[0]["ingress"].as_array().unwrap().len(), 2);

        let deleted = server.delete(&format!("/security-groups/{id}")).await;
        assert_eq!(deleted.status_code(), StatusCode::OK);

        let again = server.delete(&format!("/security-groups/{id}")).await;
        assert_eq!(again.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn missing_default_vpc_is_422() {
        let server = server(&FakeCloud::new().with_default_vpcs(&[]));
        let response = server
            .post("/security-groups")
            .json(&json!({ "group_name": "web", "description": "web servers" }))
            .await;
        assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = response.json();
        assert_eq!(body["error"], "resource_resolution");
    }

    #[tokio::test]
    async fn empty_ami_is_400() {
        let server = server(&FakeCloud::new());
        let response = server
            .post("/instances")
            .json(&json!({ "instance_type": "t3.micro", "ami_id": "" }))
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"], "invalid_intent");
    }
}
