use axum::Json;
use axum::extract::{Path, State};

use crate::error::AppError;
use crate::models::ProviderDescriptor;
use crate::routes::AppState;

pub async fn list(State(state): State<AppState>) -> Json<Vec<ProviderDescriptor>> {
    Json(state.service.aggregator().providers())
}

pub async fn enable(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.service.aggregator().enable_provider(&name)?;
    Ok(Json(serde_json::json!({ "provider": name, "enabled": true })))
}

pub async fn disable(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.service.aggregator().disable_provider(&name)?;
    Ok(Json(serde_json::json!({ "provider": name, "enabled": false })))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::models::job::fixtures::job;
    use crate::routes::api::test_support::{app, call};
    use crate::search::testing::StubProvider;

    #[tokio::test]
    async fn test_list_and_toggle() {
        let app = app(vec![
            (
                StubProvider::ok(
                    "alpha",
                    vec![job("alpha_1", "Rust Engineer", "Acme", "Remote", "")],
                ),
                true,
            ),
            (StubProvider::ok("beta", vec![]), false),
        ]);

        let (status, body) = call(&app, "GET", "/api/v1/providers", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([
                { "name": "alpha", "enabled": true, "capability": "typed-api" },
                { "name": "beta", "enabled": false, "capability": "typed-api" }
            ])
        );

        let (status, _) = call(&app, "POST", "/api/v1/providers/alpha/disable", None).await;
        assert_eq!(status, StatusCode::OK);
        let (_, body) = call(&app, "GET", "/api/v1/search?keywords=rust", None).await;
        assert_eq!(body, json!([]));

        let (status, body) = call(&app, "POST", "/api/v1/providers/alpha/enable", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["enabled"], true);
        let (_, body) = call(&app, "GET", "/api/v1/search?keywords=rust", None).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_provider_is_404() {
        let app = app(vec![]);
        let (status, _) = call(&app, "POST", "/api/v1/providers/ghost/enable", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
