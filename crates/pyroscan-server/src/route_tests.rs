#[cfg(test)]
mod tests {
    use super::super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use pyroscan_core::RiskScheme;
    use pyroscan_models::{demo_models, NullModelPolicy, RiskModel};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn demo_registry() -> ModelRegistry {
        demo_models()
            .into_iter()
            .map(|(name, model)| (name, RiskModel::from(model)))
            .collect()
    }

    fn app_with(registry: ModelRegistry, policy: NullModelPolicy) -> Router {
        let config = config::ServerConfig {
            null_model_policy: policy,
            ..config::ServerConfig::default()
        };
        build_router(AppState::new(registry, config))
    }

    fn demo_app() -> Router {
        app_with(demo_registry(), NullModelPolicy::Placeholder)
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        send(app, request).await
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        send(app, request).await
    }

    #[tokio::test]
    async fn test_health_reports_loaded_models() {
        let (status, body) = get_json(demo_app(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["models_loaded"], 3);
        assert_eq!(body["null_model_policy"], "placeholder");
    }

    #[tokio::test]
    async fn test_models_are_sorted() {
        let (status, body) = get_json(demo_app(), "/models").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["models"],
            json!(["continent_model", "global_model", "local_model"])
        );
    }

    #[tokio::test]
    async fn test_index_lists_thresholds() {
        let (status, body) = get_json(demo_app(), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["thresholds"].as_array().unwrap().len(), 5);
        assert_eq!(body["thresholds"][0]["category"], "safe");
    }

    #[tokio::test]
    async fn test_predict_single_tile() {
        let (status, body) =
            get_json(demo_app(), "/predict?tile=4/4/4&day=0&model=global_model").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert_eq!(body["model"], "global_model");
        assert_eq!(body["confidence"].as_f64().unwrap(), 0.34091);
        assert_eq!(body["category"], "guarded");
    }

    #[tokio::test]
    async fn test_predict_model_name_suffix_is_stripped() {
        let (_, plain) = get_json(demo_app(), "/predict?tile=5/16/11&day=3&model=global_model").await;
        let (_, suffixed) =
            get_json(demo_app(), "/predict?tile=5/16/11&day=3&model=global_model.pkl").await;
        assert_eq!(plain["confidence"], suffixed["confidence"]);
        assert_eq!(suffixed["model"], "global_model");
    }

    #[tokio::test]
    async fn test_predict_unknown_model_falls_back() {
        let (status, body) = get_json(demo_app(), "/predict?tile=4/4/4&model=nope").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["requested_model"], "nope");
        // No `fire_risk_model` registered, so the first sorted name answers.
        assert_eq!(body["model"], "continent_model");
    }

    #[tokio::test]
    async fn test_predict_requires_valid_tile() {
        let (status, body) = get_json(demo_app(), "/predict?day=2").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["ok"], false);
        assert_eq!(body["error"], "tile query param is required (format: z/x/y)");

        let (status, body) = get_json(demo_app(), "/predict?tile=2/9/9").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("z=2"));

        let (status, _) = get_json(demo_app(), "/predict?tile=4/4/4&day=later").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_predict_day_is_clamped() {
        let (_, high) = get_json(demo_app(), "/predict?tile=6/31/20&day=42&model=global_model").await;
        let (_, nine) = get_json(demo_app(), "/predict?tile=6/31/20&day=9&model=global_model").await;
        assert_eq!(high["day"], 9);
        assert_eq!(high["confidence"], nine["confidence"]);
    }

    #[tokio::test]
    async fn test_batch_preserves_order() {
        let payload = json!({
            "day": 5,
            "model": "local_model",
            "tiles": ["6/42/27", {"id": "4/4/4", "lat": 37.7}, {"tile": "5/16/11"}, "7/72/55"]
        });
        let (status, body) = post_json(demo_app(), "/predict_batch", payload).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 4);
        assert_eq!(body["model"], "local_model");
        let tiles: Vec<&str> = body["results"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["tile"].as_str().unwrap())
            .collect();
        assert_eq!(tiles, ["6/42/27", "4/4/4", "5/16/11", "7/72/55"]);
        assert_eq!(body["results"][0]["confidence"].as_f64().unwrap(), 0.593242);
        assert_eq!(body["results"][0]["category"], "elevated");
    }

    #[tokio::test]
    async fn test_batch_validation_errors() {
        let (status, body) = post_json(demo_app(), "/predict_batch", json!({"day": 1})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "tiles must be a non-empty array");

        let (status, body) = post_json(
            demo_app(),
            "/predict_batch",
            json!({"tiles": ["4/4/4", "bad-tile", "3/9"]}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("tiles[1]"));

        let request = Request::builder()
            .method("POST")
            .uri("/predict_batch")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(demo_app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "JSON body is required");
    }

    #[tokio::test]
    async fn test_empty_registry_placeholder() {
        let app = app_with(ModelRegistry::new(), NullModelPolicy::Placeholder);
        let (status, body) =
            post_json(app.clone(), "/predict_batch", json!({"tiles": ["4/4/4", "5/16/11"]})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["model"], Value::Null);
        assert_eq!(body["results"][1]["confidence"], Value::Null);
        assert_eq!(body["results"][1]["category"], "safe");

        let (_, legacy) = get_json(app, "/predict?tile=4/4/4&scheme=legacy").await;
        assert_eq!(legacy["confidence"], Value::Null);
        assert_eq!(legacy["category"], "low");
        assert_eq!(legacy["scheme"], json!(RiskScheme::Legacy));
    }

    #[tokio::test]
    async fn test_empty_registry_reject() {
        let app = app_with(ModelRegistry::new(), NullModelPolicy::Reject);
        let (status, body) = post_json(app, "/predict_batch", json!({"tiles": ["4/4/4"]})).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["ok"], false);
        assert!(body["error"].as_str().unwrap().starts_with("no models available"));
    }

    #[tokio::test]
    async fn test_legacy_scheme_in_batch() {
        let payload = json!({
            "day": 9,
            "model": "global_model",
            "scheme": "legacy",
            "tiles": ["7/72/55"]
        });
        let (status, body) = post_json(demo_app(), "/predict_batch", payload).await;
        assert_eq!(status, StatusCode::OK);
        // 0.3919... sits in the legacy 0.3-0.5 band.
        assert_eq!(body["results"][0]["category"], "moderate");
        assert_eq!(body["scheme"], "legacy");
    }

    #[tokio::test]
    async fn test_wrong_method_is_rejected() {
        let request = Request::builder()
            .method("DELETE")
            .uri("/predict")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(demo_app(), request).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body, json!({"ok": false, "error": "method not allowed"}));

        let (status, _) = get_json(demo_app(), "/predict_batch").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_request_id_is_echoed() {
        let request = Request::builder()
            .uri("/health")
            .header("x-request-id", "trace-me")
            .body(Body::empty())
            .unwrap();
        let response = demo_app().oneshot(request).await.unwrap();
        assert_eq!(response.headers()["x-request-id"], "trace-me");

        let request = Request::builder().uri("/models").body(Body::empty()).unwrap();
        let response = demo_app().oneshot(request).await.unwrap();
        assert!(response.headers().contains_key("x-request-id"));
    }
}
