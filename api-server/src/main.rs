mod clock;
mod config;
mod handlers;
mod response;
mod store;
mod types;
mod verifier;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};

use config::{AppState, ServerConfig};
use handlers::{get_leaderboard, health, json_payload_error, method_not_allowed, submit_score};
use store::ScoreStore;

fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health)).service(
        web::resource("/api/verify-score")
            .route(web::get().to(get_leaderboard))
            .route(web::post().to(submit_score))
            .default_service(web::to(method_not_allowed)),
    );
}

/// `*` opens CORS to every origin and turns credentials off; browsers refuse
/// credentialed wildcard responses.
fn cors_for(allowed_origins: &[String]) -> Cors {
    let base = if config::allows_any_origin(allowed_origins) {
        Cors::default().allow_any_origin()
    } else {
        allowed_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .supports_credentials()
    };
    base.allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allow_any_header()
        .max_age(3600)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    verifier::install_crypto_provider();

    let config = ServerConfig::from_env();
    let store = ScoreStore::open(&config.scores_file).map_err(std::io::Error::other)?;

    tracing::info!(
        "starting invaders score gateway: bind_addr={} scores_file={} verifier={} origins={:?} leaderboard_size={}",
        config.bind_addr,
        store.path().display(),
        config.verifier.name(),
        config.allowed_origins,
        config.leaderboard_size
    );

    let state = AppState {
        store: Arc::new(store),
        verifier: Arc::new(config.verifier.clone()),
        leaderboard_size: config.leaderboard_size,
    };
    let allowed_origins = config.allowed_origins.clone();
    let json_limit = config.json_limit;

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .app_data(
                web::JsonConfig::default()
                    .limit(json_limit)
                    .error_handler(json_payload_error),
            )
            .wrap(cors_for(&allowed_origins))
            .wrap(middleware::Logger::default())
            .configure(configure_routes)
    })
    .bind(config.bind_addr.as_str())?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verifier::ProofVerifier;
    use actix_web::{
        http::{header, StatusCode},
        test as awtest,
    };
    use serde_json::{json, Value};
    use tempfile::TempDir;

    fn test_state(verifier: ProofVerifier, dir: &TempDir) -> AppState {
        AppState {
            store: Arc::new(ScoreStore::open(&dir.path().join("scores.json")).unwrap()),
            verifier: Arc::new(verifier),
            leaderboard_size: 10,
        }
    }

    macro_rules! test_app {
        ($state:expr) => {
            awtest::init_service(
                App::new()
                    .app_data(web::Data::new($state))
                    .app_data(web::JsonConfig::default().error_handler(json_payload_error))
                    .configure(configure_routes),
            )
            .await
        };
    }

    fn submission(score: u64, nullifier: &str) -> Value {
        json!({
            "score": score,
            "nullifier_hash": nullifier,
            "verification_level": "orb",
            "merkle_root": "0xroot",
            "proof": "0xproof",
        })
    }

    #[actix_web::test]
    async fn health_reports_verifier_and_store() {
        let dir = TempDir::new().unwrap();
        let app = test_app!(test_state(ProofVerifier::DevAccept, &dir));

        let req = awtest::TestRequest::get().uri("/health").to_request();
        let body: Value = awtest::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["verifier"], "dev_accept");
        assert_eq!(body["stored_scores"], 0);
    }

    #[actix_web::test]
    async fn empty_leaderboard_is_an_empty_array() {
        let dir = TempDir::new().unwrap();
        let app = test_app!(test_state(ProofVerifier::DevAccept, &dir));

        let req = awtest::TestRequest::get()
            .uri("/api/verify-score")
            .to_request();
        let body: Value = awtest::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!([]));
    }

    #[actix_web::test]
    async fn verified_submission_is_ranked_and_listed() {
        let dir = TempDir::new().unwrap();
        let app = test_app!(test_state(ProofVerifier::DevAccept, &dir));

        for (score, nullifier) in [(500, "0xaa"), (300, "0xbb")] {
            let req = awtest::TestRequest::post()
                .uri("/api/verify-score")
                .set_json(submission(score, nullifier))
                .to_request();
            let resp = awtest::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
        }

        let req = awtest::TestRequest::post()
            .uri("/api/verify-score")
            .set_json(submission(700, "0xcc"))
            .to_request();
        let body: Value = awtest::call_and_read_body_json(&app, req).await;
        assert_eq!(
            body,
            json!({
                "success": true,
                "verifiedScore": 700,
                "nullifierHash": "0xcc",
                "leaderboardPosition": 1,
            })
        );

        let req = awtest::TestRequest::get()
            .uri("/api/verify-score")
            .to_request();
        let board: Value = awtest::call_and_read_body_json(&app, req).await;
        let scores: Vec<u64> = board
            .as_array()
            .unwrap()
            .iter()
            .map(|entry| entry["score"].as_u64().unwrap())
            .collect();
        assert_eq!(scores, vec![700, 500, 300]);
        assert_eq!(board[0]["nullifierHash"], "0xcc");
        assert_eq!(board[0]["verificationLevel"], "orb");
        assert!(board[0]["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[actix_web::test]
    async fn lower_resubmission_keeps_stored_score() {
        let dir = TempDir::new().unwrap();
        let state = test_state(ProofVerifier::DevAccept, &dir);
        let store = state.store.clone();
        let app = test_app!(state);

        for score in [900, 400] {
            let req = awtest::TestRequest::post()
                .uri("/api/verify-score")
                .set_json(submission(score, "0xaa"))
                .to_request();
            let body: Value = awtest::call_and_read_body_json(&app, req).await;
            assert_eq!(body["verifiedScore"], score);
            assert_eq!(body["leaderboardPosition"], 1);
        }

        let board = store.leaderboard(10).unwrap();
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].score, 900);
    }

    #[actix_web::test]
    async fn rejected_proof_is_400_and_not_stored() {
        let dir = TempDir::new().unwrap();
        let state = test_state(ProofVerifier::Reject("invalid_merkle_root"), &dir);
        let store = state.store.clone();
        let app = test_app!(state);

        let req = awtest::TestRequest::post()
            .uri("/api/verify-score")
            .set_json(submission(1_000, "0xaa"))
            .to_request();
        let resp = awtest::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = awtest::read_body_json(resp).await;
        assert_eq!(body["error"], "Invalid proof");
        assert_eq!(store.count().unwrap(), 0);
    }

    #[actix_web::test]
    async fn unreachable_verifier_is_500() {
        let dir = TempDir::new().unwrap();
        let verifier = ProofVerifier::Cloud(crate::verifier::CloudVerifier {
            api_base: "http://127.0.0.1:9".to_string(),
            app_id: "app_test".to_string(),
            action: "submit_high_score".to_string(),
            timeout: std::time::Duration::from_secs(1),
        });
        let app = test_app!(test_state(verifier, &dir));

        let req = awtest::TestRequest::post()
            .uri("/api/verify-score")
            .set_json(submission(1_000, "0xaa"))
            .to_request();
        let resp = awtest::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: Value = awtest::read_body_json(resp).await;
        assert_eq!(body["error"], "Internal server error");
    }

    #[actix_web::test]
    async fn other_methods_are_405() {
        let dir = TempDir::new().unwrap();
        let app = test_app!(test_state(ProofVerifier::DevAccept, &dir));

        for req in [
            awtest::TestRequest::put().uri("/api/verify-score"),
            awtest::TestRequest::delete().uri("/api/verify-score"),
        ] {
            let resp = awtest::call_service(&app, req.to_request()).await;
            assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
            let body: Value = awtest::read_body_json(resp).await;
            assert_eq!(body["error"], "Method not allowed");
        }
    }

    #[actix_web::test]
    async fn malformed_bodies_are_400() {
        let dir = TempDir::new().unwrap();
        let app = test_app!(test_state(ProofVerifier::DevAccept, &dir));

        let mut negative = submission(0, "0xaa");
        negative["score"] = json!(-5);
        let mut fractional = submission(0, "0xaa");
        fractional["score"] = json!(12.5);

        for body in [negative, fractional, json!({ "score": 10 })] {
            let req = awtest::TestRequest::post()
                .uri("/api/verify-score")
                .set_json(body)
                .to_request();
            let resp = awtest::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            let body: Value = awtest::read_body_json(resp).await;
            assert_eq!(body["error_code"], "invalid_body");
        }

        let req = awtest::TestRequest::post()
            .uri("/api/verify-score")
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = awtest::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn empty_nullifier_is_400() {
        let dir = TempDir::new().unwrap();
        let app = test_app!(test_state(ProofVerifier::DevAccept, &dir));

        let req = awtest::TestRequest::post()
            .uri("/api/verify-score")
            .set_json(submission(100, "  "))
            .to_request();
        let resp = awtest::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = awtest::read_body_json(resp).await;
        assert_eq!(body["error_code"], "missing_nullifier_hash");
    }

    #[actix_web::test]
    async fn leaderboard_is_capped_at_configured_size() {
        let dir = TempDir::new().unwrap();
        let mut state = test_state(ProofVerifier::DevAccept, &dir);
        state.leaderboard_size = 3;
        let app = test_app!(state);

        for i in 0..5u64 {
            let req = awtest::TestRequest::post()
                .uri("/api/verify-score")
                .set_json(submission(100 * (i + 1), &format!("0x{i:02x}")))
                .to_request();
            let resp = awtest::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
        }

        let req = awtest::TestRequest::get()
            .uri("/api/verify-score")
            .to_request();
        let board: Value = awtest::call_and_read_body_json(&app, req).await;
        assert_eq!(board.as_array().unwrap().len(), 3);
        assert_eq!(board[0]["score"], 500);
    }

    macro_rules! cors_app {
        ($origins:expr, $dir:expr) => {
            awtest::init_service(
                App::new()
                    .app_data(web::Data::new(test_state(ProofVerifier::DevAccept, $dir)))
                    .wrap(cors_for($origins))
                    .configure(configure_routes),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn configured_origins_get_credentialed_cors() {
        let dir = TempDir::new().unwrap();
        let origins = config::parse_origin_list(config::DEFAULT_ALLOWED_ORIGINS);
        let app = cors_app!(&origins, &dir);

        let req = awtest::TestRequest::get()
            .uri("/health")
            .insert_header((header::ORIGIN, "http://localhost:5173"))
            .to_request();
        let resp = awtest::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let headers = resp.headers();
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:5173"
        );
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
            "true"
        );
    }

    #[actix_web::test]
    async fn wildcard_origin_serves_any_site_without_credentials() {
        let dir = TempDir::new().unwrap();
        let origins = config::parse_origin_list("*");
        let app = cors_app!(&origins, &dir);

        let req = awtest::TestRequest::get()
            .uri("/health")
            .insert_header((header::ORIGIN, "https://elsewhere.example"))
            .to_request();
        let resp = awtest::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let headers = resp.headers();
        assert!(headers.contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
        assert!(!headers.contains_key(header::ACCESS_CONTROL_ALLOW_CREDENTIALS));
    }
}
