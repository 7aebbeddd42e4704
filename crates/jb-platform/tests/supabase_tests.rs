//! Supabase Adapter Tests
//!
//! PostgREST store and GoTrue identity provider against a mock HTTP server.

use std::time::Duration;

use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use jb_common::UserRole;
use jb_platform::repository::{DataStore, Filter, PostgrestStore, ProfileRepository, StoreError, Table};
use jb_platform::service::{IdentityError, IdentityProvider, SupabaseAuthProvider};

const TIMEOUT: Duration = Duration::from_secs(2);

fn profile_row(id: Uuid) -> serde_json::Value {
    json!({
        "id": id,
        "email": "seeker@example.com",
        "full_name": "Sam Seeker",
        "role": "job_seeker",
        "skills": null,
        "education": null,
        "experience_years": null,
        "is_verified": false,
        "is_active": true,
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-01-01T00:00:00Z"
    })
}

mod postgrest_tests {
    use super::*;

    fn store(server: &MockServer) -> PostgrestStore {
        PostgrestStore::new(&server.uri(), "anon-key", TIMEOUT, "anon").unwrap()
    }

    #[tokio::test]
    async fn test_find_profile_by_id() {
        let server = MockServer::start().await;
        let id = Uuid::new_v4();

        Mock::given(method("GET"))
            .and(path("/rest/v1/profiles"))
            .and(query_param("id", format!("eq.{}", id)))
            .and(header("apikey", "anon-key"))
            .and(header("authorization", "Bearer anon-key"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Range", "0-0/1")
                    .set_body_json(json!([profile_row(id)])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let repo = ProfileRepository::new(std::sync::Arc::new(store(&server)));
        let profile = repo.find_by_id(id).await.unwrap().unwrap();

        assert_eq!(profile.id, id);
        assert_eq!(profile.role, UserRole::JobSeeker);
        // null array and counter columns decode to their defaults
        assert!(profile.skills.is_empty());
        assert_eq!(profile.experience_years, 0);
    }

    #[tokio::test]
    async fn test_count_reads_content_range() {
        let server = MockServer::start().await;

        Mock::given(method("HEAD"))
            .and(path("/rest/v1/jobs"))
            .and(query_param("is_active", "eq.true"))
            .respond_with(ResponseTemplate::new(200).insert_header("Content-Range", "*/23"))
            .mount(&server)
            .await;

        let total = store(&server)
            .count(Table::Jobs, &[Filter::eq("is_active", true)])
            .await
            .unwrap();
        assert_eq!(total, 23);
    }

    #[tokio::test]
    async fn test_unique_violation_is_distinguished() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/rest/v1/saved_jobs"))
            .and(header("Prefer", "return=representation"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "code": "23505",
                "message": "duplicate key value violates unique constraint",
                "details": "Key (job_id, user_id) already exists."
            })))
            .mount(&server)
            .await;

        let err = store(&server)
            .insert(Table::SavedJobs, json!({ "job_id": Uuid::new_v4(), "user_id": Uuid::new_v4() }))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation { .. }), "{:?}", err);
    }

    #[tokio::test]
    async fn test_client_and_server_faults() {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/rest/v1/jobs"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "code": "22P02",
                "message": "invalid input syntax for type uuid"
            })))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/jobs"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/jobs"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let store = store(&server);

        let err = store
            .update(Table::Jobs, &[Filter::eq("id", "x")], json!({ "title": "t" }))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Rejected { ref code, .. } if code.as_deref() == Some("22P02")));

        let err = store.delete(Table::Jobs, &[Filter::eq("id", "x")]).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));

        let err = store
            .select(Table::Jobs, &jb_platform::repository::Query::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Backend(ref m) if m == "boom"));
    }

    #[tokio::test]
    async fn test_unreachable_store_is_unavailable() {
        // Reserve a free port, then release it so nothing listens there
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let uri = format!("http://127.0.0.1:{}", port);

        let store = PostgrestStore::new(&uri, "anon-key", TIMEOUT, "anon").unwrap();
        let err = store.count(Table::Profiles, &[]).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)), "{:?}", err);
    }
}

mod gotrue_tests {
    use super::*;

    fn provider(server: &MockServer, service_key: Option<&str>) -> SupabaseAuthProvider {
        SupabaseAuthProvider::new(
            &server.uri(),
            "anon-key",
            service_key.map(str::to_string),
            TIMEOUT,
        )
        .unwrap()
    }

    fn session_body(id: Uuid) -> serde_json::Value {
        json!({
            "access_token": "jwt-token",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "refresh",
            "user": { "id": id, "email": "seeker@example.com", "user_metadata": {} }
        })
    }

    #[tokio::test]
    async fn test_verify_token() {
        let server = MockServer::start().await;
        let id = Uuid::new_v4();

        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .and(header("authorization", "Bearer good-token"))
            .and(header("apikey", "anon-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": id,
                "email": "seeker@example.com",
                "user_metadata": { "full_name": "Sam" }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .and(header("authorization", "Bearer bad-token"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "msg": "invalid JWT" })))
            .mount(&server)
            .await;

        let provider = provider(&server, None);

        let user = provider.verify("good-token").await.unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.user_metadata["full_name"], "Sam");

        let err = provider.verify("bad-token").await.unwrap_err();
        assert!(matches!(err, IdentityError::InvalidCredentials(ref m) if m == "invalid JWT"));
    }

    #[tokio::test]
    async fn test_sign_in_maps_bad_password() {
        let server = MockServer::start().await;
        let id = Uuid::new_v4();

        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "password"))
            .and(body_partial_json(json!({ "email": "seeker@example.com", "password": "right" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(session_body(id)))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(body_partial_json(json!({ "password": "wrong" })))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid login credentials"
            })))
            .mount(&server)
            .await;

        let provider = provider(&server, None);

        let outcome = provider.sign_in("seeker@example.com", "right").await.unwrap();
        assert_eq!(outcome.user.id, id);
        assert_eq!(outcome.session.access_token, "jwt-token");

        let err = provider.sign_in("seeker@example.com", "wrong").await.unwrap_err();
        assert!(matches!(err, IdentityError::InvalidCredentials(ref m) if m == "Invalid login credentials"));
    }

    #[tokio::test]
    async fn test_sign_up_with_and_without_confirmation() {
        let server = MockServer::start().await;
        let id = Uuid::new_v4();

        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .and(body_partial_json(json!({ "email": "auto@example.com" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(session_body(id)))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .and(body_partial_json(json!({ "email": "confirm@example.com" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": id,
                "email": "confirm@example.com"
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .and(body_partial_json(json!({ "email": "taken@example.com" })))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({ "msg": "User already registered" })))
            .mount(&server)
            .await;

        let provider = provider(&server, None);

        let auto = provider.sign_up("auto@example.com", "secret123", json!({})).await.unwrap();
        assert!(auto.session.is_some());

        let pending = provider.sign_up("confirm@example.com", "secret123", json!({})).await.unwrap();
        assert!(pending.session.is_none());
        assert_eq!(pending.user.unwrap().id, id);

        let err = provider.sign_up("taken@example.com", "secret123", json!({})).await.unwrap_err();
        assert!(matches!(err, IdentityError::Rejected(ref m) if m == "User already registered"));
    }

    #[tokio::test]
    async fn test_outage_is_unavailable() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = provider(&server, None).verify("token").await.unwrap_err();
        assert!(matches!(err, IdentityError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_delete_user_uses_service_key() {
        let server = MockServer::start().await;
        let id = Uuid::new_v4();

        Mock::given(method("DELETE"))
            .and(path(format!("/auth/v1/admin/users/{}", id)))
            .and(header("authorization", "Bearer service-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        provider(&server, Some("service-key")).delete_user(id).await.unwrap();

        let err = provider(&server, None).delete_user(id).await.unwrap_err();
        assert!(matches!(err, IdentityError::Backend(_)));
    }
}
