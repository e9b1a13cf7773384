use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use axum_helpers::{ApiJson, errors::ErrorResponse};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::{UserError, UserResult};
use crate::models::{CreateUser, ListUsersQuery, UpdateResponse, UpdateUser, User, UserPage, UserView};
use crate::repository::UserRepository;
use crate::service::UserService;

/// OpenAPI documentation for the Users API
#[derive(OpenApi)]
#[openapi(
    paths(home, create_user, list_users, get_user, update_user),
    components(schemas(
        User,
        UserView,
        CreateUser,
        UpdateUser,
        UserPage,
        UpdateResponse,
        ErrorResponse
    )),
    tags(
        (name = "Users", description = "User record management endpoints (MongoDB)")
    )
)]
pub struct ApiDoc;

/// Create the users router with all HTTP endpoints.
///
/// Paths are absolute; the router is meant to be merged at the application
/// root so the endpoints are served verbatim.
pub fn router<R: UserRepository + 'static>(service: UserService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", get(home))
        .route("/user", post(create_user))
        .route("/users", get(list_users))
        .route("/user/{username}", get(get_user).patch(update_user))
        .with_state(shared_service)
}

/// Welcome/liveness endpoint
#[utoipa::path(
    get,
    path = "/",
    tag = "Users",
    responses(
        (status = 200, description = "Service is up", body = String)
    )
)]
async fn home() -> Json<&'static str> {
    Json("Welcome")
}

/// Create a new user
#[utoipa::path(
    post,
    path = "/user",
    tag = "Users",
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Malformed body or missing field", body = ErrorResponse),
        (status = 409, description = "Username already taken", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
async fn create_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    ApiJson(input): ApiJson<CreateUser>,
) -> UserResult<impl IntoResponse> {
    let user = service.create_user(input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// List users with pagination, filtering, and sorting
#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "One page of users", body = UserPage),
        (status = 400, description = "Invalid query parameter", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
async fn list_users<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    Query(query): Query<ListUsersQuery>,
) -> UserResult<Json<UserPage>> {
    let page = service.list_users(query).await?;
    Ok(Json(page))
}

/// Fetch a user by username
#[utoipa::path(
    get,
    path = "/user/{username}",
    tag = "Users",
    params(
        ("username" = String, Path, description = "Username to look up")
    ),
    responses(
        (status = 200, description = "User found", body = UserView),
        (status = 400, description = "Username not provided", body = ErrorResponse),
        (status = 404, description = "No such user", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
async fn get_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    Path(username): Path<String>,
) -> UserResult<Json<UserView>> {
    if username.is_empty() {
        return Err(UserError::Validation("Username not provided".to_string()));
    }

    let user = service.get_user(&username).await?;
    Ok(Json(user))
}

/// Partially update a user by username
#[utoipa::path(
    patch,
    path = "/user/{username}",
    tag = "Users",
    params(
        ("username" = String, Path, description = "Username to update")
    ),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "Update applied", body = UpdateResponse),
        (status = 400, description = "Malformed body or missing username", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
async fn update_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    Path(username): Path<String>,
    ApiJson(update): ApiJson<UpdateUser>,
) -> UserResult<Json<UpdateResponse>> {
    if username.is_empty() {
        return Err(UserError::Validation("Username not provided".to_string()));
    }

    service.update_user(&username, update).await?;

    Ok(Json(UpdateResponse {
        status: true,
        message: format!("the user {} has been updated successfully", username),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockUserRepository;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::json;
    use tower::ServiceExt; // For oneshot()

    fn app(repo: MockUserRepository) -> Router {
        router(UserService::new(repo))
    }

    async fn body_json(body: Body) -> serde_json::Value {
        let bytes = body.collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn alice() -> User {
        User {
            username: "alice".to_string(),
            expiry_date: 1999999999,
            outputs: vec!["a".to_string(), "b".to_string()],
            password: "pw".to_string(),
        }
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn patch_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("PATCH")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn home_says_welcome() {
        let response = app(MockUserRepository::new()).oneshot(get("/")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response.into_body()).await, json!("Welcome"));
    }

    #[tokio::test]
    async fn create_returns_201_and_echoes_all_fields() {
        let mut repo = MockUserRepository::new();
        repo.expect_exists_by_username().returning(|_| Ok(false));
        repo.expect_insert().returning(|_| Ok(()));

        let request = post_json(
            "/user",
            json!({
                "username": "alice",
                "expiry_date": 1999999999_i64,
                "outputs": ["a", "b"],
                "password": "pw"
            }),
        );
        let response = app(repo).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);

        let body = body_json(response.into_body()).await;
        assert_eq!(body["username"], "alice");
        assert_eq!(body["expiry_date"], 1999999999_i64);
        assert_eq!(body["outputs"], json!(["a", "b"]));
        // The create path is the one place the password is echoed back
        assert_eq!(body["password"], "pw");
    }

    #[tokio::test]
    async fn create_rejects_missing_fields_without_writing() {
        // No expectations: any repository call panics the test
        let cases = [
            (json!({}), "username required"),
            (json!({"username": "x"}), "expiry date required"),
            (
                json!({"username": "x", "expiry_date": 9, "outputs": []}),
                "outputs required",
            ),
            (
                json!({"username": "x", "expiry_date": 9, "outputs": ["a"], "password": ""}),
                "password required",
            ),
        ];

        for (payload, expected) in cases {
            let response = app(MockUserRepository::new())
                .oneshot(post_json("/user", payload))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);

            let body = body_json(response.into_body()).await;
            assert_eq!(body["status"], json!(false));
            assert_eq!(body["message"], expected);
        }
    }

    #[tokio::test]
    async fn create_rejects_a_malformed_body() {
        let request = Request::builder()
            .method("POST")
            .uri("/user")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let response = app(MockUserRepository::new())
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response.into_body()).await;
        assert_eq!(body["message"], "Invalid request format");
    }

    #[tokio::test]
    async fn create_returns_409_for_a_taken_username() {
        let mut repo = MockUserRepository::new();
        repo.expect_exists_by_username().returning(|_| Ok(true));

        let request = post_json(
            "/user",
            json!({
                "username": "alice",
                "expiry_date": 1999999999_i64,
                "outputs": ["a"],
                "password": "pw"
            }),
        );
        let response = app(repo).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body = body_json(response.into_body()).await;
        assert_eq!(body["message"], "Username is not available");
    }

    #[tokio::test]
    async fn create_maps_storage_failures_to_500() {
        let mut repo = MockUserRepository::new();
        repo.expect_exists_by_username().returning(|_| Ok(false));
        repo.expect_insert()
            .returning(|_| Err(UserError::Database("Error adding user".to_string())));

        let request = post_json(
            "/user",
            json!({
                "username": "alice",
                "expiry_date": 1999999999_i64,
                "outputs": ["a"],
                "password": "pw"
            }),
        );
        let response = app(repo).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response.into_body()).await;
        assert_eq!(body["message"], "Error adding user");
    }

    #[tokio::test]
    async fn get_user_omits_the_password() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_username()
            .withf(|username| username == "alice")
            .returning(|_| Ok(Some(alice())));

        let response = app(repo).oneshot(get("/user/alice")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response.into_body()).await;
        assert_eq!(body["username"], "alice");
        assert_eq!(body["expiry_date"], 1999999999_i64);
        assert_eq!(body["outputs"], json!(["a", "b"]));
        assert!(body.get("password").is_none());
    }

    #[tokio::test]
    async fn get_user_returns_404_when_missing() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_username().returning(|_| Ok(None));

        let response = app(repo).oneshot(get("/user/ghost")).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response.into_body()).await;
        assert_eq!(body["status"], json!(false));
        assert_eq!(body["message"], "User not found");
    }

    #[tokio::test]
    async fn list_users_pages_and_counts() {
        let mut repo = MockUserRepository::new();
        repo.expect_count().returning(|_| Ok(5));
        repo.expect_find_page()
            .withf(|query| query.limit == 2 && query.offset == 2)
            .returning(|_| {
                Ok(vec![
                    alice(),
                    User {
                        username: "bob".to_string(),
                        ..alice()
                    },
                ])
            });

        let response = app(repo)
            .oneshot(get("/users?limit=2&page=2&sortBy=username"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response.into_body()).await;
        assert_eq!(body["total_records"], 5);
        assert_eq!(body["total_pages"], 3);
        assert_eq!(body["records"].as_array().unwrap().len(), 2);
        assert!(body["records"][0].get("password").is_none());
    }

    #[tokio::test]
    async fn list_users_rejects_a_bad_limit() {
        let response = app(MockUserRepository::new())
            .oneshot(get("/users?limit=plenty"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response.into_body()).await;
        assert_eq!(body["message"], "Invalid 'limit' parameter");
    }

    #[tokio::test]
    async fn patch_applies_only_the_supplied_fields() {
        let mut repo = MockUserRepository::new();
        repo.expect_apply_update()
            .withf(|username, update| {
                username == "alice"
                    && update.username.is_none()
                    && update.expiry_date.is_none()
                    && update.password.is_none()
                    && update.outputs.as_deref() == Some(&["c".to_string()][..])
            })
            .returning(|_, _| Ok(()));

        let response = app(repo)
            .oneshot(patch_json("/user/alice", json!({"outputs": ["c"]})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response.into_body()).await;
        assert_eq!(body["status"], json!(true));
        assert_eq!(
            body["message"],
            "the user alice has been updated successfully"
        );
    }

    #[tokio::test]
    async fn patch_with_an_empty_body_still_succeeds() {
        let mut repo = MockUserRepository::new();
        repo.expect_apply_update()
            .withf(|_, update| {
                update.username.is_none()
                    && update.expiry_date.is_none()
                    && update.outputs.is_none()
                    && update.password.is_none()
            })
            .returning(|_, _| Ok(()));

        let response = app(repo)
            .oneshot(patch_json("/user/alice", json!({})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn patch_maps_storage_failures_to_500() {
        let mut repo = MockUserRepository::new();
        repo.expect_apply_update()
            .returning(|_, _| Err(UserError::Database("Error updating user".to_string())));

        let response = app(repo)
            .oneshot(patch_json("/user/alice", json!({"password": "new"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
