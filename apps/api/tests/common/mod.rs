//! Common test utilities for API integration tests
//!
//! [`TestApp`] builds the full router over an in-memory store and a
//! temporary upload directory, and the helpers drive it with `oneshot`.

#![allow(dead_code)]

use std::sync::Arc;

use argon2::{Algorithm, Argon2, Params, Version};
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use quill_api::repositories::MemoryStore;
use quill_api::services::{AssetConfig, TokenConfig};
use quill_api::{build_router, AppComponents, RouterOptions};

/// JWT secret for testing (at least 32 characters)
pub const TEST_JWT_SECRET: &str = "test-jwt-secret-for-integration-tests-minimum-32-chars";

pub const TEST_PASSWORD: &str = "correct horse battery";

/// Argon2 with the smallest parameters that still verify real hashes
pub fn cheap_argon2() -> Argon2<'static> {
    Argon2::new(
        Algorithm::Argon2id,
        Version::V0x13,
        Params::new(1024, 1, 1, None).unwrap(),
    )
}

/// A fully wired app over an in-memory store
pub struct TestApp {
    pub router: Router,
    pub store: MemoryStore,
    pub components: AppComponents,
    /// Keeps the upload directory alive for the test's duration
    pub upload_dir: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_page_size(2)
    }

    pub fn with_page_size(page_size: i64) -> Self {
        Self::with_options(page_size, RouterOptions::default())
    }

    /// App whose uploads are capped at `max_upload_bytes`
    pub fn with_upload_limit(max_upload_bytes: usize) -> Self {
        Self::with_options(
            2,
            RouterOptions {
                max_upload_bytes,
                ..RouterOptions::default()
            },
        )
    }

    pub fn with_options(page_size: i64, options: RouterOptions) -> Self {
        let store = MemoryStore::new();
        let upload_dir = tempfile::tempdir().unwrap();

        let components = AppComponents::assemble(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            TokenConfig::new(TEST_JWT_SECRET),
            AssetConfig::new(upload_dir.path()),
            page_size,
            cheap_argon2(),
        )
        .unwrap();

        let router = build_router(components.clone(), options);

        Self {
            router,
            store,
            components,
            upload_dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Execute a GraphQL operation and return the parsed body
    pub async fn graphql(&self, query: &str, variables: Value, token: Option<&str>) -> Value {
        let response = self
            .send(graphql_request(query, variables, token))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await
    }

    /// Register a user through `createUser` and return its id
    pub async fn create_user(&self, name: &str, email: &str) -> String {
        let body = self
            .graphql(
                r#"mutation($input: UserInputData!) {
                    createUser(userInput: $input) { _id }
                }"#,
                json!({ "input": { "name": name, "email": email, "password": TEST_PASSWORD } }),
                None,
            )
            .await;
        assert_no_errors(&body);
        body["data"]["createUser"]["_id"].as_str().unwrap().to_string()
    }

    /// Log in through the `login` query and return the token
    pub async fn login(&self, email: &str) -> String {
        let body = self
            .graphql(
                r#"query($email: String!, $password: String!) {
                    login(email: $email, password: $password) { token userId }
                }"#,
                json!({ "email": email, "password": TEST_PASSWORD }),
                None,
            )
            .await;
        assert_no_errors(&body);
        body["data"]["login"]["token"].as_str().unwrap().to_string()
    }

    /// Register and log in, returning `(user_id, token)`
    pub async fn signed_up(&self, name: &str, email: &str) -> (String, String) {
        let id = self.create_user(name, email).await;
        let token = self.login(email).await;
        (id, token)
    }

    /// Create a post as the token's owner and return its id
    pub async fn create_post(&self, token: &str, title: &str, image_url: Option<&str>) -> String {
        let body = self
            .graphql(
                r#"mutation($input: PostInputData!) {
                    createPost(postInput: $input) { _id }
                }"#,
                json!({ "input": { "title": title, "content": "Some content", "imageUrl": image_url } }),
                Some(token),
            )
            .await;
        assert_no_errors(&body);
        body["data"]["createPost"]["_id"].as_str().unwrap().to_string()
    }

    /// Upload an image through `PUT /post-image` and return the stored path
    pub async fn upload(&self, token: &str, file_name: &str, old_path: Option<&str>) -> String {
        let mut parts = vec![MultipartPart::file("image", file_name, "image/png", b"\x89PNG fake")];
        if let Some(old_path) = old_path {
            parts.push(MultipartPart::text("oldPath", old_path));
        }

        let response = self.send(upload_request(&parts, Some(token))).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        body["filePath"].as_str().unwrap().to_string()
    }

    /// Whether a stored image path exists on disk
    pub fn image_exists(&self, stored: &str) -> bool {
        self.components
            .assets
            .resolve(stored)
            .map(|path| path.exists())
            .unwrap_or(false)
    }
}

pub fn graphql_request(query: &str, variables: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/graphql")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let body = json!({ "query": query, "variables": variables });
    builder
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

pub const BOUNDARY: &str = "quill-test-boundary";

/// One part of a hand-built multipart body
pub struct MultipartPart<'a> {
    name: &'a str,
    file_name: Option<&'a str>,
    content_type: Option<&'a str>,
    bytes: &'a [u8],
}

impl<'a> MultipartPart<'a> {
    pub fn file(name: &'a str, file_name: &'a str, content_type: &'a str, bytes: &'a [u8]) -> Self {
        Self {
            name,
            file_name: Some(file_name),
            content_type: Some(content_type),
            bytes,
        }
    }

    pub fn text(name: &'a str, value: &'a str) -> Self {
        Self {
            name,
            file_name: None,
            content_type: None,
            bytes: value.as_bytes(),
        }
    }
}

pub fn multipart_body(parts: &[MultipartPart<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        let disposition = match part.file_name {
            Some(file_name) => format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                part.name, file_name
            ),
            None => format!("Content-Disposition: form-data; name=\"{}\"\r\n", part.name),
        };
        body.extend_from_slice(disposition.as_bytes());
        if let Some(content_type) = part.content_type {
            body.extend_from_slice(format!("Content-Type: {}\r\n", content_type).as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(part.bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn upload_request(parts: &[MultipartPart<'_>], token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("PUT")
        .uri("/post-image")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(multipart_body(parts))).unwrap()
}

/// Parse response body as JSON
pub async fn body_json(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

pub fn assert_no_errors(body: &Value) {
    assert!(body.get("errors").is_none(), "unexpected errors: {}", body);
}

/// The first error's `code`, or panic if the response succeeded
pub fn error_code(body: &Value) -> u64 {
    body["errors"][0]["code"]
        .as_u64()
        .unwrap_or_else(|| panic!("expected an error, got {}", body))
}
