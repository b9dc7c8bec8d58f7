//! Thin HTTP client over the users API.
//!
//! Each call checks the status against what the endpoint promises and decodes
//! the body leniently: unknown fields are ignored, `/health` only has to be a
//! JSON object, and `/users` may be a bare array or an object wrapping one in
//! `data` or `users`, so other implementations of the same contract can be
//! checked too.

use std::time::Duration;

use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ConformanceError, Result};

const BODY_EXCERPT: usize = 200;

/// The fields of a user record the suite relies on.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserView {
    pub id: u64,
    pub name: String,
    pub email: String,
}

/// Keys under which an object-shaped list response may carry its users.
const LIST_KEYS: [&str; 2] = ["data", "users"];

#[derive(Debug, Serialize)]
struct UserPayload<'a> {
    name: &'a str,
    email: &'a str,
}

/// Raw response: status and body text.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone)]
pub struct UsersClient {
    http: reqwest::Client,
    base_url: String,
}

impl UsersClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConformanceError::connection(base_url.clone(), &e))?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, format!("{}{}", self.base_url, path))
    }

    /// Send without judging the status.
    async fn send(&self, req: RequestBuilder, path: &str) -> Result<RawResponse> {
        let url = format!("{}{}", self.base_url, path);
        let resp = req
            .send()
            .await
            .map_err(|e| ConformanceError::connection(url.clone(), &e))?;
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| ConformanceError::connection(url, &e))?;
        Ok(RawResponse { status, body })
    }

    /// Send and require one of `expected`.
    async fn expect_status(
        &self,
        method: Method,
        path: &str,
        req: RequestBuilder,
        expected: &[u16],
    ) -> Result<RawResponse> {
        let raw = self.send(req, path).await?;
        if expected.contains(&raw.status) {
            return Ok(raw);
        }
        Err(ConformanceError::UnexpectedStatus {
            method: method.to_string(),
            path: path.to_string(),
            expected: expected
                .iter()
                .map(u16::to_string)
                .collect::<Vec<_>>()
                .join("|"),
            actual: raw.status,
            body: excerpt(&raw.body),
        })
    }

    /// The health body, which only has to be a JSON object.
    pub async fn health(&self) -> Result<Map<String, Value>> {
        let req = self.request(Method::GET, "/health");
        let raw = self.expect_status(Method::GET, "/health", req, &[200]).await?;
        match decode::<Value>("GET /health", &raw.body)? {
            Value::Object(map) => Ok(map),
            other => Err(ConformanceError::schema(
                "GET /health",
                format!("expected a JSON object, got {}", kind_of(&other)),
            )),
        }
    }

    /// Status of `/health` without decoding; used while waiting for startup.
    pub async fn health_status(&self) -> Result<u16> {
        let req = self.request(Method::GET, "/health");
        Ok(self.send(req, "/health").await?.status)
    }

    pub async fn create_user(&self, name: &str, email: &str) -> Result<UserView> {
        let req = self
            .request(Method::POST, "/users")
            .json(&UserPayload { name, email });
        let raw = self.expect_status(Method::POST, "/users", req, &[200, 201]).await?;
        decode("POST /users", &raw.body)
    }

    pub async fn list_users(&self) -> Result<Vec<UserView>> {
        let req = self.request(Method::GET, "/users");
        let raw = self.expect_status(Method::GET, "/users", req, &[200]).await?;
        let body = decode::<Value>("GET /users", &raw.body)?;
        let items = user_list(body)?;
        serde_json::from_value(items)
            .map_err(|e| ConformanceError::schema("GET /users", format!("list entry: {e}")))
    }

    pub async fn get_user(&self, id: u64) -> Result<UserView> {
        let path = format!("/users/{id}");
        let req = self.request(Method::GET, &path);
        let raw = self.expect_status(Method::GET, &path, req, &[200]).await?;
        decode(&format!("GET {path}"), &raw.body)
    }

    /// Fetch a user without judging the status.
    pub async fn get_user_raw(&self, id: u64) -> Result<RawResponse> {
        let path = format!("/users/{id}");
        let req = self.request(Method::GET, &path);
        self.send(req, &path).await
    }

    pub async fn update_user(&self, id: u64, name: &str, email: &str) -> Result<UserView> {
        let path = format!("/users/{id}");
        let req = self
            .request(Method::PUT, &path)
            .json(&UserPayload { name, email });
        let raw = self.expect_status(Method::PUT, &path, req, &[200]).await?;
        decode(&format!("PUT {path}"), &raw.body)
    }

    pub async fn delete_user(&self, id: u64) -> Result<()> {
        let path = format!("/users/{id}");
        let req = self.request(Method::DELETE, &path);
        self.expect_status(Method::DELETE, &path, req, &[200, 204]).await?;
        Ok(())
    }

    /// Raw Prometheus exposition text.
    pub async fn metrics_text(&self) -> Result<String> {
        let req = self.request(Method::GET, "/metrics");
        Ok(self.expect_status(Method::GET, "/metrics", req, &[200]).await?.body)
    }
}

fn decode<T: DeserializeOwned>(context: &str, body: &str) -> Result<T> {
    serde_json::from_str(body)
        .map_err(|e| ConformanceError::schema(context, format!("{e}; body: {}", excerpt(body))))
}

/// The array of users in a list response: the body itself, or its first
/// `data`/`users` member that is an array.
pub fn user_list(body: Value) -> Result<Value> {
    match body {
        Value::Array(_) => Ok(body),
        Value::Object(mut map) => LIST_KEYS
            .iter()
            .find_map(|k| match map.remove(*k) {
                Some(v @ Value::Array(_)) => Some(v),
                _ => None,
            })
            .ok_or_else(|| {
                ConformanceError::schema(
                    "GET /users",
                    format!("object without a {} array", LIST_KEYS.join("/")),
                )
            }),
        other => Err(ConformanceError::schema(
            "GET /users",
            format!("expected an array or object, got {}", kind_of(&other)),
        )),
    }
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn excerpt(body: &str) -> String {
    match body.char_indices().nth(BODY_EXCERPT) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
