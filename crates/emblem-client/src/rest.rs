//! Async REST client for the platform API.

use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ClientError, Result};
use crate::types::{Channel, Member, Message, Role, Server, User};

const DEFAULT_BASE: &str = "http://localhost:3000/api/v1";

/// Async platform REST client. Cheap to clone; the underlying HTTP client
/// is shared.
#[derive(Clone)]
pub struct RestClient {
    client: Client,
    base_url: String,
}

impl RestClient {
    pub fn new(token: impl Into<String>, base_url: Option<&str>) -> Result<Self> {
        let token = {
            let t = token.into();
            if t.starts_with("Bot ") { t } else { format!("Bot {t}") }
        };
        let client = Client::builder()
            .default_headers({
                let mut headers = reqwest::header::HeaderMap::new();
                headers.insert(
                    reqwest::header::AUTHORIZATION,
                    reqwest::header::HeaderValue::from_str(&token)
                        .map_err(|e| ClientError::Other(e.to_string()))?,
                );
                headers.insert(
                    reqwest::header::CONTENT_TYPE,
                    reqwest::header::HeaderValue::from_static("application/json"),
                );
                headers
            })
            .build()
            .map_err(ClientError::Http)?;

        Ok(Self {
            client,
            base_url: base_url.unwrap_or(DEFAULT_BASE).trim_end_matches('/').to_owned(),
        })
    }

    // ── Internal ──────────────────────────────────────────────────────────

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.request(method, &url);
        if let Some(b) = body {
            req = req.json(b);
        }
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp
                .json::<Value>()
                .await
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_owned))
                .unwrap_or_else(|| status.to_string());
            return Err(ClientError::Api { status: status.as_u16(), message });
        }
        if status == StatusCode::NO_CONTENT {
            return serde_json::from_value(Value::Null).map_err(ClientError::Json);
        }
        Ok(resp.json::<T>().await?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request(Method::GET, path, None).await
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T> {
        self.request(Method::POST, path, Some(body)).await
    }

    async fn put(&self, path: &str) -> Result<()> {
        self.request::<Value>(Method::PUT, path, None).await?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self.client.delete(&url).send().await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            return Err(ClientError::Api { status, message: resp.text().await.unwrap_or_default() });
        }
        Ok(())
    }

    // ── Self ──────────────────────────────────────────────────────────────

    pub async fn current_user(&self) -> Result<User> {
        self.get("/users/@me").await
    }

    pub async fn leave_server(&self, server_id: &str) -> Result<()> {
        self.delete(&format!("/users/@me/servers/{server_id}")).await
    }

    // ── Servers ───────────────────────────────────────────────────────────

    pub async fn get_server(&self, server_id: &str) -> Result<Server> {
        self.get(&format!("/servers/{server_id}")).await
    }

    pub async fn list_channels(&self, server_id: &str) -> Result<Vec<Channel>> {
        self.get(&format!("/servers/{server_id}/channels")).await
    }

    pub async fn get_member(&self, server_id: &str, user_id: &str) -> Result<Member> {
        self.get(&format!("/servers/{server_id}/members/{user_id}")).await
    }

    // ── Roles ─────────────────────────────────────────────────────────────

    pub async fn list_roles(&self, server_id: &str) -> Result<Vec<Role>> {
        self.get(&format!("/servers/{server_id}/roles")).await
    }

    pub async fn create_role(
        &self,
        server_id: &str,
        name: &str,
        color: Option<u32>,
    ) -> Result<Role> {
        let mut body = serde_json::json!({ "name": name });
        if let Some(c) = color {
            body["color"] = serde_json::json!(c);
        }
        self.post(&format!("/servers/{server_id}/roles"), &body).await
    }

    pub async fn add_member_role(
        &self,
        server_id: &str,
        user_id: &str,
        role_id: &str,
    ) -> Result<()> {
        self.put(&format!("/servers/{server_id}/members/{user_id}/roles/{role_id}")).await
    }

    pub async fn remove_member_role(
        &self,
        server_id: &str,
        user_id: &str,
        role_id: &str,
    ) -> Result<()> {
        self.delete(&format!("/servers/{server_id}/members/{user_id}/roles/{role_id}")).await
    }

    // ── Messages ──────────────────────────────────────────────────────────

    pub async fn send_message(&self, channel_id: &str, content: &str) -> Result<Message> {
        self.post(
            &format!("/channels/{channel_id}/messages"),
            &serde_json::json!({ "content": content }),
        )
        .await
    }
}
