//! `RequestGateway` implementation backed by the chat backend's REST API.

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::trace;

use parley_store::gateway::{GatewayError, RequestGateway};
use parley_types::api::{
    EditMessageRequest, EditMessageResponse, ErrorResponse, ReactionRequest, ReactionsResponse,
    SendMessageRequest,
};
use parley_types::models::{Message, Reaction, UserSummary};

pub struct HttpGateway {
    client: Client,
    base_url: String,
    bearer_token: Option<String>,
}

impl HttpGateway {
    /// `base_url` is the API root, e.g. `http://localhost:5001/api`.
    pub fn new(base_url: impl Into<String>, bearer_token: Option<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            bearer_token,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.endpoint(path);
        trace!(%method, %url, "gateway request");
        let mut req = self.client.request(method, url);
        if let Some(token) = &self.bearer_token {
            req = req.bearer_auth(token);
        }
        req
    }

    async fn execute<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, GatewayError> {
        let resp = check_status(send(req).await?).await?;
        let body = resp.json::<T>().await.context("malformed response body")?;
        Ok(body)
    }

    /// Fire a request whose body matters only for the status check.
    async fn execute_unit(&self, req: RequestBuilder) -> Result<(), GatewayError> {
        check_status(send(req).await?).await?;
        Ok(())
    }
}

async fn send(req: RequestBuilder) -> Result<Response, GatewayError> {
    let resp = req.send().await.context("request failed")?;
    Ok(resp)
}

async fn check_status(resp: Response) -> Result<Response, GatewayError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    // The backend reports failures as {"message": "..."}; anything else
    // degrades to an empty message and the store's fixed fallback text.
    let message = resp
        .json::<ErrorResponse>()
        .await
        .map(|e| e.message)
        .unwrap_or_default();
    Err(GatewayError::Status {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl RequestGateway for HttpGateway {
    async fn fetch_users(&self) -> Result<Vec<UserSummary>, GatewayError> {
        self.execute(self.request(Method::GET, "/messages/users")).await
    }

    async fn fetch_messages(&self, peer_id: &str) -> Result<Vec<Message>, GatewayError> {
        self.execute(self.request(Method::GET, &format!("/messages/{peer_id}")))
            .await
    }

    async fn send_message(
        &self,
        peer_id: &str,
        body: &SendMessageRequest,
    ) -> Result<Message, GatewayError> {
        self.execute(
            self.request(Method::POST, &format!("/messages/send/{peer_id}"))
                .json(body),
        )
        .await
    }

    async fn mark_read(&self, peer_id: &str) -> Result<(), GatewayError> {
        self.execute_unit(self.request(Method::POST, &format!("/messages/read/{peer_id}")))
            .await
    }

    async fn add_reaction(
        &self,
        message_id: &str,
        emoji: &str,
    ) -> Result<Vec<Reaction>, GatewayError> {
        let resp: ReactionsResponse = self
            .execute(
                self.request(Method::POST, &format!("/messages/reaction/{message_id}"))
                    .json(&ReactionRequest {
                        emoji: emoji.to_string(),
                    }),
            )
            .await?;
        Ok(resp.reactions)
    }

    async fn remove_reaction(&self, message_id: &str) -> Result<Vec<Reaction>, GatewayError> {
        let resp: ReactionsResponse = self
            .execute(self.request(Method::DELETE, &format!("/messages/reaction/{message_id}")))
            .await?;
        Ok(resp.reactions)
    }

    async fn edit_message(&self, message_id: &str, text: &str) -> Result<Message, GatewayError> {
        let resp: EditMessageResponse = self
            .execute(
                self.request(Method::PUT, &format!("/messages/edit/{message_id}"))
                    .json(&EditMessageRequest {
                        text: text.to_string(),
                    }),
            )
            .await?;
        Ok(resp.message)
    }

    async fn delete_message(&self, message_id: &str) -> Result<(), GatewayError> {
        self.execute_unit(self.request(Method::DELETE, &format!("/messages/delete/{message_id}")))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slash() {
        let gw = HttpGateway::new("http://localhost:5001/api/", None);
        assert_eq!(
            gw.endpoint("/messages/users"),
            "http://localhost:5001/api/messages/users"
        );
    }
}
