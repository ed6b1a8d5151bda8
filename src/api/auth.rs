//! Authentication endpoints

use reqwest::Method;

use super::client::ApiClient;
use super::dto::{Token, User, UserCreate};
use super::error::ApiResult;

impl ApiClient {
    /// Exchange email and password for a bearer token
    ///
    /// The backend expects an OAuth2 password form, with the email as
    /// `username`.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<Token> {
        let form = [("username", email), ("password", password)];
        let token: Token = self
            .send_json(self.request(Method::POST, "/auth/token").form(&form))
            .await?;
        tracing::info!(email, expires_in = token.expires_in, "Logged in");
        Ok(token)
    }

    pub async fn register(&self, user: &UserCreate) -> ApiResult<User> {
        self.send_json(self.request(Method::POST, "/auth/register").json(user))
            .await
    }

    /// Account behind the current token
    pub async fn me(&self) -> ApiResult<User> {
        self.send_json(self.request(Method::GET, "/auth/me")).await
    }

    pub async fn update_profile(&self, user: &UserCreate) -> ApiResult<User> {
        self.send_json(self.request(Method::PUT, "/auth/profile").json(user))
            .await
    }
}
