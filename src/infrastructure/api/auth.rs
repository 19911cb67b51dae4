#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::ApiError;
use crate::configuration::Config;
use crate::configuration::ConfigKey;

#[derive(Serialize)]
struct SignupBody<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct LoginBody<'a> {
    identifier: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct ForgotBody<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct ResetBody<'a> {
    uid: &'a str,
    token: &'a str,
    password: &'a str,
}

#[derive(Default, Deserialize)]
struct MessageBody {
    message: Option<String>,
    error: Option<String>,
}

/// Thin pass-through over the account endpoints. Each call returns the
/// server's acknowledgement message for the CLI to print.
#[derive(Clone)]
pub struct AuthClient {
    url: String,
    client: reqwest::Client,
}

impl Default for AuthClient {
    fn default() -> AuthClient {
        return AuthClient::with_url(Config::get(ConfigKey::ApiBaseURL));
    }
}

impl AuthClient {
    pub fn with_url(url: String) -> AuthClient {
        return AuthClient {
            url: url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        };
    }

    async fn finish(res: reqwest::Response, fallback: &str) -> Result<String, ApiError> {
        let status = res.status().as_u16();
        let body = res.json::<MessageBody>().await.unwrap_or_default();

        if (200..300).contains(&status) {
            return Ok(body.message.unwrap_or_else(|| return fallback.to_string()));
        }

        return Err(ApiError::Api {
            status,
            message: body.error.unwrap_or_else(|| return "Server error".to_string()),
        });
    }

    pub async fn signup(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<String, ApiError> {
        let res = self
            .client
            .post(format!("{url}/api/auth/signup/", url = self.url))
            .json(&SignupBody {
                username,
                email,
                password,
            })
            .send()
            .await?;

        return AuthClient::finish(res, "Signup successful").await;
    }

    pub async fn login(&self, identifier: &str, password: &str) -> Result<String, ApiError> {
        let res = self
            .client
            .post(format!("{url}/api/auth/login/", url = self.url))
            .json(&LoginBody {
                identifier,
                password,
            })
            .send()
            .await?;

        return AuthClient::finish(res, "Login successful").await;
    }

    pub async fn logout(&self) -> Result<String, ApiError> {
        let res = self
            .client
            .post(format!("{url}/api/auth/logout/", url = self.url))
            .send()
            .await?;

        return AuthClient::finish(res, "Logged out").await;
    }

    pub async fn forgot_password(&self, email: &str) -> Result<String, ApiError> {
        let res = self
            .client
            .post(format!("{url}/api/auth/forgot-password/", url = self.url))
            .json(&ForgotBody { email })
            .send()
            .await?;

        return AuthClient::finish(res, "Password reset email sent").await;
    }

    pub async fn reset_password(
        &self,
        uid: &str,
        token: &str,
        password: &str,
    ) -> Result<String, ApiError> {
        let res = self
            .client
            .post(format!("{url}/api/auth/reset-password/", url = self.url))
            .json(&ResetBody {
                uid,
                token,
                password,
            })
            .send()
            .await?;

        return AuthClient::finish(res, "Password reset successful").await;
    }

    pub async fn delete_account(&self) -> Result<String, ApiError> {
        let res = self
            .client
            .delete(format!("{url}/api/auth/delete-account/", url = self.url))
            .send()
            .await?;

        return AuthClient::finish(res, "Account deleted").await;
    }
}
