use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

/// Claims extracted from a verified Google ID token.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleClaims {
    pub sub: String,
    pub aud: String,
    pub email: Option<String>,
    // tokeninfo serves booleans as strings
    pub email_verified: Option<String>,
    pub name: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub picture: Option<String>,
}

impl GoogleClaims {
    pub fn is_email_verified(&self) -> bool {
        self.email_verified.as_deref() == Some("true")
    }
}

#[derive(Debug)]
pub enum GoogleVerifyError {
    InvalidCredential,
    HttpError(String),
}

impl std::fmt::Display for GoogleVerifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GoogleVerifyError::InvalidCredential => write!(f, "Invalid Google credential"),
            GoogleVerifyError::HttpError(e) => write!(f, "HTTP error: {}", e),
        }
    }
}

impl std::error::Error for GoogleVerifyError {}

/// Verifies a Google ID token and returns its claims. Injected into the auth
/// workflow so tests can substitute a fake verifier.
#[async_trait]
pub trait GoogleTokenVerifier: Send + Sync {
    async fn verify(&self, credential: &str) -> Result<GoogleClaims, GoogleVerifyError>;
}

/// Production verifier backed by Google's tokeninfo endpoint, which checks
/// the token signature server-side. The audience check happens here.
pub struct GoogleAuthClient {
    client: Client,
    client_id: String,
    base_url: String,
}

impl GoogleAuthClient {
    pub fn new(client_id: String) -> Self {
        Self {
            client: Client::new(),
            client_id,
            base_url: "https://oauth2.googleapis.com".to_string(),
        }
    }
}

#[async_trait]
impl GoogleTokenVerifier for GoogleAuthClient {
    async fn verify(&self, credential: &str) -> Result<GoogleClaims, GoogleVerifyError> {
        let url = format!("{}/tokeninfo", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("id_token", credential)])
            .send()
            .await
            .map_err(|e| GoogleVerifyError::HttpError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GoogleVerifyError::InvalidCredential);
        }

        let claims: GoogleClaims = response
            .json()
            .await
            .map_err(|_| GoogleVerifyError::InvalidCredential)?;

        if claims.aud != self.client_id {
            return Err(GoogleVerifyError::InvalidCredential);
        }

        Ok(claims)
    }
}
