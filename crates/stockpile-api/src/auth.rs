// Session authentication
//
// Cookie-based register/login/logout. A successful register or login
// sets the `auth_token` cookie in the client's jar; logout asks the
// backend to expire it. There is no client-held token beyond the jar.

use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{Credentials, Message, User};

impl ApiClient {
    /// Create an account. The backend signs the new user in immediately.
    ///
    /// `POST /api/v1/auth/register`
    pub async fn register(&self, credentials: &Credentials) -> Result<Message, Error> {
        debug!(email = %credentials.email, "registering");
        let url = self.api_url("auth/register")?;
        self.post(url, credentials).await
    }

    /// Start a session with email and password.
    ///
    /// `POST /api/v1/auth/login`
    pub async fn login(&self, credentials: &Credentials) -> Result<Message, Error> {
        debug!(email = %credentials.email, "logging in");
        let url = self.api_url("auth/login")?;
        self.post(url, credentials).await
    }

    /// End the current session.
    ///
    /// `POST /api/v1/auth/logout`
    pub async fn logout(&self) -> Result<Message, Error> {
        let url = self.api_url("auth/logout")?;
        self.post_empty(url).await
    }

    /// Fetch the user behind the current session cookie. A 401 means
    /// there is no session.
    ///
    /// `GET /api/v1/auth/me`
    pub async fn me(&self) -> Result<User, Error> {
        let url = self.api_url("auth/me")?;
        self.get(url).await
    }
}
