use crate::client::ApiClient;
use crate::error::Error;

impl ApiClient {
    /// Liveness probe. `GET /health` answers plain text (`ok`), unenveloped.
    pub async fn health(&self) -> Result<String, Error> {
        let url = self.url("/health")?;
        let body = self.text(url).await?;
        Ok(body.trim().to_owned())
    }
}
