// Product CRUD endpoints

use url::Url;

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{CreateProduct, Product, UpdateProduct};

impl ApiClient {
    /// List the current user's products.
    ///
    /// The backend may encode an empty list as `null`; that comes back as
    /// an empty `Vec`.
    pub async fn list_products(&self) -> Result<Vec<Product>, Error> {
        let url = self.api_url("products")?;
        let products: Option<Vec<Product>> = self.get(url).await?;
        Ok(products.unwrap_or_default())
    }

    pub async fn get_product(&self, id: &str) -> Result<Product, Error> {
        let url = self.product_url(id)?;
        self.get(url).await
    }

    pub async fn create_product(&self, product: &CreateProduct) -> Result<Product, Error> {
        let url = self.api_url("products")?;
        self.post(url, product).await
    }

    pub async fn update_product(
        &self,
        id: &str,
        update: &UpdateProduct,
    ) -> Result<Product, Error> {
        let url = self.product_url(id)?;
        self.put(url, update).await
    }

    /// Delete a product. Answers 204; any body is ignored.
    pub async fn delete_product(&self, id: &str) -> Result<(), Error> {
        let url = self.product_url(id)?;
        self.delete_empty(url).await
    }

    /// `{base}/api/v1/products/{id}` with `id` kept to one encoded segment.
    fn product_url(&self, id: &str) -> Result<Url, Error> {
        if matches!(id, "" | "." | "..") {
            return Err(Error::InvalidId(id.to_owned()));
        }
        let mut url = self.api_url("products")?;
        url.path_segments_mut()
            .map_err(|()| Error::InvalidId(id.to_owned()))?
            .push(id);
        Ok(url)
    }
}
