use anyhow::{Context, Result};

use foodlog_core::models::Product;
use foodlog_core::openfoodfacts::{ProductResponse, SearchResponse, product_from_data};
use foodlog_core::service::FoodLookupProvider;

const SEARCH_URL: &str = "https://world.openfoodfacts.org/cgi/search.pl";
const PRODUCT_URL: &str = "https://world.openfoodfacts.org/api/v2/product";

pub struct OpenFoodFactsClient {
    client: reqwest::Client,
}

impl OpenFoodFactsClient {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!(
                "foodlog-cli/{} (calorie tracker)",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(std::time::Duration::from_secs(10))
            .connect_timeout(std::time::Duration::from_secs(5))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }

    pub async fn search_async(&self, query: &str) -> Result<Vec<Product>> {
        tracing::debug!(query, "searching OpenFoodFacts");
        let resp = self
            .client
            .get(SEARCH_URL)
            .query(&[
                ("search_terms", query),
                ("json", "1"),
                ("page_size", "10"),
                ("fields", "code,product_name,nutriments"),
            ])
            .send()
            .await
            .context("Failed to reach OpenFoodFacts API")?;

        let data: SearchResponse = resp
            .json()
            .await
            .context("Failed to parse OpenFoodFacts search response")?;

        Ok(data
            .products
            .into_iter()
            .filter_map(|p| product_from_data(p, None))
            .collect())
    }

    pub async fn lookup_barcode_async(&self, barcode: &str) -> Result<Option<Product>> {
        tracing::debug!(barcode, "looking up barcode");
        let url = format!("{PRODUCT_URL}/{barcode}.json");
        let resp = self
            .client
            .get(&url)
            .query(&[("fields", "code,product_name,nutriments")])
            .send()
            .await
            .context("Failed to reach OpenFoodFacts API")?;

        let data: ProductResponse = resp
            .json()
            .await
            .context("Failed to parse OpenFoodFacts barcode response")?;

        if data.status != 1 {
            return Ok(None);
        }

        Ok(data
            .product
            .and_then(|p| product_from_data(p, Some(barcode))))
    }
}

// The CLI runs on the multi-threaded tokio runtime, so blocking a worker on the
// request is allowed via `block_in_place`.
impl FoodLookupProvider for OpenFoodFactsClient {
    fn search(&self, query: &str) -> Result<Vec<Product>> {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(self.search_async(query))
        })
    }

    fn lookup_barcode(&self, barcode: &str) -> Result<Option<Product>> {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(self.lookup_barcode_async(barcode))
        })
    }
}
