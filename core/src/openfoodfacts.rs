use serde::Deserialize;

use crate::models::Product;

const KJ_PER_KCAL: f64 = 4.184;

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub products: Vec<ProductData>,
}

#[derive(Debug, Deserialize)]
pub struct ProductResponse {
    #[serde(default)]
    pub status: i32,
    pub product: Option<ProductData>,
}

#[derive(Debug, Deserialize)]
pub struct ProductData {
    pub product_name: Option<String>,
    pub code: Option<String>,
    pub nutriments: Option<Nutriments>,
}

#[derive(Debug, Deserialize)]
pub struct Nutriments {
    #[serde(rename = "energy-kcal_100g")]
    pub energy_kcal_100g: Option<f64>,
    #[serde(rename = "energy-kj_100g")]
    pub energy_kj_100g: Option<f64>,
}

impl Nutriments {
    /// kcal per 100 g, converted from kJ when only that is given.
    #[must_use]
    pub fn kcal_per_100g(&self) -> Option<f64> {
        self.energy_kcal_100g
            .or_else(|| self.energy_kj_100g.map(|kj| kj / KJ_PER_KCAL))
    }
}

/// Map an `OpenFoodFacts` product to a catalog [`Product`]. Products without a
/// name or any energy value are dropped. `fallback_code` is used when the payload
/// carries no code (barcode lookups).
#[must_use]
pub fn product_from_data(p: ProductData, fallback_code: Option<&str>) -> Option<Product> {
    let name = p.product_name.filter(|n| !n.trim().is_empty())?;
    let kcal_per_100g = p.nutriments?.kcal_per_100g()?;
    let code = p
        .code
        .filter(|c| !c.is_empty())
        .or_else(|| fallback_code.map(str::to_string))
        .unwrap_or_default();

    Some(Product {
        code,
        name,
        kcal_per_100g,
    })
}
