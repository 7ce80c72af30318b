use anyhow::Result;
use std::process;

use foodlog_core::service::{FoodLog, FoodLookupProvider};

use super::helpers::print_product_table;

pub(crate) fn cmd_search(
    log: &FoodLog,
    catalog: &dyn FoodLookupProvider,
    query: &str,
    json: bool,
) -> Result<()> {
    let products = log.search_products(catalog, query)?;

    if products.is_empty() {
        if json {
            println!("[]");
        } else {
            eprintln!("No results found for '{query}'");
        }
        process::exit(2);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&products)?);
    } else {
        print_product_table(&products);
    }

    Ok(())
}
