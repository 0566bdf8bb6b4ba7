//! Catalog inspection command.
//!
//! Uses the same `COMMERCE_*` variables as the bot and prints the catalog
//! exactly as the bot's menu would see it (repeated names collapsed, ids too
//! long for a button left out).

use storebot::commerce::{CommerceClient, CommerceError};
use storebot::config::{CommerceConfig, ConfigError};
use storebot::controller::Catalog;
use storebot_core::ProductSummary;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Commerce error: {0}")]
    Commerce(#[from] CommerceError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Fetch the catalog and print it.
///
/// # Errors
///
/// Returns `CatalogError` if configuration is missing or the backend call fails.
pub async fn print(json: bool) -> Result<(), CatalogError> {
    let client = CommerceClient::new(CommerceConfig::from_env()?)?;
    let catalog = Catalog::load(&client).await?;
    let products = catalog.products();

    let output = if json {
        serde_json::to_string_pretty(products)?
    } else {
        render_table(products)
    };

    #[allow(clippy::print_stdout)]
    {
        println!("{output}");
    }
    Ok(())
}

fn render_table(products: &[ProductSummary]) -> String {
    let width = products
        .iter()
        .map(|p| p.name.chars().count())
        .max()
        .unwrap_or(0)
        .max("NAME".len());

    std::iter::once(format!("{:<width$}  ID", "NAME"))
        .chain(
            products
                .iter()
                .map(|p| format!("{:<width$}  {}", p.name, p.id)),
        )
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use storebot_core::ProductId;

    use super::*;

    #[test]
    fn test_render_table_aligns_ids() {
        let products = vec![
            ProductSummary {
                id: ProductId::new("p-1"),
                name: "Apple".to_string(),
            },
            ProductSummary {
                id: ProductId::new("p-2"),
                name: "Watermelon".to_string(),
            },
        ];

        assert_eq!(
            render_table(&products),
            "NAME        ID\nApple       p-1\nWatermelon  p-2"
        );
    }

    #[test]
    fn test_render_empty_table() {
        assert_eq!(render_table(&[]), "NAME  ID");
    }
}
