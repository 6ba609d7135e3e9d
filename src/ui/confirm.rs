//! Collecting product lines for a move into won.

use anyhow::{Context, Result, bail};
use dialoguer::{Input, MultiSelect, theme::ColorfulTheme};

use crate::board::models::{ConfirmedProduct, Product, WonConfirmation};

/// Parse a `--product <id>:<qty>` argument. A bare `<id>` means quantity 1.
pub fn parse_product_arg(arg: &str) -> Result<(String, u32)> {
    let (id, qty) = match arg.rsplit_once(':') {
        Some((id, qty)) => {
            let qty = qty
                .trim()
                .parse::<u32>()
                .with_context(|| format!("Invalid quantity in '{}'", arg))?;
            (id.trim(), qty)
        }
        None => (arg.trim(), 1),
    };
    if id.is_empty() {
        bail!("Missing product id in '{}'", arg);
    }
    Ok((id.to_string(), qty))
}

/// Build a confirmation from `--product` arguments, labelling lines from the catalog.
///
/// Ids missing from the catalog are kept with the id as label; the backend
/// has the final say on them.
pub fn resolve_products(args: &[String], catalog: &[Product]) -> Result<WonConfirmation> {
    let mut lines = Vec::with_capacity(args.len());
    for arg in args {
        let (id, quantity) = parse_product_arg(arg)?;
        let label = catalog
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| id.clone());
        lines.push(ConfirmedProduct::new(id, label, quantity));
    }
    Ok(WonConfirmation::new(lines))
}

/// Ask which products were sold and in what quantity.
///
/// Returns `None` when the user selects nothing, which is treated as
/// dismissing the dialog.
pub fn prompt_won_confirmation(catalog: &[Product]) -> Result<Option<WonConfirmation>> {
    if catalog.is_empty() {
        bail!("The product catalog is empty; pass --product <id>:<qty> instead");
    }
    let theme = ColorfulTheme::default();
    let names: Vec<String> = catalog.iter().map(|p| p.name.clone()).collect();

    let picked = MultiSelect::with_theme(&theme)
        .with_prompt("Confirm products for this won lead (space to select)")
        .items(&names)
        .interact()?;
    if picked.is_empty() {
        return Ok(None);
    }

    let mut lines = Vec::with_capacity(picked.len());
    for i in picked {
        let product = &catalog[i];
        let quantity: u32 = Input::with_theme(&theme)
            .with_prompt(format!("Quantity of {}", product.name))
            .default(1)
            .validate_with(|q: &u32| if *q >= 1 { Ok(()) } else { Err("Quantity must be at least 1") })
            .interact_text()?;
        lines.push(ConfirmedProduct::new(product.id.clone(), product.name.clone(), quantity));
    }
    Ok(Some(WonConfirmation::new(lines)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<Product> {
        vec![Product {
            id: "p1".into(),
            name: "Widget".into(),
            price: None,
            stock: None,
            description: None,
        }]
    }

    #[test]
    fn test_parse_product_arg() {
        assert_eq!(parse_product_arg("p1:3").unwrap(), ("p1".to_string(), 3));
        assert_eq!(parse_product_arg("p1").unwrap(), ("p1".to_string(), 1));
        assert_eq!(parse_product_arg(" p1 : 2 ").unwrap(), ("p1".to_string(), 2));
    }

    #[test]
    fn test_parse_product_arg_rejects_garbage() {
        assert!(parse_product_arg("p1:many").is_err());
        assert!(parse_product_arg(":2").is_err());
        assert!(parse_product_arg("p1:-1").is_err());
    }

    #[test]
    fn test_zero_quantity_parses_but_fails_validation() {
        let confirmation = resolve_products(&["p1:0".to_string()], &catalog()).unwrap();
        assert!(confirmation.validate().is_err());
    }

    #[test]
    fn test_resolve_products_labels_from_catalog() {
        let confirmation =
            resolve_products(&["p1:2".to_string(), "p9".to_string()], &catalog()).unwrap();
        assert_eq!(
            confirmation.products,
            vec![
                ConfirmedProduct::new("p1", "Widget", 2),
                ConfirmedProduct::new("p9", "p9", 1),
            ]
        );
    }
}
