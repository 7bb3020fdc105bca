//! Product command handlers.

use tabled::Tabled;

use stockpile_core::{Client, CreateProduct, EMPTY_PLACEHOLDER, Product, UpdateProduct};

use crate::cli::{GlobalOpts, ProductsArgs, ProductsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ProductRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Stock")]
    stock: i32,
    #[tabled(rename = "Updated")]
    updated: String,
}

impl From<&Product> for ProductRow {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            description: p.description.display_or(EMPTY_PLACEHOLDER).to_owned(),
            price: p.price.clone(),
            stock: p.stock,
            updated: short_timestamp(&p.updated_at),
        }
    }
}

/// RFC 3339 timestamps shortened to minutes; anything else passes through.
fn short_timestamp(raw: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(raw).map_or_else(
        |_| raw.to_owned(),
        |ts| ts.format("%Y-%m-%d %H:%M").to_string(),
    )
}

fn detail(p: &Product) -> String {
    output::detail_block(&[
        ("ID", p.id.clone()),
        ("Name", p.name.clone()),
        (
            "Description",
            p.description.display_or(EMPTY_PLACEHOLDER).to_owned(),
        ),
        ("Price", p.price.clone()),
        ("Stock", p.stock.to_string()),
        ("Created", short_timestamp(&p.created_at)),
        ("Updated", short_timestamp(&p.updated_at)),
    ])
}

fn print_product(p: &Product, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_single(&global.output, p, detail, |p| p.id.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    client: &Client,
    args: ProductsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ProductsCommand::List => {
            let spinner = output::spinner(global, "Loading products");
            let products = client.products().await;
            spinner.finish_and_clear();
            let products = products?;

            let out = output::render_list(
                &global.output,
                products.as_slice(),
                |p| ProductRow::from(p),
                |p| p.id.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ProductsCommand::Get { id } => {
            let product = client.product(&id).await?;
            print_product(&product, global)
        }

        ProductsCommand::Create {
            name,
            price,
            description,
            stock,
        } => {
            util::require(&[name.as_str(), price.as_str()], "Name and price are required")?;
            let request = CreateProduct {
                name: name.trim().to_owned(),
                description,
                price: price.trim().to_owned(),
                stock,
            };
            let created = client.create_product(&request).await?;
            output::success(global, &format!("Created product '{}'", created.name));
            print_product(&created, global)
        }

        ProductsCommand::Update {
            id,
            name,
            price,
            description,
            stock,
        } => {
            let update = UpdateProduct {
                name,
                description,
                price,
                stock,
            };
            if update.is_empty() {
                return Err(CliError::Validation {
                    field: "update".into(),
                    reason: "nothing to change; pass --name, --price, --description or --stock"
                        .into(),
                });
            }
            let updated = client.update_product(&id, &update).await?;
            output::success(global, &format!("Updated product '{}'", updated.name));
            print_product(&updated, global)
        }

        ProductsCommand::Delete { id } => {
            let prompt = format!("Delete product '{id}'? This action cannot be undone.");
            if !util::confirm("products delete", &prompt, global.yes)? {
                return Ok(());
            }
            client.delete_product(&id).await?;
            output::success(global, &format!("Deleted product '{id}'"));
            Ok(())
        }
    }
}
