//! CLI handlers for `creatorflow product` subcommands.

use anyhow::Result;

use creatorflow_core::aging;
use creatorflow_core::state::AppState;
use creatorflow_store::models::{ChannelName, Product};

use crate::ProductCommands;

pub fn run_product_command(command: ProductCommands, state: &mut AppState) -> Result<()> {
    match command {
        ProductCommands::List => {
            cmd_list(state);
            Ok(())
        }
        ProductCommands::Add {
            name,
            channel,
            sub_category,
            description,
            tags,
        } => {
            let product = Product {
                id: String::new(),
                name,
                description,
                channel: ChannelName::parse(&channel)?,
                sub_category: sub_category.filter(|s| !s.trim().is_empty()),
                image: None,
                tags,
                created_at: state.clock().now(),
                last_scheduled_at: None,
            };
            let added = state.add_product(product)?;
            println!("Added product {}: {}", added.id, added.name);
            Ok(())
        }
        ProductCommands::Delete { product_id } => {
            let removed = state.delete_product(&product_id)?;
            println!("Deleted product {}: {}", removed.id, removed.name);
            Ok(())
        }
    }
}

/// Products, most overdue first.
fn cmd_list(state: &AppState) {
    let now = state.clock().now();
    let mut rows: Vec<_> = state
        .products()
        .iter()
        .map(|p| (p, aging::evaluate(p, now)))
        .collect();
    rows.sort_by(|a, b| b.1.days_pending.cmp(&a.1.days_pending));

    if rows.is_empty() {
        println!("Inventory is empty.");
        return;
    }

    println!(
        "{:<36} {:<16} {:>5} {:<9} NAME",
        "ID", "CHANNEL", "DAYS", "STATUS"
    );
    println!("{}", "-".repeat(90));
    for (product, report) in rows {
        let placement = match &product.sub_category {
            Some(sub) => format!("{} > {sub}", product.name),
            None => product.name.clone(),
        };
        println!(
            "{:<36} {:<16} {:>5} {:<9} {}",
            product.id,
            product.channel.as_str(),
            report.days_pending,
            report.class.to_string(),
            placement
        );
    }
}
