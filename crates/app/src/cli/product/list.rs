use clap::Args;
use emporium_app::domain::products::data::ProductQuery;

use crate::cli::session::SessionArgs;

#[derive(Debug, Args)]
pub(crate) struct ListProductsArgs {
    #[command(flatten)]
    session: SessionArgs,

    /// Page size
    #[arg(long, default_value_t = ProductQuery::DEFAULT_LIMIT)]
    limit: u32,

    /// Rows to skip
    #[arg(long, default_value_t = 0)]
    offset: u32,

    /// Only featured products
    #[arg(long)]
    featured_only: bool,
}

pub(crate) async fn run(args: ListProductsArgs) -> Result<(), String> {
    let app = args.session.connect().await?;

    let query = ProductQuery {
        featured_only: args.featured_only,
        ..ProductQuery::page(args.limit, args.offset)
    };

    let products = app
        .products
        .list_products(args.session.tenant(), args.session.caller(), query)
        .await
        .map_err(|error| format!("failed to list products: {error}"))?;

    if products.is_empty() {
        println!("no products visible");
        return Ok(());
    }

    for product in products {
        println!(
            "{}  {:<16}  {:>10}  {:>6}  {}",
            product.uuid,
            product.status.as_str(),
            product
                .current_price
                .map_or_else(|| "-".to_string(), |price| price.to_string()),
            product.quantity_available,
            product.name
        );
    }

    Ok(())
}
