use clap::Args;
use emporium_app::domain::{
    orders::{
        data::{NewOrder, OrderItem},
        records::OrderUuid,
    },
    products::records::ProductUuid,
};
use uuid::Uuid;

use crate::cli::session::SessionArgs;

use super::print_order;

#[derive(Debug, Args)]
pub(crate) struct CreateOrderArgs {
    #[command(flatten)]
    session: SessionArgs,

    /// Item as PRODUCT_UUID[:QUANTITY]; repeat for more items
    #[arg(long = "item", value_parser = parse_item, required = true)]
    items: Vec<OrderItem>,

    /// Shipping address; the stored default is used when omitted
    #[arg(long)]
    shipping_address: Option<String>,

    /// Optional order UUID; generated when omitted
    #[arg(long)]
    order_uuid: Option<Uuid>,
}

fn parse_item(value: &str) -> Result<OrderItem, String> {
    let (product, quantity) = value.split_once(':').unwrap_or((value, "1"));

    let product_uuid = product
        .trim()
        .parse::<ProductUuid>()
        .map_err(|error| format!("invalid product uuid `{product}`: {error}"))?;

    let quantity = quantity
        .trim()
        .parse::<u32>()
        .map_err(|error| format!("invalid quantity `{quantity}`: {error}"))?;

    Ok(OrderItem {
        product_uuid,
        quantity,
    })
}

pub(crate) async fn run(args: CreateOrderArgs) -> Result<(), String> {
    let app = args.session.connect().await?;

    let order = app
        .orders
        .create_order(
            args.session.tenant(),
            args.session.caller(),
            NewOrder {
                uuid: args.order_uuid.map_or_else(OrderUuid::new, OrderUuid::from_uuid),
                items: args.items,
                shipping_address: args.shipping_address,
            },
        )
        .await
        .map_err(|error| format!("failed to create order: {error}"))?;

    print_order(&order);

    Ok(())
}
