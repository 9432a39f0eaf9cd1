use clap::{Args, Subcommand};
use emporium_app::domain::orders::records::OrderRecord;

mod create;
mod pay;
mod status;

#[derive(Debug, Args)]
pub(crate) struct OrderCommand {
    #[command(subcommand)]
    command: OrderSubcommand,
}

#[derive(Debug, Subcommand)]
enum OrderSubcommand {
    Create(create::CreateOrderArgs),
    Pay(pay::PayOrderArgs),
    Status(status::UpdateStatusArgs),
}

pub(crate) async fn run(command: OrderCommand) -> Result<(), String> {
    match command.command {
        OrderSubcommand::Create(args) => create::run(args).await,
        OrderSubcommand::Pay(args) => pay::run(args).await,
        OrderSubcommand::Status(args) => status::run(args).await,
    }
}

fn print_order(order: &OrderRecord) {
    println!("order_uuid: {}", order.uuid);
    println!("customer_uuid: {}", order.customer_uuid);
    println!("status: {}", order.status.as_str());
    println!("payment_status: {}", order.payment_status.as_str());
    println!("shipping_address: {}", order.shipping_address);

    for line in &order.lines {
        println!(
            "line {}: {} x{} @ {} = {}",
            line.position, line.product_uuid, line.quantity, line.unit_price, line.line_total
        );
    }

    println!("total_amount: {}", order.total_amount);

    if let Some(shipment) = &order.shipment {
        println!(
            "shipment: {} {}",
            shipment.carrier,
            shipment.tracking_number.as_deref().unwrap_or("-")
        );
    }
}
