use clap::{Args, ValueEnum};
use emporium_app::domain::orders::{
    data::{NewShipment, StatusUpdate},
    records::{OrderUuid, ShipmentUuid},
};
use uuid::Uuid;

use crate::cli::session::SessionArgs;

use super::print_order;

#[derive(Clone, Copy, Debug, ValueEnum)]
pub(crate) enum TargetStatus {
    Shipped,
    Completed,
    Cancelled,
}

#[derive(Debug, Args)]
pub(crate) struct UpdateStatusArgs {
    #[command(flatten)]
    session: SessionArgs,

    /// Order to update
    #[arg(long)]
    order_uuid: Uuid,

    /// Status to move the order to
    #[arg(long, value_enum)]
    to: TargetStatus,

    /// Carrier handling the shipment; required when shipping
    #[arg(long, required_if_eq("to", "shipped"))]
    carrier: Option<String>,

    /// Carrier tracking number
    #[arg(long)]
    tracking_number: Option<String>,
}

pub(crate) async fn run(args: UpdateStatusArgs) -> Result<(), String> {
    let update = match args.to {
        TargetStatus::Shipped => StatusUpdate::Ship(NewShipment {
            uuid: ShipmentUuid::new(),
            carrier: args
                .carrier
                .ok_or_else(|| "--carrier is required when shipping".to_string())?,
            tracking_number: args.tracking_number,
        }),
        TargetStatus::Completed => StatusUpdate::Complete,
        TargetStatus::Cancelled => StatusUpdate::Cancel,
    };

    let app = args.session.connect().await?;

    let order = app
        .orders
        .update_status(
            args.session.tenant(),
            args.session.caller(),
            OrderUuid::from_uuid(args.order_uuid),
            update,
        )
        .await
        .map_err(|error| format!("failed to update order status: {error}"))?;

    print_order(&order);

    Ok(())
}
