use clap::Args;
use emporium_app::domain::orders::{
    data::NewPayment,
    records::{OrderUuid, PaymentUuid},
};
use uuid::Uuid;

use crate::cli::session::SessionArgs;

use super::print_order;

#[derive(Debug, Args)]
pub(crate) struct PayOrderArgs {
    #[command(flatten)]
    session: SessionArgs,

    /// Order to mark paid
    #[arg(long)]
    order_uuid: Uuid,

    /// Payment method, e.g. card or transfer
    #[arg(long)]
    method: String,

    /// Provider reference for the payment
    #[arg(long)]
    reference: Option<String>,
}

pub(crate) async fn run(args: PayOrderArgs) -> Result<(), String> {
    let app = args.session.connect().await?;

    let order = app
        .orders
        .confirm_payment(
            args.session.tenant(),
            args.session.caller(),
            OrderUuid::from_uuid(args.order_uuid),
            NewPayment {
                uuid: PaymentUuid::new(),
                method: args.method,
                reference: args.reference,
            },
        )
        .await
        .map_err(|error| format!("failed to confirm payment: {error}"))?;

    print_order(&order);

    Ok(())
}
