//! Orders service.

use std::sync::Arc;

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use rustc_hash::FxHashMap;
use sqlx::{Postgres, Transaction};
use tracing::{Span, info};

use crate::{
    database::Db,
    domain::{
        caller::{AccountUuid, CallerContext},
        customers::CustomersService,
        orders::{
            data::{NewOrder, NewPayment, StatusUpdate},
            errors::OrdersServiceError,
            records::{OrderRecord, OrderStatus, OrderUuid, PaymentStatus},
            repositories::{
                PgOrderLinesRepository, PgOrdersRepository, PgPaymentsRepository,
                PgShipmentsRepository,
            },
            workflow::{consolidate_items, non_blank_address, order_total, price_lines},
        },
        products::{records::ProductUuid, repository::PgProductsRepository},
        stock::{ReservationLine, StockLedger, repository::PgStockRepository},
        tenants::records::TenantUuid,
    },
};

#[derive(Clone)]
pub struct PgOrdersService {
    db: Db,
    customers: Arc<dyn CustomersService>,
    orders: PgOrdersRepository,
    lines: PgOrderLinesRepository,
    payments: PgPaymentsRepository,
    shipments: PgShipmentsRepository,
    products: PgProductsRepository,
    stock: PgStockRepository,
}

impl PgOrdersService {
    #[must_use]
    pub fn new(db: Db, customers: Arc<dyn CustomersService>) -> Self {
        Self {
            db,
            customers,
            orders: PgOrdersRepository::new(),
            lines: PgOrderLinesRepository::new(),
            payments: PgPaymentsRepository::new(),
            shipments: PgShipmentsRepository::new(),
            products: PgProductsRepository::new(),
            stock: PgStockRepository::new(),
        }
    }

    async fn resolve_shipping_address(
        &self,
        tenant: TenantUuid,
        customer: AccountUuid,
        requested: Option<&str>,
    ) -> Result<String, OrdersServiceError> {
        if let Some(address) = non_blank_address(requested) {
            return Ok(address);
        }

        let default = self
            .customers
            .default_shipping_address(tenant, customer)
            .await?;

        non_blank_address(default.as_deref()).ok_or(OrdersServiceError::MissingShippingAddress)
    }

    /// Attach lines, payment and shipment to order headers.
    async fn load_details(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        mut orders: Vec<OrderRecord>,
    ) -> Result<Vec<OrderRecord>, OrdersServiceError> {
        let uuids: Vec<OrderUuid> = orders.iter().map(|order| order.uuid).collect();

        let by_uuid: FxHashMap<OrderUuid, usize> = uuids
            .iter()
            .enumerate()
            .map(|(index, uuid)| (*uuid, index))
            .collect();

        for (order, line) in self.lines.get_order_lines(tx, &uuids).await? {
            if let Some(&index) = by_uuid.get(&order) {
                orders[index].lines.push(line);
            }
        }

        for (order, payment) in self.payments.get_payments(tx, &uuids).await? {
            if let Some(&index) = by_uuid.get(&order) {
                orders[index].payment = Some(payment);
            }
        }

        for (order, shipment) in self.shipments.get_shipments(tx, &uuids).await? {
            if let Some(&index) = by_uuid.get(&order) {
                orders[index].shipment = Some(shipment);
            }
        }

        Ok(orders)
    }

    async fn load_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderRecord,
    ) -> Result<OrderRecord, OrdersServiceError> {
        self.load_details(tx, vec![order])
            .await?
            .pop()
            .ok_or(OrdersServiceError::NotFound)
    }

    async fn supplies_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        caller: &CallerContext,
        order: OrderUuid,
    ) -> Result<bool, OrdersServiceError> {
        match caller.supplier_identity() {
            Some(supplier) => Ok(self
                .orders
                .supplier_has_product_in_order(tx, order, supplier)
                .await?),
            None => Ok(false),
        }
    }

    /// Put the stock reserved by an order's lines back.
    async fn release_stock(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: &OrderRecord,
    ) -> Result<(), OrdersServiceError> {
        let lines: Vec<ReservationLine> = order
            .lines
            .iter()
            .map(|line| ReservationLine {
                product_uuid: line.product_uuid,
                quantity: line.quantity,
            })
            .collect();

        let products: Vec<ProductUuid> = lines.iter().map(|line| line.product_uuid).collect();

        let mut ledger = StockLedger::new(self.stock.lock_stocks(tx, &products).await?);

        for adjustment in ledger.release(&lines, Timestamp::now())? {
            let rows_affected = self.stock.release_stock(tx, &adjustment).await?;

            if rows_affected == 0 {
                return Err(OrdersServiceError::InvalidOrderLine {
                    product: adjustment.product_uuid,
                });
            }
        }

        Ok(())
    }
}

#[async_trait]
impl OrdersService for PgOrdersService {
    #[tracing::instrument(
        name = "orders.service.create_order",
        skip(self, caller, order),
        fields(
            tenant_uuid = %tenant,
            order_uuid = %order.uuid,
            customer_uuid = tracing::field::Empty,
            line_count = tracing::field::Empty,
            total_amount = tracing::field::Empty
        ),
        err
    )]
    async fn create_order(
        &self,
        tenant: TenantUuid,
        caller: CallerContext,
        order: NewOrder,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let customer = caller
            .account()
            .ok_or(OrdersServiceError::Unauthenticated)?;

        Span::current().record("customer_uuid", tracing::field::display(customer));

        let items = consolidate_items(&order.items)?;

        let shipping_address = self
            .resolve_shipping_address(tenant, customer, order.shipping_address.as_deref())
            .await?;

        let product_uuids: Vec<ProductUuid> = items.iter().map(|item| item.product_uuid).collect();

        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let products = self.products.find_products(&mut tx, &product_uuids).await?;
        let prices = self
            .products
            .find_current_prices(&mut tx, &product_uuids)
            .await?;

        let lines = price_lines(&items, &products, &prices)?;
        let total_amount = order_total(&lines);

        let mut ledger = StockLedger::new(self.stock.lock_stocks(&mut tx, &product_uuids).await?);

        let reservation: Vec<ReservationLine> = lines.iter().map(ReservationLine::from).collect();

        for adjustment in ledger.reserve(&reservation, Timestamp::now())? {
            let rows_affected = self.stock.reserve_stock(&mut tx, &adjustment).await?;

            if rows_affected == 0 {
                return Err(OrdersServiceError::InsufficientStock {
                    product: adjustment.product_uuid,
                });
            }
        }

        self.orders
            .create_order(&mut tx, order.uuid, customer, &shipping_address, total_amount)
            .await?;

        self.lines
            .create_order_lines(&mut tx, order.uuid, &lines)
            .await?;

        let header = self.orders.get_order(&mut tx, order.uuid).await?;
        let created = self.load_order(&mut tx, header).await?;

        tx.commit().await?;

        Span::current().record("line_count", created.lines.len());
        Span::current().record("total_amount", tracing::field::display(total_amount));

        info!(order_uuid = %created.uuid, customer_uuid = %customer, "created order");

        Ok(created)
    }

    #[tracing::instrument(
        name = "orders.service.get_order",
        skip(self, caller),
        fields(tenant_uuid = %tenant, order_uuid = %order),
        err
    )]
    async fn get_order(
        &self,
        tenant: TenantUuid,
        caller: CallerContext,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let header = self.orders.get_order(&mut tx, order).await?;

        let visible = caller.is_staff()
            || caller.account() == Some(header.customer_uuid)
            || self.supplies_order(&mut tx, &caller, order).await?;

        if !visible {
            return Err(OrdersServiceError::NotFound);
        }

        let found = self.load_order(&mut tx, header).await?;

        tx.commit().await?;

        Ok(found)
    }

    #[tracing::instrument(
        name = "orders.service.list_orders",
        skip(self, caller),
        fields(tenant_uuid = %tenant, order_count = tracing::field::Empty),
        err
    )]
    async fn list_orders(
        &self,
        tenant: TenantUuid,
        caller: CallerContext,
    ) -> Result<Vec<OrderRecord>, OrdersServiceError> {
        let customer = if caller.is_staff() {
            None
        } else {
            Some(
                caller
                    .account()
                    .ok_or(OrdersServiceError::Unauthenticated)?,
            )
        };

        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let headers = self.orders.list_orders(&mut tx, customer).await?;
        let orders = self.load_details(&mut tx, headers).await?;

        tx.commit().await?;

        Span::current().record("order_count", orders.len());

        Ok(orders)
    }

    #[tracing::instrument(
        name = "orders.service.confirm_payment",
        skip(self, caller, payment),
        fields(tenant_uuid = %tenant, order_uuid = %order, payment_uuid = %payment.uuid),
        err
    )]
    async fn confirm_payment(
        &self,
        tenant: TenantUuid,
        caller: CallerContext,
        order: OrderUuid,
        payment: NewPayment,
    ) -> Result<OrderRecord, OrdersServiceError> {
        if payment.method.trim().is_empty() {
            return Err(OrdersServiceError::InvalidData);
        }

        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let header = self.orders.lock_order(&mut tx, order).await?;

        if !caller.is_staff() && caller.account() != Some(header.customer_uuid) {
            return Err(OrdersServiceError::NotFound);
        }

        if header.status != OrderStatus::PendingPayment {
            return Err(OrdersServiceError::IllegalTransition {
                from: header.status,
                to: OrderStatus::Paid,
            });
        }

        self.payments
            .create_payment(&mut tx, order, &payment, header.total_amount)
            .await?;

        self.orders
            .update_status(&mut tx, order, OrderStatus::Paid, PaymentStatus::Paid)
            .await?;

        let header = self.orders.get_order(&mut tx, order).await?;
        let paid = self.load_order(&mut tx, header).await?;

        tx.commit().await?;

        info!(order_uuid = %order, amount = %paid.total_amount, "confirmed payment");

        Ok(paid)
    }

    #[tracing::instrument(
        name = "orders.service.update_status",
        skip(self, caller, update),
        fields(
            tenant_uuid = %tenant,
            order_uuid = %order,
            to_status = update.target().as_str(),
            from_status = tracing::field::Empty
        ),
        err
    )]
    async fn update_status(
        &self,
        tenant: TenantUuid,
        caller: CallerContext,
        order: OrderUuid,
        update: StatusUpdate,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let target = update.target();

        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let header = self.orders.lock_order(&mut tx, order).await?;

        Span::current().record("from_status", header.status.as_str());

        let permitted = caller.is_staff() || self.supplies_order(&mut tx, &caller, order).await?;

        if !permitted {
            return Err(if caller.account() == Some(header.customer_uuid) {
                OrdersServiceError::Forbidden
            } else {
                OrdersServiceError::NotFound
            });
        }

        if !header.status.can_transition_to(target) {
            return Err(OrdersServiceError::IllegalTransition {
                from: header.status,
                to: target,
            });
        }

        let mut payment_status = header.payment_status;

        match &update {
            StatusUpdate::Ship(shipment) => {
                if shipment.carrier.trim().is_empty() {
                    return Err(OrdersServiceError::InvalidData);
                }

                self.shipments
                    .create_shipment(&mut tx, order, shipment)
                    .await?;
            }
            StatusUpdate::Complete => {
                self.shipments.mark_delivered(&mut tx, order).await?;
            }
            StatusUpdate::Cancel => {
                let current = self.load_order(&mut tx, header.clone()).await?;

                self.release_stock(&mut tx, &current).await?;

                if payment_status == PaymentStatus::Paid {
                    payment_status = PaymentStatus::Refunded;
                }
            }
        }

        self.orders
            .update_status(&mut tx, order, target, payment_status)
            .await?;

        let header = self.orders.get_order(&mut tx, order).await?;
        let updated = self.load_order(&mut tx, header).await?;

        tx.commit().await?;

        info!(
            order_uuid = %order,
            status = target.as_str(),
            payment_status = payment_status.as_str(),
            "updated order status"
        );

        Ok(updated)
    }
}

#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// Place an order for the calling customer.
    ///
    /// Prices are locked in and stock is reserved in the same transaction
    /// that stores the order; a failure at any step leaves nothing behind.
    async fn create_order(
        &self,
        tenant: TenantUuid,
        caller: CallerContext,
        order: NewOrder,
    ) -> Result<OrderRecord, OrdersServiceError>;

    /// Retrieve a single order, if visible to `caller`.
    async fn get_order(
        &self,
        tenant: TenantUuid,
        caller: CallerContext,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError>;

    /// Own orders for customers, every order for staff; newest first.
    async fn list_orders(
        &self,
        tenant: TenantUuid,
        caller: CallerContext,
    ) -> Result<Vec<OrderRecord>, OrdersServiceError>;

    /// Record payment of the full order total and mark the order paid.
    async fn confirm_payment(
        &self,
        tenant: TenantUuid,
        caller: CallerContext,
        order: OrderUuid,
        payment: NewPayment,
    ) -> Result<OrderRecord, OrdersServiceError>;

    /// Ship, complete or cancel an order.
    async fn update_status(
        &self,
        tenant: TenantUuid,
        caller: CallerContext,
        order: OrderUuid,
        update: StatusUpdate,
    ) -> Result<OrderRecord, OrdersServiceError>;
}
