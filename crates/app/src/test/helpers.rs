//! Test Helpers

use rust_decimal::Decimal;

use crate::{
    domain::{
        caller::{AccountUuid, CallerContext},
        orders::{
            OrdersService, OrdersServiceError,
            data::{NewOrder, OrderItem},
            records::{OrderRecord, OrderUuid},
        },
        products::{
            ProductsService,
            data::{NewProduct, ProductReview},
            records::{ProductRecord, ProductUuid},
        },
    },
    test::TestContext,
};

pub(crate) fn staff() -> CallerContext {
    CallerContext::employee(AccountUuid::new())
}

pub(crate) fn new_product(name: &str, base_price: Decimal, initial_stock: u32) -> NewProduct {
    NewProduct {
        uuid: ProductUuid::new(),
        name: name.to_string(),
        description: String::new(),
        category_uuid: None,
        base_price,
        markup_percentage: Decimal::ZERO,
        initial_stock,
        is_listing_only: false,
    }
}

/// Create `product` as `supplier`, still pending approval.
pub(crate) async fn create_pending(
    ctx: &TestContext,
    supplier: AccountUuid,
    product: NewProduct,
) -> ProductRecord {
    ctx.products
        .create_product(ctx.tenant_uuid, CallerContext::supplier(supplier), product)
        .await
        .expect("create_product should succeed")
}

/// Create `product` as `supplier` and approve it.
pub(crate) async fn create_approved(
    ctx: &TestContext,
    supplier: AccountUuid,
    product: NewProduct,
) -> ProductRecord {
    let created = create_pending(ctx, supplier, product).await;

    ctx.products
        .review_product(
            ctx.tenant_uuid,
            staff(),
            created.uuid,
            ProductReview::Approve { featured: false },
        )
        .await
        .expect("review_product should succeed")
}

pub(crate) async fn stock_level(ctx: &TestContext, product: ProductUuid) -> u32 {
    ctx.products
        .get_product(ctx.tenant_uuid, staff(), product)
        .await
        .expect("get_product should succeed")
        .quantity_available
}

pub(crate) async fn place_order(
    ctx: &TestContext,
    customer: AccountUuid,
    items: &[(ProductUuid, u32)],
) -> Result<OrderRecord, OrdersServiceError> {
    ctx.orders
        .create_order(
            ctx.tenant_uuid,
            CallerContext::customer(customer),
            NewOrder {
                uuid: OrderUuid::new(),
                items: items
                    .iter()
                    .map(|&(product_uuid, quantity)| OrderItem {
                        product_uuid,
                        quantity,
                    })
                    .collect(),
                shipping_address: Some("1 Market Square".to_string()),
            },
        )
        .await
}
