//! Products service.

use async_trait::async_trait;
use mockall::automock;
use tracing::{Span, info};

use crate::{
    database::Db,
    domain::{
        caller::CallerContext,
        products::{
            data::{NewProduct, ProductQuery, ProductReview, ProductUpdate},
            errors::ProductsServiceError,
            pricing::final_price,
            records::{ProductRecord, ProductStatus, ProductUuid},
            repository::PgProductsRepository,
            visibility::{Visibility, apply_visibility_filter},
        },
        stock::repository::PgStockRepository,
        tenants::records::TenantUuid,
    },
};

#[derive(Debug, Clone)]
pub struct PgProductsService {
    db: Db,
    repository: PgProductsRepository,
    stock: PgStockRepository,
}

impl PgProductsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgProductsRepository::new(),
            stock: PgStockRepository::new(),
        }
    }
}

#[async_trait]
impl ProductsService for PgProductsService {
    #[tracing::instrument(
        name = "products.service.list_products",
        skip(self, caller, query),
        fields(
            tenant_uuid = %tenant,
            visibility = tracing::field::Empty,
            product_count = tracing::field::Empty
        ),
        err
    )]
    async fn list_products(
        &self,
        tenant: TenantUuid,
        caller: CallerContext,
        query: ProductQuery,
    ) -> Result<Vec<ProductRecord>, ProductsServiceError> {
        let query = apply_visibility_filter(query, &caller);

        Span::current().record("visibility", tracing::field::debug(query.visibility));

        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let products = self.repository.list_products(&mut tx, &query).await?;

        tx.commit().await?;

        Span::current().record("product_count", products.len());

        Ok(products)
    }

    #[tracing::instrument(
        name = "products.service.get_product",
        skip(self, caller),
        fields(tenant_uuid = %tenant, product_uuid = %product),
        err
    )]
    async fn get_product(
        &self,
        tenant: TenantUuid,
        caller: CallerContext,
        product: ProductUuid,
    ) -> Result<ProductRecord, ProductsServiceError> {
        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let product = self
            .repository
            .get_product(&mut tx, product, Visibility::for_caller(&caller))
            .await?;

        tx.commit().await?;

        Ok(product)
    }

    #[tracing::instrument(
        name = "products.service.create_product",
        skip(self, caller, product),
        fields(tenant_uuid = %tenant, product_uuid = %product.uuid),
        err
    )]
    async fn create_product(
        &self,
        tenant: TenantUuid,
        caller: CallerContext,
        product: NewProduct,
    ) -> Result<ProductRecord, ProductsServiceError> {
        let supplier = caller
            .supplier_identity()
            .ok_or(ProductsServiceError::Forbidden)?;

        if product.name.trim().is_empty() {
            return Err(ProductsServiceError::InvalidData);
        }

        if product.base_price.is_sign_negative() || product.markup_percentage.is_sign_negative() {
            return Err(ProductsServiceError::InvalidPrice);
        }

        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let uuid = self
            .repository
            .create_product(&mut tx, supplier, &product)
            .await?;

        self.repository
            .create_price(
                &mut tx,
                uuid,
                product.base_price,
                product.markup_percentage,
                final_price(product.base_price, product.markup_percentage),
            )
            .await?;

        self.stock
            .create_stock(&mut tx, uuid, product.initial_stock)
            .await?;

        let created = self
            .repository
            .get_product(&mut tx, uuid, Visibility::Unrestricted)
            .await?;

        tx.commit().await?;

        info!(product_uuid = %uuid, supplier_uuid = %supplier, "created product");

        Ok(created)
    }

    #[tracing::instrument(
        name = "products.service.update_product",
        skip(self, caller, update),
        fields(tenant_uuid = %tenant, product_uuid = %product),
        err
    )]
    async fn update_product(
        &self,
        tenant: TenantUuid,
        caller: CallerContext,
        product: ProductUuid,
        update: ProductUpdate,
    ) -> Result<ProductRecord, ProductsServiceError> {
        if update.name.trim().is_empty() {
            return Err(ProductsServiceError::InvalidData);
        }

        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let existing = self
            .repository
            .get_product(&mut tx, product, Visibility::Unrestricted)
            .await?;

        ensure_owner(&caller, &existing)?;

        self.repository
            .update_product(&mut tx, product, &update)
            .await?;

        let updated = self
            .repository
            .get_product(&mut tx, product, Visibility::Unrestricted)
            .await?;

        tx.commit().await?;

        info!(product_uuid = %product, "updated product; awaiting approval");

        Ok(updated)
    }

    #[tracing::instrument(
        name = "products.service.review_product",
        skip(self, caller),
        fields(tenant_uuid = %tenant, product_uuid = %product, review = ?review),
        err
    )]
    async fn review_product(
        &self,
        tenant: TenantUuid,
        caller: CallerContext,
        product: ProductUuid,
        review: ProductReview,
    ) -> Result<ProductRecord, ProductsServiceError> {
        if !caller.is_staff() {
            return Err(ProductsServiceError::Forbidden);
        }

        let (status, is_active, is_featured) = match review {
            ProductReview::Approve { featured } => (ProductStatus::Approved, true, featured),
            ProductReview::Reject => (ProductStatus::Rejected, false, false),
        };

        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let rows_affected = self
            .repository
            .review_product(&mut tx, product, status, is_active, is_featured)
            .await?;

        if rows_affected == 0 {
            return Err(ProductsServiceError::NotFound);
        }

        let reviewed = self
            .repository
            .get_product(&mut tx, product, Visibility::Unrestricted)
            .await?;

        tx.commit().await?;

        info!(product_uuid = %product, status = status.as_str(), "reviewed product");

        Ok(reviewed)
    }

    #[tracing::instrument(
        name = "products.service.set_suspended",
        skip(self, caller),
        fields(tenant_uuid = %tenant, product_uuid = %product),
        err
    )]
    async fn set_suspended(
        &self,
        tenant: TenantUuid,
        caller: CallerContext,
        product: ProductUuid,
        suspended: bool,
    ) -> Result<ProductRecord, ProductsServiceError> {
        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let existing = self
            .repository
            .get_product(&mut tx, product, Visibility::Unrestricted)
            .await?;

        ensure_owner(&caller, &existing)?;

        self.repository
            .set_suspended(&mut tx, product, suspended)
            .await?;

        let updated = self
            .repository
            .get_product(&mut tx, product, Visibility::Unrestricted)
            .await?;

        tx.commit().await?;

        Ok(updated)
    }

    #[tracing::instrument(
        name = "products.service.set_stock",
        skip(self, caller),
        fields(tenant_uuid = %tenant, product_uuid = %product),
        err
    )]
    async fn set_stock(
        &self,
        tenant: TenantUuid,
        caller: CallerContext,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<ProductRecord, ProductsServiceError> {
        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let existing = self
            .repository
            .get_product(&mut tx, product, Visibility::Unrestricted)
            .await?;

        if !caller.is_staff() {
            ensure_owner(&caller, &existing)?;
        }

        self.stock.set_stock(&mut tx, product, quantity).await?;

        let updated = self
            .repository
            .get_product(&mut tx, product, Visibility::Unrestricted)
            .await?;

        tx.commit().await?;

        info!(product_uuid = %product, quantity, "set stock level");

        Ok(updated)
    }
}

fn ensure_owner(
    caller: &CallerContext,
    product: &ProductRecord,
) -> Result<(), ProductsServiceError> {
    if caller.supplier_identity() == Some(product.supplier_uuid) {
        Ok(())
    } else {
        Err(ProductsServiceError::Forbidden)
    }
}

#[automock]
#[async_trait]
pub trait ProductsService: Send + Sync {
    /// List the products `caller` may see, one page at a time.
    async fn list_products(
        &self,
        tenant: TenantUuid,
        caller: CallerContext,
        query: ProductQuery,
    ) -> Result<Vec<ProductRecord>, ProductsServiceError>;

    /// Retrieve a single product, if visible to `caller`.
    async fn get_product(
        &self,
        tenant: TenantUuid,
        caller: CallerContext,
        product: ProductUuid,
    ) -> Result<ProductRecord, ProductsServiceError>;

    /// Creates a product owned by the calling supplier, pending approval.
    async fn create_product(
        &self,
        tenant: TenantUuid,
        caller: CallerContext,
        product: NewProduct,
    ) -> Result<ProductRecord, ProductsServiceError>;

    /// Edits a product; it returns to pending approval and inactive.
    async fn update_product(
        &self,
        tenant: TenantUuid,
        caller: CallerContext,
        product: ProductUuid,
        update: ProductUpdate,
    ) -> Result<ProductRecord, ProductsServiceError>;

    /// Approve or reject a product.
    async fn review_product(
        &self,
        tenant: TenantUuid,
        caller: CallerContext,
        product: ProductUuid,
        review: ProductReview,
    ) -> Result<ProductRecord, ProductsServiceError>;

    /// Suspend or resume sales of a product.
    async fn set_suspended(
        &self,
        tenant: TenantUuid,
        caller: CallerContext,
        product: ProductUuid,
        suspended: bool,
    ) -> Result<ProductRecord, ProductsServiceError>;

    /// Overwrite the available quantity of a product.
    async fn set_stock(
        &self,
        tenant: TenantUuid,
        caller: CallerContext,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<ProductRecord, ProductsServiceError>;
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use testresult::TestResult;

    use crate::{
        domain::caller::AccountUuid,
        test::{TestContext, create_approved, create_pending, new_product, staff},
    };

    use super::*;

    fn uuids(products: &[ProductRecord]) -> Vec<ProductUuid> {
        let mut uuids: Vec<ProductUuid> = products.iter().map(|product| product.uuid).collect();
        uuids.sort();
        uuids
    }

    #[tokio::test]
    async fn create_product_starts_pending_with_marked_up_price() -> TestResult {
        let ctx = TestContext::new().await;
        let supplier = AccountUuid::new();

        let mut product = new_product("Oak table", dec!(350), 4);
        product.markup_percentage = dec!(25);

        let created = ctx
            .products
            .create_product(ctx.tenant_uuid, CallerContext::supplier(supplier), product)
            .await?;

        assert_eq!(created.status, ProductStatus::PendingApproval);
        assert!(!created.is_active);
        assert_eq!(created.supplier_uuid, supplier);
        assert_eq!(created.current_price, Some(dec!(437.50)));
        assert_eq!(created.quantity_available, 4);

        Ok(())
    }

    #[tokio::test]
    async fn create_product_requires_supplier_identity() {
        let ctx = TestContext::new().await;

        for caller in [
            CallerContext::anonymous(),
            CallerContext::customer(AccountUuid::new()),
            staff(),
        ] {
            let result = ctx
                .products
                .create_product(ctx.tenant_uuid, caller, new_product("Lamp", dec!(10), 1))
                .await;

            assert!(
                matches!(result, Err(ProductsServiceError::Forbidden)),
                "expected Forbidden, got {result:?}"
            );
        }
    }

    #[tokio::test]
    async fn create_product_rejects_negative_price() {
        let ctx = TestContext::new().await;

        let result = ctx
            .products
            .create_product(
                ctx.tenant_uuid,
                CallerContext::supplier(AccountUuid::new()),
                new_product("Lamp", dec!(-1), 1),
            )
            .await;

        assert!(matches!(result, Err(ProductsServiceError::InvalidPrice)));
    }

    #[tokio::test]
    async fn anonymous_listing_only_returns_purchasable_products() -> TestResult {
        let ctx = TestContext::new().await;
        let supplier = AccountUuid::new();

        let approved = create_approved(&ctx, supplier, new_product("Chair", dec!(40), 1)).await;
        create_pending(&ctx, supplier, new_product("Stool", dec!(20), 1)).await;

        let rejected = create_pending(&ctx, supplier, new_product("Bench", dec!(90), 1)).await;
        ctx.products
            .review_product(ctx.tenant_uuid, staff(), rejected.uuid, ProductReview::Reject)
            .await?;

        let mut listing_only = new_product("Showroom sofa", dec!(900), 1);
        listing_only.is_listing_only = true;
        create_approved(&ctx, supplier, listing_only).await;

        let listed = ctx
            .products
            .list_products(
                ctx.tenant_uuid,
                CallerContext::anonymous(),
                ProductQuery::default(),
            )
            .await?;

        assert_eq!(uuids(&listed), vec![approved.uuid]);

        Ok(())
    }

    #[tokio::test]
    async fn supplier_sees_own_inventory_and_public_products() -> TestResult {
        let ctx = TestContext::new().await;
        let supplier_a = AccountUuid::new();
        let supplier_b = AccountUuid::new();

        let own_pending = create_pending(&ctx, supplier_a, new_product("A1", dec!(1), 1)).await;
        let other_public = create_approved(&ctx, supplier_b, new_product("B1", dec!(1), 1)).await;
        create_pending(&ctx, supplier_b, new_product("B2", dec!(1), 1)).await;

        let listed = ctx
            .products
            .list_products(
                ctx.tenant_uuid,
                CallerContext::supplier(supplier_a),
                ProductQuery::default(),
            )
            .await?;

        let mut expected = vec![own_pending.uuid, other_public.uuid];
        expected.sort();

        assert_eq!(uuids(&listed), expected);

        Ok(())
    }

    #[tokio::test]
    async fn staff_see_every_product() -> TestResult {
        let ctx = TestContext::new().await;
        let supplier = AccountUuid::new();

        let mut created = vec![
            create_pending(&ctx, supplier, new_product("P1", dec!(1), 1)).await,
            create_approved(&ctx, supplier, new_product("P2", dec!(1), 1)).await,
        ];

        let suspended = create_approved(&ctx, supplier, new_product("P3", dec!(1), 1)).await;
        created.push(
            ctx.products
                .set_suspended(
                    ctx.tenant_uuid,
                    CallerContext::supplier(supplier),
                    suspended.uuid,
                    true,
                )
                .await?,
        );

        for caller in [staff(), CallerContext::administrator(AccountUuid::new())] {
            let listed = ctx
                .products
                .list_products(ctx.tenant_uuid, caller, ProductQuery::default())
                .await?;

            assert_eq!(uuids(&listed), uuids(&created));
        }

        Ok(())
    }

    #[tokio::test]
    async fn list_products_pages_in_stable_order() -> TestResult {
        let ctx = TestContext::new().await;
        let supplier = AccountUuid::new();

        for name in ["P1", "P2", "P3"] {
            create_approved(&ctx, supplier, new_product(name, dec!(1), 1)).await;
        }

        let first = ctx
            .products
            .list_products(ctx.tenant_uuid, staff(), ProductQuery::page(2, 0))
            .await?;
        let second = ctx
            .products
            .list_products(ctx.tenant_uuid, staff(), ProductQuery::page(2, 2))
            .await?;

        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 1);
        assert!(first.iter().all(|product| product.uuid != second[0].uuid));

        Ok(())
    }

    #[tokio::test]
    async fn get_product_hides_unapproved_from_customers() -> TestResult {
        let ctx = TestContext::new().await;
        let supplier = AccountUuid::new();

        let pending = create_pending(&ctx, supplier, new_product("Stool", dec!(20), 1)).await;

        let result = ctx
            .products
            .get_product(
                ctx.tenant_uuid,
                CallerContext::customer(AccountUuid::new()),
                pending.uuid,
            )
            .await;

        assert!(
            matches!(result, Err(ProductsServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );

        let own = ctx
            .products
            .get_product(ctx.tenant_uuid, CallerContext::supplier(supplier), pending.uuid)
            .await?;

        assert_eq!(own.uuid, pending.uuid);

        Ok(())
    }

    #[tokio::test]
    async fn update_product_returns_it_to_moderation() -> TestResult {
        let ctx = TestContext::new().await;
        let supplier = AccountUuid::new();

        let approved = create_approved(&ctx, supplier, new_product("Desk", dec!(100), 1)).await;

        assert!(approved.is_publicly_available());

        let updated = ctx
            .products
            .update_product(
                ctx.tenant_uuid,
                CallerContext::supplier(supplier),
                approved.uuid,
                ProductUpdate {
                    name: "Standing desk".to_string(),
                    description: "Adjustable".to_string(),
                    category_uuid: None,
                    is_listing_only: false,
                },
            )
            .await?;

        assert_eq!(updated.name, "Standing desk");
        assert_eq!(updated.status, ProductStatus::PendingApproval);
        assert!(!updated.is_active);

        Ok(())
    }

    #[tokio::test]
    async fn update_product_by_another_supplier_is_forbidden() {
        let ctx = TestContext::new().await;

        let product =
            create_pending(&ctx, AccountUuid::new(), new_product("Desk", dec!(100), 1)).await;

        let result = ctx
            .products
            .update_product(
                ctx.tenant_uuid,
                CallerContext::supplier(AccountUuid::new()),
                product.uuid,
                ProductUpdate {
                    name: "Mine now".to_string(),
                    description: String::new(),
                    category_uuid: None,
                    is_listing_only: false,
                },
            )
            .await;

        assert!(matches!(result, Err(ProductsServiceError::Forbidden)));
    }

    #[tokio::test]
    async fn review_product_requires_staff() {
        let ctx = TestContext::new().await;
        let supplier = AccountUuid::new();

        let product = create_pending(&ctx, supplier, new_product("Desk", dec!(100), 1)).await;

        let result = ctx
            .products
            .review_product(
                ctx.tenant_uuid,
                CallerContext::supplier(supplier),
                product.uuid,
                ProductReview::Approve { featured: true },
            )
            .await;

        assert!(matches!(result, Err(ProductsServiceError::Forbidden)));
    }

    #[tokio::test]
    async fn approve_featured_then_reject_clears_flags() -> TestResult {
        let ctx = TestContext::new().await;

        let product =
            create_pending(&ctx, AccountUuid::new(), new_product("Desk", dec!(100), 1)).await;

        let approved = ctx
            .products
            .review_product(
                ctx.tenant_uuid,
                staff(),
                product.uuid,
                ProductReview::Approve { featured: true },
            )
            .await?;

        assert!(approved.is_active);
        assert!(approved.is_featured);

        let rejected = ctx
            .products
            .review_product(ctx.tenant_uuid, staff(), product.uuid, ProductReview::Reject)
            .await?;

        assert_eq!(rejected.status, ProductStatus::Rejected);
        assert!(!rejected.is_active);
        assert!(!rejected.is_featured);

        Ok(())
    }

    #[tokio::test]
    async fn suspended_products_leave_the_public_catalog() -> TestResult {
        let ctx = TestContext::new().await;
        let supplier = AccountUuid::new();

        let product = create_approved(&ctx, supplier, new_product("Rug", dec!(60), 2)).await;

        ctx.products
            .set_suspended(
                ctx.tenant_uuid,
                CallerContext::supplier(supplier),
                product.uuid,
                true,
            )
            .await?;

        let listed = ctx
            .products
            .list_products(
                ctx.tenant_uuid,
                CallerContext::anonymous(),
                ProductQuery::default(),
            )
            .await?;

        assert!(listed.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn set_stock_overwrites_quantity() -> TestResult {
        let ctx = TestContext::new().await;
        let supplier = AccountUuid::new();

        let product = create_pending(&ctx, supplier, new_product("Vase", dec!(15), 3)).await;

        let restocked = ctx
            .products
            .set_stock(
                ctx.tenant_uuid,
                CallerContext::supplier(supplier),
                product.uuid,
                12,
            )
            .await?;

        assert_eq!(restocked.quantity_available, 12);

        let result = ctx
            .products
            .set_stock(
                ctx.tenant_uuid,
                CallerContext::customer(AccountUuid::new()),
                product.uuid,
                0,
            )
            .await;

        assert!(matches!(result, Err(ProductsServiceError::Forbidden)));

        Ok(())
    }

    #[tokio::test]
    async fn products_are_isolated_between_tenants() -> TestResult {
        let ctx = TestContext::new().await;

        let product =
            create_approved(&ctx, AccountUuid::new(), new_product("Clock", dec!(30), 1)).await;

        let tenant_b = ctx.create_tenant("Tenant B").await;

        let result = ctx.products.get_product(tenant_b, staff(), product.uuid).await;

        assert!(
            matches!(result, Err(ProductsServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );

        let listed = ctx
            .products
            .list_products(tenant_b, staff(), ProductQuery::default())
            .await?;

        assert!(listed.is_empty());

        Ok(())
    }
}
