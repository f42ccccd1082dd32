//! Product service for marketplace listings and the farmer dashboard

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::{
    validate_price, validate_product_name, validate_stock_quantity, PaginatedResponse,
    Pagination, Product,
};

/// Product service
#[derive(Clone)]
pub struct ProductService {
    db: PgPool,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: Uuid,
    pub farmer_id: Uuid,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub quantity: i32,
    pub image_url: Option<String>,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            farmer_id: row.farmer_id,
            name: row.name,
            description: row.description,
            price: row.price,
            quantity: row.quantity,
            image_url: row.image_url,
            category: row.category,
            created_at: row.created_at,
        }
    }
}

/// Product in the public marketplace listing
#[derive(Debug, Serialize)]
pub struct ProductListing {
    #[serde(flatten)]
    pub product: Product,
    pub farmer_name: String,
}

/// Product with the farmer's contact details
#[derive(Debug, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub farmer_name: String,
    pub farmer_location: Option<String>,
    pub farmer_phone: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct ProductWithFarmerRow {
    #[sqlx(flatten)]
    product: ProductRow,
    full_name: String,
    location: Option<String>,
    phone: Option<String>,
}

/// Filters for the marketplace listing
#[derive(Debug, Default, Deserialize)]
pub struct ProductFilter {
    pub category: Option<String>,
    /// Case-insensitive match on product name
    pub search: Option<String>,
}

/// Input for creating a product
#[derive(Debug, Deserialize)]
pub struct CreateProductInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    pub quantity: i32,
    pub image_url: Option<String>,
    pub category: String,
}

/// Input for updating a product
#[derive(Debug, Deserialize)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub quantity: Option<i32>,
    pub image_url: Option<String>,
    pub category: Option<String>,
}

/// Totals shown at the top of the farmer dashboard
#[derive(Debug, Serialize, PartialEq)]
pub struct FarmerDashboard {
    pub total_products: usize,
    pub out_of_stock: usize,
    pub total_units: i64,
    pub inventory_value: Decimal,
}

impl FarmerDashboard {
    pub fn from_products(products: &[Product]) -> Self {
        Self {
            total_products: products.len(),
            out_of_stock: products.iter().filter(|p| !p.is_in_stock()).count(),
            total_units: products.iter().map(|p| i64::from(p.quantity.max(0))).sum(),
            inventory_value: products.iter().map(Product::stock_value).sum(),
        }
    }
}

const PRODUCT_COLUMNS: &str =
    "p.id, p.farmer_id, p.name, p.description, p.price, p.quantity, p.image_url, p.category, p.created_at";

impl ProductService {
    /// Create a new ProductService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List all products, newest first, with the farmer's name
    pub async fn list(
        &self,
        filter: &ProductFilter,
        pagination: &Pagination,
    ) -> AppResult<PaginatedResponse<ProductListing>> {
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(contains_pattern);

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM products p
            WHERE ($1::text IS NULL OR p.category = $1)
              AND ($2::text IS NULL OR p.name ILIKE $2 ESCAPE '\')
            "#,
        )
        .bind(&filter.category)
        .bind(&search)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, ProductWithFarmerRow>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}, f.full_name, f.location, f.phone
            FROM products p
            JOIN profiles f ON f.id = p.farmer_id
            WHERE ($1::text IS NULL OR p.category = $1)
              AND ($2::text IS NULL OR p.name ILIKE $2 ESCAPE '\')
            ORDER BY p.created_at DESC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(&filter.category)
        .bind(&search)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        let listings = rows
            .into_iter()
            .map(|row| ProductListing {
                product: row.product.into(),
                farmer_name: row.full_name,
            })
            .collect();

        Ok(PaginatedResponse::new(
            listings,
            pagination,
            u64::try_from(total).unwrap_or_default(),
        ))
    }

    /// List a farmer's own products, newest first
    pub async fn list_by_farmer(&self, farmer_id: Uuid) -> AppResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products p
            WHERE p.farmer_id = $1
            ORDER BY p.created_at DESC
            "#
        ))
        .bind(farmer_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Get a product with the farmer's contact details
    pub async fn get_detail(&self, product_id: Uuid) -> AppResult<ProductDetail> {
        let row = sqlx::query_as::<_, ProductWithFarmerRow>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}, f.full_name, f.location, f.phone
            FROM products p
            JOIN profiles f ON f.id = p.farmer_id
            WHERE p.id = $1
            "#
        ))
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        Ok(ProductDetail {
            product: row.product.into(),
            farmer_name: row.full_name,
            farmer_location: row.location,
            farmer_phone: row.phone,
        })
    }

    /// Create a new product owned by the farmer
    pub async fn create(&self, farmer_id: Uuid, input: CreateProductInput) -> AppResult<Product> {
        validate_product_name(&input.name).map_err(|msg| AppError::validation("name", msg))?;
        validate_price(input.price).map_err(|msg| AppError::validation("price", msg))?;
        validate_stock_quantity(input.quantity)
            .map_err(|msg| AppError::validation("quantity", msg))?;
        if input.category.trim().is_empty() {
            return Err(AppError::validation("category", "Category cannot be empty"));
        }

        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            INSERT INTO products (farmer_id, name, description, price, quantity, image_url, category)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, farmer_id, name, description, price, quantity, image_url, category, created_at
            "#,
        )
        .bind(farmer_id)
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(input.price)
        .bind(input.quantity)
        .bind(&input.image_url)
        .bind(input.category.trim().to_lowercase())
        .fetch_one(&self.db)
        .await?;

        tracing::info!(product_id = %row.id, %farmer_id, "Product listed");

        Ok(row.into())
    }

    /// Update one of the farmer's products
    pub async fn update(
        &self,
        farmer_id: Uuid,
        product_id: Uuid,
        input: UpdateProductInput,
    ) -> AppResult<Product> {
        self.ensure_owner(farmer_id, product_id).await?;

        if let Some(ref name) = input.name {
            validate_product_name(name).map_err(|msg| AppError::validation("name", msg))?;
        }
        if let Some(price) = input.price {
            validate_price(price).map_err(|msg| AppError::validation("price", msg))?;
        }
        if let Some(quantity) = input.quantity {
            validate_stock_quantity(quantity)
                .map_err(|msg| AppError::validation("quantity", msg))?;
        }

        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            UPDATE products
            SET name = COALESCE($1, name),
                description = COALESCE($2, description),
                price = COALESCE($3, price),
                quantity = COALESCE($4, quantity),
                image_url = COALESCE($5, image_url),
                category = COALESCE($6, category)
            WHERE id = $7
            RETURNING id, farmer_id, name, description, price, quantity, image_url, category, created_at
            "#,
        )
        .bind(input.name.as_deref().map(str::trim))
        .bind(&input.description)
        .bind(input.price)
        .bind(input.quantity)
        .bind(&input.image_url)
        .bind(input.category.as_deref().map(|c| c.trim().to_lowercase()))
        .bind(product_id)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    /// Delete one of the farmer's products
    ///
    /// The product row stays locked until the delete commits, so an order
    /// cannot take it in between.
    pub async fn delete(&self, farmer_id: Uuid, product_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let owner = sqlx::query_scalar::<_, Uuid>(
            "SELECT farmer_id FROM products WHERE id = $1 FOR UPDATE",
        )
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await?;
        check_owner(owner, farmer_id)?;

        let ordered = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM order_items WHERE product_id = $1",
        )
        .bind(product_id)
        .fetch_one(&mut *tx)
        .await?;
        ensure_never_ordered(ordered)?;

        sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(product_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(%product_id, %farmer_id, "Product deleted");

        Ok(())
    }

    /// Dashboard totals over the farmer's listings
    pub async fn dashboard(&self, farmer_id: Uuid) -> AppResult<FarmerDashboard> {
        let products = self.list_by_farmer(farmer_id).await?;
        Ok(FarmerDashboard::from_products(&products))
    }

    /// The product must exist and belong to the farmer
    async fn ensure_owner(&self, farmer_id: Uuid, product_id: Uuid) -> AppResult<()> {
        let owner = sqlx::query_scalar::<_, Uuid>("SELECT farmer_id FROM products WHERE id = $1")
            .bind(product_id)
            .fetch_optional(&self.db)
            .await?;
        check_owner(owner, farmer_id)
    }
}

fn check_owner(owner: Option<Uuid>, farmer_id: Uuid) -> AppResult<()> {
    let owner = owner.ok_or_else(|| AppError::NotFound("Product".to_string()))?;
    if owner != farmer_id {
        return Err(AppError::Forbidden(
            "You can only modify your own products".to_string(),
        ));
    }
    Ok(())
}

/// Products already in orders keep their order history
fn ensure_never_ordered(order_items: i64) -> AppResult<()> {
    if order_items > 0 {
        return Err(AppError::Conflict {
            resource: "product".to_string(),
            message: format!("Cannot delete product: it appears in {} order items", order_items),
        });
    }
    Ok(())
}

/// ILIKE pattern matching `term` anywhere, with its wildcards taken literally
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(price: &str, quantity: i32) -> Product {
        Product {
            id: Uuid::new_v4(),
            farmer_id: Uuid::new_v4(),
            name: "Tomatoes".to_string(),
            description: String::new(),
            price: price.parse().unwrap(),
            quantity,
            image_url: None,
            category: "vegetable".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_dashboard_totals() {
        let products = vec![product("40.00", 10), product("25.50", 0), product("100", 2)];
        let dashboard = FarmerDashboard::from_products(&products);

        assert_eq!(dashboard.total_products, 3);
        assert_eq!(dashboard.out_of_stock, 1);
        assert_eq!(dashboard.total_units, 12);
        assert_eq!(dashboard.inventory_value, "600.00".parse::<Decimal>().unwrap());
    }

    #[test]
    fn test_search_wildcards_are_literal() {
        assert_eq!(contains_pattern("tomato"), "%tomato%");
        assert_eq!(contains_pattern("100%"), "%100\\%%");
        assert_eq!(contains_pattern("a_b"), "%a\\_b%");
        assert_eq!(contains_pattern(r"c:\x"), r"%c:\\x%");
    }

    #[test]
    fn test_ownership_check() {
        let farmer = Uuid::new_v4();
        assert!(check_owner(Some(farmer), farmer).is_ok());
        assert!(matches!(
            check_owner(Some(Uuid::new_v4()), farmer),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(check_owner(None, farmer), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_ordered_product_cannot_be_deleted() {
        assert!(ensure_never_ordered(0).is_ok());
        assert!(matches!(
            ensure_never_ordered(2),
            Err(AppError::Conflict { .. })
        ));
    }

    #[test]
    fn test_empty_dashboard() {
        let dashboard = FarmerDashboard::from_products(&[]);
        assert_eq!(dashboard.total_products, 0);
        assert_eq!(dashboard.inventory_value, Decimal::ZERO);
    }
}
