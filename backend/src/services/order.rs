//! Order service
//!
//! Order placement with stock reservation, plus the consumer and farmer order views

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::{
    order_total, validate_indian_phone, validate_order_quantity, validate_shipping_address,
    Order, OrderItem, OrderLine, OrderStatus,
};

/// Order service
#[derive(Clone)]
pub struct OrderService {
    db: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    consumer_id: Uuid,
    status: String,
    total_amount: Decimal,
    shipping_address: String,
    contact_number: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = AppError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status: OrderStatus = row
            .status
            .parse()
            .map_err(|_| AppError::Internal(format!("Unknown order status: {}", row.status)))?;

        Ok(Order {
            id: row.id,
            consumer_id: row.consumer_id,
            status,
            total_amount: row.total_amount,
            shipping_address: row.shipping_address,
            contact_number: row.contact_number,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: Uuid,
    order_id: Uuid,
    product_id: Uuid,
    farmer_id: Uuid,
    quantity: i32,
    price_per_unit: Decimal,
    product_name: String,
}

#[derive(Debug, sqlx::FromRow)]
struct StockRow {
    farmer_id: Uuid,
    name: String,
    price: Decimal,
    quantity: i32,
}

/// Requested product and quantity
#[derive(Debug, Clone, Deserialize)]
pub struct OrderItemInput {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Input for placing an order
#[derive(Debug, Deserialize)]
pub struct CreateOrderInput {
    pub items: Vec<OrderItemInput>,
    pub shipping_address: String,
    pub contact_number: String,
}

/// Order line with the product name for display
#[derive(Debug, Serialize)]
pub struct OrderItemView {
    #[serde(flatten)]
    pub item: OrderItem,
    pub product_name: String,
}

/// An order together with its lines
#[derive(Debug, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItemView>,
}

/// A line of some consumer's order for one of the farmer's products
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct FarmerOrderItem {
    pub order_item_id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub price_per_unit: Decimal,
    pub order_status: String,
    pub shipping_address: String,
    pub contact_number: String,
    pub consumer_name: String,
    pub ordered_at: DateTime<Utc>,
}

/// Merge repeated products into one line each and check the quantities
pub fn merge_order_items(items: &[OrderItemInput]) -> AppResult<BTreeMap<Uuid, i32>> {
    if items.is_empty() {
        return Err(AppError::validation("items", "Order must contain at least one item"));
    }

    let mut merged = BTreeMap::new();
    for item in items {
        validate_order_quantity(item.quantity)
            .map_err(|msg| AppError::validation("quantity", msg))?;
        let entry = merged.entry(item.product_id).or_insert(0i32);
        *entry = entry
            .checked_add(item.quantity)
            .ok_or_else(|| AppError::validation("quantity", "Quantity is too large"))?;
    }
    Ok(merged)
}

impl OrderService {
    /// Create a new OrderService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Place an order, reserving stock for every line
    pub async fn create_order(
        &self,
        consumer_id: Uuid,
        input: CreateOrderInput,
    ) -> AppResult<OrderWithItems> {
        validate_shipping_address(&input.shipping_address)
            .map_err(|msg| AppError::validation("shipping_address", msg))?;
        validate_indian_phone(&input.contact_number)
            .map_err(|msg| AppError::validation("contact_number", msg))?;
        let requested = merge_order_items(&input.items)?;

        let mut tx = self.db.begin().await?;

        // Lock the product rows so concurrent orders cannot oversell
        let mut lines = Vec::with_capacity(requested.len());
        let mut names = BTreeMap::new();
        for (&product_id, &quantity) in &requested {
            let stock = sqlx::query_as::<_, StockRow>(
                "SELECT farmer_id, name, price, quantity FROM products WHERE id = $1 FOR UPDATE",
            )
            .bind(product_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product {}", product_id)))?;

            if stock.quantity < quantity {
                return Err(AppError::InsufficientStock(format!(
                    "Only {} of {} available",
                    stock.quantity, stock.name
                )));
            }

            names.insert(product_id, stock.name);
            lines.push(OrderLine {
                product_id,
                farmer_id: stock.farmer_id,
                quantity,
                price: stock.price,
            });
        }

        let total = order_total(&lines);

        let order_row = sqlx::query_as::<_, OrderRow>(
            r#"
            INSERT INTO orders (consumer_id, status, total_amount, shipping_address, contact_number)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, consumer_id, status, total_amount, shipping_address, contact_number, created_at
            "#,
        )
        .bind(consumer_id)
        .bind(OrderStatus::Pending.as_str())
        .bind(total)
        .bind(input.shipping_address.trim())
        .bind(input.contact_number.trim())
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(lines.len());
        for line in &lines {
            let item_id = sqlx::query_scalar::<_, Uuid>(
                r#"
                INSERT INTO order_items (order_id, product_id, farmer_id, quantity, price_per_unit)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id
                "#,
            )
            .bind(order_row.id)
            .bind(line.product_id)
            .bind(line.farmer_id)
            .bind(line.quantity)
            .bind(line.price)
            .fetch_one(&mut *tx)
            .await?;

            sqlx::query("UPDATE products SET quantity = quantity - $1 WHERE id = $2")
                .bind(line.quantity)
                .bind(line.product_id)
                .execute(&mut *tx)
                .await?;

            items.push(OrderItemView {
                item: OrderItem {
                    id: item_id,
                    order_id: order_row.id,
                    product_id: line.product_id,
                    farmer_id: line.farmer_id,
                    quantity: line.quantity,
                    price_per_unit: line.price,
                },
                product_name: names.remove(&line.product_id).unwrap_or_default(),
            });
        }

        tx.commit().await?;

        tracing::info!(
            order_id = %order_row.id,
            %consumer_id,
            %total,
            lines = items.len(),
            "Order placed"
        );

        Ok(OrderWithItems {
            order: order_row.try_into()?,
            items,
        })
    }

    /// The consumer's orders, newest first, each with its lines
    pub async fn my_orders(&self, consumer_id: Uuid) -> AppResult<Vec<OrderWithItems>> {
        let orders = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, consumer_id, status, total_amount, shipping_address, contact_number, created_at
            FROM orders
            WHERE consumer_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(consumer_id)
        .fetch_all(&self.db)
        .await?;

        let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();

        let item_rows = sqlx::query_as::<_, OrderItemRow>(
            r#"
            SELECT oi.id, oi.order_id, oi.product_id, oi.farmer_id, oi.quantity,
                   oi.price_per_unit, p.name AS product_name
            FROM order_items oi
            JOIN products p ON p.id = oi.product_id
            WHERE oi.order_id = ANY($1)
            "#,
        )
        .bind(&order_ids)
        .fetch_all(&self.db)
        .await?;

        let mut items_by_order: BTreeMap<Uuid, Vec<OrderItemView>> = BTreeMap::new();
        for row in item_rows {
            items_by_order
                .entry(row.order_id)
                .or_default()
                .push(OrderItemView {
                    item: OrderItem {
                        id: row.id,
                        order_id: row.order_id,
                        product_id: row.product_id,
                        farmer_id: row.farmer_id,
                        quantity: row.quantity,
                        price_per_unit: row.price_per_unit,
                    },
                    product_name: row.product_name,
                });
        }

        orders
            .into_iter()
            .map(|row| {
                let items = items_by_order.remove(&row.id).unwrap_or_default();
                Ok(OrderWithItems {
                    order: row.try_into()?,
                    items,
                })
            })
            .collect()
    }

    /// Order lines for the farmer's products, newest first
    pub async fn orders_for_farmer(&self, farmer_id: Uuid) -> AppResult<Vec<FarmerOrderItem>> {
        let rows = sqlx::query_as::<_, FarmerOrderItem>(
            r#"
            SELECT oi.id AS order_item_id, oi.order_id, oi.product_id, p.name AS product_name,
                   oi.quantity, oi.price_per_unit, o.status AS order_status,
                   o.shipping_address, o.contact_number, c.full_name AS consumer_name,
                   o.created_at AS ordered_at
            FROM order_items oi
            JOIN orders o ON o.id = oi.order_id
            JOIN products p ON p.id = oi.product_id
            JOIN profiles c ON c.id = o.consumer_id
            WHERE oi.farmer_id = $1
            ORDER BY o.created_at DESC
            "#,
        )
        .bind(farmer_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }
}
