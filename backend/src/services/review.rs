//! Review service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::{average_rating, validate_rating, Review};

/// Review service
#[derive(Clone)]
pub struct ReviewService {
    db: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    id: Uuid,
    product_id: Uuid,
    consumer_id: Uuid,
    rating: i32,
    comment: Option<String>,
    created_at: DateTime<Utc>,
    reviewer_name: String,
}

/// Review with the reviewer's name
#[derive(Debug, Serialize)]
pub struct ReviewView {
    #[serde(flatten)]
    pub review: Review,
    pub reviewer_name: String,
}

impl From<ReviewRow> for ReviewView {
    fn from(row: ReviewRow) -> Self {
        ReviewView {
            review: Review {
                id: row.id,
                product_id: row.product_id,
                consumer_id: row.consumer_id,
                rating: row.rating,
                comment: row.comment,
                created_at: row.created_at,
            },
            reviewer_name: row.reviewer_name,
        }
    }
}

/// All reviews of a product
#[derive(Debug, Serialize)]
pub struct ProductReviews {
    pub product_id: Uuid,
    pub average_rating: Option<f64>,
    pub total: usize,
    pub reviews: Vec<ReviewView>,
}

/// Input for adding a review
#[derive(Debug, Deserialize)]
pub struct AddReviewInput {
    pub rating: i32,
    pub comment: Option<String>,
}

impl ReviewService {
    /// Create a new ReviewService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Reviews of a product, newest first
    pub async fn product_reviews(&self, product_id: Uuid) -> AppResult<ProductReviews> {
        let rows = sqlx::query_as::<_, ReviewRow>(
            r#"
            SELECT r.id, r.product_id, r.consumer_id, r.rating, r.comment, r.created_at,
                   c.full_name AS reviewer_name
            FROM reviews r
            JOIN profiles c ON c.id = r.consumer_id
            WHERE r.product_id = $1
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.db)
        .await?;

        let reviews: Vec<ReviewView> = rows.into_iter().map(ReviewView::from).collect();

        Ok(ProductReviews {
            product_id,
            average_rating: average_rating(reviews.iter().map(|r| r.review.rating)),
            total: reviews.len(),
            reviews,
        })
    }

    /// Add a consumer's review of a product
    pub async fn add_review(
        &self,
        consumer_id: Uuid,
        product_id: Uuid,
        input: AddReviewInput,
    ) -> AppResult<Review> {
        validate_rating(input.rating).map_err(|msg| AppError::validation("rating", msg))?;

        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)",
        )
        .bind(product_id)
        .fetch_one(&self.db)
        .await?;

        if !exists {
            return Err(AppError::NotFound("Product".to_string()));
        }

        let comment = input
            .comment
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        let (id, created_at) = sqlx::query_as::<_, (Uuid, DateTime<Utc>)>(
            r#"
            INSERT INTO reviews (product_id, consumer_id, rating, comment)
            VALUES ($1, $2, $3, $4)
            RETURNING id, created_at
            "#,
        )
        .bind(product_id)
        .bind(consumer_id)
        .bind(input.rating)
        .bind(&comment)
        .fetch_one(&self.db)
        .await?;

        let review = Review {
            id,
            product_id,
            consumer_id,
            rating: input.rating,
            comment,
            created_at,
        };

        tracing::info!(review_id = %review.id, %product_id, rating = review.rating, "Review added");

        Ok(review)
    }
}
