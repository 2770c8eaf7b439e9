//! PostgreSQL implementation of SubscriptionRepository.
//!
//! One row per user in `subscriptions`. Updates are a single
//! `UPDATE ... WHERE user_id = $1 AND updated_at = $N`; zero affected rows
//! means another writer got there first.

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, UserId};
use crate::domain::subscription::{PlanType, SubscriptionRecord, SubscriptionStatus};
use crate::ports::SubscriptionRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

const SELECT_COLUMNS: &str = r#"
    user_id, status, plan, amount, start_date, end_date, next_billing_date,
    last_payment_date, trial_start_date, trial_end_date, external_customer_id,
    external_subscription_id, external_order_id, updated_at
"#;

/// PostgreSQL implementation of the SubscriptionRepository port.
pub struct PostgresSubscriptionRepository {
    pool: PgPool,
}

impl PostgresSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_where(
        &self,
        predicate: &str,
        value: &str,
    ) -> Result<Option<SubscriptionRecord>, DomainError> {
        let sql = format!("SELECT {} FROM subscriptions WHERE {} = $1", SELECT_COLUMNS, predicate);
        let row: Option<SubscriptionRow> = sqlx::query_as(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("fetch subscription", e))?;

        row.map(SubscriptionRecord::try_from).transpose()
    }
}

/// Database row representation of a subscription record.
#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    user_id: String,
    status: String,
    plan: Option<String>,
    amount: Option<i64>,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    next_billing_date: Option<DateTime<Utc>>,
    last_payment_date: Option<DateTime<Utc>>,
    trial_start_date: Option<DateTime<Utc>>,
    trial_end_date: Option<DateTime<Utc>>,
    external_customer_id: Option<String>,
    external_subscription_id: Option<String>,
    external_order_id: Option<String>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for SubscriptionRecord {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        let status = SubscriptionStatus::parse(&row.status).ok_or_else(|| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Invalid status value: {}", row.status),
            )
        })?;
        let plan = row
            .plan
            .as_deref()
            .map(|p| {
                PlanType::parse(p).ok_or_else(|| {
                    DomainError::new(ErrorCode::DatabaseError, format!("Invalid plan value: {}", p))
                })
            })
            .transpose()?;
        let ts = |dt: Option<DateTime<Utc>>| dt.map(Timestamp::from_datetime);

        Ok(SubscriptionRecord {
            user_id: UserId::new(row.user_id).map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid user_id: {}", e))
            })?,
            status,
            plan,
            amount: row.amount,
            start_date: ts(row.start_date),
            end_date: ts(row.end_date),
            next_billing_date: ts(row.next_billing_date),
            last_payment_date: ts(row.last_payment_date),
            trial_start_date: ts(row.trial_start_date),
            trial_end_date: ts(row.trial_end_date),
            external_customer_id: row.external_customer_id,
            external_subscription_id: row.external_subscription_id,
            external_order_id: row.external_order_id,
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn db_error(action: &str, e: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("Failed to {}: {}", action, e))
}

fn dt(ts: &Option<Timestamp>) -> Option<DateTime<Utc>> {
    ts.map(|t| *t.as_datetime())
}

fn user_ids(rows: Vec<(String,)>) -> Result<Vec<UserId>, DomainError> {
    rows.into_iter()
        .map(|(id,)| {
            UserId::new(id).map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid user_id: {}", e))
            })
        })
        .collect()
}

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepository {
    async fn find_by_user(&self, user_id: &UserId) -> Result<Option<SubscriptionRecord>, DomainError> {
        self.fetch_one_where("user_id", user_id.as_str()).await
    }

    async fn find_by_external_subscription_id(
        &self,
        subscription_id: &str,
    ) -> Result<Option<SubscriptionRecord>, DomainError> {
        self.fetch_one_where("external_subscription_id", subscription_id)
            .await
    }

    async fn insert(&self, record: &SubscriptionRecord) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO subscriptions (
                user_id, status, plan, amount, start_date, end_date, next_billing_date,
                last_payment_date, trial_start_date, trial_end_date, external_customer_id,
                external_subscription_id, external_order_id, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(record.user_id.as_str())
        .bind(record.status.as_str())
        .bind(record.plan.map(|p| p.as_str()))
        .bind(record.amount)
        .bind(dt(&record.start_date))
        .bind(dt(&record.end_date))
        .bind(dt(&record.next_billing_date))
        .bind(dt(&record.last_payment_date))
        .bind(dt(&record.trial_start_date))
        .bind(dt(&record.trial_end_date))
        .bind(&record.external_customer_id)
        .bind(&record.external_subscription_id)
        .bind(&record.external_order_id)
        .bind(record.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("insert subscription", e))?;

        Ok(result.rows_affected() == 1)
    }

    async fn compare_and_swap(
        &self,
        record: &SubscriptionRecord,
        expected: Timestamp,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions SET
                status = $2,
                plan = $3,
                amount = $4,
                start_date = $5,
                end_date = $6,
                next_billing_date = $7,
                last_payment_date = $8,
                trial_start_date = $9,
                trial_end_date = $10,
                external_customer_id = $11,
                external_subscription_id = $12,
                external_order_id = $13,
                updated_at = $14
            WHERE user_id = $1 AND updated_at = $15
            "#,
        )
        .bind(record.user_id.as_str())
        .bind(record.status.as_str())
        .bind(record.plan.map(|p| p.as_str()))
        .bind(record.amount)
        .bind(dt(&record.start_date))
        .bind(dt(&record.end_date))
        .bind(dt(&record.next_billing_date))
        .bind(dt(&record.last_payment_date))
        .bind(dt(&record.trial_start_date))
        .bind(dt(&record.trial_end_date))
        .bind(&record.external_customer_id)
        .bind(&record.external_subscription_id)
        .bind(&record.external_order_id)
        .bind(record.updated_at.as_datetime())
        .bind(expected.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("subscriptions_external_subscription_id_key") {
                    return DomainError::new(
                        ErrorCode::ConstraintViolated,
                        "Gateway subscription id already belongs to another user",
                    );
                }
            }
            db_error("update subscription", e)
        })?;

        Ok(result.rows_affected() == 1)
    }

    async fn find_stale_pending(&self, cutoff: Timestamp) -> Result<Vec<UserId>, DomainError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT user_id FROM subscriptions WHERE status = 'pending' AND updated_at < $1",
        )
        .bind(cutoff.as_datetime())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("scan pending subscriptions", e))?;

        user_ids(rows)
    }

    async fn find_lapsed(&self, now: Timestamp) -> Result<Vec<UserId>, DomainError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT user_id FROM subscriptions
            WHERE status IN ('trial', 'active')
              AND (end_date IS NULL OR end_date <= $1)
            "#,
        )
        .bind(now.as_datetime())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("scan lapsed subscriptions", e))?;

        user_ids(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(status: &str, plan: Option<&str>) -> SubscriptionRow {
        let now = Utc::now();
        SubscriptionRow {
            user_id: "user-1".to_string(),
            status: status.to_string(),
            plan: plan.map(str::to_string),
            amount: Some(49_900),
            start_date: Some(now),
            end_date: Some(now),
            next_billing_date: None,
            last_payment_date: None,
            trial_start_date: None,
            trial_end_date: None,
            external_customer_id: Some("cust_1".to_string()),
            external_subscription_id: None,
            external_order_id: Some("order_1".to_string()),
            updated_at: now,
        }
    }

    #[test]
    fn row_converts_to_record() {
        let record = SubscriptionRecord::try_from(row("active", Some("yearly"))).unwrap();
        assert_eq!(record.status, SubscriptionStatus::Active);
        assert_eq!(record.plan, Some(PlanType::Yearly));
        assert_eq!(record.external_customer_id.as_deref(), Some("cust_1"));
    }

    #[test]
    fn unknown_status_is_a_database_error() {
        let err = SubscriptionRecord::try_from(row("paused", None)).unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);
    }

    #[test]
    fn unknown_plan_is_a_database_error() {
        let err = SubscriptionRecord::try_from(row("pending", Some("weekly"))).unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);
    }
}
