//! PostgreSQL implementation of UserDirectory.
//!
//! Mutations are applied with a single conditional `UPDATE` whose `WHERE`
//! clause carries the sequence guard, so concurrent deliveries for the same
//! customer serialize on the row lock and never tear.

use crate::domain::billing::{
    ApplyOutcome, Mutation, Plan, ProfileUpdate, UserChanges, UserRecord, NO_PLAN,
};
use crate::domain::foundation::{
    CustomerId, DomainError, EmailAddress, ErrorCode, SubscriptionId, UserId,
};
use crate::ports::UserDirectory;
use async_trait::async_trait;
use sqlx::PgPool;

/// PostgreSQL implementation of the UserDirectory port.
pub struct PostgresUserDirectory {
    pool: PgPool,
}

impl PostgresUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a user.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: String,
    stripe_id: String,
    email: String,
    name: String,
    plan: Option<String>,
    plan_event_seq: Option<i64>,
    profile_event_seq: Option<i64>,
}

impl TryFrom<UserRow> for UserRecord {
    type Error = DomainError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(UserRecord {
            user_id: UserId::new(row.id).map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid user id: {}", e))
            })?,
            customer_id: CustomerId::new(row.stripe_id).map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid stripe_id: {}", e))
            })?,
            email: row.email,
            name: row.name,
            plan: Plan::from_stored(row.plan.as_deref()),
            plan_event_seq: row.plan_event_seq,
            profile_event_seq: row.profile_event_seq,
        })
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

fn map_write_error(context: &str, e: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            let constraint = db_err.constraint().unwrap_or("users").to_string();
            return DomainError::conflict(format!("{}: duplicate user", context))
                .with_detail("constraint", constraint);
        }
    }
    DomainError::database(format!("{}: {}", context, e))
}

const SELECT_USER: &str = r#"
    SELECT id, stripe_id, email, name, plan, plan_event_seq, profile_event_seq
    FROM users
"#;

#[async_trait]
impl UserDirectory for PostgresUserDirectory {
    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<UserRecord>, DomainError> {
        let row: Option<UserRow> = sqlx::query_as(&format!("{} WHERE email = $1", SELECT_USER))
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to find user: {}", e)))?;

        row.map(UserRecord::try_from).transpose()
    }

    async fn find_by_customer_id(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Option<UserRecord>, DomainError> {
        let row: Option<UserRow> = sqlx::query_as(&format!("{} WHERE stripe_id = $1", SELECT_USER))
            .bind(customer_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to find user: {}", e)))?;

        row.map(UserRecord::try_from).transpose()
    }

    async fn create(&self, user: &UserRecord) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, stripe_id, email, name, plan, plan_event_seq, profile_event_seq)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(user.user_id.as_str())
        .bind(user.customer_id.as_str())
        .bind(&user.email)
        .bind(&user.name)
        .bind(user.plan.as_stored())
        .bind(user.plan_event_seq)
        .bind(user.profile_event_seq)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error("Failed to create user", e))?;

        Ok(())
    }

    async fn apply(&self, mutation: &Mutation) -> Result<ApplyOutcome, DomainError> {
        let updated = match &mutation.changes {
            UserChanges::SetPlan(id) => self.set_plan(mutation, id).await?,
            UserChanges::ClearPlan(cancelled) => {
                self.clear_plan(mutation, cancelled.as_ref()).await?
            }
            UserChanges::SetProfile(profile) => self.set_profile(mutation, profile).await?,
        };
        if let Some(outcome) = updated {
            return Ok(outcome);
        }

        // Nothing updated: either no such customer or the guard rejected it.
        let outcome = match self.find_by_customer_id(&mutation.customer_id).await? {
            None => ApplyOutcome::Unmatched,
            Some(user) => user.rejection(mutation).unwrap_or(ApplyOutcome::Stale {
                last_applied: user
                    .last_applied(mutation.field_group())
                    .unwrap_or(mutation.sequence),
            }),
        };
        Ok(outcome)
    }
}

impl PostgresUserDirectory {
    async fn set_plan(
        &self,
        mutation: &Mutation,
        subscription: &SubscriptionId,
    ) -> Result<Option<ApplyOutcome>, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                plan = $2,
                plan_event_seq = $3,
                updated_at = NOW()
            WHERE stripe_id = $1
              AND (plan_event_seq IS NULL
                   OR plan_event_seq < $3
                   OR (plan_event_seq = $3 AND plan IS DISTINCT FROM $2))
            "#,
        )
        .bind(mutation.customer_id.as_str())
        .bind(subscription.as_str())
        .bind(mutation.sequence)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error("Failed to set plan", e))?;

        Ok((result.rows_affected() > 0).then_some(ApplyOutcome::Applied))
    }

    /// Clears the plan, or only advances the sequence when the cancelled
    /// subscription is no longer the stored plan.
    async fn clear_plan(
        &self,
        mutation: &Mutation,
        cancelled: Option<&SubscriptionId>,
    ) -> Result<Option<ApplyOutcome>, DomainError> {
        let plan: Option<Option<String>> = sqlx::query_scalar(
            r#"
            UPDATE users SET
                plan = CASE
                    WHEN $2::text IS NOT NULL
                         AND COALESCE(NULLIF(TRIM(plan), ''), $3) NOT IN ($3, $2)
                    THEN plan
                    ELSE $3
                END,
                plan_event_seq = $4,
                updated_at = NOW()
            WHERE stripe_id = $1
              AND (plan_event_seq IS NULL OR plan_event_seq < $4)
            RETURNING plan
            "#,
        )
        .bind(mutation.customer_id.as_str())
        .bind(cancelled.map(SubscriptionId::as_str))
        .bind(NO_PLAN)
        .bind(mutation.sequence)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error("Failed to clear plan", e))?;

        Ok(plan.map(|plan| {
            if Plan::from_stored(plan.as_deref()).is_subscribed() {
                ApplyOutcome::Superseded
            } else {
                ApplyOutcome::Applied
            }
        }))
    }

    /// A unique-email violation leaves the row untouched and is reported as
    /// `EmailInUse`.
    async fn set_profile(
        &self,
        mutation: &Mutation,
        profile: &ProfileUpdate,
    ) -> Result<Option<ApplyOutcome>, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                name = $2,
                email = COALESCE($3, email),
                profile_event_seq = $4,
                updated_at = NOW()
            WHERE stripe_id = $1
              AND (profile_event_seq IS NULL OR profile_event_seq < $4)
            "#,
        )
        .bind(mutation.customer_id.as_str())
        .bind(&profile.name)
        .bind(profile.email.as_deref())
        .bind(mutation.sequence)
        .execute(&self.pool)
        .await;

        match result {
            Ok(result) => Ok((result.rows_affected() > 0).then_some(ApplyOutcome::Applied)),
            Err(e) if is_unique_violation(&e) => Ok(Some(ApplyOutcome::EmailInUse)),
            Err(e) => Err(map_write_error("Failed to update profile", e)),
        }
    }
}
