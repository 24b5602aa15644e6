use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{CreatePlan, MembershipPlan, UpdatePlan};
use crate::services::ServiceError;

#[derive(Debug, Clone)]
pub struct PlanService {
    db: PgPool,
}

impl PlanService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create_plan(&self, plan: CreatePlan) -> Result<MembershipPlan, ServiceError> {
        if plan.price < Decimal::ZERO {
            return Err(ServiceError::Validation("Price must not be negative".into()));
        }
        if plan.duration_months < 1 {
            return Err(ServiceError::Validation(
                "Duration must be at least one month".into(),
            ));
        }

        let created = sqlx::query_as::<_, MembershipPlan>(
            "INSERT INTO membership_plans (id, plan_name, description, price, duration_months)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&plan.plan_name)
        .bind(&plan.description)
        .bind(plan.price)
        .bind(plan.duration_months)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            if ServiceError::is_pg_code(&e, "23505") {
                ServiceError::conflict("Plan name already exists")
            } else {
                ServiceError::Database(e)
            }
        })?;

        Ok(created)
    }

    pub async fn get_plan(&self, plan_id: Uuid) -> Result<MembershipPlan, ServiceError> {
        sqlx::query_as::<_, MembershipPlan>("SELECT * FROM membership_plans WHERE id = $1")
            .bind(plan_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(ServiceError::NotFound("Membership plan"))
    }

    pub async fn list_plans(&self, active_only: bool) -> Result<Vec<MembershipPlan>, ServiceError> {
        let plans = sqlx::query_as::<_, MembershipPlan>(
            "SELECT * FROM membership_plans
             WHERE NOT $1 OR is_active
             ORDER BY price",
        )
        .bind(active_only)
        .fetch_all(&self.db)
        .await?;

        Ok(plans)
    }

    pub async fn update_plan(
        &self,
        plan_id: Uuid,
        plan: UpdatePlan,
    ) -> Result<MembershipPlan, ServiceError> {
        if matches!(plan.price, Some(p) if p < Decimal::ZERO) {
            return Err(ServiceError::Validation("Price must not be negative".into()));
        }
        if matches!(plan.duration_months, Some(d) if d < 1) {
            return Err(ServiceError::Validation(
                "Duration must be at least one month".into(),
            ));
        }

        let updated = sqlx::query_as::<_, MembershipPlan>(
            "UPDATE membership_plans
             SET plan_name = COALESCE($2, plan_name),
                 description = COALESCE($3, description),
                 price = COALESCE($4, price),
                 duration_months = COALESCE($5, duration_months),
                 is_active = COALESCE($6, is_active)
             WHERE id = $1
             RETURNING *",
        )
        .bind(plan_id)
        .bind(&plan.plan_name)
        .bind(&plan.description)
        .bind(plan.price)
        .bind(plan.duration_months)
        .bind(plan.is_active)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| {
            if ServiceError::is_pg_code(&e, "23505") {
                ServiceError::conflict("Plan name already exists")
            } else {
                ServiceError::Database(e)
            }
        })?
        .ok_or(ServiceError::NotFound("Membership plan"))?;

        Ok(updated)
    }

    pub async fn delete_plan(&self, plan_id: Uuid) -> Result<(), ServiceError> {
        let result = sqlx::query("DELETE FROM membership_plans WHERE id = $1")
            .bind(plan_id)
            .execute(&self.db)
            .await
            .map_err(|e| {
                if ServiceError::is_pg_code(&e, "23503") {
                    ServiceError::conflict("Plan is referenced by members")
                } else {
                    ServiceError::Database(e)
                }
            })?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound("Membership plan"));
        }
        Ok(())
    }
}
