use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::validation::{validate_capacity, validate_time_range};
use crate::models::{ClassStats, ClassStatus, CreateClass, GymClassRow, UpdateClass};
use crate::services::ServiceError;

const CLASS_COLUMNS: &str = "c.id, c.class_name, c.description, c.trainer_id, \
     u.first_name AS trainer_first_name, u.last_name AS trainer_last_name, \
     t.specialization, c.start_time, c.end_time, c.max_capacity, c.current_bookings, c.status";

const CLASS_JOINS: &str = "FROM classes c \
     JOIN trainers t ON c.trainer_id = t.id \
     JOIN users u ON t.user_id = u.id";

#[derive(Debug, Clone)]
pub struct ClassService {
    db: PgPool,
}

impl ClassService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create_class(&self, class: CreateClass) -> Result<GymClassRow, ServiceError> {
        validate_capacity(class.max_capacity).map_err(ServiceError::validation)?;
        validate_time_range(class.start_time, class.end_time).map_err(ServiceError::validation)?;

        if self
            .trainer_has_conflict(class.trainer_id, class.start_time, class.end_time, None)
            .await?
        {
            return Err(ServiceError::conflict(
                "Trainer already has a class in this time slot",
            ));
        }

        let class_id: Uuid = sqlx::query_scalar(
            "INSERT INTO classes (id, class_name, description, trainer_id, start_time, end_time, max_capacity)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING id",
        )
        .bind(Uuid::new_v4())
        .bind(&class.class_name)
        .bind(&class.description)
        .bind(class.trainer_id)
        .bind(class.start_time)
        .bind(class.end_time)
        .bind(class.max_capacity)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            if ServiceError::is_pg_code(&e, "23503") {
                ServiceError::NotFound("Trainer")
            } else {
                ServiceError::Database(e)
            }
        })?;

        tracing::info!(%class_id, "class created");
        self.get_class(class_id).await
    }

    pub async fn get_class(&self, class_id: Uuid) -> Result<GymClassRow, ServiceError> {
        let sql = format!("SELECT {CLASS_COLUMNS} {CLASS_JOINS} WHERE c.id = $1");
        sqlx::query_as::<_, GymClassRow>(&sql)
            .bind(class_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(ServiceError::NotFound("Class"))
    }

    pub async fn list_classes(&self) -> Result<Vec<GymClassRow>, ServiceError> {
        let sql = format!("SELECT {CLASS_COLUMNS} {CLASS_JOINS} ORDER BY c.start_time DESC");
        let rows = sqlx::query_as::<_, GymClassRow>(&sql).fetch_all(&self.db).await?;
        Ok(rows)
    }

    /// Case-insensitive search over class name, description and trainer name.
    pub async fn search_classes(&self, term: &str) -> Result<Vec<GymClassRow>, ServiceError> {
        let pattern = format!("%{}%", term.to_lowercase());
        let sql = format!(
            "SELECT {CLASS_COLUMNS} {CLASS_JOINS}
             WHERE LOWER(c.class_name) LIKE $1 OR LOWER(c.description) LIKE $1
                OR LOWER(u.first_name) LIKE $1 OR LOWER(u.last_name) LIKE $1
             ORDER BY c.start_time DESC"
        );
        let rows = sqlx::query_as::<_, GymClassRow>(&sql)
            .bind(&pattern)
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }

    /// Classes ranked by booking count.
    pub async fn popular_classes(&self, limit: i64) -> Result<Vec<GymClassRow>, ServiceError> {
        let sql = format!(
            "SELECT {CLASS_COLUMNS} {CLASS_JOINS}
             WHERE c.status <> 'CANCELLED'
             ORDER BY c.current_bookings DESC, c.start_time
             LIMIT $1"
        );
        let rows = sqlx::query_as::<_, GymClassRow>(&sql)
            .bind(limit)
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }

    /// Upcoming classes that still have open spots.
    pub async fn available_classes(&self) -> Result<Vec<GymClassRow>, ServiceError> {
        let sql = format!(
            "SELECT {CLASS_COLUMNS} {CLASS_JOINS}
             WHERE c.status = 'SCHEDULED'
               AND c.start_time > NOW()
               AND c.current_bookings < c.max_capacity
             ORDER BY c.start_time"
        );
        let rows = sqlx::query_as::<_, GymClassRow>(&sql).fetch_all(&self.db).await?;
        Ok(rows)
    }

    pub async fn classes_by_trainer(
        &self,
        trainer_id: Uuid,
    ) -> Result<Vec<GymClassRow>, ServiceError> {
        let sql = format!(
            "SELECT {CLASS_COLUMNS} {CLASS_JOINS}
             WHERE c.trainer_id = $1
             ORDER BY c.start_time"
        );
        let rows = sqlx::query_as::<_, GymClassRow>(&sql)
            .bind(trainer_id)
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }

    pub async fn classes_by_status(
        &self,
        status: ClassStatus,
    ) -> Result<Vec<GymClassRow>, ServiceError> {
        let sql = format!(
            "SELECT {CLASS_COLUMNS} {CLASS_JOINS}
             WHERE c.status = $1
             ORDER BY c.start_time"
        );
        let rows = sqlx::query_as::<_, GymClassRow>(&sql)
            .bind(status)
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }

    pub async fn classes_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<GymClassRow>, ServiceError> {
        let sql = format!(
            "SELECT {CLASS_COLUMNS} {CLASS_JOINS}
             WHERE c.start_time >= $1 AND c.start_time <= $2
             ORDER BY c.start_time"
        );
        let rows = sqlx::query_as::<_, GymClassRow>(&sql)
            .bind(from)
            .bind(to)
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }

    pub async fn update_class(
        &self,
        class_id: Uuid,
        class: UpdateClass,
    ) -> Result<GymClassRow, ServiceError> {
        if let Some(capacity) = class.max_capacity {
            validate_capacity(capacity).map_err(ServiceError::validation)?;
        }

        let current = self.get_class(class_id).await?;
        let trainer_id = class.trainer_id.unwrap_or(current.trainer_id);
        let start_time = class.start_time.unwrap_or(current.start_time);
        let end_time = class.end_time.unwrap_or(current.end_time);
        validate_time_range(start_time, end_time).map_err(ServiceError::validation)?;

        if self
            .trainer_has_conflict(trainer_id, start_time, end_time, Some(class_id))
            .await?
        {
            return Err(ServiceError::conflict(
                "Trainer already has a class in this time slot",
            ));
        }

        sqlx::query(
            "UPDATE classes
             SET class_name = COALESCE($2, class_name),
                 description = COALESCE($3, description),
                 trainer_id = $4,
                 start_time = $5,
                 end_time = $6,
                 max_capacity = COALESCE($7, max_capacity),
                 status = COALESCE($8, status)
             WHERE id = $1",
        )
        .bind(class_id)
        .bind(&class.class_name)
        .bind(&class.description)
        .bind(trainer_id)
        .bind(start_time)
        .bind(end_time)
        .bind(class.max_capacity)
        .bind(class.status)
        .execute(&self.db)
        .await
        .map_err(|e| {
            if ServiceError::is_pg_code(&e, "23503") {
                ServiceError::NotFound("Trainer")
            } else if ServiceError::is_pg_code(&e, "23514") {
                ServiceError::Validation(
                    "Capacity must not drop below the current booking count".into(),
                )
            } else {
                ServiceError::Database(e)
            }
        })?;

        self.get_class(class_id).await
    }

    /// Hard delete; FK cascade removes any bookings with it.
    pub async fn delete_class(&self, class_id: Uuid) -> Result<(), ServiceError> {
        let result = sqlx::query("DELETE FROM classes WHERE id = $1")
            .bind(class_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound("Class"));
        }
        tracing::info!(%class_id, "class deleted");
        Ok(())
    }

    /// Mark a class CANCELLED without touching its bookings.
    pub async fn cancel_class(&self, class_id: Uuid) -> Result<GymClassRow, ServiceError> {
        let result = sqlx::query(
            "UPDATE classes SET status = 'CANCELLED'
             WHERE id = $1 AND status IN ('SCHEDULED', 'FULL')",
        )
        .bind(class_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            // Either missing or not in a cancellable state.
            let _ = self.get_class(class_id).await?;
            return Err(ServiceError::conflict(
                "Only scheduled classes can be cancelled",
            ));
        }

        self.get_class(class_id).await
    }

    /// Advance class statuses based on the clock and occupancy.
    /// CANCELLED classes are never touched. Returns the number of rows
    /// changed.
    pub async fn refresh_class_statuses(&self) -> Result<u64, ServiceError> {
        let result = sqlx::query(
            "UPDATE classes
             SET status = CASE
                 WHEN end_time < NOW() THEN 'COMPLETED'::class_status
                 WHEN start_time <= NOW() AND end_time > NOW() THEN 'IN_PROGRESS'::class_status
                 WHEN current_bookings >= max_capacity AND status = 'SCHEDULED'
                     THEN 'FULL'::class_status
                 ELSE status
             END
             WHERE status IN ('SCHEDULED', 'IN_PROGRESS', 'FULL')",
        )
        .execute(&self.db)
        .await?;

        let updated = result.rows_affected();
        if updated > 0 {
            tracing::info!(updated, "class statuses refreshed");
        }
        Ok(updated)
    }

    pub async fn class_stats(&self) -> Result<ClassStats, ServiceError> {
        let stats = sqlx::query_as::<_, ClassStats>(
            "SELECT COUNT(*) AS total_classes,
                    COUNT(*) FILTER (WHERE status = 'SCHEDULED') AS scheduled,
                    COUNT(*) FILTER (WHERE status = 'IN_PROGRESS') AS in_progress,
                    COUNT(*) FILTER (WHERE status = 'COMPLETED') AS completed,
                    COUNT(*) FILTER (WHERE status = 'CANCELLED') AS cancelled,
                    CAST(AVG(current_bookings * 100.0 / max_capacity) AS DOUBLE PRECISION)
                        AS avg_occupancy_pct,
                    COALESCE(SUM(current_bookings), 0) AS total_bookings
             FROM classes",
        )
        .fetch_one(&self.db)
        .await?;
        Ok(stats)
    }

    /// Overlap test against the trainer's other classes. Cancelled
    /// classes do not block the slot.
    async fn trainer_has_conflict(
        &self,
        trainer_id: Uuid,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        exclude_class: Option<Uuid>,
    ) -> Result<bool, ServiceError> {
        let conflict: bool = sqlx::query_scalar(
            "SELECT EXISTS (
                 SELECT 1 FROM classes
                 WHERE trainer_id = $1
                   AND status <> 'CANCELLED'
                   AND start_time < $3
                   AND end_time > $2
                   AND ($4::uuid IS NULL OR id <> $4)
             )",
        )
        .bind(trainer_id)
        .bind(start_time)
        .bind(end_time)
        .bind(exclude_class)
        .fetch_one(&self.db)
        .await?;

        Ok(conflict)
    }
}
