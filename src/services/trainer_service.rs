use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::UserRole;
use crate::models::{CreateTrainer, SpecializationCount, TrainerRow, TrainerStats, UpdateTrainer};
use crate::services::ServiceError;

const TRAINER_COLUMNS: &str = "t.id, t.user_id, u.username, u.email, u.first_name, u.last_name, \
     u.phone, t.specialization, t.certifications, t.hourly_rate, t.availability, \
     (SELECT COUNT(*) FROM classes c WHERE c.trainer_id = t.id) AS total_classes";

const TRAINER_JOINS: &str = "FROM trainers t JOIN users u ON t.user_id = u.id";

#[derive(Debug, Clone)]
pub struct TrainerService {
    db: PgPool,
}

impl TrainerService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a trainer profile for an existing trainer-role user.
    pub async fn create_trainer(
        &self,
        trainer: CreateTrainer,
    ) -> Result<TrainerRow, ServiceError> {
        if trainer.hourly_rate < Decimal::ZERO {
            return Err(ServiceError::Validation(
                "Hourly rate must not be negative".into(),
            ));
        }

        let role: Option<UserRole> = sqlx::query_scalar("SELECT role FROM users WHERE id = $1")
            .bind(trainer.user_id)
            .fetch_optional(&self.db)
            .await?;
        match role {
            None => return Err(ServiceError::NotFound("User")),
            Some(UserRole::Trainer) => {}
            Some(_) => {
                return Err(ServiceError::conflict(
                    "User does not hold the trainer role",
                ))
            }
        }

        let trainer_id: Uuid = sqlx::query_scalar(
            "INSERT INTO trainers (id, user_id, specialization, certifications, hourly_rate, availability)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id",
        )
        .bind(Uuid::new_v4())
        .bind(trainer.user_id)
        .bind(&trainer.specialization)
        .bind(&trainer.certifications)
        .bind(trainer.hourly_rate)
        .bind(&trainer.availability)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            if ServiceError::is_pg_code(&e, "23505") {
                ServiceError::conflict("User already has a trainer profile")
            } else {
                ServiceError::Database(e)
            }
        })?;

        tracing::info!(%trainer_id, "trainer created");
        self.get_trainer(trainer_id).await
    }

    pub async fn get_trainer(&self, trainer_id: Uuid) -> Result<TrainerRow, ServiceError> {
        let sql = format!("SELECT {TRAINER_COLUMNS} {TRAINER_JOINS} WHERE t.id = $1");
        sqlx::query_as::<_, TrainerRow>(&sql)
            .bind(trainer_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(ServiceError::NotFound("Trainer"))
    }

    /// Resolve a user id to its trainer profile id, if one exists.
    pub async fn trainer_id_for_user(&self, user_id: Uuid) -> Result<Uuid, ServiceError> {
        sqlx::query_scalar("SELECT id FROM trainers WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(ServiceError::NotFound("Trainer"))
    }

    pub async fn list_trainers(&self) -> Result<Vec<TrainerRow>, ServiceError> {
        let sql =
            format!("SELECT {TRAINER_COLUMNS} {TRAINER_JOINS} ORDER BY u.first_name, u.last_name");
        let rows = sqlx::query_as::<_, TrainerRow>(&sql).fetch_all(&self.db).await?;
        Ok(rows)
    }

    /// Case-insensitive search over trainer name, email, phone and
    /// specialization.
    pub async fn search_trainers(&self, term: &str) -> Result<Vec<TrainerRow>, ServiceError> {
        let pattern = format!("%{}%", term.to_lowercase());
        let sql = format!(
            "SELECT {TRAINER_COLUMNS} {TRAINER_JOINS}
             WHERE LOWER(u.first_name) LIKE $1 OR LOWER(u.last_name) LIKE $1
                OR LOWER(u.email) LIKE $1 OR u.phone LIKE $1
                OR LOWER(t.specialization) LIKE $1
             ORDER BY u.first_name, u.last_name"
        );
        let rows = sqlx::query_as::<_, TrainerRow>(&sql)
            .bind(&pattern)
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }

    pub async fn trainers_by_rate_range(
        &self,
        min_rate: Decimal,
        max_rate: Decimal,
    ) -> Result<Vec<TrainerRow>, ServiceError> {
        if min_rate < Decimal::ZERO || min_rate > max_rate {
            return Err(ServiceError::Validation(
                "Rate range must be non-negative with min at most max".into(),
            ));
        }

        let sql = format!(
            "SELECT {TRAINER_COLUMNS} {TRAINER_JOINS}
             WHERE t.hourly_rate BETWEEN $1 AND $2
             ORDER BY t.hourly_rate"
        );
        let rows = sqlx::query_as::<_, TrainerRow>(&sql)
            .bind(min_rate)
            .bind(max_rate)
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }

    pub async fn trainers_by_specialization(
        &self,
        specialization: &str,
    ) -> Result<Vec<TrainerRow>, ServiceError> {
        let pattern = format!("%{}%", specialization.to_lowercase());
        let sql = format!(
            "SELECT {TRAINER_COLUMNS} {TRAINER_JOINS}
             WHERE LOWER(t.specialization) LIKE $1
             ORDER BY u.first_name, u.last_name"
        );
        let rows = sqlx::query_as::<_, TrainerRow>(&sql)
            .bind(&pattern)
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }

    /// Trainers ranked by the number of classes they teach.
    pub async fn top_trainers(&self, limit: i64) -> Result<Vec<TrainerRow>, ServiceError> {
        let sql = format!(
            "SELECT {TRAINER_COLUMNS} {TRAINER_JOINS}
             ORDER BY total_classes DESC, u.first_name
             LIMIT $1"
        );
        let rows = sqlx::query_as::<_, TrainerRow>(&sql)
            .bind(limit)
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }

    pub async fn update_trainer(
        &self,
        trainer_id: Uuid,
        trainer: UpdateTrainer,
    ) -> Result<TrainerRow, ServiceError> {
        if matches!(trainer.hourly_rate, Some(r) if r < Decimal::ZERO) {
            return Err(ServiceError::Validation(
                "Hourly rate must not be negative".into(),
            ));
        }

        let result = sqlx::query(
            "UPDATE trainers
             SET specialization = COALESCE($2, specialization),
                 certifications = COALESCE($3, certifications),
                 hourly_rate = COALESCE($4, hourly_rate),
                 availability = COALESCE($5, availability)
             WHERE id = $1",
        )
        .bind(trainer_id)
        .bind(&trainer.specialization)
        .bind(&trainer.certifications)
        .bind(trainer.hourly_rate)
        .bind(&trainer.availability)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound("Trainer"));
        }

        self.get_trainer(trainer_id).await
    }

    pub async fn delete_trainer(&self, trainer_id: Uuid) -> Result<(), ServiceError> {
        let result = sqlx::query("DELETE FROM trainers WHERE id = $1")
            .bind(trainer_id)
            .execute(&self.db)
            .await
            .map_err(|e| {
                if ServiceError::is_pg_code(&e, "23503") {
                    ServiceError::conflict("Trainer still has classes assigned")
                } else {
                    ServiceError::Database(e)
                }
            })?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound("Trainer"));
        }
        tracing::info!(%trainer_id, "trainer deleted");
        Ok(())
    }

    pub async fn trainer_stats(&self) -> Result<TrainerStats, ServiceError> {
        let stats = sqlx::query_as::<_, TrainerStats>(
            "SELECT COUNT(*) AS total,
                    AVG(hourly_rate) AS avg_rate,
                    MIN(hourly_rate) AS min_rate,
                    MAX(hourly_rate) AS max_rate
             FROM trainers",
        )
        .fetch_one(&self.db)
        .await?;
        Ok(stats)
    }

    pub async fn specialization_distribution(
        &self,
    ) -> Result<Vec<SpecializationCount>, ServiceError> {
        let rows = sqlx::query_as::<_, SpecializationCount>(
            "SELECT COALESCE(specialization, 'Unspecified') AS specialization,
                    COUNT(*) AS count
             FROM trainers
             GROUP BY COALESCE(specialization, 'Unspecified')
             ORDER BY count DESC",
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }
}
