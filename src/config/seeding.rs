use anyhow::Result;
use chrono::{Duration, Months, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::UserRole;
use crate::models::{CreateClass, CreateMember, CreatePlan, CreateTrainer, CreateUser};
use crate::services::{
    ClassService, MemberService, PlanService, TrainerService, UserService,
};

/// Demo-data seeder for development environments. Every step is
/// idempotent so restarts do not duplicate rows.
pub struct DatabaseSeeder {
    pool: PgPool,
}

impl DatabaseSeeder {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn seed_all(&self) -> Result<()> {
        tracing::info!("seeding demo data");

        self.seed_plans().await?;
        self.seed_admin().await?;
        self.seed_trainers().await?;
        self.seed_members().await?;
        self.seed_classes().await?;

        tracing::info!("demo data seeded");
        Ok(())
    }

    async fn seed_plans(&self) -> Result<()> {
        let plan_service = PlanService::new(self.pool.clone());

        let demo_plans = vec![
            CreatePlan {
                plan_name: "Basic Monthly".to_string(),
                description: Some("Gym floor access".to_string()),
                price: Decimal::new(2999, 2),
                duration_months: 1,
            },
            CreatePlan {
                plan_name: "Quarterly".to_string(),
                description: Some("Gym floor plus group classes".to_string()),
                price: Decimal::new(7999, 2),
                duration_months: 3,
            },
            CreatePlan {
                plan_name: "Annual".to_string(),
                description: Some("Everything, billed yearly".to_string()),
                price: Decimal::new(24999, 2),
                duration_months: 12,
            },
        ];

        for plan in demo_plans {
            if self.plan_exists(&plan.plan_name).await? {
                continue;
            }
            plan_service.create_plan(plan).await?;
        }

        Ok(())
    }

    async fn seed_admin(&self) -> Result<()> {
        let user_service = UserService::new(self.pool.clone());

        if self.user_id_by_username("admin").await?.is_none() {
            user_service
                .create_user(CreateUser {
                    username: "admin".to_string(),
                    email: "admin@gympulse.local".to_string(),
                    password: "Admin1234".to_string(),
                    role: UserRole::Admin,
                    first_name: "Site".to_string(),
                    last_name: "Admin".to_string(),
                    phone: None,
                })
                .await?;
            tracing::info!("created demo admin");
        }

        Ok(())
    }

    async fn seed_trainers(&self) -> Result<()> {
        let user_service = UserService::new(self.pool.clone());
        let trainer_service = TrainerService::new(self.pool.clone());

        let demo_trainers = [
            ("sarah.coach", "Sarah", "Nguyen", "Strength", 4500),
            ("liam.yoga", "Liam", "Patel", "Yoga", 4000),
        ];

        for (username, first, last, specialization, rate_cents) in demo_trainers {
            let user_id = match self.user_id_by_username(username).await? {
                Some(id) => id,
                None => {
                    user_service
                        .create_user(CreateUser {
                            username: username.to_string(),
                            email: format!("{username}@gympulse.local"),
                            password: "Trainer1234".to_string(),
                            role: UserRole::Trainer,
                            first_name: first.to_string(),
                            last_name: last.to_string(),
                            phone: None,
                        })
                        .await?
                        .id
                }
            };

            if !self.trainer_profile_exists(user_id).await? {
                trainer_service
                    .create_trainer(CreateTrainer {
                        user_id,
                        specialization: Some(specialization.to_string()),
                        certifications: None,
                        hourly_rate: Decimal::new(rate_cents, 2),
                        availability: Some("Weekdays 06:00-14:00".to_string()),
                    })
                    .await?;
            }
        }

        Ok(())
    }

    async fn seed_members(&self) -> Result<()> {
        let user_service = UserService::new(self.pool.clone());
        let member_service = MemberService::new(self.pool.clone());
        let plan_service = PlanService::new(self.pool.clone());

        let plans = plan_service.list_plans(true).await?;
        let plan_id = plans.first().map(|p| p.id);
        let today = Utc::now().date_naive();

        let demo_members = [
            ("ana.lifts", "Ana", "Moreno"),
            ("tom.runner", "Tom", "Keller"),
        ];

        for (username, first, last) in demo_members {
            let user_id = match self.user_id_by_username(username).await? {
                Some(id) => id,
                None => {
                    user_service
                        .create_user(CreateUser {
                            username: username.to_string(),
                            email: format!("{username}@gympulse.local"),
                            password: "Member1234".to_string(),
                            role: UserRole::Member,
                            first_name: first.to_string(),
                            last_name: last.to_string(),
                            phone: None,
                        })
                        .await?
                        .id
                }
            };

            if !self.member_profile_exists(user_id).await? {
                member_service
                    .create_member(CreateMember {
                        user_id,
                        emergency_contact: None,
                        medical_conditions: None,
                        membership_plan_id: plan_id,
                        membership_start_date: today,
                        membership_end_date: today
                            .checked_add_months(Months::new(1))
                            .unwrap_or(today),
                    })
                    .await?;
            }
        }

        Ok(())
    }

    async fn seed_classes(&self) -> Result<()> {
        let class_service = ClassService::new(self.pool.clone());
        let trainer_service = TrainerService::new(self.pool.clone());

        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM classes")
            .fetch_one(&self.pool)
            .await?;
        if existing > 0 {
            return Ok(());
        }

        let trainers = trainer_service.list_trainers().await?;
        let Some(trainer) = trainers.first() else {
            return Ok(());
        };

        let tomorrow = Utc::now() + Duration::days(1);
        class_service
            .create_class(CreateClass {
                class_name: "Morning Strength".to_string(),
                description: Some("Full-body strength session".to_string()),
                trainer_id: trainer.id,
                start_time: tomorrow,
                end_time: tomorrow + Duration::hours(1),
                max_capacity: 15,
            })
            .await?;

        Ok(())
    }

    async fn user_id_by_username(&self, username: &str) -> Result<Option<Uuid>> {
        let id = sqlx::query_scalar("SELECT id FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(id)
    }

    async fn plan_exists(&self, plan_name: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM membership_plans WHERE plan_name = $1")
            .bind(plan_name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn trainer_profile_exists(&self, user_id: Uuid) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM trainers WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn member_profile_exists(&self, user_id: Uuid) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM members WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }
}
