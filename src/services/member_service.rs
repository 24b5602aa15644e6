use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::UserRole;
use crate::models::{
    CreateMember, MemberResponse, MemberRow, MembershipStats, MembershipStatus, UpdateMember,
};
use crate::services::ServiceError;

const MEMBER_COLUMNS: &str = "m.id, m.user_id, u.username, u.email, u.first_name, u.last_name, \
     u.phone, m.emergency_contact, m.medical_conditions, m.membership_plan_id, \
     mp.plan_name, mp.price AS plan_price, \
     m.membership_start_date, m.membership_end_date, m.membership_status";

const MEMBER_JOINS: &str = "FROM members m \
     JOIN users u ON m.user_id = u.id \
     LEFT JOIN membership_plans mp ON m.membership_plan_id = mp.id";

#[derive(Debug, Clone)]
pub struct MemberService {
    db: PgPool,
}

impl MemberService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a member profile for an existing member-role user.
    pub async fn create_member(&self, member: CreateMember) -> Result<MemberResponse, ServiceError> {
        if member.membership_end_date < member.membership_start_date {
            return Err(ServiceError::Validation(
                "Membership end date must not precede the start date".into(),
            ));
        }

        let role: Option<UserRole> = sqlx::query_scalar("SELECT role FROM users WHERE id = $1")
            .bind(member.user_id)
            .fetch_optional(&self.db)
            .await?;
        match role {
            None => return Err(ServiceError::NotFound("User")),
            Some(UserRole::Member) => {}
            Some(_) => {
                return Err(ServiceError::conflict(
                    "User does not hold the member role",
                ))
            }
        }

        let member_id: Uuid = sqlx::query_scalar(
            "INSERT INTO members (id, user_id, emergency_contact, medical_conditions,
                                  membership_plan_id, membership_start_date, membership_end_date)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING id",
        )
        .bind(Uuid::new_v4())
        .bind(member.user_id)
        .bind(&member.emergency_contact)
        .bind(&member.medical_conditions)
        .bind(member.membership_plan_id)
        .bind(member.membership_start_date)
        .bind(member.membership_end_date)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            if ServiceError::is_pg_code(&e, "23505") {
                ServiceError::conflict("User already has a member profile")
            } else if ServiceError::is_pg_code(&e, "23503") {
                ServiceError::conflict("Membership plan does not exist")
            } else {
                ServiceError::Database(e)
            }
        })?;

        tracing::info!(%member_id, "member created");
        self.get_member(member_id).await
    }

    pub async fn get_member(&self, member_id: Uuid) -> Result<MemberResponse, ServiceError> {
        let sql = format!("SELECT {MEMBER_COLUMNS} {MEMBER_JOINS} WHERE m.id = $1");
        let row = sqlx::query_as::<_, MemberRow>(&sql)
            .bind(member_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(ServiceError::NotFound("Member"))?;

        Ok(MemberResponse::from(row))
    }

    pub async fn get_member_by_user(&self, user_id: Uuid) -> Result<MemberResponse, ServiceError> {
        let sql = format!("SELECT {MEMBER_COLUMNS} {MEMBER_JOINS} WHERE m.user_id = $1");
        let row = sqlx::query_as::<_, MemberRow>(&sql)
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(ServiceError::NotFound("Member"))?;

        Ok(MemberResponse::from(row))
    }

    /// Resolve a user id to its member profile id, if one exists.
    pub async fn member_id_for_user(&self, user_id: Uuid) -> Result<Uuid, ServiceError> {
        sqlx::query_scalar("SELECT id FROM members WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(ServiceError::NotFound("Member"))
    }

    pub async fn list_members(&self) -> Result<Vec<MemberResponse>, ServiceError> {
        let sql =
            format!("SELECT {MEMBER_COLUMNS} {MEMBER_JOINS} ORDER BY u.first_name, u.last_name");
        let rows = sqlx::query_as::<_, MemberRow>(&sql).fetch_all(&self.db).await?;

        Ok(rows.into_iter().map(MemberResponse::from).collect())
    }

    /// Case-insensitive search over name, email and phone.
    pub async fn search_members(&self, term: &str) -> Result<Vec<MemberResponse>, ServiceError> {
        let pattern = format!("%{}%", term.to_lowercase());
        let sql = format!(
            "SELECT {MEMBER_COLUMNS} {MEMBER_JOINS}
             WHERE LOWER(u.first_name) LIKE $1 OR LOWER(u.last_name) LIKE $1
                OR LOWER(u.email) LIKE $1 OR u.phone LIKE $1
             ORDER BY u.first_name, u.last_name"
        );
        let rows = sqlx::query_as::<_, MemberRow>(&sql)
            .bind(&pattern)
            .fetch_all(&self.db)
            .await?;

        Ok(rows.into_iter().map(MemberResponse::from).collect())
    }

    pub async fn members_by_status(
        &self,
        status: MembershipStatus,
    ) -> Result<Vec<MemberResponse>, ServiceError> {
        let sql = format!(
            "SELECT {MEMBER_COLUMNS} {MEMBER_JOINS}
             WHERE m.membership_status = $1
             ORDER BY u.first_name, u.last_name"
        );
        let rows = sqlx::query_as::<_, MemberRow>(&sql)
            .bind(status)
            .fetch_all(&self.db)
            .await?;

        Ok(rows.into_iter().map(MemberResponse::from).collect())
    }

    /// Active memberships ending within the next `days_ahead` days.
    pub async fn expiring_memberships(
        &self,
        days_ahead: i32,
    ) -> Result<Vec<MemberResponse>, ServiceError> {
        let sql = format!(
            "SELECT {MEMBER_COLUMNS} {MEMBER_JOINS}
             WHERE m.membership_status = 'ACTIVE'
               AND m.membership_end_date BETWEEN CURRENT_DATE AND CURRENT_DATE + $1
             ORDER BY m.membership_end_date"
        );
        let rows = sqlx::query_as::<_, MemberRow>(&sql)
            .bind(days_ahead)
            .fetch_all(&self.db)
            .await?;

        Ok(rows.into_iter().map(MemberResponse::from).collect())
    }

    pub async fn update_member(
        &self,
        member_id: Uuid,
        member: UpdateMember,
    ) -> Result<MemberResponse, ServiceError> {
        let result = sqlx::query(
            "UPDATE members
             SET emergency_contact = COALESCE($2, emergency_contact),
                 medical_conditions = COALESCE($3, medical_conditions),
                 membership_plan_id = COALESCE($4, membership_plan_id),
                 membership_start_date = COALESCE($5, membership_start_date),
                 membership_end_date = COALESCE($6, membership_end_date),
                 membership_status = COALESCE($7, membership_status)
             WHERE id = $1",
        )
        .bind(member_id)
        .bind(&member.emergency_contact)
        .bind(&member.medical_conditions)
        .bind(member.membership_plan_id)
        .bind(member.membership_start_date)
        .bind(member.membership_end_date)
        .bind(member.membership_status)
        .execute(&self.db)
        .await
        .map_err(|e| {
            if ServiceError::is_pg_code(&e, "23514") {
                ServiceError::Validation(
                    "Membership end date must not precede the start date".into(),
                )
            } else if ServiceError::is_pg_code(&e, "23503") {
                ServiceError::conflict("Membership plan does not exist")
            } else {
                ServiceError::Database(e)
            }
        })?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound("Member"));
        }

        self.get_member(member_id).await
    }

    pub async fn delete_member(&self, member_id: Uuid) -> Result<(), ServiceError> {
        let result = sqlx::query("DELETE FROM members WHERE id = $1")
            .bind(member_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound("Member"));
        }
        tracing::info!(%member_id, "member deleted");
        Ok(())
    }

    /// Flip ACTIVE memberships whose end date has passed to EXPIRED.
    /// Returns the number of rows changed.
    pub async fn refresh_expired_memberships(&self) -> Result<u64, ServiceError> {
        let result = sqlx::query(
            "UPDATE members SET membership_status = 'EXPIRED'
             WHERE membership_status = 'ACTIVE' AND membership_end_date < CURRENT_DATE",
        )
        .execute(&self.db)
        .await?;

        let updated = result.rows_affected();
        if updated > 0 {
            tracing::info!(updated, "expired memberships refreshed");
        }
        Ok(updated)
    }

    pub async fn membership_stats(&self) -> Result<MembershipStats, ServiceError> {
        let stats = sqlx::query_as::<_, MembershipStats>(
            "SELECT COUNT(*) AS total,
                    COUNT(*) FILTER (WHERE membership_status = 'ACTIVE') AS active,
                    COUNT(*) FILTER (WHERE membership_status = 'EXPIRED') AS expired,
                    COUNT(*) FILTER (WHERE membership_status = 'SUSPENDED') AS suspended
             FROM members",
        )
        .fetch_one(&self.db)
        .await?;

        Ok(stats)
    }
}
