use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{BookingStatus, ClassBooking, ClassStatus, GymClassRow, RosterEntry};
use crate::services::ServiceError;

/// Booking flow. Capacity checks run inside a transaction holding a row
/// lock on the class; the `class_bookings_counter` trigger keeps
/// `current_bookings` in step with the booking rows.
#[derive(Debug, Clone)]
pub struct BookingService {
    db: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct LockedClass {
    max_capacity: i32,
    current_bookings: i32,
    status: ClassStatus,
}

impl BookingService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn book_class(
        &self,
        class_id: Uuid,
        member_id: Uuid,
    ) -> Result<ClassBooking, ServiceError> {
        let mut tx = self.db.begin().await?;

        let class = sqlx::query_as::<_, LockedClass>(
            "SELECT max_capacity, current_bookings, status
             FROM classes WHERE id = $1
             FOR UPDATE",
        )
        .bind(class_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ServiceError::NotFound("Class"))?;

        match class.status {
            ClassStatus::Cancelled | ClassStatus::Completed => {
                return Err(ServiceError::conflict(
                    "Class is not open for booking",
                ));
            }
            _ => {}
        }
        if class.current_bookings >= class.max_capacity {
            return Err(ServiceError::ClassFull);
        }

        let existing: Option<Uuid> = sqlx::query_scalar(
            "SELECT id FROM class_bookings WHERE class_id = $1 AND member_id = $2",
        )
        .bind(class_id)
        .bind(member_id)
        .fetch_optional(&mut *tx)
        .await?;
        if existing.is_some() {
            return Err(ServiceError::DuplicateBooking);
        }

        let booking = sqlx::query_as::<_, ClassBooking>(
            "INSERT INTO class_bookings (id, class_id, member_id)
             VALUES ($1, $2, $3)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(class_id)
        .bind(member_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            // Two transactions can pass the SELECT; the unique index
            // catches the loser.
            if ServiceError::is_pg_code(&e, "23505") {
                ServiceError::DuplicateBooking
            } else if ServiceError::is_pg_code(&e, "23503") {
                ServiceError::NotFound("Member")
            } else {
                ServiceError::Database(e)
            }
        })?;

        // Closing the last spot flips the class to FULL while the row
        // lock is still held.
        if class.current_bookings + 1 >= class.max_capacity {
            sqlx::query(
                "UPDATE classes SET status = 'FULL' WHERE id = $1 AND status = 'SCHEDULED'",
            )
            .bind(class_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(%class_id, %member_id, "class booked");
        Ok(booking)
    }

    pub async fn cancel_booking(
        &self,
        class_id: Uuid,
        member_id: Uuid,
    ) -> Result<(), ServiceError> {
        let mut tx = self.db.begin().await?;

        let result = sqlx::query(
            "DELETE FROM class_bookings WHERE class_id = $1 AND member_id = $2",
        )
        .bind(class_id)
        .bind(member_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound("Booking"));
        }

        // A freed spot reopens a FULL class.
        sqlx::query(
            "UPDATE classes SET status = 'SCHEDULED'
             WHERE id = $1 AND status = 'FULL' AND current_bookings < max_capacity",
        )
        .bind(class_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(%class_id, %member_id, "booking cancelled");
        Ok(())
    }

    /// Booked members for a class, with contact details.
    pub async fn class_roster(&self, class_id: Uuid) -> Result<Vec<RosterEntry>, ServiceError> {
        let roster = sqlx::query_as::<_, RosterEntry>(
            "SELECT b.id AS booking_id, b.member_id, u.first_name, u.last_name,
                    u.email, u.phone, b.booking_date, b.status
             FROM class_bookings b
             JOIN members m ON b.member_id = m.id
             JOIN users u ON m.user_id = u.id
             WHERE b.class_id = $1
             ORDER BY b.booking_date",
        )
        .bind(class_id)
        .fetch_all(&self.db)
        .await?;

        Ok(roster)
    }

    /// Classes a member holds a booking for.
    pub async fn member_classes(&self, member_id: Uuid) -> Result<Vec<GymClassRow>, ServiceError> {
        let classes = sqlx::query_as::<_, GymClassRow>(
            "SELECT c.id, c.class_name, c.description, c.trainer_id,
                    u.first_name AS trainer_first_name, u.last_name AS trainer_last_name,
                    t.specialization, c.start_time, c.end_time,
                    c.max_capacity, c.current_bookings, c.status
             FROM class_bookings b
             JOIN classes c ON b.class_id = c.id
             JOIN trainers t ON c.trainer_id = t.id
             JOIN users u ON t.user_id = u.id
             WHERE b.member_id = $1
             ORDER BY c.start_time",
        )
        .bind(member_id)
        .fetch_all(&self.db)
        .await?;

        Ok(classes)
    }

    /// Upcoming open classes the member has not booked yet.
    pub async fn available_classes_for_member(
        &self,
        member_id: Uuid,
    ) -> Result<Vec<GymClassRow>, ServiceError> {
        let classes = sqlx::query_as::<_, GymClassRow>(
            "SELECT c.id, c.class_name, c.description, c.trainer_id,
                    u.first_name AS trainer_first_name, u.last_name AS trainer_last_name,
                    t.specialization, c.start_time, c.end_time,
                    c.max_capacity, c.current_bookings, c.status
             FROM classes c
             JOIN trainers t ON c.trainer_id = t.id
             JOIN users u ON t.user_id = u.id
             WHERE c.status = 'SCHEDULED'
               AND c.start_time > NOW()
               AND c.current_bookings < c.max_capacity
               AND NOT EXISTS (
                   SELECT 1 FROM class_bookings b
                   WHERE b.class_id = c.id AND b.member_id = $1
               )
             ORDER BY c.start_time",
        )
        .bind(member_id)
        .fetch_all(&self.db)
        .await?;

        Ok(classes)
    }

    /// Attendance marking (ATTENDED / NO_SHOW). Cancellation goes
    /// through `cancel_booking` so the counter trigger fires.
    pub async fn set_booking_status(
        &self,
        class_id: Uuid,
        member_id: Uuid,
        status: BookingStatus,
    ) -> Result<ClassBooking, ServiceError> {
        if status == BookingStatus::Cancelled {
            return Err(ServiceError::Validation(
                "Use the cancellation endpoint to cancel a booking".into(),
            ));
        }

        sqlx::query_as::<_, ClassBooking>(
            "UPDATE class_bookings SET status = $3
             WHERE class_id = $1 AND member_id = $2
             RETURNING *",
        )
        .bind(class_id)
        .bind(member_id)
        .bind(status)
        .fetch_optional(&self.db)
        .await?
        .ok_or(ServiceError::NotFound("Booking"))
    }
}
