// HTTP surface: one module per resource area, assembled in routes

pub mod auth;
pub mod classes;
pub mod health;
pub mod members;
pub mod payments;
pub mod plans;
pub mod reports;
pub mod routes;
pub mod trainers;
pub mod users;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    /// Maximum number of items to return (default: 50, max: 100)
    pub limit: Option<i64>,
    /// Number of items to skip (default: 0)
    pub offset: Option<i64>,
}

impl PaginationQuery {
    pub fn validate(&self) -> Result<(), &'static str> {
        if let Some(limit) = self.limit {
            if !(1..=100).contains(&limit) {
                return Err("Limit must be between 1 and 100");
            }
        }
        if let Some(offset) = self.offset {
            if offset < 0 {
                return Err("Offset must be non-negative");
            }
        }
        Ok(())
    }

    pub fn get_limit(&self) -> i64 {
        self.limit.unwrap_or(50).clamp(1, 100)
    }

    pub fn get_offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn pagination_defaults() {
        let query = PaginationQuery {
            limit: None,
            offset: None,
        };
        assert!(query.validate().is_ok());
        assert_eq!(query.get_limit(), 50);
        assert_eq!(query.get_offset(), 0);
    }

    #[test]
    fn pagination_rejects_out_of_range() {
        let query = PaginationQuery {
            limit: Some(500),
            offset: Some(-1),
        };
        assert!(query.validate().is_err());
    }
}
