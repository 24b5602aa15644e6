// Domain models and request/response shapes

pub mod booking;
pub mod gym_class;
pub mod member;
pub mod payment;
pub mod plan;
pub mod report;
pub mod trainer;
pub mod user;
pub mod validation;

pub use booking::*;
pub use gym_class::*;
pub use member::*;
pub use payment::*;
pub use plan::*;
pub use report::*;
pub use trainer::*;
pub use user::*;
