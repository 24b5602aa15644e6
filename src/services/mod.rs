// Business logic over the database pool, one service per domain area

pub mod booking_service;
pub mod class_service;
pub mod errors;
pub mod member_service;
pub mod payment_service;
pub mod plan_service;
pub mod report_service;
pub mod trainer_service;
pub mod user_service;

pub use booking_service::BookingService;
pub use class_service::ClassService;
pub use errors::ServiceError;
pub use member_service::MemberService;
pub use payment_service::PaymentService;
pub use plan_service::PlanService;
pub use report_service::ReportService;
pub use trainer_service::TrainerService;
pub use user_service::UserService;
