pub mod attendance;

pub mod auth;

pub mod batches;

pub mod courses;

pub mod dashboard;

pub mod feedback;

pub mod resources;

pub mod schedules;

pub mod users;

pub use attendance::configure_attendance_routes;
pub use auth::configure_auth_routes;
pub use batches::configure_batches_routes;
pub use courses::configure_courses_routes;
pub use dashboard::configure_dashboard_routes;
pub use resources::configure_resource_routes;
pub use schedules::configure_schedule_routes;
pub use users::configure_user_routes;
