//! 预导入模块，方便使用

pub use super::attendance::{
    ActiveModel as AttendanceActiveModel, Entity as AttendanceRecords, Model as AttendanceModel,
};
pub use super::batch_feedback::{
    ActiveModel as BatchFeedbackActiveModel, Entity as BatchFeedbacks,
    Model as BatchFeedbackModel,
};
pub use super::batches::{ActiveModel as BatchActiveModel, Entity as Batches, Model as BatchModel};
pub use super::courses::{
    ActiveModel as CourseActiveModel, Entity as Courses, Model as CourseModel,
};
pub use super::resources::{
    ActiveModel as ResourceActiveModel, Entity as Resources, Model as ResourceModel,
};
pub use super::schedules::{
    ActiveModel as ScheduleActiveModel, Entity as Schedules, Model as ScheduleModel,
};
pub use super::student_batches::{
    ActiveModel as StudentBatchActiveModel, Entity as StudentBatches,
    Model as StudentBatchModel,
};
pub use super::student_courses::{
    ActiveModel as StudentCourseActiveModel, Entity as StudentCourses,
    Model as StudentCourseModel,
};
pub use super::users::{ActiveModel as UserActiveModel, Entity as Users, Model as UserModel};
