/// 业务错误码，随 `ApiResponse.code` 返回
///
/// 0 表示成功；1xxx 通用错误；2xxx 认证；3xxx 用户；4xxx 课程/班次；
/// 5xxx 课表/考勤；6xxx 资源/文件；7xxx 反馈。
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Success = 0,

    BadRequest = 1000,
    ValidationFailed = 1001,
    NotFound = 1004,
    Conflict = 1009,
    RateLimitExceeded = 1029,
    InternalServerError = 1500,

    Unauthorized = 2001,
    AuthFailed = 2002,
    PermissionDenied = 2003,

    UserNotFound = 3001,
    UserAlreadyExists = 3002,
    UserCreationFailed = 3003,
    CannotDeleteSelf = 3004,

    CourseNotFound = 4001,
    BatchNotFound = 4101,
    BatchPermissionDenied = 4102,
    StudentAlreadyEnrolled = 4103,
    StudentNotEnrolled = 4104,

    ScheduleNotFound = 5001,
    InvalidScheduleTime = 5002,
    AttendanceInvalidStatus = 5101,

    ResourceNotFound = 6001,
    ResourceLocked = 6002,
    FileNotFound = 6003,
    FileUploadFailed = 6004,
    FileTypeNotAllowed = 6005,
    FileSizeExceeded = 6006,
    MultifileUploadNotAllowed = 6007,

    FeedbackIntervalInvalid = 7001,
    FeedbackOutOfOrder = 7002,
}
