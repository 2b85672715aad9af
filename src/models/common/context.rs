use crate::models::users::entities::{User, UserRole};

/// 请求上下文
///
/// 由 `RequireJWT` 注入的用户信息派生，只读，传入各类权限判断函数。
#[derive(Debug, Clone, PartialEq)]
pub struct RequestContext {
    pub user_id: i64,
    pub role: UserRole,
}

impl RequestContext {
    pub fn new(user_id: i64, role: UserRole) -> Self {
        Self { user_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn is_instructor(&self) -> bool {
        self.role == UserRole::Instructor
    }

    pub fn is_student(&self) -> bool {
        self.role == UserRole::Student
    }

    /// 管理员或讲师
    pub fn is_staff(&self) -> bool {
        self.is_admin() || self.is_instructor()
    }
}

impl From<&User> for RequestContext {
    fn from(user: &User) -> Self {
        Self::new(user.id, user.role.clone())
    }
}
