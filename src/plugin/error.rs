//! 플러그인 에러 타입: 인터프리터에 돌려줄 에러를 종류별로 구분합니다.

use crate::object::Object;
use crate::server::LifecycleError;
use crate::validator::ValidationError;

#[derive(thiserror::Error, Debug)]
pub enum PluginError {
    #[error("{0}")]
    Construct(ValidationError),

    #[error("method `{0}` not exists")]
    UnknownMethod(String),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

impl PluginError {
    /// 머신 리더블 에러 코드
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Construct(_) => "CONSTRUCT_ERROR",
            Self::UnknownMethod(_) => "UNKNOWN_METHOD",
            Self::Validation(_) => "INVALID_ARGUMENTS",
            Self::Lifecycle(LifecycleError::Bind { .. }) => "BIND_FAILED",
            Self::Lifecycle(_) => "LIFECYCLE_ERROR",
        }
    }

    /// Error value handed back to the script.
    pub fn to_object(&self) -> Object {
        Object::Error(self.to_string())
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "success": false,
            "error": self.to_string(),
            "error_code": self.error_code(),
        })
    }
}

impl From<PluginError> for Object {
    fn from(err: PluginError) -> Self {
        err.to_object()
    }
}
