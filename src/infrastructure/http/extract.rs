//! Request Extractors

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use super::error::ApiError;
use crate::domain::reading::StudentId;

/// 上游网关注入的学生标识头
pub const STUDENT_ID_HEADER: &str = "x-student-id";

/// 当前请求的学生身份
#[derive(Debug, Clone)]
pub struct StudentIdentity(pub StudentId);

#[async_trait]
impl<S> FromRequestParts<S> for StudentIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(STUDENT_ID_HEADER)
            .ok_or_else(|| ApiError::BadRequest("Missing X-Student-Id header".to_string()))?
            .to_str()
            .map_err(|_| ApiError::BadRequest("Invalid X-Student-Id header".to_string()))?;

        StudentId::new(value)
            .map(StudentIdentity)
            .map_err(|e| ApiError::BadRequest(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(builder: axum::http::request::Builder) -> Result<StudentIdentity, ApiError> {
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        StudentIdentity::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_header_present() {
        let identity = extract(Request::builder().header("X-Student-Id", " stu-7 "))
            .await
            .unwrap();
        assert_eq!(identity.0.as_str(), "stu-7");
    }

    #[tokio::test]
    async fn test_header_missing_or_blank() {
        assert!(matches!(
            extract(Request::builder()).await,
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            extract(Request::builder().header("X-Student-Id", "   ")).await,
            Err(ApiError::BadRequest(_))
        ));
    }
}
