use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::{
    error::CourseError,
    extractors::AppJson,
    models::course::{
        AddFeedbackRequest, ApiResponse, Course, CourseEnvelope, CourseListEnvelope,
        CourseListQuery, GenerateCourseRequest, GenerateCourseResponse, MessageEnvelope,
    },
    services::{course_service::CourseService, AppState},
};

const GENERATION_FAILED_MESSAGE: &str = "Failed to generate course, please try again";

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    BadGateway(String),
    Internal(String),
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }
}

impl From<CourseError> for ApiError {
    fn from(err: CourseError) -> Self {
        if err.is_generation_failure() {
            tracing::error!("Course generation failed: {}", err);
            return ApiError::BadGateway(GENERATION_FAILED_MESSAGE.to_string());
        }

        match err {
            CourseError::NotFound(_) => ApiError::NotFound(err.to_string()),
            CourseError::ValidationFailed(message) => ApiError::BadRequest(message),
            CourseError::ModuleFinalized(_) | CourseError::ModuleIndexOutOfRange { .. } => {
                ApiError::BadRequest(err.to_string())
            }
            CourseError::DuplicateKey(_) => {
                ApiError::Conflict("A course with this ID already exists".to_string())
            }
            other => {
                tracing::error!("Course request failed: {}", other);
                ApiError::Internal(other.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, message),
            ApiError::BadGateway(message) => (StatusCode::BAD_GATEWAY, message),
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        (status, Json(ApiResponse::<()>::failure(message, status.as_u16()))).into_response()
    }
}

fn ok<T>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse::success(data, StatusCode::OK.as_u16()))
}

/// POST /api/course/generate
pub async fn generate_course(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<GenerateCourseRequest>,
) -> Result<Json<ApiResponse<GenerateCourseResponse>>, ApiError> {
    if req.user_id.trim().is_empty() || req.target_skill.trim().is_empty() {
        return Err(ApiError::bad_request("Missing required fields"));
    }

    let service = CourseService::new(&state);
    let response = service.generate_course(req).await?;
    Ok(ok(response))
}

/// POST /api/course
pub async fn create_course(
    State(state): State<Arc<AppState>>,
    AppJson(course): AppJson<Course>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!("Received course creation request for user_id={}", course.user_id);

    let service = CourseService::new(&state);
    let course = service.create_course(course).await?;

    let status = StatusCode::CREATED;
    Ok((
        status,
        Json(ApiResponse::success(CourseEnvelope { course }, status.as_u16())),
    ))
}

/// GET /api/course?userId=
pub async fn list_courses(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CourseListQuery>,
) -> Result<Json<ApiResponse<CourseListEnvelope>>, ApiError> {
    let user_id = query
        .user_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing userId parameter"))?;

    let service = CourseService::new(&state);
    let courses = service.list_courses(&user_id).await?;
    Ok(ok(CourseListEnvelope { courses }))
}

/// GET /api/course/{id}
pub async fn get_course(
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<String>,
) -> Result<Json<ApiResponse<CourseEnvelope>>, ApiError> {
    let service = CourseService::new(&state);
    let course = service.get_course(&course_id).await?;
    Ok(ok(CourseEnvelope { course }))
}

/// PUT /api/course/{id} appends one feedback entry
pub async fn add_feedback(
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<String>,
    AppJson(req): AppJson<AddFeedbackRequest>,
) -> Result<Json<ApiResponse<CourseEnvelope>>, ApiError> {
    if let Err(e) = req.validate() {
        return Err(ApiError::bad_request(format!("Validation error: {}", e)));
    }

    let service = CourseService::new(&state);
    let course = service.add_feedback(&course_id, req).await?;
    Ok(ok(CourseEnvelope { course }))
}

/// DELETE /api/course/{id}
pub async fn delete_course(
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<String>,
) -> Result<Json<ApiResponse<MessageEnvelope>>, ApiError> {
    let service = CourseService::new(&state);
    service.delete_course(&course_id).await?;
    Ok(ok(MessageEnvelope {
        message: "Course deleted successfully".to_string(),
    }))
}
