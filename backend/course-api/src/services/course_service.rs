use chrono::Utc;
use std::sync::Arc;
use validator::Validate;

use crate::error::{CourseError, CourseResult};
use crate::metrics;
use crate::models::course::{
    AddFeedbackRequest, Course, Feedback, GenerateCourseRequest, GenerateCourseResponse,
    LearningPath, Module,
};
use crate::services::{course_repository::CourseRepository, llm_client::ChatCompletion, AppState};
use crate::synthesis;

const DEFAULT_CURRENT_LEVEL: &str = "Not specified";

pub struct CourseService {
    courses: Arc<dyn CourseRepository>,
    llm: Arc<dyn ChatCompletion>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl CourseService {
    pub fn new(state: &AppState) -> Self {
        Self {
            courses: state.courses.clone(),
            llm: state.llm.clone(),
        }
    }

    /// Generate a draft course from the conversation. Nothing is persisted.
    ///
    /// With `current_modules` present the generated modules are merged into
    /// the draft and finalized modules come back untouched.
    pub async fn generate_course(
        &self,
        req: GenerateCourseRequest,
    ) -> CourseResult<GenerateCourseResponse> {
        tracing::info!(
            user_id = %req.user_id,
            target_skill = %req.target_skill,
            turns = req.conversation.len(),
            has_draft = req.current_modules.is_some(),
            "Generating course"
        );

        let system_prompt =
            synthesis::compose_system_prompt(&req.target_skill, req.current_modules.as_deref())?;
        let messages = synthesis::build_conversation(system_prompt, &req.conversation);

        let raw = self.llm.complete(&messages).await.inspect_err(|_| {
            metrics::record_generation("model_error");
        })?;

        let generated = synthesis::synthesize(&raw).inspect_err(|e| {
            metrics::record_generation("invalid_output");
            tracing::warn!(error = %e, raw_len = raw.len(), "Model reply rejected");
        })?;

        let modules = synthesis::reconcile(req.current_modules.as_deref(), generated.modules);

        let now = Utc::now();
        let course = Course {
            id: None,
            title: non_blank(req.title)
                .unwrap_or_else(|| format!("{} Learning Path", req.target_skill)),
            description: non_blank(req.description)
                .unwrap_or_else(|| format!("A personalized learning path for {}", req.target_skill)),
            current_level: non_blank(req.current_level)
                .unwrap_or_else(|| DEFAULT_CURRENT_LEVEL.to_string()),
            user_id: req.user_id,
            target_skill: req.target_skill,
            learning_path: LearningPath {
                modules,
                estimated_total_hours: Some(generated.estimated_total_hours),
            },
            created_at: now,
            updated_at: now,
            feedback: Vec::new(),
        };

        metrics::record_generation("success");
        tracing::info!(
            modules = course.learning_path.modules.len(),
            "Course generated"
        );

        Ok(GenerateCourseResponse {
            course,
            follow_up_question: generated.follow_up_question,
        })
    }

    /// Persist a course; MongoDB assigns the id.
    pub async fn create_course(&self, mut course: Course) -> CourseResult<Course> {
        check_required_fields(&course)?;

        let now = Utc::now();
        course.created_at = now;
        course.updated_at = now;

        tracing::info!(
            user_id = %course.user_id,
            modules = course.learning_path.modules.len(),
            "Saving course"
        );

        self.courses.insert(course).await
    }

    pub async fn list_courses(&self, user_id: &str) -> CourseResult<Vec<Course>> {
        self.courses.find_by_owner(user_id).await
    }

    pub async fn get_course(&self, id: &str) -> CourseResult<Course> {
        self.courses
            .find_by_id(id)
            .await?
            .ok_or_else(|| CourseError::NotFound("Course".to_string()))
    }

    /// Append feedback. The module index is recorded as given.
    pub async fn add_feedback(&self, id: &str, req: AddFeedbackRequest) -> CourseResult<Course> {
        let feedback = Feedback {
            module_index: req.module_index,
            comment: req.comment,
            rating: req.rating,
            created_at: Utc::now(),
        };
        let rating = feedback.rating;

        let course = self
            .courses
            .push_feedback(id, feedback)
            .await?
            .ok_or_else(|| CourseError::NotFound("Course".to_string()))?;

        metrics::record_feedback(rating);
        tracing::info!(course_id = %id, rating, "Feedback added");

        Ok(course)
    }

    pub async fn delete_course(&self, id: &str) -> CourseResult<()> {
        if !self.courses.delete_by_id(id).await? {
            return Err(CourseError::NotFound("Course".to_string()));
        }
        tracing::info!(course_id = %id, "Course deleted");
        Ok(())
    }
}

fn check_required_fields(course: &Course) -> CourseResult<()> {
    let missing: Vec<&str> = [
        ("userId", &course.user_id),
        ("title", &course.title),
        ("description", &course.description),
        ("currentLevel", &course.current_level),
        ("targetSkill", &course.target_skill),
    ]
    .into_iter()
    .filter(|(_, value)| value.trim().is_empty())
    .map(|(name, _)| name)
    .collect();

    if !missing.is_empty() {
        return Err(CourseError::ValidationFailed(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }

    for (index, module) in course.learning_path.modules.iter().enumerate() {
        check_module(index, module)?;
    }

    for (index, entry) in course.feedback.iter().enumerate() {
        entry.validate().map_err(|e| {
            CourseError::ValidationFailed(format!("Feedback {} is invalid: {}", index, e))
        })?;
    }

    Ok(())
}

fn check_module(index: usize, module: &Module) -> CourseResult<()> {
    let missing = |field: &str| {
        CourseError::ValidationFailed(format!("Module {} is missing a {}", index, field))
    };

    if module.title.trim().is_empty() {
        return Err(missing("title"));
    }
    if module.description.trim().is_empty() {
        return Err(missing("description"));
    }

    for (resource_index, resource) in module.resources.iter().enumerate() {
        let blank = [
            ("type", &resource.kind),
            ("title", &resource.title),
            ("description", &resource.description),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty());

        if let Some((field, _)) = blank {
            return Err(CourseError::ValidationFailed(format!(
                "Resource {} of module {} is missing a {}",
                resource_index, index, field
            )));
        }
    }

    Ok(())
}
