#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use inculearn_api::{
    config::{Config, LlmConfig},
    create_router,
    error::{CourseError, CourseResult},
    models::course::{ChatMessage, Course, Feedback},
    services::{course_repository::CourseRepository, llm_client::ChatCompletion, AppState},
};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// Course storage kept in memory for handler tests.
#[derive(Default)]
pub struct InMemoryCourseRepository {
    courses: Mutex<Vec<Course>>,
    next_id: Mutex<u64>,
}

impl InMemoryCourseRepository {
    pub fn len(&self) -> usize {
        self.courses.lock().unwrap().len()
    }
}

#[async_trait]
impl CourseRepository for InMemoryCourseRepository {
    async fn insert(&self, mut course: Course) -> CourseResult<Course> {
        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        course.id = Some(format!("{:024x}", *next_id));
        self.courses.lock().unwrap().push(course.clone());
        Ok(course)
    }

    async fn find_by_id(&self, id: &str) -> CourseResult<Option<Course>> {
        let courses = self.courses.lock().unwrap();
        Ok(courses
            .iter()
            .find(|c| c.id.as_deref() == Some(id))
            .cloned())
    }

    async fn find_by_owner(&self, user_id: &str) -> CourseResult<Vec<Course>> {
        let mut owned: Vec<Course> = self
            .courses
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(owned)
    }

    async fn push_feedback(&self, id: &str, feedback: Feedback) -> CourseResult<Option<Course>> {
        let mut courses = self.courses.lock().unwrap();
        Ok(courses
            .iter_mut()
            .find(|c| c.id.as_deref() == Some(id))
            .map(|course| {
                course.updated_at = chrono::Utc::now();
                course.feedback.push(feedback);
                course.clone()
            }))
    }

    async fn delete_by_id(&self, id: &str) -> CourseResult<bool> {
        let mut courses = self.courses.lock().unwrap();
        let before = courses.len();
        courses.retain(|c| c.id.as_deref() != Some(id));
        Ok(courses.len() < before)
    }

    async fn ping(&self) -> CourseResult<()> {
        Ok(())
    }
}

/// Language model double that answers with queued replies in order.
#[derive(Default)]
pub struct ScriptedChat {
    replies: Mutex<VecDeque<CourseResult<String>>>,
    received: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedChat {
    pub fn replying(replies: &[&str]) -> Self {
        let chat = Self::default();
        for reply in replies {
            chat.push_reply(Ok(reply.to_string()));
        }
        chat
    }

    pub fn push_reply(&self, reply: CourseResult<String>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    /// Message lists sent so far, one per completion call.
    pub fn received(&self) -> Vec<Vec<ChatMessage>> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatCompletion for ScriptedChat {
    async fn complete(&self, messages: &[ChatMessage]) -> CourseResult<String> {
        self.received.lock().unwrap().push(messages.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(CourseError::LanguageModel("no scripted reply".to_string())))
    }
}

pub struct TestApp {
    pub router: Router,
    pub courses: Arc<InMemoryCourseRepository>,
    pub llm: Arc<ScriptedChat>,
}

pub fn test_config() -> Config {
    Config {
        mongo_uri: "mongodb://localhost:27017".to_string(),
        mongo_database: "inculearn_test".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        llm: LlmConfig {
            api_key: "test-key".to_string(),
            base_url: "http://localhost:9".to_string(),
            model: "test-model".to_string(),
            max_tokens: 512,
            temperature: 0.0,
            timeout_secs: 5,
        },
    }
}

pub fn create_test_app(replies: &[&str]) -> TestApp {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let courses = Arc::new(InMemoryCourseRepository::default());
    let llm = Arc::new(ScriptedChat::replying(replies));

    let app_state = Arc::new(AppState::with_collaborators(
        test_config(),
        courses.clone(),
        llm.clone(),
    ));

    TestApp {
        router: create_router(app_state),
        courses,
        llm,
    }
}

/// Send a request and decode the JSON response body.
pub async fn send(
    app: &TestApp,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, json)
}
