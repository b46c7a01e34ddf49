use crate::config::Config;
use mongodb::Client as MongoClient;
use std::sync::Arc;

use course_repository::{CourseRepository, MongoCourseRepository};
use llm_client::{ChatCompletion, OpenAiChatClient};

pub mod course_repository;
pub mod course_service;
pub mod llm_client;

/// Process-wide handles, built once at startup and shared with every request.
pub struct AppState {
    pub config: Config,
    pub courses: Arc<dyn CourseRepository>,
    pub llm: Arc<dyn ChatCompletion>,
}

impl AppState {
    pub async fn new(config: Config, mongo_client: MongoClient) -> anyhow::Result<Self> {
        let mongo = mongo_client.database(&config.mongo_database);
        let courses = MongoCourseRepository::new(mongo);

        tracing::info!("Checking MongoDB connection...");

        tokio::time::timeout(std::time::Duration::from_secs(10), courses.ping())
            .await
            .map_err(|_| anyhow::anyhow!("MongoDB ping timeout after 10s"))??;

        tracing::info!("MongoDB connection established successfully");

        let llm = OpenAiChatClient::new(&config.llm)?;

        Ok(Self::with_collaborators(
            config,
            Arc::new(courses),
            Arc::new(llm),
        ))
    }

    /// Assemble state from already-built collaborators.
    pub fn with_collaborators(
        config: Config,
        courses: Arc<dyn CourseRepository>,
        llm: Arc<dyn ChatCompletion>,
    ) -> Self {
        Self {
            config,
            courses,
            llm,
        }
    }
}
