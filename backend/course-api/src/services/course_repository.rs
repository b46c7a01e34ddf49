use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, to_bson, DateTime as BsonDateTime},
    options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument},
    Collection, Database,
};
use serde::{Deserialize, Serialize};

use crate::error::CourseResult;
use crate::metrics::track_db_operation;
use crate::models::course::{Course, Feedback, LearningPath};

pub const COURSES_COLLECTION: &str = "courses";

/// Persistence operations the course service relies on.
#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// Store a new course and return it with its assigned id.
    async fn insert(&self, course: Course) -> CourseResult<Course>;

    async fn find_by_id(&self, id: &str) -> CourseResult<Option<Course>>;

    /// Courses owned by `user_id`, most recently updated first.
    async fn find_by_owner(&self, user_id: &str) -> CourseResult<Vec<Course>>;

    /// Append one feedback entry atomically; `None` if the course is gone.
    async fn push_feedback(&self, id: &str, feedback: Feedback) -> CourseResult<Option<Course>>;

    /// Returns whether a course was removed.
    async fn delete_by_id(&self, id: &str) -> CourseResult<bool>;

    async fn ping(&self) -> CourseResult<()>;
}

/// Stored shape of a course in the `courses` collection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub current_level: String,
    pub target_skill: String,
    pub learning_path: LearningPath,
    #[serde(default)]
    pub feedback: Vec<FeedbackDocument>,
    pub created_at: BsonDateTime,
    pub updated_at: BsonDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackDocument {
    pub module_index: u32,
    pub comment: String,
    pub rating: u8,
    pub created_at: BsonDateTime,
}

fn to_bson_datetime(dt: DateTime<Utc>) -> BsonDateTime {
    BsonDateTime::from_millis(dt.timestamp_millis())
}

fn from_bson_datetime(dt: BsonDateTime) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(dt.timestamp_millis()).unwrap_or_default()
}

impl From<Feedback> for FeedbackDocument {
    fn from(feedback: Feedback) -> Self {
        Self {
            module_index: feedback.module_index,
            comment: feedback.comment,
            rating: feedback.rating,
            created_at: to_bson_datetime(feedback.created_at),
        }
    }
}

impl From<FeedbackDocument> for Feedback {
    fn from(doc: FeedbackDocument) -> Self {
        Self {
            module_index: doc.module_index,
            comment: doc.comment,
            rating: doc.rating,
            created_at: from_bson_datetime(doc.created_at),
        }
    }
}

impl CourseDocument {
    /// The client-supplied id is ignored; MongoDB assigns a fresh one.
    pub fn from_course(course: Course) -> Self {
        Self {
            id: None,
            user_id: course.user_id,
            title: course.title,
            description: course.description,
            current_level: course.current_level,
            target_skill: course.target_skill,
            learning_path: course.learning_path,
            feedback: course.feedback.into_iter().map(Into::into).collect(),
            created_at: to_bson_datetime(course.created_at),
            updated_at: to_bson_datetime(course.updated_at),
        }
    }

    pub fn into_course(self) -> Course {
        Course {
            id: self.id.map(|oid| oid.to_hex()),
            user_id: self.user_id,
            title: self.title,
            description: self.description,
            current_level: self.current_level,
            target_skill: self.target_skill,
            learning_path: self.learning_path,
            created_at: from_bson_datetime(self.created_at),
            updated_at: from_bson_datetime(self.updated_at),
            feedback: self.feedback.into_iter().map(Into::into).collect(),
        }
    }
}

/// Unparseable ids cannot match any stored course.
fn parse_course_id(id: &str) -> Option<ObjectId> {
    ObjectId::parse_str(id).ok()
}

pub struct MongoCourseRepository {
    db: Database,
}

impl MongoCourseRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn collection(&self) -> Collection<CourseDocument> {
        self.db.collection(COURSES_COLLECTION)
    }
}

#[async_trait]
impl CourseRepository for MongoCourseRepository {
    async fn insert(&self, course: Course) -> CourseResult<Course> {
        let mut document = CourseDocument::from_course(course);

        let inserted_id = track_db_operation(
            "insert_one",
            COURSES_COLLECTION,
            self.insert_document(&document),
        )
        .await?;

        document.id = inserted_id;
        tracing::info!(
            course_id = ?document.id,
            user_id = %document.user_id,
            "Course inserted"
        );

        Ok(document.into_course())
    }

    async fn find_by_id(&self, id: &str) -> CourseResult<Option<Course>> {
        let Some(oid) = parse_course_id(id) else {
            return Ok(None);
        };

        let found =
            track_db_operation("find_one", COURSES_COLLECTION, self.find_document(oid)).await?;

        Ok(found.map(CourseDocument::into_course))
    }

    async fn find_by_owner(&self, user_id: &str) -> CourseResult<Vec<Course>> {
        let documents =
            track_db_operation("find", COURSES_COLLECTION, self.find_owned(user_id)).await?;

        Ok(documents
            .into_iter()
            .map(CourseDocument::into_course)
            .collect())
    }

    async fn push_feedback(&self, id: &str, feedback: Feedback) -> CourseResult<Option<Course>> {
        let Some(oid) = parse_course_id(id) else {
            return Ok(None);
        };

        let updated = track_db_operation(
            "find_one_and_update",
            COURSES_COLLECTION,
            self.push_feedback_document(oid, FeedbackDocument::from(feedback)),
        )
        .await?;

        Ok(updated.map(CourseDocument::into_course))
    }

    async fn delete_by_id(&self, id: &str) -> CourseResult<bool> {
        let Some(oid) = parse_course_id(id) else {
            return Ok(false);
        };

        track_db_operation("delete_one", COURSES_COLLECTION, self.delete_document(oid)).await
    }

    async fn ping(&self) -> CourseResult<()> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}

impl MongoCourseRepository {
    async fn insert_document(&self, document: &CourseDocument) -> CourseResult<Option<ObjectId>> {
        let result = self.collection().insert_one(document).await?;
        Ok(result.inserted_id.as_object_id())
    }

    async fn find_document(&self, oid: ObjectId) -> CourseResult<Option<CourseDocument>> {
        Ok(self.collection().find_one(doc! { "_id": oid }).await?)
    }

    async fn find_owned(&self, user_id: &str) -> CourseResult<Vec<CourseDocument>> {
        let options = FindOptions::builder()
            .sort(doc! { "updatedAt": -1 })
            .build();

        let cursor = self
            .collection()
            .find(doc! { "userId": user_id })
            .with_options(options)
            .await?;

        Ok(cursor.try_collect().await?)
    }

    async fn push_feedback_document(
        &self,
        oid: ObjectId,
        entry: FeedbackDocument,
    ) -> CourseResult<Option<CourseDocument>> {
        let entry = to_bson(&entry)?;
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        Ok(self
            .collection()
            .find_one_and_update(
                doc! { "_id": oid },
                doc! {
                    "$push": { "feedback": entry },
                    "$set": { "updatedAt": BsonDateTime::now() },
                },
            )
            .with_options(options)
            .await?)
    }

    async fn delete_document(&self, oid: ObjectId) -> CourseResult<bool> {
        let result = self.collection().delete_one(doc! { "_id": oid }).await?;
        Ok(result.deleted_count > 0)
    }
}
