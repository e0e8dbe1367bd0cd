use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use super::catalog::{next_quiz_id, validate_quiz, CatalogError, QuizCatalog};
use crate::metrics::track_catalog_operation;
use crate::models::{Quiz, QuizDraft};

/// On-disk layout: `{ "results": [ ...quizzes ] }`. Unknown top-level keys
/// are carried through rewrites untouched.
#[derive(Debug, Default, Serialize, Deserialize)]
struct CatalogDocument {
    #[serde(default)]
    results: Vec<Quiz>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Quiz catalog kept in a single JSON file.
///
/// Every read goes back to disk so hand edits to the file show up without a
/// restart. Writes are serialized through `write_lock` and land via a
/// temp-file rename.
pub struct JsonFileCatalog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> Result<CatalogDocument, CatalogError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                tracing::error!("Failed to parse {}: {}", self.path.display(), e);
                CatalogError::Unavailable(format!("malformed catalog file: {}", e))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    "Catalog file {} does not exist, serving an empty catalog",
                    self.path.display()
                );
                Ok(CatalogDocument::default())
            }
            Err(e) => {
                tracing::error!("Failed to read {}: {}", self.path.display(), e);
                Err(CatalogError::Unavailable(format!(
                    "failed to read catalog file: {}",
                    e
                )))
            }
        }
    }

    async fn write_document(&self, document: &CatalogDocument) -> Result<(), CatalogError> {
        let bytes = serde_json::to_vec_pretty(document)
            .map_err(|e| CatalogError::Unavailable(format!("failed to encode catalog: {}", e)))?;

        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, bytes).await.map_err(|e| {
            tracing::error!("Failed to write {}: {}", tmp_path.display(), e);
            CatalogError::Unavailable(format!("failed to write catalog file: {}", e))
        })?;
        tokio::fs::rename(&tmp_path, &self.path).await.map_err(|e| {
            tracing::error!("Failed to replace {}: {}", self.path.display(), e);
            CatalogError::Unavailable(format!("failed to replace catalog file: {}", e))
        })
    }
}

#[async_trait]
impl QuizCatalog for JsonFileCatalog {
    async fn list_quizzes(&self) -> Result<Vec<Quiz>, CatalogError> {
        track_catalog_operation("list", async {
            Ok::<_, CatalogError>(self.read_document().await?.results)
        })
        .await
    }

    async fn fetch_quiz(&self, id: i64) -> Result<Quiz, CatalogError> {
        track_catalog_operation("fetch", async {
            self.read_document()
                .await?
                .results
                .into_iter()
                .find(|quiz| quiz.id == id)
                .ok_or(CatalogError::NotFound(id))
        })
        .await
    }

    async fn create_quiz(&self, draft: QuizDraft) -> Result<Quiz, CatalogError> {
        track_catalog_operation("create", async {
            let _guard = self.write_lock.lock().await;
            let mut document = self.read_document().await?;

            let id = match draft.id {
                Some(id) if document.results.iter().any(|quiz| quiz.id == id) => {
                    return Err(CatalogError::Conflict(id));
                }
                Some(id) => id,
                None => next_quiz_id(&document.results),
            };

            let quiz = draft.into_quiz(id);
            validate_quiz(&quiz)?;

            document.results.push(quiz.clone());
            self.write_document(&document).await?;

            tracing::info!("Quiz created: id={}, title={}", quiz.id, quiz.title);
            Ok::<_, CatalogError>(quiz)
        })
        .await
    }

    async fn update_quiz(&self, id: i64, draft: QuizDraft) -> Result<Quiz, CatalogError> {
        track_catalog_operation("update", async {
            let _guard = self.write_lock.lock().await;
            let mut document = self.read_document().await?;

            let slot = document
                .results
                .iter_mut()
                .find(|quiz| quiz.id == id)
                .ok_or(CatalogError::NotFound(id))?;

            if draft.id.is_some_and(|body_id| body_id != id) {
                tracing::warn!(
                    "Update body id {:?} differs from path id {}, keeping path id",
                    draft.id,
                    id
                );
            }

            let quiz = draft.into_quiz(id);
            validate_quiz(&quiz)?;
            *slot = quiz.clone();

            self.write_document(&document).await?;

            tracing::info!("Quiz updated: id={}, title={}", quiz.id, quiz.title);
            Ok::<_, CatalogError>(quiz)
        })
        .await
    }
}
