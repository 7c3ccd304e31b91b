//! Committed ("baseline") file content via `git2`.

use std::path::Path;

use git2::{ObjectType, Repository};
use tracing::{debug, instrument};

use crate::errors::BaselineError;

/// Source of the committed content of a manifest file.
///
/// `relative_path` is interpreted relative to the top level of the
/// repository containing `root`, the same way `git show HEAD:<path>` does.
pub trait BaselineSource {
    fn fetch_baseline_content(
        &self,
        root: &Path,
        relative_path: &Path,
    ) -> Result<Vec<u8>, BaselineError>;
}

/// Reads blobs from the HEAD commit of a local Git repository.
#[derive(Debug, Default, Clone, Copy)]
pub struct GitBaselineSource;

impl GitBaselineSource {
    pub fn new() -> Self {
        Self
    }
}

impl BaselineSource for GitBaselineSource {
    #[instrument(skip(self, root, relative_path), fields(root = %root.display(), path = %relative_path.display()))]
    fn fetch_baseline_content(
        &self,
        root: &Path,
        relative_path: &Path,
    ) -> Result<Vec<u8>, BaselineError> {
        let repo = Repository::discover(root)
            .map_err(|_| BaselineError::RepositoryNotFound(root.display().to_string()))?;

        let head = repo
            .head()
            .and_then(|h| h.peel_to_commit())
            .map_err(|e| BaselineError::NoHead(e.message().to_string()))?;
        debug!(sha = %head.id(), "resolved HEAD");

        let tree = head.tree()?;
        let entry = tree
            .get_path(relative_path)
            .map_err(|_| BaselineError::PathNotFound(relative_path.display().to_string()))?;
        if entry.kind() != Some(ObjectType::Blob) {
            return Err(BaselineError::NotAFile(relative_path.display().to_string()));
        }

        let blob = repo.find_blob(entry.id())?;
        debug!(bytes = blob.content().len(), "read baseline blob");
        Ok(blob.content().to_vec())
    }
}
