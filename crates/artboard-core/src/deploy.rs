//! Publishing a document bundle to a deployment target.
//!
//! The pipeline runs validate, bundle, upload and verify in order and
//! stops at the first failing stage.

use crate::storage::{BoxFuture, SavedDocument};
use crate::store::EditorState;
use crate::style_guide::StyleGuide;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Could not build bundle: {0}")]
    Bundle(String),
    #[error("Upload to {target} failed: {message}")]
    Upload { target: String, message: String },
    #[error("Verification failed: {0}")]
    Verify(String),
}

pub type DeployResult<T> = Result<T, DeployError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployStage {
    Validate,
    Bundle,
    Upload,
    Verify,
}

impl fmt::Display for DeployStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeployStage::Validate => "validate",
            DeployStage::Bundle => "bundle",
            DeployStage::Upload => "upload",
            DeployStage::Verify => "verify",
        };
        f.write_str(name)
    }
}

/// Progress notifications.
#[derive(Debug, Clone, PartialEq)]
pub enum DeployEvent {
    Started(DeployStage),
    Completed(DeployStage),
    Failed { stage: DeployStage, message: String },
    Deployed { location: String },
}

/// One file of a bundle, at a relative path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleFile {
    pub path: String,
    pub contents: Vec<u8>,
}

impl BundleFile {
    /// File at `path` relative to the bundle root.
    pub fn new(path: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ManifestEntry<'a> {
    path: &'a str,
    bytes: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct Manifest<'a> {
    name: &'a str,
    files: Vec<ManifestEntry<'a>>,
}

/// Files to publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployBundle {
    pub name: String,
    pub files: Vec<BundleFile>,
}

impl DeployBundle {
    /// `document.json`, `style-guide.json`, the caller's rendered files
    /// and a `manifest.json` listing them all.
    pub fn build(state: &EditorState, name: &str, rendered: Vec<BundleFile>) -> DeployResult<Self> {
        let document = SavedDocument::from_state(name, name, state)
            .to_json()
            .map_err(|e| DeployError::Bundle(e.to_string()))?;
        let style_guide = StyleGuide::generate(state, name)
            .to_json()
            .map_err(|e| DeployError::Bundle(e.to_string()))?;

        let mut files = vec![
            BundleFile::new("document.json", document),
            BundleFile::new("style-guide.json", style_guide),
        ];
        for file in rendered {
            if files.iter().any(|f| f.path == file.path) || file.path == "manifest.json" {
                return Err(DeployError::Bundle(format!("duplicate file {}", file.path)));
            }
            files.push(file);
        }

        let manifest = Manifest {
            name,
            files: files
                .iter()
                .map(|f| ManifestEntry {
                    path: &f.path,
                    bytes: f.contents.len(),
                })
                .collect(),
        };
        let manifest =
            serde_json::to_string_pretty(&manifest).map_err(|e| DeployError::Bundle(e.to_string()))?;
        files.push(BundleFile::new("manifest.json", manifest));

        Ok(Self {
            name: name.to_string(),
            files,
        })
    }

    /// Look up a file by bundle path.
    pub fn file(&self, path: &str) -> Option<&BundleFile> {
        self.files.iter().find(|f| f.path == path)
    }

    /// Sum of all file sizes.
    pub fn total_bytes(&self) -> usize {
        self.files.iter().map(|f| f.contents.len()).sum()
    }
}

/// Where bundles are published.
pub trait DeployTarget: Send + Sync {
    fn name(&self) -> &str;

    /// Publish the bundle; returns its location.
    fn upload(&self, bundle: &DeployBundle) -> BoxFuture<'_, DeployResult<String>>;

    /// Check the published bundle at `location` matches.
    fn verify(&self, bundle: &DeployBundle, location: &str) -> BoxFuture<'_, DeployResult<()>>;
}

/// Writes bundles to `<root>/<bundle name>/`.
pub struct DirectoryTarget {
    root: PathBuf,
}

impl DirectoryTarget {
    /// Target that writes bundles under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn upload_error(&self, message: String) -> DeployError {
        DeployError::Upload {
            target: self.root.display().to_string(),
            message,
        }
    }
}

impl DeployTarget for DirectoryTarget {
    fn name(&self) -> &str {
        "directory"
    }

    fn upload(&self, bundle: &DeployBundle) -> BoxFuture<'_, DeployResult<String>> {
        let dir = self.root.join(&bundle.name);
        let files = bundle.files.clone();
        Box::pin(async move {
            for file in &files {
                let path = dir.join(&file.path);
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)
                        .map_err(|e| self.upload_error(format!("{}: {}", parent.display(), e)))?;
                }
                fs::write(&path, &file.contents)
                    .map_err(|e| self.upload_error(format!("{}: {}", path.display(), e)))?;
            }
            Ok(dir.display().to_string())
        })
    }

    fn verify(&self, bundle: &DeployBundle, location: &str) -> BoxFuture<'_, DeployResult<()>> {
        let dir = PathBuf::from(location);
        let files = bundle.files.clone();
        Box::pin(async move {
            for file in &files {
                let path = dir.join(&file.path);
                let written = fs::read(&path)
                    .map_err(|e| DeployError::Verify(format!("{}: {}", path.display(), e)))?;
                if written != file.contents {
                    return Err(DeployError::Verify(format!("{} differs", path.display())));
                }
            }
            Ok(())
        })
    }
}

/// Outcome of a successful deployment.
#[derive(Debug, Clone, PartialEq)]
pub struct DeployReport {
    pub location: String,
    pub files: usize,
    pub bytes: usize,
}

/// Runs the stages against one target, recording progress events.
pub struct DeployPipeline<'a, T: DeployTarget + ?Sized> {
    target: &'a T,
    events: Vec<DeployEvent>,
}

impl<'a, T: DeployTarget + ?Sized> DeployPipeline<'a, T> {
    /// Pipeline publishing to `target`.
    pub fn new(target: &'a T) -> Self {
        Self {
            target,
            events: Vec::new(),
        }
    }

    /// Stage events of the last run.
    pub fn events(&self) -> &[DeployEvent] {
        &self.events
    }

    /// Validate, bundle and publish `state` as `name`. Stops at the first
    /// failing stage; [`DeployPipeline::events`] tells which one.
    pub async fn run(
        &mut self,
        state: &EditorState,
        name: &str,
        rendered: Vec<BundleFile>,
    ) -> DeployResult<DeployReport> {
        self.events.clear();

        self.start(DeployStage::Validate);
        let checked = validate(state, name);
        self.finish(DeployStage::Validate, checked)?;

        self.start(DeployStage::Bundle);
        let bundle = DeployBundle::build(state, name, rendered);
        let bundle = self.finish(DeployStage::Bundle, bundle)?;

        self.start(DeployStage::Upload);
        let location = self.target.upload(&bundle).await;
        let location = self.finish(DeployStage::Upload, location)?;

        self.start(DeployStage::Verify);
        let verified = self.target.verify(&bundle, &location).await;
        self.finish(DeployStage::Verify, verified)?;

        log::info!("Deployed {} to {} ({})", name, location, self.target.name());
        self.events.push(DeployEvent::Deployed {
            location: location.clone(),
        });
        Ok(DeployReport {
            location,
            files: bundle.files.len(),
            bytes: bundle.total_bytes(),
        })
    }

    fn start(&mut self, stage: DeployStage) {
        log::debug!("Deploy stage {} started", stage);
        self.events.push(DeployEvent::Started(stage));
    }

    fn finish<V>(&mut self, stage: DeployStage, result: DeployResult<V>) -> DeployResult<V> {
        match &result {
            Ok(_) => self.events.push(DeployEvent::Completed(stage)),
            Err(e) => {
                log::warn!("Deploy stage {} failed: {}", stage, e);
                self.events.push(DeployEvent::Failed {
                    stage,
                    message: e.to_string(),
                });
            }
        }
        result
    }
}

/// Bundle names become directory names and URL segments.
fn validate(state: &EditorState, name: &str) -> DeployResult<()> {
    if name.is_empty()
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(DeployError::Validation(format!(
            "name {:?} must be non-empty and use only letters, digits, '-' or '_'",
            name
        )));
    }
    if state.is_empty() {
        return Err(DeployError::Validation("document has no shapes".to_string()));
    }
    if !state.is_consistent() {
        return Err(DeployError::Validation(
            "selection does not match shapes".to_string(),
        ));
    }
    for shape in state.iter() {
        let geometry = [shape.x, shape.y, shape.width, shape.height, shape.rotation];
        if geometry.iter().any(|v| !v.is_finite()) {
            return Err(DeployError::Validation(format!(
                "shape {} has non-finite geometry",
                shape.id
            )));
        }
        if let Some(image) = &shape.image {
            image
                .bytes()
                .map_err(|e| DeployError::Validation(format!("shape {}: {}", shape.id, e)))?;
        }
    }
    Ok(())
}
