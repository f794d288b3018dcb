use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type AppId = Uuid;
pub type VersionId = Uuid;

/// Top-level application container. Holds pointers to its versions,
/// never file content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: AppId,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub scope: AppScope,
    pub access: AccessPolicy,
    #[serde(default)]
    pub navigation: Vec<NavItem>,
    /// Version served to end users; none until the first publish
    pub active_version_id: Option<VersionId>,
    /// The one mutable version
    pub draft_version_id: Option<VersionId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AppScope {
    Organization { org_id: String },
    Global,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AccessPolicy {
    /// Anyone who can reach the platform
    Public,
    /// Members of the owning organization
    Organization,
    /// Users holding at least one of the roles
    Roles { roles: Vec<String> },
}

impl Default for AccessPolicy {
    fn default() -> Self {
        AccessPolicy::Organization
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavItem {
    pub label: String,
    /// Root-relative path inside the application
    pub path: String,
    #[serde(default)]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VersionState {
    Draft,
    Published,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppVersion {
    pub id: VersionId,
    pub app_id: AppId,
    /// 0 for the draft; published snapshots count up from 1
    pub number: u32,
    pub state: VersionState,
    pub created_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

impl AppVersion {
    pub fn is_draft(&self) -> bool {
        self.state == VersionState::Draft
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppFile {
    pub version_id: VersionId,
    pub path: String,
    pub source: String,
    /// SHA-256 of `source`, the compile cache key
    pub content_hash: String,
    pub updated_at: DateTime<Utc>,
}

impl AppFile {
    pub fn new(version_id: VersionId, path: impl Into<String>, source: impl Into<String>) -> Self {
        let source = source.into();
        Self {
            version_id,
            path: path.into(),
            content_hash: pagewright_common::content_hash(&source),
            source,
            updated_at: Utc::now(),
        }
    }
}

/// Input for creating an application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewApplication {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_scope")]
    pub scope: AppScope,
    #[serde(default)]
    pub access: AccessPolicy,
}

fn default_scope() -> AppScope {
    AppScope::Global
}

impl NewApplication {
    pub fn new(slug: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            name: name.into(),
            description: None,
            scope: AppScope::Global,
            access: AccessPolicy::default(),
        }
    }
}

/// Metadata edit; `None` fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub access: Option<AccessPolicy>,
    pub navigation: Option<Vec<NavItem>>,
}

/// Slugs are lowercase letters, digits and single dashes
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}
