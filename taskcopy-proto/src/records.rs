//! Records returned by the Conduit search and edit endpoints.
//!
//! The API nests most values under `fields` and `attachments`; the public
//! types here are the flattened shapes the rest of the tool works with.
//! Deserialization goes through private record structs via `serde(from)`.

use std::fmt;

use serde::Deserialize;

/// Opaque, stable identifier of a remote object (a "PHID").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct Phid(String);

impl Phid {
    /// Wraps an identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Phid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One page of a `*.search` result. The cursor is ignored.
#[derive(Debug, Deserialize)]
pub struct SearchPage<T> {
    /// Records on this page, in API order.
    pub data: Vec<T>,
}

/// A project as returned by `project.search`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "ProjectRecord")]
pub struct Project {
    /// Project PHID.
    pub phid: Phid,
    /// Project name.
    pub name: String,
    /// Name of the parent project, for subprojects and milestones.
    pub parent_name: Option<String>,
}

impl Project {
    /// Label shown to the user: `"Child (Parent)"` or just the name.
    #[must_use]
    pub fn display_name(&self) -> String {
        match &self.parent_name {
            Some(parent) => format!("{} ({parent})", self.name),
            None => self.name.clone(),
        }
    }
}

#[derive(Deserialize)]
struct ProjectRecord {
    phid: Phid,
    fields: ProjectFields,
}

#[derive(Deserialize)]
struct ProjectFields {
    name: String,
    #[serde(default)]
    parent: Option<NamedRef>,
}

#[derive(Deserialize)]
struct NamedRef {
    name: String,
}

impl From<ProjectRecord> for Project {
    fn from(record: ProjectRecord) -> Self {
        Self {
            phid: record.phid,
            name: record.fields.name,
            parent_name: record.fields.parent.map(|parent| parent.name),
        }
    }
}

/// A priority level from `maniphest.priority.search`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TaskPriority {
    /// Display name, e.g. "Needs Triage".
    #[serde(default)]
    pub name: String,
    /// Numeric value stored on tasks.
    pub value: i64,
    /// Accepted keywords; the first one is canonical.
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl TaskPriority {
    /// The keyword the edit endpoint accepts for this priority.
    #[must_use]
    pub fn canonical_keyword(&self) -> Option<&str> {
        self.keywords.first().map(String::as_str)
    }
}

/// A task from `maniphest.search`, with its project attachment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "TaskRecord")]
pub struct Task {
    /// Numeric id, shown as `T{id}`.
    pub id: u64,
    /// Task PHID.
    pub phid: Phid,
    /// Title.
    pub name: String,
    /// Raw (unrendered) description.
    pub description: String,
    /// Owner PHID, if assigned.
    pub owner: Option<Phid>,
    /// Numeric priority value.
    pub priority_value: i64,
    /// Story points as text; empty when unset.
    pub points: String,
    /// Space PHID, if the install uses spaces.
    pub space: Option<Phid>,
    /// Status keyword, e.g. `resolved`.
    pub status: String,
    /// PHIDs of the projects the task is tagged with.
    pub projects: Vec<Phid>,
}

#[derive(Deserialize)]
struct TaskRecord {
    id: u64,
    phid: Phid,
    fields: TaskFields,
    #[serde(default)]
    attachments: TaskAttachments,
}

#[derive(Deserialize)]
struct TaskFields {
    name: String,
    #[serde(default)]
    description: Option<RawText>,
    #[serde(rename = "ownerPHID", default)]
    owner_phid: Option<Phid>,
    priority: ValueField<i64>,
    #[serde(default)]
    points: Option<Points>,
    #[serde(rename = "spacePHID", default)]
    space_phid: Option<Phid>,
    status: ValueField<String>,
}

#[derive(Deserialize)]
struct RawText {
    raw: String,
}

#[derive(Deserialize)]
struct ValueField<T> {
    value: T,
}

/// Points come back as a string, a number, or null depending on the install.
#[derive(Deserialize)]
#[serde(untagged)]
enum Points {
    Text(String),
    Number(f64),
}

impl Points {
    fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Number(number) => number.to_string(),
        }
    }
}

#[derive(Default, Deserialize)]
struct TaskAttachments {
    #[serde(default)]
    projects: Option<ProjectsAttachment>,
}

#[derive(Deserialize)]
struct ProjectsAttachment {
    #[serde(rename = "projectPHIDs", default)]
    project_phids: Vec<Phid>,
}

impl From<TaskRecord> for Task {
    fn from(record: TaskRecord) -> Self {
        let TaskRecord {
            id,
            phid,
            fields,
            attachments,
        } = record;
        Self {
            id,
            phid,
            name: fields.name,
            description: fields.description.map(|d| d.raw).unwrap_or_default(),
            owner: fields.owner_phid,
            priority_value: fields.priority.value,
            points: fields.points.map(Points::into_text).unwrap_or_default(),
            space: fields.space_phid,
            status: fields.status.value,
            projects: attachments
                .projects
                .map(|p| p.project_phids)
                .unwrap_or_default(),
        }
    }
}

/// Result of `maniphest.edit`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EditResult {
    /// The created or edited object.
    pub object: EditedObject,
}

/// Identity of the object touched by an edit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EditedObject {
    /// Numeric id.
    pub id: u64,
    /// PHID, when the server includes it.
    #[serde(default)]
    pub phid: Option<Phid>,
}
