//! The fixed enumeration of resource kinds and their static metadata.

use crate::action::Operation;
use crate::name::{NamePattern, Segment};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

const ORGANIZATION_SEGMENTS: &[Segment] = &[
    Segment::Literal(Cow::Borrowed("organization")),
    Segment::Param(Cow::Borrowed("slug")),
];

const PROJECT_SEGMENTS: &[Segment] = &[
    Segment::Literal(Cow::Borrowed("project")),
    Segment::Param(Cow::Borrowed("slug")),
];

const SITE_SEGMENTS: &[Segment] = &[
    Segment::Literal(Cow::Borrowed("project")),
    Segment::Param(Cow::Borrowed("project")),
    Segment::Literal(Cow::Borrowed("site")),
    Segment::Param(Cow::Borrowed("slug")),
];

static ORGANIZATION_PATTERN: NamePattern = NamePattern::from_static(ORGANIZATION_SEGMENTS);
static PROJECT_PATTERN: NamePattern = NamePattern::from_static(PROJECT_SEGMENTS);
static SITE_PATTERN: NamePattern = NamePattern::from_static(SITE_SEGMENTS);

/// A category of domain entity sharing the generic CRUD lifecycle.
///
/// Kinds form a hierarchy through [`ResourceKind::parent`]:
/// site → project → organization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// Top-level tenant
    Organization,
    /// A project owned by an organization
    Project,
    /// A site inside a project
    Site,
}

impl ResourceKind {
    /// Every kind, parents before children.
    pub const ALL: [Self; 3] = [Self::Organization, Self::Project, Self::Site];

    /// Lowercase identifier used in action types and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Organization => "organization",
            Self::Project => "project",
            Self::Site => "site",
        }
    }

    /// Human readable name used in notifications.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Organization => "Organization",
            Self::Project => "Project",
            Self::Site => "Site",
        }
    }

    /// The declared name pattern of this kind.
    #[must_use]
    pub fn name_pattern(self) -> &'static NamePattern {
        match self {
            Self::Organization => &ORGANIZATION_PATTERN,
            Self::Project => &PROJECT_PATTERN,
            Self::Site => &SITE_PATTERN,
        }
    }

    /// The kind that owns instances of this kind.
    #[must_use]
    pub const fn parent(self) -> Option<Self> {
        match self {
            Self::Organization => None,
            Self::Project => Some(Self::Organization),
            Self::Site => Some(Self::Project),
        }
    }

    /// Whether `ancestor` appears anywhere above this kind.
    #[must_use]
    pub fn is_descendant_of(self, ancestor: Self) -> bool {
        let mut current = self.parent();
        while let Some(kind) = current {
            if kind == ancestor {
                return true;
            }
            current = kind.parent();
        }
        false
    }

    /// Every kind below this one in the hierarchy.
    #[must_use]
    pub fn descendants(self) -> Vec<Self> {
        Self::ALL
            .into_iter()
            .filter(|kind| kind.is_descendant_of(self))
            .collect()
    }

    /// Fully qualified RPC service of this kind.
    #[must_use]
    pub const fn service(self) -> &'static str {
        match self {
            Self::Organization => "dashboard.organizations.v1.OrganizationsService",
            Self::Project => "dashboard.projects.v1.ProjectsService",
            Self::Site => "dashboard.sites.v1.SitesService",
        }
    }

    /// Field carrying a single instance in requests and responses.
    #[must_use]
    pub const fn singular_field(self) -> &'static str {
        self.as_str()
    }

    /// Field carrying the instances of a LIST response.
    #[must_use]
    pub const fn collection_field(self) -> &'static str {
        match self {
            Self::Organization => "organizations",
            Self::Project => "projects",
            Self::Site => "sites",
        }
    }

    /// RPC method implementing `operation`, e.g. `ListProjects` or `DeleteSite`.
    #[must_use]
    pub fn method(self, operation: Operation) -> String {
        let verb = match operation {
            Operation::List => "List",
            Operation::Get => "Get",
            Operation::Create => "Create",
            Operation::Update => "Update",
            Operation::Destroy => "Delete",
        };
        let noun = match operation {
            Operation::List => match self {
                Self::Organization => "Organizations",
                Self::Project => "Projects",
                Self::Site => "Sites",
            },
            _ => self.display_name(),
        };
        format!("{verb}{noun}")
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
