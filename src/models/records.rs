//! Searchable record types.
//!
//! Records serialize with camelCase field names; those names are the
//! field paths used in queries (e.g. `user.role.name`). Each record
//! type also declares a static field table describing the subset of
//! its fields that search can address.

use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;

use crate::search::descriptor::SearchEnum;
use crate::search::schema::{FieldDef, FieldType};
use crate::search::value::timestamp_serde;

/// Storage table a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordTable {
    Account,
    User,
    Application,
}

impl RecordTable {
    pub const ALL: [RecordTable; 3] = [RecordTable::Account, RecordTable::User, RecordTable::Application];

    pub fn as_str(self) -> &'static str {
        match self {
            RecordTable::Account => "account",
            RecordTable::User => "user",
            RecordTable::Application => "application",
        }
    }
}

/// Application sub-kind sharing the application table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationVariant {
    Draft,
    Submitted,
    Referred,
}

impl ApplicationVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationVariant::Draft => "draft",
            ApplicationVariant::Submitted => "submitted",
            ApplicationVariant::Referred => "referred",
        }
    }
}

/// Login account attached to a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub confirmed: bool,
}

impl Account {
    pub const FIELDS: &'static [FieldDef] = &[
        FieldDef::new("username", FieldType::Text),
        FieldDef::new("email", FieldType::Text),
        FieldDef::new("confirmed", FieldType::Boolean),
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Only one user may hold this role at a time.
    #[serde(default)]
    pub single_user: bool,
}

impl Role {
    pub const FIELDS: &'static [FieldDef] = &[
        FieldDef::new("id", FieldType::Integer),
        FieldDef::new("name", FieldType::Text),
        FieldDef::new("description", FieldType::Text),
        FieldDef::new("singleUser", FieldType::Boolean),
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    pub name: String,
    #[serde(default)]
    pub department: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<Account>,
    pub role: Role,
}

impl User {
    pub const FIELDS: &'static [FieldDef] = &[
        FieldDef::new("username", FieldType::Text),
        FieldDef::new("name", FieldType::Text),
        FieldDef::new("department", FieldType::Text),
        FieldDef::new("account", FieldType::Object(Account::FIELDS)),
        FieldDef::new("role", FieldType::Object(Role::FIELDS)),
    ];
}

/// Lifecycle state of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Draft,
    Submitted,
    Resubmitted,
    Review,
    Reviewed,
    Referred,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub const NAMES: &'static [&'static str] = &[
        "DRAFT",
        "SUBMITTED",
        "RESUBMITTED",
        "REVIEW",
        "REVIEWED",
        "REFERRED",
        "APPROVED",
        "REJECTED",
    ];

    const ALL: &'static [ApplicationStatus] = &[
        ApplicationStatus::Draft,
        ApplicationStatus::Submitted,
        ApplicationStatus::Resubmitted,
        ApplicationStatus::Review,
        ApplicationStatus::Reviewed,
        ApplicationStatus::Referred,
        ApplicationStatus::Approved,
        ApplicationStatus::Rejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Draft => "DRAFT",
            ApplicationStatus::Submitted => "SUBMITTED",
            ApplicationStatus::Resubmitted => "RESUBMITTED",
            ApplicationStatus::Review => "REVIEW",
            ApplicationStatus::Reviewed => "REVIEWED",
            ApplicationStatus::Referred => "REFERRED",
            ApplicationStatus::Approved => "APPROVED",
            ApplicationStatus::Rejected => "REJECTED",
        }
    }
}

impl SearchEnum for ApplicationStatus {
    const TYPE_NAME: &'static str = "ApplicationStatus";

    fn variants() -> &'static [Self] {
        Self::ALL
    }

    fn name(self) -> &'static str {
        self.as_str()
    }
}

/// Committee member assigned to review a submitted application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedCommitteeMember {
    pub id: i64,
    pub application_id: String,
    pub user: User,
    #[serde(default)]
    pub finish_review: bool,
}

impl AssignedCommitteeMember {
    pub const FIELDS: &'static [FieldDef] = &[
        FieldDef::new("id", FieldType::Integer),
        FieldDef::new("applicationId", FieldType::Text),
        FieldDef::new("user", FieldType::Object(User::FIELDS)),
        FieldDef::new("finishReview", FieldType::Boolean),
    ];
}

/// Fields shared by every application variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationCommon {
    /// Storage primary key (public search key `dbId`).
    pub id: i64,
    /// Human-facing identifier (public search key `id`).
    pub application_id: String,
    pub user: User,
    pub status: ApplicationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<i64>,
    #[serde(with = "timestamp_serde")]
    pub last_updated: PrimitiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftApplication {
    #[serde(flatten)]
    pub common: ApplicationCommon,
}

impl DraftApplication {
    pub const FIELDS: &'static [FieldDef] = &[
        FieldDef::new("id", FieldType::Integer),
        FieldDef::new("applicationId", FieldType::Text),
        FieldDef::new("user", FieldType::Object(User::FIELDS)),
        FieldDef::new("status", FieldType::Enum(ApplicationStatus::NAMES)),
        FieldDef::new("templateId", FieldType::Integer),
        FieldDef::new("lastUpdated", FieldType::Timestamp),
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedApplication {
    #[serde(flatten)]
    pub common: ApplicationCommon,
    #[serde(default)]
    pub assigned_committee_members: Vec<AssignedCommitteeMember>,
    /// Usernames of members who reviewed an earlier submission.
    #[serde(default)]
    pub previous_committee_members: Vec<String>,
    #[serde(
        default,
        with = "timestamp_serde::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub submitted_time: Option<PrimitiveDateTime>,
    #[serde(
        default,
        with = "timestamp_serde::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub approval_time: Option<PrimitiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_comment: Option<String>,
}

impl SubmittedApplication {
    pub const FIELDS: &'static [FieldDef] = &[
        FieldDef::new("id", FieldType::Integer),
        FieldDef::new("applicationId", FieldType::Text),
        FieldDef::new("user", FieldType::Object(User::FIELDS)),
        FieldDef::new("status", FieldType::Enum(ApplicationStatus::NAMES)),
        FieldDef::new("templateId", FieldType::Integer),
        FieldDef::new("lastUpdated", FieldType::Timestamp),
        FieldDef::new(
            "assignedCommitteeMembers",
            FieldType::List(&FieldType::Object(AssignedCommitteeMember::FIELDS)),
        ),
        FieldDef::new("previousCommitteeMembers", FieldType::List(&FieldType::Text)),
        FieldDef::new("submittedTime", FieldType::Timestamp),
        FieldDef::new("approvalTime", FieldType::Timestamp),
        FieldDef::new("finalComment", FieldType::Text),
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferredApplication {
    #[serde(flatten)]
    pub submitted: SubmittedApplication,
    /// Form fields the applicant may change after referral.
    #[serde(default)]
    pub editable_fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referred_by: Option<User>,
}

impl ReferredApplication {
    pub const FIELDS: &'static [FieldDef] = &[
        FieldDef::new("id", FieldType::Integer),
        FieldDef::new("applicationId", FieldType::Text),
        FieldDef::new("user", FieldType::Object(User::FIELDS)),
        FieldDef::new("status", FieldType::Enum(ApplicationStatus::NAMES)),
        FieldDef::new("templateId", FieldType::Integer),
        FieldDef::new("lastUpdated", FieldType::Timestamp),
        FieldDef::new(
            "assignedCommitteeMembers",
            FieldType::List(&FieldType::Object(AssignedCommitteeMember::FIELDS)),
        ),
        FieldDef::new("previousCommitteeMembers", FieldType::List(&FieldType::Text)),
        FieldDef::new("submittedTime", FieldType::Timestamp),
        FieldDef::new("approvalTime", FieldType::Timestamp),
        FieldDef::new("finalComment", FieldType::Text),
        FieldDef::new("editableFields", FieldType::List(&FieldType::Text)),
        FieldDef::new("referredBy", FieldType::Object(User::FIELDS)),
    ];
}

/// An application in one of its variant shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "lowercase")]
pub enum Application {
    Draft(DraftApplication),
    Submitted(SubmittedApplication),
    Referred(ReferredApplication),
}

impl Application {
    pub fn variant(&self) -> ApplicationVariant {
        match self {
            Application::Draft(_) => ApplicationVariant::Draft,
            Application::Submitted(_) => ApplicationVariant::Submitted,
            Application::Referred(_) => ApplicationVariant::Referred,
        }
    }

    pub fn common(&self) -> &ApplicationCommon {
        match self {
            Application::Draft(app) => &app.common,
            Application::Submitted(app) => &app.common,
            Application::Referred(app) => &app.submitted.common,
        }
    }
}

/// One stored record, tagged by table.
///
/// This is the line format accepted by `appsearch load`:
///
/// ```json
/// {"entity":"account","username":"jdoe","email":"jdoe@example.com","confirmed":true}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entity", rename_all = "lowercase")]
pub enum Record {
    Account(Account),
    User(User),
    Application(Application),
}

impl Record {
    pub fn table(&self) -> RecordTable {
        match self {
            Record::Account(_) => RecordTable::Account,
            Record::User(_) => RecordTable::User,
            Record::Application(_) => RecordTable::Application,
        }
    }

    pub fn variant(&self) -> Option<ApplicationVariant> {
        match self {
            Record::Application(app) => Some(app.variant()),
            _ => None,
        }
    }

    /// Short identifier used by text output.
    pub fn identifier(&self) -> &str {
        match self {
            Record::Account(account) => &account.username,
            Record::User(user) => &user.username,
            Record::Application(app) => &app.common().application_id,
        }
    }

    /// One-line human description used by text and table output.
    pub fn summary(&self) -> String {
        match self {
            Record::Account(account) => {
                let confirmed = if account.confirmed { "confirmed" } else { "unconfirmed" };
                format!("{} ({confirmed})", account.email)
            }
            Record::User(user) => format!("{} [{}]", user.name, user.role.name),
            Record::Application(app) => {
                let common = app.common();
                format!(
                    "{} {} by {}",
                    app.variant().as_str(),
                    common.status.as_str(),
                    common.user.username
                )
            }
        }
    }
}
