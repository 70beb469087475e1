//! Catalogue of searchable entity kinds.
//!
//! Every public search surface is one [`EntityKind`] variant. The
//! mapping from kind to descriptor is an exhaustive `match`, so adding
//! a kind without a descriptor fails to compile.

use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::models::records::{ApplicationStatus, ApplicationVariant, RecordTable};
use crate::search::criterion::Criterion;
use crate::search::descriptor::{Descriptor, DescriptorFactory, EnumConverter};
use crate::search::error::SearchError;
use crate::search::operators::SearchOperator;
use crate::search::parser::{APPLICATION_GRAMMAR, USER_GRAMMAR};
use crate::search::predicate::{Compiled, Predicate};
use crate::search::schema::{Field, Root};

const USER_OPERATORS: &[&str] = &[":", ":~", "="];
const APPLICATION_OPERATORS: &[&str] = &[":", ":~", "=", ":=", "<", ">"];

/// Public key for filtering on assigned committee members.
pub const ASSIGNED_KEY: &str = "assigned";
const ASSIGNED_FIELD: &str = "assignedCommitteeMembers";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    Accounts,
    Users,
    /// Every application variant, common fields only.
    Applications,
    DraftApplications,
    SubmittedApplications,
    ReferredApplications,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::Accounts,
        EntityKind::Users,
        EntityKind::Applications,
        EntityKind::DraftApplications,
        EntityKind::SubmittedApplications,
        EntityKind::ReferredApplications,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EntityKind::Accounts => "accounts",
            EntityKind::Users => "users",
            EntityKind::Applications => "applications",
            EntityKind::DraftApplications => "draft-applications",
            EntityKind::SubmittedApplications => "submitted-applications",
            EntityKind::ReferredApplications => "referred-applications",
        }
    }

    pub fn descriptor(self) -> Descriptor {
        match self {
            EntityKind::Accounts => Descriptor::new(
                self.name(),
                Root::table(RecordTable::Account),
                &USER_GRAMMAR,
                USER_OPERATORS,
            ),
            EntityKind::Users => Descriptor::new(
                self.name(),
                Root::table(RecordTable::User),
                &USER_GRAMMAR,
                USER_OPERATORS,
            ),
            EntityKind::Applications => application_descriptor(self.name()),
            EntityKind::DraftApplications => {
                application_descriptor(self.name()).narrow_with(narrow_draft)
            }
            EntityKind::SubmittedApplications => {
                with_assigned(application_descriptor(self.name()).narrow_with(narrow_submitted))
            }
            EntityKind::ReferredApplications => {
                with_assigned(application_descriptor(self.name()).narrow_with(narrow_referred))
            }
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EntityKind {
    type Err = SearchError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| SearchError::UnknownEntity {
                name: name.to_string(),
            })
    }
}

impl DescriptorFactory for EntityKind {
    fn create(&self) -> Result<Descriptor> {
        Ok(self.descriptor())
    }
}

fn application_descriptor(name: &'static str) -> Descriptor {
    Descriptor::new(
        name,
        Root::table(RecordTable::Application),
        &APPLICATION_GRAMMAR,
        APPLICATION_OPERATORS,
    )
    .rename("id", "applicationId")
    .rename("dbId", "id")
    .convert("status", EnumConverter::<ApplicationStatus>::new())
}

fn with_assigned(descriptor: Descriptor) -> Descriptor {
    descriptor
        .rename(ASSIGNED_KEY, ASSIGNED_FIELD)
        .override_operator(ASSIGNED_FIELD, AssignedContainsOperator)
}

fn narrow_draft(root: Root) -> Root {
    root.narrow_to(ApplicationVariant::Draft)
}

fn narrow_submitted(root: Root) -> Root {
    root.narrow_to(ApplicationVariant::Submitted)
}

fn narrow_referred(root: Root) -> Root {
    root.narrow_to(ApplicationVariant::Referred)
}

/// `assigned:=<username>`: some assigned committee member of this
/// application has the given username.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssignedContainsOperator;

impl SearchOperator for AssignedContainsOperator {
    fn literal(&self) -> &'static str {
        ":="
    }

    fn operate(&self, field: &Field, criterion: &Criterion) -> Result<Compiled> {
        let attribute = field.element_attribute(["user", "username"])?;
        let value = criterion.value().coerce_to(attribute.ty())?;
        Ok(Predicate::AnyRelated {
            collection: field.clone(),
            attribute,
            value,
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::value::Value;

    #[test]
    fn names_round_trip() {
        for kind in EntityKind::ALL {
            assert_eq!(kind.name().parse::<EntityKind>().unwrap(), kind);
            assert_eq!(kind.descriptor().name(), kind.name());
        }
    }

    #[test]
    fn unknown_entity_is_reported() {
        let err = "projects".parse::<EntityKind>().unwrap_err();
        assert!(matches!(err, SearchError::UnknownEntity { ref name } if name == "projects"));
    }

    #[test]
    fn serde_names_match_public_names() {
        for kind in EntityKind::ALL {
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, kind.name());
        }
    }

    #[test]
    fn user_surfaces_accept_three_operators() {
        let d = EntityKind::Users.descriptor();
        let ops: Vec<_> = d.supported_operators().collect();
        assert_eq!(ops, vec![":", ":~", "="]);
        assert!(!d.supports(":="));
    }

    #[test]
    fn variant_descriptors_scope_to_their_variant() {
        assert_eq!(
            EntityKind::Applications.descriptor().scope(),
            Root::table(RecordTable::Application)
        );
        assert_eq!(
            EntityKind::ReferredApplications.descriptor().scope(),
            Root::application(ApplicationVariant::Referred)
        );
    }

    #[test]
    fn only_submitted_and_referred_expose_assigned() {
        for kind in EntityKind::ALL {
            let d = kind.descriptor();
            let has_assigned = d.mapped_key(ASSIGNED_KEY) == ASSIGNED_FIELD;
            let expected = matches!(
                kind,
                EntityKind::SubmittedApplications | EntityKind::ReferredApplications
            );
            assert_eq!(has_assigned, expected, "{kind}");
            assert_eq!(d.overrides().get(ASSIGNED_FIELD, ":=").is_some(), expected);
        }
    }

    #[test]
    fn assigned_contains_projects_member_usernames() {
        let root = Root::application(ApplicationVariant::Submitted);
        let field = root.resolve([ASSIGNED_FIELD]).unwrap();
        let compiled = AssignedContainsOperator
            .operate(&field, &Criterion::new(ASSIGNED_FIELD, ":=", "alice", false))
            .unwrap();
        match compiled {
            Compiled::Restrict(Predicate::AnyRelated {
                collection,
                attribute,
                value,
            }) => {
                assert_eq!(collection.dotted(), ASSIGNED_FIELD);
                assert_eq!(attribute.dotted(), "user.username");
                assert_eq!(value, Value::from("alice"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
