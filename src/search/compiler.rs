//! Single-criterion compiler.

use tracing::debug;

use crate::search::criterion::Criterion;
use crate::search::descriptor::Descriptor;
use crate::search::error::SearchError;
use crate::search::operators::OperatorRegistry;
use crate::search::predicate::Compiled;
use crate::search::schema::Root;

/// Compile one criterion against `root` using `descriptor`.
///
/// Steps, in order: narrow the root, map the key, convert the value,
/// check the operator whitelist, resolve the field, pick the operator
/// (overrides before registry), run it. A criterion whose operator is
/// outside the whitelist compiles to `NoRestriction`. Failures from
/// conversion, field resolution, or the operator are wrapped in
/// `SearchError::Compile`; an operator missing from both the overrides
/// and the registry is `SearchError::UnknownOperator`.
pub fn compile(
    criterion: &Criterion,
    descriptor: &Descriptor,
    root: Root,
    registry: &OperatorRegistry,
) -> Result<Compiled, SearchError> {
    let root = descriptor.narrow(root);
    let mapped_key = descriptor.mapped_key(criterion.key());
    let wrap = |source| SearchError::compile(criterion.key(), criterion.operator(), source);

    let value = descriptor
        .convert_value(mapped_key, criterion.value().clone())
        .map_err(wrap)?;

    if !descriptor.supports(criterion.operator()) {
        debug!(
            entity = descriptor.name(),
            key = criterion.key(),
            operator = criterion.operator(),
            "operator not accepted here; criterion dropped"
        );
        return Ok(Compiled::NoRestriction);
    }

    let field = if mapped_key.contains('.') {
        root.resolve(mapped_key.split('.').map(|segment| descriptor.mapped_key(segment)))
    } else {
        root.resolve([mapped_key])
    }
    .map_err(wrap)?;

    let operator = descriptor
        .overrides()
        .resolve(mapped_key, criterion.operator(), registry)?;

    let compiled = operator
        .operate(&field, &criterion.with_value(value))
        .map_err(wrap)?;

    debug!(
        entity = descriptor.name(),
        scope = %root.describe(),
        field = %field.dotted(),
        operator = operator.literal(),
        restricted = !compiled.is_unrestricted(),
        "compiled criterion"
    );

    Ok(compiled)
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::models::records::RecordTable;
    use crate::search::entities::EntityKind;
    use crate::search::operators::{EqualsOperator, SearchOperator};
    use crate::search::parser::USER_GRAMMAR;
    use crate::search::predicate::Predicate;
    use crate::search::schema::Field;
    use crate::search::value::Value;

    fn run(kind: EntityKind, key: &str, op: &str, value: &str) -> Result<Compiled, SearchError> {
        let descriptor = kind.descriptor();
        compile(
            &Criterion::new(key, op, value, false),
            &descriptor,
            descriptor.root(),
            OperatorRegistry::global(),
        )
    }

    fn field_of(compiled: &Compiled) -> &Field {
        match compiled.predicate() {
            Some(
                Predicate::Equals { field, .. }
                | Predicate::Like { field, .. }
                | Predicate::AtLeast { field, .. }
                | Predicate::AtMost { field, .. }
                | Predicate::Includes { field, .. },
            ) => field,
            Some(Predicate::AnyRelated { collection, .. }) => collection,
            other => panic!("unexpected predicate {other:?}"),
        }
    }

    #[test]
    fn public_id_resolves_to_application_id() {
        let compiled = run(EntityKind::DraftApplications, "id", ":", "123").unwrap();
        assert_eq!(field_of(&compiled).dotted(), "applicationId");
    }

    #[test]
    fn db_id_resolves_to_primary_key_without_double_mapping() {
        let compiled = run(EntityKind::Applications, "dbId", "=", "5").unwrap();
        assert_eq!(field_of(&compiled).dotted(), "id");
        assert!(matches!(
            compiled.predicate(),
            Some(Predicate::Equals { value: Value::Integer(5), .. })
        ));
    }

    #[test]
    fn dotted_segments_are_renamed() {
        let descriptor = EntityKind::Users.descriptor().rename("r", "role");
        let compiled = compile(
            &Criterion::new("r.name", "=", "admin", false),
            &descriptor,
            descriptor.root(),
            OperatorRegistry::global(),
        )
        .unwrap();
        assert_eq!(field_of(&compiled).dotted(), "role.name");
    }

    #[test]
    fn status_is_converted_to_enum() {
        let compiled = run(EntityKind::SubmittedApplications, "status", "=", "APPROVED").unwrap();
        assert!(matches!(
            compiled.predicate(),
            Some(Predicate::Equals { value: Value::Enum("APPROVED"), .. })
        ));
    }

    #[test]
    fn bad_status_is_a_compile_error() {
        let err = run(EntityKind::SubmittedApplications, "status", "=", "LOST").unwrap_err();
        match err {
            SearchError::Compile { key, operator, source } => {
                assert_eq!(key, "status");
                assert_eq!(operator, "=");
                assert!(source.to_string().contains("LOST"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unsupported_operator_is_dropped() {
        // `:=` is not on the users whitelist.
        let compiled = run(EntityKind::Users, "username", ":=", "jdoe").unwrap();
        assert!(compiled.is_unrestricted());
    }

    #[test]
    fn whitelisted_but_unregistered_operator_fails_fast() {
        let descriptor = Descriptor::new(
            "custom",
            Root::table(RecordTable::User),
            &USER_GRAMMAR,
            &["!"],
        );
        let err = compile(
            &Criterion::new("username", "!", "x", false),
            &descriptor,
            descriptor.root(),
            OperatorRegistry::global(),
        )
        .unwrap_err();
        assert!(matches!(err, SearchError::UnknownOperator { ref literal } if literal == "!"));
    }

    #[test]
    fn unknown_field_is_a_compile_error() {
        let err = run(EntityKind::Accounts, "password", "=", "x").unwrap_err();
        assert!(matches!(err, SearchError::Compile { .. }));
    }

    #[test]
    fn variant_fields_need_a_narrowed_root() {
        assert!(run(EntityKind::Applications, "submittedTime", ">", "2021-01-01").is_err());
        let compiled =
            run(EntityKind::SubmittedApplications, "submittedTime", ">", "2021-01-01").unwrap();
        assert!(matches!(
            compiled.predicate(),
            Some(Predicate::AtLeast { value: Value::Timestamp(ts), .. }) if *ts == datetime!(2021-01-01 0:00)
        ));
    }

    #[test]
    fn unparsable_date_is_unrestricted() {
        let compiled =
            run(EntityKind::SubmittedApplications, "lastUpdated", "<", "not-a-date").unwrap();
        assert!(compiled.is_unrestricted());
    }

    #[test]
    fn assigned_uses_override_only_for_its_key() {
        let assigned = run(EntityKind::SubmittedApplications, "assigned", ":=", "alice").unwrap();
        assert!(matches!(
            assigned.predicate(),
            Some(Predicate::AnyRelated { .. })
        ));

        let previous = run(
            EntityKind::SubmittedApplications,
            "previousCommitteeMembers",
            ":=",
            "alice",
        )
        .unwrap();
        assert!(matches!(previous.predicate(), Some(Predicate::Includes { .. })));
    }

    #[test]
    fn override_beats_a_custom_global_operator() {
        #[derive(Debug)]
        struct Nothing;
        impl SearchOperator for Nothing {
            fn literal(&self) -> &'static str {
                ":="
            }
            fn operate(&self, _: &Field, _: &Criterion) -> anyhow::Result<Compiled> {
                Ok(Compiled::NoRestriction)
            }
        }

        let registry = OperatorRegistry::builder()
            .register(EqualsOperator)
            .register(Nothing)
            .build();
        let descriptor = EntityKind::ReferredApplications.descriptor();
        let compiled = compile(
            &Criterion::new("assigned", ":=", "alice", false),
            &descriptor,
            descriptor.root(),
            &registry,
        )
        .unwrap();
        assert!(matches!(compiled.predicate(), Some(Predicate::AnyRelated { .. })));

        let other = compile(
            &Criterion::new("editableFields", ":=", "title", false),
            &descriptor,
            descriptor.root(),
            &registry,
        )
        .unwrap();
        assert!(other.is_unrestricted());
    }
}
