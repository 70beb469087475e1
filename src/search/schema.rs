//! Static field schemas and field accessors.
//!
//! Every searchable record kind declares its fields as a static
//! `FieldDef` table. The compiler resolves a (possibly dotted) key
//! against the table for the current `Root`, producing a `Field`
//! accessor that carries the resolved path and declared type. Stores
//! evaluate predicates by walking the same path through a record's
//! JSON body.

use anyhow::{bail, Result};

use crate::models::records::{
    Account, ApplicationVariant, DraftApplication, RecordTable, ReferredApplication,
    SubmittedApplication, User,
};

/// Declared type of a searchable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Integer,
    Boolean,
    /// Enumeration stored by variant name.
    Enum(&'static [&'static str]),
    /// Point in time stored as `YYYY-MM-DDTHH:MM:SS` text.
    Timestamp,
    /// Nested object with its own field table.
    Object(&'static [FieldDef]),
    /// Homogeneous list of elements.
    List(&'static FieldType),
}

impl FieldType {
    pub fn is_textual(self) -> bool {
        matches!(self, FieldType::Text)
    }

    pub fn is_temporal(self) -> bool {
        matches!(self, FieldType::Timestamp)
    }

    /// Element type for list fields.
    pub fn element(self) -> Option<FieldType> {
        match self {
            FieldType::List(inner) => Some(*inner),
            _ => None,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Integer => "integer",
            FieldType::Boolean => "boolean",
            FieldType::Enum(_) => "enum",
            FieldType::Timestamp => "timestamp",
            FieldType::Object(_) => "object",
            FieldType::List(_) => "list",
        }
    }
}

/// One named entry in a field table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub ty: FieldType,
}

impl FieldDef {
    pub const fn new(name: &'static str, ty: FieldType) -> Self {
        Self { name, ty }
    }
}

/// A resolved field: the path from the record root plus its type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    path: Vec<&'static str>,
    ty: FieldType,
}

impl Field {
    pub fn path(&self) -> &[&'static str] {
        &self.path
    }

    pub fn ty(&self) -> FieldType {
        self.ty
    }

    /// Dotted representation, e.g. `user.role.name`.
    pub fn dotted(&self) -> String {
        self.path.join(".")
    }

    /// Resolve a relative attribute path against this field's element
    /// type. Only list-of-object fields have attributes.
    pub fn element_attribute<'a>(
        &self,
        segments: impl IntoIterator<Item = &'a str>,
    ) -> Result<Field> {
        match self.ty.element() {
            Some(FieldType::Object(fields)) => walk(fields, segments),
            _ => bail!(
                "field `{}` is not a collection of objects",
                self.dotted()
            ),
        }
    }
}

/// Walk `segments` through nested field tables starting at `fields`.
pub fn walk<'a>(
    fields: &'static [FieldDef],
    segments: impl IntoIterator<Item = &'a str>,
) -> Result<Field> {
    let mut path = Vec::new();
    let mut current = fields;
    let mut resolved: Option<FieldType> = None;

    for segment in segments {
        if let Some(ty) = resolved {
            match ty {
                FieldType::Object(nested) => current = nested,
                _ => bail!(
                    "field `{}` of type {} has no nested field `{segment}`",
                    path.join("."),
                    ty.describe()
                ),
            }
        }

        let Some(def) = current.iter().find(|def| def.name == segment) else {
            if path.is_empty() {
                bail!("unknown field `{segment}`");
            }
            bail!("unknown field `{segment}` under `{}`", path.join("."));
        };
        path.push(def.name);
        resolved = Some(def.ty);
    }

    match resolved {
        Some(ty) => Ok(Field { path, ty }),
        None => bail!("empty field path"),
    }
}

/// Generic row access for one stored record kind.
///
/// A root starts out covering a whole storage table. Descriptors for
/// application variants narrow it to one variant, which both widens
/// the visible field set and scopes store lookups to that variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Root {
    table: RecordTable,
    variant: Option<ApplicationVariant>,
}

impl Root {
    pub fn table(table: RecordTable) -> Self {
        Self {
            table,
            variant: None,
        }
    }

    pub fn application(variant: ApplicationVariant) -> Self {
        Self {
            table: RecordTable::Application,
            variant: Some(variant),
        }
    }

    pub fn record_table(&self) -> RecordTable {
        self.table
    }

    pub fn variant(&self) -> Option<ApplicationVariant> {
        self.variant
    }

    /// Narrow an application root to one variant. Other roots are
    /// returned unchanged.
    pub fn narrow_to(self, variant: ApplicationVariant) -> Self {
        match self.table {
            RecordTable::Application => Self::application(variant),
            _ => self,
        }
    }

    /// Field table visible through this root.
    pub fn fields(&self) -> &'static [FieldDef] {
        match (self.table, self.variant) {
            (RecordTable::Account, _) => Account::FIELDS,
            (RecordTable::User, _) => User::FIELDS,
            (RecordTable::Application, None) => DraftApplication::FIELDS,
            (RecordTable::Application, Some(ApplicationVariant::Draft)) => {
                DraftApplication::FIELDS
            }
            (RecordTable::Application, Some(ApplicationVariant::Submitted)) => {
                SubmittedApplication::FIELDS
            }
            (RecordTable::Application, Some(ApplicationVariant::Referred)) => {
                ReferredApplication::FIELDS
            }
        }
    }

    pub fn resolve<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Field> {
        walk(self.fields(), segments)
    }

    pub fn describe(&self) -> String {
        match self.variant {
            Some(variant) => format!("{}/{}", self.table.as_str(), variant.as_str()),
            None => self.table.as_str().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_nested_user_fields() {
        let root = Root::table(RecordTable::User);
        let field = root.resolve(["role", "name"]).expect("resolve");
        assert_eq!(field.path(), &["role", "name"]);
        assert_eq!(field.ty(), FieldType::Text);
        assert_eq!(field.dotted(), "role.name");
    }

    #[test]
    fn unknown_field_is_rejected() {
        let root = Root::table(RecordTable::Account);
        let err = root.resolve(["password"]).unwrap_err();
        assert!(err.to_string().contains("unknown field `password`"));
    }

    #[test]
    fn walking_through_scalar_is_rejected() {
        let root = Root::table(RecordTable::Account);
        let err = root.resolve(["email", "domain"]).unwrap_err();
        assert!(err.to_string().contains("has no nested field"));
    }

    #[test]
    fn narrowing_exposes_variant_fields() {
        let generic = Root::table(RecordTable::Application);
        assert!(generic.resolve(["submittedTime"]).is_err());

        let submitted = generic.narrow_to(ApplicationVariant::Submitted);
        let field = submitted.resolve(["submittedTime"]).expect("resolve");
        assert!(field.ty().is_temporal());
        assert_eq!(submitted.describe(), "application/submitted");
    }

    #[test]
    fn narrowing_leaves_other_tables_alone() {
        let users = Root::table(RecordTable::User);
        assert_eq!(users.narrow_to(ApplicationVariant::Draft), users);
    }

    #[test]
    fn element_attribute_walks_into_list_of_objects() {
        let root = Root::application(ApplicationVariant::Submitted);
        let members = root.resolve(["assignedCommitteeMembers"]).expect("resolve");
        let attribute = members
            .element_attribute(["user", "username"])
            .expect("attribute");
        assert_eq!(attribute.path(), &["user", "username"]);

        let status = root.resolve(["status"]).expect("resolve");
        assert!(status.element_attribute(["user"]).is_err());
    }
}
