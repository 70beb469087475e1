//! Per-entity search configuration.
//!
//! A [`Descriptor`] bundles everything that differs between searchable
//! entity kinds: the token grammar, the operator whitelist, public key
//! renames, value converters, the root-narrowing hook for application
//! variants, and per-field operator overrides. Descriptors are cheap
//! to build and are constructed fresh for each criterion by a
//! [`DescriptorFactory`].

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use anyhow::{anyhow, Result};

use crate::search::operators::{OperatorOverrides, SearchOperator};
use crate::search::parser::Grammar;
use crate::search::schema::Root;
use crate::search::value::Value;

/// Converts a raw criterion value into the typed value a field expects.
pub trait ValueConverter: Send + Sync {
    fn convert(&self, raw: Value) -> Result<Value>;
}

impl<F> ValueConverter for F
where
    F: Fn(Value) -> Result<Value> + Send + Sync,
{
    fn convert(&self, raw: Value) -> Result<Value> {
        self(raw)
    }
}

/// An enumeration searchable by variant name.
pub trait SearchEnum: Copy + Send + Sync + 'static {
    const TYPE_NAME: &'static str;

    fn variants() -> &'static [Self];

    fn name(self) -> &'static str;
}

/// Converts variant names into [`Value::Enum`] for `E`.
pub struct EnumConverter<E>(PhantomData<fn() -> E>);

impl<E> EnumConverter<E> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<E> Default for EnumConverter<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: SearchEnum> ValueConverter for EnumConverter<E> {
    fn convert(&self, raw: Value) -> Result<Value> {
        let Value::Text(name) = raw else {
            return Ok(raw);
        };
        E::variants()
            .iter()
            .map(|variant| variant.name())
            .find(|candidate| *candidate == name)
            .map(Value::Enum)
            .ok_or_else(|| anyhow!("`{name}` is not a valid {}", E::TYPE_NAME))
    }
}

/// Hook narrowing generic row access to one variant's field set.
pub type RootNarrow = fn(Root) -> Root;

/// Public key renames. Missing keys map to themselves.
#[derive(Debug, Clone, Default)]
pub struct KeyMappings {
    renames: BTreeMap<String, String>,
}

impl KeyMappings {
    pub fn insert(&mut self, from: impl Into<String>, to: impl Into<String>) {
        self.renames.insert(from.into(), to.into());
    }

    pub fn mapped<'a>(&'a self, key: &'a str) -> &'a str {
        self.renames.get(key).map(String::as_str).unwrap_or(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.renames.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Value converters keyed by mapped field key.
#[derive(Clone, Default)]
pub struct ValueConverters {
    converters: HashMap<String, Arc<dyn ValueConverter>>,
}

impl ValueConverters {
    pub fn insert(&mut self, key: impl Into<String>, converter: impl ValueConverter + 'static) {
        self.converters.insert(key.into(), Arc::new(converter));
    }

    /// Run the converter for `key`, or pass `value` through.
    pub fn convert(&self, key: &str, value: Value) -> Result<Value> {
        match self.converters.get(key) {
            Some(converter) => converter.convert(value),
            None => Ok(value),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.converters.keys().map(String::as_str)
    }
}

impl fmt::Debug for ValueConverters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.converters.keys()).finish()
    }
}

/// Search configuration for one entity kind.
#[derive(Debug, Clone)]
pub struct Descriptor {
    name: &'static str,
    root: Root,
    grammar: &'static Grammar,
    supported: BTreeSet<&'static str>,
    key_mappings: KeyMappings,
    converters: ValueConverters,
    narrow: Option<RootNarrow>,
    overrides: OperatorOverrides,
}

impl Descriptor {
    pub fn new(
        name: &'static str,
        root: Root,
        grammar: &'static Grammar,
        supported: &[&'static str],
    ) -> Self {
        Self {
            name,
            root,
            grammar,
            supported: supported.iter().copied().collect(),
            key_mappings: KeyMappings::default(),
            converters: ValueConverters::default(),
            narrow: None,
            overrides: OperatorOverrides::default(),
        }
    }

    pub fn rename(mut self, from: &str, to: &str) -> Self {
        self.key_mappings.insert(from, to);
        self
    }

    pub fn convert(mut self, key: &str, converter: impl ValueConverter + 'static) -> Self {
        self.converters.insert(key, converter);
        self
    }

    pub fn narrow_with(mut self, hook: RootNarrow) -> Self {
        self.narrow = Some(hook);
        self
    }

    pub fn override_operator(
        mut self,
        key: &str,
        operator: impl SearchOperator + 'static,
    ) -> Self {
        self.overrides = self.overrides.with(key, operator);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Unnarrowed root for this entity's storage table.
    pub fn root(&self) -> Root {
        self.root
    }

    /// Root after narrowing; also the store lookup scope.
    pub fn scope(&self) -> Root {
        self.narrow(self.root)
    }

    pub fn narrow(&self, root: Root) -> Root {
        match self.narrow {
            Some(hook) => hook(root),
            None => root,
        }
    }

    pub fn grammar(&self) -> &'static Grammar {
        self.grammar
    }

    pub fn supports(&self, literal: &str) -> bool {
        self.supported.contains(literal)
    }

    pub fn supported_operators(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.supported.iter().copied()
    }

    pub fn key_mappings(&self) -> &KeyMappings {
        &self.key_mappings
    }

    pub fn mapped_key<'a>(&'a self, key: &'a str) -> &'a str {
        self.key_mappings.mapped(key)
    }

    pub fn convert_value(&self, key: &str, value: Value) -> Result<Value> {
        self.converters.convert(key, value)
    }

    pub fn converters(&self) -> &ValueConverters {
        &self.converters
    }

    pub fn overrides(&self) -> &OperatorOverrides {
        &self.overrides
    }
}

/// Produces a fresh descriptor for each criterion.
pub trait DescriptorFactory {
    fn create(&self) -> Result<Descriptor>;
}

impl<F> DescriptorFactory for F
where
    F: Fn() -> Result<Descriptor>,
{
    fn create(&self) -> Result<Descriptor> {
        self()
    }
}
