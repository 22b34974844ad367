#![forbid(unsafe_code)]

//! The binding table.
//!
//! Built once from the raw declarations and immutable afterwards.
//!
//! # Invariants
//!
//! 1. At most one binding per attribute name.
//! 2. Iteration follows registration order. A duplicate name replaces the
//!    earlier binding in place.
//! 3. Every bound cell has been coerced to its binding's kind.

use ahash::AHashMap;
use attrsync_reactive::Observable;

use crate::config::AttributeDecl;
use crate::error::ConfigError;
use crate::value::{AttrValue, ValueKind};

/// One resolved attribute binding.
#[derive(Debug, Clone)]
pub struct Binding {
    attribute: String,
    kind: ValueKind,
    reflect: bool,
    cell: Observable<AttrValue>,
}

impl Binding {
    #[must_use]
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        self.kind
    }

    #[must_use]
    pub const fn reflect(&self) -> bool {
        self.reflect
    }

    #[must_use]
    pub fn cell(&self) -> &Observable<AttrValue> {
        &self.cell
    }

    /// Desired attribute state for the cell's current value.
    #[must_use]
    pub fn desired(&self) -> Option<String> {
        self.cell.with(|value| self.kind.render(value))
    }
}

#[derive(Debug, Default)]
pub struct BindingTable {
    bindings: Vec<Binding>,
    index: AHashMap<String, usize>,
}

impl BindingTable {
    /// Resolve declarations into a table.
    ///
    /// Returns the table plus one [`ConfigError`] per problem found. Each
    /// problem is also logged as a warning.
    #[must_use]
    pub fn normalize(decls: Vec<AttributeDecl>) -> (Self, Vec<ConfigError>) {
        let mut table = Self::default();
        let mut issues = Vec::new();

        for (index, decl) in decls.into_iter().enumerate() {
            let (name, cell, kind, reflect) = decl.into_parts();
            let name = name.trim().to_string();
            if name.is_empty() {
                tracing::warn!(index, "attribute declaration without a name skipped");
                issues.push(ConfigError::MissingName { index });
                continue;
            }
            let Some(cell) = cell else {
                tracing::warn!(attribute = %name, "attribute declaration without a cell skipped");
                issues.push(ConfigError::MissingCell { attribute: name });
                continue;
            };

            let coerced = kind.coerce(cell.get());
            cell.set(coerced);

            let binding = Binding {
                attribute: name.clone(),
                kind,
                reflect,
                cell,
            };
            match table.index.get(&name) {
                Some(&slot) => {
                    tracing::warn!(attribute = %name, "duplicate attribute declaration; last one wins");
                    issues.push(ConfigError::DuplicateAttribute { attribute: name });
                    table.bindings[slot] = binding;
                }
                None => {
                    table.index.insert(name, table.bindings.len());
                    table.bindings.push(binding);
                }
            }
        }

        (table, issues)
    }

    #[must_use]
    pub fn get(&self, attribute: &str) -> Option<&Binding> {
        self.index.get(attribute).map(|&slot| &self.bindings[slot])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.iter()
    }

    /// Attribute names in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.bindings.iter().map(|b| b.attribute.clone()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
