#![forbid(unsafe_code)]

//! Observer configuration.
//!
//! Declarations can be built in code with [`AttributeDecl`] and
//! [`ObserverOptions`], or loaded as data through [`ObserverSpec`] (serde)
//! and bound to cells by name with [`ObserverOptions::from_spec`].

use std::fmt;

use attrsync_reactive::Observable;
use serde::{Deserialize, Serialize};

use crate::value::{AttrValue, ValueKind};

/// When initial reconciliation runs relative to attach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tick {
    /// Synchronously, inside attach.
    Before,
    /// After the first update flush following attach.
    #[default]
    After,
}

/// An externally observed attribute change.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeChange {
    pub attribute: String,
    /// Content before the change (`None` = absent).
    pub old_raw: Option<String>,
    /// Content at delivery time (`None` = absent).
    pub new_raw: Option<String>,
    /// `new_raw` interpreted per the binding's kind.
    pub value: AttrValue,
}

pub type ChangeCallback = Box<dyn FnMut(&AttributeChange)>;

/// Declaration of one attribute binding.
///
/// A declaration may be incomplete (no name, no cell); such entries are
/// rejected individually when the observer attaches.
#[derive(Clone)]
pub struct AttributeDecl {
    name: String,
    cell: Option<Observable<AttrValue>>,
    kind: ValueKind,
    reflect: bool,
}

impl fmt::Debug for AttributeDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeDecl")
            .field("name", &self.name)
            .field("cell", &self.cell.as_ref().map(Observable::get))
            .field("kind", &self.kind)
            .field("reflect", &self.reflect)
            .finish()
    }
}

impl Default for AttributeDecl {
    fn default() -> Self {
        Self::empty()
    }
}

impl AttributeDecl {
    /// Bind `name` to `cell` as a reflecting String attribute.
    #[must_use]
    pub fn new(name: impl Into<String>, cell: &Observable<AttrValue>) -> Self {
        Self::named(name).with_cell(cell)
    }

    /// A declaration with nothing filled in.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            name: String::new(),
            cell: None,
            kind: ValueKind::default(),
            reflect: true,
        }
    }

    /// A declaration with a name but no cell yet.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::empty()
        }
    }

    #[must_use]
    pub fn with_cell(mut self, cell: &Observable<AttrValue>) -> Self {
        self.cell = Some(cell.clone());
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: ValueKind) -> Self {
        self.kind = kind;
        self
    }

    /// Whether element-side changes flow back into the cell.
    #[must_use]
    pub fn reflect(mut self, reflect: bool) -> Self {
        self.reflect = reflect;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn cell(&self) -> Option<&Observable<AttrValue>> {
        self.cell.as_ref()
    }

    #[must_use]
    pub const fn value_kind(&self) -> ValueKind {
        self.kind
    }

    #[must_use]
    pub const fn reflects(&self) -> bool {
        self.reflect
    }

    pub(crate) fn into_parts(self) -> (String, Option<Observable<AttrValue>>, ValueKind, bool) {
        (self.name, self.cell, self.kind, self.reflect)
    }
}

/// Data form of an attribute declaration.
///
/// ```json
/// { "attribute": "disabled", "type": "boolean", "reflect": false }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeSpec {
    #[serde(default)]
    pub attribute: String,
    #[serde(rename = "type", default)]
    pub kind: ValueKind,
    #[serde(default = "default_reflect")]
    pub reflect: bool,
}

fn default_reflect() -> bool {
    true
}

/// Data form of a whole observer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ObserverSpec {
    #[serde(default)]
    pub attributes: Vec<AttributeSpec>,
    #[serde(default)]
    pub tick: Tick,
}

/// Everything an observer needs at attach time.
#[derive(Default)]
pub struct ObserverOptions {
    pub(crate) attributes: Vec<AttributeDecl>,
    pub(crate) on_change: Option<ChangeCallback>,
    pub(crate) tick: Tick,
}

impl fmt::Debug for ObserverOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverOptions")
            .field("attributes", &self.attributes)
            .field("on_change", &self.on_change.is_some())
            .field("tick", &self.tick)
            .finish()
    }
}

impl ObserverOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build options from data, resolving each attribute's cell by name.
    ///
    /// Attributes the resolver does not know keep no cell and are rejected
    /// at attach.
    #[must_use]
    pub fn from_spec(
        spec: ObserverSpec,
        resolve: impl Fn(&str) -> Option<Observable<AttrValue>>,
    ) -> Self {
        let attributes = spec
            .attributes
            .into_iter()
            .map(|attr| {
                let decl = AttributeDecl::named(attr.attribute)
                    .kind(attr.kind)
                    .reflect(attr.reflect);
                match resolve(decl.name()) {
                    Some(cell) => decl.with_cell(&cell),
                    None => decl,
                }
            })
            .collect();
        Self {
            attributes,
            on_change: None,
            tick: spec.tick,
        }
    }

    #[must_use]
    pub fn attribute(mut self, decl: AttributeDecl) -> Self {
        self.attributes.push(decl);
        self
    }

    #[must_use]
    pub fn attributes(mut self, decls: impl IntoIterator<Item = AttributeDecl>) -> Self {
        self.attributes.extend(decls);
        self
    }

    /// Callback for externally observed attribute changes.
    #[must_use]
    pub fn on_change(mut self, callback: impl FnMut(&AttributeChange) + 'static) -> Self {
        self.on_change = Some(Box::new(callback));
        self
    }

    #[must_use]
    pub fn tick(mut self, tick: Tick) -> Self {
        self.tick = tick;
        self
    }

    #[must_use]
    pub fn declarations(&self) -> &[AttributeDecl] {
        &self.attributes
    }

    #[must_use]
    pub const fn tick_mode(&self) -> Tick {
        self.tick
    }
}
