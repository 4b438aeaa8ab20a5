//! Mapping descriptors: the declared shape of a configurable type.
//!
//! A [`Descriptor`] lists the directive names a type recognizes and what
//! each one holds. Descriptors are plain data built once per type (see
//! [`Descriptor::cached`]) and shared behind an `Arc`.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::Configurable;

/// The scalar value types a single argument can be coerced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    String,
    /// Signed 64-bit integer.
    Integer,
    /// Finite 64-bit float.
    Float,
    /// `true yes on 1` / `false no off 0`, any ASCII case.
    Boolean,
    /// Exact decimal, carried to serde as a string.
    Decimal,
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScalarKind::String => "string",
            ScalarKind::Integer => "integer",
            ScalarKind::Float => "float",
            ScalarKind::Boolean => "boolean",
            ScalarKind::Decimal => "decimal",
        })
    }
}

// ──────────────────────────────────────────────
// Enumerations
// ──────────────────────────────────────────────

/// The members of an enumeration and the literals that select them.
///
/// Each member is selected by its own name or by any of its aliases. The
/// literal table is filled in as members are added, so lookups never scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDescriptor {
    name: String,
    members: Vec<String>,
    literals: HashMap<String, usize>,
}

impl EnumDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        EnumDescriptor {
            name: name.into(),
            members: Vec::new(),
            literals: HashMap::new(),
        }
    }

    /// Add a member selected by its own name. The name is also the value
    /// handed to serde, so it must match the Rust variant (after renames).
    pub fn member(self, name: impl Into<String>) -> Self {
        self.member_with_aliases(name, std::iter::empty::<&str>())
    }

    /// Add a member that is also selected by each of `aliases`. A literal
    /// already claimed by an earlier member keeps pointing there.
    pub fn member_with_aliases<I, S>(mut self, name: impl Into<String>, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let index = self.members.len();
        self.literals.entry(name.clone()).or_insert(index);
        for alias in aliases {
            self.literals.entry(alias.into()).or_insert(index);
        }
        self.members.push(name);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> impl Iterator<Item = &str> + '_ {
        self.members.iter().map(String::as_str)
    }

    /// The member a literal selects, if any.
    pub fn resolve(&self, literal: &str) -> Option<&str> {
        self.literals
            .get(literal)
            .map(|&index| self.members[index].as_str())
    }
}

// ──────────────────────────────────────────────
// Fields
// ──────────────────────────────────────────────

/// What a field holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// One argument coerced to a scalar.
    Scalar(ScalarKind),
    /// One argument naming an enumeration member.
    Enum(Arc<EnumDescriptor>),
    /// A block of child directives mapped onto another descriptor.
    Object(Arc<Descriptor>),
    /// Like `Object`, but the descriptor is fetched when a directive is
    /// mapped, so a type may contain itself.
    Deferred(DescriptorFn),
    /// Repeated sibling directives, one element each, in source order.
    List(Box<Shape>),
}

impl Shape {
    pub fn list(element: Shape) -> Shape {
        Shape::List(Box::new(element))
    }

    /// The shape of a nested configurable type. Resolved lazily, so it is
    /// safe to use inside `T`'s own descriptor.
    pub fn object<T: Configurable>() -> Shape {
        Shape::Deferred(DescriptorFn::of::<T>())
    }
}

/// A configurable type's `descriptor` function, called on demand.
#[derive(Clone, Copy)]
pub struct DescriptorFn(fn() -> Arc<Descriptor>);

impl DescriptorFn {
    pub fn of<T: Configurable>() -> Self {
        DescriptorFn(T::descriptor)
    }

    pub fn resolve(&self) -> Arc<Descriptor> {
        (self.0)()
    }
}

impl fmt::Debug for DescriptorFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DescriptorFn(..)")
    }
}

impl PartialEq for DescriptorFn {
    fn eq(&self, other: &Self) -> bool {
        self.0 as usize == other.0 as usize
    }
}

impl Eq for DescriptorFn {}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Scalar(kind) => write!(f, "{}", kind),
            Shape::Enum(e) => write!(f, "{}", e.name()),
            Shape::Object(d) => write!(f, "'{}' block", d.name()),
            Shape::Deferred(d) => write!(f, "'{}' block", d.resolve().name()),
            Shape::List(inner) => write!(f, "list of {}", inner),
        }
    }
}

/// One recognized directive name within a descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Directive name in the source text.
    pub name: String,
    /// Key in the serde value; defaults to `name`.
    pub key: String,
    pub shape: Shape,
    /// Absence is an error. For lists, at least one element is required.
    pub required: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, shape: Shape) -> Self {
        let name = name.into();
        Field {
            key: name.clone(),
            name,
            shape,
            required: false,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Field::new(name, Shape::Scalar(ScalarKind::String))
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Field::new(name, Shape::Scalar(ScalarKind::Integer))
    }

    pub fn float(name: impl Into<String>) -> Self {
        Field::new(name, Shape::Scalar(ScalarKind::Float))
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Field::new(name, Shape::Scalar(ScalarKind::Boolean))
    }

    pub fn decimal(name: impl Into<String>) -> Self {
        Field::new(name, Shape::Scalar(ScalarKind::Decimal))
    }

    pub fn enumeration(name: impl Into<String>, members: Arc<EnumDescriptor>) -> Self {
        Field::new(name, Shape::Enum(members))
    }

    pub fn nested<T: Configurable>(name: impl Into<String>) -> Self {
        Field::new(name, Shape::object::<T>())
    }

    pub fn list(name: impl Into<String>, element: Shape) -> Self {
        Field::new(name, Shape::list(element))
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Use a different key in the serde value than the directive name.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }
}

// ──────────────────────────────────────────────
// Descriptors
// ──────────────────────────────────────────────

/// The recognized fields of one configurable type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    name: String,
    fields: Vec<Field>,
    index: HashMap<String, usize>,
}

impl Descriptor {
    /// `name` is the directive that holds this type at the top level of a
    /// document (see [`crate::from_root`]).
    pub fn new(name: impl Into<String>) -> Self {
        Descriptor {
            name: name.into(),
            fields: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Add a field. A field with the same directive name is replaced.
    pub fn field(mut self, field: Field) -> Self {
        match self.index.get(&field.name) {
            Some(&i) => self.fields[i] = field,
            None => {
                self.index.insert(field.name.clone(), self.fields.len());
                self.fields.push(field);
            }
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn lookup(&self, directive_name: &str) -> Option<(usize, &Field)> {
        self.index
            .get(directive_name)
            .map(|&i| (i, &self.fields[i]))
    }

    /// Build a descriptor once and hand out shared copies afterwards.
    ///
    /// ```
    /// use std::sync::{Arc, OnceLock};
    /// use confetti_mapper::{Descriptor, Field};
    ///
    /// fn server() -> Arc<Descriptor> {
    ///     static CELL: OnceLock<Arc<Descriptor>> = OnceLock::new();
    ///     Descriptor::cached(&CELL, || Descriptor::new("server").field(Field::integer("port")))
    /// }
    /// assert!(Arc::ptr_eq(&server(), &server()));
    /// ```
    pub fn cached(
        cell: &'static OnceLock<Arc<Descriptor>>,
        build: impl FnOnce() -> Descriptor,
    ) -> Arc<Descriptor> {
        Arc::clone(cell.get_or_init(|| Arc::new(build())))
    }
}
