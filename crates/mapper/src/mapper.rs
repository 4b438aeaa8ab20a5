//! Directive tree to typed value.
//!
//! Mapping runs in two steps. [`map_value`] walks the directives against a
//! [`Descriptor`] and builds an untyped `serde_json::Value`; every coercion
//! and structural check happens there. The typed entry points then hand
//! that value to serde. A failure at either step discards the partial
//! result.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::{Map, Value};

use confetti_core::{Argument, Directive, Document, ParseOptions};

use crate::descriptor::{Descriptor, EnumDescriptor, Shape, ScalarKind};
use crate::error::MappingError;
use crate::{Configurable, Error};

/// How unrecognized directives are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MapOptions {
    /// Reject directive names the descriptor does not list. When false
    /// (the default) they are skipped.
    pub strict: bool,
}

impl MapOptions {
    pub fn strict() -> Self {
        MapOptions { strict: true }
    }
}

// ── Entry points ─────────────────────────────────────────────────────

/// Map a directive list onto the untyped value described by `descriptor`.
pub fn map_value(
    directives: &[Directive],
    descriptor: &Descriptor,
    options: &MapOptions,
) -> Result<Value, MappingError> {
    let mapper = Mapper { options };
    mapper.object(directives, descriptor, "").map(Value::Object)
}

/// Map a directive list (e.g. the children of a block) onto `T`.
pub fn map<T: Configurable>(
    directives: &[Directive],
    options: &MapOptions,
) -> Result<T, MappingError> {
    let value = map_value(directives, &T::descriptor(), options)?;
    deserialize(value)
}

/// Map the block of `directive` onto `T`. The directive itself must have
/// no arguments.
pub fn map_block<T: Configurable>(
    directive: &Directive,
    options: &MapOptions,
) -> Result<T, MappingError> {
    let descriptor = T::descriptor();
    let mapper = Mapper { options };
    let fields = mapper.nested(directive, &descriptor, "")?;
    deserialize(Value::Object(fields))
}

/// Find the top-level directive named after `T`'s descriptor and map its
/// block onto `T`.
pub fn from_root<T: Configurable>(
    document: &Document,
    options: &MapOptions,
) -> Result<T, MappingError> {
    let descriptor = T::descriptor();
    let mut roots = document.find_all(descriptor.name());
    let root = roots.next().ok_or_else(|| MappingError::MissingRoot {
        name: descriptor.name().to_string(),
    })?;
    if let Some(again) = roots.next() {
        let (line, column) = line_col(again);
        return Err(MappingError::DuplicateField {
            field: descriptor.name().to_string(),
            line,
            column,
            first_line: root.position().line,
        });
    }
    let mapper = Mapper { options };
    let fields = mapper.nested(root, &descriptor, "")?;
    deserialize(Value::Object(fields))
}

/// Parse Confetti text with the base grammar and map its root directive
/// onto `T`, permissively.
pub fn from_str<T: Configurable>(text: &str) -> Result<T, Error> {
    from_str_with(text, &ParseOptions::default(), &MapOptions::default())
}

pub fn from_str_with<T: Configurable>(
    text: &str,
    parse_options: &ParseOptions,
    map_options: &MapOptions,
) -> Result<T, Error> {
    let document = confetti_core::parse_with(text, parse_options)?;
    Ok(from_root(&document, map_options)?)
}

fn deserialize<T: Configurable>(value: Value) -> Result<T, MappingError> {
    serde_json::from_value(value).map_err(|e| MappingError::Deserialize {
        type_name: std::any::type_name::<T>().to_string(),
        message: e.to_string(),
    })
}

// ── Walking ──────────────────────────────────────────────────────────

struct Mapper<'o> {
    options: &'o MapOptions,
}

/// Per-field accumulator while a directive list is walked.
enum Slot<'d> {
    Empty,
    Single(&'d Directive, Value),
    List(Vec<Value>),
}

fn join(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", path, name)
    }
}

fn line_col(d: &Directive) -> (u32, u32) {
    let p = d.position();
    (p.line, p.column)
}

impl<'o> Mapper<'o> {
    fn object(
        &self,
        directives: &[Directive],
        descriptor: &Descriptor,
        path: &str,
    ) -> Result<Map<String, Value>, MappingError> {
        let mut slots: Vec<Slot<'_>> = descriptor
            .fields()
            .iter()
            .map(|f| match f.shape {
                Shape::List(_) => Slot::List(Vec::new()),
                _ => Slot::Empty,
            })
            .collect();

        for d in directives {
            let Some((index, field)) = descriptor.lookup(d.name()) else {
                if self.options.strict {
                    let (line, column) = line_col(d);
                    return Err(MappingError::UnknownDirective {
                        name: d.name().to_string(),
                        scope: if path.is_empty() {
                            format!("'{}'", descriptor.name())
                        } else {
                            format!("'{}'", path)
                        },
                        line,
                        column,
                    });
                }
                continue;
            };
            let field_path = join(path, &field.name);
            match (&mut slots[index], &field.shape) {
                (Slot::List(items), Shape::List(element)) => {
                    items.push(self.element(d, element, &field_path)?);
                }
                (Slot::Single(first, _), _) => {
                    let (line, column) = line_col(d);
                    return Err(MappingError::DuplicateField {
                        field: field_path,
                        line,
                        column,
                        first_line: first.position().line,
                    });
                }
                (slot, shape) => {
                    let value = self.single(d, shape, &field_path)?;
                    *slot = Slot::Single(d, value);
                }
            }
        }

        let mut out = Map::new();
        for (field, slot) in descriptor.fields().iter().zip(slots) {
            match slot {
                Slot::Single(_, value) => {
                    out.insert(field.key.clone(), value);
                }
                Slot::List(items) if items.is_empty() && field.required => {
                    return Err(MappingError::MissingField {
                        field: join(path, &field.name),
                    });
                }
                Slot::List(items) => {
                    out.insert(field.key.clone(), Value::Array(items));
                }
                Slot::Empty if field.required => {
                    return Err(MappingError::MissingField {
                        field: join(path, &field.name),
                    });
                }
                Slot::Empty => {}
            }
        }
        Ok(out)
    }

    /// A field that is not a list: one directive, one value.
    fn single(&self, d: &Directive, shape: &Shape, path: &str) -> Result<Value, MappingError> {
        match shape {
            Shape::Scalar(kind) => {
                let arg = self.only_argument(d, path)?;
                coerce(arg, *kind, d, path)
            }
            Shape::Enum(members) => {
                let arg = self.only_argument(d, path)?;
                resolve_member(arg, members, d, path)
            }
            Shape::Object(descriptor) => self.nested(d, descriptor, path).map(Value::Object),
            Shape::Deferred(lazy) => self.nested(d, &lazy.resolve(), path).map(Value::Object),
            Shape::List(_) => Err(MappingError::InvalidDescriptor {
                field: path.to_string(),
                message: "list shape outside a list field".to_string(),
            }),
        }
    }

    /// One element of a list field.
    fn element(&self, d: &Directive, element: &Shape, path: &str) -> Result<Value, MappingError> {
        let Shape::List(inner) = element else {
            return self.single(d, element, path);
        };
        // A list of lists: each directive's arguments form one inner list.
        no_block(d, path)?;
        let mut items = Vec::with_capacity(d.arguments.len());
        for arg in &d.arguments {
            let value = match inner.as_ref() {
                Shape::Scalar(kind) => coerce(arg, *kind, d, path)?,
                Shape::Enum(members) => resolve_member(arg, members, d, path)?,
                other => {
                    return Err(MappingError::InvalidDescriptor {
                        field: path.to_string(),
                        message: format!("inner list elements must be scalars, not {}", other),
                    })
                }
            };
            items.push(value);
        }
        Ok(Value::Array(items))
    }

    fn nested(
        &self,
        d: &Directive,
        descriptor: &Descriptor,
        path: &str,
    ) -> Result<Map<String, Value>, MappingError> {
        let (line, column) = line_col(d);
        let field = if path.is_empty() { d.name() } else { path };
        if !d.arguments.is_empty() {
            return Err(MappingError::WrongArity {
                field: field.to_string(),
                expected: 0,
                found: d.arguments.len(),
                line,
                column,
            });
        }
        let Some(block) = &d.block else {
            return Err(MappingError::MissingBlock {
                field: field.to_string(),
                line,
                column,
            });
        };
        self.object(&block.directives, descriptor, path)
    }

    fn only_argument<'d>(
        &self,
        d: &'d Directive,
        path: &str,
    ) -> Result<&'d Argument, MappingError> {
        no_block(d, path)?;
        match d.arguments.as_slice() {
            [arg] => Ok(arg),
            args => {
                let (line, column) = line_col(d);
                Err(MappingError::WrongArity {
                    field: path.to_string(),
                    expected: 1,
                    found: args.len(),
                    line,
                    column,
                })
            }
        }
    }
}

fn no_block(d: &Directive, path: &str) -> Result<(), MappingError> {
    if d.has_block() {
        let (line, column) = line_col(d);
        return Err(MappingError::UnexpectedBlock {
            field: path.to_string(),
            line,
            column,
        });
    }
    Ok(())
}

// ── Coercion ─────────────────────────────────────────────────────────

fn parse_bool(s: &str) -> Option<bool> {
    const TRUE: [&str; 4] = ["true", "yes", "on", "1"];
    const FALSE: [&str; 4] = ["false", "no", "off", "0"];
    if TRUE.iter().any(|t| t.eq_ignore_ascii_case(s)) {
        Some(true)
    } else if FALSE.iter().any(|f| f.eq_ignore_ascii_case(s)) {
        Some(false)
    } else {
        None
    }
}

fn coerce(
    arg: &Argument,
    kind: ScalarKind,
    d: &Directive,
    path: &str,
) -> Result<Value, MappingError> {
    let text = arg.as_str();
    let value = if arg.is_expression() {
        None
    } else {
        match kind {
            ScalarKind::String => Some(Value::String(text.to_string())),
            ScalarKind::Integer => i64::from_str(text).ok().map(Value::from),
            ScalarKind::Float => f64::from_str(text)
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number),
            ScalarKind::Boolean => parse_bool(text).map(Value::Bool),
            ScalarKind::Decimal => Decimal::from_str(text)
                .ok()
                .map(|n| Value::String(n.to_string())),
        }
    };
    value.ok_or_else(|| {
        let (line, column) = line_col(d);
        MappingError::Coercion {
            field: path.to_string(),
            value: text.to_string(),
            expected: kind.to_string(),
            line,
            column,
        }
    })
}

fn resolve_member(
    arg: &Argument,
    members: &EnumDescriptor,
    d: &Directive,
    path: &str,
) -> Result<Value, MappingError> {
    match members.resolve(arg.as_str()) {
        Some(member) if !arg.is_expression() => Ok(Value::String(member.to_string())),
        _ => {
            let (line, column) = line_col(d);
            Err(MappingError::UnknownEnumMember {
                field: path.to_string(),
                value: arg.as_str().to_string(),
                enum_name: members.name().to_string(),
                valid: members.members().map(str::to_string).collect(),
                line,
                column,
            })
        }
    }
}
