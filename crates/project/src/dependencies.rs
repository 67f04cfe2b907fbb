//! Transitive fragment and type dependencies of a document.
//!
//! Both resolutions share one breadth-first walk. A [`ReferenceKind`] says
//! which definitions count as local and which names a definition refers to.
//! Records come out in first-discovery order, each name at most once.

use crate::index::{DefinitionMap, DefinitionRecord};
use apollo_compiler::ast;
use apollo_compiler::Name;
use std::collections::{HashSet, VecDeque};

/// What kind of reference a dependency walk follows.
pub trait ReferenceKind {
    /// Whether `definition` declares a name of this kind.
    fn declares(definition: &ast::Definition) -> bool;

    /// Appends the names `definition` refers to, in source order.
    fn references(definition: &ast::Definition, out: &mut Vec<Name>);
}

/// Follows `...Spread` references between fragments.
pub struct FragmentSpreads;

impl ReferenceKind for FragmentSpreads {
    fn declares(definition: &ast::Definition) -> bool {
        matches!(definition, ast::Definition::FragmentDefinition(_))
    }

    fn references(definition: &ast::Definition, out: &mut Vec<Name>) {
        let selections = match definition {
            ast::Definition::OperationDefinition(operation) => &operation.selection_set,
            ast::Definition::FragmentDefinition(fragment) => &fragment.selection_set,
            _ => return,
        };
        walk_selections(selections, |selection| {
            if let ast::Selection::FragmentSpread(spread) = selection {
                out.push(spread.fragment_name.clone());
            }
        });
    }
}

/// Follows references to named types: field, argument and input field types,
/// implemented interfaces, union members, variable types, type conditions and
/// schema root operation types.
pub struct NamedTypes;

impl ReferenceKind for NamedTypes {
    fn declares(definition: &ast::Definition) -> bool {
        matches!(
            definition,
            ast::Definition::ObjectTypeDefinition(_)
                | ast::Definition::InterfaceTypeDefinition(_)
                | ast::Definition::UnionTypeDefinition(_)
                | ast::Definition::EnumTypeDefinition(_)
                | ast::Definition::InputObjectTypeDefinition(_)
                | ast::Definition::ScalarTypeDefinition(_)
        )
    }

    fn references(definition: &ast::Definition, out: &mut Vec<Name>) {
        match definition {
            ast::Definition::OperationDefinition(operation) => {
                out.extend(
                    operation
                        .variables
                        .iter()
                        .map(|variable| variable.ty.inner_named_type().clone()),
                );
                type_conditions(&operation.selection_set, out);
            }
            ast::Definition::FragmentDefinition(fragment) => {
                out.push(fragment.type_condition.clone());
                type_conditions(&fragment.selection_set, out);
            }
            ast::Definition::ObjectTypeDefinition(object) => {
                out.extend(object.implements_interfaces.iter().cloned());
                field_types(&object.fields, out);
            }
            ast::Definition::ObjectTypeExtension(object) => {
                out.extend(object.implements_interfaces.iter().cloned());
                field_types(&object.fields, out);
            }
            ast::Definition::InterfaceTypeDefinition(interface) => {
                out.extend(interface.implements_interfaces.iter().cloned());
                field_types(&interface.fields, out);
            }
            ast::Definition::InterfaceTypeExtension(interface) => {
                out.extend(interface.implements_interfaces.iter().cloned());
                field_types(&interface.fields, out);
            }
            ast::Definition::UnionTypeDefinition(union_) => {
                out.extend(union_.members.iter().cloned());
            }
            ast::Definition::UnionTypeExtension(union_) => {
                out.extend(union_.members.iter().cloned());
            }
            ast::Definition::InputObjectTypeDefinition(input) => {
                input_value_types(&input.fields, out);
            }
            ast::Definition::InputObjectTypeExtension(input) => {
                input_value_types(&input.fields, out);
            }
            ast::Definition::DirectiveDefinition(directive) => {
                input_value_types(&directive.arguments, out);
            }
            ast::Definition::SchemaDefinition(schema) => {
                out.extend(schema.root_operations.iter().map(|root| root.1.clone()));
            }
            ast::Definition::SchemaExtension(schema) => {
                out.extend(schema.root_operations.iter().map(|root| root.1.clone()));
            }
            _ => {}
        }
    }
}

fn field_types(fields: &[apollo_compiler::Node<ast::FieldDefinition>], out: &mut Vec<Name>) {
    for field in fields {
        input_value_types(&field.arguments, out);
        out.push(field.ty.inner_named_type().clone());
    }
}

fn input_value_types(
    values: &[apollo_compiler::Node<ast::InputValueDefinition>],
    out: &mut Vec<Name>,
) {
    out.extend(values.iter().map(|value| value.ty.inner_named_type().clone()));
}

fn type_conditions(selections: &[ast::Selection], out: &mut Vec<Name>) {
    walk_selections(selections, |selection| {
        if let ast::Selection::InlineFragment(inline) = selection {
            out.extend(inline.type_condition.iter().cloned());
        }
    });
}

/// Visits every selection, nested ones included, in source order.
fn walk_selections<'a>(selections: &'a [ast::Selection], mut visit: impl FnMut(&'a ast::Selection)) {
    let mut stack: Vec<&ast::Selection> = selections.iter().rev().collect();
    while let Some(selection) = stack.pop() {
        visit(selection);
        let nested = match selection {
            ast::Selection::Field(field) => &field.selection_set,
            ast::Selection::InlineFragment(inline) => &inline.selection_set,
            ast::Selection::FragmentSpread(_) => continue,
        };
        stack.extend(nested.iter().rev());
    }
}

/// Every definition in `index` reachable from `document` through references
/// of kind `K`.
///
/// Names the document declares itself and names missing from the index are
/// skipped.
pub fn resolve_dependencies<K: ReferenceKind>(
    document: &ast::Document,
    index: &DefinitionMap,
) -> Vec<DefinitionRecord> {
    let mut visited: HashSet<Name> = document
        .definitions
        .iter()
        .filter(|definition| K::declares(definition))
        .filter_map(|definition| definition.name().cloned())
        .collect();

    let mut pending = Vec::new();
    for definition in &document.definitions {
        K::references(definition, &mut pending);
    }
    let mut queue = VecDeque::from(pending);

    let mut found = Vec::new();
    let mut pending = Vec::new();
    while let Some(name) = queue.pop_front() {
        if !visited.insert(name.clone()) {
            continue;
        }
        let Some(record) = index.get(name.as_str()) else {
            continue;
        };
        K::references(&record.definition, &mut pending);
        queue.extend(pending.drain(..));
        found.push(record.clone());
    }
    found
}

/// Fragments `document` spreads, directly or through other fragments.
#[must_use]
pub fn fragment_dependencies(
    document: &ast::Document,
    fragments: &DefinitionMap,
) -> Vec<DefinitionRecord> {
    resolve_dependencies::<FragmentSpreads>(document, fragments)
}

/// Named types `document` refers to, directly or through other types.
#[must_use]
pub fn object_type_dependencies(
    document: &ast::Document,
    types: &DefinitionMap,
) -> Vec<DefinitionRecord> {
    resolve_dependencies::<NamedTypes>(document, types)
}

/// Parses `source` and resolves its fragment dependencies. Unparsable
/// sources have none.
#[must_use]
pub fn fragment_dependencies_for_source(
    source: &str,
    fragments: &DefinitionMap,
) -> Vec<DefinitionRecord> {
    parse(source).map_or_else(Vec::new, |document| fragment_dependencies(&document, fragments))
}

/// Parses `source` and resolves its type dependencies. Unparsable sources
/// have none.
#[must_use]
pub fn object_type_dependencies_for_source(
    source: &str,
    types: &DefinitionMap,
) -> Vec<DefinitionRecord> {
    parse(source).map_or_else(Vec::new, |document| object_type_dependencies(&document, types))
}

fn parse(source: &str) -> Option<ast::Document> {
    match ast::Document::parse(source, "document.graphql") {
        Ok(document) => Some(document),
        Err(with_errors) => {
            tracing::debug!(
                errors = with_errors.errors.len(),
                "document has syntax errors, no dependencies resolved"
            );
            None
        }
    }
}
