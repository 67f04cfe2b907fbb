//! Rendering an introspected schema back into SDL.

use crate::types::{
    CompositeType, IntrospectionField, IntrospectionInputValue, IntrospectionSchema,
    IntrospectionType, NamedTypeRef,
};
use std::fmt::{self, Write};

/// Scalars every GraphQL schema defines implicitly.
const BUILTIN_SCALARS: &[&str] = &["Int", "Float", "String", "Boolean", "ID"];

/// Directives every GraphQL schema defines implicitly.
pub const BUILTIN_DIRECTIVES: &[&str] = &["skip", "include", "deprecated", "specifiedBy", "oneOf"];

/// Converts an introspected schema into SDL text.
///
/// Built-in scalars and directives and `__`-prefixed introspection types are
/// left out so the output can be parsed into a fresh schema without
/// redefinition errors. A `schema { ... }` block is only emitted when a root
/// operation type has a non-default name.
#[must_use]
#[tracing::instrument(skip(schema), fields(types = schema.types.len(), directives = schema.directives.len()))]
pub fn introspection_to_sdl(schema: &IntrospectionSchema) -> String {
    let sdl = Sdl(schema).to_string();
    tracing::debug!(sdl_length = sdl.len(), "rendered introspection as SDL");
    sdl
}

struct Sdl<'a>(&'a IntrospectionSchema);

impl fmt::Display for Sdl<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let schema = self.0;
        let mut blocks: Vec<String> = Vec::new();

        let roots = [
            ("query", schema.query_type.as_ref(), "Query"),
            ("mutation", schema.mutation_type.as_ref(), "Mutation"),
            ("subscription", schema.subscription_type.as_ref(), "Subscription"),
        ];
        if roots
            .iter()
            .any(|(_, ty, default)| ty.is_some_and(|t| t.name != *default))
        {
            let mut block = String::from("schema {\n");
            for (operation, ty, _) in roots {
                if let Some(ty) = ty {
                    writeln!(block, "  {operation}: {}", ty.name)?;
                }
            }
            block.push('}');
            blocks.push(block);
        }

        for directive in &schema.directives {
            if BUILTIN_DIRECTIVES.contains(&directive.name.as_str()) {
                continue;
            }
            let mut block = String::new();
            description(&mut block, directive.description.as_deref(), "")?;
            write!(block, "directive @{}", directive.name)?;
            arguments(&mut block, &directive.args)?;
            write!(block, " on {}", directive.locations.join(" | "))?;
            blocks.push(block);
        }

        for ty in &schema.types {
            let name = ty.name();
            if name.starts_with("__") || BUILTIN_SCALARS.contains(&name) {
                continue;
            }
            let mut block = String::new();
            type_definition(&mut block, ty)?;
            blocks.push(block);
        }

        f.write_str(&blocks.join("\n\n"))
    }
}

fn type_definition(out: &mut String, ty: &IntrospectionType) -> fmt::Result {
    match ty {
        IntrospectionType::Scalar(scalar) => {
            description(out, scalar.description.as_deref(), "")?;
            write!(out, "scalar {}", scalar.name)
        }
        IntrospectionType::Object(object) => composite(out, "type", object),
        IntrospectionType::Interface(interface) => composite(out, "interface", interface),
        IntrospectionType::Union(union) => {
            description(out, union.description.as_deref(), "")?;
            write!(out, "union {}", union.name)?;
            if !union.possible_types.is_empty() {
                write!(out, " = {}", join_names(&union.possible_types, " | "))?;
            }
            Ok(())
        }
        IntrospectionType::Enum(enum_type) => {
            description(out, enum_type.description.as_deref(), "")?;
            writeln!(out, "enum {} {{", enum_type.name)?;
            for value in &enum_type.enum_values {
                description(out, value.description.as_deref(), "  ")?;
                write!(out, "  {}", value.name)?;
                deprecation(out, value.is_deprecated, value.deprecation_reason.as_deref())?;
                out.push('\n');
            }
            out.push('}');
            Ok(())
        }
        IntrospectionType::InputObject(input) => {
            description(out, input.description.as_deref(), "")?;
            writeln!(out, "input {} {{", input.name)?;
            for field in &input.input_fields {
                description(out, field.description.as_deref(), "  ")?;
                out.push_str("  ");
                input_value(out, field)?;
                out.push('\n');
            }
            out.push('}');
            Ok(())
        }
    }
}

fn composite(out: &mut String, keyword: &str, ty: &CompositeType) -> fmt::Result {
    description(out, ty.description.as_deref(), "")?;
    write!(out, "{keyword} {}", ty.name)?;
    if !ty.interfaces.is_empty() {
        write!(out, " implements {}", join_names(&ty.interfaces, " & "))?;
    }
    out.push_str(" {\n");
    for field in &ty.fields {
        field_definition(out, field)?;
    }
    out.push('}');
    Ok(())
}

fn field_definition(out: &mut String, field: &IntrospectionField) -> fmt::Result {
    description(out, field.description.as_deref(), "  ")?;
    write!(out, "  {}", field.name)?;
    arguments(out, &field.args)?;
    write!(out, ": {}", field.type_ref)?;
    deprecation(out, field.is_deprecated, field.deprecation_reason.as_deref())?;
    out.push('\n');
    Ok(())
}

fn arguments(out: &mut String, args: &[IntrospectionInputValue]) -> fmt::Result {
    if args.is_empty() {
        return Ok(());
    }
    out.push('(');
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        input_value(out, arg)?;
    }
    out.push(')');
    Ok(())
}

fn input_value(out: &mut String, value: &IntrospectionInputValue) -> fmt::Result {
    write!(out, "{}: {}", value.name, value.type_ref)?;
    if let Some(default) = &value.default_value {
        write!(out, " = {default}")?;
    }
    Ok(())
}

fn deprecation(out: &mut String, deprecated: bool, reason: Option<&str>) -> fmt::Result {
    match (deprecated, reason) {
        (false, _) => Ok(()),
        (true, Some(reason)) => write!(out, " @deprecated(reason: \"{}\")", escape(reason)),
        (true, None) => {
            out.push_str(" @deprecated");
            Ok(())
        }
    }
}

fn description(out: &mut String, text: Option<&str>, indent: &str) -> fmt::Result {
    match text {
        None => Ok(()),
        Some(text) if text.contains('\n') => writeln!(
            out,
            "{indent}\"\"\"\n{}\n{indent}\"\"\"",
            text.replace("\"\"\"", "\\\"\"\"")
        ),
        Some(text) => writeln!(out, "{indent}\"{}\"", escape(text)),
    }
}

fn join_names(names: &[NamedTypeRef], separator: &str) -> String {
    names
        .iter()
        .map(|n| n.name.as_str())
        .collect::<Vec<_>>()
        .join(separator)
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(value: serde_json::Value) -> IntrospectionSchema {
        serde_json::from_value(value).unwrap()
    }

    fn string_ref() -> serde_json::Value {
        serde_json::json!({ "kind": "SCALAR", "name": "String", "ofType": null })
    }

    #[test]
    fn skips_builtins_and_introspection_types() {
        let sdl = introspection_to_sdl(&schema(serde_json::json!({
            "queryType": { "name": "Query" },
            "mutationType": null,
            "subscriptionType": null,
            "types": [
                { "kind": "SCALAR", "name": "String", "description": null },
                { "kind": "OBJECT", "name": "__Schema", "description": null, "fields": [], "interfaces": [] },
                { "kind": "OBJECT", "name": "Query", "description": null, "interfaces": [],
                  "fields": [{ "name": "hello", "description": null, "args": [],
                               "type": string_ref(), "isDeprecated": false, "deprecationReason": null }] }
            ],
            "directives": [
                { "name": "skip", "description": null, "locations": ["FIELD"], "args": [] },
                { "name": "oneOf", "description": null, "locations": ["INPUT_OBJECT"], "args": [] },
                { "name": "auth", "description": null, "locations": ["FIELD_DEFINITION", "OBJECT"],
                  "args": [{ "name": "role", "description": null, "type": string_ref(), "defaultValue": "\"USER\"" }] }
            ]
        })));

        assert_eq!(
            sdl,
            "directive @auth(role: String = \"USER\") on FIELD_DEFINITION | OBJECT\n\n\
             type Query {\n  hello: String\n}"
        );
    }

    #[test]
    fn emits_schema_block_for_renamed_roots() {
        let sdl = introspection_to_sdl(&schema(serde_json::json!({
            "queryType": { "name": "RootQuery" },
            "mutationType": null,
            "subscriptionType": null,
            "types": [],
            "directives": []
        })));
        assert_eq!(sdl, "schema {\n  query: RootQuery\n}");
    }

    #[test]
    fn renders_enums_unions_and_inputs() {
        let sdl = introspection_to_sdl(&schema(serde_json::json!({
            "queryType": null,
            "mutationType": null,
            "subscriptionType": null,
            "types": [
                { "kind": "ENUM", "name": "Episode", "description": "Film", "enumValues": [
                    { "name": "NEWHOPE", "description": null, "isDeprecated": false, "deprecationReason": null },
                    { "name": "JEDI", "description": null, "isDeprecated": true, "deprecationReason": "Use \"RETURN\"" }
                ] },
                { "kind": "UNION", "name": "SearchResult", "description": null,
                  "possibleTypes": [{ "name": "Human" }, { "name": "Droid" }] },
                { "kind": "INPUT_OBJECT", "name": "ReviewInput", "description": null, "inputFields": [
                    { "name": "stars", "description": null, "defaultValue": "5",
                      "type": { "kind": "NON_NULL", "name": null, "ofType": { "kind": "SCALAR", "name": "Int", "ofType": null } } }
                ] }
            ],
            "directives": []
        })));

        assert_eq!(
            sdl,
            "\"Film\"\nenum Episode {\n  NEWHOPE\n  JEDI @deprecated(reason: \"Use \\\"RETURN\\\"\")\n}\n\n\
             union SearchResult = Human | Droid\n\n\
             input ReviewInput {\n  stars: Int! = 5\n}"
        );
    }

    #[test]
    fn escape_handles_quotes_backslashes_and_newlines() {
        assert_eq!(escape("plain"), "plain");
        assert_eq!(escape("say \"hi\""), "say \\\"hi\\\"");
        assert_eq!(escape("a\nb"), "a\\nb");
        assert_eq!(escape("C:\\tmp"), "C:\\\\tmp");
    }
}
