//! Shared schema and document sources.

use graphql_introspect::{IntrospectionResponse, IntrospectionSchema};

/// A schema that uses the `@cached` directive from [`CUSTOM_DIRECTIVES`].
pub const SCHEMA: &str = r#"
type Query {
  hero(episode: Episode): Character @cached(ttl: 60)
  animals: [Animal!]!
}

enum Episode {
  NEWHOPE
  EMPIRE
}

interface Character {
  id: ID!
  name: String
}

union Animal = Duck | Cat

type Duck {
  cuack: String
}

type Cat {
  meow: String
}
"#;

pub const CUSTOM_DIRECTIVES: &str = "directive @cached(ttl: Int) on FIELD_DEFINITION\n";

pub const FRAGMENTS: &str = r"
fragment Duck on Duck {
  cuack
}

fragment Cat on Cat {
  meow
}
";

pub const TEST_FRAGMENT: &str = "fragment testFragment on Character {\n  id\n}\n";

/// Introspection JSON of a schema with a single `ping` query field, as a
/// GraphQL server would return it.
pub fn introspection_json() -> serde_json::Value {
    serde_json::json!({
        "data": { "__schema": {
            "queryType": { "name": "Query" },
            "mutationType": null,
            "subscriptionType": null,
            "types": [
                {
                    "kind": "OBJECT", "name": "Query", "description": null, "interfaces": [],
                    "fields": [{
                        "name": "ping", "description": null, "args": [],
                        "type": { "kind": "SCALAR", "name": "String", "ofType": null },
                        "isDeprecated": false, "deprecationReason": null
                    }]
                },
                { "kind": "SCALAR", "name": "String", "description": null }
            ],
            "directives": []
        } }
    })
}

pub fn introspection_schema() -> IntrospectionSchema {
    serde_json::from_value::<IntrospectionResponse>(introspection_json())
        .expect("fixture is a valid response")
        .into_schema()
        .expect("fixture has data")
}
