//! Identifier types for tables referenced in DDL and metadata.

use serde::{Serialize, Serializer};

/// SQL keywords that require quoting when a table name collides with them.
const SQL_RESERVED: &[&str] = &[
    "all",
    "alter",
    "and",
    "any",
    "as",
    "asc",
    "between",
    "by",
    "case",
    "cast",
    "check",
    "collate",
    "column",
    "constraint",
    "create",
    "cross",
    "current_date",
    "current_time",
    "current_timestamp",
    "default",
    "deferrable",
    "delete",
    "desc",
    "distinct",
    "drop",
    "else",
    "end",
    "except",
    "exists",
    "foreign",
    "from",
    "full",
    "grant",
    "group",
    "having",
    "in",
    "index",
    "inner",
    "insert",
    "intersect",
    "into",
    "is",
    "join",
    "key",
    "left",
    "like",
    "limit",
    "natural",
    "not",
    "null",
    "offset",
    "on",
    "or",
    "order",
    "outer",
    "primary",
    "references",
    "revoke",
    "right",
    "rollback",
    "row",
    "select",
    "set",
    "table",
    "then",
    "to",
    "transaction",
    "union",
    "unique",
    "update",
    "user",
    "using",
    "values",
    "when",
    "where",
    "with",
];

/// An identifier with both raw (original) and normalized forms.
///
/// Unquoted identifiers normalize to lowercase; quoted identifiers keep their
/// case. Equality and hashing compare the normalized form only, so `Orders`,
/// `orders` and `ORDERS` are the same table while `"Orders"` is not.
#[derive(Debug, Clone)]
pub struct Ident {
    /// Original form as written in source DDL.
    pub raw: String,
    /// Normalized form (lowercased for unquoted identifiers).
    pub normalized: String,
}

impl Ident {
    /// Create an identifier from an unquoted name (normalizes to lowercase).
    pub fn new(name: &str) -> Self {
        Self {
            raw: name.to_string(),
            normalized: name.to_lowercase(),
        }
    }

    /// Create an identifier from a quoted name (preserves case).
    pub fn quoted(name: &str) -> Self {
        Self {
            raw: name.to_string(),
            normalized: name.to_string(),
        }
    }

    /// Check if this identifier needs quoting when rendered into a statement.
    pub fn needs_quotes(&self) -> bool {
        let n = &self.normalized;

        if n.is_empty() {
            return true;
        }

        if n.starts_with(|c: char| c.is_ascii_digit()) {
            return true;
        }

        // Uppercase survives normalization only for quoted identifiers
        if n.chars().any(|c| c.is_ascii_uppercase()) {
            return true;
        }

        if n.chars().any(|c| !c.is_ascii_alphanumeric() && c != '_') {
            return true;
        }

        if SQL_RESERVED.contains(&n.as_str()) {
            return true;
        }

        false
    }

    /// Render the identifier for statement output, quoting if necessary.
    pub fn to_sql(&self) -> String {
        if self.needs_quotes() {
            format!("\"{}\"", self.normalized.replace('"', "\"\""))
        } else {
            self.normalized.clone()
        }
    }
}

impl PartialEq for Ident {
    fn eq(&self, other: &Self) -> bool {
        self.normalized == other.normalized
    }
}

impl Eq for Ident {}

impl std::hash::Hash for Ident {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.normalized.hash(state);
    }
}

impl std::fmt::Display for Ident {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.normalized)
    }
}

impl Serialize for Ident {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.normalized)
    }
}

/// A qualified table identity: optional catalog, optional schema, name.
///
/// Identity is fixed at creation and serves as the graph vertex key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub catalog: Option<Ident>,
    pub schema: Option<Ident>,
    pub name: Ident,
}

impl TableRef {
    pub fn new(name: Ident) -> Self {
        Self {
            catalog: None,
            schema: None,
            name,
        }
    }

    pub fn with_schema(schema: Ident, name: Ident) -> Self {
        Self {
            catalog: None,
            schema: Some(schema),
            name,
        }
    }

    pub fn with_catalog(catalog: Ident, schema: Ident, name: Ident) -> Self {
        Self {
            catalog: Some(catalog),
            schema: Some(schema),
            name,
        }
    }

    /// Parse a dotted, possibly quoted name: `users`, `public.users`,
    /// `db."Orders"`. Quoted parts keep their case.
    pub fn parse(input: &str) -> Self {
        fn part(s: &str) -> Ident {
            let s = s.trim();
            if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
                Ident::quoted(&s[1..s.len() - 1].replace("\"\"", "\""))
            } else {
                Ident::new(s)
            }
        }

        let parts: Vec<&str> = input.split('.').collect();
        match parts.len() {
            2 => TableRef::with_schema(part(parts[0]), part(parts[1])),
            3 => TableRef::with_catalog(part(parts[0]), part(parts[1]), part(parts[2])),
            _ => TableRef::new(part(input)),
        }
    }

    /// Render the qualified name for statement output, quoting parts as needed.
    pub fn to_sql(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", schema.to_sql(), self.name.to_sql()),
            None => self.name.to_sql(),
        }
    }
}

impl std::fmt::Display for TableRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(catalog) = &self.catalog {
            write!(f, "{catalog}.")?;
        }
        if let Some(schema) = &self.schema {
            write!(f, "{schema}.")?;
        }
        write!(f, "{}", self.name)
    }
}

impl Serialize for TableRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}
