#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ident {
    pub value: String,
    pub quoted: bool,
}

impl Ident {
    pub fn quoted(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            quoted: true,
        }
    }

    pub fn unquoted(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            quoted: false,
        }
    }

    /// Case-folded form used for name matching; rendering always uses `value`.
    pub fn fold(&self) -> String {
        self.value.to_lowercase()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct QualifiedName {
    pub schema: Option<Ident>,
    pub name: Ident,
}

impl QualifiedName {
    pub fn unqualified(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: Ident::unquoted(name),
        }
    }

    pub fn in_schema(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: Some(Ident::unquoted(schema)),
            name: Ident::unquoted(name),
        }
    }

    /// Case-folded `schema.name` key used for name-set comparison; `dbo` is
    /// assumed when the schema is unspecified so `dbo.foo` and `foo` match.
    pub fn fold(&self) -> String {
        let schema = self
            .schema
            .as_ref()
            .map(Ident::fold)
            .unwrap_or_else(|| "dbo".to_string());
        format!("{schema}.{}", self.name.fold())
    }
}
