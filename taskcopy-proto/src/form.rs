//! Form encoding for Conduit request bodies.
//!
//! Conduit accepts `application/x-www-form-urlencoded` bodies in which
//! nested values are flattened into bracketed keys: a list under
//! `projects` becomes `projects[0]`, `projects[1]`, and a map entry `type`
//! under `transactions[0]` becomes `transactions[0][type]`. Nesting
//! recurses to any depth.

use url::form_urlencoded;

/// Name of the credential field prepended to every request body.
pub const TOKEN_FIELD: &str = "api.token";

/// A parameter value: a string, an indexed sequence, or a keyed mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    /// A single string value.
    Scalar(String),
    /// Values flattened as `key[0]`, `key[1]`, ...
    List(Vec<FormValue>),
    /// Values flattened as `key[name]`, in insertion order.
    Map(Vec<(String, FormValue)>),
}

impl FormValue {
    /// Creates a scalar value.
    pub fn scalar(value: impl Into<String>) -> Self {
        Self::Scalar(value.into())
    }

    /// Creates a list value from anything convertible into form values.
    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Self>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Creates a map value from `(name, value)` pairs.
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Self>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }

    fn flatten_into(&self, key: &str, out: &mut Vec<(String, String)>) {
        match self {
            Self::Scalar(value) => out.push((key.to_string(), value.clone())),
            Self::List(items) => {
                for (index, item) in items.iter().enumerate() {
                    item.flatten_into(&format!("{key}[{index}]"), out);
                }
            }
            Self::Map(entries) => {
                for (name, item) in entries {
                    item.flatten_into(&format!("{key}[{name}]"), out);
                }
            }
        }
    }
}

impl From<String> for FormValue {
    fn from(value: String) -> Self {
        Self::Scalar(value)
    }
}

impl From<&str> for FormValue {
    fn from(value: &str) -> Self {
        Self::Scalar(value.to_string())
    }
}

impl From<&String> for FormValue {
    fn from(value: &String) -> Self {
        Self::Scalar(value.clone())
    }
}

/// Ordered set of top-level request parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(String, FormValue)>,
}

impl Params {
    /// Creates an empty parameter set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FormValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Appends a parameter. Keys are not deduplicated.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FormValue>) {
        self.entries.push((key.into(), value.into()));
    }

    /// Returns `true` if no parameters have been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flattens every parameter into `(key, value)` string pairs.
    #[must_use]
    pub fn flatten(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        for (key, value) in &self.entries {
            value.flatten_into(key, &mut out);
        }
        out
    }

    /// Encodes the parameters as a form body, with `api.token` first.
    #[must_use]
    pub fn encode(&self, token: &str) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        serializer.append_pair(TOKEN_FIELD, token);
        for (key, value) in self.flatten() {
            serializer.append_pair(&key, &value);
        }
        serializer.finish()
    }
}

/// Decodes a form body back into `(key, value)` pairs, in body order.
#[must_use]
pub fn decode(body: &str) -> Vec<(String, String)> {
    form_urlencoded::parse(body.as_bytes()).into_owned().collect()
}
