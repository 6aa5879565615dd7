// Command parameter shaping
//
// Each appliance command has two parameter shapes. The v2 JSON body comes
// from the type's `Serialize` impl (merged with `cmd` and credentials by
// `Body`); the v1 query string comes from `Params::query`, whose keys and
// omission rules differ from the JSON ones.

use serde::Serialize;

/// Parameters of one appliance command.
pub(crate) trait Params: Serialize + Sync {
    /// Legacy query-string parameters, in order. Credentials are added by
    /// the client.
    fn query(&self) -> Query;
}

/// Ordered legacy query-string builder.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct Query(Vec<(&'static str, String)>);

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always send `key`.
    pub fn with(mut self, key: &'static str, value: impl ToString) -> Self {
        self.0.push((key, value.to_string()));
        self
    }

    /// Send `key` only when `value` is non-empty.
    pub fn with_nonempty(self, key: &'static str, value: &str) -> Self {
        if value.is_empty() {
            self
        } else {
            self.with(key, value)
        }
    }

    /// Send `key` only when `value` is non-zero.
    pub fn with_nonzero(self, key: &'static str, value: u64) -> Self {
        if value == 0 { self } else { self.with(key, value) }
    }

    pub fn pairs(&self) -> &[(&'static str, String)] {
        &self.0
    }
}

/// v2 request body: command, credentials, then the command's own fields.
#[derive(Serialize)]
pub(crate) struct Body<'a, P> {
    pub cmd: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apikey: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apiuser: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apipass: Option<&'a str>,
    #[serde(flatten)]
    pub params: &'a P,
}

/// A command without parameters (`listvs`).
#[derive(Debug, Serialize)]
pub(crate) struct NoParams {}

impl Params for NoParams {
    fn query(&self) -> Query {
        Query::new()
    }
}

pub(crate) fn is_zero<T: Default + PartialEq>(value: &T) -> bool {
    *value == T::default()
}

pub(crate) fn is_empty(value: &&str) -> bool {
    value.is_empty()
}
