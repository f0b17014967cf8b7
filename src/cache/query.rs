//! Query-string building for list endpoints.

use url::form_urlencoded;

/// Value used by list filters to mean "no filter".
pub const ALL_FILTER: &str = "all";

/// One list filter, e.g. `status=confirmed`. A missing value means the
/// filter is unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParam {
    pub name: String,
    pub value: Option<String>,
}

impl QueryParam {
    pub fn new(name: impl Into<String>, value: impl ToString) -> Self {
        Self {
            name: name.into(),
            value: Some(value.to_string()),
        }
    }

    pub fn unset(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }
}

/// Encode filters in order, dropping unset ones and those set to `"all"`.
pub fn build_query(params: &[QueryParam]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for param in params {
        match param.value.as_deref() {
            Some(value) if value != ALL_FILTER => {
                serializer.append_pair(&param.name, value);
            }
            _ => {}
        }
    }
    serializer.finish()
}
