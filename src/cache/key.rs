//! Cache key derivation for statement results.

use std::fmt;

use serde::Serialize;

use crate::error::Result;
use crate::statement::RowWindow;

/// Identity of one statement execution: statement id, parameter and window.
///
/// Keys are the canonical JSON encoding of those parts, so equal inputs give
/// equal keys and different windows over the same query never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

#[derive(Serialize)]
struct KeyParts<'a, P: ?Sized> {
    statement: &'a str,
    parameter: &'a P,
    offset: Option<usize>,
    limit: Option<usize>,
}

impl CacheKey {
    pub fn new<P: Serialize + ?Sized>(
        statement_id: &str,
        parameter: &P,
        window: Option<RowWindow>,
    ) -> Result<Self> {
        let parts = KeyParts {
            statement: statement_id,
            parameter,
            offset: window.map(|w| w.offset),
            limit: window.map(|w| w.limit),
        };
        Ok(Self(serde_json::to_string(&parts)?))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
