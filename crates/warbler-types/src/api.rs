use serde::{Deserialize, Serialize};

/// Claims carried by the session cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Id of the logged-in user.
    pub sub: i64,
    pub exp: usize,
}

/// A one-shot notice shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flash {
    pub category: String,
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}
