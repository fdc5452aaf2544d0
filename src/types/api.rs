use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct SavePaste {
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub heading: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SavedPaste {
    pub url: String,
}
