use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct HookModel {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub display_name: String,
}

/// Status-line input handed over stdin by the host session.
/// Every field is optional; unknown fields are ignored.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct HookInput {
    pub session_id: Option<String>,
    pub transcript_path: Option<String>,
    pub cwd: Option<String>,
    pub model: Option<HookModel>,
}
