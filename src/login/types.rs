use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub authenticated: bool,
    pub email: Option<String>,
    pub message: String,
}
