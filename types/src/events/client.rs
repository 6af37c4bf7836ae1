/// `response.cancel` event, sent when the user barges in while the
/// assistant is speaking so the server truncates the in-flight response.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ResponseCancelEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_id: Option<String>,
}

impl ResponseCancelEvent {
    pub fn new() -> Self {
        Self { response_id: None }
    }

    pub fn with_response_id(mut self, response_id: &str) -> Self {
        self.response_id = Some(response_id.to_string());
        self
    }

    pub fn response_id(&self) -> Option<&str> {
        self.response_id.as_deref()
    }
}

impl Default for ResponseCancelEvent {
    fn default() -> Self {
        Self::new()
    }
}
