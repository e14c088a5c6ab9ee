/// Outcome of a successful request.
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    pub(crate) data: Option<T>,
    pub(crate) raw: String,
    pub(crate) status: u16,
}

impl<T> ApiResponse<T> {
    /// Decoded body; `None` for requests built with `without_response`.
    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    /// Take the decoded body out of the response.
    pub fn into_data(self) -> Option<T> {
        self.data
    }

    /// Body text as received.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// HTTP status code of the response.
    pub fn status(&self) -> u16 {
        self.status
    }
}
