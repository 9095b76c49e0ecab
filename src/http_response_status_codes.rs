//! The few HTTP response status codes the server produces.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpResponseStatusCode {
    NotFound404,
    InternalServerError500,
}

impl HttpResponseStatusCode {
    pub fn code(self) -> u16 {
        match self {
            HttpResponseStatusCode::NotFound404 => 404,
            HttpResponseStatusCode::InternalServerError500 => 500,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            HttpResponseStatusCode::NotFound404 => "Not Found",
            HttpResponseStatusCode::InternalServerError500 => "Internal Server Error",
        }
    }
}
