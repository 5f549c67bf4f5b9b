use std::fmt;

/// HTTP response status code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct StatusCode(u16);

impl StatusCode {
    /// Create a status code from its numeric value.
    #[inline]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Get the numeric value of the status code.
    #[inline]
    pub const fn code(self) -> u16 {
        self.0
    }

    /// 200 OK.
    pub const OK: StatusCode = StatusCode(200);

    /// 201 Created.
    pub const CREATED: StatusCode = StatusCode(201);

    /// 204 No Content.
    pub const NO_CONTENT: StatusCode = StatusCode(204);

    /// 304 Not Modified.
    pub const NOT_MODIFIED: StatusCode = StatusCode(304);

    /// 400 Bad Request.
    pub const BAD_REQUEST: StatusCode = StatusCode(400);

    /// 404 Not Found.
    pub const NOT_FOUND: StatusCode = StatusCode(404);

    /// 500 Internal Server Error.
    pub const INTERNAL_SERVER_ERROR: StatusCode = StatusCode(500);

    /// Whether the status is in the 1xx range.
    #[inline]
    pub const fn is_informational(&self) -> bool {
        matches!(self.0, 100..=199)
    }

    /// Whether the status is in the 2xx range.
    #[inline]
    pub const fn is_successful(&self) -> bool {
        matches!(self.0, 200..=299)
    }

    /// Whether the status is in the 3xx range.
    #[inline]
    pub const fn is_redirection(&self) -> bool {
        matches!(self.0, 300..=399)
    }

    /// Whether the status is in the 4xx range.
    #[inline]
    pub const fn is_client_error(&self) -> bool {
        matches!(self.0, 400..=499)
    }

    /// Whether the status is in the 5xx range.
    #[inline]
    pub const fn is_server_error(&self) -> bool {
        matches!(self.0, 500..=599)
    }

    /// Whether the status is 400 or above.
    ///
    /// Responses in this range deliver their body on the error stream rather
    /// than the regular input stream.
    #[inline]
    pub const fn is_error(&self) -> bool {
        self.0 >= 400
    }
}

impl From<u16> for StatusCode {
    #[inline]
    fn from(code: u16) -> Self {
        Self::new(code)
    }
}

impl From<StatusCode> for u16 {
    #[inline]
    fn from(code: StatusCode) -> Self {
        code.0
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl PartialEq<u16> for StatusCode {
    #[inline]
    fn eq(&self, other: &u16) -> bool {
        self.code() == *other
    }
}

impl PartialEq<StatusCode> for u16 {
    #[inline]
    fn eq(&self, other: &StatusCode) -> bool {
        *self == other.code()
    }
}
