#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpStatus {
    Ok = 200,
    Created = 201,

    BadRequest = 400,
    NotFound = 404,
    RequestTimeout = 408,
    LengthRequired = 411,
    PayloadTooLarge = 413,
    UriTooLong = 414,
    RequestHeaderFieldsTooLarge = 431,

    InternalServerError = 500,
    NotImplemented = 501,
    BadGateway = 502,
    GatewayTimeout = 504,
    HttpVersionNotSupported = 505,
}

impl HttpStatus {
    pub fn code(self) -> u16 {
        self as u16
    }

    /// Canonical reason phrase written on the status line.
    pub fn reason(self) -> &'static str {
        match self {
            HttpStatus::Ok => "OK",                                                     // 200
            HttpStatus::Created => "Created",                                           // 201
            HttpStatus::BadRequest => "Bad Request",                                    // 400
            HttpStatus::NotFound => "Not Found",                                        // 404
            HttpStatus::RequestTimeout => "Request Timeout",                            // 408
            HttpStatus::LengthRequired => "Length Required",                            // 411
            HttpStatus::PayloadTooLarge => "Payload Too Large",                         // 413
            HttpStatus::UriTooLong => "URI Too Long",                                   // 414
            HttpStatus::RequestHeaderFieldsTooLarge => "Request Header Fields Too Large", // 431
            HttpStatus::InternalServerError => "Internal Server Error",                 // 500
            HttpStatus::NotImplemented => "Not Implemented",                            // 501
            HttpStatus::BadGateway => "Bad Gateway",                                    // 502
            HttpStatus::GatewayTimeout => "Gateway Timeout",                            // 504
            HttpStatus::HttpVersionNotSupported => "HTTP Version Not Supported",        // 505
        }
    }
}

impl std::fmt::Display for HttpStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.code(), self.reason())
    }
}
