#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Code {
    Ok200,
    BadRequest400,
    NotFound404,
    MethodNotAllowed405,
    InternalServerError500,
}

impl Code {
    pub fn as_u16(&self) -> u16 {
        match *self {
            Code::Ok200 => 200,
            Code::BadRequest400 => 400,
            Code::NotFound404 => 404,
            Code::MethodNotAllowed405 => 405,
            Code::InternalServerError500 => 500,
        }
    }

    pub fn reason(&self) -> &'static str {
        match *self {
            Code::Ok200 => "OK",
            Code::BadRequest400 => "Bad Request",
            Code::NotFound404 => "Not Found",
            Code::MethodNotAllowed405 => "Method Not Allowed",
            Code::InternalServerError500 => "Internal Server Error",
        }
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason())
    }
}
