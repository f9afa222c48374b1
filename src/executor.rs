use std::fmt;

use crate::client::{ClientError, HttpClient};
use crate::fixture::{FixtureError, TestCase};

/// Why a test case failed. Only the first mismatch of a case is reported.
#[derive(Debug)]
pub enum Failure {
    Unparseable(FixtureError),
    Network(ClientError),
    Status { expected: u16, actual: u16 },
    Header { name: String, expected: String, actual: String },
    Body { expected: String, actual: String },
}

impl Failure {
    pub fn reason(&self) -> String {
        match self {
            Failure::Unparseable(_) => "Could not parse test case".to_string(),
            Failure::Network(_) => "Request failed".to_string(),
            Failure::Status { .. } => "Incorrect status code".to_string(),
            Failure::Header { name, .. } => format!("Header mismatch for {}", name),
            Failure::Body { .. } => "Body does not match".to_string(),
        }
    }

    pub fn expected(&self) -> String {
        match self {
            Failure::Unparseable(_) => String::new(),
            Failure::Network(_) => "a response".to_string(),
            Failure::Status { expected, .. } => expected.to_string(),
            Failure::Header { expected, .. } | Failure::Body { expected, .. } => expected.clone(),
        }
    }

    pub fn actual(&self) -> String {
        match self {
            Failure::Unparseable(e) => e.to_string(),
            Failure::Network(e) => e.to_string(),
            Failure::Status { actual, .. } => actual.to_string(),
            Failure::Header { actual, .. } | Failure::Body { actual, .. } => actual.clone(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} (expected '{}', actual '{}')", self.reason(), self.expected(), self.actual())
    }
}

/// Runs one case and checks status, then headers, then body, stopping at
/// the first mismatch. Unparseable cases never touch the network.
pub fn execute(client: &mut HttpClient, case: &TestCase) -> Result<(), Failure> {
    let fixture = match case.fixture {
        Ok(ref fixture) => fixture,
        Err(ref e) => return Err(Failure::Unparseable(e.clone())),
    };

    debug!("{}: {} {}", case.name, fixture.request.method, fixture.request.target);
    let response = client.send(&fixture.request).map_err(Failure::Network)?;

    if response.status != fixture.expected.status {
        return Err(Failure::Status {
            expected: fixture.expected.status,
            actual: response.status,
        });
    }

    for (name, expected) in fixture.expected.headers.iter() {
        let actual = response
            .header(name)
            .map(|v| String::from_utf8_lossy(v).to_lowercase())
            .unwrap_or_default();
        if actual != *expected {
            return Err(Failure::Header {
                name: name.clone(),
                expected: expected.clone(),
                actual,
            });
        }
    }

    if !fixture.expected.body.is_empty() {
        let actual = response.body_text().trim().to_string();
        if actual != fixture.expected.body {
            return Err(Failure::Body {
                expected: fixture.expected.body.clone(),
                actual,
            });
        }
    }

    Ok(())
}
