use std::io::Write;

use url::Url;

use crate::client::HttpClient;
use crate::config::RunnerConfig;
use crate::discovery;
use crate::error::Error;
use crate::executor::{self, Failure};
use crate::fixture::{self, TestCase};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub passed: usize,
    pub failed: usize,
}

impl Summary {
    pub fn success(&self) -> bool {
        self.failed == 0
    }
}

/// Discovers, parses and executes every fixture in turn, writing one report
/// per case to `out`. Discovery and read errors abort the run.
pub fn run<W: Write>(config: &RunnerConfig, out: &mut W) -> Result<Summary, Error> {
    let base = Url::parse(&config.base_url)?;
    let paths = discovery::walk_match(&config.tests, &config.pattern)?;
    info!("running {} fixtures from {} against {}", paths.len(), config.tests.display(), base);

    let mut client = HttpClient::new();
    let mut summary = Summary::default();

    for path in paths {
        let case = fixture::load(&path, &base)?;
        match executor::execute(&mut client, &case) {
            Ok(()) => {
                summary.passed += 1;
                report_pass(out, &case)?;
            }
            Err(failure) => {
                summary.failed += 1;
                report_failure(out, &case, &failure)?;
            }
        }
    }

    if summary.failed > 0 {
        write!(out, "\n\n{} Errors caught\n", summary.failed)?;
    }
    out.flush()?;
    Ok(summary)
}

pub fn report_pass<W: Write>(out: &mut W, case: &TestCase) -> Result<(), Error> {
    writeln!(out, "✓ API:{}", case.name)?;
    Ok(())
}

pub fn report_failure<W: Write>(out: &mut W, case: &TestCase, failure: &Failure) -> Result<(), Error> {
    warn!("{}: {}", case.name, failure);
    write!(
        out,
        "✘ {}: Failed because '{}'\n\tExpected: '{}'\n\tActual: '{}'\n",
        case.name,
        failure.reason(),
        failure.expected(),
        failure.actual())?;
    Ok(())
}
