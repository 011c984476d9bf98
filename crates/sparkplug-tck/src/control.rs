//! Test control commands received on the control topic.
//!
//! ```text
//! NEW_TEST <profile> <test> [param ...]
//! END_TEST
//! ```

use crate::error::{Result, TckError};
use crate::scenario::ScenarioDescriptor;
use std::fmt;
use std::str::FromStr;

const NEW_TEST: &str = "NEW_TEST";
const END_TEST: &str = "END_TEST";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlCommand {
    NewTest(ScenarioDescriptor),
    EndTest,
}

impl ControlCommand {
    pub fn parse(payload: &str) -> Result<Self> {
        let mut words = payload.split_whitespace();
        match words.next() {
            Some(NEW_TEST) => {
                let (Some(profile), Some(name)) = (words.next(), words.next()) else {
                    return Err(TckError::InvalidControlCommand(format!(
                        "{NEW_TEST} requires a profile and a test name: {payload:?}"
                    )));
                };
                Ok(ControlCommand::NewTest(ScenarioDescriptor::new(
                    profile,
                    name,
                    words.map(str::to_string).collect(),
                )))
            }
            Some(END_TEST) => Ok(ControlCommand::EndTest),
            Some(other) => Err(TckError::InvalidControlCommand(format!(
                "unknown command {other:?}"
            ))),
            None => Err(TckError::InvalidControlCommand(
                "empty control message".to_string(),
            )),
        }
    }
}

impl FromStr for ControlCommand {
    type Err = TckError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlCommand::NewTest(descriptor) => {
                write!(f, "{NEW_TEST} {} {}", descriptor.profile, descriptor.name)?;
                for param in &descriptor.params {
                    write!(f, " {param}")?;
                }
                Ok(())
            }
            ControlCommand::EndTest => f.write_str(END_TEST),
        }
    }
}
