//! Types shared between the classifier client core and its front-ends.

pub mod domain;
pub mod error;
pub mod protocol;

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod domain_tests;

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod protocol_tests;
