#![forbid(unsafe_code)]

pub mod config;
pub mod datamodel;
pub mod gateway;
pub mod http;
pub mod lint;
pub mod parsing;
pub mod proxy;
pub mod validation;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
