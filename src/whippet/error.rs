/*
 * Copyright (c) Facebook, Inc. and its affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */
use thiserror::Error;

pub type BTWResult<T> = std::result::Result<T, BTWError>;

#[derive(Debug, Error)]
pub enum BTWError {
    #[error("{0}")]
    Generic(String),

    #[error("I/O Error: {0}")]
    IO(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseInt(#[from] std::num::ParseIntError),

    #[error("Parse error: {0}")]
    ParseFloat(#[from] std::num::ParseFloatError),

    #[error("JSON error: {0}")]
    JSON(#[from] serde_json::Error),
}

impl BTWError {
    pub fn new(msg: &str) -> Self {
        Self::Generic(msg.to_owned())
    }
}

impl From<String> for BTWError {
    fn from(str: String) -> Self {
        BTWError::Generic(str)
    }
}

impl From<&str> for BTWError {
    fn from(str: &str) -> Self {
        BTWError::Generic(str.to_owned())
    }
}
