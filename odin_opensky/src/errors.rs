/*
 * Copyright © 2025, United States Government, as represented by the Administrator of
 * the National Aeronautics and Space Administration. All rights reserved.
 *
 * The “ODIN” software is licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License. You may obtain a copy
 * of the License at http://www.apache.org/licenses/LICENSE-2.0.
 *
 * Unless required by applicable law or agreed to in writing, software distributed under
 * the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND,
 * either express or implied. See the License for the specific language governing permissions
 * and limitations under the License.
 */

use thiserror::Error;
use reqwest::StatusCode;

pub type Result<T> = std::result::Result<T,OdinOpenSkyError>;

#[derive(Error,Debug)]
pub enum OdinOpenSkyError {
    #[error("transport error {0}")]
    TransportError( #[from] reqwest::Error),

    #[error("OpenSky API error: {0}")]
    StatusError( StatusCode ),

    #[error("parse error {0}")]
    ParseError(String),

    #[error("invalid region {0}")]
    InvalidRegionError(String),

    #[error("IO error {0}")]
    IOError( #[from] std::io::Error),

    #[error("serde error {0}")]
    SerdeError( #[from] serde_json::Error),

    #[error("config RON error {0}")]
    RonError( #[from] ron::error::SpannedError),

    #[error("config file not found {0}")]
    ConfigNotFoundError(String),

    #[error("flight tracker terminated")]
    TrackerTerminatedError,
}

impl OdinOpenSkyError {
    /// is this a failure to obtain a usable upstream response (as opposed to a local error)
    pub fn is_transport_failure (&self)->bool {
        matches!( self,
            OdinOpenSkyError::TransportError(_) | OdinOpenSkyError::StatusError(_) | OdinOpenSkyError::ParseError(_)
        )
    }
}

macro_rules! parse_error {
    ($fmt:literal $(, $arg:expr )* ) => {
        crate::errors::OdinOpenSkyError::ParseError( format!( $fmt $(, $arg)* ))
    };
}
pub (crate) use parse_error;
