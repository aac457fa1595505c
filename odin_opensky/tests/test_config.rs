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

#![allow(unused)]

use std::{fs, time::Duration};
use odin_opensky::{load_config, load_config_file, load_fallback, OpenSkyConfig, CONFIG_DIR_ENV, errors::OdinOpenSkyError};

#[test]
fn test_default_config () {
    let config: OpenSkyConfig = load_config("opensky.ron").unwrap();
    assert_eq!( config.min_request_interval, Duration::from_secs(10));
    assert_eq!( config.max_age, Duration::from_secs(300));
    assert!( config.credentials.is_none());
}

#[test]
fn test_config_file () {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("my_opensky.ron");
    fs::write( &path, r#"
        OpenSkyConfig(
            base_url: "http://localhost:8080/api",
            min_request_interval: (secs: 5, nanos: 0),
            refresh_interval: (secs: 15, nanos: 0),
            request_timeout: (secs: 20, nanos: 0),
            max_age: (secs: 120, nanos: 0),
            credentials: Some( Credentials( user: "me", password: "secret")),
        )
    "#).unwrap();

    let config: OpenSkyConfig = load_config_file( &path).unwrap();
    assert_eq!( config.base_url, "http://localhost:8080/api");
    assert_eq!( config.refresh_interval, Duration::from_secs(15));
    assert_eq!( config.credentials.map( |c| c.user), Some("me".to_string()));
    assert!( config.fallback.is_none());

    // lookup through config dir env var
    unsafe { std::env::set_var( CONFIG_DIR_ENV, dir.path()); }
    let config: OpenSkyConfig = load_config("my_opensky.ron").unwrap();
    assert_eq!( config.max_age, Duration::from_secs(120));

    assert!( matches!( load_config::<OpenSkyConfig>("no_such_config.ron"), Err(OdinOpenSkyError::ConfigNotFoundError(_))));

    fs::write( &path, "OpenSkyConfig( base_url: 42 )").unwrap();
    assert!( matches!( load_config_file::<OpenSkyConfig>( &path), Err(OdinOpenSkyError::RonError(_))));
}

#[test]
fn test_fallback_data () {
    let aircraft = load_fallback( concat!( env!("CARGO_MANIFEST_DIR"), "/resources/data/fallback_aircraft.json")).unwrap();
    assert_eq!( aircraft.len(), 3);
    assert!( aircraft.iter().all( |ac| ac.is_placeable()));
    assert_eq!( aircraft[0].trimmed_callsign(), Some("UAL1544"));
}
