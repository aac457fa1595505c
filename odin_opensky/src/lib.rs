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

//! crate to import live aircraft state vectors from the OpenSky network and reduce them to
//! what a map renderer should show for a given viewport and zoom level.
//!
//! The processing chain of each refresh cycle is
//! `viewport+zoom -> buffered region -> OpenSkyClient -> validity filter -> prioritizer -> clusterer -> EntityRepository`.
//! The [`tracker::FlightTracker`] task runs this chain periodically and exposes the results through a
//! [`tracker::TrackerHandle`]. Icons for rendered aircraft come from an independent [`icon_cache::IconCache`]

use std::{env, fmt, fs, path::{Path,PathBuf}, time::Duration};
use serde::{Serialize,Deserialize,de::DeserializeOwned};
use chrono::{DateTime,Utc};
use uom::si::{f64::{Length,Velocity}, length::{meter,foot}, velocity::{meter_per_second,knot}};

pub mod errors;
use errors::{Result,OdinOpenSkyError};

pub mod geo;
pub use geo::LatLon;

pub mod client;
pub use client::{StateConnector,OpenSkyClient,PacingGate};

pub mod viewport;
pub use viewport::{ViewportRegion,BufferedRegion,ViewportAggregator};

pub mod prioritizer;

pub mod cluster;
pub use cluster::{ClusterSummary,ClusterSize,Clustering};

pub mod icon_cache;
pub use icon_cache::{IconCache,IconDescriptor,IconKey};

pub mod store;
pub use store::{EntityRepository,Snapshot};

pub mod tracker;
pub use tracker::{FlightTracker,TrackerHandle,TrackerStatus};

/// env var that can be used to point to a directory with our config files
pub const CONFIG_DIR_ENV: &str = "ODIN_OPENSKY_CONFIG_DIR";

/* #region types  **********************************************************************************/

/// the data model for a tracked aircraft as reported by an OpenSky state vector.
/// Aircraft are replaced (not mutated) on every poll - identity across polls is only given by `icao24`
#[derive(Debug,Clone,PartialEq,Serialize,Deserialize)]
pub struct Aircraft {
    pub icao24: String, // lower case hex transponder address
    #[serde(default)] pub callsign: Option<String>,
    #[serde(default)] pub origin_country: String,
    #[serde(default)] pub time_position: Option<i64>, // epoch seconds of last position update
    pub last_contact: i64, // epoch seconds of last received message

    #[serde(default)] pub position: Option<LatLon>,
    #[serde(default)] pub baro_altitude: Option<Length>,
    #[serde(default)] pub on_ground: bool,
    #[serde(default)] pub velocity: Option<Velocity>, // ground speed
    #[serde(default)] pub true_track: Option<f64>, // heading in degrees clockwise from north
    #[serde(default)] pub vertical_rate: Option<Velocity>,
    #[serde(default)] pub sensors: Option<Vec<i64>>, // ids of receivers that contributed, if requested
    #[serde(default)] pub geo_altitude: Option<Length>,
    #[serde(default)] pub squawk: Option<String>,
    #[serde(default)] pub spi: bool,
    #[serde(default)] pub position_source: u8, // 0: ADS-B, 1: ASTERIX, 2: MLAT, 3: FLARM
}

impl Aircraft {
    pub fn new (icao24: impl AsRef<str>, last_contact: i64)->Self {
        Aircraft {
            icao24: icao24.as_ref().trim().to_lowercase(),
            callsign: None,
            origin_country: String::new(),
            time_position: None,
            last_contact,
            position: None,
            baro_altitude: None,
            on_ground: false,
            velocity: None,
            true_track: None,
            vertical_rate: None,
            sensors: None,
            geo_altitude: None,
            squawk: None,
            spi: false,
            position_source: 0,
        }
    }

    pub fn latitude (&self)->Option<f64> { self.position.map( |p| p.lat) }
    pub fn longitude (&self)->Option<f64> { self.position.map( |p| p.lon) }

    /// can this aircraft be placed on a map at all (regardless of staleness)
    pub fn is_placeable (&self)->bool {
        self.position.is_some() && !self.on_ground
    }

    /// seconds since last contact at `now`. Negative if the contact lies in the future
    pub fn secs_since_contact (&self, now: DateTime<Utc>)->f64 {
        now.timestamp_millis() as f64 / 1000.0 - self.last_contact as f64
    }

    pub fn trimmed_callsign (&self)->Option<&str> {
        self.callsign.as_deref().map( str::trim).filter( |cs| !cs.is_empty())
    }
}

impl fmt::Display for Aircraft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!( f, "Aircraft( icao24: {}", self.icao24)?;
        if let Some(cs) = self.trimmed_callsign() { write!( f, ", cs: \"{cs}\"")?; }
        if let Some(p) = &self.position { write!( f, ", pos: {p}")?; }
        if let Some(alt) = self.baro_altitude { write!( f, ", alt: {:.0}", alt.get::<foot>())?; }
        if let Some(spd) = self.velocity { write!( f, ", spd: {:.0}", spd.get::<knot>())?; }
        if let Some(hdg) = self.true_track { write!( f, ", hdg: {:.0}", hdg)?; }
        if self.on_ground { write!( f, ", on_ground")?; }
        write!( f, ", last_contact: {})", self.last_contact)
    }
}

#[derive(Deserialize,Serialize,Debug,Clone)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

#[derive(Deserialize,Serialize,Debug,Clone)]
pub struct OpenSkyConfig {
    pub base_url: String, // e.g. https://opensky-network.org/api
    pub min_request_interval: Duration, // hard lower bound between two upstream requests (start to start)
    pub refresh_interval: Duration, // tracker update cycle
    pub request_timeout: Duration,
    pub max_age: Duration, // aircraft without contact for longer than this are dropped

    #[serde(default)]
    pub credentials: Option<Credentials>,

    #[serde(default)]
    pub fallback: Option<PathBuf>, // JSON file with aircraft to show if we never got live data
}

impl Default for OpenSkyConfig {
    fn default()->Self {
        OpenSkyConfig {
            base_url: "https://opensky-network.org/api".to_string(),
            min_request_interval: Duration::from_secs(10),
            refresh_interval: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_age: Duration::from_secs(300),
            credentials: None,
            fallback: None,
        }
    }
}

/* #endregion types */

/* #region config & data loading ********************************************************************/

/// locate a config file: as given, then in `$ODIN_OPENSKY_CONFIG_DIR`, then in our `resources/configs`
pub fn find_config_file (filename: &str)->Option<PathBuf> {
    let path = Path::new(filename);
    if path.is_file() { return Some( path.to_path_buf()) }

    if let Ok(dir) = env::var( CONFIG_DIR_ENV) {
        let path = Path::new( &dir).join( filename);
        if path.is_file() { return Some(path) }
    }

    let path = Path::new( env!("CARGO_MANIFEST_DIR")).join("resources").join("configs").join( filename);
    if path.is_file() { Some(path) } else { None }
}

pub fn load_config<C> (filename: &str)->Result<C> where C: DeserializeOwned {
    let path = find_config_file( filename).ok_or_else( || OdinOpenSkyError::ConfigNotFoundError( filename.to_string()))?;
    load_config_file( &path)
}

pub fn load_config_file<C> (path: impl AsRef<Path>)->Result<C> where C: DeserializeOwned {
    let contents = fs::read_to_string( path)?;
    Ok( ron::from_str( &contents)? )
}

/// read a JSON array of [`Aircraft`] objects, used as static fallback data
pub fn load_fallback (path: impl AsRef<Path>)->Result<Vec<Aircraft>> {
    let contents = fs::read_to_string( path)?;
    let mut aircraft: Vec<Aircraft> = serde_json::from_str( &contents)?;
    for ac in aircraft.iter_mut() {
        ac.icao24 = ac.icao24.to_lowercase();
    }
    Ok(aircraft)
}

/* #endregion config & data loading */
