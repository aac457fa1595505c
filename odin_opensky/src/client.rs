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

use std::{sync::Arc, time::Duration};
use async_trait::async_trait;
use reqwest::{Client, header::{ACCEPT,HeaderValue}};
use serde::Deserialize;
use serde_json::Value;
use tokio::{sync::Mutex, time::{Instant,sleep}};
use tracing::{debug,warn};
use uom::si::{f64::{Length,Velocity}, length::meter, velocity::meter_per_second};

use crate::{Aircraft, LatLon, OpenSkyConfig, viewport::ViewportRegion, errors::{Result,OdinOpenSkyError,parse_error}};

/// the upstream interface used by [`crate::viewport::ViewportAggregator`] and [`crate::tracker::FlightTracker`].
/// Implementations are injected so that the processing chain can be tested without network access
#[async_trait]
pub trait StateConnector: Send + Sync + 'static {
    async fn fetch_all (&self)->Result<Vec<Aircraft>>;
    async fn fetch_in_region (&self, region: &ViewportRegion)->Result<Vec<Aircraft>>;
    async fn fetch_by_key (&self, icao24: &str)->Result<Option<Aircraft>>;
}

/// global request pacing. Callers that arrive before `min_interval` has elapsed since the last
/// admitted request are suspended (never dropped). Since we hold the lock while waiting, concurrent
/// callers queue up behind each other and are admitted one interval apart
pub struct PacingGate {
    min_interval: Duration,
    last_start: Mutex<Option<Instant>>,
}

impl PacingGate {
    pub fn new (min_interval: Duration)->Self {
        PacingGate { min_interval, last_start: Mutex::new(None) }
    }

    pub fn min_interval (&self)->Duration { self.min_interval }

    /// wait until the next request may start and record its start time
    pub async fn admit (&self)->Instant {
        let mut last_start = self.last_start.lock().await;

        if let Some(t) = *last_start {
            let elapsed = t.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                debug!("pacing upstream request, waiting {:?}", wait);
                sleep( wait).await;
            }
        }

        let now = Instant::now();
        *last_start = Some(now);
        now
    }
}

/// the live [`StateConnector`] that queries the OpenSky REST API.
/// There should only be one instance per process (shared through an `Arc`) since the rate limit
/// applies to all our requests
pub struct OpenSkyClient {
    config: Arc<OpenSkyConfig>,
    client: Client,
    gate: PacingGate,
}

impl OpenSkyClient {
    pub fn new (config: Arc<OpenSkyConfig>)->Result<Self> {
        let client = Client::builder()
            .timeout( config.request_timeout)
            .build()?;
        let gate = PacingGate::new( config.min_request_interval);

        Ok( OpenSkyClient { config, client, gate } )
    }

    pub fn gate (&self)->&PacingGate { &self.gate }

    fn states_url (&self)->String {
        format!("{}/states/all", self.config.base_url.trim_end_matches('/'))
    }

    async fn get_states (&self, query: &[(&str,String)])->Result<Vec<Aircraft>> {
        let url = self.states_url();

        self.gate.admit().await;

        let mut req = self.client.get( &url).header( ACCEPT, HeaderValue::from_static("application/json"));
        if !query.is_empty() {
            req = req.query( query);
        }
        if let Some(cred) = &self.config.credentials {
            req = req.basic_auth( &cred.user, Some(&cred.password));
        }

        let response = req.send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!("request {url} failed with status {status}");
            return Err( OdinOpenSkyError::StatusError(status))
        }

        let bytes = response.bytes().await?;
        parse_states( &bytes)
    }
}

#[async_trait]
impl StateConnector for OpenSkyClient {
    async fn fetch_all (&self)->Result<Vec<Aircraft>> {
        self.get_states( &[]).await
    }

    async fn fetch_in_region (&self, region: &ViewportRegion)->Result<Vec<Aircraft>> {
        self.get_states( &region.query_params()).await
    }

    async fn fetch_by_key (&self, icao24: &str)->Result<Option<Aircraft>> {
        let query = [("icao24", icao24.trim().to_lowercase())];
        let mut aircraft = self.get_states( &query).await?;
        Ok( if aircraft.is_empty() { None } else { Some(aircraft.swap_remove(0)) } )
    }
}

/* #region state vector decoding ******************************************************************/

/// the `/states/all` response. A missing or null `states` field just means there are no aircraft
#[derive(Deserialize,Debug)]
pub struct StatesResponse {
    #[serde(default)]
    pub time: Option<i64>,
    #[serde(default)]
    pub states: Option<Vec<Value>>,
}

pub fn parse_states (bytes: &[u8])->Result<Vec<Aircraft>> {
    let response: StatesResponse = serde_json::from_slice( bytes)
        .map_err( |e| parse_error!("invalid states response: {}", e))?;

    let states = response.states.unwrap_or_default();
    let mut aircraft = Vec::with_capacity( states.len());
    for sv in &states {
        match aircraft_from_state_vector( sv) {
            Some(ac) => aircraft.push( ac),
            None => debug!("ignoring malformed state vector: {sv}")
        }
    }
    Ok(aircraft)
}

/// OpenSky state vectors are positional arrays:
/// ```text
///  0: icao24           6: latitude          12: sensors
///  1: callsign         7: baro_altitude [m] 13: geo_altitude [m]
///  2: origin_country   8: on_ground         14: squawk
///  3: time_position    9: velocity [m/s]    15: spi
///  4: last_contact    10: true_track [deg]  16: position_source
///  5: longitude       11: vertical_rate     17: category (optional)
/// ```
/// see https://openskynetwork.github.io/opensky-api/rest.html
pub fn aircraft_from_state_vector (sv: &Value)->Option<Aircraft> {
    let fields = sv.as_array()?;

    let icao24 = fields.first()?.as_str()?.trim();
    if icao24.is_empty() { return None }

    let f64_at = |i: usize| fields.get(i).and_then( Value::as_f64);
    let i64_at = |i: usize| fields.get(i).and_then( |v| v.as_i64().or_else( || v.as_f64().map( |x| x as i64)));
    let str_at = |i: usize| fields.get(i).and_then( Value::as_str);
    let bool_at = |i: usize| fields.get(i).and_then( Value::as_bool).unwrap_or(false);

    let mut ac = Aircraft::new( icao24, i64_at(4).unwrap_or(0));
    ac.callsign = str_at(1).map( str::trim).filter( |cs| !cs.is_empty()).map( str::to_string);
    ac.origin_country = str_at(2).unwrap_or_default().to_string();
    ac.time_position = i64_at(3);
    ac.position = match (f64_at(6), f64_at(5)) {
        (Some(lat), Some(lon)) => Some( LatLon::new( lat, lon)),
        _ => None
    };
    ac.baro_altitude = f64_at(7).map( Length::new::<meter>);
    ac.on_ground = bool_at(8);
    ac.velocity = f64_at(9).map( Velocity::new::<meter_per_second>);
    ac.true_track = f64_at(10);
    ac.vertical_rate = f64_at(11).map( Velocity::new::<meter_per_second>);
    ac.sensors = fields.get(12).and_then( Value::as_array).map( |ids| ids.iter().filter_map( Value::as_i64).collect());
    ac.geo_altitude = f64_at(13).map( Length::new::<meter>);
    ac.squawk = str_at(14).map( str::to_string);
    ac.spi = bool_at(15);
    ac.position_source = i64_at(16).unwrap_or(0).clamp( 0, u8::MAX as i64) as u8;

    Some(ac)
}

/* #endregion state vector decoding */

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_state_vector () {
        let sv = json!(["4B1815", "SWR100  ", "Switzerland", 1700000000, 1700000005, 8.55, 47.45, 10972.8, false, 230.5, 271.3, -0.33, null, 11155.68, "1000", false, 0]);
        let ac = aircraft_from_state_vector( &sv).unwrap();

        assert_eq!( ac.icao24, "4b1815");
        assert_eq!( ac.callsign.as_deref(), Some("SWR100"));
        assert_eq!( ac.position, Some(LatLon::new( 47.45, 8.55)));
        assert_eq!( ac.last_contact, 1700000005);
        assert_eq!( ac.baro_altitude.unwrap().get::<meter>(), 10972.8);
        assert_eq!( ac.velocity.unwrap().get::<meter_per_second>(), 230.5);
        assert_eq!( ac.true_track, Some(271.3));
        assert_eq!( ac.squawk.as_deref(), Some("1000"));
        assert!( ac.sensors.is_none());
        assert!( !ac.on_ground);

        let sv = json!(["4b1815", "SWR100", "Switzerland", null, 1700000005, 8.55, 47.45, null, false, null, null, null, [1234, 5678], null, null, false, 2]);
        let ac = aircraft_from_state_vector( &sv).unwrap();
        assert_eq!( ac.sensors, Some(vec![1234, 5678]));
        assert_eq!( ac.position_source, 2);
    }

    #[test]
    fn test_partial_state_vector () {
        // longitude without latitude is no position
        let sv = json!(["abc123", "", "Germany", null, 1700000005, 8.55, null, null, true]);
        let ac = aircraft_from_state_vector( &sv).unwrap();
        assert!( ac.callsign.is_none());
        assert!( ac.position.is_none());
        assert!( ac.on_ground);
        assert!( ac.velocity.is_none());
        assert_eq!( ac.position_source, 0);

        assert!( aircraft_from_state_vector( &json!({"icao24": "abc123"})).is_none());
        assert!( aircraft_from_state_vector( &json!([null, "DLH1"])).is_none());
    }

    #[test]
    fn test_missing_states () {
        assert!( parse_states( br#"{"time": 1700000000, "states": null}"#).unwrap().is_empty());
        assert!( parse_states( br#"{"time": 1700000000}"#).unwrap().is_empty());
        assert!( parse_states( b"<html>").is_err());
    }
}
