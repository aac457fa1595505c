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

use std::{fmt, sync::Arc, time::Duration};
use chrono::{DateTime,Utc};
use serde::{Serialize,Deserialize};
use tracing::debug;

use crate::{Aircraft, StateConnector, errors::{Result,OdinOpenSkyError}};

/// a lat/lon aligned rectangle in degrees. There is no antimeridian handling - `west` is expected
/// to be smaller than `east`
#[derive(Debug,Clone,Copy,PartialEq,Serialize,Deserialize)]
pub struct ViewportRegion {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl ViewportRegion {
    pub fn new (north: f64, south: f64, east: f64, west: f64)->Result<Self> {
        if ![north,south,east,west].iter().all( |v| v.is_finite()) {
            return Err( OdinOpenSkyError::InvalidRegionError( format!("non-finite bounds n:{north} s:{south} e:{east} w:{west}")))
        }
        if north <= south {
            return Err( OdinOpenSkyError::InvalidRegionError( format!("north ({north}) not above south ({south})")))
        }
        Ok( ViewportRegion { north, south, east, west } )
    }

    pub fn lat_span (&self)->f64 { self.north - self.south }
    pub fn lon_span (&self)->f64 { self.east - self.west }

    pub fn contains (&self, lat: f64, lon: f64)->bool {
        lat >= self.south && lat <= self.north && lon >= self.west && lon <= self.east
    }

    /// is `other` strictly inside of us (no shared edges)
    pub fn strictly_contains (&self, other: &ViewportRegion)->bool {
        self.north > other.north && self.south < other.south && self.east > other.east && self.west < other.west
    }

    /// query parameters for the OpenSky `states/all` endpoint
    pub fn query_params (&self)->Vec<(&'static str,String)> {
        vec![
            ("lamin", self.south.to_string()),
            ("lomin", self.west.to_string()),
            ("lamax", self.north.to_string()),
            ("lomax", self.east.to_string()),
        ]
    }
}

impl fmt::Display for ViewportRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!( f, "[n:{:.4}, s:{:.4}, e:{:.4}, w:{:.4}]", self.north, self.south, self.east, self.west)
    }
}

/// a viewport expanded by a zoom dependent margin so that aircraft just outside of the visible
/// area are already known when the user pans
#[derive(Debug,Clone,Copy,PartialEq,Serialize,Deserialize)]
pub struct BufferedRegion {
    pub viewport: ViewportRegion,
    pub zoom: u32,
    pub margin: f64, // fraction of the viewport span added on each side
    pub bounds: ViewportRegion,
}

/// lower zoom levels (larger areas) get relatively larger margins
pub fn margin_fraction (zoom: u32)->f64 {
    (0.5 - zoom as f64 * 0.05).max(0.1)
}

pub fn buffered_region (viewport: &ViewportRegion, zoom: u32)->BufferedRegion {
    let margin = margin_fraction( zoom);
    let dlat = viewport.lat_span() * margin;
    let dlon = viewport.lon_span() * margin;

    let bounds = ViewportRegion {
        north: viewport.north + dlat,
        south: viewport.south - dlat,
        east: viewport.east + dlon,
        west: viewport.west - dlon,
    };

    BufferedRegion { viewport: *viewport, zoom, margin, bounds }
}

/// can `ac` be shown at time `now`: it needs a position, must be airborne and must not be older
/// than `max_age`
pub fn is_valid (ac: &Aircraft, now: DateTime<Utc>, max_age: Duration)->bool {
    ac.is_placeable() && ac.secs_since_contact( now) <= max_age.as_secs_f64()
}

pub fn filter_valid (aircraft: Vec<Aircraft>, now: DateTime<Utc>, max_age: Duration)->Vec<Aircraft> {
    aircraft.into_iter().filter( |ac| is_valid( ac, now, max_age)).collect()
}

#[derive(Debug,Clone)]
pub struct AggregateResult {
    pub aircraft: Vec<Aircraft>,
    pub region: Option<BufferedRegion>, // None for global queries
    pub n_received: usize, // before filtering
}

/// turns a viewport/zoom into a filtered set of aircraft from the upstream connector
pub struct ViewportAggregator<C: StateConnector> {
    connector: Arc<C>,
    max_age: Duration,
}

impl<C: StateConnector> ViewportAggregator<C> {
    pub fn new (connector: Arc<C>, max_age: Duration)->Self {
        ViewportAggregator { connector, max_age }
    }

    pub fn connector (&self)->&Arc<C> { &self.connector }
    pub fn max_age (&self)->Duration { self.max_age }

    pub async fn aggregate (&self, viewport: Option<&ViewportRegion>, zoom: u32)->Result<AggregateResult> {
        let region = viewport.map( |vp| buffered_region( vp, zoom));

        let raw = match &region {
            Some(br) => self.connector.fetch_in_region( &br.bounds).await?,
            None => self.connector.fetch_all().await?
        };
        let n_received = raw.len();

        // the fetch might have been paced, take the time after it
        let now = Utc::now();
        let aircraft = filter_valid( raw, now, self.max_age);
        debug!("aggregated {} of {} received aircraft", aircraft.len(), n_received);

        Ok( AggregateResult { aircraft, region, n_received } )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_margin_fraction () {
        assert_eq!( margin_fraction(0), 0.5);
        assert!( (margin_fraction(4) - 0.3).abs() < 1e-9);
        assert!( (margin_fraction(8) - 0.1).abs() < 1e-9);
        assert_eq!( margin_fraction(15), 0.1);
    }

    #[test]
    fn test_query_params () {
        let vp = ViewportRegion::new( 38.0, 37.0, -121.0, -123.0).unwrap();
        let params = vp.query_params();
        assert_eq!( params[0], ("lamin", "37".to_string()));
        assert_eq!( params[1], ("lomin", "-123".to_string()));
        assert_eq!( params[2], ("lamax", "38".to_string()));
        assert_eq!( params[3], ("lomax", "-121".to_string()));
    }
}
