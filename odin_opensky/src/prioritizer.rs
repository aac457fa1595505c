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

//! zoom dependent downsampling of aircraft sets

use chrono::{DateTime,Utc};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;
use uom::si::{length::meter, velocity::meter_per_second};

use crate::Aircraft;

lazy_static! {
    // airline ICAO designator followed by a flight number
    static ref COMMERCIAL_CS_RE: Regex = Regex::new(r"^[A-Z]{2,3}\d").unwrap();
}

/// maximum number of aircraft we show at a given zoom level
pub fn budget_for_zoom (zoom: u32)->usize {
    match zoom {
        0..=4 => 200,
        5..=6 => 500,
        7..=8 => 1000,
        9..=10 => 2000,
        _ => 5000
    }
}

pub fn is_commercial_callsign (callsign: &str)->bool {
    COMMERCIAL_CS_RE.is_match( callsign.trim())
}

/// higher is more important. Scheduled flights come first, then high, fast and recently seen ones
pub fn priority_score (ac: &Aircraft, now: DateTime<Utc>)->f64 {
    let mut score = 0.0;

    if ac.trimmed_callsign().map( is_commercial_callsign).unwrap_or(false) {
        score += 100.0;
    }
    if let Some(alt) = ac.baro_altitude {
        score += (alt.get::<meter>() / 1000.0).min(50.0);
    }
    if let Some(spd) = ac.velocity {
        score += (spd.get::<meter_per_second>() / 10.0).min(30.0);
    }

    let age = ac.secs_since_contact( now).max(0.0);
    score += (20.0 - age).max(0.0);

    score
}

/// reduce `aircraft` to at most [`budget_for_zoom`] entries. Sets within budget are returned as-is,
/// otherwise we keep the highest scored ones (in descending score order, ties keep input order)
pub fn select (aircraft: Vec<Aircraft>, zoom: u32, now: DateTime<Utc>)->Vec<Aircraft> {
    let budget = budget_for_zoom( zoom);
    if aircraft.len() <= budget {
        return aircraft
    }

    let n = aircraft.len();
    let mut scored: Vec<(f64,Aircraft)> = aircraft.into_iter().map( |ac| (priority_score(&ac, now), ac)).collect();
    scored.sort_by( |a,b| b.0.total_cmp( &a.0)); // stable
    scored.truncate( budget);
    debug!("prioritized {} of {} aircraft for zoom {}", budget, n, zoom);

    scored.into_iter().map( |(_,ac)| ac).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget () {
        assert_eq!( budget_for_zoom(2), 200);
        assert_eq!( budget_for_zoom(4), 200);
        assert_eq!( budget_for_zoom(5), 500);
        assert_eq!( budget_for_zoom(8), 1000);
        assert_eq!( budget_for_zoom(10), 2000);
        assert_eq!( budget_for_zoom(11), 5000);
    }

    #[test]
    fn test_callsign () {
        assert!( is_commercial_callsign("UAL123"));
        assert!( is_commercial_callsign("LH4 "));
        assert!( !is_commercial_callsign("N12345"));
        assert!( !is_commercial_callsign("ual123"));
        assert!( !is_commercial_callsign("ABCD1"));
    }
}
