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

use std::fmt;
use geo::{Distance, Haversine, Point};
use serde::{Serialize,Deserialize};
use uom::si::{f64::Length, length::meter};

/// a geodetic position in degrees. Aircraft either have both coordinates or none, which
/// is why we keep them together
#[derive(Debug,Clone,Copy,PartialEq,Serialize,Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new (lat: f64, lon: f64)->Self { LatLon{lat,lon} }

    pub fn point (&self)->Point { Point::new( self.lon, self.lat) }

    /// great circle distance on a sphere with mean earth radius
    pub fn haversine_distance (&self, other: &LatLon)->Length {
        let dist = Haversine.distance( self.point(), other.point());
        Length::new::<meter>(dist)
    }

    /// arithmetic mean of positions (no spherical averaging - we only use this for small clusters)
    pub fn mean<'a> (positions: impl IntoIterator<Item=&'a LatLon>)->Option<LatLon> {
        let mut n = 0usize;
        let mut lat = 0.0;
        let mut lon = 0.0;
        for p in positions {
            lat += p.lat;
            lon += p.lon;
            n += 1;
        }
        if n > 0 { Some( LatLon::new( lat / n as f64, lon / n as f64)) } else { None }
    }
}

impl fmt::Display for LatLon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!( f, "({:.5},{:.5})", self.lat, self.lon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine () {
        let sfo = LatLon::new( 37.6189, -122.3750);
        let jfk = LatLon::new( 40.6413, -73.7781);
        let d = sfo.haversine_distance( &jfk).get::<meter>();
        assert!( (d - 4_152_000.0).abs() < 10_000.0, "unexpected distance {d}");

        assert_eq!( sfo.haversine_distance(&sfo).get::<meter>(), 0.0);

        // symmetric, and 1/1000 deg of latitude is about 111m
        assert!( (sfo.haversine_distance(&jfk) - jfk.haversine_distance(&sfo)).get::<meter>().abs() < 1e-6);
        let d = LatLon::new( 37.0, -122.0).haversine_distance( &LatLon::new( 37.001, -122.0)).get::<meter>();
        assert!( (d - 111.2).abs() < 0.5, "unexpected distance {d}");
    }

    #[test]
    fn test_mean () {
        let ps = [LatLon::new(1.0, 2.0), LatLon::new(3.0, 6.0)];
        assert_eq!( LatLon::mean( ps.iter()), Some(LatLon::new(2.0, 4.0)));
        let empty: [LatLon;0] = [];
        assert_eq!( LatLon::mean( empty.iter()), None);
    }
}
