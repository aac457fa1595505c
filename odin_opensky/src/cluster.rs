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

use serde::{Serialize,Deserialize};
use tracing::debug;
use uom::si::{f64::Length, length::meter};

use crate::{Aircraft, LatLon};

/// clustering only kicks in below this zoom level
pub const MAX_CLUSTER_ZOOM: u32 = 8;

/// ..and only if we have more than this many aircraft
pub const MIN_CLUSTER_INPUT: usize = 50;

#[derive(Debug,Clone,Copy,PartialEq,Eq,Serialize,Deserialize)]
#[serde(rename_all="lowercase")]
pub enum ClusterSize { Small, Medium, Large }

impl ClusterSize {
    pub fn from_count (n: usize)->Self {
        if n >= 100 { ClusterSize::Large }
        else if n >= 50 { ClusterSize::Medium }
        else { ClusterSize::Small }
    }
}

#[derive(Debug,Clone,PartialEq,Serialize,Deserialize)]
pub struct ClusterSummary {
    pub id: usize, // index within the clustering pass that produced it
    pub seed: String, // icao24 of the aircraft that started this cluster
    pub centroid: LatLon,
    pub members: Vec<String>, // icao24 keys in claim order, seed first
    pub size: ClusterSize,
}

impl ClusterSummary {
    pub fn count (&self)->usize { self.members.len() }
}

#[derive(Debug,Clone,Default,PartialEq,Serialize,Deserialize)]
pub struct Clustering {
    pub clusters: Vec<ClusterSummary>,
    pub unclustered: Vec<String>, // icao24 keys of aircraft not in any cluster, in input order
}

pub fn cluster_radius (zoom: u32)->Length {
    Length::new::<meter>( (200.0 - zoom as f64 * 20.0).max(50.0))
}

pub fn should_cluster (zoom: u32, n_aircraft: usize)->bool {
    zoom < MAX_CLUSTER_ZOOM && n_aircraft > MIN_CLUSTER_INPUT
}

/// single pass greedy clustering. Each not yet claimed aircraft becomes a seed that claims all
/// unclaimed aircraft within [`cluster_radius`] of itself. The result depends on input order.
/// Aircraft without position are never clustered
pub fn cluster (aircraft: &[Aircraft], zoom: u32)->Clustering {
    if !should_cluster( zoom, aircraft.len()) {
        return Clustering { clusters: Vec::new(), unclustered: aircraft.iter().map( |ac| ac.icao24.clone()).collect() }
    }

    let radius = cluster_radius( zoom);
    let mut claimed = vec![false; aircraft.len()];
    let mut clusters: Vec<ClusterSummary> = Vec::new();
    let mut singles: Vec<usize> = Vec::new();

    for (i,seed) in aircraft.iter().enumerate() {
        if claimed[i] { continue }
        claimed[i] = true;

        let Some(seed_pos) = seed.position else {
            singles.push(i);
            continue
        };

        let mut members = vec![i];
        for (j,ac) in aircraft.iter().enumerate().skip(i+1) {
            if claimed[j] { continue }
            if let Some(pos) = &ac.position {
                if seed_pos.haversine_distance( pos) <= radius {
                    claimed[j] = true;
                    members.push(j);
                }
            }
        }

        if members.len() > 1 {
            let positions: Vec<LatLon> = members.iter().filter_map( |&k| aircraft[k].position).collect();
            let centroid = LatLon::mean( positions.iter()).unwrap_or( seed_pos);
            clusters.push( ClusterSummary {
                id: clusters.len(),
                seed: seed.icao24.clone(),
                centroid,
                size: ClusterSize::from_count( members.len()),
                members: members.iter().map( |&k| aircraft[k].icao24.clone()).collect(),
            });
        } else {
            singles.push(i);
        }
    }

    let unclustered = singles.into_iter().map( |k| aircraft[k].icao24.clone()).collect();
    debug!("clustered {} aircraft into {} clusters at zoom {}", aircraft.len(), clusters.len(), zoom);

    Clustering { clusters, unclustered }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radius () {
        assert_eq!( cluster_radius(0).get::<meter>(), 200.0);
        assert_eq!( cluster_radius(5).get::<meter>(), 100.0);
        assert_eq!( cluster_radius(7).get::<meter>(), 60.0);
        assert_eq!( cluster_radius(12).get::<meter>(), 50.0);
    }

    #[test]
    fn test_size () {
        assert_eq!( ClusterSize::from_count(2), ClusterSize::Small);
        assert_eq!( ClusterSize::from_count(50), ClusterSize::Medium);
        assert_eq!( ClusterSize::from_count(99), ClusterSize::Medium);
        assert_eq!( ClusterSize::from_count(100), ClusterSize::Large);
    }
}
