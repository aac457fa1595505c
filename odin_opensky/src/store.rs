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

use std::{collections::HashMap, sync::Arc};
use arc_swap::ArcSwap;
use chrono::{DateTime,Utc};
use serde::Serialize;

use crate::{Aircraft, BufferedRegion, ClusterSummary, Clustering};

/// the immutable result of one refresh cycle
#[derive(Debug,Clone,Serialize)]
pub struct Snapshot {
    pub cycle: u64,
    pub created: DateTime<Utc>,
    pub zoom: u32,
    pub region: Option<BufferedRegion>,
    pub aircraft: Vec<Aircraft>, // in prioritizer output order
    pub clusters: Vec<ClusterSummary>,
    pub unclustered: Vec<String>,

    #[serde(skip)]
    index: HashMap<String,usize>, // icao24 -> aircraft index
}

impl Snapshot {
    pub fn new (cycle: u64, zoom: u32, region: Option<BufferedRegion>, aircraft: Vec<Aircraft>, clustering: Clustering)->Self {
        let index = aircraft.iter().enumerate().map( |(i,ac)| (ac.icao24.clone(), i)).collect();
        Snapshot {
            cycle,
            created: Utc::now(),
            zoom,
            region,
            aircraft,
            clusters: clustering.clusters,
            unclustered: clustering.unclustered,
            index
        }
    }

    pub fn empty ()->Self {
        Snapshot::new( 0, 0, None, Vec::new(), Clustering::default())
    }

    pub fn len (&self)->usize { self.aircraft.len() }
    pub fn is_empty (&self)->bool { self.aircraft.is_empty() }

    pub fn get (&self, icao24: &str)->Option<&Aircraft> {
        self.index.get( &icao24.to_lowercase()).map( |&i| &self.aircraft[i])
    }

    pub fn contains (&self, icao24: &str)->bool { self.get( icao24).is_some() }

    pub fn cluster (&self, id: usize)->Option<&ClusterSummary> {
        self.clusters.iter().find( |c| c.id == id)
    }

    pub fn cluster_of (&self, icao24: &str)->Option<&ClusterSummary> {
        let key = icao24.to_lowercase();
        self.clusters.iter().find( |c| c.members.contains( &key))
    }

    /// the aircraft that are not part of any cluster, in snapshot order
    pub fn unclustered_aircraft (&self)->impl Iterator<Item=&Aircraft> {
        self.unclustered.iter().filter_map( |k| self.get(k))
    }

    /// a copy of this snapshot with `ac` added (or replaced if we already have it). New aircraft
    /// are appended and show up as unclustered
    pub fn with_upserted (&self, ac: Aircraft)->Self {
        let mut snap = self.clone();
        match snap.index.get( &ac.icao24) {
            Some(&i) => snap.aircraft[i] = ac,
            None => {
                snap.index.insert( ac.icao24.clone(), snap.aircraft.len());
                snap.unclustered.push( ac.icao24.clone());
                snap.aircraft.push( ac);
            }
        }
        snap
    }
}

/// holds the current [`Snapshot`]. Readers always see a complete snapshot, updates replace it
/// atomically
pub struct EntityRepository {
    current: ArcSwap<Snapshot>,
}

impl EntityRepository {
    pub fn new ()->Self {
        EntityRepository { current: ArcSwap::from_pointee( Snapshot::empty()) }
    }

    pub fn snapshot (&self)->Arc<Snapshot> {
        self.current.load_full()
    }

    pub fn replace (&self, snapshot: Snapshot) {
        self.current.store( Arc::new(snapshot));
    }

    pub fn is_empty (&self)->bool { self.current.load().is_empty() }

    pub fn len (&self)->usize { self.current.load().len() }

    pub fn get (&self, icao24: &str)->Option<Aircraft> {
        self.current.load().get( icao24).cloned()
    }

    pub fn upsert (&self, ac: Aircraft) {
        self.current.rcu( |snap| snap.with_upserted( ac.clone()));
    }
}

impl Default for EntityRepository {
    fn default()->Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LatLon;

    fn aircraft (key: &str)->Aircraft {
        let mut ac = Aircraft::new( key, 1700000000);
        ac.position = Some( LatLon::new( 37.0, -122.0));
        ac
    }

    #[test]
    fn test_replace_and_upsert () {
        let repo = EntityRepository::new();
        assert!( repo.is_empty());

        let clustering = Clustering { clusters: Vec::new(), unclustered: vec!["a1".to_string(), "b2".to_string()] };
        repo.replace( Snapshot::new( 1, 6, None, vec![aircraft("A1"), aircraft("b2")], clustering));
        assert_eq!( repo.len(), 2);
        assert!( repo.get("a1").is_some());

        let old = repo.snapshot();
        repo.upsert( aircraft("c3"));
        assert_eq!( old.len(), 2); // readers keep their snapshot
        let snap = repo.snapshot();
        assert_eq!( snap.len(), 3);
        assert_eq!( snap.unclustered.last().map( String::as_str), Some("c3"));

        repo.upsert( aircraft("a1"));
        assert_eq!( repo.len(), 3);
    }
}
