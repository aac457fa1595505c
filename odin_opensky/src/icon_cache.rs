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

use std::{collections::HashMap, sync::{Arc,Mutex,MutexGuard}};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Serialize,Deserialize};
use tracing::trace;

/// 36 heading buckets x 2 selection states
pub const DEFAULT_MAX_ENTRIES: usize = 72;

pub const HEADING_STEP: u16 = 10;

const SELECTED_COLOR: &str = "#ff4136";
const NORMAL_COLOR: &str = "#0074d9";

/// round a heading to the nearest [`HEADING_STEP`] in [0,360). Missing or non-finite headings map to 0
pub fn heading_bucket (heading: Option<f64>)->u16 {
    match heading {
        Some(h) if h.is_finite() => {
            let step = HEADING_STEP as f64;
            let b = (h.rem_euclid(360.0) / step).round() * step;
            (b as u16) % 360
        }
        _ => 0
    }
}

#[derive(Debug,Clone,Copy,PartialEq,Eq,Hash,PartialOrd,Ord,Serialize,Deserialize)]
pub struct IconKey {
    pub heading: u16, // bucket
    pub selected: bool,
}

impl IconKey {
    pub fn new (heading: Option<f64>, selected: bool)->Self {
        IconKey { heading: heading_bucket(heading), selected }
    }
}

/// everything a renderer needs to place an aircraft marker
#[derive(Debug,Clone,PartialEq,Serialize,Deserialize)]
pub struct IconDescriptor {
    pub key: IconKey,
    pub rotation: u16, // degrees clockwise, the glyph itself points north
    pub svg: String,
    pub url: String, // data:image/svg+xml;base64,..
    pub size: [u32;2],
    pub anchor: [u32;2],
    pub popup_anchor: [i32;2],
}

impl IconDescriptor {
    fn create (key: IconKey)->Self {
        let (px, color) = if key.selected { (28u32, SELECTED_COLOR) } else { (24u32, NORMAL_COLOR) };
        let half = px / 2;
        let svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{px}" height="{px}" viewBox="0 0 24 24"><g transform="rotate({rot} 12 12)"><path d="M12 2 L14 9 L21 13 L21 15 L14 13 L14 19 L16 21 L16 22 L12 21 L8 22 L8 21 L10 19 L10 13 L3 15 L3 13 L10 9 Z" fill="{color}" stroke="white" stroke-width="0.8"/></g></svg>"#,
            rot = key.heading
        );
        let url = format!("data:image/svg+xml;base64,{}", STANDARD.encode( svg.as_bytes()));

        IconDescriptor {
            key,
            rotation: key.heading,
            svg,
            url,
            size: [px,px],
            anchor: [half,half],
            popup_anchor: [0, -(half as i32)],
        }
    }
}

#[derive(Debug,Clone,PartialEq,Serialize)]
pub struct IconCacheStats {
    pub size: usize,
    pub max_size: usize,
    pub hits: u64,
    pub misses: u64,
    pub keys: Vec<IconKey>,
}

struct CacheEntry {
    icon: Arc<IconDescriptor>,
    last_access: u64,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<IconKey,CacheEntry>,
    tick: u64, // monotonic access counter
    hits: u64,
    misses: u64,
}

/// bounded LRU cache for aircraft icons. Lookups are cheap and thread safe, the cache can be
/// shared through an `Arc`
pub struct IconCache {
    max_entries: usize,
    state: Mutex<CacheState>,
}

impl IconCache {
    pub fn new ()->Self {
        Self::with_max_entries( DEFAULT_MAX_ENTRIES)
    }

    pub fn with_max_entries (max_entries: usize)->Self {
        let cache = IconCache { max_entries: max_entries.max(1), state: Mutex::new( CacheState::default()) };
        cache.prewarm();
        cache
    }

    pub fn max_entries (&self)->usize { self.max_entries }

    fn lock (&self)->MutexGuard<'_,CacheState> {
        // a panic while holding the lock cannot leave entries half updated
        self.state.lock().unwrap_or_else( |e| e.into_inner())
    }

    /// populate the eight principal headings for both selection states
    pub fn prewarm (&self) {
        for h in (0..360u16).step_by(45) {
            for selected in [false,true] {
                self.get_icon( Some(h as f64), selected);
            }
        }
    }

    pub fn get_icon (&self, heading: Option<f64>, selected: bool)->Arc<IconDescriptor> {
        let key = IconKey::new( heading, selected);
        let mut state = self.lock();

        state.tick += 1;
        let tick = state.tick;

        if let Some(e) = state.entries.get_mut( &key) {
            e.last_access = tick;
            let icon = e.icon.clone();
            state.hits += 1;
            return icon
        }

        state.misses += 1;
        if state.entries.len() >= self.max_entries {
            let lru = state.entries.iter().min_by_key( |(_,e)| e.last_access).map( |(k,_)| *k);
            if let Some(k) = lru {
                trace!("evicting icon {:?}", k);
                state.entries.remove( &k);
            }
        }

        let icon = Arc::new( IconDescriptor::create( key));
        state.entries.insert( key, CacheEntry { icon: icon.clone(), last_access: tick });
        icon
    }

    pub fn len (&self)->usize { self.lock().entries.len() }

    pub fn is_empty (&self)->bool { self.lock().entries.is_empty() }

    pub fn contains (&self, key: &IconKey)->bool { self.lock().entries.contains_key( key) }

    pub fn stats (&self)->IconCacheStats {
        let state = self.lock();
        let mut keys: Vec<IconKey> = state.entries.keys().copied().collect();
        keys.sort();
        IconCacheStats { size: state.entries.len(), max_size: self.max_entries, hits: state.hits, misses: state.misses, keys }
    }

    pub fn clear (&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.hits = 0;
        state.misses = 0;
    }
}

impl Default for IconCache {
    fn default()->Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_bucket () {
        assert_eq!( heading_bucket(None), 0);
        assert_eq!( heading_bucket(Some(f64::NAN)), 0);
        assert_eq!( heading_bucket(Some(0.0)), 0);
        assert_eq!( heading_bucket(Some(4.9)), 0);
        assert_eq!( heading_bucket(Some(5.1)), 10);
        assert_eq!( heading_bucket(Some(356.0)), 0);
        assert_eq!( heading_bucket(Some(370.0)), 10);
        assert_eq!( heading_bucket(Some(-90.0)), 270);
    }

    #[test]
    fn test_descriptor () {
        let icon = IconDescriptor::create( IconKey { heading: 90, selected: true });
        assert_eq!( icon.rotation, 90);
        assert_eq!( icon.size, [28,28]);
        assert_eq!( icon.anchor, [14,14]);
        assert_eq!( icon.popup_anchor, [0,-14]);
        assert!( icon.url.starts_with("data:image/svg+xml;base64,"));
        assert!( icon.svg.contains("rotate(90 12 12)"));
    }
}
