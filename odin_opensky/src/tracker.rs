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
use arc_swap::{ArcSwap,ArcSwapOption};
use chrono::{DateTime,Utc};
use serde::Serialize;
use tokio::{sync::{mpsc,watch}, task::JoinHandle, time::{interval,MissedTickBehavior}};
use tracing::{debug,info,warn};

use crate::{
    Aircraft, OpenSkyConfig, StateConnector,
    cluster,
    errors::{OdinOpenSkyError, Result},
    icon_cache::{IconCache, IconDescriptor},
    prioritizer::{self, budget_for_zoom},
    store::{EntityRepository, Snapshot},
    viewport::{self, ViewportAggregator, ViewportRegion},
};

/// zoom level we use if none was set
pub const DEFAULT_ZOOM: u32 = 6;

const MSG_QUEUE_LEN: usize = 16;

#[derive(Debug)]
enum TrackerMsg {
    Refresh,
    SetViewport { viewport: Option<ViewportRegion>, zoom: u32 },
    Terminate,
}

/// what a renderer shows besides the aircraft themselves
#[derive(Debug,Clone,Default,PartialEq,Serialize)]
pub struct TrackerStatus {
    pub loading: bool,
    pub error: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
    pub total: usize, // number of aircraft in the current snapshot
    pub max_for_zoom: usize, // current prioritizer budget
    pub cycle: u64,
}

#[derive(Debug,Clone,Copy)]
struct ViewState {
    viewport: Option<ViewportRegion>,
    zoom: u32,
}

/// state shared between the tracker task and its handles
struct TrackerShared<C: StateConnector> {
    connector: Arc<C>,
    repository: EntityRepository,
    status: ArcSwap<TrackerStatus>,
    view: ArcSwap<ViewState>,
    selected: ArcSwapOption<String>,
    icons: Arc<IconCache>,
    cycle_tx: watch::Sender<u64>,
    max_age: Duration,
}

/// builder and run loop for the periodic refresh cycle. Each cycle fetches the (buffered) viewport
/// aircraft, filters, prioritizes and clusters them, and then publishes a new [`Snapshot`].
/// Cycles never overlap - refresh requests that arrive while a cycle is running are processed after it
pub struct FlightTracker<C: StateConnector> {
    config: Arc<OpenSkyConfig>,
    connector: Arc<C>,
    fallback: Option<Vec<Aircraft>>,
    view: ViewState,
    icons: Option<Arc<IconCache>>,
}

impl<C: StateConnector> FlightTracker<C> {
    pub fn new (config: Arc<OpenSkyConfig>, connector: Arc<C>)->Self {
        FlightTracker {
            config,
            connector,
            fallback: None,
            view: ViewState { viewport: None, zoom: DEFAULT_ZOOM },
            icons: None
        }
    }

    /// aircraft to show if the upstream fails before we ever got data
    pub fn with_fallback (mut self, fallback: Vec<Aircraft>)->Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn with_viewport (mut self, viewport: Option<ViewportRegion>, zoom: u32)->Self {
        self.view = ViewState { viewport, zoom };
        self
    }

    pub fn with_icon_cache (mut self, icons: Arc<IconCache>)->Self {
        self.icons = Some(icons);
        self
    }

    /// start the tracker task. This has to be called from within a tokio runtime. The first cycle
    /// starts immediately
    pub fn spawn (self)->(TrackerHandle<C>, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel( MSG_QUEUE_LEN);
        let (cycle_tx, _) = watch::channel( 0u64);

        let shared = Arc::new( TrackerShared {
            connector: self.connector.clone(),
            repository: EntityRepository::new(),
            status: ArcSwap::from_pointee( TrackerStatus { max_for_zoom: budget_for_zoom( self.view.zoom), ..Default::default() }),
            view: ArcSwap::from_pointee( self.view),
            selected: ArcSwapOption::empty(),
            icons: self.icons.unwrap_or_else( || Arc::new( IconCache::new())),
            cycle_tx,
            max_age: self.config.max_age,
        });

        let worker = TrackerWorker {
            shared: shared.clone(),
            aggregator: ViewportAggregator::new( self.connector, self.config.max_age),
            fallback: self.fallback,
            cycle: 0,
        };

        let jh = tokio::spawn( run( worker, rx, self.config.refresh_interval));
        (TrackerHandle { tx, shared }, jh)
    }
}

async fn run<C: StateConnector> (mut worker: TrackerWorker<C>, mut rx: mpsc::Receiver<TrackerMsg>, refresh_interval: Duration) {
    let mut timer = interval( refresh_interval);
    timer.set_missed_tick_behavior( MissedTickBehavior::Delay);
    info!("flight tracker started with refresh interval {:?}", refresh_interval);

    loop {
        tokio::select! {
            _ = timer.tick() => {
                worker.update().await;
            }
            msg = rx.recv() => match msg {
                Some(TrackerMsg::Refresh) => {
                    worker.update().await;
                    timer.reset();
                }
                Some(TrackerMsg::SetViewport{viewport,zoom}) => {
                    worker.shared.view.store( Arc::new( ViewState{viewport,zoom}));
                    worker.update().await;
                    timer.reset();
                }
                Some(TrackerMsg::Terminate) | None => break
            }
        }
    }
    info!("flight tracker terminated");
}

struct TrackerWorker<C: StateConnector> {
    shared: Arc<TrackerShared<C>>,
    aggregator: ViewportAggregator<C>,
    fallback: Option<Vec<Aircraft>>,
    cycle: u64,
}

impl<C: StateConnector> TrackerWorker<C> {
    async fn update (&mut self) {
        self.cycle += 1;
        let cycle = self.cycle;
        let view = **self.shared.view.load();
        let max_for_zoom = budget_for_zoom( view.zoom);

        self.shared.status.rcu( |s| TrackerStatus { loading: true, error: None, max_for_zoom, cycle, ..(**s).clone() });

        match self.aggregator.aggregate( view.viewport.as_ref(), view.zoom).await {
            Ok(result) => {
                let aircraft = prioritizer::select( result.aircraft, view.zoom, Utc::now());
                let clustering = cluster::cluster( &aircraft, view.zoom);
                let snapshot = Snapshot::new( cycle, view.zoom, result.region, aircraft, clustering);
                let total = snapshot.len();
                debug!("cycle {}: {} aircraft ({} received), {} clusters", cycle, total, result.n_received, snapshot.clusters.len());

                self.shared.repository.replace( snapshot);
                self.shared.status.store( Arc::new( TrackerStatus {
                    loading: false, error: None, last_updated: Some(Utc::now()), total, max_for_zoom, cycle
                }));
            }
            Err(e) => {
                warn!("cycle {} failed: {}", cycle, e);

                let (error, installed) = match &self.fallback {
                    Some(fallback) if self.shared.repository.is_empty() => {
                        // static data is not checked for age, but it still has to be placeable
                        let aircraft: Vec<Aircraft> = fallback.iter().filter( |ac| ac.is_placeable()).cloned().collect();
                        let clustering = cluster::cluster( &aircraft, view.zoom);
                        self.shared.repository.replace( Snapshot::new( cycle, view.zoom, None, aircraft, clustering));
                        (format!("using fallback data - {e}"), Some(Utc::now()))
                    }
                    _ => (e.to_string(), None)
                };

                let total = self.shared.repository.len();
                self.shared.status.rcu( |s| TrackerStatus {
                    loading: false,
                    error: Some(error.clone()),
                    last_updated: installed.or( s.last_updated),
                    total, max_for_zoom, cycle
                });
            }
        }

        self.shared.cycle_tx.send_replace( cycle);
    }
}

/// the consumer interface of a running [`FlightTracker`]. Handles are cheap to clone
pub struct TrackerHandle<C: StateConnector> {
    tx: mpsc::Sender<TrackerMsg>,
    shared: Arc<TrackerShared<C>>,
}

impl<C: StateConnector> Clone for TrackerHandle<C> {
    fn clone(&self)->Self {
        TrackerHandle { tx: self.tx.clone(), shared: self.shared.clone() }
    }
}

impl<C: StateConnector> TrackerHandle<C> {
    async fn send (&self, msg: TrackerMsg)->Result<()> {
        self.tx.send( msg).await.map_err( |_| OdinOpenSkyError::TrackerTerminatedError)
    }

    /// request an immediate cycle. This restarts the refresh interval
    pub async fn refresh (&self)->Result<()> {
        self.send( TrackerMsg::Refresh).await
    }

    /// change what we track. `None` queries all aircraft. Triggers an immediate cycle
    pub async fn set_viewport (&self, viewport: Option<ViewportRegion>, zoom: u32)->Result<()> {
        self.send( TrackerMsg::SetViewport{viewport,zoom}).await
    }

    pub async fn terminate (&self)->Result<()> {
        self.send( TrackerMsg::Terminate).await
    }

    pub fn snapshot (&self)->Arc<Snapshot> { self.shared.repository.snapshot() }

    pub fn status (&self)->Arc<TrackerStatus> { self.shared.status.load_full() }

    /// a receiver for the number of the last completed cycle (successful or not)
    pub fn subscribe (&self)->watch::Receiver<u64> { self.shared.cycle_tx.subscribe() }

    pub fn viewport (&self)->(Option<ViewportRegion>,u32) {
        let view = self.shared.view.load();
        (view.viewport, view.zoom)
    }

    /// look up an aircraft in the current snapshot, or ask upstream if we don't have it.
    /// Aircraft found upstream are returned in any case, but only added to the current snapshot if
    /// they could be shown (airborne, with position and not outdated). Errors are returned to the
    /// caller and do not change the tracker status
    pub async fn search (&self, icao24: &str)->Result<Option<Aircraft>> {
        let key = icao24.trim().to_lowercase();
        if let Some(ac) = self.shared.repository.get( &key) {
            return Ok(Some(ac))
        }

        let found = self.shared.connector.fetch_by_key( &key).await?;
        if let Some(ac) = &found {
            if viewport::is_valid( ac, Utc::now(), self.shared.max_age) {
                debug!("search found {} upstream", ac.icao24);
                self.shared.repository.upsert( ac.clone());
            } else {
                debug!("search found {} upstream, not placeable", ac.icao24);
            }
        }
        Ok(found)
    }

    /// the aircraft of a cluster in the current snapshot
    pub fn cluster_members (&self, id: usize)->Option<Vec<Aircraft>> {
        let snap = self.snapshot();
        snap.cluster( id).map( |c| c.members.iter().filter_map( |k| snap.get(k).cloned()).collect())
    }

    pub fn select (&self, icao24: Option<&str>) {
        self.shared.selected.store( icao24.map( |k| Arc::new( k.trim().to_lowercase())));
    }

    pub fn selected (&self)->Option<String> {
        self.shared.selected.load_full().map( |k| (*k).clone())
    }

    pub fn is_selected (&self, icao24: &str)->bool {
        match &*self.shared.selected.load() {
            Some(k) => k.as_str() == icao24,
            None => false
        }
    }

    /// the icon for `ac`, taking its heading and selection state into account
    pub fn icon_for (&self, ac: &Aircraft)->Arc<IconDescriptor> {
        self.shared.icons.get_icon( ac.true_track, self.is_selected( &ac.icao24))
    }

    pub fn icons (&self)->&Arc<IconCache> { &self.shared.icons }
}
