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

use std::sync::Arc;
use anyhow::Result;
use tracing_subscriber::EnvFilter;
use odin_opensky::{load_config, FlightTracker, OpenSkyClient, OpenSkyConfig, ViewportRegion};

/// track the SF bay area until interrupted
#[tokio::main]
async fn main()->Result<()> {
    tracing_subscriber::fmt().with_env_filter( EnvFilter::from_default_env()).init();

    let config: Arc<OpenSkyConfig> = Arc::new( load_config("opensky.ron")?);
    let client = Arc::new( OpenSkyClient::new( config.clone())?);
    let viewport = ViewportRegion::new( 38.2, 37.2, -121.7, -122.8)?;

    let (hself, _jh) = FlightTracker::new( config, client).with_viewport( Some(viewport), 9).spawn();
    let mut rx = hself.subscribe();

    while rx.changed().await.is_ok() {
        let snap = hself.snapshot();
        let status = hself.status();
        println!("------------------ {} ({} aircraft)", snap.created, snap.len());
        if let Some(e) = &status.error { println!("{e}"); }

        for ac in &snap.aircraft {
            let icon = hself.icon_for( ac);
            println!("{} [icon {}°]", ac, icon.rotation);
        }
    }

    Ok(())
}
