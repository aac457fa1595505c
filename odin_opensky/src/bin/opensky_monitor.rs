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
use anyhow::{Result,anyhow};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use odin_opensky::{
    load_config, load_fallback, FlightTracker, OpenSkyClient, OpenSkyConfig, ViewportRegion, tracker::DEFAULT_ZOOM
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = "monitor live OpenSky aircraft for a viewport")]
pub struct Args {
    /// RON config file (path or name within config dir)
    #[arg(short,long, default_value = "opensky.ron")]
    pub config: String,

    /// viewport bounds in degrees: NORTH SOUTH EAST WEST (default is global)
    #[arg(short,long, num_args=4, allow_negative_numbers=true, value_names=["NORTH","SOUTH","EAST","WEST"])]
    pub bounds: Option<Vec<f64>>,

    #[arg(short,long, default_value_t = DEFAULT_ZOOM)]
    pub zoom: u32,

    /// number of refresh cycles to run before exiting
    #[arg(short='n',long, default_value_t = 1)]
    pub cycles: u64,

    /// print snapshots as JSON
    #[arg(long)]
    pub json: bool,

    /// icao24 address to look up after the last cycle
    #[arg(short,long)]
    pub search: Option<String>,
}

#[tokio::main]
async fn main()->Result<()> {
    tracing_subscriber::fmt().with_env_filter( EnvFilter::from_default_env()).init();

    let args = Args::parse();

    let config: OpenSkyConfig = load_config( &args.config)?;
    let config = Arc::new( config);

    let viewport = match &args.bounds {
        Some(b) if b.len() == 4 => Some( ViewportRegion::new( b[0], b[1], b[2], b[3])?),
        Some(_) => return Err( anyhow!("bounds need 4 values")),
        None => None
    };

    let client = Arc::new( OpenSkyClient::new( config.clone())?);
    let mut tracker = FlightTracker::new( config.clone(), client).with_viewport( viewport, args.zoom);
    if let Some(path) = &config.fallback {
        tracker = tracker.with_fallback( load_fallback( path)?);
    }

    let (hself, jh) = tracker.spawn();
    let mut rx = hself.subscribe();

    for n in 1..=args.cycles {
        rx.wait_for( |c| *c >= n).await?;

        let snap = hself.snapshot();
        let status = hself.status();

        if args.json {
            println!("{}", serde_json::to_string_pretty( &*snap)?);
        } else {
            println!("------------------ cycle {} at {}", snap.cycle, snap.created);
            if let Some(e) = &status.error { println!("error: {e}"); }
            println!("{} aircraft (max {}), {} clusters", status.total, status.max_for_zoom, snap.clusters.len());

            for c in &snap.clusters {
                println!("  cluster {} at {}: {} aircraft ({:?})", c.id, c.centroid, c.count(), c.size);
            }
            for ac in snap.unclustered_aircraft() {
                println!("  {}", ac);
            }
        }
    }

    if let Some(key) = &args.search {
        match hself.search( key).await? {
            Some(ac) => println!("found: {ac}"),
            None => println!("no aircraft {key}")
        }
    }

    hself.terminate().await?;
    jh.await?;

    Ok(())
}
