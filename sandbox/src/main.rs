// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Vitrine Sandbox
// Loads sample models through the resource cache with several concurrent
// consumers per model and reports GPU accounting and cache metrics.

mod catalog;

use anyhow::{Context, Result};
use catalog::SampleCatalog;
use clap::Parser;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use vitrine_cache::{CacheConfig, CheckoutHandle, ResourceCache, METRICS_NAMESPACE};
use vitrine_core::{LoadProgress, TrackingDevice};
use vitrine_lanes::{FileSystemResolver, FileSystemSource, GltfSceneDecoder, PipelineLoader};
use vitrine_telemetry::MetricsRegistry;

#[derive(Debug, Parser)]
#[command(name = "sandbox", about = "Exercise the Vitrine resource cache")]
struct Args {
    /// Directory that asset identifiers are resolved against.
    #[arg(long, default_value = "public")]
    assets: PathBuf,

    /// Cache configuration file (RON). Defaults to sandbox/vitrine.ron.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Consumers acquiring each model at the same time.
    #[arg(long, default_value_t = 3)]
    consumers: usize,

    /// Asset identifiers to load. Defaults to one pass over the samples.
    models: Vec<String>,
}

fn load_config(explicit: Option<&Path>) -> Result<CacheConfig> {
    if let Some(path) = explicit {
        return CacheConfig::load(path)
            .with_context(|| format!("Failed to load config '{}'", path.display()));
    }
    let default = Path::new(env!("CARGO_MANIFEST_DIR")).join("vitrine.ron");
    if default.exists() {
        Ok(CacheConfig::load(&default)?)
    } else {
        log::info!("No config file found, using defaults");
        Ok(CacheConfig::default())
    }
}

/// Acquires `model` from `consumers` tasks at once, edits every copy and
/// releases them all.
async fn showcase(cache: &ResourceCache, model: &str, consumers: usize) {
    let tasks: Vec<_> = (0..consumers)
        .map(|consumer| {
            let cache = cache.clone();
            let model = model.to_owned();
            let label = model.clone();
            let report = move |p: LoadProgress| {
                if let Some(percent) = p.percent() {
                    log::debug!("[consumer {consumer}] {label}: {percent:.0}%");
                }
            };
            tokio::spawn(async move { cache.acquire_with_progress(model, report).await })
        })
        .collect();

    let mut handles: Vec<CheckoutHandle> = Vec::new();
    for task in tasks {
        match task.await {
            Ok(Ok(handle)) => handles.push(handle),
            Ok(Err(e)) => log::warn!("{e}"),
            Err(e) => log::error!("Consumer task failed: {e}"),
        }
    }
    if handles.is_empty() {
        return;
    }

    for (i, handle) in handles.iter_mut().enumerate() {
        let graph = handle.root_mut();
        // per-consumer placement, invisible to the other copies
        if let Some(&root) = graph.roots().first() {
            if let Some(node) = graph.node_mut(root) {
                node.transform.translation.x = i as f32 * 2.0;
            }
        }
    }
    let graph = handles[0].root();
    log::info!(
        "'{model}': {} copies of {} nodes / {} meshes",
        handles.len(),
        graph.len(),
        graph.mesh_count()
    );

    for handle in handles {
        if let Err(e) = cache.release(handle) {
            log::error!("{e}");
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    let device = Arc::new(TrackingDevice::new());
    let decoder =
        GltfSceneDecoder::with_resolver(Arc::new(FileSystemResolver::new(&args.assets)));
    let loader = PipelineLoader::new(
        FileSystemSource::new(&args.assets),
        decoder,
        device.clone(),
    );
    let registry = MetricsRegistry::new();
    let cache = ResourceCache::with_metrics(Arc::new(loader), config, &registry)?;

    let models: Vec<String> = if args.models.is_empty() {
        SampleCatalog::new().pass().into_iter().map(String::from).collect()
    } else {
        args.models
    };
    for model in &models {
        showcase(&cache, model, args.consumers.max(1)).await;
    }

    let stats = device.stats();
    log::info!(
        "Before eviction: {} cached, {} live resources ({} bytes, peak {})",
        cache.cached_ids().len(),
        stats.live_resources,
        stats.live_bytes,
        stats.peak_bytes
    );
    let evicted = cache.evict_all_unused();
    let stats = device.stats();
    log::info!(
        "Evicted {evicted} asset(s): {} live resources, {} allocations, {} frees, {} invalid frees",
        stats.live_resources,
        stats.total_allocations,
        stats.total_frees,
        stats.invalid_frees
    );

    println!("{}", registry.namespace_to_json(METRICS_NAMESPACE)?);
    Ok(())
}
