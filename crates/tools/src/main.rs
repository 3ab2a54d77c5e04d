use std::env;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use formats::{LayerManifest, MapStyle};
use foundation::GeoPoint;
use futures::executor::LocalPool;
use gpu::HeadlessSurface;
use layers::{
    AssetId, AssetStatus, AttachContext, FrameOutcome, HostCameraMatrix, ModelLayer,
    RepaintCounter, WorldTransform, resolve_anchor,
};
use serde::Serialize;
use tools::{MapCamera, MapView, NOMINATIM_URL, geocode, project_to_ndc};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Anchor 3D models to geographic points on a web map")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the projected anchor, meter scale and world transform for a point
    Anchor {
        #[arg(allow_negative_numbers = true)]
        longitude: f64,
        #[arg(allow_negative_numbers = true)]
        latitude: f64,
        /// Altitude in meters
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        alt: f64,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Attach a layer to a headless map, load its assets and render frames
    Simulate {
        /// Layer manifest (JSON); the built-in sample when omitted
        #[arg(long)]
        manifest: Option<PathBuf>,

        #[arg(long, default_value_t = 60)]
        frames: u32,

        #[arg(long, default_value_t = 18.0)]
        zoom: f64,

        #[arg(long, default_value_t = 60.0)]
        pitch: f64,

        /// Starting bearing; the camera orbits one degree per frame
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        bearing: f64,

        #[arg(long, default_value_t = 1280)]
        width: u32,

        #[arg(long, default_value_t = 720)]
        height: u32,

        /// Seconds to wait for asset loads before the first frame
        #[arg(long, default_value_t = 30)]
        asset_timeout: u64,

        /// Base-map style preset, overriding the manifest's
        #[arg(long)]
        style: Option<String>,

        /// MapTiler key for the style URL (default: $MAPTILER_KEY)
        #[arg(long)]
        api_key: Option<String>,
    },

    /// List map style presets and their style document URLs
    Styles {
        /// MapTiler key (default: $MAPTILER_KEY)
        #[arg(long)]
        api_key: Option<String>,
    },

    /// Resolve a free-text address to coordinates
    Geocode {
        query: String,

        #[arg(long, default_value = NOMINATIM_URL)]
        endpoint: String,
    },

    /// Write the sample layer manifest
    Init {
        #[arg(default_value = "layer.json")]
        out: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    match args.command {
        Command::Anchor {
            longitude,
            latitude,
            alt,
            json,
        } => cmd_anchor(GeoPoint::new(longitude, latitude, alt), json)?,
        Command::Simulate {
            manifest,
            frames,
            zoom,
            pitch,
            bearing,
            width,
            height,
            asset_timeout,
            style,
            api_key,
        } => {
            let mut manifest = match manifest {
                Some(path) => LayerManifest::load(&path)?,
                None => LayerManifest::sample(),
            };
            let key = api_key
                .or_else(|| env::var("MAPTILER_KEY").ok())
                .unwrap_or_default();
            println!("base map {}", base_map(&mut manifest, style.as_deref(), &key));
            let view = MapView {
                center: manifest.anchor,
                zoom,
                pitch_deg: pitch,
                bearing_deg: bearing,
            };
            let camera = MapCamera::new(view, f64::from(width), f64::from(height));
            cmd_simulate(manifest, camera, frames, Duration::from_secs(asset_timeout))?
        }
        Command::Styles { api_key } => {
            let key = api_key
                .or_else(|| env::var("MAPTILER_KEY").ok())
                .unwrap_or_default();
            for style in MapStyle::ALL {
                println!("{}\t{}", style.name(), style.style_url(&key));
            }
        }
        Command::Geocode { query, endpoint } => {
            let runtime = tokio::runtime::Runtime::new()?;
            let client = reqwest::Client::new();
            match runtime.block_on(geocode(&client, &endpoint, &query))? {
                Some(hit) => {
                    println!(
                        "{}\t{:.6}\t{:.6}",
                        hit.display_name, hit.point.longitude, hit.point.latitude
                    );
                    let view = MapView::centered_on(hit.point);
                    println!("{}", serde_json::to_string_pretty(&view)?);
                }
                None => println!("no match for {query:?}"),
            }
        }
        Command::Init { out } => cmd_init(&out)?,
    }

    Ok(())
}

/// Applies a style override to `manifest` and describes the resulting base map.
fn base_map(manifest: &mut LayerManifest, style: Option<&str>, api_key: &str) -> String {
    if let Some(name) = style {
        manifest.style = MapStyle::from_name(name);
    }
    format!("{} ({})", manifest.style.name(), manifest.style.style_url(api_key))
}

#[derive(Serialize)]
struct AnchorReport {
    anchor: GeoPoint,
    mercator: [f64; 3],
    unit_scale: f64,
    world_transform: [f64; 16],
}

fn cmd_anchor(point: GeoPoint, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let anchor = resolve_anchor(point)?;
    let world = WorldTransform::build(&anchor);
    let report = AnchorReport {
        anchor: point,
        mercator: [anchor.x, anchor.y, anchor.z],
        unit_scale: anchor.unit_scale,
        world_transform: world.to_cols_array(),
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    println!("mercator   {:.12} {:.12} {:.3e}", anchor.x, anchor.y, anchor.z);
    println!("unit scale {:.6e} per meter", anchor.unit_scale);
    println!("world transform (rows):");
    let m = world.matrix().transpose();
    for row in [m.x_axis, m.y_axis, m.z_axis, m.w_axis] {
        println!("  {:>14.6e} {:>14.6e} {:>14.6e} {:>14.6e}", row.x, row.y, row.z, row.w);
    }
    Ok(())
}

fn cmd_simulate(
    manifest: LayerManifest,
    mut camera: MapCamera,
    frames: u32,
    asset_timeout: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    // reqwest needs a reactor; the layer's tasks run on the local pool below.
    let runtime = tokio::runtime::Runtime::new()?;
    let _guard = runtime.enter();

    let mut pool = LocalPool::new();
    let host = Rc::new(RepaintCounter::new());
    let surface = HeadlessSurface::new();
    let probe = surface.probe();
    let mut layer = ModelLayer::new(manifest)?;
    layer.attach(AttachContext {
        surface: Box::new(surface),
        host: host.clone(),
        spawner: Rc::new(pool.spawner()),
    })?;

    let deadline = Instant::now() + asset_timeout;
    loop {
        pool.run_until_stalled();
        layer.poll_assets()?;
        let pending = (0..layer.asset_count())
            .filter(|i| matches!(layer.asset_status(AssetId(*i)), Some(AssetStatus::Pending)))
            .count();
        if pending == 0 {
            break;
        }
        if Instant::now() >= deadline {
            warn!(pending, "asset timeout reached, rendering without them");
            break;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    for i in 0..layer.asset_count() {
        match layer.asset_status(AssetId(i)) {
            Some(AssetStatus::Loaded { roots }) => info!(asset = i, instances = roots.len(), "asset ready"),
            Some(AssetStatus::Failed { error }) => warn!(asset = i, %error, "asset missing"),
            _ => {}
        }
    }

    let anchor = layer.anchor().translation();
    let start_bearing = camera.view.bearing_deg;
    for frame in 0..frames {
        camera.view.bearing_deg = start_bearing + f64::from(frame);
        let matrix = HostCameraMatrix::from_cols_array(&camera.host_matrix()?);
        pool.run_until_stalled();
        let report = layer.render_frame(&matrix)?;
        let ndc = project_to_ndc(matrix.as_mat4(), anchor);
        match (&report.outcome, ndc) {
            (FrameOutcome::Rendered(stats), Some(ndc)) => println!(
                "frame {:>4}  bearing {:>6.1}  draws {:>3}  anchor ndc ({:+.4}, {:+.4})",
                report.frame, camera.view.bearing_deg, stats.draw_calls, ndc.x, ndc.y
            ),
            (FrameOutcome::Rendered(stats), None) => println!(
                "frame {:>4}  bearing {:>6.1}  draws {:>3}  anchor behind camera",
                report.frame, camera.view.bearing_deg, stats.draw_calls
            ),
            (FrameOutcome::Skipped(err), _) => {
                println!("frame {:>4}  skipped: {err}", report.frame)
            }
        }
    }

    let metrics = layer.metrics().snapshot();
    layer.detach()?;
    println!(
        "submitted {} frames, {} repaint requests",
        probe.frames_submitted(),
        host.requests()
    );
    for (name, value) in metrics.counters {
        println!("  {name:<26} {value}");
    }
    Ok(())
}

fn cmd_init(out: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let manifest = LayerManifest::sample();
    std::fs::write(out, manifest.to_json_pretty()?)?;
    info!(path = %out.display(), layer = %manifest.layer_id, "wrote sample manifest");
    println!("wrote {}", out.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::base_map;
    use formats::{LayerManifest, MapStyle};
    use pretty_assertions::assert_eq;

    #[test]
    fn base_map_follows_the_manifest_unless_overridden() {
        let mut manifest = LayerManifest::sample();
        assert_eq!(
            base_map(&mut manifest, None, "k"),
            "satellite (https://api.maptiler.com/maps/satellite/style.json?key=k)"
        );

        assert!(base_map(&mut manifest, Some("Terrain"), "k").starts_with("terrain ("));
        assert_eq!(manifest.style, MapStyle::Terrain);

        base_map(&mut manifest, Some("no-such-style"), "k");
        assert_eq!(manifest.style, MapStyle::Topographic);
    }
}
