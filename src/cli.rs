use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;

use crate::dims::DimsSnapshot;
use crate::layers::LayerKind;
use crate::scene::load_scene;
use crate::viewer::ViewerModel;


#[derive(Debug, Parser)]
#[command(
    name = "ndview",
    version,
    about = "Layered n-dimensional array viewer: slice scenes and export SVG"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Slicing overrides applied after the scene is loaded.
#[derive(Debug, clap::Args)]
struct ViewArgs {
    /// Slider position as AXIS=VALUE; repeatable.
    #[arg(long = "point", value_parser = parse_point)]
    points: Vec<(usize, f64)>,
    #[arg(long)]
    ndisplay: Option<usize>,
    /// Axis order as a comma separated permutation, e.g. 2,0,1.
    #[arg(long, value_delimiter = ',')]
    order: Option<Vec<usize>>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Prints the reconciled dims and per-layer state as JSON.
    Inspect {
        #[arg(long)]
        scene: PathBuf,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Writes the current slice of every visible layer as SVG.
    Svg {
        #[arg(long)]
        scene: PathBuf,
        #[arg(long)]
        output: PathBuf,
        #[command(flatten)]
        view: ViewArgs,
    },
}

#[derive(Debug, Serialize)]
struct LayerInfo {
    name: String,
    kind: LayerKind,
    ndim: usize,
    visible: bool,
    opacity: f32,
    extent: Vec<(f64, f64)>,
    order: Vec<usize>,
    point: Vec<f64>,
    selected: bool,
}

#[derive(Debug, Serialize)]
struct SceneInfo {
    title: String,
    dims: DimsSnapshot,
    active_layer: Option<String>,
    status: String,
    layers: Vec<LayerInfo>,
}

pub fn run_cli() -> Result<(), String> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect { scene, view } => {
            let mut viewer = load_scene(&scene).map_err(|error| error.to_string())?;
            apply_view(&mut viewer, view)?;
            let info = scene_info(&viewer);
            println!(
                "{}",
                serde_json::to_string_pretty(&info).map_err(|error| error.to_string())?
            );
        }
        Commands::Svg {
            scene,
            output,
            view,
        } => {
            let mut viewer = load_scene(&scene).map_err(|error| error.to_string())?;
            apply_view(&mut viewer, view)?;
            let svg = viewer.to_svg(None).map_err(|error| error.to_string())?;
            fs::write(&output, svg).map_err(|error| error.to_string())?;
            println!("{}", json!({"status": "ok", "output": output}));
        }
    }

    Ok(())
}

fn apply_view(viewer: &mut ViewerModel, view: ViewArgs) -> Result<(), String> {
    if let Some(ndisplay) = view.ndisplay {
        viewer
            .set_ndisplay(ndisplay)
            .map_err(|error| error.to_string())?;
    }
    if let Some(order) = view.order {
        viewer.set_order(order).map_err(|error| error.to_string())?;
    }
    for (axis, value) in view.points {
        viewer
            .set_point(axis, value)
            .map_err(|error| error.to_string())?;
    }
    Ok(())
}

fn scene_info(viewer: &ViewerModel) -> SceneInfo {
    let active = viewer.active_layer_index();
    SceneInfo {
        title: viewer.title().to_string(),
        dims: viewer.dims().snapshot(),
        active_layer: active
            .and_then(|index| viewer.layers().get(index))
            .map(|layer| layer.name().to_string()),
        status: viewer.status().to_string(),
        layers: viewer
            .layers()
            .iter()
            .map(|layer| {
                let base = layer.base();
                LayerInfo {
                    name: layer.name().to_string(),
                    kind: layer.kind(),
                    ndim: layer.ndim(),
                    visible: base.visible(),
                    opacity: base.opacity(),
                    extent: layer.extent(),
                    order: base.dims().order().to_vec(),
                    point: base.dims().point().to_vec(),
                    selected: base.selected(),
                }
            })
            .collect(),
    }
}

fn parse_point(raw: &str) -> Result<(usize, f64), String> {
    let (axis, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected AXIS=VALUE, got `{raw}`"))?;
    let axis = axis
        .trim()
        .parse::<usize>()
        .map_err(|error| format!("invalid axis `{axis}`: {error}"))?;
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|error| format!("invalid value `{value}`: {error}"))?;
    Ok((axis, value))
}
