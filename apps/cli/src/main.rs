// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! FrontMesh CLI: meshes a demonstration boundary and prints the statistics.
//!
//! Usage:
//!   frontmesh square [--divisions N] [--h X] [--rules FILE]
//!   frontmesh tetrahedron [--h X] [--rules FILE]
//!
//! Mesher tolerances are read from `FRONTMESH_*` environment variables and
//! log verbosity from `RUST_LOG`.

use std::env;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use frontmesh_engine::{MeshingConfig, MeshingStats, SurfaceMesher, SurfaceRules, VolumeMesher, VolumeRules};
use frontmesh_geometry::{PlanarBoundary, UniformSize};
use nalgebra::Point3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Square,
    Tetrahedron,
}

#[derive(Debug, Clone)]
struct Options {
    shape: Shape,
    divisions: usize,
    h: Option<f64>,
    rules: Option<PathBuf>,
}

fn print_usage() {
    eprintln!("FrontMesh - rule-based advancing-front mesher");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  frontmesh square [--divisions N] [--h X] [--rules FILE]");
    eprintln!("  frontmesh tetrahedron [--h X] [--rules FILE]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --divisions N   Boundary segments per square side (default: 1)");
    eprintln!("  --h X           Target edge length (default: side / divisions)");
    eprintln!("  --rules FILE    Rule file to use instead of the built-in rules");
}

fn value<T: FromStr>(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<T> {
    let raw = args.next().with_context(|| format!("{} needs a value", flag))?;
    raw.parse()
        .map_err(|_| anyhow::anyhow!("invalid value for {}: {}", flag, raw))
}

/// `None` when help was requested.
fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Option<Options>> {
    let mut args = args.into_iter();
    let shape = match args.next().as_deref() {
        Some("square") => Shape::Square,
        Some("tetrahedron") => Shape::Tetrahedron,
        Some("--help") | Some("-h") | None => return Ok(None),
        Some(other) => bail!("unknown shape: {}", other),
    };

    let mut options = Options {
        shape,
        divisions: 1,
        h: None,
        rules: None,
    };
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--divisions" => options.divisions = value(&mut args, "--divisions")?,
            "--h" => options.h = Some(value(&mut args, "--h")?),
            "--rules" => options.rules = Some(value(&mut args, "--rules")?),
            "--help" | "-h" => return Ok(None),
            other => bail!("unknown option: {}", other),
        }
    }
    if options.divisions == 0 {
        bail!("--divisions must be at least 1");
    }
    Ok(Some(options))
}

fn read_rules(path: &Option<PathBuf>) -> Result<Option<String>> {
    path.as_ref()
        .map(|p| fs::read_to_string(p).with_context(|| format!("reading {}", p.display())))
        .transpose()
}

/// Counter-clockwise boundary of the unit square, `divisions` segments per side.
fn square_boundary(divisions: usize) -> Vec<Point3<f64>> {
    let n = divisions as f64;
    let corners = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
    (0..4)
        .flat_map(|side| {
            let (x0, y0) = corners[side];
            let (x1, y1) = corners[(side + 1) % 4];
            (0..divisions).map(move |i| {
                let t = i as f64 / n;
                Point3::new(x0 + (x1 - x0) * t, y0 + (y1 - y0) * t, 0.0)
            })
        })
        .collect()
}

fn mesh_square(options: &Options, config: MeshingConfig) -> Result<MeshingStats> {
    let rules = match read_rules(&options.rules)? {
        Some(text) => text.parse::<SurfaceRules>()?,
        None => SurfaceRules::builtin_triangles()?,
    };
    let h = options.h.unwrap_or(1.0 / options.divisions as f64);

    let mut mesher = SurfaceMesher::new(&rules, config);
    let points: Vec<usize> = square_boundary(options.divisions)
        .into_iter()
        .map(|p| mesher.add_point(p))
        .collect();
    for (i, &from) in points.iter().enumerate() {
        mesher.add_boundary_element(from, points[(i + 1) % points.len()], 0)?;
    }

    let stats = mesher.generate(&PlanarBoundary::xy(), h)?;
    tracing::info!(area = mesher.mesh().surface_area(), "square meshed");
    Ok(stats)
}

fn mesh_tetrahedron(options: &Options, config: MeshingConfig) -> Result<MeshingStats> {
    let rules = match read_rules(&options.rules)? {
        Some(text) => text.parse::<VolumeRules>()?,
        None => VolumeRules::builtin_tetrahedra()?,
    };
    let s = 3f64.sqrt();
    let corners = [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(0.5, s / 2.0, 0.0),
        Point3::new(0.5, s / 6.0, (2.0f64 / 3.0).sqrt()),
    ];

    let mut mesher = VolumeMesher::new(&rules, config);
    let points: Vec<usize> = corners.into_iter().map(|p| mesher.add_point(p)).collect();
    for face in [[0, 1, 2], [0, 3, 1], [1, 3, 2], [2, 3, 0]] {
        let face: Vec<usize> = face.iter().map(|&i| points[i]).collect();
        mesher.add_boundary_face(&face, 0)?;
    }

    let stats = mesher.generate(&UniformSize, options.h.unwrap_or(1.0))?;
    tracing::info!(volume = mesher.mesh().volume(), "tetrahedron meshed");
    Ok(stats)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let Some(options) = parse_args(env::args().skip(1))? else {
        print_usage();
        return Ok(());
    };
    let config = MeshingConfig::from_env();
    tracing::debug!(?config, "configuration loaded");

    let stats = match options.shape {
        Shape::Square => mesh_square(&options, config)?,
        Shape::Tetrahedron => mesh_tetrahedron(&options, config)?,
    };
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
