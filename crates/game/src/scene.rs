//! The scene inventory: a fixed, ordered list of renderables, each with its
//! literal transform pipeline, shading technique, and asset sources.
//!
//! [`blueprint`] builds the inventory as plain data (no GPU), [`load`]
//! instantiates it against the renderer. Dispatch order is list order; the
//! alpha-blended sun comes last.

use anyhow::{bail, Context, Result};
use engine_core::TransformOp;
use glam::{Vec2, Vec3};
use renderer::{BumpModel, FireModel, FireParams, Model, Renderer};
use std::path::Path;

/// Frame clear color.
pub const CLEAR_COLOR: [f64; 4] = [0.0, 0.0, 0.0, 1.0];

/// Ground height of the tree field.
const TREE_BASE_HEIGHT: f32 = -202.0;

/// The 200 tree placements ship as a data asset, not code.
const TREE_FIELD: &str = include_str!("../data/tree_field.ron");

/// The shading technique a scene entry is dispatched through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Technique {
    Textured,
    Lit,
    NormalMapped,
    Fire,
}

/// Asset sources for a scene entry, one variant per renderable kind.
#[derive(Debug, Clone)]
pub enum AssetSource {
    Plain {
        geometry: &'static str,
        texture: &'static str,
    },
    NormalMapped {
        geometry: &'static str,
        color: &'static str,
        normal: &'static str,
    },
    Layered {
        geometry: &'static str,
        fire: &'static str,
        noise: &'static str,
        alpha: &'static str,
    },
}

/// One entry of the scene inventory, before assets are loaded.
#[derive(Debug, Clone)]
pub struct NodeDesc {
    pub name: &'static str,
    pub source: AssetSource,
    pub technique: Technique,
    pub blend: bool,
    pub ops: Vec<TransformOp>,
    /// For instanced entries: per-instance world offsets applied after the
    /// shared op chain.
    pub placements: Option<Vec<Vec3>>,
}

impl NodeDesc {
    fn single(
        name: &'static str,
        source: AssetSource,
        technique: Technique,
        ops: Vec<TransformOp>,
    ) -> Self {
        Self {
            name,
            source,
            technique,
            blend: false,
            ops,
            placements: None,
        }
    }
}

/// Session constants for the fire technique.
pub fn fire_params() -> FireParams {
    FireParams {
        scroll_speeds: Vec3::new(0.5, 1.6, 2.0),
        scales: Vec3::new(1.0, 2.0, 3.0),
        distortion: [
            Vec2::new(0.1, 0.2),
            Vec2::new(0.1, 0.3),
            Vec2::new(0.1, 0.1),
        ],
        distortion_scale: 0.8,
        distortion_bias: 0.5,
    }
}

/// Parse the tree-field data asset into world-space placements.
fn load_tree_field() -> Result<Vec<Vec3>> {
    let pairs: Vec<(f32, f32)> =
        ron::from_str(TREE_FIELD).context("could not parse tree field asset")?;
    Ok(pairs
        .into_iter()
        .map(|(x, z)| Vec3::new(x, TREE_BASE_HEIGHT, z))
        .collect())
}

/// Build the fixed scene inventory in dispatch order.
pub fn blueprint() -> Result<Vec<NodeDesc>> {
    let satellite_axis = Vec3::new(0.2, 1.0, 0.0);

    let mut nodes = vec![
        NodeDesc::single(
            "floor",
            AssetSource::Plain {
                geometry: "assets/models/floor.txt",
                texture: "assets/textures/grass.png",
            },
            Technique::Textured,
            vec![
                TransformOp::Scale(Vec3::new(3.0, 1.0, 3.0)),
                TransformOp::Translate(Vec3::new(0.0, -200.0, 0.0)),
            ],
        ),
        NodeDesc::single(
            "rocket",
            AssetSource::Plain {
                geometry: "assets/models/rocket.txt",
                texture: "assets/textures/rocket.png",
            },
            Technique::Lit,
            vec![
                TransformOp::Scale(Vec3::splat(0.05)),
                TransformOp::Ascend {
                    base: Vec3::new(0.0, -200.0, 0.0),
                    rate: 0.2,
                },
            ],
        ),
    ];

    nodes.push(NodeDesc {
        name: "trees",
        source: AssetSource::Plain {
            geometry: "assets/models/tree.txt",
            texture: "assets/textures/tree.png",
        },
        technique: Technique::Lit,
        blend: false,
        ops: vec![
            TransformOp::Scale(Vec3::splat(0.05)),
            TransformOp::Translate(Vec3::new(-150.0, 0.0, 270.0)),
        ],
        placements: Some(load_tree_field()?),
    });

    nodes.push(NodeDesc::single(
        "satellite",
        AssetSource::Plain {
            geometry: "assets/models/satellite.txt",
            texture: "assets/textures/satellite.png",
        },
        Technique::Lit,
        vec![
            TransformOp::Scale(Vec3::splat(0.003)),
            TransformOp::SpinY { rate: -0.2 },
            TransformOp::Translate(Vec3::new(50.0, 0.0, 0.0)),
            TransformOp::Orbit {
                axis: satellite_axis,
                rate: 0.3,
            },
            TransformOp::Translate(Vec3::new(100.0, 0.0, 50.0)),
            TransformOp::Orbit {
                axis: Vec3::Y,
                rate: 0.2,
            },
        ],
    ));

    nodes.push(NodeDesc::single(
        "earth",
        AssetSource::NormalMapped {
            geometry: "assets/models/sphere.txt",
            color: "assets/textures/earth.png",
            normal: "assets/textures/earth_normal.png",
        },
        Technique::NormalMapped,
        vec![
            TransformOp::SpinY { rate: 1.0 / 3.0 },
            TransformOp::Translate(Vec3::new(100.0, 0.0, 50.0)),
            TransformOp::Orbit {
                axis: Vec3::Y,
                rate: 0.2,
            },
        ],
    ));

    nodes.push(NodeDesc::single(
        "saturn",
        AssetSource::Plain {
            geometry: "assets/models/sphere.txt",
            texture: "assets/textures/saturn.png",
        },
        Technique::Lit,
        vec![
            TransformOp::SpinY { rate: 1.0 / 3.0 },
            TransformOp::Translate(Vec3::new(300.0, 0.0, 50.0)),
            TransformOp::Orbit {
                axis: Vec3::Y,
                rate: 0.1,
            },
        ],
    ));

    nodes.push(NodeDesc::single(
        "saturn_ring",
        AssetSource::Plain {
            geometry: "assets/models/ring.txt",
            texture: "assets/textures/saturn_ring.png",
        },
        Technique::Lit,
        vec![
            TransformOp::SpinY { rate: -1.0 },
            TransformOp::Translate(Vec3::new(300.0, 0.0, 50.0)),
            TransformOp::Orbit {
                axis: Vec3::Y,
                rate: 0.1,
            },
        ],
    ));

    let mut sun = NodeDesc::single(
        "sun",
        AssetSource::Layered {
            geometry: "assets/models/sphere.txt",
            fire: "assets/textures/fire.png",
            noise: "assets/textures/noise.png",
            alpha: "assets/textures/alpha.png",
        },
        Technique::Fire,
        vec![
            TransformOp::Scale(Vec3::splat(1.5)),
            TransformOp::SpinY { rate: -1.0 },
            TransformOp::Translate(Vec3::new(0.0, 0.0, 50.0)),
        ],
    );
    sun.blend = true;
    nodes.push(sun);

    Ok(nodes)
}

/// A loaded renderable, matched to its technique at dispatch.
pub enum SceneAsset {
    Plain(Model),
    Bump(BumpModel),
    Fire(FireModel),
}

/// A runtime scene entry referencing a loaded asset by index.
pub struct SceneNode {
    pub name: &'static str,
    pub asset: usize,
    pub technique: Technique,
    pub blend: bool,
    pub ops: Vec<TransformOp>,
    pub placements: Option<Vec<Vec3>>,
}

/// Instantiate the inventory: load every asset in order, fail-fast.
pub fn load(renderer: &Renderer, descs: Vec<NodeDesc>) -> Result<(Vec<SceneAsset>, Vec<SceneNode>)> {
    let mut assets = Vec::with_capacity(descs.len());
    let mut nodes = Vec::with_capacity(descs.len());

    for desc in descs {
        let asset = match &desc.source {
            AssetSource::Plain { geometry, texture } => SceneAsset::Plain(
                renderer
                    .load_model(Path::new(geometry), Path::new(texture))
                    .with_context(|| format!("could not initialize the {} model", desc.name))?,
            ),
            AssetSource::NormalMapped {
                geometry,
                color,
                normal,
            } => SceneAsset::Bump(
                renderer
                    .load_bump_model(Path::new(geometry), Path::new(color), Path::new(normal))
                    .with_context(|| format!("could not initialize the {} model", desc.name))?,
            ),
            AssetSource::Layered {
                geometry,
                fire,
                noise,
                alpha,
            } => SceneAsset::Fire(
                renderer
                    .load_fire_model(
                        Path::new(geometry),
                        Path::new(fire),
                        Path::new(noise),
                        Path::new(alpha),
                    )
                    .with_context(|| format!("could not initialize the {} model", desc.name))?,
            ),
        };

        let matched = matches!(
            (&asset, desc.technique),
            (SceneAsset::Plain(_), Technique::Textured)
                | (SceneAsset::Plain(_), Technique::Lit)
                | (SceneAsset::Bump(_), Technique::NormalMapped)
                | (SceneAsset::Fire(_), Technique::Fire)
        );
        if !matched {
            bail!(
                "scene entry {} pairs technique {:?} with an incompatible asset",
                desc.name,
                desc.technique
            );
        }

        assets.push(asset);
        nodes.push(SceneNode {
            name: desc.name,
            asset: assets.len() - 1,
            technique: desc.technique,
            blend: desc.blend,
            ops: desc.ops,
            placements: desc.placements,
        });
    }

    Ok((assets, nodes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inventory_order_is_fixed() {
        let nodes = blueprint().unwrap();
        let names: Vec<&str> = nodes.iter().map(|n| n.name).collect();
        assert_eq!(
            names,
            [
                "floor",
                "rocket",
                "trees",
                "satellite",
                "earth",
                "saturn",
                "saturn_ring",
                "sun"
            ]
        );
    }

    /// Only the final entry blends, and it uses the fire technique.
    #[test]
    fn only_the_sun_blends() {
        let nodes = blueprint().unwrap();
        for node in &nodes[..nodes.len() - 1] {
            assert!(!node.blend, "{} should be opaque", node.name);
        }
        let sun = nodes.last().unwrap();
        assert!(sun.blend);
        assert_eq!(sun.technique, Technique::Fire);
    }

    /// The tree field carries exactly the original 200 placements.
    #[test]
    fn tree_field_matches_source_table() {
        let nodes = blueprint().unwrap();
        let trees = nodes.iter().find(|n| n.name == "trees").unwrap();
        let placements = trees.placements.as_ref().unwrap();
        assert_eq!(placements.len(), 200);
        assert_eq!(placements[0], Vec3::new(-40.0, -202.0, -63.0));
        assert_eq!(placements[199], Vec3::new(-153.0, -202.0, 269.0));
    }

    /// The satellite's chain carries the literal rates and offsets in the
    /// documented order: scale, self-spin, inner orbit, outer orbit.
    #[test]
    fn satellite_chain_is_literal() {
        let nodes = blueprint().unwrap();
        let satellite = nodes.iter().find(|n| n.name == "satellite").unwrap();
        assert_eq!(
            satellite.ops,
            vec![
                TransformOp::Scale(Vec3::splat(0.003)),
                TransformOp::SpinY { rate: -0.2 },
                TransformOp::Translate(Vec3::new(50.0, 0.0, 0.0)),
                TransformOp::Orbit {
                    axis: Vec3::new(0.2, 1.0, 0.0),
                    rate: 0.3
                },
                TransformOp::Translate(Vec3::new(100.0, 0.0, 50.0)),
                TransformOp::Orbit {
                    axis: Vec3::Y,
                    rate: 0.2
                },
            ]
        );
    }

    /// Fire constants are the session literals.
    #[test]
    fn fire_params_are_session_constants() {
        let params = fire_params();
        assert_eq!(params.scroll_speeds, Vec3::new(0.5, 1.6, 2.0));
        assert_eq!(params.scales, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(params.distortion[1], Vec2::new(0.1, 0.3));
        assert_eq!(params.distortion_scale, 0.8);
        assert_eq!(params.distortion_bias, 0.5);
    }
}
