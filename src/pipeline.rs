//! Pass descriptions and the assembly-time contract check.
//!
//! Everything that can go wrong between the passes and their host is found
//! here, before any draw is recorded.

use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use log::info;
use serde::{Deserialize, Serialize};

use crate::config::RendererConfig;
use crate::error::ContractError;
use crate::gbuffer::{GBufferChannel, GBufferLayout};
use crate::lights::{FrameLight, LightSource};
use crate::shaders::LightInput;
use crate::shading::lighting::{Capabilities, LightingPass};
use crate::vertex::validate_vertex_layout;

/// Uniform block a pass reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UniformBinding {
    FrameTransforms,
    ObjectTransforms,
    Material,
    Ambient,
    DirectionalLight,
    LightSource,
    Camera,
}

impl UniformBinding {
    pub const fn name(self) -> &'static str {
        match self {
            UniformBinding::FrameTransforms => "frame",
            UniformBinding::ObjectTransforms => "object",
            UniformBinding::Material => "material",
            UniformBinding::Ambient => "ambient",
            UniformBinding::DirectionalLight => "directional_light",
            UniformBinding::LightSource => "light_source",
            UniformBinding::Camera => "camera",
        }
    }
}

/// The three interchangeable light accumulation passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LightingPassKind {
    DirectionalSimple,
    DirectionalSpecular,
    Unified,
}

impl LightingPassKind {
    pub const fn name(self) -> &'static str {
        match self {
            LightingPassKind::DirectionalSimple => "simple",
            LightingPassKind::DirectionalSpecular => "specular",
            LightingPassKind::Unified => "unified",
        }
    }

    pub const fn capabilities(self) -> Capabilities {
        match self {
            LightingPassKind::DirectionalSimple => Capabilities::DIRECTIONAL_SIMPLE,
            LightingPassKind::DirectionalSpecular => Capabilities::DIRECTIONAL_SPECULAR,
            LightingPassKind::Unified => Capabilities::UNIFIED,
        }
    }

    pub fn reads(self) -> &'static [GBufferChannel] {
        match self {
            LightingPassKind::DirectionalSimple => &[
                GBufferChannel::Color,
                GBufferChannel::Normal,
                GBufferChannel::Position,
            ],
            LightingPassKind::DirectionalSpecular | LightingPassKind::Unified => {
                &GBufferChannel::ALL
            }
        }
    }

    pub fn bindings(self) -> &'static [UniformBinding] {
        match self {
            LightingPassKind::DirectionalSimple => &[UniformBinding::DirectionalLight],
            LightingPassKind::DirectionalSpecular => {
                &[UniformBinding::Camera, UniformBinding::DirectionalLight]
            }
            LightingPassKind::Unified => &[UniformBinding::Camera, UniformBinding::LightSource],
        }
    }
}

impl fmt::Display for LightingPassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LightingPassKind {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "simple" => Ok(LightingPassKind::DirectionalSimple),
            "specular" => Ok(LightingPassKind::DirectionalSpecular),
            "unified" => Ok(LightingPassKind::Unified),
            other => Err(anyhow!(
                "unknown lighting pass {other:?}, expected simple, specular or unified"
            )),
        }
    }
}

const GEOMETRY_BINDINGS: &[UniformBinding] = &[
    UniformBinding::FrameTransforms,
    UniformBinding::ObjectTransforms,
    UniformBinding::Material,
];
const AMBIENT_READS: &[GBufferChannel] = &[GBufferChannel::Color];
const AMBIENT_BINDINGS: &[UniformBinding] = &[UniformBinding::Ambient];

/// Uniform blocks the host is able to bind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostBindings(Vec<UniformBinding>);

impl HostBindings {
    /// Every block the renderer in this crate provides.
    pub fn all() -> Self {
        Self(vec![
            UniformBinding::FrameTransforms,
            UniformBinding::ObjectTransforms,
            UniformBinding::Material,
            UniformBinding::Ambient,
            UniformBinding::DirectionalLight,
            UniformBinding::LightSource,
            UniformBinding::Camera,
        ])
    }

    pub fn from_bindings(bindings: impl IntoIterator<Item = UniformBinding>) -> Self {
        Self(bindings.into_iter().collect())
    }

    fn require(&self, pass: &'static str, needed: &[UniformBinding]) -> Result<(), ContractError> {
        match needed.iter().find(|binding| !self.0.contains(*binding)) {
            Some(missing) => Err(ContractError::MissingBinding {
                pass,
                binding: missing.name(),
            }),
            None => Ok(()),
        }
    }
}

/// Validated pass configuration for one frame graph.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelinePlan {
    layout: GBufferLayout,
    directional_kind: LightingPassKind,
    directional: LightingPass,
    unified: LightingPass,
}

impl PipelinePlan {
    /// Checks every pass against the producer layout, the host's bindings and
    /// the vertex layout, then resolves the lighting pass capabilities.
    pub fn assemble(
        config: &RendererConfig,
        layout: &GBufferLayout,
        vertex_attributes: &[wgpu::VertexAttribute],
        bindings: &HostBindings,
    ) -> Result<Self, ContractError> {
        validate_vertex_layout(vertex_attributes)?;
        bindings.require("geometry", GEOMETRY_BINDINGS)?;

        layout.validate_reads("ambient", AMBIENT_READS)?;
        bindings.require("ambient", AMBIENT_BINDINGS)?;

        let kind = config.directional_pass;
        layout.validate_reads(kind.name(), kind.reads())?;
        bindings.require(kind.name(), kind.bindings())?;

        // point lights always go through the unified pass
        let unified = LightingPassKind::Unified;
        layout.validate_reads(unified.name(), unified.reads())?;
        bindings.require(unified.name(), unified.bindings())?;

        info!(
            "assembled deferred pipeline: directional lights via {kind}, point lights via {unified}"
        );

        Ok(Self {
            layout: layout.clone(),
            directional_kind: kind,
            directional: LightingPass::new(kind.capabilities(), config.attenuation),
            unified: LightingPass::new(unified.capabilities(), config.attenuation),
        })
    }

    pub fn layout(&self) -> &GBufferLayout {
        &self.layout
    }

    pub fn directional_kind(&self) -> LightingPassKind {
        self.directional_kind
    }

    pub fn directional_pass(&self) -> &LightingPass {
        &self.directional
    }

    pub fn unified_pass(&self) -> &LightingPass {
        &self.unified
    }

    /// Lighting shader variants a host has to build for this plan.
    pub fn lighting_variants(&self) -> Vec<(LightingPassKind, LightInput)> {
        let mut variants = vec![
            (LightingPassKind::Unified, LightInput::Directional),
            (LightingPassKind::Unified, LightInput::Point),
        ];
        if self.directional_kind != LightingPassKind::Unified {
            variants.push((self.directional_kind, LightInput::DirectionalLight));
        }
        variants
    }

    /// Pass and shader variant that accumulate `light`.
    pub fn route(&self, light: &FrameLight) -> (LightingPassKind, LightInput) {
        match light {
            FrameLight::Directional(_) if self.directional_kind == LightingPassKind::Unified => {
                (LightingPassKind::Unified, LightInput::Directional)
            }
            FrameLight::Directional(_) => (self.directional_kind, LightInput::DirectionalLight),
            FrameLight::Source(LightSource::Directional { .. }) => {
                (LightingPassKind::Unified, LightInput::Directional)
            }
            FrameLight::Source(LightSource::Point { .. }) => {
                (LightingPassKind::Unified, LightInput::Point)
            }
        }
    }
}
