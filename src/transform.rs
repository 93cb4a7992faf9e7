//! Transform blocks consumed by the geometry pass and the movable camera.

use glam::{Mat3, Mat4, Vec3};

/// Per-frame transforms of the split variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTransforms {
    pub view: Mat4,
    pub projection: Mat4,
}

/// Per-object transforms of the split variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectTransforms {
    pub model_transform: Mat4,
    pub normal_transform: Mat3,
}

impl ObjectTransforms {
    /// Precomputes the normal transform from the model matrix.
    pub fn from_model(model: Mat4) -> Self {
        Self {
            model_transform: model,
            normal_transform: linear_part(model),
        }
    }
}

/// The two equivalent ways a host may hand transforms to the geometry pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransformBlock {
    Combined {
        model: Mat4,
        view: Mat4,
        projection: Mat4,
    },
    Split {
        frame: FrameTransforms,
        object: ObjectTransforms,
    },
}

impl TransformBlock {
    pub fn combined(model: Mat4, view: Mat4, projection: Mat4) -> Self {
        TransformBlock::Combined {
            model,
            view,
            projection,
        }
    }

    pub fn split(model: Mat4, view: Mat4, projection: Mat4) -> Self {
        TransformBlock::Split {
            frame: FrameTransforms { view, projection },
            object: ObjectTransforms::from_model(model),
        }
    }

    pub fn model(&self) -> Mat4 {
        match self {
            TransformBlock::Combined { model, .. } => *model,
            TransformBlock::Split { object, .. } => object.model_transform,
        }
    }

    pub fn view_projection(&self) -> Mat4 {
        match self {
            TransformBlock::Combined {
                view, projection, ..
            } => *projection * *view,
            TransformBlock::Split { frame, .. } => frame.projection * frame.view,
        }
    }

    pub fn normal_transform(&self) -> Mat3 {
        match self {
            TransformBlock::Combined { model, .. } => linear_part(*model),
            TransformBlock::Split { object, .. } => object.normal_transform,
        }
    }
}

/// Upper-left 3x3 of a model matrix: rotation and scale, translation stripped.
pub fn linear_part(model: Mat4) -> Mat3 {
    Mat3::from_mat4(model)
}

/// Model matrix from a translation, an XYZ euler rotation in degrees and a scale.
pub fn model_matrix(position: Vec3, rotation_degrees: Vec3, scale: Vec3) -> Mat4 {
    let translation = Mat4::from_translation(position);
    let rotation = Mat4::from_rotation_z(rotation_degrees.z.to_radians())
        * Mat4::from_rotation_y(rotation_degrees.y.to_radians())
        * Mat4::from_rotation_x(rotation_degrees.x.to_radians());
    translation * rotation * Mat4::from_scale(scale)
}

/// Camera owned by the host: position, view and projection.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewProjection {
    pub camera_position: Vec3,
    pub target: Vec3,
    pub fov_degrees: f32,
    pub view: Mat4,
    pub projection: Mat4,
}

impl ViewProjection {
    pub const NEAR: f32 = 0.01;
    pub const FAR: f32 = 100.0;

    pub fn new(camera_position: Vec3, target: Vec3, fov_degrees: f32, aspect: f32) -> Self {
        let mut camera = Self {
            camera_position,
            target,
            fov_degrees,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
        };
        camera.rebuild_view();
        camera.set_aspect(aspect);
        camera
    }

    /// Translates camera and target together so the viewing direction is kept.
    pub fn move_camera(&mut self, delta: Vec3) {
        self.camera_position += delta;
        self.target += delta;
        self.rebuild_view();
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.projection = Mat4::perspective_rh(
            self.fov_degrees.to_radians(),
            aspect.max(0.01),
            Self::NEAR,
            Self::FAR,
        );
    }

    pub fn frame_transforms(&self) -> FrameTransforms {
        FrameTransforms {
            view: self.view,
            projection: self.projection,
        }
    }

    fn rebuild_view(&mut self) {
        let forward = self.target - self.camera_position;
        // look_at degenerates when looking straight along the up axis
        let up = if forward.cross(Vec3::Y).length_squared() > f32::EPSILON {
            Vec3::Y
        } else {
            Vec3::Z
        };
        self.view = Mat4::look_at_rh(self.camera_position, self.target, up);
    }
}

impl Default for ViewProjection {
    fn default() -> Self {
        let camera_position = Vec3::splat(30.0);
        let dist = (1.0_f32 / 3.0).sqrt();
        Self::new(
            camera_position,
            camera_position - Vec3::splat(dist),
            90.0,
            1.0,
        )
    }
}
