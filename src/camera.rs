//! Cameras: a pose plus cached view and projection matrices.
//!
//! Matrices follow the OpenGL clip-space convention produced by `cgmath`. The
//! wgpu context converts depth range when it uploads them.

use cgmath::{InnerSpace, Matrix4, Point3, Rad, SquareMatrix, Vector3};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectionType {
    #[default]
    Perspective,
    Orthographic,
}

/// Everything needed to place a camera.
///
/// `fov_y` is in radians. For orthographic cameras it sets the visible
/// height at the anchor distance.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraDescriptor {
    pub id: String,
    pub pos: [f32; 3],
    pub anchor: [f32; 3],
    pub up: [f32; 3],
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub projection: ProjectionType,
}

impl Default for CameraDescriptor {
    fn default() -> Self {
        Self {
            id: "main".to_owned(),
            pos: [0.0, 0.0, 5.0],
            anchor: [0.0, 0.0, 0.0],
            up: [0.0, 1.0, 0.0],
            fov_y: std::f32::consts::FRAC_PI_4,
            aspect: 1.0,
            near: 0.1,
            far: 100.0,
            projection: ProjectionType::Perspective,
        }
    }
}

/// The matrices a camera hands to every draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformMatrices {
    pub view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
    pub view_projection: Matrix4<f32>,
}

#[derive(Debug, Clone)]
pub struct Camera {
    pub id: String,
    pos: Point3<f32>,
    anchor: Point3<f32>,
    up: Vector3<f32>,
    fov_y: Rad<f32>,
    aspect: f32,
    near: f32,
    far: f32,
    projection_type: ProjectionType,
    matrices: TransformMatrices,
}

impl Camera {
    pub fn new(desc: CameraDescriptor) -> Self {
        let mut camera = Self {
            id: desc.id,
            pos: Point3::from(desc.pos),
            anchor: Point3::from(desc.anchor),
            up: Vector3::from(desc.up),
            fov_y: Rad(desc.fov_y),
            aspect: desc.aspect,
            near: desc.near,
            far: desc.far,
            projection_type: desc.projection,
            matrices: TransformMatrices {
                view: Matrix4::identity(),
                projection: Matrix4::identity(),
                view_projection: Matrix4::identity(),
            },
        };
        camera.recompute();
        camera
    }

    /// Rebuilds every matrix from the stored pose.
    fn recompute(&mut self) {
        let view = Matrix4::look_at_rh(self.pos, self.anchor, self.up);
        let projection = match self.projection_type {
            ProjectionType::Perspective => {
                cgmath::perspective(self.fov_y, self.aspect, self.near, self.far)
            }
            ProjectionType::Orthographic => {
                let distance = (self.pos - self.anchor).magnitude();
                let half_h = distance * (self.fov_y.0 / 2.0).tan();
                let half_w = half_h * self.aspect;
                cgmath::ortho(-half_w, half_w, -half_h, half_h, self.near, self.far)
            }
        };
        self.matrices = TransformMatrices {
            view,
            projection,
            view_projection: projection * view,
        };
    }

    /// Moves the eye and anchor, recomputing the cached matrices.
    pub fn look_at(&mut self, pos: [f32; 3], anchor: [f32; 3]) {
        self.pos = Point3::from(pos);
        self.anchor = Point3::from(anchor);
        self.recompute();
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
        self.recompute();
    }

    /// Dollies along the eye-anchor axis by `distance`.
    ///
    /// The translation is applied to the cached view matrix, so consecutive
    /// calls compound. Positive values bring the anchor closer.
    pub fn move_to_anchor(&mut self, distance: f32) {
        let offset = self.pos - self.anchor;
        if offset.magnitude2() == 0.0 {
            log::warn!("Camera {}: eye sits on the anchor, cannot dolly", self.id);
            return;
        }
        let translation = offset.normalize() * distance;
        let m = &mut self.matrices;
        m.view = m.view * Matrix4::from_translation(translation);
        m.view_projection = m.projection * m.view;
    }

    pub fn transform_matrices(&self) -> &TransformMatrices {
        &self.matrices
    }

    pub fn pos(&self) -> [f32; 3] {
        self.pos.into()
    }

    pub fn anchor(&self) -> [f32; 3] {
        self.anchor.into()
    }

    pub fn projection_type(&self) -> ProjectionType {
        self.projection_type
    }
}

/// A normalised interaction event. `delta` is a scroll magnitude, positive
/// when scrolling down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraEvent {
    pub delta: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: &Matrix4<f32>, b: &Matrix4<f32>) {
        let a: &[f32; 16] = a.as_ref();
        let b: &[f32; 16] = b.as_ref();
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).abs() < 1e-5, "{a:?} != {b:?}");
        }
    }

    fn camera() -> Camera {
        Camera::new(CameraDescriptor {
            pos: [3.0, 2.0, 4.0],
            aspect: 1.5,
            ..Default::default()
        })
    }

    #[test]
    fn view_projection_is_projection_times_view() {
        let cam = camera();
        let m = cam.transform_matrices();
        assert_close(&m.view_projection, &(m.projection * m.view));
    }

    #[test]
    fn dolly_there_and_back_restores_view() {
        let mut cam = camera();
        let start = *cam.transform_matrices();
        cam.move_to_anchor(1.7);
        assert_ne!(cam.transform_matrices().view, start.view);
        cam.move_to_anchor(-1.7);
        assert_close(&cam.transform_matrices().view, &start.view);
        assert_close(&cam.transform_matrices().view_projection, &start.view_projection);
    }

    #[test]
    fn positive_dolly_brings_anchor_closer() {
        let mut cam = camera();
        let anchor = cgmath::Vector4::new(0.0, 0.0, 0.0, 1.0);
        let before = (cam.transform_matrices().view * anchor).truncate().magnitude();
        cam.move_to_anchor(1.0);
        let after = (cam.transform_matrices().view * anchor).truncate().magnitude();
        assert!((before - after - 1.0).abs() < 1e-5);
    }

    #[test]
    fn orthographic_has_no_perspective_divide() {
        let cam = Camera::new(CameraDescriptor {
            projection: ProjectionType::Orthographic,
            ..Default::default()
        });
        assert_eq!(cam.transform_matrices().projection.w.w, 1.0);
        assert_eq!(cam.projection_type(), ProjectionType::Orthographic);
    }
}
