use std::collections::HashSet;

use glam::{DMat4, DVec2, DVec3};

use crate::error::{PlatenError, PlatenResult};

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub render: RenderSettings,
    pub camera: Option<Camera>,
    #[serde(default)]
    pub objects: Vec<Object>,
    pub background: Option<Box<Scene>>, // drawn behind this scene, chainable
}

#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct RenderSettings {
    pub resolution_x: u32,
    pub resolution_y: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            resolution_x: 1920,
            resolution_y: 1080,
        }
    }
}

#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct Camera {
    #[serde(default = "identity_matrix")]
    pub matrix_world: DMat4,
    #[serde(default = "default_ortho_scale")]
    pub ortho_scale: f64,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Object {
    pub name: String, // unique within its scene
    #[serde(default = "identity_matrix")]
    pub matrix_world: DMat4,
    pub parent: Option<String>, // name of an object in the same scene
    #[serde(default)]
    pub instancing: InstanceMode,
    #[serde(default)]
    pub instances: Vec<Instance>,
    pub data: ObjectData,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum InstanceMode {
    #[default]
    None,
    Vertices,
    Faces,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Instance {
    pub object: String, // name of the instanced object in the same scene
    #[serde(default = "identity_matrix")]
    pub matrix: DMat4,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub enum ObjectData {
    Curve(CurveData),
    Text(CurveData), // glyph outlines already converted to curves
    Empty(EmptyData),
    Unsupported,
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct CurveData {
    #[serde(default)]
    pub splines: Vec<Spline>,
    #[serde(default)]
    pub materials: Vec<Material>,
    #[serde(default)]
    pub dimensions: Dimensions,
    #[serde(default)]
    pub fill_mode: FillMode,
    #[serde(default)]
    pub bevel_depth: f64,
}

impl CurveData {
    // Only flat curves with a fill mode produce filled regions; everything
    // else is stroked.
    pub fn fill_eligible(&self) -> bool {
        self.fill_mode != FillMode::None && self.dimensions != Dimensions::ThreeD
    }

    pub fn validate(&self, owner: &str) -> PlatenResult<()> {
        if !self.bevel_depth.is_finite() || self.bevel_depth < 0.0 {
            return Err(PlatenError::structure(format!(
                "object '{owner}' has invalid bevel_depth {}",
                self.bevel_depth
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Dimensions {
    #[default]
    #[serde(rename = "2D")]
    TwoD,
    #[serde(rename = "3D")]
    ThreeD,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FillMode {
    None,
    Front,
    Back,
    #[default]
    Both,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub enum Spline {
    Poly(PolySpline),
    Bezier(BezierSpline),
}

impl Spline {
    pub fn cyclic(&self) -> bool {
        match self {
            Spline::Poly(s) => s.cyclic,
            Spline::Bezier(s) => s.cyclic,
        }
    }

    pub fn material_index(&self) -> usize {
        match self {
            Spline::Poly(s) => s.material_index,
            Spline::Bezier(s) => s.material_index,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Spline::Poly(s) => s.points.is_empty(),
            Spline::Bezier(s) => s.points.is_empty(),
        }
    }
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct PolySpline {
    #[serde(default)]
    pub points: Vec<DVec3>,
    #[serde(default)]
    pub cyclic: bool,
    #[serde(default)]
    pub material_index: usize,
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct BezierSpline {
    #[serde(default)]
    pub points: Vec<BezierPoint>,
    #[serde(default)]
    pub cyclic: bool,
    #[serde(default)]
    pub material_index: usize,
}

#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct BezierPoint {
    pub co: DVec3,
    pub handle_left: DVec3,
    pub handle_right: DVec3,
}

#[derive(Clone, Copy, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct Material {
    #[serde(default)]
    pub diffuse: Rgb,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct EmptyData {
    pub image: Option<ImageData>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ImageData {
    pub source: String, // resolved against the export's assets root
    #[serde(default)]
    pub width: u32, // declared pixel size, used when the file is unavailable
    #[serde(default)]
    pub height: u32,
    #[serde(default = "default_display_size")]
    pub display_size: f64,
    #[serde(default)]
    pub offset: DVec2, // fraction of display_size
}

impl ImageData {
    pub fn validate(&self, owner: &str) -> PlatenResult<()> {
        if !self.display_size.is_finite() || self.display_size <= 0.0 {
            return Err(PlatenError::structure(format!(
                "object '{owner}' has invalid display_size {}",
                self.display_size
            )));
        }
        if !self.offset.is_finite() {
            return Err(PlatenError::structure(format!(
                "object '{owner}' has non-finite image offset {}",
                self.offset
            )));
        }
        Ok(())
    }
}

fn identity_matrix() -> DMat4 {
    DMat4::IDENTITY
}

fn default_ortho_scale() -> f64 {
    1.0
}

fn default_display_size() -> f64 {
    1.0
}

impl Scene {
    pub fn validate(&self) -> PlatenResult<()> {
        let mut names = HashSet::new();
        for object in &self.objects {
            if !names.insert(object.name.as_str()) {
                return Err(PlatenError::structure(format!(
                    "duplicate object name '{}'",
                    object.name
                )));
            }
            match &object.data {
                ObjectData::Curve(curve) | ObjectData::Text(curve) => {
                    curve.validate(&object.name)?;
                }
                ObjectData::Empty(empty) => {
                    if let Some(image) = &empty.image {
                        image.validate(&object.name)?;
                    }
                }
                ObjectData::Unsupported => {}
            }
        }
        if let Some(background) = &self.background {
            background.validate()?;
        }
        Ok(())
    }
}
