//! Shadow and depth parameters.
//!
//! Every field has a default so partial JSON documents are accepted. Values are validated
//! (finite) on load and clamped into their working ranges before any stage uses them.

use std::path::Path;

use crate::foundation::error::{ShadowError, ShadowResult};

/// Single directional light.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Light {
    /// Direction the light comes from, degrees. The shadow points the opposite way.
    pub angle_deg: f64,
    /// Angle above the horizon, degrees. Lower elevation casts longer shadows.
    pub elevation_deg: f64,
}

impl Light {
    /// Lowest usable elevation; keeps the cast length finite.
    pub const ELEVATION_MIN_DEG: f64 = 1.0;
    /// Highest usable elevation; keeps the cast length non-zero.
    pub const ELEVATION_MAX_DEG: f64 = 89.0;

    /// Angle wrapped into `[0, 360)`.
    pub fn normalized_angle_deg(self) -> f64 {
        let a = self.angle_deg.rem_euclid(360.0);
        if a.is_finite() { a } else { 0.0 }
    }

    /// Elevation clamped into `[1, 89]`.
    pub fn clamped_elevation_deg(self) -> f64 {
        if self.elevation_deg.is_nan() {
            return Self::ELEVATION_MIN_DEG;
        }
        self.elevation_deg
            .clamp(Self::ELEVATION_MIN_DEG, Self::ELEVATION_MAX_DEG)
    }
}

impl Default for Light {
    fn default() -> Self {
        Self {
            angle_deg: 135.0,
            elevation_deg: 45.0,
        }
    }
}

/// Alignment and tone calibration applied while sampling the depth source.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DepthCalibration {
    /// Replace every depth value `z` with `1 - z` before gamma.
    pub invert: bool,
    /// Exponent applied after inversion.
    pub gamma: f32,
    /// Size of the depth source relative to the placement.
    pub scale: f32,
    /// Horizontal shift of the depth source, pixels.
    pub offset_x: i32,
    /// Vertical shift of the depth source, pixels.
    pub offset_y: i32,
}

impl DepthCalibration {
    /// Gamma working range.
    pub const GAMMA_RANGE: (f32, f32) = (0.4, 2.5);
    /// Scale working range.
    pub const SCALE_RANGE: (f32, f32) = (0.1, 4.0);
    /// Absolute offset limit, pixels.
    pub const OFFSET_LIMIT: i32 = 300;

    /// Copy with every field clamped into its working range.
    pub fn clamped(self) -> Self {
        let clamp = |v: f32, (lo, hi): (f32, f32), fallback: f32| {
            if v.is_nan() { fallback } else { v.clamp(lo, hi) }
        };
        Self {
            invert: self.invert,
            gamma: clamp(self.gamma, Self::GAMMA_RANGE, 1.0),
            scale: clamp(self.scale, Self::SCALE_RANGE, 1.0),
            offset_x: self.offset_x.clamp(-Self::OFFSET_LIMIT, Self::OFFSET_LIMIT),
            offset_y: self.offset_y.clamp(-Self::OFFSET_LIMIT, Self::OFFSET_LIMIT),
        }
    }
}

impl Default for DepthCalibration {
    fn default() -> Self {
        Self {
            invert: false,
            gamma: 1.0,
            scale: 1.0,
            offset_x: 0,
            offset_y: 0,
        }
    }
}

/// Full parameter set for one shadow render.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShadowParams {
    /// The light casting the shadow.
    pub light: Light,
    /// How much near depth values stretch, soften and fade their layer's shadow.
    pub depth_strength: f64,
    /// Number of depth bands.
    pub layer_count: u32,
    /// Slice the silhouette by depth when a depth source is present.
    pub use_depth: bool,
    /// Depth sampling calibration.
    pub calibration: DepthCalibration,
}

impl ShadowParams {
    /// Upper bound for `depth_strength`.
    pub const DEPTH_STRENGTH_MAX: f64 = 2.0;
    /// Upper bound for `layer_count`.
    pub const LAYER_COUNT_MAX: u32 = 64;

    /// Parse parameters from a JSON document and validate them.
    pub fn from_json_str(s: &str) -> ShadowResult<Self> {
        let params: Self = serde_json::from_str(s)
            .map_err(|e| ShadowError::serde(format!("parse shadow params: {e}")))?;
        params.validate()?;
        Ok(params)
    }

    /// Read and parse a JSON parameter file.
    pub fn from_path(path: impl AsRef<Path>) -> ShadowResult<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path).map_err(|e| {
            ShadowError::validation(format!("failed to read '{}': {e}", path.display()))
        })?;
        Self::from_json_str(&s)
    }

    /// Serialize to pretty JSON.
    pub fn to_json_string(&self) -> ShadowResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ShadowError::serde(e.to_string()))
    }

    /// Reject values that cannot be clamped into meaning.
    pub fn validate(&self) -> ShadowResult<()> {
        let finite = [
            ("light.angle_deg", self.light.angle_deg),
            ("light.elevation_deg", self.light.elevation_deg),
            ("depth_strength", self.depth_strength),
            ("calibration.gamma", f64::from(self.calibration.gamma)),
            ("calibration.scale", f64::from(self.calibration.scale)),
        ];
        for (name, v) in finite {
            if !v.is_finite() {
                return Err(ShadowError::validation(format!("{name} must be finite")));
            }
        }
        if self.calibration.gamma <= 0.0 {
            return Err(ShadowError::validation("calibration.gamma must be > 0"));
        }
        if self.calibration.scale <= 0.0 {
            return Err(ShadowError::validation("calibration.scale must be > 0"));
        }
        Ok(())
    }

    /// Copy with every field clamped into its working range.
    pub fn clamped(&self) -> Self {
        let depth_strength = if self.depth_strength.is_nan() {
            0.0
        } else {
            self.depth_strength.clamp(0.0, Self::DEPTH_STRENGTH_MAX)
        };
        Self {
            light: Light {
                angle_deg: self.light.normalized_angle_deg(),
                elevation_deg: self.light.clamped_elevation_deg(),
            },
            depth_strength,
            layer_count: self.layer_count.clamp(1, Self::LAYER_COUNT_MAX),
            use_depth: self.use_depth,
            calibration: self.calibration.clamped(),
        }
    }
}

impl Default for ShadowParams {
    fn default() -> Self {
        Self {
            light: Light::default(),
            depth_strength: 1.0,
            layer_count: 16,
            use_depth: true,
            calibration: DepthCalibration::default(),
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/params.rs"]
mod tests;
