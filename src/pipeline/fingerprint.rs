use xxhash_rust::xxh3::Xxh3;

use crate::params::{DepthCalibration, ShadowParams};

const XXH3_SEED: u64 = 0x5d1c_a7f0_93b2_e46d;

/// Stable content hash of the parameters one pipeline node depends on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ParamsFingerprint {
    /// High 64 bits.
    pub hi: u64,
    /// Low 64 bits.
    pub lo: u64,
}

/// Fingerprint of the depth calibration. Callers pass already-clamped values.
pub(crate) fn fingerprint_calibration(cal: &DepthCalibration) -> ParamsFingerprint {
    let mut h = StableHasher::new();
    write_calibration(&mut h, cal);
    h.finish()
}

/// Fingerprint of everything the shadow cast reads besides its raster inputs.
///
/// Layer count and calibration are left out; they reach the shadow through the layers revision.
pub(crate) fn fingerprint_cast(params: &ShadowParams) -> ParamsFingerprint {
    let mut h = StableHasher::new();
    h.write_f64(params.light.angle_deg);
    h.write_f64(params.light.elevation_deg);
    h.write_f64(params.depth_strength);
    h.write_bool(params.use_depth);
    h.finish()
}

fn write_calibration(h: &mut StableHasher, cal: &DepthCalibration) {
    h.write_bool(cal.invert);
    h.write_f32(cal.gamma);
    h.write_f32(cal.scale);
    h.write_i32(cal.offset_x);
    h.write_i32(cal.offset_y);
}

struct StableHasher {
    inner: Xxh3,
}

impl StableHasher {
    fn new() -> Self {
        Self {
            inner: Xxh3::with_seed(XXH3_SEED),
        }
    }

    fn write_bytes(&mut self, b: &[u8]) {
        self.inner.update(b);
    }

    fn write_u8(&mut self, v: u8) {
        self.write_bytes(&[v]);
    }

    fn write_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }

    fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn write_i32(&mut self, v: i32) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn write_f32(&mut self, v: f32) {
        self.write_u32(v.to_bits());
    }

    fn write_f64(&mut self, v: f64) {
        self.write_u64(v.to_bits());
    }

    fn finish(self) -> ParamsFingerprint {
        let v = self.inner.digest128();
        ParamsFingerprint {
            hi: (v >> 64) as u64,
            lo: v as u64,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/fingerprint.rs"]
mod tests;
