/// A scale-space keypoint.
///
/// Locations are expressed in base-image pixels, i.e. the octave pixel
/// coordinate multiplied by `2^octave`. No sub-pixel refinement is applied.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Keypoint {
    /// Column in base-image coordinates.
    pub x: f32,
    /// Row in base-image coordinates.
    pub y: f32,
    /// Index of the octave the keypoint was found in.
    pub octave: usize,
    /// Index of the difference-of-gaussians layer within the octave.
    pub layer: usize,
    /// Effective scale `σ₀ · 2^octave · 2^(layer/S)`.
    pub sigma: f32,
    /// Dominant gradient orientation in radians, `None` until assigned.
    pub orientation: Option<f32>,
}

impl Keypoint {
    /// A copy of this keypoint with the given orientation.
    pub fn with_orientation(&self, orientation: f32) -> Self {
        Self {
            orientation: Some(orientation),
            ..*self
        }
    }

    /// Integer factor between octave pixels and base-image pixels.
    pub fn octave_scale(&self) -> f32 {
        (1usize << self.octave) as f32
    }

    /// Location in the pixel grid of the owning octave.
    pub fn octave_position(&self) -> (f32, f32) {
        let scale = self.octave_scale();
        (self.x / scale, self.y / scale)
    }

    /// Location as a `[x, y]` point in base-image coordinates.
    pub fn point(&self) -> [f64; 2] {
        [self.x as f64, self.y as f64]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypoint_octave_position() {
        let kp = Keypoint {
            x: 24.0,
            y: 8.0,
            octave: 2,
            layer: 1,
            sigma: 8.06,
            orientation: None,
        };
        assert_eq!(kp.octave_scale(), 4.0);
        assert_eq!(kp.octave_position(), (6.0, 2.0));
        assert_eq!(kp.point(), [24.0, 8.0]);

        let oriented = kp.with_orientation(1.5);
        assert_eq!(oriented.orientation, Some(1.5));
        assert_eq!(oriented.x, kp.x);
        assert_eq!(kp.orientation, None);
    }
}
