use crate::error::{Result, TrackerError};

/// Axis-aligned box given by its top-left corner and extents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn from_centre(centre: (f32, f32), size: (f32, f32)) -> Self {
        Self {
            x: centre.0 - size.0 / 2.0,
            y: centre.1 - size.1 / 2.0,
            width: size.0,
            height: size.1,
        }
    }

    pub fn centre(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn corners(&self) -> [(f32, f32); 4] {
        let (x2, y2) = (self.x + self.width, self.y + self.height);
        [(self.x, self.y), (x2, self.y), (x2, y2), (self.x, y2)]
    }
}

/// Target region as supplied at initialisation or reported per frame.
///
/// Polygon corners are ordered top-left, top-right, bottom-right, bottom-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Region {
    Rect(BoundingBox),
    Polygon([(f32, f32); 4]),
}

/// Centre, extents and orientation recovered from a region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Similarity {
    pub centre: (f32, f32),
    pub size: (f32, f32),
    pub rotation: f32,
}

impl Region {
    /// Parses the flat wire form: `[x, y, w, h]`, or 8 corner coordinates when `polygon` is set.
    pub fn from_values(values: &[f32], polygon: bool) -> Result<Self> {
        if values.iter().any(|v| !v.is_finite()) {
            return Err(TrackerError::InvalidInput("region contains non-finite values".to_string()));
        }
        match (polygon, values.len()) {
            (false, 4) => Ok(Region::Rect(BoundingBox::new(values[0], values[1], values[2], values[3]))),
            (true, 8) => {
                let mut corners = [(0.0, 0.0); 4];
                for (i, corner) in corners.iter_mut().enumerate() {
                    *corner = (values[2 * i], values[2 * i + 1]);
                }
                Ok(Region::Polygon(corners))
            }
            (polygon, n) => Err(TrackerError::InvalidInput(format!(
                "expected {} region values, got {}",
                if polygon { 8 } else { 4 },
                n
            ))),
        }
    }

    pub fn to_values(&self) -> Vec<f32> {
        match self {
            Region::Rect(b) => vec![b.x, b.y, b.width, b.height],
            Region::Polygon(corners) => corners.iter().flat_map(|&(x, y)| [x, y]).collect(),
        }
    }

    pub fn corners(&self) -> [(f32, f32); 4] {
        match self {
            Region::Rect(b) => b.corners(),
            Region::Polygon(corners) => *corners,
        }
    }

    pub fn centre(&self) -> (f32, f32) {
        let corners = self.corners();
        let sx: f32 = corners.iter().map(|c| c.0).sum();
        let sy: f32 = corners.iter().map(|c| c.1).sum();
        (sx / 4.0, sy / 4.0)
    }

    /// Smallest axis-aligned box containing every corner.
    pub fn bounding_box(&self) -> BoundingBox {
        let corners = self.corners();
        let (mut min_x, mut min_y) = (f32::INFINITY, f32::INFINITY);
        let (mut max_x, mut max_y) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
        for &(x, y) in &corners {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        BoundingBox::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    /// Recovers the similarity the tracker starts from.
    ///
    /// With `oriented` set, a polygon's size is the mean of its opposite edge lengths and
    /// its rotation the mean signed angle of the left and right edges against "up".
    /// Otherwise the axis-aligned hull is used and rotation is zero.
    pub fn to_similarity(&self, oriented: bool) -> Result<Similarity> {
        let similarity = match self {
            Region::Rect(b) => Similarity {
                centre: b.centre(),
                size: (b.width, b.height),
                rotation: 0.0,
            },
            Region::Polygon(corners) if oriented => {
                let [tl, tr, br, bl] = *corners;
                let width = (distance(tl, tr) + distance(bl, br)) / 2.0;
                let height = (distance(tl, bl) + distance(tr, br)) / 2.0;
                let left = signed_angle_from_up(sub(tl, bl));
                let right = signed_angle_from_up(sub(tr, br));
                Similarity {
                    centre: self.centre(),
                    size: (width, height),
                    rotation: (left + right) / 2.0,
                }
            }
            Region::Polygon(_) => {
                let hull = self.bounding_box();
                Similarity {
                    centre: self.centre(),
                    size: (hull.width, hull.height),
                    rotation: 0.0,
                }
            }
        };

        if !(similarity.size.0 >= 1.0 && similarity.size.1 >= 1.0) {
            return Err(TrackerError::InvalidInput(format!(
                "region is degenerate: {:?}",
                similarity.size
            )));
        }
        Ok(similarity)
    }
}

fn sub(a: (f32, f32), b: (f32, f32)) -> (f32, f32) {
    (a.0 - b.0, a.1 - b.1)
}

fn distance(a: (f32, f32), b: (f32, f32)) -> f32 {
    let (dx, dy) = sub(a, b);
    dx.hypot(dy)
}

/// Angle from the image "up" vector `(0, -1)` to `v`, positive clockwise on screen.
fn signed_angle_from_up(v: (f32, f32)) -> f32 {
    let up = (0.0f32, -1.0f32);
    let cross = up.0 * v.1 - up.1 * v.0;
    let dot = up.0 * v.0 + up.1 * v.1;
    cross.atan2(dot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::sampler::similarity_to_corners;
    use approx::assert_abs_diff_eq;

    #[test]
    fn parses_boxes_and_polygons() {
        let rect = Region::from_values(&[40.0, 40.0, 20.0, 10.0], false).unwrap();
        assert_eq!(rect.centre(), (50.0, 45.0));
        assert_eq!(rect.to_values(), vec![40.0, 40.0, 20.0, 10.0]);

        let values = [0.0, 0.0, 4.0, 0.0, 4.0, 2.0, 0.0, 2.0];
        let poly = Region::from_values(&values, true).unwrap();
        assert_eq!(poly.to_values(), values.to_vec());
        assert_eq!(poly.bounding_box(), BoundingBox::new(0.0, 0.0, 4.0, 2.0));
    }

    #[test]
    fn rejects_wrong_arity_and_nan() {
        assert!(Region::from_values(&[1.0, 2.0, 3.0], false).is_err());
        assert!(Region::from_values(&[1.0, 2.0, 3.0, 4.0], true).is_err());
        assert!(Region::from_values(&[f32::NAN, 0.0, 1.0, 1.0], false).is_err());
    }

    #[test]
    fn degenerate_regions_fail() {
        let region = Region::Rect(BoundingBox::new(5.0, 5.0, 0.0, 10.0));
        assert!(matches!(region.to_similarity(false), Err(TrackerError::InvalidInput(_))));
    }

    #[test]
    fn oriented_polygon_recovers_rotation_and_size() {
        let rotation = 0.3f32;
        let corners = similarity_to_corners((50.0, 40.0), rotation, (30.0, 12.0));
        let similarity = Region::Polygon(corners).to_similarity(true).unwrap();
        assert_abs_diff_eq!(similarity.rotation, rotation, epsilon = 1e-4);
        assert_abs_diff_eq!(similarity.size.0, 30.0, epsilon = 1e-3);
        assert_abs_diff_eq!(similarity.size.1, 12.0, epsilon = 1e-3);
        assert_abs_diff_eq!(similarity.centre.0, 50.0, epsilon = 1e-4);
        assert_abs_diff_eq!(similarity.centre.1, 40.0, epsilon = 1e-4);
    }

    #[test]
    fn unoriented_polygon_uses_the_hull() {
        let corners = similarity_to_corners((0.0, 0.0), std::f32::consts::FRAC_PI_4, (2.0, 2.0));
        let similarity = Region::Polygon(corners).to_similarity(false).unwrap();
        assert_eq!(similarity.rotation, 0.0);
        assert_abs_diff_eq!(similarity.size.0, 2.0 * 2.0f32.sqrt(), epsilon = 1e-4);
    }
}
