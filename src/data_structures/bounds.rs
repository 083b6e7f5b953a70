use cgmath::{InnerSpace, Vector3};

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

impl Aabb {
    pub fn new(point1: Vector3<f32>, point2: Vector3<f32>) -> Aabb {
        let min = Vector3::new(
            point1.x.min(point2.x),
            point1.y.min(point2.y),
            point1.z.min(point2.z),
        );
        let max = Vector3::new(
            point1.x.max(point2.x),
            point1.y.max(point2.y),
            point1.z.max(point2.z),
        );
        Aabb { min, max }
    }

    /// Smallest box containing every point, `None` for an empty iterator.
    pub fn from_points(points: impl IntoIterator<Item = Vector3<f32>>) -> Option<Aabb> {
        points.into_iter().fold(None, |bounds, point| match bounds {
            None => Some(Aabb::new(point, point)),
            Some(bounds) => Some(bounds.including(point)),
        })
    }

    pub fn including(&self, point: Vector3<f32>) -> Aabb {
        Aabb::new(
            Vector3::new(
                self.min.x.min(point.x),
                self.min.y.min(point.y),
                self.min.z.min(point.z),
            ),
            Vector3::new(
                self.max.x.max(point.x),
                self.max.y.max(point.y),
                self.max.z.max(point.z),
            ),
        )
    }

    pub fn center(&self) -> Vector3<f32> {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vector3<f32> {
        self.max - self.min
    }

    /// Corner-to-corner distance.
    pub fn diagonal(&self) -> f32 {
        self.size().magnitude()
    }
}
