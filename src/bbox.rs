use nalgebra as na;
use serde_derive::{Deserialize, Serialize};

/// Left-top-width-height box in pixel units
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    #[inline]
    pub fn ltwh(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline(always)]
    pub fn left(&self) -> f32 {
        self.x
    }

    #[inline(always)]
    pub fn top(&self) -> f32 {
        self.y
    }

    #[inline(always)]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    #[inline(always)]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    #[inline(always)]
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    #[inline]
    pub fn origin(&self) -> na::Point2<f32> {
        na::Point2::new(self.x, self.y)
    }

    #[inline]
    pub fn center(&self) -> na::Point2<f32> {
        na::Point2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Same size, origin shifted by `offset`.
    #[inline]
    pub fn translated(&self, offset: na::Vector2<f32>) -> Self {
        Self {
            x: self.x + offset.x,
            y: self.y + offset.y,
            ..*self
        }
    }

    /// Checks the box can enter the track store. Returns the reason it can't.
    pub fn check(&self) -> Result<(), &'static str> {
        let values = [self.x, self.y, self.width, self.height];

        if values.iter().any(|v| !v.is_finite()) {
            return Err("non-finite coordinate");
        }

        if self.x < 0.0 || self.y < 0.0 {
            return Err("negative origin");
        }

        if self.width <= 0.0 || self.height <= 0.0 {
            return Err("non-positive size");
        }

        Ok(())
    }
}

impl From<[f32; 4]> for BoundingBox {
    fn from(v: [f32; 4]) -> Self {
        Self::ltwh(v[0], v[1], v[2], v[3])
    }
}

impl From<BoundingBox> for [f32; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x, b.y, b.width, b.height]
    }
}
