//! Pad, crop and flip augmentation

use crate::{Error, Result};
use ndarray::{s, Array3, Array4, ArrayView3};
use rand::Rng;

/// Reflect-pad the spatial dims of every image by `pad` pixels
///
/// Reflection excludes the edge pixel, so `pad` must be smaller than each side;
/// otherwise [`Error::Padding`] is returned.
pub fn reflect_pad(images: &Array4<f32>, pad: usize) -> Result<Array4<f32>> {
    if pad == 0 {
        return Ok(images.clone());
    }
    let (n, c, h, w) = images.dim();
    if pad >= h || pad >= w {
        return Err(Error::Padding {
            pad,
            height: h,
            width: w,
        });
    }
    Ok(Array4::from_shape_fn((n, c, h + 2 * pad, w + 2 * pad), |(i, ch, y, x)| {
        images[[i, ch, reflect(y, pad, h), reflect(x, pad, w)]]
    }))
}

/// Source index for padded coordinate `p`
fn reflect(p: usize, pad: usize, len: usize) -> usize {
    let i = p as isize - pad as isize;
    let last = len as isize - 1;
    let mirrored = if i < 0 {
        -i
    } else if i > last {
        2 * last - i
    } else {
        i
    };
    mirrored as usize
}

/// Random crop offset and flip for one sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CropChoice {
    pub dy: usize,
    pub dx: usize,
    pub flip: bool,
}

/// Random `crop × crop` window plus horizontal flip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Augmentation {
    pub crop: usize,
}

impl Augmentation {
    pub fn new(crop: usize) -> Self {
        Self { crop }
    }

    /// Draw a crop and flip for an image of `height × width`
    pub fn draw<R: Rng + ?Sized>(&self, height: usize, width: usize, rng: &mut R) -> CropChoice {
        assert!(
            self.crop <= height && self.crop <= width,
            "Crop must fit inside the padded image"
        );
        CropChoice {
            dy: rng.random_range(0..=height - self.crop),
            dx: rng.random_range(0..=width - self.crop),
            flip: rng.random_bool(0.5),
        }
    }

    /// Apply `choice` to one `[C, H, W]` image
    pub fn apply(&self, image: ArrayView3<'_, f32>, choice: CropChoice) -> Array3<f32> {
        let window = image.slice(s![
            ..,
            choice.dy..choice.dy + self.crop,
            choice.dx..choice.dx + self.crop
        ]);
        if choice.flip {
            window.slice(s![.., .., ..;-1]).to_owned()
        } else {
            window.to_owned()
        }
    }
}
