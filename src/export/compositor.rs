// Phase 10: export compositor: burn masks into a page raster

use image::{Rgba, RgbaImage, imageops};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::filter::gaussian_blur_f32;

use crate::config::settings::BlurMethod;
use crate::mask::{Mask, Rect, Rgb};

/// Burn rectangle padding in interactive pixels: shift left/up by
/// `BURN_OFFSET`, grow by `BURN_EXTRA_WIDTH` x `BURN_EXTRA_HEIGHT`.
pub const BURN_OFFSET: f64 = 5.0;
pub const BURN_EXTRA_WIDTH: f64 = 10.0;
pub const BURN_EXTRA_HEIGHT: f64 = 15.0;
/// Extra context sampled around a blurred rectangle, interactive pixels.
pub const BLUR_MARGIN: f64 = 15.0;
/// Smallest blur sigma, interactive pixels.
pub const MIN_BLUR_SIGMA: f32 = 8.0;
/// Sigma as a fraction of the burn rectangle height.
pub const BLUR_SIGMA_PER_HEIGHT: f32 = 0.5;

/// Integer rectangle clipped to a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    /// Round `rect` outward and clip it to `width x height`.
    pub fn clip(rect: &Rect, width: u32, height: u32) -> Option<PixelRect> {
        let x0 = rect.x.floor().max(0.0);
        let y0 = rect.y.floor().max(0.0);
        let x1 = rect.right().ceil().min(width as f64);
        let y1 = rect.bottom().ceil().min(height as f64);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(PixelRect {
            x: x0 as u32,
            y: y0 as u32,
            width: (x1 - x0) as u32,
            height: (y1 - y0) as u32,
        })
    }

    fn expand(&self, margin: u32, width: u32, height: u32) -> PixelRect {
        let x = self.x.saturating_sub(margin);
        let y = self.y.saturating_sub(margin);
        let x1 = (self.x + self.width).saturating_add(margin).min(width);
        let y1 = (self.y + self.height).saturating_add(margin).min(height);
        PixelRect {
            x,
            y,
            width: x1 - x,
            height: y1 - y,
        }
    }
}

/// Padded burn rectangle for `mask`, scaled by `factor` (export / interactive).
pub fn burn_rect(mask: &Rect, factor: f64) -> Rect {
    Rect::new(
        (mask.x - BURN_OFFSET) * factor,
        (mask.y - BURN_OFFSET) * factor,
        (mask.width + BURN_EXTRA_WIDTH) * factor,
        (mask.height + BURN_EXTRA_HEIGHT) * factor,
    )
}

/// Burn every mask into `image`, in z-order.
pub fn composite(image: &mut RgbaImage, masks: &[Mask], factor: f64, method: BlurMethod) {
    let (width, height) = image.dimensions();
    for mask in masks {
        let Some(area) = PixelRect::clip(&burn_rect(&mask.rect(), factor), width, height) else {
            continue;
        };
        if mask.blur {
            blur_area(image, area, factor, method);
        } else {
            fill_area(image, area, mask.color);
        }
    }
}

/// Opaque fill.
pub fn fill_area(image: &mut RgbaImage, area: PixelRect, color: Rgb) {
    draw_filled_rect_mut(
        image,
        imageproc::rect::Rect::at(area.x as i32, area.y as i32).of_size(area.width, area.height),
        Rgba([color.r, color.g, color.b, 255]),
    );
}

/// Blur a margin-expanded region, then copy back only `area`, washed halfway
/// toward white.
pub fn blur_area(image: &mut RgbaImage, area: PixelRect, factor: f64, method: BlurMethod) {
    let (width, height) = image.dimensions();
    let margin = (BLUR_MARGIN * factor).round() as u32;
    let region = area.expand(margin, width, height);

    let crop =
        imageops::crop_imm(image, region.x, region.y, region.width, region.height).to_image();
    let blurred = match method {
        BlurMethod::Gaussian => {
            let sigma = (area.height as f32 * BLUR_SIGMA_PER_HEIGHT)
                .max(MIN_BLUR_SIGMA * factor as f32);
            gaussian_blur_f32(&crop, sigma)
        }
        BlurMethod::Downsample => downsample_blur(&crop, area.height),
    };

    let dx = area.x - region.x;
    let dy = area.y - region.y;
    for y in 0..area.height {
        for x in 0..area.width {
            let Rgba([r, g, b, _]) = *blurred.get_pixel(dx + x, dy + y);
            let wash = |c: u8| ((c as u16 + 255) / 2) as u8;
            image.put_pixel(area.x + x, area.y + y, Rgba([wash(r), wash(g), wash(b), 255]));
        }
    }
}

/// Shrink to roughly a quarter of the burn height in blocks, then enlarge.
fn downsample_blur(crop: &RgbaImage, burn_height: u32) -> RgbaImage {
    let (w, h) = crop.dimensions();
    let block = (burn_height / 4).max(2);
    let small = imageops::resize(
        crop,
        (w / block).max(1),
        (h / block).max(1),
        imageops::FilterType::Triangle,
    );
    imageops::resize(&small, w, h, imageops::FilterType::Triangle)
}
