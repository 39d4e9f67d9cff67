// Phase 9: live overlay: draw a page's masks for on-screen preview

use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};

use crate::export::compositor::{PixelRect, burn_rect};
use crate::mask::{Mask, Rect};

/// Fill alpha of solid masks in the preview.
pub const PREVIEW_ALPHA: u8 = 128;
pub const BLUR_OUTLINE: Rgba<u8> = Rgba([0, 0, 255, 255]);
pub const BLUR_OUTLINE_WIDTH: u32 = 3;
pub const DRAG_OUTLINE: Rgba<u8> = Rgba([255, 0, 0, 255]);
pub const DRAG_OUTLINE_WIDTH: u32 = 2;

/// Transparent `width x height` layer with `masks` drawn in z-order.
///
/// Solid masks are half-transparent fills of their colour; blurred masks
/// are outlined. Pure function of its inputs.
pub fn render_overlay(width: u32, height: u32, masks: &[Mask], preview: Option<&Rect>) -> RgbaImage {
    let mut layer = RgbaImage::new(width, height);
    for mask in masks {
        let Some(area) = PixelRect::clip(&burn_rect(&mask.rect(), 1.0), width, height) else {
            continue;
        };
        if mask.blur {
            outline(&mut layer, area, BLUR_OUTLINE, BLUR_OUTLINE_WIDTH);
        } else {
            draw_filled_rect_mut(
                &mut layer,
                imageproc::rect::Rect::at(area.x as i32, area.y as i32).of_size(area.width, area.height),
                Rgba([mask.color.r, mask.color.g, mask.color.b, PREVIEW_ALPHA]),
            );
        }
    }
    if let Some(area) = preview.and_then(|r| PixelRect::clip(r, width, height)) {
        outline(&mut layer, area, DRAG_OUTLINE, DRAG_OUTLINE_WIDTH);
    }
    layer
}

fn outline(layer: &mut RgbaImage, area: PixelRect, color: Rgba<u8>, thickness: u32) {
    for inset in 0..thickness {
        let w = area.width.saturating_sub(2 * inset);
        let h = area.height.saturating_sub(2 * inset);
        if w == 0 || h == 0 {
            break;
        }
        draw_hollow_rect_mut(
            layer,
            imageproc::rect::Rect::at((area.x + inset) as i32, (area.y + inset) as i32).of_size(w, h),
            color,
        );
    }
}
