// Phase 10: compositor and overlay tests

use image::{Rgba, RgbaImage};

use pdf_redaction::config::settings::BlurMethod;
use pdf_redaction::export::compositor::{PixelRect, burn_rect, composite};
use pdf_redaction::mask::store::MaskStore;
use pdf_redaction::mask::{Mask, MaskKind, MaskStyle, NewMask, Rect, Rgb};
use pdf_redaction::overlay::{BLUR_OUTLINE, DRAG_OUTLINE, PREVIEW_ALPHA, render_overlay};

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

fn mask(rect: Rect, color: Rgb, blur: bool) -> Mask {
    let mut store = MaskStore::new();
    store.add_mask(
        1,
        NewMask {
            rect,
            kind: MaskKind::Box,
            style: MaskStyle { color, blur },
        },
    )
}

/// Black left of `edge`, white from `edge` on.
fn split_image(width: u32, height: u32, edge: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, _| if x < edge { BLACK } else { WHITE })
}

// ============================================================
// 1. geometry
// ============================================================

#[test]
fn test_burn_rect_pads_and_scales() {
    let burn = burn_rect(&Rect::new(20.0, 20.0, 40.0, 20.0), 1.5);
    assert_eq!(burn, Rect::new(22.5, 22.5, 75.0, 52.5));
}

#[test]
fn test_pixel_rect_clips_to_raster() {
    let clipped = PixelRect::clip(&Rect::new(-10.0, 90.0, 50.0, 50.0), 100, 100).unwrap();
    assert_eq!(
        clipped,
        PixelRect {
            x: 0,
            y: 90,
            width: 40,
            height: 10
        }
    );
    assert!(PixelRect::clip(&Rect::new(200.0, 0.0, 10.0, 10.0), 100, 100).is_none());
}

// ============================================================
// 2. solid masks
// ============================================================

#[test]
fn test_solid_mask_area_is_uniform_color() {
    let mut image = RgbaImage::from_pixel(200, 150, WHITE);
    let red = Rgb::new(200, 0, 0);
    composite(
        &mut image,
        &[mask(Rect::new(20.0, 20.0, 40.0, 20.0), red, false)],
        1.5,
        BlurMethod::Gaussian,
    );

    // Burn area (22.5, 22.5, 75, 52.5) rounds outward to x 22..98, y 22..75.
    for y in 22..75 {
        for x in 22..98 {
            assert_eq!(*image.get_pixel(x, y), Rgba([200, 0, 0, 255]), "at ({x},{y})");
        }
    }
    assert_eq!(*image.get_pixel(21, 21), WHITE);
    assert_eq!(*image.get_pixel(98, 75), WHITE);
}

#[test]
fn test_masks_are_drawn_in_z_order() {
    let mut image = RgbaImage::from_pixel(100, 100, WHITE);
    let masks = [
        mask(Rect::new(10.0, 10.0, 30.0, 30.0), Rgb::new(255, 0, 0), false),
        mask(Rect::new(10.0, 10.0, 30.0, 30.0), Rgb::new(0, 0, 255), false),
    ];
    composite(&mut image, &masks, 1.0, BlurMethod::Gaussian);
    assert_eq!(*image.get_pixel(20, 20), Rgba([0, 0, 255, 255]));
}

#[test]
fn test_mask_outside_raster_is_ignored() {
    let mut image = RgbaImage::from_pixel(50, 50, WHITE);
    composite(
        &mut image,
        &[mask(Rect::new(500.0, 500.0, 20.0, 20.0), Rgb::BLACK, false)],
        1.0,
        BlurMethod::Gaussian,
    );
    assert!(image.pixels().all(|p| *p == WHITE));
}

// ============================================================
// 3. blurred masks
// ============================================================

fn assert_blurred(method: BlurMethod) {
    let mut image = split_image(200, 100, 55);
    composite(
        &mut image,
        &[mask(Rect::new(40.0, 30.0, 30.0, 20.0), Rgb::BLACK, true)],
        1.0,
        method,
    );

    // Burn area x 35..75, y 25..60; the black/white edge runs through it.
    let left = image.get_pixel(35, 40)[0];
    let right = image.get_pixel(74, 40)[0];
    assert!(left < right, "edge should survive as a gradient: {left} vs {right}");
    assert!(left > 0, "black side must be softened");
    for y in 25..60 {
        for x in 35..75 {
            let p = image.get_pixel(x, y);
            assert!(p[0] >= 127, "area is washed toward white at ({x},{y})");
            assert_eq!(p[3], 255);
        }
    }

    // Outside the burn area nothing changes.
    assert_eq!(*image.get_pixel(10, 40), BLACK);
    assert_eq!(*image.get_pixel(150, 40), WHITE);
    assert_eq!(*image.get_pixel(45, 10), BLACK);
}

#[test]
fn test_gaussian_blur_softens_area() {
    assert_blurred(BlurMethod::Gaussian);
}

#[test]
fn test_downsample_blur_softens_area() {
    assert_blurred(BlurMethod::Downsample);
}

// ============================================================
// 4. overlay
// ============================================================

#[test]
fn test_overlay_draws_translucent_solid_masks() {
    let layer = render_overlay(
        100,
        100,
        &[mask(Rect::new(20.0, 20.0, 40.0, 20.0), Rgb::new(10, 20, 30), false)],
        None,
    );
    assert_eq!(*layer.get_pixel(30, 30), Rgba([10, 20, 30, PREVIEW_ALPHA]));
    assert_eq!(layer.get_pixel(0, 0)[3], 0);
}

#[test]
fn test_overlay_outlines_blur_masks_and_preview() {
    let preview = Rect::new(70.0, 70.0, 20.0, 20.0);
    let layer = render_overlay(
        100,
        100,
        &[mask(Rect::new(20.0, 20.0, 40.0, 20.0), Rgb::BLACK, true)],
        Some(&preview),
    );

    // Burn area starts at (15, 15).
    assert_eq!(*layer.get_pixel(15, 15), BLUR_OUTLINE);
    assert_eq!(*layer.get_pixel(17, 17), BLUR_OUTLINE);
    assert_eq!(layer.get_pixel(35, 30)[3], 0, "blur masks are not filled");

    assert_eq!(*layer.get_pixel(70, 70), DRAG_OUTLINE);
    assert_eq!(layer.get_pixel(80, 80)[3], 0);
}
