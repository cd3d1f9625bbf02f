// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Synthetic page fixtures shared by the unit tests.

use image::{DynamicImage, GrayImage, Luma, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Blank margin kept free of ink on every fixture page.
pub const MARGIN: u32 = 12;

/// A white page with seeded, drawing-like content: filled blocks of varying
/// tone, outlined boxes, strokes and small dots, all inside [`MARGIN`].
pub fn drawing_page(width: u32, height: u32, seed: u64) -> GrayImage {
    let mut page = GrayImage::from_pixel(width, height, Luma([255u8]));
    if width <= 2 * MARGIN + 8 || height <= 2 * MARGIN + 8 {
        return page;
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let area = (width * height) as usize;
    let (x_max, y_max) = (width - MARGIN, height - MARGIN);

    let corner = |rng: &mut StdRng, w: u32, h: u32| -> (i32, i32) {
        let x = rng.gen_range(MARGIN..(x_max - w).max(MARGIN + 1));
        let y = rng.gen_range(MARGIN..(y_max - h).max(MARGIN + 1));
        (x as i32, y as i32)
    };

    for _ in 0..(area / 6000).max(3) {
        let w = rng.gen_range(6..=(width / 6).max(7));
        let h = rng.gen_range(6..=(height / 6).max(7));
        let (x, y) = corner(&mut rng, w, h);
        let tone = rng.gen_range(0..120u8);
        draw_filled_rect_mut(&mut page, Rect::at(x, y).of_size(w, h), Luma([tone]));
    }
    for _ in 0..(area / 8000).max(2) {
        let w = rng.gen_range(10..=(width / 4).max(11));
        let h = rng.gen_range(10..=(height / 4).max(11));
        let (x, y) = corner(&mut rng, w, h);
        draw_hollow_rect_mut(&mut page, Rect::at(x, y).of_size(w, h), Luma([0u8]));
    }
    for _ in 0..(area / 5000).max(3) {
        let (x0, y0) = corner(&mut rng, 1, 1);
        let (x1, y1) = corner(&mut rng, 1, 1);
        let tone = rng.gen_range(0..90u8);
        draw_line_segment_mut(
            &mut page,
            (x0 as f32, y0 as f32),
            (x1 as f32, y1 as f32),
            Luma([tone]),
        );
    }
    for _ in 0..(area / 1500).max(4) {
        let (x, y) = corner(&mut rng, 3, 3);
        draw_filled_rect_mut(&mut page, Rect::at(x, y).of_size(3, 3), Luma([0u8]));
    }
    page
}

/// A white page of solid black blocks with varied sizes, placed by `seed`.
///
/// Blocks stay `2 * MARGIN` from the border and out of `keep_clear`
/// (x0, y0, x1, y1), so content survives small rotations and the clear box
/// can take a later edit.
pub fn block_page(
    width: u32,
    height: u32,
    seed: u64,
    keep_clear: (u32, u32, u32, u32),
) -> GrayImage {
    let mut page = GrayImage::from_pixel(width, height, Luma([255u8]));
    let border = 2 * MARGIN;
    if width <= 2 * border + 40 || height <= 2 * border + 40 {
        return page;
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let (cx0, cy0, cx1, cy1) = keep_clear;
    let mut placed = 0;
    for _ in 0..400 {
        if placed == 40 {
            break;
        }
        let w = rng.gen_range(8..=36u32);
        let h = rng.gen_range(8..=36u32);
        let x = rng.gen_range(border..width - border - w);
        let y = rng.gen_range(border..height - border - h);
        let clear = x + w + 4 <= cx0 || x >= cx1 + 4 || y + h + 4 <= cy0 || y >= cy1 + 4;
        if clear {
            draw_filled_rect_mut(
                &mut page,
                Rect::at(x as i32, y as i32).of_size(w, h),
                Luma([0u8]),
            );
            placed += 1;
        }
    }
    page
}

/// Copy of `page` moved by (dx, dy); uncovered pixels are white.
pub fn shifted(page: &GrayImage, dx: i32, dy: i32) -> GrayImage {
    let (width, height) = page.dimensions();
    let mut out = GrayImage::from_pixel(width, height, Luma([255u8]));
    for (x, y, pixel) in page.enumerate_pixels() {
        let (tx, ty) = (x as i32 + dx, y as i32 + dy);
        if tx >= 0 && ty >= 0 && (tx as u32) < width && (ty as u32) < height {
            out.put_pixel(tx as u32, ty as u32, *pixel);
        }
    }
    out
}

pub fn gray_to_rgb(page: &GrayImage) -> RgbImage {
    DynamicImage::ImageLuma8(page.clone()).to_rgb8()
}

/// A white page with one black square.
pub fn square_page(size: u32, x: u32, y: u32, side: u32) -> GrayImage {
    let mut page = GrayImage::from_pixel(size, size, Luma([255u8]));
    draw_filled_rect_mut(
        &mut page,
        Rect::at(x as i32, y as i32).of_size(side, side),
        Luma([0u8]),
    );
    page
}
