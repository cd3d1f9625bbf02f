// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Noise filter — drops connected regions whose outline encloses too little area.

use image::{GrayImage, Luma};
use imageproc::contours::{BorderType, Contour, find_contours};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;
use tracing::{debug, instrument};

use crate::mask::{BinaryMask, SET};

/// Keep only external regions of `mask` whose contour area is strictly
/// greater than `min_area`, redrawn solid-filled on a fresh mask.
///
/// Area is measured on the traced outline through pixel centres, so a
/// one-pixel-wide stroke has zero area however long it is.
#[instrument(skip(mask), fields(width = mask.width(), height = mask.height()))]
pub fn clean(mask: &BinaryMask, min_area: u32) -> BinaryMask {
    let (width, height) = mask.dimensions();
    if width == 0 || height == 0 || mask.is_empty() {
        return mask.clone();
    }

    let contours: Vec<Contour<i32>> = find_contours(mask.as_gray());
    let mut out = GrayImage::new(width, height);
    let mut kept = 0usize;
    let mut external = 0usize;

    for contour in contours
        .iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
    {
        external += 1;
        if contour_area(&contour.points) <= min_area as f64 {
            continue;
        }
        kept += 1;
        fill_contour(&mut out, &contour.points);
    }

    debug!(external, kept, min_area, "Noise regions filtered");
    BinaryMask::from_gray_unchecked(out)
}

/// Polygon area of a closed contour (shoelace formula).
fn contour_area(points: &[Point<i32>]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut twice_area = 0i64;
    for i in 0..n {
        let j = (i + 1) % n;
        twice_area += points[i].x as i64 * points[j].y as i64;
        twice_area -= points[j].x as i64 * points[i].y as i64;
    }
    twice_area.abs() as f64 / 2.0
}

fn fill_contour(canvas: &mut GrayImage, points: &[Point<i32>]) {
    let mut polygon: Vec<Point<i32>> = Vec::with_capacity(points.len());
    for &p in points {
        if polygon.last() != Some(&p) {
            polygon.push(p);
        }
    }
    while polygon.len() > 1 && polygon.first() == polygon.last() {
        polygon.pop();
    }
    if polygon.len() >= 3 {
        draw_polygon_mut(canvas, &polygon, Luma([SET]));
    }
    // The outline itself always belongs to the region.
    for p in points {
        if p.x >= 0 && p.y >= 0 && (p.x as u32) < canvas.width() && (p.y as u32) < canvas.height() {
            canvas.put_pixel(p.x as u32, p.y as u32, Luma([SET]));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    fn mask_with(width: u32, height: u32, rects: &[(i32, i32, u32, u32)]) -> BinaryMask {
        let mut img = GrayImage::new(width, height);
        for &(x, y, w, h) in rects {
            draw_filled_rect_mut(&mut img, Rect::at(x, y).of_size(w, h), Luma([SET]));
        }
        BinaryMask::try_from_gray(img).unwrap()
    }

    #[test]
    fn specks_are_removed_and_blocks_kept() {
        // A 10x10 block (area 81), a 2x2 speck (area 1) and a single pixel.
        let mask = mask_with(60, 40, &[(5, 5, 10, 10), (30, 30, 2, 2), (50, 10, 1, 1)]);
        let cleaned = clean(&mask, 5);
        assert_eq!(cleaned.count(), 100);
        assert!(cleaned.is_set(5, 5) && cleaned.is_set(14, 14));
        assert!(!cleaned.is_set(30, 30));
        assert!(!cleaned.is_set(50, 10));
    }

    #[test]
    fn thin_strokes_have_no_area() {
        let mask = mask_with(80, 20, &[(5, 5, 60, 1)]);
        assert!(clean(&mask, 0).is_empty());
    }

    #[test]
    fn holes_are_filled() {
        let mut img = GrayImage::new(30, 30);
        draw_filled_rect_mut(&mut img, Rect::at(5, 5).of_size(20, 20), Luma([SET]));
        draw_filled_rect_mut(&mut img, Rect::at(10, 10).of_size(5, 5), Luma([0]));
        let mask = BinaryMask::try_from_gray(img).unwrap();
        let cleaned = clean(&mask, 5);
        assert_eq!(cleaned.count(), 400);
        assert!(cleaned.is_set(12, 12));
    }

    #[test]
    fn area_threshold_is_strict() {
        // 4x4 block: outline through pixel centres encloses 3 * 3 = 9.
        let mask = mask_with(20, 20, &[(4, 4, 4, 4)]);
        assert_eq!(clean(&mask, 8).count(), 16);
        assert!(clean(&mask, 9).is_empty());
    }

    #[test]
    fn cleaning_is_idempotent() {
        let mask = mask_with(
            120,
            90,
            &[(5, 5, 30, 12), (50, 40, 3, 3), (60, 10, 2, 40), (80, 60, 25, 25), (90, 5, 1, 1)],
        );
        let once = clean(&mask, 5);
        let twice = clean(&once, 5);
        assert_eq!(once, twice);
    }

    #[test]
    fn larger_threshold_keeps_a_subset() {
        let mask = mask_with(
            120,
            90,
            &[(5, 5, 30, 12), (50, 40, 4, 4), (60, 10, 3, 20), (80, 60, 8, 8)],
        );
        let loose = clean(&mask, 5);
        let strict = clean(&mask, 60);
        assert!(strict.is_subset_of(&loose));
        assert!(strict.count() < loose.count());
    }

    #[test]
    fn empty_and_zero_sized_masks_pass_through() {
        let empty = BinaryMask::empty(10, 10);
        assert_eq!(clean(&empty, 5), empty);
        let nothing = BinaryMask::empty(0, 0);
        assert_eq!(clean(&nothing, 5), nothing);
    }
}
