//! Projector alignment crosshair
//!
//! ROB's face is projected from behind, so the projector has to be lined up by eye. The frame is
//! a white border broken along each edge, which marks the corners, and a cross in the middle.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use image::Rgb;

use eqpt_if::eqpt::display::{RgbImage, CANVAS_HEIGHT, CANVAS_WIDTH};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Thickness of every stroke
///
/// Units: pixels
const LINE_WIDTH: i64 = 5;

/// Lines which break the border, leaving only the corners
const BORDER_BREAKS: [((i64, i64), (i64, i64)); 4] = [
    ((75, 0), (779, 0)),
    ((75, 479), (779, 479)),
    ((0, 75), (0, 405)),
    ((853, 75), (853, 405)),
];

/// The cross itself, horizontal then vertical
const CROSS: [((i64, i64), (i64, i64)); 2] = [
    ((250, 240), (604, 240)),
    ((427, 100), (427, 380)),
];

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Draw the crosshair onto a new canvas.
pub fn draw_crosshair() -> RgbImage {
    let mut img = RgbImage::from_pixel(CANVAS_WIDTH, CANVAS_HEIGHT, BLACK);
    let (w, h) = (CANVAS_WIDTH as i64, CANVAS_HEIGHT as i64);

    // Border, drawn inside the canvas edge
    fill(&mut img, (0, 0), (w - 1, LINE_WIDTH - 1), WHITE);
    fill(&mut img, (0, h - LINE_WIDTH), (w - 1, h - 1), WHITE);
    fill(&mut img, (0, 0), (LINE_WIDTH - 1, h - 1), WHITE);
    fill(&mut img, (w - LINE_WIDTH, 0), (w - 1, h - 1), WHITE);

    for (start, end) in BORDER_BREAKS.iter() {
        line(&mut img, *start, *end, BLACK);
    }

    for (start, end) in CROSS.iter() {
        line(&mut img, *start, *end, WHITE);
    }

    img
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Draw a horizontal or vertical line of `LINE_WIDTH`, centred on the given points.
fn line(img: &mut RgbImage, start: (i64, i64), end: (i64, i64), colour: Rgb<u8>) {
    let half = LINE_WIDTH / 2;

    if start.1 == end.1 {
        fill(img, (start.0, start.1 - half), (end.0, end.1 + half), colour);
    }
    else {
        fill(img, (start.0 - half, start.1), (end.0 + half, end.1), colour);
    }
}

/// Fill the inclusive rectangle between two corners, clipped to the image.
fn fill(img: &mut RgbImage, a: (i64, i64), b: (i64, i64), colour: Rgb<u8>) {
    let x0 = a.0.min(b.0).max(0);
    let x1 = a.0.max(b.0).min(img.width() as i64 - 1);
    let y0 = a.1.min(b.1).max(0);
    let y1 = a.1.max(b.1).min(img.height() as i64 - 1);

    for y in y0..=y1 {
        for x in x0..=x1 {
            img.put_pixel(x as u32, y as u32, colour);
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn px(img: &RgbImage, x: u32, y: u32) -> Rgb<u8> {
        *img.get_pixel(x, y)
    }

    #[test]
    fn test_canvas() {
        let img = draw_crosshair();

        assert_eq!(img.dimensions(), (854, 480));

        // Background
        assert_eq!(px(&img, 100, 100), BLACK);
        assert_eq!(px(&img, 800, 400), BLACK);
    }

    #[test]
    fn test_border_corners() {
        let img = draw_crosshair();

        // Corners stay white
        assert_eq!(px(&img, 0, 0), WHITE);
        assert_eq!(px(&img, 74, 2), WHITE);
        assert_eq!(px(&img, 853, 479), WHITE);
        assert_eq!(px(&img, 4, 470), WHITE);

        // Broken along the middle of each edge, to the line's half width
        assert_eq!(px(&img, 400, 0), BLACK);
        assert_eq!(px(&img, 400, 2), BLACK);
        assert_eq!(px(&img, 400, 477), BLACK);
        assert_eq!(px(&img, 1, 200), BLACK);
        assert_eq!(px(&img, 852, 200), BLACK);

        // The inner part of the border is untouched
        assert_eq!(px(&img, 400, 3), WHITE);
        assert_eq!(px(&img, 400, 476), WHITE);
        assert_eq!(px(&img, 3, 200), WHITE);
        assert_eq!(px(&img, 849, 200), WHITE);

        // Inside the border
        assert_eq!(px(&img, 5, 5), BLACK);
    }

    #[test]
    fn test_cross() {
        let img = draw_crosshair();

        // Horizontal arm
        assert_eq!(px(&img, 250, 238), WHITE);
        assert_eq!(px(&img, 604, 242), WHITE);
        assert_eq!(px(&img, 300, 237), BLACK);
        assert_eq!(px(&img, 605, 240), BLACK);

        // Vertical arm
        assert_eq!(px(&img, 425, 100), WHITE);
        assert_eq!(px(&img, 429, 380), WHITE);
        assert_eq!(px(&img, 427, 99), BLACK);
        assert_eq!(px(&img, 430, 300), BLACK);
    }
}
