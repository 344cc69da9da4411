use anyhow::Result;
use image::{DynamicImage, GrayImage, Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use oilmeter::TextRecognizer;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Reference frame of the default ROI
pub const BASE_W: u32 = 883;
pub const BASE_H: u32 = 783;

const HOUSING: Rgb<u8> = Rgb([90, 85, 80]);
const WHEEL: Rgb<u8> = Rgb([225, 222, 215]);
const GLYPH: Rgb<u8> = Rgb([20, 20, 25]);

/// Digit cell and stroke size at 1x
const DIGIT_W: u32 = 30;
const DIGIT_H: u32 = 56;
const STROKE: u32 = 4;
const GAP: u32 = 12;

/// Segments a..g lit per digit
const SEGMENTS: [[bool; 7]; 10] = [
    [true, true, true, true, true, true, false],
    [false, true, true, false, false, false, false],
    [true, true, false, true, true, false, true],
    [true, true, true, true, false, false, true],
    [false, true, true, false, false, true, true],
    [true, false, true, true, false, true, true],
    [true, false, true, true, true, true, true],
    [true, true, true, false, false, false, false],
    [true, true, true, true, true, true, true],
    [true, true, true, true, false, true, true],
];

/// A snapshot of the meter at `scale` times the reference resolution with
/// `reading` painted as seven-segment glyphs inside the default ROI.
pub fn meter_frame(reading: &str, scale: u32) -> DynamicImage {
    let mut img = RgbImage::from_pixel(BASE_W * scale, BASE_H * scale, HOUSING);

    // Light counter window exactly covering the ROI (180, 362, 293, 73)
    fill(&mut img, scale, 180, 362, 293, 73, WHEEL);

    let mut cursor = 190;
    let top = 370;
    for c in reading.chars() {
        match c {
            '.' | ',' => {
                fill(&mut img, scale, cursor, top + DIGIT_H - STROKE, STROKE, STROKE, GLYPH);
                cursor += STROKE + GAP;
            }
            d => {
                let digit = d.to_digit(10).expect("fixture only paints digits") as usize;
                draw_digit(&mut img, scale, cursor, top, digit);
                cursor += DIGIT_W + GAP;
            }
        }
    }

    DynamicImage::ImageRgb8(img)
}

/// Uniformly coloured frame
pub fn flat_frame(width: u32, height: u32, color: [u8; 3]) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color)))
}

/// The meter with the counter window covered
pub fn occluded_frame() -> DynamicImage {
    let mut img = RgbImage::from_pixel(BASE_W, BASE_H, HOUSING);
    fill(&mut img, 1, 150, 330, 360, 140, Rgb([35, 35, 35]));
    DynamicImage::ImageRgb8(img)
}

fn draw_digit(img: &mut RgbImage, scale: u32, x: u32, y: u32, digit: usize) {
    let (w, h, t) = (DIGIT_W, DIGIT_H, STROKE);
    let half = h / 2;
    let rects = [
        (0, 0, w, t),                 // a
        (w - t, 0, t, half),          // b
        (w - t, half, t, h - half),   // c
        (0, h - t, w, t),             // d
        (0, half, t, h - half),       // e
        (0, 0, t, half),              // f
        (0, half - t / 2, w, t),      // g
    ];
    for (lit, (rx, ry, rw, rh)) in SEGMENTS[digit].iter().zip(rects) {
        if *lit {
            fill(img, scale, x + rx, y + ry, rw, rh, GLYPH);
        }
    }
}

fn fill(img: &mut RgbImage, scale: u32, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
    let rect = Rect::at((x * scale) as i32, (y * scale) as i32).of_size(w * scale, h * scale);
    draw_filled_rect_mut(img, rect, color);
}

/// Decodes seven-segment glyphs from a conditioned (ink = white) image.
///
/// Stands in for a real OCR engine so the full pipeline can be checked
/// without model files.
pub struct SevenSegmentReader {
    pub calls: Arc<AtomicUsize>,
}

impl SevenSegmentReader {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl TextRecognizer for SevenSegmentReader {
    fn name(&self) -> &str {
        "seven-segment"
    }

    fn recognize(&self, image: &GrayImage) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(decode_seven_segment(image))
    }
}

struct Blob {
    x0: u32,
    x1: u32,
    y0: u32,
    y1: u32,
}

fn decode_seven_segment(image: &GrayImage) -> String {
    let (width, height) = image.dimensions();
    let column_has_ink = |x: u32| (0..height).any(|y| image.get_pixel(x, y)[0] != 0);

    let mut blobs = Vec::new();
    let mut start = None;
    for x in 0..=width {
        let ink = x < width && column_has_ink(x);
        match (ink, start) {
            (true, None) => start = Some(x),
            (false, Some(x0)) => {
                let x1 = x - 1;
                let rows: Vec<u32> = (0..height)
                    .filter(|&y| (x0..=x1).any(|cx| image.get_pixel(cx, y)[0] != 0))
                    .collect();
                blobs.push(Blob {
                    x0,
                    x1,
                    y0: rows[0],
                    y1: rows[rows.len() - 1],
                });
                start = None;
            }
            _ => {}
        }
    }

    let max_h = blobs.iter().map(|b| b.y1 - b.y0 + 1).max().unwrap_or(0);
    let max_w = blobs.iter().map(|b| b.x1 - b.x0 + 1).max().unwrap_or(0);

    let lit = |x: u32, y: u32| {
        let xs = x.saturating_sub(1)..=(x + 1).min(width - 1);
        xs.into_iter().any(|px| {
            (y.saturating_sub(1)..=(y + 1).min(height - 1)).any(|py| image.get_pixel(px, py)[0] != 0)
        })
    };

    blobs
        .iter()
        .map(|b| {
            let w = b.x1 - b.x0 + 1;
            let h = b.y1 - b.y0 + 1;
            if h * 3 < max_h {
                return '.';
            }
            if w * 2 < max_w {
                return '1';
            }
            let mid_x = b.x0 + w / 2;
            let pattern = [
                lit(mid_x, b.y0 + 1),
                lit(b.x1 - 1, b.y0 + h / 4),
                lit(b.x1 - 1, b.y0 + 3 * h / 4),
                lit(mid_x, b.y1 - 1),
                lit(b.x0 + 1, b.y0 + 3 * h / 4),
                lit(b.x0 + 1, b.y0 + h / 4),
                lit(mid_x, b.y0 + h / 2),
            ];
            SEGMENTS
                .iter()
                .position(|segments| *segments == pattern)
                .and_then(|d| char::from_digit(d as u32, 10))
                .unwrap_or('?')
        })
        .collect()
}

/// Returns a fixed string and records the size of every image it sees
pub struct ScriptedRecognizer {
    pub text: String,
    pub seen: Arc<Mutex<Vec<(u32, u32)>>>,
}

impl ScriptedRecognizer {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl TextRecognizer for ScriptedRecognizer {
    fn name(&self) -> &str {
        "scripted"
    }

    fn recognize(&self, image: &GrayImage) -> Result<String> {
        self.seen.lock().unwrap().push(image.dimensions());
        Ok(self.text.clone())
    }
}

/// An engine that always errors
pub struct BrokenRecognizer;

impl TextRecognizer for BrokenRecognizer {
    fn name(&self) -> &str {
        "broken"
    }

    fn recognize(&self, _image: &GrayImage) -> Result<String> {
        anyhow::bail!("engine crashed")
    }
}
