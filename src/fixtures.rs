//! Synthetic note images with known expected detector outcomes
//!
//! Used by the test suite, the benchmarks and the `self-check` CLI command.
//! Thread colors are given as HSV hue in degrees and converted with
//! `palette`, so fixtures state the color intent independent of the BGR
//! byte order the detectors consume. A BGR/RGB swap anywhere in the
//! pipeline makes [`vertical_thread`] with [`BLUE_HUE_DEGREES`] land in the
//! red hue range and go undetected.

use opencv::{
    core::{Mat, Rect, Scalar, CV_8UC1, CV_8UC3},
    imgproc::{rectangle, LINE_8},
    prelude::*,
};
use palette::{FromColor, Hsv, Srgb};

use crate::{Result, VerificationError};

pub const GREEN_HUE_DEGREES: f32 = 120.0;
pub const BLUE_HUE_DEGREES: f32 = 240.0;
pub const RED_HUE_DEGREES: f32 = 0.0;
/// Between the green and blue thread bands
pub const CYAN_HUE_DEGREES: f32 = 180.0;

/// Thread strip size drawn by [`vertical_thread`]
pub const THREAD_WIDTH: i32 = 15;
pub const THREAD_HEIGHT: i32 = 200;

/// Neutral paper tone
const BACKGROUND_LEVEL: f64 = 128.0;

const CHECKER_CELL: i32 = 4;

/// Cell size of the texture inside [`textured_oval`]
const OVAL_TEXTURE_CELL: i32 = 2;

/// Fully saturated, full-value color of the given hue as a BGR scalar
pub fn bgr_from_hue(hue_degrees: f32) -> Scalar {
    bgr_from_hsv(hue_degrees, 1.0, 1.0)
}

/// HSV (hue in degrees, saturation and value in 0-1) as a BGR scalar
pub fn bgr_from_hsv(hue_degrees: f32, saturation: f32, value: f32) -> Scalar {
    let hsv: Hsv = Hsv::new(hue_degrees, saturation, value);
    let rgb: Srgb<u8> = Srgb::<f32>::from_color(hsv).into_format();
    Scalar::new(rgb.blue as f64, rgb.green as f64, rgb.red as f64, 0.0)
}

/// Uniform gray BGR image
pub fn uniform_gray(rows: i32, cols: i32, level: u8) -> Result<Mat> {
    Mat::new_rows_cols_with_default(rows, cols, CV_8UC3, Scalar::all(level as f64))
        .map_err(|e| VerificationError::opencv("fixture allocation", e))
}

/// Single-channel image, rejected by the pipeline
pub fn grayscale(rows: i32, cols: i32) -> Result<Mat> {
    Mat::new_rows_cols_with_default(rows, cols, CV_8UC1, Scalar::all(BACKGROUND_LEVEL))
        .map_err(|e| VerificationError::opencv("fixture allocation", e))
}

/// Neutral background with one filled colored band
pub fn colored_band(rows: i32, cols: i32, band: Rect, hue_degrees: f32) -> Result<Mat> {
    let mut image = uniform_gray(rows, cols, BACKGROUND_LEVEL as u8)?;
    fill(&mut image, band, bgr_from_hue(hue_degrees))?;
    Ok(image)
}

/// Centered vertical thread of [`THREAD_WIDTH`] x [`THREAD_HEIGHT`] pixels
pub fn vertical_thread(rows: i32, cols: i32, hue_degrees: f32) -> Result<Mat> {
    if rows < THREAD_HEIGHT || cols < THREAD_WIDTH {
        return Err(VerificationError::invalid_image(format!(
            "thread fixture needs at least {}x{}",
            THREAD_WIDTH, THREAD_HEIGHT
        )));
    }
    let band = Rect::new(
        (cols - THREAD_WIDTH) / 2,
        (rows - THREAD_HEIGHT) / 2,
        THREAD_WIDTH,
        THREAD_HEIGHT,
    );
    colored_band(rows, cols, band, hue_degrees)
}

/// Vertical thread split into two halves separated by `gap` background rows
///
/// Each half alone is too squat to pass the aspect-ratio gate.
pub fn broken_thread(rows: i32, cols: i32, hue_degrees: f32, gap: i32) -> Result<Mat> {
    let half = THREAD_HEIGHT / 2;
    let total = 2 * half + gap;
    if rows < total || cols < THREAD_WIDTH {
        return Err(VerificationError::invalid_image(format!(
            "broken thread fixture needs at least {}x{}",
            THREAD_WIDTH, total
        )));
    }
    let x = (cols - THREAD_WIDTH) / 2;
    let top = (rows - total) / 2;
    let color = bgr_from_hue(hue_degrees);

    let mut image = uniform_gray(rows, cols, BACKGROUND_LEVEL as u8)?;
    fill(&mut image, Rect::new(x, top, THREAD_WIDTH, half), color)?;
    fill(&mut image, Rect::new(x, top + half + gap, THREAD_WIDTH, half), color)?;
    Ok(image)
}

/// Full-height vertical dark/light stripes of the given period
///
/// Dense in edges, but every row is identical, so the row projection is flat.
pub fn fine_hatching(rows: i32, cols: i32, period: i32) -> Result<Mat> {
    let stripe = (period / 2).max(1);
    let mut image = uniform_gray(rows, cols, 230)?;
    let dark = Scalar::all(30.0);

    let mut x = 0;
    while x < cols {
        fill(&mut image, Rect::new(x, 0, stripe.min(cols - x), rows), dark)?;
        x += period.max(2);
    }
    Ok(image)
}

/// Fine checker pattern inside a margin, imitating a block of micro text
///
/// The empty margin makes both row and column projections uneven.
pub fn micro_text_block(rows: i32, cols: i32) -> Result<Mat> {
    let mut image = uniform_gray(rows, cols, 230)?;
    let dark = Scalar::all(30.0);

    let top = rows / 8;
    let left = cols / 8;
    let bottom = rows - top;
    let right = cols - left;

    let mut y = top;
    while y < bottom {
        let mut x = left;
        while x < right {
            if ((x - left) / CHECKER_CELL + (y - top) / CHECKER_CELL) % 2 == 0 {
                let w = CHECKER_CELL.min(right - x);
                let h = CHECKER_CELL.min(bottom - y);
                fill(&mut image, Rect::new(x, y, w, h), dark)?;
            }
            x += CHECKER_CELL;
        }
        y += CHECKER_CELL;
    }
    Ok(image)
}

/// Horizontal dark/light stripes of the given period
///
/// The transpose of [`fine_hatching`]: every column is identical, so the
/// column projection is flat.
pub fn horizontal_hatching(rows: i32, cols: i32, period: i32) -> Result<Mat> {
    let stripe = (period / 2).max(1);
    let mut image = uniform_gray(rows, cols, 230)?;
    let dark = Scalar::all(30.0);

    let mut y = 0;
    while y < rows {
        fill(&mut image, Rect::new(0, y, cols, stripe.min(rows - y)), dark)?;
        y += period.max(2);
    }
    Ok(image)
}

/// Centered 4:1 ellipse of fine texture on flat paper
///
/// Half-axes are a third of the width and an eighth of the height. The
/// texture averages to the paper tone, so local contrast is confined to the
/// oval and its outline keeps an ellipse's circularity (about 0.54).
pub fn textured_oval(rows: i32, cols: i32) -> Result<Mat> {
    textured_oval_with_axes(rows, cols, cols / 3, rows / 8)
}

/// [`textured_oval`] with explicit half-axes in pixels
pub fn textured_oval_with_axes(rows: i32, cols: i32, half_width: i32, half_height: i32) -> Result<Mat> {
    if half_width < 1 || half_height < 1 || 2 * half_width >= cols || 2 * half_height >= rows {
        return Err(VerificationError::invalid_image(format!(
            "oval {}x{} does not fit a {}x{} image",
            2 * half_width,
            2 * half_height,
            cols,
            rows
        )));
    }

    let mut image = uniform_gray(rows, cols, BACKGROUND_LEVEL as u8)?;
    let (cx, cy) = (cols as f64 / 2.0, rows as f64 / 2.0);
    let (a, b) = (half_width as f64, half_height as f64);

    let pixels = image
        .data_bytes_mut()
        .map_err(|e| VerificationError::opencv("fixture access", e))?;
    for (index, pixel) in pixels.chunks_exact_mut(3).enumerate() {
        let x = (index % cols as usize) as i32;
        let y = (index / cols as usize) as i32;
        let dx = (x as f64 + 0.5 - cx) / a;
        let dy = (y as f64 + 0.5 - cy) / b;
        if dx * dx + dy * dy > 1.0 {
            continue;
        }
        // 30 and 226 average to the background level
        let level = if (x / OVAL_TEXTURE_CELL + y / OVAL_TEXTURE_CELL) % 2 == 0 {
            30
        } else {
            226
        };
        pixel.fill(level);
    }
    Ok(image)
}

fn fill(image: &mut Mat, area: Rect, color: Scalar) -> Result<()> {
    rectangle(image, area, color, -1, LINE_8, 0)
        .map_err(|e| VerificationError::opencv("fixture drawing", e))
}
