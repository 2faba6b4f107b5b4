// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/tracemark

//! Example: embed a watermark into a PPM image, or forensically decode one.
//!
//! Decode never crashes: every decode error is printed as a result line, so
//! the tool can run inside scripts over arbitrary leaked files.
use std::fs;
use std::time::{SystemTime, UNIX_EPOCH};

use tracemark_core::{decode, encode, DecodeError, DecodingConfig, EncodingConfig, RasterImage, WatermarkPayload};

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: watermark_tool <input.ppm> <output.ppm> <viewer-id> <screenshot-id>");
        eprintln!("       watermark_tool --decode <marked.ppm> [orig-width orig-height]");
        std::process::exit(1);
    }

    if args[1] == "--decode" {
        let image = read_ppm(&args[2]);
        let mut config = DecodingConfig::default();
        if args.len() >= 5 {
            let w: u32 = args[3].parse().expect("bad original width");
            let h: u32 = args[4].parse().expect("bad original height");
            config.assumed_dimensions = Some((w, h));
        }
        match decode(&image, &config) {
            Ok((payload, quality)) => {
                println!("viewerId:      {}", payload.viewer_id);
                println!("viewTimestamp: {}", payload.view_timestamp);
                println!("screenshotId:  {}", payload.screenshot_id);
                println!("confidence:    {:.2}", quality.confidence);
            }
            Err(DecodeError::PartialExtraction { recovered, confidence }) => {
                println!("partial extraction ({recovered}), confidence {confidence:.2}");
            }
            Err(e) => {
                println!("{e}, confidence 0.00");
            }
        }
    } else {
        let image = read_ppm(&args[1]);
        let viewer_id = args.get(3).map(String::as_str).unwrap_or("anonymous");
        let screenshot_id = args.get(4).map(String::as_str).unwrap_or("unknown");
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock before epoch")
            .as_millis() as i64;

        let payload = WatermarkPayload::new(viewer_id, now_ms, screenshot_id);
        let marked = encode(&image, &payload, &EncodingConfig::default()).expect("encode failed");
        write_ppm(&args[2], &marked);
        println!("Watermarked image written to: {}", args[2]);
        println!("viewerId={viewer_id} viewTimestamp={now_ms} screenshotId={screenshot_id}");
    }
}

/// Minimal binary PPM (P6, 8-bit) reader. Container handling is demo glue;
/// the codec itself only sees `RasterImage`.
fn read_ppm(path: &str) -> RasterImage {
    let bytes = fs::read(path).expect("could not read image");
    let mut fields = Vec::with_capacity(4);
    let mut pos = 0usize;
    while fields.len() < 4 {
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if pos < bytes.len() && bytes[pos] == b'#' {
            while pos < bytes.len() && bytes[pos] != b'\n' {
                pos += 1;
            }
            continue;
        }
        let start = pos;
        while pos < bytes.len() && !bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        fields.push(std::str::from_utf8(&bytes[start..pos]).expect("bad PPM header"));
    }
    assert_eq!(fields[0], "P6", "only binary PPM (P6) is supported");
    let width: u32 = fields[1].parse().expect("bad width");
    let height: u32 = fields[2].parse().expect("bad height");
    assert_eq!(fields[3], "255", "only 8-bit PPM is supported");
    pos += 1; // single whitespace after maxval

    let expected = width as usize * height as usize * 3;
    let data = bytes[pos..pos + expected].to_vec();
    RasterImage::new(width, height, 3, data).expect("inconsistent PPM")
}

fn write_ppm(path: &str, image: &RasterImage) {
    assert_eq!(image.channels(), 3, "PPM output needs an RGB image");
    let mut out = format!("P6\n{} {}\n255\n", image.width(), image.height()).into_bytes();
    out.extend_from_slice(image.data());
    fs::write(path, out).expect("could not write output");
}
