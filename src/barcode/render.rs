// src/barcode/render.rs

use base64::{engine::general_purpose::STANDARD, Engine};
use image::{DynamicImage, GrayImage, ImageOutputFormat, Luma};
use qrcode::{EcLevel, QrCode};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::common::error::AppError;

const BLACK: Luma<u8> = Luma([0]);
const WHITE: Luma<u8> = Luma([255]);

// Margem branca, em módulos, de cada lado das barras
pub const QUIET_ZONE: u32 = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ErrorCorrection {
    L,
    #[default]
    M,
    Q,
    H,
}

impl From<ErrorCorrection> for EcLevel {
    fn from(level: ErrorCorrection) -> Self {
        match level {
            ErrorCorrection::L => EcLevel::L,
            ErrorCorrection::M => EcLevel::M,
            ErrorCorrection::Q => EcLevel::Q,
            ErrorCorrection::H => EcLevel::H,
        }
    }
}

/// Desenha os módulos como barras verticais.
pub fn bars_image(modules: &[bool], module_width: u32, height: u32) -> GrayImage {
    let module_width = module_width.max(1);
    let width = (modules.len() as u32 + 2 * QUIET_ZONE) * module_width;

    GrayImage::from_fn(width, height.max(1), |x, _| {
        let index = (x / module_width) as i64 - QUIET_ZONE as i64;
        match usize::try_from(index).ok().and_then(|i| modules.get(i)) {
            Some(true) => BLACK,
            _ => WHITE,
        }
    })
}

/// QR com zona de silêncio padrão (4 módulos). `module_size` é o lado de cada módulo em pixels.
pub fn qr_image(data: &str, module_size: u32, level: ErrorCorrection) -> Result<GrayImage, AppError> {
    let code = QrCode::with_error_correction_level(data.as_bytes(), level.into())?;
    let size = module_size.clamp(1, 40);
    Ok(code
        .render::<Luma<u8>>()
        .quiet_zone(true)
        .module_dimensions(size, size)
        .build())
}

pub fn png_bytes(image: GrayImage) -> Result<Vec<u8>, AppError> {
    let mut buffer = Vec::new();
    DynamicImage::ImageLuma8(image).write_to(&mut buffer, ImageOutputFormat::Png)?;
    Ok(buffer)
}

pub fn data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bars_follow_modules_with_quiet_zone() {
        let image = bars_image(&[true, false, true], 2, 5);
        assert_eq!(image.width(), (3 + 2 * QUIET_ZONE) * 2);
        assert_eq!(image.height(), 5);

        let first_bar = QUIET_ZONE * 2;
        assert_eq!(*image.get_pixel(0, 0), WHITE);
        assert_eq!(*image.get_pixel(first_bar, 4), BLACK);
        assert_eq!(*image.get_pixel(first_bar + 1, 0), BLACK);
        assert_eq!(*image.get_pixel(first_bar + 2, 0), WHITE);
        assert_eq!(*image.get_pixel(first_bar + 4, 0), BLACK);
        assert_eq!(*image.get_pixel(image.width() - 1, 0), WHITE);
    }

    #[test]
    fn qr_is_square_and_scaled() {
        let small = qr_image("PROD-4006381333931", 1, ErrorCorrection::M).unwrap();
        let large = qr_image("PROD-4006381333931", 10, ErrorCorrection::M).unwrap();
        assert_eq!(small.width(), small.height());
        assert_eq!(large.width(), small.width() * 10);
    }

    #[test]
    fn qr_rejects_oversized_data() {
        let data = "X".repeat(5000);
        assert!(matches!(
            qr_image(&data, 4, ErrorCorrection::H),
            Err(AppError::QrError(_))
        ));
    }

    #[test]
    fn png_data_url() {
        let png = png_bytes(bars_image(&[true], 1, 1)).unwrap();
        assert_eq!(&png[1..4], b"PNG");
        assert!(data_url("image/png", &png).starts_with("data:image/png;base64,iVBOR"));
    }
}
