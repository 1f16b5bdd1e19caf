//! Drive icon composition.
//!
//! The volume icon is the system "removable disk" icon with the app icon
//! laid on top of it, tilted so it reads as printed on the drive's face.
//! Every image variant present in both ICNS families is composed
//! independently; the 1024px variant is always produced so Retina Finder
//! windows never fall back to a blurry upscale.

use crate::bundler::error::{Context, Error, ErrorExt, Result};
use icns::{IconFamily, IconType, Image as IcnsImage, PixelFormat};
use image::{
    Rgba, RgbaImage,
    imageops::{self, FilterType},
};
use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tokio::task::JoinSet;

/// Highest resolution variant (`ic10`, 512x512@2x).
pub const LARGEST_ICON_TYPE: IconType = IconType::RGBA32_512x512_2x;

/// Fraction of the width the top edge is pulled in on each side.
const PERSPECTIVE_TOP_INSET: f32 = 0.08;

/// The app icon is scaled to the base size divided by these factors.
const WIDTH_DIVISOR: f32 = 1.58;
const HEIGHT_DIVISOR: f32 = 1.82;

/// Upward shift of the app icon, relative to the base height.
const VERTICAL_OFFSET: f32 = 0.063;

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// One decoded image variant of an ICNS family.
#[derive(Clone, Debug)]
pub struct IconVariant {
    pub icon_type: IconType,
    pub image: RgbaImage,
    /// Size of the encoded element, used to find the richest source.
    pub encoded_len: usize,
}

/// Result of [`compose_volume_icon`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VolumeIcon {
    /// The app icon was composed onto the base disk icon.
    Composed(PathBuf),
    /// The app icon could not be used; the plain base disk icon is used instead.
    Base(PathBuf),
}

impl VolumeIcon {
    pub fn path(&self) -> &Path {
        match self {
            VolumeIcon::Composed(path) | VolumeIcon::Base(path) => path,
        }
    }
}

/// Tilts an icon so its top edge spans `[0.08w, 0.92w]`.
///
/// The bottom edge is unchanged; pixels outside the trapezoid are transparent.
pub fn apply_perspective(icon: &RgbaImage) -> RgbaImage {
    let (width, height) = icon.dimensions();
    let w = width as f32;
    let max_x = (width.saturating_sub(1)) as f32;

    RgbaImage::from_fn(width, height, |x, y| {
        let t = if height > 1 {
            y as f32 / (height - 1) as f32
        } else {
            1.0
        };
        let inset = w * PERSPECTIVE_TOP_INSET * (1.0 - t);
        let (left, right) = (inset, w - inset);

        let px = x as f32 + 0.5;
        if px < left || px > right {
            return TRANSPARENT;
        }

        let u = ((px - left) / (right - left) * w - 0.5).clamp(0.0, max_x);
        sample_row(icon, u, y)
    })
}

/// Linear interpolation between the two pixels around `u` on row `y`.
fn sample_row(icon: &RgbaImage, u: f32, y: u32) -> Rgba<u8> {
    let x0 = u.floor() as u32;
    let x1 = (x0 + 1).min(icon.width() - 1);
    let frac = u - x0 as f32;

    let (a, b) = (icon.get_pixel(x0, y), icon.get_pixel(x1, y));
    let mut out = [0u8; 4];
    for (c, slot) in out.iter_mut().enumerate() {
        let v = f32::from(a[c]) * (1.0 - frac) + f32::from(b[c]) * frac;
        *slot = v.round().clamp(0.0, 255.0) as u8;
    }
    Rgba(out)
}

/// Composes one variant: warp, squash and center the app icon on the base.
pub fn compose_variant(app: &RgbaImage, base: &RgbaImage) -> RgbaImage {
    let (base_w, base_h) = base.dimensions();

    let target_w = ((base_w as f32 / WIDTH_DIVISOR).round() as u32).max(1);
    let target_h = ((base_h as f32 / HEIGHT_DIVISOR).round() as u32).max(1);

    // Aspect ratio is deliberately not kept; the squash completes the perspective.
    let warped = apply_perspective(app);
    let resized = imageops::resize(&warped, target_w, target_h, FilterType::Lanczos3);

    let offset = (base_h as f32 * VERTICAL_OFFSET).round() as i64;
    let x = (i64::from(base_w) - i64::from(target_w)) / 2;
    let y = (i64::from(base_h) - i64::from(target_h)) / 2 - offset;

    let mut composed = base.clone();
    imageops::overlay(&mut composed, &resized, x, y);
    composed
}

/// Decodes every image variant of an ICNS file.
///
/// Mask elements are folded into their color variant. Variants that cannot
/// be decoded (JPEG 2000 payloads, for instance) are skipped with a warning.
pub fn read_variants(bytes: &[u8]) -> Result<Vec<IconVariant>> {
    let family = IconFamily::read(Cursor::new(bytes))?;
    let mut variants = Vec::new();

    for element in &family.elements {
        let Some(icon_type) = element.icon_type() else {
            continue;
        };
        if icon_type.is_mask() {
            continue;
        }

        match family
            .get_icon_with_type(icon_type)
            .map_err(Error::from)
            .and_then(to_rgba)
        {
            Ok(image) => variants.push(IconVariant {
                icon_type,
                image,
                encoded_len: element.data.len(),
            }),
            Err(e) => log::warn!("Skipping {} icon variant: {}", element.ostype, e),
        }
    }

    Ok(variants)
}

/// Composes the app icon family onto the base family.
///
/// Variants are composed concurrently on the blocking pool. Returns the
/// composed images keyed by their ICNS type code.
pub async fn compose_families(
    app: Vec<IconVariant>,
    base: Vec<IconVariant>,
) -> Result<BTreeMap<String, (IconType, RgbaImage)>> {
    let base: BTreeMap<String, IconVariant> = base
        .into_iter()
        .map(|v| (v.icon_type.ostype().to_string(), v))
        .collect();

    let mut tasks = JoinSet::new();
    for variant in &app {
        let ostype = variant.icon_type.ostype().to_string();
        match base.get(&ostype) {
            Some(base_variant) => {
                let app_image = variant.image.clone();
                let base_image = base_variant.image.clone();
                let icon_type = variant.icon_type;
                tasks.spawn_blocking(move || {
                    (ostype, icon_type, compose_variant(&app_image, &base_image))
                });
            }
            None => log::warn!("There is no base image for this type {}", ostype),
        }
    }

    let mut composed = BTreeMap::new();
    while let Some(joined) = tasks.join_next().await {
        let (ostype, icon_type, image) = joined.map_err(|e| {
            Error::GenericError(format!("Icon composition task failed: {}", e))
        })?;
        composed.insert(ostype, (icon_type, image));
    }

    let largest = LARGEST_ICON_TYPE.ostype().to_string();
    if !composed.contains_key(&largest) {
        let source = app.iter().max_by_key(|v| v.encoded_len);
        match (source, base.get(&largest)) {
            (Some(source), Some(base_variant)) => {
                log::debug!(
                    "Upscaling {} icon to produce {}",
                    source.icon_type.ostype(),
                    largest
                );
                let app_image = source.image.clone();
                let base_image = base_variant.image.clone();
                let image = tokio::task::spawn_blocking(move || {
                    compose_variant(&app_image, &base_image)
                })
                .await
                .map_err(|e| {
                    Error::GenericError(format!("Icon composition task failed: {}", e))
                })?;
                composed.insert(largest, (LARGEST_ICON_TYPE, image));
            }
            (_, None) => log::warn!("Base disk icon has no {} variant", largest),
            (None, _) => {}
        }
    }

    Ok(composed)
}

/// Encodes composed variants as an ICNS file.
pub fn encode_family(variants: &BTreeMap<String, (IconType, RgbaImage)>) -> Result<Vec<u8>> {
    let mut family = IconFamily::new();
    for (ostype, (icon_type, image)) in variants {
        let icns_image = from_rgba(image.clone())?;
        family
            .add_icon_with_type(&icns_image, *icon_type)
            .map_err(|e| Error::GenericError(format!("adding {} to icon family: {}", ostype, e)))?;
    }

    let mut out = Vec::new();
    family
        .write(&mut out)
        .map_err(|e| Error::GenericError(format!("writing ICNS data: {}", e)))?;
    Ok(out)
}

/// Builds the drive icon for the disk image.
///
/// Returns `None` when the base disk icon is unavailable, in which case the
/// image keeps the default volume icon. When the app icon cannot be decoded
/// the plain base icon is returned instead of failing the build.
pub async fn compose_volume_icon(
    app_icon: &Path,
    base_icon: &Path,
    output: &Path,
) -> Result<Option<VolumeIcon>> {
    let base_bytes = match tokio::fs::read(base_icon).await {
        Ok(bytes) => bytes,
        Err(e) => {
            log::warn!(
                "Base disk icon {} unavailable ({}), keeping the default volume icon",
                base_icon.display(),
                e
            );
            return Ok(None);
        }
    };

    let base_variants = tokio::task::spawn_blocking(move || read_variants(&base_bytes))
        .await
        .map_err(|e| Error::GenericError(format!("Icon decoding task failed: {}", e)))?
        .context("decoding base disk icon")?;

    let app_variants = match tokio::fs::read(app_icon).await {
        Ok(bytes) => tokio::task::spawn_blocking(move || read_variants(&bytes))
            .await
            .map_err(|e| Error::GenericError(format!("Icon decoding task failed: {}", e)))?,
        Err(e) => Err(e).fs_context("reading app icon", app_icon),
    };

    let app_variants = match app_variants {
        Ok(variants) if !variants.is_empty() => variants,
        Ok(_) => {
            log::warn!("{} has no usable image variants", app_icon.display());
            return Ok(Some(VolumeIcon::Base(base_icon.to_path_buf())));
        }
        Err(e) => {
            log::warn!("Using the plain disk icon: {}", e);
            return Ok(Some(VolumeIcon::Base(base_icon.to_path_buf())));
        }
    };

    let composed = compose_families(app_variants, base_variants).await?;
    if composed.is_empty() {
        log::warn!("No icon variants could be composed, using the plain disk icon");
        return Ok(Some(VolumeIcon::Base(base_icon.to_path_buf())));
    }

    let count = composed.len();
    let bytes = tokio::task::spawn_blocking(move || encode_family(&composed))
        .await
        .map_err(|e| Error::GenericError(format!("ICNS encoding task failed: {}", e)))??;

    tokio::fs::write(output, bytes)
        .await
        .fs_context("writing composed icon", output)?;

    log::info!(
        "Composed drive icon with {} variants: {}",
        count,
        output.display()
    );
    Ok(Some(VolumeIcon::Composed(output.to_path_buf())))
}

fn to_rgba(image: IcnsImage) -> Result<RgbaImage> {
    let image = image.convert_to(PixelFormat::RGBA);
    let (width, height) = (image.width(), image.height());
    RgbaImage::from_raw(width, height, image.into_data().into_vec())
        .context("ICNS image buffer does not match its dimensions")
}

fn from_rgba(image: RgbaImage) -> Result<IcnsImage> {
    let (width, height) = image.dimensions();
    IcnsImage::from_data(PixelFormat::RGBA, width, height, image.into_raw())
        .map_err(|e| Error::GenericError(format!("creating ICNS image: {}", e)))
}
