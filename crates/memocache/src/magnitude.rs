//! AB magnitude / flux conversions

/// The Oke & Gunn (1983) AB magnitude reference flux, in nJy
///
/// Equal to `1e23 * 10^(48.6 / -2.5) * 1e9`, i.e. roughly 3631 Jy.
pub const REFERENCE_FLUX: f64 = 3_630_780_547_701.0024;

/// Convert a flux in nanojansky to AB magnitude
pub fn nanojansky_to_ab_magnitude(flux: f64) -> f64 {
    -2.5 * (flux / REFERENCE_FLUX).log10()
}

/// Convert an AB magnitude to a flux in nanojansky
pub fn ab_magnitude_to_nanojansky(magnitude: f64) -> f64 {
    10f64.powf(magnitude / -2.5) * REFERENCE_FLUX
}
