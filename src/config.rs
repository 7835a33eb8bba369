use serde::Deserialize;

use crate::edge::HysteresisRatios;
use crate::error::{Error, Result};
use crate::kernel::Kernel;
use crate::smooth::BorderPolicy;

/// Parameters for a full detection run.
///
/// Missing fields take their default when deserialized:
///
/// ```
/// let config = canny_pipeline::CannyConfig::from_json_str(r#"{ "sigma": 1.0 }"#).unwrap();
/// assert_eq!(config.kernel_size, 3);
/// assert_eq!(config.sigma, 1.0);
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct CannyConfig {
    /// Side length of the Gaussian kernel. Must be odd.
    pub kernel_size: usize,
    /// Standard deviation of the Gaussian kernel.
    pub sigma: f64,
    /// Where smoothed values are written.
    pub border: BorderPolicy,
    /// Hysteresis thresholds as fractions of the maximum gradient magnitude.
    pub ratios: HysteresisRatios,
}

impl Default for CannyConfig {
    fn default() -> Self {
        CannyConfig {
            kernel_size: 3,
            sigma: 3.0,
            border: BorderPolicy::default(),
            ratios: HysteresisRatios::default(),
        }
    }
}

impl CannyConfig {
    /// Parses a JSON document and validates it.
    pub fn from_json_str(json: &str) -> Result<CannyConfig> {
        let config: CannyConfig =
            serde_json::from_str(json).map_err(|err| Error::invalid("config", err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every parameter up-front, before any image is touched.
    pub fn validate(&self) -> Result<()> {
        Kernel::gaussian(self.kernel_size, self.sigma)?;
        self.ratios.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_document() {
        let config = CannyConfig::from_json_str(
            r#"{
                "kernel_size": 5,
                "sigma": 1.4,
                "border": "centered",
                "ratios": { "low": 0.1, "high": 0.3 }
            }"#,
        )
        .unwrap();
        assert_eq!(config.kernel_size, 5);
        assert_eq!(config.border, BorderPolicy::Centered);
        assert_eq!(config.ratios, HysteresisRatios { low: 0.1, high: 0.3 });
    }

    #[test]
    fn empty_document_is_default() {
        assert_eq!(CannyConfig::from_json_str("{}").unwrap(), CannyConfig::default());
        assert_eq!(CannyConfig::default().border, BorderPolicy::OffsetByOne);
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(
            CannyConfig::from_json_str(r#"{ "kernel_size": 4 }"#),
            Err(Error::InvalidParameter { name: "size", .. })
        ));
        assert!(matches!(
            CannyConfig::from_json_str(r#"{ "ratios": { "low": 0.5 } }"#),
            Err(Error::InvalidParameter { name: "ratios.high", .. })
        ));
        assert!(matches!(
            CannyConfig::from_json_str(r#"{ "border": "mirror" }"#),
            Err(Error::InvalidParameter { name: "config", .. })
        ));
    }
}
