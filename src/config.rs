use serde::{Deserialize, Serialize};

use crate::args::Format;
use crate::error::Result;
use crate::float_range::FloatRange;
use crate::read_file;

#[derive(Serialize, Deserialize, Debug)]
pub struct Config {
    pub ranges: Vec<RangeConfig>,
    #[serde(default)]
    pub format: Option<Format>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RangeConfig {
    pub name: String,
    #[serde(default)]
    pub start: f64,
    pub stop: f64,
    #[serde(default = "default_step")]
    pub step: f64,
}

fn default_step() -> f64 {
    1.0
}

impl RangeConfig {
    pub fn to_range(&self) -> Result<FloatRange> {
        FloatRange::try_new(self.stop, self.start, self.step)
    }
}

impl Config {
    pub fn from_json(contents: &str) -> serde_json::Result<Config> {
        serde_json::from_str(contents)
    }
}

pub fn parse_config(fp: &str) -> std::result::Result<Config, Box<dyn std::error::Error>> {
    let contents = read_file(fp)?;

    let config = Config::from_json(&contents)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RangeError;

    #[test]
    fn test_defaults() {
        let cfg = Config::from_json(r#"{"ranges": [{"name": "x", "stop": 4}]}"#).unwrap();
        assert_eq!(cfg.format, None);
        assert_eq!(cfg.ranges.len(), 1);
        assert_eq!(
            cfg.ranges[0].to_range(),
            Ok(FloatRange::new(4.0, 0.0, 1.0))
        );
    }

    #[test]
    fn test_full() {
        let cfg = Config::from_json(
            r#"{
                "ranges": [
                    {"name": "alpha", "start": 0.1, "stop": 0.5, "step": 0.1},
                    {"name": "beta", "start": 3, "stop": 0, "step": -1}
                ],
                "format": "csv"
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.format, Some(Format::Csv));
        assert_eq!(cfg.ranges[1].name, "beta");
        let beta = cfg.ranges[1].to_range().unwrap();
        assert_eq!(beta.iter().collect::<Vec<_>>(), vec![3.0, 2.0, 1.0]);
    }

    #[test]
    fn test_zero_step_rejected_on_conversion() {
        let cfg = Config::from_json(r#"{"ranges": [{"name": "z", "stop": 1, "step": 0}]}"#)
            .unwrap();
        assert_eq!(cfg.ranges[0].to_range(), Err(RangeError::ZeroStep));
    }

    #[test]
    fn test_missing_file() {
        assert!(parse_config("/nonexistent/frange-config.json").is_err());
    }
}
