use serde::{Deserialize, Serialize};

use crate::defuzzification::{default_steps, DefuzzificationOp};

/// Engine settings that can be loaded from a configuration document.
///
/// ```json
/// { "defuzzification": { "method": "mean-max", "steps": 250 } }
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_defuzzification")]
    pub defuzzification: DefuzzificationOp,
}

fn default_defuzzification() -> DefuzzificationOp {
    DefuzzificationOp::Centroid { steps: default_steps() }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            defuzzification: default_defuzzification(),
        }
    }
}

#[test]
fn test_deserialize() {
    let config: EngineConfig =
        serde_json::from_str(r#"{ "defuzzification": { "method": "mean-max", "steps": 250 } }"#).expect("valid config");

    assert_eq!(config.defuzzification, DefuzzificationOp::mean_of_maximum(250));
}

#[test]
fn test_defaults() {
    let config: EngineConfig = serde_json::from_str("{}").expect("empty config");

    assert_eq!(config, EngineConfig::default());
    assert_eq!(config.defuzzification, DefuzzificationOp::centroid(100));

    let config: EngineConfig =
        serde_json::from_str(r#"{ "defuzzification": { "method": "centroid" } }"#).expect("steps omitted");

    assert_eq!(config.defuzzification, DefuzzificationOp::centroid(100));
}

#[test]
fn test_unknown_method() {
    let res = serde_json::from_str::<EngineConfig>(r#"{ "defuzzification": { "method": "bisector" } }"#);

    assert!(res.is_err());
}

#[test]
fn test_serialize() {
    let json = serde_json::to_string(&EngineConfig::default()).expect("serializable");

    assert_eq!(json, r#"{"defuzzification":{"method":"centroid","steps":100}}"#);
}
