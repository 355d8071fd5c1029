use serde::{Deserialize, Serialize};

/// Output of the affinity predictor for a single protein/molecule pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(rename = "neg_log10_affinity_M")]
    pub neg_log10_affinity_m: f64,
    #[serde(rename = "affinity_uM")]
    pub affinity_um: f64,
}

impl Prediction {
    pub fn new(neg_log10_affinity_m: f64, affinity_um: f64) -> Self {
        Self {
            neg_log10_affinity_m,
            affinity_um,
        }
    }

    /// Builds a prediction from the log-scaled value alone, deriving the micromolar affinity.
    pub fn from_neg_log10(neg_log10_affinity_m: f64) -> Self {
        Self {
            neg_log10_affinity_m,
            affinity_um: 10f64.powf(6.0 - neg_log10_affinity_m),
        }
    }
}

/// One row of a result set. Field order is the serialization order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionRecord {
    pub protein: String,
    pub molecule: String,
    #[serde(rename = "neg_log10_affinity_M")]
    pub neg_log10_affinity_m: f64,
    #[serde(rename = "affinity_uM")]
    pub affinity_um: f64,
}

pub type ResultSet = Vec<PredictionRecord>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_neg_log10_derives_micromolar_affinity() {
        let p = Prediction::from_neg_log10(6.0);
        assert!((p.affinity_um - 1.0).abs() < 1e-12);
        let p = Prediction::from_neg_log10(9.0);
        assert!((p.affinity_um - 0.001).abs() < 1e-12);
    }

    #[test]
    fn prediction_deserializes_from_predictor_field_names() {
        let p: Prediction =
            serde_json::from_str(r#"{"neg_log10_affinity_M": 7.5, "affinity_uM": 0.0316}"#)
                .unwrap();
        assert_eq!(p.neg_log10_affinity_m, 7.5);
        assert_eq!(p.affinity_um, 0.0316);
    }
}
