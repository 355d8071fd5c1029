//! HTTP client for a remote affinity model.
//!
//! Each batch is POSTed as `{"proteins": [...], "molecules": [...]}`. The service may answer
//! with a bare array of predictions or with `{"predictions": [...]}`; a missing `affinity_uM`
//! is derived from the log-scaled value.

use crate::config::PredictorSettings;
use crate::error::{CliError, Result};
use plapt::core::models::prediction::Prediction;
use plapt::engine::predictor::{AffinityPredictor, PredictorError};
use plapt::engine::progress::{Progress, ProgressReporter};
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tracing::{debug, info};

#[derive(Serialize)]
struct PredictRequest<'a> {
    proteins: &'a [String],
    molecules: &'a [String],
}

#[derive(Deserialize, Debug)]
struct WirePrediction {
    #[serde(rename = "neg_log10_affinity_M")]
    neg_log10_affinity_m: f64,
    #[serde(rename = "affinity_uM", default)]
    affinity_um: Option<f64>,
}

impl From<WirePrediction> for Prediction {
    fn from(wire: WirePrediction) -> Self {
        match wire.affinity_um {
            Some(affinity_um) => Prediction::new(wire.neg_log10_affinity_m, affinity_um),
            None => Prediction::from_neg_log10(wire.neg_log10_affinity_m),
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum PredictResponse {
    Bare(Vec<WirePrediction>),
    Wrapped { predictions: Vec<WirePrediction> },
}

impl PredictResponse {
    fn into_predictions(self) -> Vec<Prediction> {
        let wire = match self {
            PredictResponse::Bare(items) => items,
            PredictResponse::Wrapped { predictions } => predictions,
        };
        wire.into_iter().map(Prediction::from).collect()
    }
}

fn parse_response(
    body: &str,
    expected: usize,
) -> std::result::Result<Vec<Prediction>, PredictorError> {
    let response: PredictResponse = serde_json::from_str(body)
        .map_err(|e| PredictorError::InvalidResponse(e.to_string()))?;
    let predictions = response.into_predictions();
    if predictions.len() != expected {
        return Err(PredictorError::InvalidResponse(format!(
            "expected {} prediction(s) in batch, received {}",
            expected,
            predictions.len()
        )));
    }
    Ok(predictions)
}

pub struct HttpPredictor {
    client: reqwest::Client,
    settings: PredictorSettings,
    runtime: Handle,
    reporter: ProgressReporter<'static>,
}

impl HttpPredictor {
    pub fn new(
        settings: PredictorSettings,
        runtime: Handle,
        reporter: ProgressReporter<'static>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(CliError::Network)?;
        Ok(Self {
            client,
            settings,
            runtime,
            reporter,
        })
    }

    fn map_send_error(&self, e: reqwest::Error) -> PredictorError {
        if e.is_connect() {
            PredictorError::Unavailable(format!(
                "could not connect to {}",
                self.settings.endpoint
            ))
        } else if e.is_timeout() {
            PredictorError::Unavailable(format!(
                "request timed out after {}s",
                self.settings.timeout.as_secs()
            ))
        } else {
            PredictorError::Other(e.to_string())
        }
    }

    async fn predict_batch(
        &self,
        proteins: &[String],
        molecules: &[String],
    ) -> std::result::Result<Vec<Prediction>, PredictorError> {
        let response = self
            .client
            .post(&self.settings.endpoint)
            .json(&PredictRequest {
                proteins,
                molecules,
            })
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.map_send_error(e))?;
        if !status.is_success() {
            return Err(PredictorError::Other(format!(
                "predictor responded with HTTP {}: {}",
                status.as_u16(),
                body.trim()
            )));
        }
        parse_response(&body, proteins.len())
    }

    async fn predict_all(
        &self,
        proteins: &[String],
        molecules: &[String],
    ) -> std::result::Result<Vec<Prediction>, PredictorError> {
        let batch_size = self.settings.batch_size.max(1);
        let batches = proteins.len().div_ceil(batch_size);
        info!(
            pairs = proteins.len(),
            batches,
            endpoint = %self.settings.endpoint,
            "Requesting predictions"
        );
        self.reporter.report(Progress::TaskStart {
            total_steps: batches as u64,
        });

        let mut predictions = Vec::with_capacity(proteins.len());
        for (index, (protein_batch, molecule_batch)) in proteins
            .chunks(batch_size)
            .zip(molecules.chunks(batch_size))
            .enumerate()
        {
            debug!(batch = index + 1, size = protein_batch.len(), "Sending batch");
            predictions.extend(self.predict_batch(protein_batch, molecule_batch).await?);
            self.reporter.report(Progress::TaskIncrement);
        }

        self.reporter.report(Progress::TaskFinish);
        Ok(predictions)
    }
}

impl AffinityPredictor for HttpPredictor {
    fn predict(
        &self,
        proteins: &[String],
        molecules: &[String],
    ) -> std::result::Result<Vec<Prediction>, PredictorError> {
        if proteins.len() != molecules.len() {
            return Err(PredictorError::Other(format!(
                "unaligned inputs: {} proteins, {} molecules",
                proteins.len(),
                molecules.len()
            )));
        }
        tokio::task::block_in_place(|| {
            self.runtime
                .block_on(self.predict_all(proteins, molecules))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn bare_array_response_is_accepted() {
        let body = r#"[{"neg_log10_affinity_M": 6.0, "affinity_uM": 1.0},
                       {"neg_log10_affinity_M": 7.5, "affinity_uM": 0.0316}]"#;
        let predictions = parse_response(body, 2).unwrap();
        assert_eq!(predictions[1], Prediction::new(7.5, 0.0316));
    }

    #[test]
    fn wrapped_response_derives_missing_affinity() {
        let body = r#"{"predictions": [{"neg_log10_affinity_M": 9.0}]}"#;
        let predictions = parse_response(body, 1).unwrap();
        assert_eq!(predictions[0].neg_log10_affinity_m, 9.0);
        assert!((predictions[0].affinity_um - 0.001).abs() < 1e-12);
    }

    #[test]
    fn wrong_count_is_an_invalid_response() {
        let body = r#"[{"neg_log10_affinity_M": 6.0}]"#;
        assert!(matches!(
            parse_response(body, 2),
            Err(PredictorError::InvalidResponse(_))
        ));
    }

    #[test]
    fn malformed_body_is_an_invalid_response() {
        for body in ["not json", r#"{"results": []}"#, r#"[{"affinity_uM": 1.0}]"#] {
            assert!(matches!(
                parse_response(body, 1),
                Err(PredictorError::InvalidResponse(_))
            ));
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn unreachable_endpoint_is_unavailable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let predictor = HttpPredictor::new(
            PredictorSettings {
                endpoint: format!("http://127.0.0.1:{}/predict", port),
                batch_size: 2,
                timeout: Duration::from_secs(5),
            },
            Handle::current(),
            ProgressReporter::new(),
        )
        .unwrap();

        let proteins = vec!["MKT".to_string(); 3];
        let molecules = vec!["CCO".to_string(); 3];
        let err = predictor.predict(&proteins, &molecules).unwrap_err();
        assert!(matches!(err, PredictorError::Unavailable(_)), "{:?}", err);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn unaligned_inputs_are_rejected_without_a_request() {
        let predictor = HttpPredictor::new(
            PredictorSettings {
                endpoint: "http://127.0.0.1:9/predict".into(),
                batch_size: 4,
                timeout: Duration::from_secs(1),
            },
            Handle::current(),
            ProgressReporter::new(),
        )
        .unwrap();
        let err = predictor.predict(&["MKT".to_string()], &[]).unwrap_err();
        assert!(matches!(err, PredictorError::Other(_)));
    }
}
