//! Detection model implementations.

use crate::error::DetectionError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// One raw detection as emitted by a model
///
/// This is the wire shape of the opaque model contract: a bounding box,
/// a class label, and a score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    #[serde(rename = "box")]
    pub bounding_box: [f32; 4],
    pub label: String,
    pub score: f32,
}

/// The black-box model seam
///
/// Any concrete vision model satisfying this contract is substitutable;
/// the engine never looks inside.
pub trait DetectionModel: Send + Sync {
    /// Run inference on one image
    fn infer(&self, image: &Path) -> Result<Vec<RawDetection>, DetectionError>;
}

/// Runs an external command per image and parses its stdout
///
/// The configured command is invoked with the image path appended as the
/// final argument and must print a JSON array of `{box, label, score}`
/// objects. This keeps the actual model (YOLO, a cloud API, anything)
/// outside the process boundary.
pub struct CommandModel {
    program: String,
    args: Vec<String>,
}

impl CommandModel {
    /// Build from a command line, e.g. `"python detect.py"`
    ///
    /// Splits on whitespace; single or double quotes group a token, so
    /// `python '/models/with spaces/detect.py'` works. No other shell
    /// syntax (escapes, variables) is interpreted.
    pub fn from_command_line(command: &str) -> Result<Self, DetectionError> {
        let mut parts = split_command_line(command).into_iter();
        let program = parts.next().ok_or(DetectionError::NoModel)?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }
}

fn split_command_line(command: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;

    for c in command.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '\'' || c == '"' => {
                quote = Some(c);
                in_token = true;
            }
            None if c.is_whitespace() => {
                if in_token {
                    parts.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            None => {
                current.push(c);
                in_token = true;
            }
        }
    }
    if in_token {
        parts.push(current);
    }
    parts
}

impl DetectionModel for CommandModel {
    fn infer(&self, image: &Path) -> Result<Vec<RawDetection>, DetectionError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(image)
            .output()
            .map_err(|e| DetectionError::ModelFailed {
                path: image.to_path_buf(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(DetectionError::ModelFailed {
                path: image.to_path_buf(),
                reason: format!(
                    "{}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        serde_json::from_slice(&output.stdout).map_err(|e| DetectionError::InvalidOutput {
            path: image.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

/// Canned-response model for tests
///
/// Returns the same detections for every image and counts invocations, so
/// tests can assert that cached content never reaches the model.
pub struct StaticModel {
    detections: Vec<RawDetection>,
    calls: Arc<AtomicUsize>,
    fail: bool,
}

impl StaticModel {
    /// A model that always returns `detections`
    pub fn new(detections: Vec<RawDetection>) -> Self {
        Self {
            detections,
            calls: Arc::new(AtomicUsize::new(0)),
            fail: false,
        }
    }

    /// A model whose every invocation fails
    pub fn failing() -> Self {
        Self {
            detections: Vec::new(),
            calls: Arc::new(AtomicUsize::new(0)),
            fail: true,
        }
    }

    /// Shared invocation counter, valid after the model is boxed
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl DetectionModel for StaticModel {
    fn infer(&self, image: &Path) -> Result<Vec<RawDetection>, DetectionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(DetectionError::ModelFailed {
                path: image.to_path_buf(),
                reason: "static model configured to fail".to_string(),
            });
        }
        Ok(self.detections.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_detection_parses_model_wire_format() {
        let json = r#"[{"box": [1.0, 2.0, 3.0, 4.0], "label": "person", "score": 0.92}]"#;
        let parsed: Vec<RawDetection> = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].label, "person");
        assert_eq!(parsed[0].bounding_box, [1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn empty_command_line_is_rejected() {
        assert!(matches!(
            CommandModel::from_command_line("   "),
            Err(DetectionError::NoModel)
        ));
    }

    #[test]
    fn command_line_splits_on_whitespace() {
        assert_eq!(
            split_command_line("python detect.py --fast"),
            vec!["python", "detect.py", "--fast"]
        );
    }

    #[test]
    fn quoted_tokens_keep_their_spaces() {
        assert_eq!(
            split_command_line("python '/models/with spaces/detect.py' --conf 0.5"),
            vec!["python", "/models/with spaces/detect.py", "--conf", "0.5"]
        );
        assert_eq!(
            split_command_line(r#"detect --name "my model""#),
            vec!["detect", "--name", "my model"]
        );
    }

    #[test]
    fn quotes_can_join_adjacent_text() {
        assert_eq!(
            split_command_line("run --path='/a b/c'"),
            vec!["run", "--path=/a b/c"]
        );
        // An empty quoted pair is still a token
        assert_eq!(split_command_line("run ''"), vec!["run", ""]);
    }

    #[test]
    fn static_model_counts_calls() {
        let model = StaticModel::new(vec![]);
        let calls = model.call_counter();
        model.infer(Path::new("/a.jpg")).unwrap();
        model.infer(Path::new("/b.jpg")).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
