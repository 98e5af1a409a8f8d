// external.rs - Predictors and tests that run as an external program
//
// The program is spawned once per batch. A JSON request is written to its
// stdin and a JSON array with one entry per input is read back from stdout.

use super::traits::{ClassProbabilities, FitResult, Predictor, StatisticTest};
use crate::core::windows::WindowTensor;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::process::{Command, Stdio};

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    windows: &'a [WindowTensor],
}

#[derive(Serialize)]
struct EvaluateRequest<'a> {
    series: &'a [Vec<f64>],
    generations: &'a [u64],
}

/// Parse a command line such as `python classify.py --model afs.h5`
pub fn split_command(command: &str) -> Result<(String, Vec<String>), String> {
    let mut parts = command.split_whitespace().map(|s| s.to_string());
    let program = parts
        .next()
        .ok_or_else(|| "Empty predictor command".to_string())?;
    Ok((program, parts.collect()))
}

/// Run `program` with `payload` on stdin and parse its stdout as JSON
fn run_json<Req: Serialize, Resp: DeserializeOwned>(
    program: &str,
    args: &[String],
    payload: &Req,
) -> Result<Resp, String> {
    let input = serde_json::to_vec(payload).map_err(|e| format!("Failed to encode request: {}", e))?;

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|e| format!("Failed to start '{}': {}", program, e))?;

    {
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| format!("Failed to open stdin of '{}'", program))?;
        stdin
            .write_all(&input)
            .map_err(|e| format!("Failed to write to '{}': {}", program, e))?;
    }

    let output = child
        .wait_with_output()
        .map_err(|e| format!("Failed to wait for '{}': {}", program, e))?;

    if !output.status.success() {
        return Err(format!("'{}' exited with {}", program, output.status));
    }

    serde_json::from_slice(&output.stdout)
        .map_err(|e| format!("Malformed response from '{}': {}", program, e))
}

/// Classifier living in another process (e.g. a saved Keras model behind a script)
#[derive(Debug, Clone)]
pub struct ExternalPredictor {
    name: String,
    program: String,
    args: Vec<String>,
}

impl ExternalPredictor {
    pub fn new(name: &str, program: String, args: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            program,
            args,
        }
    }

    pub fn from_command(name: &str, command: &str) -> Result<Self, String> {
        let (program, args) = split_command(command)?;
        Ok(Self::new(name, program, args))
    }
}

impl Predictor for ExternalPredictor {
    fn name(&self) -> &str {
        &self.name
    }

    fn classify(&self, window: &WindowTensor) -> Result<ClassProbabilities, String> {
        let mut out = self.classify_batch(std::slice::from_ref(window))?;
        out.pop()
            .ok_or_else(|| format!("'{}' returned no prediction", self.program))
    }

    fn classify_batch(&self, windows: &[WindowTensor]) -> Result<Vec<ClassProbabilities>, String> {
        let out: Vec<ClassProbabilities> =
            run_json(&self.program, &self.args, &ClassifyRequest { windows })?;
        if out.len() != windows.len() {
            return Err(format!(
                "'{}' returned {} predictions for {} windows",
                self.program,
                out.len(),
                windows.len()
            ));
        }
        Ok(out)
    }
}

/// Frequency-increment test living in another process
#[derive(Debug, Clone)]
pub struct ExternalStatistic {
    name: String,
    program: String,
    args: Vec<String>,
}

impl ExternalStatistic {
    pub fn new(name: &str, program: String, args: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            program,
            args,
        }
    }

    pub fn from_command(name: &str, command: &str) -> Result<Self, String> {
        let (program, args) = split_command(command)?;
        Ok(Self::new(name, program, args))
    }
}

impl StatisticTest for ExternalStatistic {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, series: &[f64], generations: &[u64]) -> Result<FitResult, String> {
        let mut out = self.evaluate_batch(&[series.to_vec()], generations)?;
        out.pop()
            .ok_or_else(|| format!("'{}' returned no result", self.program))
    }

    fn evaluate_batch(
        &self,
        series: &[Vec<f64>],
        generations: &[u64],
    ) -> Result<Vec<FitResult>, String> {
        let pairs: Vec<(f64, f64)> = run_json(
            &self.program,
            &self.args,
            &EvaluateRequest {
                series,
                generations,
            },
        )?;
        if pairs.len() != series.len() {
            return Err(format!(
                "'{}' returned {} results for {} sites",
                self.program,
                pairs.len(),
                series.len()
            ));
        }
        Ok(pairs.into_iter().map(|(t, p)| FitResult::new(t, p)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_command() {
        let (program, args) = split_command("python3 classify.py --model afs.h5").unwrap();
        assert_eq!(program, "python3");
        assert_eq!(args, vec!["classify.py", "--model", "afs.h5"]);
        assert!(split_command("   ").is_err());
    }

    #[test]
    fn test_request_encoding() {
        let windows = vec![WindowTensor::from_rows(vec![vec![0.5, 1.0]])];
        let json = serde_json::to_string(&ClassifyRequest { windows: &windows }).unwrap();
        assert_eq!(json, r#"{"windows":[[[0.5,1.0]]]}"#);

        let series = vec![vec![0.1, 0.2]];
        let json = serde_json::to_string(&EvaluateRequest {
            series: &series,
            generations: &[10, 20],
        })
        .unwrap();
        assert_eq!(json, r#"{"series":[[0.1,0.2]],"generations":[10,20]}"#);
    }

    #[test]
    fn test_missing_program_is_an_error() {
        let predictor =
            ExternalPredictor::new("afs", "/nonexistent/timesweep-model".to_string(), vec![]);
        let err = predictor
            .classify(&WindowTensor::from_rows(vec![vec![0.0]]))
            .unwrap_err();
        assert!(err.contains("Failed to start"));
    }

    #[cfg(unix)]
    #[test]
    fn test_count_mismatch_is_an_error() {
        // drains stdin and returns a single prediction for two windows
        let predictor = ExternalPredictor::new(
            "afs",
            "sh".to_string(),
            vec![
                "-c".to_string(),
                "cat > /dev/null; echo '[[0.2,0.3,0.5]]'".to_string(),
            ],
        );
        let windows = vec![
            WindowTensor::from_rows(vec![vec![0.0]]),
            WindowTensor::from_rows(vec![vec![1.0]]),
        ];
        let err = predictor.classify_batch(&windows).unwrap_err();
        assert!(err.contains("returned 1 predictions for 2 windows"));

        let one = predictor.classify(&windows[0]).unwrap();
        assert_eq!(one.label(), "Soft");
    }
}
