// src/system/executor.rs

use crate::{
    core::chatops::ActionExecutor,
    models::{ExecutionResult, MatchCandidate, StackstormSettings},
    system::st2_api::SharedToken,
};
use async_trait::async_trait;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Command could not be parsed: {0}")]
    CommandParse(String),
    #[error("No command specified to run.")]
    EmptyCommand,
    #[error("Command '{0}' could not be executed: {1}")]
    CommandFailed(String, std::io::Error),
    #[error("Running '{action}' exited with {code}: {output}")]
    NonZeroExitStatus {
        action: String,
        code: String,
        output: String,
    },
    #[error("Unexpected output from st2: {reason}")]
    InvalidOutput { reason: String, output: String },
}

/// Runs actions through the st2 command line client.
#[derive(Debug)]
pub struct St2CliExecutor {
    program: String,
    leading_args: Vec<String>,
    base_url: String,
    auth_url: String,
    api_url: String,
    api_version: String,
    api_key: Option<String>,
    token: SharedToken,
}

impl St2CliExecutor {
    /// Prepares the executor. `st2_cli` is split with shell quoting rules so wrappers such
    /// as `docker exec st2 st2` work.
    pub fn new(settings: &StackstormSettings, token: SharedToken) -> Result<Self, ExecutionError> {
        let parts = shlex::split(&settings.st2_cli)
            .ok_or_else(|| ExecutionError::CommandParse(settings.st2_cli.clone()))?;
        let Some((program, leading_args)) = parts.split_first() else {
            return Err(ExecutionError::EmptyCommand);
        };

        Ok(Self {
            program: program.clone(),
            leading_args: leading_args.to_vec(),
            base_url: settings.base_url.clone(),
            auth_url: settings.auth_url(),
            api_url: settings.api_url(),
            api_version: settings.api_version.clone(),
            api_key: settings.api_auth.key.clone(),
            token,
        })
    }

    /// Builds the argument list passed after the program name.
    /// Arguments without a value are left out so st2 applies its own defaults.
    pub fn build_args(&self, candidate: &MatchCandidate) -> Vec<String> {
        let mut args = self.leading_args.clone();
        args.extend([
            format!("--url={}", self.base_url),
            format!("--auth-url={}", self.auth_url),
            format!("--api-url={}", self.api_url),
            format!("--api-version={}", self.api_version),
            "run".to_string(),
            "-j".to_string(),
        ]);

        if let Some(key) = &self.api_key {
            args.push("--api-key".to_string());
            args.push(key.clone());
        } else if let Some(token) = self.token.load_full() {
            args.push("-t".to_string());
            args.push(token.as_str().to_string());
        }

        args.push(candidate.action_ref.clone());
        args.extend(
            candidate
                .kwargs
                .iter()
                .filter_map(|(k, v)| v.as_ref().map(|v| format!("{}={}", k, v))),
        );
        args
    }
}

#[async_trait]
impl ActionExecutor for St2CliExecutor {
    async fn execute(&self, candidate: &MatchCandidate) -> Result<ExecutionResult, ExecutionError> {
        let args = self.build_args(candidate);
        log::info!("st2 run request: {} {:?}", candidate.action_ref, candidate.kwargs);

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| ExecutionError::CommandFailed(self.program.clone(), e))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        log::debug!("st2 run response: {}", stdout.trim());

        // A failed execution still reports its id and status as JSON.
        match parse_output(&stdout) {
            Ok(result) => Ok(result),
            Err(_) if !output.status.success() => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                let detail = if stderr.trim().is_empty() { stdout } else { stderr };
                Err(ExecutionError::NonZeroExitStatus {
                    action: candidate.action_ref.clone(),
                    code: output
                        .status
                        .code()
                        .map_or_else(|| "a signal".to_string(), |c| format!("code {}", c)),
                    output: detail.trim().to_string(),
                })
            }
            Err(e) => Err(e),
        }
    }
}

/// Parses the JSON printed by `st2 run -j`.
pub fn parse_output(output: &str) -> Result<ExecutionResult, ExecutionError> {
    serde_json::from_str(output.trim()).map_err(|e| ExecutionError::InvalidOutput {
        reason: e.to_string(),
        output: output.to_string(),
    })
}

/// Renders an execution as a chat reply: the id and status inline, the result as a block.
pub fn format_result(result: &ExecutionResult) -> String {
    let body = match &result.result {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    };
    format!("`{} {}` ```{}```", result.id, result.status, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arc_swap::ArcSwapOption;
    use serde_json::json;
    use std::{collections::BTreeMap, sync::Arc};
    use tempfile::tempdir;

    fn settings(st2_cli: &str) -> StackstormSettings {
        StackstormSettings {
            base_url: "https://st2.local".to_string(),
            st2_cli: st2_cli.to_string(),
            ..Default::default()
        }
    }

    fn token(value: Option<&str>) -> SharedToken {
        Arc::new(ArcSwapOption::from(value.map(|v| Arc::new(v.to_string()))))
    }

    fn candidate() -> MatchCandidate {
        let mut kwargs = BTreeMap::new();
        kwargs.insert("env".to_string(), Some("prod".to_string()));
        kwargs.insert("note".to_string(), Some("two words".to_string()));
        kwargs.insert("tag".to_string(), None);
        MatchCandidate {
            action_ref: "ops.deploy".to_string(),
            kwargs,
        }
    }

    #[test]
    fn test_build_args_with_token() {
        let executor = St2CliExecutor::new(&settings("st2"), token(Some("abc"))).unwrap();
        assert_eq!(
            executor.build_args(&candidate()),
            vec![
                "--url=https://st2.local",
                "--auth-url=https://st2.local/auth/v1",
                "--api-url=https://st2.local/api/v1",
                "--api-version=v1",
                "run",
                "-j",
                "-t",
                "abc",
                "ops.deploy",
                "env=prod",
                "note=two words",
            ]
        );
    }

    #[test]
    fn test_build_args_follows_renewed_token_and_wrapper() {
        let shared = token(None);
        let executor =
            St2CliExecutor::new(&settings("docker exec 'st2 box' st2"), Arc::clone(&shared)).unwrap();
        assert_eq!(executor.program, "docker");
        let before = executor.build_args(&candidate());
        assert_eq!(&before[..3], ["exec", "st2 box", "st2"]);
        assert!(!before.contains(&"-t".to_string()));

        shared.store(Some(Arc::new("renewed".to_string())));
        let after = executor.build_args(&candidate());
        assert!(after.windows(2).any(|w| w == ["-t", "renewed"]));
    }

    #[test]
    fn test_empty_or_unparsable_cli_is_rejected() {
        assert!(matches!(
            St2CliExecutor::new(&settings("   "), token(None)),
            Err(ExecutionError::EmptyCommand)
        ));
        assert!(matches!(
            St2CliExecutor::new(&settings("st2 'unterminated"), token(None)),
            Err(ExecutionError::CommandParse(_))
        ));
    }

    #[test]
    fn test_format_result() {
        let text = ExecutionResult {
            id: "5e1".to_string(),
            status: "succeeded".to_string(),
            result: json!("all good"),
        };
        assert_eq!(format_result(&text), "`5e1 succeeded` ```all good```");

        let object = ExecutionResult {
            id: "5e2".to_string(),
            status: "failed".to_string(),
            result: json!({"exit_code": 1}),
        };
        assert_eq!(
            format_result(&object),
            "`5e2 failed` ```{\n  \"exit_code\": 1\n}```"
        );
    }

    #[test]
    fn test_parse_output_rejects_non_json() {
        let err = parse_output("ERROR: 401 Client Error").unwrap_err();
        assert!(matches!(err, ExecutionError::InvalidOutput { .. }));
        let ok = parse_output("{\"id\": \"x\", \"status\": \"running\"}\n").unwrap();
        assert_eq!(ok.result, serde_json::Value::Null);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_runs_cli_and_parses_json() {
        let dir = tempdir().unwrap();
        let script = dir.path().join("fake_st2.sh");
        std::fs::write(
            &script,
            "printf '{\"id\": \"e1\", \"status\": \"succeeded\", \"result\": \"%s\"}' \"$*\"\n",
        )
        .unwrap();

        let cli = format!("sh {}", script.display());
        let executor = St2CliExecutor::new(&settings(&cli), token(Some("abc"))).unwrap();
        let result = executor.execute(&candidate()).await.unwrap();

        assert_eq!(result.id, "e1");
        assert_eq!(result.status, "succeeded");
        let echoed = result.result.as_str().unwrap();
        assert!(echoed.contains("run -j -t abc ops.deploy env=prod note=two words"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_reports_failing_cli() {
        let dir = tempdir().unwrap();
        let script = dir.path().join("fake_st2.sh");
        std::fs::write(&script, "echo 'connection refused' >&2\nexit 3\n").unwrap();

        let cli = format!("sh {}", script.display());
        let executor = St2CliExecutor::new(&settings(&cli), token(None)).unwrap();
        let err = executor.execute(&candidate()).await.unwrap_err();
        match err {
            ExecutionError::NonZeroExitStatus { code, output, .. } => {
                assert_eq!(code, "code 3");
                assert_eq!(output, "connection refused");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
