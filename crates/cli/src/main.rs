use clap::{Parser, Subcommand};
use hlc_core::{default_host, ContractHost, CoreConfig, Identity, Proposal, Response};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "hlc")]
#[command(about = "Health ledger contracts CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List installed contracts and their functions
    Contracts,
    /// Run a JSON script of proposals against a fresh in-memory host
    Replay {
        /// Path to a JSON array of steps
        script: PathBuf,
        /// Seed file loaded before the script runs
        #[arg(long)]
        seed: Option<PathBuf>,
        /// Channel to run on
        #[arg(long)]
        channel: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum Mode {
    #[default]
    Submit,
    Evaluate,
}

/// One proposal in a replay script.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Step {
    #[serde(default)]
    mode: Mode,
    contract: String,
    function: String,
    #[serde(default)]
    args: Vec<String>,
    /// Shorthand for the `userId` attribute.
    #[serde(default)]
    caller: Option<String>,
    #[serde(default)]
    attributes: BTreeMap<String, String>,
}

impl Step {
    fn proposal(&self) -> Proposal {
        let proposal = Proposal::new(&self.contract, &self.function)
            .with_args(self.args.iter().cloned())
            .with_identity(Identity::new(self.attributes.clone()));
        match &self.caller {
            Some(caller) => proposal.with_caller(caller.clone()),
            None => proposal,
        }
    }
}

fn load_script(path: &Path) -> Result<Vec<Step>, Box<dyn std::error::Error>> {
    let bytes = std::fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn replay(host: &ContractHost, steps: &[Step]) -> Vec<Response> {
    steps
        .iter()
        .map(|step| {
            let proposal = step.proposal();
            match step.mode {
                Mode::Submit => host.submit(&proposal),
                Mode::Evaluate => host.evaluate(&proposal),
            }
        })
        .collect()
}

fn describe(response: &Response) -> String {
    let body = String::from_utf8_lossy(&response.payload);
    match response.error_kind() {
        Some(kind) => format!("{} {}: {}", response.status, kind, response.message),
        None => format!("{} {}", response.status, body),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Contracts) => {
            let host = default_host(Arc::new(CoreConfig::default()))?;
            for contract in host.contracts() {
                println!("{}", contract.name());
                for function in contract.functions() {
                    println!("  {function}");
                }
            }
        }
        Some(Commands::Replay {
            script,
            seed,
            channel,
        }) => {
            let channel = channel.unwrap_or_else(|| CoreConfig::default().channel_id().to_string());
            let cfg = Arc::new(CoreConfig::new(channel, seed)?);
            let host = default_host(cfg)?;
            let steps = load_script(&script)?;
            for (index, (step, response)) in steps.iter().zip(replay(&host, &steps)).enumerate() {
                println!(
                    "[{index}] {}.{} -> {}",
                    step.contract,
                    step.function,
                    describe(&response)
                );
            }
        }
        None => {
            println!("Use 'hlc --help' for commands");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SCRIPT: &str = r#"[
        {"contract": "patient", "function": "CreatePatient", "args": ["{\"identifier\":{\"value\":\"Pat1\"}}"]},
        {"contract": "practitioner", "function": "GrantAccess", "args": ["Pat1", "Dr1"]},
        {"contract": "condition", "function": "CreateCondition", "caller": "Dr1",
         "args": ["{\"identifier\":{\"value\":\"C1\"},\"subject\":{\"reference\":\"Patient/Pat1\"}}"]},
        {"mode": "evaluate", "contract": "condition", "function": "ReadCondition", "caller": "Dr2", "args": ["C1"]}
    ]"#;

    #[test]
    fn test_replay_runs_steps_in_order() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        file.write_all(SCRIPT.as_bytes()).expect("write script");
        let steps = load_script(file.path()).expect("script should parse");
        assert_eq!(steps[3].mode, Mode::Evaluate);

        let host = default_host(Arc::new(CoreConfig::default())).expect("host should build");
        let responses = replay(&host, &steps);
        assert!(responses[..3].iter().all(Response::is_success));
        assert_eq!(
            responses[3].error_kind(),
            Some(hlc_core::ErrorKind::AuthorizationDenied)
        );
        assert!(describe(&responses[3]).starts_with("500 AuthorizationDenied"));
    }

    #[test]
    fn test_unknown_step_fields_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        file.write_all(br#"[{"contract":"patient","function":"X","bogus":1}]"#)
            .expect("write script");
        assert!(load_script(file.path()).is_err());
    }

    #[test]
    fn test_cli_parses_replay_flags() {
        let cli = Cli::try_parse_from(["hlc", "replay", "s.json", "--channel", "c2"])
            .expect("arguments should parse");
        assert!(matches!(
            cli.command,
            Some(Commands::Replay { channel: Some(ref c), seed: None, .. }) if c == "c2"
        ));
    }
}
