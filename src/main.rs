use anyhow::{Context, Result};
use clap::Parser;
use conditional_order_signer::utils::logging;
use conditional_order_signer::{
    log_error, ConditionsEncoding, Eip712Signature, SecretHex, SignerError, SigningRequest,
};
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

const MODULE: &str = "cli";

/// Overrides the request's `privateKey`. Keys are never taken from argv.
const KEY_ENV: &str = "CONDITIONAL_ORDER_PRIVATE_KEY";

/// Sign an EIP-712 ConditionalOrder described by a JSON request
#[derive(Parser, Debug)]
#[command(name = "conditional-order-signer", version)]
struct Cli {
    /// Request file; stdin when omitted
    #[arg(long, value_name = "FILE")]
    request: Option<PathBuf>,

    /// Print the full signing outcome as JSON
    #[arg(long)]
    json: bool,

    /// Enable debug logging on stderr
    #[arg(long, short)]
    verbose: bool,

    /// Layout of the conditions member in the struct hash
    #[arg(long, value_name = "ENCODING", default_value = "eip712")]
    conditions_encoding: ConditionsEncoding,

    /// Fail unless the produced signature equals this one
    #[arg(long, value_name = "0xSIG")]
    expect: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if cli.verbose {
        logging::enable_debug();
    }

    match run(&cli) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(err) => {
            report(&cli, &err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<String> {
    let request = match &cli.request {
        Some(path) => SigningRequest::load(path)?,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read request from stdin")?;
            SigningRequest::from_json(&buffer).map_err(SignerError::from)?
        }
    };

    let key_override = std::env::var(KEY_ENV).ok().map(SecretHex::new);
    let prepared = request.prepare(key_override.as_ref())?;
    let outcome = prepared.sign(cli.conditions_encoding)?;

    if let Some(expected) = &cli.expect {
        let expected = Eip712Signature::from_hex(expected)
            .map_err(SignerError::from)
            .context("--expect is not a signature")?;
        if expected.to_hex() != outcome.signature {
            return Err(SignerError::verification_failed("signature mismatch")
                .with_details(format!("expected {}, got {}", expected.to_hex(), outcome.signature))
                .into());
        }
    }

    if cli.json {
        return serde_json::to_string_pretty(&outcome).context("failed to render outcome");
    }
    Ok(outcome.signature)
}

fn report(cli: &Cli, err: &anyhow::Error) {
    let signer_error = err.chain().find_map(|e| e.downcast_ref::<SignerError>());

    if cli.json {
        let body = match signer_error {
            Some(e) => serde_json::json!({ "success": false, "error": e }),
            None => serde_json::json!({ "success": false, "error": { "message": format!("{:#}", err) } }),
        };
        println!("{}", body);
    }

    match signer_error {
        Some(e) => log_error!(MODULE, "signing failed", code = format!("{:?}", e.code), error = e),
        None => log_error!(MODULE, "signing failed", error = format!("{:#}", err)),
    }
}
