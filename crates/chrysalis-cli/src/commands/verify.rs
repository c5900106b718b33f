// crates/chrysalis-cli/src/commands/verify.rs
//
// `chrysalis verify`: resolve a published chain and check its links.

use clap::Args;
use tabled::Tabled;

use chrysalis_pipeline::{verify_chain, StageCheck};
use chrysalis_store::IpfsPublisher;

use crate::config::ChrysalisConfig;
use crate::output::format_table;

/// Arguments for the verify command.
#[derive(Debug, Args)]
pub struct VerifyCmd {
    /// Metadata references in stage order, genesis first.
    #[arg(required = true)]
    references: Vec<String>,
}

#[derive(Tabled)]
struct VerifyRow {
    #[tabled(rename = "Stage")]
    index: u32,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Result")]
    result: String,
}

/// Run the verify command.
pub async fn run(cmd: &VerifyCmd, config: &ChrysalisConfig) -> Result<(), Box<dyn std::error::Error>> {
    let resolver = IpfsPublisher::from_config(&config.storage);
    let report = verify_chain(&resolver, &cmd.references).await?;

    let rows: Vec<VerifyRow> = report
        .stages
        .iter()
        .map(|s| VerifyRow {
            index: s.index,
            name: s.name.clone(),
            result: match &s.check {
                StageCheck::Verified => "ok".to_string(),
                StageCheck::Mismatch(reason) => reason.clone(),
            },
        })
        .collect();

    println!("{}", format_table(&rows));

    if report.is_valid() {
        println!("Chain verified: {} stages linked.", report.stages.len());
        Ok(())
    } else {
        let bad = report.mismatches().count();
        Err(format!("Chain failed verification: {} stage(s) mismatched", bad).into())
    }
}
