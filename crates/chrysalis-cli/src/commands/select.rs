// crates/chrysalis-cli/src/commands/select.rs
//
// `chrysalis select`: pick the published reference for a token's current
// on-chain stage. Stages past the end of the chain resolve to the last one.

use clap::Args;

use chrysalis_core::stage::select_reference;

/// Arguments for the select command.
#[derive(Debug, Args)]
pub struct SelectCmd {
    /// Current stage index as reported by the token contract.
    #[arg(long)]
    stage: u32,

    /// Metadata references in stage order, genesis first.
    #[arg(required = true)]
    references: Vec<String>,
}

/// Run the select command.
pub fn run(cmd: &SelectCmd) -> Result<(), Box<dyn std::error::Error>> {
    let reference = select_reference(cmd.references.as_slice(), cmd.stage, |r| r.as_str())
        .ok_or("no references given")?;
    println!("{}", reference);
    Ok(())
}
