//! CID verification utility
//!
//! Checks whether a content identifier is already registered on the content
//! registry contract. A lookup the gateway reports as undecodable ("no
//! data") counts as not registered; any other transport failure is an error.

use anyhow::Result;
use clap::Parser;
use provenance_common::{Cid, RecordQuery};
use registry_gateway::ledger::{HttpLedger, Ledger, CODE_NO_DATA};

#[derive(Parser)]
#[command(name = "verify-cid")]
#[command(about = "Check whether a CID is already registered on the content registry")]
struct Cli {
    /// Content identifier to check
    #[arg(long)]
    cid: String,

    /// Address of the deployed content registry contract
    #[arg(long, default_value = "0xe7f1725e7734ce288f8367e1bb143e90bb3f0512")]
    contract: String,

    /// Ledger gateway base URL
    #[arg(long, default_value = "http://127.0.0.1:8545")]
    ledger_url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let cid = Cid::new(cli.cid)?;
    let ledger = HttpLedger::new(cli.ledger_url, cli.contract);

    match ledger.get_content(&cid).await {
        RecordQuery::Found(record) => {
            println!("Duplicate CID detected! This content was already uploaded.");
            println!("  Title:       {}", record.title);
            println!("  Description: {}", record.description);
            println!("  Type:        {}", record.content_type);
            println!("  Owner:       {}", record.owner);
            println!("  Registered:  {}", record.timestamp.to_rfc3339());
        }
        RecordQuery::NotFound => {
            println!("This CID has not been uploaded before. No duplicates found.");
        }
        RecordQuery::QueryFailed(reason) if reason == CODE_NO_DATA => {
            // The contract returned no decodable record for this key, which
            // is what an unregistered CID looks like on some gateways.
            println!("This CID has not been uploaded before. No duplicates found.");
        }
        RecordQuery::QueryFailed(reason) => {
            anyhow::bail!("Error verifying CID: {}", reason);
        }
    }

    Ok(())
}
