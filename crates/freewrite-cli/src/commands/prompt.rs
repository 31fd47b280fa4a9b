use freewrite_core::config::ClientConfig;
use freewrite_core::remote::HttpJournalClient;

use crate::error::CliError;

pub async fn run_prompt(config: &ClientConfig) -> Result<(), CliError> {
    let client = HttpJournalClient::new(config)?;
    println!("{}", client.writing_prompt().await?);
    Ok(())
}
