mod inputs;
mod output;
mod telegram;

use anyhow::Result;
use log::{error, LevelFilter};

use crate::inputs::TaskInputs;
use crate::output::write_task_output;
use crate::telegram::TelegramService;

#[tokio::main]
async fn main() {
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(e) = run().await {
        error!("task failed: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let inputs = TaskInputs::from_env()?;
    let service = TelegramService::new(inputs.bot_token.clone());
    let report = service
        .send_message(&inputs.chat_id, &inputs.telegram_content)
        .await;

    write_task_output(&inputs.iexec_out, &report)
}
