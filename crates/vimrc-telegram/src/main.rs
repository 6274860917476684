//! Reading vimrc bot binary.
//!
//! Start the bot with:
//! ```bash
//! TELEGRAM_BOT_TOKEN=xxx cargo run -p vimrc-telegram
//! ```

use clap::Parser;
use tracing_subscriber::EnvFilter;
use vimrc_core::config;
use vimrc_core::BotConfig;
use vimrc_telegram::ReadingVimrcBot;

/// Reading vimrc bot - runs vimrc reading sessions in a Telegram group
#[derive(Parser, Debug)]
#[command(name = "vimrc-telegram")]
#[command(about = "Telegram bot for the reading vimrc sessions")]
struct Args {
    /// Directory for the site and wiki working copies
    /// (overrides READING_VIMRC_WORK_DIR)
    #[arg(long)]
    work_dir: Option<String>,

    /// Verbose logging (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from config directory first
    let env_path = config::env_file();
    if env_path.exists() {
        let _ = dotenvy::from_path(&env_path);
    }
    let _ = dotenvy::from_filename(".env.local").or_else(|_| dotenvy::dotenv());

    let args = Args::parse();

    let filter = match args.verbose {
        0 => "vimrc_telegram=info,vimrc_repos=info,vimrc_git=info,teloxide=warn",
        1 => "vimrc_telegram=debug,vimrc_repos=debug,vimrc_git=debug,vimrc_core=debug,teloxide=info",
        2 => "vimrc_telegram=trace,vimrc_repos=trace,vimrc_git=trace,vimrc_core=trace,teloxide=debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = config::ensure_all_dirs() {
        tracing::warn!(error = %e, "Failed to create all directories");
    }

    let mut settings = BotConfig::from_env()?;
    if let Some(dir) = &args.work_dir {
        settings.work_dir = config::expand_path(dir);
    }
    if let Err(e) = std::fs::create_dir_all(&settings.work_dir) {
        tracing::warn!(error = %e, path = %settings.work_dir.display(), "Failed to create work directory");
    }

    let bot = ReadingVimrcBot::new(settings)?;
    match bot.get_me().await {
        Ok(username) => {
            tracing::info!(username = %username, "Bot initialized successfully");
            println!("\nReading vimrc bot");
            println!("   Bot: @{}", username);
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to get bot info");
            return Err(e.into());
        }
    }

    println!("   Press Ctrl+C to stop\n");
    bot.start_polling().await?;

    Ok(())
}
