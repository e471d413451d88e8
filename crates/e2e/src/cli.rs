//! Command line of the `e2e` test target
//!
//! The target runs under `cargo test`, which forwards its own filters and
//! flags (`cargo test save`, `-- --nocapture`). Those are only an error when
//! the caller actually pointed the harness at a portal.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::Parser;

use crate::browser::BrowserKind;
use crate::config::{E2eConfig, DEFAULT_CONFIG_FILE};

#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "scanpage-e2e")]
#[command(about = "E2E scenarios for the candidate scanning page")]
pub struct Args {
    /// Config file (defaults to ./scanpage-e2e.yaml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Run only scenarios carrying this tag
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Run only a specific scenario by name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Output directory for results
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Browser to use (chrome, firefox)
    #[arg(long)]
    pub browser: Option<BrowserKind>,

    /// Run in headless mode
    #[arg(long)]
    pub headless: Option<bool>,

    /// WebDriver endpoint
    #[arg(long)]
    pub webdriver_url: Option<String>,

    /// Root URL of the portal under test
    #[arg(long)]
    pub server_url: Option<String>,

    /// Scenarios run at once
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// List scenarios and exit
    #[arg(long)]
    pub list: bool,
}

impl Args {
    /// CLI flags win over the config file and environment
    pub fn apply(&self, config: &mut E2eConfig) {
        if let Some(output) = &self.output {
            config.runner.output_dir = output.clone();
        }
        if let Some(browser) = self.browser {
            config.webdriver.browser = browser;
        }
        if let Some(headless) = self.headless {
            config.webdriver.headless = headless;
        }
        if let Some(url) = &self.webdriver_url {
            config.webdriver.webdriver_url = url.clone();
        }
        if let Some(url) = &self.server_url {
            config.server_url = url.clone();
        }
        if let Some(concurrency) = self.concurrency {
            config.runner.concurrency = concurrency;
        }
    }
}

/// What the test target should do with its command line
#[derive(Debug, PartialEq)]
pub enum Launch {
    Run(Args),
    /// No portal configured; exit successfully without running anything
    Skip(String),
}

fn names_config(argv: &[OsString]) -> bool {
    argv.iter().skip(1).any(|arg| {
        let arg = arg.to_string_lossy();
        arg == "-c" || arg == "--config" || arg.starts_with("--config=")
    })
}

/// Decide between running, skipping and a usage error
///
/// `default_config_present` says whether [`DEFAULT_CONFIG_FILE`] exists in
/// the working directory. Help and version requests always come back as
/// `Err` so the caller can print them with [`clap::Error::exit`].
pub fn launch<I, T>(argv: I, default_config_present: bool) -> Result<Launch, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let argv: Vec<OsString> = argv.into_iter().map(Into::into).collect();
    let configured = default_config_present || names_config(&argv);

    match Args::try_parse_from(&argv) {
        Ok(args) if args.list || args.config.is_some() || default_config_present => {
            Ok(Launch::Run(args))
        }
        Ok(_) => Ok(Launch::Skip(format!(
            "No config given and no {} found",
            DEFAULT_CONFIG_FILE
        ))),
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => Err(e),
        Err(e) if !configured => Ok(Launch::Skip(format!(
            "Ignoring unrecognised arguments ({}) with no {} found",
            e.kind(),
            DEFAULT_CONFIG_FILE
        ))),
        Err(e) => Err(e),
    }
}
