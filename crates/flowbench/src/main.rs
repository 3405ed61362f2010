use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use flowbench::app::context::Workbench;
use flowbench::ui::app::WorkbenchApp;

/// Terminal workbench for designing transformations and jobs.
#[derive(Parser)]
#[command(name = "flowbench", version, about, long_about = None)]
struct Cli {
    /// Documents to open at startup.
    #[arg(value_name = "FILE")]
    open: Vec<PathBuf>,

    /// Open the given documents as imports (unsaved until written back).
    #[arg(long)]
    import: bool,

    /// Load plugins from this directory instead of the configured one.
    #[arg(long, value_name = "DIR")]
    plugins_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print shell completions to stdout
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() -> Result<()> {
    flowbench::init();

    let cli = Cli::parse();

    if let Some(Commands::Completions { shell }) = cli.command {
        let mut command = Cli::command();
        clap_complete::generate(shell, &mut command, "flowbench", &mut io::stdout());
        return Ok(());
    }

    let mut workbench = Workbench::bootstrap(cli.plugins_dir)?;
    for path in &cli.open {
        if let Err(err) = workbench.open_document(path, cli.import) {
            tracing::error!(path = %path.display(), error = %err, "could not open document");
        }
    }

    let mut app = WorkbenchApp::new(workbench);
    app.run()
}
