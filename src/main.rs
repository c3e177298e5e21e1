mod app;
mod explain;
mod github;
mod hierarchy;
mod layout;
mod util;

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// GitHub repository URL to open on launch.
    url: Option<String>,

    /// Personal access token, raises the API rate limit and unlocks
    /// private repositories.
    #[arg(long, env = "GITHUB_TOKEN")]
    token: Option<String>,

    /// Branch to visualize instead of the repository default.
    #[arg(long)]
    branch: Option<String>,
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "repograph",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::RepoGraphApp::new(
                cc,
                app::LaunchOptions {
                    repo_url: args.url.clone(),
                    token: args.token.clone(),
                    branch: args.branch.clone(),
                },
            )))
        }),
    )
}
