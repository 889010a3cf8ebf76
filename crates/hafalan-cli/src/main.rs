//! Hafalan CLI entry point.

mod app;
mod cli;
mod commands;
mod config;
mod constants;
mod errors;
mod helpers;
mod output;
mod ui;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::app::AppContext;
use crate::cli::{Cli, Commands, StudentCommands};
use crate::constants::LOG_ENV;
use crate::ui::UiContext;

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let ctx = AppContext::new(cli);
    match &cli.command {
        Some(Commands::Init(args)) => commands::handle_init(&ctx, args),
        Some(Commands::Chapters(args)) => commands::handle_chapters(&ctx, args),
        Some(Commands::Student(sub)) => match sub {
            StudentCommands::Add(args) => commands::handle_student_add(&ctx, args),
            StudentCommands::List(args) => commands::handle_student_list(&ctx, args),
            StudentCommands::Edit(args) => commands::handle_student_edit(&ctx, args),
            StudentCommands::Delete(args) => commands::handle_student_delete(&ctx, args),
            StudentCommands::Import(args) => commands::handle_student_import(&ctx, args),
        },
        Some(Commands::Record(args)) => commands::handle_record(&ctx, args),
        Some(Commands::Show(args)) => commands::handle_show(&ctx, args),
        Some(Commands::Leaderboard(args)) => commands::handle_leaderboard(&ctx, args),
        Some(Commands::Report(args)) => commands::handle_report(&ctx, args),
        Some(Commands::Log(args)) => commands::handle_log(&ctx, args),
        Some(Commands::Check(args)) => commands::handle_check(&ctx, args),
        Some(Commands::Completions { shell }) => commands::handle_completions(*shell),
        None => commands::handle_summary(&ctx),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(&cli) {
        let (code, hint) = errors::classify(&err);
        let ctx = UiContext::from_env(false, None, cli.no_color, cli.ascii);
        ui::print_error(&ctx, &format!("{:#}", err), hint.as_deref());
        std::process::exit(code);
    }
}
