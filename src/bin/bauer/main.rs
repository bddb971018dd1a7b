//! bauer CLI - build orchestration on top of CMake

use std::process::ExitCode;

use anyhow::Result;
use clap::{CommandFactory, FromArgMatches};
use tracing_subscriber::EnvFilter;

mod cli;

use bauer::cmake::GeneratorInfo;
use bauer::core::error::{exit_status_for, BauerError, EXIT_PROGRAM_ARGUMENT_ERROR};
use bauer::core::{BuildDirectoryLayout, Platform};
use bauer::executor::{Emsdk, ExecutorContext, HostEnvironment};
use bauer::util::diagnostic::{emit, Diagnostic};
use bauer::util::shell::{ColorChoice, Shell};
use bauer::{CommandProcessor, GlobalContext};
use cli::Cli;

fn main() -> ExitCode {
    let cli = match parse_cli() {
        Ok(cli) => cli,
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(EXIT_PROGRAM_ARGUMENT_ERROR as u8);
        }
    };

    init_logging(cli.debug);

    let color = if cli.no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };
    let shell = Shell::new(cli.debug, color);

    match run(cli, &shell) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e, &shell);
            ExitCode::from(exit_status_for(&e))
        }
    }
}

fn parse_cli() -> Result<Cli, clap::Error> {
    let command = Cli::command().after_help(platform_help());
    let matches = command.try_get_matches()?;
    Cli::from_arg_matches(&matches)
}

fn platform_help() -> String {
    let mut help = String::from("Platforms:\n");
    for platform in Platform::ALL {
        help.push_str(&format!("  {:<8} {}\n", platform.as_str(), platform.description()));
    }
    help
}

fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("bauer=debug")
    } else {
        EnvFilter::new("bauer=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli, shell: &Shell) -> Result<()> {
    let invocation = cli.command.into_invocation()?;

    let mut gctx = GlobalContext::new(invocation.build_folder.as_deref())?;
    gctx.set_verbose(cli.debug);

    let host = HostEnvironment::detect();
    let generators = GeneratorInfo::detect();
    tracing::debug!("{}", generators.alias_help());

    let config = gctx.config();
    let mut options = invocation.options;
    options.jobs = options.jobs.or(config.build.jobs);

    let emsdk_dir = host
        .emsdk_base_dir
        .clone()
        .or_else(|| config.emscripten.sdk_dir.clone())
        .unwrap_or_else(|| gctx.build_root().join("emsdk"));
    let emscripten = Emsdk::new(config.emscripten.version(), emsdk_dir);

    let layout = BuildDirectoryLayout::new(gctx.build_root());
    let ctx = ExecutorContext {
        source_dir: gctx.source_dir(),
        layout: &layout,
        generators: &generators,
        host: &host,
        config,
        options: &options,
        emscripten: &emscripten,
        launcher: None,
    };

    CommandProcessor::new(&ctx, shell).process(invocation.command, &invocation.filter)
}

fn report(err: &anyhow::Error, shell: &Shell) {
    let diagnostic = match err.chain().find_map(|c| c.downcast_ref::<BauerError>()) {
        Some(bauer_err) => {
            let diagnostic = bauer_err.to_diagnostic();
            // Context added around the error, e.g. the configuration being
            // processed.
            if err.downcast_ref::<BauerError>().is_none() {
                diagnostic.with_context(err.to_string())
            } else {
                diagnostic
            }
        }
        None => Diagnostic::error(format!("{:#}", err)),
    };

    emit(&diagnostic, shell.use_color());

    if shell.is_verbose() {
        eprintln!("\n{:?}", err);
    }
}
