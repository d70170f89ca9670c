//! Command dispatch

use std::io::{self, Read};

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::application::services::DomainEditor;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{editors::editor_for, operators_info, FieldType, TreeNodeConvert};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Tree { domain }) => cmd_tree(cli, domain),
        Some(Commands::Check { domain }) => cmd_check(cli, domain),
        Some(Commands::Normalize { domain }) => cmd_normalize(cli, domain),
        Some(Commands::Operators { field_type }) => cmd_operators(field_type),
        Some(Commands::Config { command }) => cmd_config(cli, command),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        None => Err(CliError::Usage(
            "no command given, see `domtree --help`".to_string(),
        )),
    }
}

/// Settings with the command line overrides applied.
fn load_settings(cli: &Cli) -> CliResult<Settings> {
    let mut settings = Settings::load(None)?;
    if let Some(catalog) = &cli.catalog {
        settings.catalog = Some(catalog.clone());
    }
    if let Some(model) = &cli.model {
        settings.model = Some(model.clone());
    }
    debug!("settings: {:?}", settings);
    Ok(settings)
}

fn read_domain(arg: &str) -> CliResult<String> {
    if arg != "-" {
        return Ok(arg.to_string());
    }
    let mut text = String::new();
    io::stdin()
        .read_to_string(&mut text)
        .map_err(|e| InfraError::io("read domain from stdin", e))?;
    Ok(text)
}

fn load_editor(cli: &Cli, domain: &str) -> CliResult<DomainEditor> {
    let container = ServiceContainer::new(load_settings(cli)?)?;
    let mut editor = container.editor()?;
    editor.load(&read_domain(domain)?);
    Ok(editor)
}

fn ensure_supported(editor: &DomainEditor) -> CliResult<()> {
    match editor.unsupported_reason() {
        Some(reason) => Err(CliError::Unsupported(reason.to_string())),
        None => Ok(()),
    }
}

#[instrument(skip(cli))]
fn cmd_tree(cli: &Cli, domain: &str) -> CliResult<()> {
    let editor = load_editor(cli, domain)?;
    ensure_supported(&editor)?;
    output::info(&editor.tree().to_tree_string());
    Ok(())
}

#[instrument(skip(cli))]
fn cmd_check(cli: &Cli, domain: &str) -> CliResult<()> {
    let editor = load_editor(cli, domain)?;
    if let Some(reason) = editor.unsupported_reason() {
        output::failure(&format!("{} ({})", editor.text().trim(), editor.model()));
        return Err(CliError::Unsupported(reason.to_string()));
    }
    output::success(&format!(
        "{} leaves on {}",
        editor.tree().leaf_nodes().len(),
        editor.model()
    ));
    Ok(())
}

#[instrument(skip(cli))]
fn cmd_normalize(cli: &Cli, domain: &str) -> CliResult<()> {
    let editor = load_editor(cli, domain)?;
    ensure_supported(&editor)?;
    output::info(editor.text());
    Ok(())
}

#[instrument]
fn cmd_operators(field_type: &str) -> CliResult<()> {
    let field_type = FieldType::from_name(field_type).ok_or_else(|| {
        let known: Vec<&str> = FieldType::ALL.iter().map(|t| t.name()).collect();
        CliError::InvalidArgs(format!(
            "unknown field type {field_type}, expected one of: {}",
            known.join(", ")
        ))
    })?;

    output::header(&format!("Operators for {field_type}"));
    let operators = operators_info(field_type);
    let width = operators.iter().map(|op| op.key.len()).max().unwrap_or(0);
    for op in operators {
        output::row(
            op.key,
            width,
            &format!(
                "{} [{}, {}]",
                op.label,
                op.value_mode,
                editor_for(field_type, op)
            ),
        );
    }
    Ok(())
}

fn cmd_config(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = load_settings(cli)?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Template => output::info(&Settings::template()),
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::row("global", 6, &path.display()),
                None => output::warning("no config directory on this platform"),
            }
            let cwd = std::env::current_dir()
                .map_err(|e| InfraError::io("current directory", e))?;
            output::row("local", 6, &local_config_path(&cwd).display());
        }
    }
    Ok(())
}
