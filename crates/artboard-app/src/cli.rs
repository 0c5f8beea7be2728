//! Command-line interface.

use crate::error::{AppError, AppResult};
use crate::session::Session;
use crate::shortcuts::{KeyPress, ShortcutRegistry};
use artboard_core::deploy::{BundleFile, DeployPipeline, DirectoryTarget};
use artboard_core::measure::Unit;
use artboard_core::monitor::format_bytes;
use artboard_core::style_guide::StyleGuide;
use artboard_core::template::{Template, TemplateLibrary};
use artboard_core::EditorConfig;
use artboard_render::render_svg;
use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "artboard", version, about = "Graphic design editor")]
pub struct Cli {
    /// Config file. Defaults to the platform config directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Document directory, overriding the config.
    #[arg(long, global = true)]
    pub storage: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Create a document from a template.
    New {
        id: String,
        /// Built-in template name.
        #[arg(long, default_value = "blank", conflicts_with = "from_file")]
        template: String,
        /// Template JSON file.
        #[arg(long)]
        from_file: Option<PathBuf>,
        #[arg(long)]
        name: Option<String>,
    },
    /// List built-in templates.
    Templates,
    /// List saved documents.
    List,
    /// Delete a saved document.
    Delete { id: String },
    /// Apply spoken phrases to a document.
    Say {
        id: String,
        #[arg(required = true)]
        phrases: Vec<String>,
        /// Recognizer confidence reported for each phrase.
        #[arg(long, default_value_t = 1.0)]
        confidence: f64,
    },
    /// Apply key presses such as `ctrl+a` or `delete` to a document.
    Key {
        id: String,
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Export a document.
    Export {
        id: String,
        #[arg(long, value_enum, default_value_t = ExportFormat::Svg)]
        format: ExportFormat,
        /// Output file; standard output when omitted.
        #[arg(long, short)]
        out: Option<PathBuf>,
        /// Unit for measurements.
        #[arg(long, default_value = "px", value_parser = parse_unit)]
        unit: Unit,
    },
    /// Memory and timing report for a document.
    Report {
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// Publish a document bundle to a directory.
    Deploy {
        id: String,
        #[arg(long)]
        to: PathBuf,
        /// Bundle name; the document id when omitted.
        #[arg(long)]
        name: Option<String>,
    },
    /// Print keyboard shortcuts.
    Shortcuts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Svg,
    Template,
    StyleGuide,
    Css,
    Measurements,
}

fn parse_unit(s: &str) -> Result<Unit, String> {
    Unit::from_suffix(s).ok_or_else(|| format!("unknown unit {s:?} (px, in, cm, mm)"))
}

/// Run a parsed command line. Returns the text to print.
pub fn run(cli: Cli) -> AppResult<String> {
    match cli.command {
        CliCommand::Shortcuts => return Ok(ShortcutRegistry::describe_all()),
        CliCommand::Templates => return Ok(describe_templates()),
        _ => {}
    }

    let config_path = match cli.config {
        Some(path) => path,
        None => EditorConfig::default_path()?,
    };
    let mut config = EditorConfig::load(&config_path)?;
    if let Some(dir) = cli.storage {
        config.storage_dir = Some(dir);
    }
    // Preferences live beside the config file.
    let preferences_path = config_path.with_file_name("preferences.json");

    let mut session = Session::open(config, Some(preferences_path));
    pollster::block_on(execute(&mut session, cli.command))
}

fn describe_templates() -> String {
    let mut out = String::new();
    for (name, template) in TemplateLibrary::names().into_iter().zip(TemplateLibrary::builtin()) {
        let _ = writeln!(
            out,
            "{:20} {}x{}  {}",
            name, template.width, template.height, template.description
        );
    }
    out
}

/// Execute a document command against `session`.
pub async fn execute(session: &mut Session, command: CliCommand) -> AppResult<String> {
    let mut out = String::new();
    match command {
        CliCommand::New {
            id,
            template,
            from_file,
            name,
        } => {
            let template = match from_file {
                Some(path) => {
                    let json = fs::read_to_string(&path).map_err(|e| AppError::file(&path, e))?;
                    Template::from_json(&json)?
                }
                None => TemplateLibrary::get(&template)?,
            };
            let name = name.unwrap_or_else(|| id.clone());
            session.new_document(&id, &name, &template);
            session.save().await?;
            let _ = writeln!(
                out,
                "Created {} from {} ({} shapes)",
                id,
                template.name,
                session.state().len()
            );
        }
        CliCommand::List => {
            for id in session.list().await? {
                let _ = writeln!(out, "{}", id);
            }
        }
        CliCommand::Delete { id } => {
            session.delete(&id).await?;
            let _ = writeln!(out, "Deleted {}", id);
        }
        CliCommand::Say {
            id,
            phrases,
            confidence,
        } => {
            session.load(&id).await?;
            for phrase in &phrases {
                let applied = session.say(phrase, confidence);
                let _ = writeln!(out, "{}: {}", phrase, if applied { "applied" } else { "ignored" });
            }
            session.save_if_dirty().await?;
        }
        CliCommand::Key { id, keys } => {
            session.load(&id).await?;
            for key in &keys {
                let press: KeyPress = key.parse().map_err(AppError::InvalidKey)?;
                let shortcut = session.press(&press).await?;
                let _ = writeln!(out, "{}: {}", shortcut.format(), shortcut.description);
            }
            session.save_if_dirty().await?;
        }
        CliCommand::Export {
            id,
            format,
            out: path,
            unit,
        } => {
            session.load(&id).await?;
            let name = session.document_id().to_string();
            let contents = match format {
                ExportFormat::Svg => session.timed("render", render_svg)?,
                ExportFormat::Template => Template::from_state(session.state(), &name).to_json()?,
                ExportFormat::StyleGuide => StyleGuide::generate(session.state(), &name).to_json()?,
                ExportFormat::Css => {
                    let mut css = session.theme().css_variables();
                    css.push_str(&StyleGuide::generate(session.state(), &name).to_css());
                    css
                }
                ExportFormat::Measurements => session.measurements(unit).to_json()?,
            };
            match path {
                Some(path) => {
                    fs::write(&path, &contents).map_err(|e| AppError::file(&path, e))?;
                    let _ = writeln!(out, "Wrote {}", path.display());
                }
                None => out = contents,
            }
        }
        CliCommand::Report { id, json } => {
            session.load(&id).await?;
            session.timed("render", render_svg)?;
            session.timed("template", |state, _| Template::from_state(state, "report").to_json())?;
            let memory = session.memory_report();
            let performance = session.monitor().report();
            if json {
                out = serde_json::to_string_pretty(&serde_json::json!({
                    "memory": memory,
                    "performance": performance,
                }))?;
            } else {
                let _ = writeln!(out, "Shapes:   {}", memory.total_shapes);
                for (kind, count) in memory.shape_counts.iter().filter(|(_, c)| **c > 0) {
                    let _ = writeln!(out, "  {:8} {}", kind, count);
                }
                let _ = writeln!(out, "Document: {}", format_bytes(memory.document_bytes));
                let _ = writeln!(out, "Images:   {}", format_bytes(memory.image_bytes));
                let _ = writeln!(
                    out,
                    "Total:    {} of {}",
                    format_bytes(memory.total_bytes),
                    format_bytes(memory.budget_bytes)
                );
                for span in &performance.spans {
                    let _ = writeln!(out, "{:9} {:.2} ms", format!("{}:", span.name), span.average_ms());
                }
                for warning in &memory.warnings {
                    let _ = writeln!(out, "warning: {} ({})", warning.message, warning.suggestion);
                }
                for warning in &performance.warnings {
                    let _ = writeln!(out, "warning: {}", warning);
                }
            }
        }
        CliCommand::Deploy { id, to, name } => {
            session.load(&id).await?;
            let name = name.unwrap_or(id);
            let svg = session.timed("render", render_svg)?;
            let target = DirectoryTarget::new(to);
            let mut pipeline = DeployPipeline::new(&target);
            let report = pipeline
                .run(session.state(), &name, vec![BundleFile::new("preview.svg", svg)])
                .await?;
            let _ = writeln!(
                out,
                "Deployed {} files ({}) to {}",
                report.files,
                format_bytes(report.bytes),
                report.location
            );
        }
        CliCommand::Shortcuts => out = ShortcutRegistry::describe_all(),
        CliCommand::Templates => out = describe_templates(),
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_export() {
        let cli = Cli::try_parse_from([
            "artboard", "export", "poster", "--format", "style-guide", "--unit", "cm",
        ])
        .unwrap();
        match cli.command {
            CliCommand::Export { id, format, unit, out } => {
                assert_eq!(id, "poster");
                assert_eq!(format, ExportFormat::StyleGuide);
                assert_eq!(unit, Unit::Cm);
                assert!(out.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(Cli::try_parse_from(["artboard", "export", "x", "--unit", "furlong"]).is_err());
        assert!(Cli::try_parse_from(["artboard", "say", "x"]).is_err());
        assert!(Cli::try_parse_from([
            "artboard", "new", "x", "--template", "blank", "--from-file", "t.json",
        ])
        .is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["artboard", "list", "--storage", "/tmp/docs"]).unwrap();
        assert_eq!(cli.storage, Some(PathBuf::from("/tmp/docs")));
    }
}
