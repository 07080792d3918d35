use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use dips_sdk::{Archive, ArchiveConfig, EntityId, EntityKind, PolicyKind};

use crate::cli::*;

const CONFIG_FILE: &str = "dips.toml";
const DEFAULT_ZSTD_LEVEL: i32 = 3;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    let format = cli.format;
    match cli.command {
        Command::Config => cmd_config(&config, format),
        Command::Ingest(args) => cmd_ingest(&open(&config)?, args, format),
        Command::Package(args) => cmd_package(&open(&config)?, &config, args, format),
        Command::List(args) => cmd_list(&open(&config)?, args, format),
        Command::Content(args) => cmd_content(&open(&config)?, args),
        Command::Show(args) => cmd_show(&open(&config)?, args, format),
        Command::Remove(args) => cmd_remove(&open(&config)?, args),
    }
}

/// `--config`, else `<root>/dips.toml` if present, else defaults. `--root`
/// always wins.
fn load_config(cli: &Cli) -> anyhow::Result<ArchiveConfig> {
    let mut config = match &cli.config {
        Some(path) => ArchiveConfig::load(path)?,
        None => {
            let root = cli.root.clone().unwrap_or_else(|| ArchiveConfig::default().root);
            let candidate = root.join(CONFIG_FILE);
            if candidate.is_file() {
                ArchiveConfig::load(&candidate)?
            } else {
                ArchiveConfig::default()
            }
        }
    };
    if let Some(root) = &cli.root {
        config.root = root.clone();
    }
    Ok(config)
}

fn open(config: &ArchiveConfig) -> anyhow::Result<Archive> {
    Archive::open(config)
        .with_context(|| format!("cannot open archive at {}", config.root.display()))
}

fn output(path: Option<&Path>) -> anyhow::Result<Box<dyn Write>> {
    Ok(match path {
        Some(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("cannot create {}", p.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    })
}

fn entity_id(raw: &str) -> anyhow::Result<EntityId> {
    EntityId::parse(raw).with_context(|| format!("invalid entity id {raw:?}"))
}

fn cmd_ingest(archive: &Archive, args: IngestArgs, format: OutputFormat) -> anyhow::Result<()> {
    let bytes = std::fs::read(&args.package)
        .with_context(|| format!("cannot read {}", args.package.display()))?;
    let report = archive.put_package_bytes(&bytes)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            println!(
                "{} Ingested {} entities from {}",
                "✓".green().bold(),
                report.entities.to_string().bold(),
                args.package.display()
            );
            if report.links_skipped {
                println!("  Links: {}", "skipped (read-only metadata)".yellow());
            } else {
                println!("  Linked targets: {}", report.linked_targets);
            }
            for skipped in &report.skipped {
                println!("  {} {} (no record in read-only metadata)", "skipped:".yellow(), skipped);
            }
            for target in &report.dangling_targets {
                println!("  {} {}", "dangling:".yellow(), target);
            }
        }
    }
    Ok(())
}

fn cmd_package(
    archive: &Archive,
    config: &ArchiveConfig,
    args: PackageArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let id = entity_id(&args.id)?;
    let policy = match args.policy {
        Some(PolicyArg::Extended) => PolicyKind::Extended,
        Some(PolicyArg::Single) => PolicyKind::Single,
        None => config.default_policy,
    };
    let level = if args.zstd {
        Some(config.compress_exports.unwrap_or(DEFAULT_ZSTD_LEVEL))
    } else {
        config.compress_exports
    };

    let logic = archive.policy(policy);
    if args.ids {
        let outcome = archive.assemble(&id, logic.as_ref())?;
        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome.package)?),
            OutputFormat::Text => {
                for (kind, member) in outcome.package.iter() {
                    println!("{} {}", format!("{:<16}", kind.as_str()).cyan(), member);
                }
                for missing in &outcome.dangling {
                    println!("{} {}", format!("{:<16}", "dangling").yellow(), missing);
                }
            }
        }
        return Ok(());
    }

    let out = output(args.output.as_deref())?;
    let bytes = archive.export_package(&id, logic.as_ref(), out, level)?;

    if let Some(path) = &args.output {
        let how = match level {
            Some(l) => format!("zstd level {l}"),
            None => "uncompressed".to_string(),
        };
        eprintln!(
            "{} Wrote {} package for {} to {} ({} bytes, {})",
            "✓".green().bold(),
            policy.to_string().cyan(),
            id.as_str().yellow(),
            path.display(),
            bytes,
            how
        );
    }
    Ok(())
}

fn cmd_list(archive: &Archive, args: ListArgs, format: OutputFormat) -> anyhow::Result<()> {
    let kinds = args
        .kind
        .iter()
        .map(|k| k.parse::<EntityKind>())
        .collect::<Result<Vec<_>, _>>()?;
    let ids = archive.list_entities(&kinds)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&ids)?),
        OutputFormat::Text => {
            if ids.is_empty() {
                println!("No entities.");
            }
            for id in ids {
                println!("{id}");
            }
        }
    }
    Ok(())
}

fn cmd_content(archive: &Archive, args: ContentArgs) -> anyhow::Result<()> {
    let id = entity_id(&args.id)?;
    let mut content = archive.get_content(&id)?;
    let mut out = output(args.output.as_deref())?;
    io::copy(&mut content, &mut out)?;
    out.flush()?;
    Ok(())
}

fn cmd_show(archive: &Archive, args: ShowArgs, format: OutputFormat) -> anyhow::Result<()> {
    let record = archive.record(&entity_id(&args.id)?)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&record)?),
        OutputFormat::Text => {
            println!("Entity {} ({})", record.id.as_str().yellow().bold(), record.kind.to_string().cyan());
            if let Some(location) = &record.content_location {
                println!("  Content: {}", location.blue());
            }
            if record.inbound_links().is_empty() {
                println!("  Inbound links: none");
            } else {
                println!("  Inbound links:");
                for (source, kind) in record.inbound_links() {
                    println!("    {} {}", source, format!("({kind})").dimmed());
                }
            }
        }
    }
    Ok(())
}

fn cmd_remove(archive: &Archive, args: RemoveArgs) -> anyhow::Result<()> {
    let id = entity_id(&args.id)?;
    if archive.remove_entity(&id)? {
        println!("{} Removed {}", "✓".green().bold(), id.as_str().yellow());
    } else {
        println!("No entity {}.", id.as_str().yellow());
    }
    Ok(())
}

fn cmd_config(config: &ArchiveConfig, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
        OutputFormat::Text => print!("{}", config.to_toml_string()?),
    }
    Ok(())
}
