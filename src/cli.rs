use anyhow::{Context, Result};
use colored::Colorize;
use std::time::Instant;

use crate::{
    cli_types::{CheckArgs, ListArgs, OutputFormat},
    config::IndexerConfig,
    parser::{normalize_line_endings, parse_templates},
    service::TemplateService,
    storage::TemplateRegistry,
};

pub struct CliApp {
    config: IndexerConfig,
    verbose: bool,
}

impl CliApp {
    pub fn new(config: IndexerConfig, verbose: bool, colors_enabled: bool) -> Self {
        colored::control::set_override(colors_enabled);
        Self { config, verbose }
    }

    pub async fn list(&self, args: ListArgs) -> Result<()> {
        let mut config = self.config.clone();
        if !args.libraries.is_empty() {
            config.library_paths = args.libraries;
        }

        let libraries = config.effective_library_paths();
        if libraries.is_empty() {
            self.print_warning("No library paths configured; only built-in templates will be listed");
        } else if self.verbose {
            for library in &libraries {
                self.print_info(&format!("Library: {}", library.display()));
            }
        }

        let start_time = Instant::now();
        let service = TemplateService::from_config(config);

        // A listing always scans, even when background scanning is disabled
        let scan = service
            .start_scan()
            .context("A template scan is already running")?;
        let registry = service.registry().await;
        let result = scan.await.context("Template scan task failed")?;

        match args.format {
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(&registry.to_json())
                    .context("Failed to serialize template registry to JSON")?;
                println!("{}", json);
            }
            OutputFormat::Text => {
                self.print_header("Project Templates");
                self.display_registry(&registry);
                self.print_success(&format!(
                    "{} templates from {} owners ({} of {} packages ship templates) in {:?}",
                    registry.total_templates(),
                    registry.size(),
                    result.resources_found,
                    result.packages_scanned,
                    start_time.elapsed()
                ));
            }
        }

        Ok(())
    }

    /// Returns `false` when any block in the file is rejected.
    pub async fn check(&self, args: CheckArgs) -> Result<bool> {
        self.print_header("Template Check");

        let bytes = tokio::fs::read(&args.file)
            .await
            .with_context(|| format!("Failed to read {}", args.file.display()))?;
        let contents = normalize_line_endings(&String::from_utf8_lossy(&bytes));

        let mut valid = 0;
        let mut rejected = 0;
        for (index, parsed) in parse_templates(&args.package, &contents).enumerate() {
            match parsed {
                Ok(template) => {
                    valid += 1;
                    println!("  {} block {}: {}", "✓".green(), index + 1, template.summary());
                }
                Err(e) => {
                    rejected += 1;
                    println!("  {} block {}: {}", "✗".red(), index + 1, e);
                }
            }
        }

        if rejected == 0 {
            self.print_success(&format!("{} valid templates in {}", valid, args.file.display()));
        } else {
            self.print_warning(&format!(
                "{} valid, {} rejected in {}",
                valid,
                rejected,
                args.file.display()
            ));
        }

        Ok(rejected == 0)
    }

    pub fn show_config(&self) -> Result<()> {
        self.print_header("Configuration");

        let config_json = serde_json::to_string_pretty(&self.config)
            .context("Failed to serialize configuration")?;
        println!("{}", config_json);

        if self.verbose {
            match IndexerConfig::default_config_path() {
                Some(path) => self.print_info(&format!("Config file: {}", path.display())),
                None => self.print_info("Config file: (no home directory)"),
            }
            for library in self.config.effective_library_paths() {
                self.print_info(&format!("Library: {}", library.display()));
            }
        }

        Ok(())
    }

    fn display_registry(&self, registry: &TemplateRegistry) {
        for (owner, templates) in registry.iter() {
            println!("{}", owner.bold().cyan());
            for template in templates {
                println!("  {} {}", template.binding().green(), template.title());
                if self.verbose {
                    for line in template.description().lines() {
                        println!("      {}", line.dimmed());
                    }
                }
            }
        }
    }

    fn print_header(&self, title: &str) {
        println!("{}", title.bold().underline());
    }

    fn print_info(&self, message: &str) {
        println!("{} {}", "ℹ".blue(), message);
    }

    fn print_success(&self, message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    fn print_warning(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message.yellow());
    }
}
