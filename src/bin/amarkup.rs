use std::{fs::File, io::BufReader, path::{Path, PathBuf}};

use anyhow::{anyhow, Context, Result};
use clap::Parser as ClapParser;
use amarkup::{Assigns, Bindings, Builder, Casing, Component, Config, JsonReader, SafeHtml,
              Template,
              json::{assigns_from_json, bindings_from_json},
              selector::{format_selector, parse_selector}};

#[derive(clap::Parser, Debug)]
/// Render JSON markup documents and try out the helper languages.
struct Args {
    #[clap(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Define a template from a JSON markup document and print the
    /// rendered HTML.
    Render {
        template: PathBuf,

        /// JSON object with the assigns
        #[clap(long)]
        params: Option<PathBuf>,

        /// JSON object with the bindings for deferred variables
        #[clap(long)]
        bindings: Option<PathBuf>,

        /// JSON configuration file; env vars still override it
        #[clap(long)]
        config: Option<PathBuf>,

        /// Define a component instead, making plain references
        /// optional
        #[clap(long)]
        component: bool,
    },

    /// Print the tag and attributes a selector stands for.
    Selector {
        selector: String,
    },

    /// Print an identifier in the given casing (snake, snake_upcase,
    /// pascal, camel, lisp, lisp_upcase).
    Case {
        policy: String,
        identifier: String,
    },
}

fn read_json(path: &Path) -> Result<serde_json::Value> {
    (|| -> Result<serde_json::Value> {
        Ok(serde_json::from_reader(BufReader::new(File::open(path)?))?)
    })().with_context(|| anyhow!("reading JSON from {path:?}"))
}

fn render(template: &Path, params: Option<&Path>, bindings: Option<&Path>,
          config: Option<&Path>, component: bool) -> Result<SafeHtml>
{
    let config = match config {
        Some(path) => Config::from_json_file(path)?,
        None => Config::default(),
    }.with_env_overrides()?;
    let builder = Builder::new(&config);
    let body = JsonReader::new(&builder).body(&read_json(template)?)
        .with_context(|| anyhow!("reading markup from {template:?}"))?;
    let assigns = match params {
        Some(path) => assigns_from_json(&read_json(path)?)
            .with_context(|| anyhow!("reading params from {path:?}"))?,
        None => Assigns::new(),
    };
    let vars = match bindings {
        Some(path) => bindings_from_json(&read_json(path)?)
            .with_context(|| anyhow!("reading bindings from {path:?}"))?,
        None => Vec::new(),
    };
    let name = template.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
    let html = if component {
        Component::define(name, body, &config)?
            .render_with(&assigns, &Bindings::new(&vars), None)?
    } else {
        Template::define(name, body, &config)?
            .render_with(&assigns, &Bindings::new(&vars), None)?
    };
    Ok(html)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match args.command {
        Command::Render { template, params, bindings, config, component } => {
            let html = render(&template, params.as_deref(), bindings.as_deref(),
                              config.as_deref(), component)?;
            println!("{html}");
        }
        Command::Selector { selector } => {
            let parsed = parse_selector(&selector);
            println!("tag {}", parsed.tag);
            for (name, value) in &parsed.attrs {
                println!("{name} {value}");
            }
            println!("= {}", format_selector(&parsed.tag, &parsed.attrs));
        }
        Command::Case { policy, identifier } => {
            let casing = Casing::from_name(&policy)?;
            println!("{}", casing.apply(&identifier));
        }
    }
    Ok(())
}
