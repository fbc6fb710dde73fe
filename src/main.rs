use clap::{Parser, Subcommand};
use simple_blog::config::{self, DeployContext};
use simple_blog::{output, pipeline};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "simple-blog")]
#[command(about = "Static site generator for a markdown blog")]
#[command(long_about = "\
Static site generator for a markdown blog

Markdown and MDX files with YAML front-matter become HTML pages; published,
dated posts become RSS feed entries.

Content structure:

  content/
  ├── config.toml                      # Site config (optional)
  ├── assets/                          # Copied verbatim to the output root
  ├── me.md                            # Page → /me/
  └── blog/
      ├── gatsby-netlify-cms.md        # Post → /blog/gatsby-netlify-cms/
      └── react-hooks-pitfalls/
          ├── index.mdx                # Bundle → /blog/react-hooks-pitfalls/
          └── thumbnail.svg            # Copied next to the page

Front-matter:
  title     (required)  Page and feed title
  template  (required)  post | page
  date                  YYYY-MM-DD; posts without one get no feed entry
  slug                  Overrides the path-derived URL
  tags, categories      String or list
  published             false keeps the page out of feeds and listings

Run 'simple-blog gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Content directory
    #[arg(long, default_value = "content", global = true)]
    source: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// Deploy context: preview builds use `preview_url` and disallow crawlers.
    /// Netlify's `deploy-preview` and `branch-deploy` count as preview
    #[arg(long, value_enum, env = "CONTEXT", default_value = "production", global = true)]
    context: DeployContext,

    /// Log pipeline progress at debug level (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the site: pages, listings, feeds and site files
    Build,
    /// Validate config and content without writing anything
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Build => {
            let site_config = config::load_site_config(&cli.source, cli.context)?;
            init_thread_pool(&site_config.processing);

            println!("==> Building {} → {}", cli.source.display(), cli.output.display());
            let report = pipeline::build(&cli.source, &cli.output, &site_config, cli.context)?;
            output::print_build_report(&report);
            report.check_tolerance(site_config.max_content_errors)?;
            println!("==> Build complete: {}", cli.output.display());
        }
        Command::Check => {
            let site_config = config::load_site_config(&cli.source, cli.context)?;
            init_thread_pool(&site_config.processing);

            println!("==> Checking {}", cli.source.display());
            let report = pipeline::check(&cli.source)?;
            output::print_scan_output(&report, &cli.source);
            report.check_tolerance(site_config.max_content_errors)?;
            println!("==> Content is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Route `tracing` events to stderr. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "simple_blog=debug" } else { "simple_blog=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores: user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
