//! CLI for Visionary Scribe - image analysis and creative writing.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use visionary_scribe::analysis::palette::ColorWarning;
use visionary_scribe::export::{self, EXPORT_FILE_NAME};
use visionary_scribe::samples::{self, DIRECT_LINK, SAMPLE_GALLERY, SAMPLE_IMAGES};
use visionary_scribe::{
    ConfigChange, CountPolicy, CreativeStyle, GeminiAnalyzer, GeminiClient, GeminiModel,
    GeminiSearcher, SessionMachine, Transition, VariationCount,
};

#[derive(Parser)]
#[command(name = "visionary-scribe")]
#[command(about = "Analyze images and write about them with Gemini")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze an image and generate creative texts
    Analyze(AnalyzeArgs),

    /// Search the web for images to analyze
    Search(SearchArgs),

    /// List the built-in sample images
    Samples,

    /// List the writing styles
    Styles,
}

#[derive(Args)]
struct ApiArgs {
    /// Gemini API key
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Gemini model id (gemini-2.5-flash, gemini-2.5-flash-lite, gemini-2.5-pro)
    #[arg(long, default_value = "gemini-2.5-flash", value_parser = parse_model)]
    model: GeminiModel,

    /// Per-request deadline in seconds
    #[arg(long, default_value_t = 180)]
    timeout: u64,
}

impl ApiArgs {
    fn client(&self) -> visionary_scribe::Result<GeminiClient> {
        let mut builder = GeminiClient::builder()
            .model(self.model)
            .timeout(Duration::from_secs(self.timeout));
        if let Some(ref key) = self.api_key {
            builder = builder.api_key(key);
        }
        builder.build()
    }
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Image URL
    #[arg(required_unless_present = "sample", conflicts_with = "sample")]
    url: Option<String>,

    /// Use a built-in sample image (1-based, see `samples`)
    #[arg(long)]
    sample: Option<usize>,

    /// Writing style
    #[arg(short, long, value_enum, default_value = "simple")]
    style: StyleArg,

    /// Number of creative outputs
    #[arg(short, long, default_value_t = 3, value_parser = parse_count)]
    count: u32,

    /// Extra instruction for the writer
    #[arg(short, long)]
    instruction: Option<String>,

    /// Write the plain-text export to this path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Drop surplus outputs instead of failing
    #[arg(long)]
    lenient: bool,

    #[command(flatten)]
    api: ApiArgs,
}

#[derive(Args)]
struct SearchArgs {
    /// What to search for
    query: String,

    #[command(flatten)]
    api: ApiArgs,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StyleArg {
    Simple,
    Complex,
    Poetic,
    Caption,
}

impl From<StyleArg> for CreativeStyle {
    fn from(arg: StyleArg) -> Self {
        match arg {
            StyleArg::Simple => CreativeStyle::Simple,
            StyleArg::Complex => CreativeStyle::Complex,
            StyleArg::Poetic => CreativeStyle::Poetic,
            StyleArg::Caption => CreativeStyle::Caption,
        }
    }
}

fn parse_model(s: &str) -> Result<GeminiModel, String> {
    GeminiModel::from_id(s).ok_or_else(|| format!("unknown model: {}", s))
}

fn parse_count(s: &str) -> Result<u32, String> {
    let n: u32 = s.parse().map_err(|_| format!("not a number: {}", s))?;
    VariationCount::try_from(n)
        .map(u32::from)
        .map_err(|_| "count must be 3, 5 or 10".to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Analyze(args) => analyze(args, cli.json).await?,
        Commands::Search(args) => search(args, cli.json).await?,
        Commands::Samples => list_samples(cli.json)?,
        Commands::Styles => list_styles(cli.json)?,
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn analyze(args: AnalyzeArgs, json_output: bool) -> anyhow::Result<()> {
    let (url, source) = match (args.sample, args.url) {
        (Some(n), _) => {
            let url = n
                .checked_sub(1)
                .and_then(samples::sample)
                .ok_or_else(|| anyhow::anyhow!("no sample #{} (1-{})", n, SAMPLE_IMAGES.len()))?;
            (url.to_string(), SAMPLE_GALLERY)
        }
        (None, Some(url)) => (url, DIRECT_LINK),
        (None, None) => anyhow::bail!("an image URL or --sample is required"),
    };

    let policy = if args.lenient {
        CountPolicy::Lenient
    } else {
        CountPolicy::Strict
    };
    let analyzer = GeminiAnalyzer::new(args.api.client()?).with_count_policy(policy);
    let session = SessionMachine::builder()
        .analyzer(analyzer)
        .timeout(Duration::from_secs(args.api.timeout))
        .build()?;

    check(session.submit_image(&url, source).await)?;

    let count = VariationCount::try_from(args.count)?;
    let _ = session.update_config(ConfigChange::Style(args.style.into()));
    let _ = session.update_config(ConfigChange::Count(count));
    if let Some(instruction) = args.instruction {
        let _ = session.update_config(ConfigChange::Instruction(instruction));
    }

    check(session.generate().await)?;

    let snapshot = session.snapshot();
    let result = snapshot
        .result()
        .ok_or_else(|| anyhow::anyhow!("analysis finished without a result"))?;

    if let Some(ref path) = args.output {
        let path = if path.is_dir() {
            path.join(EXPORT_FILE_NAME)
        } else {
            path.clone()
        };
        export::save(&path, result, snapshot.image_url(), snapshot.image_source())?;
        if !json_output {
            eprintln!("Saved: {}", path.display());
        }
    }

    let warnings = result.color_warnings();

    if json_output {
        let out = serde_json::json!({
            "success": true,
            "url": snapshot.image_url(),
            "source": snapshot.image_source(),
            "style": snapshot.settings().style,
            "variationCount": snapshot.settings().variation_count,
            "result": result,
            "colorWarnings": warnings.iter().map(ColorWarning::to_string).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("Image: {} ({})", snapshot.image_url(), source);
        println!("\nDetails:\n{}", result.visual_details);
        println!("\nTags: {}", result.tags.join(", "));
        println!("Colors: {}", result.colors.join(", "));
        println!("\n{} ({}):", snapshot.settings().style, result.creative_outputs.len());
        for (i, output) in result.creative_outputs.iter().enumerate() {
            println!("\n[{}] {}\n{}", i + 1, output.title, output.content);
        }
        for w in &warnings {
            eprintln!("warning: {}", w);
        }
    }

    Ok(())
}

/// Turns a failed transition into a user-facing error.
fn check(transition: Transition) -> anyhow::Result<()> {
    match transition {
        Transition::Failed(e) => {
            tracing::debug!(error = %e, "operation failed");
            anyhow::bail!(e.user_message())
        }
        Transition::Ignored => anyhow::bail!("operation not allowed in the current state"),
        Transition::Advanced(_) | Transition::Applied => Ok(()),
    }
}

async fn search(args: SearchArgs, json_output: bool) -> anyhow::Result<()> {
    let client = args.api.client()?;
    let session = SessionMachine::builder()
        .analyzer(GeminiAnalyzer::new(client.clone()))
        .searcher(GeminiSearcher::new(client))
        .timeout(Duration::from_secs(args.api.timeout))
        .build()?;

    let results = session
        .search(&args.query)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else if results.is_empty() {
        println!("No images found.");
    } else {
        for (i, r) in results.iter().enumerate() {
            println!("{}. {} ({})", i + 1, r.title, r.source);
            println!("   {}", r.url);
        }
    }

    Ok(())
}

fn list_samples(json_output: bool) -> anyhow::Result<()> {
    if json_output {
        println!("{}", serde_json::to_string_pretty(&SAMPLE_IMAGES)?);
    } else {
        println!("Sample images (use --sample N):\n");
        for (i, url) in SAMPLE_IMAGES.iter().enumerate() {
            println!("  {}. {}", i + 1, url);
        }
    }
    Ok(())
}

fn list_styles(json_output: bool) -> anyhow::Result<()> {
    #[derive(serde::Serialize)]
    struct StyleInfo {
        name: CreativeStyle,
        guidance: &'static str,
    }

    let styles: Vec<StyleInfo> = CreativeStyle::ALL
        .iter()
        .map(|&s| StyleInfo {
            name: s,
            guidance: s.guidance(),
        })
        .collect();

    if json_output {
        println!("{}", serde_json::to_string_pretty(&styles)?);
    } else {
        println!("Writing styles:\n");
        for s in &styles {
            println!("  {}", s.name);
            println!("    {}", s.guidance);
        }
        let counts: Vec<String> = VariationCount::ALL.iter().map(|c| c.to_string()).collect();
        println!("\nOutput counts: {}", counts.join(", "));
    }
    Ok(())
}
