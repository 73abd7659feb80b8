mod interactive;
mod progress;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use thumbmaster_core::{
    AccentColor, AppError, CancelToken, Config, CredentialState, Emotion, Framing, ImageData, LayoutParams,
    SlotId, ThumbMaster, ThumbnailResult, init,
    export::DEFAULT_SUFFIX,
    wizard::DEFAULT_OVERLAY_TEXT,
};
use tracing::Level;

use progress::Busy;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Override the model defined in .env
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Print debug logs to stderr
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Guided studio session (default)
    Wizard {
        /// Where saved thumbnails go
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// Generate a batch in one go and export it
    Generate {
        /// Presenter photo
        #[arg(long)]
        photo: PathBuf,

        #[arg(long, default_value = "shocked")]
        emotion: Emotion,

        /// Overlay title; use a literal \n for a line break
        #[arg(long, default_value = "THIS IS\\nINSANE!")]
        text: String,

        /// Scene description
        #[arg(long)]
        theme: String,

        /// Preset name or #RRGGBB
        #[arg(long, default_value = "red")]
        color: AccentColor,

        #[arg(long, default_value = "extreme-close-up")]
        framing: Framing,

        #[arg(long, default_value = ".")]
        out_dir: PathBuf,

        /// Archive name suffix
        #[arg(long, default_value = DEFAULT_SUFFIX)]
        suffix: String,

        /// Save one PNG per result instead of a ZIP
        #[arg(long, default_value_t = false)]
        single: bool,
    },

    /// Composite an existing background offline, without calling Gemini
    Compose {
        /// Background image
        #[arg(long)]
        background: PathBuf,

        /// Overlay title; use a literal \n for a line break
        #[arg(long, default_value = "THIS IS\\nINSANE!")]
        text: String,

        /// Layout as JSON, e.g. '{"textSize":300,"presenterZoom":1.2}'
        #[arg(long)]
        params: Option<String>,

        /// Output PNG path
        #[arg(long, default_value = "thumbnail.png")]
        out: PathBuf,
    },

    /// List emotions, framings and accent color presets
    Options,
}

#[tokio::main]
async fn main() -> Result<()> {
    init();
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::WARN })
        .with_target(false)
        .init();

    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(m) = args.model {
        config.model_name = m;
    }

    match args.command.unwrap_or(Command::Wizard {
        out_dir: PathBuf::from("."),
    }) {
        Command::Options => print_options(),
        Command::Compose {
            background,
            text,
            params,
            out,
        } => compose(config, background, &text, params.as_deref(), out).await?,
        Command::Generate {
            photo,
            emotion,
            text,
            theme,
            color,
            framing,
            out_dir,
            suffix,
            single,
        } => {
            let studio = ThumbMaster::with_config(config);
            let draft = BatchDraft {
                photo,
                emotion,
                text: text.replace("\\n", "\n"),
                theme,
                color,
                framing,
            };
            generate(&studio, draft, out_dir, &suffix, single).await?
        }
        Command::Wizard { out_dir } => {
            let studio = ThumbMaster::with_config(config);
            interactive::run(&studio, out_dir).await?
        }
    }

    Ok(())
}

fn print_options() {
    println!("Emotions:");
    for e in Emotion::ALL {
        println!("  {:<14} {}", e.slug(), e.label());
    }
    println!("\nFramings:");
    for f in Framing::ALL {
        println!("  {:<18} {}", f.slug(), f.label());
    }
    println!("\nAccent colors (or any #RRGGBB):");
    for (name, color) in AccentColor::PRESETS {
        println!("  {:<8} {}", name, color.hex());
    }
    println!("\nDefault title: {}", DEFAULT_OVERLAY_TEXT.replace('\n', " / "));
}

async fn compose(
    config: Config,
    background: PathBuf,
    text: &str,
    params: Option<&str>,
    out: PathBuf,
) -> Result<()> {
    let image = ImageData::from_path(&background)
        .with_context(|| format!("Failed to read {}", background.display()))?;
    let params = match params {
        Some(json) => serde_json::from_str::<LayoutParams>(json)
            .context("Invalid --params JSON")?
            .clamped(),
        None => LayoutParams::default(),
    };

    let studio = ThumbMaster::with_config(config);
    let mut result = ThumbnailResult::new(
        SlotId::from("compose"),
        image,
        &text.replace("\\n", "\n"),
        Framing::CloseUp,
    );
    result.params = params;

    let cancel = CancelToken::new();
    let busy = Busy::start("Compositing...", &cancel);
    let file = studio.exporter().export_one(&result, &cancel).await;
    busy.finish();

    let file = file.context("Failed to composite thumbnail")?;
    std::fs::write(&out, &file.bytes)
        .with_context(|| format!("Failed to write {}", out.display()))?;
    println!("Saved {}", out.display());
    Ok(())
}

struct BatchDraft {
    photo: PathBuf,
    emotion: Emotion,
    text: String,
    theme: String,
    color: AccentColor,
    framing: Framing,
}

/// Drives the wizard non-interactively from the intro to the review step.
async fn generate(
    studio: &ThumbMaster,
    draft: BatchDraft,
    out_dir: PathBuf,
    suffix: &str,
    single: bool,
) -> Result<()> {
    let mut wizard = studio.wizard();
    if wizard.check_credential(&studio.env_credential()).await != CredentialState::Granted {
        bail!("No API key found. Set GEMINI_API_KEY in the environment or a .env file.");
    }

    let presenter = ImageData::from_path(&draft.photo)
        .with_context(|| format!("Failed to read {}", draft.photo.display()))?;

    wizard.next()?;
    wizard.set_presenter(presenter)?;
    wizard.set_framing(draft.framing)?;
    wizard.next()?;
    wizard.set_emotion(draft.emotion)?;
    wizard.next()?;
    wizard.set_overlay_text(&draft.text)?;
    wizard.next()?;
    wizard.set_accent_color(draft.color)?;
    wizard.set_theme(&draft.theme)?;

    let cancel = CancelToken::new();
    let busy = Busy::start("Generating thumbnails...", &cancel);
    let outcome = wizard
        .generate(&cancel, |p| {
            busy.set_message(format!("Generating thumbnails... {}%", p.percent()))
        })
        .await;
    busy.finish();
    if let Err(e) = outcome {
        eprintln!("{}", e.guidance());
        return Err(e.into());
    }

    let exporter = studio.exporter();
    let results = wizard.results()?;
    let busy = Busy::start("Exporting...", &cancel);
    let files = async {
        if !single {
            return Ok(vec![exporter.export_all(results, suffix, &cancel).await?]);
        }
        let mut files = Vec::with_capacity(results.len());
        for result in results {
            files.push(exporter.export_one(result, &cancel).await?);
        }
        Ok::<_, AppError>(files)
    }
    .await;
    busy.finish();

    for file in files? {
        let path = file.write_into(&out_dir)?;
        println!("Saved {}", path.display());
    }
    Ok(())
}
