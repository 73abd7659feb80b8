//! Terminal front end for the studio wizard.

use crate::progress::Busy;
use anyhow::Result;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thumbmaster_core::{
    AccentColor, AppError, CancelToken, CredentialProvider, CredentialState, CredentialStore,
    Emotion, Framing, GeminiClient, ImageData, SlotUpdate, Step, ThumbMaster, Wizard,
    wizard::STEP_COUNT,
};

/// Asks for a key on stdin when the environment has none.
struct PromptCredential {
    store: CredentialStore,
}

impl CredentialProvider for PromptCredential {
    async fn has_credential(&self) -> thumbmaster_core::Result<bool> {
        Ok(self.store.is_set())
    }

    async fn select_credential(&self) -> thumbmaster_core::Result<()> {
        let key = ask("Paste your Gemini API key (from a project with billing enabled)")?
            .unwrap_or_default();
        if key.trim().is_empty() {
            return Err(AppError::MissingEnvVar("GEMINI_API_KEY".to_string()));
        }
        self.store.set(key);
        Ok(())
    }
}

/// Reads one trimmed line. `None` on end of input.
fn ask(label: &str) -> io::Result<Option<String>> {
    print!("{label}: ");
    io::stdout().flush()?;
    let mut input = String::new();
    if io::stdin().read_line(&mut input)? == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim().to_string()))
}

enum Answer {
    Value(String),
    Back,
    Quit,
}

fn ask_step(label: &str) -> io::Result<Answer> {
    Ok(match ask(label)? {
        None => Answer::Quit,
        Some(s) if s.eq_ignore_ascii_case("back") => Answer::Back,
        Some(s) if s.eq_ignore_ascii_case("quit") => Answer::Quit,
        Some(s) => Answer::Value(s),
    })
}

enum Choice {
    Pick(usize),
    Back,
    Quit,
    Retry,
}

/// Picks from a numbered list; empty input keeps `current`.
fn choose<T: Copy>(items: &[T], label: impl Fn(T) -> String, current: usize) -> io::Result<Choice> {
    for (i, item) in items.iter().enumerate() {
        let mark = if i == current { '*' } else { ' ' };
        println!("  {mark} {}. {}", i + 1, label(*item));
    }
    Ok(match ask_step("Choice (Enter keeps *)")? {
        Answer::Quit => Choice::Quit,
        Answer::Back => Choice::Back,
        Answer::Value(s) if s.is_empty() => Choice::Pick(current),
        Answer::Value(s) => match s.parse::<usize>() {
            Ok(n) if (1..=items.len()).contains(&n) => Choice::Pick(n - 1),
            _ => {
                println!("Pick a number between 1 and {}.", items.len());
                Choice::Retry
            }
        },
    })
}

pub async fn run(studio: &ThumbMaster, out_dir: PathBuf) -> Result<()> {
    let host = PromptCredential {
        store: studio.credentials().clone(),
    };
    let mut wizard = studio.wizard();

    wizard.check_credential(&host).await;

    loop {
        if wizard.credential_state() != CredentialState::Granted && !unlock(&mut wizard, &host).await? {
            return Ok(());
        }

        let step = wizard.step();
        println!("\n[{}/{}] {}", step.index() + 1, STEP_COUNT, step.title());

        let keep_going = match step {
            Step::Intro => intro(&mut wizard)?,
            Step::Photo => photo(&mut wizard)?,
            Step::Emotion => emotion(&mut wizard)?,
            Step::Title => title(&mut wizard)?,
            Step::Theme => theme(studio, &mut wizard).await?,
            Step::Review(_) => review(studio, &mut wizard, &out_dir).await?,
        };
        if !keep_going {
            return Ok(());
        }
    }
}

/// Loops on key selection until it succeeds or the user gives up.
async fn unlock(wizard: &mut Wizard<GeminiClient>, host: &PromptCredential) -> Result<bool> {
    println!("An API key is required before using the studio.");
    loop {
        match wizard.select_credential(host).await {
            Ok(()) => return Ok(true),
            Err(e) => {
                println!("{e}");
                match ask("Try again? [y/N]")? {
                    Some(s) if s.eq_ignore_ascii_case("y") => continue,
                    _ => return Ok(false),
                }
            }
        }
    }
}

/// Moves one step back, ignoring an impossible move.
fn back(wizard: &mut Wizard<GeminiClient>) -> Result<bool> {
    if let Err(e) = wizard.prev() {
        println!("{e}");
    }
    Ok(true)
}

fn advance(wizard: &mut Wizard<GeminiClient>) -> Result<bool> {
    if let Err(e) = wizard.next() {
        println!("{e}");
    }
    Ok(true)
}

fn intro(wizard: &mut Wizard<GeminiClient>) -> Result<bool> {
    println!("Turn one photo of yourself into three cinematic thumbnails.");
    println!("Type 'back' at any prompt to return to the previous step, 'quit' to leave.");
    match ask_step("Press Enter to start")? {
        Answer::Quit => Ok(false),
        _ => advance(wizard),
    }
}

fn photo(wizard: &mut Wizard<GeminiClient>) -> Result<bool> {
    let current = wizard.draft().presenter.is_some();
    let label = if current {
        "Presenter photo path (Enter keeps the current one)"
    } else {
        "Presenter photo path"
    };
    match ask_step(label)? {
        Answer::Quit => return Ok(false),
        Answer::Back => return back(wizard),
        Answer::Value(path) if path.is_empty() => {}
        Answer::Value(path) => match ImageData::from_path(&path) {
            Ok(image) => wizard.set_presenter(image)?,
            Err(e) => {
                println!("{e}");
                return Ok(true);
            }
        },
    }

    println!("Framing:");
    let current = Framing::ALL
        .iter()
        .position(|f| *f == wizard.draft().framing)
        .unwrap_or(0);
    match choose(&Framing::ALL, |f| f.label().to_string(), current)? {
        Choice::Retry => Ok(true),
        Choice::Quit => Ok(false),
        Choice::Back => back(wizard),
        Choice::Pick(i) => {
            wizard.set_framing(Framing::ALL[i])?;
            advance(wizard)
        }
    }
}

fn emotion(wizard: &mut Wizard<GeminiClient>) -> Result<bool> {
    let current = Emotion::ALL
        .iter()
        .position(|e| *e == wizard.draft().emotion)
        .unwrap_or(0);
    match choose(&Emotion::ALL, |e| e.label().to_string(), current)? {
        Choice::Retry => Ok(true),
        Choice::Quit => Ok(false),
        Choice::Back => back(wizard),
        Choice::Pick(i) => {
            wizard.set_emotion(Emotion::ALL[i])?;
            advance(wizard)
        }
    }
}

fn title(wizard: &mut Wizard<GeminiClient>) -> Result<bool> {
    println!("Current: {}", wizard.draft().overlay_text.replace('\n', " / "));
    match ask_step("Title (use \\n for a line break, Enter keeps it)")? {
        Answer::Quit => Ok(false),
        Answer::Back => back(wizard),
        Answer::Value(text) => {
            if !text.is_empty() {
                wizard.set_overlay_text(&text.replace("\\n", "\n"))?;
            }
            advance(wizard)
        }
    }
}

async fn theme(studio: &ThumbMaster, wizard: &mut Wizard<GeminiClient>) -> Result<bool> {
    println!("Accent light:");
    let presets = AccentColor::PRESETS.map(|(_, c)| c);
    let current = presets
        .iter()
        .position(|c| *c == wizard.draft().accent_color)
        .unwrap_or(0);
    let label = |c: AccentColor| {
        let name = AccentColor::PRESETS
            .iter()
            .find(|(_, p)| *p == c)
            .map_or("", |(n, _)| *n);
        format!("{name} {}", c.hex())
    };
    match choose(&presets, label, current)? {
        Choice::Retry => return Ok(true),
        Choice::Quit => return Ok(false),
        Choice::Back => return back(wizard),
        Choice::Pick(i) => wizard.set_accent_color(presets[i])?,
    }

    match ask_step("Scene theme (e.g. 'volcano eruption at night')")? {
        Answer::Quit => return Ok(false),
        Answer::Back => return back(wizard),
        Answer::Value(theme) if theme.is_empty() && !wizard.draft().has_theme() => {
            println!("Describe a scene to continue.");
            return Ok(true);
        }
        Answer::Value(theme) if theme.is_empty() => {}
        Answer::Value(theme) => wizard.set_theme(&theme)?,
    }

    let cancel = CancelToken::new();
    let busy = Busy::start("Generating thumbnails...", &cancel);
    let outcome = wizard
        .generate(&cancel, |p| {
            busy.set_message(format!("Generating thumbnails... {}%", p.percent()))
        })
        .await;
    busy.finish();

    if let Err(e) = outcome {
        println!("{e}\n{}", e.guidance());
        forget_rejected_key(studio, &e);
    }
    Ok(true)
}

/// A key the service rejected must not be offered again by the prompt.
fn forget_rejected_key(studio: &ThumbMaster, error: &AppError) {
    if matches!(error, AppError::InvalidCredential(_)) {
        studio.credentials().clear();
    }
}

fn print_results(wizard: &Wizard<GeminiClient>) -> Result<()> {
    for (i, r) in wizard.results()?.iter().enumerate() {
        let p = &r.params;
        println!(
            "  {}. [{}] {:?}{}",
            i + 1,
            r.id,
            r.overlay_text,
            if r.refining { " (refining)" } else { "" }
        );
        println!(
            "     size={} x={} y={} rotation={} zoom={} presenter-x={} presenter-y={}",
            p.text_size, p.text_x, p.text_y, p.text_rotation, p.presenter_zoom, p.presenter_x, p.presenter_y
        );
        if !r.suggestion.is_empty() {
            println!("     suggestion: {}", r.suggestion);
        }
    }
    Ok(())
}

const REVIEW_HELP: &str = "\
Commands:
  list                     show the results
  set <n> <key>=<value>    text, size, x, y, rotation, zoom, presenter-x, presenter-y, suggestion
  refine <n>               improve image n with its suggestion
  save <n>                 export image n as PNG
  zip [suffix]             export every image in one archive
  back | reset | quit";

/// Splits a review line into the command and everything after it.
fn split_command(line: &str) -> (&str, &str) {
    let line = line.trim();
    match line.split_once(char::is_whitespace) {
        Some((command, tail)) => (command, tail.trim()),
        None => (line, ""),
    }
}

/// Parses a 1-based slot number.
fn slot(arg: Option<&str>) -> Option<usize> {
    arg.and_then(|s| s.parse::<usize>().ok())
        .filter(|n| *n >= 1)
        .map(|n| n - 1)
}

async fn review(studio: &ThumbMaster, wizard: &mut Wizard<GeminiClient>, out_dir: &Path) -> Result<bool> {
    print_results(wizard)?;
    println!("{REVIEW_HELP}");
    let exporter = studio.exporter();

    loop {
        let Some(line) = ask(">")? else {
            return Ok(false);
        };
        let (command, tail) = split_command(&line);
        let (arg, rest) = match split_command(tail) {
            ("", _) => (None, None),
            (arg, "") => (Some(arg), None),
            (arg, rest) => (Some(arg), Some(rest)),
        };

        let outcome: thumbmaster_core::Result<()> = match command {
            "" => continue,
            "help" => {
                println!("{REVIEW_HELP}");
                Ok(())
            }
            "list" => {
                print_results(wizard)?;
                Ok(())
            }
            "quit" => return Ok(false),
            "back" => return back(wizard),
            "reset" => {
                wizard.reset();
                return Ok(true);
            }
            "set" => match (slot(arg), rest) {
                (Some(n), Some(assignment)) => SlotUpdate::parse_assignment(assignment)
                    .and_then(|update| wizard.update_slot(n, &update)),
                _ => Err(AppError::config("usage: set <n> <key>=<value>")),
            },
            "refine" => match slot(arg) {
                Some(n) => {
                    let cancel = CancelToken::new();
                    let busy = Busy::start(format!("Refining image {}...", n + 1), &cancel);
                    let outcome = wizard.refine_slot(n, &cancel).await;
                    busy.finish();
                    outcome
                }
                None => Err(AppError::config("usage: refine <n>")),
            },
            "save" => match slot(arg) {
                Some(n) => {
                    let cancel = CancelToken::new();
                    let busy = Busy::start("Rendering...", &cancel);
                    let file = match wizard.results()?.get(n) {
                        Some(result) => exporter.export_one(result, &cancel).await,
                        None => Err(AppError::SlotNotFound(n)),
                    };
                    busy.finish();
                    file.and_then(|f| f.write_into(out_dir))
                        .map(|path| println!("Saved {}", path.display()))
                }
                None => Err(AppError::config("usage: save <n>")),
            },
            "zip" => {
                let cancel = CancelToken::new();
                let busy = Busy::start("Building archive...", &cancel);
                let file = exporter.export_all(wizard.results()?, tail, &cancel).await;
                busy.finish();
                file.and_then(|f| f.write_into(out_dir))
                    .map(|path| println!("Saved {}", path.display()))
            }
            other => Err(AppError::config(format!("unknown command '{other}', try 'help'"))),
        };

        match outcome {
            Ok(()) => {}
            Err(e) if e.is_credential() => {
                println!("{e}\n{}", e.guidance());
                forget_rejected_key(studio, &e);
                return Ok(true);
            }
            Err(e) => println!("{e}"),
        }
    }
}
