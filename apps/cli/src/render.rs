//! Terminal rendering of workflow screens and history listings.

use std::{
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{Local, TimeZone};
use shared::domain::{History, HistoryItem, ImageArtifact, Style};
use workflow::Screen;

/// What the caller should do after a screen was shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    Selection { error: Option<String> },
    Loading,
    Result { saved_to: PathBuf },
}

pub fn render_screen(screen: Screen<'_>, out: &Path) -> Result<Rendered> {
    match screen {
        Screen::Selecting { error, .. } => {
            if let Some(error) = error {
                eprintln!("Error: {error}");
            }
            Ok(Rendered::Selection {
                error: error.map(str::to_string),
            })
        }
        Screen::Loading { style } => {
            println!("{}", loading_line(style));
            Ok(Rendered::Loading)
        }
        Screen::Result {
            user_image,
            generated_image,
            generated_caption,
            style,
        } => {
            let saved_to = save_artifact(generated_image, out)?;
            let source = user_image.file_name.as_deref().unwrap_or("your image");
            match style {
                Some(style) => println!("{source} as {}:", style.label),
                None => println!("{source}:"),
            }
            println!("  \"{generated_caption}\"");
            println!("  saved to {}", saved_to.display());
            Ok(Rendered::Result { saved_to })
        }
    }
}

pub fn loading_line(style: &Style) -> String {
    format!("Transforming into {}...", style.label)
}

/// Writes the artifact to `out`, adding the artifact's extension when `out`
/// has none.
pub fn save_artifact(artifact: &ImageArtifact, out: &Path) -> Result<PathBuf> {
    let path = if out.extension().is_some() {
        out.to_path_buf()
    } else {
        out.with_extension(artifact.file_extension())
    };
    let bytes = artifact
        .decode_bytes()
        .context("generated image is not valid base64")?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create '{}'", parent.display()))?;
    }
    std::fs::write(&path, bytes)
        .with_context(|| format!("failed to write '{}'", path.display()))?;
    Ok(path)
}

pub fn print_styles(styles: &[Style]) {
    let width = styles.iter().map(|s| s.id.len()).max().unwrap_or(0);
    for style in styles {
        println!("{:<width$}  {}", style.id, style.label);
    }
}

pub fn print_history(history: &History) {
    if history.is_empty() {
        println!("No creations yet.");
        return;
    }
    for item in history {
        println!("{}", history_line(item));
    }
}

pub fn history_line(item: &HistoryItem) -> String {
    history_line_in(item, &Local)
}

/// `history_line` with the creation time shown in `zone`.
pub fn history_line_in<Tz>(item: &HistoryItem, zone: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let created = item
        .created_at()
        .map(|at| at.with_timezone(zone).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "unknown time".to_string());
    format!(
        "{}  {}  {:<12}  {}",
        item.id, created, item.style.label, item.generated_caption
    )
}

/// Asks on stdin; anything but an explicit yes declines.
pub fn confirm(question: &str) -> Result<bool> {
    let stdin = io::stdin();
    confirm_with(question, &mut stdin.lock(), &mut io::stdout())
}

pub fn confirm_with(
    question: &str,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> Result<bool> {
    write!(output, "{question} [y/N] ")?;
    output.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::domain::{HistoryItemId, UserImage};

    fn item() -> HistoryItem {
        HistoryItem {
            id: HistoryItemId::from_timestamp(1_700_000_000_000),
            user_image: UserImage::from_bytes(Some("me.png".into()), "image/png", b"me"),
            generated_image: ImageArtifact::from_bytes("image/png", b"png-bytes"),
            generated_caption: "Soft light".into(),
            style: shared::catalog::find_style("watercolor").expect("style"),
            timestamp: 1_700_000_000_000,
        }
    }

    #[test]
    fn confirmation_requires_explicit_yes() {
        let answers = [
            ("y\n", true),
            ("YES\n", true),
            ("\n", false),
            ("nope\n", false),
        ];
        for (answer, expected) in answers {
            let mut output = Vec::new();
            let confirmed =
                confirm_with("Clear?", &mut answer.as_bytes(), &mut output).expect("prompt");
            assert_eq!(confirmed, expected, "answer {answer:?}");
            assert_eq!(String::from_utf8(output).expect("utf8"), "Clear? [y/N] ");
        }
    }

    #[test]
    fn result_screen_saves_artifact_with_extension() {
        let dir = tempfile::tempdir().expect("tempdir");
        let entry = item();
        let screen = Screen::Result {
            user_image: &entry.user_image,
            generated_image: &entry.generated_image,
            generated_caption: &entry.generated_caption,
            style: Some(&entry.style),
        };

        let rendered = render_screen(screen, &dir.path().join("out")).expect("render");
        let Rendered::Result { saved_to } = rendered else {
            panic!("expected result");
        };
        assert_eq!(saved_to, dir.path().join("out.png"));
        assert_eq!(std::fs::read(saved_to).expect("read"), b"png-bytes");
    }

    #[test]
    fn selection_screen_reports_error() {
        let rendered = render_screen(
            Screen::Selecting {
                user_image: None,
                error: Some("quota exceeded"),
            },
            Path::new("unused"),
        )
        .expect("render");
        assert_eq!(
            rendered,
            Rendered::Selection {
                error: Some("quota exceeded".into())
            }
        );
    }

    #[test]
    fn loading_screen_names_the_style() {
        let entry = item();
        let rendered = render_screen(
            Screen::Loading {
                style: &entry.style,
            },
            Path::new("unused"),
        )
        .expect("render");
        assert_eq!(rendered, Rendered::Loading);
        assert_eq!(loading_line(&entry.style), "Transforming into Watercolor...");
    }

    #[test]
    fn history_line_converts_to_the_given_zone() {
        let utc = history_line_in(&item(), &chrono::Utc);
        assert!(utc.starts_with("1700000000000  2023-11-14 22:13"));

        let tokyo = chrono::FixedOffset::east_opt(9 * 3600).expect("offset");
        let shifted = history_line_in(&item(), &tokyo);
        assert!(shifted.starts_with("1700000000000  2023-11-15 07:13"));
    }

    #[test]
    fn history_line_shows_id_style_and_caption() {
        let line = history_line(&item());
        assert!(line.starts_with("1700000000000  "));
        assert!(line.contains("Watercolor"));
        assert!(line.ends_with("Soft light"));
    }
}
