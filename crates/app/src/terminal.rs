//! Line-oriented terminal front end.
//!
//! Each input line is one command. Commands are translated into the same
//! intents a touch UI would send, and the screen is re-rendered whenever the
//! store reports a change or the limit notification is dismissed.

use std::io::{self, BufRead, Write};
use std::string::FromUtf8Error;

use anyhow::Context;
use thiserror::Error;

use pocketshop_core::{DomainError, ProductId};

use crate::manager::{Feedback, Intent, ProductManager};
use crate::view::ManagerView;

pub const HELP: &str = "\
commands:
  add <name> <price> <photo>         add a product
  edit <id> <name> <price> <photo>   change a product
  delete <id>                        delete a product (asks for confirmation)
  dismiss                            hide the limit notification
  list                               show all products
  json                               dump the product list as JSON
  help                               show this help
  quit                               leave
words containing spaces can be wrapped in double quotes";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("unterminated quote")]
    UnterminatedQuote,

    #[error("input is not valid UTF-8")]
    NotUtf8,

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("unknown command {0:?}; type `help`")]
    Unknown(String),

    #[error(transparent)]
    InvalidId(#[from] DomainError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add {
        name: String,
        price: String,
        photo: String,
    },
    Edit {
        id: ProductId,
        name: String,
        price: String,
        photo: String,
    },
    Delete(ProductId),
    Dismiss,
    List,
    Json,
    Help,
    Quit,
}

impl Command {
    /// Parse one input line; blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let words = split_words(line)?;
        let Some((head, args)) = words.split_first() else {
            return Ok(None);
        };

        let cmd = match (head.to_ascii_lowercase().as_str(), args) {
            ("add", [name, price, photo]) => Command::Add {
                name: name.clone(),
                price: price.clone(),
                photo: photo.clone(),
            },
            ("add", _) => return Err(CommandError::Usage("add <name> <price> <photo>")),
            ("edit", [id, name, price, photo]) => Command::Edit {
                id: id.parse()?,
                name: name.clone(),
                price: price.clone(),
                photo: photo.clone(),
            },
            ("edit", _) => return Err(CommandError::Usage("edit <id> <name> <price> <photo>")),
            ("delete" | "rm", [id]) => Command::Delete(id.parse()?),
            ("delete" | "rm", _) => return Err(CommandError::Usage("delete <id>")),
            ("dismiss", []) => Command::Dismiss,
            ("list" | "ls", []) => Command::List,
            ("json", []) => Command::Json,
            ("help" | "?", _) => Command::Help,
            ("quit" | "exit", _) => Command::Quit,
            (other, _) => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(Some(cmd))
    }
}

/// Split on whitespace, keeping double-quoted runs together.
pub fn split_words(line: &str) -> Result<Vec<String>, CommandError> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quoted = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                quoted = !quoted;
                in_word = true;
            }
            c if c.is_whitespace() && !quoted => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if quoted {
        return Err(CommandError::UnterminatedQuote);
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

/// Plain-text rendering of a view snapshot.
pub fn render_text(view: &ManagerView) -> String {
    let mut out = String::new();
    let add_hint = if view.add_enabled { "" } else { "  [full]" };
    out.push_str(&format!("{} ({}){}\n", view.title, view.subtitle, add_hint));

    if let Some(note) = &view.notification {
        out.push_str(&format!("! {} {}\n", note.title, note.text));
    }

    if let Some(stats) = &view.stats {
        out.push_str(&format!(
            "  Products: {}   Total Value: {}\n",
            stats.count, stats.total_value
        ));
    }

    if let Some(empty) = &view.empty_state {
        out.push_str(&format!("  {}\n  {}\n", empty.title, empty.text));
    }

    for card in &view.cards {
        out.push_str(&format!(
            "  [{}] {}  {}  {}  {}\n",
            card.id, card.name, card.price, card.added, card.photo
        ));
    }

    if let Some(form) = &view.form {
        out.push_str(&format!("  {} form:\n", form.title));
        for (field, message) in form.errors.iter() {
            out.push_str(&format!("    {field}: {message}\n"));
        }
    }

    if let Some(confirmation) = &view.confirmation {
        out.push_str(&format!("  {}: {}\n", confirmation.title, confirmation.prompt));
    }

    out
}

/// Drive a manager from line input until EOF or `quit`.
pub fn run<R: BufRead, W: Write>(
    manager: &mut ProductManager,
    mut input: R,
    mut output: W,
) -> anyhow::Result<()> {
    let changes = manager.subscribe();

    write!(output, "{}", render_text(&manager.render())).context("failed to write screen")?;

    while let Some(line) = next_line(&mut input).context("failed to read input")? {
        let line = match line {
            Ok(line) => line,
            Err(_) => {
                writeln!(output, "error: {}", CommandError::NotUtf8)?;
                continue;
            }
        };
        manager.dispatch(Intent::Tick);

        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                writeln!(output, "error: {err}")?;
                continue;
            }
        };
        tracing::debug!(?command, "terminal command");

        match command {
            Command::Quit => break,
            Command::Help => writeln!(output, "{HELP}")?,
            Command::List => {
                write!(output, "{}", render_text(&manager.render()))?;
                continue;
            }
            Command::Json => {
                let json = serde_json::to_string_pretty(&manager.store().snapshot())
                    .context("failed to serialize products")?;
                writeln!(output, "{json}")?;
            }
            Command::Dismiss => {
                if manager.dispatch(Intent::DismissNotification) == Feedback::NotificationDismissed {
                    write!(output, "{}", render_text(&manager.render()))?;
                }
            }
            Command::Add { name, price, photo } => {
                let feedback = match manager.dispatch(Intent::RequestAdd) {
                    Feedback::FormOpened => fill_and_submit(manager, name, price, photo),
                    other => other,
                };
                report(&mut output, manager, &feedback)?;
            }
            Command::Edit {
                id,
                name,
                price,
                photo,
            } => {
                let feedback = match manager.dispatch(Intent::Edit(id)) {
                    Feedback::FormOpened => fill_and_submit(manager, name, price, photo),
                    _ => {
                        writeln!(output, "no product with id {id}")?;
                        continue;
                    }
                };
                report(&mut output, manager, &feedback)?;
            }
            Command::Delete(id) => {
                let Feedback::ConfirmationRequested(_) = manager.dispatch(Intent::RequestDelete(id))
                else {
                    writeln!(output, "no product with id {id}")?;
                    continue;
                };
                if let Some(confirmation) = manager.render().confirmation {
                    write!(output, "{} [y/N] ", confirmation.prompt)?;
                    output.flush()?;
                }
                let answer = next_line(&mut input)
                    .context("failed to read input")?
                    .and_then(Result::ok);
                let confirmed = matches!(
                    answer.as_deref().map(str::trim),
                    Some("y" | "Y" | "yes" | "Yes")
                );
                let intent = if confirmed {
                    Intent::ConfirmDelete
                } else {
                    Intent::CancelDelete
                };
                let feedback = manager.dispatch(intent);
                report(&mut output, manager, &feedback)?;
            }
        }

        if !changes.drain().is_empty() {
            write!(output, "{}", render_text(&manager.render()))?;
        }
    }

    Ok(())
}

/// Next line without its terminator; `Ok(None)` at end of input.
///
/// Undecodable bytes only spoil their own line, never the rest of the stream.
fn next_line<R: BufRead>(input: &mut R) -> io::Result<Option<Result<String, FromUtf8Error>>> {
    let mut buf = Vec::new();
    if input.read_until(b'\n', &mut buf)? == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
    Ok(Some(String::from_utf8(buf)))
}

fn fill_and_submit(
    manager: &mut ProductManager,
    name: String,
    price: String,
    photo: String,
) -> Feedback {
    manager.dispatch(Intent::SetName(name));
    manager.dispatch(Intent::SetPrice(price));
    manager.dispatch(Intent::SetPhoto(Some(photo)));
    let feedback = manager.dispatch(Intent::Submit);
    if let Feedback::Invalid(_) = feedback {
        // No way to keep editing on a single line; drop the draft.
        manager.dispatch(Intent::Cancel);
    }
    feedback
}

fn report<W: Write>(
    output: &mut W,
    manager: &ProductManager,
    feedback: &Feedback,
) -> anyhow::Result<()> {
    match feedback {
        Feedback::Added(p) => writeln!(output, "added [{}] {}", p.id(), p.name())?,
        Feedback::Updated(p) => writeln!(output, "updated [{}] {}", p.id(), p.name())?,
        Feedback::Removed(p) => writeln!(output, "deleted [{}] {}", p.id(), p.name())?,
        Feedback::DeleteCancelled => writeln!(output, "kept")?,
        Feedback::Invalid(errors) => {
            for (field, message) in errors.iter() {
                writeln!(output, "  {field}: {message}")?;
            }
        }
        Feedback::LimitReached => {
            if let Some(note) = manager.render().notification {
                writeln!(output, "! {} {}", note.title, note.text)?;
            }
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_words_honours_quotes() {
        let words = split_words(r#"add "Desk Lamp" 19.99 file:///a.jpg"#).unwrap();
        assert_eq!(words, vec!["add", "Desk Lamp", "19.99", "file:///a.jpg"]);
    }

    #[test]
    fn split_words_keeps_empty_quoted_word() {
        let words = split_words(r#"add "" 1 img://1"#).unwrap();
        assert_eq!(words, vec!["add", "", "1", "img://1"]);
    }

    #[test]
    fn split_words_rejects_unterminated_quote() {
        assert_eq!(
            split_words(r#"add "Desk Lamp 1 x"#),
            Err(CommandError::UnterminatedQuote)
        );
    }

    #[test]
    fn next_line_strips_terminators_and_flags_bad_bytes() {
        let mut input = io::Cursor::new(b"list\r\n\xff\xfe\nquit".to_vec());
        assert_eq!(next_line(&mut input).unwrap(), Some(Ok("list".to_string())));
        assert!(matches!(next_line(&mut input).unwrap(), Some(Err(_))));
        assert_eq!(next_line(&mut input).unwrap(), Some(Ok("quit".to_string())));
        assert_eq!(next_line(&mut input).unwrap(), None);
    }

    #[test]
    fn parse_add_and_edit() {
        assert_eq!(
            Command::parse("add Widget 9.99 img://1").unwrap(),
            Some(Command::Add {
                name: "Widget".to_string(),
                price: "9.99".to_string(),
                photo: "img://1".to_string(),
            })
        );
        assert_eq!(
            Command::parse("EDIT 3 Widget 1 img://1").unwrap(),
            Some(Command::Edit {
                id: ProductId::from_raw(3),
                name: "Widget".to_string(),
                price: "1".to_string(),
                photo: "img://1".to_string(),
            })
        );
    }

    #[test]
    fn parse_reports_usage_and_bad_ids() {
        assert_eq!(
            Command::parse("add Widget"),
            Err(CommandError::Usage("add <name> <price> <photo>"))
        );
        assert!(matches!(
            Command::parse("delete x"),
            Err(CommandError::InvalidId(DomainError::InvalidId(_)))
        ));
        assert_eq!(
            Command::parse("frobnicate"),
            Err(CommandError::Unknown("frobnicate".to_string()))
        );
        assert_eq!(Command::parse("   ").unwrap(), None);
    }
}
