//! Answering password requests from the terminal

use std::collections::{HashMap, HashSet};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

/// Parse a `NAME=PASSWORD` argument
pub fn parse_preset(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((name, password)) if !name.is_empty() => {
            Ok((name.to_string(), password.to_string()))
        }
        _ => Err(format!("expected NAME=PASSWORD, got '{}'", arg)),
    }
}

/// Supplies passwords, first from presets given on the command line, then
/// by reading lines from `input`. An empty line or end of input cancels.
pub struct PasswordPrompt<R> {
    presets: HashMap<String, String>,
    tried: HashSet<String>,
    lines: Lines<R>,
}

impl<R: AsyncBufRead + Unpin> PasswordPrompt<R> {
    pub fn new(presets: impl IntoIterator<Item = (String, String)>, input: R) -> Self {
        Self {
            presets: presets.into_iter().collect(),
            tried: HashSet::new(),
            lines: input.lines(),
        }
    }

    /// Password for `file_name`, or `None` to cancel
    pub async fn ask(
        &mut self,
        file_name: &str,
        attempt_failed: bool,
    ) -> std::io::Result<Option<String>> {
        // Each preset is offered once; a rejected preset falls back to the terminal
        if let Some(password) = self.presets.get(file_name) {
            if self.tried.insert(file_name.to_string()) {
                log::info!("Using supplied password for {}", file_name);
                return Ok(Some(password.clone()));
            }
        }

        if attempt_failed {
            eprintln!("Incorrect password for {}.", file_name);
        }
        eprint!("Password for {} (empty to cancel): ", file_name);

        match self.lines.next_line().await? {
            Some(line) => {
                let password = line.trim_end_matches('\r');
                Ok((!password.is_empty()).then(|| password.to_string()))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_parsed() {
        assert_eq!(
            parse_preset("secret.pdf=12=34"),
            Ok(("secret.pdf".to_string(), "12=34".to_string()))
        );
        assert!(parse_preset("no-separator").is_err());
        assert!(parse_preset("=1234").is_err());
    }

    #[tokio::test]
    async fn preset_then_terminal() {
        let presets = vec![("secret.pdf".to_string(), "0000".to_string())];
        let mut prompt = PasswordPrompt::new(presets, &b"1234\n\n"[..]);

        assert_eq!(
            prompt.ask("secret.pdf", false).await.unwrap().as_deref(),
            Some("0000")
        );
        // The preset was rejected; read from input instead
        assert_eq!(
            prompt.ask("secret.pdf", true).await.unwrap().as_deref(),
            Some("1234")
        );
        // Empty line cancels
        assert_eq!(prompt.ask("other.pdf", false).await.unwrap(), None);
        // So does end of input
        assert_eq!(prompt.ask("other.pdf", false).await.unwrap(), None);
    }
}
