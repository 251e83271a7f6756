use std::io::BufRead;

use anyhow::Result;
use log::warn;

use crate::view::{DecodeEventError, NativeEvent};

/// One step of the sample host's script
#[derive(Clone, Debug, PartialEq)]
pub enum SampleCommand {
    /// Renderer reports a page change
    Page { position: i32, total: i32 },
    /// Renderer reports a failed load
    Fail(Option<String>),
    /// Raw native event, decoded from its name and JSON payload
    Native(NativeEvent),
    /// Flip `single_page`
    SinglePage,
    Zoom(f32),
    /// Switch to another document, or to none
    Source(Option<String>),
    /// Show or hide the view
    Toggle,
    Retry,
    Quit,
}

#[derive(Debug, thiserror::Error)]
pub enum ParseCommandError {
    #[error("unknown command {0:?}")]
    Unknown(String),

    #[error("{command} needs {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("{argument} must be a number, got {value:?}")]
    InvalidNumber {
        argument: &'static str,
        value: String,
    },

    #[error(transparent)]
    Event(#[from] DecodeEventError),
}

impl SampleCommand {
    /// Parse one script line; blank lines and `#` comments yield `None`
    pub fn parse(line: &str) -> Result<Option<Self>, ParseCommandError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let rest = (!rest.is_empty()).then(|| rest.to_string());

        let command = match word {
            "page" => {
                let mut args = line.split_whitespace().skip(1);
                let position = number(args.next(), "page", "position")?;
                let total = number(args.next(), "page", "total")?;
                SampleCommand::Page { position, total }
            }
            "fail" => SampleCommand::Fail(rest),
            "event" => {
                let Some(rest) = rest else {
                    return Err(ParseCommandError::MissingArgument {
                        command: "event",
                        argument: "a name",
                    });
                };
                let (name, payload) = match rest.split_once(char::is_whitespace) {
                    Some((name, payload)) => (name.to_string(), payload.trim().to_string()),
                    None => (rest, String::new()),
                };
                SampleCommand::Native(NativeEvent::decode(&name, &payload)?)
            }
            "single-page" => SampleCommand::SinglePage,
            "zoom" => SampleCommand::Zoom(number(rest.as_deref(), "zoom", "factor")?),
            "source" => SampleCommand::Source(rest),
            "toggle" => SampleCommand::Toggle,
            "retry" => SampleCommand::Retry,
            "quit" | "q" => SampleCommand::Quit,
            other => return Err(ParseCommandError::Unknown(other.to_string())),
        };
        Ok(Some(command))
    }
}

fn number<T: std::str::FromStr>(
    value: Option<&str>,
    command: &'static str,
    argument: &'static str,
) -> Result<T, ParseCommandError> {
    let value = value.ok_or(ParseCommandError::MissingArgument { command, argument })?;
    value
        .parse()
        .map_err(|_| ParseCommandError::InvalidNumber {
            argument,
            value: value.to_string(),
        })
}

/// Trait for abstracting command sources to enable testing
pub trait CommandSource {
    /// Next command, or `None` once the source is exhausted
    fn read(&mut self) -> Result<Option<SampleCommand>>;
}

/// Reads one command per line, e.g. from stdin or a script file
pub struct LineCommandSource<R: BufRead> {
    reader: R,
    line: String,
    line_number: usize,
}

impl<R: BufRead> LineCommandSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            line_number: 0,
        }
    }
}

impl<R: BufRead> CommandSource for LineCommandSource<R> {
    fn read(&mut self) -> Result<Option<SampleCommand>> {
        loop {
            self.line.clear();
            if self.reader.read_line(&mut self.line)? == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            match SampleCommand::parse(&self.line) {
                Ok(Some(command)) => return Ok(Some(command)),
                Ok(None) => {}
                Err(e) => warn!("Skipping line {}: {e}", self.line_number),
            }
        }
    }
}

/// Simulated command source for testing
pub struct SimulatedCommandSource {
    pub(crate) commands: Vec<SampleCommand>,
    current_index: usize,
}

impl SimulatedCommandSource {
    pub fn new(commands: Vec<SampleCommand>) -> Self {
        Self {
            commands,
            current_index: 0,
        }
    }

    /// Build from script text, failing on the first malformed line
    pub fn from_script(script: &str) -> Result<Self, ParseCommandError> {
        let mut commands = Vec::new();
        for line in script.lines() {
            if let Some(command) = SampleCommand::parse(line)? {
                commands.push(command);
            }
        }
        Ok(Self::new(commands))
    }

    pub fn remaining(&self) -> usize {
        self.commands.len() - self.current_index
    }
}

impl CommandSource for SimulatedCommandSource {
    fn read(&mut self) -> Result<Option<SampleCommand>> {
        let command = self.commands.get(self.current_index).cloned();
        if command.is_some() {
            self.current_index += 1;
        }
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::view::PageChangePayload;

    #[test]
    fn parses_every_command() {
        let parse = |line| SampleCommand::parse(line).unwrap().unwrap();

        assert_eq!(
            parse("page 3 10"),
            SampleCommand::Page {
                position: 3,
                total: 10
            }
        );
        assert_eq!(parse("fail"), SampleCommand::Fail(None));
        assert_eq!(
            parse("fail  bad xref table "),
            SampleCommand::Fail(Some("bad xref table".to_string()))
        );
        assert_eq!(parse("single-page"), SampleCommand::SinglePage);
        assert_eq!(parse("zoom 2.5"), SampleCommand::Zoom(2.5));
        assert_eq!(
            parse("source /tmp/b.pdf"),
            SampleCommand::Source(Some("/tmp/b.pdf".to_string()))
        );
        assert_eq!(parse("source"), SampleCommand::Source(None));
        assert_eq!(parse("toggle"), SampleCommand::Toggle);
        assert_eq!(parse("retry"), SampleCommand::Retry);
        assert_eq!(parse("q"), SampleCommand::Quit);
    }

    #[test]
    fn parses_raw_native_events() {
        let command = SampleCommand::parse(r#"event onPageChange {"position": 1, "total": 2}"#)
            .unwrap()
            .unwrap();

        assert_eq!(
            command,
            SampleCommand::Native(NativeEvent::PageChange(PageChangePayload {
                position: 1,
                total: 2
            }))
        );
    }

    #[test]
    fn reports_malformed_lines() {
        assert!(matches!(
            SampleCommand::parse("page 3"),
            Err(ParseCommandError::MissingArgument {
                argument: "total",
                ..
            })
        ));
        assert!(matches!(
            SampleCommand::parse("zoom wide"),
            Err(ParseCommandError::InvalidNumber { .. })
        ));
        assert!(matches!(
            SampleCommand::parse("scroll"),
            Err(ParseCommandError::Unknown(_))
        ));
        assert!(matches!(
            SampleCommand::parse("event onScroll {}"),
            Err(ParseCommandError::Event(_))
        ));
        assert!(SampleCommand::parse("  # comment").unwrap().is_none());
    }

    #[test]
    fn line_source_skips_comments_and_bad_lines() {
        let input = "# script\npage 0 4\nbogus\n\ntoggle\n";
        let mut source = LineCommandSource::new(Cursor::new(input));

        assert_eq!(
            source.read().unwrap(),
            Some(SampleCommand::Page {
                position: 0,
                total: 4
            })
        );
        assert_eq!(source.read().unwrap(), Some(SampleCommand::Toggle));
        assert_eq!(source.read().unwrap(), None);
    }

    #[test]
    fn simulated_source_is_exhausted_after_script() {
        let mut source = SimulatedCommandSource::from_script("retry\nquit\n").unwrap();

        assert_eq!(source.remaining(), 2);
        assert_eq!(source.read().unwrap(), Some(SampleCommand::Retry));
        assert_eq!(source.read().unwrap(), Some(SampleCommand::Quit));
        assert_eq!(source.read().unwrap(), None);
        assert_eq!(source.remaining(), 0);
    }
}
