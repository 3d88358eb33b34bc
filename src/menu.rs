//! Interactive console prompts.
//!
//! [`Console`] works over any reader/writer pair so the prompts can be driven
//! from tests as well as from stdin/stdout.

use crate::config::HotkeyBindings;
use crate::coordinates::{CoordinateStore, Point};
use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Record,
    ReplaySaved,
    ReplayManual,
    Exit,
}

impl MenuChoice {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(Self::Record),
            "2" => Some(Self::ReplaySaved),
            "3" => Some(Self::ReplayManual),
            "4" => Some(Self::Exit),
            _ => None,
        }
    }
}

/// Points typed by the user, plus the lines that were rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManualEntry {
    pub coordinates: CoordinateStore,
    pub rejected: Vec<String>,
}

/// Interpret the interval prompt, in seconds.
///
/// Empty input selects `default`; anything unparsable, negative or
/// non-finite also falls back to `default`.
pub fn parse_interval(input: &str, default: Duration) -> Duration {
    let input = input.trim();
    if input.is_empty() {
        return default;
    }

    let parsed = input
        .parse::<f64>()
        .ok()
        .and_then(|seconds| Duration::try_from_secs_f64(seconds).ok());
    match parsed {
        Some(interval) => interval,
        None => {
            warn!(input, ?default, "Invalid interval, using default");
            default
        }
    }
}

pub struct Console<R, W> {
    input: R,
    output: W,
}

impl Console<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print `text` and read one line. `None` means end of input.
    pub fn prompt(&mut self, text: &str) -> io::Result<Option<String>> {
        write!(self.output, "{text}")?;
        self.output.flush()?;
        self.read_line()
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    pub fn print_banner(&mut self) -> io::Result<()> {
        let rule = "=".repeat(50);
        writeln!(self.output, "{rule}")?;
        writeln!(self.output, "{}", "Coordinate Clicker".bold())?;
        writeln!(self.output, "{rule}")
    }

    /// Show the menu until a valid choice is entered. End of input exits.
    pub fn read_choice(&mut self) -> io::Result<MenuChoice> {
        loop {
            writeln!(self.output, "\nChoose an option:")?;
            writeln!(self.output, "1. Record mouse click coordinates")?;
            writeln!(self.output, "2. Replay saved coordinates")?;
            writeln!(self.output, "3. Enter coordinates manually and replay")?;
            writeln!(self.output, "4. Exit")?;

            let Some(line) = self.prompt("\nEnter choice (1-4): ")? else {
                return Ok(MenuChoice::Exit);
            };
            match MenuChoice::parse(&line) {
                Some(choice) => return Ok(choice),
                None => self.error("Invalid option, please try again")?,
            }
        }
    }

    /// Read `x,y` lines until a blank line or end of input.
    pub fn read_points(&mut self) -> io::Result<ManualEntry> {
        writeln!(
            self.output,
            "\nEnter coordinates as x,y, one per line. Finish with an empty line:"
        )?;

        let mut entry = ManualEntry::default();
        while let Some(line) = self.read_line()? {
            if line.is_empty() {
                break;
            }
            match line.parse::<Point>() {
                Ok(point) => {
                    entry.coordinates.push(point);
                    writeln!(self.output, "Added point {point}")?;
                }
                Err(e) => {
                    self.error(&format!("{e}. Use the format x,y"))?;
                    entry.rejected.push(line);
                }
            }
        }
        Ok(entry)
    }

    pub fn read_interval(&mut self, default: Duration) -> io::Result<Duration> {
        let text = format!(
            "\nClick interval in seconds [default {}]: ",
            default.as_secs_f64()
        );
        let line = self.prompt(&text)?.unwrap_or_default();
        Ok(parse_interval(&line, default))
    }

    pub fn confirm(&mut self, question: &str) -> io::Result<bool> {
        let answer = self.prompt(&format!("\n{question} (y/n): "))?;
        Ok(answer.is_some_and(|a| a.eq_ignore_ascii_case("y")))
    }

    pub fn print_points(&mut self, heading: &str, coordinates: &CoordinateStore) -> io::Result<()> {
        writeln!(self.output, "\n{heading} {} point(s):", coordinates.len())?;
        for (i, point) in coordinates.iter().enumerate() {
            writeln!(self.output, "  {}. {point}", i + 1)?;
        }
        Ok(())
    }

    pub fn print_hotkeys(&mut self, bindings: &HotkeyBindings) -> io::Result<()> {
        writeln!(self.output, "\n{}", "=== Hotkeys ===".bold())?;
        for (key, action) in bindings.iter() {
            writeln!(self.output, "{}: {action}", key.to_uppercase().cyan())?;
        }
        writeln!(self.output, "{}\n", "===============".bold())
    }

    pub fn info(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.output, "{}", message.green())
    }

    pub fn error(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.output, "{}", message.red())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn console(input: &str) -> Console<&[u8], Vec<u8>> {
        Console::new(input.as_bytes(), Vec::new())
    }

    #[test]
    fn test_menu_choice_parse() {
        assert_eq!(MenuChoice::parse("1"), Some(MenuChoice::Record));
        assert_eq!(MenuChoice::parse(" 4 "), Some(MenuChoice::Exit));
        assert_eq!(MenuChoice::parse("5"), None);
        assert_eq!(MenuChoice::parse(""), None);
    }

    #[test]
    fn test_read_choice_reprompts() {
        let mut console = console("9\nabc\n2\n");
        assert_eq!(console.read_choice().unwrap(), MenuChoice::ReplaySaved);

        let output = String::from_utf8(console.output).unwrap();
        assert_eq!(output.matches("Invalid option").count(), 2);
    }

    #[test]
    fn test_read_choice_eof_exits() {
        let mut console = console("");
        assert_eq!(console.read_choice().unwrap(), MenuChoice::Exit);
    }

    #[test]
    fn test_read_points_reports_bad_lines() {
        let mut console = console("10,20\nabc\n\n30,40\n");
        let entry = console.read_points().unwrap();

        assert_eq!(entry.coordinates.points(), &[Point::new(10, 20)]);
        assert_eq!(entry.rejected, vec!["abc".to_string()]);
    }

    #[test]
    fn test_read_points_until_eof() {
        let mut console = console("1,2\n 3 , 4 ");
        let entry = console.read_points().unwrap();
        assert_eq!(
            entry.coordinates.points(),
            &[Point::new(1, 2), Point::new(3, 4)]
        );
        assert!(entry.rejected.is_empty());
    }

    #[test]
    fn test_parse_interval() {
        let default = Duration::from_secs(1);

        assert_eq!(parse_interval("", default), default);
        assert_eq!(parse_interval("0.5", default), Duration::from_millis(500));
        assert_eq!(parse_interval("0", default), Duration::ZERO);
        assert_eq!(parse_interval("2", default), Duration::from_secs(2));

        assert_eq!(parse_interval("fast", default), default);
        assert_eq!(parse_interval("-1", default), default);
        assert_eq!(parse_interval("inf", default), default);
        assert_eq!(parse_interval("NaN", default), default);
        assert_eq!(parse_interval("1e30", default), default);
    }

    #[test]
    fn test_confirm() {
        assert!(console("y\n").confirm("Save?").unwrap());
        assert!(console("Y\n").confirm("Save?").unwrap());
        assert!(!console("n\n").confirm("Save?").unwrap());
        assert!(!console("").confirm("Save?").unwrap());
    }
}
