use std::io::{BufRead, Write};

use volley::args::{PositiveU64, PositiveUsize, VolleyArgs};
use volley::error::{AppError, AppResult, ValidationError};

const URL_PROMPT: &str = "Enter target URL (e.g., https://target.example.com): ";
const WORKERS_PROMPT: &str = "Enter the number of workers (e.g., 64): ";
const REQUESTS_PROMPT: &str = "Enter the number of requests per worker (e.g., 10000): ";

/// Asks for the run parameters that neither the command line nor the config
/// file provided.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub const fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// # Errors
    ///
    /// Returns an error when input ends before an answer is given, or an
    /// answer is not a positive number.
    pub fn fill_missing(&mut self, args: &mut VolleyArgs) -> AppResult<()> {
        if args.url.is_none() {
            let url = self
                .ask(URL_PROMPT)?
                .ok_or_else(|| AppError::validation(ValidationError::MissingUrl))?;
            args.url = Some(url);
        }
        if args.workers.is_none() {
            let answer = self.ask(WORKERS_PROMPT)?.ok_or_else(|| {
                AppError::validation(ValidationError::MissingValue { field: "workers" })
            })?;
            args.workers = Some(answer.parse::<PositiveUsize>()?);
        }
        if args.requests.is_none() {
            let answer = self.ask(REQUESTS_PROMPT)?.ok_or_else(|| {
                AppError::validation(ValidationError::MissingValue { field: "requests" })
            })?;
            args.requests = Some(answer.parse::<PositiveU64>()?);
        }
        Ok(())
    }

    fn ask(&mut self, prompt: &str) -> AppResult<Option<String>> {
        self.output.write_all(prompt.as_bytes())?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let answer = line.trim();
        if answer.is_empty() {
            return Ok(None);
        }
        Ok(Some(answer.to_owned()))
    }
}

/// Fails on the first value a prompt would have asked for.
///
/// # Errors
///
/// Returns the validation error naming the missing value.
pub fn require_present(args: &VolleyArgs) -> AppResult<()> {
    if args.url.is_none() {
        return Err(AppError::validation(ValidationError::MissingUrl));
    }
    if args.workers.is_none() {
        return Err(AppError::validation(ValidationError::MissingValue {
            field: "workers",
        }));
    }
    if args.requests.is_none() {
        return Err(AppError::validation(ValidationError::MissingValue {
            field: "requests",
        }));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Cursor;

    fn parse(argv: &[&str]) -> Result<VolleyArgs, String> {
        VolleyArgs::try_parse_from(argv).map_err(|err| err.to_string())
    }

    #[test]
    fn prompts_only_for_missing_values() -> Result<(), String> {
        let mut args = parse(&["volley", "-w", "4"])?;
        let input = Cursor::new("http://localhost:8080\n25\n");
        let mut output = Vec::new();
        Prompter::new(input, &mut output)
            .fill_missing(&mut args)
            .map_err(|err| err.to_string())?;

        if args.url.as_deref() != Some("http://localhost:8080") {
            return Err(format!("Unexpected url: {:?}", args.url));
        }
        if args.workers.map(|value| value.get()) != Some(4) {
            return Err("Workers should come from the CLI".to_owned());
        }
        if args.requests.map(|value| value.get()) != Some(25) {
            return Err("Requests should come from the prompt".to_owned());
        }
        let shown = String::from_utf8(output).map_err(|err| err.to_string())?;
        if shown.contains(WORKERS_PROMPT) || !shown.contains(REQUESTS_PROMPT) {
            return Err(format!("Unexpected prompts: {}", shown));
        }
        Ok(())
    }

    #[test]
    fn rejects_non_numeric_and_zero_answers() -> Result<(), String> {
        for answers in ["http://x.test\nmany\n", "http://x.test\n0\n"] {
            let mut args = parse(&["volley", "-n", "1"])?;
            let result = Prompter::new(Cursor::new(answers), Vec::new()).fill_missing(&mut args);
            if result.is_ok() {
                return Err(format!("Expected rejection for {:?}", answers));
            }
        }
        Ok(())
    }

    #[test]
    fn end_of_input_is_a_missing_value() -> Result<(), String> {
        let mut args = parse(&["volley"])?;
        let result = Prompter::new(Cursor::new(""), Vec::new()).fill_missing(&mut args);
        match result {
            Err(AppError::Validation(ValidationError::MissingUrl)) => Ok(()),
            other => Err(format!("Expected missing url, got {:?}", other)),
        }
    }

    #[test]
    fn require_present_names_first_missing_value() -> Result<(), String> {
        let args = parse(&["volley", "-u", "http://x.test"])?;
        match require_present(&args) {
            Err(AppError::Validation(ValidationError::MissingValue { field: "workers" })) => {
                Ok(())
            }
            other => Err(format!("Unexpected result: {:?}", other)),
        }
    }
}
