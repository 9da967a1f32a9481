//! Boundary to the external text generator that comments on spending.
//!
//! The core only builds the prompt and relays whatever comes back. Failures
//! are turned into a short inline message and never reach the ledger.

use std::{
    io::{ErrorKind, Write},
    process::{Command, Stdio},
    thread,
};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::ledger::{Category, Transaction, TransactionType};

pub const EMPTY_RESPONSE: &str = "I couldn't generate an analysis at this time.";
pub const UNAVAILABLE: &str =
    "Sorry, I'm having trouble connecting to the financial brain right now. Please try again later.";

#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("no advisor command configured")]
    NotConfigured,
    #[error("invalid advisor command: {0}")]
    InvalidCommand(String),
    #[error("advisor process failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("advisor exited with status {status}: {stderr}")]
    Failed { status: i32, stderr: String },
    #[error("could not encode transactions: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Trimmed view of a transaction handed to the advisor.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AdvisorRecord {
    pub date: String,
    pub amount: f64,
    pub category: Category,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub desc: String,
}

impl From<&Transaction> for AdvisorRecord {
    fn from(txn: &Transaction) -> Self {
        Self {
            date: txn.date.format("%Y-%m-%d").to_string(),
            amount: txn.amount,
            category: txn.category,
            kind: txn.kind,
            desc: txn.description.clone(),
        }
    }
}

pub fn build_prompt(transactions: &[Transaction]) -> Result<String, AdvisorError> {
    let records: Vec<AdvisorRecord> = transactions.iter().map(AdvisorRecord::from).collect();
    let data = serde_json::to_string(&records)?;
    Ok(format!(
        "Act as a financial advisor. Here is a JSON list of my recent transactions:\n\
         {data}\n\
         \n\
         Please provide a brief, actionable analysis in Markdown format.\n\
         1. Summarize total income vs expenses for the current month.\n\
         2. Identify the top spending category.\n\
         3. Project my expenses for next month based on this data (linear projection).\n\
         4. Give me one specific tip to save money based on these habits.\n\
         \n\
         Keep the tone encouraging but professional. Use emojis sparingly.\n\
         If there is not enough data, just give general advice.\n"
    ))
}

/// Anything that turns a prompt into free-form advice.
pub trait Advisor {
    fn analyze(&self, prompt: &str) -> Result<String, AdvisorError>;
}

/// Runs an external program, writing the prompt to its stdin and reading
/// the analysis from its stdout.
#[derive(Debug, Clone)]
pub struct CommandAdvisor {
    program: String,
    args: Vec<String>,
}

impl CommandAdvisor {
    /// Splits `command_line` with shell quoting rules.
    pub fn from_command_line(command_line: &str) -> Result<Self, AdvisorError> {
        let mut parts = shell_words::split(command_line)
            .map_err(|err| AdvisorError::InvalidCommand(err.to_string()))?
            .into_iter();
        let program = parts.next().ok_or(AdvisorError::NotConfigured)?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }
}

impl Advisor for CommandAdvisor {
    fn analyze(&self, prompt: &str) -> Result<String, AdvisorError> {
        debug!(program = %self.program, "invoking advisor command");
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;
        // Feed stdin from a separate thread so a chatty child cannot fill its
        // stdout pipe while we are still writing.
        let writer = child.stdin.take().map(|mut stdin| {
            let prompt = prompt.to_string();
            thread::spawn(move || match stdin.write_all(prompt.as_bytes()) {
                Err(err) if err.kind() != ErrorKind::BrokenPipe => Err(err),
                _ => Ok(()),
            })
        });
        let output = child.wait_with_output()?;
        if let Some(handle) = writer {
            handle
                .join()
                .map_err(|_| AdvisorError::InvalidCommand("stdin writer panicked".into()))??;
        }
        if !output.status.success() {
            return Err(AdvisorError::Failed {
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Returns the same text for every prompt.
#[derive(Debug, Clone, Default)]
pub struct StaticAdvisor {
    pub response: String,
}

impl StaticAdvisor {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

impl Advisor for StaticAdvisor {
    fn analyze(&self, _prompt: &str) -> Result<String, AdvisorError> {
        Ok(self.response.clone())
    }
}

/// Best-effort analysis; always yields displayable text.
pub fn request_analysis(advisor: &dyn Advisor, transactions: &[Transaction]) -> String {
    let result = build_prompt(transactions).and_then(|prompt| advisor.analyze(&prompt));
    match result {
        Ok(text) if text.trim().is_empty() => EMPTY_RESPONSE.to_string(),
        Ok(text) => text.trim_end().to_string(),
        Err(err) => {
            warn!(error = %err, "advisor unavailable");
            UNAVAILABLE.to_string()
        }
    }
}
