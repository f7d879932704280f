//! Configuration structures for the translators and the external engine runner.

use std::path::PathBuf;

/// Controls label abbreviation for engines with a label length limit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AbbreviationOptions {
    /// Maximum number of characters in an emitted label.
    pub max_length: usize,
}

impl Default for AbbreviationOptions {
    fn default() -> Self {
        Self { max_length: 10 }
    }
}

impl AbbreviationOptions {
    /// Override the label length limit.
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }
}

/// Settings for the ALOGIT command script and its companion data file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlogitOptions {
    /// Data file named in the `file` record and written by `write_data_file`.
    /// Defaults to the first word of the model title with a `.csv` extension.
    pub data_file: Option<PathBuf>,
    /// Destination of the command script. Defaults to the first word of the
    /// model title with an `.alo` extension.
    pub alo_file: Option<PathBuf>,
    /// Column at which records are wrapped onto a new line.
    pub line_width: usize,
    /// Label abbreviation settings.
    pub abbreviation: AbbreviationOptions,
}

impl Default for AlogitOptions {
    fn default() -> Self {
        Self {
            data_file: None,
            alo_file: None,
            line_width: 80,
            abbreviation: AbbreviationOptions::default(),
        }
    }
}

impl AlogitOptions {
    /// Set the data file path written into the script.
    pub fn with_data_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_file = Some(path.into());
        self
    }

    /// Set the path the script is written to.
    pub fn with_alo_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.alo_file = Some(path.into());
        self
    }

    /// Set the record wrapping width; at least one column is always kept.
    pub fn with_line_width(mut self, line_width: usize) -> Self {
        self.line_width = line_width.max(1);
        self
    }

    /// Override the abbreviation settings.
    pub fn with_abbreviation(mut self, abbreviation: AbbreviationOptions) -> Self {
        self.abbreviation = abbreviation;
        self
    }
}

/// How to launch an external estimation program.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineOptions {
    /// Program to execute.
    pub executable: PathBuf,
    /// Arguments placed before the staged input files.
    pub arguments: Vec<String>,
    /// Keep the staging directory after the run instead of deleting it.
    pub keep_staging: bool,
}

impl EngineOptions {
    /// Run `executable` with no extra arguments.
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            arguments: Vec::new(),
            keep_staging: false,
        }
    }

    /// Append an argument placed before the staged input files.
    pub fn with_argument(mut self, argument: impl Into<String>) -> Self {
        self.arguments.push(argument.into());
        self
    }

    /// Keep or delete the staging directory after the run.
    pub fn with_keep_staging(mut self, keep: bool) -> Self {
        self.keep_staging = keep;
        self
    }
}
