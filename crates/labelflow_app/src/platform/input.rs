//! Line commands typed at the interactive prompt.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use labelflow_core::{Msg, SelectedFile, ARCHIVE_MIME};

/// Local file header, or end-of-central-directory for an empty archive.
const ZIP_MAGIC: [&[u8; 4]; 2] = [b"PK\x03\x04", b"PK\x05\x06"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Pick files; the first one counts.
    Select(Vec<PathBuf>),
    Prompt(String),
    Remove,
    Submit,
    Retry,
    Download,
    Reset,
    Theme,
    Status,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "select" | "open" => {
            if rest.is_empty() {
                return Err("usage: select <path>".to_string());
            }
            Command::Select(vec![PathBuf::from(rest)])
        }
        "drop" => {
            let paths: Vec<PathBuf> = rest.split_whitespace().map(PathBuf::from).collect();
            if paths.is_empty() {
                return Err("usage: drop <path> [more paths]".to_string());
            }
            Command::Select(paths)
        }
        "prompt" => Command::Prompt(rest.to_string()),
        "remove" => Command::Remove,
        "submit" | "process" => Command::Submit,
        "retry" => Command::Retry,
        "download" => Command::Download,
        "reset" | "new" => Command::Reset,
        "theme" => Command::Theme,
        "status" | "show" => Command::Status,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(format!("unknown command '{other}' (try 'help')")),
    };
    Ok(Some(command))
}

/// Turns a command into the controller message it stands for, if any.
pub fn command_msg(command: &Command) -> Option<Result<Msg, String>> {
    let msg = match command {
        Command::Select(paths) => {
            let files: Result<Vec<_>, String> = paths
                .iter()
                .map(|p| inspect_file(p).map_err(|err| format!("{}: {err}", p.display())))
                .collect();
            return Some(files.map(Msg::FilesChosen));
        }
        Command::Prompt(text) => Msg::PromptChanged(text.clone()),
        Command::Remove => Msg::FileRemoved,
        Command::Submit => Msg::SubmitClicked,
        Command::Retry => Msg::RetryClicked,
        Command::Download => Msg::DownloadClicked,
        Command::Reset => Msg::ResetClicked,
        Command::Theme => Msg::ThemeToggled,
        Command::Status | Command::Help | Command::Quit => return None,
    };
    Some(Ok(msg))
}

/// Describes a local file the way a browser file picker would: the declared
/// type follows the extension, so a `.docx` is not a ZIP even though it is one
/// on disk. Only extensionless files are sniffed.
pub fn inspect_file(path: &Path) -> io::Result<SelectedFile> {
    let meta = std::fs::metadata(path)?;
    if !meta.is_file() {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"));
    }
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mime = if path.extension().is_some() {
        mime_guess::from_path(path).first_raw()
    } else {
        sniff_archive(path)?.then_some(ARCHIVE_MIME)
    };

    Ok(SelectedFile {
        name,
        mime: mime.map(str::to_string),
        size: meta.len(),
        path: path.to_path_buf(),
    })
}

fn sniff_archive(path: &Path) -> io::Result<bool> {
    let mut header = [0u8; 4];
    let read = File::open(path)?.read(&mut header)?;
    Ok(read == header.len() && ZIP_MAGIC.iter().any(|magic| **magic == header))
}
