//! File system operations. Content search shells out to ripgrep with
//! discrete arguments; everything else is plain std::fs.

use crate::error::{MctrlError, Result};
use crate::output;
use crate::script;
use clap::Subcommand;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Subcommand, Debug)]
pub enum Files {
    /// Search for files by name or content
    Search {
        /// Search string
        query: String,
        /// Directory to search in
        #[arg(long, default_value = ".")]
        dir: String,
        /// Only match file names, not content
        #[arg(long)]
        name_only: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a file's contents
    Read {
        /// File path
        path: String,
        /// Line range (e.g. 10-20)
        #[arg(long)]
        lines: Option<String>,
    },
    /// Write content to a file
    Write {
        /// File path
        path: String,
        /// Content to write
        content: String,
        /// Append instead of overwrite
        #[arg(long)]
        append: bool,
    },
    /// Replace text in a file
    Edit {
        /// File path
        path: String,
        /// Text to find
        #[arg(long)]
        old: String,
        /// Replacement text
        #[arg(long)]
        new: String,
    },
    /// List directory contents
    List {
        /// Directory path
        #[arg(default_value = ".")]
        path: String,
        /// Include hidden files
        #[arg(long)]
        all: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Serialize)]
struct Entry {
    name: String,
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<u64>,
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

impl Files {
    pub fn run(self) -> Result<()> {
        match self {
            Files::Search {
                query,
                dir,
                name_only,
                json,
            } => search(&query, &expand(&dir), name_only, json),
            Files::Read { path, lines } => read(&expand(&path), lines.as_deref()),
            Files::Write {
                path,
                content,
                append,
            } => write(&expand(&path), &content, append),
            Files::Edit { path, old, new } => edit(&expand(&path), &old, &new),
            Files::List { path, all, json } => list(&expand(&path), all, json),
        }
    }
}

fn search(query: &str, dir: &Path, name_only: bool, json: bool) -> Result<()> {
    let results = if name_only {
        let mut results = Vec::new();
        walk_names(dir, &query.to_lowercase(), &mut results)?;
        results
    } else {
        content_search(query, dir)?
    };
    if json {
        output::json_out(&results);
    } else if results.is_empty() {
        println!("No matches found.");
    } else {
        for r in &results {
            println!("{}", r);
        }
    }
    Ok(())
}

fn walk_names(dir: &Path, query: &str, results: &mut Vec<String>) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|e| MctrlError::File {
        path: dir.display().to_string(),
        source: e,
    })?;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            // Unreadable subtrees are skipped, not fatal.
            let _ = walk_names(&path, query, results);
        } else if entry.file_name().to_string_lossy().to_lowercase().contains(query) {
            results.push(path.display().to_string());
        }
    }
    Ok(())
}

fn content_search(query: &str, dir: &Path) -> Result<Vec<String>> {
    let dir_str = dir.to_string_lossy().into_owned();
    match script::shell(
        "rg",
        &["--files-with-matches", "--no-heading", query, &dir_str],
    ) {
        Ok(raw) => Ok(output::records(&raw).map(str::to_string).collect()),
        // rg exits 1 on zero matches; that is an empty result, not an error.
        Err(MctrlError::Failed(_)) => Ok(Vec::new()),
        Err(e) => Err(e),
    }
}

fn read(path: &Path, lines: Option<&str>) -> Result<()> {
    let content = fs::read_to_string(path).map_err(|e| MctrlError::File {
        path: path.display().to_string(),
        source: e,
    })?;
    match lines {
        Some(range) => {
            let (start, end) = parse_line_range(range)?;
            let slice: Vec<&str> = content
                .lines()
                .skip(start.saturating_sub(1))
                .take(end.saturating_sub(start.saturating_sub(1)))
                .collect();
            println!("{}", slice.join("\n"));
        }
        None => print!("{}", content),
    }
    Ok(())
}

fn parse_line_range(range: &str) -> Result<(usize, usize)> {
    let invalid = || {
        MctrlError::InvalidArgument(format!(
            "Invalid line range '{}'; expected START-END.",
            range
        ))
    };
    let (start, end) = range.split_once('-').ok_or_else(invalid)?;
    let start: usize = start.trim().parse().map_err(|_| invalid())?;
    let end: usize = end.trim().parse().map_err(|_| invalid())?;
    if start == 0 || end < start {
        return Err(invalid());
    }
    Ok((start, end))
}

fn write(path: &Path, content: &str, append: bool) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| MctrlError::File {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
    }
    let mut data = content.to_string();
    if !data.ends_with('\n') {
        data.push('\n');
    }
    let result = if append {
        use std::io::Write as _;
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut f| f.write_all(data.as_bytes()))
    } else {
        fs::write(path, &data)
    };
    result.map_err(|e| MctrlError::File {
        path: path.display().to_string(),
        source: e,
    })?;
    println!(
        "{}: {}",
        if append { "Appended to" } else { "Wrote" },
        path.display()
    );
    Ok(())
}

fn edit(path: &Path, old: &str, new: &str) -> Result<()> {
    let content = fs::read_to_string(path).map_err(|e| MctrlError::File {
        path: path.display().to_string(),
        source: e,
    })?;
    if !content.contains(old) {
        return Err(MctrlError::Failed(format!(
            "exact text not found in {}.",
            path.display()
        )));
    }
    let updated = content.replacen(old, new, 1);
    fs::write(path, updated).map_err(|e| MctrlError::File {
        path: path.display().to_string(),
        source: e,
    })?;
    println!("Replaced in: {}", path.display());
    Ok(())
}

fn list(path: &Path, all: bool, json: bool) -> Result<()> {
    let entries = collect_entries(path, all)?;
    if json {
        output::json_out(&entries);
    } else {
        for e in &entries {
            let suffix = if e.kind == "dir" { "/" } else { "" };
            let size = e
                .size
                .map(|s| format!("  ({} bytes)", s))
                .unwrap_or_default();
            println!("  {}{}{}", e.name, suffix, size);
        }
    }
    Ok(())
}

fn collect_entries(path: &Path, all: bool) -> Result<Vec<Entry>> {
    let read = fs::read_dir(path).map_err(|e| MctrlError::File {
        path: path.display().to_string(),
        source: e,
    })?;
    let mut names: Vec<String> = read
        .flatten()
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| all || !n.starts_with('.'))
        .collect();
    names.sort();
    Ok(names
        .into_iter()
        .map(|name| {
            let full = path.join(&name);
            let meta = fs::metadata(&full).ok();
            let is_dir = meta.as_ref().map(|m| m.is_dir()).unwrap_or(false);
            Entry {
                name,
                kind: if is_dir { "dir" } else { "file" },
                size: meta.and_then(|m| if m.is_file() { Some(m.len()) } else { None }),
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn line_ranges_parse_and_validate() {
        assert_eq!(parse_line_range("10-20").unwrap(), (10, 20));
        assert_eq!(parse_line_range("1-1").unwrap(), (1, 1));
        assert!(parse_line_range("20-10").is_err());
        assert!(parse_line_range("0-5").is_err());
        assert!(parse_line_range("abc").is_err());
    }

    #[test]
    fn edit_replaces_only_the_first_occurrence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("file.txt");
        fs::write(&path, "foo bar foo\n").unwrap();
        edit(&path, "foo", "baz").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "baz bar foo\n");
    }

    #[test]
    fn edit_refuses_when_text_is_missing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("file.txt");
        fs::write(&path, "nothing here\n").unwrap();
        assert!(matches!(
            edit(&path, "absent", "x"),
            Err(MctrlError::Failed(_))
        ));
    }

    #[test]
    fn write_appends_with_trailing_newline() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.txt");
        write(&path, "one", false).unwrap();
        write(&path, "two", true).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "one\ntwo\n");
    }

    #[test]
    fn write_creates_missing_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("deep/nested/file.txt");
        write(&path, "content", false).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn name_search_is_case_insensitive_and_recursive() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/MyConfig.toml"), "").unwrap();
        fs::write(dir.path().join("other.txt"), "").unwrap();
        let mut results = Vec::new();
        walk_names(dir.path(), "config", &mut results).unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].ends_with("MyConfig.toml"));
    }

    #[test]
    fn list_hides_dotfiles_by_default() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".hidden"), "").unwrap();
        fs::write(dir.path().join("visible.txt"), "abc").unwrap();
        let entries = collect_entries(dir.path(), false).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "visible.txt");
        assert_eq!(entries[0].size, Some(3));

        let entries = collect_entries(dir.path(), true).unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn missing_file_reads_are_classified() {
        let err = read(Path::new("/definitely/not/here.txt"), None).unwrap_err();
        assert!(matches!(err, MctrlError::File { .. }));
    }

    #[test]
    fn tilde_expansion_applies_to_user_paths() {
        let expanded = expand("~/notes.txt");
        assert!(!expanded.to_string_lossy().starts_with('~'));
    }
}
