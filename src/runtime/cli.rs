use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::library::{
    Catalog, ImportError, Track, TrackCatalog, TrackSource, format_duration, format_size,
};

/// What the command line asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Player,
    Import(Vec<PathBuf>),
    List,
    Remove(Vec<String>),
    Help,
}

pub const USAGE: &str = "usage: carmusic [import <path>... | list | remove <file_name>... | help]";

/// Parse the arguments after the program name.
pub fn parse_args<I, S>(args: I) -> Result<Invocation, String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut args = args.into_iter().map(Into::into);
    let Some(cmd) = args.next() else {
        return Ok(Invocation::Player);
    };
    let rest: Vec<String> = args.collect();
    match cmd.as_str() {
        "import" if !rest.is_empty() => Ok(Invocation::Import(rest.into_iter().map(PathBuf::from).collect())),
        "remove" if !rest.is_empty() => Ok(Invocation::Remove(rest)),
        "list" if rest.is_empty() => Ok(Invocation::List),
        "help" | "-h" | "--help" => Ok(Invocation::Help),
        other => Err(format!("unexpected arguments starting at `{other}`\n{USAGE}")),
    }
}

fn import_one(catalog: &mut Catalog, path: &Path) -> Vec<(PathBuf, Result<Track, ImportError>)> {
    if path.is_dir() {
        catalog.import_dir(path)
    } else {
        vec![(path.to_path_buf(), catalog.import_file(path))]
    }
}

/// Import every path, printing one line per file. Returns how many failed.
pub fn import(catalog: &mut Catalog, paths: &[PathBuf]) -> usize {
    let mut failed = 0;
    for path in paths {
        for (file, result) in import_one(catalog, path) {
            match result {
                Ok(track) => {
                    info!(path = %file.display(), id = %track.id, "imported");
                    println!("imported {} as #{} {}", file.display(), track.id, track.display());
                }
                Err(e) => {
                    warn!(path = %file.display(), error = %e, "import failed");
                    eprintln!("{}: {e}", file.display());
                    failed += 1;
                }
            }
        }
    }
    failed
}

/// Print the catalog: built-ins first, then imports with their stored size.
pub fn list(catalog: &Catalog) {
    let records = catalog.records();
    for track in catalog.load_catalog() {
        let size = records
            .iter()
            .find(|r| track_is_record(&track, &r.file_path))
            .map(|r| format!("  {}", format_size(r.file_size)))
            .unwrap_or_default();
        let kind = if track.is_builtin() { "built-in" } else { "imported" };
        println!(
            "{:>4}  {}  [{}] {}{}",
            track.id,
            format_duration(track.duration_ms),
            kind,
            track.display(),
            size
        );
    }
    println!("{} imported, recorded in {}", records.len(), catalog.records_path().display());
}

fn track_is_record(track: &Track, file_path: &Path) -> bool {
    matches!(&track.source, TrackSource::File(p) if p == file_path)
}

/// Remove imported files by name. Returns how many failed.
pub fn remove(catalog: &mut Catalog, names: &[String]) -> usize {
    let mut failed = 0;
    for name in names {
        match catalog.remove_import(name) {
            Ok(()) => println!("removed {name}"),
            Err(e) => {
                eprintln!("{name}: {e}");
                failed += 1;
            }
        }
    }
    failed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_arguments_runs_the_player() {
        assert_eq!(parse_args(Vec::<String>::new()), Ok(Invocation::Player));
    }

    #[test]
    fn subcommands_parse() {
        assert_eq!(
            parse_args(["import", "a.mp3", "music"]),
            Ok(Invocation::Import(vec![PathBuf::from("a.mp3"), PathBuf::from("music")]))
        );
        assert_eq!(parse_args(["list"]), Ok(Invocation::List));
        assert_eq!(
            parse_args(["remove", "a.mp3"]),
            Ok(Invocation::Remove(vec!["a.mp3".to_string()]))
        );
        assert_eq!(parse_args(["--help"]), Ok(Invocation::Help));
    }

    #[test]
    fn bad_arguments_are_rejected() {
        assert!(parse_args(["import"]).is_err());
        assert!(parse_args(["list", "extra"]).is_err());
        let err = parse_args(["play"]).unwrap_err();
        assert!(err.contains("`play`"));
        assert!(err.contains(USAGE));
    }
}
