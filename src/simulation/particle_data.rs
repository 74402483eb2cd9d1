//! Particle data files: comma-separated `x,y,z,vx,vy,vz,mass`, one body per
//! line, no header.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::SimError;
use crate::simulation::types::ParticleRecord;

const FIELDS: usize = 7;

pub fn parse_csv(text: &str) -> Result<Vec<ParticleRecord>, SimError> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| parse_record(index + 1, line))
        .collect()
}

fn parse_record(line_number: usize, line: &str) -> Result<ParticleRecord, SimError> {
    let malformed = |reason: String| SimError::MalformedRecord {
        line: line_number,
        reason,
    };

    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != FIELDS {
        return Err(malformed(format!(
            "expected {FIELDS} fields, found {}",
            fields.len()
        )));
    }

    let mut record = [0.0; FIELDS];
    for (slot, field) in record.iter_mut().zip(&fields) {
        *slot = field
            .parse::<f32>()
            .map_err(|err| malformed(format!("{field:?}: {err}")))?;
    }
    Ok(record)
}

pub fn load_file(path: &Path) -> Result<Vec<ParticleRecord>, SimError> {
    let text = fs::read_to_string(path).map_err(|err| SimError::Io {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    let records = parse_csv(&text)?;
    debug!("Read {} particle records from {}", records.len(), path.display());
    Ok(records)
}

/// `*.csv` files in `dir`, sorted by file name. A missing directory has no files.
pub fn discover(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        debug!("No particle data directory at {}", dir.display());
        return Vec::new();
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        })
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_records_and_skips_blank_lines() {
        let text = "1,2,3,0.1,0.2,0.3,5\n\n -1.5, 0, 2e-3 ,0,0,0,0.5\n";
        let records = parse_csv(text).unwrap();
        assert_eq!(
            records,
            vec![
                [1.0, 2.0, 3.0, 0.1, 0.2, 0.3, 5.0],
                [-1.5, 0.0, 2e-3, 0.0, 0.0, 0.0, 0.5],
            ]
        );
    }

    #[test]
    fn reports_the_offending_line() {
        let err = parse_csv("1,2,3,4,5,6,7\n1,2,3\n").unwrap_err();
        assert!(matches!(err, SimError::MalformedRecord { line: 2, .. }));

        let err = parse_csv("1,2,3,4,5,six,7").unwrap_err();
        assert!(matches!(err, SimError::MalformedRecord { line: 1, .. }));
    }

    #[test]
    fn discover_lists_sorted_csv_files() {
        let dir = std::env::temp_dir().join(format!("nbody-discover-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        for name in ["b.csv", "a.csv", "notes.txt"] {
            fs::write(dir.join(name), "").unwrap();
        }

        let files = discover(&dir);
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.csv", "b.csv"]);

        fs::remove_dir_all(&dir).unwrap();
        assert!(discover(&dir).is_empty());
    }
}
