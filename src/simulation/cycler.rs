use std::path::{Path, PathBuf};

use log::warn;

use crate::simulation::types::InitialCondition;

/// Walks the ordered list of initial conditions, stepping through every
/// particle data file while on [`InitialCondition::File`].
///
/// The file index is kept when leaving the file condition, so coming back
/// to it resumes at the same file.
#[derive(Debug, Clone)]
pub struct InitialConditionCycler {
    condition: InitialCondition,
    files: Vec<PathBuf>,
    file_index: usize,
}

impl InitialConditionCycler {
    pub const FALLBACK: InitialCondition = InitialCondition::TwoCubes;

    pub fn new(start: InitialCondition, files: Vec<PathBuf>) -> Self {
        let condition = if start == InitialCondition::File && files.is_empty() {
            warn!("No particle data files found, starting with {}", Self::FALLBACK);
            Self::FALLBACK
        } else {
            start
        };
        Self {
            condition,
            files,
            file_index: 0,
        }
    }

    pub fn current(&self) -> (InitialCondition, Option<&Path>) {
        let file = match self.condition {
            InitialCondition::File => self.files.get(self.file_index).map(PathBuf::as_path),
            _ => None,
        };
        (self.condition, file)
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    fn files_present(&self) -> bool {
        !self.files.is_empty()
    }

    pub fn next(&mut self) -> (InitialCondition, Option<&Path>) {
        if self.condition == InitialCondition::File && self.files_present() {
            if self.file_index + 1 < self.files.len() {
                self.file_index += 1;
            } else {
                self.condition = InitialCondition::from_index(self.condition.index() + 1);
            }
        } else {
            self.condition = InitialCondition::from_index(self.condition.index() + 1);
            if self.condition == InitialCondition::File && !self.files_present() {
                return self.next();
            }
        }
        self.current()
    }

    pub fn previous(&mut self) -> (InitialCondition, Option<&Path>) {
        let count = InitialCondition::ALL.len();
        if self.condition == InitialCondition::File && self.files_present() {
            if self.file_index > 0 {
                self.file_index -= 1;
            } else {
                self.condition = InitialCondition::from_index(self.condition.index() + count - 1);
            }
        } else {
            self.condition = InitialCondition::from_index(self.condition.index() + count - 1);
            if self.condition == InitialCondition::File && !self.files_present() {
                return self.previous();
            }
        }
        self.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use InitialCondition::*;

    fn files(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn file_start_without_files_falls_back() {
        let cycler = InitialConditionCycler::new(File, Vec::new());
        assert_eq!(cycler.current(), (TwoCubes, None));
    }

    #[test]
    fn next_skips_the_file_condition_without_files() {
        let mut cycler = InitialConditionCycler::new(HorizontalSpinningSquareSpiral, Vec::new());
        assert_eq!(cycler.next().0, Cube);
        assert_eq!(cycler.previous().0, HorizontalSpinningSquareSpiral);
    }

    #[test]
    fn next_walks_every_file_before_moving_on() {
        let mut cycler = InitialConditionCycler::new(File, files(&["a.csv", "b.csv"]));
        assert_eq!(cycler.current(), (File, Some(Path::new("a.csv"))));
        assert_eq!(cycler.next(), (File, Some(Path::new("b.csv"))));
        assert_eq!(cycler.next(), (Cube, None));
        assert_eq!(cycler.next().0, TwoCubes);
        assert_eq!(cycler.next().0, VerticalSquareSpiral);
        assert_eq!(cycler.next().0, HorizontalSpinningSquareSpiral);
        // Back on the file condition at the last file used
        assert_eq!(cycler.next(), (File, Some(Path::new("b.csv"))));
    }

    #[test]
    fn previous_walks_files_backwards() {
        let mut cycler = InitialConditionCycler::new(Cube, files(&["a.csv", "b.csv"]));
        assert_eq!(cycler.previous(), (File, Some(Path::new("a.csv"))));
        assert_eq!(cycler.previous().0, HorizontalSpinningSquareSpiral);
        assert_eq!(cycler.next(), (File, Some(Path::new("a.csv"))));
        assert_eq!(cycler.next(), (File, Some(Path::new("b.csv"))));
        assert_eq!(cycler.previous(), (File, Some(Path::new("a.csv"))));
    }
}
