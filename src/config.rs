use std::{fs, path::Path};

use thiserror::Error;

use crate::robot::AgentConfig;

/// Why a grid file did not produce a simulation
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read grid file: {0}")]
    Io(#[from] std::io::Error),
    #[error("grid file line {line}: expected {expected}, got `{got}`")]
    Malformed {
        line: usize,
        expected: &'static str,
        got: String,
    },
    #[error("invalid grid geometry: {0}")]
    Invalid(&'static str),
}

/// Grid geometry, as read from the line-oriented grid file:
///
/// ```text
/// N M
/// D
/// xs ys
/// d1
/// d2
/// ```
///
/// Width `N` and height `M` of the grid, sensor range `D`, robot start
/// position, and the inner/outer corridor bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridConfig {
    pub width: i32,
    pub height: i32,
    pub sensor_range: i32,
    pub start_x: i32,
    pub start_y: i32,
    pub inner: i32,
    pub outer: i32,
}

impl GridConfig {
    /// Load and validate a grid file
    ///
    /// Any failure means "no simulation built": the error is reported to the
    /// caller and no world is constructed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Parse and validate grid-file text
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let lines: Vec<&str> = text.lines().collect();
        let dims = field(&lines, 1, "two integers `N M`", 2)?;
        let range = field(&lines, 2, "one integer `D`", 1)?;
        let start = field(&lines, 3, "two integers `xs ys`", 2)?;
        let inner = field(&lines, 4, "one integer `d1`", 1)?;
        let outer = field(&lines, 5, "one integer `d2`", 1)?;

        let config = Self {
            width: dims[0],
            height: dims[1],
            sensor_range: range[0],
            start_x: start[0],
            start_y: start[1],
            inner: inner[0],
            outer: outer[0],
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the geometric invariants the rest of the crate relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width <= 0 || self.height <= 0 {
            return Err(ConfigError::Invalid("grid dimensions must be positive"));
        }
        if self.sensor_range < 0 {
            return Err(ConfigError::Invalid("sensor range must be non-negative"));
        }
        if self.inner < 0 || self.inner > self.outer {
            return Err(ConfigError::Invalid(
                "corridor bounds must satisfy 0 <= d1 <= d2",
            ));
        }
        if !(0..self.width).contains(&self.start_x) || !(0..self.height).contains(&self.start_y) {
            return Err(ConfigError::Invalid("start position must be inside the grid"));
        }
        Ok(())
    }
}

/// Everything one simulation needs: grid geometry, episode length, and the
/// robot's learning parameters. Consumed by `World::new`; built once per
/// "new simulation" request.
#[derive(Clone, Debug)]
pub struct SimConfig {
    pub grid: GridConfig,
    /// Steps per episode
    pub runs: u32,
    pub agent: AgentConfig,
}

fn field(
    lines: &[&str],
    line: usize,
    expected: &'static str,
    count: usize,
) -> Result<Vec<i32>, ConfigError> {
    let raw = *lines.get(line - 1).ok_or(ConfigError::Malformed {
        line,
        expected,
        got: String::from("end of file"),
    })?;
    let values = raw
        .split_whitespace()
        .map(str::parse)
        .collect::<Result<Vec<i32>, _>>()
        .map_err(|_| ConfigError::Malformed {
            line,
            expected,
            got: raw.to_string(),
        })?;
    if values.len() != count {
        return Err(ConfigError::Malformed {
            line,
            expected,
            got: raw.to_string(),
        });
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD: &str = "10 10\n5\n5 5\n1\n3\n";

    #[test]
    fn parses_a_well_formed_grid_file() {
        let config = GridConfig::parse(GOOD).unwrap();
        assert_eq!(
            config,
            GridConfig {
                width: 10,
                height: 10,
                sensor_range: 5,
                start_x: 5,
                start_y: 5,
                inner: 1,
                outer: 3,
            }
        );
    }

    #[test]
    fn rejects_wrong_token_counts() {
        let err = GridConfig::parse("10\n5\n5 5\n1\n3\n").unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { line: 1, .. }));
        let err = GridConfig::parse("10 10\n5 5\n5 5\n1\n3\n").unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { line: 2, .. }));
    }

    #[test]
    fn rejects_non_integer_tokens() {
        let err = GridConfig::parse("10 ten\n5\n5 5\n1\n3\n").unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { line: 1, .. }));
    }

    #[test]
    fn rejects_truncated_files() {
        let err = GridConfig::parse("10 10\n5\n5 5\n1\n").unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { line: 5, .. }));
    }

    #[test]
    fn rejects_inverted_corridor_bounds() {
        let err = GridConfig::parse("10 10\n5\n5 5\n4\n3\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_a_start_outside_the_grid() {
        let err = GridConfig::parse("10 10\n5\n10 5\n1\n3\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn missing_file_reports_io() {
        let err = GridConfig::load("/nonexistent/grid.txt").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
