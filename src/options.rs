use crate::error::{Error, Result};

/// Hard upper bound on the number of levels a skiplist node can span.
pub const MAX_HEIGHT: usize = 12;
pub const BRANCHING_FACTOR: u32 = 4;
pub const DEFAULT_SEED: u64 = 0xdeadbeef;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Options {
    /// Tallest tower a node may draw, at most `MAX_HEIGHT`.
    pub max_height: usize,

    /// A node grows one more level with probability `1 / branching_factor`.
    pub branching_factor: u32,

    /// Seed of the height generator. Equal seeds and equal insert sequences
    /// produce identically shaped lists.
    pub seed: u64,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            max_height: MAX_HEIGHT,
            branching_factor: BRANCHING_FACTOR,
            seed: DEFAULT_SEED,
        }
    }
}

impl Options {
    pub fn validate(&self) -> Result<()> {
        if self.max_height == 0 || self.max_height > MAX_HEIGHT {
            return Err(Error::InvalidArgument(format!(
                "max_height must be within 1..={}, got {}",
                MAX_HEIGHT, self.max_height
            )));
        }
        if self.branching_factor < 2 {
            return Err(Error::InvalidArgument(format!(
                "branching_factor must be at least 2, got {}",
                self.branching_factor
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_default_options() {
        let options = Options::default();
        assert_eq!(options.max_height, 12);
        assert_eq!(options.branching_factor, 4);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_invalid_options() {
        let tests = vec![
            Options {
                max_height: 0,
                ..Default::default()
            },
            Options {
                max_height: MAX_HEIGHT + 1,
                ..Default::default()
            },
            Options {
                branching_factor: 1,
                ..Default::default()
            },
        ];

        for (i, options) in tests.iter().enumerate() {
            assert!(
                matches!(options.validate(), Err(Error::InvalidArgument(_))),
                "{}",
                i
            );
        }
    }
}
