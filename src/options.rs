//! Runner options.

use crate::metadata::TypeDef;

/// Options shared by the orchestrator and the single-unit runner.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Class names to execute; empty runs every class. Each entry matches the unqualified or the full name.
    pub class_filter: Vec<String>,
    /// Report every hook and timing, not just failures.
    pub verbose: bool,
    /// Use ANSI colors in console output.
    pub color: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            class_filter: Vec::new(),
            verbose: false,
            color: true,
        }
    }
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_class_filter<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.class_filter = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Whether the class filter lets `ty` execute.
    pub fn selects(&self, ty: &TypeDef) -> bool {
        self.class_filter.is_empty()
            || self
                .class_filter
                .iter()
                .any(|name| *name == ty.full_name || name == ty.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::Token;

    fn ty(full_name: &str) -> TypeDef {
        TypeDef {
            token: Token {
                module: 0,
                item: 0,
                member: 0,
            },
            full_name: full_name.into(),
        }
    }

    #[test]
    fn empty_filter_selects_everything() {
        assert!(RunOptions::new().selects(&ty("Sample.MathTests")));
    }

    #[test]
    fn filter_matches_short_or_full_name() {
        let options = RunOptions::new().with_class_filter(["MathTests", "Sample.Io.FileTests"]);
        assert!(options.selects(&ty("Sample.MathTests")));
        assert!(options.selects(&ty("Sample.Io.FileTests")));
        assert!(!options.selects(&ty("Other.FileTests")));
        assert!(!options.selects(&ty("Sample.MathTestsExtra")));
    }

    #[test]
    fn defaults() {
        let options = RunOptions::default();
        assert!(options.color);
        assert!(!options.verbose);
        assert!(!options.with_color(false).color);
    }
}
