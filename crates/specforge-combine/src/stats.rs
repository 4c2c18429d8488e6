use std::fmt;

/// Counters collected by a combine run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CombineStats {
    pub input_files: usize,
    pub services: usize,
    pub paths: usize,
    pub operations: usize,
    /// Identical component schemas shared between services.
    pub merged_schemas: usize,
    /// Overridden operations and renamed or overridden components.
    pub conflicts: usize,
}

impl fmt::Display for CombineStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Input files:    {}", self.input_files)?;
        writeln!(f, "Services:       {}", self.services)?;
        writeln!(f, "Paths:          {}", self.paths)?;
        writeln!(f, "Operations:     {}", self.operations)?;
        writeln!(f, "Merged schemas: {}", self.merged_schemas)?;
        write!(f, "Conflicts:      {}", self.conflicts)
    }
}
